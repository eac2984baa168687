use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::token::Claims;
use crate::error::{AppError, AuthError};
use crate::AppState;

/// Claims of a request whose token passed full validation.
///
/// Taking this as a handler argument is what makes a route protected; the
/// claims reach the handler as a value instead of request-scoped state.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub claims: Claims,
}

/// Token from `Authorization: Bearer ...`, falling back to the token cookie.
pub fn extract_token(req: &HttpRequest, cookie_name: &str) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    match bearer {
        Some(token) => Some(token.to_string()),
        None => req
            .cookie(cookie_name)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty()),
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("application state not configured".into()))?;

    let token = extract_token(req, &state.config.cookie.name).ok_or(AuthError::Unauthorized)?;
    let claims = state.auth_service.validate_token(&token)?;

    Ok(AuthenticatedUser { claims })
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
