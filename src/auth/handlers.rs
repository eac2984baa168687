use actix_web::cookie::{time::Duration as CookieDuration, Cookie};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use tracing::info;

use crate::auth::extractor::{extract_token, AuthenticatedUser};
use crate::auth::service::Credentials;
use crate::config::CookieConfig;
use crate::error::{AppError, AuthError};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            token: None,
        }
    }

    fn with_token(message: impl Into<String>, token: String) -> Self {
        Self {
            message: message.into(),
            token: Some(token),
        }
    }
}

/// Mounts the auth endpoints and the protected resource under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::Validation(format!("Invalid request body: {}", err)).into()
    }))
    .service(
        web::scope("/api")
            .route("/auth/signup", web::post().to(sign_up))
            .route("/auth/signin", web::post().to(sign_in))
            .route("/auth/refresh", web::post().to(refresh))
            .route("/auth/revoke", web::post().to(revoke))
            .route("/protected", web::get().to(protected)),
    );
}

fn token_cookie(config: &CookieConfig, token: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build(config.name.clone(), token)
        .path(config.path.clone())
        .http_only(true)
        .secure(config.secure)
        .max_age(CookieDuration::seconds(max_age_secs))
        .finish()
}

fn request_token(req: &HttpRequest, state: &AppState) -> Result<String, AppError> {
    extract_token(req, &state.config.cookie.name).ok_or_else(|| AuthError::Unauthorized.into())
}

pub async fn sign_up(
    req: web::Json<Credentials>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let creds = req.into_inner();
    info!("Received sign-up request");

    let service = state.auth_service.clone();
    web::block(move || service.sign_up(&creds.email, &creds.password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(MessageResponse::new("User registered successfully")))
}

pub async fn sign_in(
    req: web::Json<Credentials>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let creds = req.into_inner();
    info!("Received sign-in request");

    // Rejections are logged by the service
    let service = state.auth_service.clone();
    let token = web::block(move || service.sign_in(&creds))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let cookie = token_cookie(
        &state.config.cookie,
        token.clone(),
        state.auth_service.token_ttl().num_seconds(),
    );
    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(MessageResponse::with_token("Logged in successfully", token)))
}

pub async fn refresh(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = request_token(&req, &state)?;
    let refreshed = state.auth_service.refresh_token(&token)?;

    let cookie = token_cookie(
        &state.config.cookie,
        refreshed.clone(),
        state.auth_service.token_ttl().num_seconds(),
    );
    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(MessageResponse::with_token("Token refreshed successfully", refreshed)))
}

pub async fn revoke(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = request_token(&req, &state)?;
    state.auth_service.revoke_token(&token);

    Ok(HttpResponse::Ok()
        .cookie(token_cookie(&state.config.cookie, String::new(), 0))
        .json(MessageResponse::new("Logged out successfully")))
}

pub async fn protected(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse::new(format!(
        "Welcome {}! This is a protected resource.",
        user.claims.email
    )))
}
