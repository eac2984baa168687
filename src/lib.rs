pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod store;

use std::sync::Arc;
use actix_web::HttpResponse;

pub use error::{AppError, AuthError};
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AuthService, AuthenticatedUser, Claims, Credentials};
pub use store::{CredentialStore, MemoryCredentialStore, MemoryRevocationRegistry, RevocationRegistry};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// Builds the auth service over fresh in-memory stores.
    pub fn new(config: Settings) -> Result<Self> {
        let auth_service = AuthService::new(
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(MemoryRevocationRegistry::new()),
            &config.auth,
        )?;

        Ok(Self::with_service(config, auth_service))
    }

    pub fn with_service(config: Settings, auth_service: AuthService) -> Self {
        Self {
            config: Arc::new(config),
            auth_service: Arc::new(auth_service),
        }
    }
}
