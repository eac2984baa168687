use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::auth::password::{DEFAULT_BCRYPT_COST, MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::auth::token::MAX_TOKEN_TTL_MINUTES;
use crate::error::AppError;

/// Only accepted while `environment` is `development`.
pub const DEVELOPMENT_JWT_SECRET: &str = "development_secret";

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

#[derive(Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub bcrypt_cost: u32,
    pub revocation_purge_interval_secs: u64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("revocation_purge_interval_secs", &self.revocation_purge_interval_secs)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub path: String,
    pub secure: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_any_origin: bool,
    pub max_age: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub cookie: CookieConfig,
    pub cors: CorsConfig,
}

fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    builder
        .set_default("environment", "development")?
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("server.workers", num_cpus::get() as i64)?
        .set_default("auth.jwt_secret", DEVELOPMENT_JWT_SECRET)?
        .set_default("auth.token_ttl_minutes", 15)?
        .set_default("auth.bcrypt_cost", DEFAULT_BCRYPT_COST as i64)?
        .set_default("auth.revocation_purge_interval_secs", 60)?
        .set_default("cookie.name", "token")?
        .set_default("cookie.path", "/api")?
        .set_default("cookie.secure", false)?
        .set_default("cors.enabled", true)?
        .set_default("cors.allow_any_origin", false)?
        .set_default("cors.max_age", 3600)
}

// E.g., `APP_AUTH__JWT_SECRET=...` sets `Settings.auth.jwt_secret`
fn environment_source() -> Environment {
    Environment::with_prefix("app")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    pub fn new() -> Result<Self, AppError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let settings: Settings = with_defaults(Config::builder())?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(environment_source())
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Defaults with a fixed secret and the cheapest bcrypt cost, ignoring the
    /// environment.
    pub fn new_for_test() -> Result<Self, AppError> {
        let settings: Settings = with_defaults(Config::builder())?
            .set_override("environment", "test")?
            .set_override("auth.jwt_secret", "test_secret")?
            .set_override("auth.bcrypt_cost", MIN_BCRYPT_COST as i64)?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(AppError::Config("auth.jwt_secret must not be empty".into()));
        }
        if self.auth.jwt_secret == DEVELOPMENT_JWT_SECRET && self.environment != "development" {
            return Err(AppError::Config(format!(
                "auth.jwt_secret must be set outside development (environment: {})",
                self.environment
            )));
        }
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&self.auth.token_ttl_minutes) {
            return Err(AppError::Config(format!(
                "auth.token_ttl_minutes must be between 1 and {}",
                MAX_TOKEN_TTL_MINUTES
            )));
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.auth.bcrypt_cost) {
            return Err(AppError::Config(format!(
                "auth.bcrypt_cost must be between {} and {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }
        if self.auth.revocation_purge_interval_secs == 0 {
            return Err(AppError::Config(
                "auth.revocation_purge_interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_env_only() -> Result<Settings, ConfigError> {
        with_defaults(Config::builder())?
            .add_source(environment_source())
            .build()?
            .try_deserialize::<Settings>()
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::new_for_test().expect("Failed to load settings");
        assert_eq!(settings.environment, "test");
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.workers as usize, num_cpus::get());
        assert_eq!(settings.auth.jwt_secret, "test_secret");
        assert_eq!(settings.auth.token_ttl_minutes, 15);
        assert_eq!(settings.auth.bcrypt_cost, MIN_BCRYPT_COST);
        assert_eq!(settings.cookie.name, "token");
        assert_eq!(settings.cookie.path, "/api");
    }

    // Env-var tests share process state, so overrides and invalid input
    // are exercised in one test.
    #[test]
    fn test_environment_override() {
        env::set_var("APP_SERVER__PORT", "9000");
        env::set_var("APP_AUTH__JWT_SECRET", "override_secret");
        env::set_var("APP_AUTH__TOKEN_TTL_MINUTES", "5");

        let config = from_env_only().expect("Failed to deserialize settings");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.jwt_secret, "override_secret");
        assert_eq!(config.auth.token_ttl_minutes, 5);

        let settings = Settings::new().expect("Failed to load settings");
        assert_eq!(settings.auth.jwt_secret, "override_secret");
        assert_eq!(settings.server.port, 9000);

        // Without an explicit secret, only development may start
        env::remove_var("APP_AUTH__JWT_SECRET");
        env::set_var("APP_ENVIRONMENT", "production");
        assert!(matches!(Settings::new(), Err(AppError::Config(_))));
        env::remove_var("APP_ENVIRONMENT");

        env::set_var("APP_SERVER__PORT", "invalid");
        let result = from_env_only();
        assert!(result.is_err(), "Expected error for invalid port");

        env::remove_var("APP_SERVER__PORT");
        env::remove_var("APP_AUTH__TOKEN_TTL_MINUTES");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::new_for_test().unwrap();
        settings.auth.jwt_secret.clear();
        assert!(matches!(settings.validate(), Err(AppError::Config(_))));

        let mut settings = Settings::new_for_test().unwrap();
        settings.auth.token_ttl_minutes = 0;
        assert!(matches!(settings.validate(), Err(AppError::Config(_))));

        let mut settings = Settings::new_for_test().unwrap();
        settings.auth.bcrypt_cost = 40;
        assert!(matches!(settings.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_bounds_token_ttl() {
        let mut settings = Settings::new_for_test().unwrap();
        settings.auth.token_ttl_minutes = MAX_TOKEN_TTL_MINUTES;
        assert!(settings.validate().is_ok());

        for ttl in [-1, MAX_TOKEN_TTL_MINUTES + 1, 9_999_999_999_999, i64::MAX] {
            settings.auth.token_ttl_minutes = ttl;
            assert!(
                matches!(settings.validate(), Err(AppError::Config(_))),
                "ttl {} was accepted",
                ttl
            );
        }
    }

    #[test]
    fn test_development_secret_only_in_development() {
        let mut settings = Settings::new_for_test().unwrap();
        settings.auth.jwt_secret = DEVELOPMENT_JWT_SECRET.to_string();
        assert!(matches!(settings.validate(), Err(AppError::Config(_))));

        settings.environment = "production".to_string();
        assert!(matches!(settings.validate(), Err(AppError::Config(_))));

        settings.environment = "development".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let settings = Settings::new_for_test().unwrap();
        assert!(!format!("{:?}", settings).contains("test_secret"));
    }
}
