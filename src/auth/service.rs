use chrono::Duration;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::{Claims, TokenCodec, MAX_TOKEN_TTL_MINUTES};
use crate::auth::validation::is_valid_email;
use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::error::{AuthError, StoreError};
use crate::store::{CredentialStore, RevocationRegistry, UserIdentity};

/// Email/password pair supplied to sign-up and sign-in. Never persisted.
///
/// Emails are treated like passwords for output purposes: they never reach
/// logs or `Debug` output.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Issues, validates, refreshes and revokes bearer tokens.
///
/// A token moves `issued -> valid -> {expired | revoked}`; both end states
/// are final. The signing key is fixed at construction.
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    revocations: Arc<dyn RevocationRegistry>,
    codec: TokenCodec,
    clock: Arc<dyn Clock>,
    token_ttl: Duration,
    bcrypt_cost: u32,
    // Verified against when the email is unknown so both sign-in failures cost one bcrypt run.
    dummy_hash: String,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        revocations: Arc<dyn RevocationRegistry>,
        config: &AuthConfig,
    ) -> Result<Self, AuthError> {
        let codec = TokenCodec::new(config.jwt_secret.as_bytes())?;
        let token_ttl = Duration::try_minutes(config.token_ttl_minutes)
            .filter(|ttl| {
                *ttl > Duration::zero() && *ttl <= Duration::minutes(MAX_TOKEN_TTL_MINUTES)
            })
            .ok_or_else(|| {
                AuthError::Crypto(format!(
                    "token lifetime of {} minutes is out of range",
                    config.token_ttl_minutes
                ))
            })?;
        let dummy_hash = hash_password("timing-equalizer", config.bcrypt_cost)?;

        Ok(Self {
            credentials,
            revocations,
            codec,
            clock: Arc::new(SystemClock),
            token_ttl,
            bcrypt_cost: config.bcrypt_cost,
            dummy_hash,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    #[instrument(skip_all)]
    pub fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        if !is_valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }

        if self.credentials.exists(email) {
            warn!("Sign-up rejected, account already exists");
            return Err(AuthError::AlreadyExists);
        }

        let password_hash = hash_password(password, self.bcrypt_cost)?;

        self.credentials
            .create(UserIdentity::new(email.to_string(), password_hash))
            .map_err(|e| {
                if let StoreError::Storage(ref msg) = e {
                    error!("Failed to store credentials: {}", msg);
                }
                AuthError::from(e)
            })?;

        info!("User registered");
        Ok(())
    }

    #[instrument(skip_all)]
    pub fn sign_in(&self, credentials: &Credentials) -> Result<String, AuthError> {
        if !is_valid_email(&credentials.email) {
            return Err(AuthError::InvalidEmail);
        }

        let password_ok = match self.credentials.lookup(&credentials.email) {
            Ok(user) => verify_password(&credentials.password, &user.password_hash)?,
            Err(StoreError::NotFound) => {
                let _ = verify_password(&credentials.password, &self.dummy_hash);
                false
            }
            Err(e) => {
                error!("Credential lookup failed: {}", e);
                return Err(e.into());
            }
        };

        if !password_ok {
            warn!("Sign-in rejected");
            return Err(AuthError::Unauthorized);
        }

        let token = self.create_token(&credentials.email)?;
        info!("User signed in");
        Ok(token)
    }

    /// The only path that mints tokens.
    pub fn create_token(&self, email: &str) -> Result<String, AuthError> {
        let claims = Claims::new(email, self.clock.now(), self.token_ttl)?;
        Ok(self.codec.encode(&claims)?)
    }

    /// Gate for protected operations: signature, then revocation, then expiry.
    ///
    /// Claims are only read after the signature has been verified.
    #[instrument(skip_all)]
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.codec.decode(token).map_err(|e| {
            warn!("Token rejected: {}", e);
            AuthError::from(e)
        })?;

        if self.revocations.is_revoked(token) {
            return Err(AuthError::Revoked);
        }

        if claims.is_expired_at(self.clock.now()) {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }

    /// Exchanges a valid token for a fresh one. The presented token is revoked
    /// first, so it can be refreshed at most once even under concurrent calls.
    #[instrument(skip_all)]
    pub fn refresh_token(&self, token: &str) -> Result<String, AuthError> {
        let claims = self.validate_token(token)?;

        if !self.revocations.revoke(token, claims.exp) {
            // Lost a race with another refresh or revoke of the same token.
            return Err(AuthError::Revoked);
        }

        let refreshed = self.create_token(&claims.email)?;
        info!("Token refreshed");
        Ok(refreshed)
    }

    /// Revokes unconditionally. Unauthentic or expired tokens are recorded too.
    ///
    /// Authentic tokens stay in the registry until their own expiry. Anything
    /// else is kept for one token lifetime.
    #[instrument(skip_all)]
    pub fn revoke_token(&self, token: &str) {
        let expires_at = match self.codec.decode(token) {
            Ok(claims) => claims.exp,
            Err(_) => self
                .clock
                .now()
                .timestamp()
                .saturating_add(self.token_ttl.num_seconds()),
        };
        if self.revocations.revoke(token, expires_at) {
            info!("Token revoked");
        }
    }

    /// Reads claims from an authentic token without checking revocation or
    /// expiry. Not an authorization check; use `validate_token` for that.
    pub fn get_claims(&self, token: &str) -> Result<Claims, AuthError> {
        Ok(self.codec.decode(token)?)
    }

    /// Drops revocation entries for tokens that have expired anyway.
    pub fn purge_revocations(&self) -> usize {
        self.revocations.purge_expired(self.clock.now().timestamp())
    }
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService")
            .field("codec", &self.codec)
            .field("token_ttl", &self.token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}
