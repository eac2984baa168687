use tracing::instrument;

use crate::error::AuthError;

pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Hash a plaintext password with bcrypt at the given cost.
#[instrument(skip_all)]
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(AuthError::Crypto(format!(
            "Invalid bcrypt cost: {} (must be {}-{})",
            cost, MIN_BCRYPT_COST, MAX_BCRYPT_COST
        )));
    }

    bcrypt::hash(password, cost).map_err(|e| AuthError::Crypto(format!("Password hashing failed: {}", e)))
}

/// Compare a plaintext password with a stored bcrypt hash.
///
/// bcrypt compares digests in constant time. A hash that fails to parse is
/// a crypto error, not a mismatch.
#[instrument(skip_all)]
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash)
        .map_err(|e| AuthError::Crypto(format!("Password verification failed: {}", e)))
}
