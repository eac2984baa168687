use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::CodecError;

/// Tokens above this size are rejected before any base64 or signature work.
const MAX_TOKEN_SIZE_BYTES: usize = 4096;

/// Upper bound for the configured token lifetime (one day).
pub const MAX_TOKEN_TTL_MINUTES: i64 = 24 * 60;

/// Claims embedded in every issued token.
///
/// `exp` is always `iat + ttl`. `jti` makes two tokens minted for the same
/// email in the same second distinct.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    pub fn new(email: &str, issued_at: DateTime<Utc>, ttl: Duration) -> Result<Self, CodecError> {
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| CodecError::Signing("token expiry is out of range".to_string()))?;

        Ok(Self {
            email: email.to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        })
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// True once `now` has reached `exp`; the validity window is `[iat, exp)`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("email", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("jti", &self.jti)
            .finish()
    }
}

/// HS256 signer/verifier bound to the process-wide signing key.
///
/// Decoding checks structure and signature only. Expiry and revocation are
/// left to the auth service.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Result<Self, CodecError> {
        if secret.is_empty() {
            return Err(CodecError::Signing("signing key is empty".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, CodecError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| CodecError::Signing(e.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, CodecError> {
        if token.len() > MAX_TOKEN_SIZE_BYTES {
            return Err(CodecError::Malformed(format!(
                "token exceeds {} bytes",
                MAX_TOKEN_SIZE_BYTES
            )));
        }

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => CodecError::BadSignature,
                _ => CodecError::Malformed(e.to_string()),
            })
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &"HS256")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(b"unit_test_secret").unwrap()
    }

    fn sample_claims() -> Claims {
        let issued = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        Claims::new("a@b.com", issued, Duration::minutes(15)).unwrap()
    }

    #[test]
    fn test_encode_decode() {
        let codec = codec();
        let claims = sample_claims();
        let token = codec.encode(&claims).unwrap();

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(codec.decode(&token).unwrap(), claims);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let codec = codec();
        let claims = sample_claims();
        assert_eq!(codec.encode(&claims).unwrap(), codec.encode(&claims).unwrap());
    }

    #[test]
    fn test_expiry_is_issue_plus_ttl() {
        let claims = sample_claims();
        assert_eq!(claims.exp - claims.iat, 15 * 60);
        assert!(!claims.is_expired_at(claims.expires_at() - Duration::seconds(1)));
        assert!(claims.is_expired_at(claims.expires_at()));
    }

    #[test]
    fn test_unrepresentable_expiry_is_an_error() {
        let near_end = DateTime::<Utc>::MAX_UTC - Duration::minutes(1);
        assert!(matches!(
            Claims::new("a@b.com", near_end, Duration::minutes(15)),
            Err(CodecError::Signing(_))
        ));

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let huge = Duration::try_days(i64::MAX / 86_400_000).unwrap();
        assert!(Claims::new("a@b.com", now, huge).is_err());
    }

    #[test]
    fn test_decode_ignores_expiry() {
        let codec = codec();
        let issued = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
        let claims = Claims::new("old@b.com", issued, Duration::minutes(15)).unwrap();
        let token = codec.encode(&claims).unwrap();

        assert_eq!(codec.decode(&token).unwrap().email, "old@b.com");
    }

    #[test]
    fn test_wrong_key_is_bad_signature() {
        let token = codec().encode(&sample_claims()).unwrap();
        let other = TokenCodec::new(b"another_secret").unwrap();

        assert_eq!(other.decode(&token), Err(CodecError::BadSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = codec();
        assert!(matches!(codec.decode("not-a-token"), Err(CodecError::Malformed(_))));
        assert!(matches!(codec.decode(""), Err(CodecError::Malformed(_))));
        assert!(matches!(codec.decode("a.b.c"), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_oversized_token_rejected() {
        let huge = "a".repeat(MAX_TOKEN_SIZE_BYTES + 1);
        assert!(matches!(codec().decode(&huge), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(TokenCodec::new(b""), Err(CodecError::Signing(_))));
    }

    #[test]
    fn test_claims_debug_redacts_email() {
        let out = format!("{:?}", sample_claims());
        assert!(!out.contains("a@b.com"));
    }
}
