//! JWT decoding/verification (HS256).

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

/// Token verification seam used by the HTTP middleware.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// HS256 validator over a shared secret.
///
/// Signature verification is delegated to `jsonwebtoken`; time-window checks
/// use the deterministic [`validate_claims`] so tests can pin `now`.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        let key = DecodingKey::from_secret(&secret);

        // Claims carry chrono timestamps (issued_at/expires_at), not the
        // registered numeric exp; expiry is enforced by validate_claims.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self { key, validation }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let decoded = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;

        validate_claims(&decoded.claims, now)?;
        Ok(decoded.claims)
    }
}
