use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{AuthError, Principal, Role};
use crate::config::SecurityConfig;

/// JWT claims for session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// `lifetime_secs` may be negative, which yields an already-expired token.
    pub fn new(principal: &Principal, lifetime_secs: i64) -> Result<Self, AuthError> {
        let now = Utc::now().timestamp();
        let exp = now
            .checked_add(lifetime_secs)
            .ok_or_else(|| AuthError::Signing(format!("token lifetime {}s overflows", lifetime_secs)))?;
        Ok(Self {
            sub: principal.id.clone(),
            role: principal.role,
            iat: now,
            exp,
        })
    }
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Principal {
            id: claims.sub,
            role: claims.role,
        }
    }
}

/// Only the expiry is read from an unverified token
#[derive(Debug, Deserialize)]
struct ExpiryOnly {
    exp: i64,
}

/// Signing and verification keys derived from the process-wide secret
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl JwtKeys {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        let lifetime_secs = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
        Self::with_lifetime_secs(secret, lifetime_secs)
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(security.jwt_secret.expose(), security.jwt_expiry)
    }

    pub fn with_lifetime_secs(secret: &str, lifetime_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Sign a token for `principal`
    pub fn issue(&self, principal: &Principal) -> Result<String, AuthError> {
        let claims = Claims::new(principal, self.lifetime_secs)?;
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the embedded principal.
    ///
    /// An expired token is reported as `TokenExpired` even when its signature does not
    /// match; everything else that fails is `InvalidToken`.
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let exp = peek_expiry(token)?;
        if exp <= Utc::now().timestamp() {
            return Err(AuthError::TokenExpired);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims.into()),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(AuthError::TokenExpired),
                _ => {
                    tracing::debug!("Token rejected: {}", e);
                    Err(AuthError::InvalidToken)
                }
            },
        }
    }
}

fn peek_expiry(token: &str) -> Result<i64, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;

    decode::<ExpiryOnly>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims.exp)
        .map_err(|_| AuthError::InvalidToken)
}
