//! JWT Token Service
//! Mission: Issue and verify signed session tokens

use crate::auth::{errors::AuthError, models::SessionClaims};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use tracing::debug;

/// Tunables for token issuance and verification
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub issuer: String,
    pub ttl_hours: i64,
    /// Seconds of clock skew tolerated when checking `exp`.
    pub leeway_secs: u64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            issuer: "Nyanime".to_string(),
            ttl_hours: 24, // 24-hour tokens by default
            leeway_secs: 0,
        }
    }
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
    pub expires_in: i64,
}

/// Signs and verifies session tokens with one server-held HS256 secret.
///
/// Holds no mutable state, so a single instance behind an `Arc` serves every
/// request concurrently.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    settings: TokenSettings,
    ttl: Duration,
    ttl_secs: i64,
}

impl TokenService {
    /// Create a token service; an empty secret is a configuration error.
    pub fn new(secret: &str, settings: TokenSettings) -> Result<Self> {
        if secret.trim().is_empty() {
            bail!("JWT secret must not be empty");
        }
        if settings.ttl_hours <= 0 {
            bail!("token lifetime must be positive, got {}h", settings.ttl_hours);
        }
        let (Some(ttl), Some(ttl_secs)) = (
            Duration::try_hours(settings.ttl_hours),
            settings.ttl_hours.checked_mul(3600),
        ) else {
            bail!("token lifetime of {}h is out of range", settings.ttl_hours);
        };
        if Utc::now().checked_add_signed(ttl).is_none() {
            bail!("token lifetime of {}h is out of range", settings.ttl_hours);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = settings.leeway_secs;
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            settings,
            ttl,
            ttl_secs,
        })
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    /// Issue a token for `user_id` expiring `ttl_hours` from now.
    pub fn issue(&self, user_id: i64, role: &str) -> Result<IssuedToken> {
        self.issue_at(user_id, role, Utc::now())
    }

    /// Issue a token as if signed at `issued_at`.
    pub fn issue_at(
        &self,
        user_id: i64,
        role: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .context("Invalid timestamp")?
            .timestamp();

        let claims = SessionClaims {
            user_id,
            role: role.to_string(),
            iss: self.settings.issuer.clone(),
            exp: expires_at,
        };

        debug!(
            user_id,
            role,
            "Generating JWT, expires in {}h",
            self.settings.ttl_hours
        );

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to generate JWT")?;

        Ok(IssuedToken {
            token,
            expires_at,
            expires_in: self.ttl_secs,
        })
    }

    /// Verify a token's signature, issuer and expiry and return its claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let decoded = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Malformed,
            })?;

        let claims = decoded.claims;
        if claims.user_id <= 0 || claims.role.is_empty() {
            return Err(AuthError::Malformed);
        }

        debug!(user_id = claims.user_id, "Validated JWT");

        Ok(claims)
    }
}
