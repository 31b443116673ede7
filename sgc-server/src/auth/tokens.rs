//! JWT access tokens
//!
//! HS256 tokens signed with the configured secret. Sign-out revokes the
//! token id until its natural expiry.

use chrono::{Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use quality_service::{User, UserRole};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (credential auth id)
    pub sub: String,

    /// JWT ID, used for revocation
    pub jti: String,

    /// Issued at (seconds since epoch)
    pub iat: i64,

    /// Expiration (seconds since epoch)
    pub exp: i64,

    pub nbf: i64,

    pub iss: String,

    pub email: String,

    /// Role at issue time; handlers re-read the profile for decisions
    pub role: UserRole,
}

impl TokenClaims {
    pub fn new(user: &User, issuer: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.auth_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
            iss: issuer.to_string(),
            email: user.email.clone(),
            role: user.role,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    pub fn auth_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Invalid("malformed subject".to_string()))
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Token revoked")]
    Revoked,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Token handed to the client after sign-in
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: chrono::DateTime<Utc>,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: Duration,
    /// Revoked `jti` -> expiry timestamp
    revoked: DashMap<String, i64>,
}

impl JwtService {
    pub fn new(secret: &Secret<String>, issuer: impl Into<String>, ttl_secs: i64) -> Self {
        let issuer = issuer.into();
        let bytes = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer.as_str()]);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            validation,
            issuer,
            ttl: Duration::seconds(ttl_secs),
            revoked: DashMap::new(),
        }
    }

    pub fn issue(&self, user: &User) -> Result<IssuedToken, TokenError> {
        let claims = TokenClaims::new(user, &self.issuer, self.ttl);
        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        let expires_at = chrono::DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);

        Ok(IssuedToken {
            access_token,
            token_type: "Bearer".to_string(),
            expires_at,
        })
    }

    pub fn validate(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            },
        )?;

        if self.revoked.contains_key(&data.claims.jti) {
            return Err(TokenError::Revoked);
        }
        Ok(data.claims)
    }

    /// Reject the token from now on; expired entries are pruned on the way
    pub fn revoke(&self, claims: &TokenClaims) {
        let now = Utc::now().timestamp();
        self.revoked.retain(|_, exp| *exp > now);
        self.revoked.insert(claims.jti.clone(), claims.exp);
    }

    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }
}
