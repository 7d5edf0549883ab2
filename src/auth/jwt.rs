//! JWT token generation and validation
//! Implements the access token + refresh token pattern with RS256 signing

use crate::{config::AppConfig, error::AppError, models::user::AuthenticatedUser};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Token verification failure reasons.
///
/// Callers at the HTTP boundary collapse all of these into a single 401
/// via `From<TokenError> for AppError` so that clients cannot distinguish
/// a forged signature from an expired token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("invalid claim: {0}")]
    InvalidClaim(String),
}

/// JWT claims
///
/// Access tokens carry `name` and `email`; refresh tokens carry only the
/// subject plus the standard claims, so the optional fields are skipped
/// when absent. `token_type` discriminates the two kinds so they are not
/// interchangeable.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Token kind: "access" or "refresh"
    pub token_type: String,

    /// Username (access tokens only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Email (access tokens only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,
}

/// Token pair response
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
}

impl TokenPair {
    pub fn bearer(access_token: String, refresh_token: Option<String>) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// JWT service
///
/// Key material is read from the configured PEM files exactly once, at
/// construction, and held immutably for the process lifetime. There is no
/// hot-reload and no rotation.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    access_token_exp: Duration,
    refresh_token_exp: Duration,
}

impl JwtService {
    /// Create JWT service from config, loading the RSA key pair from disk
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let private_pem = std::fs::read(&config.auth.private_key_path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read private key {}: {}",
                config.auth.private_key_path, e
            ))
        })?;
        let public_pem = std::fs::read(&config.auth.public_key_path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read public key {}: {}",
                config.auth.public_key_path, e
            ))
        })?;

        Self::from_pem(&private_pem, &public_pem, config)
    }

    /// Create JWT service from in-memory PEM material (used by tests)
    pub fn from_pem(
        private_pem: &[u8],
        public_pem: &[u8],
        config: &AppConfig,
    ) -> Result<Self, AppError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| AppError::Config(format!("Invalid RSA private key: {}", e)))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| AppError::Config(format!("Invalid RSA public key: {}", e)))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            issuer: config.auth.issuer.clone(),
            audience: config.auth.audience.clone(),
            access_token_exp: Duration::minutes(config.auth.access_token_exp_minutes),
            refresh_token_exp: Duration::minutes(config.auth.refresh_token_exp_minutes),
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Sign a token with the given subject/profile claims, kind and TTL.
    /// `iss`, `aud`, `iat` and `exp` are always set here, never by callers.
    fn sign(
        &self,
        sub: String,
        name: Option<String>,
        email: Option<String>,
        token_type: &str,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub,
            token_type: token_type.to_string(),
            name,
            email,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode token: {:?}", e);
            AppError::Internal(format!("Failed to encode token: {}", e))
        })
    }

    /// Generate access token (carries name and email)
    pub fn generate_access_token(&self, user: &AuthenticatedUser) -> Result<String, AppError> {
        self.sign(
            user.id.to_string(),
            Some(user.username.clone()),
            user.email.clone(),
            "access",
            self.access_token_exp,
        )
    }

    /// Generate access token from previously decoded claims (refresh path)
    pub fn reissue_access_token(&self, claims: &Claims) -> Result<String, AppError> {
        self.sign(
            claims.sub.clone(),
            claims.name.clone(),
            claims.email.clone(),
            "access",
            self.access_token_exp,
        )
    }

    /// Generate refresh token (subject only)
    pub fn generate_refresh_token(&self, user_id: &Uuid) -> Result<String, AppError> {
        self.sign(
            user_id.to_string(),
            None,
            None,
            "refresh",
            self.refresh_token_exp,
        )
    }

    /// Generate an access/refresh token pair for a freshly authenticated user
    pub fn generate_token_pair(&self, user: &AuthenticatedUser) -> Result<TokenPair, AppError> {
        let access_token = self.generate_access_token(user)?;
        let refresh_token = self.generate_refresh_token(&user.id)?;

        Ok(TokenPair::bearer(access_token, Some(refresh_token)))
    }

    /// Verify signature, expiry, issuer and audience, and return the claims.
    ///
    /// Leeway is fixed to zero: a token is rejected the moment `now >= exp`.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::InvalidIssuer => TokenError::InvalidClaim("iss".to_string()),
                ErrorKind::InvalidAudience => TokenError::InvalidClaim("aud".to_string()),
                ErrorKind::MissingRequiredClaim(claim) => TokenError::InvalidClaim(claim.clone()),
                ErrorKind::ImmatureSignature => TokenError::InvalidClaim("nbf".to_string()),
                ErrorKind::InvalidAlgorithm => TokenError::InvalidClaim("alg".to_string()),
                _ => TokenError::Malformed,
            })
    }

    /// Decode and require an access token
    ///
    /// A refresh token presented as a bearer credential is rejected here,
    /// so a long-lived refresh token never passes the request gate.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.decode(token)?;

        if claims.token_type != "access" {
            tracing::debug!(
                "Token type mismatch: expected 'access', got '{}'",
                claims.token_type
            );
            return Err(TokenError::InvalidClaim("token_type".to_string()));
        }

        Ok(claims)
    }

    /// Decode and require a refresh token
    ///
    /// An access token cannot renew itself: only a refresh token mints a
    /// new access token.
    pub fn decode_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.decode(token)?;

        if claims.token_type != "refresh" {
            tracing::debug!(
                "Token type mismatch: expected 'refresh', got '{}'",
                claims.token_type
            );
            return Err(TokenError::InvalidClaim("token_type".to_string()));
        }

        Ok(claims)
    }
}
