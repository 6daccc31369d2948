//! Signed identity tokens and session cookies.
//!
//! Both are HS256 JWTs issued for the configured project. The `kind` claim
//! keeps an identity token from being replayed as a session cookie and vice
//! versa. Expiry is checked against an injectable [`Clock`] with zero leeway:
//! a token is valid while `now < exp`.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::IdentityConfig;

/// Fixed session lifetime: seven days
pub const SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 7;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is malformed or its signature is invalid: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("token has expired")]
    Expired,
    #[error("expected a {expected:?} token")]
    WrongKind { expected: TokenKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Id,
    Session,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    iss: String,
    aud: String,
    sub: String,
    email: String,
    kind: TokenKind,
    iat: i64,
    exp: i64,
}

/// Identity asserted by a verified session cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub uid: String,
    pub expires_at: DateTime<Utc>,
}

/// A freshly minted session credential
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Exchanges identity tokens for session cookies and verifies those cookies.
#[async_trait]
pub trait SessionIssuer: Send + Sync {
    async fn issue(&self, id_token: &str) -> Result<SessionCookie, TokenError>;

    async fn verify(&self, cookie: &str) -> Result<SessionClaims, TokenError>;
}

pub struct JwtSessionIssuer {
    project_id: String,
    id_token_ttl_secs: i64,
    encoding: EncodingKey,
    decoding: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl JwtSessionIssuer {
    pub fn new(config: &IdentityConfig, clock: Arc<dyn Clock>) -> Self {
        let secret = config.signing_secret.as_bytes();
        Self {
            project_id: config.project_id.clone(),
            id_token_ttl_secs: config.id_token_ttl_secs,
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            clock,
        }
    }

    pub fn id_token_ttl_secs(&self) -> i64 {
        self.id_token_ttl_secs
    }

    /// Sign a short-lived identity token for an authenticated account
    pub fn sign_id_token(&self, uid: &str, email: &str) -> Result<String, TokenError> {
        let now = self.clock.now().timestamp();
        self.encode(TokenClaims {
            iss: self.project_id.clone(),
            aud: self.project_id.clone(),
            sub: uid.to_string(),
            email: email.to_string(),
            kind: TokenKind::Id,
            iat: now,
            exp: now + self.id_token_ttl_secs,
        })
    }

    fn encode(&self, claims: TokenClaims) -> Result<String, TokenError> {
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    fn decode(&self, token: &str, expected: TokenKind) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is compared against our own clock below
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[&self.project_id]);
        validation.set_audience(&[&self.project_id]);

        let claims = decode::<TokenClaims>(token, &self.decoding, &validation)?.claims;
        if claims.kind != expected {
            return Err(TokenError::WrongKind { expected });
        }
        if self.clock.now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

#[async_trait]
impl SessionIssuer for JwtSessionIssuer {
    async fn issue(&self, id_token: &str) -> Result<SessionCookie, TokenError> {
        let identity = self.decode(id_token, TokenKind::Id)?;
        let now = self.clock.now().timestamp();
        let exp = now + SESSION_TTL_SECS;
        let value = self.encode(TokenClaims {
            iss: self.project_id.clone(),
            aud: self.project_id.clone(),
            sub: identity.sub,
            email: identity.email,
            kind: TokenKind::Session,
            iat: now,
            exp,
        })?;
        Ok(SessionCookie {
            value,
            expires_at: timestamp(exp),
        })
    }

    async fn verify(&self, cookie: &str) -> Result<SessionClaims, TokenError> {
        let claims = self.decode(cookie, TokenKind::Session)?;
        Ok(SessionClaims {
            uid: claims.sub,
            expires_at: timestamp(claims.exp),
        })
    }
}
