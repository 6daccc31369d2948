//! Identity provider: account registry, credential check, token minting.
//!
//! `LocalIdentityProvider` stands in for a managed identity backend. It owns
//! the accounts (separate from the `users` documents), mints identity tokens
//! for valid credentials, and delegates session issuance to a
//! [`JwtSessionIssuer`].

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use super::session::{JwtSessionIssuer, SessionClaims, SessionCookie, SessionIssuer, TokenError};
use crate::db::{AccountStore, IdentityAccount, StoreError};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("no account exists for this email")]
    UserNotFound,
    #[error("this email is already in use")]
    EmailAlreadyExists,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("failed to hash password")]
    PasswordHash,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("identity backend error: {0}")]
    Backend(#[from] StoreError),
}

impl IdentityError {
    /// Provider-style error code
    pub fn code(&self) -> &'static str {
        match self {
            IdentityError::UserNotFound => "auth/user-not-found",
            IdentityError::EmailAlreadyExists => "auth/email-already-exists",
            IdentityError::InvalidCredentials => "auth/invalid-credential",
            IdentityError::PasswordHash => "auth/internal-error",
            IdentityError::Token(TokenError::Expired) => "auth/id-token-expired",
            IdentityError::Token(_) => "auth/invalid-id-token",
            IdentityError::Backend(_) => "auth/internal-error",
        }
    }
}

/// What the auth service needs from an identity backend: account lookup by
/// uid or email plus session issuance and verification.
#[async_trait]
pub trait IdentityProvider: SessionIssuer {
    async fn get_user(&self, uid: &str) -> Result<IdentityAccount, IdentityError>;

    async fn get_user_by_email(&self, email: &str) -> Result<IdentityAccount, IdentityError>;
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

pub struct LocalIdentityProvider {
    accounts: Arc<dyn AccountStore>,
    issuer: JwtSessionIssuer,
}

impl LocalIdentityProvider {
    pub fn new(accounts: Arc<dyn AccountStore>, issuer: JwtSessionIssuer) -> Self {
        Self { accounts, issuer }
    }

    pub fn id_token_ttl_secs(&self) -> i64 {
        self.issuer.id_token_ttl_secs()
    }

    /// Register a new account; the returned uid keys the user document
    pub async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentityAccount, IdentityError> {
        if self.accounts.find_account_by_email(email).await?.is_some() {
            return Err(IdentityError::EmailAlreadyExists);
        }

        let password_hash = hash_password(password).map_err(|_| IdentityError::PasswordHash)?;
        let account = IdentityAccount {
            uid: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        match self.accounts.insert_account(&account).await {
            Ok(()) => {}
            Err(StoreError::DuplicateEmail) => return Err(IdentityError::EmailAlreadyExists),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(uid = %account.uid, "Created identity account");
        Ok(account)
    }

    /// Check credentials and mint a short-lived identity token
    pub async fn issue_id_token(&self, email: &str, password: &str) -> Result<String, IdentityError> {
        let account = self
            .accounts
            .find_account_by_email(email)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        if !verify_password(password, &account.password_hash) {
            return Err(IdentityError::InvalidCredentials);
        }

        Ok(self.issuer.sign_id_token(&account.uid, &account.email)?)
    }
}

#[async_trait]
impl SessionIssuer for LocalIdentityProvider {
    async fn issue(&self, id_token: &str) -> Result<SessionCookie, TokenError> {
        self.issuer.issue(id_token).await
    }

    async fn verify(&self, cookie: &str) -> Result<SessionClaims, TokenError> {
        self.issuer.verify(cookie).await
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn get_user(&self, uid: &str) -> Result<IdentityAccount, IdentityError> {
        self.accounts
            .get_account(uid)
            .await?
            .ok_or(IdentityError::UserNotFound)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<IdentityAccount, IdentityError> {
        self.accounts
            .find_account_by_email(email)
            .await?
            .ok_or(IdentityError::UserNotFound)
    }
}
