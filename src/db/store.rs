//! Document-store collaborators and their SQLite implementation.
//!
//! The auth layer only needs get and insert-once by id on `users`, the
//! identity provider needs account lookup by uid or email, and the interview
//! view needs two reads.
//! Each need is its own trait so tests can swap in `memory::MemoryStore`.

use async_trait::async_trait;
use thiserror::Error;

use super::{DbPool, Feedback, IdentityAccount, Interview, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a record with this email already exists")]
    DuplicateEmail,
    #[error("a record with this id already exists")]
    AlreadyExists,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let msg = db_err.message();
        if msg.contains("UNIQUE constraint failed") {
            return if msg.contains(".email") {
                StoreError::DuplicateEmail
            } else {
                StoreError::AlreadyExists
            };
        }
    }
    StoreError::Database(err)
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, uid: &str) -> Result<Option<User>, StoreError>;

    /// Insert the document for `user.id`. An existing document is never
    /// replaced; the write fails with `AlreadyExists` instead.
    async fn create_user(&self, user: &User) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get_account(&self, uid: &str) -> Result<Option<IdentityAccount>, StoreError>;

    async fn find_account_by_email(&self, email: &str)
        -> Result<Option<IdentityAccount>, StoreError>;

    async fn insert_account(&self, account: &IdentityAccount) -> Result<(), StoreError>;
}

#[async_trait]
pub trait InterviewStore: Send + Sync {
    async fn get_interview(&self, id: &str) -> Result<Option<Interview>, StoreError>;

    async fn get_feedback(
        &self,
        interview_id: &str,
        user_id: &str,
    ) -> Result<Option<Feedback>, StoreError>;
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn get_user(&self, uid: &str) -> Result<Option<User>, StoreError> {
        let user: Option<User> = sqlx::query_as("SELECT id, name, email FROM users WHERE id = ?")
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO users (id, name, email) VALUES (?, ?, ?)")
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for SqliteStore {
    async fn get_account(&self, uid: &str) -> Result<Option<IdentityAccount>, StoreError> {
        let account: Option<IdentityAccount> =
            sqlx::query_as("SELECT * FROM identity_accounts WHERE uid = ?")
                .bind(uid)
                .fetch_optional(&self.pool)
                .await?;
        Ok(account)
    }

    async fn find_account_by_email(
        &self,
        email: &str,
    ) -> Result<Option<IdentityAccount>, StoreError> {
        let account: Option<IdentityAccount> = sqlx::query_as("SELECT * FROM identity_accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn insert_account(&self, account: &IdentityAccount) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO identity_accounts (uid, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&account.uid)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }
}

#[async_trait]
impl InterviewStore for SqliteStore {
    async fn get_interview(&self, id: &str) -> Result<Option<Interview>, StoreError> {
        let interview: Option<Interview> = sqlx::query_as("SELECT * FROM interviews WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(interview)
    }

    async fn get_feedback(
        &self,
        interview_id: &str,
        user_id: &str,
    ) -> Result<Option<Feedback>, StoreError> {
        let feedback: Option<Feedback> = sqlx::query_as(
            r#"
            SELECT * FROM feedback
            WHERE interview_id = ? AND user_id = ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(interview_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(feedback)
    }
}
