//! Accounts owned by the identity provider.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IdentityAccount {
    pub uid: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub uid: String,
    pub email: String,
}

impl From<IdentityAccount> for AccountResponse {
    fn from(account: IdentityAccount) -> Self {
        Self {
            uid: account.uid,
            email: account.email,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdTokenResponse {
    pub id_token: String,
    pub expires_in: i64,
}
