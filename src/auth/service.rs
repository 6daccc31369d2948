//! Sign-up, sign-in and current-user resolution over the `session` cookie.

use axum::http::StatusCode;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use super::identity::{IdentityError, IdentityProvider};
use super::session::{TokenError, SESSION_TTL_SECS};
use crate::db::{SignInParams, SignUpParams, StoreError, User, UserStore};

/// Session cookie name
pub const SESSION_COOKIE: &str = "session";

/// Failure kind reported to callers alongside the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailure {
    AlreadyExists,
    EmailAlreadyExists,
    UserNotFound,
    CreationFailed,
    SignInFailed,
    VerificationFailed,
}

impl AuthFailure {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthFailure::AlreadyExists | AuthFailure::EmailAlreadyExists => StatusCode::CONFLICT,
            AuthFailure::UserNotFound => StatusCode::NOT_FOUND,
            AuthFailure::SignInFailed | AuthFailure::VerificationFailed => StatusCode::UNAUTHORIZED,
            AuthFailure::CreationFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User already exists. Please sign in instead.")]
    AlreadyExists,
    #[error("This email is already in use")]
    EmailAlreadyExists,
    #[error("User not found. Please sign up instead.")]
    UserNotFound,
    #[error("Error creating user")]
    CreationFailed(#[source] StoreError),
    #[error("Error creating user")]
    NoIdentityAccount,
    #[error("Error creating user")]
    IdentityLookupFailed(#[source] IdentityError),
    #[error("Error signing in")]
    SignInFailed(#[source] IdentityError),
    #[error("Session verification failed")]
    VerificationFailed(#[source] TokenError),
    #[error("Error loading user")]
    UserLookupFailed(#[source] StoreError),
}

impl AuthError {
    pub fn kind(&self) -> AuthFailure {
        match self {
            AuthError::AlreadyExists => AuthFailure::AlreadyExists,
            AuthError::EmailAlreadyExists => AuthFailure::EmailAlreadyExists,
            AuthError::UserNotFound => AuthFailure::UserNotFound,
            AuthError::CreationFailed(_)
            | AuthError::NoIdentityAccount
            | AuthError::IdentityLookupFailed(_) => AuthFailure::CreationFailed,
            AuthError::SignInFailed(_) => AuthFailure::SignInFailed,
            AuthError::VerificationFailed(_) | AuthError::UserLookupFailed(_) => {
                AuthFailure::VerificationFailed
            }
        }
    }
}

/// Structured `{ success, message, reason }` result returned by auth endpoints
#[derive(Debug, Clone, Serialize)]
pub struct AuthOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<AuthFailure>,
}

impl AuthOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            reason: None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.reason.map_or(StatusCode::OK, |r| r.status_code())
    }
}

impl From<&AuthError> for AuthOutcome {
    fn from(err: &AuthError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            reason: Some(err.kind()),
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserStore>,
    secure_cookies: bool,
}

impl AuthService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserStore>,
        secure_cookies: bool,
    ) -> Self {
        Self {
            identity,
            users,
            secure_cookies,
        }
    }

    /// Create the user document for an identity uid, never overwriting one.
    /// The uid must belong to an identity account registered with `email`.
    pub async fn sign_up(&self, params: SignUpParams) -> Result<User, AuthError> {
        let SignUpParams { uid, name, email } = params;

        match self.users.get_user(&uid).await {
            Ok(Some(_)) => return Err(AuthError::AlreadyExists),
            Ok(None) => {}
            Err(e) => {
                tracing::error!(uid = %uid, error = %e, "Error creating user");
                return Err(AuthError::CreationFailed(e));
            }
        }

        let account = match self.identity.get_user(&uid).await {
            Ok(account) => account,
            Err(IdentityError::UserNotFound) => {
                tracing::warn!(uid = %uid, "Sign-up for unregistered uid");
                return Err(AuthError::NoIdentityAccount);
            }
            Err(e) => {
                tracing::error!(uid = %uid, error = %e, code = e.code(), "Error creating user");
                return Err(AuthError::IdentityLookupFailed(e));
            }
        };
        if !account.email.eq_ignore_ascii_case(email.trim()) {
            return Err(AuthError::EmailAlreadyExists);
        }

        let user = User {
            id: uid,
            name,
            email: account.email,
        };
        match self.users.create_user(&user).await {
            Ok(()) => {
                tracing::info!(uid = %user.id, "User created");
                Ok(user)
            }
            // Lost a race with a concurrent sign-up for the same uid
            Err(StoreError::AlreadyExists) => Err(AuthError::AlreadyExists),
            Err(e) => {
                tracing::error!(uid = %user.id, error = %e, "Error creating user");
                Err(AuthError::CreationFailed(e))
            }
        }
    }

    /// Exchange an identity token for a session and store it in the jar
    pub async fn set_session_cookie(
        &self,
        jar: CookieJar,
        id_token: &str,
    ) -> Result<CookieJar, AuthError> {
        let session = self
            .identity
            .issue(id_token)
            .await
            .map_err(|e| AuthError::SignInFailed(e.into()))?;
        tracing::debug!(expires_at = %session.expires_at, "Session cookie issued");
        Ok(jar.add(self.session_cookie(session.value)))
    }

    pub async fn sign_in(
        &self,
        jar: CookieJar,
        params: &SignInParams,
    ) -> Result<CookieJar, AuthError> {
        // Verification of the cookie re-checks identity; this lookup only
        // gives a distinct "not found" answer up front.
        match self.identity.get_user_by_email(&params.email).await {
            Ok(_) => {}
            Err(IdentityError::UserNotFound) => return Err(AuthError::UserNotFound),
            Err(e) => {
                tracing::error!(error = %e, code = e.code(), "Error signing in");
                return Err(AuthError::SignInFailed(e));
            }
        }

        let jar = self.set_session_cookie(jar, &params.id_token).await.map_err(|e| {
            tracing::error!(error = ?e, "Error signing in");
            e
        })?;
        tracing::info!("Signed in successfully");
        Ok(jar)
    }

    /// Drop the session cookie. Outstanding cookie values stay valid until expiry.
    pub fn sign_out(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build(SESSION_COOKIE).path("/").build())
    }

    /// Resolve the session cookie to a user document, reporting why not
    pub async fn resolve_current_user(&self, jar: &CookieJar) -> Result<Option<User>, AuthError> {
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Ok(None);
        };

        let claims = self
            .identity
            .verify(cookie.value())
            .await
            .map_err(AuthError::VerificationFailed)?;
        tracing::debug!(uid = %claims.uid, expires_at = %claims.expires_at, "Session verified");

        self.users
            .get_user(&claims.uid)
            .await
            .map_err(AuthError::UserLookupFailed)
    }

    /// Current user, or `None` for any missing or unusable session
    pub async fn get_current_user(&self, jar: &CookieJar) -> Option<User> {
        match self.resolve_current_user(jar).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, detail = ?e, "Error getting current user");
                None
            }
        }
    }

    pub async fn is_authenticated(&self, jar: &CookieJar) -> bool {
        self.get_current_user(jar).await.is_some()
    }

    fn session_cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, value))
            .max_age(time::Duration::seconds(SESSION_TTL_SECS))
            .http_only(true)
            .secure(self.secure_cookies)
            .path("/")
            .same_site(SameSite::Lax)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::LocalIdentityProvider;
    use crate::auth::session::testing::{identity_config, ManualClock};
    use crate::auth::session::JwtSessionIssuer;
    use crate::db::memory::MemoryStore;
    use crate::db::{init_in_memory, AccountStore, SqliteStore};

    const T0: i64 = 1_790_000_000;

    struct Harness {
        auth: AuthService,
        identity: Arc<LocalIdentityProvider>,
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
    }

    fn harness(secure: bool) -> Harness {
        let clock = ManualClock::at(T0);
        let store = Arc::new(MemoryStore::new());
        let issuer = JwtSessionIssuer::new(&identity_config(), clock.clone());
        let identity = Arc::new(LocalIdentityProvider::new(store.clone(), issuer));
        let auth = AuthService::new(identity.clone(), store.clone(), secure);
        Harness {
            auth,
            identity,
            store,
            clock,
        }
    }

    fn sign_up_params(uid: &str, email: &str) -> SignUpParams {
        SignUpParams {
            uid: uid.to_string(),
            name: "Ada Lovelace".to_string(),
            email: email.to_string(),
        }
    }

    /// Register an identity account plus user document and return a signed-in jar
    async fn signed_in(h: &Harness) -> (User, CookieJar) {
        let account = h.identity.create_account("ada@example.com", "hunter22").await.unwrap();
        let user = h
            .auth
            .sign_up(sign_up_params(&account.uid, "ada@example.com"))
            .await
            .unwrap();
        let id_token = h.identity.issue_id_token("ada@example.com", "hunter22").await.unwrap();
        let jar = h
            .auth
            .sign_in(
                CookieJar::new(),
                &SignInParams {
                    email: "ada@example.com".to_string(),
                    id_token,
                },
            )
            .await
            .unwrap();
        (user, jar)
    }

    #[tokio::test]
    async fn test_sign_up_then_lookup() {
        let h = harness(false);
        let account = h.identity.create_account("ada@example.com", "hunter22").await.unwrap();
        h.auth.sign_up(sign_up_params(&account.uid, "ada@example.com")).await.unwrap();

        let stored = h.store.get_user(&account.uid).await.unwrap().unwrap();
        assert_eq!(stored.name, "Ada Lovelace");
        assert_eq!(stored.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_sign_up_twice_keeps_first_record() {
        let h = harness(false);
        let account = h.identity.create_account("ada@example.com", "hunter22").await.unwrap();
        h.auth.sign_up(sign_up_params(&account.uid, "ada@example.com")).await.unwrap();

        let second = SignUpParams {
            name: "Impostor".to_string(),
            ..sign_up_params(&account.uid, "other@example.com")
        };
        let err = h.auth.sign_up(second).await.unwrap_err();
        assert_eq!(err.kind(), AuthFailure::AlreadyExists);

        let stored = h.store.get_user(&account.uid).await.unwrap().unwrap();
        assert_eq!(stored.name, "Ada Lovelace");
        assert_eq!(stored.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_sign_up_email_in_use() {
        let h = harness(false);
        let ada = h.identity.create_account("ada@example.com", "hunter22").await.unwrap();
        h.identity.create_account("bob@example.com", "hunter22").await.unwrap();

        let err = h.auth.sign_up(sign_up_params(&ada.uid, "bob@example.com")).await.unwrap_err();
        assert_eq!(err.kind(), AuthFailure::EmailAlreadyExists);
        assert!(h.store.get_user(&ada.uid).await.unwrap().is_none());

        let outcome = AuthOutcome::from(&err);
        assert!(!outcome.success);
        assert_eq!(outcome.message, "This email is already in use");
        assert_eq!(outcome.status_code(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_sign_up_unregistered_uid_rejected() {
        let h = harness(false);
        let err = h
            .auth
            .sign_up(sign_up_params("not-a-real-uid", "ada@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AuthFailure::CreationFailed);
        assert!(matches!(err, AuthError::NoIdentityAccount));
        assert!(h.store.get_user("not-a-real-uid").await.unwrap().is_none());

        // The real owner of the email is unaffected
        let account = h.identity.create_account("ada@example.com", "hunter22").await.unwrap();
        let user = h.auth.sign_up(sign_up_params(&account.uid, "ada@example.com")).await.unwrap();
        assert_eq!(user.id, account.uid);
    }

    /// Yields after every lookup so concurrent sign-ups interleave between
    /// the existence check and the insert.
    struct InterleavingUsers(Arc<dyn UserStore>);

    #[async_trait::async_trait]
    impl UserStore for InterleavingUsers {
        async fn get_user(&self, uid: &str) -> Result<Option<User>, StoreError> {
            let user = self.0.get_user(uid).await;
            tokio::task::yield_now().await;
            user
        }

        async fn create_user(&self, user: &User) -> Result<(), StoreError> {
            self.0.create_user(user).await
        }
    }

    async fn race_sign_ups(store: Arc<dyn UserStore>, accounts: Arc<dyn AccountStore>) {
        let issuer = JwtSessionIssuer::new(&identity_config(), ManualClock::at(T0));
        let identity = Arc::new(LocalIdentityProvider::new(accounts, issuer));
        let auth = AuthService::new(
            identity.clone(),
            Arc::new(InterleavingUsers(store.clone())),
            false,
        );
        let account = identity.create_account("ada@example.com", "hunter22").await.unwrap();

        let first = SignUpParams {
            name: "First".to_string(),
            ..sign_up_params(&account.uid, "ada@example.com")
        };
        let second = SignUpParams {
            name: "Second".to_string(),
            ..sign_up_params(&account.uid, "ada@example.com")
        };
        let (a, b) = tokio::join!(auth.sign_up(first), auth.sign_up(second));

        let winner = match (a, b) {
            (Ok(user), Err(e)) | (Err(e), Ok(user)) => {
                assert_eq!(e.kind(), AuthFailure::AlreadyExists);
                user
            }
            (a, b) => panic!("expected exactly one sign-up to win: {:?} / {:?}", a, b),
        };
        let stored = store.get_user(&account.uid).await.unwrap().unwrap();
        assert_eq!(stored, winner);
    }

    #[tokio::test]
    async fn test_concurrent_sign_up_keeps_one_record_sqlite() {
        let store = Arc::new(SqliteStore::new(init_in_memory().await.unwrap()));
        race_sign_ups(store.clone(), store).await;
    }

    #[tokio::test]
    async fn test_concurrent_sign_up_keeps_one_record_memory() {
        let store = Arc::new(MemoryStore::new());
        race_sign_ups(store.clone(), store).await;
    }

    #[tokio::test]
    async fn test_sign_in_unknown_email() {
        let h = harness(false);
        let err = h
            .auth
            .sign_in(
                CookieJar::new(),
                &SignInParams {
                    email: "ghost@example.com".to_string(),
                    id_token: "irrelevant".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AuthFailure::UserNotFound);
    }

    #[tokio::test]
    async fn test_sign_in_bad_id_token() {
        let h = harness(false);
        h.identity.create_account("ada@example.com", "hunter22").await.unwrap();
        let err = h
            .auth
            .sign_in(
                CookieJar::new(),
                &SignInParams {
                    email: "ada@example.com".to_string(),
                    id_token: "forged".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AuthFailure::SignInFailed);
        assert!(matches!(err, AuthError::SignInFailed(IdentityError::Token(TokenError::Invalid(_)))));
    }

    #[tokio::test]
    async fn test_session_cookie_attributes() {
        let h = harness(true);
        let (_, jar) = signed_in(&h).await;

        let cookie = jar.get(SESSION_COOKIE).unwrap();
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(604_800)));
    }

    #[tokio::test]
    async fn test_cookie_not_secure_outside_production() {
        let h = harness(false);
        let (_, jar) = signed_in(&h).await;
        assert_eq!(jar.get(SESSION_COOKIE).unwrap().secure(), Some(false));
    }

    #[tokio::test]
    async fn test_current_user_resolves() {
        let h = harness(false);
        let (user, jar) = signed_in(&h).await;

        assert_eq!(h.auth.get_current_user(&jar).await, Some(user));
        assert!(h.auth.is_authenticated(&jar).await);
    }

    #[tokio::test]
    async fn test_no_cookie_is_no_user() {
        let h = harness(false);
        assert_eq!(h.auth.get_current_user(&CookieJar::new()).await, None);
        assert!(!h.auth.is_authenticated(&CookieJar::new()).await);
    }

    #[tokio::test]
    async fn test_tampered_cookie_is_no_user() {
        let h = harness(false);
        let (_, jar) = signed_in(&h).await;
        let mut value = jar.get(SESSION_COOKIE).unwrap().value().to_string();
        value.replace_range(value.len() - 4.., "AAAA");

        let tampered = CookieJar::new().add(Cookie::new(SESSION_COOKIE, value));
        assert_eq!(h.auth.get_current_user(&tampered).await, None);
        let err = h.auth.resolve_current_user(&tampered).await.unwrap_err();
        assert_eq!(err.kind(), AuthFailure::VerificationFailed);
    }

    #[tokio::test]
    async fn test_deleted_user_is_no_user() {
        let h = harness(false);
        let (user, jar) = signed_in(&h).await;
        h.store.remove_user(&user.id);

        assert_eq!(h.auth.get_current_user(&jar).await, None);
        assert!(h.auth.resolve_current_user(&jar).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_expires_after_seven_days() {
        let h = harness(false);
        let (user, jar) = signed_in(&h).await;

        h.clock.advance(SESSION_TTL_SECS - 1);
        assert_eq!(h.auth.get_current_user(&jar).await, Some(user));

        h.clock.advance(2);
        assert_eq!(h.auth.get_current_user(&jar).await, None);
    }

    #[tokio::test]
    async fn test_sign_out_removes_cookie() {
        let h = harness(false);
        let (_, jar) = signed_in(&h).await;

        let jar = h.auth.sign_out(jar);
        assert!(jar.get(SESSION_COOKIE).is_none());
        assert!(!h.auth.is_authenticated(&jar).await);
    }
}
