pub mod identity;
pub mod service;
pub mod session;

pub use identity::{IdentityError, IdentityProvider, LocalIdentityProvider};
pub use service::{AuthError, AuthFailure, AuthOutcome, AuthService, SESSION_COOKIE};
pub use session::{Clock, JwtSessionIssuer, SessionIssuer, SystemClock, SESSION_TTL_SECS};
