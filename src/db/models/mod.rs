//! Database models split into domain-specific modules.

pub mod identity;
pub mod interview;
pub mod user;

pub use identity::*;
pub use interview::*;
pub use user::*;
