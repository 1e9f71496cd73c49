//! Refresh token issuance, rotation and family revocation.
//!
//! Every operation runs against a sea-orm connection supplied by the caller.
//! Multi-step operations open their own transaction on it (a savepoint when the
//! caller already passed a transaction), so a failure never leaves a
//! half-rotated chain behind.

pub mod audit;
pub mod config;
pub mod error;
pub mod family;
pub mod rotation;
pub mod sso;
pub mod store;
pub mod token;
pub mod users;

#[cfg(test)]
mod testing;

pub use audit::{AuditAction, AuditLog, AuditLogTable};
pub use config::RefreshTokenConfig;
pub use error::{Error, Result};
pub use family::{get_valid_child_token, revoke_token_family};
pub use rotation::{IssuedToken, RefreshTokenService};
pub use sso::{GrantAuthenticatedConditions, SsoBinding};
pub use store::{find_refresh_token, find_user_with_refresh_token, logout};
pub use token::{SecureTokenGenerator, TokenGenerator};
pub use users::{UserDirectory, UserTable};
