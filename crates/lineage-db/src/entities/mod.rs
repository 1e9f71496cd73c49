pub mod audit_log_entries;
pub mod refresh_tokens;
pub mod sso_providers;
pub mod sso_sessions;
pub mod users;
