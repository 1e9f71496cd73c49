const ROTATION_ENABLED_VAR: &str = "LINEAGE_REFRESH_TOKEN_ROTATION_ENABLED";
const TOKEN_BYTES_VAR: &str = "LINEAGE_REFRESH_TOKEN_BYTES";

const DEFAULT_TOKEN_BYTES: usize = 16;
const MAX_TOKEN_BYTES: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenConfig {
    /// Revoke the descendants of a revoked token when it is presented again.
    pub rotation_enabled: bool,
    /// Random bytes per generated token, before encoding.
    pub token_bytes: usize,
}

impl Default for RefreshTokenConfig {
    fn default() -> Self {
        Self {
            rotation_enabled: true,
            token_bytes: DEFAULT_TOKEN_BYTES,
        }
    }
}

impl RefreshTokenConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let rotation_enabled = lookup(ROTATION_ENABLED_VAR)
            .and_then(|v| parse_bool(&v))
            .unwrap_or(defaults.rotation_enabled);
        let token_bytes = lookup(TOKEN_BYTES_VAR)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(defaults.token_bytes)
            .clamp(DEFAULT_TOKEN_BYTES, MAX_TOKEN_BYTES);

        Self {
            rotation_enabled,
            token_bytes,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
