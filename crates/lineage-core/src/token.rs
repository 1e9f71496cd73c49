use base64::Engine;
use rand::RngCore;

/// Source of opaque refresh token strings.
///
/// Output must be unpredictable from earlier tokens and collide with
/// negligible probability; the store's unique index is the last line.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct SecureTokenGenerator {
    bytes: usize,
}

impl SecureTokenGenerator {
    pub fn new(bytes: usize) -> Self {
        Self { bytes }
    }
}

impl TokenGenerator for SecureTokenGenerator {
    fn generate(&self) -> String {
        let mut buf = vec![0u8; self.bytes];
        rand::rngs::OsRng.fill_bytes(&mut buf);
        // URL-safe base64 without padding.
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
    }
}
