use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Length in bytes of random session tokens and CSRF secrets
pub const TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("signing key rejected")]
    InvalidKey,
}

/// Signs cookie values as `{value}.{hex hmac}` so clients cannot mint tokens
#[derive(Clone)]
pub struct CookieSigner {
    mac: HmacSha256,
}

impl CookieSigner {
    pub fn new(secret: &[u8]) -> Result<Self, SigningError> {
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| SigningError::InvalidKey)?;
        Ok(Self { mac })
    }

    pub fn sign(&self, value: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(value.as_bytes());
        format!("{value}.{}", hex::encode(mac.finalize().into_bytes()))
    }

    /// Returns the original value when the signature checks out
    pub fn verify(&self, signed: &str) -> Option<String> {
        let (value, signature) = signed.rsplit_once('.')?;
        let signature = hex::decode(signature).ok()?;

        let mut mac = self.mac.clone();
        mac.update(value.as_bytes());
        mac.verify_slice(&signature).ok()?;

        Some(value.to_string())
    }
}

impl std::fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSigner").finish_non_exhaustive()
    }
}

/// Fresh random bytes for tokens and secrets
pub fn random_bytes() -> [u8; TOKEN_BYTES] {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    bytes
}

/// URL-safe random token, never containing `.`
pub fn generate_token() -> String {
    URL_SAFE_NO_PAD.encode(random_bytes())
}
