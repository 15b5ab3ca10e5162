use alloy_primitives::{keccak256, B256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const SECRET_LEN: usize = 32;

/// keccak256 of a secret; what gets published before any secret is revealed
pub type SecretHash = B256;

/// A 32-byte hash-lock preimage. Wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret([u8; SECRET_LEN]);

impl Secret {
    /// Draw a fresh secret from the OS CSPRNG
    pub fn random() -> Result<Self, getrandom::Error> {
        let mut bytes = [0u8; SECRET_LEN];
        getrandom::getrandom(&mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; SECRET_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SECRET_LEN] {
        &self.0
    }

    pub fn hash(&self) -> SecretHash {
        keccak256(self.0)
    }

    /// 0x-prefixed lowercase hex, the form the swap API accepts
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn test_random_secrets_differ() {
        let a = Secret::random().unwrap();
        let b = Secret::random().unwrap();
        assert_ne!(a, b);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_hash_of_zero_secret() {
        let secret = Secret::from_bytes([0u8; 32]);
        assert_eq!(
            secret.hash(),
            b256!("290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563")
        );
    }

    #[test]
    fn test_hex_encoding() {
        let secret = Secret::from_bytes([0xab; 32]);
        let hex = secret.to_hex();
        assert_eq!(hex.len(), 66);
        assert!(hex.starts_with("0xabab"));
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = Secret::from_bytes([0x42; 32]);
        let debug = format!("{secret:?}");
        assert!(!debug.contains("42"));
        assert!(debug.contains("redacted"));
    }
}
