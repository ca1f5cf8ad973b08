//! Symmetric key wrapper.

use crate::error::{CryptoError, CryptoResult};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key length for ChaCha20-Poly1305 (256 bits).
pub const KEY_SIZE: usize = 32;

/// A 256-bit symmetric key.
///
/// Key material is zeroized when the wrapper is dropped. Cloning is allowed
/// so a long-lived store can hand copies to short-lived operations.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CipherKey([u8; KEY_SIZE]);

impl CipherKey {
    /// Wraps raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Wraps a byte slice, validating its length.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        f.write_str("CipherKey(..)")
    }
}
