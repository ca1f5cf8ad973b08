//! Encryption layer for Daypack.
//!
//! Provides config-at-rest encryption using ChaCha20-Poly1305 with a
//! caller-supplied symmetric key. The sync core embeds a fixed application
//! key: the goal is opacity of the persisted credential blob on disk, not
//! secure key custody (an explicit non-goal for single-user local use).
//!
//! Two blob forms are supported:
//!
//! 1. **Structured**: [`EncryptedData`] keeps nonce and ciphertext as
//!    separate fields for callers that serialize the pair themselves.
//! 2. **String**: [`encrypt_string`] / [`decrypt_string`] pack
//!    `nonce || ciphertext` into a single base64 string, which is what the
//!    config store persists under its storage key.

mod cipher;
mod error;
mod key;

pub use cipher::{
    decrypt, decrypt_string, encrypt, encrypt_string, EncryptedData, NONCE_SIZE, TAG_SIZE,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{CipherKey, KEY_SIZE};
