//! ChaCha20-Poly1305 authenticated encryption.

use crate::error::{CryptoError, CryptoResult};
use crate::key::CipherKey;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use serde::{Deserialize, Serialize};

/// ChaCha20-Poly1305 nonce length.
pub const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag length.
pub const TAG_SIZE: usize = 16;

/// Nonce + ciphertext pair produced by [`encrypt`].
///
/// The nonce is random per encryption; the ciphertext includes the Poly1305
/// tag, so tampering fails authentication on decrypt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncryptedData {
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

/// Encrypts a plaintext with a fresh random nonce.
pub fn encrypt(key: &CipherKey, plaintext: &[u8]) -> CryptoResult<EncryptedData> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    nonce_bytes.copy_from_slice(&nonce);

    Ok(EncryptedData {
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Decrypts an [`EncryptedData`] pair.
///
/// Fails with [`CryptoError::Decryption`] on a wrong key or tampered
/// ciphertext (authentication failure), never panics.
pub fn decrypt(key: &CipherKey, data: &EncryptedData) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

    cipher
        .decrypt(Nonce::from_slice(&data.nonce), data.ciphertext.as_ref())
        .map_err(|_| CryptoError::Decryption("wrong key or tampered data".to_string()))
}

/// Encrypts a string into a single base64 blob (`nonce || ciphertext`).
///
/// This is the form persisted by the config store: one opaque string under
/// one storage key.
pub fn encrypt_string(key: &CipherKey, plaintext: &str) -> CryptoResult<String> {
    let data = encrypt(key, plaintext.as_bytes())?;

    let mut packed = Vec::with_capacity(NONCE_SIZE + data.ciphertext.len());
    packed.extend_from_slice(&data.nonce);
    packed.extend_from_slice(&data.ciphertext);
    Ok(BASE64.encode(packed))
}

/// Decrypts a base64 `nonce || ciphertext` blob back to a string.
pub fn decrypt_string(key: &CipherKey, blob: &str) -> CryptoResult<String> {
    let packed = BASE64
        .decode(blob.trim())
        .map_err(|e| CryptoError::MalformedBlob(format!("invalid base64: {e}")))?;

    // Shortest valid blob is an empty plaintext: nonce + tag alone.
    if packed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::MalformedBlob(format!(
            "blob too short: {} bytes",
            packed.len()
        )));
    }

    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&packed[..NONCE_SIZE]);

    let plaintext = decrypt(
        key,
        &EncryptedData {
            nonce,
            ciphertext: packed[NONCE_SIZE..].to_vec(),
        },
    )?;

    String::from_utf8(plaintext)
        .map_err(|e| CryptoError::Decryption(format!("plaintext is not valid UTF-8: {e}")))
}
