//! [`SecretKey`]: the process-wide AES-256 key used for field encryption.

use thiserror::Error;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Errors produced while turning configuration into key material.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The configured passphrase is empty.
    #[error("field encryption key must not be empty")]
    Empty,
}

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// Constructed once at startup and moved into the codec. The memory is zeroed
/// on drop.
#[derive(Clone)]
pub struct SecretKey(Box<[u8; KEY_LEN]>);

impl SecretKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Box::new(bytes))
    }

    /// Derive the key from a configured passphrase.
    ///
    /// The UTF-8 bytes are truncated to [`KEY_LEN`] or right-padded with
    /// zeroes, which is how OpenSSL treats an oversized or undersized
    /// AES-256-CBC key string. Rows written by earlier deployments depend on
    /// this exact mapping.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Empty`] if `passphrase` is empty.
    pub fn from_passphrase(passphrase: &str) -> Result<Self, KeyError> {
        if passphrase.is_empty() {
            return Err(KeyError::Empty);
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        let src = passphrase.as_bytes();
        let n = src.len().min(KEY_LEN);
        buf[..n].copy_from_slice(&src[..n]);
        Ok(Self(buf))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("SecretKey([REDACTED])")
    }
}
