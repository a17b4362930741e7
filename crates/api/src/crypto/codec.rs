//! AES-256-CBC encryption and decryption of individual text fields.
//!
//! **Algorithm choice:** AES-256-CBC with PKCS#7 padding and a random 16-byte
//! IV per call. This is the format already present in stored rows; there is no
//! authentication tag, so tampered ciphertext is not detected. Switching to an
//! AEAD would change the envelope layout and strand existing data.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{
    block_padding::Pkcs7, generic_array::GenericArray, BlockDecryptMut, BlockEncryptMut,
    KeyIvInit,
};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use tracing::debug;

use super::key::SecretKey;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Byte length of the CBC initialization vector (one AES block).
pub const IV_LEN: usize = 16;

/// Why a stored value was returned as-is instead of being decrypted.
///
/// Each variant corresponds to one stage of the decode chain. None of them is
/// ever surfaced to a caller of [`FieldCodec::decrypt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fallback {
    /// The stored value is not standard base64.
    #[error("not base64")]
    NotBase64,

    /// The decoded bytes cannot even hold an IV.
    #[error("shorter than the IV")]
    TooShort,

    /// CBC decryption or padding removal failed under the field key.
    #[error("decryption failed")]
    DecryptFailed,

    /// Decryption succeeded but the recovered bytes are not UTF-8 text.
    #[error("plaintext is not UTF-8")]
    NotUtf8,
}

/// Encrypts and decrypts sensitive text fields under a single static key.
///
/// Stateless apart from the key; share it behind an `Arc`.
#[derive(Debug)]
pub struct FieldCodec {
    key: SecretKey,
}

impl FieldCodec {
    /// Build a codec around the process-wide key.
    pub fn new(key: SecretKey) -> Self {
        Self { key }
    }

    /// Encrypt `plaintext` into a `base64(IV || ciphertext)` envelope.
    ///
    /// The empty string is returned unchanged.
    pub fn encrypt(&self, plaintext: &str) -> String {
        if plaintext.is_empty() {
            return String::new();
        }
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);
        self.encrypt_with_iv(plaintext, &iv)
    }

    fn encrypt_with_iv(&self, plaintext: &str, iv: &[u8; IV_LEN]) -> String {
        let ciphertext = Aes256CbcEnc::new(
            GenericArray::from_slice(self.key.as_bytes()),
            GenericArray::from_slice(iv),
        )
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        let mut envelope = Vec::with_capacity(IV_LEN + ciphertext.len());
        envelope.extend_from_slice(iv);
        envelope.extend_from_slice(&ciphertext);
        STANDARD.encode(envelope)
    }

    /// Decrypt a stored field value.
    ///
    /// Anything that cannot be decrypted (legacy plaintext, malformed data,
    /// a value written under another key) is returned verbatim.
    pub fn decrypt(&self, stored: &str) -> String {
        match self.try_decrypt(stored) {
            Ok(plaintext) => plaintext,
            Err(reason) => {
                debug!(%reason, stored_len = stored.len(), "returning stored field value as-is");
                stored.to_owned()
            }
        }
    }

    /// Run the decode chain, reporting which stage rejected the input.
    pub fn try_decrypt(&self, stored: &str) -> Result<String, Fallback> {
        if stored.is_empty() {
            return Ok(String::new());
        }

        let decoded = STANDARD.decode(stored).map_err(|_| Fallback::NotBase64)?;
        if decoded.len() < IV_LEN {
            return Err(Fallback::TooShort);
        }
        let (iv, ciphertext) = decoded.split_at(IV_LEN);

        match self.open(iv, ciphertext) {
            Ok(plaintext) => Ok(plaintext),
            Err(reason) => self
                .open_text_mode(iv, ciphertext)
                .map_err(|_| reason),
        }
    }

    /// Decrypt raw ciphertext bytes, as written by [`FieldCodec::encrypt`].
    fn open(&self, iv: &[u8], ciphertext: &[u8]) -> Result<String, Fallback> {
        let plaintext = Aes256CbcDec::new(
            GenericArray::from_slice(self.key.as_bytes()),
            GenericArray::from_slice(iv),
        )
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Fallback::DecryptFailed)?;

        String::from_utf8(plaintext).map_err(|_| Fallback::NotUtf8)
    }

    /// Decrypt a ciphertext that was itself stored as base64 text.
    ///
    /// Earlier deployments used OpenSSL's text mode, which base64-encodes the
    /// ciphertext before it is appended to the IV.
    fn open_text_mode(&self, iv: &[u8], ciphertext_b64: &[u8]) -> Result<String, Fallback> {
        let ciphertext = STANDARD
            .decode(ciphertext_b64)
            .map_err(|_| Fallback::DecryptFailed)?;
        self.open(iv, &ciphertext)
    }
}
