//! AES-256-CBC field encryption primitives.
//!
//! This module is free of HTTP and storage dependencies. It provides the
//! codec that [`crate::policy`] applies to sensitive columns.
//!
//! # Envelope format
//!
//! ```text
//! base64_standard( IV(16 bytes) || AES-256-CBC-PKCS7(plaintext) )
//! ```
//!
//! No version byte and no authentication tag. Values that do not decode to
//! such an envelope are treated as legacy plaintext and returned unchanged.

pub mod codec;
pub mod key;

pub use codec::FieldCodec;
pub use key::{SecretKey, KEY_LEN};
