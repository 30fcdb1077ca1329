//! OpenPGP (RFC 4880) message crypto core.
//!
//! Implements the cryptographic heart of an OpenPGP message processing
//! library: key fingerprinting, signature creation and verification, hybrid
//! (public-key + symmetric) encryption, and decryption via private keys or
//! passphrases. Packet bodies follow the wire formats of RFC 4880 §5; the
//! symmetric layer implements the OpenPGP CFB variant with MDC protection.
//!
//! Everything operates on in-memory values. The only non-determinism is the
//! caller supplied RNG, threaded explicitly through signing and encryption.

#![forbid(unsafe_code)]
#![deny(
    clippy::all,
    clippy::style,
    clippy::perf,
    clippy::complexity,
    clippy::correctness,
    clippy::unwrap_used,
    rust_2018_idioms
)]
#![allow(clippy::missing_const_for_fn, clippy::use_self)]

#[macro_use]
pub mod errors;

pub mod composed;
pub mod crypto;
pub mod packet;
pub mod parsing;
pub mod ser;
pub mod types;

// reexports for easier use
pub use self::composed::{find_key, Message};
pub use self::packet::{
    LiteralData, Packet, PublicKey, SecretKey, Signature, SymEncryptedProtectedData, UserId,
};
pub use self::types::{Fingerprint, KeyId};

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
