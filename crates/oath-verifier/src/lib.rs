//! `oath-verifier`: HOTP (RFC 4226) and TOTP (RFC 6238) verification engine.
//!
//! Pure, synchronous and free of I/O. The caller loads a [`DeviceRecord`],
//! runs one verification against it, and persists it again on success.
//! Verifications of the same record must not run concurrently.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;

pub mod code;
pub mod config;
pub mod record;

pub mod hotp;
pub mod totp;

pub mod verifier;

pub use code::{generate_code, TruncationOffset};
pub use config::{OathAlgorithm, VerifierConfig, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
pub use error::VerificationError;
pub use hotp::verify_hotp;
pub use record::DeviceRecord;
pub use totp::verify_totp;
pub use verifier::verify;
