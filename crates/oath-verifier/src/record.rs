//! Device credential record consumed and mutated by the verifiers.
//!
//! The record is owned by the caller, which loads it before verification
//! and persists it afterwards. The shared secret is serialized as a hex
//! string and zeroized when the record is dropped.

use std::fmt;

use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::VerificationError;

/// Persisted OATH state of one registered device.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct DeviceRecord {
    /// Raw HMAC key bytes.
    #[serde(with = "hex_secret")]
    pub shared_secret: Vec<u8>,
    /// Next expected HOTP counter value.
    #[serde(default)]
    pub counter: u64,
    /// Step boundary (epoch seconds) of the last accepted TOTP code.
    #[serde(default)]
    pub last_login_epoch_seconds: i64,
    /// Learned client clock skew in seconds.
    #[serde(default)]
    pub clock_drift_seconds: i64,
    /// Opaque device label.
    #[serde(default)]
    pub device_name: String,
}

impl DeviceRecord {
    /// Create a freshly provisioned record: counter 0, no prior login, no drift.
    #[must_use]
    pub fn new(shared_secret: Vec<u8>) -> Self {
        Self {
            shared_secret,
            counter: 0,
            last_login_epoch_seconds: 0,
            clock_drift_seconds: 0,
            device_name: String::new(),
        }
    }

    /// Create a record from a hex-encoded secret (either case).
    ///
    /// # Errors
    /// Returns `VerificationError::InvalidConfiguration` if `hex` is not
    /// valid hexadecimal.
    pub fn from_hex_secret(hex: &str) -> Result<Self, VerificationError> {
        let secret = HEXLOWER_PERMISSIVE
            .decode(hex.as_bytes())
            .map_err(|e| VerificationError::config(format!("shared secret is not valid hex: {e}")))?;
        Ok(Self::new(secret))
    }

    /// Set the device label.
    #[must_use]
    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }
}

impl fmt::Debug for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceRecord")
            .field("shared_secret", &"[REDACTED]")
            .field("counter", &self.counter)
            .field("last_login_epoch_seconds", &self.last_login_epoch_seconds)
            .field("clock_drift_seconds", &self.clock_drift_seconds)
            .field("device_name", &self.device_name)
            .finish()
    }
}

mod hex_secret {
    use super::{HEXLOWER, HEXLOWER_PERMISSIVE};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(secret: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&HEXLOWER.encode(secret))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let hex = String::deserialize(deserializer)?;
        HEXLOWER_PERMISSIVE
            .decode(hex.as_bytes())
            .map_err(D::Error::custom)
    }
}
