//! Verification configuration and the security gates applied to it.
//!
//! A [`VerifierConfig`] is immutable for the duration of a verification
//! call. [`VerifierConfig::validate`] and [`VerifierConfig::validate_secret`]
//! run before any HMAC is computed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::code::TruncationOffset;
use crate::VerificationError;

/// RFC 4226 §5.3: implementations MUST extract at least 6 digits.
pub const MIN_PASSWORD_LENGTH: u32 = 6;

/// A masked 31-bit value never has more than 10 decimal digits.
pub const MAX_PASSWORD_LENGTH: u32 = 10;

/// RFC 4226 §4 R6: the shared secret MUST be at least 128 bits.
pub const DEFAULT_MIN_SHARED_SECRET_LENGTH: i64 = 16;

/// Default TOTP time step in seconds (RFC 6238 §4).
pub const DEFAULT_TIME_STEP_INTERVAL: u32 = 30;

/// OATH algorithm a device was provisioned with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OathAlgorithm {
    /// Counter-based, RFC 4226.
    Hotp,
    /// Time-based, RFC 6238.
    #[default]
    Totp,
}

impl fmt::Display for OathAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hotp => "HOTP",
            Self::Totp => "TOTP",
        })
    }
}

impl FromStr for OathAlgorithm {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("hotp") {
            Ok(Self::Hotp)
        } else if s.eq_ignore_ascii_case("totp") {
            Ok(Self::Totp)
        } else {
            Err(VerificationError::config("invalid OTP algorithm"))
        }
    }
}

impl TryFrom<String> for OathAlgorithm {
    type Error = VerificationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OathAlgorithm> for String {
    fn from(value: OathAlgorithm) -> Self {
        value.to_string()
    }
}

/// Parameters of an OTP verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Which verifier handles the device.
    pub algorithm: OathAlgorithm,
    /// Minimum accepted shared secret length in bytes; must be positive.
    pub min_shared_secret_length: i64,
    /// Digits in the OTP, excluding the checksum digit.
    pub password_length: u32,
    /// Append the RFC 4226 checksum digit.
    pub checksum: bool,
    /// Truncation offset into the HMAC digest.
    pub truncation_offset: TruncationOffset,
    /// Forward counter values searched after the stored counter (HOTP).
    pub hotp_window_size: u32,
    /// Seconds per time step (TOTP).
    pub totp_time_step_interval: u32,
    /// Steps searched on each side of the current step (TOTP).
    pub totp_time_steps_in_window: u32,
    /// Largest drift, in time steps, that will be recorded (TOTP).
    pub totp_max_clock_drift: u32,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            algorithm: OathAlgorithm::Totp,
            min_shared_secret_length: DEFAULT_MIN_SHARED_SECRET_LENGTH,
            password_length: MIN_PASSWORD_LENGTH,
            checksum: false,
            truncation_offset: TruncationOffset::Dynamic,
            hotp_window_size: 100,
            totp_time_step_interval: DEFAULT_TIME_STEP_INTERVAL,
            totp_time_steps_in_window: 2,
            totp_max_clock_drift: 5,
        }
    }
}

impl VerifierConfig {
    /// Load a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns `VerificationError::InvalidConfiguration` on malformed JSON
    /// or an unknown algorithm name.
    pub fn from_json(json: &str) -> Result<Self, VerificationError> {
        serde_json::from_str(json).map_err(|e| VerificationError::config(e.to_string()))
    }

    /// Reject configurations that violate security minimums.
    ///
    /// # Errors
    /// Returns `VerificationError::InvalidConfiguration` naming the first
    /// violated constraint.
    pub fn validate(&self) -> Result<(), VerificationError> {
        let reason = if self.min_shared_secret_length <= 0 {
            "Min Secret Key Length is not a valid value"
        } else if self.password_length < MIN_PASSWORD_LENGTH {
            "Password length is smaller than 6"
        } else if self.password_length > MAX_PASSWORD_LENGTH {
            "Password length is greater than 10"
        } else if self.totp_time_step_interval == 0 {
            "TOTP time step interval must be > 0"
        } else {
            return Ok(());
        };
        tracing::debug!(reason, "rejecting OTP verifier configuration");
        Err(VerificationError::config(reason))
    }

    /// Check a stored shared secret against the configured minimum.
    ///
    /// # Errors
    /// Returns `VerificationError::InvalidConfiguration` if the secret is
    /// empty or shorter than `min_shared_secret_length`.
    pub fn validate_secret(&self, secret: &[u8]) -> Result<(), VerificationError> {
        if secret.is_empty() {
            tracing::debug!("rejecting empty shared secret");
            return Err(VerificationError::config("shared secret must not be empty"));
        }
        let len = i64::try_from(secret.len()).unwrap_or(i64::MAX);
        if len < self.min_shared_secret_length {
            tracing::debug!(
                len,
                min = self.min_shared_secret_length,
                "rejecting short shared secret"
            );
            return Err(VerificationError::config(format!(
                "shared secret is {len} bytes, minimum is {}",
                self.min_shared_secret_length
            )));
        }
        Ok(())
    }

    /// Largest accepted drift magnitude in seconds.
    pub(crate) fn max_drift_seconds(&self) -> i64 {
        i64::from(self.totp_max_clock_drift).saturating_mul(i64::from(self.totp_time_step_interval))
    }
}
