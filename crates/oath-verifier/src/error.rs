//! Verification error types for `oath-verifier`.

use thiserror::Error;

/// Errors produced by an OTP verification attempt.
///
/// A failed attempt never mutates the device record, whichever variant
/// is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Configuration or stored secret violates a security minimum.
    /// This is a setup defect, not a wrong code typed by the user.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No candidate code in the resynchronization window matched.
    #[error("invalid OTP")]
    VerificationFailed,

    /// The OTP is valid for a time step at or before the last accepted one.
    #[error("Login failed attempting to use the same OTP in same Time Step: {step}")]
    ReplayDetected {
        /// Boundary (epoch seconds) of the rejected time step.
        step: i64,
    },
}

impl VerificationError {
    /// Whether the end user should simply be told the code was wrong.
    ///
    /// Replays are reported to the user exactly like a mismatch; only logs
    /// and telemetry see the difference.
    #[must_use]
    pub const fn is_user_failure(&self) -> bool {
        matches!(self, Self::VerificationFailed | Self::ReplayDetected { .. })
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}
