//! Selects the verification strategy for the configured algorithm.

use crate::hotp::verify_hotp;
use crate::totp::verify_totp;
use crate::{DeviceRecord, OathAlgorithm, VerificationError, VerifierConfig};

impl OathAlgorithm {
    /// Run this algorithm's verifier. `now` is ignored for HOTP.
    ///
    /// # Errors
    /// See [`verify_hotp`] and [`verify_totp`].
    pub fn verify(
        self,
        config: &VerifierConfig,
        record: &mut DeviceRecord,
        otp: &str,
        now: i64,
    ) -> Result<(), VerificationError> {
        match self {
            Self::Hotp => verify_hotp(config, record, otp),
            Self::Totp => verify_totp(config, record, otp, now),
        }
    }
}

/// Verify `otp` with the verifier selected by `config.algorithm`.
///
/// On success the caller persists the mutated record; on failure the
/// record is unchanged and the retry/lockout policy is the caller's.
///
/// # Errors
/// See [`verify_hotp`] and [`verify_totp`].
pub fn verify(
    config: &VerifierConfig,
    record: &mut DeviceRecord,
    otp: &str,
    now: i64,
) -> Result<(), VerificationError> {
    config.algorithm.verify(config, record, otp, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_554_119_995;

    fn config(algorithm: OathAlgorithm) -> VerifierConfig {
        VerifierConfig {
            algorithm,
            min_shared_secret_length: 1,
            ..VerifierConfig::default()
        }
    }

    #[test]
    fn dispatches_to_hotp() {
        let mut record = DeviceRecord::from_hex_secret("abcd").unwrap();
        verify(&config(OathAlgorithm::Hotp), &mut record, "564491", NOW).unwrap();
        assert_eq!(record.counter, 1);
        assert_eq!(record.last_login_epoch_seconds, 0);
    }

    #[test]
    fn dispatches_to_totp() {
        let mut record = DeviceRecord::from_hex_secret("abcd").unwrap();
        verify(&config(OathAlgorithm::Totp), &mut record, "433484", NOW).unwrap();
        assert_eq!(record.counter, 0);
        assert_eq!(record.last_login_epoch_seconds, 1_554_119_970);
    }

    #[test]
    fn hotp_code_is_not_a_totp_code() {
        let mut record = DeviceRecord::from_hex_secret("abcd").unwrap();
        let err = verify(&config(OathAlgorithm::Totp), &mut record, "564491", NOW).unwrap_err();
        assert_eq!(err, VerificationError::VerificationFailed);
        assert!(err.is_user_failure());
    }
}
