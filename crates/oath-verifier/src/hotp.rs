//! RFC 4226 HOTP verification with forward counter resynchronization.

use crate::code::{constant_time_eq, generate_code};
use crate::{DeviceRecord, VerificationError, VerifierConfig};

/// Verify an HOTP code against a device record.
///
/// Searches `counter..=counter + hotp_window_size` in ascending order. On
/// the first match the stored counter moves to one past the matched value;
/// nothing else in the record changes. A malformed `otp` simply never
/// matches.
///
/// # Errors
/// - `VerificationError::InvalidConfiguration` if the configuration or the
///   stored secret fails validation (checked before any HMAC).
/// - `VerificationError::VerificationFailed` if no counter in the window
///   matches. The record is left untouched.
pub fn verify_hotp(
    config: &VerifierConfig,
    record: &mut DeviceRecord,
    otp: &str,
) -> Result<(), VerificationError> {
    config.validate()?;
    config.validate_secret(&record.shared_secret)?;

    let start = record.counter;
    let end = start.saturating_add(u64::from(config.hotp_window_size));

    for candidate in start..=end {
        let expected = generate_code(
            &record.shared_secret,
            candidate,
            config.password_length,
            config.checksum,
            config.truncation_offset,
        )?;
        if constant_time_eq(expected.as_bytes(), otp.as_bytes()) {
            record.counter = candidate.saturating_add(1);
            tracing::info!(
                device = %record.device_name,
                counter = candidate,
                skipped = candidate.wrapping_sub(start),
                "HOTP code accepted"
            );
            return Ok(());
        }
    }

    tracing::debug!(
        device = %record.device_name,
        counter = start,
        window = config.hotp_window_size,
        "HOTP code did not match any counter in window"
    );
    Err(VerificationError::VerificationFailed)
}
