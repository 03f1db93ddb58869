//! RFC 6238 TOTP verification with drift learning and replay prevention.
//!
//! The search window is centred on the current step shifted by the drift
//! learned from earlier logins. Only steps strictly newer than the last
//! accepted one are eligible, which makes a captured code useless once it
//! has been accepted.

use crate::code::{constant_time_eq, generate_code};
use crate::{DeviceRecord, VerificationError, VerifierConfig};

/// One time step inside the search window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Candidate {
    step: u64,
    boundary: i64,
}

/// Window offsets, closest to the centre first: `0, -1, 1, -2, 2, ...`.
fn window_offsets(window: u32) -> impl Iterator<Item = i64> {
    std::iter::once(0).chain((1..=i64::from(window)).flat_map(|i| [i.saturating_neg(), i]))
}

/// Steps around `base_step` that exist (non-negative) and whose boundary
/// fits in an `i64`.
fn candidates(base_step: i64, window: u32, interval: i64) -> impl Iterator<Item = Candidate> {
    window_offsets(window).filter_map(move |offset| {
        let step = base_step.checked_add(offset)?;
        let boundary = step.checked_mul(interval)?;
        Some(Candidate {
            step: u64::try_from(step).ok()?,
            boundary,
        })
    })
}

/// Verify a TOTP code against a device record at time `now`.
///
/// `now` is Unix time in seconds, passed in so verification is
/// deterministic. On success the record's last login moves to the matched
/// step boundary and its clock drift becomes the matched step's distance
/// from the real current step, clamped to `totp_max_clock_drift` steps.
///
/// # Errors
/// - `VerificationError::InvalidConfiguration` if the configuration or the
///   stored secret fails validation (checked before any HMAC).
/// - `VerificationError::ReplayDetected` if the code only matches a step at
///   or before the last accepted one.
/// - `VerificationError::VerificationFailed` if nothing in the window
///   matches.
///
/// The record is left untouched on every error.
pub fn verify_totp(
    config: &VerifierConfig,
    record: &mut DeviceRecord,
    otp: &str,
    now: i64,
) -> Result<(), VerificationError> {
    config.validate()?;
    config.validate_secret(&record.shared_secret)?;

    // interval is validated > 0, so Euclidean division cannot fail.
    let interval = i64::from(config.totp_time_step_interval);
    let base_step = now
        .saturating_add(record.clock_drift_seconds)
        .div_euclid(interval);
    let now_boundary = now.div_euclid(interval).saturating_mul(interval);
    let last_login = record.last_login_epoch_seconds;

    let matches = |candidate: &Candidate| -> Result<bool, VerificationError> {
        let expected = generate_code(
            &record.shared_secret,
            candidate.step,
            config.password_length,
            config.checksum,
            config.truncation_offset,
        )?;
        Ok(constant_time_eq(expected.as_bytes(), otp.as_bytes()))
    };

    let window = config.totp_time_steps_in_window;
    let mut accepted = None;
    for candidate in candidates(base_step, window, interval).filter(|c| c.boundary > last_login) {
        if matches(&candidate)? {
            accepted = Some(candidate);
            break;
        }
    }

    if let Some(candidate) = accepted {
        let max_drift = config.max_drift_seconds();
        let drift = candidate
            .boundary
            .saturating_sub(now_boundary)
            .clamp(max_drift.saturating_neg(), max_drift);
        record.clock_drift_seconds = drift;
        record.last_login_epoch_seconds = candidate.boundary;
        tracing::info!(
            device = %record.device_name,
            step = candidate.boundary,
            drift,
            "TOTP code accepted"
        );
        return Ok(());
    }

    // Only classify the failure; replayed steps are never accepted.
    for candidate in candidates(base_step, window, interval).filter(|c| c.boundary <= last_login) {
        if matches(&candidate)? {
            tracing::warn!(
                device = %record.device_name,
                step = candidate.boundary,
                last_login,
                "TOTP replay detected"
            );
            return Err(VerificationError::ReplayDetected {
                step: candidate.boundary,
            });
        }
    }

    tracing::debug!(
        device = %record.device_name,
        base_step,
        window,
        "TOTP code did not match any step in window"
    );
    Err(VerificationError::VerificationFailed)
}
