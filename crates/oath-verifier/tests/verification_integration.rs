#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Integration tests for the verification engine.
//!
//! Exercises the caller's full cycle: load config and record, verify,
//! persist the record, and verify again against the persisted copy.

use oath_verifier::{verify, DeviceRecord, OathAlgorithm, VerificationError, VerifierConfig};

/// 2019-04-01T11:59:55Z
const NOW: i64 = 1_554_119_995;
const NOW_STEP: i64 = 1_554_119_970;

fn hotp_config() -> VerifierConfig {
    VerifierConfig::from_json(
        r#"{
            "algorithm": "HOTP",
            "min_shared_secret_length": 1,
            "password_length": 6,
            "checksum": false,
            "truncation_offset": -1,
            "hotp_window_size": 100
        }"#,
    )
    .unwrap()
}

fn totp_config() -> VerifierConfig {
    VerifierConfig::from_json(
        r#"{
            "algorithm": "TOTP",
            "min_shared_secret_length": 1,
            "password_length": 6,
            "totp_time_step_interval": 30,
            "totp_time_steps_in_window": 2,
            "totp_max_clock_drift": 5
        }"#,
    )
    .unwrap()
}

/// Serialize and reload, as a persistence layer would between calls.
fn persist(record: &DeviceRecord) -> DeviceRecord {
    let stored = serde_json::to_string(record).unwrap();
    serde_json::from_str(&stored).unwrap()
}

#[test]
fn hotp_sequence_across_persistence() {
    let config = hotp_config();
    let mut record = DeviceRecord::from_hex_secret("abcd")
        .unwrap()
        .with_device_name("hardware token");

    verify(&config, &mut record, "564491", NOW).unwrap();
    assert_eq!(record.counter, 1);

    let mut reloaded = persist(&record);
    assert_eq!(reloaded, record);
    verify(&config, &mut reloaded, "853971", NOW).unwrap();
    assert_eq!(reloaded.counter, 2);
    assert_eq!(reloaded.device_name, "hardware token");
}

#[test]
fn hotp_failure_leaves_record_identical() {
    let config = hotp_config();
    let mut record = DeviceRecord::from_hex_secret("abcd").unwrap();
    record.counter = 5;
    let before = record.clone();
    let err = verify(&config, &mut record, "564491", NOW).unwrap_err();
    assert_eq!(err, VerificationError::VerificationFailed);
    assert_eq!(record, before);
}

#[test]
fn totp_login_then_replay_then_next_step() {
    let config = totp_config();
    let mut record = DeviceRecord::from_hex_secret("abcd").unwrap();
    record.last_login_epoch_seconds = NOW - 120;

    verify(&config, &mut record, "433484", NOW).unwrap();
    assert_eq!(record.last_login_epoch_seconds, NOW_STEP);
    assert_eq!(record.clock_drift_seconds, 0);

    let mut reloaded = persist(&record);
    let err = verify(&config, &mut reloaded, "433484", NOW + 2).unwrap_err();
    assert!(matches!(err, VerificationError::ReplayDetected { step } if step == NOW_STEP));
    assert!(err.is_user_failure());
    assert_eq!(reloaded, record);

    // Next step's code is still fresh.
    verify(&config, &mut reloaded, "394482", NOW + 10).unwrap();
    assert_eq!(reloaded.last_login_epoch_seconds, NOW_STEP + 30);
    assert_eq!(reloaded.clock_drift_seconds, 0);
}

#[test]
fn totp_drift_is_learned() {
    let config = totp_config();
    let mut record = DeviceRecord::from_hex_secret("abcd").unwrap();
    record.last_login_epoch_seconds = NOW - 31;

    verify(&config, &mut record, "394482", NOW).unwrap();
    assert_eq!(record.clock_drift_seconds, 30);
    assert_eq!(record.last_login_epoch_seconds, NOW + 5);
}

#[test]
fn invalid_configuration_rejects_every_code() {
    let mut record = DeviceRecord::from_hex_secret("abcd").unwrap();
    let before = record.clone();
    for config in [
        VerifierConfig {
            min_shared_secret_length: 0,
            ..totp_config()
        },
        VerifierConfig {
            password_length: 5,
            ..hotp_config()
        },
    ] {
        for otp in ["433484", "564491", "000000"] {
            let err = verify(&config, &mut record, otp, NOW).unwrap_err();
            assert!(matches!(err, VerificationError::InvalidConfiguration(_)));
            assert!(!err.is_user_failure());
        }
    }
    assert_eq!(record, before);
}

#[test]
fn secret_shorter_than_minimum_is_configuration_error() {
    // Default minimum is 16 bytes; "abcd" decodes to two.
    let config = VerifierConfig {
        algorithm: OathAlgorithm::Hotp,
        ..VerifierConfig::default()
    };
    let mut record = DeviceRecord::from_hex_secret("abcd").unwrap();
    let err = verify(&config, &mut record, "564491", NOW).unwrap_err();
    assert!(matches!(err, VerificationError::InvalidConfiguration(_)));
    assert_eq!(record.counter, 0);
}
