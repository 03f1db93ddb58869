//! RFC 4226 OATH code generation shared by the HOTP and TOTP verifiers.
//!
//! HMAC-SHA1 over the 8-byte big-endian moving factor via `ring::hmac`,
//! then dynamic (or fixed-offset) truncation to a decimal code, with the
//! optional RFC 4226 reference checksum digit appended.

use ring::hmac;
use serde::{Deserialize, Serialize};

use crate::VerificationError;

/// Digest bytes consumed by truncation.
const TRUNCATION_LEN: usize = 4;

/// RFC 4226 reference table: `2 * d` with its digits summed.
const DOUBLE_DIGITS: [u8; 10] = [0, 2, 4, 6, 8, 1, 3, 5, 7, 9];

const DECIMAL: &[u8; 10] = b"0123456789";

/// Where truncation starts reading in the HMAC digest.
///
/// Serialized as an integer: any negative value selects dynamic truncation
/// (the RFC's `-1` sentinel), a non-negative value is a fixed byte offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum TruncationOffset {
    /// Offset taken from the low nibble of the digest's last byte.
    #[default]
    Dynamic,
    /// Fixed offset, clamped so that four digest bytes remain.
    Fixed(u32),
}

impl TruncationOffset {
    /// Resolve the offset for a concrete digest.
    fn resolve(self, digest: &[u8]) -> usize {
        match self {
            Self::Dynamic => usize::from(digest[digest.len().wrapping_sub(1)] & 0x0F),
            Self::Fixed(n) => usize::try_from(n)
                .unwrap_or(usize::MAX)
                .min(digest.len().saturating_sub(TRUNCATION_LEN)),
        }
    }
}

impl From<i64> for TruncationOffset {
    fn from(value: i64) -> Self {
        if value < 0 {
            Self::Dynamic
        } else {
            Self::Fixed(u32::try_from(value).unwrap_or(u32::MAX))
        }
    }
}

impl From<TruncationOffset> for i64 {
    fn from(value: TruncationOffset) -> Self {
        match value {
            TruncationOffset::Dynamic => -1,
            TruncationOffset::Fixed(n) => Self::from(n),
        }
    }
}

/// Constant-time byte comparison for OTP codes.
///
/// Returns `true` iff both slices have equal length and identical contents.
/// The early return on length mismatch only leaks the code length, which
/// is public configuration.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// RFC 4226 reference checksum over an already zero-padded decimal code.
///
/// Doubles every other digit starting from the rightmost one.
fn checksum_digit(code: &str) -> char {
    let mut double_digit = true;
    let mut total = 0u32;
    for byte in code.bytes().rev() {
        let mut digit = byte.wrapping_sub(b'0');
        if double_digit {
            digit = DOUBLE_DIGITS[usize::from(digit % 10)];
        }
        total = total.wrapping_add(u32::from(digit));
        double_digit = !double_digit;
    }
    let result = 10u32.wrapping_sub(total % 10) % 10;
    char::from(DECIMAL[usize::try_from(result).unwrap_or(0)])
}

/// Generate an OATH code per RFC 4226 §5.3.
///
/// # Arguments
/// - `secret`: shared secret bytes (HMAC key)
/// - `moving_factor`: HOTP counter or TOTP time step
/// - `digits`: code length excluding the checksum digit
/// - `checksum`: append the RFC 4226 checksum digit
/// - `truncation`: dynamic or fixed truncation offset
///
/// The result is exactly `digits` characters long (one more with
/// `checksum`), all decimal.
///
/// # Errors
/// Returns `VerificationError::InvalidConfiguration` if the secret is empty
/// or `10^digits` does not fit in a `u64`.
#[must_use = "OTP code should be compared or discarded explicitly"]
pub fn generate_code(
    secret: &[u8],
    moving_factor: u64,
    digits: u32,
    checksum: bool,
    truncation: TruncationOffset,
) -> Result<String, VerificationError> {
    if secret.is_empty() {
        return Err(VerificationError::config("shared secret must not be empty"));
    }
    let modulus = 10u64
        .checked_pow(digits)
        .ok_or_else(|| VerificationError::config(format!("unsupported digit count {digits}")))?;
    let width = usize::try_from(digits)
        .map_err(|_| VerificationError::config(format!("unsupported digit count {digits}")))?;

    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, secret);
    let tag = hmac::sign(&key, &moving_factor.to_be_bytes());
    let digest = tag.as_ref();

    let offset = truncation.resolve(digest);
    // Masking the top bit keeps the value a non-negative 31-bit integer.
    let binary_code = u32::from_be_bytes([
        digest[offset] & 0x7F,
        digest[offset.wrapping_add(1)],
        digest[offset.wrapping_add(2)],
        digest[offset.wrapping_add(3)],
    ]);

    // modulus is a power of ten, never zero.
    #[allow(clippy::arithmetic_side_effects)]
    let code = u64::from(binary_code) % modulus;

    let mut otp = format!("{code:0>width$}");
    if checksum {
        let digit = checksum_digit(&otp);
        otp.push(digit);
    }
    Ok(otp)
}
