//! Belgian phone normalization and postal-code validation.
//!
//! Pure and deterministic; the orchestrator and the spam engine both call in
//! here, and the same functions back the client-side pre-checks.

/// Country calling code stripped from international inputs.
const COUNTRY_CODE: &str = "32";

/// Mobile numbers (national numbers starting with `4`) must begin with one of
/// these two-digit prefixes. Landlines skip this check.
const MOBILE_PREFIXES: [&str; 5] = ["45", "46", "47", "48", "49"];

const POSTAL_MIN: u16 = 1000;
const POSTAL_MAX: u16 = 9999;

/// Canonical forms of a valid phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneCheck {
    /// E.164 form, e.g. `+32470123456`.
    pub normalized: String,
    /// National display grouping, e.g. `0470 12 34 56`.
    pub display: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PhoneError {
    #[error("too_short")]
    TooShort,
    #[error("too_long")]
    TooLong,
    #[error("invalid_mobile_prefix")]
    InvalidMobilePrefix,
}

/// Normalizes a loosely formatted Belgian phone number to E.164.
///
/// Accepts `04xxxxxxxx`, `+324xxxxxxxx`, `00324xxxxxxxx`, and spaced
/// variants like `0470 12 34 56`. International prefixes are peeled before
/// the national trunk `0`, in that priority order.
pub fn normalize_belgian_phone(input: &str) -> Result<PhoneCheck, PhoneError> {
    let has_plus = input.trim_start().starts_with('+');
    let mut digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();

    if has_plus && digits.starts_with(COUNTRY_CODE) {
        digits.drain(..COUNTRY_CODE.len());
    } else if digits.starts_with("0032") {
        digits.drain(..4);
    } else if digits.starts_with(COUNTRY_CODE) && digits.len() >= 11 {
        // Country code typed without the leading +.
        digits.drain(..COUNTRY_CODE.len());
    } else if digits.starts_with('0') {
        digits.remove(0);
    }

    if digits.len() < 9 {
        return Err(PhoneError::TooShort);
    }
    if digits.len() > 9 {
        return Err(PhoneError::TooLong);
    }

    if digits.starts_with('4') && !MOBILE_PREFIXES.contains(&&digits[..2]) {
        return Err(PhoneError::InvalidMobilePrefix);
    }

    let display = format!(
        "0{} {} {} {}",
        &digits[..3],
        &digits[3..5],
        &digits[5..7],
        &digits[7..9]
    );

    Ok(PhoneCheck {
        normalized: format!("+{COUNTRY_CODE}{digits}"),
        display,
    })
}

/// Cheap length-only plausibility check for real-time feedback.
pub fn is_phone_plausible(input: &str) -> bool {
    let digits = input.chars().filter(char::is_ascii_digit).count();
    (9..=12).contains(&digits)
}

/// A validated 4-digit postal code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostalCheck {
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PostalError {
    #[error("incomplete")]
    Incomplete,
    #[error("out_of_range")]
    OutOfRange,
}

/// Validates a Belgian postal code (1000-9999).
pub fn validate_belgian_postal_code(input: &str) -> Result<PostalCheck, PostalError> {
    let digits: String = input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(4)
        .collect();

    if digits.len() != 4 {
        return Err(PostalError::Incomplete);
    }

    let value: u16 = digits.parse().map_err(|_| PostalError::OutOfRange)?;
    if !(POSTAL_MIN..=POSTAL_MAX).contains(&value) {
        return Err(PostalError::OutOfRange);
    }

    Ok(PostalCheck { value: digits })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalent_mobile_forms_normalize_identically() {
        let forms = [
            "0470123456",
            "+32470123456",
            "0032470123456",
            "0470 12 34 56",
            "+32 470 12 34 56",
        ];
        for form in forms {
            let check = normalize_belgian_phone(form).expect("valid mobile");
            assert_eq!(check.normalized, "+32470123456", "input {form:?}");
            assert_eq!(check.display, "0470 12 34 56", "input {form:?}");
        }
    }

    #[test]
    fn landlines_skip_mobile_prefix_check() {
        // Leading 5, so the mobile prefix allow-list must not apply.
        let check = normalize_belgian_phone("0512 34 56 78").expect("valid landline");
        assert_eq!(check.normalized, "+32512345678");
        assert_eq!(check.display, "0512 34 56 78");
    }

    #[test]
    fn mobile_outside_allow_list_is_rejected() {
        // Leading 4 but prefix 41 is not an assigned mobile range.
        assert_eq!(
            normalize_belgian_phone("0412345678"),
            Err(PhoneError::InvalidMobilePrefix)
        );
        assert_eq!(
            normalize_belgian_phone("+32440123456"),
            Err(PhoneError::InvalidMobilePrefix)
        );
    }

    #[test]
    fn length_errors_are_distinguished() {
        assert_eq!(normalize_belgian_phone("047012"), Err(PhoneError::TooShort));
        assert_eq!(
            normalize_belgian_phone("047012345678"),
            Err(PhoneError::TooLong)
        );
    }

    #[test]
    fn plausibility_is_length_only() {
        assert!(is_phone_plausible("0470 12 34 56"));
        assert!(is_phone_plausible("+32470123456"));
        assert!(!is_phone_plausible("1234"));
        assert!(!is_phone_plausible("1234567890123456"));
    }

    #[test]
    fn postal_codes_in_range_are_accepted() {
        for input in ["1000", "9999", "1000 Bruxelles", "B-1180"] {
            let check = validate_belgian_postal_code(input).expect("valid code");
            assert_eq!(check.value.len(), 4, "input {input:?}");
        }
    }

    #[test]
    fn postal_codes_below_range_are_out_of_range() {
        assert_eq!(
            validate_belgian_postal_code("0999"),
            Err(PostalError::OutOfRange)
        );
    }

    #[test]
    fn short_postal_codes_are_incomplete() {
        assert_eq!(
            validate_belgian_postal_code("123"),
            Err(PostalError::Incomplete)
        );
        assert_eq!(
            validate_belgian_postal_code(""),
            Err(PostalError::Incomplete)
        );
    }
}
