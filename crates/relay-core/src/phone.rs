//! Phone number normalization
//!
//! Every in-memory lookup is keyed by the normalized form: all whitespace
//! removed and every leading `+` stripped.

/// Normalize a raw phone number.
///
/// Total and idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    compact.trim_start_matches('+').to_string()
}

/// Normalize an optional raw value; absent input yields an empty string.
pub fn normalize_opt(raw: Option<&str>) -> String {
    raw.map(normalize).unwrap_or_default()
}

/// Whether `raw` is a `+`-prefixed E.164 number: 2 to 15 digits, the
/// first one non-zero.
pub fn is_e164(raw: &str) -> bool {
    let Some(digits) = raw.strip_prefix('+') else {
        return false;
    };
    (2..=15).contains(&digits.len())
        && !digits.starts_with('0')
        && digits.bytes().all(|b| b.is_ascii_digit())
}
