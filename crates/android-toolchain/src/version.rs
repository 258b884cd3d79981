//! Dotted version comparison
//!
//! Orders version-named directories such as `20.0.5594570` or `r21b`.
//! Components are compared numerically, so `1.10.0` sorts after `1.9.0`.

use std::cmp::Ordering;

/// Signed difference between two version strings.
///
/// The sign orders the versions; the magnitude is the difference of the
/// first unequal component. Shorter versions are padded with `0`
/// components, and a component without a leading integer counts as `0`.
pub fn version_delta(a: &str, b: &str) -> i64 {
    if a == b {
        return 0;
    }

    let mut left: Vec<&str> = a.split('.').collect();
    let mut right: Vec<&str> = b.split('.').collect();
    let len = left.len().max(right.len());
    left.resize(len, "0");
    right.resize(len, "0");

    for (l, r) in left.iter().zip(right.iter()) {
        let delta = leading_integer(l).saturating_sub(leading_integer(r));
        if delta != 0 {
            return delta;
        }
    }
    0
}

/// Compare two version strings.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    version_delta(a, b).cmp(&0)
}

/// Compare two tokens that may not be strings.
///
/// `None` stands for a token with no string form (for example a directory
/// name that is not valid UTF-8). Any string sorts above such a token, and two
/// of them compare equal.
pub fn compare_tokens(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_versions(a, b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Parse the integer prefix of a component: optional whitespace, optional
/// sign, then digits. Anything else yields `0`.
fn leading_integer(component: &str) -> i64 {
    let trimmed = component.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')));

    if negative {
        -value
    } else {
        value
    }
}
