//! Command interpretation for the `X:<int>,Y:<int>` line format.
//!
//! Extraction is positional: the first `X:` and the first `,Y:` in the line
//! delimit the fields, and anything around them is ignored.

use crate::constants::{X_MARKER, Y_MARKER};
use crate::types::{clamp_angle, Angles};

/// Parse the leading integer of `text`, returning 0 when there is none.
///
/// Leading ASCII whitespace (as C `isspace` sees it) and a single sign are
/// accepted; parsing stops at the first non-digit. Values that do not fit an
/// `i64` saturate.
pub fn parse_int_prefix(text: &str) -> i64 {
    let trimmed = text.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '\x0b');
    let mut chars = trimmed.chars().peekable();

    let negative = match chars.peek() {
        Some('-') => {
            chars.next();
            true
        }
        Some('+') => {
            chars.next();
            false
        }
        _ => false,
    };

    let mut value: i64 = 0;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        chars.next();
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit as i64)
        } else {
            value.saturating_mul(10).saturating_add(digit as i64)
        };
    }
    value
}

/// Extract and clamp the target angles from one line.
///
/// Returns `None` when either marker is missing; the caller leaves its state
/// untouched in that case.
pub fn parse_command(line: &str) -> Option<Angles> {
    let x_idx = line.find(X_MARKER)?;
    let y_idx = line.find(Y_MARKER)?;

    let x_start = x_idx + X_MARKER.len();
    let x_field = if y_idx >= x_start { &line[x_start..y_idx] } else { "" };
    let y_field = &line[y_idx + Y_MARKER.len()..];

    Some(Angles::new(
        clamp_angle(parse_int_prefix(x_field)),
        clamp_angle(parse_int_prefix(y_field)),
    ))
}
