//! Business rules and identifier normalization.
//!
//! Pure functions applied to every identifier entering the loan flow, plus
//! the shift classification rule. Normalizing before any lookup keeps
//! exclusivity matching consistent regardless of caller formatting.

use chrono::{DateTime, Timelike, Utc};
use custodia_core::{DomainError, Result};

use crate::types::Shift;

/// Normalize an employee document number: digits only, at most 15 chars.
///
/// Returns `None` when nothing usable remains after cleaning.
#[must_use]
pub fn clean_document(input: Option<&str>) -> Option<String> {
    let digits: String = input?
        .chars()
        .filter(char::is_ascii_digit)
        .take(15)
        .collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Normalize a device code: trimmed, upper-cased, at most 25 chars.
#[must_use]
pub fn clean_device_code(input: Option<&str>) -> Option<String> {
    let code: String = input?.trim().to_uppercase().chars().take(25).collect();
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

/// Normalize a SAP username: trimmed, at most 50 chars.
#[must_use]
pub fn clean_sap_username(input: Option<&str>) -> Option<String> {
    let username: String = input?.trim().chars().take(50).collect();
    if username.is_empty() {
        None
    } else {
        Some(username)
    }
}

/// Classify a timestamp into one of the three operational shifts.
///
/// Windows are on the clock-face time of the supplied value, inclusive on
/// the lower bound and exclusive on the upper bound:
///
/// - `[06:00, 14:00)` is [`Shift::One`]
/// - `[14:00, 22:00)` is [`Shift::Two`]
/// - the rest of the day, wrapping midnight, is [`Shift::Three`]
///
/// # Errors
///
/// Returns [`DomainError::InvalidInput`] when no timestamp is supplied; the
/// caller must always provide one, it is never defaulted here.
pub fn compute_shift(timestamp: Option<DateTime<Utc>>) -> Result<Shift> {
    let timestamp = timestamp.ok_or_else(|| {
        DomainError::invalid_input("a timestamp is required to compute the shift")
    })?;
    Ok(match timestamp.hour() {
        6..=13 => Shift::One,
        14..=21 => Shift::Two,
        _ => Shift::Three,
    })
}
