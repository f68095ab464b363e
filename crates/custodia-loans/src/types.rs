//! Type definitions for the loan domain.
//!
//! Includes enums for loan lifecycle states, operational shifts, and the
//! administrative audit vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Shift
// ============================================================================

/// Operational shift derived from a loan's assignment time.
///
/// Three fixed 8-hour windows over the clock-face time of the timestamp;
/// see [`crate::rules::compute_shift`] for the boundary rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shift {
    /// 06:00 (inclusive) to 14:00 (exclusive).
    #[serde(rename = "SHIFT_1")]
    One,
    /// 14:00 (inclusive) to 22:00 (exclusive).
    #[serde(rename = "SHIFT_2")]
    Two,
    /// 22:00 (inclusive) to 06:00 (exclusive), wrapping midnight.
    #[serde(rename = "SHIFT_3")]
    Three,
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => write!(f, "Shift 1"),
            Self::Two => write!(f, "Shift 2"),
            Self::Three => write!(f, "Shift 3"),
        }
    }
}

// ============================================================================
// Loan Status
// ============================================================================

/// Lifecycle state of a loan.
///
/// A loan is created `Assigned` and transitions exactly once to `Returned`;
/// no further mutation is possible after that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    /// The device is out with an employee.
    Assigned,
    /// The device has been returned.
    Returned,
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assigned => write!(f, "ASSIGNED"),
            Self::Returned => write!(f, "RETURNED"),
        }
    }
}

// ============================================================================
// Audit Vocabulary
// ============================================================================

/// The master-data catalog an audit event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatalogAggregate {
    /// The employee catalog.
    Employee,
    /// The radio-frequency device catalog.
    Device,
    /// The SAP user catalog.
    SapUser,
}

impl CatalogAggregate {
    /// Stable name used in audit records and query filters.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "Employee",
            Self::Device => "Device",
            Self::SapUser => "SapUser",
        }
    }
}

impl fmt::Display for CatalogAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of catalog mutation recorded in an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeAction {
    /// Entity was created.
    Created,
    /// Entity was updated.
    Updated,
    /// Entity was deleted.
    Deleted,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Updated => write!(f, "UPDATED"),
            Self::Deleted => write!(f, "DELETED"),
        }
    }
}
