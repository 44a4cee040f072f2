//! Shared primitive types used across the back-office.

use chrono::{DateTime, Utc};

/// Row identifier. Every table uses an INTEGER PRIMARY KEY.
pub type RecordId = i64;

/// Wall-clock instant, always UTC.
pub type Timestamp = DateTime<Utc>;

/// Loyalty points. Signed so a debit can be expressed as a negative delta.
pub type Points = i64;

/// Largest amount a single entry may carry, and the ceiling of a balance.
/// Balances live in a 32-bit range; the wallets table enforces the same bounds.
pub const MAX_POINTS: Points = i32::MAX as Points;

/// Floor of a balance. Debits may go negative, but not past this.
pub const MIN_POINTS: Points = i32::MIN as Points;

/// Check that a caller-supplied id could name a row.
pub fn require_positive_id(field: &str, id: RecordId) -> crate::error::LoyaltyResult<RecordId> {
    if id > 0 {
        Ok(id)
    } else {
        Err(crate::error::LoyaltyError::invalid(
            field,
            "must be a positive integer",
        ))
    }
}
