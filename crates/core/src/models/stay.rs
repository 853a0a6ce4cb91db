//! Date ranges for stays
//!
//! A stay is the half-open interval `[check_in, check_out)`: the guest holds
//! the room on the night of `check_in` and leaves on the morning of
//! `check_out`, so a departure and an arrival on the same day do not collide.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ValidationError;

/// Wire format for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date supplied by a collaborator
pub fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(s.to_string()))
}

/// A validated half-open date interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StayDates {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayDates {
    /// Build a range, rejecting empty or inverted intervals
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, ValidationError> {
        if check_in >= check_out {
            return Err(ValidationError::CheckOutNotAfterCheckIn);
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// Rebuild a range read back from the ledger.
    ///
    /// The table's CHECK constraint already guarantees `check_in < check_out`.
    pub(crate) fn from_stored(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        debug_assert!(check_in < check_out);
        Self {
            check_in,
            check_out,
        }
    }

    /// Build a range from two `YYYY-MM-DD` strings
    pub fn parse(check_in: &str, check_out: &str) -> Result<Self, ValidationError> {
        Self::new(parse_date(check_in)?, parse_date(check_out)?)
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Nights covered by the stay (always at least one)
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Half-open overlap: `[a,b)` and `[c,d)` conflict iff `a < d && c < b`
    pub fn overlaps(&self, other: &StayDates) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    /// Whether the guest holds the room on the night of `date`
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date < self.check_out
    }
}
