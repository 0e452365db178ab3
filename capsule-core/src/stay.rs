use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A half-open stay interval `[check_in, check_out)`.
///
/// Dates are day-granular; the checkout night is not occupied. Keeping the
/// fields as `NaiveDate` means intraday timestamp drift cannot produce false
/// negatives in overlap checks; callers holding timestamps normalize via
/// [`StayRange::date_of`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayRange {
    /// Build a stay range, rejecting empty or inverted intervals.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, StayRangeError> {
        if check_in >= check_out {
            return Err(StayRangeError::Empty {
                check_in,
                check_out,
            });
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// True iff the two half-open intervals share at least one night:
    /// `a1 < b2 && b1 < a2`.
    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    /// Number of nights covered by this range.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Number of nights `other` takes out of this range, clipped to this
    /// range's bounds. Zero when the ranges do not overlap.
    pub fn overlap_nights(&self, other: &StayRange) -> i64 {
        let start = self.check_in.max(other.check_in);
        let end = self.check_out.min(other.check_out);
        (end - start).num_days().max(0)
    }

    /// Normalize a timestamp to the day it falls on (UTC midnight boundary).
    pub fn date_of(at: DateTime<Utc>) -> NaiveDate {
        at.date_naive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StayRangeError {
    #[error("check-in {check_in} must be before check-out {check_out}")]
    Empty {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range(a: (i32, u32, u32), b: (i32, u32, u32)) -> StayRange {
        StayRange::new(date(a.0, a.1, a.2), date(b.0, b.1, b.2)).unwrap()
    }

    #[test]
    fn test_rejects_empty_and_inverted_ranges() {
        assert!(StayRange::new(date(2025, 3, 1), date(2025, 3, 1)).is_err());
        assert!(StayRange::new(date(2025, 3, 3), date(2025, 3, 1)).is_err());
        assert!(StayRange::new(date(2025, 3, 1), date(2025, 3, 2)).is_ok());
    }

    #[test]
    fn test_overlap_truth_table() {
        let base = range((2025, 3, 10), (2025, 3, 15));

        // Fully before / fully after
        assert!(!base.overlaps(&range((2025, 3, 1), (2025, 3, 10))));
        assert!(!base.overlaps(&range((2025, 3, 15), (2025, 3, 20))));

        // Back-to-back stays share the turnover day but no night
        assert!(!range((2025, 3, 1), (2025, 3, 10)).overlaps(&base));

        // Partial overlaps at both edges
        assert!(base.overlaps(&range((2025, 3, 8), (2025, 3, 11))));
        assert!(base.overlaps(&range((2025, 3, 14), (2025, 3, 18))));

        // Containment in both directions
        assert!(base.overlaps(&range((2025, 3, 11), (2025, 3, 12))));
        assert!(base.overlaps(&range((2025, 3, 1), (2025, 3, 30))));

        // Identity
        assert!(base.overlaps(&base));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let a = range((2025, 3, 10), (2025, 3, 15));
        let b = range((2025, 3, 14), (2025, 3, 18));
        assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    #[test]
    fn test_nights() {
        assert_eq!(range((2025, 3, 1), (2025, 3, 3)).nights(), 2);
        assert_eq!(range((2025, 2, 27), (2025, 3, 2)).nights(), 3);
    }

    #[test]
    fn test_overlap_nights_clipped_to_window() {
        let window = range((2025, 3, 10), (2025, 3, 15));

        // Blocker hangs over both ends: clipped to the full window
        assert_eq!(window.overlap_nights(&range((2025, 3, 1), (2025, 3, 30))), 5);

        // Blocker inside the window
        assert_eq!(window.overlap_nights(&range((2025, 3, 11), (2025, 3, 13))), 2);

        // Edge overlap
        assert_eq!(window.overlap_nights(&range((2025, 3, 14), (2025, 3, 20))), 1);

        // Disjoint
        assert_eq!(window.overlap_nights(&range((2025, 3, 20), (2025, 3, 25))), 0);
    }

    #[test]
    fn test_date_of_truncates_to_day() {
        let at = DateTime::parse_from_rfc3339("2025-03-01T23:59:59Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(StayRange::date_of(at), date(2025, 3, 1));
    }
}
