//! # Folio Generation
//!
//! Human-readable sale codes derived deterministically from the posting
//! timestamp. Not a sequence counter: concurrent posts may interleave
//! non-sequentially, but millisecond resolution makes collisions
//! overwhelmingly improbable, and the idempotency key (not the folio) is
//! what guards against duplicates.

use chrono::{DateTime, Utc};

/// Generates a folio for a sale posted at `at`.
///
/// Format: `F-YYYYMMDD-HHMMSS-mmm` (UTC, millisecond suffix).
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use tally_core::folio;
///
/// let at = Utc.with_ymd_and_hms(2026, 8, 26, 14, 30, 5).unwrap()
///     + chrono::Duration::milliseconds(42);
/// assert_eq!(folio::generate(at), "F-20260826-143005-042");
/// ```
pub fn generate(at: DateTime<Utc>) -> String {
    format!(
        "F-{}-{:03}",
        at.format("%Y%m%d-%H%M%S"),
        at.timestamp_subsec_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deterministic_for_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 1, 31, 9, 5, 59).unwrap();
        assert_eq!(generate(at), "F-20260131-090559-000");
        assert_eq!(generate(at), generate(at));
    }

    #[test]
    fn test_millisecond_suffix_differs() {
        let base = Utc.with_ymd_and_hms(2026, 1, 31, 9, 5, 59).unwrap();
        let later = base + chrono::Duration::milliseconds(7);
        assert_ne!(generate(base), generate(later));
        assert!(generate(later).ends_with("-007"));
    }
}
