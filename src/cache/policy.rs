//! Expiry policies by data volatility.

use time::{Duration, OffsetDateTime};

/// Lifetime rules for one cache entry.
///
/// An entry expires once `absolute` has elapsed since insertion, or once
/// `sliding` (when set) has elapsed since its last hit, whichever comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub sliding: Option<Duration>,
    pub absolute: Duration,
}

impl ExpiryPolicy {
    /// Bulk listings and simple counts.
    pub const BULK: Self = Self {
        sliding: Some(Duration::minutes(15)),
        absolute: Duration::hours(1),
    };

    /// Category and search results.
    pub const VOLATILE: Self = Self {
        sliding: Some(Duration::minutes(5)),
        absolute: Duration::minutes(15),
    };

    /// Single question lookups.
    pub const ENTITY: Self = Self {
        sliding: None,
        absolute: Duration::minutes(30),
    };

    /// Date-range counts.
    pub const DATE_RANGE: Self = Self {
        sliding: None,
        absolute: Duration::minutes(10),
    };

    pub fn is_expired(
        &self,
        inserted_at: OffsetDateTime,
        last_hit_at: OffsetDateTime,
        now: OffsetDateTime,
    ) -> bool {
        if now >= inserted_at + self.absolute {
            return true;
        }
        match self.sliding {
            Some(window) => now >= last_hit_at + window,
            None => false,
        }
    }
}
