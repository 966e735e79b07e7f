//! Main extractor structure

use chrono::{DateTime, Duration, Utc};
use devtrail_core::StatMode;

/// Turns repository history inside a time window into commit records.
#[derive(Debug, Clone)]
pub struct Extractor {
    /// Width of the window, counted back from `now`
    pub(crate) since_days: u32,

    /// How line statistics are computed
    pub(crate) stat_mode: StatMode,

    /// Reference time for the window
    pub(crate) now: DateTime<Utc>,
}

impl Extractor {
    pub fn new(since_days: u32, stat_mode: StatMode) -> Self {
        Self {
            since_days,
            stat_mode,
            now: Utc::now(),
        }
    }

    /// Pins the reference time (reproducible fixtures).
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Commits committed before this instant are left out.
    ///
    /// A window reaching past the earliest representable time covers all
    /// history.
    pub fn cutoff(&self) -> DateTime<Utc> {
        Duration::try_days(i64::from(self.since_days))
            .and_then(|window| self.now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_cutoff_counts_back_from_now() {
        let extractor = Extractor::new(14, StatMode::Exact).with_now(now());
        assert_eq!(extractor.cutoff(), Utc.with_ymd_and_hms(2024, 4, 17, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_cutoff_huge_window_covers_all_history() {
        let extractor = Extractor::new(u32::MAX, StatMode::Exact).with_now(now());
        assert_eq!(extractor.cutoff(), DateTime::<Utc>::MIN_UTC);
    }
}
