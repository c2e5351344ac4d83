//! Novelty badge derivation from an item's shop history.
//!
//! ## Rules
//!
//! Given the appearance timestamps sorted ascending:
//!
//! | History | Badge |
//! |---------|-------|
//! | fewer than two appearances | `New!` |
//! | last gap is 1 day, previous gap is not | `1 day ago` |
//! | trailing run of k one-day gaps, k > 1 | `In for {k + 1} days` |
//! | last gap is d days, d != 1 | `{d} days ago` |
//!
//! Only the last gap (or the trailing run of one-day gaps) matters; older
//! history only contributes to the appearance count.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

/// Absence long enough to earn the warning border.
pub const LONG_ABSENCE_DAYS: i64 = 365;

/// Classification of the most recent appearances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "days", rename_all = "snake_case")]
pub enum NoveltyKind {
    /// First appearance.
    New,
    /// Consecutive daily appearances, counted in days including today.
    Streak(i64),
    /// Days between the last two appearances.
    DaysAgo(i64),
}

/// Derived novelty metadata for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Novelty {
    pub kind: NoveltyKind,
    /// Total number of recorded appearances.
    pub appearances: usize,
}

impl Novelty {
    /// Derive novelty from a list of appearances in any order.
    pub fn from_history(history: &[DateTime<Utc>]) -> Self {
        let mut dates = history.to_vec();
        dates.sort();
        let n = dates.len();

        let kind = if n < 2 {
            NoveltyKind::New
        } else {
            let d = (dates[n - 1] - dates[n - 2]).num_days();
            if d == 1 {
                let mut streak = 0;
                let mut i = n - 1;
                while i > 0 && (dates[i] - dates[i - 1]).num_days() == 1 {
                    streak += 1;
                    i -= 1;
                }
                if streak > 1 {
                    NoveltyKind::Streak(streak + 1)
                } else {
                    NoveltyKind::DaysAgo(1)
                }
            } else {
                NoveltyKind::DaysAgo(d)
            }
        };

        Self {
            kind,
            appearances: n,
        }
    }

    /// Parse ISO-8601 strings, skipping anything unparseable.
    pub fn from_strings(history: &[String]) -> Self {
        let parsed: Vec<DateTime<Utc>> = history.iter().filter_map(|s| parse_timestamp(s)).collect();
        if parsed.len() != history.len() {
            debug!(
                "Skipped {} unparseable shop history timestamps",
                history.len() - parsed.len()
            );
        }
        Self::from_history(&parsed)
    }

    /// Badge text drawn on the card.
    pub fn badge(&self) -> String {
        match self.kind {
            NoveltyKind::New => "New!".to_string(),
            NoveltyKind::Streak(days) => format!("In for {} days", days),
            NoveltyKind::DaysAgo(1) => "1 day ago".to_string(),
            NoveltyKind::DaysAgo(days) => format!("{} days ago", days),
        }
    }

    /// Appearance count text, `None` for first appearances.
    pub fn visits(&self) -> Option<String> {
        (self.appearances > 1).then(|| format!("{} Visits", self.appearances))
    }

    pub fn is_new(&self) -> bool {
        self.kind == NoveltyKind::New
    }

    /// Gone for at least [`LONG_ABSENCE_DAYS`] before this appearance.
    pub fn is_long_absence(&self) -> bool {
        matches!(self.kind, NoveltyKind::DaysAgo(d) if d >= LONG_ABSENCE_DAYS)
    }
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
