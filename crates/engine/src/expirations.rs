//! Expiration selection: skip the current calendar week, take the next few.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// The Sunday-to-Saturday week containing `date`.
pub fn get_week(date: NaiveDate) -> [NaiveDate; 7] {
    let sunday = date - Duration::days(i64::from(date.weekday().num_days_from_sunday()));
    std::array::from_fn(|i| sunday + Duration::days(i as i64))
}

/// Extra constraint on which expirations a flow may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpirationWindow {
    #[default]
    Any,
    /// Strictly later than the given date (rolling out).
    After(NaiveDate),
    /// Strictly earlier than the given date (rolling in).
    Before(NaiveDate),
}

impl ExpirationWindow {
    pub fn admits(self, date: NaiveDate) -> bool {
        match self {
            Self::Any => true,
            Self::After(bound) => date > bound,
            Self::Before(bound) => date < bound,
        }
    }
}

/// The first `num` listed expirations, ascending, that fall after the week
/// containing `today` and inside `window`.
pub fn select_expirations(
    listed: &[NaiveDate],
    today: NaiveDate,
    num: usize,
    window: ExpirationWindow,
) -> Vec<NaiveDate> {
    let week_end = get_week(today)[6];
    let mut candidates: Vec<NaiveDate> = listed
        .iter()
        .copied()
        .filter(|d| *d > week_end && window.admits(*d))
        .collect();
    candidates.sort_unstable();
    candidates.dedup();
    candidates.truncate(num);
    candidates
}
