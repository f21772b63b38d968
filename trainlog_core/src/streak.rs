//! Consecutive completed-days streak.

use chrono::{Days, NaiveDate};
use std::collections::BTreeSet;

/// Count consecutive completed days ending at `today`; 0 if today is missing.
pub fn compute_streak(completed: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut day = today;
    while completed.contains(&day) {
        streak += 1;
        match day.checked_sub_days(Days::new(1)) {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}
