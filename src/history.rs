use anyhow::Result;
use chrono::{Duration, NaiveDate};
use std::collections::HashSet;

/// Source of previously eaten recipes, queried one day at a time by the
/// daily-meal aggregation collaborator.
pub trait MealHistory {
    fn recipes_eaten_on(&self, day: NaiveDate) -> Result<Vec<i64>>;
}

/// History source for callers without meal records.
pub struct NoHistory;

impl MealHistory for NoHistory {
    fn recipes_eaten_on(&self, _day: NaiveDate) -> Result<Vec<i64>> {
        Ok(Vec::new())
    }
}

/// Collect recipe ids eaten in the lookback window ending at `target_day`
/// (both endpoints included). Days whose lookup fails are skipped and the
/// walk continues with the rest of the window.
pub fn collect_recent_recipe_ids(
    history: &dyn MealHistory,
    target_day: NaiveDate,
    lookback_days: i64,
) -> HashSet<i64> {
    let mut eaten = HashSet::new();
    let start_date = target_day - Duration::days(lookback_days);
    for offset in 0..=lookback_days {
        let day = start_date + Duration::days(offset);
        if let Ok(recipe_ids) = history.recipes_eaten_on(day) {
            eaten.extend(recipe_ids);
        }
    }
    eaten
}
