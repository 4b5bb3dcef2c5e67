//! Trigger Ranker
//!
//! Co-occurrence heuristic: every food eaten the day before a poor day
//! is a candidate, ranked by how often that happens.

use crate::analytics::window::{antecedent_day, DateWindow};
use crate::store::{Meal, RecordStore, StoreResult, UserId};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

/// Days with physical feeling at or below this are poor outcome days
pub const POOR_FEELING_THRESHOLD: u8 = 2;

/// Maximum number of ranked triggers returned
pub const TOP_TRIGGERS: usize = 10;

/// A food and how many poor days it preceded
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TriggerCandidate {
    pub food: String,
    pub count: u32,
}

/// Counter that remembers the order keys were first seen
#[derive(Debug, Default)]
pub struct OccurrenceTally {
    entries: Vec<(String, u32)>,
    index: HashMap<String, usize>,
}

impl OccurrenceTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), 1));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries by count descending, ties in discovery order
    pub fn ranked(self, top: usize) -> Vec<TriggerCandidate> {
        let mut entries = self.entries;
        // sort_by is stable
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(top);
        entries
            .into_iter()
            .map(|(food, count)| TriggerCandidate { food, count })
            .collect()
    }
}

/// Rank foods eaten the day before poor days in `today - days ..= today`
pub fn symptom_triggers(
    store: &dyn RecordStore,
    user: UserId,
    days: u32,
    today: NaiveDate,
) -> StoreResult<Vec<TriggerCandidate>> {
    let window = DateWindow::trailing(days, today);

    let poor_days: Vec<NaiveDate> = store
        .health_logs(user, &window.query().descending())?
        .into_iter()
        .filter(|log| log.physical_feeling <= POOR_FEELING_THRESHOLD)
        .map(|log| log.date)
        .collect();

    if poor_days.is_empty() {
        return Ok(Vec::new());
    }

    let meals_by_day =
        group_by_day(store.meals(user, &window.with_antecedent_day().descending())?);

    let mut tally = OccurrenceTally::new();
    for day in poor_days.iter().copied().filter_map(antecedent_day) {
        for meal in meals_by_day.get(&day).into_iter().flatten() {
            for link in &meal.foods {
                tally.record(&link.food_name);
            }
        }
    }

    if tally.is_empty() {
        tracing::debug!(
            user_id = %user,
            days,
            poor_days = poor_days.len(),
            "No meals logged before poor days"
        );
        return Ok(Vec::new());
    }

    tracing::debug!(
        user_id = %user,
        days,
        poor_days = poor_days.len(),
        distinct_foods = tally.len(),
        "Ranked symptom triggers"
    );

    Ok(tally.ranked(TOP_TRIGGERS))
}

fn group_by_day(meals: Vec<Meal>) -> HashMap<NaiveDate, Vec<Meal>> {
    let mut grouped: HashMap<NaiveDate, Vec<Meal>> = HashMap::new();
    for meal in meals {
        grouped.entry(meal.date()).or_default().push(meal);
    }
    grouped
}
