//! Trend Extractor
//!
//! Projects one record kind into per-day `{date, value}` series.
//!
//! Each supported field is an explicit variant paired with its own
//! extraction, so a series can only be requested for a field that exists.
//! Records without a value for the field (no stool quality, no weight)
//! are skipped rather than emitted as gaps.

use crate::analytics::window::DateWindow;
use crate::store::{HealthLog, RecordStore, SleepLog, StoolQuality, StoreResult, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A record that belongs to one calendar day
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for HealthLog {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for SleepLog {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Value of a single trend point
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(untagged)]
pub enum TrendValue {
    /// 1-5 rating
    Score(u8),
    /// Categorical stool quality
    Quality(StoolQuality),
    /// Decimal measurement (kilograms, hours)
    Measure(f64),
}

impl TrendValue {
    /// Numeric view of the value, `None` for categories
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TrendValue::Score(v) => Some(f64::from(*v)),
            TrendValue::Measure(v) => Some(*v),
            TrendValue::Quality(_) => None,
        }
    }
}

/// One day of a trend series
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: TrendValue,
}

/// A field of record kind `R` that can be projected into a series
pub trait TrendField<R>: Copy {
    /// Output key of the series
    fn name(&self) -> &'static str;

    /// Value for this record, `None` when the field is absent
    fn extract(&self, record: &R) -> Option<TrendValue>;
}

/// Trendable health log fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthField {
    PhysicalFeeling,
    MentalFeeling,
    StoolQuality,
    Weight,
}

impl HealthField {
    pub const ALL: [HealthField; 4] = [
        HealthField::PhysicalFeeling,
        HealthField::MentalFeeling,
        HealthField::StoolQuality,
        HealthField::Weight,
    ];
}

impl TrendField<HealthLog> for HealthField {
    fn name(&self) -> &'static str {
        match self {
            HealthField::PhysicalFeeling => "physical_feeling",
            HealthField::MentalFeeling => "mental_feeling",
            HealthField::StoolQuality => "stool_quality",
            HealthField::Weight => "weight",
        }
    }

    fn extract(&self, log: &HealthLog) -> Option<TrendValue> {
        match self {
            HealthField::PhysicalFeeling => Some(TrendValue::Score(log.physical_feeling)),
            HealthField::MentalFeeling => Some(TrendValue::Score(log.mental_feeling)),
            HealthField::StoolQuality => log.stool_quality.map(TrendValue::Quality),
            // Zero weight is treated as "not recorded"
            HealthField::Weight => log
                .weight
                .filter(|w| *w != 0.0)
                .map(TrendValue::Measure),
        }
    }
}

/// Trendable sleep log fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepField {
    Duration,
    Quality,
}

impl TrendField<SleepLog> for SleepField {
    fn name(&self) -> &'static str {
        match self {
            SleepField::Duration => "duration",
            SleepField::Quality => "quality",
        }
    }

    fn extract(&self, log: &SleepLog) -> Option<TrendValue> {
        Some(match self {
            SleepField::Duration => TrendValue::Measure(log.duration),
            SleepField::Quality => TrendValue::Score(log.quality),
        })
    }
}

/// Project `records` (already ascending by date) onto `field`
pub fn series<R, F>(records: &[R], field: F) -> Vec<TrendPoint>
where
    R: Dated,
    F: TrendField<R>,
{
    records
        .iter()
        .filter_map(|r| {
            field.extract(r).map(|value| TrendPoint {
                date: r.date(),
                value,
            })
        })
        .collect()
}

/// Re-sort a newest-first fetch into ascending date order
pub fn ascending<R: Dated>(mut records: Vec<R>) -> Vec<R> {
    records.sort_by_key(|r| r.date());
    records
}

/// All health log trend series over one window
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct HealthTrends {
    pub physical_feeling: Vec<TrendPoint>,
    pub mental_feeling: Vec<TrendPoint>,
    pub stool_quality: Vec<TrendPoint>,
    pub weight: Vec<TrendPoint>,
}

impl HealthTrends {
    /// Build every series from ascending logs
    pub fn from_logs(logs: &[HealthLog]) -> Self {
        Self {
            physical_feeling: series(logs, HealthField::PhysicalFeeling),
            mental_feeling: series(logs, HealthField::MentalFeeling),
            stool_quality: series(logs, HealthField::StoolQuality),
            weight: series(logs, HealthField::Weight),
        }
    }

    /// Series for one field
    pub fn get(&self, field: HealthField) -> &[TrendPoint] {
        match field {
            HealthField::PhysicalFeeling => &self.physical_feeling,
            HealthField::MentalFeeling => &self.mental_feeling,
            HealthField::StoolQuality => &self.stool_quality,
            HealthField::Weight => &self.weight,
        }
    }
}

/// The most recent health logs (at most `days`) of the inclusive window, ascending
fn windowed_health_logs(
    store: &dyn RecordStore,
    user: UserId,
    days: u32,
    today: NaiveDate,
) -> StoreResult<Vec<HealthLog>> {
    let window = DateWindow::inclusive(days, today);
    let logs = store.health_logs(user, &window.latest())?;
    Ok(ascending(logs))
}

/// Health trends over the last `days` days ending `today`
pub fn health_trends(
    store: &dyn RecordStore,
    user: UserId,
    days: u32,
    today: NaiveDate,
) -> StoreResult<HealthTrends> {
    let logs = windowed_health_logs(store, user, days, today)?;

    tracing::debug!(user_id = %user, days, records = logs.len(), "Computed health trends");

    Ok(HealthTrends::from_logs(&logs))
}

/// A single health field's trend over the last `days` days ending `today`
pub fn health_field_trend(
    store: &dyn RecordStore,
    user: UserId,
    field: HealthField,
    days: u32,
    today: NaiveDate,
) -> StoreResult<Vec<TrendPoint>> {
    let logs = windowed_health_logs(store, user, days, today)?;
    Ok(series(&logs, field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{NewHealthLog, SqliteStore};
    use chrono::Days;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn days_ago(n: u64) -> NaiveDate {
        today().checked_sub_days(Days::new(n)).unwrap()
    }

    fn values(points: &[TrendPoint]) -> Vec<f64> {
        points.iter().filter_map(|p| p.value.as_f64()).collect()
    }

    #[test]
    fn test_seven_day_physical_feeling_scenario() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = UserId(1);
        let feelings = [3, 4, 5, 3, 4, 5, 3];

        // oldest → newest
        for (i, feeling) in feelings.iter().enumerate() {
            let date = days_ago(6 - i as u64);
            store
                .create_health_log(user, &NewHealthLog::new(date, *feeling, 3))
                .unwrap();
        }

        let trends = health_trends(&store, user, 7, today()).unwrap();

        assert_eq!(trends.physical_feeling.len(), 7);
        assert_eq!(values(&trends.physical_feeling), vec![3.0, 4.0, 5.0, 3.0, 4.0, 5.0, 3.0]);
        assert_eq!(trends.physical_feeling[0].date, days_ago(6));
        assert_eq!(trends.physical_feeling[6].date, today());
        assert!(trends
            .physical_feeling
            .windows(2)
            .all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_window_excludes_older_and_future_records() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = UserId(1);

        store
            .create_health_log(user, &NewHealthLog::new(days_ago(7), 1, 1))
            .unwrap();
        store
            .create_health_log(user, &NewHealthLog::new(days_ago(6), 2, 2))
            .unwrap();
        store
            .create_health_log(user, &NewHealthLog::new(today().succ_opt().unwrap(), 5, 5))
            .unwrap();

        let trends = health_trends(&store, user, 7, today()).unwrap();
        assert_eq!(values(&trends.physical_feeling), vec![2.0]);
    }

    #[test]
    fn test_sparse_records_are_not_gap_filled() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = UserId(1);

        for n in [0, 3, 9, 20] {
            store
                .create_health_log(user, &NewHealthLog::new(days_ago(n), 4, 2))
                .unwrap();
        }

        let trends = health_trends(&store, user, 30, today()).unwrap();
        assert_eq!(trends.mental_feeling.len(), 4);
        assert!(trends.mental_feeling.len() <= 30);
    }

    #[test]
    fn test_optional_fields_filtered() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = UserId(1);

        store
            .create_health_log(
                user,
                &NewHealthLog::new(days_ago(2), 3, 3)
                    .stool_quality(StoolQuality::Hard)
                    .weight(70.5),
            )
            .unwrap();
        store
            .create_health_log(user, &NewHealthLog::new(days_ago(1), 3, 3))
            .unwrap();
        store
            .create_health_log(
                user,
                &NewHealthLog::new(today(), 3, 3).stool_quality(StoolQuality::Normal),
            )
            .unwrap();

        let trends = health_trends(&store, user, 7, today()).unwrap();

        assert_eq!(trends.physical_feeling.len(), 3);
        assert_eq!(
            trends
                .stool_quality
                .iter()
                .map(|p| p.value)
                .collect::<Vec<_>>(),
            vec![
                TrendValue::Quality(StoolQuality::Hard),
                TrendValue::Quality(StoolQuality::Normal)
            ]
        );
        assert_eq!(trends.weight.len(), 1);
        assert_eq!(trends.weight[0].value, TrendValue::Measure(70.5));
    }

    #[test]
    fn test_single_field_matches_full_trends() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = UserId(1);

        for n in 0..5 {
            store
                .create_health_log(user, &NewHealthLog::new(days_ago(n), 2, 4))
                .unwrap();
        }

        let trends = health_trends(&store, user, 5, today()).unwrap();
        for field in HealthField::ALL {
            let single = health_field_trend(&store, user, field, 5, today()).unwrap();
            assert_eq!(single.as_slice(), trends.get(field));
        }
    }

    #[test]
    fn test_trends_are_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = UserId(1);
        store
            .create_health_log(user, &NewHealthLog::new(today(), 4, 4))
            .unwrap();

        let first = health_trends(&store, user, 30, today()).unwrap();
        let second = health_trends(&store, user, 30, today()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_trend_point_serialization() {
        let point = TrendPoint {
            date: today(),
            value: TrendValue::Quality(StoolQuality::Soft),
        };
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, r#"{"date":"2024-03-10","value":"soft"}"#);

        let point = TrendPoint {
            date: today(),
            value: TrendValue::Score(4),
        };
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, r#"{"date":"2024-03-10","value":4}"#);
    }

    #[test]
    fn test_field_names() {
        let names: Vec<_> = HealthField::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec!["physical_feeling", "mental_feeling", "stool_quality", "weight"]
        );
        assert_eq!(SleepField::Quality.name(), "quality");
    }
}
