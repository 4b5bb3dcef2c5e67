//! Sleep Aggregator

use crate::analytics::trends::{ascending, series, SleepField, TrendPoint};
use crate::analytics::window::DateWindow;
use crate::store::{RecordStore, SleepLog, StoreResult, UserId};
use chrono::NaiveDate;
use serde::Serialize;

/// Sleep statistics over one window
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SleepAnalysis {
    /// Mean hours slept, 0 when no records
    pub average_duration: f64,
    pub average_quality: f64,
    pub average_energy: f64,
    pub quality_trend: Vec<TrendPoint>,
    pub duration_trend: Vec<TrendPoint>,
}

impl SleepAnalysis {
    /// Aggregate ascending sleep logs
    pub fn from_logs(logs: &[SleepLog]) -> Self {
        if logs.is_empty() {
            return Self::default();
        }

        let n = logs.len() as f64;
        let mean = |f: fn(&SleepLog) -> f64| logs.iter().map(f).sum::<f64>() / n;

        Self {
            average_duration: mean(|l| l.duration),
            average_quality: mean(|l| f64::from(l.quality)),
            average_energy: mean(|l| f64::from(l.energy_level)),
            quality_trend: series(logs, SleepField::Quality),
            duration_trend: series(logs, SleepField::Duration),
        }
    }
}

/// Sleep statistics for the most recent `days` days ending `today`
pub fn analyze_sleep(
    store: &dyn RecordStore,
    user: UserId,
    days: u32,
    today: NaiveDate,
) -> StoreResult<SleepAnalysis> {
    let window = DateWindow::inclusive(days, today);
    let logs = ascending(store.sleep_logs(user, &window.latest())?);

    tracing::debug!(user_id = %user, days, records = logs.len(), "Computed sleep analysis");

    Ok(SleepAnalysis::from_logs(&logs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::trends::TrendValue;
    use crate::store::{NewSleepLog, SqliteStore};
    use chrono::Days;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn days_ago(n: u64) -> NaiveDate {
        today().checked_sub_days(Days::new(n)).unwrap()
    }

    #[test]
    fn test_empty_window_yields_zeros() {
        let store = SqliteStore::open_in_memory().unwrap();

        for days in [0, 1, 7, 30] {
            let analysis = analyze_sleep(&store, UserId(1), days, today()).unwrap();
            assert_eq!(analysis.average_duration, 0.0);
            assert_eq!(analysis.average_quality, 0.0);
            assert_eq!(analysis.average_energy, 0.0);
            assert!(analysis.quality_trend.is_empty());
            assert!(analysis.duration_trend.is_empty());
        }
    }

    #[test]
    fn test_averages_and_parallel_trends() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = UserId(1);

        store
            .create_sleep_log(user, &NewSleepLog::new(days_ago(2), 7.5, 4, 3))
            .unwrap();
        store
            .create_sleep_log(user, &NewSleepLog::new(days_ago(1), 6.0, 2, 2))
            .unwrap();
        store
            .create_sleep_log(user, &NewSleepLog::new(today(), 8.25, 5, 4))
            .unwrap();

        let analysis = analyze_sleep(&store, user, 7, today()).unwrap();

        assert!((analysis.average_duration - 7.25).abs() < 1e-9);
        assert!((analysis.average_quality - 11.0 / 3.0).abs() < 1e-9);
        assert!((analysis.average_energy - 3.0).abs() < 1e-9);

        let quality_dates: Vec<_> = analysis.quality_trend.iter().map(|p| p.date).collect();
        let duration_dates: Vec<_> = analysis.duration_trend.iter().map(|p| p.date).collect();
        assert_eq!(quality_dates, vec![days_ago(2), days_ago(1), today()]);
        assert_eq!(quality_dates, duration_dates);
        assert_eq!(analysis.duration_trend[2].value, TrendValue::Measure(8.25));
        assert_eq!(analysis.quality_trend[1].value, TrendValue::Score(2));
    }

    #[test]
    fn test_inclusive_window_boundary() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = UserId(1);

        // 7 days back falls outside a 7-day inclusive window
        store
            .create_sleep_log(user, &NewSleepLog::new(days_ago(7), 4.0, 1, 1))
            .unwrap();
        store
            .create_sleep_log(user, &NewSleepLog::new(days_ago(6), 8.0, 5, 5))
            .unwrap();

        let analysis = analyze_sleep(&store, user, 7, today()).unwrap();
        assert_eq!(analysis.duration_trend.len(), 1);
        assert_eq!(analysis.average_duration, 8.0);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(SleepAnalysis::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "average_duration": 0.0,
                "average_quality": 0.0,
                "average_energy": 0.0,
                "quality_trend": [],
                "duration_trend": []
            })
        );
    }
}
