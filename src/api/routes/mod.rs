//! API Routes
//!
//! Route handlers organized by functionality, plus the request
//! validation shared between them.

pub mod analytics;
pub mod export;
pub mod foods;
pub mod health;
pub mod health_logs;
pub mod meals;
pub mod profile;
pub mod sleep;

use chrono::{Datelike, Days, Months, NaiveDate, Utc};

use crate::api::error::{ApiError, ApiResult};
use crate::store::RangeQuery;

pub(crate) const INVALID_DATE: &str = "Invalid date format. Use YYYY-MM-DD";

/// Current calendar day (UTC)
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse a `YYYY-MM-DD` path segment
pub(crate) fn parse_date(s: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| ApiError::Validation(INVALID_DATE.into()))
}

/// Optional path date, defaulting to `default`
pub(crate) fn date_or(raw: Option<String>, default: NaiveDate) -> ApiResult<NaiveDate> {
    raw.as_deref().map(parse_date).transpose().map(|d| d.unwrap_or(default))
}

/// `start ..= start + 6`
pub(crate) fn week_from(start: NaiveDate) -> RangeQuery {
    RangeQuery::new(start, start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX))
}

/// `start ..=` last day of `start`'s month
pub(crate) fn rest_of_month(start: NaiveDate) -> RangeQuery {
    let end = start
        .with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(start);
    RangeQuery::new(start, end)
}

/// First day of the month containing `date`
pub(crate) fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Resolve `?days=` against the default and upper bound
pub(crate) fn resolve_days(requested: Option<u32>, default: u32, max: u32) -> ApiResult<u32> {
    let days = requested.unwrap_or(default);
    if days == 0 || days > max {
        return Err(ApiError::Validation(format!(
            "days must be between 1 and {}",
            max
        )));
    }
    Ok(days)
}

/// 1-5 rating check
pub(crate) fn validate_score(field: &str, value: u8) -> ApiResult<()> {
    if !(1..=5).contains(&value) {
        return Err(ApiError::Validation(format!(
            "{} must be between 1 and 5",
            field
        )));
    }
    Ok(())
}

/// Strictly positive decimal check
pub(crate) fn validate_positive(field: &str, value: f64) -> ApiResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ApiError::Validation(format!("{} must be positive", field)));
    }
    Ok(())
}

/// Non-negative optional decimal check
pub(crate) fn validate_non_negative(field: &str, value: Option<f64>) -> ApiResult<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(ApiError::Validation(format!(
            "{} must not be negative",
            field
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-02-29").unwrap(), date(2024, 2, 29));
        assert!(matches!(parse_date("2024-13-01"), Err(ApiError::Validation(_))));
        assert!(matches!(parse_date("03/01/2024"), Err(ApiError::Validation(_))));
        assert_eq!(date_or(None, date(2024, 1, 1)).unwrap(), date(2024, 1, 1));
    }

    #[test]
    fn test_week_and_month_ranges() {
        let week = week_from(date(2024, 12, 28));
        assert_eq!(week.end, date(2025, 1, 3));

        let month = rest_of_month(date(2024, 2, 1));
        assert_eq!(month.end, date(2024, 2, 29));

        let month = rest_of_month(date(2023, 12, 15));
        assert_eq!(month.start, date(2023, 12, 15));
        assert_eq!(month.end, date(2023, 12, 31));

        assert_eq!(first_of_month(date(2024, 3, 17)), date(2024, 3, 1));
    }

    #[test]
    fn test_resolve_days() {
        assert_eq!(resolve_days(None, 30, 365).unwrap(), 30);
        assert_eq!(resolve_days(Some(7), 30, 365).unwrap(), 7);
        assert!(resolve_days(Some(0), 30, 365).is_err());
        assert!(resolve_days(Some(366), 30, 365).is_err());
    }

    #[test]
    fn test_field_validation() {
        assert!(validate_score("quality", 5).is_ok());
        assert!(validate_score("quality", 0).is_err());
        assert!(validate_score("quality", 6).is_err());
        assert!(validate_positive("duration", 7.5).is_ok());
        assert!(validate_positive("duration", 0.0).is_err());
        assert!(validate_positive("duration", f64::NAN).is_err());
        assert!(validate_non_negative("fats", None).is_ok());
        assert!(validate_non_negative("fats", Some(-1.0)).is_err());
    }
}
