//! Core record types for the health record store
//!
//! This module defines the entities users record and the analytics read:
//! - `HealthLog`: Daily digestive/wellbeing log (one per user and date)
//! - `SleepLog`: Nightly sleep record (one per user and date)
//! - `Meal` / `MealFood`: A meal and the foods it is composed of
//! - `Food`: Nutritional reference data, public or owned by a user
//! - `Profile`: Free-text medical and dietary notes, one per user
//! - `RangeQuery`: A date range read against the store

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of the user owning a record
///
/// Forwarded by the request layer; never read from ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type FoodId = i64;
pub type MealId = i64;
pub type RecordId = i64;

/// Error returned when a stored or submitted enum label is unknown
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub value: String,
}

/// Stool consistency recorded in a health log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StoolQuality {
    /// Hard and dry
    Hard,
    Normal,
    Soft,
    Diarrhea,
}

impl StoolQuality {
    pub fn all() -> &'static [StoolQuality] {
        &[
            StoolQuality::Hard,
            StoolQuality::Normal,
            StoolQuality::Soft,
            StoolQuality::Diarrhea,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoolQuality::Hard => "hard",
            StoolQuality::Normal => "normal",
            StoolQuality::Soft => "soft",
            StoolQuality::Diarrhea => "diarrhea",
        }
    }
}

impl fmt::Display for StoolQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoolQuality {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StoolQuality::all()
            .iter()
            .copied()
            .find(|q| q.as_str() == s.to_lowercase())
            .ok_or_else(|| ParseLabelError {
                kind: "stool quality",
                value: s.to_string(),
            })
    }
}

/// Kind of meal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn all() -> &'static [MealType] {
        &[
            MealType::Breakfast,
            MealType::Lunch,
            MealType::Dinner,
            MealType::Snack,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MealType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s.to_lowercase())
            .ok_or_else(|| ParseLabelError {
                kind: "meal type",
                value: s.to_string(),
            })
    }
}

// Both enums live in TEXT columns under their lowercase label.
macro_rules! sql_label {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

sql_label!(StoolQuality);
sql_label!(MealType);

/// Daily health log for tracking digestive health
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthLog {
    pub id: RecordId,
    pub user: UserId,
    /// Calendar day this log describes (unique per user)
    pub date: NaiveDate,
    /// Physical feeling on a 1-5 scale
    pub physical_feeling: u8,
    /// Mental feeling on a 1-5 scale
    pub mental_feeling: u8,
    pub stool_count: u32,
    pub stool_quality: Option<StoolQuality>,
    pub complete_evacuation: Option<bool>,
    /// Weight in kilograms
    pub weight: Option<f64>,
    pub symptoms: String,
    pub notes: String,
}

/// Data for creating or replacing a health log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewHealthLog {
    pub date: NaiveDate,
    pub physical_feeling: u8,
    pub mental_feeling: u8,
    #[serde(default)]
    pub stool_count: u32,
    #[serde(default)]
    pub stool_quality: Option<StoolQuality>,
    #[serde(default)]
    pub complete_evacuation: Option<bool>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub notes: String,
}

impl NewHealthLog {
    /// Create a log with only the required scores set
    pub fn new(date: NaiveDate, physical_feeling: u8, mental_feeling: u8) -> Self {
        Self {
            date,
            physical_feeling,
            mental_feeling,
            stool_count: 0,
            stool_quality: None,
            complete_evacuation: None,
            weight: None,
            symptoms: String::new(),
            notes: String::new(),
        }
    }

    /// Builder: set stool quality
    pub fn stool_quality(mut self, quality: StoolQuality) -> Self {
        self.stool_quality = Some(quality);
        self
    }

    /// Builder: set weight in kilograms
    pub fn weight(mut self, kg: f64) -> Self {
        self.weight = Some(kg);
        self
    }

    /// Builder: set stool count
    pub fn stool_count(mut self, count: u32) -> Self {
        self.stool_count = count;
        self
    }

    /// Builder: set free-text symptoms
    pub fn symptoms(mut self, symptoms: impl Into<String>) -> Self {
        self.symptoms = symptoms.into();
        self
    }
}

/// Sleep tracking record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SleepLog {
    pub id: RecordId,
    pub user: UserId,
    /// Calendar day this sleep belongs to (unique per user)
    pub date: NaiveDate,
    /// Duration in hours
    pub duration: f64,
    /// Sleep quality on a 1-5 scale
    pub quality: u8,
    /// Ease of waking up on a 1-5 scale
    pub wake_up_ease: u8,
    /// Energy level on a 1-5 scale
    pub energy_level: u8,
    pub notes: String,
}

/// Data for creating or replacing a sleep log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSleepLog {
    pub date: NaiveDate,
    pub duration: f64,
    pub quality: u8,
    #[serde(default = "default_wake_up_ease")]
    pub wake_up_ease: u8,
    pub energy_level: u8,
    #[serde(default)]
    pub notes: String,
}

fn default_wake_up_ease() -> u8 {
    3
}

impl NewSleepLog {
    pub fn new(date: NaiveDate, duration: f64, quality: u8, energy_level: u8) -> Self {
        Self {
            date,
            duration,
            quality,
            wake_up_ease: default_wake_up_ease(),
            energy_level,
            notes: String::new(),
        }
    }
}

/// Medical and dietary background of a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: RecordId,
    pub user: UserId,
    pub medical_conditions: String,
    pub allergies: String,
    pub dietary_restrictions: String,
    pub goals: String,
}

/// Profile changes; fields left out keep their stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub medical_conditions: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub dietary_restrictions: Option<String>,
    #[serde(default)]
    pub goals: Option<String>,
}

/// Food item, either public or owned by a single user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Food {
    pub id: FoodId,
    pub name: String,
    pub calories: Option<i64>,
    /// Grams of protein
    pub protein: Option<f64>,
    /// Grams of carbohydrates
    pub carbs: Option<f64>,
    /// Grams of fat
    pub fats: Option<f64>,
    /// Owner for custom foods
    pub owner: Option<UserId>,
    pub is_public: bool,
}

impl Food {
    /// Whether `user` may see this food
    pub fn is_visible_to(&self, user: UserId) -> bool {
        self.is_public || self.owner == Some(user)
    }
}

/// Data for creating or replacing a food
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewFood {
    pub name: String,
    #[serde(default)]
    pub calories: Option<i64>,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub fats: Option<f64>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

impl NewFood {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calories: None,
            protein: None,
            carbs: None,
            fats: None,
            is_public: true,
        }
    }

    /// Builder: keep the food private to its owner
    pub fn private(mut self) -> Self {
        self.is_public = false;
        self
    }

    /// Builder: set macronutrients in grams
    pub fn macros(mut self, protein: f64, carbs: f64, fats: f64) -> Self {
        self.protein = Some(protein);
        self.carbs = Some(carbs);
        self.fats = Some(fats);
        self
    }
}

/// A food included in a meal with its amount
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MealFood {
    pub id: RecordId,
    pub food_id: FoodId,
    /// Name of the referenced food at read time
    pub food_name: String,
    /// Amount in grams
    pub amount: f64,
    pub notes: String,
}

impl MealFood {
    /// Amount rendered with two decimals, e.g. "150.00"
    pub fn amount_label(&self) -> String {
        format!("{:.2}", self.amount)
    }
}

/// Meal record with its composition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meal {
    pub id: MealId,
    pub user: UserId,
    pub date_time: DateTime<Utc>,
    pub meal_type: MealType,
    pub notes: String,
    /// Composition links in insertion order
    pub foods: Vec<MealFood>,
}

impl Meal {
    /// Calendar day (UTC) the meal was eaten on
    pub fn date(&self) -> NaiveDate {
        self.date_time.date_naive()
    }
}

/// One composition entry of a meal being written
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMealFood {
    pub food_id: FoodId,
    pub amount: f64,
    #[serde(default)]
    pub notes: String,
}

impl NewMealFood {
    pub fn new(food_id: FoodId, amount: f64) -> Self {
        Self {
            food_id,
            amount,
            notes: String::new(),
        }
    }
}

/// Data for creating a meal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMeal {
    pub date_time: DateTime<Utc>,
    pub meal_type: MealType,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub foods: Vec<NewMealFood>,
}

impl NewMeal {
    pub fn new(date_time: DateTime<Utc>, meal_type: MealType) -> Self {
        Self {
            date_time,
            meal_type,
            notes: String::new(),
            foods: Vec::new(),
        }
    }

    /// Builder: add a composition entry
    pub fn food(mut self, food_id: FoodId, amount: f64) -> Self {
        self.foods.push(NewMealFood::new(food_id, amount));
        self
    }
}

/// Partial meal update; `foods`, when present, replaces the composition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MealUpdate {
    #[serde(default)]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub meal_type: Option<MealType>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub foods: Option<Vec<NewMealFood>>,
}

/// Iteration order for range reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// Date range read against the store (both bounds inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl RangeQuery {
    /// Ascending, unlimited range
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            order: SortOrder::Ascending,
            limit: None,
        }
    }

    /// Range covering a single day
    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn descending(mut self) -> Self {
        self.order = SortOrder::Descending;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether the range can hold any date at all
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_stool_quality_labels() {
        assert_eq!("diarrhea".parse::<StoolQuality>(), Ok(StoolQuality::Diarrhea));
        assert_eq!("NORMAL".parse::<StoolQuality>(), Ok(StoolQuality::Normal));
        assert!("runny".parse::<StoolQuality>().is_err());
        assert_eq!(StoolQuality::Hard.to_string(), "hard");
    }

    #[test]
    fn test_meal_type_serialization() {
        let json = serde_json::to_string(&MealType::Breakfast).unwrap();
        assert_eq!(json, "\"breakfast\"");

        let parsed: MealType = serde_json::from_str("\"snack\"").unwrap();
        assert_eq!(parsed, MealType::Snack);
    }

    #[test]
    fn test_range_query_builders() {
        let range = RangeQuery::new(date(2024, 3, 1), date(2024, 3, 7))
            .descending()
            .limit(3);

        assert_eq!(range.order, SortOrder::Descending);
        assert_eq!(range.limit, Some(3));
        assert_eq!(RangeQuery::day(date(2024, 3, 1)).end, date(2024, 3, 1));
        assert!(!range.is_empty());
        assert!(RangeQuery::new(date(2024, 3, 2), date(2024, 3, 1)).is_empty());
    }

    #[test]
    fn test_amount_label_has_two_decimals() {
        let link = MealFood {
            id: 1,
            food_id: 1,
            food_name: "Rice".to_string(),
            amount: 150.0,
            notes: String::new(),
        };
        assert_eq!(link.amount_label(), "150.00");
    }

    #[test]
    fn test_food_visibility() {
        let food = Food {
            id: 1,
            name: "Secret sauce".to_string(),
            calories: None,
            protein: None,
            carbs: None,
            fats: None,
            owner: Some(UserId(7)),
            is_public: false,
        };

        assert!(food.is_visible_to(UserId(7)));
        assert!(!food.is_visible_to(UserId(8)));
    }

    #[test]
    fn test_health_log_defaults_from_json() {
        let log: NewHealthLog = serde_json::from_str(
            r#"{"date": "2024-03-01", "physical_feeling": 4, "mental_feeling": 3}"#,
        )
        .unwrap();

        assert_eq!(log.date, date(2024, 3, 1));
        assert_eq!(log.stool_count, 0);
        assert!(log.stool_quality.is_none());
        assert!(log.symptoms.is_empty());
    }
}
