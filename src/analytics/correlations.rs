//! Cross-Entity Correlator
//!
//! Joins meals to health logs by date adjacency: for every health log in
//! the window, the foods eaten that same day and the day before.
//! Within a day, foods are listed from the latest meal to the earliest.

use crate::analytics::window::{antecedent_day, DateWindow};
use crate::store::{Meal, RecordStore, StoolQuality, StoreResult, UserId};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

/// A food eaten on a given day, amount rendered as text
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FoodPortion {
    pub name: String,
    pub amount: String,
}

/// Combined view of one health log and the surrounding meals
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyCorrelation {
    pub date: NaiveDate,
    pub physical_feeling: u8,
    pub mental_feeling: u8,
    pub stool_quality: Option<StoolQuality>,
    pub foods_eaten_same_day: Vec<FoodPortion>,
    pub foods_eaten_previous_day: Vec<FoodPortion>,
}

/// Foods per calendar day, flattened from meal composition
///
/// Repeated foods are kept, one entry per composition link.
#[derive(Debug, Default)]
pub(crate) struct FoodsByDay {
    days: HashMap<NaiveDate, Vec<FoodPortion>>,
}

impl FoodsByDay {
    pub(crate) fn from_meals(meals: &[Meal]) -> Self {
        let mut days: HashMap<NaiveDate, Vec<FoodPortion>> = HashMap::new();
        for meal in meals {
            let entry = days.entry(meal.date()).or_default();
            entry.extend(meal.foods.iter().map(|link| FoodPortion {
                name: link.food_name.clone(),
                amount: link.amount_label(),
            }));
        }
        Self { days }
    }

    pub(crate) fn on(&self, date: NaiveDate) -> Vec<FoodPortion> {
        self.days.get(&date).cloned().unwrap_or_default()
    }
}

/// Correlate health logs with meals over `today - days ..= today`
///
/// Meals are read from one day before the window start, so the earliest
/// log in the window still reports the foods eaten the day before it.
pub fn food_correlations(
    store: &dyn RecordStore,
    user: UserId,
    days: u32,
    today: NaiveDate,
) -> StoreResult<Vec<DailyCorrelation>> {
    let window = DateWindow::trailing(days, today);

    let logs = store.health_logs(user, &window.query())?;
    if logs.is_empty() {
        return Ok(Vec::new());
    }

    let meals = store.meals(user, &window.with_antecedent_day().descending())?;
    let foods = FoodsByDay::from_meals(&meals);

    let correlations: Vec<DailyCorrelation> = logs
        .into_iter()
        .map(|log| DailyCorrelation {
            foods_eaten_same_day: foods.on(log.date),
            foods_eaten_previous_day: antecedent_day(log.date)
                .map(|d| foods.on(d))
                .unwrap_or_default(),
            date: log.date,
            physical_feeling: log.physical_feeling,
            mental_feeling: log.mental_feeling,
            stool_quality: log.stool_quality,
        })
        .collect();

    tracing::debug!(
        user_id = %user,
        days,
        logs = correlations.len(),
        meals = meals.len(),
        "Computed food correlations"
    );

    Ok(correlations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MealType, NewFood, NewHealthLog, NewMeal, SqliteStore};
    use chrono::{DateTime, Days, TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn days_ago(n: u64) -> NaiveDate {
        today().checked_sub_days(Days::new(n)).unwrap()
    }

    fn at(date: NaiveDate, hour: u32) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_hms_opt(hour, 0, 0).unwrap())
    }

    fn names(portions: &[FoodPortion]) -> Vec<&str> {
        portions.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_same_and_previous_day_foods() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = UserId(1);
        let bread = store.create_food(user, &NewFood::new("Bread")).unwrap();
        let milk = store.create_food(user, &NewFood::new("Milk")).unwrap();

        store
            .create_meal(
                user,
                &NewMeal::new(at(days_ago(1), 8), MealType::Breakfast).food(bread.id, 50.0),
            )
            .unwrap();
        store
            .create_meal(
                user,
                &NewMeal::new(at(today(), 12), MealType::Lunch)
                    .food(milk.id, 200.0)
                    .food(bread.id, 30.5),
            )
            .unwrap();
        store
            .create_health_log(user, &NewHealthLog::new(today(), 2, 3))
            .unwrap();

        let result = food_correlations(&store, user, 7, today()).unwrap();

        assert_eq!(result.len(), 1);
        let day = &result[0];
        assert_eq!(day.date, today());
        assert_eq!(day.physical_feeling, 2);
        assert_eq!(names(&day.foods_eaten_same_day), vec!["Milk", "Bread"]);
        assert_eq!(day.foods_eaten_same_day[1].amount, "30.50");
        assert_eq!(names(&day.foods_eaten_previous_day), vec!["Bread"]);
        assert_eq!(day.foods_eaten_previous_day[0].amount, "50.00");
    }

    #[test]
    fn test_same_day_foods_list_latest_meal_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = UserId(1);
        let oats = store.create_food(user, &NewFood::new("Oats")).unwrap();
        let salmon = store.create_food(user, &NewFood::new("Salmon")).unwrap();
        let rice = store.create_food(user, &NewFood::new("Rice")).unwrap();

        store
            .create_meal(
                user,
                &NewMeal::new(at(today(), 8), MealType::Breakfast).food(oats.id, 40.0),
            )
            .unwrap();
        store
            .create_meal(
                user,
                &NewMeal::new(at(today(), 19), MealType::Dinner)
                    .food(salmon.id, 150.0)
                    .food(rice.id, 80.0),
            )
            .unwrap();
        store
            .create_health_log(user, &NewHealthLog::new(today(), 3, 3))
            .unwrap();

        let result = food_correlations(&store, user, 7, today()).unwrap();

        assert_eq!(
            names(&result[0].foods_eaten_same_day),
            vec!["Salmon", "Rice", "Oats"]
        );
    }

    #[test]
    fn test_repeated_foods_are_not_deduplicated() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = UserId(1);
        let rice = store.create_food(user, &NewFood::new("Rice")).unwrap();

        for hour in [8, 13, 19] {
            store
                .create_meal(
                    user,
                    &NewMeal::new(at(today(), hour), MealType::Snack).food(rice.id, 100.0),
                )
                .unwrap();
        }
        store
            .create_health_log(user, &NewHealthLog::new(today(), 4, 4))
            .unwrap();

        let result = food_correlations(&store, user, 3, today()).unwrap();
        assert_eq!(names(&result[0].foods_eaten_same_day), vec!["Rice"; 3]);
        assert!(result[0].foods_eaten_previous_day.is_empty());
    }

    #[test]
    fn test_window_boundary_includes_n_days_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = UserId(1);
        let egg = store.create_food(user, &NewFood::new("Egg")).unwrap();

        // Log exactly N days back is inside, its previous day's meal is still found
        store
            .create_health_log(user, &NewHealthLog::new(days_ago(5), 3, 3))
            .unwrap();
        store
            .create_health_log(user, &NewHealthLog::new(days_ago(6), 3, 3))
            .unwrap();
        store
            .create_meal(
                user,
                &NewMeal::new(at(days_ago(6), 9), MealType::Breakfast).food(egg.id, 60.0),
            )
            .unwrap();

        let result = food_correlations(&store, user, 5, today()).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].date, days_ago(5));
        assert_eq!(names(&result[0].foods_eaten_previous_day), vec!["Egg"]);
    }

    #[test]
    fn test_output_is_ascending_and_user_scoped() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = UserId(1);
        let other = UserId(2);

        for n in [4, 0, 2] {
            store
                .create_health_log(user, &NewHealthLog::new(days_ago(n), 3, 3))
                .unwrap();
        }
        store
            .create_health_log(other, &NewHealthLog::new(days_ago(1), 1, 1))
            .unwrap();

        let result = food_correlations(&store, user, 30, today()).unwrap();
        let dates: Vec<_> = result.iter().map(|c| c.date).collect();
        assert_eq!(dates, vec![days_ago(4), days_ago(2), today()]);
    }

    #[test]
    fn test_no_logs_yields_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = food_correlations(&store, UserId(1), 30, today()).unwrap();
        assert!(result.is_empty());
    }
}
