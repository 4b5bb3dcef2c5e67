//! SQLite Record Store
//!
//! Relational store for foods, meals, health logs, sleep logs and profiles.
//! Uses SQLite unique indexes to enforce one health log and one sleep
//! log per (user, date), and B-tree indexes on (user_id, date) for range reads.
//!
//! The connection sits behind a `std::sync::Mutex`; every call is a short
//! synchronous read or write, so no async locking is needed.

use crate::store::error::{StoreError, StoreResult};
use crate::store::types::{
    Food, FoodId, HealthLog, Meal, MealFood, MealId, MealUpdate, NewFood, NewHealthLog, NewMeal,
    NewMealFood, NewSleepLog, Profile, ProfileUpdate, RangeQuery, RecordId, SleepLog, UserId,
};
use crate::store::RecordStore;
use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Current schema version
const SCHEMA_VERSION: i32 = 2;

const HEALTH_LOG: &str = "health log";
const SLEEP_LOG: &str = "sleep log";
const MEAL: &str = "meal";
const FOOD: &str = "food";

/// SQLite-backed record store
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Create or open a store at `path`
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        Self::init(conn, Some(path))
    }

    /// Create a private in-memory store
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        run_migrations(&conn)?;

        tracing::debug!(path = ?path, version = SCHEMA_VERSION, "Record store ready");

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Database file location, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(format!("record store connection poisoned: {}", e)))
    }

    /// Applied schema version
    pub fn schema_version(&self) -> StoreResult<i32> {
        let conn = self.lock()?;
        let version = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )?;
        Ok(version)
    }

    /// Cheap liveness check against the database
    pub fn ping(&self) -> bool {
        match self.lock() {
            Ok(conn) => conn
                .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .is_ok(),
            Err(_) => false,
        }
    }

    // ============================================
    // FOODS
    // ============================================

    /// Create a food owned by `owner`
    pub fn create_food(&self, owner: UserId, data: &NewFood) -> StoreResult<Food> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO foods (name, calories, protein, carbs, fats, owner_id, is_public)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                data.name,
                data.calories,
                data.protein,
                data.carbs,
                data.fats,
                owner.0,
                data.is_public
            ],
        )
        .map_err(|e| map_constraint(e, FOOD, None))?;

        let id = conn.last_insert_rowid();
        find_food(&conn, id)?.ok_or_else(|| StoreError::not_found(FOOD, id))
    }

    /// Get a food visible to `user`
    pub fn get_food(&self, user: UserId, id: FoodId) -> StoreResult<Option<Food>> {
        let conn = self.lock()?;
        Ok(find_food(&conn, id)?.filter(|f| f.is_visible_to(user)))
    }

    /// List foods visible to `user`, optionally filtered by a name substring
    pub fn list_foods(&self, user: UserId, search: Option<&str>) -> StoreResult<Vec<Food>> {
        let conn = self.lock()?;
        let pattern = format!("%{}%", search.unwrap_or("").to_lowercase());

        let mut stmt = conn.prepare_cached(
            "SELECT * FROM foods
             WHERE (is_public = 1 OR owner_id = ?1) AND lower(name) LIKE ?2
             ORDER BY name, id",
        )?;
        let foods = stmt
            .query_map(params![user.0, pattern], food_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(foods)
    }

    /// Replace a food owned by `user`
    pub fn update_food(&self, user: UserId, id: FoodId, data: &NewFood) -> StoreResult<Food> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE foods SET name = ?1, calories = ?2, protein = ?3, carbs = ?4, fats = ?5,
                     is_public = ?6
                 WHERE id = ?7 AND owner_id = ?8",
                params![
                    data.name,
                    data.calories,
                    data.protein,
                    data.carbs,
                    data.fats,
                    data.is_public,
                    id,
                    user.0
                ],
            )
            .map_err(|e| map_constraint(e, FOOD, None))?;

        if changed == 0 {
            return Err(StoreError::not_found(FOOD, id));
        }
        find_food(&conn, id)?.ok_or_else(|| StoreError::not_found(FOOD, id))
    }

    /// Delete a food owned by `user` (its meal entries go with it)
    pub fn delete_food(&self, user: UserId, id: FoodId) -> StoreResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "DELETE FROM foods WHERE id = ?1 AND owner_id = ?2",
            params![id, user.0],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found(FOOD, id));
        }
        Ok(())
    }

    // ============================================
    // MEALS
    // ============================================

    /// Create a meal and its composition in one transaction
    pub fn create_meal(&self, user: UserId, data: &NewMeal) -> StoreResult<Meal> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO meals (user_id, date_time, meal_date, meal_type, notes)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.0,
                data.date_time,
                data.date_time.date_naive(),
                data.meal_type,
                data.notes
            ],
        )?;
        let id = tx.last_insert_rowid();
        insert_meal_foods(&tx, user, id, &data.foods)?;
        tx.commit()?;

        tracing::debug!(user_id = %user, meal_id = id, foods = data.foods.len(), "Created meal");

        find_meal(&conn, user, id)?.ok_or_else(|| StoreError::not_found(MEAL, id))
    }

    /// Get one of `user`'s meals
    pub fn get_meal(&self, user: UserId, id: MealId) -> StoreResult<Option<Meal>> {
        let conn = self.lock()?;
        find_meal(&conn, user, id)
    }

    /// All meals of `user`, newest first
    pub fn list_meals(&self, user: UserId) -> StoreResult<Vec<Meal>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT * FROM meals WHERE user_id = ?1 ORDER BY date_time DESC, id DESC",
        )?;
        let meals = stmt
            .query_map(params![user.0], meal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        attach_foods(&conn, meals)
    }

    /// Update a meal; a supplied food list replaces the existing composition
    pub fn update_meal(&self, user: UserId, id: MealId, data: &MealUpdate) -> StoreResult<Meal> {
        let mut conn = self.lock()?;
        let current = find_meal(&conn, user, id)?.ok_or_else(|| StoreError::not_found(MEAL, id))?;

        let date_time = data.date_time.unwrap_or(current.date_time);
        let meal_type = data.meal_type.unwrap_or(current.meal_type);
        let notes = data.notes.clone().unwrap_or(current.notes);

        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE meals SET date_time = ?1, meal_date = ?2, meal_type = ?3, notes = ?4
             WHERE id = ?5 AND user_id = ?6",
            params![date_time, date_time.date_naive(), meal_type, notes, id, user.0],
        )?;

        if let Some(foods) = &data.foods {
            tx.execute("DELETE FROM meal_foods WHERE meal_id = ?1", params![id])?;
            insert_meal_foods(&tx, user, id, foods)?;
        }
        tx.commit()?;

        find_meal(&conn, user, id)?.ok_or_else(|| StoreError::not_found(MEAL, id))
    }

    /// Delete one of `user`'s meals with its composition
    pub fn delete_meal(&self, user: UserId, id: MealId) -> StoreResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "DELETE FROM meals WHERE id = ?1 AND user_id = ?2",
            params![id, user.0],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found(MEAL, id));
        }
        Ok(())
    }

    // ============================================
    // HEALTH LOGS
    // ============================================

    /// Create a health log; fails with `Duplicate` if the date is taken
    pub fn create_health_log(&self, user: UserId, data: &NewHealthLog) -> StoreResult<HealthLog> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO health_logs (user_id, date, physical_feeling, mental_feeling,
                 stool_count, stool_quality, complete_evacuation, weight, symptoms, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                user.0,
                data.date,
                data.physical_feeling,
                data.mental_feeling,
                data.stool_count,
                data.stool_quality,
                data.complete_evacuation,
                data.weight,
                data.symptoms,
                data.notes
            ],
        )
        .map_err(|e| map_constraint(e, HEALTH_LOG, Some(data.date)))?;

        let id = conn.last_insert_rowid();
        find_health_log(&conn, user, id)?.ok_or_else(|| StoreError::not_found(HEALTH_LOG, id))
    }

    pub fn get_health_log(&self, user: UserId, id: RecordId) -> StoreResult<Option<HealthLog>> {
        let conn = self.lock()?;
        find_health_log(&conn, user, id)
    }

    /// The health log of `user` for `date`, if any
    pub fn health_log_on(&self, user: UserId, date: NaiveDate) -> StoreResult<Option<HealthLog>> {
        Ok(self
            .health_logs(user, &RangeQuery::day(date))?
            .into_iter()
            .next())
    }

    /// All health logs of `user`, newest first
    pub fn list_health_logs(&self, user: UserId) -> StoreResult<Vec<HealthLog>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached("SELECT * FROM health_logs WHERE user_id = ?1 ORDER BY date DESC")?;
        let logs = stmt
            .query_map(params![user.0], health_log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    /// Replace a health log; moving it onto a taken date fails with `Duplicate`
    pub fn update_health_log(
        &self,
        user: UserId,
        id: RecordId,
        data: &NewHealthLog,
    ) -> StoreResult<HealthLog> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE health_logs SET date = ?1, physical_feeling = ?2, mental_feeling = ?3,
                     stool_count = ?4, stool_quality = ?5, complete_evacuation = ?6,
                     weight = ?7, symptoms = ?8, notes = ?9
                 WHERE id = ?10 AND user_id = ?11",
                params![
                    data.date,
                    data.physical_feeling,
                    data.mental_feeling,
                    data.stool_count,
                    data.stool_quality,
                    data.complete_evacuation,
                    data.weight,
                    data.symptoms,
                    data.notes,
                    id,
                    user.0
                ],
            )
            .map_err(|e| map_constraint(e, HEALTH_LOG, Some(data.date)))?;

        if changed == 0 {
            return Err(StoreError::not_found(HEALTH_LOG, id));
        }
        find_health_log(&conn, user, id)?.ok_or_else(|| StoreError::not_found(HEALTH_LOG, id))
    }

    pub fn delete_health_log(&self, user: UserId, id: RecordId) -> StoreResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "DELETE FROM health_logs WHERE id = ?1 AND user_id = ?2",
            params![id, user.0],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found(HEALTH_LOG, id));
        }
        Ok(())
    }

    // ============================================
    // SLEEP LOGS
    // ============================================

    /// Create a sleep log; fails with `Duplicate` if the date is taken
    pub fn create_sleep_log(&self, user: UserId, data: &NewSleepLog) -> StoreResult<SleepLog> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sleep_logs (user_id, date, duration, quality, wake_up_ease,
                 energy_level, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.0,
                data.date,
                data.duration,
                data.quality,
                data.wake_up_ease,
                data.energy_level,
                data.notes
            ],
        )
        .map_err(|e| map_constraint(e, SLEEP_LOG, Some(data.date)))?;

        let id = conn.last_insert_rowid();
        find_sleep_log(&conn, user, id)?.ok_or_else(|| StoreError::not_found(SLEEP_LOG, id))
    }

    pub fn get_sleep_log(&self, user: UserId, id: RecordId) -> StoreResult<Option<SleepLog>> {
        let conn = self.lock()?;
        find_sleep_log(&conn, user, id)
    }

    /// All sleep logs of `user`, newest first
    pub fn list_sleep_logs(&self, user: UserId) -> StoreResult<Vec<SleepLog>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached("SELECT * FROM sleep_logs WHERE user_id = ?1 ORDER BY date DESC")?;
        let logs = stmt
            .query_map(params![user.0], sleep_log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    /// Replace a sleep log; moving it onto a taken date fails with `Duplicate`
    pub fn update_sleep_log(
        &self,
        user: UserId,
        id: RecordId,
        data: &NewSleepLog,
    ) -> StoreResult<SleepLog> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE sleep_logs SET date = ?1, duration = ?2, quality = ?3,
                     wake_up_ease = ?4, energy_level = ?5, notes = ?6
                 WHERE id = ?7 AND user_id = ?8",
                params![
                    data.date,
                    data.duration,
                    data.quality,
                    data.wake_up_ease,
                    data.energy_level,
                    data.notes,
                    id,
                    user.0
                ],
            )
            .map_err(|e| map_constraint(e, SLEEP_LOG, Some(data.date)))?;

        if changed == 0 {
            return Err(StoreError::not_found(SLEEP_LOG, id));
        }
        find_sleep_log(&conn, user, id)?.ok_or_else(|| StoreError::not_found(SLEEP_LOG, id))
    }

    pub fn delete_sleep_log(&self, user: UserId, id: RecordId) -> StoreResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "DELETE FROM sleep_logs WHERE id = ?1 AND user_id = ?2",
            params![id, user.0],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found(SLEEP_LOG, id));
        }
        Ok(())
    }

    // ============================================
    // PROFILES
    // ============================================

    /// The profile of `user`, created empty on first access
    pub fn get_or_create_profile(&self, user: UserId) -> StoreResult<Profile> {
        let conn = self.lock()?;
        ensure_profile(&conn, user)
    }

    /// Apply the fields present in `data` to the profile of `user`
    pub fn update_profile(&self, user: UserId, data: &ProfileUpdate) -> StoreResult<Profile> {
        let conn = self.lock()?;
        ensure_profile(&conn, user)?;
        conn.execute(
            "UPDATE profiles SET
                 medical_conditions = COALESCE(?1, medical_conditions),
                 allergies = COALESCE(?2, allergies),
                 dietary_restrictions = COALESCE(?3, dietary_restrictions),
                 goals = COALESCE(?4, goals)
             WHERE user_id = ?5",
            params![
                data.medical_conditions,
                data.allergies,
                data.dietary_restrictions,
                data.goals,
                user.0
            ],
        )?;
        ensure_profile(&conn, user)
    }
}

impl RecordStore for SqliteStore {
    fn health_logs(&self, user: UserId, query: &RangeQuery) -> StoreResult<Vec<HealthLog>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;
        let sql = format!(
            "SELECT * FROM health_logs
             WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date {} LIMIT ?4",
            query.order.sql()
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let logs = stmt
            .query_map(
                params![user.0, query.start, query.end, sql_limit(query)],
                health_log_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    fn sleep_logs(&self, user: UserId, query: &RangeQuery) -> StoreResult<Vec<SleepLog>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;
        let sql = format!(
            "SELECT * FROM sleep_logs
             WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date {} LIMIT ?4",
            query.order.sql()
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let logs = stmt
            .query_map(
                params![user.0, query.start, query.end, sql_limit(query)],
                sleep_log_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    fn meals(&self, user: UserId, query: &RangeQuery) -> StoreResult<Vec<Meal>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;
        let order = query.order.sql();
        let sql = format!(
            "SELECT * FROM meals
             WHERE user_id = ?1 AND meal_date >= ?2 AND meal_date <= ?3
             ORDER BY date_time {order}, id {order} LIMIT ?4"
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let meals = stmt
            .query_map(
                params![user.0, query.start, query.end, sql_limit(query)],
                meal_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        attach_foods(&conn, meals)
    }

    fn meal_foods(&self, meal_ids: &[MealId]) -> StoreResult<HashMap<MealId, Vec<MealFood>>> {
        let conn = self.lock()?;
        load_meal_foods(&conn, meal_ids)
    }
}

// ============================================
// SCHEMA
// ============================================

fn run_migrations(conn: &Connection) -> StoreResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!(version = 1, "Applied record store migration");
    }

    if current < 2 {
        migrate_v2(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (2)", [])?;
        tracing::info!(version = 2, "Applied record store migration");
    }

    Ok(())
}

fn migrate_v1(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS foods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (length(name) > 0),
            calories INTEGER,
            protein REAL CHECK (protein IS NULL OR protein >= 0),
            carbs REAL CHECK (carbs IS NULL OR carbs >= 0),
            fats REAL CHECK (fats IS NULL OR fats >= 0),
            owner_id INTEGER,
            is_public INTEGER NOT NULL DEFAULT 1
        );
        CREATE INDEX IF NOT EXISTS idx_foods_name ON foods(name);

        CREATE TABLE IF NOT EXISTS meals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            date_time TEXT NOT NULL,
            meal_date TEXT NOT NULL,
            meal_type TEXT NOT NULL
                CHECK (meal_type IN ('breakfast', 'lunch', 'dinner', 'snack')),
            notes TEXT NOT NULL DEFAULT ''
        );
        CREATE INDEX IF NOT EXISTS idx_meals_user_date ON meals(user_id, meal_date);

        CREATE TABLE IF NOT EXISTS meal_foods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meal_id INTEGER NOT NULL REFERENCES meals(id) ON DELETE CASCADE,
            food_id INTEGER NOT NULL REFERENCES foods(id) ON DELETE CASCADE,
            amount REAL NOT NULL CHECK (amount > 0),
            notes TEXT NOT NULL DEFAULT ''
        );
        CREATE INDEX IF NOT EXISTS idx_meal_foods_meal ON meal_foods(meal_id);

        CREATE TABLE IF NOT EXISTS health_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            physical_feeling INTEGER NOT NULL CHECK (physical_feeling BETWEEN 1 AND 5),
            mental_feeling INTEGER NOT NULL CHECK (mental_feeling BETWEEN 1 AND 5),
            stool_count INTEGER NOT NULL DEFAULT 0 CHECK (stool_count >= 0),
            stool_quality TEXT
                CHECK (stool_quality IN ('hard', 'normal', 'soft', 'diarrhea')),
            complete_evacuation INTEGER,
            weight REAL,
            symptoms TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT ''
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_health_logs_user_date ON health_logs(user_id, date);

        CREATE TABLE IF NOT EXISTS sleep_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            duration REAL NOT NULL CHECK (duration > 0),
            quality INTEGER NOT NULL CHECK (quality BETWEEN 1 AND 5),
            wake_up_ease INTEGER NOT NULL CHECK (wake_up_ease BETWEEN 1 AND 5),
            energy_level INTEGER NOT NULL CHECK (energy_level BETWEEN 1 AND 5),
            notes TEXT NOT NULL DEFAULT ''
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_sleep_logs_user_date ON sleep_logs(user_id, date);
        "#,
    )?;
    Ok(())
}

fn migrate_v2(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL UNIQUE,
            medical_conditions TEXT NOT NULL DEFAULT '',
            allergies TEXT NOT NULL DEFAULT '',
            dietary_restrictions TEXT NOT NULL DEFAULT '',
            goals TEXT NOT NULL DEFAULT ''
        );
        "#,
    )?;
    Ok(())
}

// ============================================
// ROW MAPPING
// ============================================

fn food_from_row(row: &Row) -> rusqlite::Result<Food> {
    Ok(Food {
        id: row.get("id")?,
        name: row.get("name")?,
        calories: row.get("calories")?,
        protein: row.get("protein")?,
        carbs: row.get("carbs")?,
        fats: row.get("fats")?,
        owner: row.get::<_, Option<i64>>("owner_id")?.map(UserId),
        is_public: row.get("is_public")?,
    })
}

fn meal_from_row(row: &Row) -> rusqlite::Result<Meal> {
    Ok(Meal {
        id: row.get("id")?,
        user: UserId(row.get("user_id")?),
        date_time: row.get("date_time")?,
        meal_type: row.get("meal_type")?,
        notes: row.get("notes")?,
        foods: Vec::new(),
    })
}

fn meal_food_from_row(row: &Row) -> rusqlite::Result<(MealId, MealFood)> {
    Ok((
        row.get("meal_id")?,
        MealFood {
            id: row.get("id")?,
            food_id: row.get("food_id")?,
            food_name: row.get("food_name")?,
            amount: row.get("amount")?,
            notes: row.get("notes")?,
        },
    ))
}

fn health_log_from_row(row: &Row) -> rusqlite::Result<HealthLog> {
    Ok(HealthLog {
        id: row.get("id")?,
        user: UserId(row.get("user_id")?),
        date: row.get("date")?,
        physical_feeling: row.get("physical_feeling")?,
        mental_feeling: row.get("mental_feeling")?,
        stool_count: row.get("stool_count")?,
        stool_quality: row.get("stool_quality")?,
        complete_evacuation: row.get("complete_evacuation")?,
        weight: row.get("weight")?,
        symptoms: row.get("symptoms")?,
        notes: row.get("notes")?,
    })
}

fn sleep_log_from_row(row: &Row) -> rusqlite::Result<SleepLog> {
    Ok(SleepLog {
        id: row.get("id")?,
        user: UserId(row.get("user_id")?),
        date: row.get("date")?,
        duration: row.get("duration")?,
        quality: row.get("quality")?,
        wake_up_ease: row.get("wake_up_ease")?,
        energy_level: row.get("energy_level")?,
        notes: row.get("notes")?,
    })
}

fn profile_from_row(row: &Row) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get("id")?,
        user: UserId(row.get("user_id")?),
        medical_conditions: row.get("medical_conditions")?,
        allergies: row.get("allergies")?,
        dietary_restrictions: row.get("dietary_restrictions")?,
        goals: row.get("goals")?,
    })
}

// ============================================
// HELPERS
// ============================================

/// SQLite treats a negative LIMIT as "no limit"
fn sql_limit(query: &RangeQuery) -> i64 {
    query
        .limit
        .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
        .unwrap_or(-1)
}

/// Translate constraint failures into store error kinds
fn map_constraint(err: rusqlite::Error, kind: &'static str, date: Option<NaiveDate>) -> StoreError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        match (failure.extended_code, date) {
            (rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE, Some(date)) => {
                return StoreError::Duplicate { kind, date };
            }
            (rusqlite::ffi::SQLITE_CONSTRAINT_CHECK, _) => {
                return StoreError::InvalidData(format!(
                    "{} violates a constraint: {}",
                    kind,
                    message.as_deref().unwrap_or("check failed")
                ));
            }
            _ => {}
        }
    }
    err.into()
}

fn find_food(conn: &Connection, id: FoodId) -> StoreResult<Option<Food>> {
    let food = conn
        .query_row("SELECT * FROM foods WHERE id = ?1", params![id], food_from_row)
        .optional()?;
    Ok(food)
}

fn find_meal(conn: &Connection, user: UserId, id: MealId) -> StoreResult<Option<Meal>> {
    let meal = conn
        .query_row(
            "SELECT * FROM meals WHERE id = ?1 AND user_id = ?2",
            params![id, user.0],
            meal_from_row,
        )
        .optional()?;

    match meal {
        Some(meal) => Ok(attach_foods(conn, vec![meal])?.into_iter().next()),
        None => Ok(None),
    }
}

fn find_health_log(conn: &Connection, user: UserId, id: RecordId) -> StoreResult<Option<HealthLog>> {
    let log = conn
        .query_row(
            "SELECT * FROM health_logs WHERE id = ?1 AND user_id = ?2",
            params![id, user.0],
            health_log_from_row,
        )
        .optional()?;
    Ok(log)
}

fn find_sleep_log(conn: &Connection, user: UserId, id: RecordId) -> StoreResult<Option<SleepLog>> {
    let log = conn
        .query_row(
            "SELECT * FROM sleep_logs WHERE id = ?1 AND user_id = ?2",
            params![id, user.0],
            sleep_log_from_row,
        )
        .optional()?;
    Ok(log)
}

/// Load the profile of `user`, inserting an empty one if missing
fn ensure_profile(conn: &Connection, user: UserId) -> StoreResult<Profile> {
    let created = conn.execute(
        "INSERT OR IGNORE INTO profiles (user_id) VALUES (?1)",
        params![user.0],
    )?;
    if created > 0 {
        tracing::debug!(user_id = %user, "Created empty profile");
    }

    let profile = conn.query_row(
        "SELECT * FROM profiles WHERE user_id = ?1",
        params![user.0],
        profile_from_row,
    )?;
    Ok(profile)
}

/// Insert composition entries after checking each food is visible to `user`
fn insert_meal_foods(
    conn: &Connection,
    user: UserId,
    meal_id: MealId,
    foods: &[NewMealFood],
) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO meal_foods (meal_id, food_id, amount, notes) VALUES (?1, ?2, ?3, ?4)",
    )?;

    for entry in foods {
        let visible = find_food(conn, entry.food_id)?
            .map(|f| f.is_visible_to(user))
            .unwrap_or(false);
        if !visible {
            return Err(StoreError::InvalidData(format!(
                "food {} does not exist",
                entry.food_id
            )));
        }

        stmt.execute(params![meal_id, entry.food_id, entry.amount, entry.notes])
            .map_err(|e| map_constraint(e, "meal food", None))?;
    }
    Ok(())
}

fn load_meal_foods(
    conn: &Connection,
    meal_ids: &[MealId],
) -> StoreResult<HashMap<MealId, Vec<MealFood>>> {
    let mut grouped: HashMap<MealId, Vec<MealFood>> = HashMap::new();
    if meal_ids.is_empty() {
        return Ok(grouped);
    }

    let placeholders = vec!["?"; meal_ids.len()].join(", ");
    let sql = format!(
        "SELECT mf.id, mf.meal_id, mf.food_id, mf.amount, mf.notes, f.name AS food_name
         FROM meal_foods mf JOIN foods f ON f.id = mf.food_id
         WHERE mf.meal_id IN ({placeholders})
         ORDER BY mf.meal_id, mf.id"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(meal_ids.iter()), meal_food_from_row)?;
    for row in rows {
        let (meal_id, link) = row?;
        grouped.entry(meal_id).or_default().push(link);
    }
    Ok(grouped)
}

fn attach_foods(conn: &Connection, mut meals: Vec<Meal>) -> StoreResult<Vec<Meal>> {
    let ids: Vec<MealId> = meals.iter().map(|m| m.id).collect();
    let mut grouped = load_meal_foods(conn, &ids)?;

    for meal in &mut meals {
        meal.foods = grouped.remove(&meal.id).unwrap_or_default();
    }
    Ok(meals)
}
