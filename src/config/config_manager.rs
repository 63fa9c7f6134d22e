// ==========================================
// Class Generation Engine - Config manager
// ==========================================
// Storage:
//   config_kv                 (scope_id, key) -> value, tunables
//   class_size_configuration  config_key -> config_value,
//                             level_id NULL for system defaults
// Missing keys fall back to the built-in defaults.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::parameters::{
    ClassSizeOverride, GenerationParameters, RefinementConstraints, DEFAULT_MAX_CLASSES_PER_TEACHER,
    DEFAULT_MAX_CLASS_SIZE, DEFAULT_MAX_NEW_STUDENT_RATIO, DEFAULT_MAX_STUDENT_MOVES_PER_RUN,
    DEFAULT_MIN_CLASS_SIZE, DEFAULT_NEW_EXISTING_RATIO,
};
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Re-applies the connection PRAGMAs (idempotent).
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("Lock acquisition failed: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("Lock acquisition failed: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// Upserts a global tunable.
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("Lock acquisition failed: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// Unparseable values fall back to `default` like missing ones.
    fn get_parsed_or_default<T: FromStr>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .and_then(|v| v.trim().parse::<T>().ok())
            .unwrap_or(default))
    }

    /// JSON of every global tunable, stored with each run.
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("Lock acquisition failed: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    // ===== Class size configuration =====

    /// System default (min, max) class size.
    pub fn get_default_class_size(&self) -> Result<(usize, usize), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("Lock acquisition failed: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT config_key, config_value FROM class_size_configuration
             WHERE level_id IS NULL AND config_key IN (?1, ?2)",
        )?;
        let rows = stmt.query_map(
            params![class_size_keys::DEFAULT_MIN, class_size_keys::DEFAULT_MAX],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        )?;

        let mut min = DEFAULT_MIN_CLASS_SIZE;
        let mut max = DEFAULT_MAX_CLASS_SIZE;
        for row in rows {
            let (key, value) = row?;
            let value = usize::try_from(value).unwrap_or(0);
            match key.as_str() {
                class_size_keys::DEFAULT_MIN => min = value,
                class_size_keys::DEFAULT_MAX => max = value,
                _ => {}
            }
        }
        Ok((min, max))
    }

    /// Per-level overrides. A level with only one bound configured takes
    /// the other from `defaults`.
    pub fn get_level_size_overrides(
        &self,
        defaults: (usize, usize),
    ) -> Result<BTreeMap<String, ClassSizeOverride>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("Lock acquisition failed: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT level_id, config_key, config_value FROM class_size_configuration
             WHERE level_id IS NOT NULL",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut overrides: BTreeMap<String, ClassSizeOverride> = BTreeMap::new();
        for row in rows {
            let (level_id, key, value) = row?;
            let value = usize::try_from(value).unwrap_or(0);
            let entry = overrides.entry(level_id).or_insert(ClassSizeOverride {
                min_students: defaults.0,
                max_students: defaults.1,
            });
            if key.ends_with(class_size_keys::MIN_SUFFIX) {
                entry.min_students = value;
            } else if key.ends_with(class_size_keys::MAX_SUFFIX) {
                entry.max_students = value;
            }
        }
        Ok(overrides)
    }

    // ===== Generation =====

    pub fn get_max_classes_per_teacher(&self) -> Result<usize, Box<dyn Error>> {
        self.get_parsed_or_default(
            config_keys::MAX_CLASSES_PER_TEACHER,
            DEFAULT_MAX_CLASSES_PER_TEACHER,
        )
    }

    pub fn get_new_existing_ratio(&self) -> Result<f64, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::NEW_EXISTING_RATIO, DEFAULT_NEW_EXISTING_RATIO)
    }

    pub fn get_allow_undersized_classes(&self) -> Result<bool, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::ALLOW_UNDERSIZED_CLASSES, false)
    }

    /// Parameters the readiness check recommends for the next run.
    pub fn recommended_parameters(&self) -> Result<GenerationParameters, Box<dyn Error>> {
        let (min, max) = self.get_default_class_size()?;
        Ok(GenerationParameters {
            default_min_class_size: min,
            default_max_class_size: max,
            new_existing_student_ratio: self.get_new_existing_ratio()?,
            max_classes_per_teacher: self.get_max_classes_per_teacher()?,
            allow_undersized_classes: self.get_allow_undersized_classes()?,
            level_specific_sizes: self.get_level_size_overrides((min, max))?,
            ..GenerationParameters::default()
        })
    }

    // ===== Refinement =====

    pub fn refinement_constraints(&self) -> Result<RefinementConstraints, Box<dyn Error>> {
        let (min, max) = self.get_default_class_size()?;
        Ok(RefinementConstraints {
            min_class_size: min,
            max_class_size: max,
            max_student_moves_per_run: self.get_parsed_or_default(
                config_keys::MAX_STUDENT_MOVES_PER_RUN,
                DEFAULT_MAX_STUDENT_MOVES_PER_RUN,
            )?,
            allow_teacher_reassignment: self
                .get_parsed_or_default(config_keys::ALLOW_TEACHER_REASSIGNMENT, true)?,
            allow_time_slot_changes: self
                .get_parsed_or_default(config_keys::ALLOW_TIME_SLOT_CHANGES, false)?,
            maintain_student_category_balance: self
                .get_parsed_or_default(config_keys::MAINTAIN_CATEGORY_BALANCE, true)?,
            max_new_student_ratio: self.get_parsed_or_default(
                config_keys::MAX_NEW_STUDENT_RATIO,
                DEFAULT_MAX_NEW_STUDENT_RATIO,
            )?,
        })
    }
}

// ==========================================
// Config keys
// ==========================================
pub mod config_keys {
    // generation
    pub const MAX_CLASSES_PER_TEACHER: &str = "generation.max_classes_per_teacher";
    pub const NEW_EXISTING_RATIO: &str = "generation.new_existing_ratio";
    pub const ALLOW_UNDERSIZED_CLASSES: &str = "generation.allow_undersized_classes";

    // refinement
    pub const MAX_STUDENT_MOVES_PER_RUN: &str = "refinement.max_student_moves_per_run";
    pub const MAX_NEW_STUDENT_RATIO: &str = "refinement.max_new_student_ratio";
    pub const MAINTAIN_CATEGORY_BALANCE: &str = "refinement.maintain_category_balance";
    pub const ALLOW_TEACHER_REASSIGNMENT: &str = "refinement.allow_teacher_reassignment";
    pub const ALLOW_TIME_SLOT_CHANGES: &str = "refinement.allow_time_slot_changes";
}

pub mod class_size_keys {
    pub const DEFAULT_MIN: &str = "default.min";
    pub const DEFAULT_MAX: &str = "default.max";
    pub const MIN_SUFFIX: &str = ".min";
    pub const MAX_SUFFIX: &str = ".max";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_empty() {
        let config = manager();
        let params = config.recommended_parameters().unwrap();
        assert_eq!(params, GenerationParameters::default());
        assert_eq!(
            config.refinement_constraints().unwrap(),
            RefinementConstraints::default()
        );
    }

    #[test]
    fn test_overrides_are_read() {
        let config = manager();
        config
            .set_global_config_value(config_keys::MAX_STUDENT_MOVES_PER_RUN, "2")
            .unwrap();
        config
            .set_global_config_value(config_keys::ALLOW_UNDERSIZED_CLASSES, "true")
            .unwrap();
        config
            .set_global_config_value(config_keys::NEW_EXISTING_RATIO, "not-a-number")
            .unwrap();
        {
            let conn = config.conn.lock().unwrap();
            conn.execute_batch(
                "INSERT INTO class_size_configuration (config_key, level_id, config_value) VALUES
                   ('default.max', NULL, 12),
                   ('L2.min', 'L2', 4),
                   ('L2.max', 'L2', 6),
                   ('L3.max', 'L3', 8);",
            )
            .unwrap();
        }

        assert_eq!(config.refinement_constraints().unwrap().max_student_moves_per_run, 2);

        let params = config.recommended_parameters().unwrap();
        assert!(params.allow_undersized_classes);
        assert_eq!(params.new_existing_student_ratio, DEFAULT_NEW_EXISTING_RATIO);
        assert_eq!(params.default_max_class_size, 12);
        assert_eq!(params.size_bounds("L2"), (4, 6));
        assert_eq!(params.size_bounds("L3"), (7, 8));
        assert_eq!(params.size_bounds("L1"), (7, 12));

        let snapshot: BTreeMap<String, String> =
            serde_json::from_str(&config.get_config_snapshot().unwrap()).unwrap();
        assert_eq!(snapshot.len(), 3);
    }
}
