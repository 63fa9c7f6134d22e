// ==========================================
// Class Generation Engine - Application state
// ==========================================
// Wires repositories, config and the API over one shared connection.
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::ClassGenerationApi;
use crate::config::ConfigManager;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::repository::{
    AssessmentRepository, ClassGroupRepository, GenerationLogRepository, LevelRepository,
    ProposalRepository, TeacherRepository,
};

/// Env var that overrides the database location.
pub const DB_PATH_ENV: &str = "CLASS_GENERATION_DB_PATH";

pub struct AppState {
    pub db_path: String,

    pub class_generation_api: Arc<ClassGenerationApi>,

    pub config_manager: Arc<ConfigManager>,

    /// Materialized classes (read side).
    pub class_group_repo: Arc<ClassGroupRepository>,

    pub log_repo: Arc<GenerationLogRepository>,

    /// Upstream stores; exposed for seeding and admin tooling.
    pub assessment_repo: Arc<AssessmentRepository>,
    pub level_repo: Arc<LevelRepository>,
    pub teacher_repo: Arc<TeacherRepository>,
}

impl AppState {
    /// Opens (and if needed creates) the database, then builds every layer.
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("initializing AppState, db_path={}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("cannot open database: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("schema setup failed: {}", e))?;

        Self::from_connection(db_path, Arc::new(Mutex::new(conn)))
    }

    /// Builds the state over an already configured connection.
    pub fn from_connection(db_path: String, conn: Arc<Mutex<Connection>>) -> Result<Self, String> {
        let assessment_repo = Arc::new(AssessmentRepository::new(conn.clone()));
        let level_repo = Arc::new(LevelRepository::new(conn.clone()));
        let teacher_repo = Arc::new(TeacherRepository::new(conn.clone()));
        let proposal_repo = Arc::new(ProposalRepository::new(conn.clone()));
        let log_repo = Arc::new(GenerationLogRepository::new(conn.clone()));
        let class_group_repo = Arc::new(ClassGroupRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("cannot create ConfigManager: {}", e))?,
        );

        let class_generation_api = Arc::new(ClassGenerationApi::new(
            assessment_repo.clone(),
            level_repo.clone(),
            teacher_repo.clone(),
            proposal_repo,
            log_repo.clone(),
            config_manager.clone(),
            class_group_repo.clone(),
        ));

        tracing::info!("AppState ready");

        Ok(Self {
            db_path,
            class_generation_api,
            config_manager,
            class_group_repo,
            log_repo,
            assessment_repo,
            level_repo,
            teacher_repo,
        })
    }
}

/// Database location: `$CLASS_GENERATION_DB_PATH`, else the user data dir,
/// else the working directory.
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./class_generation.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        let dir = data_dir.join("class-generation-dev");
        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("class-generation");

        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("class_generation.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_new_creates_schema() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let db_path = file.path().to_string_lossy().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.db_path, db_path);
        assert!(state
            .class_generation_api
            .list_proposals("T2026")
            .unwrap()
            .is_empty());
    }
}
