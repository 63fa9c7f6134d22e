// ==========================================
// Class Generation Engine - Config layer
// ==========================================
// Storage: config_kv + class_size_configuration
// ==========================================

pub mod config_manager;

pub use config_manager::{class_size_keys, config_keys, ConfigManager};
