// ==========================================
// Campagnes médicales - Couche configuration
// ==========================================
// Stockage: table config_kv, portée global, clés import.*
// ==========================================

pub mod config_manager;
pub mod import_config;
pub mod import_config_trait;

pub use config_manager::{config_keys, ConfigManager};
pub use import_config::{BirthDatePolicy, ImportConfig};
pub use import_config_trait::ImportConfigReader;
