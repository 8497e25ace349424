// ==========================================
// Campagnes médicales - Gestionnaire de configuration
// ==========================================
// Stockage: table config_kv (clé / valeur / portée)
// Lecture des réglages d'import + écriture ponctuelle (CLI, tests)
// ==========================================

use crate::config::import_config::BirthDatePolicy;
use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use crate::importer::error::{ImportError, ImporterResult};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

/// Portée unique utilisée par l'import
const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// # Paramètres
    /// - db_path: chemin de la base
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Depuis une connexion partagée (PRAGMA réappliqués, idempotent)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Valeur d'une clé en portée globale
    ///
    /// # Retour
    /// - Some(String): valeur trouvée
    /// - None: clé absente
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Écrit (ou remplace) une clé en portée globale
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// Supprime une clé en portée globale (retour à la valeur par défaut)
    pub fn delete_global_config_value(&self, key: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
        )?;
        Ok(())
    }

    /// Toutes les clés `import.*` enregistrées (commande `config` de la CLI)
    pub fn get_import_snapshot(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = ?1 AND key LIKE 'import.%' ORDER BY key",
        )?;
        let rows = stmt
            .query_map(params![GLOBAL_SCOPE], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
        Ok(rows)
    }

    /// Valeur texte, défaut si absente
    fn text_or_default(&self, key: &str, default: &str) -> ImporterResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    /// Valeur numérique, défaut si absente, erreur si illisible
    fn parse_or_default<T: FromStr>(&self, key: &str, default: T) -> ImporterResult<T> {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|_| ImportError::Config {
                key: key.to_string(),
                message: format!("valeur numérique attendue, trouvé « {} »", raw),
            }),
        }
    }
}

impl ImportConfigReader for ConfigManager {
    fn get_beneficiary_table(&self) -> ImporterResult<String> {
        self.text_or_default(config_keys::BENEFICIARY_TABLE, defaults::BENEFICIARY_TABLE)
    }

    fn get_birth_date_policy(&self) -> ImporterResult<BirthDatePolicy> {
        let raw = self.text_or_default(config_keys::BIRTH_DATE_REQUIRED, "OPTIONAL")?;
        BirthDatePolicy::parse(&raw).ok_or_else(|| ImportError::Config {
            key: config_keys::BIRTH_DATE_REQUIRED.to_string(),
            message: format!("REQUIRED ou OPTIONAL attendu, trouvé « {} »", raw),
        })
    }

    fn get_child_age_threshold(&self) -> ImporterResult<i32> {
        self.parse_or_default(config_keys::CHILD_AGE_THRESHOLD, defaults::CHILD_AGE_THRESHOLD)
    }

    fn get_max_age_years(&self) -> ImporterResult<i32> {
        self.parse_or_default(config_keys::MAX_AGE_YEARS, defaults::MAX_AGE_YEARS)
    }

    fn get_max_reported_errors(&self) -> ImporterResult<usize> {
        self.parse_or_default(config_keys::MAX_REPORTED_ERRORS, defaults::MAX_REPORTED_ERRORS)
    }

    fn get_large_file_rows(&self) -> ImporterResult<usize> {
        self.parse_or_default(config_keys::LARGE_FILE_ROWS, defaults::LARGE_FILE_ROWS)
    }

    fn get_locale(&self) -> ImporterResult<String> {
        self.text_or_default(config_keys::LOCALE, defaults::LOCALE)
    }
}

// ==========================================
// Clés de configuration (portée global)
// ==========================================
pub mod config_keys {
    pub const BENEFICIARY_TABLE: &str = "import.beneficiary_table";
    pub const BIRTH_DATE_REQUIRED: &str = "import.birth_date_required";
    pub const CHILD_AGE_THRESHOLD: &str = "import.child_age_threshold";
    pub const MAX_AGE_YEARS: &str = "import.max_age_years";
    pub const MAX_REPORTED_ERRORS: &str = "import.max_reported_errors";
    pub const LARGE_FILE_ROWS: &str = "import.large_file_rows";
    pub const LOCALE: &str = "import.locale";

    /// Clés reconnues
    pub const ALL: &[&str] = &[
        BENEFICIARY_TABLE,
        BIRTH_DATE_REQUIRED,
        CHILD_AGE_THRESHOLD,
        MAX_AGE_YEARS,
        MAX_REPORTED_ERRORS,
        LARGE_FILE_ROWS,
        LOCALE,
    ];
}

// ==========================================
// Valeurs par défaut
// ==========================================
pub mod defaults {
    pub const BENEFICIARY_TABLE: &str = "beneficiaries";
    pub const CHILD_AGE_THRESHOLD: i32 = 18;
    pub const MAX_AGE_YEARS: i32 = 120;
    pub const MAX_REPORTED_ERRORS: usize = 20;
    pub const LARGE_FILE_ROWS: usize = 1000;
    pub const LOCALE: &str = "fr";
}
