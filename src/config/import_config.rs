// ==========================================
// Campagnes médicales - Configuration d'import
// ==========================================
// Résolue une seule fois à la construction du pipeline
// ==========================================

use crate::config::config_manager::defaults;
use crate::config::import_config_trait::ImportConfigReader;
use crate::db::is_valid_identifier;
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::row_validator::ValidationRules;
use serde::{Deserialize, Serialize};

/// Bornes du nombre d'erreurs détaillées dans un rapport
pub const MIN_REPORTED_ERRORS: usize = 10;
pub const MAX_REPORTED_ERRORS: usize = 20;

/// Exigence sur la date de naissance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BirthDatePolicy {
    /// Colonne obligatoire et valeur exigée sur chaque ligne
    Required,
    /// Contrôlée seulement si renseignée
    Optional,
}

impl BirthDatePolicy {
    /// REQUIRED / OPTIONAL, ainsi que true / false
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "REQUIRED" | "TRUE" | "1" => Some(BirthDatePolicy::Required),
            "OPTIONAL" | "FALSE" | "0" => Some(BirthDatePolicy::Optional),
            _ => None,
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, BirthDatePolicy::Required)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    pub beneficiary_table: String,
    pub birth_date_policy: BirthDatePolicy,
    pub child_age_threshold: i32,
    pub max_age_years: i32,
    /// Toujours compris entre 10 et 20
    pub max_reported_errors: usize,
    pub large_file_rows: usize,
    pub locale: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            beneficiary_table: defaults::BENEFICIARY_TABLE.to_string(),
            birth_date_policy: BirthDatePolicy::Optional,
            child_age_threshold: defaults::CHILD_AGE_THRESHOLD,
            max_age_years: defaults::MAX_AGE_YEARS,
            max_reported_errors: defaults::MAX_REPORTED_ERRORS,
            large_file_rows: defaults::LARGE_FILE_ROWS,
            locale: defaults::LOCALE.to_string(),
        }
    }
}

impl ImportConfig {
    /// Lit et contrôle la configuration
    ///
    /// # Retour
    /// - Err(Config): nom de table invalide ou seuils incohérents
    pub fn load(reader: &dyn ImportConfigReader) -> ImporterResult<Self> {
        let config = Self {
            beneficiary_table: reader.get_beneficiary_table()?,
            birth_date_policy: reader.get_birth_date_policy()?,
            child_age_threshold: reader.get_child_age_threshold()?,
            max_age_years: reader.get_max_age_years()?,
            max_reported_errors: reader.get_max_reported_errors()?,
            large_file_rows: reader.get_large_file_rows()?,
            locale: reader.get_locale()?,
        };
        config.validated()
    }

    /// Contrôles de cohérence + plafond d'erreurs ramené dans [10, 20]
    pub fn validated(mut self) -> ImporterResult<Self> {
        if !is_valid_identifier(&self.beneficiary_table) {
            return Err(ImportError::Config {
                key: "import.beneficiary_table".to_string(),
                message: format!("nom de table invalide « {} »", self.beneficiary_table),
            });
        }
        if self.max_age_years <= 0 || self.child_age_threshold < 0 {
            return Err(ImportError::Config {
                key: "import.max_age_years".to_string(),
                message: "les seuils d'âge doivent être positifs".to_string(),
            });
        }
        self.max_reported_errors = self
            .max_reported_errors
            .clamp(MIN_REPORTED_ERRORS, MAX_REPORTED_ERRORS);
        Ok(self)
    }

    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            child_age_threshold: self.child_age_threshold,
            max_age_years: self.max_age_years,
            birth_date_required: self.birth_date_policy.is_required(),
        }
    }
}
