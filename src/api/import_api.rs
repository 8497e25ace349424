// ==========================================
// Campagnes médicales - API d'import des bénéficiaires
// ==========================================
// Façade asynchrone: le pipeline synchrone tourne sur spawn_blocking
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::defaults;
use crate::config::{config_keys, ConfigManager, ImportConfig};
use crate::domain::{CanonicalField, ImportPolicy, ImportResult};
use crate::importer::field_mapper::{header_label, REQUIRED_FIELDS};
use crate::importer::{BeneficiaryImporter, SqliteBeneficiaryImporter};
use crate::repository::{BeneficiaryStore, SqliteBeneficiaryRepository};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Rapport renvoyé à l'appelant
pub type ImportReport = ImportResult;

/// Demande d'import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    pub file_path: String,
    pub campaign_id: i64,
    pub ignore_duplicates: bool,
    #[serde(default)]
    pub force_import: bool,
    #[serde(default)]
    pub dry_run: bool,
}

impl ImportRequest {
    pub fn policy(&self) -> ImportPolicy {
        ImportPolicy::new(self.ignore_duplicates)
            .with_force_import(self.force_import)
            .with_dry_run(self.dry_run)
    }
}

/// Réponse à l'annulation d'un lot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelImportBatchResponse {
    pub batch_id: String,
    /// Bénéficiaires marqués supprimés
    pub deleted_beneficiaries: usize,
    pub message: String,
}

/// API d'import
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// Importe un fichier de bénéficiaires dans une campagne
    ///
    /// # Retour
    /// - Ok(ImportReport): rapport, y compris en cas d'annulation
    /// - Err(ApiError): fichier refusé, colonnes manquantes, campagne
    ///   inconnue, panne de la base
    pub async fn import_beneficiaries(&self, request: ImportRequest) -> ApiResult<ImportReport> {
        if request.file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("chemin de fichier vide".to_string()));
        }
        if request.campaign_id <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "identifiant de campagne invalide : {}",
                request.campaign_id
            )));
        }

        let db_path = self.db_path.clone();
        let report = tokio::task::spawn_blocking(move || {
            let importer = SqliteBeneficiaryImporter::open(&db_path)?;
            importer.import_file(
                Path::new(&request.file_path),
                request.campaign_id,
                request.policy(),
            )
        })
        .await
        .map_err(|e| ApiError::TaskFailed(e.to_string()))??;

        Ok(report)
    }

    /// Annule un lot importé (suppression logique)
    ///
    /// Les téléphones du lot redeviennent disponibles pour la détection
    /// de doublons.
    pub async fn cancel_import_batch(&self, batch_id: &str) -> ApiResult<CancelImportBatchResponse> {
        let batch_id = batch_id.trim().to_string();
        if batch_id.is_empty() {
            return Err(ApiError::InvalidInput("identifiant de lot vide".to_string()));
        }

        let db_path = self.db_path.clone();
        let target = batch_id.clone();
        let deleted = tokio::task::spawn_blocking(move || -> ApiResult<usize> {
            let conn = crate::db::open_sqlite_connection(&db_path)
                .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
            let conn = Arc::new(Mutex::new(conn));
            let config = ImportConfig::load(&ConfigManager::from_connection(conn.clone())?)?;
            let repo = SqliteBeneficiaryRepository::from_connection(conn, &config.beneficiary_table)?;
            Ok(repo.soft_delete_batch(&target)?)
        })
        .await
        .map_err(|e| ApiError::TaskFailed(e.to_string()))??;

        if deleted == 0 {
            return Err(ApiError::NotFound(format!("lot d'import {}", batch_id)));
        }

        info!(batch_id = %batch_id, deleted, "lot d'import annulé");
        Ok(CancelImportBatchResponse {
            message: format!("{} bénéficiaire(s) retiré(s)", deleted),
            batch_id,
            deleted_beneficiaries: deleted,
        })
    }

    /// Configuration d'import lue dans config_kv
    fn load_config(&self) -> ApiResult<(ConfigManager, ImportConfig)> {
        let manager = ConfigManager::new(&self.db_path)?;
        let config = ImportConfig::load(&manager)?;
        Ok((manager, config))
    }

    /// Applique la langue configurée (`import.locale`) au processus
    ///
    /// La langue rust-i18n est globale: à appeler une fois au démarrage,
    /// pas par import.
    ///
    /// # Retour
    /// - langue effectivement retenue
    pub fn apply_configured_locale(&self) -> ApiResult<String> {
        let (_, config) = self.load_config()?;
        crate::i18n::set_locale(&config.locale);
        Ok(crate::i18n::current_locale())
    }

    /// Valeurs `import.*` enregistrées (les autres clés prennent leur défaut)
    pub fn get_config_overrides(&self) -> ApiResult<BTreeMap<String, String>> {
        let manager = ConfigManager::new(&self.db_path)?;
        Ok(manager.get_import_snapshot()?)
    }

    /// Enregistre une valeur de configuration d'import
    ///
    /// La configuration complète est relue après écriture; une valeur
    /// qui la rend invalide est retirée et l'erreur renvoyée.
    ///
    /// # Retour
    /// - configuration résultante
    pub fn set_config_value(&self, key: &str, value: &str) -> ApiResult<ImportConfig> {
        if !config_keys::ALL.contains(&key) {
            return Err(ApiError::InvalidInput(format!(
                "clé de configuration inconnue : {} (attendu : {})",
                key,
                config_keys::ALL.join(", ")
            )));
        }

        let manager = ConfigManager::new(&self.db_path)?;
        let previous = manager.get_global_config_value(key)?;
        manager.set_global_config_value(key, value)?;

        match ImportConfig::load(&manager) {
            Ok(config) => {
                info!(key, value, "configuration d'import modifiée");
                Ok(config)
            }
            Err(e) => {
                warn!(key, value, error = %e, "valeur refusée, retour à la précédente");
                match previous {
                    Some(old) => manager.set_global_config_value(key, &old)?,
                    None => manager.delete_global_config_value(key)?,
                }
                Err(e.into())
            }
        }
    }

    /// Crée les tables manquantes (campagnes, configuration, bénéficiaires)
    ///
    /// # Retour
    /// - nom de la table des bénéficiaires effectivement créée
    pub fn init_schema(&self) -> ApiResult<String> {
        let conn = crate::db::open_sqlite_connection(&self.db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        // config_kv doit exister avant de lire le nom de table configuré
        crate::db::init_schema(&conn, defaults::BENEFICIARY_TABLE)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

        let conn = Arc::new(Mutex::new(conn));
        let config = ImportConfig::load(&ConfigManager::from_connection(conn.clone())?)?;
        if config.beneficiary_table != defaults::BENEFICIARY_TABLE {
            let guard = conn
                .lock()
                .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
            crate::db::init_schema(&guard, &config.beneficiary_table)
                .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        }

        info!(table = %config.beneficiary_table, "schéma prêt");
        Ok(config.beneficiary_table)
    }

    /// En-têtes du modèle d'import: obligatoires d'abord
    pub fn template_headers() -> Vec<String> {
        let optional = CanonicalField::ALL
            .iter()
            .filter(|f| !REQUIRED_FIELDS.contains(*f));
        REQUIRED_FIELDS
            .iter()
            .chain(optional)
            .map(|f| header_label(*f).to_string())
            .collect()
    }

    /// Écrit le modèle d'import (CSV séparé par des points-virgules)
    pub fn write_template_csv(path: &Path) -> ApiResult<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .from_path(path)
            .map_err(|e| ApiError::InvalidInput(format!("{} : {}", path.display(), e)))?;
        writer
            .write_record(Self::template_headers())
            .map_err(|e| ApiError::InvalidInput(format!("{} : {}", path.display(), e)))?;
        writer
            .flush()
            .map_err(|e| ApiError::InvalidInput(format!("{} : {}", path.display(), e)))?;
        Ok(())
    }
}
