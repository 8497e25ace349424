// ==========================================
// Campagnes médicales - Erreurs de la couche API
// ==========================================
// Traduit les erreurs internes en messages exploitables par l'opérateur
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// Erreurs de la couche API
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== Requête =====
    #[error("Entrée invalide : {0}")]
    InvalidInput(String),

    #[error("Introuvable : {0}")]
    NotFound(String),

    // ===== Import =====
    #[error("Fichier refusé : {0}")]
    FileFormat(String),

    #[error("{0}")]
    MissingColumns(String),

    #[error("Campagne introuvable : {0}")]
    CampaignNotFound(i64),

    #[error("Configuration invalide : {0}")]
    Configuration(String),

    // ===== Base de données =====
    #[error("Erreur de base de données : {0}")]
    DatabaseError(String),

    #[error("Connexion à la base impossible : {0}")]
    DatabaseConnectionError(String),

    #[error("Échec de transaction : {0}")]
    DatabaseTransactionError(String),

    // ===== Exécution =====
    #[error("Tâche d'import interrompue : {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} (id={})", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("verrou inaccessible : {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::InvalidIdentifier(name) => {
                ApiError::Configuration(format!("nom de table invalide : {}", name))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::MissingColumns { .. } => ApiError::MissingColumns(err.to_string()),
            ImportError::CampaignNotFound(id) => ApiError::CampaignNotFound(id),
            ImportError::Config { .. } => ApiError::Configuration(err.to_string()),
            ImportError::Storage(repo) => repo.into(),
            ImportError::Other(err) => ApiError::Other(err),
            file_err => ApiError::FileFormat(file_err.to_string()),
        }
    }
}

/// Alias Result
pub type ApiResult<T> = Result<T, ApiError>;
