// ==========================================
// Campagnes médicales - Erreurs de l'import
// ==========================================
// Outil: thiserror
// Ces erreurs sont fatales: aucune donnée n'est écrite.
// Les anomalies par ligne passent par domain::RowError.
// ==========================================

use crate::domain::types::CanonicalField;
use crate::importer::field_mapper::header_labels;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// Erreurs fatales de l'import
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== Fichier =====
    #[error("Fichier introuvable : {0}")]
    FileNotFound(String),

    #[error("Format de fichier non pris en charge : {0} (.xlsx, .xls, .ods ou .csv)")]
    UnsupportedFormat(String),

    #[error("Fichier illisible : {0}")]
    FileFormat(String),

    #[error("Le fichier ne contient aucune ligne exploitable")]
    EmptyFile,

    // ===== Colonnes =====
    #[error("Colonnes obligatoires manquantes : {}", header_labels(.missing))]
    MissingColumns { missing: Vec<CanonicalField> },

    // ===== Contexte =====
    #[error("Campagne introuvable : {0}")]
    CampaignNotFound(i64),

    #[error("Configuration invalide (clé {key}) : {message}")]
    Config { key: String, message: String },

    // ===== Stockage =====
    #[error(transparent)]
    Storage(#[from] RepositoryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// Erreur liée au fichier lui-même (format, contenu, lecture)
    pub fn is_file_format(&self) -> bool {
        matches!(
            self,
            ImportError::FileNotFound(_)
                | ImportError::UnsupportedFormat(_)
                | ImportError::FileFormat(_)
                | ImportError::EmptyFile
        )
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileFormat(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::FileFormat(err.to_string())
    }
}

/// Alias Result
pub type ImporterResult<T> = Result<T, ImportError>;
