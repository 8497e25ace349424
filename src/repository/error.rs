// ==========================================
// Campagnes médicales - Erreurs de la couche stockage
// ==========================================
// Outil: thiserror
// Systémique = la base elle-même est indisponible (verrou, disque,
// E/S, corruption): l'import entier est abandonné.
// Non systémique = une ligne refusée (contrainte, type): l'import
// continue et la ligne est comptée en erreur.
// ==========================================

use rusqlite::ErrorCode;
use thiserror::Error;

/// Erreurs de la couche stockage
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== Base indisponible =====
    #[error("Connexion à la base impossible : {0}")]
    DatabaseConnectionError(String),

    #[error("Verrou de connexion inaccessible : {0}")]
    LockError(String),

    #[error("Base de données indisponible : {0}")]
    DatabaseUnavailable(String),

    #[error("Échec de transaction : {0}")]
    DatabaseTransactionError(String),

    // ===== Refus d'une écriture =====
    #[error("Requête en échec : {0}")]
    DatabaseQueryError(String),

    #[error("Contrainte d'unicité violée : {0}")]
    UniqueConstraintViolation(String),

    #[error("Contrainte de clé étrangère violée : {0}")]
    ForeignKeyViolation(String),

    #[error("Contrainte violée : {0}")]
    ConstraintViolation(String),

    // ===== Configuration =====
    #[error("Nom de table invalide : {0}")]
    InvalidIdentifier(String),

    #[error("Enregistrement introuvable : {entity} id={id}")]
    NotFound { entity: String, id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    /// true si l'erreur touche la base entière et non une ligne
    pub fn is_systemic(&self) -> bool {
        matches!(
            self,
            RepositoryError::DatabaseConnectionError(_)
                | RepositoryError::LockError(_)
                | RepositoryError::DatabaseUnavailable(_)
                | RepositoryError::DatabaseTransactionError(_)
                | RepositoryError::InvalidIdentifier(_)
                | RepositoryError::Other(_)
        )
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, RepositoryError::UniqueConstraintViolation(_))
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ffi_err, msg) => {
                let msg = msg.unwrap_or_else(|| ffi_err.to_string());
                match ffi_err.code {
                    ErrorCode::ConstraintViolation => {
                        if msg.contains("UNIQUE") {
                            RepositoryError::UniqueConstraintViolation(msg)
                        } else if msg.contains("FOREIGN KEY") {
                            RepositoryError::ForeignKeyViolation(msg)
                        } else {
                            RepositoryError::ConstraintViolation(msg)
                        }
                    }
                    ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::DiskFull
                    | ErrorCode::SystemIoFailure
                    | ErrorCode::DatabaseCorrupt
                    | ErrorCode::CannotOpen
                    | ErrorCode::ReadOnly
                    | ErrorCode::OutOfMemory
                    | ErrorCode::NotADatabase => RepositoryError::DatabaseUnavailable(msg),
                    _ => RepositoryError::DatabaseQueryError(msg),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "inconnu".to_string(),
                id: "inconnu".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Alias Result
pub type RepositoryResult<T> = Result<T, RepositoryError>;
