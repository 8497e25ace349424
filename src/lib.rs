// ==========================================
// Campagnes médicales - Import en masse des bénéficiaires
// ==========================================
// Pipeline: fichier tableur/CSV → en-têtes tolérants → validation
//           → doublons → écriture transactionnelle → rapport
// Stockage: SQLite
// ==========================================

// Initialisation de l'internationalisation
rust_i18n::i18n!("locales", fallback = "fr");

// ==========================================
// Déclaration des modules
// ==========================================

// Domaine - entités et types
pub mod domain;

// Stockage - accès aux données
pub mod repository;

// Import - pipeline
pub mod importer;

// Configuration - table config_kv
pub mod config;

// Base de données (PRAGMA, schéma)
pub mod db;

// Journaux
pub mod logging;

// Internationalisation
pub mod i18n;

// API - point d'entrée des appelants
pub mod api;

// ==========================================
// Réexports
// ==========================================

pub use domain::{
    AssistanceKind, Campaign, CanonicalField, ImportPolicy, ImportResult, Sex,
    TransactionOutcome, ValidatedBeneficiary,
};
pub use importer::{BeneficiaryImporter, ImportError, SqliteBeneficiaryImporter};
pub use api::{ApiError, ImportApi, ImportRequest};

// ==========================================
// Constantes
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "Import des bénéficiaires";
