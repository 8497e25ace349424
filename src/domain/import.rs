// ==========================================
// Campagnes médicales - Modèle de l'import en masse
// ==========================================
// ImportContext: campagne + politique d'import (entrée du pipeline)
// ImportResult: rapport renvoyé à l'appelant, jamais persisté
// ==========================================

use crate::domain::campaign::Campaign;
use crate::domain::types::{AssistanceKind, CanonicalField};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ImportPolicy - drapeaux de politique
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportPolicy {
    /// true: les doublons de téléphone sont importés quand même
    pub ignore_duplicates: bool,
    /// true: valide même si d'autres lignes sont en erreur
    #[serde(default)]
    pub force_import: bool,
    /// true: valide sans rien écrire
    #[serde(default)]
    pub dry_run: bool,
}

impl ImportPolicy {
    pub fn new(ignore_duplicates: bool) -> Self {
        Self {
            ignore_duplicates,
            force_import: false,
            dry_run: false,
        }
    }

    pub fn with_force_import(mut self, force_import: bool) -> Self {
        self.force_import = force_import;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

// ==========================================
// ImportContext - contexte d'un appel d'import
// ==========================================
#[derive(Debug, Clone)]
pub struct ImportContext {
    pub campaign: Campaign,
    pub policy: ImportPolicy,
    /// Date de référence pour le calcul des âges
    pub today: NaiveDate,
}

impl ImportContext {
    pub fn new(campaign: Campaign, policy: ImportPolicy) -> Self {
        Self {
            campaign,
            policy,
            today: chrono::Local::now().date_naive(),
        }
    }

    pub fn assistance_kind(&self) -> AssistanceKind {
        self.campaign.assistance_kind()
    }
}

// ==========================================
// Anomalies par ligne
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    Required,            // champ obligatoire vide
    InvalidSex,          // sexe hors {M, F}
    InvalidDate,         // date illisible
    DateOutOfRange,      // date future ou âge > maximum
    InvalidPhone,        // téléphone != 9 chiffres
    InvalidEmail,        // email mal formé
    InvalidChoice,       // valeur hors énumération
    ConditionalRequired, // requis par le type d'assistance
    Storage,             // échec d'insertion non systémique
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: Option<CanonicalField>,
    pub kind: IssueKind,
    pub message: String,
}

/// Toutes les anomalies d'une ligne du fichier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub line: usize,
    pub issues: Vec<FieldIssue>,
}

impl RowError {
    pub fn has_kind(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }

    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(|i| i.message.clone()).collect()
    }
}

// ==========================================
// Issue de la transaction
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionOutcome {
    Committed,
    RolledBack,
    DryRun,
}

impl fmt::Display for TransactionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionOutcome::Committed => write!(f, "COMMITTED"),
            TransactionOutcome::RolledBack => write!(f, "ROLLED_BACK"),
            TransactionOutcome::DryRun => write!(f, "DRY_RUN"),
        }
    }
}

// ==========================================
// ImportResult - rapport d'import
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedRowError {
    pub line: usize,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub id: i64,
    pub name: String,
    pub assistance_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub total_rows: usize,
    pub imported_count: usize,
    /// Lignes vides + doublons
    pub skipped_count: usize,
    pub error_count: usize,
    pub errors: Vec<ReportedRowError>,
    pub warnings: Vec<String>,
    pub campaign: CampaignSummary,

    // Détails complémentaires
    pub batch_id: Option<String>,
    pub outcome: TransactionOutcome,
    pub dry_run: bool,
    /// Lignes ayant passé validation et contrôle de doublon
    pub valid_count: usize,
    pub empty_rows: usize,
    pub duplicate_rows: usize,
    /// Erreurs non détaillées au-delà du plafond
    pub truncated_errors: usize,
    pub delimiter: Option<char>,
    pub elapsed_ms: u64,
}

impl ImportResult {
    pub fn committed(&self) -> bool {
        self.outcome == TransactionOutcome::Committed
    }
}
