// ==========================================
// Campagnes médicales - Couche domaine
// ==========================================
// Entités et types partagés par l'import et le stockage
// Ne contient ni accès aux données ni logique de pipeline
// ==========================================

pub mod beneficiary;
pub mod campaign;
pub mod import;
pub mod types;

// Réexport des types principaux
pub use beneficiary::{StoredBeneficiary, ValidatedBeneficiary};
pub use campaign::Campaign;
pub use import::{
    CampaignSummary, FieldIssue, ImportContext, ImportPolicy, ImportResult, IssueKind,
    ReportedRowError, RowError, TransactionOutcome,
};
pub use types::{AssistanceKind, CanonicalField, Decision, Laterality, Sex};
