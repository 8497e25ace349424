// ==========================================
// Campagnes médicales - Rapport d'import
// ==========================================
// Dérive ImportResult des compteurs de l'orchestrateur
// Sans effet de bord: même entrée → même rapport
// ==========================================

use crate::domain::{
    Campaign, CampaignSummary, ImportResult, IssueKind, ReportedRowError, RowError,
    TransactionOutcome,
};
use crate::i18n::t_with_args;

// ==========================================
// ImportTally - compteurs accumulés pendant le parcours
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportTally {
    /// Lignes de données parcourues (vides comprises)
    pub total_rows: usize,
    /// Lignes validées et non doublons
    pub valid_rows: usize,
    /// Lignes insérées dans la transaction (avant décision)
    pub inserted_rows: usize,
    pub empty_rows: usize,
    pub duplicate_rows: usize,
    /// Erreurs dans l'ordre du fichier
    pub row_errors: Vec<RowError>,
    /// En-têtes du fichier non reconnus
    pub unmapped_headers: Vec<String>,
}

impl ImportTally {
    pub fn error_count(&self) -> usize {
        self.row_errors.len()
    }

    /// Lignes dont le téléphone est mal formé
    pub fn phone_failures(&self) -> usize {
        self.row_errors
            .iter()
            .filter(|e| e.has_kind(IssueKind::InvalidPhone))
            .count()
    }
}

/// Contexte de fin d'import
#[derive(Debug, Clone)]
pub struct ImportRun<'a> {
    pub tally: &'a ImportTally,
    pub campaign: &'a Campaign,
    pub outcome: TransactionOutcome,
    pub batch_id: Option<String>,
    pub delimiter: Option<char>,
    pub elapsed_ms: u64,
}

// ==========================================
// ResultReporter
// ==========================================
pub struct ResultReporter {
    max_reported_errors: usize,
    large_file_rows: usize,
}

impl ResultReporter {
    /// # Paramètres
    /// - max_reported_errors: erreurs détaillées au plus
    /// - large_file_rows: seuil de l'avertissement « fichier volumineux »
    pub fn new(max_reported_errors: usize, large_file_rows: usize) -> Self {
        Self {
            max_reported_errors,
            large_file_rows,
        }
    }

    pub fn build(&self, run: &ImportRun<'_>) -> ImportResult {
        let tally = run.tally;
        let committed = run.outcome == TransactionOutcome::Committed;
        let imported_count = if committed { tally.inserted_rows } else { 0 };

        let errors: Vec<ReportedRowError> = tally
            .row_errors
            .iter()
            .take(self.max_reported_errors)
            .map(|e| ReportedRowError {
                line: e.line,
                messages: e.messages(),
            })
            .collect();
        let truncated_errors = tally.error_count().saturating_sub(errors.len());

        ImportResult {
            total_rows: tally.total_rows,
            imported_count,
            skipped_count: tally.empty_rows + tally.duplicate_rows,
            error_count: tally.error_count(),
            errors,
            warnings: self.warnings(run, imported_count, truncated_errors),
            campaign: CampaignSummary {
                id: run.campaign.id,
                name: run.campaign.name.clone(),
                assistance_type: run.campaign.assistance_type_label.clone(),
            },
            batch_id: run.batch_id.clone(),
            outcome: run.outcome,
            dry_run: run.outcome == TransactionOutcome::DryRun,
            valid_count: tally.valid_rows,
            empty_rows: tally.empty_rows,
            duplicate_rows: tally.duplicate_rows,
            truncated_errors,
            delimiter: run.delimiter,
            elapsed_ms: run.elapsed_ms,
        }
    }

    fn warnings(&self, run: &ImportRun<'_>, imported: usize, truncated: usize) -> Vec<String> {
        let tally = run.tally;
        let errors = tally.error_count().to_string();
        let mut warnings = Vec::new();

        match run.outcome {
            TransactionOutcome::DryRun => warnings.push(t_with_args("warning.dry_run", &[])),
            TransactionOutcome::RolledBack => {
                warnings.push(t_with_args("warning.rolled_back", &[("errors", &errors)]))
            }
            TransactionOutcome::Committed if tally.error_count() > 0 => warnings.push(
                t_with_args(
                    "warning.force_partial",
                    &[("imported", &imported.to_string()), ("errors", &errors)],
                ),
            ),
            TransactionOutcome::Committed => {}
        }

        if !run.campaign.is_active() {
            warnings.push(t_with_args(
                "warning.inactive_campaign",
                &[("name", &run.campaign.name), ("status", &run.campaign.status)],
            ));
        }

        if tally.total_rows > self.large_file_rows {
            warnings.push(t_with_args(
                "warning.large_file",
                &[("rows", &tally.total_rows.to_string())],
            ));
        }

        let phone_failures = tally.phone_failures();
        if phone_failures > 0 {
            warnings.push(t_with_args(
                "warning.phone_failures",
                &[("count", &phone_failures.to_string())],
            ));
        }

        if tally.duplicate_rows > 0 {
            warnings.push(t_with_args(
                "warning.duplicates",
                &[("count", &tally.duplicate_rows.to_string())],
            ));
        }

        if !tally.unmapped_headers.is_empty() {
            warnings.push(t_with_args(
                "warning.unmapped_columns",
                &[("columns", &tally.unmapped_headers.join(", "))],
            ));
        }

        if truncated > 0 {
            warnings.push(t_with_args(
                "warning.truncated",
                &[("count", &truncated.to_string())],
            ));
        }

        warnings
    }
}
