// ==========================================
// Campagnes médicales - Orchestrateur d'import des bénéficiaires
// ==========================================
// États: LOADING → MAPPING → PROCESSING → {COMMITTED, ROLLED_BACK} → REPORTED
// (DRY_RUN: PROCESSING sans transaction, rien n'est écrit)
// ==========================================
// Règle de validation: COMMIT si force_import OU aucune ligne en erreur
// Une panne de la base interrompt tout (ROLLBACK)
// ==========================================

use crate::config::{ConfigManager, ImportConfig};
use crate::domain::{
    FieldIssue, ImportContext, ImportPolicy, ImportResult, IssueKind, RowError,
    TransactionOutcome, ValidatedBeneficiary,
};
use crate::i18n::t_with_args;
use crate::importer::beneficiary_importer_trait::BeneficiaryImporter;
use crate::importer::duplicate_detector::{DuplicateCheck, DuplicateDetector};
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::field_mapper::{ColumnMapping, FieldMapper};
use crate::importer::file_parser::{LoadedSheet, UniversalFileParser};
use crate::importer::result_reporter::{ImportRun, ImportTally, ResultReporter};
use crate::importer::row_validator::RowValidator;
use crate::repository::{
    BeneficiaryStore, BeneficiaryWriter, CampaignDirectory, PhoneLookup, RepositoryError,
    RepositoryResult, SqliteBeneficiaryRepository, SqliteCampaignRepository,
};
use rusqlite::Connection;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Destination des lignes valides
enum RowSink<'a> {
    /// Simulation: contrôle de doublon en lecture seule
    DryRun(&'a dyn PhoneLookup),
    /// Écriture dans la transaction ouverte
    Write {
        writer: &'a mut dyn BeneficiaryWriter,
        batch_id: &'a str,
    },
}

// ==========================================
// BeneficiaryImporterImpl
// ==========================================
pub struct BeneficiaryImporterImpl<S, C>
where
    S: BeneficiaryStore,
    C: CampaignDirectory,
{
    // Stockage
    store: S,
    campaigns: C,

    // Composants (configuration figée à la construction)
    file_parser: UniversalFileParser,
    field_mapper: FieldMapper,
    validator: RowValidator,
    reporter: ResultReporter,
}

/// Pipeline complet sur SQLite
pub type SqliteBeneficiaryImporter =
    BeneficiaryImporterImpl<SqliteBeneficiaryRepository, SqliteCampaignRepository>;

impl<S, C> BeneficiaryImporterImpl<S, C>
where
    S: BeneficiaryStore,
    C: CampaignDirectory,
{
    /// # Paramètres
    /// - store: stock des bénéficiaires
    /// - campaigns: annuaire des campagnes
    /// - config: configuration déjà contrôlée
    ///
    /// La langue des messages est celle du processus (`i18n::set_locale`),
    /// pas celle de `config.locale`.
    pub fn new(store: S, campaigns: C, config: ImportConfig) -> Self {
        Self {
            store,
            campaigns,
            field_mapper: FieldMapper::new(config.birth_date_policy.is_required()),
            validator: RowValidator::new(config.validation_rules()),
            reporter: ResultReporter::new(config.max_reported_errors, config.large_file_rows),
            file_parser: UniversalFileParser,
        }
    }

    /// Suite du pipeline une fois le fichier chargé
    #[instrument(skip(self, sheet, policy, started), fields(rows = sheet.data_row_count()))]
    fn process(
        &self,
        sheet: LoadedSheet,
        campaign_id: i64,
        policy: ImportPolicy,
        started: Instant,
    ) -> ImporterResult<ImportResult> {
        // ===== Contexte =====
        let campaign = self
            .campaigns
            .get_campaign(campaign_id)?
            .ok_or(ImportError::CampaignNotFound(campaign_id))?;
        let ctx = ImportContext::new(campaign, policy);

        // ===== MAPPING =====
        debug!(
            state = "MAPPING",
            header_line = sheet.header_line(),
            headers = ?sheet.headers(),
            "résolution des en-têtes"
        );
        let mapping = match self.field_mapper.map_columns(sheet.headers()) {
            Ok(mapping) => mapping,
            Err(e) => {
                warn!(state = "MAPPING", error = %e, "import interrompu avant traitement");
                return Err(e);
            }
        };
        info!(
            state = "MAPPING",
            mapped = mapping.mapped_fields().len(),
            unmapped = mapping.unmapped_headers().len(),
            "en-têtes résolus"
        );

        let mut tally = ImportTally {
            total_rows: sheet.data_row_count(),
            unmapped_headers: mapping.unmapped_headers(),
            ..ImportTally::default()
        };

        // ===== PROCESSING =====
        let (outcome, batch_id) = if ctx.policy.dry_run {
            info!(state = "PROCESSING", "simulation: aucune transaction ouverte");
            let lookup: &dyn PhoneLookup = &self.store;
            self.process_rows(&sheet, &mapping, &ctx, &mut tally, &mut RowSink::DryRun(lookup))?;
            (TransactionOutcome::DryRun, None)
        } else {
            let batch_id = Uuid::new_v4().to_string();
            info!(state = "PROCESSING", batch_id = %batch_id, "transaction ouverte");

            let force_import = ctx.policy.force_import;
            let result = self.store.with_transaction(|writer| {
                let mut sink = RowSink::Write {
                    writer,
                    batch_id: &batch_id,
                };
                self.process_rows(&sheet, &mapping, &ctx, &mut tally, &mut sink)?;
                let commit = force_import || tally.error_count() == 0;
                Ok((commit, commit))
            });

            let committed = match result {
                Ok(committed) => committed,
                Err(e) => {
                    error!(state = "ROLLED_BACK", error = %e, "panne de stockage, import abandonné");
                    return Err(e.into());
                }
            };

            if committed {
                info!(
                    state = "COMMITTED",
                    inserted = tally.inserted_rows,
                    errors = tally.error_count(),
                    "transaction validée"
                );
                (TransactionOutcome::Committed, Some(batch_id))
            } else {
                info!(
                    state = "ROLLED_BACK",
                    errors = tally.error_count(),
                    "transaction annulée, lignes en erreur"
                );
                (TransactionOutcome::RolledBack, None)
            }
        };

        // ===== REPORTED =====
        let report = self.reporter.build(&ImportRun {
            tally: &tally,
            campaign: &ctx.campaign,
            outcome,
            batch_id,
            delimiter: sheet.delimiter,
            elapsed_ms: started.elapsed().as_millis() as u64,
        });
        info!(
            state = "REPORTED",
            total = report.total_rows,
            imported = report.imported_count,
            skipped = report.skipped_count,
            errors = report.error_count,
            outcome = %report.outcome,
            "import terminé"
        );
        Ok(report)
    }

    /// Parcours des lignes dans l'ordre du fichier
    ///
    /// # Retour
    /// - Err: uniquement pour une panne systémique de la base
    fn process_rows(
        &self,
        sheet: &LoadedSheet,
        mapping: &ColumnMapping,
        ctx: &ImportContext,
        tally: &mut ImportTally,
        sink: &mut RowSink<'_>,
    ) -> RepositoryResult<()> {
        let mut detector = DuplicateDetector::new(ctx.policy.ignore_duplicates);

        for (line, raw) in sheet.data_rows() {
            let row = mapping.map_row(raw, line);
            if row.is_blank() {
                tally.empty_rows += 1;
                continue;
            }

            let beneficiary = match self.validator.validate(&row, ctx) {
                Ok(b) => b,
                Err(e) => {
                    debug!(line, issues = e.issues.len(), "ligne rejetée");
                    tally.row_errors.push(e);
                    continue;
                }
            };

            let checked = match sink {
                RowSink::DryRun(lookup) => detector.check(&beneficiary.phone, line, *lookup),
                RowSink::Write { writer, .. } => {
                    detector.check(&beneficiary.phone, line, &**writer)
                }
            };
            let verdict = match checked {
                Ok(verdict) => verdict,
                Err(e) if e.is_systemic() => return Err(e),
                Err(e) => {
                    warn!(line, error = %e, "recherche de doublon refusée");
                    tally.row_errors.push(storage_row_error(line, &e));
                    continue;
                }
            };
            if verdict.is_duplicate() {
                if let DuplicateCheck::RepeatedInFile { first_line } = verdict {
                    debug!(line, first_line, "téléphone répété dans le fichier");
                } else {
                    debug!(line, "téléphone déjà enregistré");
                }
                tally.duplicate_rows += 1;
                continue;
            }

            match sink {
                RowSink::DryRun(_) => tally.valid_rows += 1,
                RowSink::Write { writer, batch_id } => {
                    let duplicate_ack = ctx.policy.ignore_duplicates;
                    match writer.insert(&beneficiary, *batch_id, duplicate_ack) {
                        Ok(id) => {
                            tally.valid_rows += 1;
                            tally.inserted_rows += 1;
                            debug!(line, id, "ligne insérée");
                        }
                        Err(e) => {
                            self.record_insert_failure(e, &beneficiary, &mut detector, tally)?
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Échec d'insertion: doublon concurrent, erreur de ligne ou panne
    fn record_insert_failure(
        &self,
        err: RepositoryError,
        beneficiary: &ValidatedBeneficiary,
        detector: &mut DuplicateDetector,
        tally: &mut ImportTally,
    ) -> RepositoryResult<()> {
        let line = beneficiary.line;

        if err.is_unique_violation() {
            // Numéro enregistré entre-temps par un autre import
            warn!(line, "téléphone pris par un import concurrent, ligne ignorée");
            tally.duplicate_rows += 1;
            return Ok(());
        }

        if err.is_systemic() {
            return Err(err);
        }

        warn!(line, error = %err, "insertion refusée");
        detector.release(&beneficiary.phone);
        tally.row_errors.push(storage_row_error(line, &err));
        Ok(())
    }
}

/// Ligne refusée par la base sans que celle-ci soit en panne
fn storage_row_error(line: usize, err: &RepositoryError) -> RowError {
    RowError {
        line,
        issues: vec![FieldIssue {
            field: None,
            kind: IssueKind::Storage,
            message: t_with_args("row.storage", &[("reason", &err.to_string())]),
        }],
    }
}

impl<S, C> BeneficiaryImporter for BeneficiaryImporterImpl<S, C>
where
    S: BeneficiaryStore,
    C: CampaignDirectory,
{
    #[instrument(skip(self, policy), fields(file = %file_path.display()))]
    fn import_file(
        &self,
        file_path: &Path,
        campaign_id: i64,
        policy: ImportPolicy,
    ) -> ImporterResult<ImportResult> {
        let started = Instant::now();
        info!(state = "LOADING", ?policy, "chargement du fichier");

        let sheet = self.file_parser.parse_path(file_path).map_err(|e| {
            warn!(state = "LOADING", error = %e, "fichier refusé");
            e
        })?;
        self.process(sheet, campaign_id, policy, started)
    }

    #[instrument(skip(self, reader, policy))]
    fn import_reader(
        &self,
        reader: &mut dyn Read,
        extension: &str,
        campaign_id: i64,
        policy: ImportPolicy,
    ) -> ImporterResult<ImportResult> {
        let started = Instant::now();
        info!(state = "LOADING", ?policy, "chargement du flux");

        let sheet = self.file_parser.parse_reader(reader, extension).map_err(|e| {
            warn!(state = "LOADING", error = %e, "flux refusé");
            e
        })?;
        self.process(sheet, campaign_id, policy, started)
    }
}

impl SqliteBeneficiaryImporter {
    /// Construit le pipeline SQLite complet sur une connexion partagée
    ///
    /// La configuration est lue une fois dans config_kv.
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImporterResult<Self> {
        let config_manager = ConfigManager::from_connection(conn.clone())?;
        let config = ImportConfig::load(&config_manager)?;
        debug!(?config, "configuration d'import chargée");

        let store = SqliteBeneficiaryRepository::from_connection(
            conn.clone(),
            &config.beneficiary_table,
        )?;
        let campaigns = SqliteCampaignRepository::from_connection(conn);
        Ok(Self::new(store, campaigns, config))
    }

    /// Ouvre la base puis construit le pipeline
    pub fn open(db_path: &str) -> ImporterResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| ImportError::Storage(RepositoryError::DatabaseConnectionError(e.to_string())))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }
}
