// ==========================================
// Tests d'intégration: pipeline d'import des bénéficiaires
// ==========================================
// Base SQLite temporaire, fichiers CSV réels
// ==========================================


use campaign_import::config::ImportConfig;
use campaign_import::domain::{
    ImportPolicy, ImportResult, IssueKind, StoredBeneficiary, TransactionOutcome,
    ValidatedBeneficiary,
};
use campaign_import::importer::{
    BeneficiaryImporter, BeneficiaryImporterImpl, ImportError, SqliteBeneficiaryImporter,
};
use campaign_import::logging;
use campaign_import::repository::{
    BeneficiaryStore, BeneficiaryWriter, PhoneLookup, RepositoryError, RepositoryResult,
    SqliteBeneficiaryRepository, SqliteCampaignRepository,
};
use std::path::Path;
use test_helpers::*;

fn import(
    db_path: &str,
    file: &Path,
    campaign_id: i64,
    policy: ImportPolicy,
) -> Result<ImportResult, ImportError> {
    let importer = SqliteBeneficiaryImporter::open(db_path).unwrap();
    importer.import_file(file, campaign_id, policy)
}

fn strict() -> ImportPolicy {
    ImportPolicy::new(false)
}

// ==========================================
// Scénarios de référence
// ==========================================

#[test]
fn test_single_valid_row_is_imported() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = write_csv(&[
        BASIC_HEADERS,
        &["Alami", "Sara", "F", "0612345678", "Rue X, Rabat"],
    ]);

    let result = import(&db_path, file.path(), GLASSES_CAMPAIGN, strict()).unwrap();

    assert_eq!(result.total_rows, 1);
    assert_eq!(result.imported_count, 1);
    assert_eq!(result.error_count, 0);
    assert_eq!(result.skipped_count, 0);
    assert_eq!(result.outcome, TransactionOutcome::Committed);
    assert_eq!(result.delimiter, Some(';'));
    assert_eq!(result.campaign.id, GLASSES_CAMPAIGN);

    let repo = SqliteBeneficiaryRepository::new(&db_path, TABLE).unwrap();
    let batch_id = result.batch_id.expect("lot attribué");
    let stored: Vec<StoredBeneficiary> = repo.list_by_batch(&batch_id).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].phone, "612345678");
    assert_eq!(stored[0].sex, "F");
    assert_eq!(stored[0].campaign_id, GLASSES_CAMPAIGN);
    assert!(!stored[0].duplicate_ack);
}

#[test]
fn test_missing_phone_column_aborts_before_processing() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = write_csv(&[
        &["Nom", "Prenom", "Sexe", "Adresse"],
        &["Alami", "Sara", "F", "Rue X, Rabat"],
    ]);

    let err = import(&db_path, file.path(), GLASSES_CAMPAIGN, strict()).unwrap_err();

    match err {
        ImportError::MissingColumns { missing } => {
            assert_eq!(missing, vec![campaign_import::domain::CanonicalField::Phone]);
        }
        other => panic!("MissingColumns attendu, obtenu {:?}", other),
    }
    assert_eq!(count_beneficiaries(&db_path), 0);
}

#[test]
fn test_invalid_sex_is_a_row_error() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = write_csv(&[
        BASIC_HEADERS,
        &["Alami", "Sara", "X", "0612345678", "Rue X, Rabat"],
    ]);

    let result = import(&db_path, file.path(), GLASSES_CAMPAIGN, strict()).unwrap();

    assert_eq!(result.imported_count, 0);
    assert_eq!(result.error_count, 1);
    assert_eq!(result.errors[0].line, 2);
    assert_eq!(result.outcome, TransactionOutcome::RolledBack);
    assert_eq!(count_beneficiaries(&db_path), 0);
}

#[test]
fn test_repeated_phone_in_file_is_skipped() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = write_csv(&[
        BASIC_HEADERS,
        &["Alami", "Sara", "F", "0612345678", "Rue X, Rabat"],
        &["Alami", "Youssef", "M", "+212 6 12 34 56 78", "Rue X, Rabat"],
    ]);

    let result = import(&db_path, file.path(), GLASSES_CAMPAIGN, strict()).unwrap();

    assert_eq!(result.imported_count, 1);
    assert_eq!(result.skipped_count, 1);
    assert_eq!(result.duplicate_rows, 1);
    assert_eq!(result.error_count, 0);
    assert!(result.committed());
    assert_eq!(count_beneficiaries(&db_path), 1);
}

#[test]
fn test_hearing_aids_row_without_laterality() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = write_csv(&[
        &["Nom", "Prenom", "Sexe", "Telephone", "Adresse", "Lateralite"],
        &["Bennani", "Omar", "M", "0661000001", "Fès", ""],
        &["Bennani", "Laila", "F", "0661000002", "Fès", "bilatéral"],
    ]);

    let result = import(&db_path, file.path(), HEARING_CAMPAIGN, strict()).unwrap();

    assert_eq!(result.error_count, 1);
    assert_eq!(result.errors[0].line, 2);
    assert_eq!(result.valid_count, 1);
    // Une erreur sans force_import: rien n'est conservé
    assert_eq!(result.imported_count, 0);
    assert_eq!(count_beneficiaries(&db_path), 0);
}

// ==========================================
// Politique d'import
// ==========================================

#[test]
fn test_dry_run_writes_nothing() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = write_csv(&[
        BASIC_HEADERS,
        &["Alami", "Sara", "F", "0612345678", "Rabat"],
        &["Idrissi", "Karim", "M", "0612345679", "Salé"],
    ]);

    let policy = strict().with_dry_run(true);
    let result = import(&db_path, file.path(), GLASSES_CAMPAIGN, policy).unwrap();

    assert!(result.dry_run);
    assert_eq!(result.outcome, TransactionOutcome::DryRun);
    assert_eq!(result.valid_count, 2);
    assert_eq!(result.imported_count, 0);
    assert!(result.batch_id.is_none());
    assert_eq!(count_beneficiaries(&db_path), 0);
}

#[test]
fn test_dry_run_still_sees_existing_phones() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    insert_existing_beneficiary(&db_path, "612345678").unwrap();
    let file = write_csv(&[
        BASIC_HEADERS,
        &["Alami", "Sara", "F", "0612345678", "Rabat"],
    ]);

    let result = import(&db_path, file.path(), GLASSES_CAMPAIGN, strict().with_dry_run(true)).unwrap();

    assert_eq!(result.duplicate_rows, 1);
    assert_eq!(result.valid_count, 0);
    assert_eq!(count_beneficiaries(&db_path), 1);
}

#[test]
fn test_errors_roll_back_valid_rows() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = write_csv(&[
        BASIC_HEADERS,
        &["Alami", "Sara", "F", "0612345678", "Rabat"],
        &["Idrissi", "Karim", "M", "12345", "Salé"],
        &["Tazi", "Nadia", "F", "0612345680", "Tanger"],
    ]);

    let result = import(&db_path, file.path(), GLASSES_CAMPAIGN, strict()).unwrap();

    assert_eq!(result.outcome, TransactionOutcome::RolledBack);
    assert_eq!(result.valid_count, 2);
    assert_eq!(result.imported_count, 0);
    assert_eq!(result.error_count, 1);
    assert_eq!(result.errors[0].line, 3);
    assert!(result.batch_id.is_none());
    assert_eq!(count_beneficiaries(&db_path), 0);
}

#[test]
fn test_force_import_keeps_valid_rows() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = write_csv(&[
        BASIC_HEADERS,
        &["Alami", "Sara", "F", "0612345678", "Rabat"],
        &["Idrissi", "Karim", "M", "12345", "Salé"],
        &["Tazi", "Nadia", "F", "0612345680", "Tanger"],
    ]);

    let policy = strict().with_force_import(true);
    let result = import(&db_path, file.path(), GLASSES_CAMPAIGN, policy).unwrap();

    assert!(result.committed());
    assert_eq!(result.imported_count, 2);
    assert_eq!(result.error_count, 1);
    assert_eq!(count_beneficiaries(&db_path), 2);
}

#[test]
fn test_existing_phone_is_skipped_not_an_error() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    insert_existing_beneficiary(&db_path, "612345678").unwrap();
    let file = write_csv(&[
        BASIC_HEADERS,
        &["Alami", "Sara", "F", "06 12 34 56 78", "Rabat"],
        &["Tazi", "Nadia", "F", "0612345680", "Tanger"],
    ]);

    let result = import(&db_path, file.path(), GLASSES_CAMPAIGN, strict()).unwrap();

    assert!(result.committed());
    assert_eq!(result.imported_count, 1);
    assert_eq!(result.skipped_count, 1);
    assert_eq!(result.error_count, 0);
    assert_eq!(count_beneficiaries(&db_path), 2);
}

#[test]
fn test_ignore_duplicates_imports_every_row() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    insert_existing_beneficiary(&db_path, "612345678").unwrap();
    let file = write_csv(&[
        BASIC_HEADERS,
        &["Alami", "Sara", "F", "0612345678", "Rabat"],
        &["Alami", "Youssef", "M", "0612345678", "Rabat"],
    ]);

    let result = import(&db_path, file.path(), GLASSES_CAMPAIGN, ImportPolicy::new(true)).unwrap();

    assert_eq!(result.imported_count, 2);
    assert_eq!(result.duplicate_rows, 0);
    assert_eq!(count_beneficiaries(&db_path), 3);

    let repo = SqliteBeneficiaryRepository::new(&db_path, TABLE).unwrap();
    let stored = repo.list_by_batch(result.batch_id.as_deref().unwrap()).unwrap();
    assert!(stored.iter().all(|b| b.duplicate_ack));
}

#[test]
fn test_blank_rows_are_skipped() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = write_csv(&[
        BASIC_HEADERS,
        &["Alami", "Sara", "F", "0612345678", "Rabat"],
        &["", "  ", "", "", ""],
        &["Tazi", "Nadia", "F", "0612345680", "Tanger"],
    ]);

    let result = import(&db_path, file.path(), GLASSES_CAMPAIGN, strict()).unwrap();

    assert_eq!(result.total_rows, 3);
    assert_eq!(result.empty_rows, 1);
    assert_eq!(result.skipped_count, 1);
    assert_eq!(result.imported_count, 2);
}

#[test]
fn test_header_variants_are_recognized() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = write_csv(&[
        &["NOM DE FAMILLE", "Prénom", "Genre", "N° Téléphone", "Adresse postale", "Colonne libre"],
        &["Alami", "Sara", "féminin", "0612345678", "Rabat", "x"],
    ]);

    let result = import(&db_path, file.path(), GLASSES_CAMPAIGN, strict()).unwrap();

    assert_eq!(result.imported_count, 1);
    // Colonne non reconnue signalée
    assert!(!result.warnings.is_empty());
}

#[test]
fn test_glasses_child_requires_schooling() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = write_csv(&[
        &["Nom", "Prenom", "Sexe", "Telephone", "Adresse", "Date de naissance", "Scolarise"],
        &["Alami", "Rayan", "M", "0612345678", "Rabat", "15/03/2018", ""],
        &["Alami", "Sara", "F", "0612345679", "Rabat", "15/03/2018", "oui"],
        &["Alami", "Aicha", "F", "0612345680", "Rabat", "15/03/1980", ""],
    ]);

    let result = import(&db_path, file.path(), GLASSES_CAMPAIGN, strict().with_force_import(true)).unwrap();

    assert_eq!(result.error_count, 1);
    assert_eq!(result.errors[0].line, 2);
    assert_eq!(result.imported_count, 2);
}

#[test]
fn test_birth_date_required_by_configuration() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    insert_test_config(&db_path, "import.birth_date_required", "REQUIRED").unwrap();
    let file = write_csv(&[
        BASIC_HEADERS,
        &["Alami", "Sara", "F", "0612345678", "Rabat"],
    ]);

    let err = import(&db_path, file.path(), GLASSES_CAMPAIGN, strict()).unwrap_err();
    assert!(matches!(err, ImportError::MissingColumns { .. }));
}

#[test]
fn test_unknown_campaign() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = write_csv(&[
        BASIC_HEADERS,
        &["Alami", "Sara", "F", "0612345678", "Rabat"],
    ]);

    let err = import(&db_path, file.path(), 999, strict()).unwrap_err();
    assert!(matches!(err, ImportError::CampaignNotFound(999)));
    assert_eq!(count_beneficiaries(&db_path), 0);
}

#[test]
fn test_closed_campaign_imports_with_warning() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = write_csv(&[
        BASIC_HEADERS,
        &["Alami", "Sara", "F", "0612345678", "Rabat"],
    ]);

    let result = import(&db_path, file.path(), CLOSED_CAMPAIGN, strict()).unwrap();

    assert_eq!(result.imported_count, 1);
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_unsupported_extension_and_missing_file() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = write_temp_file("Nom;Prenom\n", "txt");

    let err = import(&db_path, file.path(), GLASSES_CAMPAIGN, strict()).unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat(_)));

    let err = import(
        &db_path,
        Path::new("/nonexistent/beneficiaires.csv"),
        GLASSES_CAMPAIGN,
        strict(),
    )
    .unwrap_err();
    assert!(matches!(err, ImportError::FileNotFound(_)));
}

#[test]
fn test_header_only_file_is_empty() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = write_csv(&[BASIC_HEADERS]);

    let result = import(&db_path, file.path(), GLASSES_CAMPAIGN, strict()).unwrap();
    assert_eq!(result.total_rows, 0);
    assert_eq!(result.imported_count, 0);
    assert!(result.committed());
}

#[test]
fn test_error_list_is_capped() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let mut content = BASIC_HEADERS.join(";");
    for i in 0..30 {
        content.push_str(&format!("\nNom{};Prenom;X;06{:08};Rabat", i, i));
    }
    let file = write_temp_file(&content, "csv");

    let result = import(&db_path, file.path(), GLASSES_CAMPAIGN, strict()).unwrap();

    assert_eq!(result.error_count, 30);
    assert_eq!(result.errors.len(), 20);
    assert_eq!(result.truncated_errors, 10);
}

// ==========================================
// Stockage: course entre imports et pannes
// ==========================================

/// Stock dont la recherche de téléphone ne voit rien,
/// comme deux imports concurrents qui passent le contrôle préalable
struct BlindStore(SqliteBeneficiaryRepository);

struct BlindWriter<'a> {
    inner: &'a mut dyn BeneficiaryWriter,
}

impl PhoneLookup for BlindWriter<'_> {
    fn exists_by_phone(&self, _phone: &str) -> RepositoryResult<bool> {
        Ok(false)
    }
}

impl BeneficiaryWriter for BlindWriter<'_> {
    fn insert(
        &mut self,
        beneficiary: &ValidatedBeneficiary,
        batch_id: &str,
        duplicate_ack: bool,
    ) -> RepositoryResult<i64> {
        self.inner.insert(beneficiary, batch_id, duplicate_ack)
    }
}

impl PhoneLookup for BlindStore {
    fn exists_by_phone(&self, _phone: &str) -> RepositoryResult<bool> {
        Ok(false)
    }
}

impl BeneficiaryStore for BlindStore {
    fn with_transaction<T, F>(&self, work: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut dyn BeneficiaryWriter) -> RepositoryResult<(T, bool)>,
    {
        self.0.with_transaction(|inner| {
            let mut writer = BlindWriter { inner };
            work(&mut writer)
        })
    }

    fn count_all(&self) -> RepositoryResult<i64> {
        self.0.count_all()
    }

    fn count_live(&self) -> RepositoryResult<i64> {
        self.0.count_live()
    }

    fn list_by_batch(&self, batch_id: &str) -> RepositoryResult<Vec<StoredBeneficiary>> {
        self.0.list_by_batch(batch_id)
    }

    fn soft_delete_batch(&self, batch_id: &str) -> RepositoryResult<usize> {
        self.0.soft_delete_batch(batch_id)
    }
}

#[test]
fn test_unique_index_turns_race_into_duplicate_skip() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    insert_existing_beneficiary(&db_path, "612345678").unwrap();
    let file = write_csv(&[
        BASIC_HEADERS,
        &["Alami", "Sara", "F", "0612345678", "Rabat"],
        &["Tazi", "Nadia", "F", "0612345680", "Tanger"],
    ]);

    let store = BlindStore(SqliteBeneficiaryRepository::new(&db_path, TABLE).unwrap());
    let campaigns = SqliteCampaignRepository::new(&db_path).unwrap();
    let importer = BeneficiaryImporterImpl::new(store, campaigns, ImportConfig::default());

    let result = importer
        .import_file(file.path(), GLASSES_CAMPAIGN, strict())
        .unwrap();

    assert!(result.committed());
    assert_eq!(result.imported_count, 1);
    assert_eq!(result.duplicate_rows, 1);
    assert_eq!(result.error_count, 0);
    assert_eq!(count_beneficiaries(&db_path), 2);
}

/// Stock qui tombe en panne à la N-ième insertion
struct FlakyStore {
    inner: SqliteBeneficiaryRepository,
    fail_at: usize,
    error: fn() -> RepositoryError,
}

struct FlakyWriter<'a> {
    inner: &'a mut dyn BeneficiaryWriter,
    inserted: usize,
    fail_at: usize,
    error: fn() -> RepositoryError,
}

impl PhoneLookup for FlakyWriter<'_> {
    fn exists_by_phone(&self, phone: &str) -> RepositoryResult<bool> {
        self.inner.exists_by_phone(phone)
    }
}

impl BeneficiaryWriter for FlakyWriter<'_> {
    fn insert(
        &mut self,
        beneficiary: &ValidatedBeneficiary,
        batch_id: &str,
        duplicate_ack: bool,
    ) -> RepositoryResult<i64> {
        self.inserted += 1;
        if self.inserted == self.fail_at {
            return Err((self.error)());
        }
        self.inner.insert(beneficiary, batch_id, duplicate_ack)
    }
}

impl PhoneLookup for FlakyStore {
    fn exists_by_phone(&self, phone: &str) -> RepositoryResult<bool> {
        self.inner.exists_by_phone(phone)
    }
}

impl BeneficiaryStore for FlakyStore {
    fn with_transaction<T, F>(&self, work: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut dyn BeneficiaryWriter) -> RepositoryResult<(T, bool)>,
    {
        self.inner.with_transaction(|inner| {
            let mut writer = FlakyWriter {
                inner,
                inserted: 0,
                fail_at: self.fail_at,
                error: self.error,
            };
            work(&mut writer)
        })
    }

    fn count_all(&self) -> RepositoryResult<i64> {
        self.inner.count_all()
    }

    fn count_live(&self) -> RepositoryResult<i64> {
        self.inner.count_live()
    }

    fn list_by_batch(&self, batch_id: &str) -> RepositoryResult<Vec<StoredBeneficiary>> {
        self.inner.list_by_batch(batch_id)
    }

    fn soft_delete_batch(&self, batch_id: &str) -> RepositoryResult<usize> {
        self.inner.soft_delete_batch(batch_id)
    }
}

fn flaky_importer(
    db_path: &str,
    error: fn() -> RepositoryError,
) -> BeneficiaryImporterImpl<FlakyStore, SqliteCampaignRepository> {
    let store = FlakyStore {
        inner: SqliteBeneficiaryRepository::new(db_path, TABLE).unwrap(),
        fail_at: 2,
        error,
    };
    let campaigns = SqliteCampaignRepository::new(db_path).unwrap();
    BeneficiaryImporterImpl::new(store, campaigns, ImportConfig::default())
}

fn three_valid_rows() -> tempfile::NamedTempFile {
    write_csv(&[
        BASIC_HEADERS,
        &["Alami", "Sara", "F", "0612345678", "Rabat"],
        &["Idrissi", "Karim", "M", "0612345679", "Salé"],
        &["Tazi", "Nadia", "F", "0612345680", "Tanger"],
    ])
}

#[test]
fn test_database_outage_aborts_whole_import() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = three_valid_rows();

    let importer = flaky_importer(&db_path, || {
        RepositoryError::DatabaseUnavailable("disque plein".to_string())
    });
    let err = importer
        .import_file(file.path(), GLASSES_CAMPAIGN, strict().with_force_import(true))
        .unwrap_err();

    assert!(matches!(
        err,
        ImportError::Storage(RepositoryError::DatabaseUnavailable(_))
    ));
    // Même avec force_import, la transaction est annulée
    assert_eq!(count_beneficiaries(&db_path), 0);
}

#[test]
fn test_rejected_insert_is_a_row_error() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = three_valid_rows();

    let importer = flaky_importer(&db_path, || {
        RepositoryError::ConstraintViolation("CHECK".to_string())
    });
    let result = importer
        .import_file(file.path(), GLASSES_CAMPAIGN, strict().with_force_import(true))
        .unwrap();

    assert!(result.committed());
    assert_eq!(result.imported_count, 2);
    assert_eq!(result.error_count, 1);
    assert_eq!(result.errors[0].line, 3);
    assert_eq!(count_beneficiaries(&db_path), 2);
}

#[test]
fn test_row_errors_carry_issue_kinds() {
    use campaign_import::domain::ImportContext;
    use campaign_import::importer::{FieldMapper, MappedRow, RowValidator, ValidationRules};
    use campaign_import::repository::CampaignDirectory;

    let (_tmp, db_path) = create_test_db().unwrap();
    let campaign = SqliteCampaignRepository::new(&db_path)
        .unwrap()
        .get_campaign(GLASSES_CAMPAIGN)
        .unwrap()
        .unwrap();
    let ctx = ImportContext::new(campaign, strict());

    let headers: Vec<String> = BASIC_HEADERS.iter().map(|h| h.to_string()).collect();
    let mapping = FieldMapper::new(false).map_columns(&headers).unwrap();
    let raw: Vec<String> = ["", "Sara", "Z", "123", "Rabat"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    let row: MappedRow = mapping.map_row(&raw, 2);

    let err = RowValidator::new(ValidationRules::default())
        .validate(&row, &ctx)
        .unwrap_err();
    assert!(err.has_kind(IssueKind::Required));
    assert!(err.has_kind(IssueKind::InvalidSex));
    assert!(err.has_kind(IssueKind::InvalidPhone));
}

/// Stock dont la recherche de téléphone échoue pour un numéro donné
struct LookupFailStore {
    inner: SqliteBeneficiaryRepository,
    failing_phone: &'static str,
    error: fn() -> RepositoryError,
}

struct LookupFailWriter<'a> {
    inner: &'a mut dyn BeneficiaryWriter,
    failing_phone: &'static str,
    error: fn() -> RepositoryError,
}

impl PhoneLookup for LookupFailWriter<'_> {
    fn exists_by_phone(&self, phone: &str) -> RepositoryResult<bool> {
        if phone == self.failing_phone {
            return Err((self.error)());
        }
        self.inner.exists_by_phone(phone)
    }
}

impl BeneficiaryWriter for LookupFailWriter<'_> {
    fn insert(
        &mut self,
        beneficiary: &ValidatedBeneficiary,
        batch_id: &str,
        duplicate_ack: bool,
    ) -> RepositoryResult<i64> {
        self.inner.insert(beneficiary, batch_id, duplicate_ack)
    }
}

impl PhoneLookup for LookupFailStore {
    fn exists_by_phone(&self, phone: &str) -> RepositoryResult<bool> {
        if phone == self.failing_phone {
            return Err((self.error)());
        }
        self.inner.exists_by_phone(phone)
    }
}

impl BeneficiaryStore for LookupFailStore {
    fn with_transaction<T, F>(&self, work: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut dyn BeneficiaryWriter) -> RepositoryResult<(T, bool)>,
    {
        self.inner.with_transaction(|inner| {
            let mut writer = LookupFailWriter {
                inner,
                failing_phone: self.failing_phone,
                error: self.error,
            };
            work(&mut writer)
        })
    }

    fn count_all(&self) -> RepositoryResult<i64> {
        self.inner.count_all()
    }

    fn count_live(&self) -> RepositoryResult<i64> {
        self.inner.count_live()
    }

    fn list_by_batch(&self, batch_id: &str) -> RepositoryResult<Vec<StoredBeneficiary>> {
        self.inner.list_by_batch(batch_id)
    }

    fn soft_delete_batch(&self, batch_id: &str) -> RepositoryResult<usize> {
        self.inner.soft_delete_batch(batch_id)
    }
}

fn lookup_fail_importer(
    db_path: &str,
    error: fn() -> RepositoryError,
) -> BeneficiaryImporterImpl<LookupFailStore, SqliteCampaignRepository> {
    let store = LookupFailStore {
        inner: SqliteBeneficiaryRepository::new(db_path, TABLE).unwrap(),
        failing_phone: "612345679",
        error,
    };
    let campaigns = SqliteCampaignRepository::new(db_path).unwrap();
    BeneficiaryImporterImpl::new(store, campaigns, ImportConfig::default())
}

#[test]
fn test_rejected_duplicate_lookup_is_a_row_error() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = three_valid_rows();

    let importer = lookup_fail_importer(&db_path, || {
        RepositoryError::DatabaseQueryError("datatype mismatch".to_string())
    });
    let result = importer
        .import_file(file.path(), GLASSES_CAMPAIGN, strict().with_force_import(true))
        .unwrap();

    assert!(result.committed());
    assert_eq!(result.imported_count, 2);
    assert_eq!(result.error_count, 1);
    assert_eq!(result.errors[0].line, 3);
    assert_eq!(count_beneficiaries(&db_path), 2);
}

#[test]
fn test_rejected_duplicate_lookup_in_dry_run() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = three_valid_rows();

    let importer = lookup_fail_importer(&db_path, || {
        RepositoryError::DatabaseQueryError("datatype mismatch".to_string())
    });
    let result = importer
        .import_file(file.path(), GLASSES_CAMPAIGN, strict().with_dry_run(true))
        .unwrap();

    assert_eq!(result.valid_count, 2);
    assert_eq!(result.error_count, 1);
    assert_eq!(result.errors[0].line, 3);
}

#[test]
fn test_duplicate_lookup_outage_aborts_whole_import() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let file = three_valid_rows();

    let importer = lookup_fail_importer(&db_path, || {
        RepositoryError::DatabaseUnavailable("base verrouillée".to_string())
    });
    let err = importer
        .import_file(file.path(), GLASSES_CAMPAIGN, strict().with_force_import(true))
        .unwrap_err();

    assert!(matches!(
        err,
        ImportError::Storage(RepositoryError::DatabaseUnavailable(_))
    ));
    assert_eq!(count_beneficiaries(&db_path), 0);
}

#[test]
fn test_building_importer_leaves_process_locale_alone() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    insert_test_config(&db_path, "import.locale", "en").unwrap();

    let before = campaign_import::i18n::current_locale();
    let _importer = SqliteBeneficiaryImporter::open(&db_path).unwrap();
    assert_eq!(campaign_import::i18n::current_locale(), before);
}
