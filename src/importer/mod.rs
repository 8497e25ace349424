// ==========================================
// Campagnes médicales - Couche import
// ==========================================
// Pipeline: chargement → en-têtes → validation → doublons
//           → écriture transactionnelle → rapport
// Formats: Excel (.xlsx/.xls), OpenDocument (.ods), CSV
// ==========================================

pub mod beneficiary_importer_impl;
pub mod beneficiary_importer_trait;
pub mod data_cleaner;
pub mod duplicate_detector;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod result_reporter;
pub mod row_validator;

pub use beneficiary_importer_impl::{BeneficiaryImporterImpl, SqliteBeneficiaryImporter};
pub use beneficiary_importer_trait::BeneficiaryImporter;
pub use duplicate_detector::{DuplicateCheck, DuplicateDetector};
pub use error::{ImportError, ImporterResult};
pub use field_mapper::{ColumnMapping, FieldMapper, MappedRow};
pub use file_parser::{CsvParser, ExcelParser, FileParser, LoadedSheet, RawRow, UniversalFileParser};
pub use result_reporter::{ImportTally, ResultReporter};
pub use row_validator::{RowValidator, ValidationRules};
