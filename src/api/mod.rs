// ==========================================
// Campagnes médicales - Couche API
// ==========================================
// Point d'entrée des appelants (CLI, services hôtes)
// ==========================================

pub mod error;
pub mod import_api;

pub use error::{ApiError, ApiResult};
pub use import_api::{CancelImportBatchResponse, ImportApi, ImportReport, ImportRequest};
