// ==========================================
// Campagnes médicales - Interface d'import des bénéficiaires
// ==========================================
// Implémentation: BeneficiaryImporterImpl
// ==========================================

use crate::domain::{ImportPolicy, ImportResult};
use crate::importer::error::ImporterResult;
use std::io::Read;
use std::path::Path;

// ==========================================
// BeneficiaryImporter Trait
// ==========================================
pub trait BeneficiaryImporter: Send + Sync {
    /// Importe un fichier du disque (format déduit de l'extension)
    ///
    /// # Paramètres
    /// - file_path: .xlsx / .xls / .ods / .csv
    /// - campaign_id: campagne de rattachement
    /// - policy: doublons / import forcé / simulation
    ///
    /// # Retour
    /// - Ok(ImportResult): rapport, même si des lignes sont en erreur
    /// - Err: fichier illisible, colonnes manquantes, campagne inconnue,
    ///   panne de la base (transaction annulée)
    fn import_file(
        &self,
        file_path: &Path,
        campaign_id: i64,
        policy: ImportPolicy,
    ) -> ImporterResult<ImportResult>;

    /// Importe depuis un flux avec son extension déclarée
    fn import_reader(
        &self,
        reader: &mut dyn Read,
        extension: &str,
        campaign_id: i64,
        policy: ImportPolicy,
    ) -> ImporterResult<ImportResult>;
}
