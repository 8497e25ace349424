// ==========================================
// Campagnes médicales - Lecture de la configuration d'import
// ==========================================
// Interface seule; implémentée par ConfigManager (table config_kv)
// Chaque méthode renvoie la valeur par défaut si la clé est absente
// ==========================================

use crate::config::import_config::BirthDatePolicy;
use crate::importer::error::ImporterResult;

pub trait ImportConfigReader: Send + Sync {
    /// Table des bénéficiaires (défaut: beneficiaries)
    fn get_beneficiary_table(&self) -> ImporterResult<String>;

    /// Date de naissance exigée ou non (défaut: OPTIONAL)
    fn get_birth_date_policy(&self) -> ImporterResult<BirthDatePolicy>;

    /// Âge sous lequel la scolarisation est exigée (défaut: 18)
    fn get_child_age_threshold(&self) -> ImporterResult<i32>;

    /// Âge maximum plausible (défaut: 120)
    fn get_max_age_years(&self) -> ImporterResult<i32>;

    /// Nombre d'erreurs détaillées dans le rapport (défaut: 20)
    fn get_max_reported_errors(&self) -> ImporterResult<usize>;

    /// Seuil de l'avertissement « fichier volumineux » (défaut: 1000)
    fn get_large_file_rows(&self) -> ImporterResult<usize>;

    /// Langue des messages (défaut: fr)
    fn get_locale(&self) -> ImporterResult<String>;
}
