// ==========================================
// Campagnes médicales - Contrat de stockage des bénéficiaires
// ==========================================
// Lecture hors transaction: BeneficiaryStore (+ PhoneLookup)
// Écriture dans la transaction de l'appelant: BeneficiaryWriter
// ==========================================

use crate::domain::{StoredBeneficiary, ValidatedBeneficiary};
use crate::repository::error::RepositoryResult;

/// Recherche d'un téléphone parmi les bénéficiaires vivants
pub trait PhoneLookup {
    /// # Paramètres
    /// - phone: numéro canonique (9 chiffres)
    ///
    /// # Retour
    /// - true si une ligne non supprimée porte ce numéro
    fn exists_by_phone(&self, phone: &str) -> RepositoryResult<bool>;
}

/// Écritures faites à l'intérieur de la transaction d'import
pub trait BeneficiaryWriter: PhoneLookup {
    /// Insère un bénéficiaire validé
    ///
    /// # Paramètres
    /// - batch_id: lot d'import tamponné sur la ligne
    /// - duplicate_ack: true si importé malgré un doublon accepté
    ///
    /// # Retour
    /// - Ok(id): identifiant attribué
    /// - Err(UniqueConstraintViolation): numéro déjà vivant (course entre imports)
    fn insert(
        &mut self,
        beneficiary: &ValidatedBeneficiary,
        batch_id: &str,
        duplicate_ack: bool,
    ) -> RepositoryResult<i64>;
}

/// Accès au stock de bénéficiaires
pub trait BeneficiaryStore: PhoneLookup + Send + Sync {
    /// Ouvre une transaction, exécute `work`, puis valide ou annule
    ///
    /// # Retour de `work`
    /// - Ok((valeur, true)): COMMIT
    /// - Ok((valeur, false)): ROLLBACK volontaire, valeur rendue
    /// - Err: ROLLBACK, erreur propagée
    fn with_transaction<T, F>(&self, work: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut dyn BeneficiaryWriter) -> RepositoryResult<(T, bool)>;

    /// Nombre total de lignes (supprimées comprises)
    fn count_all(&self) -> RepositoryResult<i64>;

    /// Nombre de lignes vivantes
    fn count_live(&self) -> RepositoryResult<i64>;

    /// Lignes vivantes d'un lot d'import
    fn list_by_batch(&self, batch_id: &str) -> RepositoryResult<Vec<StoredBeneficiary>>;

    /// Suppression logique de toutes les lignes d'un lot
    ///
    /// # Retour
    /// - nombre de lignes marquées supprimées
    fn soft_delete_batch(&self, batch_id: &str) -> RepositoryResult<usize>;
}
