// ==========================================
// Campagnes médicales - Détection des doublons
// ==========================================
// Clé naturelle: téléphone canonique
// Portée: lignes vivantes du stock + lignes déjà retenues dans ce fichier
// ==========================================

use crate::repository::beneficiary_repo::PhoneLookup;
use crate::repository::error::RepositoryResult;
use std::collections::HashMap;

/// Verdict pour un téléphone candidat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateCheck {
    /// Numéro libre
    Unique,
    /// Numéro porté par un bénéficiaire vivant
    ExistingRecord,
    /// Numéro déjà retenu plus haut dans le fichier
    RepeatedInFile { first_line: usize },
}

impl DuplicateCheck {
    pub fn is_duplicate(&self) -> bool {
        !matches!(self, DuplicateCheck::Unique)
    }
}

pub struct DuplicateDetector {
    ignore_duplicates: bool,
    seen: HashMap<String, usize>,
}

impl DuplicateDetector {
    /// # Paramètres
    /// - ignore_duplicates: true → tout numéro est accepté
    pub fn new(ignore_duplicates: bool) -> Self {
        Self {
            ignore_duplicates,
            seen: HashMap::new(),
        }
    }

    /// Contrôle un numéro et le réserve s'il est libre
    ///
    /// # Paramètres
    /// - phone: numéro canonique
    /// - line: ligne du fichier
    /// - lookup: stock interrogé (transaction en cours ou lecture seule)
    pub fn check<L: PhoneLookup + ?Sized>(
        &mut self,
        phone: &str,
        line: usize,
        lookup: &L,
    ) -> RepositoryResult<DuplicateCheck> {
        if self.ignore_duplicates {
            return Ok(DuplicateCheck::Unique);
        }

        if let Some(first_line) = self.seen.get(phone) {
            return Ok(DuplicateCheck::RepeatedInFile {
                first_line: *first_line,
            });
        }

        if lookup.exists_by_phone(phone)? {
            return Ok(DuplicateCheck::ExistingRecord);
        }

        self.seen.insert(phone.to_string(), line);
        Ok(DuplicateCheck::Unique)
    }

    /// Libère un numéro réservé dont l'insertion a échoué
    pub fn release(&mut self, phone: &str) {
        self.seen.remove(phone);
    }
}
