// ==========================================
// Campagnes médicales - Bénéficiaire
// ==========================================
// ValidatedBeneficiary: produit du validateur de lignes, seul type
// accepté par la couche de persistance
// ==========================================

use crate::domain::types::{Decision, Laterality, Sex};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ValidatedBeneficiary - ligne validée et normalisée
// ==========================================
// Construit uniquement après succès de tous les contrôles
// (champs obligatoires + formats + règles conditionnelles)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedBeneficiary {
    pub surname: String,
    pub given_name: String,
    pub sex: Sex,
    pub birth_date: Option<NaiveDate>,
    pub phone: String, // 9 chiffres, forme canonique
    pub email: Option<String>,
    pub address: String,
    pub national_id: Option<String>,
    pub comment: Option<String>,

    // Rattachement campagne
    pub campaign_id: i64,
    pub assistance_type_id: i64,

    // Champs conditionnels
    pub schooled: Option<bool>,
    pub laterality: Option<Laterality>,
    pub decision: Option<Decision>,

    // Ligne du fichier source (en-tête = ligne 1)
    pub line: usize,
}

// ==========================================
// StoredBeneficiary - vue relue depuis le stockage
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBeneficiary {
    pub id: i64,
    pub surname: String,
    pub given_name: String,
    pub sex: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: String,
    pub campaign_id: i64,
    pub import_batch_id: Option<String>,
    pub duplicate_ack: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl StoredBeneficiary {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}
