// ==========================================
// Campagnes médicales - Types du domaine
// ==========================================
// Énumérations partagées par l'import, la validation et le stockage
// Format de stockage: minuscules (aligné sur les colonnes SQLite)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Sexe
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    M, // masculin
    F, // féminin
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::M => "M",
            Sex::F => "F",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// Latéralité (appareils auditifs)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Laterality {
    Unilateral,
    Bilateral,
}

impl Laterality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Laterality::Unilateral => "unilateral",
            Laterality::Bilateral => "bilateral",
        }
    }
}

impl fmt::Display for Laterality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// Décision de prise en charge
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accepted, // accepté
    Rejected, // refusé
    Pending,  // en attente
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Accepted => "accepted",
            Decision::Rejected => "rejected",
            Decision::Pending => "pending",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// Nature de l'assistance d'une campagne
// ==========================================
// Pilote les règles conditionnelles du validateur de lignes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssistanceKind {
    Glasses,     // lunettes
    HearingAids, // appareils auditifs
    Other,
}

impl fmt::Display for AssistanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssistanceKind::Glasses => write!(f, "GLASSES"),
            AssistanceKind::HearingAids => write!(f, "HEARING_AIDS"),
            AssistanceKind::Other => write!(f, "OTHER"),
        }
    }
}

// ==========================================
// Champs canoniques de l'import
// ==========================================
// Nom interne d'une colonne, indépendant du libellé du fichier source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Surname,
    GivenName,
    Sex,
    BirthDate,
    Phone,
    Email,
    Address,
    NationalId,
    Comment,
    Decision,
    Schooled,
    Laterality,
}

impl CanonicalField {
    /// Tous les champs, dans l'ordre du modèle d'import
    pub const ALL: [CanonicalField; 12] = [
        CanonicalField::Surname,
        CanonicalField::GivenName,
        CanonicalField::Sex,
        CanonicalField::BirthDate,
        CanonicalField::Phone,
        CanonicalField::Email,
        CanonicalField::Address,
        CanonicalField::NationalId,
        CanonicalField::Comment,
        CanonicalField::Decision,
        CanonicalField::Schooled,
        CanonicalField::Laterality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Surname => "surname",
            CanonicalField::GivenName => "given_name",
            CanonicalField::Sex => "sex",
            CanonicalField::BirthDate => "birth_date",
            CanonicalField::Phone => "phone",
            CanonicalField::Email => "email",
            CanonicalField::Address => "address",
            CanonicalField::NationalId => "national_id",
            CanonicalField::Comment => "comment",
            CanonicalField::Decision => "decision",
            CanonicalField::Schooled => "schooled",
            CanonicalField::Laterality => "laterality",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
