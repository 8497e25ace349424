// ==========================================
// Campagnes médicales - Normalisation des en-têtes et mapping des colonnes
// ==========================================
// Table d'alias déclarative: champ canonique → libellés acceptés
// Comparaison par égalité exacte après normalisation (pas de flou)
// ==========================================

use crate::domain::types::CanonicalField;
use crate::importer::data_cleaner::fold_text;
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::file_parser::RawRow;
use std::collections::BTreeMap;

// ==========================================
// Table d'alias
// ==========================================
pub struct ColumnAlias {
    pub field: CanonicalField,
    /// Premier libellé = libellé affiché (modèle, messages d'erreur)
    pub variants: &'static [&'static str],
}

pub static COLUMN_ALIASES: &[ColumnAlias] = &[
    ColumnAlias {
        field: CanonicalField::Surname,
        variants: &["nom", "nom de famille", "noms", "surname", "last name", "lastname", "family name"],
    },
    ColumnAlias {
        field: CanonicalField::GivenName,
        variants: &["prenom", "prenoms", "given name", "first name", "firstname"],
    },
    ColumnAlias {
        field: CanonicalField::Sex,
        variants: &["sexe", "sex", "genre", "gender"],
    },
    ColumnAlias {
        field: CanonicalField::BirthDate,
        variants: &[
            "date de naissance",
            "date naissance",
            "naissance",
            "ddn",
            "birth date",
            "birthdate",
            "date of birth",
            "dob",
        ],
    },
    ColumnAlias {
        field: CanonicalField::Phone,
        variants: &[
            "telephone",
            "tel",
            "numero de telephone",
            "num tel",
            "n telephone",
            "n tel",
            "gsm",
            "mobile",
            "portable",
            "phone",
            "phone number",
        ],
    },
    ColumnAlias {
        field: CanonicalField::Email,
        variants: &["email", "e-mail", "mail", "courriel", "adresse email", "adresse e-mail"],
    },
    ColumnAlias {
        field: CanonicalField::Address,
        variants: &["adresse", "adresse postale", "domicile", "address"],
    },
    ColumnAlias {
        field: CanonicalField::NationalId,
        variants: &[
            "cin",
            "cni",
            "n cin",
            "numero cin",
            "carte nationale",
            "piece d'identite",
            "national id",
        ],
    },
    ColumnAlias {
        field: CanonicalField::Comment,
        variants: &[
            "commentaire",
            "commentaires",
            "remarque",
            "remarques",
            "observation",
            "observations",
            "comment",
            "notes",
        ],
    },
    ColumnAlias {
        field: CanonicalField::Decision,
        variants: &["decision", "avis", "statut decision", "decision finale"],
    },
    ColumnAlias {
        field: CanonicalField::Schooled,
        variants: &["scolarise", "scolarisee", "scolarisation", "scolarite", "schooled"],
    },
    ColumnAlias {
        field: CanonicalField::Laterality,
        variants: &["lateralite", "cote", "type appareillage", "laterality"],
    },
];

/// Colonnes toujours obligatoires
pub const REQUIRED_FIELDS: &[CanonicalField] = &[
    CanonicalField::Surname,
    CanonicalField::GivenName,
    CanonicalField::Sex,
    CanonicalField::Phone,
    CanonicalField::Address,
];

/// Minuscules, suites de caractères non alphanumériques → `_`,
/// `_` retirés aux extrémités
///
/// Les diacritiques sont repliés avant, pour que "Prénom" et "PRENOM"
/// produisent la même clé.
pub fn normalize_column_name(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_sep = false;

    for c in fold_text(text).chars() {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }

    out
}

/// Libellé affiché d'un champ canonique
pub fn header_label(field: CanonicalField) -> &'static str {
    COLUMN_ALIASES
        .iter()
        .find(|alias| alias.field == field)
        .and_then(|alias| alias.variants.first().copied())
        .unwrap_or_else(|| field.as_str())
}

/// Libellés affichés, séparés par des virgules
pub fn header_labels(fields: &[CanonicalField]) -> String {
    fields
        .iter()
        .map(|f| header_label(*f))
        .collect::<Vec<_>>()
        .join(", ")
}

// ==========================================
// MappedRow - ligne indexée par champ canonique
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedRow {
    /// Ligne du fichier (en-tête = 1)
    pub line: usize,
    values: BTreeMap<CanonicalField, String>,
}

impl MappedRow {
    /// Construit une ligne complète: tout champ absent vaut ""
    pub fn from_pairs<I, S>(line: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (CanonicalField, S)>,
        S: Into<String>,
    {
        let mut values: BTreeMap<CanonicalField, String> = CanonicalField::ALL
            .iter()
            .map(|f| (*f, String::new()))
            .collect();
        for (field, value) in pairs {
            values.insert(field, value.into());
        }
        Self { line, values }
    }

    /// Valeur brute TRIM (jamais absente)
    pub fn get(&self, field: CanonicalField) -> &str {
        self.values.get(&field).map(|v| v.trim()).unwrap_or("")
    }

    pub fn is_blank(&self) -> bool {
        self.values.values().all(|v| v.trim().is_empty())
    }
}

// ==========================================
// ColumnMapping - résultat de la résolution des en-têtes
// ==========================================
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    positions: BTreeMap<CanonicalField, usize>,
    headers: Vec<String>,
}

impl ColumnMapping {
    pub fn position(&self, field: CanonicalField) -> Option<usize> {
        self.positions.get(&field).copied()
    }

    pub fn mapped_fields(&self) -> Vec<CanonicalField> {
        self.positions.keys().copied().collect()
    }

    /// En-têtes du fichier non rattachés à un champ canonique
    pub fn unmapped_headers(&self) -> Vec<String> {
        let used: Vec<usize> = self.positions.values().copied().collect();
        self.headers
            .iter()
            .enumerate()
            .filter(|(idx, h)| !used.contains(idx) && !h.trim().is_empty())
            .map(|(_, h)| h.clone())
            .collect()
    }

    /// Projette une ligne brute sur les champs canoniques
    pub fn map_row(&self, row: &RawRow, line: usize) -> MappedRow {
        MappedRow::from_pairs(
            line,
            self.positions
                .iter()
                .map(|(field, idx)| (*field, row.get(*idx).cloned().unwrap_or_default())),
        )
    }
}

// ==========================================
// FieldMapper
// ==========================================
pub struct FieldMapper {
    required: Vec<CanonicalField>,
}

impl FieldMapper {
    /// # Paramètres
    /// - birth_date_required: ajoute la date de naissance aux colonnes obligatoires
    pub fn new(birth_date_required: bool) -> Self {
        let mut required = REQUIRED_FIELDS.to_vec();
        if birth_date_required {
            required.push(CanonicalField::BirthDate);
        }
        Self { required }
    }

    /// Résout les en-têtes du fichier
    ///
    /// # Retour
    /// - Ok(ColumnMapping): tous les champs obligatoires trouvés
    /// - Err(MissingColumns): liste de TOUS les champs obligatoires absents
    pub fn map_columns(&self, headers: &[String]) -> ImporterResult<ColumnMapping> {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_column_name(h)).collect();

        let mut positions = BTreeMap::new();
        for alias in COLUMN_ALIASES {
            let hit = alias.variants.iter().find_map(|variant| {
                let key = normalize_column_name(variant);
                normalized.iter().position(|h| *h == key)
            });
            if let Some(idx) = hit {
                positions.insert(alias.field, idx);
            }
        }

        let missing: Vec<CanonicalField> = self
            .required
            .iter()
            .filter(|f| !positions.contains_key(*f))
            .copied()
            .collect();

        if !missing.is_empty() {
            return Err(ImportError::MissingColumns { missing });
        }

        Ok(ColumnMapping {
            positions,
            headers: headers.to_vec(),
        })
    }
}
