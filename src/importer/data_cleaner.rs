// ==========================================
// Campagnes médicales - Nettoyage des valeurs
// ==========================================
// Responsabilités: TRIM / NULL / repli des accents / jetons
// d'énumération / téléphone canonique / dates
// Fonctions pures, sans état ni effet de bord
// ==========================================

use crate::domain::types::{Decision, Laterality, Sex};
use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

/// Nombre de chiffres d'un numéro national canonique
pub const PHONE_DIGITS: usize = 9;

/// Plus grand numéro de série de date Excel (31/12/9999)
const MAX_SERIAL: f64 = 2_958_465.0;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$";

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("motif email statique valide"))
}

/// Minuscules + suppression des diacritiques latins
///
/// "Téléphone" → "telephone", "ŒUVRE" → "oeuvre"
pub fn fold_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars().flat_map(char::to_lowercase) {
        match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => out.push('a'),
            'ç' => out.push('c'),
            'è' | 'é' | 'ê' | 'ë' => out.push('e'),
            'ì' | 'í' | 'î' | 'ï' => out.push('i'),
            'ñ' => out.push('n'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' => out.push('o'),
            'ù' | 'ú' | 'û' | 'ü' => out.push('u'),
            'ý' | 'ÿ' => out.push('y'),
            'œ' => out.push_str("oe"),
            'æ' => out.push_str("ae"),
            '\u{2019}' => out.push('\''),
            _ => out.push(c),
        }
    }
    out
}

/// Jeton comparable: repli + séparateurs ramenés à une espace simple
fn token(value: &str) -> String {
    fold_text(value)
        .replace(['-', '_', '.', '/'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ==========================================
// Téléphone
// ==========================================

/// Résultat du nettoyage d'un numéro
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedPhone {
    /// Valeur brute du fichier
    pub original: String,
    /// Chiffres seuls, préfixe conservé
    pub digits: String,
    /// Numéro national (préfixe international ou 0 retiré)
    pub canonical: String,
}

impl CleanedPhone {
    pub fn is_valid(&self) -> bool {
        self.canonical.len() == PHONE_DIGITS
    }
}

/// Réduit un numéro à sa forme canonique à 9 chiffres
///
/// Règle unique appliquée à la validation, au contrôle de doublon
/// et au stockage:
/// 1. ne garder que les chiffres
/// 2. retirer un préfixe `00212`, ou `212` si au moins 12 chiffres,
///    ou un `0` de tête si exactement 10 chiffres
pub fn clean_phone(raw: &str) -> CleanedPhone {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    let canonical = if let Some(rest) = digits.strip_prefix("00212") {
        rest.to_string()
    } else if digits.len() >= 12 && digits.starts_with("212") {
        digits[3..].to_string()
    } else if digits.len() == PHONE_DIGITS + 1 && digits.starts_with('0') {
        digits[1..].to_string()
    } else {
        digits.clone()
    };

    CleanedPhone {
        original: raw.trim().to_string(),
        digits,
        canonical,
    }
}

// ==========================================
// Jetons d'énumération
// ==========================================

pub fn parse_sex(raw: &str) -> Option<Sex> {
    match token(raw).as_str() {
        "m" | "h" | "masculin" | "homme" => Some(Sex::M),
        "f" | "feminin" | "femme" => Some(Sex::F),
        _ => None,
    }
}

/// oui/non et équivalents booléens
pub fn parse_bool_token(raw: &str) -> Option<bool> {
    match token(raw).as_str() {
        "oui" | "o" | "yes" | "y" | "true" | "vrai" | "1" | "scolarise" | "scolarisee" => {
            Some(true)
        }
        "non" | "n" | "no" | "false" | "faux" | "0" | "non scolarise" | "non scolarisee" => {
            Some(false)
        }
        _ => None,
    }
}

pub fn parse_laterality(raw: &str) -> Option<Laterality> {
    match token(raw).as_str() {
        "unilateral" | "unilaterale" | "uni" | "un cote" | "1 cote" => {
            Some(Laterality::Unilateral)
        }
        "bilateral" | "bilaterale" | "bi" | "deux cotes" | "2 cotes" => {
            Some(Laterality::Bilateral)
        }
        _ => None,
    }
}

pub fn parse_decision(raw: &str) -> Option<Decision> {
    match token(raw).as_str() {
        "accepte" | "acceptee" | "accepted" | "oui" | "ok" | "valide" | "validee" => {
            Some(Decision::Accepted)
        }
        "refuse" | "refusee" | "rejete" | "rejetee" | "rejected" | "non" => {
            Some(Decision::Rejected)
        }
        "en attente" | "attente" | "pending" => Some(Decision::Pending),
        _ => None,
    }
}

pub fn is_valid_email(raw: &str) -> bool {
    let value = raw.trim();
    value.len() <= 254 && email_regex().is_match(value)
}

// ==========================================
// Dates
// ==========================================

/// Convertit un numéro de série de date tableur (système 1900)
pub fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_SERIAL {
        return None;
    }
    let days = serial.trunc() as i64;
    // Avant le 01/03/1900 le tableur compte un faux 29/02/1900
    let base = if days < 61 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    base.checked_add_signed(Duration::days(days))
}

/// Date de naissance: numéro de série tableur ou date libre
///
/// Formats texte: jj/mm/aaaa, jj-mm-aaaa, jj.mm.aaaa, aaaa-mm-jj,
/// aaaa/mm/jj, aaaammjj (préfixe date d'un horodatage accepté).
/// Les années sur deux chiffres sont refusées (ambiguës).
pub fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    let numeric = value.chars().all(|c| c.is_ascii_digit() || c == '.')
        && value.chars().filter(|c| *c == '.').count() <= 1;

    if numeric {
        if value.len() == 8 && !value.contains('.') {
            if let Ok(date) = NaiveDate::parse_from_str(value, "%Y%m%d") {
                return Some(date);
            }
        }
        if let Ok(serial) = value.parse::<f64>() {
            return date_from_serial(serial);
        }
    }

    // Horodatage: ne garder que la partie date
    let date_part = value
        .split(['T', ' '])
        .next()
        .unwrap_or(value);

    const FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d"];
    FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .find(|date| date.year() >= 1000)
}

/// Âge révolu à une date donnée
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

// ==========================================
// Textes
// ==========================================

/// TRIM + espace/texte vide → None
pub fn normalize_null(value: Option<&str>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// TRIM + espaces internes compactés
pub fn clean_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
