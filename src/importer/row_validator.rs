// ==========================================
// Campagnes médicales - Validation des lignes
// ==========================================
// Fonction pure: (MappedRow, ImportContext) → ValidatedBeneficiary | RowError
// Toutes les anomalies d'une ligne sont collectées (pas d'arrêt au premier)
// Aucune écriture: la persistance est faite par l'orchestrateur
// ==========================================

use crate::domain::{
    AssistanceKind, CanonicalField, FieldIssue, ImportContext, IssueKind, RowError,
    ValidatedBeneficiary,
};
use crate::domain::types::Sex;
use crate::i18n::t_with_args;
use crate::importer::data_cleaner::{
    age_on, clean_phone, clean_text, is_valid_email, normalize_null, parse_bool_token,
    parse_birth_date, parse_decision, parse_laterality, parse_sex,
};
use crate::importer::field_mapper::{header_label, MappedRow};
use chrono::NaiveDate;

// ==========================================
// ValidationRules - seuils configurables
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    /// En dessous de cet âge, la scolarisation est exigée (lunettes)
    pub child_age_threshold: i32,
    /// Âge maximum plausible
    pub max_age_years: i32,
    /// Date de naissance exigée sur chaque ligne
    pub birth_date_required: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            child_age_threshold: 18,
            max_age_years: 120,
            birth_date_required: false,
        }
    }
}

// ==========================================
// RowValidator
// ==========================================
pub struct RowValidator {
    rules: ValidationRules,
}

impl RowValidator {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Valide et normalise une ligne
    ///
    /// # Paramètres
    /// - row: ligne projetée sur les champs canoniques (non vide)
    /// - ctx: campagne + date de référence
    ///
    /// # Retour
    /// - Ok(ValidatedBeneficiary): tous les contrôles passés
    /// - Err(RowError): liste complète des anomalies de la ligne
    pub fn validate(
        &self,
        row: &MappedRow,
        ctx: &ImportContext,
    ) -> Result<ValidatedBeneficiary, RowError> {
        let mut issues = Vec::new();

        let surname = required_text(row, CanonicalField::Surname, &mut issues);
        let given_name = required_text(row, CanonicalField::GivenName, &mut issues);
        let sex = check_sex(row, &mut issues);
        let birth_date = self.check_birth_date(row, ctx.today, &mut issues);
        let phone = check_phone(row, &mut issues);
        let email = check_email(row, &mut issues);

        let decision = optional_choice(
            row,
            CanonicalField::Decision,
            parse_decision,
            "row.invalid_decision",
            &mut issues,
        );
        let schooled = optional_choice(
            row,
            CanonicalField::Schooled,
            parse_bool_token,
            "row.invalid_schooled",
            &mut issues,
        );
        let laterality = optional_choice(
            row,
            CanonicalField::Laterality,
            parse_laterality,
            "row.invalid_laterality",
            &mut issues,
        );

        self.check_conditional(row, ctx, birth_date, &mut issues);

        match (surname, given_name, sex, phone) {
            (Some(surname), Some(given_name), Some(sex), Some(phone)) if issues.is_empty() => {
                Ok(ValidatedBeneficiary {
                    surname,
                    given_name,
                    sex,
                    birth_date,
                    phone,
                    email,
                    address: clean_text(row.get(CanonicalField::Address)),
                    national_id: normalize_null(Some(row.get(CanonicalField::NationalId)))
                        .map(|v| v.to_uppercase()),
                    comment: normalize_null(Some(row.get(CanonicalField::Comment))),
                    campaign_id: ctx.campaign.id,
                    assistance_type_id: ctx.campaign.assistance_type_id,
                    schooled,
                    laterality,
                    decision,
                    line: row.line,
                })
            }
            _ => Err(RowError {
                line: row.line,
                issues,
            }),
        }
    }

    /// Date de naissance: absente (selon la politique), illisible, future
    /// ou trop ancienne
    fn check_birth_date(
        &self,
        row: &MappedRow,
        today: NaiveDate,
        issues: &mut Vec<FieldIssue>,
    ) -> Option<NaiveDate> {
        let field = CanonicalField::BirthDate;
        let raw = row.get(field);

        if raw.is_empty() {
            if self.rules.birth_date_required {
                issues.push(required_issue(field));
            }
            return None;
        }

        let Some(date) = parse_birth_date(raw) else {
            issues.push(issue(
                field,
                IssueKind::InvalidDate,
                t_with_args("row.invalid_date", &[("value", raw)]),
            ));
            return None;
        };

        if date > today {
            issues.push(issue(
                field,
                IssueKind::DateOutOfRange,
                t_with_args("row.future_date", &[("value", &date.format("%d/%m/%Y").to_string())]),
            ));
            return None;
        }

        let age = age_on(date, today);
        if age > self.rules.max_age_years {
            issues.push(issue(
                field,
                IssueKind::DateOutOfRange,
                t_with_args(
                    "row.too_old",
                    &[
                        ("age", &age.to_string()),
                        ("max", &self.rules.max_age_years.to_string()),
                    ],
                ),
            ));
            return None;
        }

        Some(date)
    }

    /// Règles dépendant du type d'assistance de la campagne
    fn check_conditional(
        &self,
        row: &MappedRow,
        ctx: &ImportContext,
        birth_date: Option<NaiveDate>,
        issues: &mut Vec<FieldIssue>,
    ) {
        match ctx.assistance_kind() {
            AssistanceKind::Glasses => {
                // Âge inconnu: la règle enfant ne s'applique pas
                let is_child = birth_date
                    .map(|d| age_on(d, ctx.today) < self.rules.child_age_threshold)
                    .unwrap_or(false);
                if is_child && row.get(CanonicalField::Schooled).is_empty() {
                    issues.push(issue(
                        CanonicalField::Schooled,
                        IssueKind::ConditionalRequired,
                        t_with_args(
                            "row.schooled_required",
                            &[("threshold", &self.rules.child_age_threshold.to_string())],
                        ),
                    ));
                }
            }
            AssistanceKind::HearingAids => {
                if row.get(CanonicalField::Laterality).is_empty() {
                    issues.push(issue(
                        CanonicalField::Laterality,
                        IssueKind::ConditionalRequired,
                        t_with_args("row.laterality_required", &[]),
                    ));
                }
            }
            AssistanceKind::Other => {}
        }
    }
}

// ==========================================
// Contrôles élémentaires
// ==========================================

fn issue(field: CanonicalField, kind: IssueKind, message: String) -> FieldIssue {
    FieldIssue {
        field: Some(field),
        kind,
        message,
    }
}

fn required_issue(field: CanonicalField) -> FieldIssue {
    issue(
        field,
        IssueKind::Required,
        t_with_args("row.required", &[("field", header_label(field))]),
    )
}

fn required_text(
    row: &MappedRow,
    field: CanonicalField,
    issues: &mut Vec<FieldIssue>,
) -> Option<String> {
    let value = clean_text(row.get(field));
    if value.is_empty() {
        issues.push(required_issue(field));
        None
    } else {
        Some(value)
    }
}

fn check_sex(row: &MappedRow, issues: &mut Vec<FieldIssue>) -> Option<Sex> {
    let raw = row.get(CanonicalField::Sex);
    let sex = parse_sex(raw);
    if sex.is_none() {
        issues.push(issue(
            CanonicalField::Sex,
            IssueKind::InvalidSex,
            t_with_args("row.invalid_sex", &[("value", raw)]),
        ));
    }
    sex
}

/// Téléphone: obligatoire puis exactement 9 chiffres après nettoyage
fn check_phone(row: &MappedRow, issues: &mut Vec<FieldIssue>) -> Option<String> {
    let field = CanonicalField::Phone;
    let raw = row.get(field);
    if raw.is_empty() {
        issues.push(required_issue(field));
        return None;
    }

    let phone = clean_phone(raw);
    if phone.is_valid() {
        return Some(phone.canonical);
    }

    issues.push(issue(
        field,
        IssueKind::InvalidPhone,
        t_with_args(
            "row.invalid_phone",
            &[
                ("original", &phone.original),
                ("cleaned", &phone.canonical),
                ("length", &phone.canonical.len().to_string()),
            ],
        ),
    ));
    None
}

fn check_email(row: &MappedRow, issues: &mut Vec<FieldIssue>) -> Option<String> {
    let raw = row.get(CanonicalField::Email);
    if raw.is_empty() {
        return None;
    }
    if is_valid_email(raw) {
        Some(raw.to_string())
    } else {
        issues.push(issue(
            CanonicalField::Email,
            IssueKind::InvalidEmail,
            t_with_args("row.invalid_email", &[("value", raw)]),
        ));
        None
    }
}

/// Champ d'énumération facultatif: vide → None, inconnu → anomalie
fn optional_choice<T>(
    row: &MappedRow,
    field: CanonicalField,
    parse: fn(&str) -> Option<T>,
    message_key: &str,
    issues: &mut Vec<FieldIssue>,
) -> Option<T> {
    let raw = row.get(field);
    if raw.is_empty() {
        return None;
    }
    let parsed = parse(raw);
    if parsed.is_none() {
        issues.push(issue(
            field,
            IssueKind::InvalidChoice,
            t_with_args(message_key, &[("value", raw)]),
        ));
    }
    parsed
}
