// ==========================================
// Internationalisation (i18n)
// ==========================================
// Bibliothèque: rust-i18n
// Langues: français (par défaut) et anglais
// Fichiers: locales/fr.yml, locales/en.yml
// ==========================================
// Remarque: la macro rust_i18n::i18n! est initialisée dans lib.rs
// La langue est celle du processus entier: fixée une fois au démarrage
// (ImportApi::apply_configured_locale), jamais par import
// ==========================================

/// Langues disponibles
pub const SUPPORTED_LOCALES: &[&str] = &["fr", "en"];

/// Langue courante
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// Change la langue
///
/// # Paramètres
/// - locale: code langue ("fr" ou "en"); une langue inconnue retombe sur "fr"
pub fn set_locale(locale: &str) {
    if SUPPORTED_LOCALES.contains(&locale) {
        rust_i18n::set_locale(locale);
    } else {
        tracing::warn!(locale, "langue non prise en charge, retour au français");
        rust_i18n::set_locale("fr");
    }
}

/// Traduit un message sans paramètre
///
/// # Exemple
/// ```no_run
/// use campaign_import::i18n::t;
/// let msg = t("warning.dry_run");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// Traduit un message avec paramètres `%{nom}`
///
/// # Exemple
/// ```no_run
/// use campaign_import::i18n::t_with_args;
/// let msg = t_with_args("row.invalid_sex", &[("value", "X")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // La langue rust-i18n est globale et les tests tournent en parallèle
    static LOCALE_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_set_locale() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("en");
        assert_eq!(current_locale(), "en");

        set_locale("de");
        assert_eq!(current_locale(), "fr");
    }

    #[test]
    fn test_translate_simple() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("fr");
        assert_eq!(t("common.success"), "Opération réussie");

        set_locale("en");
        assert_eq!(t("common.success"), "Operation successful");

        set_locale("fr");
    }

    #[test]
    fn test_translate_with_args() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("fr");
        let msg = t_with_args(
            "row.invalid_phone",
            &[("original", "06 12"), ("cleaned", "612"), ("length", "3")],
        );
        assert!(msg.contains("06 12"));
        assert!(msg.contains("612"));
        assert!(msg.contains("Téléphone invalide"));

        set_locale("en");
        let msg = t_with_args("row.invalid_sex", &[("value", "X")]);
        assert!(msg.contains("Invalid sex"));
        assert!(msg.contains("\"X\""));

        set_locale("fr");
    }
}
