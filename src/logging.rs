// ==========================================
// Initialisation des journaux
// ==========================================
// tracing + tracing-subscriber
// Niveau réglable par variable d'environnement
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise les journaux du processus
///
/// # Variables d'environnement
/// - RUST_LOG: filtre de niveau (défaut: info)
///   ex: RUST_LOG=debug ou RUST_LOG=campaign_import=trace
///
/// # Exemple
/// ```no_run
/// use campaign_import::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Sortie sur stderr: stdout est réservé au rapport JSON de la CLI
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Journaux des tests: niveau debug, capturés par le harnais
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
