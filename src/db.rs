// ==========================================
// Campagnes médicales - Connexion SQLite et schéma
// ==========================================
// - PRAGMA communs à toutes les connexions (clés étrangères, busy_timeout)
// - Création idempotente des tables lues et écrites par l'import
// ==========================================

use rusqlite::{Connection, OptionalExtension};
use std::time::Duration;

/// busy_timeout par défaut (millisecondes)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Version de schéma attendue par ce code
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// PRAGMA communs
///
/// foreign_keys et busy_timeout se règlent connexion par connexion
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Ouvre une connexion SQLite configurée
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Chemin de base par défaut
///
/// # Retour
/// - variable CAMPAIGN_IMPORT_DB_PATH si renseignée
/// - sinon: dossier de données utilisateur/campaign-import/campaign_import.db
/// - à défaut: ./campaign_import.db
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var("CAMPAIGN_IMPORT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    match dirs::data_dir() {
        Some(data_dir) => {
            let dir = data_dir.join("campaign-import");
            // Échec de création: l'ouverture de la base le signalera
            let _ = std::fs::create_dir_all(&dir);
            dir.join("campaign_import.db").to_string_lossy().to_string()
        }
        None => "./campaign_import.db".to_string(),
    }
}

/// Nom de table utilisable tel quel dans une requête: [A-Za-z_][A-Za-z0-9_]*
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Crée les tables si absentes
///
/// # Paramètres
/// - beneficiary_table: table des bénéficiaires (nom déjà validé)
///
/// # Index
/// L'index unique partiel sur le téléphone ne couvre que les lignes
/// vivantes importées sans acquittement de doublon: deux imports
/// simultanés du même numéro ne peuvent pas valider tous les deux.
pub fn init_schema(conn: &Connection, beneficiary_table: &str) -> rusqlite::Result<()> {
    if !is_valid_identifier(beneficiary_table) {
        return Err(rusqlite::Error::InvalidParameterName(
            beneficiary_table.to_string(),
        ));
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS campaigns (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            assistance_type_id INTEGER NOT NULL,
            assistance_type_label TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );
        "#,
    )?;

    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            surname TEXT NOT NULL,
            given_name TEXT NOT NULL,
            sex TEXT NOT NULL CHECK (sex IN ('M', 'F')),
            birth_date TEXT,
            phone TEXT NOT NULL,
            email TEXT,
            address TEXT NOT NULL DEFAULT '',
            national_id TEXT,
            comment TEXT,
            campaign_id INTEGER NOT NULL REFERENCES campaigns(id),
            assistance_type_id INTEGER NOT NULL,
            schooled INTEGER,
            laterality TEXT,
            decision TEXT,
            import_batch_id TEXT,
            duplicate_ack INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            deleted_at TEXT
        );

        CREATE UNIQUE INDEX IF NOT EXISTS ux_{table}_live_phone
            ON {table}(phone)
            WHERE deleted_at IS NULL AND duplicate_ack = 0;

        CREATE INDEX IF NOT EXISTS ix_{table}_phone ON {table}(phone);
        CREATE INDEX IF NOT EXISTS ix_{table}_batch ON {table}(import_batch_id);
        "#,
        table = beneficiary_table
    ))?;

    if read_schema_version(conn)?.is_none() {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [CURRENT_SCHEMA_VERSION],
        )?;
    }
    Ok(())
}

/// Version de schéma enregistrée (None si table absente ou vide)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
}
