// ==========================================
// Campagnes médicales - Stockage SQLite des bénéficiaires
// ==========================================
// Table configurable (nom validé une fois à la construction)
// Aucune règle métier ici: lecture / écriture uniquement
// ==========================================

use crate::db::{is_valid_identifier, open_sqlite_connection};
use crate::domain::{StoredBeneficiary, ValidatedBeneficiary};
use crate::repository::beneficiary_repo::{BeneficiaryStore, BeneficiaryWriter, PhoneLookup};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, Row, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// SqliteBeneficiaryRepository
// ==========================================
pub struct SqliteBeneficiaryRepository {
    conn: Arc<Mutex<Connection>>,
    table: String,
}

impl SqliteBeneficiaryRepository {
    /// # Paramètres
    /// - db_path: chemin de la base
    /// - table: table des bénéficiaires
    pub fn new(db_path: &str, table: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)), table)
    }

    /// Depuis une connexion partagée
    pub fn from_connection(conn: Arc<Mutex<Connection>>, table: &str) -> RepositoryResult<Self> {
        if !is_valid_identifier(table) {
            return Err(RepositoryError::InvalidIdentifier(table.to_string()));
        }
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn exists_by_phone_in(conn: &Connection, table: &str, phone: &str) -> RepositoryResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE phone = ?1 AND deleted_at IS NULL)",
            table
        );
        let exists: bool = conn.query_row(&sql, params![phone], |row| row.get(0))?;
        Ok(exists)
    }

    /// Insertion dans une transaction ouverte
    fn insert_tx(
        tx: &Transaction,
        table: &str,
        b: &ValidatedBeneficiary,
        batch_id: &str,
        duplicate_ack: bool,
    ) -> RepositoryResult<i64> {
        let sql = format!(
            r#"
            INSERT INTO {} (
                surname, given_name, sex, birth_date, phone, email, address,
                national_id, comment, campaign_id, assistance_type_id,
                schooled, laterality, decision, import_batch_id, duplicate_ack,
                created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17
            )
            "#,
            table
        );

        tx.execute(
            &sql,
            params![
                b.surname,
                b.given_name,
                b.sex.as_str(),
                b.birth_date.map(|d| d.format("%Y-%m-%d").to_string()),
                b.phone,
                b.email,
                b.address,
                b.national_id,
                b.comment,
                b.campaign_id,
                b.assistance_type_id,
                b.schooled,
                b.laterality.map(|l| l.as_str()),
                b.decision.map(|d| d.as_str()),
                batch_id,
                duplicate_ack,
                Utc::now().format(TIMESTAMP_FORMAT).to_string(),
            ],
        )?;

        Ok(tx.last_insert_rowid())
    }

    fn map_row(row: &Row) -> rusqlite::Result<StoredBeneficiary> {
        let birth_date: Option<String> = row.get(5)?;
        let created_at: String = row.get(9)?;
        let deleted_at: Option<String> = row.get(10)?;

        Ok(StoredBeneficiary {
            id: row.get(0)?,
            surname: row.get(1)?,
            given_name: row.get(2)?,
            sex: row.get(3)?,
            phone: row.get(4)?,
            birth_date: birth_date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            campaign_id: row.get(6)?,
            import_batch_id: row.get(7)?,
            duplicate_ack: row.get(8)?,
            created_at: parse_timestamp(&created_at).unwrap_or_else(Utc::now),
            deleted_at: deleted_at.as_deref().and_then(parse_timestamp),
        })
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .ok()
        .map(|dt| dt.and_utc())
}

impl PhoneLookup for SqliteBeneficiaryRepository {
    fn exists_by_phone(&self, phone: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        Self::exists_by_phone_in(&conn, &self.table, phone)
    }
}

impl BeneficiaryStore for SqliteBeneficiaryRepository {
    fn with_transaction<T, F>(&self, work: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut dyn BeneficiaryWriter) -> RepositoryResult<(T, bool)>,
    {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut writer = SqliteBeneficiaryWriter {
            tx: &tx,
            table: &self.table,
        };
        // Err: la transaction est abandonnée (ROLLBACK au drop)
        let (value, commit) = work(&mut writer)?;

        if commit {
            tx.commit()
                .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
            debug!(table = %self.table, "transaction validée");
        } else {
            tx.rollback()
                .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
            debug!(table = %self.table, "transaction annulée");
        }
        Ok(value)
    }

    fn count_all(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        Ok(conn.query_row(&sql, [], |row| row.get(0))?)
    }

    fn count_live(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL", self.table);
        Ok(conn.query_row(&sql, [], |row| row.get(0))?)
    }

    fn list_by_batch(&self, batch_id: &str) -> RepositoryResult<Vec<StoredBeneficiary>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT id, surname, given_name, sex, phone, birth_date, campaign_id,
                   import_batch_id, duplicate_ack, created_at, deleted_at
            FROM {}
            WHERE import_batch_id = ?1 AND deleted_at IS NULL
            ORDER BY id
            "#,
            self.table
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![batch_id], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn soft_delete_batch(&self, batch_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let sql = format!(
            "UPDATE {} SET deleted_at = ?1 WHERE import_batch_id = ?2 AND deleted_at IS NULL",
            self.table
        );
        let count = conn.execute(
            &sql,
            params![Utc::now().format(TIMESTAMP_FORMAT).to_string(), batch_id],
        )?;
        Ok(count)
    }
}

// ==========================================
// SqliteBeneficiaryWriter - vue transactionnelle
// ==========================================
struct SqliteBeneficiaryWriter<'a> {
    tx: &'a Transaction<'a>,
    table: &'a str,
}

impl PhoneLookup for SqliteBeneficiaryWriter<'_> {
    fn exists_by_phone(&self, phone: &str) -> RepositoryResult<bool> {
        SqliteBeneficiaryRepository::exists_by_phone_in(self.tx, self.table, phone)
    }
}

impl BeneficiaryWriter for SqliteBeneficiaryWriter<'_> {
    fn insert(
        &mut self,
        beneficiary: &ValidatedBeneficiary,
        batch_id: &str,
        duplicate_ack: bool,
    ) -> RepositoryResult<i64> {
        SqliteBeneficiaryRepository::insert_tx(
            self.tx,
            self.table,
            beneficiary,
            batch_id,
            duplicate_ack,
        )
    }
}
