// ==========================================
// Campagnes médicales - Lecture des campagnes
// ==========================================
// Collaborateur externe en lecture seule: l'import ne crée ni ne
// modifie jamais une campagne
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::Campaign;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// Annuaire des campagnes
pub trait CampaignDirectory: Send + Sync {
    /// # Retour
    /// - Ok(Some(Campaign)): campagne trouvée
    /// - Ok(None): identifiant inconnu
    fn get_campaign(&self, id: i64) -> RepositoryResult<Option<Campaign>>;
}

pub struct SqliteCampaignRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCampaignRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl CampaignDirectory for SqliteCampaignRepository {
    fn get_campaign(&self, id: i64) -> RepositoryResult<Option<Campaign>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let campaign = conn
            .query_row(
                r#"
                SELECT id, name, status, assistance_type_id, assistance_type_label
                FROM campaigns
                WHERE id = ?1
                "#,
                params![id],
                |row| {
                    Ok(Campaign {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        status: row.get(2)?,
                        assistance_type_id: row.get(3)?,
                        assistance_type_label: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(campaign)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::domain::AssistanceKind;

    #[test]
    fn test_get_campaign() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn, "beneficiaries").unwrap();
        conn.execute(
            "INSERT INTO campaigns (id, name, status, assistance_type_id, assistance_type_label) VALUES (3, 'Audition 2024', 'en_cours', 9, 'Appareils auditifs')",
            [],
        )
        .unwrap();
        let repo = SqliteCampaignRepository::from_connection(Arc::new(Mutex::new(conn)));

        let campaign = repo.get_campaign(3).unwrap().unwrap();
        assert_eq!(campaign.name, "Audition 2024");
        assert_eq!(campaign.assistance_kind(), AssistanceKind::HearingAids);
        assert!(campaign.is_active());

        assert!(repo.get_campaign(99).unwrap().is_none());
    }
}
