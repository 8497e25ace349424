// ==========================================
// Campagnes médicales - Campagne (collaborateur externe)
// ==========================================
// Lecture seule côté import: pilote la validation conditionnelle
// et tamponne les bénéficiaires importés
// ==========================================

use crate::domain::types::AssistanceKind;
use serde::{Deserialize, Serialize};

/// Statuts considérés comme « campagne ouverte »
const ACTIVE_STATUSES: &[&str] = &["active", "en_cours", "ouverte", "open"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub assistance_type_id: i64,
    pub assistance_type_label: String,
}

impl Campaign {
    /// Nature d'assistance déduite du libellé du type d'assistance
    pub fn assistance_kind(&self) -> AssistanceKind {
        let label = crate::importer::data_cleaner::fold_text(&self.assistance_type_label);
        let label = label.trim();

        if ["lunette", "glasses", "optique", "optical"]
            .iter()
            .any(|k| label.contains(k))
        {
            AssistanceKind::Glasses
        } else if ["auditif", "audition", "hearing"]
            .iter()
            .any(|k| label.contains(k))
        {
            AssistanceKind::HearingAids
        } else {
            AssistanceKind::Other
        }
    }

    pub fn is_active(&self) -> bool {
        let status = self.status.trim().to_lowercase();
        ACTIVE_STATUSES.contains(&status.as_str())
    }
}
