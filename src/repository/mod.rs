// ==========================================
// Campagnes médicales - Couche stockage
// ==========================================
// Aucune règle métier: accès aux données uniquement
// Requêtes paramétrées; seuls les noms de table validés sont interpolés
// ==========================================

pub mod beneficiary_repo;
pub mod beneficiary_repo_impl;
pub mod campaign_repo;
pub mod error;

pub use beneficiary_repo::{BeneficiaryStore, BeneficiaryWriter, PhoneLookup};
pub use beneficiary_repo_impl::SqliteBeneficiaryRepository;
pub use campaign_repo::{CampaignDirectory, SqliteCampaignRepository};
pub use error::{RepositoryError, RepositoryResult};
