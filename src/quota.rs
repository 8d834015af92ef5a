//! Tier-based upload ceilings.

use serde::Serialize;
use tracing::info;

use crate::config::QuotaConfig;
use crate::db::{Database, Tier, UserRepository};
use crate::{Result, SharedropError};

/// Default free tier ceiling: 500 MiB.
pub const FREE_CEILING_BYTES: u64 = 500 * 1024 * 1024;

/// Default pro tier ceiling: 5 GiB.
pub const PRO_CEILING_BYTES: u64 = 5 * 1024 * 1024 * 1024;

/// A user's tier together with the ceiling it grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaStatus {
    /// Current tier.
    pub tier: Tier,
    /// Maximum upload size in bytes.
    pub ceiling: u64,
}

impl QuotaStatus {
    /// Whether the user is on the pro tier.
    pub fn is_pro(&self) -> bool {
        self.tier.is_pro()
    }
}

/// Maps tiers to byte ceilings and applies tier upgrades.
#[derive(Debug, Clone)]
pub struct QuotaPolicy {
    db: Database,
    free_ceiling: u64,
    pro_ceiling: u64,
}

impl QuotaPolicy {
    /// Create a policy with explicit ceilings in bytes.
    pub fn new(db: Database, free_ceiling: u64, pro_ceiling: u64) -> Self {
        Self {
            db,
            free_ceiling,
            pro_ceiling,
        }
    }

    /// Create a policy from configuration.
    pub fn from_config(db: Database, config: &QuotaConfig) -> Self {
        Self::new(db, config.free_limit_bytes(), config.pro_limit_bytes())
    }

    /// Byte ceiling for a tier.
    pub fn ceiling_for(&self, tier: Tier) -> u64 {
        match tier {
            Tier::Free => self.free_ceiling,
            Tier::Pro => self.pro_ceiling,
        }
    }

    /// The largest ceiling of any tier.
    pub fn max_ceiling(&self) -> u64 {
        self.free_ceiling.max(self.pro_ceiling)
    }

    /// Current tier and ceiling of a user.
    pub async fn status(&self, user_id: i64) -> Result<QuotaStatus> {
        let user = UserRepository::new(self.db.pool())
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| SharedropError::NotFound("user".to_string()))?;

        Ok(QuotaStatus {
            tier: user.tier,
            ceiling: self.ceiling_for(user.tier),
        })
    }

    /// Move a user to the pro tier.
    ///
    /// Idempotent. No payment verification happens here; the caller is
    /// trusted to have confirmed the upgrade.
    pub async fn upgrade(&self, user_id: i64) -> Result<QuotaStatus> {
        let user = UserRepository::new(self.db.pool())
            .set_tier(user_id, Tier::Pro)
            .await?
            .ok_or_else(|| SharedropError::NotFound("user".to_string()))?;

        info!(user_id, "User upgraded to pro");

        Ok(QuotaStatus {
            tier: user.tier,
            ceiling: self.ceiling_for(user.tier),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewUser;

    async fn setup() -> (QuotaPolicy, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("alice", "hash"))
            .await
            .unwrap();
        (QuotaPolicy::from_config(db, &QuotaConfig::default()), user.id)
    }

    #[test]
    fn test_default_ceiling_constants() {
        assert_eq!(FREE_CEILING_BYTES, 524_288_000);
        assert_eq!(PRO_CEILING_BYTES, 5_368_709_120);
        assert_eq!(QuotaConfig::default().free_limit_bytes(), FREE_CEILING_BYTES);
        assert_eq!(QuotaConfig::default().pro_limit_bytes(), PRO_CEILING_BYTES);
    }

    #[tokio::test]
    async fn test_ceiling_for() {
        let (policy, _) = setup().await;
        assert_eq!(policy.ceiling_for(Tier::Free), FREE_CEILING_BYTES);
        assert_eq!(policy.ceiling_for(Tier::Pro), PRO_CEILING_BYTES);
        assert_eq!(policy.max_ceiling(), PRO_CEILING_BYTES);
    }

    #[tokio::test]
    async fn test_600_mib_exceeds_free_but_not_pro() {
        let (policy, _) = setup().await;
        let size = 600 * 1024 * 1024;
        assert!(size > policy.ceiling_for(Tier::Free));
        assert!(size <= policy.ceiling_for(Tier::Pro));
    }

    #[tokio::test]
    async fn test_status_new_user_is_free() {
        let (policy, user_id) = setup().await;
        let status = policy.status(user_id).await.unwrap();
        assert_eq!(status.tier, Tier::Free);
        assert!(!status.is_pro());
        assert_eq!(status.ceiling, FREE_CEILING_BYTES);
    }

    #[tokio::test]
    async fn test_upgrade_twice() {
        let (policy, user_id) = setup().await;

        let first = policy.upgrade(user_id).await.unwrap();
        let second = policy.upgrade(user_id).await.unwrap();

        assert!(first.is_pro());
        assert_eq!(first, second);
        assert_eq!(policy.status(user_id).await.unwrap().ceiling, PRO_CEILING_BYTES);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let (policy, _) = setup().await;
        assert!(matches!(
            policy.upgrade(999).await,
            Err(SharedropError::NotFound(_))
        ));
        assert!(matches!(
            policy.status(999).await,
            Err(SharedropError::NotFound(_))
        ));
    }
}
