use attestor_chain::StakeRegistry;
use attestor_crypto::BlsKeypair;
use attestor_types::{OperatorInfo, Result};
use std::collections::HashMap;
use tracing::info;

/// Self-register with the stake registry if not already present. Safe to
/// call on every startup.
pub async fn ensure_registered(
    registry: &dyn StakeRegistry,
    keypair: &BlsKeypair,
    stake_per_quorum: HashMap<u8, u128>,
) -> Result<()> {
    let operator_id = keypair.operator_id();
    if registry.operator_info(&operator_id).await?.is_some() {
        info!(operator_id = %operator_id, "Operator already registered");
        return Ok(());
    }

    registry
        .ensure_registered(OperatorInfo {
            operator_id,
            pubkey_g1: keypair.public_g1.clone(),
            pubkey_g2: keypair.public_g2.clone(),
            stake_per_quorum,
        })
        .await?;
    info!(operator_id = %operator_id, "Operator registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use attestor_chain::MemoryRegistry;
    use attestor_crypto::{BlsKeypair, BlsSecretKey, DevBls};

    #[tokio::test]
    async fn test_registration_is_idempotent() {
        let scheme = DevBls;
        let keypair = BlsKeypair::from_secret(&scheme, BlsSecretKey::from_bytes([1; 32]));
        let registry = MemoryRegistry::new(vec![]);

        let stakes: HashMap<u8, u128> = [(0u8, 60u128)].into_iter().collect();
        ensure_registered(&registry, &keypair, stakes.clone())
            .await
            .unwrap();
        ensure_registered(&registry, &keypair, stakes).await.unwrap();

        let info = registry
            .operator_info(&keypair.operator_id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info.stake_on(0), 60);
    }
}
