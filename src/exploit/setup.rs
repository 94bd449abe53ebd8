use alloy_primitives::{Address, Bytes};
use tracing::info;

use crate::onchain::{random_constructor_args, ContractArtifact, Ledger, TransportError};

/// A freshly deployed target and the secrets it was constructed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedTarget {
    pub address: Address,
    pub owner: Address,
    /// The `bytes32[3]` constructor arguments, in order
    pub constructor_args: Vec<Bytes>,
}

/// Deploy the target with three random `bytes32` values as its private data.
pub async fn deploy_target(
    ledger: &dyn Ledger,
    artifact: &ContractArtifact,
    owner: Address,
) -> Result<DeployedTarget, TransportError> {
    let constructor_args = random_constructor_args();
    let address = ledger.deploy(artifact, &constructor_args, owner).await?;
    info!(target: "slotbreach::setup", contract = %artifact.name, %address, %owner, "target deployed");
    Ok(DeployedTarget { address, owner, constructor_args })
}

/// Deploy the forwarding contract used by [`super::ProxyUnlock`].
pub async fn deploy_hacker(
    ledger: &dyn Ledger,
    artifact: &ContractArtifact,
    attacker: Address,
) -> Result<Address, TransportError> {
    let address = ledger.deploy(artifact, &[], attacker).await?;
    info!(target: "slotbreach::setup", contract = %artifact.name, %address, %attacker, "proxy deployed");
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onchain::{InMemoryLedger, HACKER_CONTRACT, PRIVACY_CONTRACT};

    #[tokio::test]
    async fn test_deploy_target_keeps_its_secrets() {
        let ledger = InMemoryLedger::new();
        let owner = Address::repeat_byte(0x11);
        let deployed = deploy_target(&ledger, &ContractArtifact::named(PRIVACY_CONTRACT), owner)
            .await
            .unwrap();

        assert_eq!(deployed.address, owner.create(0));
        assert_eq!(deployed.constructor_args.len(), 3);
        let slot = ledger
            .read_slot(deployed.address, crate::onchain::privacy_slots::KEY)
            .await
            .unwrap();
        assert_eq!(slot.as_slice(), deployed.constructor_args[2].as_ref());
    }

    #[tokio::test]
    async fn test_deploy_hacker_accepts_hacker_and_rejects_other_artifacts() {
        let ledger = InMemoryLedger::new();
        let attacker = Address::repeat_byte(0x22);
        assert!(deploy_hacker(&ledger, &ContractArtifact::named(HACKER_CONTRACT), attacker)
            .await
            .is_ok());
        assert!(matches!(
            deploy_hacker(&ledger, &ContractArtifact::named(PRIVACY_CONTRACT), attacker).await,
            Err(TransportError::Deploy { .. })
        ));
    }
}
