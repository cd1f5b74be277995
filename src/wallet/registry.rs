use std::collections::HashMap;

use ethers::signers::{LocalWallet, Signer};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::LinkError;
use crate::wallet::models::SigningCapability;

/// In-process identity → signing-capability store.
///
/// Injected into the conversation engine and payment scheduler rather than
/// living as a process-global map. Per-identity mutation is serialized by
/// the lock; different identities never need cross-ordering.
pub struct WalletRegistry {
    capabilities: RwLock<HashMap<String, SigningCapability>>,
    chain_id: u64,
}

impl WalletRegistry {
    pub fn new(chain_id: u64) -> Self {
        Self {
            capabilities: RwLock::new(HashMap::new()),
            chain_id,
        }
    }

    /// Register the shared demo signer for an identity
    pub async fn link_shared_demo(&self, identity: &str) {
        let mut capabilities = self.capabilities.write().await;
        capabilities.insert(identity.to_string(), SigningCapability::SharedDemo);
        info!("✅ Linked shared demo wallet for @{}", identity);
    }

    /// Register a user-supplied private key for an identity. Malformed
    /// input is rejected without creating an entry.
    pub async fn link_custom(&self, identity: &str, secret: &str) -> Result<(), LinkError> {
        let wallet = secret
            .trim()
            .parse::<LocalWallet>()
            .map_err(|e| {
                debug!("Rejected private key for @{}: {}", identity, e);
                LinkError::InvalidCredential
            })?
            .with_chain_id(self.chain_id);

        let mut capabilities = self.capabilities.write().await;
        capabilities.insert(identity.to_string(), SigningCapability::Custom(wallet));
        info!("✅ Linked custom wallet for @{}", identity);
        Ok(())
    }

    /// Capability registered for an identity, if any
    pub async fn capability(&self, identity: &str) -> Option<SigningCapability> {
        let capabilities = self.capabilities.read().await;
        capabilities.get(identity).cloned()
    }

    pub async fn is_linked(&self, identity: &str) -> bool {
        let capabilities = self.capabilities.read().await;
        capabilities.contains_key(identity)
    }
}
