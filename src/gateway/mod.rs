pub mod evm;

pub use evm::EvmGateway;

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;

use crate::error::AppResult;
use crate::wallet::SigningCapability;

/// Handle of a submitted (and confirmed) transaction
pub type TxHash = H256;

/// A scheduled transfer as recorded on the ledger. Always re-read before
/// acting; the ledger is the sole source of truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    pub recipient_handle: String,
    pub recipient_address: Address,
    pub amount: U256,
    pub execute_after: u64,
    pub executed: bool,
}

impl PaymentRecord {
    pub fn is_due(&self, now: u64) -> bool {
        !self.executed && self.execute_after <= now
    }
}

/// Deterministic on-chain key for a chat identity
pub fn identity_hash(handle: &str) -> [u8; 32] {
    keccak256(handle.as_bytes())
}

/// Typed interface to the remote ledger. Writes wait for on-chain
/// confirmation before returning.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Associate an identity with a wallet address on-chain
    async fn link_identity(&self, identity: &str, address: Address) -> AppResult<TxHash>;

    /// Submit a scheduling transaction carrying `amount` as attached value,
    /// signed by the given capability
    async fn schedule_transfer(
        &self,
        signer: &SigningCapability,
        recipient_handle: &str,
        amount: U256,
        execute_after: u64,
    ) -> AppResult<TxHash>;

    /// Look up the wallet linked to an identity hash. The zero address is
    /// the unlinked sentinel.
    async fn resolve_identity(&self, identity_hash: [u8; 32]) -> AppResult<Address>;

    /// Read one payment record by index
    async fn payment(&self, index: u64) -> AppResult<PaymentRecord>;

    /// Total number of payment records
    async fn payment_count(&self) -> AppResult<u64>;

    /// Trigger execution of a due payment
    async fn execute_payment(&self, index: u64) -> AppResult<TxHash>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::error::AppError;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ScheduledCall {
        pub recipient_handle: String,
        pub amount: U256,
        pub execute_after: u64,
    }

    /// In-memory gateway double recording every call it receives
    #[derive(Default)]
    pub struct MockGateway {
        pub linked: Mutex<HashMap<[u8; 32], Address>>,
        pub payments: Mutex<Vec<PaymentRecord>>,
        pub link_calls: Mutex<Vec<(String, Address)>>,
        pub schedule_calls: Mutex<Vec<ScheduledCall>>,
        pub execute_calls: Mutex<Vec<u64>>,
        pub fail_execute: Mutex<HashSet<u64>>,
        pub fail_link: Mutex<bool>,
        /// Simulated confirmation wait applied to `schedule_transfer`
        pub schedule_delay_ms: Mutex<u64>,
    }

    impl MockGateway {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn link(&self, handle: &str, address: Address) {
            self.linked
                .lock()
                .unwrap()
                .insert(identity_hash(handle), address);
        }

        pub fn push_payment(&self, record: PaymentRecord) {
            self.payments.lock().unwrap().push(record);
        }

        fn tx(n: u64) -> TxHash {
            H256::from_low_u64_be(n)
        }
    }

    #[async_trait]
    impl ChainGateway for MockGateway {
        async fn link_identity(&self, identity: &str, address: Address) -> AppResult<TxHash> {
            if *self.fail_link.lock().unwrap() {
                return Err(AppError::Chain("simulated link failure".into()));
            }
            self.link(identity, address);
            let mut calls = self.link_calls.lock().unwrap();
            calls.push((identity.to_string(), address));
            Ok(Self::tx(calls.len() as u64))
        }

        async fn schedule_transfer(
            &self,
            _signer: &SigningCapability,
            recipient_handle: &str,
            amount: U256,
            execute_after: u64,
        ) -> AppResult<TxHash> {
            let delay = *self.schedule_delay_ms.lock().unwrap();
            if delay > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }
            let mut calls = self.schedule_calls.lock().unwrap();
            calls.push(ScheduledCall {
                recipient_handle: recipient_handle.to_string(),
                amount,
                execute_after,
            });
            Ok(Self::tx(calls.len() as u64))
        }

        async fn resolve_identity(&self, identity_hash: [u8; 32]) -> AppResult<Address> {
            Ok(self
                .linked
                .lock()
                .unwrap()
                .get(&identity_hash)
                .copied()
                .unwrap_or_else(Address::zero))
        }

        async fn payment(&self, index: u64) -> AppResult<PaymentRecord> {
            self.payments
                .lock()
                .unwrap()
                .get(index as usize)
                .cloned()
                .ok_or_else(|| AppError::Chain(format!("no payment at index {}", index)))
        }

        async fn payment_count(&self) -> AppResult<u64> {
            Ok(self.payments.lock().unwrap().len() as u64)
        }

        async fn execute_payment(&self, index: u64) -> AppResult<TxHash> {
            self.execute_calls.lock().unwrap().push(index);
            if self.fail_execute.lock().unwrap().contains(&index) {
                return Err(AppError::Chain("simulated execution failure".into()));
            }
            if let Some(record) = self.payments.lock().unwrap().get_mut(index as usize) {
                record.executed = true;
            }
            Ok(Self::tx(index))
        }
    }
}
