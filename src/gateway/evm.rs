use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::Abi;
use ethers::contract::{Contract, FunctionCall};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::LocalWallet;
use ethers::types::{Address, U256};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::gateway::{ChainGateway, PaymentRecord, TxHash};
use crate::wallet::SigningCapability;

/// Contract functions this core depends on, verified against the loaded
/// ABI at startup.
pub const REQUIRED_FUNCTIONS: [&str; 6] = [
    "linkWallet",
    "schedulePayment",
    "payments",
    "executePayment",
    "tgToWallet",
    "paymentsCount",
];

/// Check that every required function is present on the loaded interface.
/// The error enumerates all missing operations so a bad ABI file is
/// diagnosable in one pass.
pub fn verify_abi(abi: &Abi) -> AppResult<()> {
    let missing: Vec<&str> = REQUIRED_FUNCTIONS
        .iter()
        .filter(|name| abi.function(name).is_err())
        .copied()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Abi(missing.join(", ")))
    }
}

type BotClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Gateway to the payments contract over JSON-RPC.
///
/// Reads go through a plain provider; link and execute transactions are
/// signed by the bot's demo wallet, scheduling transactions by whichever
/// capability the sender registered.
pub struct EvmGateway {
    provider: Provider<Http>,
    abi: Abi,
    address: Address,
    bot: Contract<BotClient>,
    reader: Contract<Provider<Http>>,
}

impl EvmGateway {
    /// `abi` must already have passed [`verify_abi`]; `demo_wallet` must
    /// carry the target chain id.
    pub fn new(provider: Provider<Http>, abi: Abi, address: Address, demo_wallet: LocalWallet) -> Self {
        let bot_client = Arc::new(SignerMiddleware::new(provider.clone(), demo_wallet));
        let bot = Contract::new(address, abi.clone(), bot_client);
        let reader = Contract::new(address, abi.clone(), Arc::new(provider.clone()));
        Self {
            provider,
            abi,
            address,
            bot,
            reader,
        }
    }
}

fn abi_error(e: ethers::abi::AbiError) -> AppError {
    AppError::Chain(format!("ABI encoding error: {}", e))
}

/// Submit a prepared call and wait for its confirmation
async fn send_and_confirm<M: Middleware + 'static>(
    call: FunctionCall<Arc<M>, M, ()>,
    context: &str,
) -> AppResult<TxHash> {
    let pending = call
        .send()
        .await
        .map_err(|e| AppError::Chain(format!("{}: {}", context, e)))?;
    let tx_hash = *pending;

    let receipt = pending
        .await
        .map_err(|e| AppError::Chain(format!("{}: confirmation failed: {}", context, e)))?
        .ok_or_else(|| AppError::Chain(format!("{}: transaction dropped from mempool", context)))?;

    if receipt.status == Some(0u64.into()) {
        return Err(AppError::Chain(format!("{}: transaction reverted", context)));
    }

    debug!(
        "✓ {} confirmed in block {:?}: {:?}",
        context, receipt.block_number, tx_hash
    );
    Ok(tx_hash)
}

#[async_trait]
impl ChainGateway for EvmGateway {
    async fn link_identity(&self, identity: &str, address: Address) -> AppResult<TxHash> {
        let call = self
            .bot
            .method::<_, ()>("linkWallet", (identity.to_string(), address))
            .map_err(abi_error)?;
        send_and_confirm(call, "linkWallet").await
    }

    async fn schedule_transfer(
        &self,
        signer: &SigningCapability,
        recipient_handle: &str,
        amount: U256,
        execute_after: u64,
    ) -> AppResult<TxHash> {
        let args = (
            recipient_handle.to_string(),
            Address::zero(),
            amount,
            U256::from(execute_after),
        );

        match signer {
            SigningCapability::SharedDemo => {
                let call = self
                    .bot
                    .method::<_, ()>("schedulePayment", args)
                    .map_err(abi_error)?
                    .value(amount);
                send_and_confirm(call, "schedulePayment").await
            }
            SigningCapability::Custom(wallet) => {
                let client = Arc::new(SignerMiddleware::new(self.provider.clone(), wallet.clone()));
                let contract = Contract::new(self.address, self.abi.clone(), client);
                let call = contract
                    .method::<_, ()>("schedulePayment", args)
                    .map_err(abi_error)?
                    .value(amount);
                send_and_confirm(call, "schedulePayment").await
            }
        }
    }

    async fn resolve_identity(&self, identity_hash: [u8; 32]) -> AppResult<Address> {
        let address = self
            .reader
            .method::<_, Address>("tgToWallet", identity_hash)
            .map_err(abi_error)?
            .call()
            .await
            .map_err(|e| AppError::Chain(format!("tgToWallet: {}", e)))?;
        debug!(
            "Resolved identity hash 0x{} -> {:?}",
            hex::encode(identity_hash),
            address
        );
        Ok(address)
    }

    async fn payment(&self, index: u64) -> AppResult<PaymentRecord> {
        let (recipient_handle, recipient_address, amount, execute_after, executed) = self
            .reader
            .method::<_, (String, Address, U256, U256, bool)>("payments", U256::from(index))
            .map_err(abi_error)?
            .call()
            .await
            .map_err(|e| AppError::Chain(format!("payments({}): {}", index, e)))?;

        Ok(PaymentRecord {
            recipient_handle,
            recipient_address,
            amount,
            execute_after: execute_after.as_u64(),
            executed,
        })
    }

    async fn payment_count(&self) -> AppResult<u64> {
        let count = self
            .reader
            .method::<_, U256>("paymentsCount", ())
            .map_err(abi_error)?
            .call()
            .await
            .map_err(|e| AppError::Chain(format!("paymentsCount: {}", e)))?;
        Ok(count.as_u64())
    }

    async fn execute_payment(&self, index: u64) -> AppResult<TxHash> {
        let call = self
            .bot
            .method::<_, ()>("executePayment", U256::from(index))
            .map_err(abi_error)?;
        send_and_confirm(call, "executePayment").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abi_with(functions: &[&str]) -> Abi {
        let entries: Vec<serde_json::Value> = functions
            .iter()
            .map(|name| {
                serde_json::json!({
                    "type": "function",
                    "name": name,
                    "inputs": [],
                    "outputs": [],
                    "stateMutability": "nonpayable"
                })
            })
            .collect();
        serde_json::from_value(serde_json::Value::Array(entries)).unwrap()
    }

    #[test]
    fn accepts_abi_with_all_required_functions() {
        let abi = abi_with(&REQUIRED_FUNCTIONS);
        assert!(verify_abi(&abi).is_ok());
    }

    #[test]
    fn rejects_abi_enumerating_missing_functions() {
        let abi = abi_with(&["linkWallet", "payments", "tgToWallet"]);
        let err = verify_abi(&abi).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("schedulePayment"));
        assert!(message.contains("executePayment"));
        assert!(message.contains("paymentsCount"));
        assert!(!message.contains("linkWallet,"));
    }
}
