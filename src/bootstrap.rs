use std::sync::Arc;

use ethers::abi::Abi;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use tracing::info;

use crate::bot::{Dispatcher, TelegramClient};
use crate::config::Config;
use crate::conversation::ConversationEngine;
use crate::error::{AppError, AppResult};
use crate::gateway::{evm, ChainGateway, EvmGateway};
use crate::reconciler::{Reconciler, ReconcilerConfig};
use crate::scheduler::PaymentScheduler;
use crate::wallet::WalletRegistry;

pub struct AppState {
    pub dispatcher: Dispatcher,
    pub reconciler: Reconciler,
}

pub async fn initialize_app_state(config: &Config) -> AppResult<AppState> {
    info!("Initializing application components ...");

    let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
        .map_err(|e| AppError::Config(format!("invalid RPC_URL: {}", e)))?;
    let chain_id = provider
        .get_chainid()
        .await
        .map_err(|e| AppError::Chain(format!("failed to query chain id: {}", e)))?
        .as_u64();
    info!("✅ Connected to RPC endpoint (chain id {})", chain_id);

    let contract_address = config
        .contract_address
        .parse::<Address>()
        .map_err(|e| AppError::Config(format!("invalid CONTRACT_ADDRESS: {}", e)))?;

    let abi_json = std::fs::read_to_string(&config.abi_path).map_err(|e| {
        AppError::Config(format!("cannot read ABI file {}: {}", config.abi_path, e))
    })?;
    let abi: Abi = serde_json::from_str(&abi_json).map_err(|e| {
        AppError::Config(format!("invalid ABI file {}: {}", config.abi_path, e))
    })?;
    evm::verify_abi(&abi)?;
    info!("✅ Contract ABI verified at {:?}", contract_address);

    let demo_wallet = config
        .demo_wallet_key
        .parse::<LocalWallet>()
        .map_err(|e| AppError::Config(format!("invalid PRIVATE_KEY: {}", e)))?
        .with_chain_id(chain_id);
    info!("✅ Shared demo wallet ready: {:?}", demo_wallet.address());

    let gateway: Arc<dyn ChainGateway> =
        Arc::new(EvmGateway::new(provider, abi, contract_address, demo_wallet));

    let registry = Arc::new(WalletRegistry::new(chain_id));
    info!("✅ Wallet registry initialized (in-memory, lost on restart)");

    let engine = Arc::new(ConversationEngine::new(registry.clone(), gateway.clone()));
    let scheduler = Arc::new(PaymentScheduler::new(
        registry,
        gateway.clone(),
        config.explorer_url.clone(),
    ));

    let reconciler = Reconciler::new(
        gateway,
        ReconcilerConfig {
            interval_secs: config.reconcile_interval_secs,
            max_in_flight: config.reconcile_max_in_flight,
        },
    );

    let client = TelegramClient::new(&config.bot_token)?;
    let dispatcher = Dispatcher::new(client, engine, scheduler);

    info!("✅ All components initialized");
    Ok(AppState {
        dispatcher,
        reconciler,
    })
}
