use config::ConfigError;

/// Runtime configuration, loaded from the environment at startup.
/// Missing required variables abort the process with a descriptive error.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram Bot API access token
    pub bot_token: String,
    /// JSON-RPC endpoint of the ledger
    pub rpc_url: String,
    /// Private key of the shared demo wallet (also signs bot-side transactions)
    pub demo_wallet_key: String,
    /// Address of the deployed payments contract
    pub contract_address: String,
    /// Path to the contract ABI JSON file
    pub abi_path: String,
    /// Block-explorer base URL for transaction links
    pub explorer_url: String,
    /// Reconciliation tick cadence in seconds
    pub reconcile_interval_secs: u64,
    /// Cap on concurrent in-flight execution attempts per tick
    pub reconcile_max_in_flight: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bot_token: required("BOT_TOKEN")?,
            rpc_url: required("RPC_URL")?,
            demo_wallet_key: required("PRIVATE_KEY")?,
            contract_address: required("CONTRACT_ADDRESS")?,
            abi_path: std::env::var("ABI_PATH").unwrap_or_else(|_| "./abi.json".to_string()),
            explorer_url: std::env::var("EXPLORER_URL")
                .unwrap_or_else(|_| "https://sepolia.mantle.xyz".to_string()),
            reconcile_interval_secs: optional_parsed("RECONCILE_INTERVAL_SECS", 60)?,
            reconcile_max_in_flight: optional_parsed("RECONCILE_MAX_IN_FLIGHT", 4)?,
        })
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::NotFound(name.to_string())),
    }
}

fn optional_parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::Message(format!("invalid value for {}: {}", name, value))),
        Err(_) => Ok(default),
    }
}
