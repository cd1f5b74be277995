use thiserror::Error;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Contract ABI missing required functions: {0}")]
    Abi(String),

    #[error("Chain error: {0}")]
    Chain(String),

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("Execution failed for payment {index}: {reason}")]
    ExecutionFailed { index: u64, reason: String },
}

/// Wallet-linking flow errors. Each collapses to a single short
/// user-visible message; the underlying cause is logged, never exposed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("caller has no resolvable identity")]
    MissingIdentity,

    #[error("invalid private key")]
    InvalidCredential,

    #[error("wallet link failed")]
    LinkFailed,
}

/// Payment scheduling errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("sender has no linked wallet")]
    SenderNotLinked,

    #[error("recipient @{0} has no linked wallet")]
    RecipientNotLinked(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("payment submission failed")]
    SubmissionFailed,
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        AppError::Telegram(format!("HTTP request error: {:?}", error))
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
