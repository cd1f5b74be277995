pub mod models;
pub mod registry;

pub use models::SigningCapability;
pub use registry::WalletRegistry;
