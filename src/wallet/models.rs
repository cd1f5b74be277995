use ethers::signers::LocalWallet;

/// The ability to authorize a transaction on behalf of an identity.
///
/// Held in memory only and lost on restart; users re-link after a restart.
/// This is a documented limitation, not a bug.
#[derive(Clone)]
pub enum SigningCapability {
    /// The bot's shared demo wallet signs on the user's behalf
    SharedDemo,
    /// A user-supplied private key
    Custom(LocalWallet),
}

// Manual impl so a custom signing key can never end up in a log line.
impl std::fmt::Debug for SigningCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningCapability::SharedDemo => write!(f, "SharedDemo"),
            SigningCapability::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}
