use crate::gateway::TxHash;

/// Role chosen at the start of a linking flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Sender,
    Recipient,
}

/// Position inside the linking flow. `idle` is the absence of a state
/// record, so it has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ChoosingRole,
    SenderKeyChoice,
    SenderPrivateKey,
    RecipientAddress,
}

/// Per-chat conversation record. One instance per chat; created on link
/// initiation, destroyed on completion or failure.
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub identity: String,
    pub step: Step,
    pub role: Option<Role>,
}

impl ConversationState {
    pub fn new(identity: String) -> Self {
        Self {
            identity,
            step: Step::ChoosingRole,
            role: None,
        }
    }
}

/// Typed engine output. Text rendering lives in the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineReply {
    ChooseRole,
    ChooseRoleAgain,
    ChooseKeySource,
    ChooseKeySourceAgain,
    EnterPrivateKey,
    EnterAddress,
    SenderLinked,
    RecipientLinked { tx: TxHash },
}
