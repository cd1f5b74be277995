use std::collections::HashMap;
use std::sync::Arc;

use ethers::types::Address;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::conversation::models::{ConversationState, EngineReply, Role, Step};
use crate::error::LinkError;
use crate::gateway::ChainGateway;
use crate::wallet::WalletRegistry;

/// Per-chat state machine driving the multi-turn wallet-linking flow:
/// `idle → choosing_role → {sender_key_choice → sender_private_key} |
/// recipient_address → idle`.
///
/// The state map and wallet registry are injected stores; remote calls
/// happen only after the state lock is released.
pub struct ConversationEngine {
    states: RwLock<HashMap<i64, ConversationState>>,
    registry: Arc<WalletRegistry>,
    gateway: Arc<dyn ChainGateway>,
}

/// Deferred effect decided under the state lock, performed after it drops
enum Action {
    Reply(EngineReply),
    LinkDemo { identity: String },
    LinkCustom { identity: String, secret: String },
    LinkRecipient { identity: String, address_text: String },
}

impl ConversationEngine {
    pub fn new(registry: Arc<WalletRegistry>, gateway: Arc<dyn ChainGateway>) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            registry,
            gateway,
        }
    }

    /// Begin (or restart) a linking flow for a chat. A caller without a
    /// resolvable identity fails without creating any state; an existing
    /// flow for the chat is silently overwritten, last write wins.
    pub async fn begin_link(
        &self,
        chat_id: i64,
        identity: Option<&str>,
    ) -> Result<EngineReply, LinkError> {
        let identity = identity.ok_or(LinkError::MissingIdentity)?;

        let mut states = self.states.write().await;
        let previous = states.insert(chat_id, ConversationState::new(identity.to_string()));
        if previous.is_some() {
            debug!("Restarted link flow for chat {}", chat_id);
        }
        Ok(EngineReply::ChooseRole)
    }

    /// Feed a free-text reply into the chat's flow. `None` means the chat
    /// has no active flow and the message is not for us.
    pub async fn handle_reply(
        &self,
        chat_id: i64,
        text: &str,
    ) -> Option<Result<EngineReply, LinkError>> {
        let text = text.trim();

        let action = {
            let mut states = self.states.write().await;
            let state = states.get_mut(&chat_id)?;

            match state.step {
                Step::ChoosingRole => {
                    if text.eq_ignore_ascii_case("sender") {
                        state.step = Step::SenderKeyChoice;
                        state.role = Some(Role::Sender);
                        Action::Reply(EngineReply::ChooseKeySource)
                    } else if text.eq_ignore_ascii_case("recipient") {
                        state.step = Step::RecipientAddress;
                        state.role = Some(Role::Recipient);
                        Action::Reply(EngineReply::EnterAddress)
                    } else {
                        // Self-loop: anything else re-prompts, state intact
                        Action::Reply(EngineReply::ChooseRoleAgain)
                    }
                }
                Step::SenderKeyChoice => {
                    if text.eq_ignore_ascii_case("demo") {
                        let identity = state.identity.clone();
                        states.remove(&chat_id);
                        Action::LinkDemo { identity }
                    } else if text.eq_ignore_ascii_case("custom") {
                        state.step = Step::SenderPrivateKey;
                        Action::Reply(EngineReply::EnterPrivateKey)
                    } else {
                        Action::Reply(EngineReply::ChooseKeySourceAgain)
                    }
                }
                Step::SenderPrivateKey => {
                    // No retry loop on a bad key: the state goes away
                    // whichever way the parse lands.
                    let identity = state.identity.clone();
                    states.remove(&chat_id);
                    Action::LinkCustom {
                        identity,
                        secret: text.to_string(),
                    }
                }
                Step::RecipientAddress => {
                    let identity = state.identity.clone();
                    states.remove(&chat_id);
                    Action::LinkRecipient {
                        identity,
                        address_text: text.to_string(),
                    }
                }
            }
        };

        Some(match action {
            Action::Reply(reply) => Ok(reply),
            Action::LinkDemo { identity } => {
                self.registry.link_shared_demo(&identity).await;
                Ok(EngineReply::SenderLinked)
            }
            Action::LinkCustom { identity, secret } => self
                .registry
                .link_custom(&identity, &secret)
                .await
                .map(|_| EngineReply::SenderLinked),
            Action::LinkRecipient {
                identity,
                address_text,
            } => self.link_recipient(&identity, &address_text).await,
        })
    }

    /// Validate the address and issue the on-chain link transaction. Every
    /// failure collapses to `LinkFailed` for the user; the cause is logged.
    async fn link_recipient(
        &self,
        identity: &str,
        address_text: &str,
    ) -> Result<EngineReply, LinkError> {
        let address = address_text.parse::<Address>().map_err(|e| {
            warn!("Rejected wallet address from @{}: {}", identity, e);
            LinkError::LinkFailed
        })?;

        match self.gateway.link_identity(identity, address).await {
            Ok(tx) => Ok(EngineReply::RecipientLinked { tx }),
            Err(e) => {
                error!("Link transaction failed for @{}: {}", identity, e);
                Err(LinkError::LinkFailed)
            }
        }
    }

    /// Current step of a chat's flow, if one is active
    pub async fn active_step(&self, chat_id: i64) -> Option<Step> {
        let states = self.states.read().await;
        states.get(&chat_id).map(|state| state.step)
    }
}
