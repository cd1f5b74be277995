use std::sync::Arc;

use tokio::time::Duration;
use tracing::{error, info};

use crate::bot::commands::Command;
use crate::bot::telegram::{Message, TelegramClient};
use crate::conversation::{ConversationEngine, EngineReply};
use crate::error::{LinkError, PaymentError};
use crate::scheduler::{PaymentReceipt, PaymentScheduler};

const COMMANDS_TEXT: &str = "Available commands:\n\
/start - Show this list\n\
/link - Link your wallet (sender: enter private key; recipient: enter wallet address)\n\
/sendnow @username amount - Send MNT immediately\n\
/schedule @username amount delay_minutes - Schedule send";

const MISSING_IDENTITY_TEXT: &str = "Please set a Telegram username first";

/// Routes inbound updates into the conversation engine and payment
/// scheduler, and renders their typed replies to chat text.
///
/// Cheap to clone: every update is handled on its own task, so one
/// chat's confirmation wait never stalls other chats or the poll loop.
#[derive(Clone)]
pub struct Dispatcher {
    client: Arc<TelegramClient>,
    engine: Arc<ConversationEngine>,
    scheduler: Arc<PaymentScheduler>,
}

impl Dispatcher {
    pub fn new(
        client: TelegramClient,
        engine: Arc<ConversationEngine>,
        scheduler: Arc<PaymentScheduler>,
    ) -> Self {
        Self {
            client: Arc::new(client),
            engine,
            scheduler,
        }
    }

    /// Long-poll loop. Transport failures are logged and retried on the
    /// next cycle; they never terminate the process.
    pub async fn run(&self) {
        info!("🤖 Bot dispatch loop started");
        let mut offset = 0i64;

        loop {
            let updates = match self.client.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    error!("getUpdates failed: {}", e);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                if let Some(message) = update.message {
                    // One task per update: a flow blocked on an on-chain
                    // confirmation must not hold up polling or other chats.
                    let dispatcher = self.clone();
                    tokio::spawn(async move { dispatcher.handle_message(message).await });
                }
            }
        }
    }

    async fn handle_message(&self, message: Message) {
        let Some(text) = message.text else { return };
        let chat_id = message.chat.id;
        let username = message.from.and_then(|user| user.username);

        if let Some(reply) = self.dispatch_text(chat_id, username.as_deref(), &text).await {
            if let Err(e) = self.client.send_message(chat_id, &reply).await {
                error!("Failed to send reply to chat {}: {}", chat_id, e);
            }
        }
    }

    /// Route one text message and render the reply, if any. `None` means
    /// no command matched and no linking flow is active for the chat.
    async fn dispatch_text(
        &self,
        chat_id: i64,
        username: Option<&str>,
        text: &str,
    ) -> Option<String> {
        match Command::parse(text) {
            Some(command) => self.handle_command(chat_id, username, command).await,
            // Commands take priority; other text feeds an active linking
            // flow. No flow and no command means no reply at all.
            None => self
                .engine
                .handle_reply(chat_id, text)
                .await
                .map(render_link_result),
        }
    }

    async fn handle_command(
        &self,
        chat_id: i64,
        username: Option<&str>,
        command: Command,
    ) -> Option<String> {
        match command {
            Command::Start => Some(COMMANDS_TEXT.to_string()),
            Command::Link => {
                Some(render_link_result(self.engine.begin_link(chat_id, username).await))
            }
            Command::SendNow { recipient, amount } => {
                let Some(sender) = username else {
                    return Some(MISSING_IDENTITY_TEXT.to_string());
                };
                Some(
                    match self.scheduler.send_now(sender, &recipient, &amount).await {
                        Ok(receipt) => render_receipt(&receipt),
                        Err(e) => render_payment_error(&e),
                    },
                )
            }
            Command::Schedule {
                recipient,
                amount,
                delay_minutes,
            } => {
                let Some(sender) = username else {
                    return Some(MISSING_IDENTITY_TEXT.to_string());
                };
                Some(
                    match self
                        .scheduler
                        .schedule_send(sender, &recipient, &amount, delay_minutes)
                        .await
                    {
                        Ok(receipt) => render_receipt(&receipt),
                        Err(e) => render_payment_error(&e),
                    },
                )
            }
        }
    }
}

fn render_link_result(result: Result<EngineReply, LinkError>) -> String {
    match result {
        Ok(reply) => render_reply(&reply),
        Err(e) => render_link_error(&e),
    }
}

fn render_reply(reply: &EngineReply) -> String {
    match reply {
        EngineReply::ChooseRole => {
            "Are you a sender or recipient? Reply with 'sender' or 'recipient'".to_string()
        }
        EngineReply::ChooseRoleAgain => "Reply with 'sender' or 'recipient'".to_string(),
        EngineReply::ChooseKeySource => "Sender selected.\nReply with:\n\
             1️⃣ demo (use bot wallet)\n2️⃣ custom (enter your own private key)"
            .to_string(),
        EngineReply::ChooseKeySourceAgain => "Reply with 'demo' or 'custom'".to_string(),
        EngineReply::EnterPrivateKey => "Enter your private key:".to_string(),
        EngineReply::EnterAddress => "Recipient selected.\n\
             Enter your wallet address to link with your Telegram username:"
            .to_string(),
        EngineReply::SenderLinked => "Wallet linked. You can now send payments.".to_string(),
        EngineReply::RecipientLinked { tx } => format!(
            "Wallet address successfully linked on-chain to your Telegram username\n\
             🔗 Tx Hash:\n{:?}",
            tx
        ),
    }
}

fn render_link_error(error: &LinkError) -> String {
    match error {
        LinkError::MissingIdentity => MISSING_IDENTITY_TEXT.to_string(),
        LinkError::InvalidCredential => "Invalid private key".to_string(),
        LinkError::LinkFailed => "Invalid wallet address or transaction failed".to_string(),
    }
}

fn render_payment_error(error: &PaymentError) -> String {
    match error {
        PaymentError::SenderNotLinked => "Please link your wallet first with /link".to_string(),
        PaymentError::RecipientNotLinked(handle) => {
            format!("@{} has not linked a wallet yet. Ask them to run /link", handle)
        }
        PaymentError::InvalidAmount(reason) => format!("Invalid amount: {}", reason),
        PaymentError::SubmissionFailed => {
            "Payment submission failed. Please try again.".to_string()
        }
    }
}

fn render_receipt(receipt: &PaymentReceipt) -> String {
    match (&receipt.explorer_link, receipt.delay_minutes) {
        (Some(explorer), _) => format!(
            "✅ Payment sent\n\n\
             👤 To: @{}\n\
             💰 Amount: {} MNT\n\
             🔗 Tx Hash:\n{:?}\n\n\
             🌐 View on Explorer:\n{}\n\n\
             ℹ️ Funds will reach the wallet shortly after on-chain execution",
            receipt.recipient_handle, receipt.amount_text, receipt.tx, explorer
        ),
        (None, delay) => format!(
            "Scheduled {} MNT to @{} in {} minutes",
            receipt.amount_text,
            receipt.recipient_handle,
            delay.unwrap_or(0)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockGateway;
    use crate::wallet::WalletRegistry;
    use ethers::types::{Address, H256};
    use tokio::time::Instant;

    fn dispatcher_with(gateway: Arc<MockGateway>) -> Dispatcher {
        let registry = Arc::new(WalletRegistry::new(5003));
        let engine = Arc::new(ConversationEngine::new(registry.clone(), gateway.clone()));
        let scheduler = Arc::new(PaymentScheduler::new(
            registry,
            gateway,
            "https://sepolia.mantle.xyz".to_string(),
        ));
        // The client never touches the network in these tests
        Dispatcher::new(TelegramClient::new("test-token").unwrap(), engine, scheduler)
    }

    #[tokio::test]
    async fn slow_confirmation_does_not_stall_other_chats() {
        let gateway = Arc::new(MockGateway::new());
        *gateway.schedule_delay_ms.lock().unwrap() = 500;
        gateway.link("bob", Address::repeat_byte(0xbe));

        let dispatcher = dispatcher_with(gateway.clone());
        dispatcher
            .dispatch_text(1, Some("alice"), "/link")
            .await
            .unwrap();
        dispatcher
            .dispatch_text(1, Some("alice"), "sender")
            .await
            .unwrap();
        dispatcher
            .dispatch_text(1, Some("alice"), "demo")
            .await
            .unwrap();

        // Chat 1's payment sits in its confirmation wait...
        let slow = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(
                async move { dispatcher.dispatch_text(1, Some("alice"), "/sendnow @bob 1.0").await },
            )
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        // ...while chat 2 is answered immediately.
        let started = Instant::now();
        let reply = dispatcher.dispatch_text(2, Some("carol"), "/start").await;
        assert_eq!(reply.as_deref(), Some(COMMANDS_TEXT));
        assert!(started.elapsed() < Duration::from_millis(200));
        assert!(gateway.schedule_calls.lock().unwrap().is_empty());

        let payment_reply = slow.await.unwrap().unwrap();
        assert!(payment_reply.contains("Payment sent"));
        assert_eq!(gateway.schedule_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unmatched_text_without_flow_gets_no_reply() {
        let dispatcher = dispatcher_with(Arc::new(MockGateway::new()));
        assert_eq!(dispatcher.dispatch_text(1, Some("alice"), "hello").await, None);
        assert_eq!(dispatcher.dispatch_text(1, None, "/sendnow bob").await, None);
    }

    #[test]
    fn recipient_linked_reply_includes_tx_hash() {
        let tx = H256::from_low_u64_be(0xabcd);
        let text = render_reply(&EngineReply::RecipientLinked { tx });
        assert!(text.contains("linked on-chain"));
        assert!(text.contains(&format!("{:?}", tx)));
    }

    #[test]
    fn immediate_receipt_renders_explorer_link() {
        let receipt = PaymentReceipt {
            tx: H256::from_low_u64_be(7),
            recipient_handle: "bob".to_string(),
            amount_text: "1.5".to_string(),
            execute_after: 0,
            delay_minutes: None,
            explorer_link: Some("https://sepolia.mantle.xyz/tx/0x07".to_string()),
        };

        let text = render_receipt(&receipt);
        assert!(text.contains("@bob"));
        assert!(text.contains("1.5 MNT"));
        assert!(text.contains("View on Explorer"));
    }

    #[test]
    fn delayed_receipt_renders_delay() {
        let receipt = PaymentReceipt {
            tx: H256::from_low_u64_be(7),
            recipient_handle: "bob".to_string(),
            amount_text: "0.5".to_string(),
            execute_after: 0,
            delay_minutes: Some(10),
            explorer_link: None,
        };

        assert_eq!(
            render_receipt(&receipt),
            "Scheduled 0.5 MNT to @bob in 10 minutes"
        );
    }

    #[test]
    fn errors_render_single_short_messages() {
        assert_eq!(
            render_payment_error(&PaymentError::RecipientNotLinked("bob".to_string())),
            "@bob has not linked a wallet yet. Ask them to run /link"
        );
        assert_eq!(
            render_link_error(&LinkError::MissingIdentity),
            MISSING_IDENTITY_TEXT
        );
    }
}
