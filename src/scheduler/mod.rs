pub mod amount;

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use crate::error::PaymentError;
use crate::gateway::{identity_hash, ChainGateway, TxHash};
use crate::scheduler::amount::parse_native_amount;
use crate::wallet::WalletRegistry;

/// Confirmed scheduling transaction, ready for rendering
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub tx: TxHash,
    pub recipient_handle: String,
    pub amount_text: String,
    pub execute_after: u64,
    pub delay_minutes: Option<u64>,
    pub explorer_link: Option<String>,
}

/// Exact execution time for a delayed send
pub fn execute_after_at(now: u64, delay_minutes: u64) -> u64 {
    now + delay_minutes * 60
}

/// Handles immediate and delayed send commands: verifies sender linkage,
/// resolves the recipient on-chain, then submits one scheduling
/// transaction signed by the sender's capability. No retries; a failed
/// submission is reported and the user reissues the command.
pub struct PaymentScheduler {
    registry: Arc<WalletRegistry>,
    gateway: Arc<dyn ChainGateway>,
    explorer_url: String,
}

impl PaymentScheduler {
    pub fn new(
        registry: Arc<WalletRegistry>,
        gateway: Arc<dyn ChainGateway>,
        explorer_url: String,
    ) -> Self {
        Self {
            registry,
            gateway,
            explorer_url,
        }
    }

    /// Send immediately: executeAfter = now
    pub async fn send_now(
        &self,
        sender: &str,
        recipient: &str,
        amount_text: &str,
    ) -> Result<PaymentReceipt, PaymentError> {
        let execute_after = Utc::now().timestamp() as u64;
        let tx = self.submit(sender, recipient, amount_text, execute_after).await?;

        Ok(PaymentReceipt {
            tx,
            recipient_handle: recipient.to_string(),
            amount_text: amount_text.to_string(),
            execute_after,
            delay_minutes: None,
            explorer_link: Some(format!("{}/tx/{:?}", self.explorer_url, tx)),
        })
    }

    /// Send after a delay: executeAfter = now + delay*60, exactly
    pub async fn schedule_send(
        &self,
        sender: &str,
        recipient: &str,
        amount_text: &str,
        delay_minutes: u64,
    ) -> Result<PaymentReceipt, PaymentError> {
        let execute_after = execute_after_at(Utc::now().timestamp() as u64, delay_minutes);
        let tx = self.submit(sender, recipient, amount_text, execute_after).await?;

        Ok(PaymentReceipt {
            tx,
            recipient_handle: recipient.to_string(),
            amount_text: amount_text.to_string(),
            execute_after,
            delay_minutes: Some(delay_minutes),
            explorer_link: None,
        })
    }

    async fn submit(
        &self,
        sender: &str,
        recipient: &str,
        amount_text: &str,
        execute_after: u64,
    ) -> Result<TxHash, PaymentError> {
        let capability = self
            .registry
            .capability(sender)
            .await
            .ok_or(PaymentError::SenderNotLinked)?;

        let amount = parse_native_amount(amount_text)?;

        // Recipient linkage is checked before any transaction is built.
        let resolved = self
            .gateway
            .resolve_identity(identity_hash(recipient))
            .await
            .map_err(|e| {
                error!("Recipient lookup failed for @{}: {}", recipient, e);
                PaymentError::SubmissionFailed
            })?;
        if resolved.is_zero() {
            return Err(PaymentError::RecipientNotLinked(recipient.to_string()));
        }

        info!(
            "💸 Scheduling transfer @{} -> @{}: {} native units, executeAfter={}",
            sender, recipient, amount, execute_after
        );

        self.gateway
            .schedule_transfer(&capability, recipient, amount, execute_after)
            .await
            .map_err(|e| {
                error!("Payment submission failed for @{}: {}", sender, e);
                PaymentError::SubmissionFailed
            })
    }
}
