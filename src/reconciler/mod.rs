use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};

use crate::error::AppError;
use crate::gateway::ChainGateway;

/// Reconciliation cadence and per-tick concurrency cap
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub interval_secs: u64,
    pub max_in_flight: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            max_in_flight: 4,
        }
    }
}

/// Periodic scan-and-execute loop over the ledger's payment records.
///
/// Each tick re-reads every record and triggers execution of due,
/// unexecuted ones in ascending index order. This is an at-least-once
/// trigger: the contract is relied upon to reject a second execution of
/// an already-executed record, so a losing duplicate attempt is logged
/// and ignored.
pub struct Reconciler {
    gateway: Arc<dyn ChainGateway>,
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(gateway: Arc<dyn ChainGateway>, config: ReconcilerConfig) -> Self {
        Self { gateway, config }
    }

    /// Start the loop in the background. It runs on every tick regardless
    /// of failures in the previous one.
    pub fn start(&self) -> JoinHandle<()> {
        let gateway = self.gateway.clone();
        let config = self.config.clone();

        tokio::spawn(async move {
            info!(
                "⏰ Reconciliation loop started: every {}s, up to {} in-flight executions",
                config.interval_secs, config.max_in_flight
            );
            let mut ticker = interval(Duration::from_secs(config.interval_secs.max(1)));
            loop {
                ticker.tick().await;
                Self::run_tick(&gateway, config.max_in_flight).await;
            }
        })
    }

    /// One reconciliation pass. Per-record failures are logged with the
    /// offending index and never abort the tick. Attempt start order is
    /// ascending by index; `max_in_flight` bounds concurrent remote calls.
    pub async fn run_tick(gateway: &Arc<dyn ChainGateway>, max_in_flight: usize) {
        let count = match gateway.payment_count().await {
            Ok(count) => count,
            Err(e) => {
                error!("Failed to read payment count: {}", e);
                return;
            }
        };

        let now = Utc::now().timestamp() as u64;
        debug!("🔄 Reconciliation tick: {} payment records", count);

        futures::stream::iter(0..count)
            .map(|index| Self::settle_one(gateway.clone(), index, now))
            .buffered(max_in_flight.max(1))
            .collect::<Vec<()>>()
            .await;
    }

    async fn settle_one(gateway: Arc<dyn ChainGateway>, index: u64, now: u64) {
        let record = match gateway.payment(index).await {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to read payment {}: {}", index, e);
                return;
            }
        };

        if !record.is_due(now) {
            return;
        }

        match gateway.execute_payment(index).await {
            Ok(tx) => info!(
                "✅ Executed payment {} -> @{}: {:?}",
                index, record.recipient_handle, tx
            ),
            Err(e) => {
                // A lost execution race surfaces here as a revert; the
                // next tick re-reads the record and moves on.
                let err = AppError::ExecutionFailed {
                    index,
                    reason: e.to_string(),
                };
                error!("{}", err);
            }
        }
    }
}
