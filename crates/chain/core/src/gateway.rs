//! Write-path orchestration: submit an action and await finality.

use std::sync::Arc;

use crate::retry::FinalityPolicy;
use crate::traits::{ActionSubmitter, ReceiptSource, TransportError};
use crate::types::{ActionCall, ExecutionStatus, ReceiptStatus, TxHash, TxReceipt};

/// Terminal failures of the write path.
///
/// `Reverted` and `Timeout` are distinct on purpose: a reverted transaction
/// has a confirmed negative outcome, while a timeout means the outcome is
/// unknown. Callers must not apply partial state on either.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("transaction reverted: {reason}")]
    Reverted { reason: String },

    #[error("transaction not confirmed after {attempts} polls")]
    Timeout { attempts: u32 },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Handle to a submitted, not-yet-final transaction.
#[derive(Debug, Clone)]
pub struct PendingTx {
    pub hash: TxHash,
    pub call: ActionCall,
}

/// Submits player actions and polls for finality with bounded retry.
///
/// This component performs no local state mutation beyond the chain write
/// itself, and does not deduplicate accidental double-submission; the
/// orchestrator's precondition checks run before `submit` is ever called.
#[derive(Clone)]
pub struct TransactionGateway {
    submitter: Arc<dyn ActionSubmitter>,
    receipts: Arc<dyn ReceiptSource>,
    policy: FinalityPolicy,
}

impl TransactionGateway {
    pub fn new(submitter: Arc<dyn ActionSubmitter>, receipts: Arc<dyn ReceiptSource>) -> Self {
        Self {
            submitter,
            receipts,
            policy: FinalityPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FinalityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Submits the action and returns a handle for finality polling.
    pub async fn submit(&self, call: ActionCall) -> Result<PendingTx, GatewayError> {
        let hash = self.submitter.submit(&call).await?;
        tracing::debug!(entrypoint = call.entrypoint(), tx = hash.as_str(), "submitted action");
        Ok(PendingTx { hash, call })
    }

    /// Polls until the transaction is final or the retry budget is spent.
    ///
    /// A receipt whose execution status indicates revert surfaces as
    /// [`GatewayError::Reverted`]; exhausting the poll budget surfaces as
    /// [`GatewayError::Timeout`].
    pub async fn await_finality(&self, pending: &PendingTx) -> Result<TxReceipt, GatewayError> {
        for attempt in 0..self.policy.max_attempts {
            match self.receipts.receipt(&pending.hash).await {
                Ok(ReceiptStatus::Final(receipt)) => {
                    return match receipt.execution_status {
                        ExecutionStatus::Succeeded => Ok(receipt),
                        ExecutionStatus::Reverted { ref reason } => Err(GatewayError::Reverted {
                            reason: reason.clone(),
                        }),
                    };
                }
                Ok(ReceiptStatus::Pending) => {
                    tokio::time::sleep(self.policy.poll_interval).await;
                }
                Err(error) => {
                    tracing::warn!(
                        tx = pending.hash.as_str(),
                        attempt = attempt + 1,
                        max = self.policy.max_attempts,
                        %error,
                        "finality poll failed, retrying"
                    );
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
            }
        }

        Err(GatewayError::Timeout {
            attempts: self.policy.max_attempts,
        })
    }

    /// Convenience: submit and await finality in one step.
    pub async fn execute(&self, call: ActionCall) -> Result<TxReceipt, GatewayError> {
        let pending = self.submit(call).await?;
        self.await_finality(&pending).await
    }
}
