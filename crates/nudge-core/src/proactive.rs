use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use nudge_schema::{Message, MessageKind};
use nudge_store::EntityStore;

use crate::gateway::AiGateway;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(90);

/// Deferred, cancellable follow-up task. At most one task is pending;
/// scheduling replaces and cancels the previous one, so newer activity
/// always supersedes older.
pub struct ProactiveScheduler {
    gateway: Arc<AiGateway>,
    store: Arc<dyn EntityStore>,
    quiet_period: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl ProactiveScheduler {
    pub fn new(
        gateway: Arc<AiGateway>,
        store: Arc<dyn EntityStore>,
        quiet_period: Duration,
    ) -> Self {
        Self {
            gateway,
            store,
            quiet_period,
            pending: Mutex::new(None),
        }
    }

    /// Cancel the pending task, if any. Best-effort: a task already past
    /// its gateway call re-checks the token before appending.
    pub async fn cancel_pending(&self) {
        if let Some(token) = self.pending.lock().await.take() {
            token.cancel();
        }
    }

    /// Arm a new quiet-period timer, superseding any pending task.
    pub async fn schedule(&self) {
        let token = CancellationToken::new();
        if let Some(previous) = self.pending.lock().await.replace(token.clone()) {
            previous.cancel();
        }

        let gateway = self.gateway.clone();
        let store = self.store.clone();
        let quiet_period = self.quiet_period;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(quiet_period) => {}
            }

            let history = match store.list_messages().await {
                Ok(history) => history,
                Err(e) => {
                    tracing::warn!("proactive task could not read history: {e}");
                    return;
                }
            };

            let text = match gateway.generate_proactive_message(&history).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("proactive generation failed: {e}");
                    return;
                }
            };

            // A cancellation that raced the gateway call discards the result.
            if token.is_cancelled() || text.trim().is_empty() {
                return;
            }

            tracing::info!("appending proactive message");
            if let Err(e) = store
                .append_message(Message::bot(text, MessageKind::Notification))
                .await
            {
                tracing::warn!("failed to append proactive message: {e}");
            }
        });
    }
}
