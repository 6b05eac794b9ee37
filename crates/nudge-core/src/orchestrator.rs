use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use uuid::Uuid;

use nudge_schema::{
    CalendarEvent, ConversationStatus, Message, MessageKind, Reminder, UserPreferences,
};
use nudge_store::EntityStore;

use crate::error::CoreError;
use crate::gateway::AiGateway;
use crate::policy::{decide, Action};
use crate::proactive::{ProactiveScheduler, DEFAULT_QUIET_PERIOD};

/// Snapshot handed to the consumer. Mirrors the store plus the
/// transient status.
#[derive(Debug, Clone)]
pub struct ChatState {
    pub messages: Vec<Message>,
    pub reminders: Vec<Reminder>,
    pub calendar_events: Vec<CalendarEvent>,
    pub preferences: UserPreferences,
    pub is_typing: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// The stateful controller. All collaborators are injected; the
/// orchestrator is the only writer to the store. No operation lets a
/// failure escape as a panic or error return: callers observe state.
pub struct Orchestrator {
    store: Arc<dyn EntityStore>,
    gateway: Arc<AiGateway>,
    scheduler: ProactiveScheduler,
    status: RwLock<ConversationStatus>,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn EntityStore>, gateway: Arc<AiGateway>) -> Self {
        Self::with_quiet_period(store, gateway, DEFAULT_QUIET_PERIOD)
    }

    pub fn with_quiet_period(
        store: Arc<dyn EntityStore>,
        gateway: Arc<AiGateway>,
        quiet_period: Duration,
    ) -> Self {
        let scheduler = ProactiveScheduler::new(gateway.clone(), store.clone(), quiet_period);
        Self {
            store,
            gateway,
            scheduler,
            status: RwLock::new(ConversationStatus::default()),
        }
    }

    pub async fn state(&self) -> ChatState {
        let status = self.status.read().await.clone();
        ChatState {
            messages: self.store.list_messages().await.unwrap_or_default(),
            reminders: self.store.list_reminders().await.unwrap_or_default(),
            calendar_events: self.store.list_calendar_events().await.unwrap_or_default(),
            preferences: self.store.preferences().await.unwrap_or_default(),
            is_typing: status.is_typing,
            is_loading: status.is_loading,
            error: status.error,
        }
    }

    /// One message-submission cycle: optimistic append, policy
    /// evaluation, primary response (fatal on failure), then independent
    /// best-effort extractions.
    pub async fn add_message(&self, message: Message) {
        // Newer activity supersedes any pending proactive follow-up.
        self.scheduler.cancel_pending().await;

        {
            let mut status = self.status.write().await;
            status.is_typing = true;
            status.error = None;
        }

        let content = message.content.clone();
        let kind = message.kind;
        if let Err(e) = self.store.append_message(message).await {
            self.fail(CoreError::Storage(e.to_string())).await;
            return;
        }

        let actions = decide(kind, &content);

        if actions.contains(&Action::Respond) {
            let history = match self.store.list_messages().await {
                Ok(history) => history,
                Err(e) => {
                    self.fail(CoreError::Storage(e.to_string())).await;
                    return;
                }
            };
            match self.gateway.generate_response(&history).await {
                Ok(text) => {
                    if let Err(e) = self
                        .store
                        .append_message(Message::bot(text, MessageKind::Text))
                        .await
                    {
                        self.fail(CoreError::Storage(e.to_string())).await;
                        return;
                    }
                    self.scheduler.schedule().await;
                }
                // The primary response is the one failure the user sees;
                // it aborts the rest of the cycle.
                Err(e) => {
                    self.fail(e).await;
                    return;
                }
            }
        }

        let notify = async {
            if actions.contains(&Action::Notify) {
                let text = self.gateway.generate_notification(&content).await;
                if !text.trim().is_empty() {
                    if let Err(e) = self
                        .store
                        .append_message(Message::bot(text, MessageKind::Notification))
                        .await
                    {
                        tracing::warn!("failed to append notification: {e}");
                    }
                }
            }
        };
        let extract_reminder = async {
            if actions.contains(&Action::ExtractReminder) {
                if let Some(reminder) = self.gateway.generate_reminder(&content).await {
                    if let Err(e) = self.store.upsert_reminder(reminder).await {
                        tracing::warn!("failed to store extracted reminder: {e}");
                    }
                }
            }
        };
        let extract_event = async {
            if actions.contains(&Action::ExtractEvent) {
                if let Some(event) = self.gateway.generate_calendar_event(&content).await {
                    if let Err(e) = self.store.upsert_calendar_event(event).await {
                        tracing::warn!("failed to store extracted event: {e}");
                    }
                }
            }
        };
        tokio::join!(notify, extract_reminder, extract_event);

        self.status.write().await.is_typing = false;
    }

    pub async fn add_reminder(&self, reminder: Reminder) {
        let result = self.store.upsert_reminder(reminder).await;
        self.settle(result).await;
    }

    pub async fn update_reminder(&self, reminder: Reminder) {
        let result = self.store.upsert_reminder(reminder).await;
        self.settle(result).await;
    }

    pub async fn delete_reminder(&self, id: Uuid) {
        let result = self.store.delete_reminder(id).await;
        self.settle(result).await;
    }

    pub async fn add_calendar_event(&self, event: CalendarEvent) {
        let result = self.store.upsert_calendar_event(event).await;
        self.settle(result).await;
    }

    pub async fn update_calendar_event(&self, event: CalendarEvent) {
        let result = self.store.upsert_calendar_event(event).await;
        self.settle(result).await;
    }

    pub async fn delete_calendar_event(&self, id: Uuid) {
        let result = self.store.delete_calendar_event(id).await;
        self.settle(result).await;
    }

    pub async fn update_preferences(&self, patch: UserPreferences) {
        let result = self.store.merge_preferences(patch).await;
        self.settle(result).await;
    }

    pub async fn set_error(&self, error: Option<String>) {
        self.status.write().await.error = error;
    }

    async fn fail(&self, err: CoreError) {
        tracing::warn!("conversation cycle failed: {err}");
        let mut status = self.status.write().await;
        status.error = Some(err.to_string());
        status.is_typing = false;
    }

    /// Pass-through resolution: a failure becomes the held error, a
    /// success clears it.
    async fn settle<T>(&self, result: anyhow::Result<T>) {
        match result {
            Ok(_) => self.status.write().await.error = None,
            Err(e) => {
                let err = CoreError::Storage(e.to_string());
                tracing::warn!("{err}");
                self.status.write().await.error = Some(err.to_string());
            }
        }
    }
}
