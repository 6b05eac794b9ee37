use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use nudge_schema::{CalendarEvent, Message, Reminder, UserPreferences};

/// Owner of all conversation entities. The orchestrator is the only
/// writer; each operation is atomic with respect to the others so
/// concurrent completions cannot lose updates.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn append_message(&self, message: Message) -> Result<()>;
    /// Current snapshot, in insertion (completion) order.
    async fn list_messages(&self) -> Result<Vec<Message>>;

    /// Insert or replace by id. Creation stamps `created_at` and
    /// `updated_at`; replacing an existing id keeps `created_at` and
    /// restamps `updated_at`.
    async fn upsert_reminder(&self, reminder: Reminder) -> Result<()>;
    /// Returns whether anything was removed. Deleting an unknown id is a
    /// no-op, not an error.
    async fn delete_reminder(&self, id: Uuid) -> Result<bool>;
    async fn list_reminders(&self) -> Result<Vec<Reminder>>;

    async fn upsert_calendar_event(&self, event: CalendarEvent) -> Result<()>;
    async fn delete_calendar_event(&self, id: Uuid) -> Result<bool>;
    async fn list_calendar_events(&self) -> Result<Vec<CalendarEvent>>;

    /// Partial update: fields present in the patch overwrite, absent
    /// fields are left alone.
    async fn merge_preferences(&self, patch: UserPreferences) -> Result<()>;
    async fn preferences(&self) -> Result<UserPreferences>;
}

/// In-memory store. Collections live behind independent locks so a
/// message append never waits on a reminder upsert.
#[derive(Default)]
pub struct MemoryStore {
    messages: RwLock<Vec<Message>>,
    reminders: RwLock<Vec<Reminder>>,
    events: RwLock<Vec<CalendarEvent>>,
    preferences: RwLock<UserPreferences>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Active reminders whose fire time is after `now`.
    pub async fn upcoming_reminders(&self, now: DateTime<Utc>) -> Vec<Reminder> {
        self.reminders
            .read()
            .await
            .iter()
            .filter(|r| r.is_active && r.fires_at() > now)
            .cloned()
            .collect()
    }

    /// Events whose span covers the given date.
    pub async fn events_on(&self, date: NaiveDate) -> Vec<CalendarEvent> {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.start.date_naive() <= date && e.end.date_naive() >= date)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn append_message(&self, message: Message) -> Result<()> {
        self.messages.write().await.push(message);
        Ok(())
    }

    async fn list_messages(&self) -> Result<Vec<Message>> {
        Ok(self.messages.read().await.clone())
    }

    async fn upsert_reminder(&self, mut reminder: Reminder) -> Result<()> {
        let now = Utc::now();
        let mut reminders = self.reminders.write().await;
        match reminders.iter_mut().find(|r| r.id == reminder.id) {
            Some(existing) => {
                reminder.created_at = existing.created_at;
                reminder.updated_at = now;
                *existing = reminder;
            }
            None => {
                reminder.created_at = now;
                reminder.updated_at = now;
                reminders.push(reminder);
            }
        }
        Ok(())
    }

    async fn delete_reminder(&self, id: Uuid) -> Result<bool> {
        let mut reminders = self.reminders.write().await;
        let before = reminders.len();
        reminders.retain(|r| r.id != id);
        Ok(reminders.len() < before)
    }

    async fn list_reminders(&self) -> Result<Vec<Reminder>> {
        Ok(self.reminders.read().await.clone())
    }

    async fn upsert_calendar_event(&self, mut event: CalendarEvent) -> Result<()> {
        let now = Utc::now();
        let mut events = self.events.write().await;
        match events.iter_mut().find(|e| e.id == event.id) {
            Some(existing) => {
                event.created_at = existing.created_at;
                event.updated_at = now;
                *existing = event;
            }
            None => {
                event.created_at = now;
                event.updated_at = now;
                events.push(event);
            }
        }
        Ok(())
    }

    async fn delete_calendar_event(&self, id: Uuid) -> Result<bool> {
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|e| e.id != id);
        Ok(events.len() < before)
    }

    async fn list_calendar_events(&self) -> Result<Vec<CalendarEvent>> {
        Ok(self.events.read().await.clone())
    }

    async fn merge_preferences(&self, patch: UserPreferences) -> Result<()> {
        self.preferences.write().await.merge(patch);
        Ok(())
    }

    async fn preferences(&self) -> Result<UserPreferences> {
        Ok(self.preferences.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use nudge_schema::{MessageKind, Recurrence};

    fn test_reminder(title: &str, fires_in: Duration) -> Reminder {
        let at = Utc::now() + fires_in;
        Reminder {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            date: at.date_naive(),
            time: at.time(),
            recurrence: Recurrence::Once,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_event(title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> CalendarEvent {
        CalendarEvent {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            start,
            end,
            location: None,
            reminders: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn messages_keep_insertion_order() {
        let store = MemoryStore::new();
        store
            .append_message(Message::user("first", MessageKind::Text))
            .await
            .unwrap();
        store
            .append_message(Message::bot("second", MessageKind::Text))
            .await
            .unwrap();

        let messages = store.list_messages().await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[1].content, "second");
    }

    #[tokio::test]
    async fn concurrent_appends_lose_nothing() {
        let store = MemoryStore::shared();
        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append_message(Message::user(format!("msg {i}"), MessageKind::Text))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.list_messages().await.unwrap().len(), 50);
    }

    #[tokio::test]
    async fn upsert_reminder_creates_then_updates() {
        let store = MemoryStore::new();
        let reminder = test_reminder("Call mom", Duration::hours(1));
        let id = reminder.id;

        store.upsert_reminder(reminder.clone()).await.unwrap();
        let stored = store.list_reminders().await.unwrap();
        assert_eq!(stored.len(), 1);
        let created_at = stored[0].created_at;

        let mut updated = reminder;
        updated.title = "Call dad".into();
        store.upsert_reminder(updated).await.unwrap();

        let stored = store.list_reminders().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id);
        assert_eq!(stored[0].title, "Call dad");
        assert_eq!(stored[0].created_at, created_at);
        assert!(stored[0].updated_at >= created_at);
    }

    #[tokio::test]
    async fn delete_reminder_is_idempotent() {
        let store = MemoryStore::new();
        let reminder = test_reminder("Water plants", Duration::hours(2));
        let id = reminder.id;
        store.upsert_reminder(reminder).await.unwrap();

        assert!(store.delete_reminder(id).await.unwrap());
        assert!(!store.delete_reminder(id).await.unwrap());
        assert!(store.list_reminders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_unknown_event_is_a_noop() {
        let store = MemoryStore::new();
        assert!(!store.delete_calendar_event(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn event_with_start_after_end_is_stored_as_given() {
        let store = MemoryStore::new();
        let start = Utc::now();
        let end = start - Duration::hours(1);
        let event = test_event("Inverted", start, end);
        store.upsert_calendar_event(event.clone()).await.unwrap();

        let stored = store.list_calendar_events().await.unwrap();
        assert_eq!(stored[0].start, start);
        assert_eq!(stored[0].end, end);
    }

    #[tokio::test]
    async fn preferences_merge_not_replace() {
        let store = MemoryStore::new();
        store
            .merge_preferences(UserPreferences {
                name: Some("X".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .merge_preferences(UserPreferences {
                timezone: Some("Y".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let prefs = store.preferences().await.unwrap();
        assert_eq!(prefs.name.as_deref(), Some("X"));
        assert_eq!(prefs.timezone.as_deref(), Some("Y"));
    }

    #[tokio::test]
    async fn upcoming_reminders_filters_past_and_inactive() {
        let store = MemoryStore::new();
        let now = Utc::now();

        store
            .upsert_reminder(test_reminder("future", Duration::hours(1)))
            .await
            .unwrap();
        store
            .upsert_reminder(test_reminder("past", Duration::hours(-1)))
            .await
            .unwrap();
        let mut inactive = test_reminder("inactive", Duration::hours(3));
        inactive.is_active = false;
        store.upsert_reminder(inactive).await.unwrap();

        let upcoming = store.upcoming_reminders(now).await;
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].title, "future");
    }

    #[tokio::test]
    async fn events_on_matches_span() {
        let store = MemoryStore::new();
        let start = Utc::now();
        let end = start + Duration::days(2);
        store
            .upsert_calendar_event(test_event("Offsite", start, end))
            .await
            .unwrap();

        let tomorrow = (start + Duration::days(1)).date_naive();
        assert_eq!(store.events_on(tomorrow).await.len(), 1);

        let far = (start + Duration::days(10)).date_naive();
        assert!(store.events_on(far).await.is_empty());
    }
}
