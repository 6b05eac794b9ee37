use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Notification,
    Reminder,
    Calendar,
}

/// Neutral role used when mapping history onto the model API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A single conversation entry. Immutable once created; ordering is
/// insertion order in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub kind: MessageKind,
    #[serde(default)]
    pub role: Option<Role>,
}

impl Message {
    pub fn user(content: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            sender: Sender::User,
            timestamp: Utc::now(),
            kind,
            role: Some(Role::User),
        }
    }

    pub fn bot(content: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            sender: Sender::Bot,
            timestamp: Utc::now(),
            kind,
            role: Some(Role::Assistant),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    Once,
    Daily,
    Weekly,
    Monthly,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reminder {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reminder {
    /// Combined fire time in UTC, used for "upcoming" queries.
    pub fn fires_at(&self) -> DateTime<Utc> {
        self.date.and_time(self.time).and_utc()
    }
}

/// `start <= end` is the producer's responsibility; events are stored as
/// given either way.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NotificationPreferences {
    #[serde(default)]
    pub reminders: bool,
    #[serde(default)]
    pub updates: bool,
    #[serde(default)]
    pub calendar: bool,
    #[serde(default)]
    pub email: Option<bool>,
    #[serde(default)]
    pub sms: Option<bool>,
    #[serde(default)]
    pub push: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReminderPreferences {
    #[serde(default)]
    pub default_recurrence: Option<Recurrence>,
    #[serde(default)]
    pub default_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CalendarPreferences {
    #[serde(default)]
    pub default_duration_minutes: Option<u32>,
    #[serde(default)]
    pub default_location: Option<String>,
}

/// User preferences are only ever patched, never replaced wholesale.
/// A value of `None` in a patch means "leave unchanged".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserPreferences {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub interests: Option<Vec<String>>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub notification_preferences: Option<NotificationPreferences>,
    #[serde(default)]
    pub reminder_preferences: Option<ReminderPreferences>,
    #[serde(default)]
    pub calendar_preferences: Option<CalendarPreferences>,
}

impl UserPreferences {
    /// Merge a partial update into `self`. Fields present in the patch
    /// overwrite; absent fields keep their current value.
    pub fn merge(&mut self, patch: UserPreferences) {
        if patch.name.is_some() {
            self.name = patch.name;
        }
        if patch.interests.is_some() {
            self.interests = patch.interests;
        }
        if patch.timezone.is_some() {
            self.timezone = patch.timezone;
        }
        if patch.language.is_some() {
            self.language = patch.language;
        }
        if patch.notification_preferences.is_some() {
            self.notification_preferences = patch.notification_preferences;
        }
        if patch.reminder_preferences.is_some() {
            self.reminder_preferences = patch.reminder_preferences;
        }
        if patch.calendar_preferences.is_some() {
            self.calendar_preferences = patch.calendar_preferences;
        }
    }
}

/// Transient conversation status. Not persisted; exactly one error is
/// held at a time and any successful operation clears it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ConversationStatus {
    pub is_typing: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serde_roundtrip() {
        let msg = Message::user("hello", MessageKind::Text);
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content, "hello");
        assert_eq!(back.sender, Sender::User);
        assert_eq!(back.kind, MessageKind::Text);
        assert_eq!(back.role, Some(Role::User));
    }

    #[test]
    fn bot_message_carries_assistant_role() {
        let msg = Message::bot("hi there", MessageKind::Notification);
        assert_eq!(msg.sender, Sender::Bot);
        assert_eq!(msg.role, Some(Role::Assistant));
        assert_eq!(msg.kind, MessageKind::Notification);
    }

    #[test]
    fn message_role_defaults_to_none() {
        let json = serde_json::json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "content": "hi",
            "sender": "user",
            "timestamp": "2026-01-01T10:00:00Z",
            "kind": "text"
        });
        let msg: Message = serde_json::from_value(json).unwrap();
        assert_eq!(msg.role, None);
    }

    #[test]
    fn reminder_defaults() {
        let json = serde_json::json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "title": "Call mom",
            "date": "2026-09-01",
            "time": "18:30:00",
            "created_at": "2026-08-29T10:00:00Z",
            "updated_at": "2026-08-29T10:00:00Z"
        });
        let reminder: Reminder = serde_json::from_value(json).unwrap();
        assert_eq!(reminder.recurrence, Recurrence::Once);
        assert!(reminder.is_active);
        assert_eq!(reminder.description, None);
    }

    #[test]
    fn reminder_fires_at_combines_date_and_time() {
        let json = serde_json::json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "title": "Standup",
            "date": "2026-09-01",
            "time": "09:00:00",
            "created_at": "2026-08-29T10:00:00Z",
            "updated_at": "2026-08-29T10:00:00Z"
        });
        let reminder: Reminder = serde_json::from_value(json).unwrap();
        assert_eq!(
            reminder.fires_at().to_rfc3339(),
            "2026-09-01T09:00:00+00:00"
        );
    }

    #[test]
    fn calendar_event_reminders_default_empty() {
        let json = serde_json::json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "title": "Planning",
            "start": "2026-09-01T10:00:00Z",
            "end": "2026-09-01T11:00:00Z",
            "created_at": "2026-08-29T10:00:00Z",
            "updated_at": "2026-08-29T10:00:00Z"
        });
        let event: CalendarEvent = serde_json::from_value(json).unwrap();
        assert!(event.reminders.is_empty());
        assert_eq!(event.location, None);
    }

    #[test]
    fn preferences_merge_keeps_unpatched_fields() {
        let mut prefs = UserPreferences::default();
        prefs.merge(UserPreferences {
            name: Some("X".into()),
            ..Default::default()
        });
        prefs.merge(UserPreferences {
            timezone: Some("Y".into()),
            ..Default::default()
        });
        assert_eq!(prefs.name.as_deref(), Some("X"));
        assert_eq!(prefs.timezone.as_deref(), Some("Y"));
    }

    #[test]
    fn preferences_merge_overwrites_patched_fields() {
        let mut prefs = UserPreferences {
            name: Some("old".into()),
            language: Some("en".into()),
            ..Default::default()
        };
        prefs.merge(UserPreferences {
            name: Some("new".into()),
            ..Default::default()
        });
        assert_eq!(prefs.name.as_deref(), Some("new"));
        assert_eq!(prefs.language.as_deref(), Some("en"));
    }

    #[test]
    fn conversation_status_default_is_idle() {
        let status = ConversationStatus::default();
        assert!(!status.is_typing);
        assert!(!status.is_loading);
        assert_eq!(status.error, None);
    }
}
