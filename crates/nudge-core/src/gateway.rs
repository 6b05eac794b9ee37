use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use nudge_provider::{LlmMessage, LlmProvider, LlmRequest};
use nudge_schema::{CalendarEvent, Message, Recurrence, Reminder, Sender};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::CoreError;

const RESPONSE_MAX_TOKENS: u32 = 2000;
const RESPONSE_TEMPERATURE: f32 = 0.7;
const AUX_MAX_TOKENS: u32 = 500;
const AUX_TEMPERATURE: f32 = 0.5;

const PROACTIVE_PROMPT: &str = "Act as a proactive assistant. Analyze the conversation and \
    suggest a relevant proactive message that would be helpful to the user. The message should \
    be concise and relevant to their current context or needs. If nothing is worth saying, \
    reply with an empty message.";

const NOTIFICATION_PROMPT: &str = "Rewrite the following as a short, friendly notification \
    for the user. Reply with the notification text only.";

const REMINDER_PROMPT: &str = "Extract a reminder from the user's message. Reply with a single \
    JSON object with the fields: title (string), description (string, optional), date \
    (YYYY-MM-DD), time (HH:MM:SS), recurrence (one of \"once\", \"daily\", \"weekly\", \
    \"monthly\"). Reply with JSON only, no prose.";

const EVENT_PROMPT: &str = "Extract a calendar event from the user's message. Reply with a \
    single JSON object with the fields: title (string), description (string, optional), start \
    (RFC 3339 timestamp), end (RFC 3339 timestamp), location (string, optional). Reply with \
    JSON only, no prose.";

/// Stateless per-call facade over the model provider. Response
/// generation fails loudly; every other operation degrades to
/// "nothing happened".
pub struct AiGateway {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl AiGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// The assistant's reply to the conversation so far. Failure here is
    /// fatal to the cycle and must be surfaced by the caller.
    pub async fn generate_response(&self, history: &[Message]) -> Result<String, CoreError> {
        let req = LlmRequest {
            model: self.model.clone(),
            system: None,
            messages: map_history(history),
            max_tokens: RESPONSE_MAX_TOKENS,
            temperature: RESPONSE_TEMPERATURE,
        };
        let resp = self
            .provider
            .chat(req)
            .await
            .map_err(|e| CoreError::Generation(e.to_string()))?;
        Ok(resp.text)
    }

    /// A bot-initiated follow-up. Empty text means "nothing to say" and
    /// is not an error.
    pub async fn generate_proactive_message(
        &self,
        history: &[Message],
    ) -> Result<String, CoreError> {
        let req = LlmRequest {
            model: self.model.clone(),
            system: Some(PROACTIVE_PROMPT.to_string()),
            messages: map_history(history),
            max_tokens: AUX_MAX_TOKENS,
            temperature: AUX_TEMPERATURE,
        };
        let resp = self
            .provider
            .chat(req)
            .await
            .map_err(|e| CoreError::Generation(e.to_string()))?;
        Ok(resp.text)
    }

    /// Best-effort: any failure yields an empty string.
    pub async fn generate_notification(&self, text: &str) -> String {
        match self.provider.chat(self.aux_request(NOTIFICATION_PROMPT, text)).await {
            Ok(resp) => resp.text,
            Err(e) => {
                tracing::warn!("notification generation failed: {e}");
                String::new()
            }
        }
    }

    /// Structured extraction: asks the model for a JSON reminder and
    /// stamps identity and timestamps. A transport failure or malformed
    /// JSON yields `None`, never a corrupted entity.
    pub async fn generate_reminder(&self, text: &str) -> Option<Reminder> {
        match self.provider.chat(self.aux_request(REMINDER_PROMPT, text)).await {
            Ok(resp) => parse_reminder(&resp.text),
            Err(e) => {
                tracing::warn!("reminder extraction failed: {e}");
                None
            }
        }
    }

    pub async fn generate_calendar_event(&self, text: &str) -> Option<CalendarEvent> {
        match self.provider.chat(self.aux_request(EVENT_PROMPT, text)).await {
            Ok(resp) => parse_calendar_event(&resp.text),
            Err(e) => {
                tracing::warn!("calendar event extraction failed: {e}");
                None
            }
        }
    }

    fn aux_request(&self, system: &str, text: &str) -> LlmRequest {
        LlmRequest {
            model: self.model.clone(),
            system: Some(system.to_string()),
            messages: vec![LlmMessage::user(text)],
            max_tokens: AUX_MAX_TOKENS,
            temperature: AUX_TEMPERATURE,
        }
    }
}

/// Map conversation history onto the neutral {user, assistant} role set.
fn map_history(history: &[Message]) -> Vec<LlmMessage> {
    history
        .iter()
        .map(|msg| match msg.sender {
            Sender::User => LlmMessage::user(msg.content.clone()),
            Sender::Bot => LlmMessage::assistant(msg.content.clone()),
        })
        .collect()
}

/// Models often wrap JSON in markdown fences despite instructions.
fn strip_code_fence(text: &str) -> &str {
    let t = text.trim();
    let t = t.strip_prefix("```json").unwrap_or(t);
    let t = t.strip_prefix("```").unwrap_or(t);
    let t = t.strip_suffix("```").unwrap_or(t);
    t.trim()
}

#[derive(Debug, Deserialize)]
struct ReminderDraft {
    title: String,
    #[serde(default)]
    description: Option<String>,
    date: NaiveDate,
    time: NaiveTime,
    #[serde(default)]
    recurrence: Recurrence,
}

fn parse_reminder(text: &str) -> Option<Reminder> {
    let draft: ReminderDraft = serde_json::from_str(strip_code_fence(text)).ok()?;
    let now = Utc::now();
    Some(Reminder {
        id: Uuid::new_v4(),
        title: draft.title,
        description: draft.description,
        date: draft.date,
        time: draft.time,
        recurrence: draft.recurrence,
        is_active: true,
        created_at: now,
        updated_at: now,
    })
}

#[derive(Debug, Deserialize)]
struct CalendarEventDraft {
    title: String,
    #[serde(default)]
    description: Option<String>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    #[serde(default)]
    location: Option<String>,
}

fn parse_calendar_event(text: &str) -> Option<CalendarEvent> {
    let draft: CalendarEventDraft = serde_json::from_str(strip_code_fence(text)).ok()?;
    let now = Utc::now();
    Some(CalendarEvent {
        id: Uuid::new_v4(),
        title: draft.title,
        description: draft.description,
        start: draft.start,
        end: draft.end,
        location: draft.location,
        reminders: vec![],
        created_at: now,
        updated_at: now,
    })
}
