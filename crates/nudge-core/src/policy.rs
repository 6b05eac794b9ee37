use nudge_schema::MessageKind;

/// A side-effect a message should trigger. Each fires independently;
/// one failing must not block the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Respond,
    Notify,
    ExtractReminder,
    ExtractEvent,
}

/// Pure trigger table. Substring matches are case-insensitive.
pub fn decide(kind: MessageKind, content: &str) -> Vec<Action> {
    let mut actions = Vec::new();
    match kind {
        MessageKind::Text => {
            actions.push(Action::Respond);
            let lowered = content.to_lowercase();
            if lowered.contains("reminder") {
                actions.push(Action::ExtractReminder);
            }
            if lowered.contains("event") {
                actions.push(Action::ExtractEvent);
            }
        }
        MessageKind::Notification => actions.push(Action::Notify),
        MessageKind::Reminder | MessageKind::Calendar => {}
    }
    actions
}
