//! Structured input events produced by the runtime.

use crate::core::input::{parse_key, parse_text, split_sequences};

/// Input event delivered to components.
///
/// Notes:
/// - `key_id` is a normalized identifier (`enter`, `ctrl+c`, `pageUp`, `ctrl+up`, ...).
/// - Text and paste events carry decoded text so widgets don't have to parse escape sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key { key_id: String },
    Text { text: String },
    Paste { text: String },
    Resize { columns: u16, rows: u16 },
    UnknownRaw { raw: String },
}

impl InputEvent {
    pub fn key(key_id: impl Into<String>) -> Self {
        Self::Key {
            key_id: key_id.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// The key id when this is a key event.
    pub fn key_id(&self) -> Option<&str> {
        match self {
            Self::Key { key_id } => Some(key_id.as_str()),
            _ => None,
        }
    }
}

pub fn parse_input_events(data: &str) -> Vec<InputEvent> {
    if data.is_empty() {
        return Vec::new();
    }

    const PASTE_START: &str = "\x1b[200~";
    const PASTE_END: &str = "\x1b[201~";

    fn parse_non_paste(data: &str, events: &mut Vec<InputEvent>) {
        for sequence in split_sequences(data) {
            if let Some(text) = parse_text(sequence) {
                events.push(InputEvent::Text { text });
            } else if let Some(key_id) = parse_key(sequence) {
                events.push(InputEvent::Key { key_id });
            } else {
                events.push(InputEvent::UnknownRaw {
                    raw: sequence.to_string(),
                });
            }
        }
    }

    let mut events = Vec::new();
    let mut remaining = data;
    loop {
        let Some(start) = remaining.find(PASTE_START) else {
            parse_non_paste(remaining, &mut events);
            break;
        };

        parse_non_paste(&remaining[..start], &mut events);

        let after_start = &remaining[start + PASTE_START.len()..];
        let Some(end_rel) = after_start.find(PASTE_END) else {
            events.push(InputEvent::UnknownRaw {
                raw: remaining[start..].to_string(),
            });
            break;
        };

        events.push(InputEvent::Paste {
            text: after_start[..end_rel].to_string(),
        });

        remaining = &after_start[end_rel + PASTE_END.len()..];
        if remaining.is_empty() {
            break;
        }
    }

    events
}
