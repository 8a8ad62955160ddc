//! Input widget.

use crate::core::component::Component;
use crate::core::input_event::InputEvent;
use crate::core::text::width::{grapheme_segments, visible_width};

const CURSOR_ON: &str = "\x1b[7m";
const CURSOR_OFF: &str = "\x1b[27m";
const DIM_ON: &str = "\x1b[2m";
const DIM_OFF: &str = "\x1b[22m";

/// Single-line input component with horizontal scrolling.
///
/// A disabled input still renders its value (dimmed, without a cursor) but ignores every edit.
pub struct Input {
    value: String,
    cursor: usize,
    prompt: String,
    placeholder: String,
    disabled: bool,
    on_change: Option<Box<dyn FnMut(&str)>>,
    on_submit: Option<Box<dyn FnMut(String)>>,
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

impl Input {
    pub fn new() -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            prompt: "> ".to_string(),
            placeholder: String::new(),
            disabled: false,
            on_change: None,
            on_submit: None,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the value and move the cursor to the end. Does not fire `on_change`.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.len();
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn set_placeholder(&mut self, placeholder: impl Into<String>) {
        self.placeholder = placeholder.into();
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_on_change(&mut self, handler: Option<Box<dyn FnMut(&str)>>) {
        self.on_change = handler;
    }

    pub fn set_on_submit(&mut self, handler: Option<Box<dyn FnMut(String)>>) {
        self.on_submit = handler;
    }

    fn changed(&mut self) {
        if let Some(handler) = self.on_change.as_mut() {
            handler(&self.value);
        }
    }

    fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.value.insert_str(self.cursor, text);
        self.cursor += text.len();
        self.changed();
    }

    fn previous_grapheme_len(&self) -> usize {
        grapheme_segments(&self.value[..self.cursor])
            .next_back()
            .map_or(0, str::len)
    }

    fn next_grapheme_len(&self) -> usize {
        grapheme_segments(&self.value[self.cursor..])
            .next()
            .map_or(0, str::len)
    }

    fn delete_backward(&mut self) {
        let len = self.previous_grapheme_len();
        if len == 0 {
            return;
        }
        let start = self.cursor - len;
        self.value.replace_range(start..self.cursor, "");
        self.cursor = start;
        self.changed();
    }

    fn delete_forward(&mut self) {
        let len = self.next_grapheme_len();
        if len == 0 {
            return;
        }
        self.value.replace_range(self.cursor..self.cursor + len, "");
        self.changed();
    }

    /// Start of the word before the cursor: skip whitespace, then non-whitespace.
    fn word_start_before_cursor(&self) -> usize {
        let before = &self.value[..self.cursor];
        let trimmed = before.trim_end();
        trimmed
            .char_indices()
            .rev()
            .find(|(_, ch)| ch.is_whitespace())
            .map_or(0, |(idx, ch)| idx + ch.len_utf8())
    }

    /// End of the word after the cursor: skip whitespace, then non-whitespace.
    fn word_end_after_cursor(&self) -> usize {
        let after = &self.value[self.cursor..];
        let leading = after.len() - after.trim_start().len();
        let word = &after[leading..];
        let word_len = word.find(char::is_whitespace).unwrap_or(word.len());
        self.cursor + leading + word_len
    }

    fn delete_word_backward(&mut self) {
        let start = self.word_start_before_cursor();
        if start == self.cursor {
            return;
        }
        self.value.replace_range(start..self.cursor, "");
        self.cursor = start;
        self.changed();
    }

    fn handle_key(&mut self, key_id: &str) {
        match key_id {
            "enter" => {
                let value = self.value.clone();
                if let Some(handler) = self.on_submit.as_mut() {
                    handler(value);
                }
            }
            "backspace" | "ctrl+h" => self.delete_backward(),
            "delete" | "ctrl+d" => self.delete_forward(),
            "ctrl+w" | "alt+backspace" => self.delete_word_backward(),
            "ctrl+u" => {
                if self.cursor > 0 {
                    self.value.replace_range(..self.cursor, "");
                    self.cursor = 0;
                    self.changed();
                }
            }
            "ctrl+k" => {
                if self.cursor < self.value.len() {
                    self.value.truncate(self.cursor);
                    self.changed();
                }
            }
            "left" | "ctrl+b" => self.cursor -= self.previous_grapheme_len(),
            "right" | "ctrl+f" => self.cursor += self.next_grapheme_len(),
            "alt+left" | "ctrl+left" => self.cursor = self.word_start_before_cursor(),
            "alt+right" | "ctrl+right" => self.cursor = self.word_end_after_cursor(),
            "home" | "ctrl+a" => self.cursor = 0,
            "end" | "ctrl+e" => self.cursor = self.value.len(),
            _ => {}
        }
    }

    /// Pick the slice of graphemes to show so the cursor stays visible.
    fn visible_window(&self, available: usize) -> (String, String, String) {
        let before: Vec<&str> = grapheme_segments(&self.value[..self.cursor]).collect();
        let mut after = grapheme_segments(&self.value[self.cursor..]);
        let at_cursor = after.next().unwrap_or(" ").to_string();
        let budget = available.saturating_sub(visible_width(&at_cursor));

        let mut shown_before = Vec::new();
        let mut used = 0;
        for grapheme in before.iter().rev() {
            let width = visible_width(grapheme);
            if used + width > budget {
                break;
            }
            used += width;
            shown_before.push(*grapheme);
        }
        shown_before.reverse();

        let mut shown_after = String::new();
        for grapheme in after {
            let width = visible_width(grapheme);
            if used + width > budget {
                break;
            }
            used += width;
            shown_after.push_str(grapheme);
        }

        (shown_before.concat(), at_cursor, shown_after)
    }
}

impl Component for Input {
    fn render(&mut self, width: usize) -> Vec<String> {
        let prompt = &self.prompt;
        let available = width.saturating_sub(visible_width(prompt));
        if available == 0 {
            return vec![prompt.to_string()];
        }

        if self.value.is_empty() {
            let cursor = if self.disabled {
                String::new()
            } else {
                format!("{CURSOR_ON} {CURSOR_OFF}")
            };
            let placeholder = if self.placeholder.is_empty() {
                String::new()
            } else {
                format!("{DIM_ON}{}{DIM_OFF}", self.placeholder)
            };
            return vec![format!("{prompt}{cursor}{placeholder}")];
        }

        let (before, at_cursor, after) = self.visible_window(available);
        let line = if self.disabled {
            format!("{prompt}{DIM_ON}{before}{at_cursor}{after}{DIM_OFF}")
        } else {
            format!("{prompt}{before}{CURSOR_ON}{at_cursor}{CURSOR_OFF}{after}")
        };
        vec![line]
    }

    fn handle_event(&mut self, event: &InputEvent) {
        if self.disabled {
            return;
        }
        match event {
            InputEvent::Text { text } => self.insert_text(text),
            InputEvent::Paste { text } => {
                let cleaned = text.replace("\r\n", " ").replace(['\r', '\n'], " ");
                self.insert_text(&cleaned);
            }
            InputEvent::Key { key_id } => self.handle_key(key_id),
            _ => {}
        }
    }
}
