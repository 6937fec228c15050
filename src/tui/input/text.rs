use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::util::text::{next_boundary, prev_boundary, word_start_before};

/// Single-line text buffer with a grapheme-aware cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    buffer: String,
    /// Byte offset, always on a grapheme boundary
    cursor: usize,
}

impl TextInput {
    pub fn new(text: impl Into<String>) -> Self {
        let buffer = text.into();
        let cursor = buffer.len();
        TextInput { buffer, cursor }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn set(&mut self, text: impl Into<String>) {
        *self = TextInput::new(text);
    }

    pub fn clear(&mut self) {
        *self = TextInput::default();
    }

    /// Apply an editing key. Returns false for keys that are not edits, so
    /// the caller can handle them (Enter, Esc, Tab, ...).
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('w') if ctrl => {
                let start = word_start_before(&self.buffer, self.cursor);
                self.buffer.replace_range(start..self.cursor, "");
                self.cursor = start;
            }
            KeyCode::Char('u') if ctrl => {
                self.buffer.replace_range(..self.cursor, "");
                self.cursor = 0;
            }
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = self.buffer.len(),
            KeyCode::Char(_) if ctrl => return false,
            KeyCode::Char(c) => {
                self.buffer.insert(self.cursor, c);
                self.cursor += c.len_utf8();
            }
            KeyCode::Backspace => {
                if let Some(prev) = prev_boundary(&self.buffer, self.cursor) {
                    self.buffer.replace_range(prev..self.cursor, "");
                    self.cursor = prev;
                }
            }
            KeyCode::Delete => {
                if let Some(next) = next_boundary(&self.buffer, self.cursor) {
                    self.buffer.replace_range(self.cursor..next, "");
                }
            }
            KeyCode::Left => {
                if let Some(prev) = prev_boundary(&self.buffer, self.cursor) {
                    self.cursor = prev;
                }
            }
            KeyCode::Right => {
                if let Some(next) = next_boundary(&self.buffer, self.cursor) {
                    self.cursor = next;
                }
            }
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.buffer.len(),
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut TextInput, code: KeyCode) -> bool {
        input.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(input: &mut TextInput, s: &str) {
        for c in s.chars() {
            press(input, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_typing_and_cursor_moves() {
        let mut input = TextInput::default();
        type_str(&mut input, "milk");
        press(&mut input, KeyCode::Home);
        type_str(&mut input, "buy ");
        assert_eq!(input.text(), "buy milk");
        assert_eq!(input.cursor(), 4);
        press(&mut input, KeyCode::Delete);
        assert_eq!(input.text(), "buy ilk");
    }

    #[test]
    fn test_backspace_removes_whole_grapheme() {
        let mut input = TextInput::new("cafe\u{301}");
        press(&mut input, KeyCode::Backspace);
        assert_eq!(input.text(), "caf");
    }

    #[test]
    fn test_ctrl_w_deletes_word() {
        let mut input = TextInput::new("buy oat milk");
        input.handle_key(KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL));
        assert_eq!(input.text(), "buy oat ");
    }

    #[test]
    fn test_non_edit_keys_are_passed_through() {
        let mut input = TextInput::new("x");
        assert!(!press(&mut input, KeyCode::Enter));
        assert!(!press(&mut input, KeyCode::Esc));
        assert!(!input.handle_key(KeyEvent::new(KeyCode::Char('k'), KeyModifiers::CONTROL)));
        assert_eq!(input.text(), "x");
    }
}
