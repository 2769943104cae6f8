use std::cmp;

/// Single-line text input used by the goal and task forms.
/// The cursor is a char index, never a byte index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Editor {
    chars: Vec<char>,
    pub cursor: usize,
    /// First visible column when the text is wider than the field
    pub scroll_col: usize,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_string(content: &str) -> Self {
        // Forms are single-line; keep only the first line of stored text
        let chars: Vec<char> = content.lines().next().unwrap_or_default().chars().collect();
        let cursor = chars.len();
        Self { chars, cursor, scroll_col: 0 }
    }

    pub fn value(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' || ch == '\r' {
            return;
        }
        let at = cmp::min(self.cursor, self.chars.len());
        self.chars.insert(at, ch);
        self.cursor = at + 1;
    }

    /// Backspace
    pub fn delete_char(&mut self) {
        let at = cmp::min(self.cursor, self.chars.len());
        if at > 0 {
            self.chars.remove(at - 1);
            self.cursor = at - 1;
        }
    }

    /// Delete key
    pub fn delete_forward(&mut self) {
        if self.cursor < self.chars.len() {
            self.chars.remove(self.cursor);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.cursor = cmp::min(self.cursor + 1, self.chars.len());
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.chars.len();
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
        self.scroll_col = 0;
    }

    /// Keep the cursor inside a viewport `width` columns wide
    pub fn update_horizontal_scroll(&mut self, width: usize) {
        if width == 0 {
            return;
        }
        if self.cursor < self.scroll_col {
            self.scroll_col = self.cursor;
        } else if self.cursor >= self.scroll_col + width {
            self.scroll_col = self.cursor + 1 - width;
        }
    }

    /// Visible slice of the text and the cursor column within it
    pub fn visible(&self, width: usize) -> (String, usize) {
        let start = cmp::min(self.scroll_col, self.chars.len());
        let end = cmp::min(start + width, self.chars.len());
        let text = self.chars[start..end].iter().collect();
        (text, self.cursor.saturating_sub(start))
    }
}
