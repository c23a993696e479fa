use zeroize::Zeroizing;

/// Single-line text field with a char-indexed cursor.
///
/// Contents are wiped from memory on clear, overwrite and drop, so the same
/// type is used for the admin password fields.
#[derive(Default, Clone)]
pub struct InputBuffer {
    content: Zeroizing<String>,
    cursor: usize,
    masked: bool,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer whose content is never shown in clear text
    pub fn masked() -> Self {
        Self {
            masked: true,
            ..Self::default()
        }
    }

    pub fn with_value(value: &str) -> Self {
        let mut buffer = Self::new();
        buffer.set(value);
        buffer
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_masked(&self) -> bool {
        self.masked
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn len(&self) -> usize {
        self.content.chars().count()
    }

    /// Text to draw: the content, or one `mask` per char for masked buffers
    pub fn display(&self, mask: char) -> String {
        if self.masked {
            std::iter::repeat_n(mask, self.len()).collect()
        } else {
            self.content.as_str().to_string()
        }
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    /// Backspace. Returns whether anything was removed.
    pub fn delete_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.remove_at_cursor();
        true
    }

    /// Delete under the cursor. Returns whether anything was removed.
    pub fn delete_forward(&mut self) -> bool {
        if self.cursor >= self.len() {
            return false;
        }
        self.remove_at_cursor();
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    pub fn move_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    pub fn clear(&mut self) {
        // Zeroizing wipes the old allocation when it is replaced
        self.content = Zeroizing::new(String::new());
        self.cursor = 0;
    }

    pub fn set(&mut self, value: &str) {
        self.content = Zeroizing::new(value.to_string());
        self.cursor = self.len();
    }

    fn remove_at_cursor(&mut self) {
        let start = self.byte_offset(self.cursor);
        let end = self.byte_offset(self.cursor + 1);
        self.content.replace_range(start..end, "");
    }

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_idx)
            .map_or(self.content.len(), |(i, _)| i)
    }
}
