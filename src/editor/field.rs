use ropey::Rope;

/// Single-line text field backed by a rope.
///
/// The cursor is a char index in `0..=len_chars`. Newlines are never
/// inserted; edited values are one line of encoded text.
pub struct EditField {
    rope: Rope,
    cursor: usize,
    dirty: bool,
}

impl EditField {
    /// Create a field seeded with `text`, cursor at the end.
    pub fn from_text(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let cursor = rope.len_chars();
        Self {
            rope,
            cursor,
            dirty: false,
        }
    }

    pub fn empty() -> Self {
        Self::from_text("")
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Cursor position as a char index.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Whether the text differs from what the field was seeded with.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Text before the cursor, used to place the terminal cursor.
    pub fn text_before_cursor(&self) -> String {
        self.rope.slice(..self.cursor).to_string()
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' || ch == '\r' {
            return;
        }
        self.rope.insert_char(self.cursor, ch);
        self.cursor += 1;
        self.dirty = true;
    }

    pub fn insert_str(&mut self, s: &str) {
        let line: String = s.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        if line.is_empty() {
            return;
        }
        self.rope.insert(self.cursor, &line);
        self.cursor += line.chars().count();
        self.dirty = true;
    }

    /// Delete the character before the cursor (Backspace).
    ///
    /// Returns `true` if a character was deleted.
    pub fn delete_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.rope.remove(self.cursor - 1..self.cursor);
        self.cursor -= 1;
        self.dirty = true;
        true
    }

    /// Delete the character at the cursor (Delete).
    ///
    /// Returns `true` if a character was deleted.
    pub fn delete_forward(&mut self) -> bool {
        if self.cursor >= self.rope.len_chars() {
            return false;
        }
        self.rope.remove(self.cursor..=self.cursor);
        self.dirty = true;
        true
    }

    pub const fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.rope.len_chars() {
            self.cursor += 1;
        }
    }

    pub const fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.rope.len_chars();
    }

    /// Move to the start of the previous word (Ctrl+Left).
    pub fn move_word_left(&mut self) {
        let chars: Vec<char> = self.rope.slice(..self.cursor).chars().collect();
        let mut idx = chars.len();
        while idx > 0 && !is_word_char(chars[idx - 1]) {
            idx -= 1;
        }
        while idx > 0 && is_word_char(chars[idx - 1]) {
            idx -= 1;
        }
        self.cursor = idx;
    }

    /// Move past the current word and the separators after it (Ctrl+Right).
    pub fn move_word_right(&mut self) {
        let rest: Vec<char> = self.rope.slice(self.cursor..).chars().collect();
        let word_end = rest
            .iter()
            .position(|c| !is_word_char(*c))
            .unwrap_or(rest.len());
        let gap = rest[word_end..]
            .iter()
            .position(|c| is_word_char(*c))
            .unwrap_or(rest.len() - word_end);
        self.cursor += word_end + gap;
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl std::fmt::Debug for EditField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditField")
            .field("text", &self.text())
            .field("cursor", &self.cursor)
            .field("dirty", &self.dirty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_puts_cursor_at_end() {
        let field = EditField::from_text("\"a\"");
        assert_eq!(field.cursor(), 3);
        assert_eq!(field.text(), "\"a\"");
        assert!(!field.is_dirty());
    }

    #[test]
    fn test_empty_field() {
        let field = EditField::empty();
        assert_eq!(field.text(), "");
        assert_eq!(field.cursor(), 0);
    }

    #[test]
    fn test_insert_char_at_cursor() {
        let mut field = EditField::from_text("\"a\"");
        field.move_left();
        field.insert_char('b');
        assert_eq!(field.text(), "\"ab\"");
        assert_eq!(field.cursor(), 3);
        assert!(field.is_dirty());
    }

    #[test]
    fn test_insert_ignores_newlines() {
        let mut field = EditField::from_text("1");
        field.insert_char('\n');
        field.insert_str("2\n3");
        assert_eq!(field.text(), "123");
        assert_eq!(field.cursor(), 3);
    }

    #[test]
    fn test_multibyte_chars_move_by_char() {
        let mut field = EditField::from_text("\"héllo\"");
        field.move_home();
        field.move_right();
        field.move_right();
        assert_eq!(field.text_before_cursor(), "\"h");
        field.delete_forward();
        assert_eq!(field.text(), "\"hllo\"");
    }

    #[test]
    fn test_delete_back_at_start_is_noop() {
        let mut field = EditField::from_text("x");
        field.move_home();
        assert!(!field.delete_back());
        assert_eq!(field.text(), "x");
    }

    #[test]
    fn test_delete_back_removes_previous_char() {
        let mut field = EditField::from_text("abc");
        assert!(field.delete_back());
        assert_eq!(field.text(), "ab");
        assert_eq!(field.cursor(), 2);
    }

    #[test]
    fn test_delete_forward_at_end_is_noop() {
        let mut field = EditField::from_text("abc");
        assert!(!field.delete_forward());
    }

    #[test]
    fn test_move_left_at_start_stays() {
        let mut field = EditField::from_text("a");
        field.move_home();
        field.move_left();
        assert_eq!(field.cursor(), 0);
    }

    #[test]
    fn test_move_right_at_end_stays() {
        let mut field = EditField::from_text("a");
        field.move_right();
        assert_eq!(field.cursor(), 1);
    }

    #[test]
    fn test_word_movement() {
        let mut field = EditField::from_text("DBRef('users', 42)");
        field.move_word_left();
        assert_eq!(field.text_before_cursor(), "DBRef('users', ");
        field.move_word_left();
        assert_eq!(field.text_before_cursor(), "DBRef('");
        field.move_word_right();
        assert_eq!(field.text_before_cursor(), "DBRef('users', ");
    }
}
