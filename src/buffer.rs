//! Line-oriented text buffer with a cursor.

// Vec<Vec<char>> keeps cursor arithmetic in characters, not bytes
pub struct TextBuffer {
    lines: Vec<Vec<char>>,
    pub cursor_x: usize,
    pub cursor_y: usize,
}

impl TextBuffer {
    pub fn from_text(text: &str) -> Self {
        // split('\n') rather than lines() so a trailing newline survives
        let lines: Vec<Vec<char>> = text.split('\n').map(|line| line.chars().collect()).collect();
        let cursor_y = lines.len() - 1;
        let cursor_x = lines[cursor_y].len();
        TextBuffer {
            lines,
            cursor_x,
            cursor_y,
        }
    }

    pub fn to_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.iter().collect::<String>())
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn lines(&self) -> &[Vec<char>] {
        &self.lines
    }

    fn current_line(&self) -> &Vec<char> {
        &self.lines[self.cursor_y]
    }

    pub fn insert_char(&mut self, c: char) {
        self.lines[self.cursor_y].insert(self.cursor_x, c);
        self.cursor_x += 1;
    }

    pub fn insert_tab(&mut self, tab_size: usize) {
        for _ in 0..tab_size {
            self.insert_char(' ');
        }
    }

    pub fn insert_newline(&mut self) {
        let current_line = &mut self.lines[self.cursor_y];
        let new_line: Vec<char> = current_line.drain(self.cursor_x..).collect();
        self.lines.insert(self.cursor_y + 1, new_line);
        self.cursor_y += 1;
        self.cursor_x = 0;
    }

    /// Returns true if anything was removed.
    pub fn backspace(&mut self) -> bool {
        if self.cursor_x > 0 {
            self.lines[self.cursor_y].remove(self.cursor_x - 1);
            self.cursor_x -= 1;
            true
        } else if self.cursor_y > 0 {
            let current_line = self.lines.remove(self.cursor_y);
            self.cursor_y -= 1;
            self.cursor_x = self.lines[self.cursor_y].len();
            self.lines[self.cursor_y].extend(current_line);
            true
        } else {
            false
        }
    }

    /// Returns true if anything was removed.
    pub fn delete(&mut self) -> bool {
        let line_len = self.current_line().len();
        if self.cursor_x < line_len {
            self.lines[self.cursor_y].remove(self.cursor_x);
            true
        } else if self.cursor_y < self.lines.len() - 1 {
            let next_line = self.lines.remove(self.cursor_y + 1);
            self.lines[self.cursor_y].extend(next_line);
            true
        } else {
            false
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor_x > 0 {
            self.cursor_x -= 1;
        } else if self.cursor_y > 0 {
            self.cursor_y -= 1;
            self.cursor_x = self.current_line().len();
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor_x < self.current_line().len() {
            self.cursor_x += 1;
        } else if self.cursor_y < self.lines.len() - 1 {
            self.cursor_y += 1;
            self.cursor_x = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.cursor_y > 0 {
            self.cursor_y -= 1;
            self.cursor_x = self.cursor_x.min(self.current_line().len());
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor_y < self.lines.len() - 1 {
            self.cursor_y += 1;
            self.cursor_x = self.cursor_x.min(self.current_line().len());
        }
    }

    pub fn move_home(&mut self) {
        self.cursor_x = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_x = self.current_line().len();
    }

    pub fn page_up(&mut self, page_size: usize) {
        self.cursor_y = self.cursor_y.saturating_sub(page_size);
        self.cursor_x = self.cursor_x.min(self.current_line().len());
    }

    pub fn page_down(&mut self, page_size: usize) {
        self.cursor_y = (self.cursor_y + page_size).min(self.lines.len() - 1);
        self.cursor_x = self.cursor_x.min(self.current_line().len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_survives_buffer_conversion() {
        for text in ["", "one", "one\ntwo", "trailing\n", "\n\nblank lines\n\n"] {
            assert_eq!(TextBuffer::from_text(text).to_text(), text);
        }
    }

    #[test]
    fn cursor_starts_at_end() {
        let buffer = TextBuffer::from_text("ab\ncde");
        assert_eq!((buffer.cursor_y, buffer.cursor_x), (1, 3));
    }

    #[test]
    fn typing_and_newlines() {
        let mut buffer = TextBuffer::from_text("");
        for c in "hello".chars() {
            buffer.insert_char(c);
        }
        buffer.insert_newline();
        buffer.insert_char('w');
        assert_eq!(buffer.to_text(), "hello\nw");

        buffer.move_up();
        buffer.move_home();
        buffer.move_right();
        buffer.insert_newline();
        assert_eq!(buffer.to_text(), "h\nello\nw");
    }

    #[test]
    fn backspace_joins_lines() {
        let mut buffer = TextBuffer::from_text("ab\ncd");
        buffer.move_home();
        assert!(buffer.backspace());
        assert_eq!(buffer.to_text(), "abcd");
        assert_eq!((buffer.cursor_y, buffer.cursor_x), (0, 2));

        let mut empty = TextBuffer::from_text("");
        assert!(!empty.backspace());
    }

    #[test]
    fn delete_at_end_of_line_pulls_next() {
        let mut buffer = TextBuffer::from_text("ab\ncd");
        buffer.move_up();
        buffer.move_end();
        assert!(buffer.delete());
        assert_eq!(buffer.to_text(), "abcd");
        buffer.move_end();
        assert!(!buffer.delete());
    }

    #[test]
    fn vertical_moves_clamp_column() {
        let mut buffer = TextBuffer::from_text("short\nmuch longer line");
        buffer.move_up();
        assert_eq!(buffer.cursor_x, 5);
        buffer.page_down(10);
        assert_eq!(buffer.cursor_y, 1);
        buffer.page_up(10);
        assert_eq!(buffer.cursor_y, 0);
    }
}
