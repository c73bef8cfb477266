/// Tallest the input box grows before it starts scrolling.
pub const MAX_INPUT_ROWS: u16 = 8;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Multi-line message input with a character cursor.
///
/// Lines wrap at the box width character by character. A line of `n`
/// characters takes `n / width + 1` rows so the cursor always has a cell
/// after the last character.
#[derive(Debug, Clone)]
pub struct InputBox {
    text: String,
    cursor: usize,
    height: u16,
    pub enabled: bool,
    pub focused: bool,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            height: 1,
            enabled: true,
            focused: true,
        }
    }

    pub fn value(&self) -> &str {
        &self.text
    }

    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn insert_str(&mut self, s: &str) {
        // Terminals send pasted newlines as \r or \r\n
        for c in s.replace("\r\n", "\n").chars() {
            self.insert_char(if c == '\r' { '\n' } else { c });
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    /// Start of the current logical line.
    pub fn move_home(&mut self) {
        let before: Vec<char> = self.text.chars().take(self.cursor).collect();
        let line_start = before
            .iter()
            .rposition(|&c| c == '\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        self.cursor = line_start;
    }

    /// End of the current logical line.
    pub fn move_end(&mut self) {
        let to_newline = self
            .text
            .chars()
            .skip(self.cursor)
            .take_while(|&c| c != '\n')
            .count();
        self.cursor += to_newline;
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn reset_height(&mut self) {
        self.height = 1;
    }

    pub fn set_height(&mut self, height: u16) {
        self.height = height.clamp(1, MAX_INPUT_ROWS);
    }

    /// The text as it appears on screen, one entry per row.
    pub fn visual_rows(&self, width: usize) -> Vec<String> {
        let width = width.max(1);
        let mut rows = Vec::new();

        for line in self.text.split('\n') {
            let chars: Vec<char> = line.chars().collect();
            let row_count = chars.len() / width + 1;
            for r in 0..row_count {
                let start = (r * width).min(chars.len());
                let end = ((r + 1) * width).min(chars.len());
                rows.push(chars[start..end].iter().collect());
            }
        }

        rows
    }

    pub fn content_rows(&self, width: usize) -> u16 {
        self.visual_rows(width).len().min(u16::MAX as usize) as u16
    }

    /// Cursor cell as (column, row) within the unscrolled visual rows.
    pub fn cursor_position(&self, width: usize) -> (u16, u16) {
        let width = width.max(1);
        let (mut col, mut row) = (0usize, 0usize);

        for c in self.text.chars().take(self.cursor) {
            if c == '\n' {
                row += 1;
                col = 0;
            } else {
                col += 1;
                if col == width {
                    row += 1;
                    col = 0;
                }
            }
        }

        (col as u16, row as u16)
    }
}
