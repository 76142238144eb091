//! Single-line text entry for filters, forms and prompts.

/// A text input with a character-index cursor.
#[derive(Clone, Default)]
pub struct InputField {
    pub value: String,
    pub cursor: usize,
}

impl InputField {
    pub fn new() -> Self {
        InputField::default()
    }

    pub fn with_value(value: &str) -> Self {
        InputField {
            value: value.to_string(),
            cursor: value.chars().count(),
        }
    }

    fn byte_offset(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_offset();
        self.value.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_offset();
            self.value.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// The trimmed value, leaving the field empty.
    pub fn take(&mut self) -> String {
        let value = self.value.trim().to_string();
        self.clear();
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_respect_multibyte_boundaries() {
        let mut field = InputField::with_value("やる");
        field.left();
        field.insert('り');
        assert_eq!(field.value, "やりる");
        field.right();
        field.backspace();
        assert_eq!(field.value, "やり");
    }

    #[test]
    fn take_trims_and_clears() {
        let mut field = InputField::with_value("  mika  ");
        assert_eq!(field.take(), "mika");
        assert_eq!(field.value, "");
        assert_eq!(field.cursor, 0);
    }
}
