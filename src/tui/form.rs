use ratatui_textarea::{CursorMove, Input, Key, TextArea};

/// A single-line text input with a placeholder and focus state.
#[derive(Clone)]
pub struct FormField {
    pub placeholder: &'static str,
    pub masked: bool,
    editor: TextArea<'static>,
    focused: bool,
}

impl FormField {
    pub fn new(placeholder: &'static str) -> Self {
        Self {
            placeholder,
            masked: false,
            editor: TextArea::default(),
            focused: false,
        }
    }

    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn value(&self) -> String {
        self.editor.lines().concat()
    }

    pub fn set_value(&mut self, value: &str) {
        self.editor = TextArea::new(vec![value.to_string()]);
        self.editor.move_cursor(CursorMove::End);
    }

    pub fn clear(&mut self) {
        self.set_value("");
    }

    pub fn is_empty(&self) -> bool {
        self.value().is_empty()
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Feeds one edit to the field. Blurred fields and line breaks are ignored.
    pub fn input(&mut self, input: Input) -> bool {
        if !self.focused || matches!(input.key, Key::Enter) {
            return false;
        }
        if input.ctrl && matches!(input.key, Key::Char('m') | Key::Char('j')) {
            return false;
        }
        self.editor.input(input)
    }

    /// Cursor column, in chars.
    pub fn cursor_column(&self) -> usize {
        self.editor.cursor().1
    }

    /// Text as it should appear on screen.
    pub fn display_text(&self) -> String {
        let value = self.value();
        if self.masked {
            "•".repeat(value.chars().count())
        } else {
            value
        }
    }
}

/// The fields a form-bearing view owns, in display order.
#[derive(Clone, Default)]
pub struct FormInputSet {
    fields: Vec<FormField>,
}

impl FormInputSet {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn values(&self) -> Vec<String> {
        self.fields.iter().map(FormField::value).collect()
    }

    /// Overwrites values positionally; extra values are ignored.
    pub fn set_values<S: AsRef<str>>(&mut self, values: &[S]) {
        for (field, value) in self.fields.iter_mut().zip(values) {
            field.set_value(value.as_ref());
        }
    }

    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.clear();
        }
    }

    pub fn any_empty(&self) -> bool {
        self.fields.iter().any(FormField::is_empty)
    }
}
