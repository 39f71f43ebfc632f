//! Repository form state and input handling.

use crossterm::event::{KeyCode, KeyModifiers};

use crate::app::{App, Pane};
use crate::config::FormConfig;
use crate::request::{RepoRequest, RequestError, Visibility};

/// .gitignore choices shown in the form.
pub const GITIGNORE_OPTIONS: &[&str] = &["None", "Node", "Python", "React", "Vue", "Java", "Go", "Rust"];

/// License choices shown in the form.
pub const LICENSE_OPTIONS: &[&str] = &["None", "MIT", "Apache-2.0", "GPL-3.0", "BSD-3-Clause"];

/// Which field is focused in the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Name,
    Description,
    Visibility,
    IncludeReadme,
    Gitignore,
    License,
    GenerateButton,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            Self::Name => Self::Description,
            Self::Description => Self::Visibility,
            Self::Visibility => Self::IncludeReadme,
            Self::IncludeReadme => Self::Gitignore,
            Self::Gitignore => Self::License,
            Self::License => Self::GenerateButton,
            Self::GenerateButton => Self::Name,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Name => Self::GenerateButton,
            Self::Description => Self::Name,
            Self::Visibility => Self::Description,
            Self::IncludeReadme => Self::Visibility,
            Self::Gitignore => Self::IncludeReadme,
            Self::License => Self::Gitignore,
            Self::GenerateButton => Self::License,
        }
    }

    pub fn is_text(self) -> bool {
        matches!(self, Self::Name | Self::Description)
    }
}

fn option_index(options: &[&str], value: &str) -> usize {
    options
        .iter()
        .position(|o| o.eq_ignore_ascii_case(value))
        .unwrap_or(0)
}

fn cycle_next(index: usize, len: usize) -> usize {
    if index + 1 < len { index + 1 } else { 0 }
}

fn cycle_prev(index: usize, len: usize) -> usize {
    if index > 0 { index - 1 } else { len - 1 }
}

/// Byte offset of the `char_pos`-th character, or the string length.
fn byte_offset(value: &str, char_pos: usize) -> usize {
    value
        .char_indices()
        .nth(char_pos)
        .map(|(idx, _)| idx)
        .unwrap_or(value.len())
}

/// State for the repository form.
#[derive(Debug, Clone)]
pub struct RepoFormState {
    pub focus: FormField,
    /// Repository name, hyphenated as the user types.
    pub name: String,
    pub description: String,
    pub visibility: Visibility,
    pub include_readme: bool,
    /// Selected index in GITIGNORE_OPTIONS.
    pub gitignore_index: usize,
    /// Selected index in LICENSE_OPTIONS.
    pub license_index: usize,
    /// Cursor position (in characters) within the focused text field.
    pub cursor_pos: usize,
    /// Validation message shown under the name field.
    pub error: Option<String>,
}

impl RepoFormState {
    /// Create a new form initialized from the configured defaults.
    pub fn from_config(defaults: &FormConfig) -> Self {
        Self {
            focus: FormField::Name,
            name: String::new(),
            description: String::new(),
            visibility: defaults.visibility,
            include_readme: defaults.include_readme,
            gitignore_index: option_index(GITIGNORE_OPTIONS, &defaults.gitignore),
            license_index: option_index(LICENSE_OPTIONS, &defaults.license),
            cursor_pos: 0,
            error: None,
        }
    }

    pub fn selected_gitignore(&self) -> &'static str {
        GITIGNORE_OPTIONS[self.gitignore_index]
    }

    pub fn selected_license(&self) -> &'static str {
        LICENSE_OPTIONS[self.license_index]
    }

    /// Submission is allowed only with a name and while no request is in flight.
    pub fn can_submit(&self, loading: bool) -> bool {
        !loading && !self.name.trim().is_empty()
    }

    /// Get a reference to the currently focused text field's value.
    pub fn current_field_value(&self) -> Option<&String> {
        match self.focus {
            FormField::Name => Some(&self.name),
            FormField::Description => Some(&self.description),
            _ => None,
        }
    }

    fn current_field_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Name => Some(&mut self.name),
            FormField::Description => Some(&mut self.description),
            _ => None,
        }
    }

    fn current_field_chars(&self) -> usize {
        self.current_field_value()
            .map(|v| v.chars().count())
            .unwrap_or(0)
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
        self.cursor_pos = self.current_field_chars();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
        self.cursor_pos = self.current_field_chars();
    }

    /// Insert a character at the cursor. Whitespace typed into the name becomes `-`.
    pub fn insert_char(&mut self, c: char) {
        let c = if self.focus == FormField::Name && c.is_whitespace() {
            '-'
        } else {
            c
        };
        let cursor = self.cursor_pos;
        let Some(value) = self.current_field_mut() else {
            return;
        };
        let offset = byte_offset(value, cursor);
        value.insert(offset, c);
        self.cursor_pos += 1;
        if self.focus == FormField::Name {
            self.error = None;
        }
    }

    /// Insert pasted text at the cursor, one character at a time.
    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| *c != '\r' && *c != '\n') {
            self.insert_char(c);
        }
    }

    /// Delete the character before the cursor (backspace).
    pub fn delete_char_before(&mut self) {
        if self.cursor_pos == 0 {
            return;
        }
        let cursor = self.cursor_pos;
        if let Some(value) = self.current_field_mut() {
            let offset = byte_offset(value, cursor - 1);
            value.remove(offset);
            self.cursor_pos -= 1;
        }
    }

    /// Delete the character at the cursor position (delete key).
    pub fn delete_char_at(&mut self) {
        let cursor = self.cursor_pos;
        if let Some(value) = self.current_field_mut()
            && cursor < value.chars().count()
        {
            let offset = byte_offset(value, cursor);
            value.remove(offset);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        if self.cursor_pos < self.current_field_chars() {
            self.cursor_pos += 1;
        }
    }

    pub fn cursor_home(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor_pos = self.current_field_chars();
    }

    /// Step the focused choice field forward.
    pub fn choice_next(&mut self) {
        match self.focus {
            FormField::Visibility => self.visibility = self.visibility.toggle(),
            FormField::IncludeReadme => self.include_readme = !self.include_readme,
            FormField::Gitignore => {
                self.gitignore_index = cycle_next(self.gitignore_index, GITIGNORE_OPTIONS.len())
            }
            FormField::License => {
                self.license_index = cycle_next(self.license_index, LICENSE_OPTIONS.len())
            }
            _ => {}
        }
    }

    /// Step the focused choice field backward.
    pub fn choice_prev(&mut self) {
        match self.focus {
            FormField::Visibility => self.visibility = self.visibility.toggle(),
            FormField::IncludeReadme => self.include_readme = !self.include_readme,
            FormField::Gitignore => {
                self.gitignore_index = cycle_prev(self.gitignore_index, GITIGNORE_OPTIONS.len())
            }
            FormField::License => {
                self.license_index = cycle_prev(self.license_index, LICENSE_OPTIONS.len())
            }
            _ => {}
        }
    }

    /// Build a request from the current values.
    pub fn to_request(&self) -> Result<RepoRequest, RequestError> {
        Ok(RepoRequest::new(&self.name)?
            .with_description(self.description.as_str())
            .with_visibility(self.visibility)
            .with_readme(self.include_readme)
            .with_gitignore(self.selected_gitignore())
            .with_license(self.selected_license()))
    }
}

/// Handle keyboard input while the form has focus.
pub fn handle_form_input(app: &mut App, key_code: KeyCode, modifiers: KeyModifiers) {
    if modifiers.contains(KeyModifiers::CONTROL) {
        if key_code == KeyCode::Char('g') {
            app.submit();
        }
        return;
    }

    match key_code {
        KeyCode::Esc => {
            app.focus = Pane::Output;
            return;
        }
        KeyCode::Enter if app.form.focus == FormField::GenerateButton => {
            app.submit();
            return;
        }
        _ => {}
    }

    let state = &mut app.form;
    match key_code {
        KeyCode::Tab => {
            if modifiers.contains(KeyModifiers::SHIFT) {
                state.focus_prev();
            } else {
                state.focus_next();
            }
        }
        KeyCode::BackTab => state.focus_prev(),

        KeyCode::Enter => match state.focus {
            FormField::IncludeReadme => state.choice_next(),
            _ => state.focus_next(),
        },

        KeyCode::Char(' ') if !state.focus.is_text() => state.choice_next(),
        KeyCode::Char(c) => {
            if state.focus.is_text() {
                state.insert_char(c);
            }
        }

        KeyCode::Backspace => state.delete_char_before(),
        KeyCode::Delete => state.delete_char_at(),

        KeyCode::Left => {
            if state.focus.is_text() {
                state.cursor_left();
            } else {
                state.choice_prev();
            }
        }
        KeyCode::Right => {
            if state.focus.is_text() {
                state.cursor_right();
            } else {
                state.choice_next();
            }
        }
        KeyCode::Home => state.cursor_home(),
        KeyCode::End => state.cursor_end(),

        KeyCode::Up => match state.focus {
            FormField::Gitignore | FormField::License => state.choice_prev(),
            _ => state.focus_prev(),
        },
        KeyCode::Down => match state.focus {
            FormField::Gitignore | FormField::License => state.choice_next(),
            _ => state.focus_next(),
        },

        _ => {}
    }
}
