//! Form pane rendering.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};

use crate::app::{App, Pane};
use crate::config::ConfigLoadStatus;
use crate::form::FormField;
use crate::ui::{contract_path, truncate_str};

/// Start and end (in chars) of the slice of a text field that fits in `width`,
/// keeping the cursor visible.
pub fn visible_window(len: usize, cursor: usize, width: usize) -> (usize, usize) {
    if len <= width {
        return (0, len);
    }
    let start = cursor.saturating_sub(width / 2);
    let end = (start + width).min(len);
    let start = end.saturating_sub(width);
    (start, end)
}

/// Render a single-line text input, with a block cursor when focused.
pub fn render_text_field(
    value: &str,
    focused: bool,
    cursor_pos: usize,
    width: usize,
    placeholder: &str,
) -> Vec<Span<'static>> {
    let chars: Vec<char> = value.chars().collect();
    let (start, end) = visible_window(chars.len(), cursor_pos, width);
    let visible: String = chars[start..end].iter().collect();

    if !focused {
        if value.is_empty() {
            return vec![Span::styled(
                placeholder.to_string(),
                Style::default().fg(Color::DarkGray),
            )];
        }
        return vec![Span::styled(visible, Style::default().fg(Color::White))];
    }

    let cursor = cursor_pos.saturating_sub(start).min(end - start);
    let before: String = chars[start..start + cursor].iter().collect();
    let (cursor_char, rest) = if start + cursor < end {
        (
            chars[start + cursor].to_string(),
            chars[start + cursor + 1..end].iter().collect(),
        )
    } else {
        (" ".to_string(), String::new())
    };

    vec![
        Span::styled(before, Style::default().fg(Color::White)),
        Span::styled(
            cursor_char,
            Style::default().fg(Color::Black).bg(Color::White),
        ),
        Span::styled(rest, Style::default().fg(Color::White)),
    ]
}

/// Render `◀ value ▶` for a cycling choice.
fn render_choice(value: &str, focused: bool) -> Vec<Span<'static>> {
    let (arrow, text) = if focused {
        (
            Style::default().fg(Color::Cyan),
            Style::default().fg(Color::Black).bg(Color::Cyan),
        )
    } else {
        (
            Style::default().fg(Color::DarkGray),
            Style::default().fg(Color::White),
        )
    };
    vec![
        Span::styled("◀ ", arrow),
        Span::styled(format!(" {} ", value), text),
        Span::styled(" ▶", arrow),
    ]
}

/// Draw the repository form into `area`.
pub fn draw_form(f: &mut Frame, app: &App, area: Rect) {
    let pane_focused = app.focus == Pane::Form;
    let form = &app.form;
    let loading = app.view.is_loading();

    let label_style = Style::default().fg(Color::DarkGray);
    let focused_label_style = Style::default().fg(Color::Cyan);
    let label = |field: FormField, text: &'static str| -> Span<'static> {
        if pane_focused && form.focus == field {
            Span::styled(text, focused_label_style)
        } else {
            Span::styled(text, label_style)
        }
    };
    let is_focused = |field: FormField| pane_focused && form.focus == field;

    let field_width = area.width.saturating_sub(6) as usize;
    let mut content: Vec<Line> = Vec::new();

    content.push(Line::from(label(FormField::Name, "Repository name")));
    let mut name_line = vec![Span::raw("  ")];
    name_line.extend(render_text_field(
        &form.name,
        is_focused(FormField::Name),
        form.cursor_pos,
        field_width,
        "my-awesome-project",
    ));
    content.push(Line::from(name_line));
    if let Some(error) = &form.error {
        content.push(Line::from(Span::styled(
            format!("  ⚠ {}", error),
            Style::default().fg(Color::Yellow),
        )));
    }
    content.push(Line::raw(""));

    content.push(Line::from(label(FormField::Description, "Description")));
    let mut description_line = vec![Span::raw("  ")];
    description_line.extend(render_text_field(
        &form.description,
        is_focused(FormField::Description),
        form.cursor_pos,
        field_width,
        "(optional)",
    ));
    content.push(Line::from(description_line));
    content.push(Line::raw(""));

    let mut visibility_line = vec![label(FormField::Visibility, "Visibility   ")];
    visibility_line.extend(render_choice(
        form.visibility.as_str(),
        is_focused(FormField::Visibility),
    ));
    content.push(Line::from(visibility_line));

    let checkbox = if form.include_readme { "[x]" } else { "[ ]" };
    let checkbox_style = if is_focused(FormField::IncludeReadme) {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default().fg(Color::White)
    };
    content.push(Line::from(vec![
        label(FormField::IncludeReadme, "README       "),
        Span::styled(checkbox, checkbox_style),
        Span::styled(" Start with a README", Style::default().fg(Color::White)),
    ]));

    let mut gitignore_line = vec![label(FormField::Gitignore, ".gitignore   ")];
    gitignore_line.extend(render_choice(
        form.selected_gitignore(),
        is_focused(FormField::Gitignore),
    ));
    content.push(Line::from(gitignore_line));

    let mut license_line = vec![label(FormField::License, "License      ")];
    license_line.extend(render_choice(
        form.selected_license(),
        is_focused(FormField::License),
    ));
    content.push(Line::from(license_line));
    content.push(Line::raw(""));

    let (button_text, button_style) = if loading {
        (" Generating... ", Style::default().fg(Color::DarkGray))
    } else if !form.can_submit(loading) {
        (" Generate ", Style::default().fg(Color::DarkGray))
    } else if is_focused(FormField::GenerateButton) {
        (
            " Generate ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (" Generate ", Style::default().fg(Color::Green))
    };
    let button_marker = if is_focused(FormField::GenerateButton) {
        "▶ "
    } else {
        "  "
    };
    content.push(Line::from(vec![
        Span::styled(button_marker, Style::default().fg(Color::Green)),
        Span::styled(format!("[{}]", button_text), button_style),
    ]));

    let notice_width = area.width.saturating_sub(4) as usize;
    let mut notices: Vec<Line> = Vec::new();
    match &app.config_status {
        ConfigLoadStatus::Loaded => {}
        ConfigLoadStatus::Created => notices.push(Line::from(Span::styled(
            truncate_str(
                &format!("Created config at {}", contract_path(&app.config_path)),
                notice_width,
            ),
            Style::default().fg(Color::DarkGray),
        ))),
        ConfigLoadStatus::Error(message) => notices.push(Line::from(Span::styled(
            truncate_str(&format!("⚠ Config: {}", message), notice_width),
            Style::default().fg(Color::Yellow),
        ))),
    }
    if let Some(error) = &app.logging_error {
        notices.push(Line::from(Span::styled(
            truncate_str(&format!("⚠ Logging disabled: {}", error), notice_width),
            Style::default().fg(Color::Yellow),
        )));
    }
    if let Some(dir) = &app.log_directory {
        notices.push(Line::from(Span::styled(
            truncate_str(&format!("Logs: {}", contract_path(dir)), notice_width),
            Style::default().fg(Color::DarkGray),
        )));
    }
    if !notices.is_empty() {
        content.push(Line::raw(""));
        content.extend(notices);
    }

    let border_style = if pane_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border_style)
        .title(Line::from(" New repository ").left_aligned());
    if let Some(session_id) = &app.session_id {
        block = block.title(Line::from(format!(" {} ", session_id)).right_aligned());
    }

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(spans: &[Span]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_visible_window_short_value() {
        assert_eq!(visible_window(5, 3, 10), (0, 5));
        assert_eq!(visible_window(0, 0, 10), (0, 0));
    }

    #[test]
    fn test_visible_window_follows_cursor() {
        assert_eq!(visible_window(30, 0, 10), (0, 10));
        assert_eq!(visible_window(30, 15, 10), (10, 20));
        assert_eq!(visible_window(30, 30, 10), (20, 30));
    }

    #[test]
    fn test_visible_window_zero_width() {
        let (start, end) = visible_window(4, 2, 0);
        assert_eq!(start, end);
    }

    #[test]
    fn test_unfocused_empty_field_shows_placeholder() {
        let spans = render_text_field("", false, 0, 20, "(optional)");
        assert_eq!(text(&spans), "(optional)");
    }

    #[test]
    fn test_focused_field_cursor_at_end() {
        let spans = render_text_field("abc", true, 3, 20, "");
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].content, "abc");
        assert_eq!(spans[1].content, " ");
        assert_eq!(spans[2].content, "");
    }

    #[test]
    fn test_focused_field_cursor_on_multibyte_char() {
        let spans = render_text_field("héllo", true, 1, 20, "");
        assert_eq!(spans[0].content, "h");
        assert_eq!(spans[1].content, "é");
        assert_eq!(spans[2].content, "llo");
    }

    #[test]
    fn test_long_field_is_windowed() {
        let value = "abcdefghijklmnopqrstuvwxyz";
        let spans = render_text_field(value, false, 26, 5, "");
        assert_eq!(text(&spans), "vwxyz");
    }
}
