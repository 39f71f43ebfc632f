//! UI rendering functions.

use std::path::Path;
use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Pane};
use crate::client::{GenerationResult, GitCommandStep};
use crate::form_ui::draw_form;
use crate::output::OutputTab;
use crate::view::ViewState;

/// Truncates a string to the given maximum width in characters, appending "..." if truncated.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    // Replace newlines with spaces for single-line display
    let single_line: String = s.chars().map(|c| if c == '\n' { ' ' } else { c }).collect();

    if single_line.chars().count() <= max_len {
        single_line
    } else {
        let kept: String = single_line
            .chars()
            .take(max_len.saturating_sub(3))
            .collect();
        format!("{}...", kept)
    }
}

/// Contract a path by replacing the home directory with `~` for display.
pub fn contract_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(suffix) = path.strip_prefix(&home)
    {
        return format!("~/{}", suffix.display());
    }
    path.display().to_string()
}

/// Wrapped height of a paragraph at `width`, saturating at `u16::MAX`.
pub fn rendered_height(paragraph: &Paragraph, width: u16) -> u16 {
    paragraph.line_count(width).min(u16::MAX as usize) as u16
}

pub fn border_type(state: &ViewState) -> BorderType {
    match state {
        ViewState::Loading => BorderType::Double,
        _ => BorderType::Rounded,
    }
}

/// Returns the color for this state, pulsing while loading or failed.
/// The pulse alternates every 15 frames.
pub fn pulsing_color(state: &ViewState, frame_count: u64) -> Color {
    let bright = (frame_count / 15).is_multiple_of(2);
    match state {
        ViewState::Idle => Color::Cyan,
        ViewState::Success(_) => Color::Green,
        ViewState::Loading => {
            if bright {
                Color::Yellow
            } else {
                Color::Rgb(128, 128, 0)
            }
        }
        ViewState::Failure(_) => {
            if bright {
                Color::Red
            } else {
                Color::Rgb(128, 0, 0)
            }
        }
    }
}

fn idle_lines() -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            "Ready to build?",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::from(Span::styled(
            "Fill in your repository details and press Ctrl+G.",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            "Git commands and a README will appear here.",
            Style::default().fg(Color::DarkGray),
        )),
    ]
}

/// Placeholder shaped like the commands list: pairs of bars per step.
pub fn skeleton_lines(width: u16, height: u16, frame_count: u64) -> Vec<Line<'static>> {
    let shade = if (frame_count / 8).is_multiple_of(2) {
        Color::DarkGray
    } else {
        Color::Gray
    };
    let style = Style::default().fg(shade);
    let width = width as usize;
    // explanation / command width as a share of the pane, per step
    let shapes: [(usize, usize); 4] = [(70, 35), (55, 45), (80, 30), (60, 50)];

    let mut lines = Vec::new();
    let mut i = 0;
    while lines.len() + 3 <= height as usize {
        let (explanation, command) = shapes[i % shapes.len()];
        lines.push(Line::from(Span::styled(
            "▒".repeat(width * explanation / 100),
            style,
        )));
        lines.push(Line::from(Span::styled(
            format!("  {}", "▒".repeat((width * command / 100).saturating_sub(2))),
            style,
        )));
        lines.push(Line::raw(""));
        i += 1;
    }
    lines
}

fn step_lines(index: usize, step: &GitCommandStep, selected: bool) -> Vec<Line<'static>> {
    let marker = if selected { "▶ " } else { "  " };
    let explanation_style = if selected {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let command_style = if selected {
        Style::default()
            .fg(Color::Green)
            .bg(Color::Rgb(30, 30, 30))
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    };
    vec![
        Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Cyan)),
            Span::styled(format!("{}. {}", index + 1, step.explanation), explanation_style),
        ]),
        Line::from(vec![
            Span::raw("    "),
            Span::styled(format!("$ {}", step.command), command_style),
        ]),
        Line::raw(""),
    ]
}

fn tab_bar(active: OutputTab) -> Line<'static> {
    let style_for = |tab: OutputTab| {
        if tab == active {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };
    Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!(" 1 {} ", OutputTab::Commands.title()),
            style_for(OutputTab::Commands),
        ),
        Span::raw(" "),
        Span::styled(
            format!(" 2 {} ", OutputTab::Readme.title()),
            style_for(OutputTab::Readme),
        ),
    ])
}

fn draw_scrollbar(f: &mut Frame, area: Rect, content_length: u16, position: u16, viewport: u16) {
    if content_length <= viewport {
        return;
    }
    let scrollbar = Scrollbar::default()
        .orientation(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("▲"))
        .end_symbol(Some("▼"));
    let mut scrollbar_state = ScrollbarState::default()
        .content_length(content_length as usize)
        .position(position as usize)
        .viewport_content_length(viewport as usize);
    f.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
}

fn draw_commands(f: &mut Frame, app: &mut App, result: &GenerationResult, area: Rect) {
    if result.steps.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No commands were returned.",
            Style::default().fg(Color::DarkGray),
        ));
        f.render_widget(empty, area);
        return;
    }

    let selected = app.output.selected_step.min(result.steps.len() - 1);
    let mut lines = Vec::new();
    let mut selected_start = 0u16;
    let mut selected_height = 0u16;
    for (i, step) in result.steps.iter().enumerate() {
        let block_lines = step_lines(i, step, i == selected);
        let height = rendered_height(
            &Paragraph::new(block_lines.clone()).wrap(Wrap { trim: false }),
            area.width,
        );
        if i < selected {
            selected_start = selected_start.saturating_add(height);
        } else if i == selected {
            selected_height = height;
        }
        lines.extend(block_lines);
    }

    // Keep the selected step in view.
    let output = &mut app.output;
    if selected_start < output.scroll_offset {
        output.scroll_offset = selected_start;
    } else {
        let selected_end = selected_start.saturating_add(selected_height);
        if selected_end > output.scroll_offset.saturating_add(area.height) {
            output.scroll_offset = selected_end.saturating_sub(area.height);
        }
    }

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((output.scroll_offset, 0));
    let total = rendered_height(&paragraph, area.width);
    f.render_widget(paragraph, area);
    draw_scrollbar(f, area, total, output.scroll_offset, area.height);
}

fn draw_readme(f: &mut Frame, app: &mut App, result: &GenerationResult, area: Rect) {
    if result.readme_markdown.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "(empty README)",
            Style::default().fg(Color::DarkGray),
        ));
        f.render_widget(empty, area);
        return;
    }

    let max_scroll = app.readme_max_scroll();
    app.output.scroll_offset = app.output.scroll_offset.min(max_scroll);

    let paragraph = Paragraph::new(result.readme_markdown.as_str())
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false })
        .scroll((app.output.scroll_offset, 0));
    f.render_widget(paragraph, area);
    draw_scrollbar(
        f,
        area,
        app.readme_line_count(),
        app.output.scroll_offset,
        area.height,
    );
}

/// Draw the output pane for the current view state.
fn draw_output(f: &mut Frame, app: &mut App, area: Rect) {
    let state = app.view.state().clone();
    let color = pulsing_color(&state, app.frame_count);
    let border_style = if app.focus == Pane::Output {
        Style::default().fg(color)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type(&state))
        .border_style(border_style)
        .title(Line::from(" Output ").left_aligned())
        .title(Line::from(format!(" {} ", app.config.backend.model)).right_aligned());
    if app.output.copy_acknowledged(Instant::now()) {
        block = block.title_bottom(
            Line::from(Span::styled(" ✓ Copied ", Style::default().fg(Color::Green)))
                .right_aligned(),
        );
    }
    let inner = block.inner(area);
    f.render_widget(block, area);

    match &state {
        ViewState::Idle => {
            let top = inner.height.saturating_sub(4) / 3;
            let placeholder = Paragraph::new(idle_lines())
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            let area = Rect {
                y: inner.y + top,
                height: inner.height.saturating_sub(top),
                ..inner
            };
            f.render_widget(placeholder, area);
        }
        ViewState::Loading => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(2), Constraint::Min(0)])
                .split(inner);
            let header = Paragraph::new(Span::styled(
                "Generating your repository guide...",
                Style::default().fg(color),
            ));
            f.render_widget(header, chunks[0]);
            let skeleton = Paragraph::new(skeleton_lines(
                chunks[1].width,
                chunks[1].height,
                app.frame_count,
            ));
            f.render_widget(skeleton, chunks[1]);
        }
        ViewState::Failure(message) => {
            let lines = vec![
                Line::from(Span::styled(
                    format!("✗ {}", message),
                    Style::default().fg(Color::Red),
                )),
                Line::raw(""),
                Line::from(Span::styled(
                    "Press e to edit the form, then Ctrl+G to try again.",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
        }
        ViewState::Success(result) => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(2), Constraint::Min(0)])
                .split(inner);
            f.render_widget(Paragraph::new(tab_bar(app.output.active_tab)), chunks[0]);

            let content = chunks[1];
            app.output.pane_height = content.height;
            app.output.pane_width = content.width;
            match app.output.active_tab {
                OutputTab::Commands => draw_commands(f, app, result, content),
                OutputTab::Readme => draw_readme(f, app, result, content),
            }
        }
    }
}

fn shortcuts(app: &App) -> &'static str {
    match (app.focus, app.view.state()) {
        (Pane::Form, ViewState::Loading) => "[Tab] Next field  [Esc] Output  [Ctrl+C] Quit",
        (Pane::Form, _) => "[Tab] Next field  [Ctrl+G] Generate  [Esc] Output  [Ctrl+C] Quit",
        (Pane::Output, ViewState::Success(_)) => {
            "[Tab] Switch tab  [j/k] Select  [y] Copy  [Y] Copy all  [e] Edit  [q] Quit"
        }
        (Pane::Output, _) => "[e] Edit  [q] Quit",
    }
}

/// Draw the main UI.
pub fn draw_ui(f: &mut Frame, app: &mut App) {
    // Increment frame counter for animations
    app.frame_count = app.frame_count.wrapping_add(1);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Form + output
            Constraint::Length(3), // Command panel (border + 1 content row + border)
        ])
        .split(f.area());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(42), Constraint::Percentage(58)])
        .split(chunks[0]);

    draw_form(f, app, panes[0]);
    draw_output(f, app, panes[1]);

    // Command panel with keyboard shortcuts (left) and status indicator (right)
    let state = app.view.state();
    let shortcuts = shortcuts(app);
    let status_dot = "● ";
    let status_text = state.label();
    let status_color = pulsing_color(state, app.frame_count);

    // Calculate spacing to right-align the status indicator
    let inner_width = chunks[1].width.saturating_sub(2) as usize;
    let status_len = status_dot.width() + status_text.width();
    let spacing = inner_width.saturating_sub(shortcuts.width() + status_len);

    let command_line = Line::from(vec![
        Span::styled(shortcuts, Style::default().fg(Color::DarkGray)),
        Span::raw(" ".repeat(spacing)),
        Span::styled(status_dot, Style::default().fg(status_color)),
        Span::styled(status_text, Style::default().fg(status_color)),
    ]);

    let command_panel = Paragraph::new(command_line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(border_type(state))
            .border_style(Style::default().fg(status_color)),
    );

    f.render_widget(command_panel, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{MockClipboard, test_app};
    use crate::client::tests::MockBackend;
    use crate::client::{GENERATION_FAILED_MESSAGE, parse_generation};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    fn render(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| draw_ui(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn idle_app() -> App {
        test_app(Arc::new(MockBackend::new(Vec::new())), MockClipboard::default())
    }

    // truncate_str tests

    #[test]
    fn test_truncate_str_short_string() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_str_long_string() {
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hello world", 10), "hello w...");
    }

    #[test]
    fn test_truncate_str_with_newlines() {
        assert_eq!(truncate_str("hello\nworld", 20), "hello world");
        assert_eq!(truncate_str("hello\nworld", 8), "hello...");
    }

    #[test]
    fn test_truncate_str_multibyte() {
        assert_eq!(truncate_str("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn test_truncate_str_small_max_len() {
        // max_len < 3 should still work via saturating_sub
        assert_eq!(truncate_str("hello", 2), "...");
        assert_eq!(truncate_str("hello", 4), "h...");
    }

    #[test]
    fn test_contract_path_outside_home() {
        assert_eq!(contract_path(Path::new("/definitely/not/home")), "/definitely/not/home");
    }

    #[test]
    fn test_contract_path_inside_home() {
        if let Some(home) = dirs::home_dir() {
            let path = home.join("logs").join("repo-guide");
            assert_eq!(contract_path(&path), "~/logs/repo-guide");
        }
    }

    #[test]
    fn test_rendered_height_saturates() {
        let text = "a\n".repeat(70_000);
        let paragraph = Paragraph::new(text.as_str()).wrap(Wrap { trim: false });
        assert_eq!(rendered_height(&paragraph, 10), u16::MAX);

        let short = Paragraph::new("one\ntwo").wrap(Wrap { trim: false });
        assert_eq!(rendered_height(&short, 10), 2);
    }

    #[test]
    fn test_pulsing_color_alternates_on_failure() {
        let failure = ViewState::Failure("x".to_string());
        assert_eq!(pulsing_color(&failure, 0), Color::Red);
        assert_eq!(pulsing_color(&failure, 15), Color::Rgb(128, 0, 0));
        assert_eq!(pulsing_color(&ViewState::Idle, 15), Color::Cyan);
    }

    #[test]
    fn test_skeleton_fills_available_height() {
        let lines = skeleton_lines(40, 10, 0);
        assert_eq!(lines.len(), 9);
        assert!(skeleton_lines(40, 2, 0).is_empty());
    }

    #[tokio::test]
    async fn test_render_idle_placeholder() {
        let mut app = idle_app();
        let screen = render(&mut app, 160, 30);
        assert!(screen.contains("Ready to build?"));
        assert!(screen.contains("IDLE"));
        assert!(screen.contains("New repository"));
    }

    #[tokio::test]
    async fn test_render_loading_skeleton() {
        let mut app = idle_app();
        app.view.submit();
        let screen = render(&mut app, 160, 30);
        assert!(screen.contains("Generating your repository guide..."));
        assert!(screen.contains("▒"));
        assert!(screen.contains("GENERATING"));
    }

    #[tokio::test]
    async fn test_render_failure_message() {
        let mut app = idle_app();
        let ticket = app.view.submit();
        app.view.on_error(ticket, GENERATION_FAILED_MESSAGE);
        let screen = render(&mut app, 200, 30);
        assert!(screen.contains(GENERATION_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn test_render_success_tabs() {
        let mut app = idle_app();
        let ticket = app.view.submit();
        let result = parse_generation(
            r##"{"steps":[{"command":"git init","explanation":"Initialize"},{"command":"git push -u origin main","explanation":"Publish"}],"readmeMarkdown":"# demo\n\nA demo project."}"##,
        )
        .unwrap();
        app.view.on_success(ticket, result);
        app.focus = Pane::Output;

        let screen = render(&mut app, 160, 30);
        assert!(screen.contains("Git Commands"));
        assert!(screen.contains("1. Initialize"));
        assert!(screen.contains("$ git init"));
        assert!(screen.contains("$ git push -u origin main"));
        assert!(!screen.contains("A demo project."));

        app.output.select_tab(OutputTab::Readme);
        let screen = render(&mut app, 160, 30);
        assert!(screen.contains("# demo"));
        assert!(screen.contains("A demo project."));
    }

    #[tokio::test]
    async fn test_render_selected_step_stays_visible() {
        let mut app = idle_app();
        let ticket = app.view.submit();
        let steps: Vec<String> = (0..20)
            .map(|i| format!(r#"{{"command":"echo {}","explanation":"step {}"}}"#, i, i))
            .collect();
        let raw = format!(r#"{{"steps":[{}],"readmeMarkdown":""}}"#, steps.join(","));
        app.view.on_success(ticket, parse_generation(&raw).unwrap());
        app.output.selected_step = 19;

        let screen = render(&mut app, 160, 20);
        assert!(screen.contains("$ echo 19"));
        assert!(app.output.scroll_offset > 0);
    }

    #[tokio::test]
    async fn test_render_copied_indicator() {
        let mut app = idle_app();
        let ticket = app.view.submit();
        app.view
            .on_success(ticket, parse_generation(crate::client::tests::ONE_STEP_REPLY).unwrap());
        app.output.mark_copied(Instant::now());
        let screen = render(&mut app, 160, 30);
        assert!(screen.contains("Copied"));
    }
}
