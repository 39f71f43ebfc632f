//! Output pane state: active tab, selection, scroll and copy feedback.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyModifiers};

use crate::app::{App, Pane};

/// How long the "Copied" acknowledgment stays visible.
pub const COPY_FEEDBACK_DURATION: Duration = Duration::from_secs(2);

/// Tabs of the success view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputTab {
    #[default]
    Commands,
    Readme,
}

impl OutputTab {
    pub fn toggle(self) -> Self {
        match self {
            Self::Commands => Self::Readme,
            Self::Readme => Self::Commands,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Commands => "Git Commands",
            Self::Readme => "README.md",
        }
    }
}

/// State owned by the rendering layer for the success view.
#[derive(Debug, Clone, Default)]
pub struct OutputPanelState {
    pub active_tab: OutputTab,
    /// Selected step index on the commands tab.
    pub selected_step: usize,
    /// Scroll offset of the visible tab content.
    pub scroll_offset: u16,
    /// Height of the content area (excluding borders and tab bar).
    pub pane_height: u16,
    /// Width of the content area, used to wrap the README.
    pub pane_width: u16,
    /// When the last successful copy happened.
    pub copied_at: Option<Instant>,
}

impl OutputPanelState {
    /// Reset for a freshly received result. Always lands on the commands tab.
    pub fn reset_for_new_result(&mut self) {
        self.active_tab = OutputTab::Commands;
        self.selected_step = 0;
        self.scroll_offset = 0;
        self.copied_at = None;
    }

    pub fn select_tab(&mut self, tab: OutputTab) {
        if self.active_tab != tab {
            self.active_tab = tab;
            self.scroll_offset = 0;
        }
    }

    pub fn select_next(&mut self, step_count: usize) {
        if step_count > 0 && self.selected_step + 1 < step_count {
            self.selected_step += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected_step = self.selected_step.saturating_sub(1);
    }

    pub fn scroll_up(&mut self, amount: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: u16, max: u16) {
        self.scroll_offset = (self.scroll_offset.saturating_add(amount)).min(max);
    }

    pub fn mark_copied(&mut self, now: Instant) {
        self.copied_at = Some(now);
    }

    /// Whether the copy acknowledgment should still be shown at `now`.
    pub fn copy_acknowledged(&self, now: Instant) -> bool {
        self.copied_at
            .is_some_and(|at| now.saturating_duration_since(at) < COPY_FEEDBACK_DURATION)
    }
}

/// Handle keyboard input while the output pane has focus.
pub fn handle_output_input(app: &mut App, key_code: KeyCode, modifiers: KeyModifiers) {
    let step_count = app.step_count();
    match key_code {
        KeyCode::Esc | KeyCode::Char('e') | KeyCode::Char('i') => app.focus = Pane::Form,

        KeyCode::Tab | KeyCode::BackTab | KeyCode::Char('[') | KeyCode::Char(']') => {
            let next = app.output.active_tab.toggle();
            app.output.select_tab(next);
        }
        KeyCode::Char('1') => app.output.select_tab(OutputTab::Commands),
        KeyCode::Char('2') => app.output.select_tab(OutputTab::Readme),

        KeyCode::Char('j') | KeyCode::Down => match app.output.active_tab {
            OutputTab::Commands => app.output.select_next(step_count),
            OutputTab::Readme => {
                let max = app.readme_max_scroll();
                app.output.scroll_down(1, max);
            }
        },
        KeyCode::Char('k') | KeyCode::Up => match app.output.active_tab {
            OutputTab::Commands => app.output.select_prev(),
            OutputTab::Readme => app.output.scroll_up(1),
        },
        KeyCode::Char('d')
            if modifiers.contains(KeyModifiers::CONTROL)
                && app.output.active_tab == OutputTab::Readme =>
        {
            let half_page = app.output.pane_height / 2;
            let max = app.readme_max_scroll();
            app.output.scroll_down(half_page, max);
        }
        KeyCode::Char('u')
            if modifiers.contains(KeyModifiers::CONTROL)
                && app.output.active_tab == OutputTab::Readme =>
        {
            let half_page = app.output.pane_height / 2;
            app.output.scroll_up(half_page);
        }

        KeyCode::Char('y') => app.copy_current(),
        KeyCode::Char('Y') => app.copy_all_commands(),

        _ => {}
    }
}
