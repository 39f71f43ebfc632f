//! Application state and core logic.

use std::path::PathBuf;
use std::time::Instant;

use ratatui::widgets::{Paragraph, Wrap};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::client::{BackendError, GenerationClient, GenerationResult};
use crate::clipboard::ClipboardSink;
use crate::config::{Config, ConfigLoadStatus, LoadedConfig};
use crate::form::{FormField, RepoFormState};
use crate::output::{OutputPanelState, OutputTab};
use crate::ui::rendered_height;
use crate::view::{GenerationView, RequestTicket, Resolution, ViewState};

/// Which pane receives keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    Form,
    Output,
}

/// Outcome of a spawned generation, tagged with the ticket it was issued under.
#[derive(Debug)]
pub struct GenerationOutcome {
    pub ticket: RequestTicket,
    pub result: Result<GenerationResult, BackendError>,
}

/// Main application state.
pub struct App {
    /// Session ID for this invocation (None if logging failed to start).
    pub session_id: Option<String>,
    /// Directory where logs are written.
    pub log_directory: Option<PathBuf>,
    /// Error that occurred during logging initialization.
    pub logging_error: Option<String>,
    /// Loaded configuration.
    pub config: Config,
    /// Path to the configuration file.
    pub config_path: PathBuf,
    /// Status of config loading.
    pub config_status: ConfigLoadStatus,
    pub form: RepoFormState,
    pub view: GenerationView,
    pub output: OutputPanelState,
    pub focus: Pane,
    /// Frame counter for animations (incremented each render cycle).
    pub frame_count: u64,
    client: GenerationClient,
    runtime: Handle,
    outcome_tx: UnboundedSender<GenerationOutcome>,
    outcome_rx: UnboundedReceiver<GenerationOutcome>,
    clipboard: Box<dyn ClipboardSink>,
}

impl App {
    pub fn new(
        session_id: Option<String>,
        log_directory: Option<PathBuf>,
        logging_error: Option<String>,
        loaded_config: LoadedConfig,
        client: GenerationClient,
        runtime: Handle,
        clipboard: Box<dyn ClipboardSink>,
    ) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let form = RepoFormState::from_config(&loaded_config.config.form);
        Self {
            session_id,
            log_directory,
            logging_error,
            config: loaded_config.config,
            config_path: loaded_config.config_path,
            config_status: loaded_config.status,
            form,
            view: GenerationView::new(),
            output: OutputPanelState::default(),
            focus: Pane::default(),
            frame_count: 0,
            client,
            runtime,
            outcome_tx,
            outcome_rx,
            clipboard,
        }
    }

    /// Submit the form. Ignored while a request is in flight.
    pub fn submit(&mut self) {
        if self.view.is_loading() {
            debug!("submit_ignored_in_flight");
            return;
        }

        let request = match self.form.to_request() {
            Ok(request) => request,
            Err(e) => {
                self.form.error = Some(e.to_string());
                self.form.focus = FormField::Name;
                self.form.cursor_end();
                return;
            }
        };

        let ticket = self.view.submit();
        self.focus = Pane::Output;
        info!(ticket = ticket.id(), repo = %request.name(), "submit");

        let client = self.client.clone();
        let tx = self.outcome_tx.clone();
        self.runtime.spawn(async move {
            let result = client.generate(&request).await;
            // Receiver is gone only when the app is shutting down.
            let _ = tx.send(GenerationOutcome { ticket, result });
        });
    }

    /// Drain finished generations into the view.
    pub fn poll_generation(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.apply_outcome(outcome);
        }
    }

    fn apply_outcome(&mut self, outcome: GenerationOutcome) {
        let GenerationOutcome { ticket, result } = outcome;
        match result {
            Ok(result) => {
                if self.view.on_success(ticket, result) == Resolution::Applied {
                    self.output.reset_for_new_result();
                }
            }
            Err(e) => {
                self.view.on_error(ticket, e.user_message());
            }
        }
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        match self.view.state() {
            ViewState::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn step_count(&self) -> usize {
        self.result().map(|r| r.steps.len()).unwrap_or(0)
    }

    /// Wrapped line count of the README at the current pane width.
    pub fn readme_line_count(&self) -> u16 {
        let Some(result) = self.result() else {
            return 0;
        };
        if self.output.pane_width == 0 {
            return 0;
        }
        let paragraph = Paragraph::new(result.readme_markdown.as_str()).wrap(Wrap { trim: false });
        rendered_height(&paragraph, self.output.pane_width)
    }

    pub fn readme_max_scroll(&self) -> u16 {
        self.readme_line_count()
            .saturating_sub(self.output.pane_height)
    }

    /// Copy the selected command or the README, depending on the active tab.
    pub fn copy_current(&mut self) {
        let text = match (self.result(), self.output.active_tab) {
            (Some(result), OutputTab::Commands) => result
                .steps
                .get(self.output.selected_step)
                .map(|step| step.command.clone()),
            (Some(result), OutputTab::Readme) => Some(result.readme_markdown.clone()),
            (None, _) => None,
        };
        if let Some(text) = text {
            self.copy_text(&text);
        }
    }

    /// Copy every command, one per line.
    pub fn copy_all_commands(&mut self) {
        if let Some(script) = self.result().map(GenerationResult::commands_script) {
            self.copy_text(&script);
        }
    }

    fn copy_text(&mut self, text: &str) {
        match self.clipboard.copy(text) {
            Ok(()) => {
                info!(chars = text.chars().count(), "clipboard_copy");
                self.output.mark_copied(Instant::now());
            }
            Err(e) => {
                warn!(error = %e, "clipboard_copy_failed");
            }
        }
    }
}
