mod app;
mod backend;
mod cli;
mod client;
mod clipboard;
mod config;
mod form;
mod form_ui;
mod logging;
mod output;
mod prompt;
mod request;
mod ui;
mod view;

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture, Event,
    KeyCode, KeyEventKind, KeyModifiers, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{DefaultTerminal, Terminal};
use tracing::{debug, info, warn};

use crate::app::{App, Pane};
use crate::backend::GeminiBackend;
use crate::cli::Cli;
use crate::client::GenerationClient;
use crate::clipboard::SystemClipboard;
use crate::form::handle_form_input;
use crate::output::{OutputTab, handle_output_input};
use crate::ui::draw_ui;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();

    // Initialize logging before anything else
    let (session_id, log_directory, logging_error, reload, _guard) = match logging::init() {
        Ok(ctx) => (
            Some(ctx.session_id),
            Some(ctx.log_directory),
            None,
            Some((ctx.reload_handle, ctx.env_filter_set)),
            Some(ctx._guard),
        ),
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            (None, None, Some(e.message), None, None)
        }
    };

    if let Some(dir) = &log_directory {
        logging::cleanup_old_logs(dir);
    }

    // Load configuration
    let mut loaded_config = config::load_config(cli.config.as_deref());
    if let Some(model) = cli.model {
        loaded_config.config.backend.model = model;
    }
    debug!(
        config_path = %loaded_config.config_path.display(),
        status = ?loaded_config.status,
        model = %loaded_config.config.backend.model,
        "config_loaded"
    );

    // RUST_LOG wins over the configured level
    if let Some((handle, env_filter_set)) = &reload
        && !env_filter_set
        && let Err(e) = logging::update_log_level(handle, &loaded_config.config.logging.level)
    {
        warn!(error = %e, "log_level_not_applied");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let config = &loaded_config.config;
    let backend = GeminiBackend::new(&config.backend, config.api_key())?;
    if config.api_key().is_none() {
        warn!(env = %config.backend.api_key_env, "api_key_missing");
    }
    let client = GenerationClient::new(Arc::new(backend));

    let app = App::new(
        session_id.clone(),
        log_directory,
        logging_error,
        loaded_config,
        client,
        runtime.handle().clone(),
        Box::new(SystemClipboard::new()),
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let terminal = Terminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

    let result = run_app(terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;

    // Abandon any in-flight request
    runtime.shutdown_background();

    // Log session end
    if let Some(sid) = session_id {
        let duration = start_time.elapsed();
        info!(
            session_id = %sid,
            duration_secs = duration.as_secs_f64(),
            "session_end"
        );
    }

    result
}

fn run_app(mut terminal: DefaultTerminal, mut app: App) -> Result<()> {
    loop {
        // Pick up finished generations
        app.poll_generation();

        // Draw UI
        terminal.draw(|f| draw_ui(f, &mut app))?;

        // Poll for events with a short timeout so animations and completions keep flowing
        if !crossterm::event::poll(Duration::from_millis(50))? {
            continue;
        }

        match crossterm::event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    return Ok(());
                }
                match app.focus {
                    Pane::Form => handle_form_input(&mut app, key.code, key.modifiers),
                    Pane::Output => {
                        if key.code == KeyCode::Char('q') {
                            return Ok(());
                        }
                        handle_output_input(&mut app, key.code, key.modifiers);
                    }
                }
            }
            Event::Paste(text) => {
                if app.focus == Pane::Form {
                    app.form.insert_str(&text);
                }
            }
            Event::Mouse(mouse) => {
                if app.output.active_tab == OutputTab::Readme {
                    match mouse.kind {
                        MouseEventKind::ScrollUp => app.output.scroll_up(3),
                        MouseEventKind::ScrollDown => {
                            let max = app.readme_max_scroll();
                            app.output.scroll_down(3, max);
                        }
                        _ => {}
                    }
                }
            }
            Event::Resize(_, _) => {
                // Terminal resized, will be handled in next draw
            }
            _ => {}
        }
    }
}
