//! View state machine driven by generation outcomes.

use tracing::debug;

use crate::client::GenerationResult;

/// What the output pane currently shows. Exactly one is active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Success(GenerationResult),
    Failure(String),
}

impl ViewState {
    pub fn label(&self) -> &'static str {
        match self {
            ViewState::Idle => "IDLE",
            ViewState::Loading => "GENERATING",
            ViewState::Success(_) => "READY",
            ViewState::Failure(_) => "ERROR",
        }
    }
}

/// Identifies one submission. Only the latest ticket may resolve the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Whether an outcome changed the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Stale,
}

/// Owns the [`ViewState`] and the ticket of the latest submission.
#[derive(Debug, Default)]
pub struct GenerationView {
    state: ViewState,
    issued: u64,
    pending: Option<RequestTicket>,
}

impl GenerationView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ViewState::Loading)
    }

    /// Enter `Loading` and issue a fresh ticket.
    ///
    /// Callers must not submit while loading. If they do anyway, the earlier
    /// ticket becomes stale and its outcome is dropped.
    pub fn submit(&mut self) -> RequestTicket {
        self.issued += 1;
        let ticket = RequestTicket(self.issued);
        if let Some(previous) = self.pending.replace(ticket) {
            debug!(superseded = previous.id(), ticket = ticket.id(), "request_superseded");
        }
        self.state = ViewState::Loading;
        ticket
    }

    /// `Loading --onSuccess--> Success` for the latest ticket.
    pub fn on_success(&mut self, ticket: RequestTicket, result: GenerationResult) -> Resolution {
        self.resolve(ticket, ViewState::Success(result))
    }

    /// `Loading --onError--> Failure` for the latest ticket.
    pub fn on_error(&mut self, ticket: RequestTicket, message: impl Into<String>) -> Resolution {
        self.resolve(ticket, ViewState::Failure(message.into()))
    }

    fn resolve(&mut self, ticket: RequestTicket, next: ViewState) -> Resolution {
        if self.pending != Some(ticket) || !self.is_loading() {
            debug!(
                ticket = ticket.id(),
                latest = self.issued,
                "stale_outcome_discarded"
            );
            return Resolution::Stale;
        }
        self.pending = None;
        self.state = next;
        Resolution::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GitCommandStep;

    fn result(readme: &str) -> GenerationResult {
        GenerationResult {
            steps: vec![GitCommandStep {
                command: "git init".to_string(),
                explanation: "Initialize".to_string(),
            }],
            readme_markdown: readme.to_string(),
        }
    }

    #[test]
    fn test_starts_idle() {
        let view = GenerationView::new();
        assert_eq!(view.state(), &ViewState::Idle);
        assert!(!view.is_loading());
    }

    #[test]
    fn test_submit_enters_loading() {
        let mut view = GenerationView::new();
        view.submit();
        assert_eq!(view.state(), &ViewState::Loading);
    }

    #[test]
    fn test_success_transition() {
        let mut view = GenerationView::new();
        let ticket = view.submit();
        assert_eq!(view.on_success(ticket, result("# a")), Resolution::Applied);
        assert_eq!(view.state(), &ViewState::Success(result("# a")));
    }

    #[test]
    fn test_error_transition() {
        let mut view = GenerationView::new();
        let ticket = view.submit();
        assert_eq!(view.on_error(ticket, "boom"), Resolution::Applied);
        assert_eq!(view.state(), &ViewState::Failure("boom".to_string()));
    }

    #[test]
    fn test_resubmit_from_success_and_failure() {
        let mut view = GenerationView::new();
        let first = view.submit();
        view.on_error(first, "boom");

        let second = view.submit();
        assert!(view.is_loading());
        view.on_success(second, result("# ok"));

        let third = view.submit();
        assert!(view.is_loading());
        assert!(third > second);
    }

    #[test]
    fn test_later_submission_wins_over_stale_outcome() {
        let mut view = GenerationView::new();
        let first = view.submit();
        let second = view.submit();

        assert_eq!(view.on_success(second, result("# second")), Resolution::Applied);
        assert_eq!(view.on_success(first, result("# first")), Resolution::Stale);

        assert_eq!(view.state(), &ViewState::Success(result("# second")));
    }

    #[test]
    fn test_stale_outcome_arriving_first_is_dropped() {
        let mut view = GenerationView::new();
        let first = view.submit();
        let second = view.submit();

        assert_eq!(view.on_error(first, "late failure"), Resolution::Stale);
        assert!(view.is_loading());

        view.on_success(second, result("# second"));
        assert_eq!(view.state(), &ViewState::Success(result("# second")));
    }

    #[test]
    fn test_outcome_without_submission_is_stale() {
        let mut view = GenerationView::new();
        let ticket = view.submit();
        view.on_success(ticket, result("# a"));

        // Same ticket resolving twice does not overwrite the view.
        assert_eq!(view.on_error(ticket, "dup"), Resolution::Stale);
        assert_eq!(view.state(), &ViewState::Success(result("# a")));
    }

    #[test]
    fn test_failure_does_not_poison_next_request() {
        let mut view = GenerationView::new();
        let first = view.submit();
        view.on_error(first, "boom");
        let second = view.submit();
        view.on_success(second, result("# fine"));
        assert_eq!(view.state(), &ViewState::Success(result("# fine")));
    }

    #[test]
    fn test_labels() {
        assert_eq!(ViewState::Idle.label(), "IDLE");
        assert_eq!(ViewState::Loading.label(), "GENERATING");
        assert_eq!(ViewState::Failure(String::new()).label(), "ERROR");
    }
}
