//! Chat widget controller.
//!
//! A submission is split in two: `begin_submit` does the synchronous part
//! (read and trim the input, echo it, clear the field, go Pending) and hands
//! back a [`Submission`] that can be awaited anywhere. Its outcome is fed back
//! through `settle`. Hosts that spawn each submission get overlapping requests
//! whose replies land in arrival order.

use std::sync::Arc;

use crate::ask::{AskBackend, AskError};
use crate::state::{ChatMessage, ChatRole, Status};
use crate::surface::ChatSurface;

/// Shown in place of an answer whenever a request fails for any reason
pub const APOLOGY: &str =
    "Sorry, I'm having trouble answering that right now. Please try again later.";

/// What to do with a submission while another one is still pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitPolicy {
    /// No guard. Requests overlap and replies appear in arrival order.
    #[default]
    Concurrent,
    /// Ignore submissions until the pending request settles.
    SingleFlight,
}

/// A question that has been echoed to the history and is ready to send
pub struct Submission {
    question: String,
    backend: Arc<dyn AskBackend>,
}

impl Submission {
    pub fn question(&self) -> &str {
        &self.question
    }

    pub async fn resolve(self) -> Result<String, AskError> {
        self.backend.ask(&self.question).await
    }
}

pub struct ChatWidget<S: ChatSurface> {
    surface: S,
    backend: Arc<dyn AskBackend>,
    policy: SubmitPolicy,
    in_flight: usize,
}

impl<S: ChatSurface> ChatWidget<S> {
    /// Bind to a surface and move focus to its input field
    pub fn new(mut surface: S, backend: Arc<dyn AskBackend>, policy: SubmitPolicy) -> Self {
        surface.focus_input();
        Self {
            surface,
            backend,
            policy,
            in_flight: 0,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn policy(&self) -> SubmitPolicy {
        self.policy
    }

    /// Number of requests sent but not yet settled
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn append_message(&mut self, text: &str, role: ChatRole) {
        self.surface.append_message(ChatMessage {
            role,
            content: text.to_string(),
        });
        self.surface.scroll_to_bottom();
    }

    /// Returns `None` when there is nothing to send.
    pub fn begin_submit(&mut self) -> Option<Submission> {
        let question = self.surface.input_value().trim().to_string();
        if question.is_empty() {
            return None;
        }

        if self.policy == SubmitPolicy::SingleFlight && self.in_flight > 0 {
            tracing::debug!(in_flight = self.in_flight, "submission ignored while a request is pending");
            return None;
        }

        self.append_message(&question, ChatRole::User);
        self.surface.set_input_value("");
        self.surface.set_status(Status::Pending);
        self.in_flight += 1;

        tracing::info!(question = %question, "question submitted");

        Some(Submission {
            question,
            backend: Arc::clone(&self.backend),
        })
    }

    /// Render the outcome of one submission
    pub fn settle(&mut self, outcome: Result<String, AskError>) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match outcome {
            Ok(answer) => {
                self.append_message(&answer, ChatRole::Assistant);
                self.surface.set_status(Status::Idle);
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to get an answer");
                self.append_message(APOLOGY, ChatRole::Assistant);
                self.surface.set_status(Status::Error);
            }
        }
    }

    /// Submit and wait for the answer in place.
    pub async fn submit(&mut self) {
        if let Some(submission) = self.begin_submit() {
            let outcome = submission.resolve().await;
            self.settle(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ChatPanel;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    /// Replies with a fixed answer, or fails with the given status
    struct FakeBackend {
        reply: Result<String, StatusCode>,
        asked: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        fn answering(answer: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(answer.to_string()),
                asked: Mutex::new(Vec::new()),
            })
        }

        fn failing(status: StatusCode) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(status),
                asked: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AskBackend for FakeBackend {
        async fn ask(&self, question: &str) -> Result<String, AskError> {
            self.asked.lock().unwrap().push(question.to_string());
            match &self.reply {
                Ok(answer) => Ok(answer.clone()),
                Err(status) => Err(AskError::Status(*status)),
            }
        }
    }

    fn widget_with(backend: Arc<FakeBackend>, policy: SubmitPolicy) -> ChatWidget<ChatPanel> {
        ChatWidget::new(ChatPanel::new(), backend, policy)
    }

    fn decode_error() -> AskError {
        AskError::Decode(serde_json::from_str::<serde_json::Value>("not json").unwrap_err())
    }

    #[test]
    fn test_new_focuses_input() {
        let widget = widget_with(FakeBackend::answering("x"), SubmitPolicy::Concurrent);
        assert!(widget.surface().is_input_focused());
        assert_eq!(widget.surface().status(), Status::Idle);
    }

    #[test]
    fn test_append_message_keeps_empty_text() {
        let mut widget = widget_with(FakeBackend::answering("x"), SubmitPolicy::Concurrent);
        widget.append_message("", ChatRole::Assistant);
        assert_eq!(widget.surface().messages(), &[ChatMessage::assistant("")]);
    }

    #[test]
    fn test_begin_submit_trims_echoes_and_clears() {
        let mut widget = widget_with(FakeBackend::answering("x"), SubmitPolicy::Concurrent);
        widget.surface_mut().set_input_value("   Where is the Jewel?  ");

        let submission = widget.begin_submit().unwrap();

        assert_eq!(submission.question(), "Where is the Jewel?");
        assert_eq!(
            widget.surface().messages(),
            &[ChatMessage::user("Where is the Jewel?")]
        );
        assert_eq!(widget.surface().input_value(), "");
        assert_eq!(widget.surface().status(), Status::Pending);
        assert_eq!(widget.in_flight(), 1);
    }

    #[test]
    fn test_blank_input_is_ignored() {
        for input in ["", "   ", "\t\n "] {
            let mut widget = widget_with(FakeBackend::answering("x"), SubmitPolicy::Concurrent);
            widget.surface_mut().set_input_value(input);

            assert!(widget.begin_submit().is_none());
            assert!(widget.surface().messages().is_empty());
            assert_eq!(widget.surface().input_value(), input);
            assert_eq!(widget.surface().status(), Status::Idle);
        }
    }

    #[tokio::test]
    async fn test_submit_success() {
        let backend = FakeBackend::answering("Changi Airport has Terminals 1–4.");
        let mut widget = widget_with(backend.clone(), SubmitPolicy::Concurrent);
        widget.surface_mut().set_input_value("Which terminals exist?");

        widget.submit().await;

        assert_eq!(
            widget.surface().messages(),
            &[
                ChatMessage::user("Which terminals exist?"),
                ChatMessage::assistant("Changi Airport has Terminals 1–4."),
            ]
        );
        assert_eq!(widget.surface().status().text(), "Ready to assist you!");
        assert_eq!(*backend.asked.lock().unwrap(), vec!["Which terminals exist?"]);
        assert_eq!(widget.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_submit_server_error() {
        let mut widget = widget_with(
            FakeBackend::failing(StatusCode::INTERNAL_SERVER_ERROR),
            SubmitPolicy::Concurrent,
        );
        widget.surface_mut().set_input_value("anything");

        widget.submit().await;

        let last = widget.surface().messages().last().unwrap();
        assert_eq!(last, &ChatMessage::assistant(APOLOGY));
        assert_eq!(widget.surface().status().text(), "Error occurred. Please try again.");
    }

    #[test]
    fn test_decode_failure_is_apology() {
        let mut widget = widget_with(FakeBackend::answering("x"), SubmitPolicy::Concurrent);
        widget.surface_mut().set_input_value("hello");
        widget.begin_submit().unwrap();

        widget.settle(Err(decode_error()));

        assert_eq!(
            widget.surface().messages().last().unwrap(),
            &ChatMessage::assistant(APOLOGY)
        );
        assert_eq!(widget.surface().status(), Status::Error);
    }

    #[tokio::test]
    async fn test_repeated_failures_not_deduplicated() {
        let mut widget = widget_with(
            FakeBackend::failing(StatusCode::BAD_GATEWAY),
            SubmitPolicy::Concurrent,
        );
        for _ in 0..2 {
            widget.surface_mut().set_input_value("same question");
            widget.submit().await;
        }

        let apologies = widget
            .surface()
            .messages()
            .iter()
            .filter(|m| m.content == APOLOGY)
            .count();
        assert_eq!(apologies, 2);
        assert_eq!(widget.surface().messages().len(), 4);
    }

    #[tokio::test]
    async fn test_error_recovers_on_next_success() {
        let mut widget = widget_with(FakeBackend::answering("ok"), SubmitPolicy::Concurrent);
        widget.surface_mut().set_input_value("first");
        widget.begin_submit().unwrap();
        widget.settle(Err(AskError::Status(StatusCode::SERVICE_UNAVAILABLE)));
        assert_eq!(widget.surface().status(), Status::Error);

        widget.surface_mut().set_input_value("second");
        let submission = widget.begin_submit().unwrap();
        assert_eq!(widget.surface().status(), Status::Pending);
        let outcome = submission.resolve().await;
        widget.settle(outcome);
        assert_eq!(widget.surface().status(), Status::Idle);
    }

    #[test]
    fn test_overlapping_replies_land_in_arrival_order() {
        let mut widget = widget_with(FakeBackend::answering("x"), SubmitPolicy::Concurrent);
        widget.surface_mut().set_input_value("first");
        let first = widget.begin_submit();
        widget.surface_mut().set_input_value("second");
        let second = widget.begin_submit();
        assert!(first.is_some() && second.is_some());
        assert_eq!(widget.in_flight(), 2);

        // The second request answers first
        widget.settle(Ok("answer to second".to_string()));
        widget.settle(Ok("answer to first".to_string()));

        let contents: Vec<&str> = widget
            .surface()
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            contents,
            vec!["first", "second", "answer to second", "answer to first"]
        );
        assert_eq!(widget.in_flight(), 0);
    }

    #[test]
    fn test_single_flight_ignores_while_pending() {
        let mut widget = widget_with(FakeBackend::answering("x"), SubmitPolicy::SingleFlight);
        widget.surface_mut().set_input_value("first");
        assert!(widget.begin_submit().is_some());

        widget.surface_mut().set_input_value("second");
        assert!(widget.begin_submit().is_none());
        assert_eq!(widget.surface().input_value(), "second");
        assert_eq!(widget.surface().messages().len(), 1);

        widget.settle(Ok("done".to_string()));
        assert!(widget.begin_submit().is_some());
    }
}
