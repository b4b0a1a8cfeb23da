use std::sync::Arc;

use changi_core::{AskBackend, AskError, ChatPanel, ChatSurface, ChatWidget, Health, SubmitPolicy};
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;

use crate::tui::AppEvent;

/// What the start-up probe learned about the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendHealth {
    Checking,
    Online,
    Degraded,
    Unreachable,
}

impl BackendHealth {
    pub fn label(&self) -> &'static str {
        match self {
            BackendHealth::Checking => "checking",
            BackendHealth::Online => "online",
            BackendHealth::Degraded => "degraded",
            BackendHealth::Unreachable => "unreachable",
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub widget: ChatWidget<ChatPanel>,
    pub base_url: String,
    pub health: BackendHealth,

    // Animation state
    pub animation_frame: u8, // 0-2 for the pending spinner

    // Areas for mouse hit-testing (updated during render)
    pub history_area: Option<Rect>,
    pub input_area: Option<Rect>,
    pub send_area: Option<Rect>,

    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        backend: Arc<dyn AskBackend>,
        policy: SubmitPolicy,
        base_url: &str,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            widget: ChatWidget::new(ChatPanel::new(), backend, policy),
            base_url: base_url.to_string(),
            health: BackendHealth::Checking,
            animation_frame: 0,
            history_area: None,
            input_area: None,
            send_area: None,
            events,
        }
    }

    pub fn panel(&self) -> &ChatPanel {
        self.widget.surface()
    }

    pub fn panel_mut(&mut self) -> &mut ChatPanel {
        self.widget.surface_mut()
    }

    /// Send whatever is in the input field. The request runs on its own task
    /// and reports back as `AppEvent::Answer`, so the UI keeps taking input.
    pub fn submit(&mut self) {
        let Some(submission) = self.widget.begin_submit() else {
            return;
        };

        let tx = self.events.clone();
        tokio::spawn(async move {
            let outcome = submission.resolve().await;
            // The receiver is gone only when the app is shutting down
            let _ = tx.send(AppEvent::Answer(outcome));
        });
    }

    pub fn settle(&mut self, outcome: Result<String, AskError>) {
        self.widget.settle(outcome);
    }

    pub fn set_health(&mut self, probe: Result<Health, AskError>) {
        self.health = match probe {
            Ok(Health::Healthy) => BackendHealth::Online,
            Ok(Health::Unhealthy) => {
                tracing::warn!(base_url = %self.base_url, "backend reports unhealthy");
                BackendHealth::Degraded
            }
            Err(err) => {
                tracing::warn!(base_url = %self.base_url, error = %err, "backend health probe failed");
                BackendHealth::Unreachable
            }
        };
    }

    pub fn is_pending(&self) -> bool {
        self.widget.in_flight() > 0
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn toggle_focus(&mut self) {
        let panel = self.panel_mut();
        if panel.is_input_focused() {
            panel.blur_input();
        } else {
            panel.focus_input();
        }
    }
}
