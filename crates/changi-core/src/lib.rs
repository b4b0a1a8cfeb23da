pub mod ask;
pub mod config;
pub mod state;
pub mod surface;
pub mod widget;

// Re-export main types for convenience
pub use ask::{AskBackend, AskClient, AskError, Health};
pub use config::Config;
pub use state::{ChatMessage, ChatRole, Status};
pub use surface::{ChatPanel, ChatSurface};
pub use widget::{ChatWidget, SubmitPolicy, Submission, APOLOGY};
