//! Language model integration
//!
//! Provides the OpenAI-compatible chat-completions backend and prompt
//! construction for tutoring conversations. The assessment prompt lives with
//! the scorer; this crate owns the conversational side and the transport.

pub mod backend;
pub mod prompt;
pub mod replies;

pub use backend::{OpenAiBackend, OpenAiConfig};
pub use prompt::{PromptBuilder, ResponseTemplates};
pub use replies::{ConversationReplier, ReplierConfig};
