//! Pronunciation assessment pipeline
//!
//! Two scoring paths produce the same [`PronunciationFeedback`] shape:
//! - a model-backed scorer that prompts a language model and validates its
//!   JSON output, and
//! - a deterministic fallback scorer that compares tokens positionally and
//!   never touches the network.
//!
//! The fallback runs only when the model responded with output that fails
//! validation. A model call that fails outright (network, auth, timeout)
//! surfaces to the caller as unavailable.

pub mod fallback;
pub mod model;
pub mod normalize;
pub mod scorer;

pub use fallback::score_fallback;
pub use model::{ModelScorer, ModelScorerConfig};
pub use normalize::{normalize, tokenize};
pub use scorer::{PronunciationScorer, ScorerConfig};
