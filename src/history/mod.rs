//! Command history and tab suggestions

pub mod ring;
pub mod suggestions;

pub use ring::{CommandHistory, CommandOutcome, CommandRecord, DEFAULT_HISTORY_LIMIT};
pub use suggestions::{complete, suggestions, Suggestion, SuggestionKind, DEFAULT_MAX_SUGGESTIONS};
