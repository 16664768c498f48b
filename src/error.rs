use thiserror::Error;

/// Errors raised while building a grammar.
///
/// Matching itself never fails with an error: a failed attempt is the empty
/// result (`None`), see [`Element::match_at`](crate::Element::match_at).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GrammarError {
    #[error("invalid regex pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("invalid grammar configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for grammar construction.
pub type GrammarResult<T> = Result<T, GrammarError>;
