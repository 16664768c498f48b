use layered_extract::GrammarError;
use layered_extract_model::ModelError;
use thiserror::Error;

/// Errors raised while assembling parsers for a schema.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AutoError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type AutoResult<T> = Result<T, AutoError>;
