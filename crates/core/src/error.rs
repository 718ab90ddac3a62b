use std::error::Error as StdError;
use std::fmt::{self, Display};

use websage_model::{ErrorKind, ModelProviderError};

/// The error returned when the model could not produce an answer.
#[derive(Debug)]
pub enum GenerationError {
    /// The model provider failed.
    Model(Box<dyn ModelProviderError>),
    /// The model kept asking for tools beyond the allowed number of
    /// round-trips.
    TooManyTurns(usize),
}

impl GenerationError {
    /// Returns the kind of the underlying provider error, if any.
    #[inline]
    pub fn model_error_kind(&self) -> Option<ErrorKind> {
        match self {
            GenerationError::Model(err) => Some(err.kind()),
            GenerationError::TooManyTurns(_) => None,
        }
    }
}

impl Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Model(err) => write!(f, "model error: {err}"),
            GenerationError::TooManyTurns(max_turns) => write!(
                f,
                "the model requested tools more than {max_turns} times in a row"
            ),
        }
    }
}

impl StdError for GenerationError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            GenerationError::Model(err) => Some(err.as_ref()),
            GenerationError::TooManyTurns(_) => None,
        }
    }
}
