use std::fmt::{self, Display};

/// Why a tool call produced no output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The model passed arguments that do not match the tool's schema.
    InvalidInput,
    /// The tool ran and failed, e.g. the search backend was unreachable.
    ExecutionError,
    /// The model asked for a tool that is not registered.
    NotFound,
}

/// A failed tool call.
///
/// Tool failures never abort a generation. The reason is handed back to
/// the model as the tool output, see [`Error::to_tool_output`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    kind: ErrorKind,
    reason: String,
}

impl Error {
    /// Creates an error of the given kind.
    #[inline]
    pub fn new<S: Into<String>>(kind: ErrorKind, reason: S) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    /// Creates an [`ErrorKind::InvalidInput`] error.
    #[inline]
    pub fn invalid_input<S: Into<String>>(reason: S) -> Self {
        Self::new(ErrorKind::InvalidInput, reason)
    }

    /// Creates an [`ErrorKind::ExecutionError`] error.
    #[inline]
    pub fn execution<S: Into<String>>(reason: S) -> Self {
        Self::new(ErrorKind::ExecutionError, reason)
    }

    /// Creates the error for a call to an unregistered tool.
    #[inline]
    pub fn unknown_tool(name: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("unknown tool `{name}`"))
    }

    /// Returns the kind of the error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the reason for the error.
    #[inline]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Renders the error as the text the model reads in place of the
    /// tool output.
    #[inline]
    pub fn to_tool_output(&self) -> String {
        format!("Error: {}", self.reason)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::ExecutionError => "execution failed",
            ErrorKind::NotFound => "not found",
        };
        write!(f, "{kind}: {}", self.reason)
    }
}

impl std::error::Error for Error {}
