use std::fmt;

/// Evaluation failures. None of them stops a render: each one is turned
/// into an inline marker by the active [`ErrorFormatter`] and evaluation
/// carries on.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// No visible definition or binding has this name.
    BlockNotFound(String),
    /// A parameter reference could not be satisfied by an argument, a
    /// default, or a block of the same name.
    ParameterNotFound(String),
    /// A self-referential definition was entered more often than allowed.
    RecursionLimit { name: String, limit: usize },
    DeadlineExceeded,
    /// Invalid input to a built-in, already phrased for the reader.
    Validation(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::BlockNotFound(name) => write!(f, "block not found: {}", name),
            EvalError::ParameterNotFound(name) => write!(f, "parameter not found: {}", name),
            EvalError::RecursionLimit { name, limit } => {
                write!(f, "recursion limit of {} reached in {}", limit, name)
            }
            EvalError::DeadlineExceeded => write!(f, "render deadline exceeded"),
            EvalError::Validation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for EvalError {}

/// Turns evaluation errors into the text placed in the output.
pub trait ErrorFormatter: Send + Sync {
    fn format(&self, error: &EvalError) -> String;
}

/// Bracketed English markers: `[name not found]`,
/// `[recurrence limit for name]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorFormatter;

impl ErrorFormatter for DefaultErrorFormatter {
    fn format(&self, error: &EvalError) -> String {
        match error {
            EvalError::BlockNotFound(name) | EvalError::ParameterNotFound(name) => {
                format!("[{} not found]", name)
            }
            EvalError::RecursionLimit { name, .. } => format!("[recurrence limit for {}]", name),
            EvalError::DeadlineExceeded => "[render deadline exceeded]".to_string(),
            EvalError::Validation(msg) => format!("[{}]", msg),
        }
    }
}
