pub mod bindings;
mod environment;
pub mod error;
pub mod evaluator;
pub mod evaluator_helpers;
pub mod library;
pub mod options;
pub mod runtime_value;
pub mod template;

pub use bindings::{Bindings, NativeBlock};
pub use error::{DefaultErrorFormatter, ErrorFormatter, EvalError};
pub use evaluator::Interpreter;
pub use options::{DEFAULT_RECURSION_LIMIT, MAX_RECURSION_LIMIT, RenderOptions};
pub use runtime_value::{Fragment, Value};
pub use template::{Template, render};
