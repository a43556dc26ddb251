pub mod error;
mod scanner;
mod structural;

pub use error::ParseError;

use crate::tree::ParseNode;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
    filename: String,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser {
            source,
            file_id,
            filename: "<stdin>".to_string(),
        }
    }

    /// Name reported in error messages.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Parse the template source into a raw parse tree.
    pub fn parse(&self) -> Result<Vec<ParseNode>, ParseError> {
        structural::parse_document(&self.source, self.file_id, &self.filename)
    }
}
