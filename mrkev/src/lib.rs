pub mod ast;
pub mod parser;
pub mod sigil;
pub mod translator;
pub mod tree;

use crate::ast::Ast;
use crate::parser::{ParseError, Parser};

/// Parse and translate `source` in one step.
///
/// The returned [`Ast`] is immutable and can be rendered any number of times.
pub fn compile(source: &str, filename: &str, file_id: usize) -> Result<Ast, ParseError> {
    let nodes = Parser::new(source.to_string(), file_id)
        .with_filename(filename)
        .parse()?;
    Ok(translator::translate(nodes))
}
