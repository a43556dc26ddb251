use mrkev::ast::Ast;
use mrkev::parser::ParseError;
use tracing::debug;

use crate::bindings::Bindings;
use crate::evaluator::Interpreter;
use crate::library::library;
use crate::options::RenderOptions;
use crate::runtime_value::{Fragment, concat};

/// A compiled template, rendered any number of times with different
/// bindings.
pub struct Template {
    ast: Ast,
    library: Bindings,
    options: RenderOptions,
}

impl Template {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        Self::with_filename(source, "<stdin>")
    }

    /// Compile with `filename` reported in parse errors.
    pub fn with_filename(source: &str, filename: &str) -> Result<Self, ParseError> {
        let ast = mrkev::compile(source, filename, 0)?;
        Ok(Self::from_ast(ast))
    }

    pub fn from_ast(ast: Ast) -> Self {
        Template {
            ast,
            library: library(),
            options: RenderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace or extend the built-in blocks.
    pub fn with_library(mut self, extra: Bindings) -> Self {
        self.library.extend(extra);
        self
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn render(&self, bindings: &Bindings) -> String {
        concat(&self.render_fragments(bindings))
    }

    /// Render without concatenating, e.g. to inspect error markers.
    pub fn render_fragments(&self, bindings: &Bindings) -> Vec<Fragment> {
        debug!(
            bindings = bindings.len(),
            definitions = self.ast.definitions().len(),
            "rendering template"
        );
        let mut interpreter = Interpreter::new(&self.ast, self.options.clone());
        interpreter.push_bindings(&self.library);
        interpreter.push_bindings(bindings);
        interpreter.evaluate()
    }
}

/// Compile and render in one go.
pub fn render(source: &str, bindings: &Bindings) -> Result<String, ParseError> {
    Ok(Template::new(source)?.render(bindings))
}
