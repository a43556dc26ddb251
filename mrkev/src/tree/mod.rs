use std::ops::Range;

use crate::sigil::{CONTENT, DEFINITION};

/// A node of the raw parse tree, before any semantic resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseNode {
    /// Literal text, exactly as written in the source.
    Literal(String),
    /// A bracketed block: `[name param=[...] ...]`.
    Block(Block),
}

impl ParseNode {
    pub fn literal(text: impl Into<String>) -> Self {
        ParseNode::Literal(text.into())
    }

    /// A parameterless block, as produced by every shortcut syntax.
    pub fn reference(name: impl Into<String>) -> Self {
        ParseNode::Block(Block::new(name))
    }
}

/// A named block with its parameters in source order.
#[derive(Debug, Clone)]
pub struct Block {
    /// Block name, e.g. `user.nickname` in `[user.nickname]`.
    pub name: String,
    /// Parameters in source order; names are unique within one block.
    pub params: Vec<Param>,
    /// Byte span in source for error reporting.
    pub span: Range<usize>,
}

/// One `name=[content]` parameter of a block.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub content: Vec<ParseNode>,
}

impl Block {
    pub fn new(name: impl Into<String>) -> Self {
        Block {
            name: name.into(),
            params: Vec::new(),
            span: 0..0,
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, content: Vec<ParseNode>) -> Self {
        self.params.push(Param {
            name: name.into(),
            content,
        });
        self
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn param_mut(&mut self, name: &str) -> Option<&mut Param> {
        self.params.iter_mut().find(|p| p.name == name)
    }

    /// The content parameter (`#`), if present.
    pub fn content(&self) -> Option<&[ParseNode]> {
        self.param(CONTENT).map(|p| p.content.as_slice())
    }

    /// True if the block carries the definition marker (`:=`).
    pub fn is_definition(&self) -> bool {
        self.param(DEFINITION).is_some()
    }
}

// Spans are diagnostics only; two blocks written in different places are
// structurally equal when name and parameters match.
impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.params == other.params
    }
}
