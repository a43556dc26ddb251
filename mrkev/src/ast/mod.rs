use std::fmt;

use crate::sigil::CONTENT;

/// Identity of one definition's lexical scope.
///
/// Doubles as the index of the definition in [`Ast::definitions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// An evaluable node.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    /// Normalized literal text.
    Text(String),
    /// Invocation of a block by name.
    Call(Call),
    /// Reference to a parameter of the enclosing definition.
    ParamRef(ParamRef),
    /// Installs definitions around a piece of content.
    Define(Define),
    Sequence(Vec<AstNode>),
}

impl AstNode {
    /// Content that renders to nothing.
    pub fn empty() -> Self {
        AstNode::Sequence(Vec::new())
    }

    pub fn text(text: impl Into<String>) -> Self {
        AstNode::Text(text.into())
    }

    pub fn call(name: impl Into<String>) -> Self {
        AstNode::Call(Call::new(name))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, AstNode::Sequence(nodes) if nodes.is_empty())
    }
}

/// `[name p=[...] ...]` at a usage site.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    /// Supplied arguments in source order.
    pub params: Vec<(String, AstNode)>,
}

impl Call {
    pub fn new(name: impl Into<String>) -> Self {
        Call {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: AstNode) -> Self {
        self.params.push((name.into(), value));
        self
    }

    pub fn param(&self, name: &str) -> Option<&AstNode> {
        self.params
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value)
    }

    /// The `#` argument, if supplied.
    pub fn content(&self) -> Option<&AstNode> {
        self.param(CONTENT)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamRef {
    pub name: String,
    /// Scope of the definition whose parameter is referenced.
    pub scope: ScopeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Define {
    /// Definitions visible while `content` is evaluated, in source order.
    pub definitions: Vec<ScopeId>,
    pub content: Box<AstNode>,
}

/// A user definition: `[name:=[body] p=[default] ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: String,
    pub scope: ScopeId,
    /// Default values of parameters, evaluated in the callee's scope.
    pub defaults: Vec<(String, AstNode)>,
    pub body: AstNode,
    /// True when the body or a default calls the definition's own name.
    /// Such definitions are entered without a guard and bounded by the
    /// recursion ceiling instead.
    pub self_referential: bool,
}

impl Definition {
    pub fn default_for(&self, name: &str) -> Option<&AstNode> {
        self.defaults
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value)
    }
}

/// Result of translation: the root node plus the arena of definitions
/// addressed by [`ScopeId`].
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    pub(crate) root: AstNode,
    pub(crate) definitions: Vec<Definition>,
}

impl Ast {
    pub fn new(root: AstNode, definitions: Vec<Definition>) -> Self {
        Ast { root, definitions }
    }

    pub fn root(&self) -> &AstNode {
        &self.root
    }

    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    /// Look up a definition by scope.
    ///
    /// Every `ScopeId` stored inside this tree is valid for it; ids from
    /// another `Ast` are not.
    pub fn definition(&self, id: ScopeId) -> Option<&Definition> {
        self.definitions.get(id.index())
    }
}
