use std::borrow::Cow;

use mrkev::ast::{Ast, AstNode, Definition, ScopeId};

use crate::bindings::Bindings;
use crate::runtime_value::Value;

pub(crate) type ContextId = u64;
pub(crate) type FrameId = u64;

/// A set of names searched by block calls.
enum Context<'a> {
    /// The definitions installed by one `Define` node.
    Definitions { id: ContextId, scopes: &'a [ScopeId] },
    /// Host bindings, the runtime library, or values pushed by a built-in.
    Bindings {
        id: ContextId,
        bindings: Cow<'a, Bindings>,
    },
}

impl Context<'_> {
    fn id(&self) -> ContextId {
        match self {
            Context::Definitions { id, .. } | Context::Bindings { id, .. } => *id,
        }
    }
}

/// Result of resolving a block name.
pub(crate) enum Found<'a> {
    Definition {
        context: ContextId,
        definition: &'a Definition,
    },
    Value {
        context: ContextId,
        value: Value,
    },
}

/// Stack heights at some point of the evaluation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Mark {
    pub frames: usize,
    pub guards: usize,
}

/// One active call.
pub(crate) struct CallFrame<'a> {
    pub id: FrameId,
    /// Scope of the called definition; `None` for native blocks.
    pub scope: Option<ScopeId>,
    pub definition: Option<&'a Definition>,
    /// Arguments supplied at the call site.
    pub params: &'a [(String, AstNode)],
    /// Where the call was made; arguments are evaluated there.
    pub caller: Mark,
    /// Guard stack height once the call was entered.
    pub guards: usize,
}

impl<'a> CallFrame<'a> {
    pub fn param(&self, name: &str) -> Option<&'a AstNode> {
        find_param(self.params, name)
    }
}

pub(crate) fn find_param<'a>(params: &'a [(String, AstNode)], name: &str) -> Option<&'a AstNode> {
    params
        .iter()
        .find(|(param, _)| param == name)
        .map(|(_, value)| value)
}

/// Frames and guards set aside while evaluating somewhere lower in the
/// stack. Must be handed back to [`Environment::resume`].
#[must_use]
pub(crate) struct Suspended<'a> {
    frames: Vec<CallFrame<'a>>,
    guards: Vec<(ContextId, &'a str)>,
}

/// Scope stacks of one render.
///
/// Definition contexts are searched by block calls, call frames by
/// parameter references. Two guard lists keep evaluation from re-entering
/// itself: block guards hide a `(context, name)` pair while that block is
/// running, default guards stop a parameter default from satisfying its
/// own reference.
pub(crate) struct Environment<'a> {
    ast: &'a Ast,
    contexts: Vec<Context<'a>>,
    frames: Vec<CallFrame<'a>>,
    guards: Vec<(ContextId, &'a str)>,
    defaults: Vec<(FrameId, &'a str)>,
    next_id: u64,
}

impl<'a> Environment<'a> {
    pub fn new(ast: &'a Ast) -> Self {
        Environment {
            ast,
            contexts: Vec::new(),
            frames: Vec::new(),
            guards: Vec::new(),
            defaults: Vec::new(),
            next_id: 0,
        }
    }

    fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    // ----- Definition contexts -----

    pub fn push_definitions(&mut self, scopes: &'a [ScopeId]) {
        let id = self.fresh_id();
        self.contexts.push(Context::Definitions { id, scopes });
    }

    pub fn push_bindings(&mut self, bindings: Cow<'a, Bindings>) {
        let id = self.fresh_id();
        self.contexts.push(Context::Bindings { id, bindings });
    }

    pub fn pop_context(&mut self) {
        self.contexts.pop();
    }

    /// Resolve a block name, innermost context first, skipping guarded
    /// entries.
    pub fn lookup(&self, name: &str) -> Option<Found<'a>> {
        for context in self.contexts.iter().rev() {
            let id = context.id();
            if self.is_guarded(id, name) {
                continue;
            }
            match context {
                Context::Definitions { scopes, .. } => {
                    let found = scopes
                        .iter()
                        .rev()
                        .filter_map(|scope| self.ast.definition(*scope))
                        .find(|definition| definition.name == name);
                    if let Some(definition) = found {
                        return Some(Found::Definition {
                            context: id,
                            definition,
                        });
                    }
                }
                Context::Bindings { bindings, .. } => {
                    if let Some(value) = bindings.lookup(name) {
                        return Some(Found::Value {
                            context: id,
                            value: value.clone(),
                        });
                    }
                }
            }
        }
        None
    }

    // ----- Call frames -----

    pub fn mark(&self) -> Mark {
        Mark {
            frames: self.frames.len(),
            guards: self.guards.len(),
        }
    }

    pub fn push_frame(
        &mut self,
        scope: Option<ScopeId>,
        definition: Option<&'a Definition>,
        params: &'a [(String, AstNode)],
        caller: Mark,
    ) {
        let id = self.fresh_id();
        let guards = self.guards.len();
        self.frames.push(CallFrame {
            id,
            scope,
            definition,
            params,
            caller,
            guards,
        });
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    pub fn current_frame(&self) -> Option<&CallFrame<'a>> {
        self.frames.last()
    }

    pub fn frame(&self, index: usize) -> &CallFrame<'a> {
        &self.frames[index]
    }

    /// Index of the innermost frame running the definition with `scope`.
    pub fn frame_for_scope(&self, scope: ScopeId) -> Option<usize> {
        self.frames.iter().rposition(|frame| frame.scope == Some(scope))
    }

    /// Set aside everything above `mark`.
    pub fn suspend(&mut self, mark: Mark) -> Suspended<'a> {
        let frames = self.frames.split_off(mark.frames.min(self.frames.len()));
        let guards = self.guards.split_off(mark.guards.min(self.guards.len()));
        Suspended { frames, guards }
    }

    pub fn resume(&mut self, suspended: Suspended<'a>) {
        self.frames.extend(suspended.frames);
        self.guards.extend(suspended.guards);
    }

    // ----- Guards -----

    pub fn push_guard(&mut self, context: ContextId, name: &'a str) {
        self.guards.push((context, name));
    }

    pub fn pop_guard(&mut self) {
        self.guards.pop();
    }

    fn is_guarded(&self, context: ContextId, name: &str) -> bool {
        self.guards
            .iter()
            .any(|(guarded, guarded_name)| *guarded == context && *guarded_name == name)
    }

    pub fn push_default_guard(&mut self, frame: FrameId, name: &'a str) {
        self.defaults.push((frame, name));
    }

    pub fn pop_default_guard(&mut self) {
        self.defaults.pop();
    }

    pub fn is_default_guarded(&self, frame: FrameId, name: &str) -> bool {
        self.defaults
            .iter()
            .any(|(guarded, guarded_name)| *guarded == frame && *guarded_name == name)
    }
}
