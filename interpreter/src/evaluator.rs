use std::borrow::Cow;
use std::time::Instant;

use mrkev::ast::{Ast, AstNode, Call, ParamRef};
use tracing::{debug, trace};

use crate::bindings::Bindings;
use crate::environment::{ContextId, Environment, Found, Mark, find_param};
use crate::error::EvalError;
use crate::evaluator_helpers::{fragment_value, select_path, split_path};
use crate::options::RenderOptions;
use crate::runtime_value::{Fragment, Value, all_truthy, concat};

/// Tree-walking evaluator for one render of an [`Ast`].
///
/// Native blocks receive the interpreter while they run and use the
/// accessors below to read their own arguments.
pub struct Interpreter<'a> {
    ast: &'a Ast,
    options: RenderOptions,
    env: Environment<'a>,
    /// Active entries into self-referential definitions.
    recursion: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(ast: &'a Ast, options: RenderOptions) -> Self {
        Interpreter {
            ast,
            options,
            env: Environment::new(ast),
            recursion: 0,
        }
    }

    /// Add a root scope. Scopes pushed later shadow earlier ones.
    pub fn push_bindings(&mut self, bindings: &'a Bindings) {
        self.env.push_bindings(Cow::Borrowed(bindings));
    }

    pub fn evaluate(&mut self) -> Vec<Fragment> {
        let ast = self.ast;
        let mut out = Vec::new();
        self.eval(ast.root(), &mut out);
        out
    }

    pub fn render(&mut self) -> String {
        concat(&self.evaluate())
    }

    // ---------------------------------------------------------------
    // Native calling contract
    // ---------------------------------------------------------------

    /// Was `name` supplied at the current native call site?
    pub fn has_param(&self, name: &str) -> bool {
        self.env
            .current_frame()
            .is_some_and(|frame| frame.param(name).is_some())
    }

    /// Evaluate an argument of the current call in the caller's scope.
    /// `None` when the argument was not supplied.
    pub fn get_value(&mut self, name: &str) -> Option<Vec<Fragment>> {
        let frame = self.env.current_frame()?;
        let (node, caller) = (frame.param(name)?, frame.caller);
        let mut out = Vec::new();
        self.eval_in(caller, node, &mut out);
        Some(out)
    }

    /// Argument rendered to text; empty when missing.
    pub fn get_string(&mut self, name: &str) -> String {
        self.get_value(name)
            .map(|fragments| concat(&fragments))
            .unwrap_or_default()
    }

    /// Argument truthiness; a missing argument is false.
    pub fn get_boolean(&mut self, name: &str) -> bool {
        self.get_value(name)
            .is_some_and(|fragments| all_truthy(&fragments))
    }

    /// Argument as a host value: a single value fragment is returned as
    /// is, anything else becomes a list of the fragments.
    pub fn get_raw(&mut self, name: &str) -> Option<Value> {
        let mut fragments = self.get_value(name)?;
        if fragments.len() == 1 {
            return fragments.pop().map(fragment_value);
        }
        Some(Value::List(
            fragments.into_iter().map(fragment_value).collect(),
        ))
    }

    /// Run `f` with `bindings` visible to every block call it makes,
    /// including those inside arguments it evaluates.
    pub fn with_bindings<R>(&mut self, bindings: Bindings, f: impl FnOnce(&mut Self) -> R) -> R {
        self.env.push_bindings(Cow::Owned(bindings));
        let result = f(self);
        self.env.pop_context();
        result
    }

    /// Format an error as an inline marker.
    pub fn error(&self, error: EvalError) -> Fragment {
        Fragment::Error(self.options.formatter.format(&error))
    }

    // ---------------------------------------------------------------
    // Evaluation
    // ---------------------------------------------------------------

    fn eval(&mut self, node: &'a AstNode, out: &mut Vec<Fragment>) {
        match node {
            AstNode::Text(text) => out.push(Fragment::Text(text.clone())),
            AstNode::Sequence(nodes) => {
                for node in nodes {
                    self.eval(node, out);
                }
            }
            AstNode::Define(define) => {
                self.env.push_definitions(&define.definitions);
                self.eval(&define.content, out);
                self.env.pop_context();
            }
            AstNode::Call(call) => self.eval_call(call, out),
            AstNode::ParamRef(reference) => self.eval_param_ref(reference, out),
        }
    }

    fn deadline_passed(&self) -> bool {
        self.options
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    fn eval_call(&mut self, call: &'a Call, out: &mut Vec<Fragment>) {
        if self.deadline_passed() {
            out.push(self.error(EvalError::DeadlineExceeded));
            return;
        }
        match self.env.lookup(&call.name) {
            Some(found) => self.invoke(&call.name, found, &call.params, out),
            None => {
                trace!(block = %call.name, "block not found");
                out.push(self.error(EvalError::BlockNotFound(call.name.clone())));
            }
        }
    }

    fn invoke(
        &mut self,
        name: &'a str,
        found: Found<'a>,
        params: &'a [(String, AstNode)],
        out: &mut Vec<Fragment>,
    ) {
        let caller = self.env.mark();
        match found {
            Found::Definition {
                context,
                definition,
            } if definition.self_referential && !self.wraps_outer(context, name) => {
                let limit = self.options.effective_recursion_limit();
                self.recursion += 1;
                if self.recursion > limit {
                    debug!(block = name, limit, "recursion limit reached");
                    out.push(self.error(EvalError::RecursionLimit {
                        name: name.to_string(),
                        limit,
                    }));
                } else {
                    self.env
                        .push_frame(Some(definition.scope), Some(definition), params, caller);
                    self.eval(&definition.body, out);
                    self.env.pop_frame();
                }
                self.recursion -= 1;
            }
            Found::Definition {
                context,
                definition,
            } => {
                self.env.push_guard(context, name);
                self.env
                    .push_frame(Some(definition.scope), Some(definition), params, caller);
                self.eval(&definition.body, out);
                self.env.pop_frame();
                self.env.pop_guard();
            }
            Found::Value {
                context,
                value: Value::Native(native),
            } => {
                self.env.push_guard(context, name);
                self.env.push_frame(None, None, params, caller);
                let fragments = native.call(self);
                self.env.pop_frame();
                self.env.pop_guard();
                out.extend(fragments);
            }
            Found::Value { value, .. } => out.extend(value.into_fragments()),
        }
    }

    /// Does hiding `(context, name)` uncover an outer block of the same
    /// name? A self-referential definition that shadows one is a wrapper
    /// and is entered like any other definition.
    fn wraps_outer(&mut self, context: ContextId, name: &'a str) -> bool {
        self.env.push_guard(context, name);
        let outer = self.env.lookup(name).is_some();
        self.env.pop_guard();
        outer
    }

    /// Parameter resolution: supplied argument, then the definition's
    /// default, then a block of the same name.
    fn eval_param_ref(&mut self, reference: &'a ParamRef, out: &mut Vec<Fragment>) {
        if self.deadline_passed() {
            out.push(self.error(EvalError::DeadlineExceeded));
            return;
        }

        let name = reference.name.as_str();
        let Some(index) = self.env.frame_for_scope(reference.scope) else {
            self.fallback(name, out);
            return;
        };

        let frame = self.env.frame(index);
        let (frame_id, definition, params, caller) =
            (frame.id, frame.definition, frame.params, frame.caller);
        let callee = Mark {
            frames: index + 1,
            guards: frame.guards,
        };

        if let Some(argument) = find_param(params, name) {
            self.eval_in(caller, argument, out);
            return;
        }

        if let Some((head, path)) = split_path(name) {
            if let Some(argument) = find_param(params, head) {
                let mut fragments = Vec::new();
                self.eval_in(caller, argument, &mut fragments);
                if let Some(selected) = select_path(fragments, path) {
                    out.extend(selected);
                    return;
                }
            }
        }

        if let Some(default) = definition.and_then(|definition| definition.default_for(name)) {
            if !self.env.is_default_guarded(frame_id, name) {
                trace!(param = name, "using default");
                self.env.push_default_guard(frame_id, name);
                self.eval_in(callee, default, out);
                self.env.pop_default_guard();
                return;
            }
        }

        self.fallback(name, out);
    }

    /// A parameter nobody supplied is looked up as a block.
    fn fallback(&mut self, name: &'a str, out: &mut Vec<Fragment>) {
        match self.env.lookup(name) {
            Some(found) => self.invoke(name, found, &[], out),
            None => {
                trace!(param = name, "parameter not found");
                out.push(self.error(EvalError::ParameterNotFound(name.to_string())));
            }
        }
    }

    /// Evaluate `node` with the call stack cut back to `mark`.
    fn eval_in(&mut self, mark: Mark, node: &'a AstNode, out: &mut Vec<Fragment>) {
        let suspended = self.env.suspend(mark);
        self.eval(node, out);
        self.env.resume(suspended);
    }
}
