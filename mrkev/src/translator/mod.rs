mod shortcuts;
mod whitespace;

pub use whitespace::collapse_whitespace;

use tracing::trace;

use crate::ast::{Ast, AstNode, Call, Define, Definition, ParamRef, ScopeId};
use crate::sigil::{ALIAS, DEFINITION};
use crate::tree::{Block, Param, ParseNode};
use whitespace::ContentBuilder;

/// Lower a parse tree into an evaluable [`Ast`].
///
/// Definitions are split from usages, shortcuts are desugared, every
/// definition gets its own [`ScopeId`] and literal text is normalized once
/// here.
pub fn translate(nodes: Vec<ParseNode>) -> Ast {
    let mut translator = Translator {
        definitions: Vec::new(),
    };
    let root = translator.lower_content(nodes, Lowering::ROOT);
    trace!(definitions = translator.definitions.len(), "translated");
    Ast::new(root, translator.definitions)
}

/// Where a piece of content sits: inside which definition, inside the value
/// of which parameter.
#[derive(Clone, Copy)]
struct Lowering<'p> {
    scope: Option<ScopeId>,
    parameter: Option<&'p str>,
}

impl Lowering<'static> {
    const ROOT: Self = Lowering {
        scope: None,
        parameter: None,
    };
}

struct Translator {
    definitions: Vec<Definition>,
}

impl Translator {
    fn lower_content(&mut self, nodes: Vec<ParseNode>, lowering: Lowering<'_>) -> AstNode {
        let mut definitions = Vec::new();
        let mut usages = Vec::new();
        for node in nodes {
            match node {
                ParseNode::Block(block) if block.is_definition() => definitions.push(block),
                other => usages.push(other),
            }
        }

        let content = self.lower_usages(shortcuts::group_list_items(usages), lowering);
        if definitions.is_empty() {
            return content;
        }

        let definitions = definitions
            .into_iter()
            .map(|block| self.lower_definition(block))
            .collect();
        AstNode::Define(Define {
            definitions,
            content: Box::new(content),
        })
    }

    fn lower_usages(&mut self, nodes: Vec<ParseNode>, lowering: Lowering<'_>) -> AstNode {
        let mut content = ContentBuilder::new();
        for node in nodes {
            match node {
                ParseNode::Literal(text) => content.push_text(&text),
                ParseNode::Block(block) => {
                    let lowered = self.lower_block(block, lowering);
                    content.push_node(lowered);
                }
            }
        }
        content.finish()
    }

    fn lower_block(&mut self, block: Block, lowering: Lowering<'_>) -> AstNode {
        let mut block = shortcuts::expand_link(block);

        if block.name == ALIAS {
            if let Some(parameter) = lowering.parameter {
                block.name = parameter.to_string();
            }
        }

        if block.params.is_empty() {
            if let Some(scope) = lowering.scope {
                return AstNode::ParamRef(ParamRef {
                    name: block.name,
                    scope,
                });
            }
        }

        let params = block
            .params
            .into_iter()
            .map(|Param { name, content }| {
                let value = self.lower_content(
                    content,
                    Lowering {
                        scope: lowering.scope,
                        parameter: Some(&name),
                    },
                );
                (name, value)
            })
            .collect();

        AstNode::Call(Call {
            name: block.name,
            params,
        })
    }

    fn lower_definition(&mut self, block: Block) -> ScopeId {
        // Reserve the slot first so nested definitions get later ids.
        let scope = ScopeId(self.definitions.len() as u32);
        self.definitions.push(Definition {
            name: block.name.clone(),
            scope,
            defaults: Vec::new(),
            body: AstNode::empty(),
            self_referential: false,
        });

        let mut body = AstNode::empty();
        let mut defaults = Vec::new();
        for Param { name, content } in block.params {
            if name == DEFINITION {
                body = self.lower_content(
                    content,
                    Lowering {
                        scope: Some(scope),
                        parameter: None,
                    },
                );
            } else {
                let value = self.lower_content(
                    content,
                    Lowering {
                        scope: Some(scope),
                        parameter: Some(&name),
                    },
                );
                defaults.push((name, value));
            }
        }

        let self_referential = self.mentions(&body, &block.name)
            || defaults
                .iter()
                .any(|(_, value)| self.mentions(value, &block.name));

        trace!(
            definition = %block.name,
            %scope,
            defaults = defaults.len(),
            self_referential,
            "lowered definition"
        );

        self.definitions[scope.index()] = Definition {
            name: block.name,
            scope,
            defaults,
            body,
            self_referential,
        };
        scope
    }

    /// Does `node` call or reference `name` anywhere, nested definitions
    /// included?
    fn mentions(&self, node: &AstNode, name: &str) -> bool {
        match node {
            AstNode::Text(_) => false,
            AstNode::Call(call) => {
                call.name == name || call.params.iter().any(|(_, value)| self.mentions(value, name))
            }
            AstNode::ParamRef(reference) => reference.name == name,
            AstNode::Define(define) => {
                self.mentions(&define.content, name)
                    || define.definitions.iter().any(|id| {
                        let nested = &self.definitions[id.index()];
                        self.mentions(&nested.body, name)
                            || nested
                                .defaults
                                .iter()
                                .any(|(_, value)| self.mentions(value, name))
                    })
            }
            AstNode::Sequence(nodes) => nodes.iter().any(|node| self.mentions(node, name)),
        }
    }
}
