use crate::ast::AstNode;

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Collapse every run of spaces, tabs and line breaks into a single space.
///
/// Applying it twice gives the same result as applying it once.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if is_space(c) {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Accumulates the lowered nodes of one content sequence and normalizes its
/// literal text on the way in.
#[derive(Default)]
pub(crate) struct ContentBuilder {
    nodes: Vec<AstNode>,
}

impl ContentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&mut self, text: &str) {
        let text = collapse_whitespace(text);

        if self.nodes.is_empty() {
            let text = text.trim_start_matches(is_space);
            if !text.is_empty() {
                self.nodes.push(AstNode::Text(text.to_string()));
            }
            return;
        }

        // Text split by a comment or a definition joins up again, spaces
        // included.
        if let Some(AstNode::Text(previous)) = self.nodes.last_mut() {
            previous.push_str(&text);
            *previous = collapse_whitespace(previous);
            return;
        }

        if !text.is_empty() {
            self.nodes.push(AstNode::Text(text));
        }
    }

    pub fn push_node(&mut self, node: AstNode) {
        self.nodes.push(node);
    }

    pub fn finish(mut self) -> AstNode {
        if let Some(AstNode::Text(last)) = self.nodes.last_mut() {
            let trimmed = last.trim_end_matches(is_space).len();
            last.truncate(trimmed);
            if last.is_empty() {
                self.nodes.pop();
            }
        }

        match self.nodes.len() {
            0 => AstNode::empty(),
            1 => self.nodes.pop().unwrap_or_else(AstNode::empty),
            _ => AstNode::Sequence(self.nodes),
        }
    }
}
