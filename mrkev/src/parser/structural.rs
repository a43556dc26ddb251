use crate::parser::error::ParseError;
use crate::parser::scanner::{Position, Scanner};
use crate::sigil::{CONTENT, DEFINITION};
use crate::tree::{Block, Param, ParseNode};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse template source into the raw parse tree.
pub fn parse_document(
    source: &str,
    file_id: usize,
    filename: &str,
) -> Result<Vec<ParseNode>, ParseError> {
    let mut state = ParseState::new(source, file_id, filename);
    state.parse_content()
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

struct ParseState<'a> {
    scanner: Scanner<'a>,
    file_id: usize,
    filename: &'a str,
    /// Number of currently open parameter brackets.
    depth: usize,
}

impl<'a> ParseState<'a> {
    fn new(source: &'a str, file_id: usize, filename: &'a str) -> Self {
        ParseState {
            scanner: Scanner::new(source),
            file_id,
            filename,
            depth: 0,
        }
    }

    /// CONTENT = (STRING | BLOCK | COMMENT)*
    ///
    /// Returns in front of the closing bracket of the enclosing parameter,
    /// or at end of input.
    fn parse_content(&mut self) -> Result<Vec<ParseNode>, ParseError> {
        let mut content = Vec::new();

        loop {
            let text = self.scanner.eat_while(|c| c != '[' && c != ']');
            if !text.is_empty() {
                content.push(ParseNode::literal(text));
            }

            match self.scanner.current() {
                Some(']') => {
                    if self.depth == 0 {
                        return Err(self.error("unexpected close bracket"));
                    }
                    return Ok(content);
                }
                Some('[') => {
                    let start = self.scanner.position();
                    self.scanner.bump();
                    if self.scanner.at('*') {
                        self.skip_comment()?;
                    } else {
                        content.push(ParseNode::Block(self.parse_block(start)?));
                    }
                }
                _ => {
                    if self.depth != 0 {
                        return Err(self.error("unbalanced brackets"));
                    }
                    return Ok(content);
                }
            }
        }
    }

    /// COMMENT = '[*' ... '*]', entered just after the opening bracket.
    /// The first `*]` after the opening `[*` terminates the comment.
    fn skip_comment(&mut self) -> Result<(), ParseError> {
        self.scanner.bump();
        loop {
            self.scanner.eat_while(|c| c != '*');
            if self.scanner.bump().is_none() {
                return Err(self.error("unfinished comment"));
            }
            if self.scanner.at(']') {
                self.scanner.bump();
                return Ok(());
            }
        }
    }

    /// BLOCK = '[' NAME (PARAM)* ']', entered just after the opening bracket.
    fn parse_block(&mut self, start: Position) -> Result<Block, ParseError> {
        let name = self.scanner.eat_name();
        if name.is_empty() {
            return Err(self.error("no name"));
        }

        let mut params: Vec<Param> = Vec::new();

        loop {
            self.scanner.eat_while(char::is_whitespace);
            let param_start = self.scanner.position();

            let (param_name, content) = match self.scanner.current() {
                None => {
                    return Err(self.error("unbalanced brackets").with_note(format!(
                        "block \"{}\" opened at line {}, column {}",
                        name, start.line, start.column
                    )));
                }
                Some(']') => {
                    self.scanner.bump();
                    break;
                }
                Some('[') => (CONTENT.to_string(), self.parse_bracketed()?),
                Some(_) => self.parse_named_param(param_start)?,
            };

            if param_name == DEFINITION && !params.is_empty() {
                return Err(self.error_at(
                    param_start,
                    "definition has to precede default parameters",
                ));
            }
            if params.iter().any(|p| p.name == param_name) {
                return Err(self.error_at(
                    param_start,
                    format!("parameter \"{}\" has been already defined", param_name),
                ));
            }

            params.push(Param {
                name: param_name,
                content,
            });
        }

        Ok(Block {
            name: name.to_string(),
            params,
            span: start.offset..self.scanner.offset(),
        })
    }

    /// PARAM = IDENT '=' VALUE | IDENT
    ///
    /// A bare identifier not followed by `=` is the content shortcut:
    /// `[name other]` means `[name #=[[other]]]`.
    fn parse_named_param(
        &mut self,
        param_start: Position,
    ) -> Result<(String, Vec<ParseNode>), ParseError> {
        let ident = self.read_ident();

        if !self.scanner.at('=') {
            let reference = self.reference(ident, param_start);
            return Ok((CONTENT.to_string(), vec![reference]));
        }

        if ident.is_empty() {
            return Err(self.error("missing parameter name"));
        }
        self.scanner.bump();

        let value = if self.scanner.at('[') {
            self.parse_bracketed()?
        } else {
            // Parameter-value and definition shortcuts: `p=ident`, `:=ident`.
            let value_start = self.scanner.position();
            let target = self.read_ident();
            if target.is_empty() {
                return Err(self.error(format!("parameter \"{}\" has no value", ident)));
            }
            vec![self.reference(target, value_start)]
        };

        Ok((ident.to_string(), value))
    }

    /// '[' CONTENT ']'
    fn parse_bracketed(&mut self) -> Result<Vec<ParseNode>, ParseError> {
        self.scanner.bump();
        self.depth += 1;
        let content = self.parse_content()?;
        // parse_content only returns inside brackets when it sits on ']'.
        self.scanner.bump();
        self.depth -= 1;
        Ok(content)
    }

    fn read_ident(&mut self) -> &'a str {
        self.scanner
            .eat_while(|c| c != '[' && c != ']' && c != '=' && !c.is_whitespace())
    }

    fn reference(&self, name: &str, start: Position) -> ParseNode {
        ParseNode::Block(Block {
            name: name.to_string(),
            params: Vec::new(),
            span: start.offset..start.offset + name.len(),
        })
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        self.error_at(self.scanner.position(), message)
    }

    fn error_at(&self, position: Position, message: impl Into<String>) -> ParseError {
        let end = self
            .scanner
            .current()
            .filter(|_| position.offset == self.scanner.offset())
            .map(|c| position.offset + c.len_utf8())
            .unwrap_or(position.offset);
        ParseError {
            message: message.into(),
            span: position.offset..end,
            file_id: self.file_id,
            filename: self.filename.to_string(),
            line: position.line,
            column: position.column,
            source_line: self.scanner.line_text(position).to_string(),
            notes: Vec::new(),
        }
    }
}
