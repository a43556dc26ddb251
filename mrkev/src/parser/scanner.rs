/// A position in the source: byte offset plus human-readable coordinates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Position {
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
    /// Byte offset where the current line starts.
    pub line_start: usize,
}

/// Character cursor over the template source that keeps line/column
/// counters up to date for diagnostics.
pub(crate) struct Scanner<'a> {
    source: &'a str,
    position: Position,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Scanner {
            source,
            position: Position {
                offset: 0,
                line: 1,
                column: 1,
                line_start: 0,
            },
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn offset(&self) -> usize {
        self.position.offset
    }

    pub fn current(&self) -> Option<char> {
        self.source[self.position.offset..].chars().next()
    }

    /// The character after the current one.
    pub fn lookahead(&self) -> Option<char> {
        let mut chars = self.source[self.position.offset..].chars();
        chars.next();
        chars.next()
    }

    pub fn at(&self, expected: char) -> bool {
        self.current() == Some(expected)
    }

    /// Advance past the current character.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.current()?;
        self.position.offset += c.len_utf8();
        if c == '\n' {
            self.position.line += 1;
            self.position.column = 1;
            self.position.line_start = self.position.offset;
        } else {
            self.position.column += 1;
        }
        Some(c)
    }

    /// Consume characters while `pred` holds and return the consumed slice.
    pub fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) -> &'a str {
        let start = self.position.offset;
        while let Some(c) = self.current() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
        &self.source[start..self.position.offset]
    }

    /// Consume a block name: stops at brackets, whitespace, or a `:=` marker.
    pub fn eat_name(&mut self) -> &'a str {
        let start = self.position.offset;
        while let Some(c) = self.current() {
            if c == '[' || c == ']' || c.is_whitespace() {
                break;
            }
            if c == ':' && self.lookahead() == Some('=') {
                break;
            }
            self.bump();
        }
        &self.source[start..self.position.offset]
    }

    /// The source line containing `position`, without its terminator.
    pub fn line_text(&self, position: Position) -> &'a str {
        let rest = &self.source[position.line_start..];
        let line = rest.split('\n').next().unwrap_or("");
        line.strip_suffix('\r').unwrap_or(line)
    }
}
