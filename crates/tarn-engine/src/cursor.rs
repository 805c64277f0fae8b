//! Character cursor with line/column tracking.

/// A 1-based line/column position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mark {
    pub line: u32,
    pub column: u32,
}

/// A forward-only cursor over source text.
#[derive(Clone)]
pub(crate) struct Cursor<'src> {
    source: &'src str,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    #[inline]
    pub fn mark(&self) -> Mark {
        Mark {
            line: self.line,
            column: self.column,
        }
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    #[inline]
    pub fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    #[inline]
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    /// Advance by one character and return it. Tracks line/column.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consume `prefix` if the input starts with it.
    pub fn eat(&mut self, prefix: &str) -> bool {
        if self.starts_with(prefix) {
            for _ in prefix.chars() {
                self.bump();
            }
            true
        } else {
            false
        }
    }

    /// Consume spaces (not tabs, not newlines). Returns how many.
    pub fn skip_spaces(&mut self) -> usize {
        let mut n = 0;
        while self.peek() == Some(' ') {
            self.bump();
            n += 1;
        }
        n
    }

    /// True at a line break or end of input.
    #[inline]
    pub fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some('\n') | Some('\r'))
    }

    /// Consume one line break (`\n` or `\r\n`). Returns false at EOF.
    pub fn eat_line_break(&mut self) -> bool {
        if self.peek() == Some('\r') {
            self.bump();
            if self.peek() == Some('\n') {
                self.bump();
            }
            true
        } else if self.peek() == Some('\n') {
            self.bump();
            true
        } else {
            false
        }
    }

    /// The rest of the current line, without its line break.
    pub fn rest_of_line(&self) -> &'src str {
        let rest = self.rest();
        let end = rest.find(['\n', '\r']).unwrap_or(rest.len());
        &rest[..end]
    }

    /// Consume the rest of the current line including its break.
    pub fn skip_to_next_line(&mut self) {
        while !self.at_line_end() {
            self.bump();
        }
        self.eat_line_break();
    }

    /// 0-based column of the cursor (column 0 is the start of a line).
    #[inline]
    pub fn indent(&self) -> usize {
        (self.column - 1) as usize
    }
}
