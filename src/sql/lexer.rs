//! SQL lexer for tokenizing mysqldump output.
//!
//! The lexer is a lazy, single-pass iterator. Quoting, escaping and comments
//! are resolved here so later stages never have to look at raw characters
//! again: a `;` inside a string or comment never reaches the parser as
//! punctuation.

use std::fmt;

/// Line/column of a character in the source, plus its byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, column {} (byte {})",
            self.line, self.column, self.offset
        )
    }
}

/// Byte range of a token in the text it was lexed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare identifier or keyword
    Word,
    /// `backtick quoted` identifier
    QuotedIdent,
    /// 'single quoted' string
    Str,
    /// "double quoted" text, a string unless used where a name is expected
    DoubleQuoted,
    Number,
    /// 0x1F style literal
    HexNumber,
    Punct,
    LineComment,
    BlockComment,
}

/// SQL token.
///
/// `text` holds the unescaped value for quoted kinds and the exact source
/// text for everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
    pub position: Position,
}

impl Token {
    /// Case-insensitive keyword check against a bare word.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct && self.text.len() == c.len_utf8() && self.text.starts_with(c)
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }

    /// MySQL executable comment: `/*!40101 SET NAMES utf8 */`.
    pub fn is_conditional_comment(&self) -> bool {
        self.kind == TokenKind::BlockComment && self.text.starts_with("/*!")
    }

    /// Tokens that can name a table, column or constraint.
    pub fn is_name(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Word | TokenKind::QuotedIdent | TokenKind::DoubleQuoted
        )
    }

    /// Same token with its span moved `by` bytes towards the start.
    pub(crate) fn rebased(&self, by: usize) -> Token {
        Token {
            span: Span {
                start: self.span.start - by,
                end: self.span.end - by,
            },
            ..self.clone()
        }
    }

    /// Same token with its span moved `by` bytes towards the end.
    pub(crate) fn shifted(self, by: usize) -> Token {
        Token {
            span: Span {
                start: self.span.start + by,
                end: self.span.end + by,
            },
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("unterminated {what} starting at {position}")]
    Unterminated {
        what: &'static str,
        position: Position,
    },
}

/// SQL lexer.
pub struct Lexer<'a> {
    input: &'a str,
    /// Where `input` starts in the enclosing dump
    origin: Position,
    pos: usize,
    line: usize,
    column: usize,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_origin(
            input,
            Position {
                line: 1,
                column: 1,
                offset: 0,
            },
        )
    }

    /// Lex a slice of a larger dump. Spans stay relative to `input`, while
    /// positions are reported as if lexing had started at `origin`.
    pub fn with_origin(input: &'a str, origin: Position) -> Self {
        Self {
            input,
            origin,
            pos: 0,
            line: 1,
            column: 1,
            failed: false,
        }
    }

    fn current_position(&self) -> Position {
        let column = if self.line == 1 {
            self.origin.column + self.column - 1
        } else {
            self.column
        };
        Position {
            line: self.origin.line + self.line - 1,
            column,
            offset: self.origin.offset + self.pos,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
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

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn read_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn read_block_comment(&mut self, start: Position) -> Result<(), LexError> {
        self.advance(); // /
        self.advance(); // *
        loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    return Ok(());
                }
                Some(_) => {}
                None => {
                    return Err(LexError::Unterminated {
                        what: "block comment",
                        position: start,
                    });
                }
            }
        }
    }

    fn read_word(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_quoted_identifier(&mut self, start: Position) -> Result<String, LexError> {
        self.advance(); // skip opening backtick
        let mut ident = String::new();
        loop {
            match self.advance() {
                Some('`') => {
                    // Doubled backtick is an escaped backtick
                    if self.peek() == Some('`') {
                        ident.push('`');
                        self.advance();
                    } else {
                        return Ok(ident);
                    }
                }
                Some(c) => ident.push(c),
                None => {
                    return Err(LexError::Unterminated {
                        what: "quoted identifier",
                        position: start,
                    });
                }
            }
        }
    }

    fn read_string(&mut self, quote: char, start: Position) -> Result<String, LexError> {
        let unterminated = LexError::Unterminated {
            what: "string literal",
            position: start,
        };
        self.advance(); // skip opening quote
        let mut s = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        s.push(quote);
                        self.advance();
                    } else {
                        return Ok(s);
                    }
                }
                Some('\\') => match self.advance() {
                    Some('0') => s.push('\0'),
                    Some('b') => s.push('\u{8}'),
                    Some('n') => s.push('\n'),
                    Some('r') => s.push('\r'),
                    Some('t') => s.push('\t'),
                    Some('Z') => s.push('\u{1a}'),
                    // LIKE wildcards keep their backslash
                    Some(c @ ('%' | '_')) => {
                        s.push('\\');
                        s.push(c);
                    }
                    Some(c) => s.push(c),
                    None => return Err(unterminated),
                },
                Some(c) => s.push(c),
                None => return Err(unterminated),
            }
        }
    }

    fn read_number(&mut self) -> TokenKind {
        if self.peek() == Some('0')
            && matches!(self.peek_nth(1), Some('x' | 'X'))
            && self.peek_nth(2).is_some_and(|c| c.is_ascii_hexdigit())
        {
            self.advance();
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.advance();
            }
            return TokenKind::HexNumber;
        }

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let exponent_digit = match self.peek_nth(1) {
                Some('+' | '-') => self.peek_nth(2),
                other => other,
            };
            if exponent_digit.is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }
        TokenKind::Number
    }

    fn next_token(&mut self) -> Option<Result<Token, LexError>> {
        self.skip_whitespace();

        let begin = self.pos;
        let start = self.current_position();
        let c = self.peek()?;

        let result = match c {
            '-' if self.peek_nth(1) == Some('-')
                && self.peek_nth(2).is_none_or(char::is_whitespace) =>
            {
                self.read_line_comment();
                Ok((TokenKind::LineComment, None))
            }
            '#' => {
                self.read_line_comment();
                Ok((TokenKind::LineComment, None))
            }
            '/' if self.peek_nth(1) == Some('*') => self
                .read_block_comment(start)
                .map(|()| (TokenKind::BlockComment, None)),
            '`' => self
                .read_quoted_identifier(start)
                .map(|s| (TokenKind::QuotedIdent, Some(s))),
            '\'' => self
                .read_string('\'', start)
                .map(|s| (TokenKind::Str, Some(s))),
            '"' => self
                .read_string('"', start)
                .map(|s| (TokenKind::DoubleQuoted, Some(s))),
            c if c.is_ascii_digit() => Ok((self.read_number(), None)),
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                self.read_word();
                Ok((TokenKind::Word, None))
            }
            _ => {
                self.advance();
                Ok((TokenKind::Punct, None))
            }
        };

        Some(result.map(|(kind, text)| Token {
            kind,
            text: text.unwrap_or_else(|| self.input[begin..self.pos].to_string()),
            span: Span {
                start: begin,
                end: self.pos,
            },
            position: start,
        }))
    }

    /// Collect all tokens, stopping at the first error.
    pub fn tokenize(self) -> Result<Vec<Token>, LexError> {
        self.collect()
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_token();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}
