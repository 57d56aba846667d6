//! Hand-written scanner for StaticLang source text.
//!
//! The lexer walks the source bytes once, tracking line and column as it
//! goes, and hands out [`Token`]s on demand. It never aborts: unrecognized
//! bytes, bad escape sequences, and unterminated strings each produce a
//! lexical diagnostic and the scanner keeps going, so one run can surface
//! every lexical problem in a file.
//!
//! # Position rules
//!
//! - LF ends a line: the line number increments and the column resets to 1.
//! - CR is plain whitespace, so CRLF input works without a special case.
//! - Tab advances the column by exactly one; no tab expansion.
//!
//! # Example
//!
//! ```
//! use staticlang_base::{DiagnosticSink, Interner};
//! use staticlang_language::lexer::Lexer;
//! use staticlang_language::token::TokenKind;
//!
//! let mut interner = Interner::new();
//! let mut sink = DiagnosticSink::new();
//! let mut lexer = Lexer::new("var x int;", "demo.sl", &mut interner, &mut sink);
//!
//! let tokens = lexer.tokenize();
//! let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
//! assert_eq!(
//!     kinds,
//!     [TokenKind::Var, TokenKind::Ident, TokenKind::Ident, TokenKind::Semi, TokenKind::Eof]
//! );
//! ```

use staticlang_base::{DiagnosticKind, DiagnosticSink, Interner, Name, Pos, Span};

use crate::token::{Token, TokenKind};

/// Streaming scanner over one source file.
///
/// `peek` is idempotent: two consecutive peeks return the same token, and a
/// peek followed by `next_token` returns that token. After the end of input
/// every `next_token` call returns [`TokenKind::Eof`] positioned at the end
/// of the source.
pub struct Lexer<'src, 'ctx> {
    source: &'src str,
    file: &'src str,
    interner: &'ctx mut Interner,
    sink: &'ctx mut DiagnosticSink,
    line: u32,
    column: u32,
    offset: usize,
    peeked: Option<Token>,
}

impl<'src, 'ctx> Lexer<'src, 'ctx> {
    pub fn new(
        source: &'src str,
        file: &'src str,
        interner: &'ctx mut Interner,
        sink: &'ctx mut DiagnosticSink,
    ) -> Self {
        Self {
            source,
            file,
            interner,
            sink,
            line: 1,
            column: 1,
            offset: 0,
            peeked: None,
        }
    }

    /// The scanner's current position (start of the next unread byte).
    pub fn pos(&self) -> Pos {
        Pos::new(self.line, self.column, self.offset)
    }

    /// Returns the next token without consuming it.
    pub fn peek(&mut self) -> Token {
        if let Some(tok) = self.peeked {
            return tok;
        }
        let tok = self.scan();
        self.peeked = Some(tok);
        tok
    }

    /// Consumes and returns the next token.
    pub fn next_token(&mut self) -> Token {
        if let Some(tok) = self.peeked.take() {
            return tok;
        }
        self.scan()
    }

    /// Drains the whole input into a vector, including the final Eof token.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                return tokens;
            }
        }
    }

    // ------------------------------------------------------------------
    // Character-level machinery
    // ------------------------------------------------------------------

    fn peek_char(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn peek_char2(&self) -> Option<char> {
        let mut chars = self.source[self.offset..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn error(&mut self, message: String, span: Span) {
        self.sink
            .report_error(DiagnosticKind::Lexical, message, self.file, span);
    }

    // ------------------------------------------------------------------
    // Token-level machinery
    // ------------------------------------------------------------------

    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.bump();
                }
                Some('/') if self.peek_char2() == Some('/') => {
                    while let Some(ch) = self.peek_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_char2() == Some('*') => {
                    let start = self.pos();
                    self.bump();
                    self.bump();
                    let mut closed = false;
                    while let Some(ch) = self.bump() {
                        if ch == '*' && self.peek_char() == Some('/') {
                            self.bump();
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        let span = Span::new(start, self.pos());
                        self.error("unterminated block comment".to_string(), span);
                    }
                }
                _ => return,
            }
        }
    }

    fn scan(&mut self) -> Token {
        self.skip_trivia();

        let start = self.pos();
        let Some(ch) = self.peek_char() else {
            return Token::new(TokenKind::Eof, Name::EMPTY, Span::point(start));
        };

        if ch.is_ascii_alphabetic() || ch == '_' {
            return self.scan_ident(start);
        }
        if ch.is_ascii_digit() {
            return self.scan_number(start);
        }
        if ch == '"' {
            return self.scan_string(start);
        }
        self.scan_operator(start, ch)
    }

    fn lexeme_token(&mut self, kind: TokenKind, start: Pos) -> Token {
        let end = self.pos();
        let text = self.interner.intern(&self.source[start.offset..end.offset]);
        Token::new(kind, text, Span::new(start, end))
    }

    fn scan_ident(&mut self, start: Pos) -> Token {
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let end = self.pos();
        let lexeme = &self.source[start.offset..end.offset];
        let kind = TokenKind::keyword(lexeme).unwrap_or(TokenKind::Ident);
        let text = self.interner.intern(lexeme);
        Token::new(kind, text, Span::new(start, end))
    }

    /// `[0-9]+`, extended to a float literal when immediately followed by
    /// `.` and at least one digit. Overflow is deferred to the parser's
    /// literal conversion.
    fn scan_number(&mut self, start: Pos) -> Token {
        while matches!(self.peek_char(), Some(ch) if ch.is_ascii_digit()) {
            self.bump();
        }
        let mut kind = TokenKind::IntLit;
        if self.peek_char() == Some('.')
            && matches!(self.peek_char2(), Some(ch) if ch.is_ascii_digit())
        {
            self.bump();
            while matches!(self.peek_char(), Some(ch) if ch.is_ascii_digit()) {
                self.bump();
            }
            kind = TokenKind::FloatLit;
        }
        self.lexeme_token(kind, start)
    }

    /// Scans a string literal, decoding escapes as it goes.
    ///
    /// On an unterminated string (newline or end of input before the closing
    /// quote) a lexical error is reported and the token carries whatever was
    /// decoded up to that point.
    fn scan_string(&mut self, start: Pos) -> Token {
        self.bump();
        let mut decoded = String::new();
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    let span = Span::new(start, self.pos());
                    self.error("unterminated string literal".to_string(), span);
                    break;
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    let esc_start = self.pos();
                    self.bump();
                    match self.peek_char() {
                        Some('n') => {
                            self.bump();
                            decoded.push('\n');
                        }
                        Some('t') => {
                            self.bump();
                            decoded.push('\t');
                        }
                        Some('\\') => {
                            self.bump();
                            decoded.push('\\');
                        }
                        Some('"') => {
                            self.bump();
                            decoded.push('"');
                        }
                        Some(other) if other != '\n' => {
                            self.bump();
                            let span = Span::new(esc_start, self.pos());
                            self.error(format!("invalid escape sequence '\\{}'", other), span);
                            decoded.push(other);
                        }
                        _ => {
                            // Backslash at end of line or input; the
                            // unterminated-string arm above reports it.
                        }
                    }
                }
                Some(other) => {
                    self.bump();
                    decoded.push(other);
                }
            }
        }
        let end = self.pos();
        let text = self.interner.intern(&decoded);
        Token::new(TokenKind::StringLit, text, Span::new(start, end))
    }

    /// Operators and punctuation, multi-character forms first (maximal munch).
    fn scan_operator(&mut self, start: Pos, ch: char) -> Token {
        let two = self.peek_char2();
        let kind = match (ch, two) {
            ('=', Some('=')) => {
                self.bump();
                self.bump();
                TokenKind::Eq
            }
            ('!', Some('=')) => {
                self.bump();
                self.bump();
                TokenKind::NotEq
            }
            ('<', Some('=')) => {
                self.bump();
                self.bump();
                TokenKind::LessEq
            }
            ('>', Some('=')) => {
                self.bump();
                self.bump();
                TokenKind::GreaterEq
            }
            ('&', Some('&')) => {
                self.bump();
                self.bump();
                TokenKind::And
            }
            ('|', Some('|')) => {
                self.bump();
                self.bump();
                TokenKind::Or
            }
            ('-', Some('>')) => {
                self.bump();
                self.bump();
                TokenKind::Arrow
            }
            _ => {
                self.bump();
                match ch {
                    '+' => TokenKind::Plus,
                    '-' => TokenKind::Minus,
                    '*' => TokenKind::Star,
                    '/' => TokenKind::Slash,
                    '%' => TokenKind::Percent,
                    '=' => TokenKind::Assign,
                    '<' => TokenKind::Less,
                    '>' => TokenKind::Greater,
                    '!' => TokenKind::Not,
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    ';' => TokenKind::Semi,
                    ',' => TokenKind::Comma,
                    '.' => TokenKind::Dot,
                    other => {
                        let span = Span::new(start, self.pos());
                        self.error(format!("unrecognized character '{}'", other), span);
                        // Skip the offending byte and scan whatever follows.
                        return self.scan();
                    }
                }
            }
        };
        self.lexeme_token(kind, start)
    }
}
