//! Lexical analysis for packet schema sources.
//!
//! Converts source text into a flat token stream terminated by
//! [`TokenKind::Eof`]. The lexer has no semantic knowledge: keywords are
//! recognised, identifiers are not resolved.

use crate::error::LexicalError;
use std::fmt;

/// Token categories produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `packet` keyword.
    Packet,
    /// `import` keyword.
    Import,
    /// `type` keyword.
    Type,
    /// `enum` keyword.
    Enum,
    /// Identifier (including primitive type names and `true`/`false`).
    Identifier,
    /// Decimal integer literal, optionally negative.
    Number,
    /// Decimal literal with a fractional part.
    Float,
    /// Double-quoted string literal (text holds the inner content).
    String,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `<`
    LAngle,
    /// `>`
    RAngle,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `=`
    Equals,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Human readable name used in diagnostics.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::Packet => "'packet'",
            Self::Import => "'import'",
            Self::Type => "'type'",
            Self::Enum => "'enum'",
            Self::Identifier => "identifier",
            Self::Number => "number",
            Self::Float => "float",
            Self::String => "string",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::LAngle => "'<'",
            Self::RAngle => "'>'",
            Self::Colon => "':'",
            Self::Comma => "','",
            Self::Equals => "'='",
            Self::Eof => "end of file",
        }
    }

    fn keyword(text: &str) -> Option<Self> {
        match text {
            "packet" => Some(Self::Packet),
            "import" => Some(Self::Import),
            "type" => Some(Self::Type),
            "enum" => Some(Self::Enum),
            _ => None,
        }
    }

    fn symbol(c: char) -> Option<Self> {
        match c {
            '{' => Some(Self::LBrace),
            '}' => Some(Self::RBrace),
            '[' => Some(Self::LBracket),
            ']' => Some(Self::RBracket),
            '<' => Some(Self::LAngle),
            '>' => Some(Self::RAngle),
            ':' => Some(Self::Colon),
            ',' => Some(Self::Comma),
            '=' => Some(Self::Equals),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A token with its literal text and starting position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token category.
    pub kind: TokenKind,
    /// Literal text. Strings hold their content without the quotes.
    pub text: String,
    /// Line of the first character (1-based).
    pub line: usize,
    /// Column of the first character (1-based).
    pub column: usize,
}

impl Token {
    /// Creates a new token.
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
        }
    }
}

/// Tokenizes a complete source text.
///
/// # Errors
/// Returns `LexicalError` on an unterminated string or block comment, or on
/// a character outside the schema alphabet.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexicalError> {
    Lexer::new(source).tokenize()
}

/// Character-level scanner. Consumed by [`Lexer::tokenize`].
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over the given source.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    /// Scans the whole input.
    ///
    /// # Errors
    /// See [`tokenize`].
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexicalError> {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else if c == '/' {
                self.comment()?;
            } else {
                self.scan_token(c)?;
            }
        }
        self.tokens
            .push(Token::new(TokenKind::Eof, "", self.line, self.column));
        Ok(self.tokens)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> LexicalError {
        LexicalError::new(message, self.line, self.column)
    }

    fn scan_token(&mut self, c: char) -> Result<(), LexicalError> {
        let (line, column) = (self.line, self.column);
        if c.is_ascii_alphabetic() || c == '_' {
            let text = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
            let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier);
            self.tokens.push(Token::new(kind, text, line, column));
        } else if c.is_ascii_digit()
            || (c == '-' && self.peek_second().is_some_and(|n| n.is_ascii_digit()))
        {
            self.number(line, column);
        } else if c == '"' {
            self.string(line, column)?;
        } else if let Some(kind) = TokenKind::symbol(c) {
            self.advance();
            self.tokens.push(Token::new(kind, c.to_string(), line, column));
        } else {
            return Err(self.error(format!("Unexpected character: {c}")));
        }
        Ok(())
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            text.push(c);
            self.advance();
        }
        text
    }

    fn number(&mut self, line: usize, column: usize) {
        let mut text = String::new();
        if self.peek() == Some('-') {
            text.push('-');
            self.advance();
        }
        text.push_str(&self.take_while(|c| c.is_ascii_digit()));

        let fractional = self.peek() == Some('.')
            && self.peek_second().is_some_and(|c| c.is_ascii_digit());
        let kind = if fractional {
            self.advance();
            text.push('.');
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
            TokenKind::Float
        } else {
            TokenKind::Number
        };
        self.tokens.push(Token::new(kind, text, line, column));
    }

    fn string(&mut self, line: usize, column: usize) -> Result<(), LexicalError> {
        self.advance();
        let mut text = String::new();
        loop {
            match self.advance() {
                Some('"') => break,
                // Escapes are kept verbatim.
                Some('\\') => {
                    text.push('\\');
                    match self.advance() {
                        Some(next) => text.push(next),
                        None => return Err(self.error("Unterminated string")),
                    }
                }
                Some(c) => text.push(c),
                None => return Err(self.error("Unterminated string")),
            }
        }
        self.tokens
            .push(Token::new(TokenKind::String, text, line, column));
        Ok(())
    }

    fn comment(&mut self) -> Result<(), LexicalError> {
        match self.peek_second() {
            Some('/') => {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                Ok(())
            }
            Some('*') => {
                self.advance();
                self.advance();
                loop {
                    match self.advance() {
                        Some('*') => {
                            if self.peek() == Some('/') {
                                self.advance();
                                return Ok(());
                            }
                        }
                        Some(_) => {}
                        None => return Err(self.error("Unterminated block comment")),
                    }
                }
            }
            _ => Err(self.error("Unexpected character: /")),
        }
    }
}
