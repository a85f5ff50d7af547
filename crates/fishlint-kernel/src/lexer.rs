//! Lexer for fish source.
//!
//! Fish keywords are only keywords in command position, so the lexer does not
//! know about them: it produces words, separators and comments, and the
//! parser decides what a word means.
//!
//! # Token Categories
//!
//! - **Words**: bare text plus quoted segments (`'...'`, `"..."`) and escapes
//! - **Separators**: `;`, newline, `&`
//! - **Connectors**: `|`, `&&`, `||`
//! - **Comments**: `#` to end of line

use logos::Logos;
use std::fmt;
use std::ops::Range;

/// A token with its span in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub token: T,
    pub span: Range<usize>,
}

impl<T> Spanned<T> {
    pub fn new(token: T, span: Range<usize>) -> Self {
        Self { token, span }
    }
}

/// Lexer error types.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LexerError {
    #[default]
    UnexpectedCharacter,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexerError::UnexpectedCharacter => write!(f, "unexpected character"),
        }
    }
}

/// Tokens produced by the fish lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexerError)]
#[logos(skip r"[ \t]+")]
#[logos(skip r"\\\r?\n")]
pub enum Token {
    #[token("&&")]
    AndAnd,

    #[token("||")]
    OrOr,

    #[token("|")]
    Pipe,

    #[token("&")]
    Ampersand,

    #[token(";")]
    Semicolon,

    #[regex(r"\r?\n")]
    Newline,

    #[regex(r"#[^\n]*", allow_greedy = true)]
    Comment,

    /// A word. `>&` is allowed inside a word so `2>&1` stays one token.
    #[regex(r#"([^\s;|&#'"\\]|\\.|'[^']*'|"([^"\\]|\\.)*")([^\s;|&'"\\]|\\.|'[^']*'|"([^"\\]|\\.)*"|>&)*"#, allow_greedy = true)]
    Word,
}

impl Token {
    /// Separators end a statement.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Token::Semicolon | Token::Newline | Token::Ampersand)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::AndAnd => write!(f, "AND_AND"),
            Token::OrOr => write!(f, "OR_OR"),
            Token::Pipe => write!(f, "PIPE"),
            Token::Ampersand => write!(f, "AMPERSAND"),
            Token::Semicolon => write!(f, "SEMI"),
            Token::Newline => write!(f, "NEWLINE"),
            Token::Comment => write!(f, "COMMENT"),
            Token::Word => write!(f, "WORD"),
        }
    }
}

/// Tokenize fish source.
///
/// Never fails: characters the lexer can't place (an unterminated quote, a
/// stray backslash at end of input) come back as `Err` tokens so the parser
/// can turn them into error nodes.
pub fn tokenize(source: &str) -> Vec<Spanned<Result<Token, LexerError>>> {
    Token::lexer(source)
        .spanned()
        .map(|(result, span)| Spanned::new(result, span))
        .collect()
}
