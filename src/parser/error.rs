use crate::lexer::{Span, TokenKind};
use compact_str::CompactString;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParserErrorKind {
    #[error("expected {expected} but found {actual}")]
    UnexpectedToken {
        actual: TokenKind,
        expected: TokenKind,
    },
    #[error("expected an expression but found {0}")]
    NonExpression(TokenKind),
    #[error("expected a name but found {0}")]
    NonIdentifier(TokenKind),
    #[error("expected a CASE branch but found {0}")]
    NonCaseBranch(TokenKind),
    #[error("unknown type {0}")]
    UnknownType(CompactString),
    #[error("invalid numeric literal {0}")]
    InvalidNumber(CompactString),
}

/// A recoverable syntax error, reported as `Syntax error at (line:col) <message>.`
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Syntax error at ({line}:{col}) {kind}.")]
pub struct ParserError {
    #[source]
    pub kind: ParserErrorKind,
    pub span: Span,
    pub line: u32,
    pub col: u32,
}

impl ParserError {
    pub fn code(&self) -> &'static str {
        match self.kind {
            ParserErrorKind::UnexpectedToken { .. } => "SY001",
            ParserErrorKind::NonExpression(_) => "SY002",
            ParserErrorKind::NonIdentifier(_) => "SY003",
            ParserErrorKind::NonCaseBranch(_) => "SY004",
            ParserErrorKind::UnknownType(_) => "SY005",
            ParserErrorKind::InvalidNumber(_) => "SY006",
        }
    }
}
