use super::token::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexicalErrorKind {
    #[error("Unknown character {0:?}")]
    Unrecognized(char),
    #[error("Unterminated string literal")]
    UnclosedString,
    #[error("Unterminated block comment")]
    UnclosedComment,
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind} at [{line}:{col}]")]
pub struct LexicalError {
    #[source]
    pub kind: LexicalErrorKind,
    pub span: Span,
    pub line: u32,
    pub col: u32,
}
