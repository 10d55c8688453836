use crate::lexer::Span;
use compact_str::CompactString;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    #[error("variable not found: {0}")]
    UndefinedVariable(CompactString),
    #[error("function argument value, type, or count is invalid")]
    InvalidArgument,
    #[error("operator/operand type mismatch: {lhs} {operator} {rhs}")]
    TypeMismatch {
        lhs: &'static str,
        operator: &'static str,
        rhs: &'static str,
    },
    #[error("operator {operator} is not supported for {type_name}")]
    UnsupportedOperator {
        operator: &'static str,
        type_name: &'static str,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("too many arguments: {name} takes {expected} but got {actual}")]
    TooManyArguments {
        name: CompactString,
        expected: usize,
        actual: usize,
    },
    #[error("function {0} takes no arguments")]
    UnexpectedArguments(CompactString),
    #[error("name in use: {0}")]
    NameInUse(CompactString),
    #[error("left hand side of assignment must be a variable")]
    InvalidAssignmentTarget,
    #[error("data type mismatch: condition must be logical, got {0}")]
    NonLogicalCondition(&'static str),
    #[error("operand of {operator} must be logical, got {type_name}")]
    NonLogicalOperand {
        operator: &'static str,
        type_name: &'static str,
    },
    #[error("{0} is not a function")]
    NotCallable(&'static str),
    #[error("{0} outside of a loop")]
    StrayLoopControl(&'static str),
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub span: Span,
}

impl RuntimeError {
    pub fn code(&self) -> &'static str {
        match self.kind {
            RuntimeErrorKind::UndefinedVariable(_) => "RT001",
            RuntimeErrorKind::InvalidArgument => "RT002",
            RuntimeErrorKind::TypeMismatch { .. } => "RT003",
            RuntimeErrorKind::UnsupportedOperator { .. } => "RT004",
            RuntimeErrorKind::DivisionByZero => "RT005",
            RuntimeErrorKind::TooManyArguments { .. } => "RT006",
            RuntimeErrorKind::UnexpectedArguments(_) => "RT007",
            RuntimeErrorKind::NameInUse(_) => "RT008",
            RuntimeErrorKind::InvalidAssignmentTarget => "RT009",
            RuntimeErrorKind::NonLogicalCondition(_) => "RT010",
            RuntimeErrorKind::NonLogicalOperand { .. } => "RT011",
            RuntimeErrorKind::NotCallable(_) => "RT012",
            RuntimeErrorKind::StrayLoopControl(_) => "RT013",
        }
    }
}
