mod operator;
mod tree;

pub use operator::{
    BinaryAssignmentOperator, BinaryOperator, BinaryShortCircuitOperator, PostfixOperator,
    Precedence, UnaryOperator,
};
pub use tree::{
    Expression, ExpressionAtom, ExpressionAtomKind, ExpressionNode, ExpressionNodeRef,
    IncompleteExpression,
};
