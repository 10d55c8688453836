use compact_str::CompactString;

use crate::lexer::Span;

use super::{BinaryAssignmentOperator, BinaryOperator, BinaryShortCircuitOperator, UnaryOperator};

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionAtomKind {
    Number(f64),
    Bool(bool),
    Null,
    Identifier(CompactString),
    StringLiteral(CompactString),
}

#[derive(Debug, Clone)]
pub struct ExpressionAtom {
    pub kind: ExpressionAtomKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpressionNodeRef(pub u32);

#[derive(Debug, Clone)]
pub enum ExpressionNode {
    Atom(ExpressionAtom),
    Unary {
        operator: UnaryOperator,
        rhs: ExpressionNodeRef,
        span: Span,
    },
    Binary {
        operator: BinaryOperator,
        lhs: ExpressionNodeRef,
        rhs: ExpressionNodeRef,
    },
    /// The target is only checked to be an identifier when evaluated.
    BinaryAssignment {
        operator: BinaryAssignmentOperator,
        lhs: ExpressionNodeRef,
        rhs: ExpressionNodeRef,
    },
    BinaryShortCircuit {
        operator: BinaryShortCircuitOperator,
        lhs: ExpressionNodeRef,
        rhs: ExpressionNodeRef,
    },
    Call {
        callee: ExpressionNodeRef,
        arguments: Vec<ExpressionNodeRef>,
        /// Span of the closing parenthesis.
        span: Span,
    },
    Iif {
        condition: ExpressionNodeRef,
        success: ExpressionNodeRef,
        failure: ExpressionNodeRef,
        /// Span from `IIF` to the closing parenthesis.
        span: Span,
    },
}

impl ExpressionNode {
    pub fn get_l_value(&self) -> Option<&CompactString> {
        match self {
            ExpressionNode::Atom(ExpressionAtom {
                kind: ExpressionAtomKind::Identifier(name),
                ..
            }) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IncompleteExpression {
    nodes: Vec<ExpressionNode>,
}

impl IncompleteExpression {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn push(&mut self, node: ExpressionNode) -> ExpressionNodeRef {
        self.nodes.push(node);
        ExpressionNodeRef(self.nodes.len() as u32 - 1)
    }

    /// Seals the arena, returning `None` if `root` does not belong to it.
    pub fn finish(self, root: ExpressionNodeRef) -> Option<Expression> {
        if (root.0 as usize) < self.nodes.len() {
            Some(Expression {
                nodes: self.nodes,
                root,
            })
        } else {
            None
        }
    }
}

/// An expression stored as an arena of nodes that refer to each other by index.
#[derive(Debug, Clone)]
pub struct Expression {
    nodes: Vec<ExpressionNode>,
    root: ExpressionNodeRef,
}

impl Expression {
    pub fn get_root_ref(&self) -> ExpressionNodeRef {
        self.root
    }

    pub fn get_node(&self, node: ExpressionNodeRef) -> Option<&ExpressionNode> {
        self.nodes.get(node.0 as usize)
    }

    pub fn get_span(&self) -> Span {
        self.get_subspan(self.root)
            .expect("The root exists within the tree.")
    }

    pub fn get_subspan(&self, node: ExpressionNodeRef) -> Option<Span> {
        get_span(&self.nodes, node)
    }
}

fn get_span(nodes: &[ExpressionNode], node: ExpressionNodeRef) -> Option<Span> {
    let span = match nodes.get(node.0 as usize)? {
        ExpressionNode::Atom(ExpressionAtom { span, .. }) => *span,
        ExpressionNode::Unary { rhs, span, .. } => span.merge(&get_span(nodes, *rhs)?),
        ExpressionNode::Binary { lhs, rhs, .. }
        | ExpressionNode::BinaryAssignment { lhs, rhs, .. }
        | ExpressionNode::BinaryShortCircuit { lhs, rhs, .. } => {
            get_span(nodes, *lhs)?.merge(&get_span(nodes, *rhs)?)
        }
        ExpressionNode::Call { callee, span, .. } => get_span(nodes, *callee)?.merge(span),
        ExpressionNode::Iif { span, .. } => *span,
    };
    Some(span)
}
