use std::rc::Rc;

use super::expression::Expression;
use crate::{lexer::Span, string::Ident};

/// Visibility class a binding is declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only the declaring activation sees it.
    Local,
    /// Inherited by every call made below the declaring activation.
    Private,
    /// Lives in the global environment.
    Public,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Local => "LOCAL",
            Scope::Private => "PRIVATE",
            Scope::Public => "PUBLIC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    String,
    Number,
    Boolean,
}

impl DeclaredType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" | "character" => Some(Self::String),
            "number" | "numeric" => Some(Self::Number),
            "boolean" | "logical" => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Number => "NUMBER",
            Self::Boolean => "BOOLEAN",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Statement {
    VariableDecl(VariableDecl),
    InlineVariableDecl(InlineVariableDecl),
    FunctionDecl(FunctionDecl),
    Expression(ExpressionStatement),
    Print(PrintStatement),
    If(IfStatement),
    DoCase(DoCaseStatement),
    While(WhileStatement),
    Return(ReturnStatement),
    Exit(Span),
    Loop(Span),
}

/// Statements run in order inside the enclosing activation's environment.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn iter(&self) -> std::slice::Iter<'_, Statement> {
        self.statements.iter()
    }
}

#[derive(Debug, Clone)]
pub struct VariableDeclarator {
    pub name: Ident,
    pub declared_type: Option<DeclaredType>,
    pub initial: Option<Expression>,
}

/// `LOCAL X [AS type] [= value]`
#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub scope: Scope,
    pub declarator: VariableDeclarator,
}

/// `LOCAL X = 1, Y = 2` or `LOCAL(X = 1, Y = 2)`
#[derive(Debug, Clone)]
pub struct InlineVariableDecl {
    pub scope: Scope,
    pub declarators: Vec<VariableDeclarator>,
    /// Whether the declarators were written inside parentheses.
    pub grouped: bool,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Ident,
    pub parameters: Vec<Ident>,
    pub body: Rc<Block>,
}

#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    pub expr: Expression,
}

#[derive(Debug, Clone)]
pub struct PrintStatement {
    pub arguments: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStatement {
    pub condition: Expression,
    pub success: Block,
    pub failure: Option<Block>,
}

#[derive(Debug, Clone)]
pub struct CaseBranch {
    pub condition: Expression,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub struct DoCaseStatement {
    pub branches: Vec<CaseBranch>,
    pub otherwise: Option<Block>,
}

#[derive(Debug, Clone)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub value: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    statements: Vec<Statement>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Statement> {
        self.statements.iter()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
