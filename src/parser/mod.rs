mod error;
pub mod expression;
pub mod formatter;
pub mod statement;

pub use error::{ParserError, ParserErrorKind};

use crate::{
    lexer::{Lexer, LexicalError, Span, Token, TokenKind},
    string::Ident,
};
use compact_str::CompactString;
use expression::{
    BinaryAssignmentOperator, BinaryOperator, BinaryShortCircuitOperator, Expression,
    ExpressionAtom, ExpressionAtomKind, ExpressionNode, ExpressionNodeRef, IncompleteExpression,
    PostfixOperator, Precedence, UnaryOperator,
};
use statement::{
    Block, CaseBranch, DeclaredType, DoCaseStatement, ExpressionStatement, FunctionDecl,
    IfStatement, InlineVariableDecl, PrintStatement, Program, ReturnStatement, Scope, Statement,
    VariableDecl, VariableDeclarator, WhileStatement,
};
use std::rc::Rc;

/// How a token continues an expression that is already on the left.
#[derive(Debug, Clone, Copy)]
enum InfixRule {
    Binary(BinaryOperator),
    ShortCircuit(BinaryShortCircuitOperator),
    Assignment(BinaryAssignmentOperator),
    Postfix(PostfixOperator),
}

impl InfixRule {
    fn from_token(kind: TokenKind) -> Option<Self> {
        let rule = match kind {
            TokenKind::Plus => Self::Binary(BinaryOperator::Add),
            TokenKind::Minus => Self::Binary(BinaryOperator::Subtract),
            TokenKind::Star => Self::Binary(BinaryOperator::Multiply),
            TokenKind::Slash => Self::Binary(BinaryOperator::Divide),
            TokenKind::LessThan => Self::Binary(BinaryOperator::LessThan),
            TokenKind::LessThanEqual => Self::Binary(BinaryOperator::LessThanEqual),
            TokenKind::GreaterThan => Self::Binary(BinaryOperator::GreaterThan),
            TokenKind::GreaterThanEqual => Self::Binary(BinaryOperator::GreaterThanEqual),
            TokenKind::EqualEqual => Self::Binary(BinaryOperator::EqualEqual),
            TokenKind::BangEqual => Self::Binary(BinaryOperator::BangEqual),
            TokenKind::KeywordAnd => Self::ShortCircuit(BinaryShortCircuitOperator::And),
            TokenKind::KeywordOr => Self::ShortCircuit(BinaryShortCircuitOperator::Or),
            TokenKind::Equal => Self::Assignment(BinaryAssignmentOperator::Assign),
            TokenKind::ColonEqual => Self::Assignment(BinaryAssignmentOperator::Bind),
            TokenKind::PlusEqual => Self::Assignment(BinaryAssignmentOperator::AddAssign),
            TokenKind::MinusEqual => Self::Assignment(BinaryAssignmentOperator::SubtractAssign),
            TokenKind::StarEqual => Self::Assignment(BinaryAssignmentOperator::MultiplyAssign),
            TokenKind::SlashEqual => Self::Assignment(BinaryAssignmentOperator::DivideAssign),
            TokenKind::LeftParenthesis => Self::Postfix(PostfixOperator::Call),
            _ => return None,
        };
        Some(rule)
    }

    fn get_precedence(&self) -> Precedence {
        match self {
            Self::Binary(operator) => operator.get_precedence(),
            Self::ShortCircuit(operator) => operator.get_precedence(),
            Self::Assignment(operator) => operator.get_precedence(),
            Self::Postfix(operator) => operator.get_precedence(),
        }
    }
}

/// Tokens that close a block and therefore also end a bare `RETURN` or `?`.
const BLOCK_TERMINATORS: &[TokenKind] = &[
    TokenKind::KeywordElse,
    TokenKind::KeywordEndIf,
    TokenKind::KeywordEndFunc,
    TokenKind::KeywordEndDo,
    TokenKind::KeywordCase,
    TokenKind::KeywordOtherwise,
    TokenKind::KeywordEndCase,
];

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    peek: Token,
    errors: Vec<ParserError>,
    fatal: Option<LexicalError>,
}

impl<'src> Parser<'src> {
    pub fn new(lexer: Lexer<'src>) -> Self {
        let placeholder = Token {
            kind: TokenKind::Eof,
            lexeme: CompactString::default(),
            span: Span::new(0, 0),
            line: 1,
            col: 1,
        };
        let mut parser = Self {
            lexer,
            current: placeholder.clone(),
            peek: placeholder,
            errors: Vec::new(),
            fatal: None,
        };
        parser.current = parser.pull_token();
        parser.peek = parser.pull_token();
        parser
    }

    /// Pulls from the lexer. A lexical error is fatal: it is kept aside and every following
    /// token becomes `EOF` so the parse winds down.
    fn pull_token(&mut self) -> Token {
        if let Some(ref error) = self.fatal {
            return Token {
                kind: TokenKind::Eof,
                lexeme: CompactString::default(),
                span: error.span,
                line: error.line,
                col: error.col,
            };
        }
        match self.lexer.next_token() {
            Ok(token) => token,
            Err(error) => {
                self.fatal = Some(error);
                self.pull_token()
            }
        }
    }

    fn advance(&mut self) -> Token {
        let next = self.pull_token();
        let peek = std::mem::replace(&mut self.peek, next);
        std::mem::replace(&mut self.current, peek)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn eat_if(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn skip_newlines(&mut self) {
        while self.eat_if(TokenKind::Newline).is_some() {}
    }

    /// Consumes `expected` or records a syntax error without consuming anything.
    fn expect(&mut self, expected: TokenKind) -> Option<Token> {
        if self.check(expected) {
            Some(self.advance())
        } else {
            self.report(ParserErrorKind::UnexpectedToken {
                actual: self.current.kind,
                expected,
            });
            None
        }
    }

    fn expect_identifier(&mut self) -> Option<Ident> {
        if self.check(TokenKind::Ident) {
            let token = self.advance();
            Some(Ident {
                name: token.lexeme,
                span: token.span,
            })
        } else {
            self.report(ParserErrorKind::NonIdentifier(self.current.kind));
            None
        }
    }

    fn report(&mut self, kind: ParserErrorKind) {
        let error = ParserError {
            kind,
            span: self.current.span,
            line: self.current.line,
            col: self.current.col,
        };
        tracing::debug!(%error, "recording syntax error");
        self.errors.push(error);
    }

    /// Skips the rest of the current line so parsing can resume at the next statement.
    fn synchronize(&mut self) {
        while !matches!(self.current.kind, TokenKind::Newline | TokenKind::Eof) {
            self.advance();
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Newline | TokenKind::Eof)
            || BLOCK_TERMINATORS.contains(&self.current.kind)
    }
}

// Pratt parser for expressions
impl<'src> Parser<'src> {
    /// Parses one expression. `None` means a syntax error was recorded.
    pub fn parse_expression(&mut self) -> Option<Expression> {
        let mut tree = IncompleteExpression::new();
        let root = self.parse_expression_pratt(Precedence::Lowest, &mut tree)?;
        tree.finish(root)
    }

    fn parse_expression_pratt(
        &mut self,
        min_precedence: Precedence,
        tree: &mut IncompleteExpression,
    ) -> Option<ExpressionNodeRef> {
        let mut lhs = self.parse_prefix(tree)?;

        while let Some(rule) = InfixRule::from_token(self.current.kind) {
            let precedence = rule.get_precedence();
            if precedence <= min_precedence {
                break;
            }
            lhs = self.parse_infix(rule, lhs, tree)?;
        }
        Some(lhs)
    }

    fn parse_prefix(&mut self, tree: &mut IncompleteExpression) -> Option<ExpressionNodeRef> {
        let atom = |kind: ExpressionAtomKind, token: &Token| {
            ExpressionNode::Atom(ExpressionAtom {
                kind,
                span: token.span,
            })
        };

        let node = match self.current.kind {
            TokenKind::NumericLiteral => {
                let token = self.advance();
                let Ok(value) = token.lexeme.parse() else {
                    self.report(ParserErrorKind::InvalidNumber(token.lexeme.clone()));
                    return None;
                };
                atom(ExpressionAtomKind::Number(value), &token)
            }
            TokenKind::StringLiteral => {
                let token = self.advance();
                let value = token
                    .lexeme
                    .get(1..token.lexeme.len().saturating_sub(1))
                    .unwrap_or_default();
                atom(ExpressionAtomKind::StringLiteral(value.into()), &token)
            }
            TokenKind::True => {
                let token = self.advance();
                atom(ExpressionAtomKind::Bool(true), &token)
            }
            TokenKind::False => {
                let token = self.advance();
                atom(ExpressionAtomKind::Bool(false), &token)
            }
            TokenKind::KeywordNull => {
                let token = self.advance();
                atom(ExpressionAtomKind::Null, &token)
            }
            TokenKind::Ident => {
                let token = self.advance();
                atom(ExpressionAtomKind::Identifier(token.lexeme.clone()), &token)
            }
            // Unary operators
            TokenKind::Minus | TokenKind::Bang => {
                let token = self.advance();
                let operator = if token.kind == TokenKind::Minus {
                    UnaryOperator::Minus
                } else {
                    UnaryOperator::Bang
                };
                let rhs = self.parse_expression_pratt(operator.get_precedence(), tree)?;
                ExpressionNode::Unary {
                    operator,
                    rhs,
                    span: token.span,
                }
            }
            // Bracketed expression
            TokenKind::LeftParenthesis => {
                self.advance();
                let inner = self.parse_expression_pratt(Precedence::Lowest, tree)?;
                self.expect(TokenKind::RightParenthesis)?;
                return Some(inner);
            }
            TokenKind::KeywordIif => {
                let keyword = self.advance();
                self.expect(TokenKind::LeftParenthesis)?;
                let condition = self.parse_expression_pratt(Precedence::Lowest, tree)?;
                self.expect(TokenKind::Comma)?;
                let success = self.parse_expression_pratt(Precedence::Lowest, tree)?;
                self.expect(TokenKind::Comma)?;
                let failure = self.parse_expression_pratt(Precedence::Lowest, tree)?;
                let closing = self.expect(TokenKind::RightParenthesis)?;
                ExpressionNode::Iif {
                    condition,
                    success,
                    failure,
                    span: keyword.span.merge(&closing.span),
                }
            }
            kind => {
                self.report(ParserErrorKind::NonExpression(kind));
                return None;
            }
        };
        Some(tree.push(node))
    }

    fn parse_infix(
        &mut self,
        rule: InfixRule,
        lhs: ExpressionNodeRef,
        tree: &mut IncompleteExpression,
    ) -> Option<ExpressionNodeRef> {
        // Operator token
        self.advance();
        let node = match rule {
            InfixRule::Binary(operator) => {
                let rhs = self.parse_expression_pratt(operator.get_precedence(), tree)?;
                ExpressionNode::Binary { operator, lhs, rhs }
            }
            InfixRule::ShortCircuit(operator) => {
                let rhs = self.parse_expression_pratt(operator.get_precedence(), tree)?;
                ExpressionNode::BinaryShortCircuit { operator, lhs, rhs }
            }
            // Assignment chains to the right: `A = B = 1` assigns `B = 1` first.
            InfixRule::Assignment(operator) => {
                let rhs = self.parse_expression_pratt(Precedence::Lowest, tree)?;
                ExpressionNode::BinaryAssignment { operator, lhs, rhs }
            }
            InfixRule::Postfix(PostfixOperator::Call) => {
                let mut arguments = Vec::new();
                if !self.check(TokenKind::RightParenthesis) {
                    loop {
                        arguments.push(self.parse_expression_pratt(Precedence::Lowest, tree)?);
                        if self.eat_if(TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                }
                let closing = self.expect(TokenKind::RightParenthesis)?;
                ExpressionNode::Call {
                    callee: lhs,
                    arguments,
                    span: closing.span,
                }
            }
        };
        Some(tree.push(node))
    }
}

// Parse program/statements
impl<'src> Parser<'src> {
    /// Parses the whole source. Syntax errors are collected alongside the statements that did
    /// parse, while a lexical error aborts the parse entirely.
    pub fn parse(&mut self) -> Result<(Program, Vec<ParserError>), LexicalError> {
        let mut statements = Vec::new();

        while !self.check(TokenKind::Eof) {
            match self.parse_statement() {
                Some(statement) => statements.push(statement),
                None => self.synchronize(),
            }
            self.eat_if(TokenKind::Newline);
        }

        if let Some(error) = self.fatal.take() {
            return Err(error);
        }
        Ok((Program::new(statements), std::mem::take(&mut self.errors)))
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.current.kind {
            TokenKind::KeywordLocal | TokenKind::KeywordPrivate | TokenKind::KeywordPublic => {
                self.parse_variable_declaration()
            }
            TokenKind::KeywordFunction => self.parse_function_declaration(),
            TokenKind::KeywordReturn => self.parse_return_statement(),
            TokenKind::KeywordIf => self.parse_if_statement(),
            TokenKind::KeywordDo if self.peek.kind == TokenKind::KeywordCase => {
                self.parse_do_case_statement()
            }
            TokenKind::KeywordDo if self.peek.kind == TokenKind::KeywordWhile => {
                self.advance();
                self.parse_while_statement()
            }
            TokenKind::KeywordWhile => self.parse_while_statement(),
            TokenKind::KeywordExit => Some(Statement::Exit(self.advance().span)),
            TokenKind::KeywordLoop => Some(Statement::Loop(self.advance().span)),
            TokenKind::Question => self.parse_print_statement(),
            _ => {
                let expr = self.parse_expression()?;
                Some(Statement::Expression(ExpressionStatement { expr }))
            }
        }
    }

    /// Requires a line break, then parses statements until one of `terminators`. The terminator
    /// itself is left for the caller.
    fn parse_block(&mut self, terminators: &[TokenKind]) -> Block {
        self.expect(TokenKind::Newline);
        let mut statements = Vec::new();
        while !terminators.contains(&self.current.kind) && !self.check(TokenKind::Eof) {
            match self.parse_statement() {
                Some(statement) => statements.push(statement),
                None => self.synchronize(),
            }
            self.eat_if(TokenKind::Newline);
        }
        Block { statements }
    }

    fn parse_variable_declaration(&mut self) -> Option<Statement> {
        let scope = match self.advance().kind {
            TokenKind::KeywordLocal => Scope::Local,
            TokenKind::KeywordPrivate => Scope::Private,
            _ => Scope::Public,
        };

        if self.eat_if(TokenKind::LeftParenthesis).is_some() {
            let mut declarators = Vec::new();
            loop {
                self.skip_newlines();
                declarators.push(self.parse_declarator()?);
                self.skip_newlines();
                if self.eat_if(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.skip_newlines();
            self.expect(TokenKind::RightParenthesis)?;
            return Some(Statement::InlineVariableDecl(InlineVariableDecl {
                scope,
                declarators,
                grouped: true,
            }));
        }

        let declarator = self.parse_declarator()?;
        if !self.check(TokenKind::Comma) {
            return Some(Statement::VariableDecl(VariableDecl { scope, declarator }));
        }

        let mut declarators = vec![declarator];
        while self.eat_if(TokenKind::Comma).is_some() {
            declarators.push(self.parse_declarator()?);
        }
        Some(Statement::InlineVariableDecl(InlineVariableDecl {
            scope,
            declarators,
            grouped: false,
        }))
    }

    fn parse_declarator(&mut self) -> Option<VariableDeclarator> {
        let name = self.expect_identifier()?;

        let declared_type = if self.eat_if(TokenKind::KeywordAs).is_some() {
            let type_name = self.expect_identifier()?;
            match DeclaredType::from_name(&type_name.name) {
                Some(declared_type) => Some(declared_type),
                None => {
                    self.report(ParserErrorKind::UnknownType(type_name.name));
                    return None;
                }
            }
        } else {
            None
        };

        let initial = if self.eat_if(TokenKind::Equal).is_some() {
            Some(self.parse_expression()?)
        } else {
            None
        };

        Some(VariableDeclarator {
            name,
            declared_type,
            initial,
        })
    }

    fn parse_function_declaration(&mut self) -> Option<Statement> {
        self.advance();
        let name = self.expect_identifier()?;

        let mut parameters = Vec::new();
        if self.eat_if(TokenKind::LeftParenthesis).is_some() {
            if !self.check(TokenKind::RightParenthesis) {
                loop {
                    parameters.push(self.expect_identifier()?);
                    if self.eat_if(TokenKind::Comma).is_none() {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RightParenthesis);
        }

        let body = self.parse_block(&[TokenKind::KeywordEndFunc]);
        self.expect(TokenKind::KeywordEndFunc);
        Some(Statement::FunctionDecl(FunctionDecl {
            name,
            parameters,
            body: Rc::new(body),
        }))
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        let keyword = self.advance();
        let value = if self.at_statement_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        Some(Statement::Return(ReturnStatement {
            value,
            span: keyword.span,
        }))
    }

    fn parse_print_statement(&mut self) -> Option<Statement> {
        let keyword = self.advance();
        let mut arguments = Vec::new();
        if !self.at_statement_end() {
            loop {
                arguments.push(self.parse_expression()?);
                if self.eat_if(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        Some(Statement::Print(PrintStatement {
            arguments,
            span: keyword.span,
        }))
    }

    fn parse_if_statement(&mut self) -> Option<Statement> {
        self.advance();
        let condition = self.parse_expression()?;
        self.eat_if(TokenKind::KeywordThen);

        let success = self.parse_block(&[TokenKind::KeywordElse, TokenKind::KeywordEndIf]);
        let failure = match self.eat_if(TokenKind::KeywordElse) {
            Some(_) => Some(self.parse_block(&[TokenKind::KeywordEndIf])),
            None => None,
        };
        self.expect(TokenKind::KeywordEndIf);

        Some(Statement::If(IfStatement {
            condition,
            success,
            failure,
        }))
    }

    fn parse_do_case_statement(&mut self) -> Option<Statement> {
        // `DO CASE`
        self.advance();
        self.advance();
        self.expect(TokenKind::Newline);

        let mut branches = Vec::new();
        while self.eat_if(TokenKind::KeywordCase).is_some() {
            let condition = self.parse_expression()?;
            let body = self.parse_block(&[
                TokenKind::KeywordCase,
                TokenKind::KeywordOtherwise,
                TokenKind::KeywordEndCase,
            ]);
            branches.push(CaseBranch { condition, body });
        }

        let otherwise = match self.eat_if(TokenKind::KeywordOtherwise) {
            Some(_) => Some(self.parse_block(&[TokenKind::KeywordEndCase])),
            None => None,
        };
        if !self.check(TokenKind::KeywordEndCase) {
            self.report(ParserErrorKind::NonCaseBranch(self.current.kind));
        } else {
            self.advance();
        }

        Some(Statement::DoCase(DoCaseStatement {
            branches,
            otherwise,
        }))
    }

    fn parse_while_statement(&mut self) -> Option<Statement> {
        self.advance();
        let condition = self.parse_expression()?;
        let body = self.parse_block(&[TokenKind::KeywordEndDo]);
        self.expect(TokenKind::KeywordEndDo);
        Some(Statement::While(WhileStatement { condition, body }))
    }
}
