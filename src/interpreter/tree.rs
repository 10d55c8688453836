use super::{Environment, ProgramState, SystemContext};
use crate::{
    lexer::Span,
    parser::{
        expression::{
            BinaryAssignmentOperator, BinaryOperator, BinaryShortCircuitOperator, Expression,
            ExpressionAtom, ExpressionAtomKind, ExpressionNode, ExpressionNodeRef, UnaryOperator,
        },
        statement::{
            Block, DeclaredType, DoCaseStatement, FunctionDecl, IfStatement, InlineVariableDecl,
            PrintStatement, Program, ReturnStatement, Scope, Statement, VariableDecl,
            VariableDeclarator, WhileStatement,
        },
    },
    value::{
        error::{RuntimeError, RuntimeErrorKind},
        Function, FunctionDefinition, Value,
    },
};
use std::rc::Rc;

const MSG: &str = "All node references of a parsed expression are valid.";

/// Tree walking evaluator. Printing goes through the context.
pub struct Evaluator<C: SystemContext> {
    context: C,
}

impl<C> Evaluator<C>
where
    C: SystemContext,
{
    pub fn new(context: C) -> Self {
        Self { context }
    }

    pub fn into_context(self) -> C {
        self.context
    }

    /// Runs the top level statements in order. The result is the value of a top level `RETURN`,
    /// otherwise the value of the last statement.
    pub fn evaluate_program(
        &mut self,
        program: &Program,
        environment: &Environment,
    ) -> Result<Value, RuntimeError> {
        let mut last = Value::None;
        for statement in program.iter() {
            match self.interpret_statement(statement, environment)? {
                ProgramState::Run(value) => last = value,
                ProgramState::Return(value) => return Ok(value),
                ProgramState::Exit(span) => return Err(stray_loop_control("EXIT", span)),
                ProgramState::Loop(span) => return Err(stray_loop_control("LOOP", span)),
            }
        }
        Ok(last)
    }

    pub fn interpret_statement(
        &mut self,
        statement: &Statement,
        environment: &Environment,
    ) -> Result<ProgramState, RuntimeError> {
        match statement {
            Statement::VariableDecl(decl) => self.interpret_variable_declaration(decl, environment),
            Statement::InlineVariableDecl(decl) => {
                self.interpret_inline_variable_declaration(decl, environment)
            }
            Statement::FunctionDecl(decl) => self.interpret_function_declaration(decl, environment),
            Statement::Expression(stmt) => {
                let value = self.evaluate(&stmt.expr, environment)?;
                Ok(ProgramState::Run(value))
            }
            Statement::Print(stmt) => self.interpret_print_statement(stmt, environment),
            Statement::If(stmt) => self.interpret_if_statement(stmt, environment),
            Statement::DoCase(stmt) => self.interpret_do_case_statement(stmt, environment),
            Statement::While(stmt) => self.interpret_while_statement(stmt, environment),
            Statement::Return(stmt) => self.interpret_return_statement(stmt, environment),
            Statement::Exit(span) => Ok(ProgramState::Exit(*span)),
            Statement::Loop(span) => Ok(ProgramState::Loop(*span)),
        }
    }

    pub fn evaluate(
        &mut self,
        expr: &Expression,
        environment: &Environment,
    ) -> Result<Value, RuntimeError> {
        self.evaluate_expression_node(expr, expr.get_root_ref(), environment)
    }
}

fn stray_loop_control(keyword: &'static str, span: Span) -> RuntimeError {
    RuntimeError {
        kind: RuntimeErrorKind::StrayLoopControl(keyword),
        span,
    }
}

fn expect_logical(value: &Value, span: Span) -> Result<bool, RuntimeError> {
    match value {
        Value::Boolean(flag) => Ok(*flag),
        other => Err(RuntimeError {
            kind: RuntimeErrorKind::NonLogicalCondition(other.get_type_name()),
            span,
        }),
    }
}

// Statement interpreter
impl<C> Evaluator<C>
where
    C: SystemContext,
{
    /// Stops at the first statement that is not `Run`; otherwise yields the last statement's value.
    fn interpret_block(
        &mut self,
        block: &Block,
        environment: &Environment,
    ) -> Result<ProgramState, RuntimeError> {
        let mut last = Value::None;
        for statement in block.iter() {
            match self.interpret_statement(statement, environment)? {
                ProgramState::Run(value) => last = value,
                state => return Ok(state),
            }
        }
        Ok(ProgramState::Run(last))
    }

    fn declare(
        &mut self,
        scope: Scope,
        declarator: &VariableDeclarator,
        environment: &Environment,
    ) -> Result<(), RuntimeError> {
        let value = match declarator.initial {
            Some(ref initial) => self.evaluate(initial, environment)?,
            None => match declarator.declared_type {
                Some(DeclaredType::String) => Value::String("".into()),
                Some(DeclaredType::Number) => Value::Number(0.0),
                Some(DeclaredType::Boolean) | None => Value::Boolean(false),
            },
        };
        environment.set(&declarator.name.name, scope, value);
        Ok(())
    }

    fn interpret_variable_declaration(
        &mut self,
        decl: &VariableDecl,
        environment: &Environment,
    ) -> Result<ProgramState, RuntimeError> {
        self.declare(decl.scope, &decl.declarator, environment)?;
        Ok(ProgramState::Run(Value::None))
    }

    fn interpret_inline_variable_declaration(
        &mut self,
        decl: &InlineVariableDecl,
        environment: &Environment,
    ) -> Result<ProgramState, RuntimeError> {
        for declarator in decl.declarators.iter() {
            self.declare(decl.scope, declarator, environment)?;
        }
        Ok(ProgramState::Run(Value::None))
    }

    fn interpret_function_declaration(
        &mut self,
        decl: &FunctionDecl,
        environment: &Environment,
    ) -> Result<ProgramState, RuntimeError> {
        let name = &decl.name.name;
        if environment.contains_local(name) {
            return Err(RuntimeError {
                kind: RuntimeErrorKind::NameInUse(name.clone()),
                span: decl.name.span,
            });
        }
        let definition = FunctionDefinition {
            name: decl.name.clone(),
            parameters: decl.parameters.clone(),
            body: decl.body.clone(),
        };
        environment.declare_function(Rc::new(definition));
        Ok(ProgramState::Run(Value::None))
    }

    fn interpret_print_statement(
        &mut self,
        stmt: &PrintStatement,
        environment: &Environment,
    ) -> Result<ProgramState, RuntimeError> {
        let mut parts = Vec::with_capacity(stmt.arguments.len());
        for argument in stmt.arguments.iter() {
            parts.push(self.evaluate(argument, environment)?.to_string());
        }
        self.context.writeln(&parts.join(" "));
        Ok(ProgramState::Run(Value::None))
    }

    fn interpret_if_statement(
        &mut self,
        stmt: &IfStatement,
        environment: &Environment,
    ) -> Result<ProgramState, RuntimeError> {
        let condition = self.evaluate(&stmt.condition, environment)?;
        if expect_logical(&condition, stmt.condition.get_span())? {
            self.interpret_block(&stmt.success, environment)
        } else if let Some(ref failure) = stmt.failure {
            self.interpret_block(failure, environment)
        } else {
            Ok(ProgramState::Run(Value::None))
        }
    }

    fn interpret_do_case_statement(
        &mut self,
        stmt: &DoCaseStatement,
        environment: &Environment,
    ) -> Result<ProgramState, RuntimeError> {
        for branch in stmt.branches.iter() {
            let condition = self.evaluate(&branch.condition, environment)?;
            if expect_logical(&condition, branch.condition.get_span())? {
                return self.interpret_block(&branch.body, environment);
            }
        }
        match stmt.otherwise {
            Some(ref otherwise) => self.interpret_block(otherwise, environment),
            None => Ok(ProgramState::Run(Value::None)),
        }
    }

    fn interpret_while_statement(
        &mut self,
        stmt: &WhileStatement,
        environment: &Environment,
    ) -> Result<ProgramState, RuntimeError> {
        loop {
            let condition = self.evaluate(&stmt.condition, environment)?;
            if !expect_logical(&condition, stmt.condition.get_span())? {
                break;
            }
            match self.interpret_block(&stmt.body, environment)? {
                ProgramState::Run(_) => {}
                ProgramState::Loop(_) => {
                    tracing::trace!("LOOP: skipping to the next condition check");
                }
                ProgramState::Exit(_) => {
                    tracing::trace!("EXIT: leaving loop");
                    break;
                }
                state @ ProgramState::Return(_) => return Ok(state),
            }
        }
        Ok(ProgramState::Run(Value::None))
    }

    fn interpret_return_statement(
        &mut self,
        stmt: &ReturnStatement,
        environment: &Environment,
    ) -> Result<ProgramState, RuntimeError> {
        let value = match stmt.value {
            Some(ref value) => self.evaluate(value, environment)?,
            None => Value::None,
        };
        Ok(ProgramState::Return(value))
    }
}

// Expression evaluator
impl<C> Evaluator<C>
where
    C: SystemContext,
{
    fn evaluate_expression_node(
        &mut self,
        expr: &Expression,
        node: ExpressionNodeRef,
        environment: &Environment,
    ) -> Result<Value, RuntimeError> {
        let span = expr.get_subspan(node).expect(MSG);
        match expr.get_node(node).expect(MSG) {
            ExpressionNode::Atom(atom) => Self::evaluate_atom(atom, environment),
            ExpressionNode::Unary { operator, rhs, .. } => {
                let rhs = self.evaluate_expression_node(expr, *rhs, environment)?;
                let result = match operator {
                    UnaryOperator::Bang => rhs.logical_not(),
                    UnaryOperator::Minus => rhs.numeric_negate(),
                };
                result.map_err(|kind| RuntimeError { kind, span })
            }
            ExpressionNode::Binary { operator, lhs, rhs } => {
                let lhs = self.evaluate_expression_node(expr, *lhs, environment)?;
                let rhs = self.evaluate_expression_node(expr, *rhs, environment)?;
                Self::apply_binary_operator(*operator, &lhs, &rhs)
                    .map_err(|kind| RuntimeError { kind, span })
            }
            ExpressionNode::BinaryShortCircuit { operator, lhs, rhs } => {
                self.evaluate_short_circuit(expr, *operator, *lhs, *rhs, environment)
            }
            ExpressionNode::BinaryAssignment { operator, lhs, rhs } => {
                self.evaluate_assignment(expr, *operator, *lhs, *rhs, environment)
            }
            ExpressionNode::Call {
                callee, arguments, ..
            } => {
                let callee = self.evaluate_expression_node(expr, *callee, environment)?;
                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments.iter() {
                    values.push(self.evaluate_expression_node(expr, *argument, environment)?);
                }
                self.evaluate_call(&callee, &values, span)
            }
            ExpressionNode::Iif {
                condition,
                success,
                failure,
                ..
            } => {
                let flag = self.evaluate_expression_node(expr, *condition, environment)?;
                let condition_span = expr.get_subspan(*condition).expect(MSG);
                if expect_logical(&flag, condition_span)? {
                    self.evaluate_expression_node(expr, *success, environment)
                } else {
                    self.evaluate_expression_node(expr, *failure, environment)
                }
            }
        }
    }

    fn evaluate_atom(atom: &ExpressionAtom, environment: &Environment) -> Result<Value, RuntimeError> {
        let value = match atom.kind {
            ExpressionAtomKind::Number(v) => Value::Number(v),
            ExpressionAtomKind::Bool(v) => Value::Boolean(v),
            ExpressionAtomKind::Null => Value::Null,
            ExpressionAtomKind::StringLiteral(ref v) => Value::String(v.clone()),
            ExpressionAtomKind::Identifier(ref name) => {
                environment.get(name).ok_or_else(|| RuntimeError {
                    kind: RuntimeErrorKind::UndefinedVariable(name.clone()),
                    span: atom.span,
                })?
            }
        };
        Ok(value)
    }

    fn apply_binary_operator(
        operator: BinaryOperator,
        lhs: &Value,
        rhs: &Value,
    ) -> Result<Value, RuntimeErrorKind> {
        match operator {
            BinaryOperator::Add => lhs.add(rhs),
            BinaryOperator::Subtract => lhs.subtract(rhs),
            BinaryOperator::Multiply => lhs.multiply(rhs),
            BinaryOperator::Divide => lhs.divide(rhs),
            BinaryOperator::LessThan => lhs.less_than(rhs),
            BinaryOperator::LessThanEqual => lhs.less_than_or_equal(rhs),
            BinaryOperator::GreaterThan => lhs.greater_than(rhs),
            BinaryOperator::GreaterThanEqual => lhs.greater_than_or_equal(rhs),
            BinaryOperator::EqualEqual => lhs.is_equal(rhs),
            BinaryOperator::BangEqual => lhs.is_not_equal(rhs),
        }
    }

    fn evaluate_short_circuit(
        &mut self,
        expr: &Expression,
        operator: BinaryShortCircuitOperator,
        lhs: ExpressionNodeRef,
        rhs: ExpressionNodeRef,
        environment: &Environment,
    ) -> Result<Value, RuntimeError> {
        let logical = |value: &Value, node: ExpressionNodeRef| match value {
            Value::Boolean(flag) => Ok(*flag),
            other => Err(RuntimeError {
                kind: RuntimeErrorKind::NonLogicalOperand {
                    operator: operator.as_str(),
                    type_name: other.get_type_name(),
                },
                span: expr.get_subspan(node).expect(MSG),
            }),
        };

        let left = logical(&self.evaluate_expression_node(expr, lhs, environment)?, lhs)?;
        match (operator, left) {
            (BinaryShortCircuitOperator::And, false) => return Ok(Value::Boolean(false)),
            (BinaryShortCircuitOperator::Or, true) => return Ok(Value::Boolean(true)),
            _ => {}
        }
        let right = logical(&self.evaluate_expression_node(expr, rhs, environment)?, rhs)?;
        Ok(Value::Boolean(right))
    }

    fn evaluate_assignment(
        &mut self,
        expr: &Expression,
        operator: BinaryAssignmentOperator,
        lhs: ExpressionNodeRef,
        rhs: ExpressionNodeRef,
        environment: &Environment,
    ) -> Result<Value, RuntimeError> {
        let target = expr.get_node(lhs).expect(MSG);
        let lhs_span = expr.get_subspan(lhs).expect(MSG);
        let Some(name) = target.get_l_value() else {
            return Err(RuntimeError {
                kind: RuntimeErrorKind::InvalidAssignmentTarget,
                span: lhs_span,
            });
        };

        let Some(compound) = operator.get_compound() else {
            let value = self.evaluate_expression_node(expr, rhs, environment)?;
            match operator {
                BinaryAssignmentOperator::Bind => {
                    environment.set(name, Scope::Private, value.clone())
                }
                _ => environment.assign(name, value.clone()),
            }
            return Ok(value);
        };

        let undefined = || RuntimeError {
            kind: RuntimeErrorKind::UndefinedVariable(name.clone()),
            span: lhs_span,
        };
        let owner = environment.lookup_owner(name).ok_or_else(undefined)?;
        let rhs = self.evaluate_expression_node(expr, rhs, environment)?;
        let current = owner.get_local(name).ok_or_else(undefined)?;
        let span = expr.get_subspan(expr.get_root_ref()).expect(MSG);
        let value = match current {
            Value::Number(_) | Value::String(_) => {
                Self::apply_binary_operator(compound, &current, &rhs)
                    .map_err(|kind| RuntimeError { kind, span })?
            }
            _ => {
                return Err(RuntimeError {
                    kind: RuntimeErrorKind::UnsupportedOperator {
                        operator: operator.as_str(),
                        type_name: current.get_type_name(),
                    },
                    span,
                })
            }
        };
        owner.replace_local(name, value.clone());
        Ok(value)
    }

    fn evaluate_call(
        &mut self,
        callee: &Value,
        arguments: &[Value],
        span: Span,
    ) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(function) => self.evaluate_function(function, arguments, span),
            Value::NativeFunction(native) => {
                if arguments.len() != native.get_arity() {
                    return Err(RuntimeError {
                        kind: RuntimeErrorKind::InvalidArgument,
                        span,
                    });
                }
                native
                    .call(arguments)
                    .map_err(|kind| RuntimeError { kind, span })
            }
            other => Err(RuntimeError {
                kind: RuntimeErrorKind::NotCallable(other.get_type_name()),
                span,
            }),
        }
    }

    fn evaluate_function(
        &mut self,
        function: &Function,
        arguments: &[Value],
        span: Span,
    ) -> Result<Value, RuntimeError> {
        let definition = &function.definition;
        let name = &definition.name.name;
        let expected = definition.parameters.len();
        if expected == 0 && !arguments.is_empty() {
            return Err(RuntimeError {
                kind: RuntimeErrorKind::UnexpectedArguments(name.clone()),
                span,
            });
        }
        if arguments.len() > expected {
            return Err(RuntimeError {
                kind: RuntimeErrorKind::TooManyArguments {
                    name: name.clone(),
                    expected,
                    actual: arguments.len(),
                },
                span,
            });
        }

        tracing::debug!(function = %name, arguments = arguments.len(), "calling function");
        let environment = function.closure.new_call_scope();
        for (index, parameter) in definition.parameters.iter().enumerate() {
            let value = arguments
                .get(index)
                .cloned()
                .unwrap_or(Value::Boolean(false));
            environment.set(&parameter.name, Scope::Private, value);
        }

        let value = match self.interpret_block(&definition.body, &environment)? {
            ProgramState::Run(value) | ProgramState::Return(value) => value,
            ProgramState::Exit(span) => return Err(stray_loop_control("EXIT", span)),
            ProgramState::Loop(span) => return Err(stray_loop_control("LOOP", span)),
        };
        tracing::debug!(function = %name, "returning from function");
        Ok(value)
    }
}
