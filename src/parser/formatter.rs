use super::{
    expression::{Expression, ExpressionAtom, ExpressionAtomKind, ExpressionNode, ExpressionNodeRef},
    statement::{
        Block, DoCaseStatement, FunctionDecl, IfStatement, InlineVariableDecl, Program, Statement,
        VariableDeclarator, WhileStatement,
    },
    ParserError, ParserErrorKind,
};
use ariadne::{Color, Label, Report, ReportKind, Source};
use std::{fmt::Write, path::Path};

const WRITE_FMT_MSG: &str = "Encountered an error while attempting to write format string to buffer.";
const ARIADNE_MSG: &str = "Ariadne produces valid utf-8 strings";
const ARIADNE_WRITE_MSG: &str = "Write into buffer should not fail.";

/// Turns a parsed program back into text.
pub trait ProgramFormatter {
    fn format(&self, program: &Program) -> String;
    fn format_expression(&self, expression: &Expression) -> String;
}

pub struct DebugProgramFormatter;

impl ProgramFormatter for DebugProgramFormatter {
    fn format(&self, program: &Program) -> String {
        let mut buffer = String::new();
        for statement in program.iter() {
            writeln!(buffer, "{statement:?}").expect(WRITE_FMT_MSG);
        }
        buffer
    }

    fn format_expression(&self, expression: &Expression) -> String {
        format!("{expression:?}")
    }
}

/// One S-expression per top level statement. Two programs with the same output have the same
/// structure.
pub struct SExpressionFormatter;

impl SExpressionFormatter {
    fn format_atom(atom: &ExpressionAtom) -> String {
        match atom.kind {
            ExpressionAtomKind::Number(v) => format!("{v}"),
            ExpressionAtomKind::Bool(true) => ".T.".into(),
            ExpressionAtomKind::Bool(false) => ".F.".into(),
            ExpressionAtomKind::Null => "null".into(),
            ExpressionAtomKind::Identifier(ref name) => format!("{name}"),
            ExpressionAtomKind::StringLiteral(ref v) => format!("{v:?}"),
        }
    }

    fn format_node(tree: &Expression, node: ExpressionNodeRef) -> String {
        let current_node = tree
            .get_node(node)
            .expect("Caller should make sure the ref is valid.");

        match current_node {
            ExpressionNode::Atom(atom) => Self::format_atom(atom),
            ExpressionNode::Unary { operator, rhs, .. } => {
                format!("({} {})", operator.as_str(), Self::format_node(tree, *rhs))
            }
            ExpressionNode::Binary { operator, lhs, rhs } => format!(
                "({} {} {})",
                operator.as_str(),
                Self::format_node(tree, *lhs),
                Self::format_node(tree, *rhs),
            ),
            ExpressionNode::BinaryAssignment { operator, lhs, rhs } => format!(
                "({} {} {})",
                operator.as_str(),
                Self::format_node(tree, *lhs),
                Self::format_node(tree, *rhs),
            ),
            ExpressionNode::BinaryShortCircuit { operator, lhs, rhs } => format!(
                "({} {} {})",
                operator.as_str(),
                Self::format_node(tree, *lhs),
                Self::format_node(tree, *rhs),
            ),
            ExpressionNode::Call {
                callee, arguments, ..
            } => {
                let mut buffer = format!("(call {}", Self::format_node(tree, *callee));
                for argument in arguments.iter() {
                    buffer.push(' ');
                    buffer.push_str(&Self::format_node(tree, *argument));
                }
                buffer.push(')');
                buffer
            }
            ExpressionNode::Iif {
                condition,
                success,
                failure,
                ..
            } => format!(
                "(iif {} {} {})",
                Self::format_node(tree, *condition),
                Self::format_node(tree, *success),
                Self::format_node(tree, *failure),
            ),
        }
    }

    fn format_declarator(declarator: &VariableDeclarator) -> String {
        let mut buffer = format!("{}", declarator.name);
        if let Some(declared_type) = declarator.declared_type {
            write!(buffer, " :{}", declared_type.as_str().to_lowercase()).expect(WRITE_FMT_MSG);
        }
        if let Some(ref initial) = declarator.initial {
            write!(buffer, " {}", Self::format_expression_inner(initial)).expect(WRITE_FMT_MSG);
        }
        buffer
    }

    fn format_expression_inner(expression: &Expression) -> String {
        Self::format_node(expression, expression.get_root_ref())
    }

    fn format_block(block: &Block) -> String {
        let mut buffer = String::from("(block");
        for statement in block.iter() {
            buffer.push(' ');
            buffer.push_str(&Self::format_statement(statement));
        }
        buffer.push(')');
        buffer
    }

    pub fn format_statement(statement: &Statement) -> String {
        match statement {
            Statement::VariableDecl(decl) => format!(
                "({} {})",
                decl.scope.as_str().to_lowercase(),
                Self::format_declarator(&decl.declarator)
            ),
            Statement::InlineVariableDecl(InlineVariableDecl {
                scope, declarators, ..
            }) => {
                let mut buffer = format!("({}-inline", scope.as_str().to_lowercase());
                for declarator in declarators.iter() {
                    write!(buffer, " ({})", Self::format_declarator(declarator))
                        .expect(WRITE_FMT_MSG);
                }
                buffer.push(')');
                buffer
            }
            Statement::FunctionDecl(FunctionDecl {
                name,
                parameters,
                body,
            }) => {
                let parameters: Vec<String> = parameters.iter().map(|p| p.to_string()).collect();
                format!(
                    "(function {name} ({}) {})",
                    parameters.join(" "),
                    Self::format_block(body)
                )
            }
            Statement::Expression(statement) => Self::format_expression_inner(&statement.expr),
            Statement::Print(print) => {
                let mut buffer = String::from("(print");
                for argument in print.arguments.iter() {
                    buffer.push(' ');
                    buffer.push_str(&Self::format_expression_inner(argument));
                }
                buffer.push(')');
                buffer
            }
            Statement::If(IfStatement {
                condition,
                success,
                failure,
            }) => match failure {
                Some(failure) => format!(
                    "(if {} {} {})",
                    Self::format_expression_inner(condition),
                    Self::format_block(success),
                    Self::format_block(failure)
                ),
                None => format!(
                    "(if {} {})",
                    Self::format_expression_inner(condition),
                    Self::format_block(success)
                ),
            },
            Statement::DoCase(DoCaseStatement {
                branches,
                otherwise,
            }) => {
                let mut buffer = String::from("(do-case");
                for branch in branches.iter() {
                    write!(
                        buffer,
                        " (case {} {})",
                        Self::format_expression_inner(&branch.condition),
                        Self::format_block(&branch.body)
                    )
                    .expect(WRITE_FMT_MSG);
                }
                if let Some(otherwise) = otherwise {
                    write!(buffer, " (otherwise {})", Self::format_block(otherwise))
                        .expect(WRITE_FMT_MSG);
                }
                buffer.push(')');
                buffer
            }
            Statement::While(WhileStatement { condition, body }) => format!(
                "(while {} {})",
                Self::format_expression_inner(condition),
                Self::format_block(body)
            ),
            Statement::Return(statement) => match statement.value {
                Some(ref value) => format!("(return {})", Self::format_expression_inner(value)),
                None => "(return)".into(),
            },
            Statement::Exit(_) => "(exit)".into(),
            Statement::Loop(_) => "(loop)".into(),
        }
    }
}

impl ProgramFormatter for SExpressionFormatter {
    fn format(&self, program: &Program) -> String {
        let mut buffer = String::new();
        for statement in program.iter() {
            buffer.push_str(&Self::format_statement(statement));
            buffer.push('\n');
        }
        buffer
    }

    fn format_expression(&self, expression: &Expression) -> String {
        Self::format_expression_inner(expression)
    }
}

/// Emits source text that parses back into the same program. Every operand that is itself an
/// operator expression is wrapped in parentheses.
pub struct SourceFormatter;

const INDENT: &str = "    ";

impl SourceFormatter {
    fn format_atom(atom: &ExpressionAtom) -> String {
        match atom.kind {
            ExpressionAtomKind::Number(v) => format!("{v}"),
            ExpressionAtomKind::Bool(true) => ".T.".into(),
            ExpressionAtomKind::Bool(false) => ".F.".into(),
            ExpressionAtomKind::Null => "NULL".into(),
            ExpressionAtomKind::Identifier(ref name) => format!("{name}"),
            ExpressionAtomKind::StringLiteral(ref v) => {
                let quote = ['\'', '"', '`']
                    .into_iter()
                    .find(|q| !v.contains(*q))
                    .unwrap_or('\'');
                format!("{quote}{v}{quote}")
            }
        }
    }

    fn format_node(tree: &Expression, node: ExpressionNodeRef, nested: bool) -> String {
        let current_node = tree
            .get_node(node)
            .expect("Caller should make sure the ref is valid.");

        let wrap = |text: String| {
            if nested {
                format!("({text})")
            } else {
                text
            }
        };

        match current_node {
            ExpressionNode::Atom(atom) => Self::format_atom(atom),
            ExpressionNode::Unary { operator, rhs, .. } => wrap(format!(
                "{}{}",
                operator.as_str(),
                Self::format_node(tree, *rhs, true)
            )),
            ExpressionNode::Binary { operator, lhs, rhs } => wrap(format!(
                "{} {} {}",
                Self::format_node(tree, *lhs, true),
                operator.as_str(),
                Self::format_node(tree, *rhs, true)
            )),
            ExpressionNode::BinaryAssignment { operator, lhs, rhs } => wrap(format!(
                "{} {} {}",
                Self::format_node(tree, *lhs, true),
                operator.as_str(),
                Self::format_node(tree, *rhs, true)
            )),
            ExpressionNode::BinaryShortCircuit { operator, lhs, rhs } => wrap(format!(
                "{} {} {}",
                Self::format_node(tree, *lhs, true),
                operator.as_str(),
                Self::format_node(tree, *rhs, true)
            )),
            ExpressionNode::Call {
                callee, arguments, ..
            } => {
                let arguments: Vec<String> = arguments
                    .iter()
                    .map(|argument| Self::format_node(tree, *argument, false))
                    .collect();
                format!(
                    "{}({})",
                    Self::format_node(tree, *callee, true),
                    arguments.join(", ")
                )
            }
            ExpressionNode::Iif {
                condition,
                success,
                failure,
                ..
            } => format!(
                "IIF({}, {}, {})",
                Self::format_node(tree, *condition, false),
                Self::format_node(tree, *success, false),
                Self::format_node(tree, *failure, false)
            ),
        }
    }

    fn format_expression_inner(expression: &Expression) -> String {
        Self::format_node(expression, expression.get_root_ref(), false)
    }

    fn format_declarator(declarator: &VariableDeclarator) -> String {
        let mut buffer = format!("{}", declarator.name);
        if let Some(declared_type) = declarator.declared_type {
            write!(buffer, " AS {}", declared_type.as_str()).expect(WRITE_FMT_MSG);
        }
        if let Some(ref initial) = declarator.initial {
            write!(buffer, " = {}", Self::format_expression_inner(initial)).expect(WRITE_FMT_MSG);
        }
        buffer
    }

    fn format_block(buffer: &mut String, block: &Block, depth: usize) {
        for statement in block.iter() {
            Self::format_statement(buffer, statement, depth);
        }
    }

    fn format_statement(buffer: &mut String, statement: &Statement, depth: usize) {
        let indent = INDENT.repeat(depth);
        match statement {
            Statement::VariableDecl(decl) => {
                writeln!(
                    buffer,
                    "{indent}{} {}",
                    decl.scope.as_str(),
                    Self::format_declarator(&decl.declarator)
                )
                .expect(WRITE_FMT_MSG);
            }
            Statement::InlineVariableDecl(InlineVariableDecl {
                scope,
                declarators,
                grouped,
            }) => {
                let declarators: Vec<String> =
                    declarators.iter().map(Self::format_declarator).collect();
                let declarators = declarators.join(", ");
                let scope = scope.as_str();
                let written = if *grouped {
                    writeln!(buffer, "{indent}{scope} ({declarators})")
                } else {
                    writeln!(buffer, "{indent}{scope} {declarators}")
                };
                written.expect(WRITE_FMT_MSG);
            }
            Statement::FunctionDecl(FunctionDecl {
                name,
                parameters,
                body,
            }) => {
                let parameters: Vec<String> = parameters.iter().map(|p| p.to_string()).collect();
                writeln!(buffer, "{indent}FUNCTION {name}({})", parameters.join(", "))
                    .expect(WRITE_FMT_MSG);
                Self::format_block(buffer, body, depth + 1);
                writeln!(buffer, "{indent}ENDFUNC").expect(WRITE_FMT_MSG);
            }
            Statement::Expression(statement) => {
                writeln!(
                    buffer,
                    "{indent}{}",
                    Self::format_expression_inner(&statement.expr)
                )
                .expect(WRITE_FMT_MSG);
            }
            Statement::Print(print) => {
                let arguments: Vec<String> = print
                    .arguments
                    .iter()
                    .map(Self::format_expression_inner)
                    .collect();
                let written = if arguments.is_empty() {
                    writeln!(buffer, "{indent}?")
                } else {
                    writeln!(buffer, "{indent}? {}", arguments.join(", "))
                };
                written.expect(WRITE_FMT_MSG);
            }
            Statement::If(IfStatement {
                condition,
                success,
                failure,
            }) => {
                writeln!(
                    buffer,
                    "{indent}IF {} THEN",
                    Self::format_expression_inner(condition)
                )
                .expect(WRITE_FMT_MSG);
                Self::format_block(buffer, success, depth + 1);
                if let Some(failure) = failure {
                    writeln!(buffer, "{indent}ELSE").expect(WRITE_FMT_MSG);
                    Self::format_block(buffer, failure, depth + 1);
                }
                writeln!(buffer, "{indent}ENDIF").expect(WRITE_FMT_MSG);
            }
            Statement::DoCase(DoCaseStatement {
                branches,
                otherwise,
            }) => {
                writeln!(buffer, "{indent}DO CASE").expect(WRITE_FMT_MSG);
                for branch in branches.iter() {
                    writeln!(
                        buffer,
                        "{indent}{INDENT}CASE {}",
                        Self::format_expression_inner(&branch.condition)
                    )
                    .expect(WRITE_FMT_MSG);
                    Self::format_block(buffer, &branch.body, depth + 2);
                }
                if let Some(otherwise) = otherwise {
                    writeln!(buffer, "{indent}{INDENT}OTHERWISE").expect(WRITE_FMT_MSG);
                    Self::format_block(buffer, otherwise, depth + 2);
                }
                writeln!(buffer, "{indent}ENDCASE").expect(WRITE_FMT_MSG);
            }
            Statement::While(WhileStatement { condition, body }) => {
                writeln!(
                    buffer,
                    "{indent}DO WHILE {}",
                    Self::format_expression_inner(condition)
                )
                .expect(WRITE_FMT_MSG);
                Self::format_block(buffer, body, depth + 1);
                writeln!(buffer, "{indent}ENDDO").expect(WRITE_FMT_MSG);
            }
            Statement::Return(statement) => match statement.value {
                Some(ref value) => writeln!(
                    buffer,
                    "{indent}RETURN {}",
                    Self::format_expression_inner(value)
                ),
                None => writeln!(buffer, "{indent}RETURN"),
            }
            .expect(WRITE_FMT_MSG),
            Statement::Exit(_) => writeln!(buffer, "{indent}EXIT").expect(WRITE_FMT_MSG),
            Statement::Loop(_) => writeln!(buffer, "{indent}LOOP").expect(WRITE_FMT_MSG),
        }
    }
}

impl ProgramFormatter for SourceFormatter {
    fn format(&self, program: &Program) -> String {
        let mut buffer = String::new();
        for statement in program.iter() {
            Self::format_statement(&mut buffer, statement, 0);
        }
        buffer
    }

    fn format_expression(&self, expression: &Expression) -> String {
        Self::format_expression_inner(expression)
    }
}

pub trait ParserFormatter {
    fn format_error(&self, error: &ParserError) -> String;
}

pub struct DebugParserFormatter;

impl ParserFormatter for DebugParserFormatter {
    fn format_error(&self, error: &ParserError) -> String {
        format!("{error:?}")
    }
}

/// `Syntax error at (line:col) <message>.`
pub struct BasicParserFormatter;

impl ParserFormatter for BasicParserFormatter {
    fn format_error(&self, error: &ParserError) -> String {
        format!("{error}")
    }
}

pub struct PrettyParserFormatter<'src> {
    text: &'src str,
    path: &'src Path,
}

impl<'src> PrettyParserFormatter<'src> {
    pub fn new(text: &'src str, path: &'src Path) -> Self {
        Self { text, path }
    }
}

impl<'src> ParserFormatter for PrettyParserFormatter<'src> {
    fn format_error(&self, error: &ParserError) -> String {
        let path = &self.path.to_string_lossy();
        let span = error.span.range();
        let (message, label) = match &error.kind {
            ParserErrorKind::UnexpectedToken { actual, expected } => (
                "Expected a different token",
                format!("Expected {expected} but got {actual}"),
            ),
            ParserErrorKind::NonExpression(kind) => (
                "Expected a valid expression operator or atom token",
                format!("Not an expression token {kind}"),
            ),
            ParserErrorKind::NonIdentifier(kind) => {
                ("Expected a name", format!("{kind} is not a name"))
            }
            ParserErrorKind::NonCaseBranch(kind) => (
                "Expected CASE, OTHERWISE or ENDCASE",
                format!("{kind} can not appear directly inside DO CASE"),
            ),
            ParserErrorKind::UnknownType(name) => (
                "Unknown declared type",
                format!("{name} is not one of STRING, NUMBER or BOOLEAN"),
            ),
            ParserErrorKind::InvalidNumber(lexeme) => {
                ("Invalid numeric literal", format!("{lexeme} is not a number"))
            }
        };
        let mut output = std::io::Cursor::new(Vec::new());
        Report::build(ReportKind::Error, (path, span.clone()))
            .with_code(error.code())
            .with_message(message)
            .with_label(
                Label::new((path, span))
                    .with_message(label)
                    .with_color(Color::BrightRed),
            )
            .finish()
            .write((path, Source::from(self.text)), &mut output)
            .expect(ARIADNE_WRITE_MSG);
        String::from_utf8(output.into_inner()).expect(ARIADNE_MSG)
    }
}
