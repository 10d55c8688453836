use super::error::{RuntimeError, RuntimeErrorKind};
use super::Value;
use crate::lexer::LineBreaks;
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::path::Path;

const ARIADNE_MSG: &str = "Ariadne produces valid utf-8 strings";
const ARIADNE_WRITE_MSG: &str = "Write into buffer should not fail.";

pub trait ValueFormatter {
    fn format(&self, value: &Value) -> String;
    fn format_error(&self, error: &RuntimeError) -> String;
}

pub struct DebugFormatter;

impl ValueFormatter for DebugFormatter {
    fn format(&self, value: &Value) -> String {
        format!("{value:?}")
    }

    fn format_error(&self, error: &RuntimeError) -> String {
        format!("{error:?}")
    }
}

/// Values as the language prints them and errors as `(line) message`.
pub struct BasicFormatter {
    line_breaks: LineBreaks,
}

impl BasicFormatter {
    pub fn new(text: &str) -> Self {
        let line_breaks = LineBreaks::new(text);
        Self { line_breaks }
    }
}

impl ValueFormatter for BasicFormatter {
    fn format(&self, value: &Value) -> String {
        format!("{value}")
    }

    fn format_error(&self, error: &RuntimeError) -> String {
        let line = self.line_breaks.get_line_from_span(error.span);
        format!("({line}) {}", error.kind)
    }
}

pub struct PrettyFormatter<'src> {
    text: &'src str,
    path: &'src Path,
}

impl<'src> PrettyFormatter<'src> {
    pub fn new(text: &'src str, path: &'src Path) -> Self {
        Self { text, path }
    }

    fn describe(kind: &RuntimeErrorKind) -> (&'static str, String) {
        match kind {
            RuntimeErrorKind::UndefinedVariable(name) => (
                "Attempted to read a variable that is not visible here",
                format!("{} is not declared or is LOCAL to a caller", name.fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::InvalidArgument => (
                "Invalid operand or argument",
                "This value has the wrong type or count".into(),
            ),
            RuntimeErrorKind::TypeMismatch { lhs, operator, rhs } => (
                "Expected both operands to have the same type",
                format!(
                    "{} and {} can not be combined with {operator}",
                    lhs.fg(Color::BrightCyan),
                    rhs.fg(Color::BrightRed),
                ),
            ),
            RuntimeErrorKind::UnsupportedOperator {
                operator,
                type_name,
            } => (
                "Operator is not defined for this type",
                format!("{operator} does not apply to {}", type_name.fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::DivisionByZero => {
                ("Division by zero", "The divisor evaluates to zero".into())
            }
            RuntimeErrorKind::TooManyArguments {
                name,
                expected,
                actual,
            } => (
                "Attempted to call a function with too many arguments",
                format!(
                    "{name} has {} parameters but got {} arguments instead.",
                    expected.fg(Color::BrightCyan),
                    actual.fg(Color::BrightRed),
                ),
            ),
            RuntimeErrorKind::UnexpectedArguments(name) => (
                "Attempted to pass arguments to a function without parameters",
                format!("{name} takes no arguments"),
            ),
            RuntimeErrorKind::NameInUse(name) => (
                "Attempted to redeclare a function",
                format!("{} is already declared here", name.fg(Color::BrightYellow)),
            ),
            RuntimeErrorKind::InvalidAssignmentTarget => (
                "Invalid assignment target",
                "Only variables can be assigned to".into(),
            ),
            RuntimeErrorKind::NonLogicalCondition(type_name) => (
                "Condition must be logical",
                format!("This condition is {}", type_name.fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::NonLogicalOperand {
                operator,
                type_name,
            } => (
                "Operands of logical operators must be logical",
                format!("Operand of {operator} is {}", type_name.fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::NotCallable(type_name) => (
                "Attempted to call a value that is not callable",
                format!("{} is not callable.", type_name.fg(Color::BrightRed)),
            ),
            RuntimeErrorKind::StrayLoopControl(keyword) => (
                "Loop control outside of a loop",
                format!("{keyword} must appear inside DO WHILE"),
            ),
        }
    }
}

impl<'src> ValueFormatter for PrettyFormatter<'src> {
    fn format(&self, value: &Value) -> String {
        format!("{value}")
    }

    fn format_error(&self, error: &RuntimeError) -> String {
        let path = &self.path.to_string_lossy();
        let span = error.span.range();
        let (message, label) = Self::describe(&error.kind);
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
