use super::{
    token::{Token, TokenKind},
    LineBreaks,
};
use crate::lexer::{Lexer, LexicalError, LexicalErrorKind};
use ariadne::{Color, Label, Report, ReportKind, Source};
use std::path::Path;

const ARIADNE_MSG: &str = "Ariadne produces valid utf-8 strings";
const ARIADNE_WRITE_MSG: &str = "Write into buffer should not fail.";

/// Interface for creating new token formatters.
pub trait TokenFormatter {
    /// Formats a token into a string.
    fn format(&self, token: &Token) -> String;
    /// Formats a lexer error into a string.
    fn format_lexical_error(&self, error: &LexicalError) -> String;
}

pub trait ToFormatter<F>
where
    F: TokenFormatter,
{
    fn create_formatter(&self) -> F;
}

/// `KIND lexeme literal`, where the literal is the parsed value or `null`.
fn describe(token: &Token) -> String {
    let kind = token.kind;
    match kind {
        TokenKind::Newline | TokenKind::Eof => format!("{kind}  null"),
        TokenKind::NumericLiteral => match token.lexeme.parse::<f64>() {
            Ok(value) => format!("{kind} {} {value:?}", token.lexeme),
            Err(_) => format!("{kind} {} null", token.lexeme),
        },
        TokenKind::StringLiteral => {
            let lexeme = &token.lexeme;
            let value = lexeme.get(1..lexeme.len() - 1).unwrap_or_default();
            format!("{kind} {lexeme} {value}")
        }
        TokenKind::True => format!("{kind} {} true", token.lexeme),
        TokenKind::False => format!("{kind} {} false", token.lexeme),
        _ => format!("{kind} {} null", token.lexeme),
    }
}

pub struct BasicFormatter;

impl<'src> ToFormatter<BasicFormatter> for Lexer<'src> {
    fn create_formatter(&self) -> BasicFormatter {
        BasicFormatter
    }
}

impl TokenFormatter for BasicFormatter {
    fn format(&self, token: &Token) -> String {
        describe(token)
    }

    fn format_lexical_error(&self, error: &LexicalError) -> String {
        format!("[line {}] Error: {}", error.line, error.kind)
    }
}

pub struct DebugFormatter;

impl<'src> ToFormatter<DebugFormatter> for Lexer<'src> {
    fn create_formatter(&self) -> DebugFormatter {
        DebugFormatter {}
    }
}

impl TokenFormatter for DebugFormatter {
    fn format(&self, token: &Token) -> String {
        format!("{token:?}")
    }

    fn format_lexical_error(&self, error: &LexicalError) -> String {
        format!("{error:?}")
    }
}

/// Prefixes every token with its `(line:col)` position.
pub struct LineFormatter;

impl<'src> ToFormatter<LineFormatter> for Lexer<'src> {
    fn create_formatter(&self) -> LineFormatter {
        LineFormatter
    }
}

impl TokenFormatter for LineFormatter {
    fn format(&self, token: &Token) -> String {
        format!("({}:{}) {}", token.line, token.col, describe(token))
    }

    fn format_lexical_error(&self, error: &LexicalError) -> String {
        let kind = match error.kind {
            LexicalErrorKind::Unrecognized(c) => format!("UNEXPECTED_CHAR {c}"),
            LexicalErrorKind::UnclosedString => "UNTERMINATED_STRING null".into(),
            LexicalErrorKind::UnclosedComment => "UNTERMINATED_COMMENT null".into(),
        };
        format!("({}:{}) ERROR {kind}", error.line, error.col)
    }
}

pub struct PrettyFormatter<'src> {
    text: &'src str,
    path: &'src Path,
    line_breaks: LineBreaks,
}

impl<'src> PrettyFormatter<'src> {
    pub fn new(text: &'src str, path: &'src Path) -> Self {
        Self {
            text,
            path,
            line_breaks: LineBreaks::new(text),
        }
    }
}

impl<'src> TokenFormatter for PrettyFormatter<'src> {
    fn format(&self, token: &Token) -> String {
        let line = self.line_breaks.get_line_from_span(token.span);
        format!("({line}) {}", describe(token))
    }

    fn format_lexical_error(&self, error: &LexicalError) -> String {
        let path = &self.path.to_string_lossy();
        let span = error.span.range();
        let label = match error.kind {
            LexicalErrorKind::Unrecognized(c) => format!("{c:?} is not part of the language"),
            LexicalErrorKind::UnclosedString => "This string is never closed".into(),
            LexicalErrorKind::UnclosedComment => "This comment is never closed".into(),
        };
        let mut output = std::io::Cursor::new(Vec::new());
        Report::build(ReportKind::Error, (path, span.clone()))
            .with_message(format!("{error}"))
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
