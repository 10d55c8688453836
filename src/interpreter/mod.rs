pub mod context;
mod environment;
mod native;
mod tree;

use crate::{lexer::Span, value::Value};
pub use environment::{Binding, Environment, WeakEnvironment};
pub use tree::Evaluator;

/// Outcome of running a statement. Runtime errors travel separately as `Err`.
#[derive(Debug, Clone)]
pub enum ProgramState {
    /// Keep going. Carries the value of the statement.
    Run(Value),
    Return(Value),
    Exit(Span),
    Loop(Span),
}

pub trait SystemContext {
    fn writeln(&mut self, text: &str);
}
