pub mod error;
pub mod formatter;

use crate::{interpreter::Environment, parser::statement::Block, string::Ident};
use compact_str::{CompactString, CompactStringExt};
use error::RuntimeErrorKind;
use std::{fmt, rc::Rc};

pub trait NativeFunction: fmt::Debug {
    fn get_name(&self) -> &'static str;
    fn get_arity(&self) -> usize;
    /// Called with exactly `get_arity()` arguments.
    fn call(&self, arguments: &[Value]) -> Result<Value, RuntimeErrorKind>;
}

/// A declared function before it is tied to an environment.
#[derive(Debug)]
pub struct FunctionDefinition {
    pub name: Ident,
    pub parameters: Vec<Ident>,
    pub body: Rc<Block>,
}

/// A user function together with the environment it was declared in.
pub struct Function {
    pub definition: Rc<FunctionDefinition>,
    pub closure: Environment,
}

impl Function {
    pub fn get_name(&self) -> &Ident {
        &self.definition.name
    }
}

// The closure usually contains the function itself, so it is left out.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.definition.name.name)
            .field("parameters", &self.definition.parameters)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    String(CompactString),
    Boolean(bool),
    Function(Rc<Function>),
    NativeFunction(Rc<dyn NativeFunction>),
    /// The `NULL` literal.
    Null,
    /// Result of a statement that produces nothing.
    None,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // `-0` prints as `0`
            Self::Number(v) if *v == 0.0 => write!(f, "0"),
            Self::Number(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::Boolean(true) => write!(f, ".T."),
            Self::Boolean(false) => write!(f, ".F."),
            Self::Function(function) => write!(f, "<function {}>", function.get_name()),
            Self::NativeFunction(function) => write!(f, "<function {}>", function.get_name()),
            Self::Null => write!(f, ".NULL."),
            Self::None => Ok(()),
        }
    }
}

impl Value {
    pub fn get_type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "numeric",
            Self::String(_) => "character",
            Self::Boolean(_) => "logical",
            Self::Function(_) | Self::NativeFunction(_) => "function",
            Self::Null => "null",
            Self::None => "none",
        }
    }

    /// The one letter code `TYPE()` reports.
    pub fn get_type_code(&self) -> &'static str {
        match self {
            Self::Number(_) => "N",
            Self::String(_) => "C",
            Self::Boolean(_) => "L",
            Self::Null => "X",
            _ => "U",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

// Unary operators
impl Value {
    pub fn logical_not(&self) -> Result<Value, RuntimeErrorKind> {
        match self {
            Value::Boolean(v) => Ok(Value::Boolean(!v)),
            _ => Err(RuntimeErrorKind::InvalidArgument),
        }
    }

    pub fn numeric_negate(&self) -> Result<Value, RuntimeErrorKind> {
        match self {
            Value::Number(v) => Ok(Value::Number(-v)),
            _ => Err(RuntimeErrorKind::InvalidArgument),
        }
    }
}

// Binary operators. Both operands must share a type.
impl Value {
    fn mismatch(&self, operator: &'static str, other: &Value) -> RuntimeErrorKind {
        if std::mem::discriminant(self) == std::mem::discriminant(other) {
            RuntimeErrorKind::UnsupportedOperator {
                operator,
                type_name: self.get_type_name(),
            }
        } else {
            RuntimeErrorKind::TypeMismatch {
                lhs: self.get_type_name(),
                operator,
                rhs: other.get_type_name(),
            }
        }
    }

    pub fn add(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Number(lhs + rhs)),
            (Value::String(lhs), Value::String(rhs)) => {
                Ok(Value::String([lhs.as_str(), rhs.as_str()].concat_compact()))
            }
            (lhs, rhs) => Err(lhs.mismatch("+", rhs)),
        }
    }

    /// For strings the trailing spaces of the left operand are dropped before concatenating.
    pub fn subtract(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Number(lhs - rhs)),
            (Value::String(lhs), Value::String(rhs)) => {
                Ok(Value::String([lhs.trim_end_matches(' '), rhs.as_str()].concat_compact()))
            }
            (lhs, rhs) => Err(lhs.mismatch("-", rhs)),
        }
    }

    pub fn multiply(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Number(lhs * rhs)),
            (lhs, rhs) => Err(lhs.mismatch("*", rhs)),
        }
    }

    pub fn divide(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        match (self, other) {
            (Value::Number(_), Value::Number(rhs)) if *rhs == 0.0 => {
                Err(RuntimeErrorKind::DivisionByZero)
            }
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Number(lhs / rhs)),
            (lhs, rhs) => Err(lhs.mismatch("/", rhs)),
        }
    }

    // Comparison
    pub fn less_than(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Boolean(lhs < rhs)),
            (lhs, rhs) => Err(lhs.mismatch("<", rhs)),
        }
    }

    pub fn less_than_or_equal(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Boolean(lhs <= rhs)),
            (lhs, rhs) => Err(lhs.mismatch("<=", rhs)),
        }
    }

    pub fn greater_than(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Boolean(lhs > rhs)),
            (lhs, rhs) => Err(lhs.mismatch(">", rhs)),
        }
    }

    pub fn greater_than_or_equal(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Boolean(lhs >= rhs)),
            (lhs, rhs) => Err(lhs.mismatch(">=", rhs)),
        }
    }

    // Equality
    pub fn is_equal(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Boolean(lhs == rhs)),
            (Value::String(lhs), Value::String(rhs)) => Ok(Value::Boolean(lhs == rhs)),
            (Value::Boolean(lhs), Value::Boolean(rhs)) => Ok(Value::Boolean(lhs == rhs)),
            (lhs, rhs) => Err(lhs.mismatch("==", rhs)),
        }
    }

    pub fn is_not_equal(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Boolean(lhs != rhs)),
            (Value::String(lhs), Value::String(rhs)) => Ok(Value::Boolean(lhs != rhs)),
            (Value::Boolean(lhs), Value::Boolean(rhs)) => Ok(Value::Boolean(lhs != rhs)),
            (lhs, rhs) => Err(lhs.mismatch("!=", rhs)),
        }
    }
}
