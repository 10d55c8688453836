use crate::value::{error::RuntimeErrorKind, NativeFunction, Value};

/// `LEN(s)`: number of characters in a string.
#[derive(Debug)]
pub struct NativeLen;

impl NativeFunction for NativeLen {
    fn get_name(&self) -> &'static str {
        "len"
    }

    fn get_arity(&self) -> usize {
        1
    }

    fn call(&self, arguments: &[Value]) -> Result<Value, RuntimeErrorKind> {
        match arguments {
            [Value::String(text)] => Ok(Value::Number(text.chars().count() as f64)),
            _ => Err(RuntimeErrorKind::InvalidArgument),
        }
    }
}

/// `TYPE(x)`: one letter naming the type of `x`.
#[derive(Debug)]
pub struct NativeType;

impl NativeFunction for NativeType {
    fn get_name(&self) -> &'static str {
        "type"
    }

    fn get_arity(&self) -> usize {
        1
    }

    fn call(&self, arguments: &[Value]) -> Result<Value, RuntimeErrorKind> {
        match arguments {
            [value] => Ok(Value::String(value.get_type_code().into())),
            _ => Err(RuntimeErrorKind::InvalidArgument),
        }
    }
}
