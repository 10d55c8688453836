/// Binding strength of operators, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Assignment,
    LogicalOr,
    LogicalAnd,
    Equality,
    Comparison,
    Additive,
    Multiplicative,
    Unary,
    Call,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    Bang,
    Minus,
}

impl UnaryOperator {
    pub fn get_precedence(&self) -> Precedence {
        Precedence::Unary
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bang => "!",
            Self::Minus => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    Multiply,
    Divide,
    Add,
    Subtract,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    EqualEqual,
    BangEqual,
}

impl BinaryOperator {
    pub fn get_precedence(&self) -> Precedence {
        match self {
            Self::Multiply | Self::Divide => Precedence::Multiplicative,
            Self::Add | Self::Subtract => Precedence::Additive,
            Self::LessThan | Self::LessThanEqual | Self::GreaterThan | Self::GreaterThanEqual => {
                Precedence::Comparison
            }
            Self::EqualEqual | Self::BangEqual => Precedence::Equality,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanEqual => ">=",
            Self::EqualEqual => "==",
            Self::BangEqual => "!=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryShortCircuitOperator {
    And,
    Or,
}

impl BinaryShortCircuitOperator {
    pub fn get_precedence(&self) -> Precedence {
        match self {
            Self::And => Precedence::LogicalAnd,
            Self::Or => Precedence::LogicalOr,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryAssignmentOperator {
    /// `=`, updates the nearest visible binding or creates a private one.
    Assign,
    /// `:=`, always binds a private in the current environment.
    Bind,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
}

impl BinaryAssignmentOperator {
    pub fn get_precedence(&self) -> Precedence {
        Precedence::Assignment
    }

    /// The arithmetic operator a compound assignment applies in place.
    pub fn get_compound(&self) -> Option<BinaryOperator> {
        match self {
            Self::Assign | Self::Bind => None,
            Self::AddAssign => Some(BinaryOperator::Add),
            Self::SubtractAssign => Some(BinaryOperator::Subtract),
            Self::MultiplyAssign => Some(BinaryOperator::Multiply),
            Self::DivideAssign => Some(BinaryOperator::Divide),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Bind => ":=",
            Self::AddAssign => "+=",
            Self::SubtractAssign => "-=",
            Self::MultiplyAssign => "*=",
            Self::DivideAssign => "/=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostfixOperator {
    Call,
}

impl PostfixOperator {
    pub fn get_precedence(&self) -> Precedence {
        match self {
            Self::Call => Precedence::Call,
        }
    }
}
