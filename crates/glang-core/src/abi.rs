//! The calling ABI shared by generated code and the dispatch runtime.
//!
//! Separately compiled units interoperate only if they agree on these
//! constants, so they are fixed rather than tunable.

use std::fmt;

/// Largest positional argument count (receiver included) served by a
/// fixed-arity invoke entry point. Larger calls pack their arguments into an
/// array and use the array-collecting entry point.
pub const MAX_FIXED_ARITY: usize = 16;

/// Largest argument count a call expression may carry.
pub const MAX_CALL_ARGS: usize = 255;

/// Upper bound of the argument window of a variadic candidate.
pub const VARIADIC_MAX: usize = MAX_CALL_ARGS;

/// Name of the procedure holding a unit's top-level statements.
pub const ENTRY_PROCEDURE: &str = "main";

/// Binary operators the code generator lowers to a method-style call on the
/// left operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equals,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
}

impl BinaryOperator {
    /// The member name the operator dispatches to.
    pub fn method_name(self) -> &'static str {
        match self {
            BinaryOperator::Add => "add",
            BinaryOperator::Subtract => "subtract",
            BinaryOperator::Multiply => "multiply",
            BinaryOperator::Divide => "divide",
            BinaryOperator::Modulo => "modulo",
            BinaryOperator::Equals => "equals",
            BinaryOperator::LessThan => "lessThan",
            BinaryOperator::GreaterThan => "greaterThan",
            BinaryOperator::LessThanEqual => "lessThanEqual",
            BinaryOperator::GreaterThanEqual => "greaterThanEqual",
        }
    }

    /// Map a source operator spelling to its dispatched operator.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Subtract,
            "*" => BinaryOperator::Multiply,
            "/" => BinaryOperator::Divide,
            "%" => BinaryOperator::Modulo,
            "==" => BinaryOperator::Equals,
            "<" => BinaryOperator::LessThan,
            ">" => BinaryOperator::GreaterThan,
            "<=" => BinaryOperator::LessThanEqual,
            ">=" => BinaryOperator::GreaterThanEqual,
            _ => return None,
        })
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}
