//! Symbolic register references and the values commands operate on.

use std::fmt;

use crate::opcodes::{BinaryOp, FunctionOp, UnaryOp};

/// A 16-bit variable slot of the FEvent VM.
///
/// Variables are plain values: two variables are equal iff they name the same
/// slot, and they never own anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(pub u16);

impl Variable {
    pub fn new(number: u16) -> Self {
        Variable(number)
    }

    pub fn number(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Var[0x{:04X}]", self.0)
    }
}

/// A command argument: either an immediate integer or a variable reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Const(i64),
    Var(Variable),
}

impl Value {
    /// The immediate value, if this is not a variable reference.
    pub fn as_const(&self) -> Option<i64> {
        match self {
            Value::Const(value) => Some(*value),
            Value::Var(_) => None,
        }
    }

    pub fn as_variable(&self) -> Option<Variable> {
        match self {
            Value::Var(variable) => Some(*variable),
            Value::Const(_) => None,
        }
    }

    /// True if this is the immediate `value`. Variables never compare equal
    /// to an immediate.
    pub fn is(&self, value: i64) -> bool {
        self.as_const() == Some(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Const(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Const(value as i64)
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::Const(value as i64)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::Const(value as i64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Const(value as i64)
    }
}

impl From<Variable> for Value {
    fn from(variable: Variable) -> Self {
        Value::Var(variable)
    }
}

/// A computation whose result is stored into a variable.
///
/// Every variant corresponds to exactly one emitted command; see
/// [`crate::emitter::Emitter::assign`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    Set(Value),
    Binary(BinaryOp, Value, Value),
    Unary(UnaryOp, Value),
    Function(FunctionOp, Value, Option<Value>),
}

impl Operation {
    pub fn set(value: impl Into<Value>) -> Self {
        Operation::Set(value.into())
    }

    pub fn binary(op: BinaryOp, a: impl Into<Value>, b: impl Into<Value>) -> Self {
        Operation::Binary(op, a.into(), b.into())
    }

    pub fn add(a: impl Into<Value>, b: impl Into<Value>) -> Self {
        Self::binary(BinaryOp::Add, a, b)
    }

    pub fn subtract(a: impl Into<Value>, b: impl Into<Value>) -> Self {
        Self::binary(BinaryOp::Subtract, a, b)
    }

    pub fn multiply(a: impl Into<Value>, b: impl Into<Value>) -> Self {
        Self::binary(BinaryOp::Multiply, a, b)
    }

    pub fn divide(a: impl Into<Value>, b: impl Into<Value>) -> Self {
        Self::binary(BinaryOp::Divide, a, b)
    }

    pub fn modulo(a: impl Into<Value>, b: impl Into<Value>) -> Self {
        Self::binary(BinaryOp::Modulo, a, b)
    }

    pub fn shift_left(a: impl Into<Value>, b: impl Into<Value>) -> Self {
        Self::binary(BinaryOp::ShiftLeft, a, b)
    }

    pub fn shift_right(a: impl Into<Value>, b: impl Into<Value>) -> Self {
        Self::binary(BinaryOp::ShiftRight, a, b)
    }

    pub fn bitwise_and(a: impl Into<Value>, b: impl Into<Value>) -> Self {
        Self::binary(BinaryOp::BitwiseAnd, a, b)
    }

    pub fn bitwise_or(a: impl Into<Value>, b: impl Into<Value>) -> Self {
        Self::binary(BinaryOp::BitwiseOr, a, b)
    }

    pub fn bitwise_xor(a: impl Into<Value>, b: impl Into<Value>) -> Self {
        Self::binary(BinaryOp::BitwiseXor, a, b)
    }

    pub fn negate(a: impl Into<Value>) -> Self {
        Operation::Unary(UnaryOp::Negate, a.into())
    }

    pub fn bitwise_not(a: impl Into<Value>) -> Self {
        Operation::Unary(UnaryOp::BitwiseNot, a.into())
    }

    pub fn function(op: FunctionOp, a: impl Into<Value>) -> Self {
        Operation::Function(op, a.into(), None)
    }

    pub fn function2(op: FunctionOp, a: impl Into<Value>, b: impl Into<Value>) -> Self {
        Operation::Function(op, a.into(), Some(b.into()))
    }
}
