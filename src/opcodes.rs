//! FEvent Opcode Constants
//!
//! Named constants for the FEvent VM opcodes the emitter and the decompiler
//! know about. Every opcode not listed here can still be emitted with
//! [`crate::emitter::Emitter::emit`] and is reconstructed by the generic
//! fallback rule.
//!
//! # Arithmetic layout
//!
//! The arithmetic block is laid out in parallel runs:
//! - 0x0009-0x0012: `res = a OP b`
//! - 0x0018-0x0021: `res OP= a` (the same ten operators, in the same order)
//! - 0x0022-0x0027 and 0x0032-0x0037: integer and fixed-point math functions
//!
//! The VM distinguishes "compute into a result slot" from "mutate a slot in
//! place", so an in-place operation is never encoded as a binary operation
//! whose first operand aliases the result.

/// terminate_script - Stop the running script
pub const TERMINATE_SCRIPT: u16 = 0x0000;

/// return - Return from the current subroutine; appended implicitly
pub const RETURN: u16 = 0x0001;

/// wait - Sleep for a number of frames
pub const WAIT: u16 = 0x0004;

/// push - Push a value onto the stack
pub const PUSH: u16 = 0x0005;

/// pop - Pop a value from the stack into the result variable
pub const POP: u16 = 0x0006;

/// set_variable - Copy a value into the result variable
pub const SET_VARIABLE: u16 = 0x0008;

/// First binary arithmetic opcode (add)
pub const BINARY_ARITHMETIC_BASE: u16 = 0x0009;

/// negate - `res = -a`
pub const NEGATE: u16 = 0x0013;

/// to_boolean - `res = a != 0`
pub const TO_BOOLEAN: u16 = 0x0014;

/// bitwise_not - `res = ~a`
pub const BITWISE_NOT: u16 = 0x0015;

/// increment - `res += 1`
pub const INCREMENT: u16 = 0x0016;

/// decrement - `res -= 1`
pub const DECREMENT: u16 = 0x0017;

/// First in-place arithmetic opcode (add_in_place)
pub const IN_PLACE_ARITHMETIC_BASE: u16 = 0x0018;

/// set_animation - Set an actor's animation
pub const SET_ANIMATION: u16 = 0x0096;

/// show_save_dialog - Open the save dialog
pub const SHOW_SAVE_DIALOG: u16 = 0x0199;

/// swap_screens - Swap the top and bottom screens
pub const SWAP_SCREENS: u16 = 0x01AE;

/// show_textbox at an absolute screen position
pub const SHOW_TEXTBOX_AT_POSITION: u16 = 0x01B9;

/// show_textbox anchored to an actor
pub const SHOW_TEXTBOX_AT_ACTOR: u16 = 0x01BA;

/// wait_for_textbox - Block until the open textbox is dismissed
pub const WAIT_FOR_TEXTBOX: u16 = 0x01BD;

/// Operators with both a `res = a OP b` and a `res OP= a` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    ShiftLeft,
    ShiftRight,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 10] = [
        BinaryOp::Add,
        BinaryOp::Subtract,
        BinaryOp::Multiply,
        BinaryOp::Divide,
        BinaryOp::Modulo,
        BinaryOp::ShiftLeft,
        BinaryOp::ShiftRight,
        BinaryOp::BitwiseAnd,
        BinaryOp::BitwiseOr,
        BinaryOp::BitwiseXor,
    ];

    fn position(self) -> u16 {
        Self::ALL.iter().position(|op| *op == self).unwrap_or(0) as u16
    }

    pub fn opcode(self) -> u16 {
        BINARY_ARITHMETIC_BASE + self.position()
    }

    pub fn in_place_opcode(self) -> u16 {
        IN_PLACE_ARITHMETIC_BASE + self.position()
    }

    /// Operator as written in script source.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::BitwiseOr => "|",
            BinaryOp::BitwiseXor => "^",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Subtract => "subtract",
            BinaryOp::Multiply => "multiply",
            BinaryOp::Divide => "divide",
            BinaryOp::Modulo => "modulo",
            BinaryOp::ShiftLeft => "logical_shift_left",
            BinaryOp::ShiftRight => "logical_shift_right",
            BinaryOp::BitwiseAnd => "bitwise_and",
            BinaryOp::BitwiseOr => "bitwise_or",
            BinaryOp::BitwiseXor => "bitwise_xor",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.symbol() == symbol)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == name)
    }

    pub fn from_opcode(opcode: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.opcode() == opcode)
    }

    pub fn from_in_place_opcode(opcode: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.in_place_opcode() == opcode)
    }
}

/// Prefix operators written as `res = OP a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
    BitwiseNot,
}

impl UnaryOp {
    pub fn opcode(self) -> u16 {
        match self {
            UnaryOp::Negate => NEGATE,
            UnaryOp::BitwiseNot => BITWISE_NOT,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::BitwiseNot => "~",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Negate => "negate",
            UnaryOp::BitwiseNot => "bitwise_not",
        }
    }

    pub fn from_opcode(opcode: u16) -> Option<Self> {
        match opcode {
            NEGATE => Some(UnaryOp::Negate),
            BITWISE_NOT => Some(UnaryOp::BitwiseNot),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "negate" => Some(UnaryOp::Negate),
            "bitwise_not" => Some(UnaryOp::BitwiseNot),
            _ => None,
        }
    }
}

/// Result-producing commands that are always written in call form,
/// `name(a[, b], res)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionOp {
    ToBoolean,
    Sqrt,
    Invsqrt,
    Invert,
    Sin,
    Cos,
    Atan,
    Atan2,
    RandomBelow,
    FpSetVariable,
    FpAdd,
    FpSubtract,
    FpMultiply,
    FpDivide,
    FpModulo,
    FpToInt,
    FpTrunc,
    FpSqrt,
    FpInvsqrt,
    FpInvert,
    FpSin,
    FpCos,
    FpAtan,
    FpAtan2,
}

/// (op, opcode, name, operand count)
const FUNCTION_OPS: [(FunctionOp, u16, &str, usize); 24] = [
    (FunctionOp::ToBoolean, TO_BOOLEAN, "to_boolean", 1),
    (FunctionOp::Sqrt, 0x0022, "sqrt", 1),
    (FunctionOp::Invsqrt, 0x0023, "invsqrt", 1),
    (FunctionOp::Invert, 0x0024, "invert", 1),
    (FunctionOp::Sin, 0x0025, "sin", 1),
    (FunctionOp::Cos, 0x0026, "cos", 1),
    (FunctionOp::Atan, 0x0027, "atan", 1),
    (FunctionOp::Atan2, 0x0028, "atan2", 2),
    (FunctionOp::RandomBelow, 0x0029, "random_below", 1),
    (FunctionOp::FpSetVariable, 0x002A, "fp_set_variable", 1),
    (FunctionOp::FpAdd, 0x002B, "fp_add", 2),
    (FunctionOp::FpSubtract, 0x002C, "fp_subtract", 2),
    (FunctionOp::FpMultiply, 0x002D, "fp_multiply", 2),
    (FunctionOp::FpDivide, 0x002E, "fp_divide", 2),
    (FunctionOp::FpModulo, 0x002F, "fp_modulo", 2),
    (FunctionOp::FpToInt, 0x0030, "fp_to_int", 1),
    (FunctionOp::FpTrunc, 0x0031, "fp_trunc", 1),
    (FunctionOp::FpSqrt, 0x0032, "fp_sqrt", 1),
    (FunctionOp::FpInvsqrt, 0x0033, "fp_invsqrt", 1),
    (FunctionOp::FpInvert, 0x0034, "fp_invert", 1),
    (FunctionOp::FpSin, 0x0035, "fp_sin", 1),
    (FunctionOp::FpCos, 0x0036, "fp_cos", 1),
    (FunctionOp::FpAtan, 0x0037, "fp_atan", 1),
    (FunctionOp::FpAtan2, 0x0038, "fp_atan2", 2),
];

impl FunctionOp {
    fn entry(self) -> (FunctionOp, u16, &'static str, usize) {
        FUNCTION_OPS
            .iter()
            .copied()
            .find(|(op, ..)| *op == self)
            .unwrap_or(FUNCTION_OPS[0])
    }

    pub fn all() -> impl Iterator<Item = FunctionOp> {
        FUNCTION_OPS.iter().map(|(op, ..)| *op)
    }

    pub fn opcode(self) -> u16 {
        self.entry().1
    }

    pub fn name(self) -> &'static str {
        self.entry().2
    }

    /// Number of operands, not counting the result variable.
    pub fn arity(self) -> usize {
        self.entry().3
    }

    pub fn from_opcode(opcode: u16) -> Option<Self> {
        FUNCTION_OPS
            .iter()
            .find(|(_, code, ..)| *code == opcode)
            .map(|(op, ..)| *op)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        FUNCTION_OPS
            .iter()
            .find(|(_, _, op_name, _)| *op_name == name)
            .map(|(op, ..)| *op)
    }
}
