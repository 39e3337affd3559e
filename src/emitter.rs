//! Command emission into the subroutine currently being built.
//!
//! An [`Emitter`] is only handed out by
//! [`ScriptScope::subroutine`](crate::context::ScriptScope::subroutine), so
//! every command always has a target subroutine. Each method appends exactly
//! one command and returns it for post-hoc mutation; no method validates
//! arities.

use crate::command::{Command, Subroutine};
use crate::config::ScriptConfig;
use crate::error::ScriptError;
use crate::manager::ScriptManager;
use crate::opcodes::*;
use crate::text::{EntryDefinition, TableSlot, TextTableBuilder};
use crate::variable::{Operation, Value, Variable};

/// Append a command to an explicitly given subroutine.
pub fn emit_command(
    subroutine: &mut Subroutine,
    opcode: u16,
    arguments: Vec<Value>,
    result: Option<Variable>,
) -> &mut Command {
    let index = subroutine.commands.len();
    subroutine
        .commands
        .push(Command::new(opcode, arguments, result));
    &mut subroutine.commands[index]
}

pub struct Emitter<'a> {
    subroutine: &'a mut Subroutine,
    room_id: u16,
    text_tables: &'a mut TextTableBuilder,
    manager: &'a dyn ScriptManager,
    config: &'a ScriptConfig,
}

macro_rules! binary_emitters {
    ($(($name:ident, $in_place:ident, $op:expr)),* $(,)?) => {
        $(
            pub fn $name(
                &mut self,
                a: impl Into<Value>,
                b: impl Into<Value>,
                res: Variable,
            ) -> &mut Command {
                self.binary($op, a, b, res)
            }

            pub fn $in_place(&mut self, a: impl Into<Value>, res: Variable) -> &mut Command {
                self.in_place($op, a, res)
            }
        )*
    };
}

impl<'a> Emitter<'a> {
    pub fn new(
        subroutine: &'a mut Subroutine,
        room_id: u16,
        text_tables: &'a mut TextTableBuilder,
        manager: &'a dyn ScriptManager,
        config: &'a ScriptConfig,
    ) -> Self {
        Emitter {
            subroutine,
            room_id,
            text_tables,
            manager,
            config,
        }
    }

    pub fn room_id(&self) -> u16 {
        self.room_id
    }

    pub fn config(&self) -> &ScriptConfig {
        self.config
    }

    /// Number of commands emitted so far.
    pub fn len(&self) -> usize {
        self.subroutine.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subroutine.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.subroutine.commands
    }

    pub fn emit(
        &mut self,
        opcode: u16,
        arguments: Vec<Value>,
        result: Option<Variable>,
    ) -> &mut Command {
        emit_command(self.subroutine, opcode, arguments, result)
    }

    /// Register a dialogue line in the current room; returns its index.
    pub fn text_entry(&mut self, entry: &EntryDefinition) -> Result<usize, ScriptError> {
        self.text_tables
            .register_entry(self.room_id, entry, self.manager)
    }

    pub fn text_table(&mut self, table_id: u8, slot: TableSlot) {
        self.text_tables.register_table(self.room_id, table_id, slot);
    }

    pub fn terminate_script(&mut self) -> &mut Command {
        self.emit(TERMINATE_SCRIPT, vec![], None)
    }

    pub fn ret(&mut self) -> &mut Command {
        self.emit(RETURN, vec![], None)
    }

    pub fn wait(&mut self, frames: impl Into<Value>) -> &mut Command {
        self.emit(WAIT, vec![frames.into()], None)
    }

    pub fn push(&mut self, value: impl Into<Value>) -> &mut Command {
        self.emit(PUSH, vec![value.into()], None)
    }

    pub fn pop(&mut self, res: Variable) -> &mut Command {
        self.emit(POP, vec![], Some(res))
    }

    pub fn set_variable(&mut self, value: impl Into<Value>, res: Variable) -> &mut Command {
        self.emit(SET_VARIABLE, vec![value.into()], Some(res))
    }

    /// `res = a OP b`
    pub fn binary(
        &mut self,
        op: BinaryOp,
        a: impl Into<Value>,
        b: impl Into<Value>,
        res: Variable,
    ) -> &mut Command {
        self.emit(op.opcode(), vec![a.into(), b.into()], Some(res))
    }

    /// `res OP= a`
    pub fn in_place(&mut self, op: BinaryOp, a: impl Into<Value>, res: Variable) -> &mut Command {
        self.emit(op.in_place_opcode(), vec![a.into()], Some(res))
    }

    binary_emitters!(
        (add, add_in_place, BinaryOp::Add),
        (subtract, subtract_in_place, BinaryOp::Subtract),
        (multiply, multiply_in_place, BinaryOp::Multiply),
        (divide, divide_in_place, BinaryOp::Divide),
        (modulo, modulo_in_place, BinaryOp::Modulo),
        (logical_shift_left, logical_shift_left_in_place, BinaryOp::ShiftLeft),
        (logical_shift_right, logical_shift_right_in_place, BinaryOp::ShiftRight),
        (bitwise_and, bitwise_and_in_place, BinaryOp::BitwiseAnd),
        (bitwise_or, bitwise_or_in_place, BinaryOp::BitwiseOr),
        (bitwise_xor, bitwise_xor_in_place, BinaryOp::BitwiseXor),
    );

    pub fn unary(&mut self, op: UnaryOp, a: impl Into<Value>, res: Variable) -> &mut Command {
        self.emit(op.opcode(), vec![a.into()], Some(res))
    }

    pub fn negate(&mut self, a: impl Into<Value>, res: Variable) -> &mut Command {
        self.unary(UnaryOp::Negate, a, res)
    }

    pub fn bitwise_not(&mut self, a: impl Into<Value>, res: Variable) -> &mut Command {
        self.unary(UnaryOp::BitwiseNot, a, res)
    }

    pub fn to_boolean(&mut self, a: impl Into<Value>, res: Variable) -> &mut Command {
        self.function(FunctionOp::ToBoolean, a, res)
    }

    pub fn increment(&mut self, res: Variable) -> &mut Command {
        self.emit(INCREMENT, vec![], Some(res))
    }

    pub fn decrement(&mut self, res: Variable) -> &mut Command {
        self.emit(DECREMENT, vec![], Some(res))
    }

    /// One-operand math function, `res = op(a)`.
    pub fn function(&mut self, op: FunctionOp, a: impl Into<Value>, res: Variable) -> &mut Command {
        self.emit(op.opcode(), vec![a.into()], Some(res))
    }

    /// Two-operand math function, `res = op(a, b)`.
    pub fn function2(
        &mut self,
        op: FunctionOp,
        a: impl Into<Value>,
        b: impl Into<Value>,
        res: Variable,
    ) -> &mut Command {
        self.emit(op.opcode(), vec![a.into(), b.into()], Some(res))
    }

    /// Store the result of `operation` into `res` with a single command.
    pub fn assign(&mut self, res: Variable, operation: Operation) -> &mut Command {
        match operation {
            Operation::Set(value) => self.set_variable(value, res),
            Operation::Binary(op, a, b) => self.binary(op, a, b, res),
            Operation::Unary(op, a) => self.unary(op, a, res),
            Operation::Function(op, a, None) => self.function(op, a, res),
            Operation::Function(op, a, Some(b)) => self.function2(op, a, b, res),
        }
    }

    pub fn set_animation(
        &mut self,
        actor: impl Into<Value>,
        animation: impl Into<Value>,
        unk3: impl Into<Value>,
    ) -> &mut Command {
        self.emit(
            SET_ANIMATION,
            vec![actor.into(), animation.into(), unk3.into()],
            None,
        )
    }

    pub fn show_save_dialog(
        &mut self,
        fade_in: impl Into<Value>,
        unk1: impl Into<Value>,
        unk2: impl Into<Value>,
    ) -> &mut Command {
        self.emit(
            SHOW_SAVE_DIALOG,
            vec![unk1.into(), unk2.into(), fade_in.into()],
            None,
        )
    }

    pub fn swap_screens(&mut self) -> &mut Command {
        self.emit(SWAP_SCREENS, vec![], None)
    }

    pub fn wait_for_textbox(&mut self, unk1: impl Into<Value>) -> &mut Command {
        self.emit(WAIT_FOR_TEXTBOX, vec![unk1.into()], None)
    }
}

#[cfg(test)]
#[path = "emitter_tests.rs"]
mod tests;
