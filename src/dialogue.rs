//! Composite dialogue emitters.
//!
//! A `say` expands into up to four commands:
//!
//! ```text
//! 0096 set_animation(actor, anim)        only for actor textboxes
//! 01BA/01B9 show_textbox(...)
//! 01BD wait_for_textbox()                when the line waits
//! 0096 set_animation(actor, post_anim)   only for actor textboxes
//! ```
//!
//! Textbox argument layout, actor form (0x01BA):
//! `[actor, width, height, bubble, tail, tail_size, tail_direction,
//!   hoffsets, unk9, wait, sound, message, color]`
//!
//! Position form (0x01B9) replaces `actor` with `x, y` and inserts `unk14`
//! before `color`.

use log::debug;

use crate::command::Command;
use crate::consts::{BUBBLE_TYPE, SELF_ACTOR, TAIL_TYPE, TEXTBOX_COLOR};
use crate::emitter::Emitter;
use crate::error::ScriptError;
use crate::opcodes::{SHOW_TEXTBOX_AT_ACTOR, SHOW_TEXTBOX_AT_POSITION};
use crate::text::EntryDefinition;
use crate::variable::{Value, Variable};

/// Number of arguments shared by both textbox forms.
pub const COMMON_TEXTBOX_ARGUMENTS: usize = 11;
pub const ACTOR_TEXTBOX_ARGUMENTS: usize = COMMON_TEXTBOX_ARGUMENTS + 2;
pub const POSITION_TEXTBOX_ARGUMENTS: usize = COMMON_TEXTBOX_ARGUMENTS + 4;

/// Indices into the common textbox arguments.
pub mod common {
    pub const WIDTH: usize = 0;
    pub const HEIGHT: usize = 1;
    pub const BUBBLE: usize = 2;
    pub const TAIL: usize = 3;
    pub const TAIL_SIZE: usize = 4;
    pub const TAIL_DIRECTION: usize = 5;
    pub const HOFFSETS: usize = 6;
    pub const UNK9: usize = 7;
    pub const WAIT: usize = 8;
    pub const SOUND: usize = 9;
    pub const MESSAGE: usize = 10;
}

/// Where a textbox is anchored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    Actor(Value),
    Position(Value, Value),
}

impl Target {
    /// The actor running the script.
    pub fn self_actor() -> Self {
        Target::Actor(Value::Const(SELF_ACTOR))
    }

    pub fn opcode(&self) -> u16 {
        match self {
            Target::Actor(_) => SHOW_TEXTBOX_AT_ACTOR,
            Target::Position(..) => SHOW_TEXTBOX_AT_POSITION,
        }
    }
}

/// The text a textbox shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A literal line, registered into the room's text tables on emission.
    Entry(EntryDefinition),
    /// An existing text entry index, passed through.
    Index(Value),
}

impl From<EntryDefinition> for Message {
    fn from(entry: EntryDefinition) -> Self {
        Message::Entry(entry)
    }
}

impl From<Value> for Message {
    fn from(value: Value) -> Self {
        Message::Index(value)
    }
}

/// The textbox's wait flag. The stored byte is inverted: `Bool(true)` is
/// stored as 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaitFlag {
    Bool(bool),
    Raw(Value),
}

impl WaitFlag {
    pub fn argument(self) -> Value {
        match self {
            WaitFlag::Bool(wait) => Value::Const(!wait as i64),
            WaitFlag::Raw(value) => value,
        }
    }

    /// Whether a `say` with this flag emits a wait-for-textbox command by
    /// default.
    pub fn waits(self) -> bool {
        match self {
            WaitFlag::Bool(wait) => wait,
            WaitFlag::Raw(value) => value.is(0),
        }
    }
}

/// Pack the two horizontal offsets into one 16-bit argument: textbox offset
/// in the high byte, tail offset in the low byte, 0xFF for an unset half.
pub fn pack_hoffsets(textbox_hoffset: Option<i64>, tail_hoffset: Option<i64>) -> i64 {
    let high = textbox_hoffset.unwrap_or(-1) & 0xFF;
    let low = tail_hoffset.unwrap_or(-1) & 0xFF;
    ((high << 8) | low) as u16 as i16 as i64
}

/// Split a packed offsets argument into `(textbox_hoffset, tail_hoffset)`
/// as signed bytes, or `None` if it does not fit in 16 bits.
pub fn unpack_hoffsets(packed: i64) -> Option<(i64, i64)> {
    let packed = i16::try_from(packed).ok()?;
    let [low, high] = packed.to_le_bytes();
    Some((high as i8 as i64, low as i8 as i64))
}

/// A textbox without the surrounding animation and wait commands.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowTextbox {
    pub target: Target,
    pub sound: Value,
    pub message: Message,
    pub bubble: Value,
    pub tail: Value,
    pub wait: WaitFlag,
    pub color: Value,
    pub width: Option<Value>,
    pub height: Option<Value>,
    pub tail_size: Value,
    pub tail_direction: Option<Value>,
    pub textbox_hoffset: Option<i64>,
    pub tail_hoffset: Option<i64>,
    pub hoffsets_arg: Option<Value>,
    /// Defaults to the configured result variable.
    pub res: Option<Variable>,
    pub unk9: Value,
    pub unk14: Value,
}

impl ShowTextbox {
    pub fn new(target: Target, sound: impl Into<Value>, message: impl Into<Message>) -> Self {
        ShowTextbox {
            target,
            sound: sound.into(),
            message: message.into(),
            bubble: Value::Const(BUBBLE_TYPE.value_of("NORMAL").unwrap_or(0x01)),
            tail: Value::Const(TAIL_TYPE.value_of("NORMAL").unwrap_or(0x01)),
            wait: WaitFlag::Bool(true),
            color: Value::Const(TEXTBOX_COLOR.value_of("NORMAL").unwrap_or(-0x01)),
            width: None,
            height: None,
            tail_size: Value::Const(-0x01),
            tail_direction: None,
            textbox_hoffset: None,
            tail_hoffset: None,
            hoffsets_arg: None,
            res: None,
            unk9: Value::Const(0x01),
            unk14: Value::Const(0x0000),
        }
    }

    fn validate(&self) -> Result<(), ScriptError> {
        if (self.textbox_hoffset.is_some() || self.tail_hoffset.is_some())
            && self.hoffsets_arg.is_some()
        {
            return Err(ScriptError::Configuration(
                "at most one of textbox_hoffset/tail_hoffset and hoffsets_arg may be given"
                    .to_string(),
            ));
        }
        Ok(())
    }

    fn hoffsets(&self) -> Value {
        match self.hoffsets_arg {
            Some(value) => value,
            None => Value::Const(pack_hoffsets(self.textbox_hoffset, self.tail_hoffset)),
        }
    }

    /// Full argument list for the textbox command showing `message_id`.
    pub fn arguments(&self, message_id: Value) -> Vec<Value> {
        let common = [
            self.width.unwrap_or(Value::Const(0)),
            self.height.unwrap_or(Value::Const(0)),
            self.bubble,
            self.tail,
            self.tail_size,
            self.tail_direction.unwrap_or(Value::Const(-1)),
            self.hoffsets(),
            self.unk9,
            self.wait.argument(),
            self.sound,
            message_id,
        ];

        let mut arguments = Vec::with_capacity(POSITION_TEXTBOX_ARGUMENTS);
        match self.target {
            Target::Actor(actor) => {
                arguments.push(actor);
                arguments.extend(common);
            }
            Target::Position(x, y) => {
                arguments.push(x);
                arguments.push(y);
                arguments.extend(common);
                arguments.push(self.unk14);
            }
        }
        arguments.push(self.color);
        arguments
    }
}

/// A dialogue line: a textbox plus its animations and wait.
#[derive(Debug, Clone, PartialEq)]
pub struct Say {
    pub textbox: ShowTextbox,
    /// Animation set before the textbox; actor textboxes only.
    pub anim: Option<Value>,
    /// Animation set after the textbox; actor textboxes only.
    pub post_anim: Option<Value>,
    /// Overrides whether the wait-for-textbox command is emitted.
    pub force_wait_command: Option<bool>,
}

impl Say {
    pub fn new(target: Target, sound: impl Into<Value>, message: impl Into<Message>) -> Self {
        Say {
            textbox: ShowTextbox::new(target, sound, message),
            anim: Some(Value::Const(0x01)),
            post_anim: Some(Value::Const(0x03)),
            force_wait_command: None,
        }
    }

    pub fn emits_wait(&self) -> bool {
        self.force_wait_command
            .unwrap_or_else(|| self.textbox.wait.waits())
    }
}

impl<'a> Emitter<'a> {
    /// Emit a textbox command, registering a literal message first.
    pub fn show_textbox(&mut self, textbox: &ShowTextbox) -> Result<&mut Command, ScriptError> {
        textbox.validate()?;

        let message_id = match &textbox.message {
            Message::Entry(entry) => Value::Const(self.text_entry(entry)? as i64),
            Message::Index(value) => *value,
        };
        let res = textbox
            .res
            .unwrap_or(Variable(self.config().default_result_variable));

        Ok(self.emit(
            textbox.target.opcode(),
            textbox.arguments(message_id),
            Some(res),
        ))
    }

    /// Emit a dialogue line. Returns the index of the textbox command in the
    /// current subroutine.
    pub fn say(&mut self, say: &Say) -> Result<usize, ScriptError> {
        // Fail before anything is appended.
        say.textbox.validate()?;

        let actor = match say.textbox.target {
            Target::Actor(actor) => Some(actor),
            Target::Position(..) => None,
        };

        if let (Some(actor), Some(anim)) = (actor, say.anim) {
            self.set_animation(actor, anim, 0x01);
        }
        self.show_textbox(&say.textbox)?;
        let textbox_index = self.len() - 1;
        if say.emits_wait() {
            self.wait_for_textbox(0x00);
        }
        if let (Some(actor), Some(post_anim)) = (actor, say.post_anim) {
            self.set_animation(actor, post_anim, 0x01);
        }

        debug!(
            "say: textbox at command {} of room 0x{:04X}",
            textbox_index,
            self.room_id()
        );
        Ok(textbox_index)
    }
}

#[cfg(test)]
#[path = "dialogue_tests.rs"]
mod tests;
