//! Reconstruction of `say` lines.
//!
//! The rule matches an optional animation, a textbox, an optional
//! wait-for-textbox and an optional trailing animation. Commands that the
//! compiler would not regenerate from the reconstructed `say` are written
//! out verbatim after it, in their original order.

use crate::command::Command;
use crate::consts::{BUBBLE_TYPE, SELF_ACTOR, SOUND, TAIL_TYPE, TEXTBOX_COLOR};
use crate::decompiler::format::{
    self, enum_or_variable, fhex, fhex_byte, fhex_int, fhex_short, value,
};
use crate::decompiler::handlers::{
    has_shape, render_emit_command, render_set_animation, render_wait_for_textbox,
};
use crate::decompiler::matcher::{MatchContext, MatchOutcome};
use crate::dialogue::{
    common, unpack_hoffsets, ACTOR_TEXTBOX_ARGUMENTS, POSITION_TEXTBOX_ARGUMENTS,
};
use crate::error::ScriptError;
use crate::opcodes::{SET_ANIMATION, SHOW_TEXTBOX_AT_ACTOR, SHOW_TEXTBOX_AT_POSITION, WAIT_FOR_TEXTBOX};
use crate::variable::Value;

pub const SAY_PATTERN: &str = "(?:0096,)?01B[9A],(?:01BD,)?(?:0096,)?";

/// The textbox command split into its parts.
struct Textbox<'c> {
    command: &'c Command,
    actor: Option<Value>,
    common: &'c [Value],
    color: Value,
    unk14: Option<Value>,
}

impl<'c> Textbox<'c> {
    fn of(command: &'c Command) -> Option<Self> {
        if command.result.is_none() {
            return None;
        }
        let arguments = &command.arguments;
        match (command.opcode, arguments.len()) {
            (SHOW_TEXTBOX_AT_ACTOR, ACTOR_TEXTBOX_ARGUMENTS) => Some(Textbox {
                command,
                actor: Some(arguments[0]),
                common: &arguments[1..ACTOR_TEXTBOX_ARGUMENTS - 1],
                color: arguments[ACTOR_TEXTBOX_ARGUMENTS - 1],
                unk14: None,
            }),
            (SHOW_TEXTBOX_AT_POSITION, POSITION_TEXTBOX_ARGUMENTS) => Some(Textbox {
                command,
                actor: None,
                common: &arguments[2..POSITION_TEXTBOX_ARGUMENTS - 2],
                color: arguments[POSITION_TEXTBOX_ARGUMENTS - 1],
                unk14: Some(arguments[POSITION_TEXTBOX_ARGUMENTS - 2]),
            }),
            _ => None,
        }
    }

    fn common(&self, index: usize) -> &'c Value {
        &self.common[index]
    }

    /// Whether `animation` is the one a `say` on this textbox would emit
    /// itself.
    fn fuses(&self, animation: &Command) -> bool {
        match self.actor {
            Some(actor) => {
                animation.opcode == SET_ANIMATION
                    && has_shape(animation, 3, false)
                    && animation.arguments[0] == actor
                    && animation.arguments[2].is(0x01)
            }
            None => false,
        }
    }
}

fn verbatim(command: &Command, context: &MatchContext<'_>) -> String {
    render_set_animation(command)
        .or_else(|| render_wait_for_textbox(command))
        .unwrap_or_else(|| render_emit_command(command, context.manager))
}

pub fn say(
    commands: &[Command],
    context: &mut MatchContext<'_>,
    _start: usize,
) -> Result<MatchOutcome, ScriptError> {
    let mut rest = commands;
    let mut anim: Option<Value> = None;
    if rest[0].opcode == SET_ANIMATION {
        // A leading animation that cannot be fused is left to the
        // set_animation rule.
        match rest.get(1).and_then(Textbox::of) {
            Some(textbox) if textbox.fuses(&rest[0]) => anim = Some(rest[0].arguments[1]),
            _ => return Ok(MatchOutcome::Declined),
        }
        rest = &rest[1..];
    }

    let textbox = match Textbox::of(&rest[0]) {
        Some(textbox) => textbox,
        None => return Ok(MatchOutcome::Declined),
    };

    let mut after = Vec::new();
    let mut next = 1;
    let mut wait_stripped = false;
    let mut wait_verbatim = false;
    if let Some(wait) = rest.get(next).filter(|command| command.opcode == WAIT_FOR_TEXTBOX) {
        if has_shape(wait, 1, false) && wait.arguments[0].is(0x00) {
            wait_stripped = true;
        } else {
            after.push(verbatim(wait, context));
            wait_verbatim = true;
        }
        next += 1;
    }

    let mut post_anim: Option<Value> = None;
    if let Some(trailing) = rest.get(next) {
        // Fusing behind a verbatim wait would swap the two on recompile.
        if !wait_verbatim && textbox.fuses(trailing) {
            post_anim = Some(trailing.arguments[1]);
        } else {
            after.push(verbatim(trailing, context));
        }
    }

    let message_argument = *textbox.common(common::MESSAGE);
    let message = match message_argument.as_const() {
        Some(index) if index >= 0 && index as usize == *context.next_text_entry => {
            let language_table = context.language_table()?;
            let literal = format::text_entry(
                language_table,
                index as usize,
                context.config,
                context.manager,
                false,
            )?;
            *context.next_text_entry += 1;
            literal
        }
        _ => value(&message_argument, fhex_byte),
    };

    let target = match textbox.actor {
        Some(actor) if actor.is(SELF_ACTOR) => "Self".to_string(),
        Some(actor) => value(&actor, fhex_byte),
        None => format!(
            "({}, {})",
            value(&textbox.command.arguments[0], fhex_short),
            value(&textbox.command.arguments[1], fhex_short)
        ),
    };
    let mut arguments = vec![
        target,
        enum_or_variable(&SOUND, textbox.common(common::SOUND), fhex_int),
        message,
    ];

    if textbox.actor.is_some() {
        match anim {
            Some(anim) if anim.is(0x01) => {}
            Some(anim) => arguments.push(format!("anim={}", value(&anim, fhex_byte))),
            None => arguments.push("anim=none".to_string()),
        }
        match post_anim {
            Some(post_anim) if post_anim.is(0x03) => {}
            Some(post_anim) => {
                arguments.push(format!("post_anim={}", value(&post_anim, fhex_byte)))
            }
            None => arguments.push("post_anim=none".to_string()),
        }
    }

    let bubble = textbox.common(common::BUBBLE);
    if !bubble.is(BUBBLE_TYPE.value_of("NORMAL").unwrap_or(0x01)) {
        arguments.push(format!("bubble={}", enum_or_variable(&BUBBLE_TYPE, bubble, fhex_byte)));
    }
    let tail = textbox.common(common::TAIL);
    if !tail.is(TAIL_TYPE.value_of("NORMAL").unwrap_or(0x01)) {
        arguments.push(format!("tail={}", enum_or_variable(&TAIL_TYPE, tail, fhex_byte)));
    }
    let wait = textbox.common(common::WAIT);
    if !wait.is(0) {
        if wait.is(1) {
            arguments.push("wait=false".to_string());
        } else {
            arguments.push(format!("wait={}", value(wait, fhex_byte)));
        }
    }
    if !textbox.color.is(TEXTBOX_COLOR.value_of("NORMAL").unwrap_or(-0x01)) {
        arguments.push(format!(
            "color={}",
            enum_or_variable(&TEXTBOX_COLOR, &textbox.color, fhex_byte)
        ));
    }
    let width = textbox.common(common::WIDTH);
    if !width.is(0) {
        arguments.push(format!("width={}", value(width, format::decimal)));
    }
    let height = textbox.common(common::HEIGHT);
    if !height.is(0) {
        arguments.push(format!("height={}", value(height, format::decimal)));
    }
    let tail_size = textbox.common(common::TAIL_SIZE);
    if !tail_size.is(-1) {
        arguments.push(format!("tail_size={}", value(tail_size, fhex_byte)));
    }
    let tail_direction = textbox.common(common::TAIL_DIRECTION);
    if !tail_direction.is(-1) {
        arguments.push(format!("tail_direction={}", value(tail_direction, fhex_byte)));
    }
    let hoffsets = textbox.common(common::HOFFSETS);
    match hoffsets.as_const().and_then(unpack_hoffsets) {
        Some((textbox_hoffset, tail_hoffset)) => {
            if textbox_hoffset != -1 {
                arguments.push(format!("textbox_hoffset={}", fhex(textbox_hoffset, 2)));
            }
            if tail_hoffset != -1 {
                arguments.push(format!("tail_hoffset={}", fhex(tail_hoffset, 2)));
            }
        }
        None => arguments.push(format!("hoffsets_arg={}", value(hoffsets, fhex_short))),
    }

    // The compiler emits the wait by default exactly when the flag is 0.
    if wait.is(0) != wait_stripped {
        arguments.push(format!("force_wait_command={}", wait_stripped));
    }

    if let Some(res) = textbox.command.result {
        if res.number() != context.config.default_result_variable {
            arguments.push(format!("res={}", format::variable(res)));
        }
    }
    let unk9 = textbox.common(common::UNK9);
    if !unk9.is(0x01) {
        arguments.push(format!("unk9={}", value(unk9, fhex_byte)));
    }
    if let Some(unk14) = textbox.unk14 {
        if !unk14.is(0x0000) {
            arguments.push(format!("unk14={}", value(&unk14, fhex_short)));
        }
    }

    let mut text = format!("say({})", arguments.join(", "));
    for line in after {
        text.push('\n');
        text.push_str(&line);
    }
    Ok(MatchOutcome::Matched(text))
}

#[cfg(test)]
#[path = "dialogue_tests.rs"]
mod tests;
