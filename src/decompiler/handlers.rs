// Built-in reconstruction rules

use crate::command::Command;
use crate::consts::SELF_ACTOR;
use crate::decompiler::dialogue;
use crate::decompiler::format::{self, bool_or_value, decimal, fhex, fhex_bare, fhex_byte, value};
use crate::decompiler::matcher::{MatchContext, MatchHandler, MatchOutcome, MatcherRegistry};
use crate::error::ScriptError;
use crate::manager::ScriptManager;
use crate::opcodes::*;

type HandlerResult = Result<MatchOutcome, ScriptError>;

/// True if `command` has exactly `arguments` arguments and a result
/// variable iff `has_result`.
pub(crate) fn has_shape(command: &Command, arguments: usize, has_result: bool) -> bool {
    command.arguments.len() == arguments && command.result.is_some() == has_result
}

fn matched(text: impl Into<String>) -> HandlerResult {
    Ok(MatchOutcome::Matched(text.into()))
}

fn declined() -> HandlerResult {
    Ok(MatchOutcome::Declined)
}

fn result_of(command: &Command) -> String {
    command
        .result
        .map(format::variable)
        .unwrap_or_default()
}

fn terminate_script(commands: &[Command], _: &mut MatchContext<'_>, _: usize) -> HandlerResult {
    if !has_shape(&commands[0], 0, false) {
        return declined();
    }
    matched("terminate_script()")
}

fn ret(commands: &[Command], _: &mut MatchContext<'_>, _: usize) -> HandlerResult {
    if !has_shape(&commands[0], 0, false) {
        return declined();
    }
    matched("ret()")
}

fn wait(commands: &[Command], _: &mut MatchContext<'_>, _: usize) -> HandlerResult {
    let command = &commands[0];
    if !has_shape(command, 1, false) {
        return declined();
    }
    matched(format!("wait({})", value(&command.arguments[0], decimal)))
}

fn push(commands: &[Command], _: &mut MatchContext<'_>, _: usize) -> HandlerResult {
    let command = &commands[0];
    if !has_shape(command, 1, false) {
        return declined();
    }
    matched(format!("push({})", value(&command.arguments[0], decimal)))
}

fn pop(commands: &[Command], _: &mut MatchContext<'_>, _: usize) -> HandlerResult {
    let command = &commands[0];
    if !has_shape(command, 0, true) {
        return declined();
    }
    matched(format!("pop({})", result_of(command)))
}

fn set_variable(commands: &[Command], _: &mut MatchContext<'_>, _: usize) -> HandlerResult {
    let command = &commands[0];
    if !has_shape(command, 1, true) {
        return declined();
    }
    matched(format!(
        "{} = {}",
        result_of(command),
        value(&command.arguments[0], fhex_bare)
    ))
}

fn binary_arithmetic(commands: &[Command], _: &mut MatchContext<'_>, _: usize) -> HandlerResult {
    let command = &commands[0];
    let op = match BinaryOp::from_opcode(command.opcode) {
        Some(op) if has_shape(command, 2, true) => op,
        _ => return declined(),
    };
    matched(format!(
        "{} = {} {} {}",
        result_of(command),
        value(&command.arguments[0], fhex_bare),
        op.symbol(),
        value(&command.arguments[1], fhex_bare)
    ))
}

fn in_place_arithmetic(commands: &[Command], _: &mut MatchContext<'_>, _: usize) -> HandlerResult {
    let command = &commands[0];
    let op = match BinaryOp::from_in_place_opcode(command.opcode) {
        Some(op) if has_shape(command, 1, true) => op,
        _ => return declined(),
    };
    let operand = &command.arguments[0];

    // `+= 1` and `-= 1` are increment and decrement.
    if matches!(op, BinaryOp::Add | BinaryOp::Subtract) && (operand.is(1) || operand.is(-1)) {
        return matched(format!(
            "{}_in_place({}, {})",
            op.name(),
            value(operand, fhex_bare),
            result_of(command)
        ));
    }
    matched(format!(
        "{} {}= {}",
        result_of(command),
        op.symbol(),
        value(operand, fhex_bare)
    ))
}

fn unary_arithmetic(commands: &[Command], _: &mut MatchContext<'_>, _: usize) -> HandlerResult {
    let command = &commands[0];
    let op = match UnaryOp::from_opcode(command.opcode) {
        Some(op) if has_shape(command, 1, true) => op,
        _ => return declined(),
    };
    let operand = &command.arguments[0];

    // `Var = -0x5` already means set_variable(-5).
    if op == UnaryOp::Negate && operand.as_const().is_some() {
        return matched(format!(
            "{}({}, {})",
            op.name(),
            value(operand, fhex_bare),
            result_of(command)
        ));
    }
    matched(format!(
        "{} = {}{}",
        result_of(command),
        op.symbol(),
        value(operand, fhex_bare)
    ))
}

fn incrementing_arithmetic(
    commands: &[Command],
    _: &mut MatchContext<'_>,
    _: usize,
) -> HandlerResult {
    let command = &commands[0];
    if !has_shape(command, 0, true) {
        return declined();
    }
    let symbol = if command.opcode == INCREMENT { "+" } else { "-" };
    matched(format!("{} {}= 1", result_of(command), symbol))
}

fn function(commands: &[Command], _: &mut MatchContext<'_>, _: usize) -> HandlerResult {
    let command = &commands[0];
    let op = match FunctionOp::from_opcode(command.opcode) {
        Some(op) if has_shape(command, op.arity(), true) => op,
        _ => return declined(),
    };
    let mut arguments: Vec<String> = command
        .arguments
        .iter()
        .map(|argument| value(argument, fhex_bare))
        .collect();
    arguments.push(result_of(command));
    matched(format!("{}({})", op.name(), arguments.join(", ")))
}

/// `set_animation(actor, animation[, unk3=...])`, or `None` if the command
/// does not have that shape.
pub(crate) fn render_set_animation(command: &Command) -> Option<String> {
    if command.opcode != SET_ANIMATION || !has_shape(command, 3, false) {
        return None;
    }
    let actor = match command.arguments[0] {
        actor if actor.is(SELF_ACTOR) => "Self".to_string(),
        actor => value(&actor, fhex_byte),
    };
    let unk3 = &command.arguments[2];
    Some(format!(
        "set_animation({}, {}{})",
        actor,
        value(&command.arguments[1], fhex_byte),
        if unk3.is(0x01) {
            String::new()
        } else {
            format!(", unk3={}", value(unk3, fhex_byte))
        }
    ))
}

pub(crate) fn render_wait_for_textbox(command: &Command) -> Option<String> {
    if command.opcode != WAIT_FOR_TEXTBOX || !has_shape(command, 1, false) {
        return None;
    }
    let unk1 = &command.arguments[0];
    if unk1.is(0x00) {
        Some("wait_for_textbox()".to_string())
    } else {
        Some(format!("wait_for_textbox(unk1={})", value(unk1, fhex_byte)))
    }
}

fn set_animation(commands: &[Command], _: &mut MatchContext<'_>, _: usize) -> HandlerResult {
    match render_set_animation(&commands[0]) {
        Some(text) => matched(text),
        None => declined(),
    }
}

fn wait_for_textbox(commands: &[Command], _: &mut MatchContext<'_>, _: usize) -> HandlerResult {
    match render_wait_for_textbox(&commands[0]) {
        Some(text) => matched(text),
        None => declined(),
    }
}

fn show_save_dialog(commands: &[Command], _: &mut MatchContext<'_>, _: usize) -> HandlerResult {
    let command = &commands[0];
    if !has_shape(command, 3, false) {
        return declined();
    }
    let [unk1, unk2, fade_in] = [
        &command.arguments[0],
        &command.arguments[1],
        &command.arguments[2],
    ];
    let mut arguments = Vec::new();
    if !fade_in.is(1) {
        arguments.push(format!("fade_in={}", bool_or_value(fade_in, fhex_byte)));
    }
    if !unk1.is(0x00) {
        arguments.push(format!("unk1={}", value(unk1, fhex_byte)));
    }
    if !unk2.is(0x01) {
        arguments.push(format!("unk2={}", value(unk2, fhex_byte)));
    }
    matched(format!("show_save_dialog({})", arguments.join(", ")))
}

fn swap_screens(commands: &[Command], _: &mut MatchContext<'_>, _: usize) -> HandlerResult {
    if !has_shape(&commands[0], 0, false) {
        return declined();
    }
    matched("swap_screens()")
}

/// `emit_command(0xXXXX, [args], Var[...])`, with every immediate as wide as
/// its parameter type.
pub(crate) fn render_emit_command(command: &Command, manager: &dyn ScriptManager) -> String {
    let parameter_types = manager.parameter_types(command.opcode).unwrap_or(&[]);
    let arguments: Vec<String> = command
        .arguments
        .iter()
        .enumerate()
        .map(|(i, argument)| {
            let width = parameter_types
                .get(i)
                .map(|parameter_type| parameter_type.hex_width())
                .unwrap_or(0);
            value(argument, |constant| fhex(constant, width))
        })
        .collect();

    let mut text = format!("emit_command({}", fhex(command.opcode as i64, 4));
    if !arguments.is_empty() || command.result.is_some() {
        text.push_str(&format!(", [{}]", arguments.join(", ")));
    }
    if let Some(result) = command.result {
        text.push_str(&format!(", {}", format::variable(result)));
    }
    text.push(')');
    text
}

fn unknown_command(commands: &[Command], context: &mut MatchContext<'_>, _: usize) -> HandlerResult {
    matched(render_emit_command(&commands[0], context.manager))
}

fn token(opcode: u16) -> String {
    format!("{:04X},", opcode)
}

fn add(registry: &mut MatcherRegistry, name: &'static str, pattern: &str, handler: MatchHandler) {
    // Built-in patterns are constants.
    registry
        .register(name, pattern, handler)
        .expect("built-in command pattern must compile");
}

/// The built-in rule list, highest priority first, ending in the catch-all.
pub fn builtin_registry() -> MatcherRegistry {
    let mut registry = MatcherRegistry::new();

    add(&mut registry, "terminate_script", &token(TERMINATE_SCRIPT), terminate_script);
    add(&mut registry, "ret", &token(RETURN), ret);
    add(&mut registry, "wait", &token(WAIT), wait);
    add(&mut registry, "push", &token(PUSH), push);
    add(&mut registry, "pop", &token(POP), pop);
    add(&mut registry, "set_variable", &token(SET_VARIABLE), set_variable);
    for op in BinaryOp::ALL {
        add(&mut registry, op.name(), &token(op.opcode()), binary_arithmetic);
        add(&mut registry, "in_place_arithmetic", &token(op.in_place_opcode()), in_place_arithmetic);
    }
    for opcode in [NEGATE, BITWISE_NOT] {
        add(&mut registry, "unary_arithmetic", &token(opcode), unary_arithmetic);
    }
    for opcode in [INCREMENT, DECREMENT] {
        add(&mut registry, "incrementing_arithmetic", &token(opcode), incrementing_arithmetic);
    }
    for op in FunctionOp::all().filter(|op| op.arity() == 1) {
        add(&mut registry, op.name(), &token(op.opcode()), function);
    }
    for op in FunctionOp::all().filter(|op| op.arity() == 2) {
        add(&mut registry, op.name(), &token(op.opcode()), function);
    }
    add(&mut registry, "say", dialogue::SAY_PATTERN, dialogue::say);
    add(&mut registry, "set_animation", &token(SET_ANIMATION), set_animation);
    add(&mut registry, "wait_for_textbox", &token(WAIT_FOR_TEXTBOX), wait_for_textbox);
    add(&mut registry, "show_save_dialog", &token(SHOW_SAVE_DIALOG), show_save_dialog);
    add(&mut registry, "swap_screens", &token(SWAP_SCREENS), swap_screens);
    add(&mut registry, "unknown_command", "[0-9A-F]{4},", unknown_command);

    registry
}

lazy_static! {
    static ref BUILTIN: MatcherRegistry = builtin_registry();
}

/// The process-wide built-in registry, built on first use.
pub fn builtin() -> &'static MatcherRegistry {
    &BUILTIN
}
