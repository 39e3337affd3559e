// Evaluation of parsed scripts against a compile session

use indexmap::IndexMap;
use log::debug;

use crate::command::ScriptHeader;
use crate::consts;
use crate::context::{Compiler, ScriptScope, SubroutineOptions};
use crate::dialogue::{Message, Say, ShowTextbox, Target, WaitFlag};
use crate::dsl::ast::*;
use crate::emitter::Emitter;
use crate::error::ScriptError;
use crate::opcodes::{BinaryOp, FunctionOp, UnaryOp};
use crate::text::{EntryDefinition, TableSlot, TextEntry, TextTable};
use crate::variable::{Operation, Value, Variable};

const TEXTBOX_PARAMETERS: [&str; 17] = [
    "target",
    "sound",
    "message",
    "bubble",
    "tail",
    "wait",
    "color",
    "width",
    "height",
    "tail_size",
    "tail_direction",
    "textbox_hoffset",
    "tail_hoffset",
    "hoffsets_arg",
    "res",
    "unk9",
    "unk14",
];

const SAY_PARAMETERS: [&str; 3] = ["anim", "post_anim", "force_wait_command"];

fn eval_error(message: impl Into<String>, line: usize) -> ScriptError {
    ScriptError::EvalError(message.into(), line)
}

pub fn to_value(expr: &Expr, line: usize) -> Result<Value, ScriptError> {
    match expr {
        Expr::Integer(value) => Ok(Value::Const(*value)),
        Expr::Boolean(value) => Ok(Value::from(*value)),
        Expr::SelfActor => Ok(Value::Const(consts::SELF_ACTOR)),
        Expr::Variable(number) => Ok(Value::Var(Variable(*number))),
        Expr::Constant { group, name } => consts::group(group)
            .and_then(|members| members.value_of(name))
            .map(Value::Const)
            .ok_or_else(|| eval_error(format!("Unknown constant {}.{}", group, name), line)),
        other => Err(eval_error(format!("Expected a value, found {:?}", other), line)),
    }
}

fn to_integer(expr: &Expr, line: usize) -> Result<i64, ScriptError> {
    match to_value(expr, line)? {
        Value::Const(value) => Ok(value),
        Value::Var(variable) => Err(eval_error(
            format!("Expected a constant, found {}", variable),
            line,
        )),
    }
}

fn to_byte(expr: &Expr, line: usize) -> Result<u8, ScriptError> {
    let value = to_integer(expr, line)?;
    u8::try_from(value).map_err(|_| eval_error(format!("{} does not fit in a byte", value), line))
}

fn to_bool(expr: &Expr, line: usize) -> Result<bool, ScriptError> {
    match expr {
        Expr::Boolean(value) => Ok(*value),
        other => Err(eval_error(format!("Expected true or false, found {:?}", other), line)),
    }
}

fn to_variable(expr: &Expr, line: usize) -> Result<Variable, ScriptError> {
    match expr {
        Expr::Variable(number) => Ok(Variable(*number)),
        other => Err(eval_error(format!("Expected a variable, found {:?}", other), line)),
    }
}

fn to_bytes(expr: &Expr, line: usize) -> Result<Vec<u8>, ScriptError> {
    match expr {
        Expr::Bytes(bytes) => Ok(bytes.clone()),
        other => Err(eval_error(format!("Expected a bytes literal, found {:?}", other), line)),
    }
}

fn to_size(expr: &Expr, line: usize) -> Result<(u8, u8), ScriptError> {
    match expr {
        Expr::Tuple(items) if items.len() == 2 => {
            Ok((to_byte(&items[0], line)?, to_byte(&items[1], line)?))
        }
        other => Err(eval_error(
            format!("Expected a (width, height) pair, found {:?}", other),
            line,
        )),
    }
}

fn to_text_entry(expr: &Expr, line: usize) -> Result<TextEntry, ScriptError> {
    match expr {
        Expr::Tuple(items) if items.len() == 2 => match &items[0] {
            Expr::String(text) => Ok(TextEntry::new(text.clone(), to_size(&items[1], line)?)),
            other => Err(eval_error(format!("Expected text, found {:?}", other), line)),
        },
        other => Err(eval_error(
            format!("Expected a (text, (width, height)) entry, found {:?}", other),
            line,
        )),
    }
}

/// `("text", (w, h))` or `{"en": ("text", (w, h)), ...}`.
pub fn to_entry(expr: &Expr, line: usize) -> Result<EntryDefinition, ScriptError> {
    match expr {
        Expr::Map(entries) => {
            let mut per_language = IndexMap::new();
            for (language, entry) in entries {
                if per_language
                    .insert(language.clone(), to_text_entry(entry, line)?)
                    .is_some()
                {
                    return Err(eval_error(format!("Language '{}' given twice", language), line));
                }
            }
            Ok(EntryDefinition::PerLanguage(per_language))
        }
        other => Ok(EntryDefinition::Single(to_text_entry(other, line)?)),
    }
}

fn to_message(expr: &Expr, line: usize) -> Result<Message, ScriptError> {
    match expr {
        Expr::Tuple(_) | Expr::Map(_) => Ok(Message::Entry(to_entry(expr, line)?)),
        other => Ok(Message::Index(to_value(other, line)?)),
    }
}

fn to_target(expr: &Expr, line: usize) -> Result<Target, ScriptError> {
    match expr {
        Expr::Tuple(items) if items.len() == 2 => Ok(Target::Position(
            to_value(&items[0], line)?,
            to_value(&items[1], line)?,
        )),
        other => Ok(Target::Actor(to_value(other, line)?)),
    }
}

fn to_wait(expr: &Expr, line: usize) -> Result<WaitFlag, ScriptError> {
    match expr {
        Expr::Boolean(wait) => Ok(WaitFlag::Bool(*wait)),
        other => Ok(WaitFlag::Raw(to_value(other, line)?)),
    }
}

/// The contents of a `text_table` statement.
fn to_slot(table: &Expr, sizes: Option<&Expr>, line: usize) -> Result<TableSlot, ScriptError> {
    match table {
        Expr::None => Ok(TableSlot::Absent),
        Expr::Bytes(bytes) => Ok(TableSlot::Raw(bytes.clone())),
        Expr::List(entries) => {
            let entries = entries
                .iter()
                .map(|entry| to_bytes(entry, line))
                .collect::<Result<Vec<_>, _>>()?;
            let textbox_sizes = match sizes {
                None | Some(Expr::None) => None,
                Some(Expr::List(sizes)) => Some(
                    sizes
                        .iter()
                        .map(|size| to_size(size, line))
                        .collect::<Result<Vec<_>, _>>()?,
                ),
                Some(other) => {
                    return Err(eval_error(
                        format!("Expected a list of textbox sizes, found {:?}", other),
                        line,
                    ))
                }
            };
            Ok(TableSlot::Text(TextTable::new(entries, textbox_sizes)))
        }
        other => Err(eval_error(
            format!("Expected a list of entries, bytes or none, found {:?}", other),
            line,
        )),
    }
}

fn to_operation(expr: &Expr, line: usize) -> Result<Operation, ScriptError> {
    match expr {
        Expr::Binary { op, left, right } => Ok(Operation::binary(
            *op,
            to_value(left, line)?,
            to_value(right, line)?,
        )),
        Expr::Unary { op, operand } => Ok(Operation::Unary(*op, to_value(operand, line)?)),
        other => Ok(Operation::set(to_value(other, line)?)),
    }
}

/// A call's arguments bound to parameter names.
struct CallArgs<'c> {
    call: &'c Call,
    bound: IndexMap<&'static str, &'c Expr>,
}

impl<'c> CallArgs<'c> {
    /// Positional arguments fill `parameters` in order; keywords must name
    /// one of them.
    fn bind(call: &'c Call, parameters: &[&'static str]) -> Result<Self, ScriptError> {
        let mut bound = IndexMap::new();
        let mut positional = 0;

        for argument in &call.arguments {
            let (name, expr) = match argument {
                Argument::Positional(expr) => {
                    let name = parameters.get(positional).copied().ok_or_else(|| {
                        eval_error(
                            format!(
                                "{}() takes at most {} positional arguments",
                                call.name,
                                parameters.len()
                            ),
                            call.line,
                        )
                    })?;
                    positional += 1;
                    (name, expr)
                }
                Argument::Keyword(keyword, expr) => {
                    let name = parameters
                        .iter()
                        .copied()
                        .find(|parameter| *parameter == keyword.as_str())
                        .ok_or_else(|| {
                            eval_error(
                                format!("{}() has no argument '{}'", call.name, keyword),
                                call.line,
                            )
                        })?;
                    (name, expr)
                }
            };
            if bound.insert(name, expr).is_some() {
                return Err(eval_error(
                    format!("{}() got '{}' twice", call.name, name),
                    call.line,
                ));
            }
        }

        Ok(CallArgs { call, bound })
    }

    fn line(&self) -> usize {
        self.call.line
    }

    fn get(&self, name: &str) -> Option<&'c Expr> {
        self.bound.get(name).copied()
    }

    fn required(&self, name: &str) -> Result<&'c Expr, ScriptError> {
        self.get(name).ok_or_else(|| {
            eval_error(
                format!("{}() is missing '{}'", self.call.name, name),
                self.call.line,
            )
        })
    }

    fn value(&self, name: &str) -> Result<Value, ScriptError> {
        to_value(self.required(name)?, self.line())
    }

    fn value_or(&self, name: &str, default: impl Into<Value>) -> Result<Value, ScriptError> {
        match self.get(name) {
            Some(expr) => to_value(expr, self.line()),
            None => Ok(default.into()),
        }
    }

    /// Absent and `none` both mean "not given".
    fn optional_value(&self, name: &str) -> Result<Option<Value>, ScriptError> {
        match self.get(name) {
            None | Some(Expr::None) => Ok(None),
            Some(expr) => to_value(expr, self.line()).map(Some),
        }
    }

    /// Absent means `default`; `none` means no animation at all.
    fn animation(&self, name: &str, default: i64) -> Result<Option<Value>, ScriptError> {
        match self.get(name) {
            None => Ok(Some(Value::Const(default))),
            Some(Expr::None) => Ok(None),
            Some(expr) => to_value(expr, self.line()).map(Some),
        }
    }

    fn variable(&self, name: &str) -> Result<Variable, ScriptError> {
        to_variable(self.required(name)?, self.line())
    }

    fn optional_variable(&self, name: &str) -> Result<Option<Variable>, ScriptError> {
        self.get(name)
            .map(|expr| to_variable(expr, self.line()))
            .transpose()
    }

    fn optional_integer(&self, name: &str) -> Result<Option<i64>, ScriptError> {
        match self.get(name) {
            None | Some(Expr::None) => Ok(None),
            Some(expr) => to_integer(expr, self.line()).map(Some),
        }
    }
}

fn build_textbox(args: &CallArgs<'_>) -> Result<ShowTextbox, ScriptError> {
    let line = args.line();
    let mut textbox = ShowTextbox::new(
        to_target(args.required("target")?, line)?,
        args.value("sound")?,
        to_message(args.required("message")?, line)?,
    );

    textbox.bubble = args.value_or("bubble", textbox.bubble)?;
    textbox.tail = args.value_or("tail", textbox.tail)?;
    if let Some(wait) = args.get("wait") {
        textbox.wait = to_wait(wait, line)?;
    }
    textbox.color = args.value_or("color", textbox.color)?;
    textbox.width = args.optional_value("width")?;
    textbox.height = args.optional_value("height")?;
    textbox.tail_size = args.value_or("tail_size", textbox.tail_size)?;
    textbox.tail_direction = args.optional_value("tail_direction")?;
    textbox.textbox_hoffset = args.optional_integer("textbox_hoffset")?;
    textbox.tail_hoffset = args.optional_integer("tail_hoffset")?;
    textbox.hoffsets_arg = args.optional_value("hoffsets_arg")?;
    textbox.res = args.optional_variable("res")?;
    textbox.unk9 = args.value_or("unk9", textbox.unk9)?;
    textbox.unk14 = args.value_or("unk14", textbox.unk14)?;
    Ok(textbox)
}

fn build_say(call: &Call) -> Result<Say, ScriptError> {
    let parameters: Vec<&'static str> = TEXTBOX_PARAMETERS
        .iter()
        .chain(SAY_PARAMETERS.iter())
        .copied()
        .collect();
    let args = CallArgs::bind(call, &parameters)?;
    Ok(Say {
        textbox: build_textbox(&args)?,
        anim: args.animation("anim", 0x01)?,
        post_anim: args.animation("post_anim", 0x03)?,
        force_wait_command: args
            .get("force_wait_command")
            .map(|expr| to_bool(expr, call.line))
            .transpose()?,
    })
}

/// `text_entry("text", (w, h))`, `text_entry(("text", (w, h)))` or
/// `text_entry({...})`.
fn build_text_entry(call: &Call) -> Result<EntryDefinition, ScriptError> {
    let args = CallArgs::bind(call, &["entry", "size"])?;
    match args.get("size") {
        Some(size) => match args.required("entry")? {
            Expr::String(text) => Ok(EntryDefinition::Single(TextEntry::new(
                text.clone(),
                to_size(size, call.line)?,
            ))),
            other => Err(eval_error(format!("Expected text, found {:?}", other), call.line)),
        },
        None => to_entry(args.required("entry")?, call.line),
    }
}

fn build_text_table(call: &Call) -> Result<(u8, TableSlot), ScriptError> {
    let args = CallArgs::bind(call, &["table_id", "table", "textbox_sizes"])?;
    let table_id = to_byte(args.required("table_id")?, call.line)?;
    let slot = to_slot(args.required("table")?, args.get("textbox_sizes"), call.line)?;
    Ok((table_id, slot))
}

fn run_call(sub: &mut Emitter<'_>, call: &Call) -> Result<(), ScriptError> {
    match call.name.as_str() {
        "terminate_script" => {
            CallArgs::bind(call, &[])?;
            sub.terminate_script();
        }
        "ret" => {
            CallArgs::bind(call, &[])?;
            sub.ret();
        }
        "wait" => {
            let args = CallArgs::bind(call, &["frames"])?;
            sub.wait(args.value("frames")?);
        }
        "push" => {
            let args = CallArgs::bind(call, &["value"])?;
            sub.push(args.value("value")?);
        }
        "pop" => {
            let args = CallArgs::bind(call, &["res"])?;
            sub.pop(args.variable("res")?);
        }
        "set_variable" => {
            let args = CallArgs::bind(call, &["value", "res"])?;
            sub.set_variable(args.value("value")?, args.variable("res")?);
        }
        "increment" => {
            let args = CallArgs::bind(call, &["res"])?;
            sub.increment(args.variable("res")?);
        }
        "decrement" => {
            let args = CallArgs::bind(call, &["res"])?;
            sub.decrement(args.variable("res")?);
        }
        "set_animation" => {
            let args = CallArgs::bind(call, &["actor", "animation", "unk3"])?;
            sub.set_animation(
                args.value("actor")?,
                args.value("animation")?,
                args.value_or("unk3", 0x01)?,
            );
        }
        "show_save_dialog" => {
            let args = CallArgs::bind(call, &["fade_in", "unk1", "unk2"])?;
            sub.show_save_dialog(
                args.value_or("fade_in", true)?,
                args.value_or("unk1", 0x00)?,
                args.value_or("unk2", 0x01)?,
            );
        }
        "swap_screens" => {
            CallArgs::bind(call, &[])?;
            sub.swap_screens();
        }
        "wait_for_textbox" => {
            let args = CallArgs::bind(call, &["unk1"])?;
            sub.wait_for_textbox(args.value_or("unk1", 0x00)?);
        }
        "show_textbox" => {
            let args = CallArgs::bind(call, &TEXTBOX_PARAMETERS)?;
            let textbox = build_textbox(&args)?;
            sub.show_textbox(&textbox)?;
        }
        "say" => {
            let say = build_say(call)?;
            sub.say(&say)?;
        }
        "emit_command" => {
            let args = CallArgs::bind(call, &["opcode", "arguments", "res"])?;
            let opcode = to_integer(args.required("opcode")?, call.line)?;
            let opcode = u16::try_from(opcode)
                .map_err(|_| eval_error(format!("Invalid opcode {}", opcode), call.line))?;
            let arguments = match args.get("arguments") {
                None => Vec::new(),
                Some(Expr::List(items)) => items
                    .iter()
                    .map(|item| to_value(item, call.line))
                    .collect::<Result<Vec<_>, _>>()?,
                Some(other) => {
                    return Err(eval_error(
                        format!("Expected a list of arguments, found {:?}", other),
                        call.line,
                    ))
                }
            };
            sub.emit(opcode, arguments, args.optional_variable("res")?);
        }
        "text_entry" => {
            let entry = build_text_entry(call)?;
            sub.text_entry(&entry)?;
        }
        "text_table" => {
            let (table_id, slot) = build_text_table(call)?;
            sub.text_table(table_id, slot);
        }
        name => run_arithmetic_call(sub, call, name)?,
    }
    Ok(())
}

/// Call-form arithmetic: `add(a, b, Var)`, `add_in_place(a, Var)`,
/// `negate(a, Var)` and the math functions.
fn run_arithmetic_call(sub: &mut Emitter<'_>, call: &Call, name: &str) -> Result<(), ScriptError> {
    if let Some(op) = name.strip_suffix("_in_place").and_then(BinaryOp::from_name) {
        let args = CallArgs::bind(call, &["value", "res"])?;
        sub.in_place(op, args.value("value")?, args.variable("res")?);
    } else if let Some(op) = BinaryOp::from_name(name) {
        let args = CallArgs::bind(call, &["a", "b", "res"])?;
        sub.binary(op, args.value("a")?, args.value("b")?, args.variable("res")?);
    } else if let Some(op) = UnaryOp::from_name(name) {
        let args = CallArgs::bind(call, &["value", "res"])?;
        sub.unary(op, args.value("value")?, args.variable("res")?);
    } else if let Some(op) = FunctionOp::from_name(name) {
        if op.arity() == 1 {
            let args = CallArgs::bind(call, &["a", "res"])?;
            sub.function(op, args.value("a")?, args.variable("res")?);
        } else {
            let args = CallArgs::bind(call, &["a", "b", "res"])?;
            sub.function2(op, args.value("a")?, args.value("b")?, args.variable("res")?);
        }
    } else {
        return Err(eval_error(format!("Unknown command '{}'", name), call.line));
    }
    Ok(())
}

fn run_statement(sub: &mut Emitter<'_>, statement: &Stmt) -> Result<(), ScriptError> {
    match statement {
        Stmt::Call(call) => run_call(sub, call)?,
        Stmt::Assign {
            target,
            value,
            line,
        } => {
            let operation = to_operation(value, *line)?;
            sub.assign(Variable(*target), operation);
        }
        Stmt::CompoundAssign {
            target,
            op,
            value,
            line,
        } => {
            let res = Variable(*target);
            match (op, value) {
                (BinaryOp::Add, Expr::Integer(1)) => {
                    sub.increment(res);
                }
                (BinaryOp::Subtract, Expr::Integer(1)) => {
                    sub.decrement(res);
                }
                _ => {
                    sub.in_place(*op, to_value(value, *line)?, res);
                }
            }
        }
    }
    Ok(())
}

fn run_block(sub: &mut Emitter<'_>, statements: &[Stmt]) -> Result<(), ScriptError> {
    for statement in statements {
        run_statement(sub, statement)?;
    }
    Ok(())
}

/// Statements allowed outside of any subroutine.
fn run_top_level(script: &mut ScriptScope<'_>, call: &Call) -> Result<(), ScriptError> {
    match call.name.as_str() {
        "text_entry" => {
            let entry = build_text_entry(call)?;
            script.text_entry(&entry)?;
        }
        "text_table" => {
            let (table_id, slot) = build_text_table(call)?;
            script.text_table(table_id, slot);
        }
        name => {
            return Err(eval_error(
                format!("'{}' is only allowed inside a subroutine", name),
                call.line,
            ))
        }
    }
    Ok(())
}

fn options_of(decl: &SubroutineDecl) -> SubroutineOptions {
    SubroutineOptions {
        no_return: decl.no_return,
        footer: decl.footer.clone().unwrap_or_default(),
    }
}

/// Compile `program` as script `script_index`.
pub fn compile_program(
    compiler: &mut Compiler<'_>,
    script_index: usize,
    program: &Program,
) -> Result<(), ScriptError> {
    let mut header = None;
    for item in &program.items {
        if let Item::Header(bytes, line) = item {
            if header.is_some() {
                return Err(eval_error("Script header given twice", *line));
            }
            header = Some(bytes.clone());
        }
    }

    compiler.with_script(
        script_index,
        ScriptHeader::new(header.unwrap_or_default()),
        |script| {
            let mut next_index = 0;
            for item in &program.items {
                match item {
                    Item::Header(..) => {}
                    Item::Subroutine(decl) => {
                        let options = options_of(decl);
                        match decl.name {
                            SubroutineName::PostTable => {
                                script.post_table_subroutine(options, |sub| {
                                    run_block(sub, &decl.body)
                                })?;
                            }
                            SubroutineName::Index(index) => {
                                if index != next_index {
                                    return Err(eval_error(
                                        format!(
                                            "Subroutine {} declared where {} was expected",
                                            index, next_index
                                        ),
                                        decl.line,
                                    ));
                                }
                                script.subroutine(options, |sub| run_block(sub, &decl.body))?;
                                next_index += 1;
                            }
                        }
                        debug!("Evaluated subroutine {:?} from line {}", decl.name, decl.line);
                    }
                    Item::Call(call) => run_top_level(script, call)?,
                }
            }
            Ok(())
        },
    )
}

#[cfg(test)]
#[path = "eval_tests.rs"]
mod tests;
