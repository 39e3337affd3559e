// Literal rendering for reconstructed script source

use std::fmt::Write;

use crate::config::ScriptConfig;
use crate::consts::ConstGroup;
use crate::error::ScriptError;
use crate::manager::ScriptManager;
use crate::text::LanguageTable;
use crate::variable::{Value, Variable};

/// Hex with a sign in front of the prefix: `fhex(-5, 2)` is `-0x05`.
pub fn fhex(value: i64, width: usize) -> String {
    format!(
        "{}0x{:0width$X}",
        if value < 0 { "-" } else { "" },
        value.unsigned_abs(),
        width = width
    )
}

pub fn fhex_byte(value: i64) -> String {
    fhex(value, 2)
}

pub fn fhex_short(value: i64) -> String {
    fhex(value, 4)
}

pub fn fhex_int(value: i64) -> String {
    fhex(value, 8)
}

pub fn fhex_bare(value: i64) -> String {
    fhex(value, 0)
}

pub fn decimal(value: i64) -> String {
    value.to_string()
}

pub fn variable(variable: Variable) -> String {
    variable.to_string()
}

/// Render a command argument, formatting immediates with `const_formatter`.
pub fn value(value: &Value, const_formatter: impl Fn(i64) -> String) -> String {
    match value {
        Value::Const(constant) => const_formatter(*constant),
        Value::Var(var) => variable(*var),
    }
}

/// `Group.NAME` for a known member, `fallback` otherwise.
pub fn enum_value(group: &ConstGroup, value: i64, fallback: impl Fn(i64) -> String) -> String {
    match group.name_of(value) {
        Some(name) => format!("{}.{}", group.name, name),
        None => fallback(value),
    }
}

pub fn enum_or_variable(
    group: &ConstGroup,
    argument: &Value,
    fallback: impl Fn(i64) -> String,
) -> String {
    value(argument, |constant| enum_value(group, constant, &fallback))
}

/// `true`/`false` for 1 and 0.
pub fn bool_or_value(argument: &Value, const_formatter: impl Fn(i64) -> String) -> String {
    match argument {
        Value::Const(0) => "false".to_string(),
        Value::Const(1) => "true".to_string(),
        other => value(other, const_formatter),
    }
}

pub fn string_literal(text: &str) -> String {
    let mut literal = String::with_capacity(text.len() + 2);
    literal.push('"');
    for ch in text.chars() {
        match ch {
            '"' => literal.push_str("\\\""),
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            '\t' => literal.push_str("\\t"),
            '\r' => literal.push_str("\\r"),
            ch if ch.is_control() && (ch as u32) <= 0xFF => {
                let _ = write!(literal, "\\x{:02X}", ch as u32);
            }
            ch if ch.is_control() => {
                let _ = write!(literal, "\\u{{{:X}}}", ch as u32);
            }
            ch => literal.push(ch),
        }
    }
    literal.push('"');
    literal
}

pub fn bytes_literal(bytes: &[u8]) -> String {
    let mut literal = String::with_capacity(bytes.len() + 3);
    literal.push_str("b\"");
    for byte in bytes {
        match byte {
            b'"' => literal.push_str("\\\""),
            b'\\' => literal.push_str("\\\\"),
            0x20..=0x7E => literal.push(*byte as char),
            _ => {
                let _ = write!(literal, "\\x{:02X}", byte);
            }
        }
    }
    literal.push('"');
    literal
}

/// Like [`bytes_literal`], but a run of one repeated byte becomes
/// `b"\x00" * n`.
pub fn raw_table_literal(bytes: &[u8]) -> String {
    match bytes.first() {
        Some(first) if bytes.len() > 1 && bytes.iter().all(|byte| byte == first) => {
            format!("{} * {}", bytes_literal(&bytes[..1]), bytes.len())
        }
        _ => bytes_literal(bytes),
    }
}

fn entry_of(
    language_table: &LanguageTable,
    language_id: u8,
    index: usize,
) -> Result<(&[u8], (u8, u8)), ScriptError> {
    let missing = || ScriptError::MissingTextEntry {
        room_id: language_table.room_id,
        language_id,
        index,
    };
    let table = language_table.text_table(language_id)?;
    let entry = table.entries.get(index).ok_or_else(missing)?;
    let size = table
        .textbox_sizes
        .as_ref()
        .and_then(|sizes| sizes.get(index))
        .ok_or_else(missing)?;
    Ok((entry.as_slice(), *size))
}

fn entry_literal(manager: &dyn ScriptManager, entry: &[u8], size: (u8, u8)) -> String {
    format!(
        "{}, ({}, {})",
        string_literal(&manager.decode_text(entry)),
        size.0,
        size.1
    )
}

/// Render text entry `index` of every configured language.
///
/// When all languages agree the result is `("text", (w, h))`, or the bare
/// `"text", (w, h)` argument pair when `implicit` is set. Otherwise it is a
/// per-language map spanning several lines.
pub fn text_entry(
    language_table: &LanguageTable,
    index: usize,
    config: &ScriptConfig,
    manager: &dyn ScriptManager,
    implicit: bool,
) -> Result<String, ScriptError> {
    let mut entries = Vec::with_capacity(config.languages.len());
    for (language_name, language_id) in &config.languages {
        let (entry, size) = entry_of(language_table, *language_id, index)?;
        entries.push((language_name, entry, size));
    }

    let all_equal = entries
        .windows(2)
        .all(|pair| pair[0].1 == pair[1].1 && pair[0].2 == pair[1].2);
    match entries.first() {
        Some((_, entry, size)) if all_equal => {
            let literal = entry_literal(manager, entry, *size);
            if implicit {
                Ok(literal)
            } else {
                Ok(format!("({})", literal))
            }
        }
        _ => {
            let mut literal = String::from("{\n");
            for (language_name, entry, size) in entries {
                let _ = writeln!(
                    literal,
                    "    {}: ({}),",
                    string_literal(language_name),
                    entry_literal(manager, entry, size)
                );
            }
            literal.push('}');
            Ok(literal)
        }
    }
}

/// Prefix every non-empty line of `text` with `prefix`.
pub fn indent(text: &str, prefix: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", prefix, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
