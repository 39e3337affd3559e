// Script Error Handling

use std::fmt;

use crate::command::Subroutine;
use crate::decompiler::format::fhex;

#[derive(Debug, Clone)]
pub enum ScriptError {
    // Emission errors
    Configuration(String),

    // Text table errors
    TextTableLength {
        language_id: u8,
        length: usize,
        expected: usize,
    },
    TableType {
        room_id: u16,
        table_id: u8,
        expected: &'static str,
        found: &'static str,
    },
    MissingTextEntry {
        room_id: u16,
        language_id: u8,
        index: usize,
    },
    Encoding(String),

    // Decompilation errors
    ChunkType {
        room_id: u16,
        chunk: usize,
        found: &'static str,
    },
    CommandsNotMatched {
        subroutine: Subroutine,
        index: usize,
    },
    Pattern(String),

    // DSL reader errors
    LexicalError(String, usize), // message, line
    UnexpectedCharacter(char, usize),
    UnterminatedString(usize),
    ParseError(String, usize), // message, line
    ExpectedToken(String, String, usize), // expected, found, line
    EvalError(String, usize), // message, line

    // Configuration loading
    Config(String),
}

impl ScriptError {
    /// Command index a decompilation stall happened at, if this is one.
    pub fn unmatched_index(&self) -> Option<usize> {
        match self {
            ScriptError::CommandsNotMatched { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScriptError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ScriptError::TextTableLength {
                language_id,
                length,
                expected,
            } => write!(
                f,
                "all text tables must have the same length but table {} has a length of {} instead of {}",
                fhex(*language_id as i64, 2),
                length,
                expected
            ),
            ScriptError::TableType {
                room_id,
                table_id,
                expected,
                found,
            } => write!(
                f,
                "text table {} of room {} must be {}, not {}",
                fhex(*table_id as i64, 2),
                fhex(*room_id as i64, 4),
                expected,
                found
            ),
            ScriptError::MissingTextEntry {
                room_id,
                language_id,
                index,
            } => write!(
                f,
                "text table {} of room {} has no entry {}",
                fhex(*language_id as i64, 2),
                fhex(*room_id as i64, 4),
                fhex(*index as i64, 2)
            ),
            ScriptError::Encoding(msg) => write!(f, "Text encoding error: {}", msg),
            ScriptError::ChunkType {
                room_id,
                chunk,
                found,
            } => write!(
                f,
                "chunk {} of room {} is not the expected kind, but rather {}",
                chunk,
                fhex(*room_id as i64, 4),
                found
            ),
            ScriptError::CommandsNotMatched { subroutine, index } => {
                match subroutine.commands.get(*index) {
                    Some(command) => write!(
                        f,
                        "no command matcher accepted {} (at index {})",
                        fhex(command.opcode as i64, 4),
                        index
                    ),
                    None => write!(f, "no command matcher accepted index {}", index),
                }
            }
            ScriptError::Pattern(msg) => write!(f, "Invalid command pattern: {}", msg),
            ScriptError::LexicalError(msg, line) => {
                write!(f, "Lexical error on line {}: {}", line, msg)
            }
            ScriptError::UnexpectedCharacter(ch, line) => {
                write!(f, "Unexpected character '{}' on line {}", ch, line)
            }
            ScriptError::UnterminatedString(line) => {
                write!(f, "Unterminated string starting on line {}", line)
            }
            ScriptError::ParseError(msg, line) => {
                write!(f, "Parse error on line {}: {}", line, msg)
            }
            ScriptError::ExpectedToken(expected, found, line) => write!(
                f,
                "Expected {} but found {} on line {}",
                expected, found, line
            ),
            ScriptError::EvalError(msg, line) => write!(f, "Error on line {}: {}", line, msg),
            ScriptError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ScriptError {}

impl From<regex::Error> for ScriptError {
    fn from(err: regex::Error) -> Self {
        ScriptError::Pattern(err.to_string())
    }
}

impl From<toml::de::Error> for ScriptError {
    fn from(err: toml::de::Error) -> Self {
        ScriptError::Config(err.to_string())
    }
}
