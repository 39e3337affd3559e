//! Pattern-matching decompile engine.
//!
//! A subroutine's commands are projected onto a string of opcode tokens,
//! `"0096,01BA,01BD,0096,"`, and each [`CommandMatcher`] pattern is a regular
//! expression over that projection. At every cursor the rules are tried in
//! registration order; the first one whose pattern matches *and* whose
//! handler does not decline produces the source text for the matched run.

use log::{debug, warn};
use regex::Regex;

use crate::command::{room_of, ChunkTriple, Command, FEventChunk, Script, Subroutine};
use crate::config::ScriptConfig;
use crate::decompiler::format::indent;
use crate::error::ScriptError;
use crate::manager::ScriptManager;
use crate::text::LanguageTable;

/// Width of one opcode token in the projection, separator included.
const TOKEN_WIDTH: usize = 5;

/// What a handler made of a matched run.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched(String),
    /// Let the next rule try the same cursor.
    Declined,
}

/// Everything a handler may consult besides the matched commands.
pub struct MatchContext<'a> {
    pub manager: &'a dyn ScriptManager,
    pub config: &'a ScriptConfig,
    pub chunks: &'a ChunkTriple,
    pub script: &'a Script,
    pub script_index: usize,
    pub subroutine: &'a Subroutine,
    /// Next text entry of the room a dialogue line may claim as a literal.
    pub next_text_entry: &'a mut usize,
}

impl<'a> MatchContext<'a> {
    pub fn new(
        manager: &'a dyn ScriptManager,
        config: &'a ScriptConfig,
        chunks: &'a ChunkTriple,
        script_index: usize,
        subroutine: &'a Subroutine,
        next_text_entry: &'a mut usize,
    ) -> Result<Self, ScriptError> {
        let script = script_chunk(chunks, script_index)?;
        Ok(MatchContext {
            manager,
            config,
            chunks,
            script,
            script_index,
            subroutine,
            next_text_entry,
        })
    }

    pub fn room_id(&self) -> u16 {
        room_of(self.script_index)
    }

    /// The room's language table, which lives in the third chunk.
    pub fn language_table(&self) -> Result<&'a LanguageTable, ScriptError> {
        let chunks: &'a ChunkTriple = self.chunks;
        match chunks.chunk(2) {
            Some(FEventChunk::LanguageTable(table)) => Ok(table),
            other => Err(ScriptError::ChunkType {
                room_id: self.room_id(),
                chunk: 2,
                found: other.map(|chunk| chunk.kind()).unwrap_or("absent"),
            }),
        }
    }
}

/// The script chunk `script_index` refers to.
pub fn script_chunk(chunks: &ChunkTriple, script_index: usize) -> Result<&Script, ScriptError> {
    let variant = script_index % 3;
    match chunks.chunk(variant) {
        Some(FEventChunk::Script(script)) => Ok(script),
        other => Err(ScriptError::ChunkType {
            room_id: room_of(script_index),
            chunk: variant,
            found: other.map(|chunk| chunk.kind()).unwrap_or("absent"),
        }),
    }
}

/// Turns a matched run of commands into source text. The slice holds exactly
/// the matched commands; `start` is the index of the first one in the
/// subroutine.
pub type MatchHandler =
    fn(&[Command], &mut MatchContext<'_>, usize) -> Result<MatchOutcome, ScriptError>;

pub struct CommandMatcher {
    pub name: &'static str,
    pub pattern: Regex,
    pub handler: MatchHandler,
}

impl CommandMatcher {
    pub fn new(name: &'static str, pattern: &str, handler: MatchHandler) -> Result<Self, ScriptError> {
        let pattern = Regex::new(&format!("(?i)^(?:{})", pattern))?;
        Ok(CommandMatcher {
            name,
            pattern,
            handler,
        })
    }

    /// Number of commands this rule's pattern covers at the start of
    /// `projection`, if it matches a non-empty run.
    fn match_len(&self, projection: &str) -> Option<usize> {
        let found = self.pattern.find(projection)?;
        if found.end() == 0 {
            return None;
        }
        Some((found.end() + TOKEN_WIDTH - 1) / TOKEN_WIDTH)
    }
}

/// Ordered rule list. Registration order is priority order.
#[derive(Default)]
pub struct MatcherRegistry {
    matchers: Vec<CommandMatcher>,
}

impl MatcherRegistry {
    pub fn new() -> Self {
        MatcherRegistry {
            matchers: Vec::new(),
        }
    }

    pub fn register(
        &mut self,
        name: &'static str,
        pattern: &str,
        handler: MatchHandler,
    ) -> Result<(), ScriptError> {
        self.matchers.push(CommandMatcher::new(name, pattern, handler)?);
        Ok(())
    }

    pub fn matchers(&self) -> &[CommandMatcher] {
        &self.matchers
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Reconstruct `commands` as source lines, each prefixed with
    /// `line_prefix`.
    ///
    /// Fails with [`ScriptError::CommandsNotMatched`] at the first cursor no
    /// rule produces text for.
    pub fn decompile_commands(
        &self,
        commands: &[Command],
        context: &mut MatchContext<'_>,
        line_prefix: &str,
    ) -> Result<String, ScriptError> {
        let projection = project(commands);
        let mut output = Vec::new();
        let mut cursor = 0;

        'commands: while cursor < commands.len() {
            let remaining = &projection[cursor * TOKEN_WIDTH..];
            for matcher in &self.matchers {
                let count = match matcher.match_len(remaining) {
                    Some(count) => count.min(commands.len() - cursor),
                    None => continue,
                };
                let run = &commands[cursor..cursor + count];
                match (matcher.handler)(run, context, cursor)? {
                    MatchOutcome::Matched(text) => {
                        debug!(
                            "{}: matched {} command(s) at index {}",
                            matcher.name, count, cursor
                        );
                        output.push(indent(&text, line_prefix));
                        cursor += count;
                        continue 'commands;
                    }
                    MatchOutcome::Declined => {
                        debug!("{}: declined at index {}", matcher.name, cursor);
                    }
                }
            }

            warn!(
                "No rule matched opcode 0x{:04X} at index {} of script 0x{:X}",
                commands[cursor].opcode, cursor, context.script_index
            );
            return Err(ScriptError::CommandsNotMatched {
                subroutine: context.subroutine.clone(),
                index: cursor,
            });
        }

        Ok(output.join("\n"))
    }
}

/// `"XXXX,"` per command.
pub fn project(commands: &[Command]) -> String {
    commands
        .iter()
        .map(|command| format!("{:04X},", command.opcode))
        .collect()
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
