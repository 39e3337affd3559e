//! Decompiler: command streams back to script source.
//!
//! A [`Decompiler`] is one decompile run. It remembers, per room, how many
//! text entries dialogue lines have already claimed, so the scripts of a room
//! must be decompiled in order; the room's language table is reconstructed
//! after its last script.

pub mod dialogue;
pub mod format;
pub mod handlers;
pub mod matcher;

use std::fmt;

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::command::{room_of, ChunkTriple, FEventChunk, Script, Subroutine};
use crate::config::ScriptConfig;
use crate::decompiler::format::{bytes_literal, fhex, raw_table_literal};
use crate::decompiler::handlers::has_shape;
use crate::decompiler::matcher::{script_chunk, MatchContext, MatcherRegistry};
use crate::error::ScriptError;
use crate::manager::ScriptManager;
use crate::opcodes::RETURN;
use crate::text::{padding_filler_len, LanguageTable, TableSlot, TextTable};

const INDENT: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineName {
    Index(usize),
    PostTable,
}

impl fmt::Display for SubroutineName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SubroutineName::Index(index) => write!(f, "{}", index),
            SubroutineName::PostTable => write!(f, "post_table"),
        }
    }
}

pub struct Decompiler<'a> {
    manager: &'a dyn ScriptManager,
    config: &'a ScriptConfig,
    registry: &'a MatcherRegistry,
    next_text_entry: IndexMap<u16, usize>,
}

impl<'a> Decompiler<'a> {
    /// A decompiler using the built-in rules.
    pub fn new(manager: &'a dyn ScriptManager, config: &'a ScriptConfig) -> Self {
        Self::with_registry(manager, config, handlers::builtin())
    }

    pub fn with_registry(
        manager: &'a dyn ScriptManager,
        config: &'a ScriptConfig,
        registry: &'a MatcherRegistry,
    ) -> Self {
        Decompiler {
            manager,
            config,
            registry,
            next_text_entry: IndexMap::new(),
        }
    }

    /// Forget which text entries have been claimed.
    pub fn reset(&mut self) {
        self.next_text_entry.clear();
    }

    /// Number of text entries of `room_id` claimed by dialogue lines so far.
    pub fn claimed_text_entries(&self, room_id: u16) -> usize {
        self.next_text_entry.get(&room_id).copied().unwrap_or(0)
    }

    pub fn decompile_subroutine(
        &mut self,
        subroutine: &Subroutine,
        chunks: &ChunkTriple,
        script_index: usize,
        name: SubroutineName,
    ) -> Result<String, ScriptError> {
        let mut processed = subroutine.clone();
        let has_return = match processed.commands.last() {
            Some(last) => last.opcode == RETURN && has_shape(last, 0, false),
            None => false,
        };
        if has_return {
            processed.commands.pop();
        }

        let mut options = Vec::new();
        if !has_return {
            options.push("no_return".to_string());
        }
        if !subroutine.footer.is_empty() {
            options.push(format!("footer={}", bytes_literal(&subroutine.footer)));
        }
        let mut text = format!("sub {}", name);
        if !options.is_empty() {
            text.push_str(&format!(" ({})", options.join(", ")));
        }

        if processed.commands.is_empty() {
            text.push_str(" {}");
            return Ok(text);
        }

        let next_text_entry = self
            .next_text_entry
            .entry(room_of(script_index))
            .or_insert(0);
        let mut context = MatchContext::new(
            self.manager,
            self.config,
            chunks,
            script_index,
            &processed,
            next_text_entry,
        )?;
        let body = self
            .registry
            .decompile_commands(&processed.commands, &mut context, INDENT)?;

        text.push_str(" {\n");
        text.push_str(&body);
        text.push_str("\n}");
        Ok(text)
    }

    /// Reconstruct script `script_index`, which must be stored in `chunks`.
    pub fn decompile_script(
        &mut self,
        chunks: &ChunkTriple,
        script_index: usize,
    ) -> Result<String, ScriptError> {
        let script: &Script = script_chunk(chunks, script_index)?;
        let mut sections = Vec::new();

        if !script.header.bytes.is_empty() {
            sections.push(format!("header {}", bytes_literal(&script.header.bytes)));
        }
        if let Some(post_table) = &script.post_table_subroutine {
            sections.push(self.decompile_subroutine(
                post_table,
                chunks,
                script_index,
                SubroutineName::PostTable,
            )?);
        }
        for (index, subroutine) in script.subroutines.iter().enumerate() {
            sections.push(self.decompile_subroutine(
                subroutine,
                chunks,
                script_index,
                SubroutineName::Index(index),
            )?);
        }

        let variant = script_index % 3;
        let last_script = (0..3).rev().find(|i| chunks.script(*i).is_some());
        if last_script == Some(variant) {
            if let Some(language_table) = chunks.language_table() {
                sections.extend(self.decompile_language_table(language_table)?);
            }
        }

        info!(
            "Decompiled script {} of room 0x{:04X} ({} subroutines)",
            variant,
            room_of(script_index),
            script.subroutines.len()
        );
        let mut text = sections.join("\n\n");
        text.push('\n');
        Ok(text)
    }

    /// Every script of a room, in chunk order.
    pub fn decompile_room(
        &mut self,
        room_id: u16,
        chunks: &ChunkTriple,
    ) -> Result<Vec<(usize, String)>, ScriptError> {
        let mut scripts = Vec::new();
        for variant in 0..3 {
            if chunks.script(variant).is_some() {
                let script_index = room_id as usize * 3 + variant;
                scripts.push((script_index, self.decompile_script(chunks, script_index)?));
            }
        }
        Ok(scripts)
    }

    /// Decompile every script of every room, carrying on past failures.
    pub fn decompile_rooms(
        &mut self,
        rooms: &IndexMap<u16, ChunkTriple>,
    ) -> Vec<(usize, Result<String, ScriptError>)> {
        let mut results = Vec::new();
        for (room_id, chunks) in rooms {
            for variant in 0..3 {
                if !matches!(chunks.chunk(variant), Some(FEventChunk::Script(_))) {
                    continue;
                }
                let script_index = *room_id as usize * 3 + variant;
                let result = self.decompile_script(chunks, script_index);
                if let Err(err) = &result {
                    warn!("Script 0x{:X}: {}", script_index, err);
                }
                results.push((script_index, result));
            }
        }
        results
    }

    /// Whether the padding table is exactly what compiling would regenerate.
    fn is_regenerated_padding(&self, language_table: &LanguageTable) -> bool {
        let padding_id = self.config.padding_table_id;
        if language_table.text_tables.len() != padding_id as usize + 1 {
            return false;
        }
        let filler = match language_table.slot(padding_id) {
            TableSlot::Raw(filler) => filler,
            _ => return false,
        };
        if filler.iter().any(|byte| *byte != 0) {
            return false;
        }
        let unpadded_len = self
            .manager
            .language_table_len(language_table)
            .saturating_sub(filler.len());
        filler.len() == padding_filler_len(unpadded_len, self.config.language_table_alignment)
    }

    fn decompile_text_table(table_id: u8, table: &TextTable) -> String {
        let mut text = format!("text_table({}, [", fhex(table_id as i64, 2));
        for entry in &table.entries {
            text.push_str(&format!("\n{}{},", INDENT, bytes_literal(entry)));
        }
        if !table.entries.is_empty() {
            text.push('\n');
        }
        text.push_str("], textbox_sizes=");
        match &table.textbox_sizes {
            Some(sizes) => {
                let sizes: Vec<String> = sizes
                    .iter()
                    .map(|(width, height)| format!("({}, {})", width, height))
                    .collect();
                text.push_str(&format!("[{}]", sizes.join(", ")));
            }
            None => text.push_str("none"),
        }
        text.push(')');
        text
    }

    fn decompile_language_table(
        &self,
        language_table: &LanguageTable,
    ) -> Result<Vec<String>, ScriptError> {
        self.config.validate()?;
        let room_id = language_table.room_id;
        let claimed = self.claimed_text_entries(room_id);
        let mut sections = Vec::new();
        let mut written_whole = Vec::new();

        if claimed != 0 {
            if let Some(first_language) = self.config.languages.values().next() {
                let entries = language_table.text_table(*first_language)?.entries.len();
                let (rebuilt, whole): (Vec<u8>, Vec<u8>) = self
                    .config
                    .languages
                    .values()
                    .copied()
                    .partition(|language_id| {
                        is_rebuilt_by_entries(language_table.slot(*language_id), entries)
                    });
                for language_id in &whole {
                    debug!(
                        "Room 0x{:04X}: text table 0x{:02X} differs from its entries, writing it whole",
                        room_id, language_id
                    );
                }

                // Leftover entries are registered into every language, so
                // render them from a table that holds them all.
                if let Some(stand_in) = rebuilt.first() {
                    let mut rendered = language_table.clone();
                    for language_id in &whole {
                        rendered.set(*language_id, language_table.slot(*stand_in).clone());
                    }
                    let lines = (claimed..entries)
                        .map(|index| {
                            format::text_entry(&rendered, index, self.config, self.manager, true)
                                .map(|entry| {
                                    format!("text_entry({})  // {}", entry, fhex(index as i64, 2))
                                })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    if !lines.is_empty() {
                        sections.push(lines.join("\n"));
                    }
                }
                written_whole = whole;
            }
        }

        for (table_id, slot) in language_table.text_tables.iter().enumerate() {
            let table_id = table_id as u8;
            if table_id == self.config.padding_table_id && self.is_regenerated_padding(language_table)
            {
                continue;
            }
            match slot {
                TableSlot::Text(table) => {
                    if self.config.is_language_table(table_id)
                        && claimed != 0
                        && !written_whole.contains(&table_id)
                    {
                        continue;
                    }
                    sections.push(Self::decompile_text_table(table_id, table));
                }
                TableSlot::Raw(bytes) => sections.push(format!(
                    "text_table({}, {})",
                    fhex(table_id as i64, 2),
                    raw_table_literal(bytes)
                )),
                TableSlot::Absent
                    if table_id == self.config.padding_table_id
                        || written_whole.contains(&table_id) =>
                {
                    sections.push(format!("text_table({}, none)", fhex(table_id as i64, 2)))
                }
                TableSlot::Absent => {}
            }
        }
        Ok(sections)
    }
}

/// Whether registering `entries` text entries would recreate `slot` exactly.
fn is_rebuilt_by_entries(slot: &TableSlot, entries: usize) -> bool {
    match slot {
        TableSlot::Text(table) => {
            table.entries.len() == entries
                && table.textbox_sizes.as_ref().map(|sizes| sizes.len()) == Some(entries)
        }
        _ => false,
    }
}
