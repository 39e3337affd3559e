//! Text and language tables.
//!
//! Every room owns one [`LanguageTable`], a sparse list of tables indexed by
//! table id. Dialogue text lives in one [`TextTable`] per configured language
//! and the same entry index must refer to the same line in every language,
//! so entries are always appended to all language tables at once.

use indexmap::IndexMap;
use log::debug;

use crate::config::ScriptConfig;
use crate::error::ScriptError;
use crate::manager::ScriptManager;

/// One dialogue line in one language.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEntry {
    pub text: String,
    pub textbox_size: (u8, u8),
}

impl TextEntry {
    pub fn new(text: impl Into<String>, textbox_size: (u8, u8)) -> Self {
        TextEntry {
            text: text.into(),
            textbox_size,
        }
    }
}

/// A dialogue line as written in a script: either the same text for every
/// language, or per-language text where missing languages fall back to the
/// default language.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryDefinition {
    Single(TextEntry),
    PerLanguage(IndexMap<String, TextEntry>),
}

impl From<TextEntry> for EntryDefinition {
    fn from(entry: TextEntry) -> Self {
        EntryDefinition::Single(entry)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextTable {
    pub entries: Vec<Vec<u8>>,
    pub textbox_sizes: Option<Vec<(u8, u8)>>,
}

impl TextTable {
    pub fn new(entries: Vec<Vec<u8>>, textbox_sizes: Option<Vec<(u8, u8)>>) -> Self {
        TextTable {
            entries,
            textbox_sizes,
        }
    }

    /// An empty dialogue table, which tracks textbox sizes.
    pub fn dialogue() -> Self {
        TextTable {
            entries: Vec::new(),
            textbox_sizes: Some(Vec::new()),
        }
    }
}

/// Content of one table id within a language table.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TableSlot {
    Text(TextTable),
    Raw(Vec<u8>),
    #[default]
    Absent,
}

impl TableSlot {
    pub fn kind(&self) -> &'static str {
        match self {
            TableSlot::Text(_) => "a text table",
            TableSlot::Raw(_) => "raw bytes",
            TableSlot::Absent => "absent",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanguageTable {
    pub room_id: u16,
    pub text_tables: Vec<TableSlot>,
}

impl LanguageTable {
    pub fn new(room_id: u16) -> Self {
        LanguageTable {
            room_id,
            text_tables: Vec::new(),
        }
    }

    pub fn slot(&self, table_id: u8) -> &TableSlot {
        static ABSENT: TableSlot = TableSlot::Absent;
        self.text_tables.get(table_id as usize).unwrap_or(&ABSENT)
    }

    /// The text table at `table_id`, failing if the slot holds anything else.
    pub fn text_table(&self, table_id: u8) -> Result<&TextTable, ScriptError> {
        match self.slot(table_id) {
            TableSlot::Text(table) => Ok(table),
            other => Err(ScriptError::TableType {
                room_id: self.room_id,
                table_id,
                expected: "a text table",
                found: other.kind(),
            }),
        }
    }

    /// Store `slot` at `table_id`, growing the table list with absent slots.
    pub fn set(&mut self, table_id: u8, slot: TableSlot) {
        let index = table_id as usize;
        if self.text_tables.len() <= index {
            self.text_tables.resize(index + 1, TableSlot::Absent);
        }
        self.text_tables[index] = slot;
    }
}

/// Filler length that brings a language table measuring `unpadded_len`
/// bytes (with an empty filler) to a multiple of `alignment`. Always at
/// least one byte.
pub fn padding_filler_len(unpadded_len: usize, alignment: usize) -> usize {
    (alignment - (unpadded_len + 1) % alignment) % alignment + 1
}

/// Accumulates per-room tables over a whole compile run.
#[derive(Debug, Clone)]
pub struct TextTableBuilder {
    languages: IndexMap<String, u8>,
    default_language: String,
    padding_table_id: u8,
    alignment: usize,
    rooms: IndexMap<u16, IndexMap<u8, TableSlot>>,
}

impl TextTableBuilder {
    pub fn new(config: &ScriptConfig) -> Self {
        TextTableBuilder {
            languages: config.languages.clone(),
            default_language: config.default_language.clone(),
            padding_table_id: config.padding_table_id,
            alignment: config.language_table_alignment,
            rooms: IndexMap::new(),
        }
    }

    /// Store a whole table for `room`. Last write wins.
    pub fn register_table(&mut self, room_id: u16, table_id: u8, slot: TableSlot) {
        let previous = self
            .rooms
            .entry(room_id)
            .or_default()
            .insert(table_id, slot);
        if previous.is_some() {
            debug!(
                "Replacing text table 0x{:02X} of room 0x{:04X}",
                table_id, room_id
            );
        }
    }

    /// Append one entry to every language table of `room` and return its
    /// index.
    ///
    /// Nothing is appended unless every language table can take the entry at
    /// the same index.
    pub fn register_entry(
        &mut self,
        room_id: u16,
        entry: &EntryDefinition,
        manager: &dyn ScriptManager,
    ) -> Result<usize, ScriptError> {
        let mut encoded = Vec::with_capacity(self.languages.len());
        for (language_name, language_id) in &self.languages {
            let language_entry = match entry {
                EntryDefinition::Single(single) => single,
                EntryDefinition::PerLanguage(per_language) => per_language
                    .get(language_name)
                    .or_else(|| per_language.get(&self.default_language))
                    .ok_or_else(|| {
                        ScriptError::Configuration(format!(
                            "text entry has neither a '{}' nor a default '{}' version",
                            language_name, self.default_language
                        ))
                    })?,
            };
            encoded.push((
                *language_id,
                manager.encode_text(&language_entry.text)?,
                language_entry.textbox_size,
            ));
        }

        let tables = self.rooms.entry(room_id).or_default();
        let mut entry_index: Option<usize> = None;
        for (language_id, _, _) in &encoded {
            let length = match tables.get(language_id) {
                None => 0,
                Some(TableSlot::Text(table)) => table.entries.len(),
                Some(other) => {
                    return Err(ScriptError::TableType {
                        room_id,
                        table_id: *language_id,
                        expected: "a text table",
                        found: other.kind(),
                    })
                }
            };
            match entry_index {
                None => entry_index = Some(length),
                Some(expected) if expected != length => {
                    return Err(ScriptError::TextTableLength {
                        language_id: *language_id,
                        length,
                        expected,
                    })
                }
                Some(_) => {}
            }
        }

        for (language_id, bytes, textbox_size) in encoded {
            let slot = tables.entry(language_id).or_insert_with(|| {
                debug!(
                    "Creating text table 0x{:02X} for room 0x{:04X}",
                    language_id, room_id
                );
                TableSlot::Text(TextTable::dialogue())
            });
            if let TableSlot::Text(table) = slot {
                table.entries.push(bytes);
                if let Some(sizes) = table.textbox_sizes.as_mut() {
                    sizes.push(textbox_size);
                }
            }
        }

        Ok(entry_index.unwrap_or(0))
    }

    pub fn rooms(&self) -> impl Iterator<Item = u16> + '_ {
        self.rooms.keys().copied()
    }

    pub fn tables(&self, room_id: u16) -> Option<&IndexMap<u8, TableSlot>> {
        self.rooms.get(&room_id)
    }

    /// Build the language table of every room touched, sizing each padding
    /// table so the serialized result is aligned.
    pub fn finalize(
        &self,
        manager: &dyn ScriptManager,
    ) -> Result<IndexMap<u16, LanguageTable>, ScriptError> {
        let mut language_tables = IndexMap::new();
        for (room_id, tables) in &self.rooms {
            let mut language_table = LanguageTable::new(*room_id);
            for (table_id, slot) in tables {
                language_table.set(*table_id, slot.clone());
            }

            if language_table.text_tables.len() <= self.padding_table_id as usize {
                language_table.set(self.padding_table_id, TableSlot::Raw(Vec::new()));
                let unpadded_len = manager.language_table_len(&language_table);
                let filler_len = padding_filler_len(unpadded_len, self.alignment);
                debug!(
                    "Room 0x{:04X}: language table is {} bytes, padding with {}",
                    room_id, unpadded_len, filler_len
                );
                language_table.set(self.padding_table_id, TableSlot::Raw(vec![0; filler_len]));
            }

            language_tables.insert(*room_id, language_table);
        }
        Ok(language_tables)
    }
}

#[cfg(test)]
#[path = "text_tests.rs"]
mod tests;
