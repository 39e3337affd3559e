// Test utilities: a stand-in for the binary-object layer
use indexmap::IndexMap;

use crate::manager::{ParameterType, ScriptManager};
use crate::text::{LanguageTable, TableSlot};

pub struct MockManager {
    pub parameter_types: IndexMap<u16, Vec<ParameterType>>,
}

impl MockManager {
    pub fn new() -> Self {
        let mut parameter_types = IndexMap::new();
        parameter_types.insert(0x0004, vec![ParameterType::U16]);
        parameter_types.insert(
            0x0096,
            vec![ParameterType::I8, ParameterType::U8, ParameterType::U8],
        );
        parameter_types.insert(0x0123, vec![ParameterType::U8, ParameterType::I16, ParameterType::U32]);
        MockManager { parameter_types }
    }
}

impl ScriptManager for MockManager {
    fn parameter_types(&self, opcode: u16) -> Option<&[ParameterType]> {
        self.parameter_types.get(&opcode).map(|types| types.as_slice())
    }

    // 4-byte offset per slot plus an end offset, entries NUL-terminated,
    // two bytes per textbox size.
    fn language_table_len(&self, table: &LanguageTable) -> usize {
        let mut len = 4 * (table.text_tables.len() + 1);
        for slot in &table.text_tables {
            len += match slot {
                TableSlot::Text(text_table) => {
                    let entries: usize = text_table.entries.iter().map(|e| 4 + e.len() + 1).sum();
                    let sizes = text_table
                        .textbox_sizes
                        .as_ref()
                        .map(|sizes| 2 * sizes.len())
                        .unwrap_or(0);
                    entries + sizes
                }
                TableSlot::Raw(bytes) => bytes.len(),
                TableSlot::Absent => 0,
            };
        }
        len
    }
}
