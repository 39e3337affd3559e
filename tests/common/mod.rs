// Shared helpers for the integration tests
#![allow(dead_code)]

use indexmap::IndexMap;

use fevent_script::dsl::compile_source;
use fevent_script::{
    ChunkTriple, Compiler, Decompiler, LanguageTable, ParameterType, ScriptConfig, ScriptError,
    ScriptManager, TableSlot,
};

/// Binary-object layer stand-in with a fixed serialization model: an 8-byte
/// table header, a 4-byte offset per slot, entries NUL-terminated behind a
/// 2-byte length, two bytes per textbox size.
pub struct TestManager {
    parameter_types: IndexMap<u16, Vec<ParameterType>>,
}

impl TestManager {
    pub fn new() -> Self {
        let mut parameter_types = IndexMap::new();
        parameter_types.insert(0x0004, vec![ParameterType::U16]);
        parameter_types.insert(
            0x0096,
            vec![ParameterType::I8, ParameterType::U8, ParameterType::U8],
        );
        parameter_types.insert(
            0x0123,
            vec![ParameterType::U8, ParameterType::I16, ParameterType::U32],
        );
        TestManager { parameter_types }
    }
}

impl ScriptManager for TestManager {
    fn parameter_types(&self, opcode: u16) -> Option<&[ParameterType]> {
        self.parameter_types.get(&opcode).map(|types| types.as_slice())
    }

    fn language_table_len(&self, table: &LanguageTable) -> usize {
        let mut len = 8 + 4 * table.text_tables.len();
        for slot in &table.text_tables {
            len += match slot {
                TableSlot::Text(text_table) => {
                    let entries: usize =
                        text_table.entries.iter().map(|entry| 2 + entry.len() + 1).sum();
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

/// Compile each `(script index, source)` pair in one session and install the
/// result into fresh rooms.
pub fn compile_rooms(
    manager: &TestManager,
    sources: &[(usize, String)],
) -> Result<IndexMap<u16, ChunkTriple>, ScriptError> {
    let mut compiler = Compiler::new(ScriptConfig::default(), manager);
    for (script_index, source) in sources {
        compile_source(&mut compiler, *script_index, source)?;
    }
    let mut rooms = IndexMap::new();
    compiler.finish()?.install(&mut rooms);
    Ok(rooms)
}

/// Decompile every room in order with one decompiler.
pub fn decompile_rooms(
    manager: &TestManager,
    rooms: &IndexMap<u16, ChunkTriple>,
) -> Result<Vec<(usize, String)>, ScriptError> {
    let config = ScriptConfig::default();
    let mut decompiler = Decompiler::new(manager, &config);
    let mut sources = Vec::new();
    for (room_id, chunks) in rooms {
        sources.extend(decompiler.decompile_room(*room_id, chunks)?);
    }
    Ok(sources)
}

pub fn sources(scripts: &[(usize, &str)]) -> Vec<(usize, String)> {
    scripts
        .iter()
        .map(|(script_index, source)| (*script_index, source.to_string()))
        .collect()
}
