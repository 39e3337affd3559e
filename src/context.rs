//! Compile sessions.
//!
//! A [`Compiler`] owns everything one compile run accumulates: finished
//! scripts and the per-room text tables. Scripts are built inside
//! [`Compiler::with_script`], subroutines inside
//! [`ScriptScope::subroutine`]; each scope only exists for the duration of
//! its closure, so a subroutine can never be declared inside another one.

use indexmap::IndexMap;
use log::{debug, info};

use crate::command::{room_of, ChunkTriple, FEventChunk, Script, ScriptHeader, Subroutine};
use crate::config::ScriptConfig;
use crate::emitter::Emitter;
use crate::error::ScriptError;
use crate::manager::ScriptManager;
use crate::text::{EntryDefinition, LanguageTable, TableSlot, TextTableBuilder};

/// Per-subroutine options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubroutineOptions {
    /// Do not append the implicit trailing return.
    pub no_return: bool,
    pub footer: Vec<u8>,
}

impl SubroutineOptions {
    pub fn no_return() -> Self {
        SubroutineOptions {
            no_return: true,
            footer: Vec::new(),
        }
    }
}

/// Everything a compile run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    /// Scripts by script index, in compile order.
    pub scripts: IndexMap<usize, Script>,
    /// Finalized language tables by room id.
    pub language_tables: IndexMap<u16, LanguageTable>,
}

impl CompileOutput {
    /// Store the compiled scripts and language tables into their rooms'
    /// chunk triples. A room's old language table is replaced whenever one
    /// of its scripts was recompiled.
    pub fn install(self, rooms: &mut IndexMap<u16, ChunkTriple>) {
        for (index, script) in self.scripts {
            let triple = rooms.entry(room_of(index)).or_default();
            if matches!(triple.0[2], Some(FEventChunk::LanguageTable(_))) {
                triple.0[2] = None;
            }
            triple.0[index % 3] = Some(FEventChunk::Script(script));
        }

        for (room_id, language_table) in self.language_tables {
            let triple = rooms.entry(room_id).or_default();
            match &triple.0[2] {
                None | Some(FEventChunk::LanguageTable(_)) => {
                    triple.0[2] = Some(FEventChunk::LanguageTable(language_table));
                }
                Some(other) => debug!(
                    "Room 0x{:04X}: keeping {} in chunk 2",
                    room_id,
                    other.kind()
                ),
            }
        }
    }
}

pub struct Compiler<'m> {
    config: ScriptConfig,
    manager: &'m dyn ScriptManager,
    text_tables: TextTableBuilder,
    scripts: IndexMap<usize, Script>,
}

impl<'m> Compiler<'m> {
    pub fn new(config: ScriptConfig, manager: &'m dyn ScriptManager) -> Self {
        let text_tables = TextTableBuilder::new(&config);
        Compiler {
            config,
            manager,
            text_tables,
            scripts: IndexMap::new(),
        }
    }

    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }

    pub fn text_tables(&self) -> &TextTableBuilder {
        &self.text_tables
    }

    pub fn script(&self, index: usize) -> Option<&Script> {
        self.scripts.get(&index)
    }

    /// Build script `index` with `body`. The script is only recorded if the
    /// body succeeds.
    pub fn with_script<F>(
        &mut self,
        index: usize,
        header: ScriptHeader,
        body: F,
    ) -> Result<(), ScriptError>
    where
        F: FnOnce(&mut ScriptScope<'_>) -> Result<(), ScriptError>,
    {
        if self.scripts.contains_key(&index) {
            return Err(ScriptError::Configuration(format!(
                "script {} of room 0x{:04X} is compiled twice",
                index % 3,
                room_of(index)
            )));
        }

        let mut scope = ScriptScope {
            script: Script::new(index, header),
            text_tables: &mut self.text_tables,
            manager: self.manager,
            config: &self.config,
        };
        body(&mut scope)?;

        let script = scope.script;
        info!(
            "Compiled script {} of room 0x{:04X}: {} subroutines{}",
            index % 3,
            script.room_id(),
            script.subroutines.len(),
            if script.post_table_subroutine.is_some() {
                " and a post-table subroutine"
            } else {
                ""
            }
        );
        self.scripts.insert(index, script);
        Ok(())
    }

    /// Store a whole text table for `room_id` outside of any script.
    pub fn register_table(&mut self, room_id: u16, table_id: u8, slot: TableSlot) {
        self.text_tables.register_table(room_id, table_id, slot);
    }

    pub fn finish(self) -> Result<CompileOutput, ScriptError> {
        self.config.validate()?;
        let language_tables = self.text_tables.finalize(self.manager)?;
        Ok(CompileOutput {
            scripts: self.scripts,
            language_tables,
        })
    }
}

/// The script currently being built.
pub struct ScriptScope<'s> {
    script: Script,
    text_tables: &'s mut TextTableBuilder,
    manager: &'s dyn ScriptManager,
    config: &'s ScriptConfig,
}

impl<'s> ScriptScope<'s> {
    pub fn script_index(&self) -> usize {
        self.script.index
    }

    pub fn room_id(&self) -> u16 {
        self.script.room_id()
    }

    pub fn config(&self) -> &ScriptConfig {
        self.config
    }

    pub fn set_header(&mut self, header: ScriptHeader) {
        self.script.header = header;
    }

    fn build<F>(&mut self, options: SubroutineOptions, body: F) -> Result<Subroutine, ScriptError>
    where
        F: FnOnce(&mut Emitter<'_>) -> Result<(), ScriptError>,
    {
        let room_id = self.room_id();
        let mut subroutine = Subroutine::new(Vec::new());
        {
            let mut emitter = Emitter::new(
                &mut subroutine,
                room_id,
                &mut *self.text_tables,
                self.manager,
                self.config,
            );
            body(&mut emitter)?;
            if !options.no_return {
                emitter.ret();
            }
        }
        subroutine.footer = options.footer;
        Ok(subroutine)
    }

    /// Build the next subroutine and return its index.
    pub fn subroutine<F>(&mut self, options: SubroutineOptions, body: F) -> Result<usize, ScriptError>
    where
        F: FnOnce(&mut Emitter<'_>) -> Result<(), ScriptError>,
    {
        let subroutine = self.build(options, body)?;
        debug!(
            "Subroutine {} of script 0x{:X}: {} commands",
            self.script.subroutines.len(),
            self.script.index,
            subroutine.commands.len()
        );
        self.script.subroutines.push(subroutine);
        Ok(self.script.subroutines.len() - 1)
    }

    pub fn post_table_subroutine<F>(
        &mut self,
        options: SubroutineOptions,
        body: F,
    ) -> Result<(), ScriptError>
    where
        F: FnOnce(&mut Emitter<'_>) -> Result<(), ScriptError>,
    {
        if self.script.post_table_subroutine.is_some() {
            return Err(ScriptError::Configuration(
                "a script has at most one post-table subroutine".to_string(),
            ));
        }
        let subroutine = self.build(options, body)?;
        self.script.post_table_subroutine = Some(subroutine);
        Ok(())
    }

    /// Register a dialogue line in this script's room.
    pub fn text_entry(&mut self, entry: &EntryDefinition) -> Result<usize, ScriptError> {
        let room_id = self.room_id();
        self.text_tables.register_entry(room_id, entry, self.manager)
    }

    pub fn text_table(&mut self, table_id: u8, slot: TableSlot) {
        let room_id = self.room_id();
        self.text_tables.register_table(room_id, table_id, slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::{RETURN, WAIT};
    use crate::test_utils::MockManager;
    use crate::text::TextEntry;
    use crate::variable::Variable;
    use test_log::test;

    #[test]
    fn test_subroutines_get_implicit_return() {
        let manager = MockManager::new();
        let mut compiler = Compiler::new(ScriptConfig::default(), &manager);
        compiler
            .with_script(0x12, ScriptHeader::default(), |script| {
                script.subroutine(SubroutineOptions::default(), |sub| {
                    sub.wait(10);
                    Ok(())
                })?;
                script.subroutine(SubroutineOptions::no_return(), |sub| {
                    sub.pop(Variable(0x1000));
                    Ok(())
                })?;
                Ok(())
            })
            .unwrap();

        let script = compiler.script(0x12).unwrap();
        assert_eq!(script.room_id(), 6);
        let opcodes: Vec<u16> = script.subroutines[0]
            .commands
            .iter()
            .map(|command| command.opcode)
            .collect();
        assert_eq!(opcodes, vec![WAIT, RETURN]);
        assert_eq!(script.subroutines[1].commands.len(), 1);
    }

    #[test]
    fn test_failed_script_is_not_recorded() {
        let manager = MockManager::new();
        let mut compiler = Compiler::new(ScriptConfig::default(), &manager);
        let result = compiler.with_script(3, ScriptHeader::default(), |script| {
            script.subroutine(SubroutineOptions::default(), |_| {
                Err(ScriptError::Configuration("boom".to_string()))
            })?;
            Ok(())
        });
        assert!(result.is_err());
        assert!(compiler.script(3).is_none());
    }

    #[test]
    fn test_script_compiled_twice_is_rejected() {
        let manager = MockManager::new();
        let mut compiler = Compiler::new(ScriptConfig::default(), &manager);
        compiler
            .with_script(3, ScriptHeader::default(), |_| Ok(()))
            .unwrap();
        let result = compiler.with_script(3, ScriptHeader::default(), |_| Ok(()));
        assert!(matches!(result, Err(ScriptError::Configuration(_))));
    }

    #[test]
    fn test_second_post_table_subroutine_is_rejected() {
        let manager = MockManager::new();
        let mut compiler = Compiler::new(ScriptConfig::default(), &manager);
        let result = compiler.with_script(0, ScriptHeader::default(), |script| {
            script.post_table_subroutine(SubroutineOptions::default(), |_| Ok(()))?;
            script.post_table_subroutine(SubroutineOptions::default(), |_| Ok(()))
        });
        assert!(matches!(result, Err(ScriptError::Configuration(_))));
    }

    #[test]
    fn test_finish_rejects_zero_alignment() {
        let manager = MockManager::new();
        let config = ScriptConfig {
            language_table_alignment: 0,
            ..ScriptConfig::default()
        };
        let mut compiler = Compiler::new(config, &manager);
        compiler
            .with_script(0x0C, ScriptHeader::default(), |script| {
                script.text_entry(&TextEntry::new("Hi", (2, 1)).into())?;
                Ok(())
            })
            .unwrap();
        assert!(matches!(compiler.finish(), Err(ScriptError::Config(_))));
    }

    #[test]
    fn test_install_replaces_language_table() {
        let manager = MockManager::new();
        let mut compiler = Compiler::new(ScriptConfig::default(), &manager);
        compiler
            .with_script(4, ScriptHeader::new(vec![1, 2]), |script| {
                script.text_entry(&TextEntry::new("Hi", (2, 1)).into())?;
                Ok(())
            })
            .unwrap();
        let output = compiler.finish().unwrap();

        let mut rooms = IndexMap::new();
        rooms.insert(
            1,
            ChunkTriple::new([
                Some(FEventChunk::Raw(vec![9])),
                None,
                Some(FEventChunk::LanguageTable(LanguageTable::new(1))),
            ]),
        );
        output.install(&mut rooms);

        let triple = &rooms[&1];
        assert_eq!(triple.chunk(0), Some(&FEventChunk::Raw(vec![9])));
        assert_eq!(triple.script(1).map(|script| script.index), Some(4));
        let language_table = triple.language_table().unwrap();
        assert_eq!(language_table.text_table(0x44).unwrap().entries.len(), 1);
    }
}
