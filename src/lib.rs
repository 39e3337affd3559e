//! Compiler and decompiler for FEvent event scripts.
//!
//! Scripts are written in a small source language ([`dsl`]) and compiled
//! through a [`Compiler`] session into [`Script`]s and per-room
//! [`LanguageTable`]s. The [`Decompiler`] turns them back into source that
//! recompiles to identical commands and tables.

#[macro_use]
extern crate lazy_static;

pub mod command;
pub mod config;
pub mod consts;
pub mod context;
pub mod decompiler;
pub mod dialogue;
pub mod dsl;
pub mod emitter;
pub mod error;
pub mod manager;
pub mod opcodes;
pub mod text;
pub mod variable;

#[cfg(test)]
mod test_utils;

pub use command::{ChunkTriple, Command, FEventChunk, Script, ScriptHeader, Subroutine};
pub use config::ScriptConfig;
pub use context::{CompileOutput, Compiler, ScriptScope, SubroutineOptions};
pub use decompiler::Decompiler;
pub use emitter::Emitter;
pub use error::ScriptError;
pub use manager::{ParameterType, ScriptManager};
pub use text::{LanguageTable, TableSlot, TextTable};
pub use variable::{Operation, Value, Variable};
