//! Script source language.
//!
//! The reader for the text the decompiler writes: a `header`, subroutines
//! declared as `sub N { ... }` in index order, an optional
//! `sub post_table { ... }`, and top-level `text_entry`/`text_table`
//! statements. Statements are calls with positional and `key=value`
//! arguments, or assignments to `Var[n]`.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

use log::debug;

use crate::context::Compiler;
use crate::error::ScriptError;

pub use ast::Program;

pub fn parse(source: &str) -> Result<Program, ScriptError> {
    let tokens = lexer::Lexer::new(source).tokenize()?;
    debug!("Lexed {} tokens", tokens.len());
    parser::Parser::new(tokens).parse()
}

/// Parse `source` and compile it as script `script_index`.
pub fn compile_source(
    compiler: &mut Compiler<'_>,
    script_index: usize,
    source: &str,
) -> Result<(), ScriptError> {
    let program = parse(source)?;
    eval::compile_program(compiler, script_index, &program)
}
