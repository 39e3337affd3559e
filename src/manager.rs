//! Seam to the binary-object layer.
//!
//! Reading and writing the on-disk FEvent container is not done here. The
//! toolkit only needs three things from that layer: the parameter types of
//! each opcode (to render raw arguments at their natural width), the
//! serialized length of a language table (to size the padding table) and the
//! game's text codec.

use crate::error::ScriptError;
use crate::text::LanguageTable;

/// Storage type of one command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
}

impl ParameterType {
    /// Size in bytes.
    pub fn size(self) -> usize {
        match self {
            ParameterType::U8 | ParameterType::I8 => 1,
            ParameterType::U16 | ParameterType::I16 => 2,
            ParameterType::U32 | ParameterType::I32 => 4,
        }
    }

    /// Number of hex digits an immediate of this type is rendered with.
    pub fn hex_width(self) -> usize {
        self.size() * 2
    }
}

pub trait ScriptManager {
    /// Parameter types of `opcode`, or `None` if the opcode is unknown.
    fn parameter_types(&self, opcode: u16) -> Option<&[ParameterType]>;

    /// Length in bytes of `table` once serialized.
    fn language_table_len(&self, table: &LanguageTable) -> usize;

    /// Encode script text into the game's character set.
    ///
    /// The default keeps every code point up to 0xFF as the byte of the same
    /// value, which is also how bytes the codec cannot decode are carried
    /// through.
    fn encode_text(&self, text: &str) -> Result<Vec<u8>, ScriptError> {
        text.chars()
            .map(|ch| {
                u8::try_from(ch as u32).map_err(|_| {
                    ScriptError::Encoding(format!("character {:?} has no single-byte form", ch))
                })
            })
            .collect()
    }

    /// Decode game text into a string; must be total.
    fn decode_text(&self, bytes: &[u8]) -> String {
        bytes.iter().map(|byte| *byte as char).collect()
    }
}
