// FEvent command stream model

use crate::text::LanguageTable;
use crate::variable::{Value, Variable};

/// One decoded instruction: opcode, arguments and optional result slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub opcode: u16,
    pub arguments: Vec<Value>,
    pub result: Option<Variable>,
}

impl Command {
    pub fn new(opcode: u16, arguments: Vec<Value>, result: Option<Variable>) -> Self {
        Command {
            opcode,
            arguments,
            result,
        }
    }

    /// Argument `index`, or `None` if the command is shorter.
    pub fn argument(&self, index: usize) -> Option<Value> {
        self.arguments.get(index).copied()
    }
}

/// A callable unit of a script. The footer is carried through untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Subroutine {
    pub commands: Vec<Command>,
    pub footer: Vec<u8>,
}

impl Subroutine {
    pub fn new(commands: Vec<Command>) -> Self {
        Subroutine {
            commands,
            footer: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.footer.is_empty()
    }
}

/// Opaque script header metadata, passed through both directions unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScriptHeader {
    pub bytes: Vec<u8>,
}

impl ScriptHeader {
    pub fn new(bytes: Vec<u8>) -> Self {
        ScriptHeader { bytes }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub header: ScriptHeader,
    pub subroutines: Vec<Subroutine>,
    pub post_table_subroutine: Option<Subroutine>,
    /// `room_id * 3 + variant`
    pub index: usize,
}

impl Script {
    pub fn new(index: usize, header: ScriptHeader) -> Self {
        Script {
            header,
            subroutines: Vec::new(),
            post_table_subroutine: None,
            index,
        }
    }

    pub fn room_id(&self) -> u16 {
        room_of(self.index)
    }

    pub fn variant(&self) -> usize {
        self.index % 3
    }
}

pub fn room_of(script_index: usize) -> u16 {
    (script_index / 3) as u16
}

/// One of the three chunks stored per room.
#[derive(Debug, Clone, PartialEq)]
pub enum FEventChunk {
    Script(Script),
    LanguageTable(LanguageTable),
    Raw(Vec<u8>),
}

impl FEventChunk {
    pub fn kind(&self) -> &'static str {
        match self {
            FEventChunk::Script(_) => "a script",
            FEventChunk::LanguageTable(_) => "a language table",
            FEventChunk::Raw(_) => "raw bytes",
        }
    }
}

/// The chunk triple of one room: up to two scripts and, conventionally in
/// the third slot, the room's language table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChunkTriple(pub [Option<FEventChunk>; 3]);

impl ChunkTriple {
    pub fn new(chunks: [Option<FEventChunk>; 3]) -> Self {
        ChunkTriple(chunks)
    }

    pub fn chunk(&self, variant: usize) -> Option<&FEventChunk> {
        self.0.get(variant).and_then(|chunk| chunk.as_ref())
    }

    pub fn script(&self, variant: usize) -> Option<&Script> {
        match self.chunk(variant) {
            Some(FEventChunk::Script(script)) => Some(script),
            _ => None,
        }
    }

    pub fn language_table(&self) -> Option<&LanguageTable> {
        match self.chunk(2) {
            Some(FEventChunk::LanguageTable(table)) => Some(table),
            _ => None,
        }
    }
}
