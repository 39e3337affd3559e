// Syntax tree for script source

use crate::opcodes::{BinaryOp, UnaryOp};

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Header(Vec<u8>, usize),
    Subroutine(SubroutineDecl),
    /// A top-level statement, such as a `text_entry` or `text_table`.
    Call(Call),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubroutineName {
    Index(usize),
    PostTable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubroutineDecl {
    pub name: SubroutineName,
    pub no_return: bool,
    pub footer: Option<Vec<u8>>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Call(Call),
    /// `Var[n] = expr`
    Assign {
        target: u16,
        value: Expr,
        line: usize,
    },
    /// `Var[n] OP= expr`
    CompoundAssign {
        target: u16,
        op: BinaryOp,
        value: Expr,
        line: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub arguments: Vec<Argument>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Positional(Expr),
    Keyword(String, Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Integer(i64),
    String(String),
    Bytes(Vec<u8>),
    Boolean(bool),
    None,
    SelfActor,
    Variable(u16),
    /// `Group.NAME`
    Constant {
        group: String,
        name: String,
    },
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Map(Vec<(String, Expr)>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
}
