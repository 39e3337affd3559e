// Script source recursive descent parser

use crate::dsl::ast::*;
use crate::dsl::lexer::{Token, TokenKind};
use crate::error::ScriptError;
use crate::opcodes::UnaryOp;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<Program, ScriptError> {
        let mut items = Vec::new();

        while !self.is_at_end() {
            if self.check(&TokenKind::Newline) {
                self.advance();
                continue;
            }

            items.push(self.parse_item()?);
            self.end_of_statement()?;
        }

        Ok(Program { items })
    }

    fn parse_item(&mut self) -> Result<Item, ScriptError> {
        match &self.peek().kind {
            TokenKind::Header => {
                let line = self.advance().line;
                let bytes = self.consume_bytes()?;
                Ok(Item::Header(bytes, line))
            }
            TokenKind::Sub => Ok(Item::Subroutine(self.parse_subroutine()?)),
            TokenKind::Identifier(_) => Ok(Item::Call(self.parse_call()?)),
            _ => Err(self.expected("header, sub or a statement")),
        }
    }

    fn parse_subroutine(&mut self) -> Result<SubroutineDecl, ScriptError> {
        let line = self.peek().line;
        self.consume(TokenKind::Sub)?;

        let name = match &self.peek().kind {
            TokenKind::Integer(index) if *index >= 0 => {
                let index = *index as usize;
                self.advance();
                SubroutineName::Index(index)
            }
            TokenKind::Identifier(name) if name == "post_table" => {
                self.advance();
                SubroutineName::PostTable
            }
            _ => return Err(self.expected("subroutine index or post_table")),
        };

        let mut no_return = false;
        let mut footer = None;
        if self.match_token(&[TokenKind::LeftParen]) {
            while !self.check(&TokenKind::RightParen) && !self.is_at_end() {
                let option = self.consume_identifier()?;
                match option.as_str() {
                    "no_return" => no_return = true,
                    "footer" => {
                        self.consume(TokenKind::Equal)?;
                        footer = Some(self.consume_bytes()?);
                    }
                    _ => {
                        return Err(ScriptError::ParseError(
                            format!("Unknown subroutine option '{}'", option),
                            self.previous().line,
                        ))
                    }
                }
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
            self.consume(TokenKind::RightParen)?;
        }

        let body = self.parse_block()?;

        Ok(SubroutineDecl {
            name,
            no_return,
            footer,
            body,
            line,
        })
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        self.consume(TokenKind::LeftBrace)?;

        let mut statements = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            if self.check(&TokenKind::Newline) {
                self.advance();
                continue;
            }

            statements.push(self.parse_statement()?);
            self.end_of_statement()?;
        }

        self.consume(TokenKind::RightBrace)?;
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Stmt, ScriptError> {
        let is_variable = matches!(&self.peek().kind, TokenKind::Identifier(name) if name == "Var")
            && matches!(self.peek_next().map(|t| &t.kind), Some(TokenKind::LeftBracket));
        if !is_variable {
            return Ok(Stmt::Call(self.parse_call()?));
        }

        let line = self.peek().line;
        let target = self.parse_variable()?;
        match self.peek().kind.clone() {
            TokenKind::Equal => {
                self.advance();
                let value = self.parse_assigned_value()?;
                Ok(Stmt::Assign {
                    target,
                    value,
                    line,
                })
            }
            TokenKind::CompoundAssign(op) => {
                self.advance();
                let value = self.parse_primary()?;
                Ok(Stmt::CompoundAssign {
                    target,
                    op,
                    value,
                    line,
                })
            }
            _ => Err(self.expected("'=' or a compound assignment")),
        }
    }

    /// Right-hand side of `Var[n] = ...`: a value, `-Var[m]`, `~value` or
    /// `a OP b`.
    fn parse_assigned_value(&mut self) -> Result<Expr, ScriptError> {
        let unary = match &self.peek().kind {
            TokenKind::Tilde => Some(UnaryOp::BitwiseNot),
            TokenKind::Minus if !matches!(self.peek_next().map(|t| &t.kind), Some(TokenKind::Integer(_))) => {
                Some(UnaryOp::Negate)
            }
            _ => None,
        };
        if let Some(op) = unary {
            self.advance();
            let operand = self.parse_primary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }

        let left = self.parse_primary()?;
        match self.peek().kind.binary_op() {
            Some(op) => {
                self.advance();
                let right = self.parse_primary()?;
                Ok(Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
            None => Ok(left),
        }
    }

    fn parse_call(&mut self) -> Result<Call, ScriptError> {
        let line = self.peek().line;
        let name = self.consume_identifier()?;
        self.consume(TokenKind::LeftParen)?;

        let mut arguments = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::RightParen) && !self.is_at_end() {
            let is_keyword = matches!(&self.peek().kind, TokenKind::Identifier(_))
                && matches!(self.peek_next().map(|t| &t.kind), Some(TokenKind::Equal));
            if is_keyword {
                let keyword = self.consume_identifier()?;
                self.advance();
                arguments.push(Argument::Keyword(keyword, self.parse_primary()?));
            } else {
                arguments.push(Argument::Positional(self.parse_primary()?));
            }

            self.skip_newlines();
            if !self.match_token(&[TokenKind::Comma]) {
                break;
            }
            self.skip_newlines();
        }
        self.consume(TokenKind::RightParen)?;

        Ok(Call {
            name,
            arguments,
            line,
        })
    }

    fn parse_variable(&mut self) -> Result<u16, ScriptError> {
        self.consume_identifier()?;
        self.consume(TokenKind::LeftBracket)?;
        let line = self.peek().line;
        let number = match self.peek().kind {
            TokenKind::Integer(number) => number,
            _ => return Err(self.expected("variable number")),
        };
        self.advance();
        self.consume(TokenKind::RightBracket)?;
        u16::try_from(number).map_err(|_| {
            ScriptError::ParseError(format!("Variable number {} out of range", number), line)
        })
    }

    /// Comma-separated expressions up to `close`, newlines allowed. Returns
    /// the elements and whether a trailing comma was present.
    fn parse_elements(&mut self, close: TokenKind) -> Result<(Vec<Expr>, bool), ScriptError> {
        let mut elements = Vec::new();
        let mut trailing_comma = false;

        self.skip_newlines();
        while !self.check(&close) && !self.is_at_end() {
            elements.push(self.parse_primary()?);
            self.skip_newlines();
            trailing_comma = self.match_token(&[TokenKind::Comma]);
            if !trailing_comma {
                break;
            }
            self.skip_newlines();
        }
        self.consume(close)?;

        Ok((elements, trailing_comma))
    }

    pub(crate) fn parse_primary(&mut self) -> Result<Expr, ScriptError> {
        let line = self.peek().line;
        match self.peek().kind.clone() {
            TokenKind::Integer(value) => {
                self.advance();
                Ok(Expr::Integer(value))
            }
            TokenKind::Minus => {
                self.advance();
                match self.peek().kind {
                    TokenKind::Integer(value) => {
                        self.advance();
                        Ok(Expr::Integer(-value))
                    }
                    _ => Err(self.expected("integer after '-'")),
                }
            }
            TokenKind::StringLiteral(value) => {
                self.advance();
                Ok(Expr::String(value))
            }
            TokenKind::BytesLiteral(bytes) => {
                self.advance();
                if !self.match_token(&[TokenKind::Star]) {
                    return Ok(Expr::Bytes(bytes));
                }
                let count = match self.peek().kind {
                    TokenKind::Integer(count) if count >= 0 => count as usize,
                    _ => return Err(self.expected("repeat count")),
                };
                self.advance();
                Ok(Expr::Bytes(bytes.repeat(count)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Boolean(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Boolean(false))
            }
            TokenKind::None => {
                self.advance();
                Ok(Expr::None)
            }
            TokenKind::Identifier(name) if name == "Self" => {
                self.advance();
                Ok(Expr::SelfActor)
            }
            TokenKind::Identifier(name)
                if name == "Var"
                    && matches!(self.peek_next().map(|t| &t.kind), Some(TokenKind::LeftBracket)) =>
            {
                Ok(Expr::Variable(self.parse_variable()?))
            }
            TokenKind::Identifier(group) => {
                self.advance();
                if !self.match_token(&[TokenKind::Dot]) {
                    return Err(ScriptError::ParseError(format!("Unknown name '{}'", group), line));
                }
                let name = self.consume_identifier()?;
                Ok(Expr::Constant { group, name })
            }
            TokenKind::LeftParen => {
                self.advance();
                let (mut elements, trailing_comma) = self.parse_elements(TokenKind::RightParen)?;
                if elements.len() == 1 && !trailing_comma {
                    Ok(elements.remove(0))
                } else {
                    Ok(Expr::Tuple(elements))
                }
            }
            TokenKind::LeftBracket => {
                self.advance();
                let (elements, _) = self.parse_elements(TokenKind::RightBracket)?;
                Ok(Expr::List(elements))
            }
            TokenKind::LeftBrace => {
                self.advance();
                let mut entries = Vec::new();
                self.skip_newlines();
                while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
                    let key = self.consume_string()?;
                    self.consume(TokenKind::Colon)?;
                    entries.push((key, self.parse_primary()?));
                    self.skip_newlines();
                    if !self.match_token(&[TokenKind::Comma]) {
                        break;
                    }
                    self.skip_newlines();
                }
                self.consume(TokenKind::RightBrace)?;
                Ok(Expr::Map(entries))
            }
            _ => Err(self.expected("expression")),
        }
    }

    // Helper methods
    fn end_of_statement(&mut self) -> Result<(), ScriptError> {
        match self.peek().kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::RightBrace | TokenKind::EOF => Ok(()),
            _ => Err(self.expected("end of line")),
        }
    }

    fn expected(&self, what: &str) -> ScriptError {
        let token = self.peek();
        ScriptError::ExpectedToken(what.to_string(), format!("{:?}", token.kind), token.line)
    }

    fn match_token(&mut self, types: &[TokenKind]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, token_type: &TokenKind) -> bool {
        if self.is_at_end() {
            false
        } else {
            std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(token_type)
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len() || matches!(self.peek().kind, TokenKind::EOF)
    }

    fn peek(&self) -> &Token {
        static EOF: Token = Token {
            kind: TokenKind::EOF,
            line: 0,
        };
        self.tokens.get(self.current).unwrap_or(&EOF)
    }

    fn peek_next(&self) -> Option<&Token> {
        self.tokens.get(self.current + 1)
    }

    fn previous(&self) -> &Token {
        let index = self.current.saturating_sub(1);
        self.tokens.get(index).unwrap_or_else(|| self.peek())
    }

    fn consume(&mut self, token_type: TokenKind) -> Result<(), ScriptError> {
        if self.check(&token_type) {
            self.advance();
            Ok(())
        } else {
            Err(self.expected(&format!("{:?}", token_type)))
        }
    }

    fn consume_identifier(&mut self) -> Result<String, ScriptError> {
        if let TokenKind::Identifier(name) = &self.peek().kind {
            let identifier = name.clone();
            self.advance();
            Ok(identifier)
        } else {
            Err(self.expected("identifier"))
        }
    }

    fn consume_string(&mut self) -> Result<String, ScriptError> {
        if let TokenKind::StringLiteral(value) = &self.peek().kind {
            let string = value.clone();
            self.advance();
            Ok(string)
        } else {
            Err(self.expected("string literal"))
        }
    }

    fn consume_bytes(&mut self) -> Result<Vec<u8>, ScriptError> {
        if let TokenKind::BytesLiteral(bytes) = &self.peek().kind {
            let bytes = bytes.clone();
            self.advance();
            Ok(bytes)
        } else {
            Err(self.expected("bytes literal"))
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
