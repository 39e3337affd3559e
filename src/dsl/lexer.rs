// Script source lexer
// Tokenizes script source into a stream of tokens

use crate::error::ScriptError;
use crate::opcodes::BinaryOp;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Integer(i64),
    StringLiteral(String),
    BytesLiteral(Vec<u8>),
    Identifier(String),

    // Keywords
    Sub,
    Header,
    True,
    False,
    None,

    // Symbols
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    LeftParen,    // (
    RightParen,   // )
    Comma,        // ,
    Colon,        // :
    Dot,          // .

    // Operators
    Equal,      // =
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    ShiftLeft,  // <<
    ShiftRight, // >>
    Ampersand,  // &
    Pipe,       // |
    Caret,      // ^
    Tilde,      // ~
    CompoundAssign(BinaryOp), // +=, <<=, ...

    // Special
    Newline,
    EOF,
}

impl TokenKind {
    /// The binary operator this token spells, if any.
    pub fn binary_op(&self) -> Option<BinaryOp> {
        match self {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Subtract),
            TokenKind::Star => Some(BinaryOp::Multiply),
            TokenKind::Slash => Some(BinaryOp::Divide),
            TokenKind::Percent => Some(BinaryOp::Modulo),
            TokenKind::ShiftLeft => Some(BinaryOp::ShiftLeft),
            TokenKind::ShiftRight => Some(BinaryOp::ShiftRight),
            TokenKind::Ampersand => Some(BinaryOp::BitwiseAnd),
            TokenKind::Pipe => Some(BinaryOp::BitwiseOr),
            TokenKind::Caret => Some(BinaryOp::BitwiseXor),
            _ => None,
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    current_char: Option<char>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Lexer {
            input: chars,
            position: 0,
            line: 1,
            current_char,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, ScriptError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::EOF;
            tokens.push(token);
            if done {
                break;
            }
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, ScriptError> {
        self.skip_whitespace();

        let start_line = self.line;

        let ch = match self.current_char {
            None => {
                return Ok(Token {
                    kind: TokenKind::EOF,
                    line: start_line,
                })
            }
            Some(ch) => ch,
        };

        let kind = match ch {
            '{' => self.single(TokenKind::LeftBrace),
            '}' => self.single(TokenKind::RightBrace),
            '[' => self.single(TokenKind::LeftBracket),
            ']' => self.single(TokenKind::RightBracket),
            '(' => self.single(TokenKind::LeftParen),
            ')' => self.single(TokenKind::RightParen),
            ',' => self.single(TokenKind::Comma),
            ':' => self.single(TokenKind::Colon),
            '.' => self.single(TokenKind::Dot),
            '=' => self.single(TokenKind::Equal),
            '~' => self.single(TokenKind::Tilde),
            '\n' => {
                self.advance();
                // Blank lines collapse into one separator
                while let Some(next) = self.current_char {
                    if next.is_whitespace() {
                        self.advance();
                    } else {
                        break;
                    }
                }
                TokenKind::Newline
            }
            '/' => {
                self.advance();
                if self.current_char == Some('/') {
                    self.skip_line_comment();
                    return self.next_token();
                }
                self.operator(TokenKind::Slash, BinaryOp::Divide)
            }
            '+' => {
                self.advance();
                self.operator(TokenKind::Plus, BinaryOp::Add)
            }
            '-' => {
                self.advance();
                self.operator(TokenKind::Minus, BinaryOp::Subtract)
            }
            '*' => {
                self.advance();
                self.operator(TokenKind::Star, BinaryOp::Multiply)
            }
            '%' => {
                self.advance();
                self.operator(TokenKind::Percent, BinaryOp::Modulo)
            }
            '&' => {
                self.advance();
                self.operator(TokenKind::Ampersand, BinaryOp::BitwiseAnd)
            }
            '|' => {
                self.advance();
                self.operator(TokenKind::Pipe, BinaryOp::BitwiseOr)
            }
            '^' => {
                self.advance();
                self.operator(TokenKind::Caret, BinaryOp::BitwiseXor)
            }
            '<' | '>' => {
                self.advance();
                if self.current_char != Some(ch) {
                    return Err(ScriptError::UnexpectedCharacter(ch, start_line));
                }
                self.advance();
                if ch == '<' {
                    self.operator(TokenKind::ShiftLeft, BinaryOp::ShiftLeft)
                } else {
                    self.operator(TokenKind::ShiftRight, BinaryOp::ShiftRight)
                }
            }

            '"' => {
                self.advance();
                TokenKind::StringLiteral(self.read_string(start_line)?)
            }
            'b' if self.peek_char() == Some('"') => {
                self.advance();
                self.advance();
                TokenKind::BytesLiteral(self.read_bytes(start_line)?)
            }

            ch if ch.is_ascii_digit() => TokenKind::Integer(self.read_number()?),

            ch if ch.is_alphabetic() || ch == '_' => {
                let identifier = self.read_identifier();
                self.keyword_or_identifier(identifier)
            }

            ch => return Err(ScriptError::UnexpectedCharacter(ch, start_line)),
        };

        Ok(Token {
            kind,
            line: start_line,
        })
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// `kind`, or its compound-assignment form if followed by `=`.
    fn operator(&mut self, kind: TokenKind, op: BinaryOp) -> TokenKind {
        if self.current_char == Some('=') {
            self.advance();
            TokenKind::CompoundAssign(op)
        } else {
            kind
        }
    }

    fn advance(&mut self) {
        if let Some('\n') = self.current_char {
            self.line += 1;
        }

        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() && ch != '\n' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.current_char {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Read `count` hex digits of an escape.
    fn read_hex_digits(&mut self, count: usize) -> Result<u32, ScriptError> {
        let mut value = 0;
        for _ in 0..count {
            let digit = self
                .current_char
                .and_then(|ch| ch.to_digit(16))
                .ok_or_else(|| {
                    ScriptError::LexicalError("Invalid hex escape".to_string(), self.line)
                })?;
            value = value * 16 + digit;
            self.advance();
        }
        Ok(value)
    }

    fn read_string(&mut self, start_line: usize) -> Result<String, ScriptError> {
        let mut value = String::new();

        while let Some(ch) = self.current_char {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(value);
                }
                '\\' => {
                    self.advance();
                    let escape = self
                        .current_char
                        .ok_or(ScriptError::UnterminatedString(start_line))?;
                    self.advance();
                    match escape {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '\\' => value.push('\\'),
                        '"' => value.push('"'),
                        'x' => {
                            let code = self.read_hex_digits(2)?;
                            value.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                        }
                        'u' => {
                            if self.current_char != Some('{') {
                                return Err(ScriptError::LexicalError(
                                    "Expected '{' after \\u".to_string(),
                                    self.line,
                                ));
                            }
                            self.advance();
                            let mut code = 0u32;
                            while let Some(digit) = self.current_char.and_then(|ch| ch.to_digit(16)) {
                                code = code.saturating_mul(16).saturating_add(digit);
                                self.advance();
                            }
                            if self.current_char != Some('}') {
                                return Err(ScriptError::LexicalError(
                                    "Unterminated \\u escape".to_string(),
                                    self.line,
                                ));
                            }
                            self.advance();
                            let decoded = char::from_u32(code).ok_or_else(|| {
                                ScriptError::LexicalError(
                                    format!("Invalid code point U+{:X}", code),
                                    self.line,
                                )
                            })?;
                            value.push(decoded);
                        }
                        other => {
                            return Err(ScriptError::LexicalError(
                                format!("Unknown escape '\\{}'", other),
                                self.line,
                            ))
                        }
                    }
                }
                ch => {
                    value.push(ch);
                    self.advance();
                }
            }
        }

        Err(ScriptError::UnterminatedString(start_line))
    }

    fn read_bytes(&mut self, start_line: usize) -> Result<Vec<u8>, ScriptError> {
        let mut value = Vec::new();

        while let Some(ch) = self.current_char {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(value);
                }
                '\\' => {
                    self.advance();
                    let escape = self
                        .current_char
                        .ok_or(ScriptError::UnterminatedString(start_line))?;
                    self.advance();
                    match escape {
                        'x' => value.push(self.read_hex_digits(2)? as u8),
                        'n' => value.push(b'\n'),
                        't' => value.push(b'\t'),
                        'r' => value.push(b'\r'),
                        '\\' => value.push(b'\\'),
                        '"' => value.push(b'"'),
                        other => {
                            return Err(ScriptError::LexicalError(
                                format!("Unknown escape '\\{}'", other),
                                self.line,
                            ))
                        }
                    }
                }
                ch if ch.is_ascii() && !ch.is_ascii_control() => {
                    value.push(ch as u8);
                    self.advance();
                }
                ch => {
                    return Err(ScriptError::LexicalError(
                        format!("Non-ASCII character '{}' in bytes literal", ch),
                        self.line,
                    ))
                }
            }
        }

        Err(ScriptError::UnterminatedString(start_line))
    }

    fn read_number(&mut self) -> Result<i64, ScriptError> {
        let mut radix = 10;
        if self.current_char == Some('0') && matches!(self.peek_char(), Some('x') | Some('X')) {
            self.advance();
            self.advance();
            radix = 16;
        }

        let mut value = String::new();
        while let Some(ch) = self.current_char {
            if ch.is_digit(radix) {
                value.push(ch);
                self.advance();
            } else if ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        i64::from_str_radix(&value, radix)
            .map_err(|_| ScriptError::LexicalError("Invalid number".to_string(), self.line))
    }

    fn read_identifier(&mut self) -> String {
        let mut value = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || ch == '_' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        value
    }

    fn keyword_or_identifier(&self, identifier: String) -> TokenKind {
        match identifier.as_str() {
            "sub" => TokenKind::Sub,
            "header" => TokenKind::Header,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "none" => TokenKind::None,
            _ => TokenKind::Identifier(identifier),
        }
    }
}

#[cfg(test)]
#[path = "lexer_tests.rs"]
mod tests;
