//! Effect-list expression parser
//!
//! Presets describe their chain as a literal list of constructor calls.
//! The parser accepts exactly that shape and nothing else: no operators, no
//! nested lists, no calls in argument position.
//!
//! ## Grammar
//!
//! ```text
//! list    ::= '[' ( call ( ',' call )* ','? )? ']'
//! call    ::= NAME '(' ( arg ( ',' arg )* ','? )? ')'
//! arg     ::= NAME '=' value | value
//! value   ::= NUMBER | STRING | 'True' | 'False' | 'None' | path
//! path    ::= NAME ( '.' NAME )*
//! ```
//!
//! Name resolution happens later, against the effect registry.

use crate::error::PedalboardError;

// ---------------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------------

/// A constant in argument position
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Bool(bool),
    Str(String),
    None,
    /// Dotted name such as `LadderFilter.Mode.HPF24`
    Path(Vec<String>),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Bool(true) => f.write_str("True"),
            Literal::Bool(false) => f.write_str("False"),
            Literal::Str(s) => write!(f, "'{}'", s),
            Literal::None => f.write_str("None"),
            Literal::Path(parts) => f.write_str(&parts.join(".")),
        }
    }
}

/// One call argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Positional(Literal),
    Keyword { name: String, value: Literal },
}

/// `Name(args...)`
#[derive(Debug, Clone, PartialEq)]
pub struct EffectCall {
    pub name: String,
    pub args: Vec<Arg>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Syntax errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ExprError {
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { pos: usize, ch: char },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("invalid number '{text}' at position {pos}")]
    InvalidNumber { pos: usize, text: String },

    #[error("unterminated string starting at position {pos}")]
    UnterminatedString { pos: usize },

    #[error("positional argument follows keyword argument at position {pos}")]
    PositionalAfterKeyword { pos: usize },
}

impl From<ExprError> for PedalboardError {
    fn from(err: ExprError) -> Self {
        PedalboardError::evaluation(format!("invalid syntax: {}", err))
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Recursive descent parser, one byte of lookahead
struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).map(|&b| b as char)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    /// Skip whitespace and `#` comments running to end of line
    fn skip_ws(&mut self) {
        while let Some(&b) = self.input.get(self.pos) {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else if b == b'#' {
                while self.input.get(self.pos).is_some_and(|&b| b != b'\n') {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn unexpected(&self, expected: &'static str) -> ExprError {
        match self.peek() {
            Some(ch) => ExprError::UnexpectedChar { pos: self.pos, ch },
            None => ExprError::UnexpectedEnd { expected },
        }
    }

    fn expect(&mut self, ch: char, expected: &'static str) -> Result<(), ExprError> {
        self.skip_ws();
        if self.peek() == Some(ch) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Entry: the whole input must be one list
    fn parse_document(&mut self) -> Result<Vec<EffectCall>, ExprError> {
        let calls = self.parse_list()?;
        self.skip_ws();
        match self.peek() {
            Some(ch) => Err(ExprError::UnexpectedChar { pos: self.pos, ch }),
            None => Ok(calls),
        }
    }

    /// `list ::= '[' ( call ( ',' call )* ','? )? ']'`
    fn parse_list(&mut self) -> Result<Vec<EffectCall>, ExprError> {
        self.expect('[', "'['")?;
        let mut calls = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(']') {
                self.advance();
                return Ok(calls);
            }
            calls.push(self.parse_call()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => self.advance(),
                Some(']') => {}
                _ => return Err(self.unexpected("',' or ']'")),
            }
        }
    }

    /// `call ::= NAME '(' args ')'`
    fn parse_call(&mut self) -> Result<EffectCall, ExprError> {
        self.skip_ws();
        let name = self.parse_name()?;
        self.expect('(', "'('")?;

        let mut args = Vec::new();
        let mut seen_keyword = false;
        loop {
            self.skip_ws();
            if self.peek() == Some(')') {
                self.advance();
                return Ok(EffectCall { name, args });
            }

            let arg_pos = self.pos;
            let arg = self.parse_arg()?;
            match arg {
                Arg::Keyword { .. } => seen_keyword = true,
                Arg::Positional(_) if seen_keyword => {
                    return Err(ExprError::PositionalAfterKeyword { pos: arg_pos });
                }
                Arg::Positional(_) => {}
            }
            args.push(arg);

            self.skip_ws();
            match self.peek() {
                Some(',') => self.advance(),
                Some(')') => {}
                _ => return Err(self.unexpected("',' or ')'")),
            }
        }
    }

    /// `arg ::= NAME '=' value | value`
    fn parse_arg(&mut self) -> Result<Arg, ExprError> {
        self.skip_ws();
        let start = self.pos;
        if self.peek().is_some_and(is_name_start) {
            let name = self.parse_name()?;
            self.skip_ws();
            // `==` is a comparison, not a keyword
            if self.peek() == Some('=') && self.input.get(self.pos + 1) != Some(&b'=') {
                self.advance();
                let value = self.parse_value()?;
                return Ok(Arg::Keyword { name, value });
            }
            self.pos = start;
        }
        Ok(Arg::Positional(self.parse_value()?))
    }

    /// `value ::= NUMBER | STRING | 'True' | 'False' | 'None' | path`
    fn parse_value(&mut self) -> Result<Literal, ExprError> {
        self.skip_ws();
        match self.peek() {
            Some('"' | '\'') => self.parse_string().map(Literal::Str),
            Some(ch) if ch.is_ascii_digit() || matches!(ch, '+' | '-' | '.') => self.parse_number(),
            Some(ch) if is_name_start(ch) => {
                let path = self.parse_path()?;
                Ok(match path.as_slice() {
                    [single] if single == "True" => Literal::Bool(true),
                    [single] if single == "False" => Literal::Bool(false),
                    [single] if single == "None" => Literal::None,
                    _ => Literal::Path(path),
                })
            }
            _ => Err(self.unexpected("a value")),
        }
    }

    /// `path ::= NAME ( '.' NAME )*`
    fn parse_path(&mut self) -> Result<Vec<String>, ExprError> {
        let mut parts = vec![self.parse_name()?];
        loop {
            self.skip_ws();
            if self.peek() == Some('.') {
                self.advance();
                self.skip_ws();
                parts.push(self.parse_name()?);
            } else {
                return Ok(parts);
            }
        }
    }

    fn parse_name(&mut self) -> Result<String, ExprError> {
        let start = self.pos;
        if !self.peek().is_some_and(is_name_start) {
            return Err(self.unexpected("a name"));
        }
        while self.peek().is_some_and(is_name_char) {
            self.advance();
        }
        Ok(self.slice(start))
    }

    /// Optional sign, digits with an optional point, optional exponent
    fn parse_number(&mut self) -> Result<Literal, ExprError> {
        let start = self.pos;
        if matches!(self.peek(), Some('+' | '-')) {
            self.advance();
            self.skip_ws();
        }
        let digits_start = self.pos;
        while self
            .peek()
            .is_some_and(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '_'))
        {
            self.advance();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            while self.peek().is_some_and(|ch| ch.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = self.slice(start);
        if !underscores_between_digits(&self.input[digits_start..self.pos]) {
            return Err(ExprError::InvalidNumber { pos: start, text });
        }
        let negative = text.starts_with('-');
        let cleaned: String = self.slice(digits_start).chars().filter(|&c| c != '_').collect();
        match cleaned.parse::<f64>() {
            Ok(value) if value.is_finite() => {
                Ok(Literal::Number(if negative { -value } else { value }))
            }
            _ => Err(ExprError::InvalidNumber { pos: start, text }),
        }
    }

    /// Single- or double-quoted, with backslash escapes
    fn parse_string(&mut self) -> Result<String, ExprError> {
        let start = self.pos;
        let quote = self.input[self.pos];
        self.advance();

        let mut bytes = Vec::new();
        loop {
            let Some(&byte) = self.input.get(self.pos) else {
                return Err(ExprError::UnterminatedString { pos: start });
            };
            self.advance();
            match byte {
                b if b == quote => break,
                b'\n' => return Err(ExprError::UnterminatedString { pos: start }),
                b'\\' => {
                    let Some(&escaped) = self.input.get(self.pos) else {
                        return Err(ExprError::UnterminatedString { pos: start });
                    };
                    self.advance();
                    bytes.push(match escaped {
                        b'n' => b'\n',
                        b't' => b'\t',
                        b'r' => b'\r',
                        other => other,
                    });
                }
                other => bytes.push(other),
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn slice(&self, start: usize) -> String {
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Every `_` in a numeral must sit between two digits
fn underscores_between_digits(numeral: &[u8]) -> bool {
    numeral.iter().enumerate().all(|(i, &b)| {
        b != b'_'
            || (i > 0
                && numeral[i - 1].is_ascii_digit()
                && numeral.get(i + 1).is_some_and(u8::is_ascii_digit))
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a bracketed effect list into calls, in order
///
/// # Errors
/// [`ExprError`] on any syntax outside the grammar above.
pub fn parse_effect_list(source: &str) -> Result<Vec<EffectCall>, ExprError> {
    Parser::new(source).parse_document()
}
