//! The IFJ25 lexer.
//!
//! A deterministic finite automaton over a byte stream. Tokens are produced
//! on demand through [`Lexer::next_token`]; the underlying [`ByteReader`]
//! provides one byte of pushback and the lexer keeps a small pending buffer
//! of its own for the places that need to look further ahead (`"""`
//! delimiters and `\xHH` escapes).

use ifjc_util::{ByteReader, CompileError, Result};
use std::io::Read;

use crate::token::{Keyword, Token};

/// The IFJ25 lexer.
pub struct Lexer<R> {
    reader: ByteReader<R>,
    /// Bytes unread by the lexer itself, consumed before the reader.
    pending: Vec<u8>,
}

impl<R: Read> Lexer<R> {
    /// Creates a lexer over the given byte source.
    pub fn new(source: R) -> Self {
        Self {
            reader: ByteReader::new(source),
            pending: Vec::new(),
        }
    }

    /// The 1-based line number of the byte most recently consumed.
    pub fn line(&self) -> u32 {
        self.reader.line()
    }

    fn get(&mut self) -> Result<Option<u8>> {
        if let Some(b) = self.pending.pop() {
            return Ok(Some(b));
        }
        Ok(self.reader.next_byte()?)
    }

    fn unget(&mut self, byte: u8) {
        self.pending.push(byte);
    }

    fn err(&self, message: impl Into<String>) -> CompileError {
        CompileError::Lexical(format!("line {}: {}", self.reader.line(), message.into()))
    }

    /// Returns the next token from the source.
    ///
    /// Whitespace and comments are skipped; runs of newlines collapse into a
    /// single [`Token::Eol`]. At end of input every call returns
    /// [`Token::Eof`].
    pub fn next_token(&mut self) -> Result<Token> {
        loop {
            let byte = match self.get()? {
                None => return Ok(Token::Eof),
                Some(b) => b,
            };

            match byte {
                b'\n' => {
                    // Collapse consecutive newlines into one EOL token.
                    loop {
                        match self.get()? {
                            Some(b'\n') => continue,
                            Some(other) => {
                                self.unget(other);
                                break;
                            }
                            None => break,
                        }
                    }
                    return Ok(Token::Eol);
                }
                b' ' | b'\t' | b'\r' | 0x0b | 0x0c => continue,
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => return self.lex_word(byte),
                b'0'..=b'9' => return self.lex_number(byte),
                b'"' => return self.lex_string_start(),
                b'+' => return Ok(Token::Plus),
                b'-' => return Ok(Token::Minus),
                b'*' => return Ok(Token::Star),
                b'/' => {
                    if let Some(token) = self.lex_slash()? {
                        return Ok(token);
                    }
                    // A comment was skipped; keep scanning.
                }
                b'=' => return Ok(self.two_byte(b'=', Token::Eq, Token::Assign)?),
                b'!' => return Ok(self.two_byte(b'=', Token::NotEq, Token::Not)?),
                b'<' => return Ok(self.two_byte(b'=', Token::LtEq, Token::Lt)?),
                b'>' => return Ok(self.two_byte(b'=', Token::GtEq, Token::Gt)?),
                b'(' => return Ok(Token::LParen),
                b')' => return Ok(Token::RParen),
                b'{' => return Ok(Token::LBrace),
                b'}' => return Ok(Token::RBrace),
                b'.' => return Ok(Token::Dot),
                b',' => return Ok(Token::Comma),
                other => {
                    return Err(self.err(format!("unexpected character '{}'", other as char)))
                }
            }
        }
    }

    /// Resolves a one-or-two-byte operator (`=`/`==`, `<`/`<=`, ...).
    fn two_byte(&mut self, follow: u8, long: Token, short: Token) -> Result<Token> {
        match self.get()? {
            Some(b) if b == follow => Ok(long),
            Some(b) => {
                self.unget(b);
                Ok(short)
            }
            None => Ok(short),
        }
    }

    /// Identifier, global identifier or keyword.
    fn lex_word(&mut self, first: u8) -> Result<Token> {
        let mut word = String::new();
        word.push(first as char);
        loop {
            match self.get()? {
                Some(b) if b.is_ascii_alphanumeric() || b == b'_' => word.push(b as char),
                Some(b) => {
                    self.unget(b);
                    break;
                }
                None => break,
            }
        }

        if let Some(kw) = Keyword::from_lexeme(&word) {
            return Ok(Token::Keyword(kw));
        }
        if word.starts_with("__") {
            return Ok(Token::GlobalIdent(word));
        }
        if word.starts_with('_') {
            return Err(self.err(format!(
                "identifier '{word}' must not start with a single underscore"
            )));
        }
        Ok(Token::Ident(word))
    }

    /// Integer, hexadecimal, fractional or exponent numeric literal.
    fn lex_number(&mut self, first: u8) -> Result<Token> {
        let mut text = String::new();
        text.push(first as char);

        // Integer part; a '0x' prefix switches to hexadecimal.
        loop {
            match self.get()? {
                Some(b @ b'0'..=b'9') => text.push(b as char),
                Some(b'x') if text == "0" => return self.lex_hex_number(),
                Some(b'.') => {
                    text.push('.');
                    return self.lex_fraction(text);
                }
                Some(b @ (b'e' | b'E')) => {
                    text.push(b as char);
                    return self.lex_exponent(text);
                }
                Some(b) => {
                    self.unget(b);
                    break;
                }
                None => break,
            }
        }
        self.parse_value(&text)
    }

    fn lex_hex_number(&mut self) -> Result<Token> {
        let mut digits = String::new();
        loop {
            match self.get()? {
                Some(b) if b.is_ascii_hexdigit() => digits.push(b as char),
                Some(b) => {
                    self.unget(b);
                    break;
                }
                None => break,
            }
        }
        if digits.is_empty() {
            return Err(self.err("'0x' with no hexadecimal digits"));
        }
        let value = i64::from_str_radix(&digits, 16)
            .map_err(|_| self.err(format!("hexadecimal literal '0x{digits}' out of range")))?;
        Ok(Token::Number(value as f64))
    }

    fn lex_fraction(&mut self, mut text: String) -> Result<Token> {
        loop {
            match self.get()? {
                Some(b @ b'0'..=b'9') => text.push(b as char),
                Some(b @ (b'e' | b'E')) => {
                    // "1.e3" is valid in the DFA; keep the text parseable.
                    if text.ends_with('.') {
                        text.push('0');
                    }
                    text.push(b as char);
                    return self.lex_exponent(text);
                }
                Some(b) => {
                    self.unget(b);
                    break;
                }
                None => break,
            }
        }
        self.parse_value(&text)
    }

    fn lex_exponent(&mut self, mut text: String) -> Result<Token> {
        // Optional sign directly after 'e'/'E'.
        match self.get()? {
            Some(b @ (b'+' | b'-')) => text.push(b as char),
            Some(b) => self.unget(b),
            None => {}
        }
        let mut has_digit = false;
        loop {
            match self.get()? {
                Some(b @ b'0'..=b'9') => {
                    text.push(b as char);
                    has_digit = true;
                }
                Some(b) => {
                    self.unget(b);
                    break;
                }
                None => break,
            }
        }
        if !has_digit {
            return Err(self.err(format!("exponent in '{text}' has no digits")));
        }
        self.parse_value(&text)
    }

    fn parse_value(&self, text: &str) -> Result<Token> {
        let value: f64 = text
            .parse()
            .map_err(|_| self.err(format!("malformed numeric literal '{text}'")))?;
        Ok(Token::Number(value))
    }

    /// Dispatches between a regular `"..."` and a multiline `"""..."""`
    /// string; the opening quote has been consumed.
    fn lex_string_start(&mut self) -> Result<Token> {
        match self.get()? {
            Some(b'"') => match self.get()? {
                Some(b'"') => self.lex_multiline_string(),
                Some(b) => {
                    // Empty string followed by something else.
                    self.unget(b);
                    self.unget(b'"');
                    self.lex_string()
                }
                None => {
                    self.unget(b'"');
                    self.lex_string()
                }
            },
            Some(b) => {
                self.unget(b);
                self.lex_string()
            }
            None => Err(self.err("unterminated string literal")),
        }
    }

    /// Regular string body: no raw newlines, escapes decoded.
    fn lex_string(&mut self) -> Result<Token> {
        let mut bytes = Vec::new();
        loop {
            match self.get()? {
                None => return Err(self.err("unterminated string literal")),
                Some(b'"') => return Ok(Token::Str(bytes)),
                Some(b'\n') => return Err(self.err("raw newline in string literal")),
                Some(b'\\') => bytes.push(self.lex_escape()?),
                Some(b) => bytes.push(b),
            }
        }
    }

    fn lex_escape(&mut self) -> Result<u8> {
        match self.get()? {
            Some(b'"') => Ok(b'"'),
            Some(b'n') => Ok(b'\n'),
            Some(b'r') => Ok(b'\r'),
            Some(b't') => Ok(b'\t'),
            Some(b'\\') => Ok(b'\\'),
            Some(b'x') => {
                let hi = self.hex_digit()?;
                let lo = self.hex_digit()?;
                Ok(hi * 16 + lo)
            }
            Some(b) => Err(self.err(format!("unknown escape sequence '\\{}'", b as char))),
            None => Err(self.err("unterminated escape sequence")),
        }
    }

    fn hex_digit(&mut self) -> Result<u8> {
        match self.get()? {
            Some(b @ b'0'..=b'9') => Ok(b - b'0'),
            Some(b @ b'a'..=b'f') => Ok(b - b'a' + 10),
            Some(b @ b'A'..=b'F') => Ok(b - b'A' + 10),
            _ => Err(self.err("invalid hexadecimal escape sequence")),
        }
    }

    /// Multiline string body after the opening `"""`; everything up to the
    /// first `"""` is captured verbatim, newlines included.
    fn lex_multiline_string(&mut self) -> Result<Token> {
        let mut bytes = Vec::new();
        loop {
            match self.get()? {
                None => return Err(self.err("unterminated multiline string literal")),
                Some(b'"') => match self.get()? {
                    Some(b'"') => match self.get()? {
                        Some(b'"') => return Ok(Token::Str(bytes)),
                        Some(other) => {
                            bytes.push(b'"');
                            bytes.push(b'"');
                            self.unget(other);
                        }
                        None => return Err(self.err("unterminated multiline string literal")),
                    },
                    Some(other) => {
                        bytes.push(b'"');
                        self.unget(other);
                    }
                    None => return Err(self.err("unterminated multiline string literal")),
                },
                Some(b) => bytes.push(b),
            }
        }
    }

    /// `/` is division, a line comment or a (nestable) block comment.
    /// Returns `None` when a comment was consumed.
    fn lex_slash(&mut self) -> Result<Option<Token>> {
        match self.get()? {
            Some(b'/') => {
                // Line comment runs to end-of-line; the newline itself still
                // produces an EOL token.
                loop {
                    match self.get()? {
                        Some(b'\n') => {
                            self.unget(b'\n');
                            break;
                        }
                        Some(_) => continue,
                        None => break,
                    }
                }
                Ok(None)
            }
            Some(b'*') => {
                self.skip_block_comment()?;
                Ok(None)
            }
            Some(b) => {
                self.unget(b);
                Ok(Some(Token::Slash))
            }
            None => Ok(Some(Token::Slash)),
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        let mut depth = 1u32;
        while depth > 0 {
            match self.get()? {
                None => return Err(self.err("unterminated block comment")),
                Some(b'*') => match self.get()? {
                    Some(b'/') => depth -= 1,
                    Some(b) => self.unget(b),
                    None => return Err(self.err("unterminated block comment")),
                },
                Some(b'/') => match self.get()? {
                    Some(b'*') => depth += 1,
                    Some(b) => self.unget(b),
                    None => return Err(self.err("unterminated block comment")),
                },
                Some(_) => {}
            }
        }
        Ok(())
    }
}
