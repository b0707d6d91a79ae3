//! Byte-level tokenizer for the text format.
//!
//! Tokens carry only their kind and byte range; payload decoding (string
//! escapes, blob hex pairs, number parsing) happens when the tree is built,
//! so the token stream stays cheap and every later error can still point at
//! the exact bytes it came from.

use std::sync::Arc;

use miette::{NamedSource, SourceSpan};

use crate::error::{Error, ParseError};
use crate::utils;

/// What to do with `/* ... */` comments in either format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentPolicy {
    /// Any comment is an error.
    Reject,
    /// Comments are read and dropped.
    #[default]
    Discard,
    /// Comments become nodes in the tree and survive regeneration.
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    ObjectOpen,
    ObjectClose,
    ArrayOpen,
    ArrayClose,
    Comma,
    Colon,
    Str,
    Int,
    Float,
    True,
    False,
    Null,
    Blob,
    Comment,
}

/// A lexeme's kind and byte range. Delimiters (quotes, `b"`, `/*`) are part
/// of the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub len: usize,
}

impl Token {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn span(&self) -> SourceSpan {
        (self.start, self.len).into()
    }
}

pub struct Lexer {
    text: String,
    pos: usize,
    policy: CommentPolicy,
    source: Arc<NamedSource<String>>,
}

impl Lexer {
    pub fn new(text: &str, policy: CommentPolicy) -> Self {
        let source = Arc::new(NamedSource::new("input.bjson", text.to_string()));
        Lexer::with_source(text, policy, source)
    }

    pub(crate) fn with_source(
        text: &str,
        policy: CommentPolicy,
        source: Arc<NamedSource<String>>,
    ) -> Self {
        Lexer {
            text: text.to_string(),
            pos: 0,
            policy,
            source,
        }
    }

    /// Tokenizes the whole input.
    pub fn lex(mut self) -> Result<Vec<Token>, Error> {
        let mut tokens = Vec::new();
        while let Some(byte) = self.peek() {
            match byte {
                b' ' | b'\t' | b'\n' | b'\r' | b'\x0c' => self.pos += 1,
                b'{' => tokens.push(self.single(TokenKind::ObjectOpen)),
                b'}' => tokens.push(self.single(TokenKind::ObjectClose)),
                b'[' => tokens.push(self.single(TokenKind::ArrayOpen)),
                b']' => tokens.push(self.single(TokenKind::ArrayClose)),
                b',' => tokens.push(self.single(TokenKind::Comma)),
                b':' => tokens.push(self.single(TokenKind::Colon)),
                b'"' => tokens.push(self.scan_string()?),
                b't' => tokens.push(self.scan_keyword("true", TokenKind::True)?),
                b'f' => tokens.push(self.scan_keyword("false", TokenKind::False)?),
                b'n' => tokens.push(self.scan_keyword("null", TokenKind::Null)?),
                b'b' => tokens.push(self.scan_blob()?),
                b'0'..=b'9' | b'-' => tokens.push(self.scan_number()?),
                b'/' => {
                    let token = self.scan_comment()?;
                    tokens.push(token);
                }
                _ => {
                    return Err(self.fail(self.pos, 1, |src, span| {
                        ParseError::UnexpectedCharacter { src, span }
                    }));
                }
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let token = Token {
            kind,
            start: self.pos,
            len: 1,
        };
        self.pos += 1;
        token
    }

    /// Scans to the closing quote, skipping over backslash escapes. Escape
    /// validity is checked when the string is decoded.
    fn scan_string(&mut self) -> Result<Token, Error> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek() {
                None => {
                    return Err(self.fail(start, 1, |src, span| ParseError::Unterminated {
                        src,
                        span,
                        what: "string",
                    }));
                }
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(Token {
                        kind: TokenKind::Str,
                        start,
                        len: self.pos - start,
                    });
                }
                Some(b'\\') => {
                    // Escapes are validated here and decoded at tree build.
                    let escape = self.pos;
                    match self.peek_at(1) {
                        Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => {
                            self.pos += 2;
                        }
                        Some(b'u') => {
                            let hex = (2..6)
                                .all(|i| self.peek_at(i).is_some_and(|b| b.is_ascii_hexdigit()));
                            if !hex {
                                return Err(self.fail(escape, 2, |src, span| {
                                    ParseError::InvalidEscape { src, span }
                                }));
                            }
                            self.pos += 6;
                        }
                        Some(_) => {
                            return Err(self.fail(escape, 2, |src, span| {
                                ParseError::InvalidEscape { src, span }
                            }));
                        }
                        None => {
                            return Err(self.fail(start, 1, |src, span| {
                                ParseError::Unterminated {
                                    src,
                                    span,
                                    what: "string",
                                }
                            }));
                        }
                    }
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn scan_keyword(&mut self, word: &'static str, kind: TokenKind) -> Result<Token, Error> {
        let start = self.pos;
        let boundary = self
            .peek_at(word.len())
            .map_or(true, |b| !b.is_ascii_alphanumeric());
        if self.text[start..].starts_with(word) && boundary {
            self.pos += word.len();
            return Ok(Token {
                kind,
                start,
                len: word.len(),
            });
        }
        let run = self.text.as_bytes()[start..]
            .iter()
            .take_while(|b| b.is_ascii_alphanumeric())
            .count()
            .max(1);
        Err(self.fail(start, run, |src, span| ParseError::UnexpectedToken {
            src,
            span,
            expected: format!("keyword `{word}`"),
        }))
    }

    fn scan_blob(&mut self) -> Result<Token, Error> {
        let start = self.pos;
        if self.peek_at(1) != Some(b'"') {
            let run = self.text.as_bytes()[start..]
                .iter()
                .take_while(|b| b.is_ascii_alphanumeric())
                .count()
                .max(1);
            return Err(self.fail(start, run, |src, span| ParseError::UnexpectedToken {
                src,
                span,
                expected: "a blob literal `b\"...\"`".to_string(),
            }));
        }
        self.pos += 2;
        loop {
            match self.peek() {
                None => {
                    return Err(self.fail(start, 2, |src, span| ParseError::Unterminated {
                        src,
                        span,
                        what: "blob literal",
                    }));
                }
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(Token {
                        kind: TokenKind::Blob,
                        start,
                        len: self.pos - start,
                    });
                }
                Some(b'/') => {
                    let hi = self.peek_at(1);
                    let lo = self.peek_at(2);
                    if !is_hex_pair(hi, lo) {
                        return Err(self.fail(self.pos, 1, |src, span| {
                            ParseError::InvalidBlobByte { src, span }
                        }));
                    }
                    self.pos += 3;
                }
                Some(byte) if byte.is_ascii_alphanumeric() || byte == b' ' => self.pos += 1,
                Some(_) => {
                    return Err(self.fail(self.pos, 1, |src, span| {
                        ParseError::InvalidBlobByte { src, span }
                    }));
                }
            }
        }
    }

    /// Consumes a maximal numeric run, then validates it eagerly so a bad
    /// literal is reported at the token rather than deep in tree building.
    fn scan_number(&mut self) -> Result<Token, Error> {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            match byte {
                b'0'..=b'9' | b'.' | b'e' | b'E' | b'+' | b'-' => self.pos += 1,
                _ => break,
            }
        }
        let lexeme = &self.text[start..self.pos];
        let is_float = lexeme.bytes().any(|b| matches!(b, b'.' | b'e' | b'E'));
        let len = lexeme.len();
        if is_float {
            if lexeme.parse::<f32>().is_err() {
                return Err(self.fail(start, len, |src, span| ParseError::InvalidNumber {
                    src,
                    span,
                    kind: "float",
                }));
            }
            Ok(Token {
                kind: TokenKind::Float,
                start,
                len,
            })
        } else {
            if lexeme.parse::<i32>().is_err() {
                return Err(self.fail(start, len, |src, span| ParseError::InvalidNumber {
                    src,
                    span,
                    kind: "32-bit integer",
                }));
            }
            Ok(Token {
                kind: TokenKind::Int,
                start,
                len,
            })
        }
    }

    fn scan_comment(&mut self) -> Result<Token, Error> {
        let start = self.pos;
        if self.peek_at(1) != Some(b'*') {
            return Err(self.fail(start, 1, |src, span| ParseError::UnexpectedCharacter {
                src,
                span,
            }));
        }
        if self.policy == CommentPolicy::Reject {
            return Err(self.fail(start, 2, |src, span| ParseError::CommentsRejected {
                src,
                span,
            }));
        }
        match self.text[start + 2..].find("*/") {
            Some(end) => {
                self.pos = start + 2 + end + 2;
                Ok(Token {
                    kind: TokenKind::Comment,
                    start,
                    len: self.pos - start,
                })
            }
            None => Err(self.fail(start, 2, |src, span| ParseError::Unterminated {
                src,
                span,
                what: "comment",
            })),
        }
    }

    fn fail<F>(&self, start: usize, len: usize, make: F) -> Error
    where
        F: FnOnce(NamedSource<String>, SourceSpan) -> ParseError,
    {
        let start = start.min(self.text.len());
        let len = len.min(self.text.len() - start);
        let (line, col) = utils::line_col(&self.text, start);
        log::debug!("lex error at line {line}, column {col}");
        make((*self.source).clone(), (start, len).into()).into()
    }
}

fn is_hex_pair(hi: Option<u8>, lo: Option<u8>) -> bool {
    matches!((hi, lo), (Some(h), Some(l)) if h.is_ascii_hexdigit() && l.is_ascii_hexdigit())
}
