//! Recursive-descent parser building a [`Tree`] from the token stream.
//!
//! A document is exactly one object or array. Separator discipline is
//! strict: between values a single comma, no leading, trailing, or doubled
//! commas. Comments are invisible to that discipline; they are kept,
//! dropped, or rejected according to the [`CommentPolicy`].

use std::sync::Arc;

use miette::{NamedSource, SourceSpan};

use crate::blob;
use crate::error::{Error, ParseError};
use crate::lexer::{CommentPolicy, Lexer, Token, TokenKind};
use crate::node::{NodeId, Tree};
use crate::utils;

pub struct Parser {
    source: Arc<NamedSource<String>>,
    text: String,
    tokens: Vec<Token>,
    position: usize,
    policy: CommentPolicy,
}

impl Parser {
    pub fn new(text: &str, policy: CommentPolicy) -> Result<Self, Error> {
        Parser::new_with_name(text, "input.bjson", policy)
    }

    /// `name` labels the source in rendered diagnostics, typically a file
    /// path.
    pub fn new_with_name(text: &str, name: &str, policy: CommentPolicy) -> Result<Self, Error> {
        let source = Arc::new(NamedSource::new(name, text.to_string()));
        let tokens = Lexer::with_source(text, policy, Arc::clone(&source)).lex()?;
        Ok(Parser {
            source,
            text: text.to_string(),
            tokens,
            position: 0,
            policy,
        })
    }

    /// Parses the whole input into a tree. Anything after the root
    /// container is an error.
    pub fn parse_document(mut self) -> Result<Tree, Error> {
        let Some(&first) = self.tokens.first() else {
            return Err(self.err_eof((self.text.len(), 0).into()));
        };
        let mut tree = match first.kind {
            TokenKind::ObjectOpen => Tree::object(),
            TokenKind::ArrayOpen => Tree::array(),
            _ => return Err(self.err_unexpected(&first, "'{' or '['")),
        };
        self.position = 1;
        let root = tree.root();
        self.parse_container(&mut tree, root, &first)?;
        if let Some(&extra) = self.tokens.get(self.position) {
            return Err(self.err_unexpected(&extra, "end of input"));
        }
        Ok(tree)
    }

    /// Fills `node` with the members of the container opened by `open`,
    /// consuming tokens through the matching close bracket.
    fn parse_container(&mut self, tree: &mut Tree, node: NodeId, open: &Token) -> Result<(), Error> {
        let is_object = open.kind == TokenKind::ObjectOpen;
        let close = if is_object {
            TokenKind::ObjectClose
        } else {
            TokenKind::ArrayClose
        };
        // `started` flips on the first value; `pending` holds a comma still
        // waiting for its value, so a comma left hanging at the close
        // bracket is caught even with comments in between. Comments touch
        // neither.
        let mut started = false;
        let mut pending: Option<Token> = None;
        loop {
            let Some(&token) = self.tokens.get(self.position) else {
                return Err(self.err_eof(open.span()));
            };
            match token.kind {
                k if k == close => {
                    if let Some(comma) = pending {
                        return Err(self.comma_err(comma.span(), CommaFault::Trailing));
                    }
                    self.position += 1;
                    return Ok(());
                }
                TokenKind::Comment => {
                    self.position += 1;
                    if self.policy == CommentPolicy::Keep {
                        let text = self.text[token.start + 2..token.end() - 2].to_string();
                        tree.create_comment(node, text)?;
                    }
                }
                TokenKind::Comma => {
                    if !started {
                        return Err(self.comma_err(token.span(), CommaFault::Leading));
                    }
                    if pending.is_some() {
                        return Err(self.comma_err(token.span(), CommaFault::Double));
                    }
                    pending = Some(token);
                    self.position += 1;
                }
                _ => {
                    if started && pending.is_none() {
                        return Err(self.comma_err(token.span(), CommaFault::Missing));
                    }
                    if is_object {
                        self.parse_member(tree, node, open, &token)?;
                    } else {
                        self.parse_value(tree, node, String::new(), &token)?;
                    }
                    started = true;
                    pending = None;
                }
            }
        }
    }

    /// One `"name" : value` pair inside an object.
    fn parse_member(
        &mut self,
        tree: &mut Tree,
        node: NodeId,
        open: &Token,
        name_token: &Token,
    ) -> Result<(), Error> {
        if name_token.kind != TokenKind::Str {
            return Err(self.err_unexpected(name_token, "a member name string"));
        }
        let name = self.decode_string(name_token)?;
        self.position += 1;
        match self.tokens.get(self.position) {
            Some(t) if t.kind == TokenKind::Colon => self.position += 1,
            Some(&t) => return Err(self.err_unexpected(&t, "':' after the member name")),
            None => return Err(self.err_eof(open.span())),
        }
        let Some(&value) = self.tokens.get(self.position) else {
            return Err(self.err_eof(open.span()));
        };
        self.parse_value(tree, node, name, &value)
    }

    fn parse_value(
        &mut self,
        tree: &mut Tree,
        parent: NodeId,
        name: String,
        token: &Token,
    ) -> Result<(), Error> {
        self.position += 1;
        match token.kind {
            TokenKind::Str => {
                let value = self.decode_string(token)?;
                tree.create_string(parent, value, name)?;
            }
            TokenKind::Int => {
                tree.create_int(parent, self.int_value(token)?, name)?;
            }
            TokenKind::Float => {
                tree.create_float(parent, self.float_value(token)?, name)?;
            }
            TokenKind::True => {
                tree.create_bool(parent, true, name)?;
            }
            TokenKind::False => {
                tree.create_bool(parent, false, name)?;
            }
            TokenKind::Null => {
                tree.create_null(parent, name)?;
            }
            TokenKind::Blob => {
                let inner = &self.text.as_bytes()[token.start + 2..token.end() - 1];
                let bytes = blob::decode(inner).ok_or_else(|| {
                    Error::from(ParseError::InvalidBlobByte {
                        src: self.src(),
                        span: token.span(),
                    })
                })?;
                tree.create_blob(parent, bytes, name)?;
            }
            TokenKind::ObjectOpen => {
                let child = tree.create_object(parent, name)?;
                self.parse_container(tree, child, token)?;
            }
            TokenKind::ArrayOpen => {
                let child = tree.create_array(parent, name)?;
                self.parse_container(tree, child, token)?;
            }
            _ => return Err(self.err_unexpected(token, "a value")),
        }
        Ok(())
    }

    fn int_value(&self, token: &Token) -> Result<i32, Error> {
        self.text[token.start..token.end()].parse().map_err(|_| {
            Error::from(ParseError::InvalidNumber {
                src: self.src(),
                span: token.span(),
                kind: "32-bit integer",
            })
        })
    }

    fn float_value(&self, token: &Token) -> Result<f32, Error> {
        self.text[token.start..token.end()].parse().map_err(|_| {
            Error::from(ParseError::InvalidNumber {
                src: self.src(),
                span: token.span(),
                kind: "float",
            })
        })
    }

    /// Decodes a quoted string token, resolving backslash escapes. A
    /// `\uXXXX` outside the Basic Multilingual Plane's scalar values (a
    /// lone surrogate half) becomes U+FFFD.
    fn decode_string(&self, token: &Token) -> Result<String, Error> {
        let inner = &self.text[token.start + 1..token.end() - 1];
        let base = token.start + 1;
        let mut out = String::with_capacity(inner.len());
        let mut rest = inner;
        let mut consumed = 0usize;
        while let Some(idx) = rest.find('\\') {
            out.push_str(&rest[..idx]);
            let tail = &rest[idx + 1..];
            let (ch, used) = match tail.chars().next() {
                Some('"') => ('"', 2),
                Some('\\') => ('\\', 2),
                Some('/') => ('/', 2),
                Some('b') => ('\u{0008}', 2),
                Some('f') => ('\u{000c}', 2),
                Some('n') => ('\n', 2),
                Some('r') => ('\r', 2),
                Some('t') => ('\t', 2),
                Some('u') => {
                    let hex = tail
                        .get(1..5)
                        .filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()));
                    match hex.and_then(|h| u32::from_str_radix(h, 16).ok()) {
                        Some(code) => (char::from_u32(code).unwrap_or('\u{fffd}'), 6),
                        None => return Err(self.escape_err(base + consumed + idx)),
                    }
                }
                _ => return Err(self.escape_err(base + consumed + idx)),
            };
            out.push(ch);
            rest = &rest[idx + used..];
            consumed += idx + used;
        }
        out.push_str(rest);
        Ok(out)
    }

    fn src(&self) -> NamedSource<String> {
        (*self.source).clone()
    }

    fn err_unexpected(&self, token: &Token, expected: impl Into<String>) -> Error {
        let (line, col) = utils::line_col(&self.text, token.start);
        log::debug!("parse error at line {line}, column {col}");
        ParseError::UnexpectedToken {
            src: self.src(),
            span: token.span(),
            expected: expected.into(),
        }
        .into()
    }

    fn err_eof(&self, span: SourceSpan) -> Error {
        ParseError::UnexpectedEof {
            src: self.src(),
            span,
        }
        .into()
    }

    fn escape_err(&self, offset: usize) -> Error {
        let len = 2.min(self.text.len().saturating_sub(offset));
        ParseError::InvalidEscape {
            src: self.src(),
            span: (offset, len).into(),
        }
        .into()
    }

    fn comma_err(&self, span: SourceSpan, fault: CommaFault) -> Error {
        let src = self.src();
        let err = match fault {
            CommaFault::Missing => ParseError::MissingComma { src, span },
            CommaFault::Leading => ParseError::LeadingComma { src, span },
            CommaFault::Trailing => ParseError::TrailingComma { src, span },
            CommaFault::Double => ParseError::DoubleComma { src, span },
        };
        err.into()
    }
}

enum CommaFault {
    Missing,
    Leading,
    Trailing,
    Double,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Value;

    fn parse(input: &str) -> Result<Tree, Error> {
        Parser::new(input, CommentPolicy::Discard)?.parse_document()
    }

    fn parse_keep(input: &str) -> Result<Tree, Error> {
        Parser::new(input, CommentPolicy::Keep)?.parse_document()
    }

    #[test]
    fn object_document() {
        let tree = parse(r#"{"width" : 640, "title" : "demo", "on" : true}"#).unwrap();
        let root = tree.root();
        assert_eq!(tree.child_count(root), 3);
        let width = tree.child_by_name(root, "width").unwrap();
        assert_eq!(tree.get_int(width), 640);
        let title = tree.child_by_name(root, "title").unwrap();
        assert_eq!(tree.get_string(title), "demo");
        let on = tree.child_by_name(root, "on").unwrap();
        assert!(tree.get_bool(on));
    }

    #[test]
    fn array_document() {
        let tree = parse("[1, 2.5, null, false]").unwrap();
        let root = tree.root();
        assert_eq!(tree.child_count(root), 4);
        assert_eq!(tree.get_float(tree.child(root, 1).unwrap()), 2.5);
        assert_eq!(tree.value(tree.child(root, 2).unwrap()), Some(&Value::Null));
    }

    #[test]
    fn nesting_and_names() {
        let tree = parse(r#"{"a" : {"b" : [10]}}"#).unwrap();
        let a = tree.child_by_name(tree.root(), "a").unwrap();
        let b = tree.child_by_name(a, "b").unwrap();
        let elem = tree.child(b, 0).unwrap();
        assert_eq!(tree.get_int(elem), 10);
        assert_eq!(tree.name(elem), "");
        assert_eq!(tree.depth(elem), 3);
    }

    #[test]
    fn string_escapes() {
        let tree = parse(r#"["a\"b\\c\n\tA\ud800"]"#).unwrap();
        let s = tree.child(tree.root(), 0).unwrap();
        assert_eq!(tree.get_string(s), "a\"b\\c\n\tA\u{fffd}");
    }

    #[test]
    fn blob_value() {
        let tree = parse("[b\"hi/00\"]").unwrap();
        let blob = tree.child(tree.root(), 0).unwrap();
        assert_eq!(tree.get_blob(blob), &[b'h', b'i', 0x00]);
    }

    #[test]
    fn root_must_be_a_container() {
        assert!(parse("42").is_err());
        assert!(parse("\"hi\"").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn trailing_tokens_rejected() {
        assert!(parse("[1] 2").is_err());
        assert!(parse("{} {}").is_err());
    }

    #[test]
    fn comment_kept_or_dropped() {
        let dropped = parse(r#"{/* hi */ "a" : 1}"#).unwrap();
        assert_eq!(dropped.child_count(dropped.root()), 1);

        let kept = parse_keep(r#"{/* hi */ "a" : 1}"#).unwrap();
        assert_eq!(kept.child_count(kept.root()), 2);
        let comment = kept.child(kept.root(), 0).unwrap();
        assert_eq!(kept.get_comment(comment), " hi ");
    }

    #[test]
    fn comments_do_not_separate_values() {
        // A comment is not a value, so no comma is owed around it.
        assert!(parse("[1, /* c */ 2]").is_ok());
        assert!(parse("[1 /* c */, 2]").is_ok());
        assert!(parse("[1 /* c */ 2]").is_err());
    }

    #[test]
    fn comment_cannot_hide_a_trailing_comma() {
        assert!(parse("[1, /*c*/]").is_err());
        assert!(parse(r#"{"a" : 1, /*c*/}"#).is_err());
        assert!(parse_keep("[1, /*c*/]").is_err());
        assert!(parse("[1, /*c*/ /*d*/]").is_err());
    }

    #[test]
    fn comma_discipline() {
        assert!(parse("[1, 2]").is_ok());
        assert!(parse(r#"{"a" : 1, "b" : 2}"#).is_ok());
        assert!(parse("[,1]").is_err());
        assert!(parse("[1,]").is_err());
        assert!(parse("[1,,2]").is_err());
        assert!(parse(r#"{"a" : 1,}"#).is_err());
        assert!(parse(r#"{"a" : 1 "b" : 2}"#).is_err());
    }

    #[test]
    fn member_errors() {
        assert!(parse(r#"{"a" 1}"#).is_err());
        assert!(parse(r#"{1 : 2}"#).is_err());
        assert!(parse(r#"{"a" : }"#).is_err());
        assert!(parse(r#"{"a" : 1"#).is_err());
    }

    #[test]
    fn error_offsets_point_at_the_fault() {
        let err = parse("[1,,2]").unwrap_err();
        match err {
            Error::Parse(e) => assert_eq!(e.offset(), 3),
            other => panic!("unexpected error: {other}"),
        }
    }
}
