use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Top-level error type covering the three failure kinds: malformed input
/// (text or binary), illegal tree mutation, and file IO.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Tree(#[from] TreeError),

    #[error("could not open '{path}' for {direction}")]
    #[diagnostic(code(bjson::io))]
    Io {
        path: String,
        direction: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Malformed input. Text variants carry the source and a labeled span so
/// miette can render the offending line with a caret; binary variants carry
/// the byte offset where the failed read began.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ParseError {
    #[error("Unexpected token")]
    #[diagnostic(
        code(parser::unexpected_token),
        help("The parser found a token it did not expect in this position.")
    )]
    UnexpectedToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected {expected}, but found this")]
        span: SourceSpan,
        expected: String,
    },

    #[error("Unexpected end of input")]
    #[diagnostic(
        code(parser::unexpected_eof),
        help("The input ended while this container was still open.")
    )]
    UnexpectedEof {
        #[source_code]
        src: NamedSource<String>,
        #[label("This was never closed")]
        span: SourceSpan,
    },

    #[error("Unexpected character")]
    #[diagnostic(code(tokenizer::unexpected_character))]
    UnexpectedCharacter {
        #[source_code]
        src: NamedSource<String>,
        #[label("This byte has no meaning here")]
        span: SourceSpan,
    },

    #[error("Unterminated {what}")]
    #[diagnostic(code(tokenizer::unterminated))]
    Unterminated {
        #[source_code]
        src: NamedSource<String>,
        #[label("Opened here, never closed")]
        span: SourceSpan,
        what: &'static str,
    },

    #[error("Invalid escape sequence")]
    #[diagnostic(
        code(tokenizer::invalid_escape),
        help("Recognized escapes are \\\\ \\/ \\\" \\b \\f \\n \\r \\t and \\uXXXX.")
    )]
    InvalidEscape {
        #[source_code]
        src: NamedSource<String>,
        #[label("Not a recognized escape")]
        span: SourceSpan,
    },

    #[error("Invalid number")]
    #[diagnostic(code(tokenizer::invalid_number))]
    InvalidNumber {
        #[source_code]
        src: NamedSource<String>,
        #[label("Does not parse as a {kind}")]
        span: SourceSpan,
        kind: &'static str,
    },

    #[error("Invalid blob byte")]
    #[diagnostic(
        code(tokenizer::invalid_blob_byte),
        help("Blob literals hold alphanumeric/space bytes and /HH hex escapes.")
    )]
    InvalidBlobByte {
        #[source_code]
        src: NamedSource<String>,
        #[label("Not a legal blob character")]
        span: SourceSpan,
    },

    #[error("Comments are not allowed")]
    #[diagnostic(
        code(tokenizer::comment_rejected),
        help("Parse with CommentPolicy::Discard or CommentPolicy::Keep to allow comments.")
    )]
    CommentsRejected {
        #[source_code]
        src: NamedSource<String>,
        #[label("Comment starts here")]
        span: SourceSpan,
    },

    #[error("Missing ',' between values")]
    #[diagnostic(code(parser::missing_comma))]
    MissingComma {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected ',' before this")]
        span: SourceSpan,
    },

    #[error("Unexpected ',' before any value")]
    #[diagnostic(code(parser::leading_comma))]
    LeadingComma {
        #[source_code]
        src: NamedSource<String>,
        #[label("Nothing precedes this separator")]
        span: SourceSpan,
    },

    #[error("Trailing ',' before closing bracket")]
    #[diagnostic(code(parser::trailing_comma))]
    TrailingComma {
        #[source_code]
        src: NamedSource<String>,
        #[label("No value follows this separator")]
        span: SourceSpan,
    },

    #[error("Repeated ','")]
    #[diagnostic(code(parser::double_comma))]
    DoubleComma {
        #[source_code]
        src: NamedSource<String>,
        #[label("A separator directly follows another")]
        span: SourceSpan,
    },

    #[error("Unexpected end of data at byte {offset}, expected {expected}")]
    #[diagnostic(code(binary::truncated))]
    Truncated { offset: usize, expected: &'static str },

    #[error("Root tag {tag} is not an object or array")]
    #[diagnostic(code(binary::bad_root))]
    BadRootTag { tag: u8 },

    #[error("Unknown tag {tag} at byte {offset}")]
    #[diagnostic(code(binary::unknown_tag))]
    UnknownTag { offset: usize, tag: u8 },

    #[error("Comment record at byte {offset} but comments are not allowed")]
    #[diagnostic(code(binary::comment_rejected))]
    CommentNotAllowed { offset: usize },

    #[error("Negative blob length {len} at byte {offset}")]
    #[diagnostic(code(binary::invalid_blob_length))]
    InvalidBlobLength { offset: usize, len: i32 },
}

impl ParseError {
    /// Byte offset of the failure in the original input, for either format.
    pub fn offset(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEof { span, .. }
            | ParseError::UnexpectedCharacter { span, .. }
            | ParseError::Unterminated { span, .. }
            | ParseError::InvalidEscape { span, .. }
            | ParseError::InvalidNumber { span, .. }
            | ParseError::InvalidBlobByte { span, .. }
            | ParseError::CommentsRejected { span, .. }
            | ParseError::MissingComma { span, .. }
            | ParseError::LeadingComma { span, .. }
            | ParseError::TrailingComma { span, .. }
            | ParseError::DoubleComma { span, .. } => span.offset(),
            ParseError::Truncated { offset, .. }
            | ParseError::UnknownTag { offset, .. }
            | ParseError::CommentNotAllowed { offset, .. }
            | ParseError::InvalidBlobLength { offset, .. } => *offset,
            ParseError::BadRootTag { .. } => 0,
        }
    }
}

/// Illegal structural mutation of the document tree.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Cannot add a child to a non-container node")]
    #[diagnostic(code(tree::not_a_container))]
    NotAContainer,

    #[error("Cannot attach a node beneath itself")]
    #[diagnostic(code(tree::self_child))]
    SelfChild,

    #[error("Node already has a parent")]
    #[diagnostic(code(tree::already_parented))]
    AlreadyParented,

    #[error("Node handle does not refer to a live node")]
    #[diagnostic(code(tree::stale_node))]
    StaleNode,
}
