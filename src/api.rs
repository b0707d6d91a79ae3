//! Convenience entry points: parse and generate either format, from memory
//! or from disk, and convert documents to standard JSON or YAML.

use std::fs;
use std::path::Path;

use crate::binary;
use crate::error::Error;
use crate::generator::{self, Style};
use crate::lexer::CommentPolicy;
use crate::node::Tree;
use crate::parser::Parser;
use crate::serialization;

/// Parses text into a document tree.
pub fn parse(text: &str, policy: CommentPolicy) -> Result<Tree, Error> {
    Parser::new(text, policy)?.parse_document()
}

/// Like [`parse`], labeling diagnostics with `name` instead of the default
/// source name.
pub fn parse_with_name(text: &str, name: &str, policy: CommentPolicy) -> Result<Tree, Error> {
    Parser::new_with_name(text, name, policy)?.parse_document()
}

/// Reads and parses a text document from disk.
pub fn parse_file(path: impl AsRef<Path>, policy: CommentPolicy) -> Result<Tree, Error> {
    let path = path.as_ref();
    log::debug!("parsing {}", path.display());
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        direction: "reading",
        source,
    })?;
    parse_with_name(&text, &path.display().to_string(), policy)
}

/// Renders a tree as text.
pub fn generate(tree: &Tree, style: Style, policy: CommentPolicy) -> String {
    generator::generate(tree, style, policy)
}

/// Renders a tree as text and writes it to disk.
pub fn generate_file(
    tree: &Tree,
    path: impl AsRef<Path>,
    style: Style,
    policy: CommentPolicy,
) -> Result<(), Error> {
    let path = path.as_ref();
    log::debug!("writing {}", path.display());
    fs::write(path, generator::generate(tree, style, policy)).map_err(|source| Error::Io {
        path: path.display().to_string(),
        direction: "writing",
        source,
    })
}

/// Serializes a tree to the binary format.
pub fn encode(tree: &Tree, policy: CommentPolicy) -> Vec<u8> {
    binary::encode(tree, policy)
}

/// Serializes a tree to the binary format and writes it to disk.
pub fn encode_file(
    tree: &Tree,
    path: impl AsRef<Path>,
    policy: CommentPolicy,
) -> Result<(), Error> {
    let path = path.as_ref();
    log::debug!("writing {}", path.display());
    fs::write(path, binary::encode(tree, policy)).map_err(|source| Error::Io {
        path: path.display().to_string(),
        direction: "writing",
        source,
    })
}

/// Deserializes a binary document.
pub fn decode(data: &[u8], policy: CommentPolicy) -> Result<Tree, Error> {
    binary::decode(data, policy)
}

/// Reads and deserializes a binary document from disk.
pub fn decode_file(path: impl AsRef<Path>, policy: CommentPolicy) -> Result<Tree, Error> {
    let path = path.as_ref();
    log::debug!("decoding {}", path.display());
    let data = fs::read(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        direction: "reading",
        source,
    })?;
    binary::decode(&data, policy)
}

/// Renders a tree as pretty-printed standard JSON. Comments are dropped and
/// blobs appear as their literal text.
pub fn to_json(tree: &Tree) -> String {
    let value = serialization::to_value(tree, tree.root());
    serde_json::to_string_pretty(&value).unwrap_or_default()
}

/// Renders a tree as YAML, with the same lossy rules as [`to_json`].
pub fn to_yaml(tree: &Tree) -> String {
    let value = serialization::to_value(tree, tree.root());
    serde_yaml::to_string(&value).unwrap_or_default()
}
