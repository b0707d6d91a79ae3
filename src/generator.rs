//! Renders a [`Tree`] back to text.
//!
//! Two styles: `Compact` is a single line with no whitespace, `Spaced` puts
//! every member on its own line, indented with tabs. Both styles produce
//! text that parses back to an equal tree under the same comment policy.

use crate::blob;
use crate::lexer::CommentPolicy;
use crate::node::{NodeId, Tree, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    /// No whitespace at all.
    Compact,
    /// One member per line, tab indentation.
    #[default]
    Spaced,
}

pub fn generate(tree: &Tree, style: Style, policy: CommentPolicy) -> String {
    let mut out = String::new();
    match style {
        Style::Compact => print_compact(tree, tree.root(), policy, &mut out),
        Style::Spaced => print_spaced(tree, tree.root(), 0, policy, &mut out),
    }
    out
}

/// Children that reach the output: everything except comments, unless the
/// policy keeps them.
fn visible(tree: &Tree, id: NodeId, policy: CommentPolicy) -> Vec<NodeId> {
    tree.children(id)
        .filter(|&child| {
            policy == CommentPolicy::Keep
                || !tree.value(child).is_some_and(Value::is_comment)
        })
        .collect()
}

/// True when a non-comment sibling follows index `at`, which is what
/// decides whether a separator is owed.
fn has_later_value(tree: &Tree, children: &[NodeId], at: usize) -> bool {
    children[at + 1..]
        .iter()
        .any(|&c| !tree.value(c).is_some_and(Value::is_comment))
}

fn print_compact(tree: &Tree, id: NodeId, policy: CommentPolicy, out: &mut String) {
    let Some(value) = tree.value(id) else {
        return;
    };
    match value {
        Value::Object | Value::Array => {
            let (open, close) = brackets(value);
            let is_object = matches!(value, Value::Object);
            out.push(open);
            let children = visible(tree, id, policy);
            for (i, &child) in children.iter().enumerate() {
                let is_comment = tree.value(child).is_some_and(Value::is_comment);
                if is_object && !is_comment {
                    push_quoted(tree.name(child), out);
                    out.push(':');
                }
                print_compact(tree, child, policy, out);
                if !is_comment && has_later_value(tree, &children, i) {
                    out.push(',');
                }
            }
            out.push(close);
        }
        _ => print_leaf(value, out),
    }
}

fn print_spaced(tree: &Tree, id: NodeId, depth: usize, policy: CommentPolicy, out: &mut String) {
    let Some(value) = tree.value(id) else {
        return;
    };
    match value {
        Value::Object | Value::Array => {
            let (open, close) = brackets(value);
            let is_object = matches!(value, Value::Object);
            let children = visible(tree, id, policy);
            if children.is_empty() {
                out.push(open);
                out.push(close);
                return;
            }
            out.push(open);
            out.push('\n');
            for (i, &child) in children.iter().enumerate() {
                let is_comment = tree.value(child).is_some_and(Value::is_comment);
                indent(depth + 1, out);
                if is_object && !is_comment {
                    push_quoted(tree.name(child), out);
                    out.push_str(" : ");
                }
                print_spaced(tree, child, depth + 1, policy, out);
                if !is_comment && has_later_value(tree, &children, i) {
                    out.push(',');
                }
                out.push('\n');
            }
            indent(depth, out);
            out.push(close);
        }
        _ => print_leaf(value, out),
    }
}

fn print_leaf(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => push_quoted(s, out),
        Value::Int(v) => out.push_str(&v.to_string()),
        Value::Float(v) => out.push_str(&format_float(*v)),
        Value::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
        Value::Null => out.push_str("null"),
        Value::Blob(bytes) => out.push_str(&blob::encode(bytes)),
        Value::Comment(text) => {
            out.push_str("/*");
            out.push_str(text);
            out.push_str("*/");
        }
        Value::Object | Value::Array => unreachable!("containers handled by the caller"),
    }
}

fn brackets(value: &Value) -> (char, char) {
    if matches!(value, Value::Object) {
        ('{', '}')
    } else {
        ('[', ']')
    }
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn push_quoted(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Floats keep a decimal point so they re-parse as floats, not ints.
fn format_float(v: f32) -> String {
    let s = v.to_string();
    if v.is_finite() && !s.contains(['.', 'e', 'E']) {
        format!("{s}.0")
    } else {
        s
    }
}
