//! Bridge into serde so a document can be re-emitted as standard JSON or
//! YAML. Comments have no representation there and are skipped; duplicate
//! member names collapse to the last one, matching name lookup.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::blob;
use crate::node::{NodeId, Tree, Value as NodeValue};

#[derive(Serialize, Debug, PartialEq)]
#[serde(untagged)]
pub(crate) enum Value {
    String(String),
    Int(i32),
    Float(f32),
    Boolean(bool),
    Null,
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

pub(crate) fn to_value(tree: &Tree, id: NodeId) -> Value {
    match tree.value(id) {
        Some(NodeValue::Object) => {
            let mut map = BTreeMap::new();
            for child in tree.children(id) {
                if tree.value(child).is_some_and(NodeValue::is_comment) {
                    continue;
                }
                map.insert(tree.name(child).to_string(), to_value(tree, child));
            }
            Value::Object(map)
        }
        Some(NodeValue::Array) => Value::Array(
            tree.children(id)
                .filter(|&c| !tree.value(c).is_some_and(NodeValue::is_comment))
                .map(|c| to_value(tree, c))
                .collect(),
        ),
        Some(NodeValue::String(s)) => Value::String(s.clone()),
        Some(NodeValue::Int(v)) => Value::Int(*v),
        Some(NodeValue::Float(v)) => Value::Float(*v),
        Some(NodeValue::Bool(v)) => Value::Boolean(*v),
        // Blobs have no JSON equivalent; they appear as their literal text.
        Some(NodeValue::Blob(bytes)) => Value::String(blob::encode(bytes)),
        Some(NodeValue::Null) | Some(NodeValue::Comment(_)) | None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_are_dropped_and_duplicates_collapse() {
        let mut tree = Tree::object();
        let root = tree.root();
        tree.create_comment(root, "c").unwrap();
        tree.create_int(root, 1, "a").unwrap();
        tree.create_int(root, 2, "a").unwrap();

        let value = to_value(&tree, root);
        let Value::Object(map) = value else {
            panic!("expected an object");
        };
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("a"), Some(&Value::Int(2)));
    }

    #[test]
    fn blob_appears_as_literal_text() {
        let mut tree = Tree::array();
        let root = tree.root();
        tree.create_blob(root, vec![0x01], "").unwrap();
        let value = to_value(&tree, root);
        assert_eq!(value, Value::Array(vec![Value::String("b\"/01\"".into())]));
    }
}
