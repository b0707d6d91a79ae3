//! Tagged binary form of a document.
//!
//! Every record is a one-byte tag followed by its payload. Object members
//! are prefixed with a zero-terminated name; array elements have no name.
//! A container's member list runs until the end marker. Multi-byte scalars
//! are big-endian regardless of host, and integers are written with the
//! narrowest of the three int tags that holds the value.

use crate::error::{Error, ParseError};
use crate::lexer::CommentPolicy;
use crate::node::{NodeId, Tree, Value};

pub const TAG_OBJECT: u8 = 1;
pub const TAG_ARRAY: u8 = 2;
pub const TAG_STRING: u8 = 3;
pub const TAG_INT8: u8 = 4;
pub const TAG_INT16: u8 = 5;
pub const TAG_INT32: u8 = 6;
pub const TAG_FLOAT: u8 = 7;
pub const TAG_BOOL_TRUE: u8 = 8;
pub const TAG_BOOL_FALSE: u8 = 9;
pub const TAG_NULL: u8 = 10;
pub const TAG_BLOB: u8 = 11;
pub const TAG_COMMENT: u8 = 12;
pub const TAG_CONTAINER_END: u8 = 13;

/// Serializes a tree. Comments are written only under
/// [`CommentPolicy::Keep`]; encoding itself cannot fail.
pub fn encode(tree: &Tree, policy: CommentPolicy) -> Vec<u8> {
    let mut writer = Writer::new();
    let root = tree.root();
    let tag = match tree.value(root) {
        Some(Value::Array) => TAG_ARRAY,
        _ => TAG_OBJECT,
    };
    writer.write_u8(tag);
    encode_children(tree, root, policy, &mut writer);
    writer.write_u8(TAG_CONTAINER_END);
    writer.into_bytes()
}

fn encode_children(tree: &Tree, id: NodeId, policy: CommentPolicy, writer: &mut Writer) {
    let is_object = matches!(tree.value(id), Some(Value::Object));
    for child in tree.children(id) {
        let Some(value) = tree.value(child) else {
            continue;
        };
        if value.is_comment() && policy != CommentPolicy::Keep {
            continue;
        }
        if is_object {
            // Comment records in an object carry an empty name.
            writer.write_cstr(tree.name(child));
        }
        encode_value(tree, child, value, policy, writer);
    }
}

fn encode_value(tree: &Tree, id: NodeId, value: &Value, policy: CommentPolicy, writer: &mut Writer) {
    match value {
        Value::Object => {
            writer.write_u8(TAG_OBJECT);
            encode_children(tree, id, policy, writer);
            writer.write_u8(TAG_CONTAINER_END);
        }
        Value::Array => {
            writer.write_u8(TAG_ARRAY);
            encode_children(tree, id, policy, writer);
            writer.write_u8(TAG_CONTAINER_END);
        }
        Value::String(s) => {
            writer.write_u8(TAG_STRING);
            writer.write_cstr(s);
        }
        Value::Int(v) => match *v {
            v if i8::try_from(v).is_ok() => {
                writer.write_u8(TAG_INT8);
                writer.write_i8(v as i8);
            }
            v if i16::try_from(v).is_ok() => {
                writer.write_u8(TAG_INT16);
                writer.write_i16(v as i16);
            }
            v => {
                writer.write_u8(TAG_INT32);
                writer.write_i32(v);
            }
        },
        Value::Float(v) => {
            writer.write_u8(TAG_FLOAT);
            writer.write_f32(*v);
        }
        Value::Bool(v) => {
            writer.write_u8(if *v { TAG_BOOL_TRUE } else { TAG_BOOL_FALSE });
        }
        Value::Null => writer.write_u8(TAG_NULL),
        Value::Blob(bytes) => {
            writer.write_u8(TAG_BLOB);
            writer.write_i32(bytes.len() as i32);
            writer.write_bytes(bytes);
        }
        Value::Comment(text) => {
            writer.write_u8(TAG_COMMENT);
            writer.write_cstr(text);
        }
    }
}

/// Deserializes a document. Trailing bytes after the root's end marker are
/// ignored.
pub fn decode(data: &[u8], policy: CommentPolicy) -> Result<Tree, Error> {
    log::trace!("decoding {} bytes", data.len());
    let mut reader = Reader::new(data);
    let mut tree = match reader.read_u8("a root tag")? {
        TAG_OBJECT => Tree::object(),
        TAG_ARRAY => Tree::array(),
        tag => return Err(ParseError::BadRootTag { tag }.into()),
    };
    let root = tree.root();
    decode_into(&mut reader, &mut tree, root, policy)?;
    Ok(tree)
}

fn decode_into(
    reader: &mut Reader<'_>,
    tree: &mut Tree,
    node: NodeId,
    policy: CommentPolicy,
) -> Result<(), Error> {
    let is_object = matches!(tree.value(node), Some(Value::Object));
    loop {
        let mark = reader.pos;
        if reader.read_u8("a member tag or container end")? == TAG_CONTAINER_END {
            return Ok(());
        }
        reader.pos = mark;
        let name = if is_object {
            reader.read_cstr("a member name")?
        } else {
            String::new()
        };
        let tag_offset = reader.pos;
        let tag = reader.read_u8("a value tag")?;
        match tag {
            TAG_OBJECT => {
                let child = tree.create_object(node, name)?;
                decode_into(reader, tree, child, policy)?;
            }
            TAG_ARRAY => {
                let child = tree.create_array(node, name)?;
                decode_into(reader, tree, child, policy)?;
            }
            TAG_STRING => {
                let value = reader.read_cstr("a string value")?;
                tree.create_string(node, value, name)?;
            }
            TAG_INT8 => {
                let value = reader.read_i8("an 8-bit int")? as i32;
                tree.create_int(node, value, name)?;
            }
            TAG_INT16 => {
                let value = reader.read_i16("a 16-bit int")? as i32;
                tree.create_int(node, value, name)?;
            }
            TAG_INT32 => {
                let value = reader.read_i32("a 32-bit int")?;
                tree.create_int(node, value, name)?;
            }
            TAG_FLOAT => {
                let value = reader.read_f32("a float")?;
                tree.create_float(node, value, name)?;
            }
            TAG_BOOL_TRUE => {
                tree.create_bool(node, true, name)?;
            }
            TAG_BOOL_FALSE => {
                tree.create_bool(node, false, name)?;
            }
            TAG_NULL => {
                tree.create_null(node, name)?;
            }
            TAG_BLOB => {
                let len_offset = reader.pos;
                let len = reader.read_i32("a blob length")?;
                if len < 0 {
                    return Err(ParseError::InvalidBlobLength {
                        offset: len_offset,
                        len,
                    }
                    .into());
                }
                let bytes = reader.read_bytes(len as usize, "blob bytes")?;
                tree.create_blob(node, bytes.to_vec(), name)?;
            }
            TAG_COMMENT => {
                let text = reader.read_cstr("comment text")?;
                match policy {
                    CommentPolicy::Reject => {
                        return Err(ParseError::CommentNotAllowed { offset: tag_offset }.into());
                    }
                    CommentPolicy::Discard => {}
                    CommentPolicy::Keep => {
                        tree.create_comment(node, text)?;
                    }
                }
            }
            tag => {
                return Err(ParseError::UnknownTag {
                    offset: tag_offset,
                    tag,
                }
                .into());
            }
        }
    }
}

struct Writer {
    data: Vec<u8>,
}

impl Writer {
    fn new() -> Self {
        Writer { data: Vec::new() }
    }

    fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    fn write_i8(&mut self, v: i8) {
        self.data.push(v as u8);
    }

    fn write_i16(&mut self, v: i16) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    fn write_f32(&mut self, v: f32) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    fn write_cstr(&mut self, s: &str) {
        self.data.extend_from_slice(s.as_bytes());
        self.data.push(0);
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    fn truncated(&self, offset: usize, expected: &'static str) -> Error {
        ParseError::Truncated { offset, expected }.into()
    }

    fn read_u8(&mut self, expected: &'static str) -> Result<u8, Error> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or_else(|| self.truncated(self.pos, expected))?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_i8(&mut self, expected: &'static str) -> Result<i8, Error> {
        Ok(self.read_u8(expected)? as i8)
    }

    fn read_i16(&mut self, expected: &'static str) -> Result<i16, Error> {
        let bytes = self.read_array::<2>(expected)?;
        Ok(i16::from_be_bytes(bytes))
    }

    fn read_i32(&mut self, expected: &'static str) -> Result<i32, Error> {
        let bytes = self.read_array::<4>(expected)?;
        Ok(i32::from_be_bytes(bytes))
    }

    fn read_f32(&mut self, expected: &'static str) -> Result<f32, Error> {
        let bytes = self.read_array::<4>(expected)?;
        Ok(f32::from_be_bytes(bytes))
    }

    fn read_array<const N: usize>(&mut self, expected: &'static str) -> Result<[u8; N], Error> {
        let slice = self.read_bytes(N, expected)?;
        slice
            .try_into()
            .map_err(|_| self.truncated(self.pos, expected))
    }

    fn read_bytes(&mut self, len: usize, expected: &'static str) -> Result<&'a [u8], Error> {
        let start = self.pos;
        let slice = self
            .data
            .get(start..start + len)
            .ok_or_else(|| self.truncated(start, expected))?;
        self.pos += len;
        Ok(slice)
    }

    /// Reads up to the next zero byte. Non-UTF-8 bytes are replaced rather
    /// than rejected.
    fn read_cstr(&mut self, expected: &'static str) -> Result<String, Error> {
        let start = self.pos;
        let end = self.data[start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| self.truncated(start, expected))?;
        let s = String::from_utf8_lossy(&self.data[start..start + end]).into_owned();
        self.pos = start + end + 1;
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree {
        let mut tree = Tree::object();
        let root = tree.root();
        tree.create_int(root, 100, "small").unwrap();
        tree.create_int(root, 1000, "medium").unwrap();
        tree.create_int(root, 100_000, "large").unwrap();
        tree.create_float(root, 1.5, "ratio").unwrap();
        let list = tree.create_array(root, "list").unwrap();
        tree.create_bool(list, true, "").unwrap();
        tree.create_null(list, "").unwrap();
        tree.create_blob(root, vec![0xde, 0xad], "raw").unwrap();
        tree
    }

    #[test]
    fn round_trip_preserves_structure() {
        let original = sample();
        let bytes = encode(&original, CommentPolicy::Discard);
        let decoded = decode(&bytes, CommentPolicy::Discard).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn narrowest_int_tags() {
        let mut tree = Tree::array();
        let root = tree.root();
        tree.create_int(root, 127, "").unwrap();
        tree.create_int(root, 128, "").unwrap();
        tree.create_int(root, 32767, "").unwrap();
        tree.create_int(root, 32768, "").unwrap();
        tree.create_int(root, -128, "").unwrap();
        tree.create_int(root, -129, "").unwrap();

        let bytes = encode(&tree, CommentPolicy::Discard);
        // Root tag, then tag+payload per element.
        let mut tags = Vec::new();
        let mut pos = 1;
        while bytes[pos] != TAG_CONTAINER_END {
            tags.push(bytes[pos]);
            pos += 1 + match bytes[pos] {
                TAG_INT8 => 1,
                TAG_INT16 => 2,
                _ => 4,
            };
        }
        assert_eq!(
            tags,
            vec![TAG_INT8, TAG_INT16, TAG_INT16, TAG_INT32, TAG_INT8, TAG_INT16]
        );
        assert_eq!(decode(&bytes, CommentPolicy::Discard).unwrap(), tree);
    }

    #[test]
    fn scalars_are_big_endian() {
        let mut tree = Tree::array();
        let root = tree.root();
        tree.create_int(root, 0x0102_0304, "").unwrap();
        let bytes = encode(&tree, CommentPolicy::Discard);
        assert_eq!(&bytes[..7], &[TAG_ARRAY, TAG_INT32, 1, 2, 3, 4, TAG_CONTAINER_END]);
    }

    #[test]
    fn object_member_names_survive() {
        let mut tree = Tree::object();
        let root = tree.root();
        tree.create_blob(root, vec![1, 2, 3], "payload").unwrap();
        let bytes = encode(&tree, CommentPolicy::Discard);
        let decoded = decode(&bytes, CommentPolicy::Discard).unwrap();
        let node = decoded.child_by_name(decoded.root(), "payload").unwrap();
        assert_eq!(decoded.get_blob(node), &[1, 2, 3]);
    }

    #[test]
    fn bad_root_tag() {
        assert!(matches!(
            decode(&[TAG_STRING], CommentPolicy::Discard),
            Err(Error::Parse(ParseError::BadRootTag { tag: TAG_STRING }))
        ));
        assert!(decode(&[], CommentPolicy::Discard).is_err());
    }

    #[test]
    fn truncation_always_raises() {
        let bytes = encode(&sample(), CommentPolicy::Discard);
        for cut in 0..bytes.len() - 1 {
            assert!(
                decode(&bytes[..cut], CommentPolicy::Discard).is_err(),
                "no error after cutting to {cut} bytes"
            );
        }
    }

    #[test]
    fn unknown_tag_reports_offset() {
        let bytes = [TAG_ARRAY, 200, TAG_CONTAINER_END];
        match decode(&bytes, CommentPolicy::Discard) {
            Err(Error::Parse(ParseError::UnknownTag { offset, tag })) => {
                assert_eq!((offset, tag), (1, 200));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn negative_blob_length_rejected() {
        let mut bytes = vec![TAG_ARRAY, TAG_BLOB];
        bytes.extend_from_slice(&(-1i32).to_be_bytes());
        bytes.push(TAG_CONTAINER_END);
        assert!(matches!(
            decode(&bytes, CommentPolicy::Discard),
            Err(Error::Parse(ParseError::InvalidBlobLength { len: -1, .. }))
        ));
    }

    #[test]
    fn comment_policy_over_the_wire() {
        let mut tree = Tree::object();
        let root = tree.root();
        tree.create_comment(root, "note").unwrap();
        tree.create_int(root, 1, "a").unwrap();

        let kept = encode(&tree, CommentPolicy::Keep);
        let back = decode(&kept, CommentPolicy::Keep).unwrap();
        assert_eq!(back, tree);

        let dropped = decode(&kept, CommentPolicy::Discard).unwrap();
        assert_eq!(dropped.child_count(dropped.root()), 1);

        assert!(matches!(
            decode(&kept, CommentPolicy::Reject),
            Err(Error::Parse(ParseError::CommentNotAllowed { .. }))
        ));

        // Without Keep the writer omits comments entirely.
        let without = encode(&tree, CommentPolicy::Discard);
        let back = decode(&without, CommentPolicy::Keep).unwrap();
        assert_eq!(back.child_count(back.root()), 1);
    }

    #[test]
    fn trailing_bytes_ignored() {
        let mut bytes = encode(&sample(), CommentPolicy::Discard);
        bytes.extend_from_slice(b"junk");
        assert!(decode(&bytes, CommentPolicy::Discard).is_ok());
    }
}
