//! Text form of binary payloads: a `b"..."` literal where alphanumeric
//! bytes and spaces appear verbatim and every other byte is written as `/`
//! followed by two lowercase hex digits.

/// Renders `bytes` as a complete blob literal including the `b"` prefix and
/// closing quote.
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 3);
    out.push_str("b\"");
    for &byte in bytes {
        if byte.is_ascii_alphanumeric() || byte == b' ' {
            out.push(byte as char);
        } else {
            out.push('/');
            out.push(hex_digit(byte >> 4));
            out.push(hex_digit(byte & 0x0f));
        }
    }
    out.push('"');
    out
}

fn hex_digit(nibble: u8) -> char {
    char::from_digit(nibble as u32, 16).unwrap_or('0')
}

/// Decodes the literal's inner content (the bytes between the quotes).
/// `None` when an escape is malformed.
pub fn decode(content: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(content.len());
    let mut i = 0;
    while i < content.len() {
        let byte = content[i];
        if byte == b'/' {
            let hi = hex_value(*content.get(i + 1)?)?;
            let lo = hex_value(*content.get(i + 2)?)?;
            out.push((hi << 4) | lo);
            i += 3;
        } else if byte.is_ascii_alphanumeric() || byte == b' ' {
            out.push(byte);
            i += 1;
        } else {
            return None;
        }
    }
    Some(out)
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|v| v as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_bytes_stay_verbatim() {
        assert_eq!(encode(b"abc 123"), "b\"abc 123\"");
        assert_eq!(decode(b"abc 123").unwrap(), b"abc 123");
    }

    #[test]
    fn non_alphanumeric_bytes_escape() {
        assert_eq!(encode(&[0x00, 0xff, b'/']), "b\"/00/ff/2f\"");
        assert_eq!(decode(b"/00/ff/2f").unwrap(), vec![0x00, 0xff, 0x2f]);
    }

    #[test]
    fn empty_blob() {
        assert_eq!(encode(&[]), "b\"\"");
        assert_eq!(decode(b"").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn malformed_escapes_rejected() {
        assert!(decode(b"/0").is_none());
        assert!(decode(b"/zz").is_none());
        assert!(decode(b"\x01").is_none());
    }

    #[test]
    fn round_trips_every_byte() {
        let all: Vec<u8> = (0..=255).collect();
        let literal = encode(&all);
        let inner = &literal.as_bytes()[2..literal.len() - 1];
        assert_eq!(decode(inner).unwrap(), all);
    }
}
