use bjson::{parse, CommentPolicy, Error, ParseError};

fn parse_err(input: &str) -> ParseError {
    match parse(input, CommentPolicy::Discard) {
        Err(Error::Parse(e)) => e,
        Err(other) => panic!("expected a parse error, got {other}"),
        Ok(_) => panic!("expected `{input}` to fail"),
    }
}

#[test]
fn empty_input() {
    assert!(matches!(parse_err(""), ParseError::UnexpectedEof { .. }));
    assert!(matches!(parse_err("   \n "), ParseError::UnexpectedEof { .. }));
}

#[test]
fn non_container_root() {
    assert!(matches!(parse_err("7"), ParseError::UnexpectedToken { .. }));
    assert!(matches!(parse_err("null"), ParseError::UnexpectedToken { .. }));
}

#[test]
fn unclosed_containers() {
    assert!(matches!(parse_err("{"), ParseError::UnexpectedEof { .. }));
    assert!(matches!(parse_err("[1, 2"), ParseError::UnexpectedEof { .. }));
    assert!(matches!(
        parse_err(r#"{"a" : {"b" : 1}"#),
        ParseError::UnexpectedEof { .. }
    ));
}

#[test]
fn eof_points_at_the_open_bracket() {
    let err = parse_err("[1, [2");
    assert_eq!(err.offset(), 4);
}

#[test]
fn comma_faults() {
    assert!(matches!(parse_err("[,1]"), ParseError::LeadingComma { .. }));
    assert!(matches!(parse_err("[1,]"), ParseError::TrailingComma { .. }));
    assert!(matches!(parse_err(r#"{"a" : 1,}"#), ParseError::TrailingComma { .. }));
    assert!(matches!(parse_err("[1,,2]"), ParseError::DoubleComma { .. }));
    assert!(matches!(
        parse_err("[1, /*c*/]"),
        ParseError::TrailingComma { .. }
    ));
    assert!(matches!(parse_err("[1 2]"), ParseError::MissingComma { .. }));
    assert!(matches!(
        parse_err(r#"{"a" : 1 "b" : 2}"#),
        ParseError::MissingComma { .. }
    ));
}

#[test]
fn member_shape_faults() {
    assert!(matches!(parse_err(r#"{"a" 1}"#), ParseError::UnexpectedToken { .. }));
    assert!(matches!(parse_err("{1 : 2}"), ParseError::UnexpectedToken { .. }));
    assert!(matches!(parse_err(r#"{"a" :}"#), ParseError::UnexpectedToken { .. }));
    assert!(matches!(parse_err("{:1}"), ParseError::UnexpectedToken { .. }));
}

#[test]
fn lexical_faults() {
    assert!(matches!(parse_err("[@]"), ParseError::UnexpectedCharacter { .. }));
    assert!(matches!(
        parse_err("[\"open"),
        ParseError::Unterminated { what: "string", .. }
    ));
    assert!(matches!(
        parse_err("[truth]"),
        ParseError::UnexpectedToken { .. }
    ));
    assert!(matches!(
        parse_err("[3000000000]"),
        ParseError::InvalidNumber { .. }
    ));
    assert!(matches!(parse_err("[1.2.3]"), ParseError::InvalidNumber { .. }));
    assert!(matches!(parse_err(r#"["\q"]"#), ParseError::InvalidEscape { .. }));
    assert!(matches!(parse_err(r#"["\u12g4"]"#), ParseError::InvalidEscape { .. }));
}

#[test]
fn blob_faults() {
    assert!(matches!(
        parse_err("[b\"ab!\"]"),
        ParseError::InvalidBlobByte { .. }
    ));
    assert!(matches!(
        parse_err("[b\"/1x\"]"),
        ParseError::InvalidBlobByte { .. }
    ));
    assert!(matches!(
        parse_err("[b\"open"),
        ParseError::Unterminated { what: "blob literal", .. }
    ));
}

#[test]
fn trailing_tokens() {
    assert!(matches!(parse_err("[1] [2]"), ParseError::UnexpectedToken { .. }));
    assert!(matches!(parse_err("{} null"), ParseError::UnexpectedToken { .. }));
    // A non-lexable trailer fails earlier, in the scanner.
    assert!(matches!(parse_err("{} x"), ParseError::UnexpectedCharacter { .. }));
}

#[test]
fn rejected_comments() {
    let err = match parse("{/* hi */}", CommentPolicy::Reject) {
        Err(Error::Parse(e)) => e,
        other => panic!("expected a parse error, got {other:?}"),
    };
    assert!(matches!(err, ParseError::CommentsRejected { .. }));
    assert_eq!(err.offset(), 1);
}

#[test]
fn unterminated_comment() {
    assert!(matches!(
        parse_err("{/* no end"),
        ParseError::Unterminated { what: "comment", .. }
    ));
}
