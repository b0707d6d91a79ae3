/// Translates a byte offset into a 1-based (line, column) pair.
/// Offsets past the end clamp to the final position. Columns advance one
/// per byte, an approximation for multi-byte sequences.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let mut line = 1;
    let mut col = 1;
    for byte in source.as_bytes()[..offset].iter() {
        if *byte == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}
