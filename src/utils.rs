/// Calculates the 1-based line number for a given byte offset in the source
/// text. Called only when building diagnostics or error reports, so the
/// linear scan is acceptable.
pub fn line_of_offset(source: &str, offset: usize) -> usize {
    let mut line = 1;
    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
        }
    }
    line
}
