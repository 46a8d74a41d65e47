//! Range resolution helpers for removal requests.
//!
//! A declaration's syntactic range does not always cover everything that has
//! to disappear with it: a class or alias declaration does not own its
//! trailing `;`, and preprocessor directives are removed as whole lines.
//! The helpers here extend raw spans to the byte-exact ranges handed to the
//! text-editing engine.

/// Find the statement terminator following `pos`, skipping whitespace.
///
/// Returns the exclusive end offset just past the `;`, or `None` if the next
/// non-whitespace character is not a terminator.
pub fn terminator_after(source: &str, pos: usize) -> Option<usize> {
    let rest = source.get(pos..)?;
    let offset = rest.find(|c: char| !c.is_whitespace())?;
    if rest[offset..].starts_with(';') {
        Some(pos + offset + 1)
    } else {
        None
    }
}

/// Byte offset of the first character of the line containing `pos`
pub fn line_start(source: &str, pos: usize) -> usize {
    let pos = pos.min(source.len());
    source[..pos].rfind('\n').map_or(0, |nl| nl + 1)
}

/// Byte offset just past the last character of the line containing `pos`,
/// excluding the newline itself
pub fn line_end(source: &str, pos: usize) -> usize {
    let pos = pos.min(source.len());
    source[pos..].find('\n').map_or(source.len(), |nl| pos + nl)
}
