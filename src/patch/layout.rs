//! Byte-level layout queries on the original source.
//!
//! The differ knows node spans; these helpers answer the questions about
//! the text around them: where a line ends, whether a node sits alone on its
//! lines, and which bytes a deletion should take with it.

use std::ops::Range;

/// Offset of the `\n` ending the line containing `offset`, or the source
/// length on the last line.
pub fn line_end(source: &str, offset: usize) -> usize {
    source[offset..]
        .find('\n')
        .map_or(source.len(), |i| offset + i)
}

/// Offset of the first byte of the line containing `offset`.
pub fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Whether only spaces and tabs precede `offset` on its line.
pub fn starts_line(source: &str, offset: usize) -> bool {
    source[line_start(source, offset)..offset]
        .chars()
        .all(|c| c == ' ' || c == '\t')
}

/// If `offset` is followed by an optional `,` (when `comma` is set), spaces
/// and an optional comment up to the end of the line, the offset of that
/// line end.
pub fn rest_of_line_is_trivia(source: &str, offset: usize, comma: bool) -> Option<usize> {
    let end = line_end(source, offset);
    let mut rest = source[offset..end].trim_start_matches([' ', '\t', '\r']);
    if comma {
        if let Some(after) = rest.strip_prefix(',') {
            rest = after.trim_start_matches([' ', '\t', '\r']);
        }
    }
    (rest.is_empty() || rest.starts_with('#')).then_some(end)
}

/// Offset just past the `,` that follows `offset`, skipping whitespace,
/// newlines and comments in between.
pub fn comma_after(source: &str, offset: usize) -> Option<usize> {
    let mut pos = offset;
    let bytes = source.as_bytes();
    while pos < bytes.len() {
        match bytes[pos] {
            b' ' | b'\t' | b'\r' | b'\n' => pos += 1,
            b'#' => pos = line_end(source, pos),
            b',' => return Some(pos + 1),
            _ => return None,
        }
    }
    None
}

/// Whether the line starting at `start` holds only whitespace.
fn blank_line_at(source: &str, start: usize) -> bool {
    start < source.len()
        && source[start..line_end(source, start)]
            .chars()
            .all(|c| c == ' ' || c == '\t' || c == '\r')
}

/// Whether the line starting at `start` begins with a closing `}`.
fn closes_block(source: &str, start: usize) -> bool {
    source[start..line_end(source, start)]
        .trim_start_matches([' ', '\t'])
        .starts_with('}')
}

/// The bytes to remove when deleting the node, or run of adjacent nodes, at
/// `span`.
///
/// Nodes that have their lines to themselves lose them whole: leading
/// indentation, the nodes, a following separator, a trailing comment and the
/// newline. A blank line left doubled, or left in front of a closing `}` or
/// the end of the file, is removed too. Otherwise only the nodes, their
/// separator and the spaces after them are removed.
pub fn deletion_range(source: &str, span: Range<usize>, comma: bool) -> Range<usize> {
    if starts_line(source, span.start) {
        if let Some(end) = rest_of_line_is_trivia(source, span.end, comma) {
            let start = line_start(source, span.start);
            let mut end = (end + 1).min(source.len());

            let prev_blank = start > 0 && blank_line_at(source, line_start(source, start - 1));
            if prev_blank {
                if blank_line_at(source, end) {
                    end = (line_end(source, end) + 1).min(source.len());
                } else if end == source.len() || closes_block(source, end) {
                    // Nothing follows in this list: take the blank line before
                    return line_start(source, start - 1)..end;
                }
            }
            return start..end;
        }
    }

    let mut end = span.end;
    if comma {
        if let Some(after) = comma_after(source, end) {
            end = after;
        }
    }
    let rest = &source[end..];
    end += rest.len() - rest.trim_start_matches([' ', '\t']).len();

    // Nothing followed the node: take the spaces before it instead
    let mut start = span.start;
    if end == span.end {
        let before = &source[..start];
        start -= before.len() - before.trim_end_matches([' ', '\t']).len();
    }
    start..end
}
