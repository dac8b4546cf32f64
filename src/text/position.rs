use tower_lsp_server::ls_types::Position;

/// Line layout of a document, for mapping LSP positions.
///
/// LSP positions count UTF-16 code units within a line; lines end at `\n`,
/// `\r\n` or a lone `\r`.
pub struct LineIndex<'a> {
    text: &'a str,
    /// Byte offset where each line starts
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            line_starts: compute_line_starts(text),
        }
    }

    /// Content of `line` without its terminator.
    fn line_text(&self, line: usize) -> Option<&'a str> {
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.text.len());
        let line_text = &self.text[start..end];
        Some(
            line_text
                .strip_suffix("\r\n")
                .or_else(|| line_text.strip_suffix('\n'))
                .or_else(|| line_text.strip_suffix('\r'))
                .unwrap_or(line_text),
        )
    }

    /// UTF-16 offset of `position` from the start of the document.
    ///
    /// Characters past the end of a line clamp to the line end; lines past
    /// the end of the document clamp to the document end.
    pub fn utf16_offset(&self, position: Position) -> usize {
        let line = position.line as usize;
        let Some(line_text) = self.line_text(line) else {
            return utf16_len(self.text);
        };
        let line_start = self.line_starts[line];
        let before = utf16_len(&self.text[..line_start]);
        before + (position.character as usize).min(utf16_len(line_text))
    }

    /// Position just past the last character.
    pub fn end_position(&self) -> Position {
        let last = self.line_starts.len() - 1;
        let character = self.line_text(last).map(utf16_len).unwrap_or(0);
        Position {
            line: last as u32,
            character: character as u32,
        }
    }
}

/// Compute line start offsets, treating `\n`, `\r\n` and `\r` as breaks.
pub fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut line_starts = vec![0];
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => line_starts.push(i + 1),
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                i += 1;
                line_starts.push(i + 1);
            }
            b'\r' => line_starts.push(i + 1),
            _ => {}
        }
        i += 1;
    }

    line_starts
}

#[inline]
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32, character: u32) -> Position {
        Position { line, character }
    }

    #[test]
    fn line_starts_handle_all_terminators() {
        assert_eq!(compute_line_starts("a\nb\r\nc\rd"), vec![0, 2, 5, 7]);
        assert_eq!(compute_line_starts(""), vec![0]);
        assert_eq!(compute_line_starts("a\n"), vec![0, 2]);
    }

    #[test]
    fn offsets_count_utf16_units() {
        // "é" is one UTF-16 unit, "😀" is two
        let index = LineIndex::new("é😀x\nlet");
        assert_eq!(index.utf16_offset(pos(0, 3)), 3);
        assert_eq!(index.utf16_offset(pos(1, 0)), 5);
        assert_eq!(index.utf16_offset(pos(1, 2)), 7);
    }

    #[test]
    fn out_of_range_positions_clamp() {
        let index = LineIndex::new("ab\r\ncd");
        assert_eq!(index.utf16_offset(pos(0, 99)), 2);
        assert_eq!(index.utf16_offset(pos(1, 0)), 4);
        assert_eq!(index.utf16_offset(pos(7, 0)), 6);
    }

    #[test]
    fn end_position_points_past_last_character() {
        assert_eq!(LineIndex::new("a\nbc").end_position(), pos(1, 2));
        assert_eq!(LineIndex::new("a\n").end_position(), pos(1, 0));
        assert_eq!(LineIndex::new("").end_position(), pos(0, 0));
        assert_eq!(LineIndex::new("x😀").end_position(), pos(0, 3));
    }
}
