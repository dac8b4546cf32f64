use tower_lsp_server::ls_types::{Position, Range, TextEdit};

use crate::format::RangeOptions;

use super::position::LineIndex;

/// Single edit replacing all of `original` with `formatted`.
///
/// `None` when the texts are equal so unchanged documents get no edit.
pub fn full_document_edit(original: &str, formatted: &str) -> Option<TextEdit> {
    if original == formatted {
        return None;
    }
    Some(TextEdit {
        range: Range {
            start: Position::new(0, 0),
            end: LineIndex::new(original).end_position(),
        },
        new_text: formatted.to_string(),
    })
}

/// Convert an LSP range into the engine's UTF-16 offsets.
pub fn range_to_options(text: &str, range: Range) -> RangeOptions {
    let index = LineIndex::new(text);
    let start = index.utf16_offset(range.start);
    let end = index.utf16_offset(range.end);
    RangeOptions {
        start: start.min(end),
        end: start.max(end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_yields_no_edit() {
        assert_eq!(full_document_edit("a;\n", "a;\n"), None);
    }

    #[test]
    fn edit_spans_the_whole_original() {
        let edit = full_document_edit("const x=1\nlet y", "const x = 1;\nlet y;\n").unwrap();
        assert_eq!(edit.range.start, Position::new(0, 0));
        assert_eq!(edit.range.end, Position::new(1, 5));
        assert_eq!(edit.new_text, "const x = 1;\nlet y;\n");
    }

    #[test]
    fn range_maps_to_offsets() {
        let text = "a;\nb;\nc;\n";
        let range = Range {
            start: Position::new(1, 0),
            end: Position::new(2, 2),
        };
        assert_eq!(range_to_options(text, range), RangeOptions { start: 3, end: 8 });
    }
}
