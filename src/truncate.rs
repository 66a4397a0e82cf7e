use crate::column::ColumnModel;
use crate::record::Row;

pub const DEFAULT_MAX_LENGTH: usize = 25;
pub const ELLIPSIS: char = '…';

/// Display string of a cell and whether the full text needs a tooltip.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Truncated {
    pub display: String,
    pub needs_tooltip: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncationPolicy {
    pub global_max_length: usize,
}

impl Default for TruncationPolicy {
    fn default() -> Self {
        Self {
            global_max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl TruncationPolicy {
    pub fn new(global_max_length: usize) -> Self {
        Self { global_max_length }
    }

    /// Cell override, then column setting, then the table default.
    pub fn resolve(&self, row: &Row, column: &ColumnModel) -> usize {
        row.cell_max_length(&column.key)
            .or(column.max_length)
            .unwrap_or(self.global_max_length)
    }

    pub fn format_cell(&self, row: &Row, column: &ColumnModel, text: &str) -> Truncated {
        format(Some(text), self.resolve(row, column))
    }
}

/// Shortens `text` to `max_length` characters plus an ellipsis.
///
/// Counts chars, so multi-byte text is never cut inside a code point. Only
/// the display string is shortened; callers keep the full text for tooltips,
/// sorting and search.
pub fn format(text: Option<&str>, max_length: usize) -> Truncated {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return Truncated::default();
    };

    match text.char_indices().nth(max_length) {
        None => Truncated {
            display: text.to_string(),
            needs_tooltip: false,
        },
        Some((cut, _)) => {
            let mut display = String::with_capacity(cut + ELLIPSIS.len_utf8());
            display.push_str(&text[..cut]);
            display.push(ELLIPSIS);
            Truncated {
                display,
                needs_tooltip: true,
            }
        }
    }
}
