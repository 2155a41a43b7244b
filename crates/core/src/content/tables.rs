//! Table geometry and cell-attach resolution for the content pass
//! (spec.md §4.5 "Tables").
//!
//! Grounded in `ABWContentCollector.cpp`'s `getCellPos`: a cell's grid
//! position is nominally given by `{top,bottom,left,right}-attach`
//! properties, but AbiWord documents in the wild sometimes carry
//! corrupted or partial attaches, so the resolver applies the same
//! defensive fallbacks the original does rather than trusting the raw
//! numbers.

use abw_style::PropMap;

/// One open table's measured geometry and cursor.
#[derive(Debug, Clone)]
pub struct TableState {
    /// The synthetic id this table was assigned in document order, shared
    /// with the pre-pass's `TableSizes` counter.
    pub table_id: u32,
    pub column_count: usize,
    pub current_row: i32,
    /// Running column cursor within the current row; reset to -1 each
    /// time a row opens, then advanced by [`resolve_cell_attach`] the
    /// same way the original's `m_currentTableCol` is.
    pub current_col: i32,
    pub row_open: bool,
    pub row_has_cell: bool,
    pub left_margin_in: Option<f64>,
    pub cell_open: bool,
    /// Whether any block (paragraph/list element) has been opened inside
    /// the currently open cell; drives the empty-cell synthesis in
    /// spec.md §3 invariant 4.
    pub cell_has_block: bool,
    /// The attach interval computed by `open_cell`, held here until the
    /// cell's first block actually opens it (`OpenTableCell` is emitted
    /// lazily, the same way a paragraph's span is).
    pub cell_pending_attach: Option<CellAttach>,
    pub cell_pending_props: PropMap,
}

impl TableState {
    pub fn new(column_count: usize, left_margin_in: Option<f64>) -> Self {
        TableState {
            column_count,
            current_row: -1,
            current_col: -1,
            row_open: false,
            row_has_cell: false,
            left_margin_in,
            cell_open: false,
            cell_has_block: false,
            cell_pending_attach: None,
            cell_pending_props: PropMap::new(),
        }
    }
}

/// The resolved `[col_start, col_end) x [row_start, row_end)` grid
/// interval a cell occupies (spec.md's "Attach" glossary entry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellAttach {
    pub row_start: i32,
    pub row_end: i32,
    pub col_start: i32,
    pub col_end: i32,
}

impl CellAttach {
    pub fn rows_spanned(&self) -> i32 {
        (self.row_end - self.row_start).max(1)
    }

    pub fn cols_spanned(&self) -> i32 {
        (self.col_end - self.col_start).max(1)
    }
}

/// Resolves one axis's start position against `default_start`, per
/// spec.md §4.5's robust fallback (`getCellPos`): an end-only attach
/// backs up one cell from `end`; a start-only attach is trusted unless
/// it looks corrupted (more than 1000x past the expected default, a
/// heuristic straight from the original); a start/end pair where `end`
/// doesn't exceed `start` falls back to `end - 1`.
fn resolve_start(start: Option<i32>, end: Option<i32>, default_start: i32) -> i32 {
    match (start, end) {
        (None, None) => default_start,
        (None, Some(e)) => {
            if e <= 0 || e / 1000 > default_start {
                default_start
            } else {
                e - 1
            }
        }
        (Some(s), None) => {
            if s / 1000 > default_start {
                default_start
            } else {
                s
            }
        }
        (Some(s), Some(e)) => {
            if e <= s && e > 0 {
                e - 1
            } else {
                s
            }
        }
    }
}

fn parse_attach(props: &PropMap, key: &str) -> Option<i32> {
    props.get(key).and_then(|s| s.trim().parse().ok())
}

/// Computes a cell's attach interval given the table's running row and
/// column cursors. Row defaults to one past the current row; column
/// defaults to one past the current column (`openCell`'s
/// `m_currentTableCol + 1`), both only used when no attach at all is
/// present. Span counts fall back to a single cell when the opposing
/// attach (`bottom-attach`/`right-attach`) isn't present at all.
pub fn resolve_cell_attach(props: &PropMap, current_row: i32, current_col: i32) -> CellAttach {
    let top = parse_attach(props, "top-attach");
    let bottom = parse_attach(props, "bottom-attach");
    let left = parse_attach(props, "left-attach");
    let right = parse_attach(props, "right-attach");

    let row_start = resolve_start(top, bottom, current_row + 1).max(0);
    let col_start = resolve_start(left, right, current_col + 1).max(0);

    let row_end = bottom
        .map(|b| b - row_start)
        .filter(|&span| span > 0)
        .map(|span| row_start + span)
        .unwrap_or(row_start + 1);
    let col_end = right
        .map(|r| r - col_start)
        .filter(|&span| span > 0)
        .map(|span| col_start + span)
        .unwrap_or(col_start + 1);

    CellAttach {
        row_start,
        row_end,
        col_start,
        col_end,
    }
}
