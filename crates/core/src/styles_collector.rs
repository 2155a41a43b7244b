//! Pass-one collector: table geometry measurement plus binary-data and
//! list-element indexing (spec.md §4.4).
//!
//! Grounded in `examples/original_source/src/lib/ABWStylesCollector.cpp`:
//! only `open_table`/`close_table`/`open_cell`/`collect_data`/
//! `collect_list` are non-trivial; everything else the dispatcher could
//! send this pass is a no-op, so `StylesCollector` only exposes the five
//! methods it actually needs rather than a full `Collector` trait impl
//! with empty bodies for the rest.

use std::collections::HashMap;

use abw_style::PropMap;

use crate::list::{parse_list_element, ListTable};

#[derive(Debug, Clone, Default)]
struct TableMeasureState {
    id: u32,
    row: i32,
    width: u32,
    cell_properties: PropMap,
}

/// Table geometry measured in pass one, keyed by a counter assigned in
/// document order (not the source's own table ids, which AbiWord does not
/// actually provide — the original assigns a synthetic counter too).
#[derive(Debug, Clone, Default)]
pub struct TableSizes {
    widths: HashMap<u32, u32>,
}

impl TableSizes {
    pub fn get(&self, id: u32) -> Option<u32> {
        self.widths.get(&id).copied()
    }
}

/// Binary data collected from `<d>` elements, keyed by the `name`
/// attribute (spec.md §4.3's `<d>` dispatch entry).
#[derive(Debug, Clone)]
pub struct BinaryData {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct DataTable {
    entries: HashMap<String, BinaryData>,
}

impl DataTable {
    pub fn get(&self, name: &str) -> Option<&BinaryData> {
        self.entries.get(name)
    }
}

/// Everything the content pass needs out of pass one.
#[derive(Debug, Clone, Default)]
pub struct PrePassResult {
    pub table_sizes: TableSizes,
    pub data: DataTable,
    pub lists: ListTable,
}

#[derive(Default)]
pub struct StylesCollector {
    table_stack: Vec<TableMeasureState>,
    table_counter: u32,
    table_sizes: HashMap<u32, u32>,
    data: HashMap<String, BinaryData>,
    lists: ListTable,
}

impl StylesCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_table(&mut self, _props: Option<&str>) {
        let id = self.table_counter;
        self.table_counter += 1;
        self.table_stack.push(TableMeasureState {
            id,
            row: -1,
            width: 0,
            cell_properties: PropMap::new(),
        });
    }

    pub fn close_table(&mut self) {
        if let Some(state) = self.table_stack.pop() {
            self.table_sizes.insert(state.id, state.width);
        }
    }

    pub fn open_cell(&mut self, props: Option<&str>) {
        let Some(state) = self.table_stack.last_mut() else {
            return;
        };
        if let Some(props) = props {
            state.cell_properties = PropMap::parse(props);
        }
        let top_attach: Option<i32> = state
            .cell_properties
            .get("top-attach")
            .and_then(|s| s.trim().parse().ok());
        let target_row = top_attach.unwrap_or(state.row + 1);
        while state.row < target_row {
            state.row += 1;
        }
        if state.row == 0 {
            let left: Option<i32> = state
                .cell_properties
                .get("left-attach")
                .and_then(|s| s.trim().parse().ok());
            let right: Option<i32> = state
                .cell_properties
                .get("right-attach")
                .and_then(|s| s.trim().parse().ok());
            match (left, right) {
                (Some(l), Some(r)) => state.width = state.width.saturating_add_signed(r - l),
                _ => state.width += 1,
            }
        }
    }

    pub fn close_cell(&mut self) {
        if let Some(state) = self.table_stack.last_mut() {
            state.cell_properties = PropMap::new();
        }
    }

    pub fn collect_data(&mut self, name: &str, mime_type: &str, data: Vec<u8>) {
        if name.is_empty() {
            return;
        }
        self.data.insert(
            name.to_string(),
            BinaryData {
                mime_type: mime_type.to_string(),
                data,
            },
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn collect_list(
        &mut self,
        id: &str,
        decimal: &str,
        delim: &str,
        parent_id: &str,
        start_value: &str,
        kind: &str,
    ) {
        if let Some(element) = parse_list_element(id, decimal, delim, parent_id, start_value, kind)
        {
            self.lists.insert(element);
        }
    }

    pub fn into_result(self) -> PrePassResult {
        PrePassResult {
            table_sizes: TableSizes {
                widths: self.table_sizes,
            },
            data: DataTable { entries: self.data },
            lists: self.lists,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_row_width_counts_explicit_attach_span() {
        let mut collector = StylesCollector::new();
        collector.open_table(None);
        collector.open_cell(Some("left-attach:0;right-attach:2;top-attach:0"));
        collector.close_cell();
        collector.open_cell(Some("left-attach:2;right-attach:3;top-attach:0"));
        collector.close_cell();
        collector.close_table();
        let result = collector.into_result();
        assert_eq!(result.table_sizes.get(0), Some(3));
    }

    #[test]
    fn missing_attach_falls_back_to_incrementing_width_by_one() {
        let mut collector = StylesCollector::new();
        collector.open_table(None);
        collector.open_cell(None);
        collector.close_cell();
        collector.open_cell(None);
        collector.close_cell();
        collector.close_table();
        let result = collector.into_result();
        assert_eq!(result.table_sizes.get(0), Some(2));
    }

    #[test]
    fn second_row_cells_do_not_change_width() {
        let mut collector = StylesCollector::new();
        collector.open_table(None);
        collector.open_cell(Some("top-attach:0;left-attach:0;right-attach:2"));
        collector.close_cell();
        collector.open_cell(Some("top-attach:1;left-attach:0;right-attach:5"));
        collector.close_cell();
        collector.close_table();
        let result = collector.into_result();
        assert_eq!(result.table_sizes.get(0), Some(2));
    }

    #[test]
    fn collect_data_indexes_by_name() {
        let mut collector = StylesCollector::new();
        collector.collect_data("img1", "image/png", vec![1, 2, 3]);
        let result = collector.into_result();
        assert_eq!(result.data.get("img1").unwrap().mime_type, "image/png");
    }

    #[test]
    fn malformed_list_declaration_is_dropped() {
        let mut collector = StylesCollector::new();
        collector.collect_list("bad", "1", "%L.", "0", "1", "1");
        let result = collector.into_result();
        assert!(result.lists.get(1).is_none());
    }
}
