//! List-nesting state machine for the content pass (spec.md §4.5 "Lists").
//!
//! Grounded in `ABWContentCollector.cpp`'s paragraph-level list handling:
//! a paragraph names the list it belongs to and a nesting `level`; the
//! collector reconciles that against whatever levels are currently open,
//! closing levels that no longer apply and opening whatever is newly
//! needed. A paragraph can legally jump several levels deeper than
//! anything seen so far (or reference a list whose parent chain is
//! broken), so gaps are filled with synthesized dummy levels rather than
//! treated as errors.

use crate::list::{ListKind, ListTable};

/// The maximum list nesting depth honored; anything deeper is clamped
/// (spec.md §7 on runaway structural recursion).
pub const MAX_LIST_DEPTH: u16 = 64;

/// One entry of the open-level stack: the level number, the real list id
/// backing it (`0` for a synthesized dummy), and its kind (needed to emit
/// the matching `CloseOrdered`/`CloseUnordered` event later).
pub type ListLevel = (u16, u32, ListKind);

#[derive(Debug, Clone, PartialEq)]
pub enum ListOp {
    CloseLevel(ListKind),
    OpenLevel {
        id: u32,
        kind: ListKind,
        start_value: u32,
        decimal: String,
        delim: String,
        /// True when this level was synthesized to bridge a gap rather
        /// than requested directly by a paragraph.
        is_dummy: bool,
    },
}

fn dummy_op() -> ListOp {
    ListOp::OpenLevel {
        id: 0,
        kind: ListKind::Unordered,
        start_value: 1,
        decimal: "0".to_string(),
        delim: String::new(),
        is_dummy: true,
    }
}

/// Fills every level strictly between `old_level` and `new_level`
/// (inclusive) with synthesized dummy unordered levels, shallowest first.
/// Mirrors `_writeOutDummyListLevels`'s top-down recursion.
fn write_dummy_levels(stack: &mut Vec<ListLevel>, ops: &mut Vec<ListOp>, old_level: u16, new_level: u16) {
    if old_level >= new_level {
        return;
    }
    write_dummy_levels(stack, ops, old_level, new_level - 1);
    stack.push((new_level, 0, ListKind::Unordered));
    ops.push(dummy_op());
}

/// Opens every level strictly between `old_level` and `new_level`
/// needed to reach `new_list_id` at `new_level`, walking its real
/// ancestry and falling back to dummy levels wherever the chain runs out
/// or is broken. Mirrors `_recurseListLevels`: a `new_list_id` unknown to
/// the list table opens nothing at all for that level (not even a dummy),
/// the same silent no-op the original leaves it as.
fn recurse_list_levels(
    stack: &mut Vec<ListLevel>,
    ops: &mut Vec<ListOp>,
    old_level: u16,
    new_level: u16,
    new_list_id: u32,
    lists: &ListTable,
) {
    if old_level >= new_level {
        return;
    }
    let Some(element) = lists.get(new_list_id) else {
        return;
    };
    if element.parent_id != 0 {
        recurse_list_levels(stack, ops, old_level, new_level - 1, element.parent_id, lists);
    } else {
        write_dummy_levels(stack, ops, old_level, new_level - 1);
    }
    stack.push((new_level, new_list_id, element.kind));
    ops.push(ListOp::OpenLevel {
        id: new_list_id,
        kind: element.kind,
        start_value: element.start_value,
        decimal: element.decimal.clone(),
        delim: element.delim.clone(),
        is_dummy: false,
    });
}

/// Reconciles the open-level stack against a paragraph's requested
/// nesting level and list id, returning the sequence of closes/opens
/// needed to get there. Mirrors `_handleListChange`: levels compare by
/// depth alone, never by id — a paragraph at the same level as an
/// already-open one, even under a different list id, changes nothing.
pub fn handle_list_change(
    stack: &mut Vec<ListLevel>,
    requested_level: u16,
    requested_list_id: u32,
    lists: &ListTable,
) -> Vec<ListOp> {
    let requested_level = requested_level.min(MAX_LIST_DEPTH);
    let old_level = stack.last().map(|&(level, _, _)| level).unwrap_or(0);
    let mut ops = Vec::new();

    if requested_level > old_level {
        recurse_list_levels(stack, &mut ops, old_level, requested_level, requested_list_id, lists);
    } else if requested_level < old_level {
        while let Some(&(level, _, kind)) = stack.last() {
            if level <= requested_level {
                break;
            }
            stack.pop();
            ops.push(ListOp::CloseLevel(kind));
        }
    }
    ops
}

/// Closes every level still open, deepest first; used at section/body end
/// so a document that never explicitly drops back to level 0 still
/// closes cleanly.
pub fn close_all(stack: &mut Vec<ListLevel>) -> Vec<ListOp> {
    let mut ops = Vec::new();
    while let Some((_, _, kind)) = stack.pop() {
        ops.push(ListOp::CloseLevel(kind));
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::ListElement;

    fn sample_lists() -> ListTable {
        let mut table = ListTable::new();
        table.insert(ListElement {
            id: 1,
            parent_id: 0,
            kind: ListKind::Ordered,
            decimal: "1".into(),
            delim: "%L.".into(),
            start_value: 1,
        });
        table.insert(ListElement {
            id: 2,
            parent_id: 1,
            kind: ListKind::Unordered,
            decimal: "0".into(),
            delim: "".into(),
            start_value: 1,
        });
        table
    }

    #[test]
    fn opens_a_fresh_level_with_no_prior_stack() {
        let lists = sample_lists();
        let mut stack = Vec::new();
        let ops = handle_list_change(&mut stack, 1, 1, &lists);
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], ListOp::OpenLevel { is_dummy: false, .. }));
        assert_eq!(stack, vec![(1, 1, ListKind::Ordered)]);
    }

    #[test]
    fn level_drop_closes_down_to_the_matching_level() {
        let lists = sample_lists();
        let mut stack = vec![(1, 1, ListKind::Ordered), (2, 2, ListKind::Unordered)];
        let ops = handle_list_change(&mut stack, 1, 1, &lists);
        assert_eq!(ops, vec![ListOp::CloseLevel(ListKind::Unordered)]);
        assert_eq!(stack, vec![(1, 1, ListKind::Ordered)]);
    }

    #[test]
    fn same_level_different_list_id_changes_nothing() {
        // `_handleListChange` compares depth alone, never the list id.
        let lists = sample_lists();
        let mut stack = vec![(1, 1, ListKind::Ordered)];
        let ops = handle_list_change(&mut stack, 1, 2, &lists);
        assert!(ops.is_empty());
        assert_eq!(stack, vec![(1, 1, ListKind::Ordered)]);
    }

    #[test]
    fn jumping_deeper_opens_real_ancestry_with_one_dummy_gap() {
        // id 2's parent is id 1, so level 2 gets the real ancestor; only
        // the gap above the root (level 1) is a synthesized dummy.
        let lists = sample_lists();
        let mut stack = Vec::new();
        let ops = handle_list_change(&mut stack, 3, 2, &lists);
        assert_eq!(ops.len(), 3);
        assert!(matches!(ops[0], ListOp::OpenLevel { is_dummy: true, .. }));
        assert!(matches!(
            ops[1],
            ListOp::OpenLevel { is_dummy: false, id: 1, .. }
        ));
        assert!(matches!(
            ops[2],
            ListOp::OpenLevel { is_dummy: false, id: 2, .. }
        ));
        assert_eq!(stack.len(), 3);
    }

    #[test]
    fn unknown_list_id_opens_nothing() {
        let lists = sample_lists();
        let mut stack = Vec::new();
        let ops = handle_list_change(&mut stack, 1, 999, &lists);
        assert!(ops.is_empty());
        assert!(stack.is_empty());
    }

    #[test]
    fn already_open_at_the_right_level_is_a_no_op() {
        let lists = sample_lists();
        let mut stack = vec![(1, 1, ListKind::Ordered)];
        let ops = handle_list_change(&mut stack, 1, 1, &lists);
        assert!(ops.is_empty());
    }

    #[test]
    fn close_all_unwinds_the_whole_stack() {
        let mut stack = vec![
            (1, 1, ListKind::Ordered),
            (2, 2, ListKind::Unordered),
            (3, 0, ListKind::Unordered),
        ];
        let ops = close_all(&mut stack);
        assert_eq!(ops.len(), 3);
        assert!(stack.is_empty());
    }
}
