//! List elements and the list table built by the styles pre-pass
//! (spec.md §3 "List element", §4.4 `collect_list`).
//!
//! The source keeps these behind a raw-pointer map (`std::map<std::string,
//! ABWListElement *>`) that the content pass reaches into directly; per
//! the re-architecture guidance in spec.md §9 ("arena + index... to avoid
//! lifetime coupling") this is a plain owned table keyed by the
//! non-negative integer id, with `0` meaning "no list".

use std::collections::HashMap;

/// Whether a list level counts (`1.`, `a.`, ...) or bullets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    Unordered,
}

/// One `<l>` declaration from the styles pre-pass.
#[derive(Debug, Clone)]
pub struct ListElement {
    pub id: u32,
    pub parent_id: u32,
    pub kind: ListKind,
    /// The numbering-format code (source's `listDecimal`), e.g. `1` for
    /// arabic numerals, `2` for upper-roman; kept as the raw code since
    /// the concrete glyph choice is a `Consumer` concern.
    pub decimal: String,
    pub delim: String,
    pub start_value: u32,
}

/// All list declarations collected in pass one, keyed by id. Ids form a
/// forest via [`ListElement::parent_id`]; `0` is never a valid id and
/// doubles as "no parent"/"no list".
#[derive(Debug, Clone, Default)]
pub struct ListTable {
    elements: HashMap<u32, ListElement>,
}

impl ListTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, element: ListElement) {
        self.elements.insert(element.id, element);
    }

    pub fn get(&self, id: u32) -> Option<&ListElement> {
        if id == 0 {
            None
        } else {
            self.elements.get(&id)
        }
    }

    /// Walks `id`'s ancestry up to and including the root, nearest first.
    /// Stops at a missing link without erroring: the caller fills the gap
    /// with a synthesized dummy level (spec.md §4.5).
    pub fn ancestry(&self, id: u32) -> Vec<u32> {
        let mut chain = Vec::new();
        let mut current = id;
        let mut guard = 0;
        while current != 0 && guard < 64 {
            chain.push(current);
            current = match self.elements.get(&current) {
                Some(el) => el.parent_id,
                None => break,
            };
            guard += 1;
        }
        chain
    }
}

fn parse_u32(s: &str) -> Option<u32> {
    s.trim().parse().ok()
}

/// Parses the `collect_list(id, decimal, delim, parentid, startvalue,
/// type)` tuple the dispatcher hands the pre-pass on every `<l>` element.
/// A malformed `id` or `type` drops the whole declaration (it cannot be
/// looked up later anyway); other malformed fields fall back to sane
/// defaults rather than discarding the list.
pub fn parse_list_element(
    id: &str,
    decimal: &str,
    delim: &str,
    parent_id: &str,
    start_value: &str,
    kind: &str,
) -> Option<ListElement> {
    let id = parse_u32(id)?;
    let kind = match kind.trim() {
        "0" => ListKind::Unordered,
        _ => ListKind::Ordered,
    };
    Some(ListElement {
        id,
        parent_id: parse_u32(parent_id).unwrap_or(0),
        kind,
        decimal: decimal.to_string(),
        delim: delim.to_string(),
        start_value: parse_u32(start_value).unwrap_or(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestry_walks_parent_chain_nearest_first() {
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
        assert_eq!(table.ancestry(2), vec![2, 1]);
    }

    #[test]
    fn ancestry_stops_at_a_missing_link() {
        let mut table = ListTable::new();
        table.insert(ListElement {
            id: 5,
            parent_id: 99,
            kind: ListKind::Ordered,
            decimal: "1".into(),
            delim: "".into(),
            start_value: 1,
        });
        assert_eq!(table.ancestry(5), vec![5]);
    }

    #[test]
    fn zero_id_is_never_a_list() {
        let table = ListTable::new();
        assert!(table.get(0).is_none());
    }

    #[test]
    fn malformed_id_drops_the_declaration() {
        assert!(parse_list_element("not-a-number", "1", "", "0", "1", "1").is_none());
    }
}
