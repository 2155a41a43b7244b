//! Intermediate Document Format (IDF): the flat event stream the content
//! pass emits.
//!
//! The original collector represents every open/close call as a heap
//! allocated polymorphic `ABWOutputElement` subclass (30+ of them). Per the
//! re-architecture guidance, this crate replaces that hierarchy with a
//! single sum type stored by value: [`OutputElement`], one variant per sink
//! call, each carrying the [`PropertyList`] it was constructed with.

use std::fmt;

/// A single property value. Most AbiWord properties are plain strings, but
/// a handful of emitted properties are naturally structured (per-column
/// table widths, tab-stop vectors, date-format token vectors); modeling
/// those as nested lists avoids re-flattening them into ad-hoc string
/// encodings at the call site.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// A list of nested property lists, e.g. `style:columns` or
    /// `librevenge:tabstops`.
    List(Vec<PropertyList>),
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Str(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Str(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Str(s) => write!(f, "{s}"),
            PropertyValue::Int(v) => write!(f, "{v}"),
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::Bool(v) => write!(f, "{v}"),
            PropertyValue::List(items) => write!(f, "[{} entries]", items.len()),
        }
    }
}

/// An ordered `(key, value)` property list using the ODF-ish key vocabulary
/// named in spec.md §6 (`fo:*`, `style:*`, `text:*`, `librevenge:*`,
/// `svg:*`, `number:*`, `office:binary-data`, `xlink:href`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyList {
    entries: Vec<(String, PropertyValue)>,
}

impl PropertyList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<(String, PropertyValue)> for PropertyList {
    fn from_iter<T: IntoIterator<Item = (String, PropertyValue)>>(iter: T) -> Self {
        let mut list = PropertyList::new();
        for (k, v) in iter {
            list.set(k, v);
        }
        list
    }
}

/// One emitted event. Every `Open*` carries the [`PropertyList`] it was
/// constructed with; every `Close*` is a bare marker (the original's
/// `write()` for close elements never consults its own state). `InsertText`
/// and friends are leaves: they never open or close a scope.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputElement {
    StartDocument(PropertyList),
    EndDocument,

    OpenPageSpan(PropertyList),
    ClosePageSpan,

    OpenSection(PropertyList),
    CloseSection,

    OpenHeader(PropertyList),
    CloseHeader,
    OpenFooter(PropertyList),
    CloseFooter,

    OpenParagraph(PropertyList),
    CloseParagraph,

    OpenListElement(PropertyList),
    CloseListElement,
    OpenOrderedListLevel(PropertyList),
    CloseOrderedListLevel,
    OpenUnorderedListLevel(PropertyList),
    CloseUnorderedListLevel,

    OpenSpan(PropertyList),
    CloseSpan,

    OpenLink(PropertyList),
    CloseLink,

    OpenTable(PropertyList),
    CloseTable,
    OpenTableRow(PropertyList),
    CloseTableRow,
    OpenTableCell(PropertyList),
    CloseTableCell,

    OpenFrame(PropertyList),
    CloseFrame,
    OpenTextBox(PropertyList),
    CloseTextBox,

    OpenFootnote(PropertyList),
    CloseFootnote,
    OpenEndnote(PropertyList),
    CloseEndnote,

    InsertText(String),
    InsertTab,
    InsertSpace,
    InsertLineBreak,
    InsertField(PropertyList),
    InsertBinaryObject(PropertyList),
    InsertCoveredTableCell(PropertyList),
}
