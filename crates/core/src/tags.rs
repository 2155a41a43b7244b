//! The fixed tag enumeration dispatch runs against (spec.md §3, §6).
//!
//! The original walks a generated `xmlChar* -> int` token map. quick-xml
//! already hands us borrowed `&str` element names, so there is no need for
//! a separate interning table: `Tag::from_name` is a plain match, and an
//! unrecognized name maps to [`Tag::Unknown`] rather than failing the
//! parse — its children are still walked, matching "unknown tags map to a
//! sentinel and are ignored".

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Abiword,
    Section,
    P,
    C,
    S,
    Pagesize,
    D,
    L,
    A,
    Foot,
    Endnote,
    Table,
    Cell,
    Image,
    Frame,
    Br,
    Cbr,
    Pbr,
    Field,
    Metadata,
    M,
    History,
    Revisions,
    Ignoredwords,
    Unknown,
}

impl Tag {
    pub fn from_name(name: &str) -> Tag {
        match name {
            "abiword" => Tag::Abiword,
            "section" => Tag::Section,
            "p" => Tag::P,
            "c" => Tag::C,
            "s" => Tag::S,
            "pagesize" => Tag::Pagesize,
            "d" => Tag::D,
            "l" => Tag::L,
            "a" => Tag::A,
            "foot" => Tag::Foot,
            "endnote" => Tag::Endnote,
            "table" => Tag::Table,
            "cell" => Tag::Cell,
            "image" => Tag::Image,
            "frame" => Tag::Frame,
            "br" => Tag::Br,
            "cbr" => Tag::Cbr,
            "pbr" => Tag::Pbr,
            "field" => Tag::Field,
            "metadata" => Tag::Metadata,
            "m" => Tag::M,
            "history" => Tag::History,
            "revisions" => Tag::Revisions,
            "ignoredwords" => Tag::Ignoredwords,
            _ => Tag::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_every_cataloged_tag() {
        assert_eq!(Tag::from_name("p"), Tag::P);
        assert_eq!(Tag::from_name("table"), Tag::Table);
        assert_eq!(Tag::from_name("ignoredwords"), Tag::Ignoredwords);
    }

    #[test]
    fn unknown_name_maps_to_sentinel() {
        assert_eq!(Tag::from_name("bogus-future-tag"), Tag::Unknown);
    }
}
