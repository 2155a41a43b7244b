//! The content pass's parsing state (spec.md §3 "Parsing state").
//!
//! Grounded in `ABWContentCollector.h`'s member-variable block: rather than
//! the source's dozen independent `bool m_bXxxOpened` flags plus a raw
//! `ABWContentParsingState *m_ps` swapped out on note entry, this is one
//! owned struct with a `Vec<ContentState>` acting as the suspend stack the
//! source emulates with `DELETEP`/manual new.

use abw_style::PropMap;

use crate::content::lists::ListLevel;
use crate::content::tables::TableState;

/// Which kind of container is currently being filled. Mirrors the source's
/// `m_parsingContext` enum used to decide how an open paragraph/frame/table
/// nests (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsingContext {
    Section,
    Header,
    Footer,
    FrameImage,
    FrameTextbox,
    FrameUnknown,
}

/// Page geometry as declared by the most recent `<pagesize>`, carried
/// forward across sections within the same page span.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageGeometry {
    pub width_in: Option<f64>,
    pub height_in: Option<f64>,
    pub margin_left_in: Option<f64>,
    pub margin_right_in: Option<f64>,
    pub margin_top_in: Option<f64>,
    pub margin_bottom_in: Option<f64>,
}

/// The four occurrence-keyed header/footer ids a section may declare
/// (spec.md §4.5 "Header/footer context"); carried forward to the next
/// section when unset, same as margins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFooterIds {
    pub all: Option<u32>,
    pub left: Option<u32>,
    pub first: Option<u32>,
    pub last: Option<u32>,
}

/// Section-level margins, inherited by the next section when it declares
/// none of its own (spec.md §4.5 "Section properties").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionMargins {
    pub left_in: Option<f64>,
    pub right_in: Option<f64>,
    pub top_in: Option<f64>,
    pub bottom_in: Option<f64>,
}

/// Everything the content pass needs to resume where it left off, including
/// across a footnote/endnote's nested sub-document (spec.md §4.5 "Notes").
#[derive(Debug, Clone)]
pub struct ContentState {
    pub document_open: bool,
    pub page_span_open: bool,
    pub section_open: bool,
    pub header_open: bool,
    pub footer_open: bool,
    pub span_open: bool,
    pub paragraph_open: bool,
    pub list_element_open: bool,
    /// Gates [`insert_text`]/`open_field` entirely: distinct from
    /// `paragraph_open`/`list_element_open` because it's set the moment a
    /// paragraph or list element is collected, before its first span opens
    /// (spec.md §4.5 "Paragraph properties").
    ///
    /// [`insert_text`]: crate::content::ContentCollector::insert_text
    pub in_paragraph_or_list_element: bool,

    pub page_geometry: PageGeometry,
    pub header_ids: HeaderFooterIds,
    pub footer_ids: HeaderFooterIds,
    pub section_margins: SectionMargins,
    /// The current section's column count, carried forward the same way
    /// margins are (spec.md §4.5 "Section properties").
    pub columns: Option<u32>,

    pub deferred_page_break: bool,
    pub deferred_column_break: bool,

    pub is_note: bool,

    pub list_level: u16,
    pub list_id: u32,
    pub list_stack: Vec<ListLevel>,

    pub parsing_context: ParsingContext,
    pub table_stack: Vec<TableState>,

    /// Whether the currently open frame is anchored to the page rather
    /// than the paragraph; set by `open_frame`, read by `close_frame`'s
    /// `add_frame_elements` to choose between the page-frame buffer and
    /// the inline body (spec.md §4.5 "Frames").
    pub is_page_frame: bool,

    pub current_header_footer_id: u32,
    pub current_header_footer_occurrence: String,

    /// Reset to `false` at every block open; set once the block's first
    /// span opens, so [`close_paragraph_or_list_element`] can tell a
    /// genuinely empty block (needs a synthesized span) from one that
    /// already opened and closed real spans (spec.md §8 boundary (a)).
    ///
    /// [`close_paragraph_or_list_element`]: crate::content::ContentCollector::close_paragraph_or_list_element
    pub block_had_span: bool,
    /// Whether the single leading space/tab of a list element's first text
    /// run has already been stripped (spec.md §4.5 "Lists").
    pub list_first_text_trimmed: bool,

    /// The resolved property map of the currently open (or most recently
    /// collected) paragraph/list-element, kept around so a span opened
    /// inside it can fall back to it for character properties it doesn't
    /// itself declare (spec.md §4.5 "Character properties"). Carried in
    /// `ContentState` rather than the collector because a note's nested
    /// sub-document has its own independent paragraph context.
    pub paragraph_resolved: PropMap,
    /// The resolved property map for the span about to open (or already
    /// open), set by `collect_character_properties` and consumed lazily
    /// the first time text, a field, or a line break actually opens it
    /// (spec.md §4.5 "Open-on-demand").
    pub character_resolved: PropMap,
}

impl Default for ContentState {
    fn default() -> Self {
        ContentState {
            document_open: false,
            page_span_open: false,
            section_open: false,
            header_open: false,
            footer_open: false,
            span_open: false,
            paragraph_open: false,
            list_element_open: false,
            in_paragraph_or_list_element: false,
            page_geometry: PageGeometry::default(),
            header_ids: HeaderFooterIds::default(),
            footer_ids: HeaderFooterIds::default(),
            section_margins: SectionMargins::default(),
            deferred_page_break: false,
            deferred_column_break: false,
            is_note: false,
            list_level: 0,
            list_id: 0,
            list_stack: Vec::new(),
            parsing_context: ParsingContext::Section,
            table_stack: Vec::new(),
            is_page_frame: false,
            current_header_footer_id: 0,
            current_header_footer_occurrence: String::new(),
            block_had_span: false,
            list_first_text_trimmed: false,
            paragraph_resolved: PropMap::new(),
            character_resolved: PropMap::new(),
        }
    }
}

impl ContentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A state for a footnote/endnote's nested sub-document: a wholly
    /// fresh state with nothing carried forward from the outer one beyond
    /// the `is_note` marker. Mirrors `openFoot`/`openEndnote` swapping in a
    /// freshly default-constructed `ABWContentParsingState` rather than
    /// copying the suspended one — a note's own content opens its own page
    /// span, section, and geometry on demand, same as the top-level
    /// document (spec.md §4.5 "Notes").
    pub fn nested_for_note() -> Self {
        ContentState {
            is_note: true,
            ..ContentState::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_note_state_is_fresh_aside_from_is_note() {
        let mut outer = ContentState::new();
        outer.page_geometry.width_in = Some(8.5);
        outer.page_span_open = true;
        outer.section_open = true;
        let nested = ContentState::nested_for_note();
        assert!(nested.is_note);
        assert!(!nested.page_span_open);
        assert!(!nested.section_open);
        assert!(!nested.paragraph_open);
        assert_eq!(nested.page_geometry.width_in, None);
    }

    #[test]
    fn default_state_has_nothing_open() {
        let state = ContentState::new();
        assert!(!state.document_open);
        assert!(!state.span_open);
        assert_eq!(state.list_id, 0);
    }
}
