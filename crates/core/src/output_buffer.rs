//! Deferred, page-span-aware output buffer (spec.md §4.6).
//!
//! Per the re-architecture guidance in spec.md §9, the source's "buffered
//! headers/footers with pointer rebinding" becomes a plain `Active` enum
//! resolved through a helper on every push — there is no dangling-pointer
//! risk because there is no pointer.

use std::collections::HashMap;

use abw_idf::{OutputElement, PropertyList, PropertyValue};
use abw_traits::Consumer;

/// The four property keys an `OpenPageSpan` may carry pointing at a
/// buffered header/footer id, in the order they are spliced on write.
const HEADER_KEYS: [&str; 4] = [
    "librevenge:header-all-id",
    "librevenge:header-left-id",
    "librevenge:header-first-id",
    "librevenge:header-last-id",
];
const FOOTER_KEYS: [&str; 4] = [
    "librevenge:footer-all-id",
    "librevenge:footer-left-id",
    "librevenge:footer-first-id",
    "librevenge:footer-last-id",
];

/// Which bucket `push` currently targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Active {
    Body,
    Header(u32),
    Footer(u32),
    Frame,
}

/// Three buckets (`body`, `headers`, `footers`) plus one side buffer for
/// page-anchored frame content, exactly as spec.md §4.6 describes it.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    body: Vec<OutputElement>,
    headers: HashMap<u32, Vec<OutputElement>>,
    footers: HashMap<u32, Vec<OutputElement>>,
    /// One page-anchored-frame bucket per page span opened so far, in
    /// order. `push_page_frame` always targets the last bucket; `write`
    /// splices bucket *n* right before the *n*th `ClosePageSpan`.
    page_frames: Vec<Vec<OutputElement>>,
    /// Nested accumulation buffers for frame content, pushed by
    /// `open_frame_buffer` and popped by `close_frame_buffer`. The caller
    /// decides, once it has the finished buffer in hand, whether it
    /// belongs in `page_frames` (page-anchored) or spliced straight into
    /// whichever bucket was active before the frame opened (inline).
    frame_stack: Vec<Vec<OutputElement>>,
    /// The bucket each currently-open frame buffer displaced, in the same
    /// order as `frame_stack`.
    prev_active: Vec<ActiveState>,
    active: ActiveState,
    /// Set once via [`OutputBuffer::set_metadata`]; `write` emits it via
    /// `consumer.set_document_metadata` before walking `body`, since the
    /// source fires `_setMetadata` as its own call rather than queuing a
    /// buffered element for it.
    metadata: PropertyList,
}

#[derive(Debug)]
enum ActiveState {
    Body,
    Header(u32),
    Footer(u32),
    Frame,
}

impl Default for ActiveState {
    fn default() -> Self {
        ActiveState::Body
    }
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_metadata(&mut self, metadata: PropertyList) {
        self.metadata = metadata;
    }

    pub fn active(&self) -> Active {
        match self.active {
            ActiveState::Body => Active::Body,
            ActiveState::Header(id) => Active::Header(id),
            ActiveState::Footer(id) => Active::Footer(id),
            ActiveState::Frame => Active::Frame,
        }
    }

    /// Starts accumulating into a fresh frame buffer, remembering the
    /// previously active bucket so `close_frame_buffer` can restore it.
    pub fn open_frame_buffer(&mut self) {
        self.frame_stack.push(Vec::new());
        self.prev_active.push(std::mem::replace(&mut self.active, ActiveState::Frame));
    }

    /// Pops the current frame buffer and restores whichever bucket was
    /// active before it opened, returning the accumulated elements for
    /// the caller to splice wherever a page-anchored or inline frame
    /// belongs.
    pub fn close_frame_buffer(&mut self) -> Vec<OutputElement> {
        self.active = self.prev_active.pop().unwrap_or(ActiveState::Body);
        self.frame_stack.pop().unwrap_or_default()
    }

    pub fn open_header(&mut self, id: u32) {
        self.headers.entry(id).or_default();
        self.active = ActiveState::Header(id);
    }

    pub fn open_footer(&mut self, id: u32) {
        self.footers.entry(id).or_default();
        self.active = ActiveState::Footer(id);
    }

    /// Restores the active bucket to `body`. Called on header/footer close.
    pub fn close_header_footer(&mut self) {
        self.active = ActiveState::Body;
    }

    pub fn push(&mut self, element: OutputElement) {
        if matches!(element, OutputElement::OpenPageSpan(_)) && matches!(self.active, ActiveState::Body)
        {
            self.page_frames.push(Vec::new());
        }
        match &self.active {
            ActiveState::Body => self.body.push(element),
            ActiveState::Header(id) => self.headers.entry(*id).or_default().push(element),
            ActiveState::Footer(id) => self.footers.entry(*id).or_default().push(element),
            ActiveState::Frame => {
                if let Some(bucket) = self.frame_stack.last_mut() {
                    bucket.push(element);
                }
            }
        }
    }

    /// Appends an element to the current page's anchored-frame side
    /// buffer, regardless of which bucket is currently active: frame
    /// content anchored to the page is always spliced into `body`, never
    /// into a header or footer. A no-op before the first page span opens.
    pub fn push_page_frame(&mut self, element: OutputElement) {
        if let Some(bucket) = self.page_frames.last_mut() {
            bucket.push(element);
        }
    }

    /// Streams the buffered events to `consumer`, splicing header/footer
    /// content right after each `OpenPageSpan` and page-anchored frame
    /// content right before each `ClosePageSpan`, per spec.md §3 invariant 7
    /// and §4.6.
    pub fn write(&self, consumer: &mut dyn Consumer) {
        if !self.metadata.is_empty() {
            consumer.set_document_metadata(&self.metadata);
        }
        let mut page_index = 0usize;
        for element in &self.body {
            if matches!(element, OutputElement::ClosePageSpan) {
                if let Some(bucket) = self.page_frames.get(page_index) {
                    for frame_element in bucket {
                        emit(frame_element, consumer);
                    }
                }
                page_index += 1;
            }
            emit(element, consumer);
            if let OutputElement::OpenPageSpan(props) = element {
                for key in HEADER_KEYS {
                    if let Some(id) = prop_id(props, key) {
                        if let Some(events) = self.headers.get(&id) {
                            for e in events {
                                emit(e, consumer);
                            }
                        }
                    }
                }
                for key in FOOTER_KEYS {
                    if let Some(id) = prop_id(props, key) {
                        if let Some(events) = self.footers.get(&id) {
                            for e in events {
                                emit(e, consumer);
                            }
                        }
                    }
                }
            }
        }
    }
}

fn prop_id(props: &PropertyList, key: &str) -> Option<u32> {
    match props.get(key) {
        Some(PropertyValue::Int(v)) => Some(*v as u32),
        _ => None,
    }
}

fn emit(element: &OutputElement, consumer: &mut dyn Consumer) {
    match element {
        OutputElement::StartDocument(p) => consumer.start_document(p),
        OutputElement::EndDocument => consumer.end_document(),

        OutputElement::OpenPageSpan(p) => consumer.open_page_span(p),
        OutputElement::ClosePageSpan => consumer.close_page_span(),

        OutputElement::OpenSection(p) => consumer.open_section(p),
        OutputElement::CloseSection => consumer.close_section(),

        OutputElement::OpenHeader(p) => consumer.open_header(p),
        OutputElement::CloseHeader => consumer.close_header(),
        OutputElement::OpenFooter(p) => consumer.open_footer(p),
        OutputElement::CloseFooter => consumer.close_footer(),

        OutputElement::OpenParagraph(p) => consumer.open_paragraph(p),
        OutputElement::CloseParagraph => consumer.close_paragraph(),

        OutputElement::OpenListElement(p) => consumer.open_list_element(p),
        OutputElement::CloseListElement => consumer.close_list_element(),
        OutputElement::OpenOrderedListLevel(p) => consumer.open_ordered_list_level(p),
        OutputElement::CloseOrderedListLevel => consumer.close_ordered_list_level(),
        OutputElement::OpenUnorderedListLevel(p) => consumer.open_unordered_list_level(p),
        OutputElement::CloseUnorderedListLevel => consumer.close_unordered_list_level(),

        OutputElement::OpenSpan(p) => consumer.open_span(p),
        OutputElement::CloseSpan => consumer.close_span(),

        OutputElement::OpenLink(p) => consumer.open_link(p),
        OutputElement::CloseLink => consumer.close_link(),

        OutputElement::OpenTable(p) => consumer.open_table(p),
        OutputElement::CloseTable => consumer.close_table(),
        OutputElement::OpenTableRow(p) => consumer.open_table_row(p),
        OutputElement::CloseTableRow => consumer.close_table_row(),
        OutputElement::OpenTableCell(p) => consumer.open_table_cell(p),
        OutputElement::CloseTableCell => consumer.close_table_cell(),

        OutputElement::OpenFrame(p) => consumer.open_frame(p),
        OutputElement::CloseFrame => consumer.close_frame(),
        OutputElement::OpenTextBox(p) => consumer.open_text_box(p),
        OutputElement::CloseTextBox => consumer.close_text_box(),

        OutputElement::OpenFootnote(p) => consumer.open_footnote(p),
        OutputElement::CloseFootnote => consumer.close_footnote(),
        OutputElement::OpenEndnote(p) => consumer.open_endnote(p),
        OutputElement::CloseEndnote => consumer.close_endnote(),

        OutputElement::InsertText(s) => consumer.insert_text(s),
        OutputElement::InsertTab => consumer.insert_tab(),
        OutputElement::InsertSpace => consumer.insert_space(),
        OutputElement::InsertLineBreak => consumer.insert_line_break(),
        OutputElement::InsertField(p) => consumer.insert_field(p),
        OutputElement::InsertBinaryObject(p) => consumer.insert_binary_object(p),
        OutputElement::InsertCoveredTableCell(p) => consumer.insert_covered_table_cell(p),
    }
}
