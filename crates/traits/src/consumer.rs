//! `Consumer` trait: the sink the content pass emits
//! [`abw_idf::OutputElement`]s to.
//!
//! This is the converter's one external output contract (spec.md §6): a
//! text-document interface roughly one-to-one with `OutputElement`'s
//! variants, each method taking the property list it was constructed with.
//! Implementers may no-op any method they don't care about — a plain-text
//! renderer, say, has no use for `open_frame`.

use abw_idf::PropertyList;

/// Sink for the structured document events emitted by the content pass.
///
/// # Implementations
///
/// Out of scope for this crate (spec.md §1): concrete HTML, plain-text, or
/// raw-event renderers live in downstream crates and implement this trait
/// against their own output format.
pub trait Consumer {
    fn start_document(&mut self, _props: &PropertyList) {}
    /// Dublin-Core-keyed document metadata (`dc:title`, `dc:creator`, ...).
    /// Called once, independently of `start_document`: the source fires
    /// this as its own distinct interface call rather than folding it into
    /// the start-of-document properties.
    fn set_document_metadata(&mut self, _props: &PropertyList) {}
    fn end_document(&mut self) {}

    fn open_page_span(&mut self, _props: &PropertyList) {}
    fn close_page_span(&mut self) {}

    fn open_section(&mut self, _props: &PropertyList) {}
    fn close_section(&mut self) {}

    fn open_header(&mut self, _props: &PropertyList) {}
    fn close_header(&mut self) {}
    fn open_footer(&mut self, _props: &PropertyList) {}
    fn close_footer(&mut self) {}

    fn open_paragraph(&mut self, _props: &PropertyList) {}
    fn close_paragraph(&mut self) {}

    fn open_list_element(&mut self, _props: &PropertyList) {}
    fn close_list_element(&mut self) {}
    fn open_ordered_list_level(&mut self, _props: &PropertyList) {}
    fn close_ordered_list_level(&mut self) {}
    fn open_unordered_list_level(&mut self, _props: &PropertyList) {}
    fn close_unordered_list_level(&mut self) {}

    fn open_span(&mut self, _props: &PropertyList) {}
    fn close_span(&mut self) {}

    fn open_link(&mut self, _props: &PropertyList) {}
    fn close_link(&mut self) {}

    fn open_table(&mut self, _props: &PropertyList) {}
    fn close_table(&mut self) {}
    fn open_table_row(&mut self, _props: &PropertyList) {}
    fn close_table_row(&mut self) {}
    fn open_table_cell(&mut self, _props: &PropertyList) {}
    fn close_table_cell(&mut self) {}

    fn open_frame(&mut self, _props: &PropertyList) {}
    fn close_frame(&mut self) {}
    fn open_text_box(&mut self, _props: &PropertyList) {}
    fn close_text_box(&mut self) {}

    fn open_footnote(&mut self, _props: &PropertyList) {}
    fn close_footnote(&mut self) {}
    fn open_endnote(&mut self, _props: &PropertyList) {}
    fn close_endnote(&mut self) {}

    fn insert_text(&mut self, _text: &str) {}
    fn insert_tab(&mut self) {}
    fn insert_space(&mut self) {}
    fn insert_line_break(&mut self) {}
    fn insert_field(&mut self, _props: &PropertyList) {}
    fn insert_binary_object(&mut self, _props: &PropertyList) {}
    fn insert_covered_table_cell(&mut self, _props: &PropertyList) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingConsumer {
        calls: Vec<String>,
    }

    impl Consumer for RecordingConsumer {
        fn open_paragraph(&mut self, _props: &PropertyList) {
            self.calls.push("open_paragraph".to_string());
        }
        fn close_paragraph(&mut self) {
            self.calls.push("close_paragraph".to_string());
        }
        fn insert_text(&mut self, text: &str) {
            self.calls.push(format!("insert_text({text})"));
        }
    }

    #[test]
    fn unoverridden_methods_are_harmless_no_ops() {
        let mut consumer = RecordingConsumer::default();
        consumer.start_document(&PropertyList::new());
        consumer.set_document_metadata(&PropertyList::new());
        consumer.open_page_span(&PropertyList::new());
        consumer.open_paragraph(&PropertyList::new());
        consumer.insert_text("hi");
        consumer.close_paragraph();
        assert_eq!(
            consumer.calls,
            vec!["open_paragraph", "insert_text(hi)", "close_paragraph"]
        );
    }
}
