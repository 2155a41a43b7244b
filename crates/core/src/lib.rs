//! Two-pass streaming converter from AbiWord XML to structured document
//! events.
//!
//! # Module structure
//!
//! - [`xml`] — the pull parser over a (possibly gzip-compressed) byte
//!   stream, tokenizing into the fixed [`tags::Tag`] vocabulary.
//! - [`decompress`] — transparent gzip detection; falls back to
//!   pass-through for a plain XML stream.
//! - [`styles_collector`] — the pre-pass: table widths, binary data, list
//!   definitions.
//! - [`content`] — the content pass: the bulk of the document model,
//!   producing [`abw_idf::OutputElement`]s.
//! - [`dispatch`] — wires [`xml::XmlReader`] tokens to both collectors.
//! - [`output_buffer`] — reorders header/footer/frame content relative to
//!   the page spans that reference them, then replays everything to a
//!   [`abw_traits::Consumer`].
//! - [`list`] — the list-id table shared between both passes.
//! - [`error`] — the [`ConvertError`] taxonomy.
//!
//! # Public API
//!
//! [`is_file_format_supported`] answers whether a stream looks like an
//! AbiWord document; [`parse`] runs the full conversion.

mod content;
mod decompress;
mod dispatch;
mod error;
mod list;
mod output_buffer;
mod styles_collector;
mod tags;
mod xml;

pub use error::{ConvertError, Location};

use abw_traits::{Consumer, Input, SeekFrom};

use crate::decompress::Decompressor;

/// The one configuration knob the core exposes: everything else about the
/// conversion (what a stream looks like, how it's structured) is read from
/// the document itself, never from an environment or a config file.
///
/// The state machine repairs everything it reasonably can — a malformed
/// `<cell>` attach, a paragraph referencing an unknown list, a frame with
/// an unrecognized `frame-type` — by falling back rather than failing.
/// `strict` turns the one case that fallback would otherwise quietly eat,
/// an unrecognized element, into a hard [`ConvertError::UnexpectedStructure`]
/// instead of a debug-logged skip.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    pub strict: bool,
}

/// Sniffs whether `input` looks like an AbiWord document, gzip-wrapped or
/// not, without consuming the caller's stream position.
pub fn is_file_format_supported(input: &mut dyn Input) -> bool {
    let mut probe = Decompressor::new(input);
    let head = probe.read(64);
    probe.seek(0, SeekFrom::Set);
    let text = String::from_utf8_lossy(&head);
    let trimmed = text.trim_start();
    trimmed.starts_with("<?xml") || trimmed.starts_with("<abiword") || text.contains("<abiword")
}

/// Runs the two-pass conversion, emitting every event to `consumer`.
///
/// Returns `false` on any error, after logging it; whatever `consumer`
/// already received before the failure is not retracted.
pub fn parse(input: &mut dyn Input, consumer: &mut dyn Consumer, options: ConvertOptions) -> bool {
    match try_parse(input, consumer, options) {
        Ok(()) => true,
        Err(err) => {
            log::error!("failed to convert AbiWord document: {err}");
            false
        }
    }
}

fn try_parse(
    input: &mut dyn Input,
    consumer: &mut dyn Consumer,
    options: ConvertOptions,
) -> Result<(), ConvertError> {
    let mut decompressor = Decompressor::new(input);
    let pre = dispatch::run_styles_pass(&mut decompressor)?;
    decompressor.seek(0, SeekFrom::Set);
    let output = dispatch::run_content_pass(&mut decompressor, pre, &options)?;
    output.write(consumer);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use abw_idf::PropertyList;
    use std::cell::RefCell;

    #[derive(Debug)]
    struct SliceInput {
        data: Vec<u8>,
        pos: usize,
    }

    impl Input for SliceInput {
        fn read(&mut self, n: usize) -> Vec<u8> {
            let end = (self.pos + n).min(self.data.len());
            let chunk = self.data[self.pos..end].to_vec();
            self.pos = end;
            chunk
        }
        fn seek(&mut self, offset: i64, whence: SeekFrom) {
            let base = match whence {
                SeekFrom::Set => 0,
                SeekFrom::Cur => self.pos as i64,
            };
            self.pos = (base + offset).clamp(0, self.data.len() as i64) as usize;
        }
        fn tell(&self) -> u64 {
            self.pos as u64
        }
        fn eof(&self) -> bool {
            self.pos >= self.data.len()
        }
    }

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<String>>,
    }

    impl Consumer for Recorder {
        fn start_document(&mut self, _props: &PropertyList) {
            self.calls.borrow_mut().push("start_document".into());
        }
        fn end_document(&mut self) {
            self.calls.borrow_mut().push("end_document".into());
        }
        fn open_page_span(&mut self, _props: &PropertyList) {
            self.calls.borrow_mut().push("open_page_span".into());
        }
        fn close_page_span(&mut self) {
            self.calls.borrow_mut().push("close_page_span".into());
        }
        fn open_section(&mut self, _props: &PropertyList) {
            self.calls.borrow_mut().push("open_section".into());
        }
        fn close_section(&mut self) {
            self.calls.borrow_mut().push("close_section".into());
        }
        fn open_paragraph(&mut self, _props: &PropertyList) {
            self.calls.borrow_mut().push("open_paragraph".into());
        }
        fn close_paragraph(&mut self) {
            self.calls.borrow_mut().push("close_paragraph".into());
        }
        fn open_span(&mut self, _props: &PropertyList) {
            self.calls.borrow_mut().push("open_span".into());
        }
        fn close_span(&mut self) {
            self.calls.borrow_mut().push("close_span".into());
        }
        fn insert_text(&mut self, text: &str) {
            self.calls.borrow_mut().push(format!("insert_text:{text}"));
        }
    }

    fn run(xml: &str) -> Vec<String> {
        let mut input = SliceInput {
            data: xml.as_bytes().to_vec(),
            pos: 0,
        };
        let mut consumer = Recorder::default();
        assert!(parse(&mut input, &mut consumer, ConvertOptions::default()));
        consumer.calls.into_inner()
    }

    #[test]
    fn empty_paragraph_opens_and_closes_every_layer() {
        let calls = run("<abiword><section><p></p></section></abiword>");
        assert_eq!(
            calls,
            vec![
                "start_document",
                "open_page_span",
                "open_section",
                "open_paragraph",
                "open_span",
                "close_span",
                "close_paragraph",
                "close_section",
                "close_page_span",
                "end_document",
            ]
        );
    }

    #[test]
    fn text_inside_a_span_is_routed_to_insert_text() {
        let calls = run("<abiword><section><p><c>hello</c></p></section></abiword>");
        assert!(calls.contains(&"insert_text:hello".to_string()));
    }

    #[test]
    fn text_outside_any_paragraph_is_dropped() {
        let calls = run("<abiword><d name=\"x\" mime-type=\"image/png\">stray</d></abiword>");
        assert!(!calls.iter().any(|c| c.starts_with("insert_text")));
    }

    #[test]
    fn unrecognized_element_is_rejected_in_strict_mode() {
        let mut input = SliceInput {
            data: b"<abiword><whatever/></abiword>".to_vec(),
            pos: 0,
        };
        let mut consumer = Recorder::default();
        let options = ConvertOptions { strict: true };
        assert!(!parse(&mut input, &mut consumer, options));
    }

    #[test]
    fn unrecognized_element_is_skipped_in_lenient_mode() {
        let calls = run("<abiword><whatever/><section><p></p></section></abiword>");
        assert!(calls.contains(&"end_document".to_string()));
    }

    #[test]
    fn unsupported_input_is_rejected_before_parsing() {
        let mut input = SliceInput {
            data: b"not xml at all".to_vec(),
            pos: 0,
        };
        assert!(!is_file_format_supported(&mut input));
    }

    #[test]
    fn gzipped_input_is_recognized_as_supported() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;
        let xml = b"<abiword><section/></abiword>".to_vec();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&xml).expect("writing to an in-memory encoder cannot fail");
        let compressed = encoder.finish().expect("finishing an in-memory encoder cannot fail");
        let mut input = SliceInput {
            data: compressed,
            pos: 0,
        };
        assert!(is_file_format_supported(&mut input));
    }
}
