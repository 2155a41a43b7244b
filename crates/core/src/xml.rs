//! Pull parser over a (possibly inflated) [`Input`] stream (spec.md §4.2).
//!
//! Wraps `quick_xml::Reader`, the same streaming idiom the teacher's XSLT
//! parser uses (`crates/xslt/src/parser.rs`): `read_event_into` into a
//! reusable buffer, significant-whitespace text suppressed by
//! `trim_text(false)` plus our own blank-check on the decoded string.

use std::io::{BufReader, Read};

use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader;

use abw_traits::Input;

use crate::error::{ConvertError, Location};
use crate::tags::Tag;

/// Adapts the workspace's seekable [`Input`] to `std::io::Read`, the trait
/// `quick_xml::Reader::from_reader` wants. Reads a non-empty chunk whenever
/// one remains; an empty chunk past `eof()` settles into a clean `Ok(0)`.
struct InputRead<'a> {
    input: &'a mut dyn Input,
}

impl Read for InputRead<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let chunk = self.input.read(buf.len());
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}

/// One borrowed attribute, decoded to owned strings up front: AbiWord
/// documents are small enough that per-attribute allocation is not a
/// concern, and owning them keeps [`Element`] free of the reader's
/// lifetime.
#[derive(Debug, Clone)]
pub struct Element {
    pub tag: Tag,
    pub name: String,
    attrs: Vec<(String, String)>,
    pub empty: bool,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// One token handed to the dispatcher. `Cdata` is kept distinct from
/// `Text` even though both end up as bytes to insert: `<d>` binary payloads
/// arrive as CDATA and must not be whitespace-trimmed the way body text is.
#[derive(Debug, Clone)]
pub enum Token {
    Start(Element),
    End(Tag),
    Text(String),
    Cdata(Vec<u8>),
    Eof,
}

/// Streaming reader with the stuckness watchdog from spec.md §4.2: two
/// consecutive reads reporting an error at the same buffer offset means
/// the underlying reader cannot make forward progress.
pub struct XmlReader<'a> {
    reader: Reader<BufReader<InputRead<'a>>>,
    buf: Vec<u8>,
    last_error_pos: Option<u64>,
}

impl<'a> XmlReader<'a> {
    pub fn new(input: &'a mut dyn Input) -> Self {
        let buf_reader = BufReader::new(InputRead { input });
        let mut reader = Reader::from_reader(buf_reader);
        reader.config_mut().trim_text(false);
        XmlReader {
            reader,
            buf: Vec::new(),
            last_error_pos: None,
        }
    }

    /// The reader's current byte offset, for attaching a [`Location`] to an
    /// error raised by the dispatcher itself rather than by the reader.
    pub fn position(&self) -> Location {
        Location {
            line: 0,
            col: self.reader.buffer_position() as usize,
        }
    }

    /// Returns the next non-trivial token, or `Err` once the reader is
    /// judged stuck.
    pub fn next(&mut self) -> Result<Token, ConvertError> {
        loop {
            let pos = self.reader.buffer_position();
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf) {
                Ok(XmlEvent::Start(e)) => {
                    self.last_error_pos = None;
                    let name = local_name(e.name().as_ref());
                    let tag = Tag::from_name(&name);
                    let attrs = owned_attributes(&e);
                    return Ok(Token::Start(Element {
                        tag,
                        name,
                        attrs,
                        empty: false,
                    }));
                }
                Ok(XmlEvent::Empty(e)) => {
                    self.last_error_pos = None;
                    let name = local_name(e.name().as_ref());
                    let tag = Tag::from_name(&name);
                    let attrs = owned_attributes(&e);
                    return Ok(Token::Start(Element {
                        tag,
                        name,
                        attrs,
                        empty: true,
                    }));
                }
                Ok(XmlEvent::End(e)) => {
                    self.last_error_pos = None;
                    let name = local_name(e.name().as_ref());
                    return Ok(Token::End(Tag::from_name(&name)));
                }
                Ok(XmlEvent::Text(e)) => {
                    self.last_error_pos = None;
                    let text = e.unescape().unwrap_or_default().into_owned();
                    if text.trim().is_empty() {
                        continue;
                    }
                    return Ok(Token::Text(text));
                }
                Ok(XmlEvent::CData(e)) => {
                    self.last_error_pos = None;
                    return Ok(Token::Cdata(e.into_inner().into_owned()));
                }
                Ok(XmlEvent::Eof) => return Ok(Token::Eof),
                Ok(_) => {
                    self.last_error_pos = None;
                    continue;
                }
                Err(err) => {
                    // quick-xml does not expose a line/column cursor for a
                    // streaming `Read` source, only the byte offset; that
                    // offset is enough to diagnose and to drive the
                    // stuckness check below.
                    let location = Location {
                        line: 0,
                        col: pos as usize,
                    };
                    if self.last_error_pos == Some(pos) {
                        return Err(ConvertError::Stuck(location));
                    }
                    self.last_error_pos = Some(pos);
                    return Err(ConvertError::MalformedStream {
                        source: err,
                        location,
                    });
                }
            }
        }
    }
}

fn local_name(raw: &[u8]) -> String {
    let s = String::from_utf8_lossy(raw);
    match s.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => s.into_owned(),
    }
}

fn owned_attributes(e: &quick_xml::events::BytesStart<'_>) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    for attr in e.attributes().flatten() {
        let key = local_name(attr.key.as_ref());
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_default();
        attrs.push((key, value));
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct SliceInput<'a> {
        data: &'a [u8],
        pos: usize,
    }

    impl Input for SliceInput<'_> {
        fn read(&mut self, n: usize) -> Vec<u8> {
            let end = (self.pos + n).min(self.data.len());
            let chunk = self.data[self.pos..end].to_vec();
            self.pos = end;
            chunk
        }
        fn seek(&mut self, offset: i64, whence: abw_traits::SeekFrom) {
            let base = match whence {
                abw_traits::SeekFrom::Set => 0,
                abw_traits::SeekFrom::Cur => self.pos as i64,
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

    fn tokens(xml: &str) -> Vec<Token> {
        let mut input = SliceInput {
            data: xml.as_bytes(),
            pos: 0,
        };
        let mut reader = XmlReader::new(&mut input);
        let mut out = Vec::new();
        loop {
            match reader.next().unwrap() {
                Token::Eof => break,
                other => out.push(other),
            }
        }
        out
    }

    #[test]
    fn start_and_end_pair_with_attributes() {
        let toks = tokens(r#"<p props="margin-top:1in">text</p>"#);
        match &toks[0] {
            Token::Start(el) => {
                assert_eq!(el.tag, Tag::P);
                assert_eq!(el.attribute("props"), Some("margin-top:1in"));
                assert!(!el.empty);
            }
            _ => panic!("expected start"),
        }
        assert!(matches!(toks[1], Token::Text(_)));
        assert!(matches!(toks[2], Token::End(Tag::P)));
    }

    #[test]
    fn empty_elements_are_flagged() {
        let toks = tokens(r#"<br/>"#);
        match &toks[0] {
            Token::Start(el) => assert!(el.empty),
            _ => panic!("expected start"),
        }
    }

    #[test]
    fn whitespace_only_text_is_suppressed() {
        let toks = tokens("<section>\n  \t\n</section>");
        assert_eq!(toks.len(), 2);
        assert!(matches!(toks[0], Token::Start(_)));
        assert!(matches!(toks[1], Token::End(Tag::Section)));
    }

    #[test]
    fn unknown_tag_maps_to_sentinel_not_error() {
        let toks = tokens("<frobnicate/>");
        match &toks[0] {
            Token::Start(el) => assert_eq!(el.tag, Tag::Unknown),
            _ => panic!("expected start"),
        }
    }
}
