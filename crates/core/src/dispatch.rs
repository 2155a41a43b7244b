//! Drives the two passes over the token stream and routes each tag to the
//! matching collector method (spec.md §4.3's dispatch table).
//!
//! Grounded in `ABWParser.cpp`'s `processXmlNode`/`parseSourceDocument`:
//! one big `switch` on the element's token, firing on both the "element
//! start" and "element end or self-closing" edges. Here that becomes two
//! independent loops, one per pass, each matching on [`Tag`] directly
//! rather than threading a shared `Collector` trait through both very
//! differently shaped collectors.

use abw_traits::Input;

use crate::content::ContentCollector;
use crate::error::ConvertError;
use crate::output_buffer::OutputBuffer;
use crate::styles_collector::{PrePassResult, StylesCollector};
use crate::tags::Tag;
use crate::xml::{Element, Token, XmlReader};
use crate::ConvertOptions;

/// Accumulates a `<d>` element's binary payload across however many
/// `Text`/`Cdata` tokens it arrives in before handing it to
/// [`StylesCollector::collect_data`] exactly once.
///
/// `ABWParser::readD` calls `collectData` on every chunk, so a binary
/// payload split across several text events keeps only its last chunk in
/// `ABWStylesCollector::collectData` (it overwrites rather than appends).
/// The dispatch table's "gather CDATA/Text into a Binary" reads as the
/// intended behavior rather than that quirk, so this accumulates instead.
struct PendingBinaryData {
    name: String,
    mime_type: String,
    base64: bool,
    raw: Vec<u8>,
}

impl PendingBinaryData {
    fn open(el: &Element) -> Self {
        PendingBinaryData {
            name: el.attribute("name").unwrap_or_default().to_string(),
            mime_type: el.attribute("mime-type").unwrap_or_default().to_string(),
            base64: matches!(el.attribute("base64"), Some("1") | Some("true") | Some("yes")),
            raw: Vec::new(),
        }
    }

    fn push_text(&mut self, text: &str) {
        self.raw.extend_from_slice(text.as_bytes());
    }

    fn push_cdata(&mut self, data: &[u8]) {
        self.raw.extend_from_slice(data);
    }

    fn finish(self, styles: &mut StylesCollector) {
        let data = if self.base64 {
            use base64::engine::general_purpose::STANDARD;
            use base64::Engine as _;
            STANDARD.decode(&self.raw).unwrap_or_default()
        } else {
            self.raw
        };
        styles.collect_data(&self.name, &self.mime_type, data);
    }
}

/// The pre-pass (spec.md §4.4): collects table column widths, binary data,
/// and list definitions, ignoring everything else.
pub fn run_styles_pass(input: &mut dyn Input) -> Result<PrePassResult, ConvertError> {
    let mut reader = XmlReader::new(input);
    let mut styles = StylesCollector::new();
    let mut pending_data: Option<PendingBinaryData> = None;

    loop {
        match reader.next()? {
            Token::Eof => break,
            Token::Start(el) => match el.tag {
                Tag::Table => styles.open_table(el.attribute("props")),
                Tag::Cell => styles.open_cell(el.attribute("props")),
                Tag::L => styles.collect_list(
                    el.attribute("id").unwrap_or_default(),
                    el.attribute("list-decimal").unwrap_or("NULL"),
                    el.attribute("list-delim").unwrap_or_default(),
                    el.attribute("parentid").unwrap_or_default(),
                    el.attribute("start-value").unwrap_or_default(),
                    el.attribute("type").unwrap_or_default(),
                ),
                Tag::D => {
                    let mut pending = PendingBinaryData::open(&el);
                    if el.empty {
                        pending.finish(&mut styles);
                    } else {
                        pending_data = Some(pending);
                    }
                }
                _ => {}
            },
            Token::End(Tag::Table) => styles.close_table(),
            Token::End(Tag::Cell) => styles.close_cell(),
            Token::End(Tag::D) => {
                if let Some(pending) = pending_data.take() {
                    pending.finish(&mut styles);
                }
            }
            Token::Text(text) => {
                if let Some(pending) = pending_data.as_mut() {
                    pending.push_text(&text);
                }
            }
            Token::Cdata(data) => {
                if let Some(pending) = pending_data.as_mut() {
                    pending.push_cdata(&data);
                }
            }
            Token::End(_) => {}
        }
    }

    Ok(styles.into_result())
}

/// Folds `<section>`'s eight separate header/footer-id attributes plus its
/// own `props` into the single combined props string
/// `ContentCollector::collect_section_properties` expects. Grounded in
/// `ABWParser::readSection`, which reads these as eight independent
/// attributes and passes them positionally to `collectSectionProperties`
/// rather than through one string; this recombines them the way every
/// other `props` attribute in the format already looks.
fn section_props_string(el: &Element) -> String {
    let mut out = String::new();
    let mut push = |key: &str, value: Option<&str>| {
        let Some(value) = value else { return };
        if value.is_empty() {
            return;
        }
        if !out.is_empty() {
            out.push(';');
        }
        out.push_str(key);
        out.push(':');
        out.push_str(value);
    };
    push("header-all-id", el.attribute("header"));
    push("header-left-id", el.attribute("header-even"));
    push("header-first-id", el.attribute("header-first"));
    push("header-last-id", el.attribute("header-last"));
    push("footer-all-id", el.attribute("footer"));
    push("footer-left-id", el.attribute("footer-even"));
    push("footer-first-id", el.attribute("footer-first"));
    push("footer-last-id", el.attribute("footer-last"));
    if let Some(props) = el.attribute("props") {
        if !out.is_empty() {
            out.push(';');
        }
        out.push_str(props);
    }
    out
}

/// Tags whose subtree is walked but never produces output (spec.md §4.3:
/// revision history, ignored-word lists). Grounded in `ABWParser`'s
/// `readHistory`/`readRevisions`/`readIgnoredWords`, which consume their
/// children without ever calling into the collector.
fn is_skipped(tag: Tag) -> bool {
    matches!(tag, Tag::History | Tag::Revisions | Tag::Ignoredwords)
}

/// The content pass (spec.md §4.5): walks the document a second time,
/// this time producing [`abw_idf::OutputElement`]s.
pub fn run_content_pass(
    input: &mut dyn Input,
    pre: PrePassResult,
    options: &ConvertOptions,
) -> Result<OutputBuffer, ConvertError> {
    let mut reader = XmlReader::new(input);
    let mut collector = ContentCollector::new(pre);

    let mut skip_tag: Option<Tag> = None;
    let mut metadata_key: Option<String> = None;
    let mut metadata_value = String::new();

    loop {
        match reader.next()? {
            Token::Eof => break,

            Token::Start(el) if skip_tag.is_some() => {
                if Some(el.tag) == skip_tag && el.empty {
                    // A self-closing history/revisions/ignoredwords element
                    // never opened anything for the matching `End` to close.
                    skip_tag = None;
                }
            }
            Token::End(tag) if skip_tag == Some(tag) => {
                skip_tag = None;
            }
            Token::Text(_) | Token::Cdata(_) | Token::End(_) if skip_tag.is_some() => {}

            Token::Start(el) if el.tag == Tag::M => {
                metadata_key = el.attribute("key").map(str::to_string);
                metadata_value.clear();
                if el.empty {
                    if let Some(key) = metadata_key.take() {
                        collector.add_metadata_entry(&key, "");
                    }
                }
            }
            Token::End(Tag::M) => {
                if let Some(key) = metadata_key.take() {
                    collector.add_metadata_entry(&key, metadata_value.trim());
                }
                metadata_value.clear();
            }

            Token::Start(el) if is_skipped(el.tag) && !el.empty => {
                skip_tag = Some(el.tag);
            }
            Token::Start(el) if is_skipped(el.tag) && el.empty => {}

            Token::Start(el) => {
                if options.strict && el.tag == Tag::Unknown {
                    return Err(ConvertError::UnexpectedStructure {
                        message: format!("unrecognized element <{}>", el.name),
                        location: reader.position(),
                    });
                }
                dispatch_start(&mut collector, &el);
                if el.empty {
                    dispatch_end(&mut collector, el.tag);
                }
            }
            Token::End(tag) => dispatch_end(&mut collector, tag),

            Token::Text(text) => {
                if metadata_key.is_some() {
                    metadata_value.push_str(&text);
                } else {
                    collector.insert_text(&text);
                }
            }
            Token::Cdata(_) => {}
        }
    }

    collector.end_document();
    Ok(collector.into_output())
}

fn dispatch_start(collector: &mut ContentCollector, el: &Element) {
    match el.tag {
        Tag::Abiword => collector.collect_document_properties(el.attribute("props")),
        Tag::Pagesize => collector.collect_page_size(
            el.attribute("width"),
            el.attribute("height"),
            el.attribute("units"),
        ),
        Tag::Section => {
            let type_attr = el.attribute("type");
            let is_header_or_footer = type_attr
                .map(|t| t.starts_with("header") || t.starts_with("footer"))
                .unwrap_or(false);
            if is_header_or_footer {
                collector.collect_header_footer(el.attribute("id"), type_attr);
            } else {
                let props = section_props_string(el);
                let props = if props.is_empty() { None } else { Some(props.as_str()) };
                collector.collect_section_properties(props);
            }
        }
        Tag::P => collector.collect_paragraph_properties(
            el.attribute("level"),
            el.attribute("listid"),
            el.attribute("style"),
            el.attribute("props"),
        ),
        Tag::C => collector.collect_character_properties(el.attribute("style"), el.attribute("props")),
        Tag::S => {
            if let Some(type_attr) = el.attribute("type") {
                if matches!(type_attr.chars().next(), Some('P') | Some('C')) {
                    collector.collect_text_style(
                        el.attribute("name").unwrap_or_default(),
                        el.attribute("basedon"),
                        el.attribute("followedby"),
                        el.attribute("props"),
                    );
                }
            }
        }
        Tag::A => collector.open_link(el.attribute("href")),
        Tag::Foot => collector.open_foot(el.attribute("footnote-id")),
        Tag::Endnote => collector.open_endnote(el.attribute("endnote-id")),
        Tag::Table => collector.open_table(el.attribute("props")),
        Tag::Cell => collector.open_cell(el.attribute("props")),
        Tag::Image => collector.insert_image(el.attribute("dataid"), el.attribute("props")),
        Tag::Frame => collector.open_frame(el.attribute("props"), el.attribute("image-id")),
        Tag::Br => collector.insert_line_break(),
        Tag::Cbr => collector.insert_column_break(),
        Tag::Pbr => collector.insert_page_break(),
        Tag::Field => collector.open_field(el.attribute("type")),
        Tag::D | Tag::L => {}
        Tag::Unknown => log::debug!("skipping unrecognized element <{}>", el.name),
        Tag::Metadata | Tag::M | Tag::History | Tag::Revisions | Tag::Ignoredwords => {}
    }
}

fn dispatch_end(collector: &mut ContentCollector, tag: Tag) {
    match tag {
        Tag::Section => collector.end_section(),
        Tag::P => collector.close_paragraph_or_list_element(),
        Tag::C => collector.close_span(),
        Tag::A => collector.close_link(),
        Tag::Foot => collector.close_foot(),
        Tag::Endnote => collector.close_endnote(),
        Tag::Table => collector.close_table(),
        Tag::Cell => collector.close_cell(),
        Tag::Frame => collector.close_frame(),
        Tag::Field => collector.close_field(),
        _ => {}
    }
}
