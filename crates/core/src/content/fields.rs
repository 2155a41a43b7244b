//! Field catalogue and date/time format-token translation (spec.md §4.5
//! "Fields", §6 "Date format tokens", SPEC_FULL.md §6.1).
//!
//! Grounded in `ABWContentCollector.cpp`'s `openField` and
//! `_convertFieldDTFormat`. A field subtype resolves to one of three
//! outcomes: a concrete [`PropertyList`] to attach to `InsertField`, a
//! recognized-but-intentionally-silent subtype (no event, no log), or a
//! genuinely unknown subtype (no event, `log::debug!`).

use abw_idf::{PropertyList, PropertyValue};

pub enum FieldResolution {
    Field(PropertyList),
    RecognizedSilent,
    Unknown,
}

/// Splits `%`-escaped date/time format tokens into an ordered vector of
/// component property lists, one per literal run or format token
/// (spec.md §6). `%%` is a literal percent; an unrecognized token after
/// `%` is dropped (its `%` and the token character are simply not
/// emitted, matching the source's permissive scanner).
///
/// Each component carries a bare `librevenge:value-type` of
/// `year`/`month`/`day`/`hours`/`minutes`/`seconds`/`am-pm`/`day-of-week`,
/// plus `number:style="long"` for the long form of a token (`%Y`/`%B`/
/// `%e`/`%A`/`%H`, and always for minutes/seconds) and `number:textual`
/// for a textual month (`%B`/`%b`/`%h`).
pub fn convert_date_format(format: &str) -> Vec<PropertyList> {
    let mut out = Vec::new();
    let mut chars = format.chars().peekable();
    let mut literal = String::new();

    fn flush(out: &mut Vec<PropertyList>, literal: &mut String) {
        if !literal.is_empty() {
            let mut pl = PropertyList::new();
            pl.set("librevenge:value-type", "text");
            pl.set("librevenge:text", literal.clone());
            out.push(pl);
            literal.clear();
        }
    }

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }
        let Some(token) = chars.next() else { break };
        if token == '%' {
            literal.push('%');
            continue;
        }
        let mut pl = PropertyList::new();
        let recognized = match token {
            'Y' => {
                pl.set("number:style", "long");
                pl.set("librevenge:value-type", "year");
                true
            }
            'y' => {
                pl.set("librevenge:value-type", "year");
                true
            }
            'B' => {
                pl.set("number:style", "long");
                pl.set("librevenge:value-type", "month");
                pl.set("number:textual", true);
                true
            }
            'b' | 'h' => {
                pl.set("librevenge:value-type", "month");
                pl.set("number:textual", true);
                true
            }
            'm' => {
                pl.set("librevenge:value-type", "month");
                true
            }
            'e' => {
                pl.set("number:style", "long");
                pl.set("librevenge:value-type", "day");
                true
            }
            'd' => {
                pl.set("librevenge:value-type", "day");
                true
            }
            'A' => {
                pl.set("number:style", "long");
                pl.set("librevenge:value-type", "day-of-week");
                true
            }
            'a' => {
                pl.set("librevenge:value-type", "day-of-week");
                true
            }
            'H' => {
                pl.set("number:style", "long");
                pl.set("librevenge:value-type", "hours");
                true
            }
            'I' => {
                pl.set("librevenge:value-type", "hours");
                true
            }
            'M' => {
                pl.set("librevenge:value-type", "minutes");
                pl.set("number:style", "long");
                true
            }
            'S' => {
                pl.set("librevenge:value-type", "seconds");
                pl.set("number:style", "long");
                true
            }
            'p' => {
                pl.set("librevenge:value-type", "am-pm");
                true
            }
            _ => false,
        };
        if !recognized {
            continue;
        }
        flush(&mut out, &mut literal);
        out.push(pl);
    }
    flush(&mut out, &mut literal);
    out
}

/// Builds a `text:date` field. `format` is `None` for the platform-default
/// subtype (`date_ntdlf`), which carries no format vector at all.
fn date_field(format: Option<&str>) -> PropertyList {
    let mut pl = PropertyList::new();
    pl.set("librevenge:field-type", "text:date");
    pl.set("number:automatic-order", "true");
    if let Some(format) = format {
        let components = convert_date_format(format);
        if !components.is_empty() {
            pl.set("librevenge:value-type", "date");
            pl.set("librevenge:format", PropertyValue::List(components));
        }
    }
    pl
}

/// Builds a `text:time` field. `format` is `None` for bare `time`, which
/// carries no format vector at all.
fn time_field(format: Option<&str>) -> PropertyList {
    let mut pl = PropertyList::new();
    pl.set("librevenge:field-type", "text:time");
    pl.set("number:automatic-order", "true");
    if let Some(format) = format {
        let components = convert_date_format(format);
        if !components.is_empty() {
            pl.set("librevenge:value-type", "time");
            pl.set("librevenge:format", PropertyValue::List(components));
        }
    }
    pl
}

fn simple_field(field_type: &str) -> PropertyList {
    let mut pl = PropertyList::new();
    pl.set("librevenge:field-type", field_type);
    pl
}

fn file_name_field() -> PropertyList {
    let mut pl = PropertyList::new();
    pl.set("librevenge:field-type", "text:file-name");
    pl.set("text:display", "full");
    pl
}

fn meta_field(key: &str) -> PropertyList {
    let mut pl = PropertyList::new();
    pl.set("librevenge:field-type", "text:meta");
    pl.set("librevenge:meta-key", key);
    pl
}

const RECOGNIZED_SILENT: &[&str] = &[
    "endnote_anch",
    "endnote_ref",
    "footnote_anch",
    "footnote_ref",
    "list_label",
    "mail_merge",
    "time_zone",
    "time_miltime",
    "toc_list_label",
];

/// Resolves one `<field type="...">` subtype into its emitted properties.
pub fn resolve_field(subtype: &str) -> FieldResolution {
    if subtype.starts_with("app_") || RECOGNIZED_SILENT.contains(&subtype) {
        return FieldResolution::RecognizedSilent;
    }
    let props = match subtype {
        "date" => date_field(Some("%A, %B %d,%Y")),
        "date_ntdlf" => date_field(None),
        "date_mmddyy" => date_field(Some("%m/%d/%y")),
        "date_ddmmyy" => date_field(Some("%d/%m/%y")),
        "date_mdy" => date_field(Some("%B %d,%Y")),
        "date_mthdy" => date_field(Some("%b %d,%Y")),
        "date_dfl" => date_field(Some("%a %b %d %H:%M:%S %Y")),
        "date_wkday" => date_field(Some("%A")),
        "date_doy" => date_field(Some("%d")),
        "datetime_custom" => date_field(Some("%d/%m/%y %H:%M:%S")),
        "time" => time_field(None),
        "time_ampm" => time_field(Some("%I:%M:%S %p")),
        "page_number" => simple_field("text:page-number"),
        "page_count" => simple_field("text:page-count"),
        "para_count" => simple_field("text:paragraph-count"),
        "char_count" => simple_field("text:character-count"),
        "word_count" => simple_field("text:word-count"),
        "file_name" | "short_file_name" => file_name_field(),
        "meta_title" => meta_field("title"),
        "meta_subject" => meta_field("subject"),
        "meta_creator" => meta_field("creator"),
        "meta_publisher" => meta_field("publisher"),
        "meta_keywords" => meta_field("keywords"),
        "meta_description" => meta_field("description"),
        "meta_date" => meta_field("creation-date"),
        "meta_date_last_changed" => meta_field("modification-date"),
        _ => return FieldResolution::Unknown,
    };
    FieldResolution::Field(props)
}
