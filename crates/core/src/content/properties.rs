//! Property-string-to-`PropertyList` translators for paragraph, character,
//! and section properties (spec.md §4.5's three big property tables).
//!
//! Grounded in `ABWContentCollector.cpp`'s `collectParagraphProperties`,
//! `collectCharacterProperties`, `collectSectionProperties`, and
//! `_addBorderProperties`. Every translator takes an already-resolved
//! [`PropMap`] (the output of [`abw_style::StyleTable::resolve`] overlaid
//! with the element's own inline `props=`) and returns the
//! [`PropertyList`] to attach to the corresponding `Open*` event. Malformed
//! individual values are dropped silently (spec.md §7): the translator
//! just omits that one key rather than failing the whole property list.

use abw_idf::PropertyList;
use abw_style::{Border, BorderStyle, Length, PropMap, TabAlign, TabStop};
use abw_types::Color;

/// Sides a border property may name, in the order spec.md §4.5 lists them.
const BORDER_SIDES: [&str; 4] = ["left", "right", "top", "bot"];

fn border_side_key(side: &str) -> &'static str {
    match side {
        "left" => "fo:border-left",
        "right" => "fo:border-right",
        "top" => "fo:border-top",
        "bot" => "fo:border-bottom",
        _ => "fo:border",
    }
}

/// Reads one border side out of `props`, falling back to `default_undef`
/// whenever the side doesn't resolve to a concrete border (used for table
/// cells: `0.01in solid #000000`, spec.md §4.5).
///
/// Grounded in `_addBorderProperties`: a missing or unparseable color skips
/// the side outright; `style == 0` is an explicit "no border" that bypasses
/// the default; any other out-of-range style, or a thickness that parses
/// but isn't a positive inch value, also falls back to the default. A
/// missing or unparseable thickness is not an error — it defaults the
/// width to `Border::DEFAULT_WIDTH_IN`.
fn resolve_border_side(props: &PropMap, side: &str, default_undef: Option<Border>) -> Option<Border> {
    let style_key = format!("{side}-style");
    let color_key = format!("{side}-color");
    let thickness_key = format!("{side}-thickness");

    let Some(color) = props.get(&color_key).and_then(Color::parse) else {
        return default_undef;
    };

    let style = match props.get(&style_key) {
        None => BorderStyle::Solid,
        Some(raw) => match BorderStyle::from_code(raw) {
            Some(BorderStyle::None) => return None,
            Some(style) => style,
            None => return default_undef,
        },
    };

    let width_in = match props.get(&thickness_key).and_then(Length::parse) {
        None => Border::DEFAULT_WIDTH_IN,
        Some(length) => match length.inches() {
            Some(value) if value > 0.0 => value,
            _ => return default_undef,
        },
    };

    Some(Border { width_in, style, color })
}

/// Appends `fo:border-{side}` entries for every side present in `props`.
pub fn append_borders(out: &mut PropertyList, props: &PropMap, default_undef: Option<Border>) {
    for side in BORDER_SIDES {
        if let Some(border) = resolve_border_side(props, side, default_undef) {
            out.set(
                border_side_key(side),
                format!("{}in {} {}", border.width_in, border.style.as_str(), border.color),
            );
        }
    }
}

fn tab_align_key(align: TabAlign) -> &'static str {
    match align {
        TabAlign::Left => "left",
        TabAlign::Center => "center",
        TabAlign::Char => "char",
        TabAlign::Right => "right",
    }
}

fn tabstop_list(resolved: &PropMap) -> Option<Vec<PropertyList>> {
    let raw = resolved.get("tabstops")?;
    let stops = TabStop::parse_list(raw);
    if stops.is_empty() {
        return None;
    }
    Some(
        stops
            .into_iter()
            .map(|stop| {
                let mut pl = PropertyList::new();
                pl.set("style:position", format!("{}in", stop.position_in));
                pl.set("style:type", tab_align_key(stop.align));
                if let Some(leader) = stop.leader {
                    pl.set("style:leader-text", leader.as_char().to_string());
                }
                pl
            })
            .collect(),
    )
}

/// Translates resolved paragraph properties (spec.md §4.5 "Paragraph
/// properties"). `deferred_page_break`/`deferred_column_break` are cleared
/// as a side effect once consumed, matching the source's one-shot
/// deferred-break flags. `is_list_element` suppresses `fo:margin-left`,
/// `fo:text-indent`, and `text:outline-level`, matching
/// `_fillParagraphProperties(propList, isListElement)`: a list element's
/// indentation comes from its list level, not its paragraph style.
pub fn paragraph_properties(
    resolved: &PropMap,
    is_list_element: bool,
    deferred_page_break: &mut bool,
    deferred_column_break: &mut bool,
) -> PropertyList {
    let mut out = PropertyList::new();

    for (key, out_key) in [
        ("margin-right", "fo:margin-right"),
        ("margin-top", "fo:margin-top"),
        ("margin-bottom", "fo:margin-bottom"),
    ] {
        if let Some(value) = resolved.get(key).and_then(Length::parse).and_then(|l| l.inches()) {
            out.set(out_key, format!("{value}in"));
        }
    }

    if !is_list_element {
        for (key, out_key) in [("margin-left", "fo:margin-left"), ("text-indent", "fo:text-indent")] {
            if let Some(value) = resolved.get(key).and_then(Length::parse).and_then(|l| l.inches()) {
                out.set(out_key, format!("{value}in"));
            }
        }
        if let Some(level) = resolved.get("outline-level") {
            out.set("text:outline-level", level);
        }
    }

    if let Some(align) = resolved.get("text-align") {
        let mapped = match align {
            "left" => "start",
            "right" => "end",
            other => other,
        };
        out.set("fo:text-align", mapped);
    }

    if let Some(raw) = resolved.get("line-height") {
        let (value_str, at_least) = match raw.strip_suffix('+') {
            Some(stripped) => (stripped, true),
            None => (raw, false),
        };
        let key = if at_least {
            "style:line-height-at-least"
        } else {
            "fo:line-height"
        };
        if let Some(length) = Length::parse(value_str) {
            match length {
                abw_style::Length::In(v) => out.set(key, format!("{v}in")),
                abw_style::Length::Percent(v) => out.set(key, format!("{}%", v * 100.0)),
            }
        }
    }

    for (key, out_key) in [("orphans", "fo:orphans"), ("widows", "fo:widows")] {
        if let Some(value) = resolved.get(key).and_then(|s| s.trim().parse::<i64>().ok()) {
            out.set(out_key, value);
        }
    }

    if let Some(stops) = tabstop_list(resolved) {
        out.set("style:tab-stops", abw_idf::PropertyValue::List(stops));
    }

    if let Some(dir) = resolved.get("dom-dir") {
        let mapped = match dir {
            "ltr" => Some("lr-tb"),
            "rtl" => Some("rl-tb"),
            _ => None,
        };
        if let Some(mapped) = mapped {
            out.set("style:writing-mode", mapped);
        }
    }

    if *deferred_page_break {
        out.set("fo:break-before", "page");
        *deferred_page_break = false;
    } else if *deferred_column_break {
        out.set("fo:break-before", "column");
        *deferred_column_break = false;
    }

    append_borders(&mut out, resolved, None);

    out
}

/// Translates resolved character properties (spec.md §4.5 "Character
/// properties"). `paragraph_resolved` supplies the fallback the original's
/// `_findCharacterProperty` reads from when a character-level property is
/// unset; `doc_lang` is the document-wide default `lang` fallback.
pub fn character_properties(
    resolved: &PropMap,
    paragraph_resolved: &PropMap,
    doc_lang: Option<&str>,
) -> PropertyList {
    let mut out = PropertyList::new();
    let find = |key: &str| resolved.get(key).or_else(|| paragraph_resolved.get(key));

    if let Some(value) = find("font-size").and_then(Length::parse).and_then(|l| l.inches()) {
        out.set("fo:font-size", format!("{}pt", value * 72.0));
    }
    if let Some(value) = find("font-family") {
        out.set("style:font-name", value);
    }
    if let Some(value) = find("font-style") {
        if value != "normal" {
            out.set("fo:font-style", value);
        }
    }
    if let Some(value) = find("font-weight") {
        if value != "normal" {
            out.set("fo:font-weight", value);
        }
    }
    if find("display") == Some("none") {
        out.set("text:display", "none");
    }
    if find("dir-override") == Some("rtl") {
        out.set("style:writing-mode", "rl-tb");
    }

    if let Some(decoration) = find("text-decoration") {
        for token in decoration.split_whitespace() {
            let (type_key, style_key) = match token {
                "underline" => ("style:text-underline-type", "style:text-underline-style"),
                "line-through" => (
                    "style:text-line-through-type",
                    "style:text-line-through-style",
                ),
                "overline" => ("style:text-overline-type", "style:text-overline-style"),
                _ => continue,
            };
            out.set(type_key, "single");
            out.set(style_key, "solid");
        }
    }

    if let Some(color) = find("color").and_then(Color::parse) {
        out.set("fo:color", color.to_string());
    }
    if let Some(color) = find("bgcolor").and_then(Color::parse) {
        out.set("fo:background-color", color.to_string());
    }

    if let Some(position) = find("text-position") {
        let mapped = match position {
            "subscript" => Some("sub"),
            "superscript" => Some("super"),
            _ => None,
        };
        if let Some(mapped) = mapped {
            out.set("style:text-position", mapped);
        }
    }

    let lang = find("lang").or(doc_lang);
    if let Some(lang) = lang {
        if let Some(parsed) = parse_lang(lang) {
            out.set("fo:language", parsed.language);
            if let Some(country) = parsed.country {
                out.set("fo:country", country);
            }
            if let Some(script) = parsed.script {
                out.set("fo:script", script);
            }
        }
    }

    out
}

/// A parsed `<language[-_]region-or-script[-_]region>` tag, per spec.md
/// §4.5's character-property rules: the leading 2-3-lowercase-letter tag
/// is the language; a following 2-uppercase token is the country; a 4+
/// letter or non-uppercase token is a script, after which a further
/// 2-uppercase token is the country.
pub struct ParsedLang {
    pub language: String,
    pub script: Option<String>,
    pub country: Option<String>,
}

pub fn parse_lang(tag: &str) -> Option<ParsedLang> {
    let parts: Vec<&str> = tag.split(['-', '_']).collect();
    let first = parts.first()?;
    if first.len() < 2 || first.len() > 3 || !first.chars().all(|c| c.is_ascii_lowercase()) {
        return None;
    }
    let mut script = None;
    let mut country = None;
    for part in &parts[1..] {
        if is_upper_country(part) {
            if script.is_some() {
                country = Some(part.to_string());
            } else if country.is_none() {
                country = Some(part.to_string());
            }
        } else if part.len() >= 4 {
            script = Some(part.to_string());
        }
    }
    Some(ParsedLang {
        language: first.to_string(),
        script,
        country,
    })
}

fn is_upper_country(s: &str) -> bool {
    s.len() == 2 && s.chars().all(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_text_align_maps_left_right() {
        let mut props = PropMap::new();
        props.set("text-align", "left");
        let mut page = false;
        let mut col = false;
        let out = paragraph_properties(&props, false, &mut page, &mut col);
        assert_eq!(out.get("fo:text-align").unwrap().to_string(), "start");
    }

    #[test]
    fn deferred_page_break_is_applied_then_cleared() {
        let props = PropMap::new();
        let mut page = true;
        let mut col = false;
        let out = paragraph_properties(&props, false, &mut page, &mut col);
        assert_eq!(out.get("fo:break-before").unwrap().to_string(), "page");
        assert!(!page);
    }

    #[test]
    fn line_height_at_least_strips_trailing_plus() {
        let mut props = PropMap::new();
        props.set("line-height", "120%+");
        let mut page = false;
        let mut col = false;
        let out = paragraph_properties(&props, false, &mut page, &mut col);
        assert_eq!(
            out.get("style:line-height-at-least").unwrap().to_string(),
            "120%"
        );
        assert!(!out.contains_key("fo:line-height"));
    }

    #[test]
    fn character_falls_back_to_paragraph_font_size() {
        let char_props = PropMap::new();
        let mut para_props = PropMap::new();
        para_props.set("font-size", "12pt");
        let out = character_properties(&char_props, &para_props, None);
        assert_eq!(out.get("fo:font-size").unwrap().to_string(), "12pt");
    }

    #[test]
    fn text_decoration_expands_to_type_and_style_pairs() {
        let mut props = PropMap::new();
        props.set("text-decoration", "underline line-through");
        let out = character_properties(&props, &PropMap::new(), None);
        assert_eq!(
            out.get("style:text-underline-type").unwrap().to_string(),
            "single"
        );
        assert_eq!(
            out.get("style:text-line-through-style").unwrap().to_string(),
            "solid"
        );
    }

    #[test]
    fn lang_parses_language_country_and_script() {
        let parsed = parse_lang("en-US").unwrap();
        assert_eq!(parsed.language, "en");
        assert_eq!(parsed.country.as_deref(), Some("US"));

        let parsed = parse_lang("az-Latn-AZ").unwrap();
        assert_eq!(parsed.script.as_deref(), Some("Latn"));
        assert_eq!(parsed.country.as_deref(), Some("AZ"));
    }

    #[test]
    fn border_style_zero_clears_the_side() {
        let mut props = PropMap::new();
        props.set("left-style", "0");
        props.set("left-color", "ff0000");
        let mut out = PropertyList::new();
        append_borders(&mut out, &props, None);
        assert!(!out.contains_key("fo:border-left"));
    }

    #[test]
    fn undefined_side_falls_back_to_default_undef() {
        let props = PropMap::new();
        let mut out = PropertyList::new();
        append_borders(&mut out, &props, Some(Border::default_undef()));
        assert_eq!(
            out.get("fo:border-left").unwrap().to_string(),
            "0.01in solid #000000"
        );
    }

    #[test]
    fn border_side_with_missing_thickness_defaults_width() {
        let mut props = PropMap::new();
        props.set("left-color", "ff0000");
        let mut out = PropertyList::new();
        append_borders(&mut out, &props, None);
        assert_eq!(out.get("fo:border-left").unwrap().to_string(), "0.01in solid #ff0000");
    }

    #[test]
    fn border_side_with_non_inch_thickness_falls_back_to_default() {
        let mut props = PropMap::new();
        props.set("left-color", "ff0000");
        props.set("left-thickness", "50%");
        let mut out = PropertyList::new();
        append_borders(&mut out, &props, Some(Border::default_undef()));
        assert_eq!(
            out.get("fo:border-left").unwrap().to_string(),
            "0.01in solid #000000"
        );
    }

    #[test]
    fn missing_color_skips_the_side_entirely() {
        let mut props = PropMap::new();
        props.set("left-style", "1");
        let mut out = PropertyList::new();
        append_borders(&mut out, &props, None);
        assert!(!out.contains_key("fo:border-left"));
    }

    #[test]
    fn list_element_suppresses_margin_left_and_outline_level() {
        let mut props = PropMap::new();
        props.set("margin-left", "1in");
        props.set("text-indent", "0.5in");
        props.set("outline-level", "2");
        let mut page = false;
        let mut col = false;
        let out = paragraph_properties(&props, true, &mut page, &mut col);
        assert!(!out.contains_key("fo:margin-left"));
        assert!(!out.contains_key("fo:text-indent"));
        assert!(!out.contains_key("text:outline-level"));
    }

    #[test]
    fn non_list_paragraph_keeps_margin_left_and_outline_level() {
        let mut props = PropMap::new();
        props.set("margin-left", "1in");
        props.set("outline-level", "2");
        let mut page = false;
        let mut col = false;
        let out = paragraph_properties(&props, false, &mut page, &mut col);
        assert_eq!(out.get("fo:margin-left").unwrap().to_string(), "1in");
        assert_eq!(out.get("text:outline-level").unwrap().to_string(), "2");
    }
}
