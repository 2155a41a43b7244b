//! Frame (image/textbox) property translation (spec.md §4.5 "Frames").
//!
//! Grounded in `ABWContentCollector.cpp`'s `openFrame`/`closeFrame`/
//! `addFrameElements`. A frame's content-handling is driven by its
//! `frame-type`: image frames insert the pre-pass binary referenced by
//! `image-id`, text boxes accept nested paragraph flow, anything else
//! skips its contents (still walked, never emitted).

use abw_idf::PropertyList;
use abw_style::{Length, PropMap};
use abw_types::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Image,
    TextBox,
    Unknown,
}

pub fn frame_kind(props: &PropMap) -> FrameKind {
    match props.get("frame-type") {
        Some("image") => FrameKind::Image,
        Some("textbox") => FrameKind::TextBox,
        _ => FrameKind::Unknown,
    }
}

/// True when the frame is anchored to the page rather than to its
/// enclosing paragraph; page-anchored frames splice into the per-page
/// side buffer instead of the inline body (spec.md §4.6).
///
/// Grounded in `openFrame`'s `position-to` handling: `page-above-text`
/// always anchors to the page; `column-above-text` does too, but only
/// when no page position was actually declared (the original's own
/// "unsure how to retrieve that" fallback); anything else (including a
/// missing `position-to`) anchors to the paragraph.
pub fn is_page_anchored(props: &PropMap) -> bool {
    match props.get("position-to") {
        Some("page-above-text") => true,
        Some("column-above-text") => !props.contains_key("frame-page-ypos"),
        _ => false,
    }
}

fn length_in(props: &PropMap, key: &str) -> Option<f64> {
    props.get(key).and_then(Length::parse).and_then(|l| l.inches())
}

fn wrap_properties(out: &mut PropertyList, props: &PropMap) {
    let Some(wrap) = props.get("wrap-mode") else {
        return;
    };
    match wrap {
        "wrapped-to-left" => {
            out.set("style:wrap", "left");
        }
        "wrapped-to-right" => {
            out.set("style:wrap", "right");
        }
        "wrapped-to-both" => {
            out.set("style:wrap", "parallel");
        }
        "above-text" => {
            out.set("style:wrap", "dynamic");
            out.set("style:run-through", "foreground");
        }
        "below-text" => {
            out.set("style:wrap", "dynamic");
            out.set("style:run-through", "background");
        }
        _ => {}
    }
}

/// Builds the property list for a frame's `OpenFrame`/`OpenTextBox` event.
pub fn frame_properties(props: &PropMap) -> PropertyList {
    let mut out = PropertyList::new();
    out.set("librevenge:frame-type", props.get("frame-type").unwrap_or("unknown"));

    if let Some(w) = length_in(props, "frame-width") {
        out.set("svg:width", format!("{w}in"));
    }
    if let Some(h) = length_in(props, "frame-height") {
        out.set("svg:height", format!("{h}in"));
    }

    if is_page_anchored(props) {
        if let (Some(x), Some(y)) = (
            length_in(props, "frame-page-xpos"),
            length_in(props, "frame-page-ypos"),
        ) {
            out.set("svg:x", format!("{x}in"));
            out.set("svg:y", format!("{y}in"));
        }
        out.set("style:vertical-rel", "page");
        out.set("style:horizontal-rel", "page");
        out.set("text:anchor-type", "page");
        if let Some(pref_page) = props.get("frame-pref-page").and_then(|s| s.trim().parse::<i64>().ok())
        {
            out.set("text:anchor-page-number", pref_page + 1);
        }
    } else {
        if let (Some(x), Some(y)) = (length_in(props, "xpos"), length_in(props, "ypos")) {
            out.set("svg:x", format!("{x}in"));
            out.set("svg:y", format!("{y}in"));
        }
        out.set("text:anchor-type", "paragraph");
    }

    // `bg-style == 1` means "filled with background-color"; any other
    // value (including absent) leaves the frame unfilled.
    if props.get("bg-style") == Some("1") {
        if let Some(bg) = props.get("background-color").and_then(Color::parse) {
            out.set("fo:background-color", bg.to_string());
        }
    }

    wrap_properties(&mut out, props);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_frame_type_is_recognized() {
        let mut props = PropMap::new();
        props.set("frame-type", "image");
        assert_eq!(frame_kind(&props), FrameKind::Image);
    }

    #[test]
    fn page_anchored_frame_uses_page_position_keys() {
        let mut props = PropMap::new();
        props.set("position-to", "page-above-text");
        props.set("frame-page-xpos", "1in");
        props.set("frame-page-ypos", "2in");
        assert!(is_page_anchored(&props));
        let out = frame_properties(&props);
        assert_eq!(out.get("text:anchor-type").unwrap().to_string(), "page");
        assert_eq!(out.get("svg:x").unwrap().to_string(), "1in");
    }

    #[test]
    fn column_above_text_without_page_ypos_anchors_to_paragraph() {
        let mut props = PropMap::new();
        props.set("position-to", "column-above-text");
        assert!(!is_page_anchored(&props));
    }

    #[test]
    fn background_color_only_applies_with_bg_style_one() {
        let mut props = PropMap::new();
        props.set("background-color", "ff0000");
        let out = frame_properties(&props);
        assert!(!out.contains_key("fo:background-color"));

        props.set("bg-style", "1");
        let out = frame_properties(&props);
        assert!(out.contains_key("fo:background-color"));
    }

    #[test]
    fn wrap_mode_above_text_maps_to_dynamic_foreground() {
        let mut props = PropMap::new();
        props.set("wrap-mode", "above-text");
        let out = frame_properties(&props);
        assert_eq!(out.get("style:wrap").unwrap().to_string(), "dynamic");
        assert_eq!(out.get("style:run-through").unwrap().to_string(), "foreground");
    }
}
