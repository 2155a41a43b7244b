use abw_types::Color;

/// The four border-style codes a `<side>-style` property may carry.
///
/// `0` clears the side entirely (no border emitted); `1`/`2`/`3` select
/// solid/dotted/dashed. Any other value is treated as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderStyle {
    None,
    Solid,
    Dotted,
    Dashed,
}

impl BorderStyle {
    pub fn from_code(code: &str) -> Option<BorderStyle> {
        match code.trim() {
            "0" => Some(BorderStyle::None),
            "1" => Some(BorderStyle::Solid),
            "2" => Some(BorderStyle::Dotted),
            "3" => Some(BorderStyle::Dashed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BorderStyle::None => "none",
            BorderStyle::Solid => "solid",
            BorderStyle::Dotted => "dotted",
            BorderStyle::Dashed => "dashed",
        }
    }
}

/// A single resolved border side: width in inches, style, and color.
///
/// The default thickness used when a side's `-thickness` property is
/// absent is 0.01in, per the source's border defaulting behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub width_in: f64,
    pub style: BorderStyle,
    pub color: Color,
}

impl Border {
    pub const DEFAULT_WIDTH_IN: f64 = 0.01;

    /// The `0.01in solid #000000` fallback used to fill unset table-cell
    /// border sides.
    pub fn default_undef() -> Border {
        Border {
            width_in: Self::DEFAULT_WIDTH_IN,
            style: BorderStyle::Solid,
            color: Color::BLACK,
        }
    }
}
