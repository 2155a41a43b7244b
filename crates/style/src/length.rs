use std::fmt;

/// Units a length value may carry in an AbiWord property.
///
/// `Px` is deliberately treated as a point (1/72 in) rather than the more
/// common 96-dpi pixel convention, matching the source format's own
/// behavior; see `Length::parse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    None,
    Cm,
    In,
    Mm,
    Pica,
    Pt,
    Px,
    Percent,
}

/// A normalized length: either an absolute measurement in inches, or a
/// percentage. Every parsed unit collapses into one of these two forms,
/// mirroring the source convention that a bare number (no unit) means
/// percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    In(f64),
    Percent(f64),
}

impl Length {
    /// Parses a length value: a decimal number (C locale) optionally
    /// followed by one of `cm in mm pi pt px %`. Pica (`pi`) is 1/6 in;
    /// point (`pt`) and pixel (`px`) are both 1/72 in. A missing unit is
    /// percent, divided by 100.
    ///
    /// Delegates to the `nom` grammar in [`crate::parsers::parse_length`];
    /// a non-empty remainder (trailing garbage) is rejected.
    pub fn parse(input: &str) -> Option<Length> {
        let (rest, (value, unit)) = crate::parsers::parse_length(input.trim()).ok()?;
        if !rest.is_empty() {
            return None;
        }
        Some(Length::from_unit(value, unit))
    }

    fn from_unit(value: f64, unit: Unit) -> Length {
        match unit {
            Unit::None | Unit::Percent => Length::Percent(value / 100.0),
            Unit::In => Length::In(value),
            Unit::Cm => Length::In(value / 2.54),
            Unit::Mm => Length::In(value / 25.4),
            Unit::Pica => Length::In(value / 6.0),
            Unit::Pt | Unit::Px => Length::In(value / 72.0),
        }
    }

    pub fn inches(&self) -> Option<f64> {
        match self {
            Length::In(v) => Some(*v),
            Length::Percent(_) => None,
        }
    }

    pub fn percent(&self) -> Option<f64> {
        match self {
            Length::Percent(v) => Some(*v),
            Length::In(_) => None,
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::In(v) => write!(f, "{v}in"),
            Length::Percent(v) => write!(f, "{}%", v * 100.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_unit_is_percent_over_100() {
        assert_eq!(Length::parse("50"), Some(Length::Percent(0.5)));
    }

    #[test]
    fn pica_is_a_sixth_of_an_inch() {
        assert_eq!(Length::parse("6pi"), Some(Length::In(1.0)));
    }

    #[test]
    fn pixel_and_point_are_both_a_72nd_of_an_inch() {
        assert_eq!(Length::parse("72pt"), Some(Length::In(1.0)));
        assert_eq!(Length::parse("72px"), Some(Length::In(1.0)));
    }

    #[test]
    fn roundtrip_within_tolerance() {
        let cm = Length::parse("2.54cm").unwrap().inches().unwrap();
        let inch = Length::parse("1in").unwrap().inches().unwrap();
        assert!((cm - inch).abs() < 1e-6);
    }

    #[test]
    fn percent_suffix_parses_explicitly() {
        assert_eq!(Length::parse("33%"), Some(Length::Percent(0.33)));
    }
}
