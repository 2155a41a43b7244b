//! `nom`-based combinators for the small value grammars embedded in AbiWord
//! property strings: unit-bearing lengths, 6-hex-digit colors, and tab-stop
//! triples. [`crate::length`], [`crate::border`], and [`crate::tabstop`]
//! expose the ergonomic `parse`/`parse_one` entry points used by the rest of
//! the workspace; this module is where the actual grammars live.

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while_m_n};
use nom::character::complete::{char, digit1};
use nom::combinator::{map, map_res, opt, recognize, value};
use nom::sequence::{pair, preceded, tuple};
use nom::IResult;

use abw_types::Color;

use crate::length::Unit;
use crate::tabstop::{Leader, TabAlign};

/// `[+-]? digit+ ('.' digit+)?`, the decimal-number grammar shared by every
/// length-like value (C locale: `.` always the decimal separator).
fn decimal(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(alt((char('+'), char('-')))),
            digit1,
            opt(pair(char('.'), digit1)),
        ))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

fn unit(input: &str) -> IResult<&str, Unit> {
    alt((
        value(Unit::Cm, tag("cm")),
        value(Unit::In, tag("in")),
        value(Unit::Mm, tag("mm")),
        value(Unit::Pica, tag("pi")),
        value(Unit::Pt, tag("pt")),
        value(Unit::Px, tag("px")),
        value(Unit::Percent, tag("%")),
    ))(input)
}

/// Parses `decimal unit?`, defaulting to [`Unit::None`] (percent) when no
/// unit suffix follows, per the AbiWord length grammar (spec.md §6).
pub fn parse_length(input: &str) -> IResult<&str, (f64, Unit)> {
    let (rest, value) = decimal(input)?;
    match opt(unit)(rest)? {
        (rest, Some(u)) => Ok((rest, (value, u))),
        (rest, None) => Ok((rest, (value, Unit::None))),
    }
}

fn hex_byte(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()), |s| {
        u8::from_str_radix(s, 16)
    })(input)
}

/// Parses a 6-hex-digit color, with an optional leading `#`.
pub fn parse_color(input: &str) -> IResult<&str, Color> {
    map(
        preceded(opt(char('#')), tuple((hex_byte, hex_byte, hex_byte))),
        |(r, g, b)| Color { r, g, b },
    )(input)
}

/// Parses the `<side>-style` border code (`0`-`3`).
pub fn parse_border_style_code(input: &str) -> IResult<&str, u8> {
    map_res(digit1, |s: &str| s.parse::<u8>())(input)
}

fn tab_align(input: &str) -> IResult<&str, TabAlign> {
    alt((
        value(TabAlign::Left, char('L')),
        value(TabAlign::Center, char('C')),
        value(TabAlign::Char, char('D')),
        value(TabAlign::Right, char('R')),
    ))(input)
}

fn leader(input: &str) -> IResult<&str, Leader> {
    alt((
        value(Leader::Dot, char('1')),
        value(Leader::Dash, char('2')),
        value(Leader::Underscore, char('3')),
    ))(input)
}

/// Parses one `position/align[leader]` tab-stop triple, returning the raw
/// inch position (the unit suffix, if any, is validated by the caller --
/// only `in` or no unit is legal here).
pub fn parse_tab_stop(
    input: &str,
) -> IResult<&str, (f64, Option<&str>, TabAlign, Option<Leader>)> {
    let (rest, pos) = decimal(input)?;
    let (rest, unit_suffix) = opt(tag("in"))(rest)?;
    let (rest, _) = char('/')(rest)?;
    let (rest, align) = opt(tab_align)(rest)?;
    let (rest, leader) = opt(leader)(rest)?;
    Ok((
        rest,
        (pos, unit_suffix, align.unwrap_or(TabAlign::Left), leader),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_length_with_unit() {
        assert_eq!(parse_length("2.54cm"), Ok(("", (2.54, Unit::Cm))));
    }

    #[test]
    fn parses_bare_number_as_unitless() {
        assert_eq!(parse_length("50"), Ok(("", (50.0, Unit::None))));
    }

    #[test]
    fn parses_color_with_and_without_hash() {
        let (_, c1) = parse_color("#ff0000").unwrap();
        let (_, c2) = parse_color("ff0000").unwrap();
        assert_eq!(c1, c2);
        assert_eq!(c1, Color::new(255, 0, 0));
    }

    #[test]
    fn parses_tab_stop_triple() {
        let (_, (pos, unit_suffix, align, leader)) = parse_tab_stop("1.5/L1").unwrap();
        assert_eq!(pos, 1.5);
        assert_eq!(unit_suffix, None);
        assert_eq!(align, TabAlign::Left);
        assert_eq!(leader, Some(Leader::Dot));
    }

    #[test]
    fn rejects_trailing_garbage_as_leftover_not_error() {
        let (rest, _) = parse_border_style_code("2extra").unwrap();
        assert_eq!(rest, "extra");
    }
}
