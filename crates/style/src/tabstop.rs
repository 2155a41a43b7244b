/// Tab-stop alignment, decoded from the first character of the
/// `align-char` segment of a tab-stop triple (`L`eft, `C`enter,
/// `D`ecimal-char, `R`ight; anything else falls back to `Left`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabAlign {
    Left,
    Center,
    Char,
    Right,
}

/// The optional fill character between the text before a tab stop and
/// the stop itself, selected by a trailing leader digit (`1`→dot,
/// `2`→dash, `3`→underscore).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leader {
    Dot,
    Dash,
    Underscore,
}

impl Leader {
    pub fn as_char(&self) -> char {
        match self {
            Leader::Dot => '.',
            Leader::Dash => '-',
            Leader::Underscore => '_',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabStop {
    pub position_in: f64,
    pub align: TabAlign,
    pub leader: Option<Leader>,
}

impl TabStop {
    /// Parses a single `position/align-char[leader-digit]` triple, e.g.
    /// `"1.5/L1"`. The position must be an inch value; any other unit is
    /// rejected (matching the source, which only accepts `ABW_IN` here).
    ///
    /// Delegates to the `nom` grammar in [`crate::parsers::parse_tab_stop`].
    pub fn parse_one(s: &str) -> Option<TabStop> {
        let s = s.trim_matches(|c| c == ' ');
        let (rest, (position_in, _unit, align, leader)) = crate::parsers::parse_tab_stop(s).ok()?;
        if !rest.is_empty() {
            return None;
        }
        Some(TabStop {
            position_in,
            align,
            leader,
        })
    }

    /// Parses a `,`-separated list of tab-stop triples. Entries that fail
    /// to parse are skipped, matching the source's silently-tolerant
    /// collection loop.
    pub fn parse_list(s: &str) -> Vec<TabStop> {
        s.split(',').filter_map(TabStop::parse_one).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_position_align_and_leader() {
        let stop = TabStop::parse_one("1.5/L1").unwrap();
        assert_eq!(stop.position_in, 1.5);
        assert_eq!(stop.align, TabAlign::Left);
        assert_eq!(stop.leader, Some(Leader::Dot));
    }

    #[test]
    fn unrecognized_align_char_falls_back_to_left() {
        let stop = TabStop::parse_one("2/Q").unwrap();
        assert_eq!(stop.align, TabAlign::Left);
        assert_eq!(stop.leader, None);
    }

    #[test]
    fn parses_comma_separated_list_and_skips_bad_entries() {
        let stops = TabStop::parse_list("1/L,2/R2,not-a-stop");
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[1].leader, Some(Leader::Dash));
    }
}
