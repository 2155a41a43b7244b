use std::collections::{HashMap, HashSet};

use crate::prop_map::PropMap;

/// A single named style entry: AbiWord does not distinguish paragraph and
/// character styles, so one `Style` serves both contexts.
#[derive(Debug, Clone, Default)]
pub struct Style {
    pub based_on: Option<String>,
    pub followed_by: Option<String>,
    pub properties: PropMap,
}

/// The full set of named styles collected in the styles pre-pass, plus
/// the implicit `Normal` default every document carries even when no
/// `<s>` element declares it.
#[derive(Debug, Clone, Default)]
pub struct StyleTable {
    styles: HashMap<String, Style>,
}

impl StyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, style: Style) {
        self.styles.insert(name.into(), style);
    }

    pub fn get(&self, name: &str) -> Option<&Style> {
        self.styles.get(name)
    }

    /// Flattens `name`'s `based_on` ancestry into a single `PropMap`,
    /// depth-first with the child overriding the parent, guarded against
    /// cycles by a per-call visited set. A style cycle terminates
    /// resolution rather than looping: each style in the cycle still
    /// contributes its own direct properties once.
    ///
    /// A style named `Heading <n>` with `0 < n < 10` additionally sets
    /// `outline-level` to `n` in the result.
    ///
    /// An unknown `name` resolves to an empty map.
    pub fn resolve(&self, name: &str) -> PropMap {
        let mut out = PropMap::new();
        let mut visited = HashSet::new();
        self.recurse(name, &mut out, &mut visited);
        out
    }

    fn recurse(&self, name: &str, out: &mut PropMap, visited: &mut HashSet<String>) {
        if !visited.insert(name.to_string()) {
            return;
        }
        let Some(style) = self.styles.get(name) else {
            return;
        };
        if let Some(parent) = &style.based_on {
            if !visited.contains(parent) {
                self.recurse(parent, out, visited);
            }
        }
        out.overlay(&style.properties);
        if let Some(level) = heading_level(name) {
            out.set("outline-level", &level.to_string());
        }
    }
}

fn heading_level(name: &str) -> Option<u32> {
    let rest = name.strip_prefix("Heading ")?;
    let n: u32 = rest.parse().ok()?;
    if n > 0 && n < 10 { Some(n) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_based_on_chain_child_overrides_parent() {
        let mut table = StyleTable::new();
        table.insert(
            "Parent",
            Style {
                based_on: None,
                followed_by: None,
                properties: PropMap::parse("font-size:10pt;color:000000"),
            },
        );
        table.insert(
            "Child",
            Style {
                based_on: Some("Parent".to_string()),
                followed_by: None,
                properties: PropMap::parse("color:ff0000"),
            },
        );
        let resolved = table.resolve("Child");
        assert_eq!(resolved.get("font-size"), Some("10pt"));
        assert_eq!(resolved.get("color"), Some("ff0000"));
    }

    #[test]
    fn breaks_cycles_and_keeps_each_styles_direct_properties() {
        let mut table = StyleTable::new();
        table.insert(
            "A",
            Style {
                based_on: Some("B".to_string()),
                followed_by: None,
                properties: PropMap::parse("font-weight:bold"),
            },
        );
        table.insert(
            "B",
            Style {
                based_on: Some("A".to_string()),
                followed_by: None,
                properties: PropMap::parse("font-style:italic"),
            },
        );
        let resolved = table.resolve("A");
        assert_eq!(resolved.get("font-weight"), Some("bold"));
        assert_eq!(resolved.get("font-style"), Some("italic"));
    }

    #[test]
    fn heading_style_sets_outline_level() {
        let mut table = StyleTable::new();
        table.insert(
            "Heading 2",
            Style {
                based_on: None,
                followed_by: None,
                properties: PropMap::new(),
            },
        );
        let resolved = table.resolve("Heading 2");
        assert_eq!(resolved.get("outline-level"), Some("2"));
    }

    #[test]
    fn unknown_style_resolves_empty() {
        let table = StyleTable::new();
        assert!(table.resolve("Nonexistent").is_empty());
    }
}
