/// An ordered mapping from attribute key to raw string value.
///
/// Produced by splitting a `props="key:value;key2:value2"` attribute on
/// `;` then each entry on `:`, trimming whitespace around both halves.
/// Repeated keys take the last value, but insertion order is otherwise
/// preserved so style dumps stay deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropMap {
    entries: Vec<(String, String)>,
}

impl PropMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an AbiWord `props` attribute value.
    pub fn parse(props: &str) -> PropMap {
        let mut map = PropMap::new();
        for decl in props.split(';') {
            let decl = decl.trim();
            if decl.is_empty() {
                continue;
            }
            if let Some((key, value)) = decl.split_once(':') {
                map.set(key.trim(), value.trim());
            }
        }
        map
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Sets `key` to `value`, overwriting any prior entry for `key` in place
    /// (so the map keeps the original insertion position, last-value-wins).
    pub fn set(&mut self, key: &str, value: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value.to_string();
        } else {
            self.entries.push((key.to_string(), value.to_string()));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Overlays `other` on top of `self`: `other`'s entries win on key
    /// collision, new keys are appended. Used to apply a child style's
    /// properties over its resolved parent's.
    pub fn overlay(&mut self, other: &PropMap) {
        for (k, v) in other.iter() {
            self.set(k, v);
        }
    }
}

impl FromIterator<(String, String)> for PropMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut map = PropMap::new();
        for (k, v) in iter {
            map.set(&k, &v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_semicolon_then_colon() {
        let map = PropMap::parse("font-size:12pt; text-align: left ;color:ff0000");
        assert_eq!(map.get("font-size"), Some("12pt"));
        assert_eq!(map.get("text-align"), Some("left"));
        assert_eq!(map.get("color"), Some("ff0000"));
    }

    #[test]
    fn repeated_keys_take_last_value() {
        let map = PropMap::parse("color:ff0000;color:00ff00");
        assert_eq!(map.get("color"), Some("00ff00"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn ignores_empty_declarations() {
        let map = PropMap::parse(";font-size:12pt;;");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn overlay_keeps_new_keys_and_overrides_shared_ones() {
        let mut base = PropMap::parse("font-size:12pt;color:ff0000");
        let child = PropMap::parse("color:00ff00;font-weight:bold");
        base.overlay(&child);
        assert_eq!(base.get("font-size"), Some("12pt"));
        assert_eq!(base.get("color"), Some("00ff00"));
        assert_eq!(base.get("font-weight"), Some("bold"));
    }
}
