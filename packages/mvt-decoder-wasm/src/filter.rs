use std::collections::HashSet;

/// Decides which property keys survive into decoded features.
///
/// Shared read-only between concurrent decodes; consulted once per tag pair.
pub trait PropertyFilter: Send + Sync {
    fn should_keep(&self, key: &str) -> bool;
}

/// Keeps every property.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepAll;

impl PropertyFilter for KeepAll {
    fn should_keep(&self, _key: &str) -> bool {
        true
    }
}

impl<F> PropertyFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn should_keep(&self, key: &str) -> bool {
        self(key)
    }
}

/// Allow-list and deny-list over key names. The deny-list wins when a key
/// appears in both; no allow-list means every key not denied is kept.
#[derive(Debug, Clone, Default)]
pub struct KeyFilter {
    keep: Option<HashSet<String>>,
    drop: HashSet<String>,
}

impl KeyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keep_only<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keep = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn drop_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop.extend(keys.into_iter().map(Into::into));
        self
    }
}

impl PropertyFilter for KeyFilter {
    fn should_keep(&self, key: &str) -> bool {
        if self.drop.contains(key) {
            return false;
        }
        self.keep.as_ref().map_or(true, |keep| keep.contains(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deny_list_wins_over_allow_list() {
        let filter = KeyFilter::new()
            .keep_only(["name", "class"])
            .drop_keys(["name"]);
        assert!(filter.should_keep("class"));
        assert!(!filter.should_keep("name"));
        assert!(!filter.should_keep("height"));
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let filter = KeyFilter::new();
        assert!(filter.should_keep("anything"));
        assert!(KeepAll.should_keep("anything"));
    }

    #[test]
    fn closures_are_filters() {
        let filter = |key: &str| !key.starts_with("name:");
        assert!(filter.should_keep("name"));
        assert!(!filter.should_keep("name:de"));
    }
}
