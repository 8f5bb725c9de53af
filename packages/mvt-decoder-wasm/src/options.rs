use serde::{Deserialize, Serialize};

use crate::filter::KeyFilter;
use crate::key_order::KeyPriorityTable;
use crate::vectortile::MAX_INFLATED_TILE_BYTES;

/// Decoder configuration, deserialisable from JSON or a JS options object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecodeOptions {
    /// Keys listed first-to-last define the key priority ordering
    pub key_priority: Vec<String>,
    /// When set, only these keys are kept
    pub keep_keys: Option<Vec<String>>,
    pub drop_keys: Vec<String>,
    pub merge_features: bool,
    /// Inflate gzip-compressed tiles before decoding
    pub decompress: bool,
    /// Gzip tiles inflating past this many bytes are rejected
    pub max_inflated_bytes: u64,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            key_priority: Vec::new(),
            keep_keys: None,
            drop_keys: Vec::new(),
            merge_features: true,
            decompress: true,
            max_inflated_bytes: MAX_INFLATED_TILE_BYTES,
        }
    }
}

impl DecodeOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn property_filter(&self) -> KeyFilter {
        let filter = KeyFilter::new().drop_keys(self.drop_keys.iter().cloned());
        match &self.keep_keys {
            Some(keep) => filter.keep_only(keep.iter().cloned()),
            None => filter,
        }
    }

    pub fn key_priority_table(&self) -> KeyPriorityTable {
        KeyPriorityTable::new(self.key_priority.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::PropertyFilter;
    use crate::key_order::KeyPriority;

    #[test]
    fn empty_object_uses_defaults() {
        let options = DecodeOptions::from_json("{}").unwrap();
        assert_eq!(options, DecodeOptions::default());
        assert!(options.merge_features);
        assert!(options.decompress);
    }

    #[test]
    fn camel_case_fields() {
        let options = DecodeOptions::from_json(
            r#"{
                "keyPriority": ["class", "name"],
                "keepKeys": ["class", "name", "height"],
                "dropKeys": ["name"],
                "mergeFeatures": false
            }"#,
        )
        .unwrap();

        assert!(!options.merge_features);
        let filter = options.property_filter();
        assert!(filter.should_keep("class"));
        assert!(!filter.should_keep("name"));
        assert!(!filter.should_keep("kind"));

        let table = options.key_priority_table();
        assert_eq!(table.rank("name"), Some(1));
    }

    #[test]
    fn inflate_limit_is_configurable() {
        assert_eq!(DecodeOptions::default().max_inflated_bytes, MAX_INFLATED_TILE_BYTES);
        let options = DecodeOptions::from_json(r#"{"maxInflatedBytes": 1024}"#).unwrap();
        assert_eq!(options.max_inflated_bytes, 1024);
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(DecodeOptions::from_json(r#"{"mergeFeatures": "yes"}"#).is_err());
    }
}
