// Output data structures handed to the styling pipeline
use serde::{Serialize, Serializer};

use crate::geometry::{Geometry, GeometryKind};

// Largest integer a JS number holds exactly (Number.MAX_SAFE_INTEGER)
const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// A property value from a layer's value dictionary.
///
/// Serialises untagged. Integers outside the JS safe range are written as
/// decimal strings so JS consumers never see a rounded or rejected number.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Double(f64),
    Int(i64),
    UInt(u64),
    Bool(bool),
    // Dictionary slot with no recognised field; never referenced by a kept tag
    Null,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Double(d) => Some(d),
            Value::Int(i) => Some(i as f64),
            Value::UInt(u) => Some(u as f64),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Double(d) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Int(i) if i.unsigned_abs() > MAX_SAFE_INTEGER => serde_json::Value::String(i.to_string()),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::UInt(u) if *u > MAX_SAFE_INTEGER => serde_json::Value::String(u.to_string()),
            Value::UInt(u) => serde_json::Value::Number((*u).into()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Null => serde_json::Value::Null,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Value::String(ref s) => serializer.serialize_str(s),
            Value::Double(d) => serializer.serialize_f64(d),
            Value::Int(i) if i.unsigned_abs() > MAX_SAFE_INTEGER => serializer.collect_str(&i),
            Value::Int(i) => serializer.serialize_i64(i),
            Value::UInt(u) if u > MAX_SAFE_INTEGER => serializer.collect_str(&u),
            Value::UInt(u) => serializer.serialize_u64(u),
            Value::Bool(b) => serializer.serialize_bool(b),
            Value::Null => serializer.serialize_unit(),
        }
    }
}

/// Feature ids are often 64-bit hashes; ids past the JS safe range become strings.
pub fn feature_id_json(id: u64) -> serde_json::Value {
    if id > MAX_SAFE_INTEGER {
        serde_json::Value::String(id.to_string())
    } else {
        serde_json::Value::Number(id.into())
    }
}

fn serialize_feature_id<S: Serializer>(id: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
    match *id {
        Some(id) if id > MAX_SAFE_INTEGER => serializer.collect_str(&id),
        Some(id) => serializer.serialize_u64(id),
        None => serializer.serialize_none(),
    }
}

/// One logical feature: a retained tag list plus every geometry that carried
/// exactly that tag list within the layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    #[serde(serialize_with = "serialize_feature_id")]
    pub id: Option<u64>,
    pub source_id: i32,
    /// `(key_id, value_id)` pairs into the owning layer's dictionaries,
    /// sorted by key priority then value id.
    pub tags: Vec<(u32, u32)>,
    pub geometries: Vec<Geometry>,
}

impl Feature {
    /// The geometry kind shared by every geometry of this feature. `None` when
    /// merging combined geometries of different kinds.
    pub fn kind(&self) -> Option<GeometryKind> {
        let kind = self.geometries.first()?.kind;
        self.geometries.iter().all(|g| g.kind == kind).then_some(kind)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStats {
    /// Feature messages processed, including dropped ones
    pub feature_sum: usize,
    /// Features folded into an earlier feature with the same tags
    pub feature_merged: usize,
    pub features_dropped: usize,
    pub tags_dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub name: String,
    pub extent: u32,
    pub version: u32,
    pub keys: Vec<String>,
    pub values: Vec<Value>,
    /// Key ids sorted by the decoder's key priority
    pub ordered_keys: Vec<u32>,
    pub features: Vec<Feature>,
    pub stats: LayerStats,
}

impl Layer {
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn properties<'l>(
        &'l self,
        feature: &'l Feature,
    ) -> impl Iterator<Item = (&'l str, &'l Value)> + 'l {
        feature
            .tags
            .iter()
            .map(move |&(k, v)| (self.keys[k as usize].as_str(), &self.values[v as usize]))
    }

    pub fn property<'l>(&'l self, feature: &'l Feature, key: &str) -> Option<&'l Value> {
        self.properties(feature)
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }
}

/// Result of decoding one tile. Read-only once returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileData {
    pub source_id: i32,
    pub layers: Vec<Layer>,
}

impl TileData {
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn geometry(kind: GeometryKind) -> Geometry {
        Geometry {
            kind,
            coordinates: vec![geo_types::Coord { x: 1, y: 1 }],
            sizes: vec![1],
        }
    }

    fn roads() -> Layer {
        Layer {
            name: "roads".into(),
            extent: 4096,
            version: 2,
            keys: vec!["class".into(), "ref".into()],
            values: vec![Value::String("primary".into()), Value::UInt(1 << 60)],
            ordered_keys: vec![0, 1],
            features: Vec::new(),
            stats: LayerStats::default(),
        }
    }

    #[test]
    fn property_outlives_a_separately_owned_feature() {
        let layer = roads();
        let class = {
            let feature = Feature {
                id: None,
                source_id: 0,
                tags: vec![(0, 0)],
                geometries: vec![geometry(GeometryKind::Point)],
            };
            layer.property(&feature, "class").cloned()
        };
        assert_eq!(class, Some(Value::String("primary".into())));
    }

    #[test]
    fn large_integers_serialise_as_strings() {
        let feature = Feature {
            id: Some(1 << 60),
            source_id: 2,
            tags: vec![(1, 1)],
            geometries: Vec::new(),
        };
        let json = serde_json::to_value(&feature).unwrap();
        assert_eq!(json["id"], json!("1152921504606846976"));

        let small = Feature { id: Some(42), ..feature };
        assert_eq!(serde_json::to_value(&small).unwrap()["id"], json!(42));

        let values = serde_json::to_value(&roads().values).unwrap();
        assert_eq!(values, json!(["primary", "1152921504606846976"]));
        assert_eq!(
            serde_json::to_value(&[Value::Int(-(1 << 60)), Value::Int(-7), Value::Null]).unwrap(),
            json!(["-1152921504606846976", -7, null])
        );
        assert_eq!(Value::UInt(1 << 60).to_json(), json!("1152921504606846976"));
        assert_eq!(feature_id_json(9), json!(9));
    }

    #[test]
    fn mixed_merged_feature_has_no_single_kind() {
        let mut feature = Feature {
            id: None,
            source_id: 0,
            tags: Vec::new(),
            geometries: vec![geometry(GeometryKind::Line), geometry(GeometryKind::Line)],
        };
        assert_eq!(feature.kind(), Some(GeometryKind::Line));

        feature.geometries.push(geometry(GeometryKind::Polygon));
        assert_eq!(feature.kind(), None);
    }
}
