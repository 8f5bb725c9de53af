// GeoJSON export of decoded layers, coordinates normalised to the unit tile square
use geo_types::{Coord, LineString, Polygon};
use serde_json::{json, Map, Value as JsonValue};

use crate::models::{feature_id_json, Feature, Layer};

fn position(coord: &Coord<f64>) -> JsonValue {
    json!([coord.x, coord.y])
}

fn line_positions(line: &LineString<f64>) -> JsonValue {
    JsonValue::Array(line.coords().map(position).collect())
}

fn polygon_positions(polygon: &Polygon<f64>) -> JsonValue {
    let mut rings = vec![line_positions(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(line_positions));
    JsonValue::Array(rings)
}

pub fn geometry_to_geojson(geometry: &geo_types::Geometry<f64>) -> JsonValue {
    match geometry {
        geo_types::Geometry::Point(point) => json!({
            "type": "Point",
            "coordinates": position(&point.0),
        }),
        geo_types::Geometry::MultiPoint(points) => json!({
            "type": "MultiPoint",
            "coordinates": points.iter().map(|p| position(&p.0)).collect::<Vec<_>>(),
        }),
        geo_types::Geometry::LineString(line) => json!({
            "type": "LineString",
            "coordinates": line_positions(line),
        }),
        geo_types::Geometry::MultiLineString(lines) => json!({
            "type": "MultiLineString",
            "coordinates": lines.iter().map(line_positions).collect::<Vec<_>>(),
        }),
        geo_types::Geometry::Polygon(polygon) => json!({
            "type": "Polygon",
            "coordinates": polygon_positions(polygon),
        }),
        geo_types::Geometry::MultiPolygon(polygons) => json!({
            "type": "MultiPolygon",
            "coordinates": polygons.iter().map(polygon_positions).collect::<Vec<_>>(),
        }),
        // the decoder never produces other shapes
        _ => JsonValue::Null,
    }
}

impl Layer {
    pub fn feature_to_geojson(&self, feature: &Feature) -> JsonValue {
        let properties: Map<String, JsonValue> = self
            .properties(feature)
            .map(|(key, value)| (key.to_string(), value.to_json()))
            .collect();

        let mut geometries: Vec<JsonValue> = feature
            .geometries
            .iter()
            .map(|geometry| geometry_to_geojson(&geometry.to_geo(self.extent)))
            .collect();
        // merged features carry one geometry per occurrence
        let geometry = if geometries.len() == 1 {
            geometries.remove(0)
        } else {
            json!({ "type": "GeometryCollection", "geometries": geometries })
        };

        let mut object = json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": properties,
        });
        if let Some(id) = feature.id {
            object["id"] = feature_id_json(id);
        }
        object
    }

    pub fn to_geojson(&self) -> JsonValue {
        json!({
            "type": "FeatureCollection",
            "features": self
                .features
                .iter()
                .map(|feature| self.feature_to_geojson(feature))
                .collect::<Vec<_>>(),
        })
    }
}
