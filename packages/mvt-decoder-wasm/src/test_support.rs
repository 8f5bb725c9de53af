//! Tile fixtures for unit tests, encoded with geozero's prost MVT types.

use geozero::mvt::{tile, Message, Tile};

pub use geozero::mvt::tile::GeomType;

pub fn command(id: u32, count: u32) -> u32 {
    (id & 0x7) | (count << 3)
}

pub fn zigzag_encode(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// MoveTo the first point, LineTo the rest, optionally ClosePath.
/// `cursor` carries the delta origin across calls within one feature.
pub fn path(points: &[(i32, i32)], cursor: &mut (i32, i32), close: bool) -> Vec<u32> {
    let mut commands = Vec::new();
    for (i, &(x, y)) in points.iter().enumerate() {
        if i == 0 {
            commands.push(command(1, 1));
        } else if i == 1 {
            commands.push(command(2, points.len() as u32 - 1));
        }
        commands.push(zigzag_encode(x - cursor.0));
        commands.push(zigzag_encode(y - cursor.1));
        *cursor = (x, y);
    }
    if close {
        commands.push(command(7, 1));
    }
    commands
}

pub fn point(x: i32, y: i32) -> Vec<u32> {
    path(&[(x, y)], &mut (0, 0), false)
}

pub fn line(points: &[(i32, i32)]) -> Vec<u32> {
    path(points, &mut (0, 0), false)
}

pub fn square(x: i32, y: i32, size: i32) -> Vec<u32> {
    path(
        &[(x, y), (x + size, y), (x + size, y + size), (x, y + size)],
        &mut (0, 0),
        true,
    )
}

pub fn string_value(value: &str) -> tile::Value {
    tile::Value {
        string_value: Some(value.to_string()),
        ..Default::default()
    }
}

pub fn int_value(value: i64) -> tile::Value {
    tile::Value {
        int_value: Some(value),
        ..Default::default()
    }
}

pub fn feature(kind: GeomType, tags: &[u32], geometry: Vec<u32>) -> tile::Feature {
    let mut feature = tile::Feature {
        tags: tags.to_vec(),
        geometry,
        ..Default::default()
    };
    feature.set_type(kind);
    feature
}

pub fn layer(
    name: &str,
    keys: &[&str],
    values: Vec<tile::Value>,
    features: Vec<tile::Feature>,
) -> tile::Layer {
    tile::Layer {
        version: 2,
        name: name.to_string(),
        keys: keys.iter().map(|k| k.to_string()).collect(),
        values,
        features,
        ..Default::default()
    }
}

pub fn encode_tile(layers: Vec<tile::Layer>) -> Vec<u8> {
    Tile { layers }.encode_to_vec()
}

pub fn encode_layer(layer: tile::Layer) -> Vec<u8> {
    layer.encode_to_vec()
}
