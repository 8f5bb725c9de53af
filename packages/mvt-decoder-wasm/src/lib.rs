use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;

// Create a console module for logging
pub mod console;

mod batch;
mod cancellation;
mod context;
mod error;
mod feature;
mod filter;
pub mod geojson_features;
mod geometry;
mod key_order;
mod layer;
mod models;
mod options;
mod vectortile;
mod wire;

#[cfg(test)]
mod test_support;

pub use batch::TileJob;
pub use cancellation::CancellationToken;
pub use error::{DecodeError, FeatureError, GeometryError, LayerError, WireError};
pub use filter::{KeepAll, KeyFilter, PropertyFilter};
pub use geometry::{decode_geometry, signed_area_x2, Geometry, GeometryKind, Winding};
pub use key_order::{KeyPriority, KeyPriorityTable};
pub use models::{Feature, Layer, LayerStats, TileData, Value};
pub use options::DecodeOptions;
pub use vectortile::{decode_tile, TileDecoder, MAX_INFLATED_TILE_BYTES};
pub use wire::PbfReader;

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

// Use the macro from our console module
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => ($crate::console::log(&format!($($t)*)))
}

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        // Set the panic hook for better error messages
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console_log!("MVT decoder initialized");
    });
}

fn options_from_js(options: JsValue) -> Result<DecodeOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(DecodeOptions::default());
    }
    Ok(serde_wasm_bindgen::from_value(options)?)
}

fn decode_for_js(data: &[u8], source_id: i32, options: JsValue) -> Result<std::sync::Arc<TileData>, JsValue> {
    let options = options_from_js(options)?;
    TileDecoder::from_options(&options)
        .decode(data, source_id)
        .map_err(|e| JsValue::from_str(&format!("Failed to decode MVT tile: {}", e)))
}

/// Decode a vector tile buffer and return the decoded layers as a plain JS object
#[wasm_bindgen(js_name = parseVectorTile)]
pub fn parse_vector_tile(data: &[u8], source_id: i32, options: JsValue) -> Result<JsValue, JsValue> {
    let tile = decode_for_js(data, source_id, options)?;
    Ok(tile.serialize(&Serializer::json_compatible())?)
}

/// Decode a vector tile buffer and return one layer as a GeoJSON FeatureCollection
#[wasm_bindgen(js_name = parseVectorTileLayerGeoJson)]
pub fn parse_vector_tile_layer_geojson(
    data: &[u8],
    source_id: i32,
    layer_name: &str,
    options: JsValue,
) -> Result<JsValue, JsValue> {
    let tile = decode_for_js(data, source_id, options)?;
    match tile.layer(layer_name) {
        Some(layer) => Ok(layer.to_geojson().serialize(&Serializer::json_compatible())?),
        None => Err(JsValue::from_str(&format!("Layer '{}' not found in tile", layer_name))),
    }
}
