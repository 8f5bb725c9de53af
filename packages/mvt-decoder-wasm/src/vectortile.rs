use std::borrow::Cow;
use std::io::Read;
use std::sync::Arc;

use flate2::read::GzDecoder;
use prost::encoding::WireType;

use crate::cancellation::CancellationToken;
use crate::console_log;
use crate::context::ParseContext;
use crate::error::{DecodeError, LayerError};
use crate::filter::{KeepAll, PropertyFilter};
use crate::key_order::{KeyPriority, KeyPriorityTable};
use crate::layer::{decode_layer, LayerOptions};
use crate::models::TileData;
use crate::options::DecodeOptions;
use crate::wire::PbfReader;

const TILE_LAYERS_FIELD: u32 = 3;

/// Upper bound on the inflated size of a gzip-compressed tile.
pub const MAX_INFLATED_TILE_BYTES: u64 = 32 * 1024 * 1024;

/// Decodes vector tiles into `TileData`.
///
/// Holds only read-only configuration, so one decoder can be shared by any
/// number of worker threads; every call gets its own parse context.
#[derive(Clone)]
pub struct TileDecoder {
    filter: Arc<dyn PropertyFilter>,
    priority: Arc<dyn KeyPriority>,
    merge_features: bool,
    decompress: bool,
    max_inflated_bytes: u64,
}

impl Default for TileDecoder {
    fn default() -> Self {
        Self::new(Arc::new(KeepAll))
    }
}

impl TileDecoder {
    pub fn new(filter: Arc<dyn PropertyFilter>) -> Self {
        Self {
            filter,
            priority: Arc::new(KeyPriorityTable::default()),
            merge_features: true,
            decompress: true,
            max_inflated_bytes: MAX_INFLATED_TILE_BYTES,
        }
    }

    pub fn from_options(options: &DecodeOptions) -> Self {
        Self {
            filter: Arc::new(options.property_filter()),
            priority: Arc::new(options.key_priority_table()),
            merge_features: options.merge_features,
            decompress: options.decompress,
            max_inflated_bytes: options.max_inflated_bytes,
        }
    }

    pub fn with_key_priority(mut self, priority: Arc<dyn KeyPriority>) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_feature_merging(mut self, enabled: bool) -> Self {
        self.merge_features = enabled;
        self
    }

    pub fn with_decompression(mut self, enabled: bool) -> Self {
        self.decompress = enabled;
        self
    }

    pub fn with_max_inflated_bytes(mut self, limit: u64) -> Self {
        self.max_inflated_bytes = limit;
        self
    }

    pub fn decode(&self, data: &[u8], source_id: i32) -> Result<Arc<TileData>, DecodeError> {
        self.run(data, source_id, None)
    }

    /// Like [`decode`](Self::decode), but gives up with
    /// `DecodeError::Cancelled` once `token` is cancelled.
    pub fn decode_cancellable(
        &self,
        data: &[u8],
        source_id: i32,
        token: &CancellationToken,
    ) -> Result<Arc<TileData>, DecodeError> {
        self.run(data, source_id, Some(token))
    }

    fn run(
        &self,
        data: &[u8],
        source_id: i32,
        cancel: Option<&CancellationToken>,
    ) -> Result<Arc<TileData>, DecodeError> {
        let data = if self.decompress {
            decompress_gzip(data, self.max_inflated_bytes)?
        } else {
            Cow::Borrowed(data)
        };
        let options = LayerOptions {
            filter: self.filter.as_ref(),
            priority: self.priority.as_ref(),
            merge_features: self.merge_features,
        };
        decode_layers(&data, source_id, &options, cancel).map(Arc::new)
    }
}

/// Decodes `data` with default settings and the given property filter.
pub fn decode_tile(
    data: &[u8],
    source_id: i32,
    filter: &dyn PropertyFilter,
) -> Result<Arc<TileData>, DecodeError> {
    let priority = KeyPriorityTable::default();
    let options = LayerOptions {
        filter,
        priority: &priority,
        merge_features: true,
    };
    let data = decompress_gzip(data, MAX_INFLATED_TILE_BYTES)?;
    decode_layers(&data, source_id, &options, None).map(Arc::new)
}

fn decode_layers(
    data: &[u8],
    source_id: i32,
    options: &LayerOptions<'_>,
    cancel: Option<&CancellationToken>,
) -> Result<TileData, DecodeError> {
    let mut ctx = ParseContext::new(source_id, cancel);
    let mut reader = PbfReader::new(data);
    let mut layers = Vec::new();
    let mut index = 0;

    while let Some((field, wire_type)) = reader.next_field()? {
        if field != TILE_LAYERS_FIELD || wire_type != WireType::LengthDelimited {
            reader.skip(wire_type)?;
            continue;
        }
        let message = reader.message()?;
        if let Some(token) = cancel {
            token.throw_if_cancelled()?;
        }

        match decode_layer(message, &mut ctx, options) {
            Ok(layer) => layers.push(layer),
            Err(LayerError::Cancelled) => return Err(DecodeError::Cancelled),
            Err(err) => console_log!("Tile source {}: dropped layer {}: {}", source_id, index, err),
        }
        index += 1;
    }

    Ok(TileData { source_id, layers })
}

// Function to detect if data is gzipped (checking for gzip magic number)
fn is_gzipped(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1F && data[1] == 0x8B
}

fn decompress_gzip(data: &[u8], limit: u64) -> Result<Cow<'_, [u8]>, DecodeError> {
    if !is_gzipped(data) {
        return Ok(Cow::Borrowed(data));
    }

    // one byte past the limit tells an exact fit from an overrun
    let mut decoder = GzDecoder::new(data).take(limit.saturating_add(1));
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    if decompressed.len() as u64 > limit {
        return Err(DecodeError::TooLarge { limit });
    }
    Ok(Cow::Owned(decompressed))
}
