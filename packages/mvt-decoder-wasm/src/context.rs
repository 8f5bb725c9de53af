use std::collections::HashMap;

use crate::cancellation::CancellationToken;
use crate::geometry::Winding;
use crate::key_order::{order_keys, KeyPriority};
use crate::models::{LayerStats, Value};

pub(crate) const DEFAULT_EXTENT: u32 = 4096;

/// Mutable state for a single tile decode.
///
/// Created by the tile decoder, passed down by `&mut` and reset at every
/// layer boundary; nothing in here outlives the decode call.
pub(crate) struct ParseContext<'c> {
    pub source_id: i32,
    pub cancel: Option<&'c CancellationToken>,

    pub keys: Vec<String>,
    pub values: Vec<Value>,
    pub ordered_keys: Vec<u32>,
    // position of each key id within `ordered_keys`
    pub key_rank: Vec<u32>,
    pub tile_extent: u32,
    pub winding: Winding,

    pub feature_tags: Vec<(u32, u32)>,
    pub feature_map: HashMap<Vec<(u32, u32)>, usize>,
    pub stats: LayerStats,

    // reused across features to avoid per-feature allocation
    pub tag_buf: Vec<u32>,
    pub command_buf: Vec<u32>,
}

impl<'c> ParseContext<'c> {
    pub fn new(source_id: i32, cancel: Option<&'c CancellationToken>) -> Self {
        Self {
            source_id,
            cancel,
            keys: Vec::new(),
            values: Vec::new(),
            ordered_keys: Vec::new(),
            key_rank: Vec::new(),
            tile_extent: DEFAULT_EXTENT,
            winding: Winding::Unknown,
            feature_tags: Vec::new(),
            feature_map: HashMap::new(),
            stats: LayerStats::default(),
            tag_buf: Vec::new(),
            command_buf: Vec::new(),
        }
    }

    /// Clears all layer-scoped state before a new layer's dictionaries are read.
    pub fn reset_layer(&mut self) {
        self.keys.clear();
        self.values.clear();
        self.ordered_keys.clear();
        self.key_rank.clear();
        self.tile_extent = DEFAULT_EXTENT;
        self.winding = Winding::Unknown;
        self.feature_tags.clear();
        self.feature_map.clear();
        self.stats = LayerStats::default();
    }

    /// Installs the layer's metadata once its dictionaries are complete.
    pub fn begin_features(&mut self, extent: u32, version: u32, priority: &dyn KeyPriority) {
        self.tile_extent = extent;
        // v1 tiles predate the winding-order requirement
        self.winding = if version >= 2 {
            Winding::Standard
        } else {
            Winding::Unknown
        };
        let (ordered, rank) = order_keys(&self.keys, priority);
        self.ordered_keys = ordered;
        self.key_rank = rank;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.map_or(false, |token| token.is_cancelled())
    }
}
