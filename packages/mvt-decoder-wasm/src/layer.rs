use std::mem;

use prost::encoding::WireType;

use crate::console_log;
use crate::context::{ParseContext, DEFAULT_EXTENT};
use crate::error::{LayerError, WireError};
use crate::feature::decode_feature;
use crate::filter::PropertyFilter;
use crate::key_order::KeyPriority;
use crate::models::{Layer, Value};
use crate::wire::PbfReader;

const DEFAULT_VERSION: u64 = 1;

/// Per-decode settings shared by every layer of a tile.
pub(crate) struct LayerOptions<'o> {
    pub filter: &'o dyn PropertyFilter,
    pub priority: &'o dyn KeyPriority,
    pub merge_features: bool,
}

/// Decodes one layer message.
///
/// Dictionaries are read first regardless of where they appear on the wire,
/// then features are decoded in wire order. Feature-level problems are
/// counted in the layer stats; an error here means the whole layer is dropped.
pub(crate) fn decode_layer(
    mut message: PbfReader<'_>,
    ctx: &mut ParseContext<'_>,
    options: &LayerOptions<'_>,
) -> Result<Layer, LayerError> {
    ctx.reset_layer();

    let mut name = None;
    let mut extent = DEFAULT_EXTENT as u64;
    let mut version = DEFAULT_VERSION;
    let mut feature_messages = Vec::new();

    while let Some((field, wire_type)) = message.next_field()? {
        match (field, wire_type) {
            (1, WireType::LengthDelimited) => name = Some(message.string()?.to_owned()),
            (2, WireType::LengthDelimited) => feature_messages.push(message.message()?),
            (3, WireType::LengthDelimited) => {
                let raw = message.bytes()?;
                ctx.keys.push(String::from_utf8_lossy(raw).into_owned());
            }
            (4, WireType::LengthDelimited) => {
                // keep the slot so later value ids stay aligned
                let value = decode_value(message.message()?).unwrap_or(Value::Null);
                ctx.values.push(value);
            }
            (5, WireType::Varint) => extent = message.varint()?,
            (15, WireType::Varint) => version = message.varint()?,
            _ => message.skip(wire_type)?,
        }
    }

    let name = name.ok_or(LayerError::MissingName)?;
    let extent = match u32::try_from(extent) {
        Ok(extent) if extent > 0 => extent,
        _ => return Err(LayerError::InvalidExtent(extent)),
    };
    let version = u32::try_from(version).unwrap_or(u32::MAX);

    ctx.begin_features(extent, version, options.priority);

    let mut features = Vec::new();
    for (index, feature) in feature_messages.into_iter().enumerate() {
        if ctx.is_cancelled() {
            return Err(LayerError::Cancelled);
        }
        ctx.stats.feature_sum += 1;
        if let Err(err) = decode_feature(
            feature,
            ctx,
            options.filter,
            options.merge_features,
            &mut features,
        ) {
            ctx.stats.features_dropped += 1;
            console_log!("Layer '{}': dropped feature {}: {}", name, index, err);
        }
    }

    if ctx.stats.tags_dropped > 0 {
        console_log!(
            "Layer '{}': skipped {} invalid tag references",
            name,
            ctx.stats.tags_dropped
        );
    }

    Ok(Layer {
        name,
        extent,
        version,
        keys: mem::take(&mut ctx.keys),
        values: mem::take(&mut ctx.values),
        ordered_keys: mem::take(&mut ctx.ordered_keys),
        features,
        stats: ctx.stats,
    })
}

fn decode_value(mut message: PbfReader<'_>) -> Result<Value, WireError> {
    let mut value = Value::Null;
    while let Some((field, wire_type)) = message.next_field()? {
        value = match (field, wire_type) {
            (1, WireType::LengthDelimited) => Value::String(message.string()?.to_owned()),
            (2, WireType::ThirtyTwoBit) => Value::Double(message.float()? as f64),
            (3, WireType::SixtyFourBit) => Value::Double(message.double()?),
            (4, WireType::Varint) => Value::Int(message.varint()? as i64),
            (5, WireType::Varint) => Value::UInt(message.varint()?),
            (6, WireType::Varint) => {
                let raw = message.varint()?;
                Value::Int((raw >> 1) as i64 ^ -((raw & 1) as i64))
            }
            (7, WireType::Varint) => Value::Bool(message.varint()? != 0),
            _ => {
                message.skip(wire_type)?;
                continue;
            }
        };
    }
    Ok(value)
}
