use prost::encoding::WireType;

use crate::context::ParseContext;
use crate::error::FeatureError;
use crate::filter::PropertyFilter;
use crate::geometry::{decode_geometry, GeometryKind};
use crate::models::{Feature, Value};
use crate::wire::PbfReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FeatureOutcome {
    Emitted,
    Merged,
}

/// Decodes one feature message and either appends a new `Feature` or folds
/// its geometry into the earlier feature carrying the same retained tags.
///
/// The caller counts the message in `feature_sum`; an error means the
/// feature was dropped and nothing was appended.
pub(crate) fn decode_feature(
    mut message: PbfReader<'_>,
    ctx: &mut ParseContext<'_>,
    filter: &dyn PropertyFilter,
    merge_features: bool,
    features: &mut Vec<Feature>,
) -> Result<FeatureOutcome, FeatureError> {
    ctx.tag_buf.clear();
    ctx.command_buf.clear();
    let mut id = None;
    let mut geom_type = 0;

    while let Some((field, wire_type)) = message.next_field()? {
        match (field, wire_type) {
            (1, WireType::Varint) => id = Some(message.varint()?),
            (2, _) => message.repeated_u32(wire_type, &mut ctx.tag_buf)?,
            (3, WireType::Varint) => geom_type = message.varint()?,
            (4, _) => message.repeated_u32(wire_type, &mut ctx.command_buf)?,
            _ => message.skip(wire_type)?,
        }
    }

    let kind =
        GeometryKind::from_wire(geom_type).ok_or(FeatureError::UnknownGeometryType(geom_type))?;

    collect_tags(ctx, filter);

    let geometry = decode_geometry(&ctx.command_buf, kind, &mut ctx.winding)?;

    if merge_features {
        if let Some(&index) = ctx.feature_map.get(ctx.feature_tags.as_slice()) {
            features[index].geometries.push(geometry);
            ctx.stats.feature_merged += 1;
            return Ok(FeatureOutcome::Merged);
        }
        ctx.feature_map
            .insert(ctx.feature_tags.clone(), features.len());
    }

    features.push(Feature {
        id,
        source_id: ctx.source_id,
        tags: ctx.feature_tags.clone(),
        geometries: vec![geometry],
    });
    Ok(FeatureOutcome::Emitted)
}

/// Fills `feature_tags` with the valid, filter-approved pairs from `tag_buf`
/// in canonical order by key priority. A key repeated within one feature
/// keeps its last value.
fn collect_tags(ctx: &mut ParseContext<'_>, filter: &dyn PropertyFilter) {
    ctx.feature_tags.clear();

    if ctx.tag_buf.len() % 2 != 0 {
        ctx.stats.tags_dropped += 1;
    }

    for pair in ctx.tag_buf.chunks_exact(2) {
        let (key_id, value_id) = (pair[0], pair[1]);

        let Some(key) = ctx.keys.get(key_id as usize) else {
            ctx.stats.tags_dropped += 1;
            continue;
        };
        match ctx.values.get(value_id as usize) {
            None | Some(Value::Null) => {
                ctx.stats.tags_dropped += 1;
                continue;
            }
            Some(_) => {}
        }

        if !filter.should_keep(key) {
            continue;
        }
        // one value per key, the last pair wins
        match ctx.feature_tags.iter_mut().find(|(k, _)| *k == key_id) {
            Some(slot) => slot.1 = value_id,
            None => ctx.feature_tags.push((key_id, value_id)),
        }
    }

    let key_rank = &ctx.key_rank;
    ctx.feature_tags
        .sort_unstable_by_key(|&(key_id, value_id)| (key_rank[key_id as usize], value_id));
}
