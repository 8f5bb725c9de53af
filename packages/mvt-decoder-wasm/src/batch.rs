#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;
use std::sync::Arc;

use crate::error::DecodeError;
use crate::models::TileData;
use crate::vectortile::TileDecoder;

/// One raw tile waiting to be decoded.
#[derive(Debug, Clone, Copy)]
pub struct TileJob<'a> {
    pub source_id: i32,
    pub data: &'a [u8],
}

impl TileDecoder {
    /// Decodes independent tiles in parallel. Results keep the order of
    /// `jobs`; a failed tile does not affect the others.
    pub fn decode_batch(&self, jobs: &[TileJob<'_>]) -> Vec<Result<Arc<TileData>, DecodeError>> {
        #[cfg(not(target_arch = "wasm32"))]
        {
            jobs.par_iter()
                .map(|job| self.decode(job.data, job.source_id))
                .collect()
        }

        // No worker threads in the browser build
        #[cfg(target_arch = "wasm32")]
        {
            jobs.iter()
                .map(|job| self.decode(job.data, job.source_id))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::KeyFilter;
    use crate::test_support::{encode_tile, feature, layer, point, string_value, GeomType};

    fn tile_with_points(name: &str, count: i32) -> Vec<u8> {
        let features = (0..count)
            .map(|i| feature(GeomType::Point, &[0, 0, 1, 0], point(i, i)))
            .collect();
        encode_tile(vec![layer(
            name,
            &["kind", "name"],
            vec![string_value("tree")],
            features,
        )])
    }

    #[test]
    fn batch_results_follow_job_order() {
        let tiles: Vec<Vec<u8>> = (0..16).map(|i| tile_with_points(&format!("l{}", i), i + 1)).collect();
        let mut jobs: Vec<TileJob> = tiles
            .iter()
            .enumerate()
            .map(|(i, data)| TileJob {
                source_id: i as i32,
                data,
            })
            .collect();
        let broken = [0x1a, 0x7f];
        jobs.push(TileJob {
            source_id: 99,
            data: &broken,
        });

        let decoder = TileDecoder::new(Arc::new(KeyFilter::new().drop_keys(["name"])));
        let results = decoder.decode_batch(&jobs);

        assert_eq!(results.len(), 17);
        for (i, result) in results.iter().take(16).enumerate() {
            let tile = result.as_ref().unwrap();
            assert_eq!(tile.source_id, i as i32);
            assert_eq!(tile.layers[0].name, format!("l{}", i));
            assert_eq!(tile.layers[0].stats.feature_sum, i + 1);
        }
        assert!(matches!(results[16], Err(DecodeError::Malformed(_))));
    }
}
