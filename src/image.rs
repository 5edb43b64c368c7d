use nohash_hasher::IntMap;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    bounds::ImageBounds,
    config::IndexingConfig,
    error::{MsiError, Result},
    stage::{Coord, IndexedCoord},
};

/// Dense row-major placement of a sparse acquisition: every record gets a linear pixel
/// index `(y - min_y) * ncols + (x - min_x)` inside the bounding box of the whole dataset.
/// The grid may be larger than the number of records since samples need not be rectangular.
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    bounds: ImageBounds,
    nrows: usize,
    ncols: usize,
    pixel_inds: Vec<u32>, // aligned with the record index
    duplicate_pixels: usize,
}

impl SpatialIndex {
    /// places records read back from the coordinate stream by their own index, which must
    /// cover `0..n` exactly once, then indexes them
    pub fn from_records(
        records: &[IndexedCoord],
        expected: Option<&ImageBounds>,
        config: &IndexingConfig,
    ) -> Result<SpatialIndex> {
        let coords = order_records(records)?;
        SpatialIndex::build(&coords, expected, config)
    }

    /// Two passes over the coordinates: a min/max reduction for the bounding box, then an
    /// independent per-record index computation against that box. When `expected` is given
    /// (the bounds the converter persisted) the recomputed box has to match it.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn build(
        coords: &[Coord],
        expected: Option<&ImageBounds>,
        config: &IndexingConfig,
    ) -> Result<SpatialIndex> {
        let bounds = coords
            .par_iter()
            .map(|c| ImageBounds::point(c.x, c.y))
            .reduce_with(ImageBounds::merge)
            .ok_or(MsiError::EmptyDataset)?;
        if let Some(expected) = expected {
            if *expected != bounds {
                return Err(MsiError::Integrity(format!(
                    "recomputed bounds {:?} disagree with persisted bounds {:?}",
                    bounds, expected
                )));
            }
        }
        let (nrows, ncols) = bounds.dims();
        match nrows.checked_mul(ncols) {
            Some(total) if total <= u32::MAX as usize => (),
            _ => return Err(MsiError::GridOverflow { nrows, ncols }),
        }
        let (min_x, min_y) = (bounds.x.min as i64, bounds.y.min as i64);
        let pixel_inds: Vec<u32> = coords
            .par_iter()
            .map(|c| {
                let (col, row) = ((c.x as i64 - min_x) as usize, (c.y as i64 - min_y) as usize);
                (row * ncols + col) as u32
            })
            .collect();

        let duplicate_pixels = count_duplicates(&pixel_inds);
        if duplicate_pixels > 0 {
            let message =
                format!("{} records share a pixel with an earlier record", duplicate_pixels);
            if !config.allow_duplicate_pixels {
                return Err(MsiError::Integrity(message));
            }
            warn!("{}, later records win", message);
        }
        info!(nrows, ncols, records = coords.len(), "spatial index built");
        Ok(SpatialIndex { bounds, nrows, ncols, pixel_inds, duplicate_pixels })
    }

    pub fn bounds(&self) -> &ImageBounds { &self.bounds }

    /// (number of rows, number of columns)
    pub fn get_dims(&self) -> (usize, usize) { (self.nrows, self.ncols) }

    /// one-dimensional array of pixel indices for the dataset's records, taken row-wise
    pub fn get_norm_img_pixel_inds(&self) -> &[u32] { &self.pixel_inds }

    /// bool per grid cell, true where a spectrum was sampled
    pub fn get_sample_area_mask(&self) -> Vec<bool> {
        let mut mask = vec![false; self.nrows * self.ncols];
        self.pixel_inds.iter().for_each(|&p| mask[p as usize] = true);
        mask
    }

    pub fn len(&self) -> usize { self.pixel_inds.len() }

    pub fn is_empty(&self) -> bool { self.pixel_inds.is_empty() }

    pub fn duplicate_pixel_count(&self) -> usize { self.duplicate_pixels }

    pub fn distinct_pixel_count(&self) -> usize { self.pixel_inds.len() - self.duplicate_pixels }

    /// places one value per record onto the dense grid; when records collide on a pixel the
    /// value of the later record is kept
    pub fn scatter<T: Copy + Default>(&self, values: &[T]) -> Result<Vec<T>> {
        if values.len() != self.pixel_inds.len() {
            return Err(MsiError::Integrity(format!(
                "{} values for {} records",
                values.len(),
                self.pixel_inds.len()
            )));
        }
        let mut buffer = vec![T::default(); self.nrows * self.ncols];
        for (&p, &v) in self.pixel_inds.iter().zip(values) {
            buffer[p as usize] = v;
        }
        Ok(buffer)
    }
}

/// records may arrive in any order (e.g. from a sharded read); put them back by index
fn order_records(records: &[IndexedCoord]) -> Result<Vec<Coord>> {
    let n = records.len();
    let mut slots: Vec<Option<Coord>> = vec![None; n];
    for r in records {
        let slot = slots.get_mut(r.index).ok_or_else(|| {
            MsiError::Integrity(format!("record index {} outside 0..{}", r.index, n))
        })?;
        if slot.replace(r.coord).is_some() {
            return Err(MsiError::Integrity(format!("record index {} appears twice", r.index)));
        }
    }
    // every slot is filled: n distinct indices below n
    Ok(slots.into_iter().flatten().collect())
}

fn count_duplicates(pixel_inds: &[u32]) -> usize {
    let mut first_seen: IntMap<u32, usize> = IntMap::default();
    let mut duplicates = 0;
    for (i, &p) in pixel_inds.iter().enumerate() {
        if let Some(&first) = first_seen.get(&p) {
            debug!("records {} and {} share pixel {}", first, i, p);
            duplicates += 1;
        } else {
            first_seen.insert(p, i);
        }
    }
    duplicates
}
