use serde::{Deserialize, Serialize};

use crate::{
    error::{MsiError, Result},
    stage::Coord,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisBounds {
    pub min: i32,
    pub max: i32,
}

impl AxisBounds {
    fn point(v: i32) -> AxisBounds { AxisBounds { min: v, max: v } }

    fn merge(self, o: AxisBounds) -> AxisBounds {
        AxisBounds { min: self.min.min(o.min), max: self.max.max(o.max) }
    }

    /// number of grid cells spanned, inclusive on both ends
    pub fn span(&self) -> usize { (self.max as i64 - self.min as i64 + 1) as usize }
}

/// Bounding box of every coordinate of a dataset. Serializes to the nested
/// `{"x": {"min", "max"}, "y": {"min", "max"}}` object the dataset table stores.
///
/// Merging is commutative, associative and idempotent, so the box can be folded
/// sequentially during conversion or reduced in parallel during indexing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBounds {
    pub x: AxisBounds,
    pub y: AxisBounds,
}

impl ImageBounds {
    pub fn point(x: i32, y: i32) -> ImageBounds {
        ImageBounds { x: AxisBounds::point(x), y: AxisBounds::point(y) }
    }

    pub fn include(self, x: i32, y: i32) -> ImageBounds { self.merge(ImageBounds::point(x, y)) }

    pub fn merge(self, o: ImageBounds) -> ImageBounds {
        ImageBounds { x: self.x.merge(o.x), y: self.y.merge(o.y) }
    }

    pub fn from_coords<'a, I: IntoIterator<Item = &'a Coord>>(coords: I) -> Option<ImageBounds> {
        coords.into_iter().map(|c| ImageBounds::point(c.x, c.y)).reduce(ImageBounds::merge)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x.min && x <= self.x.max && y >= self.y.min && y <= self.y.max
    }

    /// (nrows, ncols) of the dense grid covering the box
    pub fn dims(&self) -> (usize, usize) { (self.y.span(), self.x.span()) }

    pub fn to_json(&self) -> Result<String> { Ok(serde_json::to_string(self)?) }

    pub fn from_json(s: &str) -> Result<ImageBounds> { Ok(serde_json::from_str(s)?) }
}

/// incremental wrapper around [`ImageBounds`]: unset until the first update
#[derive(Copy, Clone, Debug, Default)]
pub struct BoundsTracker {
    inner: Option<ImageBounds>,
}

impl BoundsTracker {
    pub fn new() -> BoundsTracker { BoundsTracker { inner: None } }

    pub fn update(&mut self, x: i32, y: i32) {
        self.inner = Some(match self.inner {
            Some(bounds) => bounds.include(x, y),
            None => ImageBounds::point(x, y),
        });
    }

    pub fn bounds(&self) -> Option<ImageBounds> { self.inner }

    pub fn min_x(&self) -> Option<i32> { self.inner.map(|b| b.x.min) }

    pub fn max_x(&self) -> Option<i32> { self.inner.map(|b| b.x.max) }

    pub fn min_y(&self) -> Option<i32> { self.inner.map(|b| b.y.min) }

    pub fn max_y(&self) -> Option<i32> { self.inner.map(|b| b.y.max) }

    pub fn to_json(&self) -> Result<String> { self.inner.ok_or(MsiError::EmptyDataset)?.to_json() }
}
