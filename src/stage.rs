use serde::{Deserialize, Serialize};

/// integer stage position of one acquired pixel, as reported by the instrument
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub fn new(x: i32, y: i32) -> Coord { Coord { x, y } }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Coord { Coord { x, y } }
}

/// a coordinate as read back from the coordinate stream, still tagged with its record index
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IndexedCoord {
    pub index: usize,
    pub coord: Coord,
}
