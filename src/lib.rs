//! Conversion of mass spectrometry imaging data into index-aligned spectra and coordinate
//! text files, and the dense pixel grid that places every spectrum back into an image.

pub mod bounds;
pub mod config;
pub mod converter;
pub mod dataset;
pub mod encode;
pub mod error;
pub mod image;
pub mod math;
pub mod pixel;
pub mod reader;
pub mod stage;
pub mod writer;

pub use bounds::{BoundsTracker, ImageBounds};
pub use config::{Config, ConversionConfig, IndexingConfig, NonFinitePolicy};
pub use converter::{ConversionSummary, Converter, OutputPaths};
pub use dataset::{Dataset, DatasetRecord, WorkDir};
pub use encode::{decode_coord_line, decode_data_line, encode_coord_line, encode_data_line};
pub use error::{MsiError, Result};
pub use image::SpatialIndex;
pub use math::RoundingMode;
pub use pixel::Spectrum;
pub use reader::{InMemorySource, Record, SpectralSource};
pub use stage::{Coord, IndexedCoord};
