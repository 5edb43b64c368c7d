use thiserror::Error;

/// every failure is fatal to the dataset as a whole; callers delete the outputs and start over
#[derive(Error, Debug)]
pub enum MsiError {
    #[error("coordinate count ({coordinates}) does not match spectrum count ({spectra})")]
    CountMismatch { coordinates: usize, spectra: usize },

    /// `at` is the record index while converting, the 0-based line number when reading text back
    #[error("record or line {at} could not be parsed: {reason}")]
    Parse { at: usize, reason: String },

    #[error("record {index} holds a non-finite value ({value})")]
    Format { index: usize, value: f64 },

    #[error("record {index}: {mz} m/z values but {intensity} intensities")]
    LengthMismatch { index: usize, mz: usize, intensity: usize },

    #[error("data integrity error: {0}")]
    Integrity(String),

    #[error("dataset has no coordinates, bounds are undefined")]
    EmptyDataset,

    #[error("a {nrows} x {ncols} grid does not fit 32-bit pixel indices")]
    GridOverflow { nrows: usize, ncols: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),
}

impl MsiError {
    pub fn parse(at: usize, reason: impl std::fmt::Display) -> Self {
        MsiError::Parse { at, reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, MsiError>;
