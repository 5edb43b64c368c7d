//! Text encoding of coordinate and spectrum records.
//!
//! Coordinate lines look like `<index>,<x>,<y>` and spectrum lines look like
//! `<index>|<mz1> <mz2> ...|<int1> <int2> ...`. Line `k` of both streams describes
//! record `k`; nothing else links them.

use itertools::Itertools;

use crate::{
    config::{ConversionConfig, NonFinitePolicy},
    error::{MsiError, Result},
    math::round_to,
    pixel::Spectrum,
    stage::{Coord, IndexedCoord},
};

/// signed values are written verbatim, without padding
pub fn encode_coord_line(index: impl std::fmt::Display, x: i32, y: i32) -> String {
    format!("{index},{x},{y}")
}

/// encodes with the default rounding and non-finite policy at the given precision
pub fn encode_data_line(
    index: usize,
    mz: &[f64],
    intensity: &[f64],
    decimals: usize,
) -> Result<String> {
    let config = ConversionConfig { decimals, ..Default::default() };
    encode_data_line_with(index, mz, intensity, &config)
}

pub fn encode_data_line_with(
    index: usize,
    mz: &[f64],
    intensity: &[f64],
    config: &ConversionConfig,
) -> Result<String> {
    if mz.len() != intensity.len() {
        return Err(MsiError::LengthMismatch { index, mz: mz.len(), intensity: intensity.len() });
    }
    if config.non_finite == NonFinitePolicy::Reject {
        if let Some((_, &value)) = mz.iter().chain(intensity).find_position(|v| !v.is_finite()) {
            return Err(MsiError::Format { index, value });
        }
    }
    let fmt = |v: &f64| format_value(*v, config);
    let (mz, intensity) = (mz.iter().map(fmt).join(" "), intensity.iter().map(fmt).join(" "));
    Ok(format!("{index}|{mz}|{intensity}"))
}

fn format_value(v: f64, config: &ConversionConfig) -> String {
    if !v.is_finite() {
        return format!("{v}"); // NaN, inf, -inf
    }
    let rounded = round_to(v, config.decimals, config.rounding) + 0.0; // no "-0.00"
    format!("{:.*}", config.decimals, rounded)
}

pub fn decode_coord_line(line: &str, line_no: usize) -> Result<IndexedCoord> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() != 3 {
        let reason = format!("expected 3 comma separated fields, got {:?}", line);
        return Err(MsiError::parse(line_no, reason));
    }
    let index = fields[0].trim().parse::<usize>().map_err(|e| MsiError::parse(line_no, e))?;
    let x = fields[1].trim().parse::<i32>().map_err(|e| MsiError::parse(line_no, e))?;
    let y = fields[2].trim().parse::<i32>().map_err(|e| MsiError::parse(line_no, e))?;
    Ok(IndexedCoord { index, coord: Coord::new(x, y) })
}

pub fn decode_data_line(line: &str, line_no: usize) -> Result<Spectrum> {
    let fields: Vec<&str> = line.trim().split('|').collect();
    if fields.len() != 3 {
        return Err(MsiError::parse(line_no, "expected 3 pipe separated segments"));
    }
    let index = fields[0].trim().parse::<usize>().map_err(|e| MsiError::parse(line_no, e))?;
    let parse_segment = |s: &str| -> Result<Vec<f64>> {
        s.split_whitespace()
            .map(|v| v.parse::<f64>().map_err(|e| MsiError::parse(line_no, e)))
            .collect()
    };
    Spectrum::new(index, parse_segment(fields[1])?, parse_segment(fields[2])?)
}
