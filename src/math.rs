use serde::{Deserialize, Serialize};

/// how a value is rounded to a fixed number of decimals before being written as text
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// 2.345 -> 2.35, -2.345 -> -2.35 (on the scaled value)
    #[default]
    HalfAwayFromZero,
    /// banker's rounding on the scaled value: 0.125 -> 0.12
    HalfEven,
}

/// scales by 10^decimals, rounds to an integer, scales back; values whose scaled form
/// overflows are returned unchanged since they already carry no fractional digits
#[inline(always)]
pub fn round_to(value: f64, decimals: usize, mode: RoundingMode) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    let rounded = match mode {
        RoundingMode::HalfAwayFromZero => scaled.round(),
        RoundingMode::HalfEven => scaled.round_ties_even(),
    };
    rounded / factor
}
