use crate::error::{MsiError, Result};

/// one spectrum per acquired pixel; m/z and intensity arrays always have the same length
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrum {
    index: usize,
    mz: Vec<f64>,
    intensity: Vec<f64>,
}

impl Spectrum {
    pub fn new(index: usize, mz: Vec<f64>, intensity: Vec<f64>) -> Result<Spectrum> {
        if mz.len() != intensity.len() {
            let (mz, intensity) = (mz.len(), intensity.len());
            return Err(MsiError::LengthMismatch { index, mz, intensity });
        }
        Ok(Spectrum { index, mz, intensity })
    }

    pub fn index(&self) -> usize { self.index }

    pub fn mz(&self) -> &[f64] { &self.mz }

    pub fn intensity(&self) -> &[f64] { &self.intensity }

    pub fn len(&self) -> usize { self.mz.len() }

    pub fn is_empty(&self) -> bool { self.mz.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spectrum_rejects_unequal_arrays() {
        let err = Spectrum::new(7, vec![100.0, 200.0], vec![1.0]).unwrap_err();
        assert!(matches!(err, MsiError::LengthMismatch { index: 7, mz: 2, intensity: 1 }));
    }

    #[test]
    fn test_empty_spectrum_is_legal() {
        let spectrum = Spectrum::new(0, vec![], vec![]).unwrap();
        assert!(spectrum.is_empty());
    }
}
