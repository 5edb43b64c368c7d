use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{
    error::{MsiError, Result},
    pixel::Spectrum,
    stage::Coord,
};

/// The parsing capability a converter is handed: an ordered list of pixel coordinates and
/// random access to the spectrum acquired at each of them. Format specific readers
/// (imzML/ibd and friends) implement this; the converter never sees the binary layout.
pub trait SpectralSource {
    fn coordinates(&self) -> &[Coord];

    /// number of spectra the source can hand out; must equal the coordinate count
    fn spectrum_count(&self) -> usize;

    /// (m/z, intensity) for the i-th pixel; an error here means a corrupt record
    fn get_spectrum(&mut self, index: usize) -> Result<(Vec<f64>, Vec<f64>)>;
}

/// a coordinate and its spectrum, kept together until the serialization boundary
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub index: usize,
    pub coord: Coord,
    pub spectrum: Spectrum,
}

/// Iterator-based structure for walking a source in acquisition order
pub struct SourceRecords<'a, S: SpectralSource> {
    source: &'a mut S,
    position: usize,
    failed: bool, // stop after the first error
}

impl<'a, S: SpectralSource> SourceRecords<'a, S> {
    /// refuses sources whose coordinate and spectrum counts disagree, before anything is read
    pub fn new(source: &'a mut S) -> Result<SourceRecords<'a, S>> {
        let (coordinates, spectra) = (source.coordinates().len(), source.spectrum_count());
        if coordinates != spectra {
            return Err(MsiError::CountMismatch { coordinates, spectra });
        }
        Ok(SourceRecords { source, position: 0, failed: false })
    }

    pub fn len(&self) -> usize { self.source.coordinates().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl<'a, S: SpectralSource> Iterator for SourceRecords<'a, S> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.position >= self.source.coordinates().len() {
            return None;
        }
        let index = self.position;
        self.position += 1;
        let coord = self.source.coordinates()[index];
        let record = match self.source.get_spectrum(index) {
            Ok((mz, intensity)) => Spectrum::new(index, mz, intensity)
                .map(|spectrum| Record { index, coord, spectrum }),
            Err(e @ MsiError::Parse { .. }) => Err(e),
            Err(e) => Err(MsiError::parse(index, e)),
        };
        self.failed = record.is_err();
        Some(record)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectrumArrays {
    pub mz: Vec<f64>,
    pub intensity: Vec<f64>,
}

/// Fully materialized source. Loadable from the JSON exchange file read by the `convert`
/// command: `{"coordinates": [[x, y], ...], "spectra": [{"mz": [...], "intensity": [...]}, ...]}`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InMemorySource {
    pub coordinates: Vec<Coord>,
    pub spectra: Vec<SpectrumArrays>,
}

#[derive(Deserialize)]
struct ExchangeFile {
    coordinates: Vec<(i32, i32)>,
    spectra: Vec<SpectrumArrays>,
}

impl InMemorySource {
    pub fn new(coordinates: Vec<Coord>, spectra: Vec<SpectrumArrays>) -> InMemorySource {
        InMemorySource { coordinates, spectra }
    }

    pub fn from_json_file(path: &Path) -> Result<InMemorySource> {
        let file = std::io::BufReader::new(std::fs::File::open(path)?);
        let exchange: ExchangeFile = serde_json::from_reader(file)?;
        let coordinates = exchange.coordinates.into_iter().map(Coord::from).collect();
        Ok(InMemorySource { coordinates, spectra: exchange.spectra })
    }
}

impl SpectralSource for InMemorySource {
    fn coordinates(&self) -> &[Coord] { &self.coordinates }

    fn spectrum_count(&self) -> usize { self.spectra.len() }

    fn get_spectrum(&mut self, index: usize) -> Result<(Vec<f64>, Vec<f64>)> {
        let arrays =
            self.spectra.get(index).ok_or_else(|| MsiError::parse(index, "spectrum missing"))?;
        Ok((arrays.mz.clone(), arrays.intensity.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn arrays(mz: &[f64], intensity: &[f64]) -> SpectrumArrays {
        SpectrumArrays { mz: mz.to_vec(), intensity: intensity.to_vec() }
    }

    #[test]
    fn test_records_in_order() {
        let mut source = InMemorySource::new(
            vec![Coord::new(1, 1), Coord::new(1, 2)],
            vec![arrays(&[100.0], &[1.0]), arrays(&[200.0, 300.0], &[2.0, 3.0])],
        );
        let records: Vec<Record> =
            SourceRecords::new(&mut source).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].index, 1);
        assert_eq!(records[1].coord, Coord::new(1, 2));
        assert_eq!(records[1].spectrum.mz(), &[200.0, 300.0]);
    }

    #[test]
    fn test_count_mismatch_refused_up_front() {
        let mut source =
            InMemorySource::new(vec![Coord::new(0, 0); 3], vec![SpectrumArrays::default(); 2]);
        let err = SourceRecords::new(&mut source).err().unwrap();
        assert!(matches!(err, MsiError::CountMismatch { coordinates: 3, spectra: 2 }));
    }

    #[test]
    fn test_stops_after_corrupt_record() {
        let mut source = InMemorySource::new(
            vec![Coord::new(0, 0); 3],
            vec![arrays(&[1.0], &[1.0]), arrays(&[1.0, 2.0], &[1.0]), arrays(&[1.0], &[1.0])],
        );
        let results: Vec<Result<Record>> = SourceRecords::new(&mut source).unwrap().collect();
        assert_eq!(results.len(), 2);
        assert!(matches!(results[1], Err(MsiError::LengthMismatch { index: 1, .. })));
    }

    #[test]
    fn test_exchange_json() {
        let mut file = NamedTempFile::new().unwrap();
        let json = r#"{"coordinates": [[3, -4]], "spectra": [{"mz": [1.5], "intensity": [2.0]}]}"#;
        file.write_all(json.as_bytes()).unwrap();
        let source = InMemorySource::from_json_file(file.path()).unwrap();
        assert_eq!(source.coordinates(), &[Coord::new(3, -4)]);
        assert_eq!(source.spectrum_count(), 1);
    }
}
