use std::{
    ffi::OsString,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use crate::{
    bounds::{BoundsTracker, ImageBounds},
    config::ConversionConfig,
    error::{MsiError, Result},
    reader::{SourceRecords, SpectralSource},
    writer::{RecordWriter, StreamDigests},
};

const PROGRESS_EVERY: usize = 10_000; // records between progress logs

/// where a file based conversion lands; the bounds file is written last and only on success
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    pub spectra: PathBuf,
    pub coords: PathBuf,
    pub bounds: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionSummary {
    pub records: usize,
    pub bounds: ImageBounds,
    pub digests: StreamDigests,
}

pub struct Converter {
    pub config: ConversionConfig,
}

impl Converter {
    pub fn new(config: ConversionConfig) -> Converter { Converter { config } }

    /// Streams every record of the source once, in order, writing line `k` of both the
    /// spectra and the coordinate stream for record `k` and folding its coordinate into the
    /// image bounds. Any error aborts the whole conversion; what was written so far is garbage.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn convert<S, A, B>(
        &self,
        source: &mut S,
        spectra: A,
        coords: B,
    ) -> Result<ConversionSummary>
    where
        S: SpectralSource,
        A: Write,
        B: Write,
    {
        let records = SourceRecords::new(source)?;
        let total = records.len();
        info!(total, decimals = self.config.decimals, "converting spectra to text");
        let mut writer = RecordWriter::new(spectra, coords, self.config);
        let mut tracker = BoundsTracker::new();
        for record in records {
            let record = record?;
            writer.write_record(&record)?;
            tracker.update(record.coord.x, record.coord.y);
            if writer.lines() % PROGRESS_EVERY == 0 {
                debug!("{} / {} records written", writer.lines(), total);
            }
        }
        let (_, _, digests) = writer.finish()?;
        let bounds = tracker.bounds().ok_or(MsiError::EmptyDataset)?;
        info!(records = digests.lines, bounds = ?bounds, "conversion finished");
        Ok(ConversionSummary { records: digests.lines, bounds, digests })
    }

    /// Converts into `.partial` siblings of the target paths and renames them into place only
    /// once both streams are complete; the bounds summary is persisted after that. On any
    /// failure every output, partial or final, is removed and no bounds file exists.
    pub fn convert_to_files<S: SpectralSource>(
        &self,
        source: &mut S,
        paths: &OutputPaths,
    ) -> Result<ConversionSummary> {
        for stale in [&paths.spectra, &paths.coords, &paths.bounds] {
            if stale.exists() {
                warn!("removing previous output {:?}", stale);
                std::fs::remove_file(stale)?;
            }
        }
        match self.convert_and_persist(source, paths) {
            Ok(summary) => {
                info!(
                    "spectra sha1 {}, coordinates sha1 {}",
                    summary.digests.spectra_sha1, summary.digests.coords_sha1
                );
                Ok(summary)
            }
            Err(e) => {
                warn!("conversion failed, discarding output: {}", e);
                for path in [&paths.spectra, &paths.coords, &paths.bounds] {
                    let _ = std::fs::remove_file(partial_path(path));
                    let _ = std::fs::remove_file(path);
                }
                Err(e)
            }
        }
    }

    fn convert_and_persist<S: SpectralSource>(
        &self,
        source: &mut S,
        paths: &OutputPaths,
    ) -> Result<ConversionSummary> {
        let (spectra_tmp, coords_tmp) = (partial_path(&paths.spectra), partial_path(&paths.coords));
        let spectra = BufWriter::new(File::create(&spectra_tmp)?);
        let coords = BufWriter::new(File::create(&coords_tmp)?);
        let summary = self.convert(source, spectra, coords)?;
        std::fs::rename(&spectra_tmp, &paths.spectra)?;
        std::fs::rename(&coords_tmp, &paths.coords)?;
        let bounds_tmp = partial_path(&paths.bounds);
        std::fs::write(&bounds_tmp, summary.bounds.to_json()?)?;
        std::fs::rename(&bounds_tmp, &paths.bounds)?;
        Ok(summary)
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        reader::{InMemorySource, SpectrumArrays},
        stage::Coord,
    };
    use tempfile::TempDir;

    fn source(coords: &[(i32, i32)]) -> InMemorySource {
        let spectra = coords
            .iter()
            .map(|_| SpectrumArrays { mz: vec![100.0, 200.0], intensity: vec![100.0, 10.0] })
            .collect();
        InMemorySource::new(coords.iter().copied().map(Coord::from).collect(), spectra)
    }

    #[test]
    fn test_convert_two_pixels() {
        let converter = Converter::new(ConversionConfig { decimals: 1, ..Default::default() });
        let (mut spectra, mut coords) = (Vec::<u8>::new(), Vec::<u8>::new());
        let summary = converter
            .convert(&mut source(&[(1, 1), (1, 2)]), &mut spectra, &mut coords)
            .unwrap();
        assert_eq!(
            String::from_utf8(spectra).unwrap(),
            "0|100.0 200.0|100.0 10.0\n1|100.0 200.0|100.0 10.0\n"
        );
        assert_eq!(String::from_utf8(coords).unwrap(), "0,1,1\n1,1,2\n");
        assert_eq!(summary.records, 2);
        assert_eq!(summary.bounds, ImageBounds::point(1, 1).include(1, 2));
    }

    #[test]
    fn test_count_mismatch_writes_nothing() {
        let mut src = source(&[(0, 0), (1, 0)]);
        src.spectra.pop();
        let (mut spectra, mut coords) = (Vec::<u8>::new(), Vec::<u8>::new());
        let converter = Converter::new(ConversionConfig::default());
        let err = converter.convert(&mut src, &mut spectra, &mut coords);
        assert!(matches!(err, Err(MsiError::CountMismatch { coordinates: 2, spectra: 1 })));
        assert!(spectra.is_empty() && coords.is_empty());
    }

    #[test]
    fn test_empty_source() {
        let (mut spectra, mut coords) = (Vec::<u8>::new(), Vec::<u8>::new());
        let converter = Converter::new(ConversionConfig::default());
        let err = converter.convert(&mut source(&[]), &mut spectra, &mut coords);
        assert!(matches!(err, Err(MsiError::EmptyDataset)));
    }

    #[test]
    fn test_unwritable_bounds_removes_streams() {
        let temp_dir = TempDir::new().unwrap();
        let paths = OutputPaths {
            spectra: temp_dir.path().join("ds.txt"),
            coords: temp_dir.path().join("ds_coord.txt"),
            bounds: temp_dir.path().join("missing").join("ds_bounds.json"),
        };
        let converter = Converter::new(ConversionConfig::default());
        let result = converter.convert_to_files(&mut source(&[(0, 0), (1, 0)]), &paths);
        assert!(matches!(result, Err(MsiError::Io(_))));
        assert!(!paths.spectra.exists());
        assert!(!paths.coords.exists());
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(partial_path(Path::new("/tmp/ds.txt")), PathBuf::from("/tmp/ds.txt.partial"));
    }
}
