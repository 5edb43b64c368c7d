use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use simple_uuid::v4;
use std::{
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::{
    bounds::ImageBounds,
    config::IndexingConfig,
    converter::OutputPaths,
    encode::{decode_coord_line, decode_data_line},
    error::{MsiError, Result},
    image::SpatialIndex,
    pixel::Spectrum,
    stage::{Coord, IndexedCoord},
};

/// File layout of one dataset's working directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkDir {
    pub root: PathBuf,
}

impl WorkDir {
    pub fn new(root: impl Into<PathBuf>) -> WorkDir { WorkDir { root: root.into() } }

    pub fn txt_path(&self) -> PathBuf { self.root.join("ds.txt") }

    pub fn coord_path(&self) -> PathBuf { self.root.join("ds_coord.txt") }

    pub fn bounds_path(&self) -> PathBuf { self.root.join("ds_bounds.json") }

    pub fn ds_config_path(&self) -> PathBuf { self.root.join("config.json") }

    pub fn ds_metadata_path(&self) -> PathBuf { self.root.join("meta.json") }

    pub fn record_path(&self) -> PathBuf { self.root.join("ds_record.json") }

    pub fn outputs(&self) -> OutputPaths {
        OutputPaths {
            spectra: self.txt_path(),
            coords: self.coord_path(),
            bounds: self.bounds_path(),
        }
    }
}

/// reads `index,x,y` lines; blank lines are ignored, anything else malformed is fatal
pub fn read_coordinates(path: &Path) -> Result<Vec<IndexedCoord>> {
    let reader = BufReader::new(std::fs::File::open(path)?);
    let mut coords = vec![];
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        coords.push(decode_coord_line(&line, line_no)?);
    }
    debug!("read {} coordinates from {:?}", coords.len(), path);
    Ok(coords)
}

/// decodes the spectra stream in parallel; the result keeps file order and line `k` must
/// describe record `k`
pub fn read_spectra(path: &Path) -> Result<Vec<Spectrum>> {
    let text = std::fs::read_to_string(path)?;
    let lines: Vec<(usize, &str)> =
        text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()).collect();
    let spectra: Vec<Spectrum> = lines
        .par_iter()
        .map(|&(line_no, line)| decode_data_line(line, line_no))
        .collect::<Result<_>>()?;
    if let Some((k, s)) = spectra.iter().enumerate().find(|(k, s)| s.index() != *k) {
        return Err(MsiError::Integrity(format!("line {} holds spectrum {}", k, s.index())));
    }
    Ok(spectra)
}

pub fn read_bounds(path: &Path) -> Result<ImageBounds> {
    ImageBounds::from_json(&std::fs::read_to_string(path)?)
}

/// a missing optional json file reads as an empty object
pub fn read_json(path: &Path) -> Result<Value> {
    if !path.exists() {
        debug!("{:?} not found, using an empty object", path);
        return Ok(Value::Object(Default::default()));
    }
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

/// explicit name, else the name given in the submission metadata, else the dataset id
pub fn resolve_name(name: Option<String>, metadata: &Value, id: &str) -> String {
    name.or_else(|| {
        metadata
            .pointer("/metaspace_options/Dataset_Name")
            .and_then(Value::as_str)
            .map(str::to_owned)
    })
    .unwrap_or_else(|| id.to_owned())
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDims {
    pub nrows: usize,
    pub ncols: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateColumns {
    pub xs: Vec<i32>,
    pub ys: Vec<i32>,
}

/// what the dataset and coordinates tables receive for one dataset
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: String,
    pub name: String,
    pub input_path: String,
    pub metadata: Value,
    pub config: Value,
    pub img_bounds: ImageBounds,
    pub dims: GridDims,
    pub coordinates: CoordinateColumns,
}

/// A mass spectrometry imaging dataset backed by its spectra and coordinate text files.
pub struct Dataset {
    pub id: String,
    pub name: String,
    pub input_path: String,
    pub work_dir: WorkDir,
    pub metadata: Value,
    pub ds_config: Value,
    coords: Vec<Coord>,
    index: SpatialIndex,
}

impl Dataset {
    /// Reads config and metadata from the work dir and defines the pixel order from the
    /// coordinate stream. Without an id a random one is generated.
    pub fn open(
        work_dir: WorkDir,
        id: Option<String>,
        name: Option<String>,
        input_path: Option<String>,
        config: &IndexingConfig,
    ) -> Result<Dataset> {
        let id = id.unwrap_or_else(|| v4!().to_string());
        let metadata = read_json(&work_dir.ds_metadata_path())?;
        let ds_config = read_json(&work_dir.ds_config_path())?;
        let name = resolve_name(name, &metadata, &id);
        let input_path = input_path.unwrap_or_else(|| work_dir.root.display().to_string());
        let (coords, index) = Dataset::define_pixels_order(&work_dir, config)?;
        info!("dataset {} ({}): {} pixels on a {:?} grid", id, name, index.len(), index.get_dims());
        Ok(Dataset { id, name, input_path, work_dir, metadata, ds_config, coords, index })
    }

    fn define_pixels_order(
        work_dir: &WorkDir,
        config: &IndexingConfig,
    ) -> Result<(Vec<Coord>, SpatialIndex)> {
        let records = read_coordinates(&work_dir.coord_path())?;
        let persisted = match config.verify_bounds {
            true => Some(read_bounds(&work_dir.bounds_path())?),
            false => {
                warn!("bounds check disabled, {:?} is not compared", work_dir.bounds_path());
                None
            }
        };
        let index = SpatialIndex::from_records(&records, persisted.as_ref(), config)?;
        let mut coords = vec![Coord::default(); records.len()];
        // indices were checked by the index build
        records.iter().for_each(|r| coords[r.index] = r.coord);
        Ok((coords, index))
    }

    pub fn coordinates(&self) -> &[Coord] { &self.coords }

    pub fn spatial_index(&self) -> &SpatialIndex { &self.index }

    pub fn get_dims(&self) -> (usize, usize) { self.index.get_dims() }

    pub fn get_norm_img_pixel_inds(&self) -> &[u32] { self.index.get_norm_img_pixel_inds() }

    pub fn get_sample_area_mask(&self) -> Vec<bool> { self.index.get_sample_area_mask() }

    pub fn get_spectra(&self) -> Result<Vec<Spectrum>> {
        info!("converting txt to spectra from {:?}", self.work_dir.txt_path());
        let spectra = read_spectra(&self.work_dir.txt_path())?;
        if spectra.len() != self.coords.len() {
            return Err(MsiError::CountMismatch {
                coordinates: self.coords.len(),
                spectra: spectra.len(),
            });
        }
        Ok(spectra)
    }

    pub fn to_record(&self) -> DatasetRecord {
        let (nrows, ncols) = self.get_dims();
        DatasetRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            input_path: self.input_path.clone(),
            metadata: self.metadata.clone(),
            config: self.ds_config.clone(),
            img_bounds: *self.index.bounds(),
            dims: GridDims { nrows, ncols },
            coordinates: CoordinateColumns {
                xs: self.coords.iter().map(|c| c.x).collect(),
                ys: self.coords.iter().map(|c| c.y).collect(),
            },
        }
    }

    pub fn save_record(&self, path: &Path) -> Result<()> {
        let file = std::io::BufWriter::new(std::fs::File::create(path)?);
        serde_json::to_writer_pretty(file, &self.to_record())?;
        Ok(())
    }
}
