use tempfile::TempDir;

use msi_txt::{
    decode_coord_line,
    reader::{InMemorySource, SpectrumArrays},
    writer::save_mask_png,
    BoundsTracker, Config, ConversionConfig, Converter, Coord, Dataset, IndexingConfig, MsiError,
    SpatialIndex, WorkDir,
};

/// a ring of pixels around an empty center, with spectra of varying length
fn ring_source() -> InMemorySource {
    let mut coordinates = vec![];
    for y in -2i32..=2 {
        for x in 10i32..=14 {
            if (x - 12).abs() == 2 || y.abs() == 2 {
                coordinates.push(Coord::new(x, y));
            }
        }
    }
    let spectra = (0..coordinates.len())
        .map(|i| SpectrumArrays {
            mz: (0..i % 4).map(|k| 100.0 + k as f64 * 50.123456).collect(),
            intensity: (0..i % 4).map(|k| 1000.0 / (k + 1) as f64).collect(),
        })
        .collect();
    InMemorySource::new(coordinates, spectra)
}

#[test]
fn test_streams_are_line_aligned() {
    let mut source = ring_source();
    let n = source.coordinates.len();
    let (mut spectra, mut coords) = (Vec::<u8>::new(), Vec::<u8>::new());
    let converter = Converter::new(ConversionConfig { decimals: 3, ..Default::default() });
    let summary = converter.convert(&mut source, &mut spectra, &mut coords).unwrap();
    assert_eq!(summary.records, n);

    let spectra = String::from_utf8(spectra).unwrap();
    let coords = String::from_utf8(coords).unwrap();
    let spectrum_lines: Vec<&str> = spectra.lines().collect();
    let coord_lines: Vec<&str> = coords.lines().collect();
    assert_eq!(spectrum_lines.len(), n);
    assert_eq!(coord_lines.len(), n);
    for k in 0..n {
        assert!(spectrum_lines[k].starts_with(&format!("{}|", k)));
        let parsed = decode_coord_line(coord_lines[k], k).unwrap();
        assert_eq!(parsed.index, k);
        assert_eq!(parsed.coord, source.coordinates[k]);
    }
    assert_eq!(spectrum_lines[3], "3|100.000 150.123 200.247|1000.000 500.000 333.333");
}

#[test]
fn test_indexer_agrees_with_converter() {
    let temp_dir = TempDir::new().unwrap();
    let work_dir = WorkDir::new(temp_dir.path());
    let mut source = ring_source();
    let converter = Converter::new(ConversionConfig::default());
    let summary = converter.convert_to_files(&mut source, &work_dir.outputs()).unwrap();

    let mut tracker = BoundsTracker::new();
    source.coordinates.iter().for_each(|c| tracker.update(c.x, c.y));
    assert_eq!(tracker.bounds(), Some(summary.bounds));

    let config = IndexingConfig::default();
    let id = Some("ring".to_string());
    let dataset = Dataset::open(work_dir.clone(), id, None, None, &config).unwrap();
    assert_eq!(dataset.spatial_index().bounds(), &summary.bounds);
    assert_eq!(dataset.get_dims(), (5, 5));
    let mask = dataset.get_sample_area_mask();
    assert_eq!(mask.len(), 25);
    assert_eq!(mask.iter().filter(|&&m| m).count(), 16);
    assert!(!mask[12]); // the center pixel was never sampled

    let spectra = dataset.get_spectra().unwrap();
    assert_eq!(spectra.len(), 16);
    assert_eq!(spectra[2].mz(), &[100.0, 150.1235]);

    let mask_path = temp_dir.path().join("mask.png");
    save_mask_png(&mask, 5, 5, &mask_path).unwrap();
    assert!(std::fs::metadata(&mask_path).unwrap().len() > 0);

    dataset.save_record(&work_dir.record_path()).unwrap();
    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(work_dir.record_path()).unwrap()).unwrap();
    let bounds = serde_json::json!({"x": {"min": 10, "max": 14}, "y": {"min": -2, "max": 2}});
    assert_eq!(record["img_bounds"], bounds);
    assert_eq!(record["coordinates"]["xs"].as_array().unwrap().len(), 16);
}

#[test]
fn test_count_mismatch_persists_no_bounds() {
    let temp_dir = TempDir::new().unwrap();
    let work_dir = WorkDir::new(temp_dir.path());
    let mut source = ring_source();
    source.spectra.truncate(10);
    let converter = Converter::new(ConversionConfig::default());
    let err = converter.convert_to_files(&mut source, &work_dir.outputs());
    assert!(matches!(err, Err(MsiError::CountMismatch { coordinates: 16, spectra: 10 })));
    assert!(!work_dir.bounds_path().exists());
    assert!(!work_dir.txt_path().exists());
    assert!(!work_dir.coord_path().exists());
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0); // no partial files left
}

#[test]
fn test_failed_conversion_discards_previous_output() {
    let temp_dir = TempDir::new().unwrap();
    let work_dir = WorkDir::new(temp_dir.path());
    let converter = Converter::new(ConversionConfig::default());
    converter.convert_to_files(&mut ring_source(), &work_dir.outputs()).unwrap();
    assert!(work_dir.bounds_path().exists());

    let mut corrupt = ring_source();
    corrupt.spectra[7].intensity.push(1.0);
    let err = converter.convert_to_files(&mut corrupt, &work_dir.outputs());
    assert!(matches!(err, Err(MsiError::LengthMismatch { index: 7, .. })));
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_non_finite_intensity_is_fatal_by_default() {
    let mut source = ring_source();
    source.spectra[5].intensity[0] = f64::NAN;
    let (mut spectra, mut coords) = (Vec::<u8>::new(), Vec::<u8>::new());
    let converter = Converter::new(ConversionConfig::default());
    let err = converter.convert(&mut source, &mut spectra, &mut coords);
    assert!(matches!(err, Err(MsiError::Format { index: 5, .. })));
    // the two streams never drift apart, even in garbage output
    let count = |bytes: Vec<u8>| String::from_utf8(bytes).unwrap().lines().count();
    assert_eq!(count(spectra), count(coords));
}

#[test]
fn test_duplicate_coordinates() {
    let coords = vec![Coord::new(0, 0), Coord::new(1, 1), Coord::new(0, 0), Coord::new(1, 0)];
    let index = SpatialIndex::build(&coords, None, &Config::default().indexing).unwrap();
    assert_eq!(index.get_dims(), (2, 2));
    assert_eq!(index.get_norm_img_pixel_inds(), &[0, 3, 0, 1]);
    let mask = index.get_sample_area_mask();
    assert_eq!(mask.iter().filter(|&&m| m).count(), index.distinct_pixel_count());
    assert_eq!(index.distinct_pixel_count(), 3);
    assert_eq!(index.scatter(&[10, 20, 30, 40]).unwrap(), vec![30, 40, 0, 20]);
}
