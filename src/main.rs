mod cli;

use clap::Parser;
use std::path::Path;
use tracing::subscriber::set_global_default;
use tracing::{info, warn};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::EnvFilter;

use msi_txt::{reader::InMemorySource, writer, Config, Converter, Dataset, MsiError, WorkDir};

use crate::cli::{Args, Commands, ConvertArgs, IndexArgs};

fn load_config(path: Option<&Path>) -> Result<Config, MsiError> {
    match path {
        Some(path) => Config::from_json_file(path),
        None => Ok(Config::default()),
    }
}

fn main_convert(args: ConvertArgs) -> Result<(), MsiError> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(decimals) = args.decimals {
        config.conversion.decimals = decimals;
    }
    std::fs::create_dir_all(&args.output_dir)?;
    let mut source = InMemorySource::from_json_file(&args.input)?;
    let work_dir = WorkDir::new(&args.output_dir);
    let now = std::time::Instant::now();
    let converter = Converter::new(config.conversion);
    let summary = converter.convert_to_files(&mut source, &work_dir.outputs())?;
    info!("converted {} spectra in {} ms", summary.records, now.elapsed().as_millis());
    Ok(())
}

fn main_index(args: IndexArgs) -> Result<(), MsiError> {
    let config = load_config(args.config.as_deref())?;
    let work_dir = WorkDir::new(&args.work_dir);
    let dataset =
        Dataset::open(work_dir.clone(), args.id, args.name, args.input_path, &config.indexing)?;
    dataset.save_record(&work_dir.record_path())?;
    info!("dataset record written to {:?}", work_dir.record_path());
    if let Some(path) = args.mask_png {
        let (nrows, ncols) = dataset.get_dims();
        writer::save_mask_png(&dataset.get_sample_area_mask(), ncols as u32, nrows as u32, &path)?;
        info!("sample area mask saved to {:?}", path);
    }
    Ok(())
}

fn main() -> Result<(), MsiError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_span_events(FmtSpan::CLOSE));

    set_global_default(subscriber).expect("Setting default subscriber failed");
    let args = Args::parse();

    match args.command {
        Some(Commands::Convert(args)) => main_convert(args)?,
        Some(Commands::Index(args)) => main_index(args)?,
        None => warn!("No command provided"),
    }
    Ok(())
}
