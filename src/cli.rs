use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a spectral source into spectra and coordinate text files.
    Convert(ConvertArgs),
    /// Build the pixel index of a converted dataset and write its record.
    Index(IndexArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ConvertArgs {
    /// The JSON exchange file with coordinates and spectra.
    #[arg(short, long)]
    pub input: PathBuf,

    /// The dataset work directory the text files are written to.
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Optional JSON configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Fractional digits per m/z and intensity value (overrides the config file).
    #[arg(short, long)]
    pub decimals: Option<usize>,
}

#[derive(Parser, Debug, Clone)]
pub struct IndexArgs {
    /// The dataset work directory holding ds_coord.txt and ds_bounds.json.
    #[arg(short, long)]
    pub work_dir: PathBuf,

    /// Dataset id; a random one is generated when missing.
    #[arg(long)]
    pub id: Option<String>,

    /// Dataset name; falls back to the metadata and then to the id.
    #[arg(long)]
    pub name: Option<String>,

    /// Original location of the instrument files, recorded as-is.
    #[arg(long)]
    pub input_path: Option<String>,

    /// Also save the sampled-area mask as a png.
    #[arg(short, long)]
    pub mask_png: Option<PathBuf>,

    /// Optional JSON configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
