use std::{fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use log::error;
use volume_atlas::{
    AtlasWriter, ExportConfig, SortBy, VolumeLoader, VoxelSize, export, validate_name,
};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Packs a directory of z-slices into WebGL volume viewer atlases"
)]
struct Cli {
    /// Directory holding one png/tif file per z-slice
    input: PathBuf,

    /// Folder the atlases are written into (under a subfolder named after the export)
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// JSON export configuration; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Unique name of the export, defaults to the input directory name
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    time: Option<usize>,

    #[arg(long)]
    scale_x: Option<f64>,

    #[arg(long)]
    scale_y: Option<f64>,

    #[arg(long)]
    scale_z: Option<f64>,

    /// Voxel size before scaling, in microns
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
    voxel_size: Option<Vec<f64>>,

    /// Answer yes to slow z-scaling and Z/T swap prompts
    #[arg(short, long)]
    yes: bool,
}

fn run(cli: Cli) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let voxel_size = match cli.voxel_size.as_deref() {
        Some(&[x, y, z]) => Some(VoxelSize { x, y, z }),
        _ => None,
    };
    let sequence = VolumeLoader::load_from_directory(
        &cli.input,
        SortBy::FileName,
        voxel_size.unwrap_or_default(),
    )?;

    let mut config = match &cli.config {
        Some(path) => serde_json::from_str::<ExportConfig>(&fs::read_to_string(path)?)?,
        None => ExportConfig::for_sequence(&sequence),
    };
    if let Some(voxel_size) = voxel_size {
        config.voxel_size = voxel_size;
    }
    if let Some(name) = cli.name {
        config.name = name;
    }
    if let Some(time) = cli.time {
        config.time_index = time;
    }
    if let Some(x) = cli.scale_x {
        config.scale.x = x;
    }
    if let Some(y) = cli.scale_y {
        config.scale.y = y;
    }
    if let Some(z) = cli.scale_z {
        config.scale.z = z;
    }
    validate_name(&config.name)?;

    let atlases = export(sequence, config, &cli.yes)?;
    Ok(AtlasWriter::new(&cli.out).write(&atlases)?)
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Cli::parse()) {
        Ok(folder) => {
            println!("Data saved locally to {}", folder.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
