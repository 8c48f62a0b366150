use crate::error::{ExportError, Result};
use crate::pipeline::AtlasExport;

use log::info;
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

const MIN_NAME_LENGTH: usize = 4;

static SPECIAL_CHARACTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[!@#£$%&*()+=|<>?{}\[\]~.,\s]").expect("valid pattern"));

/// Checks that `name` can be used as a folder and file prefix on disk and in
/// a URL.
pub fn validate_name(name: &str) -> Result<&str> {
    if name.chars().count() < MIN_NAME_LENGTH || SPECIAL_CHARACTERS.is_match(name) {
        return Err(ExportError::InvalidName(name.to_string()));
    }
    Ok(name)
}

/// Writes an export as `<output_dir>/<name>/<name>_zNNNN.png` plus a JSON
/// manifest next to them.
pub struct AtlasWriter {
    output_dir: PathBuf,
}

impl AtlasWriter {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Saves every atlas and the manifest, returning the folder written to.
    pub fn write(&self, export: &AtlasExport) -> Result<PathBuf> {
        let name = validate_name(&export.manifest.name)?;
        let folder = self.output_dir.join(name);
        fs::create_dir_all(&folder)?;

        for (index, image) in export.atlases.images.iter().enumerate() {
            let path = folder.join(export.manifest.atlas_file_name(index));
            image.save(&path)?;
        }

        let manifest_path = folder.join(MANIFEST_FILE_NAME);
        fs::write(&manifest_path, serde_json::to_string_pretty(&export.manifest)?)?;
        info!(
            "Saved {} atlases and {}",
            export.atlases.len(),
            manifest_path.display()
        );

        Ok(folder)
    }
}
