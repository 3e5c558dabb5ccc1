use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::catalog::{is_supported_image_format, Catalog, Stage};
use crate::composite::MERGED_FILE_NAME;
use crate::errors::{EditError, Result};

/// Files produced by the composite builder.
pub fn is_generated_artifact(path: &Path) -> bool {
    let is_gif = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gif"));
    is_gif || path.file_name().and_then(|n| n.to_str()) == Some(MERGED_FILE_NAME)
}

fn is_transparent_image(path: &Path) -> bool {
    is_supported_image_format(path) && Stage::from_path(path) == Stage::Transparent
}

/// Remove composite artifacts first, then every `_transparent` image.
/// Returns the removed paths in deletion order.
pub fn delete_generated(catalog: &mut Catalog) -> Result<Vec<PathBuf>> {
    let files = list_files(catalog.root())?;

    let artifacts = files.iter().filter(|p| is_generated_artifact(p));
    let transparent = files.iter().filter(|p| is_transparent_image(p));

    let mut removed = Vec::new();
    for path in artifacts.chain(transparent) {
        fs::remove_file(path).map_err(|e| EditError::file_system(path, "delete file", e))?;
        catalog.remove(path);
        log::info!("Deleted {}", path.display());
        removed.push(path.clone());
    }
    Ok(removed)
}

/// Recursively delete the working directory. Irreversible.
pub fn delete_directory(catalog: &mut Catalog) -> Result<()> {
    let root = catalog.root().to_path_buf();
    fs::remove_dir_all(&root).map_err(|e| EditError::file_system(&root, "delete directory", e))?;
    catalog.clear();
    log::info!("Deleted working directory {}", root.display());
    Ok(())
}

fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| EditError::file_system(root, "directory listing", e.into()))?;
        // symlinks are removed as links, never followed
        if !entry.file_type().is_dir() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
