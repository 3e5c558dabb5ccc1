use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::composite::MERGED_FILE_NAME;
use crate::errors::{EditError, Result};

/// Processing state of an image, encoded on disk as a file stem suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Original,
    Transparent,
    Resized,
}

impl Stage {
    pub const fn suffix(self) -> Option<&'static str> {
        match self {
            Self::Original => None,
            Self::Transparent => Some("_transparent"),
            Self::Resized => Some("_resized"),
        }
    }

    /// Classify a file by its stem. Only used when reading a directory from disk.
    pub fn from_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        if stem.ends_with("_transparent") {
            Self::Transparent
        } else if stem.ends_with("_resized") {
            Self::Resized
        } else {
            Self::Original
        }
    }

    pub const fn is_processed(self) -> bool {
        matches!(self, Self::Transparent | Self::Resized)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => f.write_str("original"),
            Self::Transparent => f.write_str("transparent"),
            Self::Resized => f.write_str("resized"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub path: PathBuf,
    pub stage: Stage,
}

impl CatalogEntry {
    pub fn new(path: impl Into<PathBuf>, stage: Stage) -> Self {
        Self {
            path: path.into(),
            stage,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// In-memory view of the images in a working directory.
///
/// Entries are kept sorted by path. Stages update the catalog as they write and
/// delete files, so later stages see earlier results without another scan.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: Vec::new(),
        }
    }

    /// List the supported images directly inside `root` (no recursion).
    pub fn scan(root: impl Into<PathBuf>) -> Result<Self> {
        let mut catalog = Self::new(root);

        if !catalog.root.is_dir() {
            return Err(EditError::file_system(
                &catalog.root,
                "directory listing",
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "working directory does not exist",
                ),
            ));
        }

        for entry in WalkDir::new(&catalog.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                let path = e.path().map_or_else(|| catalog.root.clone(), Path::to_path_buf);
                EditError::file_system(path, "directory listing", e.into())
            })?;
            let path = entry.path();
            // `Path::is_file` follows symlinks; dangling links are left out
            if path.is_file() && is_image_input(path) {
                catalog
                    .entries
                    .push(CatalogEntry::new(path, Stage::from_path(path)));
            }
        }

        catalog.entries.sort_by(|a, b| a.path.cmp(&b.path));
        log::debug!(
            "cataloged {} image(s) in {}",
            catalog.entries.len(),
            catalog.root.display()
        );
        Ok(catalog)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn with_stage(&self, stage: Stage) -> Vec<CatalogEntry> {
        self.entries
            .iter()
            .filter(|e| e.stage == stage)
            .cloned()
            .collect()
    }

    /// Transparent and resized images, the inputs of every downstream stage.
    pub fn processed(&self) -> Vec<CatalogEntry> {
        self.entries
            .iter()
            .filter(|e| e.stage.is_processed())
            .cloned()
            .collect()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|e| e.path == path)
    }

    /// Add an entry, or retag it if the path is already cataloged.
    pub fn insert(&mut self, entry: CatalogEntry) {
        match self.entries.binary_search_by(|e| e.path.cmp(&entry.path)) {
            Ok(index) => self.entries[index].stage = entry.stage,
            Err(index) => self.entries.insert(index, entry),
        }
    }

    pub fn remove(&mut self, path: &Path) -> Option<CatalogEntry> {
        let index = self.entries.iter().position(|e| e.path == path)?;
        Some(self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

pub fn is_supported_image_format(path: &Path) -> bool {
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        matches!(
            extension.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp"
        )
    } else {
        false
    }
}

/// Supported image that is not the merged composite.
fn is_image_input(path: &Path) -> bool {
    is_supported_image_format(path)
        && path.file_name().and_then(|n| n.to_str()) != Some(MERGED_FILE_NAME)
}

/// `dir/name.jpg` + `Transparent` -> `dir/name_transparent.png`.
pub fn derive_output_path(path: &Path, stage: Stage) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = format!("{}{}.png", stem, stage.suffix().unwrap_or_default());
    path.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_supported_formats() {
        let test_cases = vec![
            ("test.jpg", true),
            ("test.JPEG", true),
            ("test.png", true),
            ("test.WebP", true),
            ("test.gif", false),
            ("test.txt", false),
            ("test", false),
        ];

        for (filename, expected) in test_cases {
            assert_eq!(
                is_supported_image_format(Path::new(filename)),
                expected,
                "{}",
                filename
            );
        }
    }

    #[test]
    fn test_stage_from_path() {
        assert_eq!(Stage::from_path(Path::new("a.jpg")), Stage::Original);
        assert_eq!(
            Stage::from_path(Path::new("a_transparent.png")),
            Stage::Transparent
        );
        assert_eq!(Stage::from_path(Path::new("a_resized.png")), Stage::Resized);
        assert_eq!(
            Stage::from_path(Path::new("transparent_a.png")),
            Stage::Original
        );
    }

    #[test]
    fn test_derive_output_path() {
        assert_eq!(
            derive_output_path(Path::new("dir/cat.JPG"), Stage::Transparent),
            Path::new("dir/cat_transparent.png")
        );
        assert_eq!(
            derive_output_path(Path::new("dir/my.photo.webp"), Stage::Resized),
            Path::new("dir/my.photo_resized.png")
        );
        assert_eq!(
            derive_output_path(Path::new("dog.png"), Stage::Original),
            Path::new("dog.png")
        );
    }

    #[test]
    fn test_scan_classifies_and_sorts() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        for name in [
            "b.jpg",
            "a_transparent.png",
            "c_resized.png",
            "notes.txt",
            "output.gif",
            "merged_image.png",
        ] {
            fs::write(root.join(name), b"")?;
        }
        fs::create_dir(root.join("nested.png"))?;
        fs::write(root.join("nested.png").join("inner.png"), b"")?;

        let catalog = Catalog::scan(root)?;

        let names: Vec<_> = catalog.entries().iter().map(|e| e.file_name()).collect();
        assert_eq!(names, ["a_transparent.png", "b.jpg", "c_resized.png"]);
        assert_eq!(catalog.with_stage(Stage::Original).len(), 1);
        assert_eq!(catalog.processed().len(), 2);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_includes_symlinked_images() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let elsewhere = TempDir::new()?;
        let target = elsewhere.path().join("real.png");
        fs::write(&target, b"")?;
        std::os::unix::fs::symlink(&target, temp_dir.path().join("linked.png"))?;
        std::os::unix::fs::symlink(
            elsewhere.path().join("gone.png"),
            temp_dir.path().join("dangling.png"),
        )?;

        let catalog = Catalog::scan(temp_dir.path())?;

        let names: Vec<_> = catalog.entries().iter().map(|e| e.file_name()).collect();
        assert_eq!(names, ["linked.png"]);
        Ok(())
    }

    #[test]
    fn test_scan_missing_directory() {
        let err = Catalog::scan("/definitely/not/here").unwrap_err();
        assert!(matches!(err, EditError::FileSystem { .. }));
    }

    #[test]
    fn test_insert_retags_and_keeps_order() {
        let mut catalog = Catalog::new("dir");
        catalog.insert(CatalogEntry::new("dir/b.png", Stage::Original));
        catalog.insert(CatalogEntry::new("dir/a.png", Stage::Original));
        catalog.insert(CatalogEntry::new("dir/b.png", Stage::Resized));

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()[0].path, Path::new("dir/a.png"));
        assert_eq!(catalog.entries()[1].stage, Stage::Resized);

        assert!(catalog.remove(Path::new("dir/a.png")).is_some());
        assert!(catalog.remove(Path::new("dir/a.png")).is_none());
        assert!(!catalog.contains(Path::new("dir/a.png")));
    }
}
