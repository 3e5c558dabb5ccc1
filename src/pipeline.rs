use std::fmt;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};

use crate::catalog::{derive_output_path, Catalog, CatalogEntry, Stage};
use crate::cleanup;
use crate::composite::{
    self, AnimationSettings, ANIMATION_FILE_NAME, MAX_FRAME_DELAY_MS, MERGED_FILE_NAME,
};
use crate::config::{PipelineConfig, StageSpec};
use crate::errors::{EditError, Result};
use crate::imageops::{
    self, add_border, key_background, key_white, parse_color, ResizeFilter, MAX_DIMENSION,
};
use crate::progress::stage_progress;

/// A validated pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Transparent { tolerance: u8, keep_originals: bool },
    Animation(AnimationSettings),
    Merge,
    Resize { width: u32, height: u32, filter: ResizeFilter },
    Border { size: u32, color: Rgba<u8> },
    StripWhite,
    DeleteGenerated,
    DeleteWorkingDir,
}

impl Step {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Transparent { .. } => "transparent",
            Self::Animation(_) => "animation",
            Self::Merge => "merge",
            Self::Resize { .. } => "resize",
            Self::Border { .. } => "border",
            Self::StripWhite => "strip-white",
            Self::DeleteGenerated => "delete-generated",
            Self::DeleteWorkingDir => "delete-working-dir",
        }
    }
}

impl TryFrom<&StageSpec> for Step {
    type Error = EditError;

    fn try_from(spec: &StageSpec) -> Result<Self> {
        let step = match spec {
            StageSpec::Transparent {
                tolerance,
                keep_originals,
            } => Self::Transparent {
                tolerance: u8::try_from(*tolerance).map_err(|_| {
                    EditError::invalid_config(
                        "tolerance",
                        format!("must be within 0..=255 (got {})", tolerance),
                    )
                })?,
                keep_originals: *keep_originals,
            },
            StageSpec::Animation {
                frame_delay_ms,
                loop_count,
            } => {
                if *frame_delay_ms > MAX_FRAME_DELAY_MS {
                    return Err(EditError::invalid_config(
                        "gif_frame_delay_ms",
                        format!("must be at most {} (got {})", MAX_FRAME_DELAY_MS, frame_delay_ms),
                    ));
                }
                Self::Animation(AnimationSettings {
                    frame_delay_ms: *frame_delay_ms,
                    loop_count: *loop_count,
                })
            }
            StageSpec::Merge => Self::Merge,
            StageSpec::Resize {
                width,
                height,
                filter,
            } => Self::Resize {
                width: positive_dimension("resize_width", *width)?,
                height: positive_dimension("resize_height", *height)?,
                filter: *filter,
            },
            StageSpec::Border { size, color } => Self::Border {
                size: border_size(*size)?,
                color: parse_color(color)
                    .map_err(|e| EditError::invalid_config("border_color", e.to_string()))?,
            },
            StageSpec::StripWhite => Self::StripWhite,
            StageSpec::DeleteGenerated => Self::DeleteGenerated,
            StageSpec::DeleteWorkingDir => Self::DeleteWorkingDir,
        };
        Ok(step)
    }
}

fn positive_dimension(field: &str, value: Option<u32>) -> Result<u32> {
    match value {
        None => Err(EditError::invalid_config(field, "is required")),
        Some(0) => Err(EditError::invalid_config(field, "must be greater than zero")),
        Some(v) if v > MAX_DIMENSION => Err(EditError::invalid_config(
            field,
            format!("must be at most {} (got {})", MAX_DIMENSION, v),
        )),
        Some(v) => Ok(v),
    }
}

fn border_size(size: u32) -> Result<u32> {
    let limit = MAX_DIMENSION / 2;
    if size >= limit {
        return Err(EditError::invalid_config(
            "border_size",
            format!("must be below {} (got {})", limit, size),
        ));
    }
    Ok(size)
}

#[derive(Debug)]
pub enum StageOutcome {
    Completed { processed: usize, failed: usize },
    /// Nothing matched the stage's input.
    Skipped,
    Failed(EditError),
}

#[derive(Debug)]
pub struct StageReport {
    pub stage: &'static str,
    pub outcome: StageOutcome,
}

impl StageReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, StageOutcome::Failed(_))
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            StageOutcome::Completed { processed, failed } => write!(
                f,
                "{}: {} processed, {} failed",
                self.stage, processed, failed
            ),
            StageOutcome::Skipped => write!(f, "{}: skipped, no input files", self.stage),
            StageOutcome::Failed(e) => write!(f, "{}: failed: {}", self.stage, e),
        }
    }
}

/// Runs validated steps in order against a catalog.
///
/// Per-file errors are logged and counted; they never stop the batch. Errors
/// that break a whole stage (composite encoding, cleanup) end up in that
/// stage's report and the next stage still runs.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<Step>,
    show_progress: bool,
}

impl Pipeline {
    pub const fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            show_progress: false,
        }
    }

    /// Validate every enabled entry. Nothing runs if any entry is invalid.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let steps = config
            .stages
            .iter()
            .filter(|entry| entry.enabled)
            .map(|entry| Step::try_from(&entry.spec))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(steps))
    }

    pub const fn with_progress(mut self, visible: bool) -> Self {
        self.show_progress = visible;
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn run(&self, catalog: &mut Catalog) -> Vec<StageReport> {
        self.steps
            .iter()
            .map(|step| {
                log::info!("Running stage {}", step.name());
                let report = StageReport {
                    stage: step.name(),
                    outcome: self.run_step(step, catalog),
                };
                if report.is_failure() {
                    log::error!("{}", report);
                } else {
                    log::info!("{}", report);
                }
                report
            })
            .collect()
    }

    fn run_step(&self, step: &Step, catalog: &mut Catalog) -> StageOutcome {
        match *step {
            Step::Transparent {
                tolerance,
                keep_originals,
            } => self.convert_backgrounds(catalog, tolerance, keep_originals),
            Step::Animation(settings) => build_animation(catalog, &settings),
            Step::Merge => build_merge(catalog),
            Step::Resize {
                width,
                height,
                filter,
            } => self.resize_images(catalog, width, height, filter),
            Step::Border { size, color } => {
                let targets = catalog.processed();
                self.for_each_file(step.name(), targets, catalog, |entry, _| {
                    rewrite(&entry.path, |image| {
                        add_border(&image, size, color).ok_or_else(|| EditError::Border {
                            path: entry.path.clone(),
                            reason: format!(
                                "a {}px border on {}x{} exceeds the {}px limit",
                                size,
                                image.width(),
                                image.height(),
                                MAX_DIMENSION
                            ),
                        })
                    })
                })
            }
            Step::StripWhite => {
                let targets = catalog.processed();
                self.for_each_file(step.name(), targets, catalog, |entry, _| {
                    rewrite(&entry.path, |mut image| {
                        key_white(&mut image);
                        Ok(image)
                    })
                })
            }
            Step::DeleteGenerated => match cleanup::delete_generated(catalog) {
                Ok(removed) if removed.is_empty() => StageOutcome::Skipped,
                Ok(removed) => StageOutcome::Completed {
                    processed: removed.len(),
                    failed: 0,
                },
                Err(e) => StageOutcome::Failed(e),
            },
            Step::DeleteWorkingDir => {
                let cataloged = catalog.len();
                match cleanup::delete_directory(catalog) {
                    Ok(()) => StageOutcome::Completed {
                        processed: cataloged,
                        failed: 0,
                    },
                    Err(e) => StageOutcome::Failed(e),
                }
            }
        }
    }

    fn convert_backgrounds(
        &self,
        catalog: &mut Catalog,
        tolerance: u8,
        keep_originals: bool,
    ) -> StageOutcome {
        let originals = catalog.with_stage(Stage::Original);
        let mut converted = Vec::new();

        let outcome = self.for_each_file("transparent", originals, catalog, |entry, catalog| {
            let output = derive_output_path(&entry.path, Stage::Transparent);
            let mut image = imageops::open_rgba(&entry.path)?;
            key_background(&mut image, tolerance);
            imageops::save_png(&image, &output)?;

            log::info!(
                "Converted {} to {}",
                entry.file_name(),
                output.file_name().unwrap_or_default().to_string_lossy()
            );
            catalog.insert(CatalogEntry::new(output, Stage::Transparent));
            converted.push(entry.path.clone());
            Ok(())
        });

        if keep_originals {
            return outcome;
        }
        match (outcome, remove_originals(&converted, catalog)) {
            (StageOutcome::Completed { processed, failed }, undeleted) if undeleted > 0 => {
                StageOutcome::Completed {
                    processed: processed - undeleted,
                    failed: failed + undeleted,
                }
            }
            (outcome, _) => outcome,
        }
    }

    /// Resize transparent images in place; without any, resize the originals
    /// into new `_resized` files.
    fn resize_images(
        &self,
        catalog: &mut Catalog,
        width: u32,
        height: u32,
        filter: ResizeFilter,
    ) -> StageOutcome {
        let transparent = catalog.with_stage(Stage::Transparent);
        let (targets, in_place) = if transparent.is_empty() {
            (catalog.with_stage(Stage::Original), false)
        } else {
            (transparent, true)
        };

        self.for_each_file("resize", targets, catalog, |entry, catalog| {
            let image = imageops::open_rgba(&entry.path)?;
            let resized = imageops::resize(&image, width, height, filter).map_err(|reason| {
                EditError::Resize {
                    path: entry.path.clone(),
                    reason,
                }
            })?;

            if in_place {
                imageops::save_png(&resized, &entry.path)
            } else {
                let output = derive_output_path(&entry.path, Stage::Resized);
                imageops::save_png(&resized, &output)?;
                catalog.insert(CatalogEntry::new(output, Stage::Resized));
                Ok(())
            }
        })
    }

    fn for_each_file<F>(
        &self,
        stage: &'static str,
        entries: Vec<CatalogEntry>,
        catalog: &mut Catalog,
        mut work: F,
    ) -> StageOutcome
    where
        F: FnMut(&CatalogEntry, &mut Catalog) -> Result<()>,
    {
        if entries.is_empty() {
            return StageOutcome::Skipped;
        }

        let progress_bar = stage_progress(entries.len(), self.show_progress, stage);
        let mut failed = 0;
        for entry in &entries {
            if let Err(e) = work(entry, catalog) {
                progress_bar.suspend(|| log::warn!("{}: {}", stage, e));
                failed += 1;
            }
            progress_bar.inc(1);
        }
        progress_bar.finish_and_clear();

        StageOutcome::Completed {
            processed: entries.len() - failed,
            failed,
        }
    }
}

fn build_animation(catalog: &Catalog, settings: &AnimationSettings) -> StageOutcome {
    let entries = catalog.processed();
    let images = composite::load_frames(&entries);
    let Some(frames) = composite::build_animation(&images, settings) else {
        return StageOutcome::Skipped;
    };

    let path = catalog.root().join(ANIMATION_FILE_NAME);
    match composite::write_animation(frames, settings, &path) {
        Ok(()) => {
            log::info!("Created {} from {} frame(s)", path.display(), images.len());
            StageOutcome::Completed {
                processed: images.len(),
                failed: entries.len() - images.len(),
            }
        }
        Err(e) => StageOutcome::Failed(e),
    }
}

fn build_merge(catalog: &Catalog) -> StageOutcome {
    let entries = catalog.processed();
    let images = composite::load_frames(&entries);
    let Some(merged) = composite::build_merge(&images) else {
        return StageOutcome::Skipped;
    };

    let path = catalog.root().join(MERGED_FILE_NAME);
    match imageops::save_png(&merged, &path) {
        Ok(()) => {
            log::info!(
                "Created {} ({}x{})",
                path.display(),
                merged.width(),
                merged.height()
            );
            StageOutcome::Completed {
                processed: images.len(),
                failed: entries.len() - images.len(),
            }
        }
        Err(e) => StageOutcome::Failed(e),
    }
}

/// Load, transform and overwrite a single image.
fn rewrite<F>(path: &Path, transform: F) -> Result<()>
where
    F: FnOnce(RgbaImage) -> Result<RgbaImage>,
{
    let image = imageops::open_rgba(path)?;
    imageops::save_png(&transform(image)?, path)
}

/// Delete converted originals, returning how many could not be removed.
fn remove_originals(paths: &[PathBuf], catalog: &mut Catalog) -> usize {
    let mut undeleted = 0;
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => {
                catalog.remove(path);
                log::info!("Deleted original {}", path.display());
            }
            Err(e) => {
                log::warn!(
                    "transparent: {}",
                    EditError::file_system(path, "delete original", e)
                );
                undeleted += 1;
            }
        }
    }
    undeleted
}
