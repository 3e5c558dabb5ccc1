use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use serde::Deserialize;

use crate::errors::{EditError, Result};
use crate::imageops::ResizeFilter;

pub const DEFAULT_WORKING_DIR: &str = "src";
pub const DEFAULT_TOLERANCE: u32 = 30;
pub const DEFAULT_FRAME_DELAY_MS: u32 = 100;
pub const DEFAULT_BORDER_SIZE: u32 = 10;
pub const DEFAULT_BORDER_COLOR: &str = "black";

/// Batch-edit every image in a directory.
#[derive(Parser, Clone, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Working directory, created if missing [default: src]
    pub dir: Option<PathBuf>,

    /// TOML pipeline file; replaces the stage flags below
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Make each image's background (top-left color) transparent
    #[arg(long)]
    pub convert_background: bool,

    /// Maximum per-channel distance from the background color, 0-255
    #[arg(short, long, default_value_t = DEFAULT_TOLERANCE)]
    pub tolerance: u32,

    /// Keep originals after converting them
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub keep_originals: bool,

    /// Assemble processed images into output.gif
    #[arg(long)]
    pub gif: bool,

    #[arg(long, default_value_t = DEFAULT_FRAME_DELAY_MS)]
    pub gif_delay_ms: u32,

    /// Number of loops, 0 loops forever
    #[arg(long, default_value_t = 0)]
    pub gif_loop_count: u16,

    /// Concatenate processed images into merged_image.png
    #[arg(long)]
    pub merge: bool,

    #[arg(long)]
    pub resize: bool,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    #[arg(long, value_enum, default_value_t = ResizeFilter::Lanczos)]
    pub filter: ResizeFilter,

    #[arg(long)]
    pub border: bool,

    /// Named color or hex (#RGB, #RRGGBB, ...)
    #[arg(long, default_value = DEFAULT_BORDER_COLOR)]
    pub border_color: String,

    #[arg(long, default_value_t = DEFAULT_BORDER_SIZE)]
    pub border_size: u32,

    /// Make near-white pixels of processed images transparent
    #[arg(long)]
    pub strip_white: bool,

    /// Delete output.gif, merged_image.png and *_transparent images
    #[arg(long)]
    pub delete_generated: bool,

    /// Delete the whole working directory at the end
    #[arg(long)]
    pub delete_working_dir: bool,

    /// Hide progress bars
    #[arg(long)]
    pub no_progress: bool,
}

impl Config {
    /// Resolve the pipeline to run: the `--config` file when given, otherwise
    /// the stage flags. A positional directory overrides the file's.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut pipeline = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => self.flag_pipeline(),
        };
        if let Some(dir) = &self.dir {
            pipeline.working_dir = dir.clone();
        }
        Ok(pipeline)
    }

    fn flag_pipeline(&self) -> PipelineConfig {
        let entry = |enabled: bool, spec: StageSpec| StageEntry { enabled, spec };

        PipelineConfig {
            working_dir: default_working_dir(),
            stages: vec![
                entry(
                    self.convert_background,
                    StageSpec::Transparent {
                        tolerance: self.tolerance,
                        keep_originals: self.keep_originals,
                    },
                ),
                entry(
                    self.gif,
                    StageSpec::Animation {
                        frame_delay_ms: self.gif_delay_ms,
                        loop_count: self.gif_loop_count,
                    },
                ),
                entry(self.merge, StageSpec::Merge),
                entry(
                    self.resize,
                    StageSpec::Resize {
                        width: self.width,
                        height: self.height,
                        filter: self.filter,
                    },
                ),
                entry(
                    self.border,
                    StageSpec::Border {
                        size: self.border_size,
                        color: self.border_color.clone(),
                    },
                ),
                entry(self.strip_white, StageSpec::StripWhite),
                entry(self.delete_generated, StageSpec::DeleteGenerated),
                entry(self.delete_working_dir, StageSpec::DeleteWorkingDir),
            ],
        }
    }
}

/// Ordered pipeline description, as read from TOML or built from flags.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    #[serde(default, rename = "stage")]
    pub stages: Vec<StageEntry>,
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| EditError::file_system(path, "read pipeline config", e))?;
        toml::from_str(&text).map_err(|source| EditError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct StageEntry {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,

    #[serde(flatten)]
    pub spec: StageSpec,
}

/// Unvalidated stage parameters. See `pipeline::Step` for the checked form.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageSpec {
    Transparent {
        #[serde(default = "default_tolerance")]
        tolerance: u32,
        #[serde(default = "enabled_by_default")]
        keep_originals: bool,
    },
    #[serde(alias = "gif")]
    Animation {
        #[serde(default = "default_frame_delay_ms")]
        frame_delay_ms: u32,
        #[serde(default)]
        loop_count: u16,
    },
    Merge,
    Resize {
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
        #[serde(default)]
        filter: ResizeFilter,
    },
    Border {
        #[serde(default = "default_border_size")]
        size: u32,
        #[serde(default = "default_border_color")]
        color: String,
    },
    StripWhite,
    DeleteGenerated,
    DeleteWorkingDir,
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(DEFAULT_WORKING_DIR)
}

const fn enabled_by_default() -> bool {
    true
}

const fn default_tolerance() -> u32 {
    DEFAULT_TOLERANCE
}

const fn default_frame_delay_ms() -> u32 {
    DEFAULT_FRAME_DELAY_MS
}

const fn default_border_size() -> u32 {
    DEFAULT_BORDER_SIZE
}

fn default_border_color() -> String {
    DEFAULT_BORDER_COLOR.to_string()
}
