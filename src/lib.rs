pub mod catalog;
pub mod cleanup;
pub mod composite;
pub mod config;
pub mod errors;
pub mod imageops;
pub mod pipeline;

mod progress;

pub use catalog::{Catalog, CatalogEntry, Stage};
pub use config::{Config, PipelineConfig, StageEntry, StageSpec};
pub use errors::{EditError, Result};
pub use pipeline::{Pipeline, StageOutcome, StageReport, Step};
