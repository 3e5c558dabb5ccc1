use std::fs;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use env_logger::Env;

use imgbatch::{Catalog, Config, Pipeline};

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let pipeline_config = config.pipeline_config()?;
    let pipeline = Pipeline::from_config(&pipeline_config)?.with_progress(!config.no_progress);

    let working_dir = &pipeline_config.working_dir;
    fs::create_dir_all(working_dir).with_context(|| {
        format!(
            "Failed to create working directory: {}",
            working_dir.display()
        )
    })?;

    let mut catalog = Catalog::scan(working_dir)?;
    if catalog.is_empty() {
        log::info!("No images found in {}", working_dir.display());
    }
    if pipeline.steps().is_empty() {
        log::info!("No stages enabled, nothing to do");
        return Ok(());
    }

    let reports = pipeline.run(&mut catalog);
    let failed = reports.iter().filter(|r| r.is_failure()).count();
    ensure!(failed == 0, "{} of {} stage(s) failed", failed, reports.len());

    Ok(())
}
