//! `revline prod`: one full production run.

use anyhow::Result;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::log;
use crate::pipeline::{Pipeline, RunReport};
use crate::utils::plural_count;

/// Run every stage once. The first failing stage aborts the run.
pub fn run_prod(config: &PipelineConfig) -> Result<RunReport> {
    let mut pipeline = Pipeline::new(config)?;
    let started = Instant::now();

    let report = match pipeline.run() {
        Ok(report) => report,
        Err(PipelineError { stage, source }) => {
            log!("error"; "stage `{}` failed: {:#}", stage, anyhow::Error::from(source));
            anyhow::bail!("production run failed");
        }
    };

    log!(
        "done";
        "{} in {:.2?}",
        plural_count(report.total_written(), "file"),
        started.elapsed()
    );
    Ok(report)
}
