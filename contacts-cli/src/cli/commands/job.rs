//! `job` command: format a container under job lifecycle reporting

use anyhow::Result;
use clap::Args;
use colored::*;
use std::path::PathBuf;

use super::open_store;
use crate::api::{HttpJobReporter, JobReporter, LogJobReporter, run_job};
use crate::config::Config;
use crate::formatting::FormattingPipeline;

#[derive(Args, Debug)]
pub struct JobArgs {
    /// Job id to acknowledge and report on
    pub job_id: String,

    /// Container (sheet) id to format
    pub container: String,

    /// Use a local JSON record file; job transitions are only logged
    #[arg(long)]
    pub file: Option<PathBuf>,
}

pub async fn handle_job_command(args: JobArgs, config: &Config) -> Result<()> {
    let store = open_store(args.file.as_deref(), config).await?;
    let pipeline = FormattingPipeline::from_config(store, config);

    let reporter: Box<dyn JobReporter> = if args.file.is_some() {
        Box::new(LogJobReporter)
    } else {
        Box::new(HttpJobReporter::new(&config.store)?)
    };

    match run_job(reporter.as_ref(), &pipeline, &args.job_id, &args.container).await {
        Ok(report) => {
            println!("{} Job {}: {}", "✓".green(), args.job_id, report);
            Ok(())
        }
        Err(err) => {
            eprintln!("{} Job {} failed", "✗".red(), args.job_id);
            Err(err)
        }
    }
}
