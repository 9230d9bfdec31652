//! `run` command: format a container once

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use std::path::PathBuf;

use super::open_store;
use crate::config::Config;
use crate::formatting::FormattingPipeline;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Container (sheet) id to format
    pub container: String,

    /// Use a local JSON record file instead of the record store API
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Print the updates that would be submitted without submitting them
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn handle_run_command(args: RunArgs, config: &Config) -> Result<()> {
    let store = open_store(args.file.as_deref(), config).await?;
    let pipeline = FormattingPipeline::from_config(store, config);

    if args.dry_run {
        let plan = pipeline.plan(&args.container).await;
        println!(
            "{} records fetched, {} would change ({} duplicate rows)",
            plan.records_fetched.to_string().cyan(),
            plan.updates.len().to_string().cyan(),
            plan.duplicate_rows
        );
        for update in &plan.updates {
            let line = serde_json::to_string(update).context("Failed to serialize update")?;
            println!("{}", line.dimmed());
        }
        return Ok(());
    }

    let report = pipeline.run_formatting(&args.container).await?;
    println!("{} {}", "✓".green(), report);
    Ok(())
}
