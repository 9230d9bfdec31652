//! Command-line interface
//!
//! The CLI is the invoking layer around the formatting pipeline: it picks a
//! record store, runs the pipeline once (optionally as a reported job), and
//! manages local record files for offline use.

pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use commands::job::JobArgs;
use commands::records::{ImportArgs, ShowArgs};
use commands::run::RunArgs;

#[derive(Parser, Debug)]
#[command(name = "contacts-cli", version, about = "Normalize and deduplicate imported contact records")]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Format every record in a container once
    Run(RunArgs),
    /// Format a container as a job: acknowledge, run, then complete or fail
    Job(JobArgs),
    /// Import a CSV of contacts into a local record file
    Import(ImportArgs),
    /// Print the records in a local record file
    Show(ShowArgs),
}

pub async fn dispatch(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Run(args) => commands::run::handle_run_command(args, &config).await,
        Commands::Job(args) => commands::job::handle_job_command(args, &config).await,
        Commands::Import(args) => commands::records::handle_import_command(args).await,
        Commands::Show(args) => commands::records::handle_show_command(args).await,
    }
}
