//! `import` and `show` commands for local record files

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use std::io::Read;
use std::path::PathBuf;
use uuid::Uuid;

use crate::api::InMemoryRecordStore;
use crate::api::models::{
    DUPLICATE_STATUS, EMAIL, FIRST_NAME, IS_USA_NUMBER, LAST_NAME, PHONE, Record,
};

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// CSV file with a header row
    pub csv: PathBuf,

    /// Record file to add the rows to (created if missing)
    #[arg(long)]
    pub into: PathBuf,

    /// Container id to add the rows under
    #[arg(long, default_value = "contacts")]
    pub container: String,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Record file to print
    pub file: PathBuf,

    /// Only print this container
    #[arg(long)]
    pub container: Option<String>,
}

/// Map common CSV header spellings onto record field names
fn field_for_header(header: &str) -> String {
    let key: String = header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();

    match key.as_str() {
        "firstname" | "first" | "givenname" => FIRST_NAME.to_string(),
        "lastname" | "last" | "surname" | "familyname" => LAST_NAME.to_string(),
        "email" | "emailaddress" => EMAIL.to_string(),
        "phone" | "phonenumber" | "telephone" | "mobile" => PHONE.to_string(),
        _ => header.trim().to_string(),
    }
}

/// Read contact rows from CSV; empty cells are left out of the record
pub fn read_contacts_csv<R: Read>(input: R) -> Result<Vec<Record>> {
    let mut reader = csv::Reader::from_reader(input);
    let fields: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(field_for_header)
        .collect();

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let row = row.with_context(|| format!("Failed to read CSV line {}", index + 2))?;

        let mut record = Record::new(Uuid::new_v4().to_string());
        for (field, cell) in fields.iter().zip(row.iter()) {
            let cell = cell.trim();
            if !cell.is_empty() {
                record = record.with_field(field.clone(), cell);
            }
        }
        records.push(record);
    }

    Ok(records)
}

pub async fn handle_import_command(args: ImportArgs) -> Result<()> {
    let file = std::fs::File::open(&args.csv)
        .with_context(|| format!("Failed to open CSV file: {}", args.csv.display()))?;
    let records = read_contacts_csv(file)?;

    if records.is_empty() {
        anyhow::bail!("No rows found in {}", args.csv.display());
    }

    let count = records.len();
    let store = InMemoryRecordStore::open(&args.into).await?;
    store.insert(&args.container, records).await?;

    println!(
        "{} Imported {} rows into '{}' ({})",
        "✓".green(),
        count.to_string().cyan(),
        args.container,
        args.into.display()
    );
    Ok(())
}

pub async fn handle_show_command(args: ShowArgs) -> Result<()> {
    if !args.file.exists() {
        anyhow::bail!("Record file does not exist: {}", args.file.display());
    }

    let store = InMemoryRecordStore::open(&args.file).await?;
    let containers = match args.container {
        Some(container) => vec![container],
        None => store.container_ids().await,
    };

    for container in containers {
        let records = store.records(&container).await;
        println!("{} ({} records)", container.bold(), records.len());

        for record in &records {
            let name = format!(
                "{} {}",
                record.read_str(FIRST_NAME).unwrap_or(""),
                record.read_str(LAST_NAME).unwrap_or("")
            );
            let usa = match record.read_bool(IS_USA_NUMBER) {
                Some(true) => "US".green(),
                Some(false) => "intl".normal(),
                None => "-".dimmed(),
            };
            let status = match record.read_str(DUPLICATE_STATUS) {
                Some(status) if status.starts_with("Unique") => status.normal(),
                Some(status) => status.yellow(),
                None => "-".dimmed(),
            };

            println!(
                "  {}  {:<28} {:<20} {:<5} {}",
                record.id.dimmed(),
                name.trim(),
                record
                    .read_field(PHONE)
                    .map(|p| p.as_str().map(str::to_string).unwrap_or_else(|| p.to_string()))
                    .unwrap_or_default(),
                usa,
                status
            );
        }
    }

    Ok(())
}
