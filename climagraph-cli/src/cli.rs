use anyhow::{Context, anyhow, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use climagraph_core::{
    Config, Coordinates, FetchStatus, FileStore, ProviderId, ReportId, ReportManager,
    ReportSheet, ReportStore, SavedReport, WeatherQuery, WeatherSource,
};
use inquire::{Confirm, Password, PasswordDisplayMode};
use std::{fs, path::PathBuf};
use tracing::debug;

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "climagraph", version, about = "Weather reports with saved history")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather".
        provider: String,
    },

    /// Show weather for a city or a pair of coordinates.
    Show {
        /// City or place name.
        city: Option<String>,

        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Save the report to history.
        #[arg(long)]
        save: bool,
    },

    /// List saved reports, newest first.
    History,

    /// Fetch fresh weather for a saved report's location.
    Refresh {
        id: ReportId,
    },

    /// Delete a saved report.
    Delete {
        id: ReportId,

        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Write a saved report as a JSON document.
    Export {
        id: ReportId,

        /// Output path; defaults to a dated file name in the current directory.
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider)?,
            Command::Show {
                city,
                lat,
                lon,
                save,
            } => {
                let manager = open_manager()?;
                let query = WeatherQuery {
                    name: city,
                    coordinates: lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon)),
                };

                let status = manager.fetch(query).await;
                show_current(&manager, status)?;

                if save {
                    let report = manager.save()?;
                    println!("\nSaved as report {}", report.id);
                }
            }
            Command::History => {
                let manager = open_manager()?;
                output::print_history(&manager.history());
            }
            Command::Refresh { id } => {
                let manager = open_manager()?;
                let report = find_report(&manager, id)?;
                let status = manager.refresh(&report).await;
                show_current(&manager, status)?;
            }
            Command::Delete { id, yes } => {
                let manager = open_manager()?;
                let report = find_report(&manager, id)?;

                if !yes {
                    let confirmed = Confirm::new(&format!(
                        "Delete report {} for {}?",
                        report.id, report.snapshot.location.name
                    ))
                    .with_default(false)
                    .prompt()?;
                    if !confirmed {
                        println!("Nothing deleted.");
                        return Ok(());
                    }
                }

                if manager.delete_report(id)? {
                    println!("Report {id} deleted.");
                }
            }
            Command::Export { id, out } => {
                let manager = open_manager()?;
                let report = find_report(&manager, id)?;
                let sheet = ReportSheet::from_report(&report, &Local);

                let path = out
                    .unwrap_or_else(|| PathBuf::from(sheet.file_name(Local::now().date_naive())));
                fs::write(&path, sheet.to_json_pretty()?)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Exported report {id} to {}", path.display());
            }
        }

        Ok(())
    }
}

fn open_manager() -> anyhow::Result<ReportManager> {
    let config = Config::load()?;
    let source = WeatherSource::from_config(&config)?;
    if !source.is_live() {
        eprintln!(
            "No weather provider configured; showing synthetic data.\n\
             Hint: run `climagraph configure openweather` to use live weather."
        );
    }

    let data_dir = config.data_dir()?;
    debug!(
        data_dir = %data_dir.display(),
        provider = source.provider_name(),
        "opening report history"
    );

    let store = ReportStore::open(FileStore::new(data_dir));
    Ok(ReportManager::new(source, store))
}

fn find_report(manager: &ReportManager, id: ReportId) -> anyhow::Result<SavedReport> {
    manager.report(id).ok_or_else(|| {
        anyhow!("No saved report with id {id}. Run `climagraph history` to list them.")
    })
}

fn show_current(manager: &ReportManager, status: FetchStatus) -> anyhow::Result<()> {
    match status {
        FetchStatus::Failed => {
            bail!(manager.last_error().unwrap_or_else(|| "Failed to fetch weather data".into()))
        }
        FetchStatus::Degraded => {
            if let Some(warning) = manager.last_error() {
                eprintln!("warning: {warning}");
            }
        }
        FetchStatus::Applied | FetchStatus::Discarded => {}
    }

    let snapshot = manager
        .current_snapshot()
        .ok_or_else(|| anyhow!("No weather data available"))?;
    output::print_snapshot(&snapshot);
    Ok(())
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    // Read the file alone so environment overrides are not written back.
    let path = Config::config_file_path()?;
    let mut config = Config::load_from(&path)?;

    let api_key = Password::new(&format!("{id} API key:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    config.upsert_provider_api_key(id, api_key);
    config.save()?;

    println!("Saved {id} credentials to {}", path.display());
    Ok(())
}
