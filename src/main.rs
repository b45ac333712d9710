use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use solid_attenuator::data::loader::{load_snapshot, load_table};
use solid_attenuator::{DesiredTransmission, Report, Settings, SystemConfigurator};

#[derive(Parser)]
#[command(name = "solid-attenuator")]
#[command(version)]
#[command(about = "Pick the attenuator filters that best match a desired transmission")]
struct Cli {
    /// Absorption table (.parquet, .json or .csv)
    #[arg(short, long)]
    table: PathBuf,

    /// System snapshot (.json) describing every axis and filter
    #[arg(short, long)]
    system: PathBuf,

    /// Optional settings file (.json)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Desired transmission in [0, 1]
    #[arg(short = 'T', long)]
    transmission: f64,

    /// Photon energy [eV]
    #[arg(short, long)]
    energy: f64,

    /// Print the result as JSON instead of a text summary
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let table = load_table(&cli.table)?;
    let snapshot = load_snapshot(&cli.system)?;
    let request = DesiredTransmission::new(cli.transmission, cli.energy)?;

    let configurator = SystemConfigurator::new(settings);
    let outcome = configurator
        .configure(&snapshot.axes, &table, request)
        .context("calculating filter configuration")?;

    let third_harmonic = match configurator.third_harmonic(
        &snapshot.axes,
        &table,
        &outcome.configuration,
        request.energy_ev,
    ) {
        Ok(t3) => Some(t3),
        Err(err) => {
            log::warn!("3omega transmission unavailable: {err}");
            None
        }
    };

    let report = Report::new(&snapshot, &outcome, &table, third_harmonic)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
