use std::io::Write;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use dashboard_core::{
    Config, Settlements, TICK_INTERVAL, WeatherQueryCoordinator, geolocator_from_config,
    provider_from_config,
};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time::{Instant, interval_at},
};

use tracing::debug;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Terminal weather dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and an optional fixed device position.
    Configure,

    /// Fetch once and print the dashboard.
    Show {
        /// City to search. Without it the configured position is used.
        city: Option<String>,
    },

    /// Live dashboard. Type a city and press enter to search, `:q` to quit.
    Watch,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city } => show(city).await,
            Command::Watch => watch().await,
        }
    }
}

fn coordinator_from_config() -> Result<(WeatherQueryCoordinator, Settlements)> {
    let config = Config::load()?;
    debug!(policy = ?config.race_policy, located = config.location.is_some(), "config loaded");
    let provider = provider_from_config(&config)?;
    let geolocator = geolocator_from_config(&config);

    let (coordinator, settlements) = WeatherQueryCoordinator::new(provider, geolocator);
    Ok((coordinator.with_race_policy(config.race_policy), settlements))
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.api_key = Some(api_key.trim().to_string());

    let fixed = Confirm::new("Use a fixed position for auto-locate?")
        .with_default(config.location.is_some())
        .prompt()?;

    if fixed {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number, e.g. 48.85")
            .prompt()?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number, e.g. 2.35")
            .prompt()?;
        config.set_location(latitude, longitude);
    } else {
        config.location = None;
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(city: Option<String>) -> Result<()> {
    let (mut coordinator, mut settlements) = coordinator_from_config()?;

    match city {
        Some(city) => {
            coordinator.search_by_city(&city);
            coordinator.tick();
        }
        None => coordinator.start(),
    }

    coordinator.settle_all(&mut settlements).await;
    println!("{}", render::dashboard(coordinator.state(), Local::now().date_naive()));
    Ok(())
}

async fn watch() -> Result<()> {
    let (mut coordinator, mut settlements) = coordinator_from_config()?;
    coordinator.start();
    redraw(&coordinator)?;

    let mut clock = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = clock.tick() => coordinator.tick(),
            Some(settlement) = settlements.recv() => coordinator.apply(settlement),
            line = lines.next_line() => {
                match line.context("Failed to read from stdin")? {
                    Some(line) if line.trim() == ":q" => break,
                    Some(line) => {
                        coordinator.set_query(line.trim());
                        coordinator.submit_search();
                    }
                    None => break,
                }
            }
        }
        redraw(&coordinator)?;
    }

    Ok(())
}

fn redraw(coordinator: &WeatherQueryCoordinator) -> Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "\n{}", render::dashboard(coordinator.state(), Local::now().date_naive()))?;
    write!(out, "\nEnter city (:q to quit): ")?;
    out.flush()?;
    Ok(())
}
