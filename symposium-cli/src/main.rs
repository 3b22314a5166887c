/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
use std::io::{stdout, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyModifiers},
    execute, queue,
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
};
use futures::StreamExt;
use symposium::banter;
use symposium::prelude::*;
use tokio::sync::oneshot;
use tracing::{error, info, subscriber, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

use crate::board::Board;

mod board;

const FAILED_TO_DISABLE_RAW_MODE: &str = "Failed to disable raw mode";
const SHUTDOWN_MESSAGE: &str = "Clearing the table...\n";

const TITLE: &str = "Symposium";

const PADLEFT: u16 = 4;
const PADTOP: u16 = 2;

/// Run a dining philosophers table and watch it live.
#[derive(Parser, Debug)]
#[command(name = "symposium", version, about, long_about = None)]
struct Cli {
    /// Configuration file. Defaults to `$XDG_CONFIG_HOME/symposium/config.toml`.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Number of philosophers (and chopsticks).
    #[arg(long, short = 'n')]
    philosophers: Option<usize>,

    /// naive_blocking, try_backoff, resource_hierarchy or admission_controlled.
    #[arg(long, short)]
    strategy: Option<AcquisitionStrategy>,

    /// run_until_stopped or stop_after_first_eat_each.
    #[arg(long, short)]
    termination: Option<TerminationPolicy>,

    /// Send each philosopher home after this many meals.
    #[arg(long)]
    max_meals: Option<u64>,

    /// Waiter permits under admission control.
    #[arg(long)]
    capacity: Option<usize>,

    /// Pause between picking up the first and second chopstick, in milliseconds.
    #[arg(long)]
    reach_ms: Option<u64>,

    /// Stop the table after this many seconds.
    #[arg(long, short)]
    duration_secs: Option<u64>,

    /// Skip the live board and only print the final tally.
    #[arg(long, short)]
    quiet: bool,
}

/// Where the configuration came from, reported once logging is up.
#[derive(Debug)]
enum ConfigOrigin {
    Defaults,
    File(PathBuf),
    Fallback { path: PathBuf, error: SymposiumError },
}

impl ConfigOrigin {
    fn report(&self) {
        match self {
            Self::Defaults => info!("No configuration file found, using defaults"),
            Self::File(path) => info!("Loaded configuration from: {}", path.display()),
            Self::Fallback { path, error } => {
                error!("{error}; using defaults instead of {}", path.display());
            }
        }
    }
}

impl Cli {
    /// Loads the configuration and applies command-line overrides.
    ///
    /// An explicit `--config` file must load; a broken XDG file falls back to
    /// the defaults and is reported through [`ConfigOrigin`].
    fn config(&self) -> Result<(SymposiumConfig, ConfigOrigin)> {
        let (mut config, origin) = match &self.config {
            Some(path) => (SymposiumConfig::load_from(path)?, ConfigOrigin::File(path.clone())),
            None => match SymposiumConfig::xdg_path() {
                None => (SymposiumConfig::default(), ConfigOrigin::Defaults),
                Some(path) => match SymposiumConfig::load_from(&path) {
                    Ok(config) => (config, ConfigOrigin::File(path)),
                    Err(error) => (SymposiumConfig::default(), ConfigOrigin::Fallback { path, error }),
                },
            },
        };
        let simulation = &mut config.simulation;
        if let Some(n) = self.philosophers {
            simulation.num_philosophers = n;
        }
        if let Some(strategy) = self.strategy {
            simulation.strategy = strategy;
        }
        if let Some(termination) = self.termination {
            simulation.termination = termination;
        }
        if self.max_meals.is_some() {
            simulation.max_meals = self.max_meals;
        }
        if self.capacity.is_some() {
            config.admission.capacity = self.capacity;
        }
        if let Some(ms) = self.reach_ms {
            config.delays.reach = DelayRange::fixed(ms);
        }
        config.validate()?;
        Ok((config, origin))
    }
}

struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            eprintln!("{FAILED_TO_DISABLE_RAW_MODE}: {e}");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, origin) = cli.config()?;
    let _log_guard = initialize_tracing(&config.tracing);
    info!("** Symposium startup **");
    origin.report();

    let names = banter::roster(config.simulation.num_philosophers);
    let broker = EventBroker::default();
    let observer = FanOut::new()
        .with(Arc::new(broker.clone()))
        .with(Arc::new(TracingObserver::with_names(names.clone())));
    let table = Table::build_with_names(&config, names, Arc::new(observer))?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let mut stdout = stdout();
    let raw_mode = if cli.quiet {
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("CTRL+C received. Sending shutdown signal..."),
                Err(e) => error!("Failed to listen for CTRL+C: {e}"),
            }
            let _ = shutdown_tx.send(());
        });
        None
    } else {
        enable_raw_mode()?;
        let guard = RawModeGuard;
        execute!(stdout, cursor::Hide, Clear(ClearType::All), cursor::MoveTo(PADLEFT, PADTOP))?;
        tokio::spawn(listen_for_keys(shutdown_tx));
        Some(guard)
    };
    let board = (!cli.quiet).then(|| tokio::spawn(Board::new(table.clone()).run(broker.subscribe())));

    table.start()?;

    let run_time = cli.duration_secs.map(Duration::from_secs);
    tokio::select! {
        _ = shutdown_rx => info!("Shutdown signal received."),
        () = table.until_settled() => info!("Every philosopher has left the table."),
        () = elapsed(run_time) => info!("Run time elapsed."),
    }

    let report = table.shutdown().await;
    if let Some(board) = board {
        board.abort();
    }

    if raw_mode.is_some() {
        queue!(stdout, cursor::MoveTo(0, 0))?;
        queue!(stdout, Clear(ClearType::FromCursorDown))?;
        stdout.write_all(SHUTDOWN_MESSAGE.as_bytes())?;
        queue!(stdout, cursor::Show)?;
        stdout.flush()?;
        drop(raw_mode);
    }

    print_tally(&table, &report);
    info!("** Symposium shutdown complete **");
    Ok(())
}

/// Resolves after `limit`, or never.
async fn elapsed(limit: Option<Duration>) {
    match limit {
        Some(limit) => tokio::time::sleep(limit).await,
        None => std::future::pending().await,
    }
}

async fn listen_for_keys(shutdown_tx: oneshot::Sender<()>) {
    let mut reader = event::EventStream::new();
    while let Some(event_result) = reader.next().await {
        match event_result {
            Ok(Event::Key(key_event)) => match key_event.code {
                KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                    info!("CTRL+C pressed. Sending shutdown signal...");
                    let _ = shutdown_tx.send(());
                    break;
                }
                KeyCode::Char('q') | KeyCode::Esc => {
                    info!("'q' pressed. Sending shutdown signal...");
                    let _ = shutdown_tx.send(());
                    break;
                }
                _ => {}
            },
            Err(e) => {
                error!("Error reading event: {:?}", e);
                break;
            }
            _ => {}
        }
    }
}

fn print_tally(table: &Table, report: &ShutdownReport) {
    println!("{} with {} philosophers", table.strategy(), table.len());
    for (philosopher, meals) in table.philosophers().iter().zip(&report.meals) {
        println!("  {:<14} {meals:>6} meals", philosopher.name());
    }
    println!("  {:<14} {:>6} meals", "total", report.total_meals());
    if let Some(waiter) = table.waiter() {
        println!("  waiter peak {} of {}", waiter.peak_admitted(), waiter.capacity());
    }
    if !report.is_clean() {
        println!(
            "  {} philosopher(s) timed out, {} failed",
            report.timed_out.len(),
            report.failed.len()
        );
    }
}

/// Sends logs to `<log_directory>/<log_file>` so they never touch the board.
///
/// `RUST_LOG` overrides the configured level.
fn initialize_tracing(config: &TracingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if let Err(e) = std::fs::create_dir_all(&config.log_directory) {
        eprintln!("Could not create log directory {}: {e}", config.log_directory);
        return None;
    }
    let file_appender = RollingFileAppender::new(Rotation::NEVER, &config.log_directory, &config.log_file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = FmtSubscriber::builder()
        .with_span_events(FmtSpan::NONE)
        .with_max_level(Level::TRACE)
        .compact()
        .with_line_number(false)
        .with_target(true)
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .finish();

    if let Err(e) = subscriber::set_global_default(subscriber) {
        eprintln!("Setting default subscriber failed: {e}");
    }
    Some(guard)
}
