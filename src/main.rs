mod cli;

use crate::cli::{Arguments, Command, Console};
use clap::Parser;
use serde::Serialize;
use std::time::Duration;
use stopwatch::{Phase, Snapshot, Stopwatch, Subscription};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Runtime;
use tracing_log::LogTracer;

fn main() {
    let arguments = cli::Arguments::parse();
    if let Err(e) = set_log_level(&arguments) {
        eprintln!("Failed to configure logging: {e}");
        return;
    }

    tracing::debug!(?arguments, "starting stopwatch console");

    if let Err(e) = run(arguments) {
        tracing::error!(%e, "Unable to run the stopwatch");
    }
}

fn set_log_level(arguments: &Arguments) -> anyhow::Result<()> {
    LogTracer::init()?;

    let level = match arguments.verbosity {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    // Standard output carries the snapshots, so logs go to standard error.
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

/// Standard input is read on the blocking pool, so only the time driver is needed.
fn runtime() -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()
}

fn run(arguments: Arguments) -> anyhow::Result<()> {
    let runtime = runtime()?;

    runtime.block_on(async {
        let stopwatch = Stopwatch::new();
        let subscription = stopwatch.poll_every(Duration::from_millis(arguments.interval_ms));
        let printer = tokio::spawn(print_loop(subscription, arguments.json));

        let result = read_loop(&stopwatch, arguments.json).await;

        // Dropping the stopwatch finishes the subscription and with it the printer.
        drop(stopwatch);
        printer.await??;

        result
    })
}

async fn print_loop(mut subscription: Subscription, json: bool) -> anyhow::Result<()> {
    while let Some(snapshot) = subscription.next().await {
        println!("{}", render_snapshot(&snapshot, json)?);
    }

    tracing::debug!("Subscription finished");

    Ok(())
}

async fn read_loop(stopwatch: &Stopwatch, json: bool) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match Console::parse_line(&line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        tracing::trace!(?command, "Read a command");

        match command {
            Command::Start => stopwatch.start(),
            Command::Resume => stopwatch.resume(),
            Command::Stop => stopwatch.stop(),
            Command::Lap => stopwatch.lap(),
            Command::Reset => stopwatch.reset(),
            Command::Laps => println!("{}", render_laps(&stopwatch.laps(), json)?),
            Command::Status => println!("{}", render_status(&Status::of(stopwatch), json)?),
            Command::Quit => break,
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct Status {
    phase: Phase,
    #[serde(flatten)]
    snapshot: Snapshot,
    laps: Vec<f64>,
}

impl Status {
    fn of(stopwatch: &Stopwatch) -> Self {
        Self {
            phase: stopwatch.phase(),
            snapshot: stopwatch.snapshot(),
            laps: stopwatch.laps(),
        }
    }
}

fn seconds(value: f64) -> String {
    format!("{value:.3}")
}

fn render_snapshot(snapshot: &Snapshot, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string(snapshot)?);
    }

    Ok(format!(
        "{} (lap {})",
        seconds(snapshot.total_elapsed),
        seconds(snapshot.current_lap_elapsed)
    ))
}

fn render_laps(laps: &[f64], json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string(laps)?);
    }

    Ok(laps
        .iter()
        .enumerate()
        .map(|(index, lap)| format!("lap {}: {}", index + 1, seconds(*lap)))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn render_status(status: &Status, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string(status)?);
    }

    let mut lines = vec![
        format!("phase: {}", status.phase),
        format!("total: {}", seconds(status.snapshot.total_elapsed)),
        format!("current lap: {}", seconds(status.snapshot.current_lap_elapsed)),
    ];
    if !status.laps.is_empty() {
        lines.push(render_laps(&status.laps, false)?);
    }

    Ok(lines.join("\n"))
}
