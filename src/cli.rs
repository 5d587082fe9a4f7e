use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about)]
pub struct Arguments {
    #[arg(short = 'v', long = None, env = "STOPWATCH_VERBOSITY", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Milliseconds between live snapshots while the stopwatch runs.
    #[arg(short, long, env = "STOPWATCH_INTERVAL_MS", default_value_t = 100)]
    pub interval_ms: u64,

    /// Print JSON lines instead of plain text.
    #[arg(short, long, env = "STOPWATCH_JSON")]
    pub json: bool,
}

/// A single line typed on standard input.
#[derive(Debug, Parser)]
#[command(no_binary_name = true)]
pub struct Console {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Start, or resume when stopped.
    Start,
    /// Resume a stopped stopwatch.
    Resume,
    Stop,
    Lap,
    Reset,
    /// Print the finished laps.
    Laps,
    /// Print the phase, totals and laps.
    Status,
    Quit,
}

impl Console {
    pub fn parse_line(line: &str) -> Result<Command, clap::Error> {
        Self::try_parse_from(line.split_whitespace()).map(|console| console.command)
    }
}
