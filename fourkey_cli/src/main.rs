use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use fourkey_chart::{ChartFormat, ParseOptions};
use fourkey_core::GameplayConfig;
use fourkey_runner::SimulationOptions;

mod inspect;
mod simulate;

#[derive(Debug, Parser)]
#[command(name = "fourkey")]
#[command(about = "4-key chart tools", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Osu,
    Json,
}

impl From<FormatArg> for ChartFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Osu => ChartFormat::OsuText,
            FormatArg::Json => ChartFormat::Json,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Normalize a chart and write it as JSON.
    Parse {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
    /// Print a summary of a chart.
    Inspect {
        input: PathBuf,
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
    /// Play a chart headlessly and print the final stats.
    Simulate {
        input: PathBuf,
        /// JSON array of `{lane, pressed, time_ms}`.
        #[arg(long)]
        inputs: Option<PathBuf>,
        #[arg(long)]
        auto: bool,
        /// Gameplay config JSON.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 16.0)]
        frame_ms: f64,
        /// Also print every judgement.
        #[arg(long)]
        timeline: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Parse { input, output, format } => {
            log::debug!("parse {} (format {:?})", input.display(), format);
            let report = fourkey_runner::load_chart(&input, &parse_options(format))?;
            print_warnings(&report.warnings);

            let json = serde_json::to_string_pretty(&report.beatmap).context("failed to serialize beatmap")?;
            let out_path = output.unwrap_or_else(|| default_output_path(&input));
            log::debug!("writing beatmap to {}", out_path.display());
            fs::write(&out_path, json).with_context(|| format!("failed to write: {}", out_path.display()))?;
        }
        Command::Inspect { input, format } => {
            let report = fourkey_runner::load_chart(&input, &parse_options(format))?;
            print_warnings(&report.warnings);
            inspect::print_summary(&report.beatmap);
        }
        Command::Simulate {
            input,
            inputs,
            auto,
            config,
            frame_ms,
            timeline,
        } => {
            let mut gameplay = match &config {
                Some(path) => GameplayConfig::load(path)
                    .with_context(|| format!("failed to load config: {}", path.display()))?,
                None => GameplayConfig::default(),
            };
            gameplay.auto_play |= auto;

            let key_events = match &inputs {
                Some(path) => fourkey_runner::load_key_events(path)?,
                None => Vec::new(),
            };
            let report = fourkey_runner::load_chart(&input, &ParseOptions::default())?;
            let options = SimulationOptions {
                frame_ms,
                ..SimulationOptions::default()
            };
            log::debug!(
                "simulate {} with {} key events, auto_play {}, {:?}",
                input.display(),
                key_events.len(),
                gameplay.auto_play,
                options
            );
            let result = fourkey_runner::simulate(Arc::new(report.beatmap), gameplay, &key_events, options)?;

            if timeline {
                simulate::print_timeline(&result);
            }
            let json = serde_json::to_string_pretty(&result.stats).context("failed to serialize stats")?;
            println!("{json}");
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).try_init();
}

fn parse_options(format: Option<FormatArg>) -> ParseOptions {
    ParseOptions {
        format: format.map(ChartFormat::from),
        ..ParseOptions::default()
    }
}

fn print_warnings(warnings: &[fourkey_chart::ParseWarning]) {
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
}

fn default_output_path(input: &Path) -> PathBuf {
    let mut out = input.to_path_buf();
    out.set_extension("beatmap.json");
    out
}
