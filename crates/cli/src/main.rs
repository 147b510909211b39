//! derbyctl - derby timer host tools
//!
//! Runs the race controller against a simulated track, plays a seeded demo
//! heat, and checks configuration files.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod completion;
mod config;
mod demo;
mod error;
mod host;
mod output;
mod run;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "derbyctl")]
#[command(about = "Derby timer host tools - run the race controller, play a demo heat, check configs")]
#[command(version)]
#[command(long_about = "
derbyctl hosts the derby race controller on a desktop.

`run` speaks the serial command protocol on stdin/stdout against a simulated
track; `demo` plays one seeded heat on a virtual clock; `check-config`
validates a YAML configuration file.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serial protocol on stdin/stdout; `!ready`, `!reopen`, `!lane N` drive the track
    Run {
        /// YAML configuration file
        #[arg(short, long, env = "DERBYCTL_CONFIG")]
        config: Option<PathBuf>,
        /// Lane count, overriding the file
        #[arg(short, long)]
        lanes: Option<u8>,
        /// Control loop interval in microseconds
        #[arg(long, default_value_t = 500)]
        poll_us: u64,
    },

    /// Play one heat with seeded random finish times
    Demo {
        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Lane count, overriding the file
        #[arg(short, long)]
        lanes: Option<u8>,
        /// RNG seed
        #[arg(short, long, default_value_t = 1)]
        seed: u64,
        /// Also print the lane display boards
        #[arg(short, long)]
        displays: bool,
    },

    /// Validate a YAML configuration file and print it as JSON
    CheckConfig {
        /// YAML configuration file
        file: PathBuf,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // stdout carries the serial protocol, so logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("derbyctl={log_level},derby_controller={log_level}").into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = execute_command(&cli) {
        if cli.json {
            output::print_error_json(&e);
        } else {
            output::print_error_human(&e);
        }

        let exit_code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        std::process::exit(exit_code);
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Run {
            config,
            lanes,
            poll_us,
        } => {
            let config = config::load(config.as_deref(), *lanes)?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("building runtime")?;
            runtime.block_on(run::execute(config, Duration::from_micros((*poll_us).max(1))))
        }
        Commands::Demo {
            config,
            lanes,
            seed,
            displays,
        } => {
            let config = config::load(config.as_deref(), *lanes)?;
            let heat = demo::execute(config, *seed)?;
            output::print_heat(&heat, cli.json, *displays);
            Ok(())
        }
        Commands::CheckConfig { file } => {
            let config = config::read(file)?;
            let json = serde_json::to_string_pretty(&config).map_err(CliError::from)?;
            println!("{json}");
            Ok(())
        }
        Commands::Completion { shell } => {
            completion::generate_completion(*shell);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_run_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["derbyctl", "run"])?;
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
        assert!(matches!(
            cli.command,
            Commands::Run {
                config: None,
                lanes: None,
                poll_us: 500,
            }
        ));
        Ok(())
    }

    #[test]
    fn parse_verbose_levels() -> TestResult {
        let cli = Cli::try_parse_from(["derbyctl", "-vv", "demo"])?;
        assert_eq!(cli.verbose, 2);
        let cli = Cli::try_parse_from(["derbyctl", "demo", "-vvv"])?;
        assert_eq!(cli.verbose, 3);
        Ok(())
    }

    #[test]
    fn parse_demo_options() -> TestResult {
        let cli = Cli::try_parse_from(["derbyctl", "--json", "demo", "--lanes", "4", "--seed", "9", "-d"])?;
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Demo {
                lanes: Some(4),
                seed: 9,
                displays: true,
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn parse_check_config_requires_file() {
        assert!(Cli::try_parse_from(["derbyctl", "check-config"]).is_err());
    }

    #[test]
    fn lanes_must_fit_u8() {
        assert!(Cli::try_parse_from(["derbyctl", "run", "--lanes", "300"]).is_err());
    }
}
