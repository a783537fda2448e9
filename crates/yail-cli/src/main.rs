//! YAIL CLI entry point.

mod config;
mod repl;

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use yail_runtime::Interpreter;

use crate::config::CliConfig;

#[derive(Parser)]
#[command(name = "yail")]
#[command(about = "YAIL runtime CLI")]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Time zone for instants, overriding the config file
    #[arg(long, global = true)]
    time_zone: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a YAIL file and print the result batch
    Run {
        /// Input file (or - for stdin)
        file: String,

        /// Block id the result is reported under
        #[arg(long, default_value = "1")]
        block_id: String,

        /// Fire `Component.Event` after evaluation (repeatable)
        #[arg(long = "fire", value_name = "COMPONENT.EVENT")]
        fire: Vec<String>,
    },

    /// Read blocks from stdin, one per line
    Repl,

    /// Parse and validate a YAIL file without running it
    Check {
        /// Input file (or - for stdin)
        file: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(zone) = cli.time_zone {
        config.runtime.time_zone = zone;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(config.logging.filter.parse()?))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { file, block_id, fire } => {
            let source = read_source(&file)?;
            let mut interp = Interpreter::new(config.runtime)?;
            interp.process_repl_input(&block_id, &source)?;

            for target in &fire {
                let (component, event) = parse_event_target(target)?;
                let Some(id) = interp.component_named(component) else {
                    return Err(format!("no component named {}", component).into());
                };
                if !interp.fire_event(id, event, Vec::new()) {
                    warn!(component, event, "no handler registered");
                }
            }

            println!("{}", interp.channel().fetch(true));
        }

        Commands::Repl => {
            info!("Starting YAIL REPL");
            repl::run(config.runtime).await?;
        }

        Commands::Check { file } => {
            let source = read_source(&file)?;
            let forms = yail_ir::read(&source)?;
            for form in &forms {
                yail_ir::validate(form)?;
            }
            println!("{}: {} forms ok", file, forms.len());
        }
    }

    Ok(())
}

fn read_source(file: &str) -> std::io::Result<String> {
    if file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file)
    }
}

/// Split `Button1.Click` into component and event.
fn parse_event_target(target: &str) -> Result<(&str, &str), String> {
    match target.rsplit_once('.') {
        Some((component, event)) if !component.is_empty() && !event.is_empty() => Ok((component, event)),
        _ => Err(format!("expected COMPONENT.EVENT, got {:?}", target)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_target() {
        assert_eq!(parse_event_target("Button1.Click"), Ok(("Button1", "Click")));
        assert!(parse_event_target("Click").is_err());
        assert!(parse_event_target("Button1.").is_err());
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::parse_from(["yail", "run", "app.yail", "--fire", "Button1.Click", "--time-zone", "UTC"]);
        assert_eq!(cli.time_zone.as_deref(), Some("UTC"));
        match cli.command {
            Commands::Run { file, block_id, fire } => {
                assert_eq!(file, "app.yail");
                assert_eq!(block_id, "1");
                assert_eq!(fire, vec!["Button1.Click".to_string()]);
            }
            _ => panic!("expected run"),
        }
    }
}
