//! Harkaam CLI: the main entry point.
//!
//! Commands:
//! - `run`          : Solve a task with one reasoning architecture
//! - `architectures`: List the available architectures
//! - `config`       : Print the default configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "harkaam",
    about = "Harkaam: reasoning agents from the command line",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an agent on a task
    Run {
        /// Architecture: react, ooda, bdi, lat, raise or rewoo
        architecture: String,

        /// The task to solve
        task: String,

        /// Model reference, e.g. `openai:gpt-4o` or `anthropic:claude-3-5-sonnet-latest`
        #[arg(short, long, env = "HARKAAM_MODEL")]
        model: Option<String>,

        /// Override the iteration bound
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Show the thinking process and log at debug level
        #[arg(short, long)]
        verbose: bool,
    },

    /// List available architectures
    Architectures,

    /// Print the default configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Run { verbose: true, .. });
    let filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            architecture,
            task,
            model,
            max_iterations,
            verbose,
        } => {
            let options = commands::run::RunOptions {
                model,
                max_iterations,
                verbose,
            };
            commands::run::run(&architecture, &task, options).await?
        }
        Commands::Architectures => commands::architectures::run(),
        Commands::Config => commands::config_cmd::run(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "harkaam",
            "run",
            "lat",
            "What is 2 + 2?",
            "--model",
            "anthropic:claude-3-5-sonnet-latest",
            "--max-iterations",
            "3",
            "--verbose",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                architecture,
                task,
                model,
                max_iterations,
                verbose,
            } => {
                assert_eq!(architecture, "lat");
                assert_eq!(task, "What is 2 + 2?");
                assert_eq!(model.as_deref(), Some("anthropic:claude-3-5-sonnet-latest"));
                assert_eq!(max_iterations, Some(3));
                assert!(verbose);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn run_requires_a_task() {
        assert!(Cli::try_parse_from(["harkaam", "run", "react"]).is_err());
    }

    #[test]
    fn parses_listing_commands() {
        assert!(matches!(
            Cli::try_parse_from(["harkaam", "architectures"]).unwrap().command,
            Commands::Architectures
        ));
        assert!(matches!(
            Cli::try_parse_from(["harkaam", "config"]).unwrap().command,
            Commands::Config
        ));
    }
}
