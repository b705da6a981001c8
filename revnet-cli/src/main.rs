use clap::{Parser, Subcommand};
use revnet::{LogConfig, LogFormat, init_tracing};
use std::process::ExitCode;

mod commands;
mod error;

use commands::{Backend, StartOptions};

#[derive(Parser, Debug)]
#[command(name = "revnet", version)]
#[command(about = "Revnet agent - bootstrap, listeners and remote commands")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the agent
    Start {
        #[arg(long, value_enum, default_value_t = Backend::Firebase)]
        backend: Backend,
        /// Exit once startup completes instead of waiting for Ctrl-C
        #[arg(long)]
        once: bool,
        /// Remote command to publish before starting (memory backend only)
        #[arg(long)]
        remote_command: Option<String>,
    },
    /// Show which configuration fields are set; fails if a required one is not
    CheckConfig,
    /// Initialize services and run the test write once
    TestWrite {
        #[arg(long, value_enum, default_value_t = Backend::Firebase)]
        backend: Backend,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig {
        format: if cli.json {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        },
        ..Default::default()
    };
    if let Err(e) = init_tracing(&log_config) {
        eprintln!("{}", e);
    }

    let result = match cli.command {
        Commands::Start {
            backend,
            once,
            remote_command,
        } => {
            commands::start(StartOptions {
                backend,
                once,
                remote_command,
            })
            .await
        }
        Commands::CheckConfig => commands::check_config(),
        Commands::TestWrite { backend } => commands::test_write(backend).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
