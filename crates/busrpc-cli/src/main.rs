//! busrpc CLI - Local runner and configuration checker
//!
//! Commands:
//! - `busrpc serve` - Run server loops in-process and answer calls read from stdin
//! - `busrpc call` - Issue a single call against an in-process server
//! - `busrpc check` - Validate a busrpc.toml configuration

use clap::{Parser, Subcommand};

mod line;
mod serve;
mod session;
mod settings;

use settings::Overrides;

#[derive(Parser)]
#[command(name = "busrpc")]
#[command(author, version, about = "Request/response RPC over a message bus", long_about = None)]
struct Cli {
    /// Path to busrpc.toml (default: ./busrpc.toml when present)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log level override (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run server loops and answer `METHOD /path {json}` lines from stdin
    Serve {
        /// Number of competing server loop instances
        #[arg(short, long)]
        instances: Option<usize>,
    },

    /// Issue one call and print the response body
    Call {
        /// Request method (GET, POST, PUT, DELETE)
        method: String,

        /// Request path
        path: String,

        /// Parameters as a JSON object
        params: Option<String>,

        /// Caller deadline in milliseconds
        #[arg(short, long)]
        timeout_ms: Option<u64>,
    },

    /// Validate a busrpc.toml configuration
    Check {
        /// Print the effective configuration
        #[arg(short, long)]
        print: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut overrides = Overrides {
        log_level: cli.log_level,
        ..Overrides::default()
    };

    match cli.command {
        Commands::Serve { instances } => {
            overrides.instances = instances;
            let config = settings::load(cli.config.as_deref(), &overrides)?;
            serve::run(config)?;
        }
        Commands::Call {
            method,
            path,
            params,
            timeout_ms,
        } => {
            overrides.call_timeout_ms = timeout_ms;
            let config = settings::load(cli.config.as_deref(), &overrides)?;
            let text = match params {
                Some(params) => format!("{method} {path} {params}"),
                None => format!("{method} {path}"),
            };
            let call: line::CallLine = text.parse()?;
            session::call_once(config, call)?;
        }
        Commands::Check { print } => {
            settings::check(cli.config.as_deref(), &overrides, print)?;
        }
    }

    Ok(())
}
