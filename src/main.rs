//! letta-manage: list, inspect and delete Letta NPC agents.
//!
//! This binary resolves the client configuration (config file, environment,
//! then flags), checks the server is up, and delegates to
//! [`manage::AgentManager`] for the selected command.

mod manage;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use letta_npc::blocking::LettaClient;
use letta_npc::{ClientConfig, ServerVariant};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::manage::AgentManager;

#[derive(Parser)]
#[command(name = "letta-manage", version, about = "Manage Letta agents")]
#[command(after_help = "Examples:
  letta-manage --port 8333 list
  letta-manage --port 8283 list --verbose
  letta-manage get --id agent-123
  letta-manage --server-type docker delete --id agent-123
  letta-manage delete-all --yes")]
struct Cli {
    /// Full server URL (overrides --host/--port)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Server hostname
    #[arg(long, global = true)]
    host: Option<String>,

    /// Server port (8333 = pip, otherwise docker unless --server-type is given)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Server variant: pip or docker (alone, picks that variant's default port)
    #[arg(long, global = true)]
    server_type: Option<ServerVariant>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all agents
    List {
        /// Show memory blocks for each agent
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show details for one agent
    Get {
        /// Agent ID to show
        #[arg(long)]
        id: String,
    },
    /// Delete an agent
    Delete {
        /// Agent ID to delete
        #[arg(long)]
        id: String,
    },
    /// Delete every agent on the server
    DeleteAll {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Check whether the server is up
    Health,
}

// ── Entry point ──────────────────────────────────────────────────────

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("✗ Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = resolve_config(&cli)?;
    let client = LettaClient::new(config).context("create Letta client")?;
    let manager = AgentManager::new(client);

    if !manager.check_server() {
        return Ok(ExitCode::FAILURE);
    }

    let ok = match cli.command {
        Command::Health => true,
        Command::List { verbose } => manager.list_agents(verbose),
        Command::Get { id } => manager.get_agent(&id),
        Command::Delete { id } => manager.delete_agent(&id),
        Command::DeleteAll { yes } => manager.delete_all_agents(yes)?,
    };
    Ok(exit_code(ok))
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

// ── Setup ────────────────────────────────────────────────────────────

/// Install the fmt subscriber; `RUST_LOG` wins over `--debug`.
fn init_tracing(debug: bool) {
    let default = if debug { "warn,letta_npc=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Config file and environment first, then command-line flags on top.
fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let (mut config, source) = ClientConfig::load().context("load client configuration")?;
    debug!(source = %source.label(), "loaded configuration");
    apply_flags(cli, &mut config);
    Ok(config)
}

fn apply_flags(cli: &Cli, config: &mut ClientConfig) {
    match &cli.url {
        Some(url) => {
            config.set_base_url(url);
            if let Some(variant) = cli.server_type {
                config.server_type = variant;
            }
        }
        None => config.override_endpoint(cli.host.as_deref(), cli.port, cli.server_type),
    }
    if let Some(secs) = cli.timeout {
        config.timeout = Duration::from_secs(secs);
    }
}
