//! Database client launcher.
//!
//! Resolves a named connection from the dbhooks configuration into a native
//! client invocation (`psql`, `mysql`, `sqlite3`) and replaces this process
//! with it.
//!
//! # Security Guarantees
//! - PostgreSQL passwords are written to a 0600 `.pgpass`, not the argv
//! - Passwords are masked in everything this tool prints or logs

use clap::{Args, Parser, Subcommand, ValueEnum};
use dbhooks_core::{
    Client, ClientDescriptor, Config, DbHooksError, Protocol, ResolvedCommand, Result, exec, init_logging,
    password::loader_from_config,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "dbhooks")]
#[command(about = "Launch native database clients from named connection profiles")]
#[command(version)]
#[command(long_about = "
dbhooks - connect to databases by name

Connection profiles live in a TOML file ($DBHOOKS_CONFIG, or
dbhooks/dbhooks.toml under your configuration directory). dbhooks renders the
protocol's client command, supplies the password, and execs the client.

SUPPORTED CLIENTS:
- PostgreSQL (postgres, postgresql, pg): psql, password via ~/.pgpass
- MySQL (mysql): mysql, password as an argument
- SQLite (sqlite): sqlite3

EXAMPLES:
  dbhooks connect sales
  dbhooks show sales --format json
  dbhooks --config ./dbhooks.toml list
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replace this process with the client for a connection
    Connect(ConnectArgs),
    /// Print the command a connection resolves to, with secrets masked
    Show(ShowArgs),
    /// List configured connections
    List,
    /// List supported protocols and their default command templates
    Protocols,
}

#[derive(Args)]
pub struct ConnectArgs {
    /// Connection name
    #[arg(help = "Name of a connection in the configuration file")]
    pub name: String,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Connection name
    #[arg(help = "Name of a connection in the configuration file")]
    pub name: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: ShowFormat,
}

/// Output formats for `show`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShowFormat {
    /// Human-readable command line
    Text,
    /// JSON object with argv and env
    Json,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "DBHOOKS_CONFIG",
        help = "Configuration file (default: <config dir>/dbhooks/dbhooks.toml)"
    )]
    pub config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    pub quiet: bool,
}

/// Serializable view of a resolved command for `show --format json`.
#[derive(Serialize)]
struct ShowOutput<'a> {
    connection: &'a str,
    protocol: String,
    argv: Vec<String>,
    env: BTreeMap<String, String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    if let Command::Protocols = cli.command {
        list_protocols();
        return Ok(());
    }

    let config_path = match cli.global.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)?;

    match &cli.command {
        Command::Connect(args) => connect(&config, &args.name),
        Command::Show(args) => show(&config, &args.name, args.format),
        Command::List => {
            list_connections(&config);
            Ok(())
        }
        Command::Protocols => Ok(()),
    }
}

/// Synthesizes the connection's command and execs it.
fn connect(config: &Config, name: &str) -> Result<()> {
    let command = resolve(config, name)?;
    info!("Connecting to {} with {}", name, command.program());

    match exec::exec(&command)? {}
}

/// Prints the masked command without executing it.
fn show(config: &Config, name: &str, format: ShowFormat) -> Result<()> {
    let command = resolve(config, name)?;
    let protocol = config.connection(name)?.protocol.clone();

    match format {
        ShowFormat::Text => print!("{}", render_text(&command)?),
        ShowFormat::Json => {
            let output = ShowOutput {
                connection: name,
                protocol,
                argv: command.redacted_argv(),
                env: command.redacted_env(),
            };
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| DbHooksError::serialization(e.to_string()))?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn resolve(config: &Config, name: &str) -> Result<ResolvedCommand> {
    let loader = loader_from_config(config);
    Client::new(config, name, loader.as_ref())?.synthesize()
}

/// Masked env assignments followed by the masked command line, shell-quoted
/// so that argument boundaries survive.
fn render_text(command: &ResolvedCommand) -> Result<String> {
    let argv = command.redacted_argv();
    let line = shlex::try_join(argv.iter().map(String::as_str))
        .map_err(|e| DbHooksError::serialization(format!("Cannot quote command line: {}", e)))?;

    let mut out = String::new();
    for (key, value) in command.redacted_env() {
        out.push_str(&format!("{}={}\n", key, value));
    }
    out.push_str(&line);
    out.push('\n');
    Ok(out)
}

/// Lists configured connections without credentials
fn list_connections(config: &Config) {
    if config.connections.is_empty() {
        println!("No connections configured");
        return;
    }

    for (name, profile) in &config.connections {
        println!("{:<20} {}", name, profile);
    }
}

/// Lists supported protocols and their default templates
fn list_protocols() {
    println!("Supported Protocols:");
    println!();

    for protocol in Protocol::ALL {
        let descriptor = ClientDescriptor::for_protocol(protocol);
        println!("{}:", protocol);
        println!("  Names:    {}", protocol.aliases().join(", "));
        println!("  Template: {}", descriptor.template);
        println!();
    }

    println!("Security Features:");
    println!("  • PostgreSQL passwords go to ~/.pgpass (mode 0600), never argv");
    println!("  • Passwords masked in `show` output and logs");
}
