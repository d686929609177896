use clap::{Parser, Subcommand};
use cwtail_core::cli::{self, CliContext, ConfigCmd, LsCmd, TailArgs};
use cwtail_core::logging::{LogFormat, default_log_format, init_logging};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "cwtail",
    version,
    about = "cwtail: tail and list log groups and streams"
)]
struct Cli {
    /// Path to the cwtail config file [default: cwtail.hcl if present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the JSON log store (overrides store.path)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Diagnostic log format on stderr
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show an entity
    Ls {
        #[command(subcommand)]
        cmd: LsCmd,
    },

    /// Tail a log group
    Tail(TailArgs),

    /// Configuration tooling
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.log_format.unwrap_or_else(default_log_format));

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Config { cmd } => match cmd {
            ConfigCmd::Check { path } => cli::check(path),
            ConfigCmd::Dump { path, json, yaml } => cli::dump(path, json, yaml),
        },

        Command::Ls { cmd } => {
            let ctx = CliContext::load(cli.config.as_deref(), cli.store)?;
            cli::run_ls(cmd, &ctx)
        }

        Command::Tail(args) => {
            let ctx = CliContext::load(cli.config.as_deref(), cli.store)?;
            cli::run_tail(args, &ctx)
        }
    }
}
