//! docweave CLI - find undocumented C# declarations and document them.
//!
//! `dw check` reports, `dw fix` documents everything it reports, `dw refactor`
//! documents the declaration under a cursor position.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

mod commands;
mod config;

use commands::{config as config_cmd, OutputFormat, Session};
use config::Config;

/// docweave - documentation comments for C# declarations.
///
/// Inherit-doc and literal-constant summaries are produced locally; all
/// other comments come from an OpenAI-compatible endpoint.
#[derive(Parser, Debug)]
#[command(
    name = "dw",
    author,
    version,
    about = "docweave: find and document undocumented C# declarations",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Service profile to use (from the profiles file)
    #[arg(long, global = true, env = "DOCWEAVE_PROFILE")]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Report undocumented declarations.
    ///
    /// Exits with status 1 when any declaration is reported.
    Check {
        /// Files or directories to check.
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Output format.
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Document every reported declaration.
    Fix {
        /// Files or directories to fix.
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Compute the fixes without writing any file.
        #[arg(long)]
        dry_run: bool,

        /// Generation requests in flight per file.
        #[arg(long, default_value_t = docweave_core::coordinator::DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },

    /// Document the declaration at a position, even if already documented.
    Refactor {
        /// Source file.
        file: PathBuf,

        /// 1-based line.
        #[arg(short, long)]
        line: usize,

        /// 1-based column.
        #[arg(short, long)]
        column: usize,

        /// Print the new file contents instead of writing them.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show what documenting the declaration at a position would do.
    Preview {
        /// Source file.
        file: PathBuf,

        /// 1-based line.
        #[arg(short, long)]
        line: usize,

        /// 1-based column.
        #[arg(short, long)]
        column: usize,

        /// Output format.
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Manage configuration.
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective configuration.
    Show,

    /// Set a configuration value.
    Set {
        /// Configuration key.
        key: String,

        /// Value to set.
        value: String,
    },

    /// Get a configuration value.
    Get {
        /// Configuration key.
        key: String,
    },

    /// Reset configuration to defaults.
    Reset,

    /// Show path to config file.
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    let level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Check { paths, format } => {
            let config = Config::load(profile)?;
            let session = Session::new(&config, 1);
            if commands::check::execute(&session, &paths, format).await? {
                std::process::exit(1);
            }
        }

        Commands::Fix {
            paths,
            dry_run,
            concurrency,
        } => {
            let config = Config::load(profile)?;
            let session = Session::new(&config, concurrency);
            if commands::fix::execute(&session, &paths, dry_run).await? {
                std::process::exit(1);
            }
        }

        Commands::Refactor {
            file,
            line,
            column,
            dry_run,
        } => {
            let config = Config::load(profile)?;
            let session = Session::new(&config, 1);
            commands::refactor::execute(&session, &file, line, column, dry_run).await?;
        }

        Commands::Preview {
            file,
            line,
            column,
            format,
        } => {
            let config = Config::load(profile)?;
            let session = Session::new(&config, 1);
            commands::preview::execute(&session, &file, line, column, format)?;
        }

        Commands::Config(config_cmd_inner) => match config_cmd_inner {
            ConfigCommands::Show => config_cmd::show(&Config::load(profile)?)?,
            ConfigCommands::Set { key, value } => config_cmd::set(&key, &value)?,
            ConfigCommands::Get { key } => config_cmd::get(&Config::load(profile)?, &key)?,
            ConfigCommands::Reset => config_cmd::reset()?,
            ConfigCommands::Path => config_cmd::path()?,
        },
    }

    Ok(())
}
