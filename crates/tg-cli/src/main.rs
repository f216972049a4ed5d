use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

/// tg: build C and C++ targets declared in TARGETS files.
///
/// Targets live under $TG_PATH/src. tg resolves the requested targets and
/// everything they depend on, writes $TG_PATH/build.ninja and runs ninja.
///
/// EXAMPLES:
///     tg build //app:main        Build one target
///     tg build .                 Build everything under the current directory
///     tg build //lib --print-plan
///                                Show the build order as JSON
///     tg clean                   Remove build outputs
///
/// ENVIRONMENT VARIABLES:
///     TG_PATH     tg directory (required)
///     TG_NINJA    ninja executable (default: ninja)
///     TG_LOG      tracing filter, overrides -v
///     CC, CXX     C and C++ compilers
#[derive(Parser)]
#[command(name = "tg")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build targets
    ///
    /// Patterns are `path:name` for one target, or a path for every target
    /// declared below it. Relative patterns are resolved against the current
    /// directory, which must then be inside the source tree.
    ///
    /// EXAMPLES:
    ///     tg build //app:main
    ///     tg build :main ../lib
    #[command(visible_alias = "b")]
    Build {
        /// Target patterns
        #[arg(required = true)]
        patterns: Vec<String>,
        /// Only regenerate build.ninja (used by ninja itself)
        #[arg(long)]
        ninja_training: bool,
        /// Print the resolved build plan as JSON instead of building
        #[arg(long, conflicts_with = "ninja_training")]
        print_plan: bool,
    },

    /// Remove everything ninja has built
    Clean,
}

fn init_tracing(verbose: u8, filter: Option<&str>) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = filter
        .and_then(|f| EnvFilter::try_new(f).ok())
        .unwrap_or_else(|| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = config::Config::from_env();
    init_tracing(cli.verbose, config.log_filter.as_deref());

    let code = match cli.command {
        Commands::Build {
            patterns,
            ninja_training,
            print_plan,
        } => {
            let options = commands::build::BuildOptions {
                patterns,
                ninja_training,
                print_plan,
            };
            commands::build::run(&config, &options)?
        }
        Commands::Clean => commands::clean::run(&config)?,
    };

    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}
