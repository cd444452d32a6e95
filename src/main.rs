use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codeverdict::DeveloperLevel;
use codeverdict::cli::Output;

#[derive(Parser)]
#[command(name = "codeverdict")]
#[command(version, about = "LLM code review for whole repositories")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Review a GitHub repository
    Review {
        #[arg(help = "Repository URL, e.g. https://github.com/owner/repo")]
        git_url: String,
        #[arg(
            long,
            short,
            default_value = "junior",
            help = "Developer level: junior, middle, strong"
        )]
        level: DeveloperLevel,
        #[arg(long, short, default_value = "", help = "What the project is supposed to do")]
        description: String,
        #[arg(long, help = "Print the report as JSON")]
        json: bool,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
        #[arg(long, help = "Analyses folded per reduce call (2-100)")]
        batch_size: Option<usize>,
    },

    /// Run the review HTTP server
    Serve {
        #[arg(long, short, help = "Bind address (default: server.bind)")]
        bind: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mcodeverdict encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Output::new().error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Review {
            git_url,
            level,
            description,
            json,
            model,
            batch_size,
        } => {
            use codeverdict::cli::commands::review::ReviewOptions;

            let rt = Runtime::new()?;
            rt.block_on(codeverdict::cli::commands::review::run(ReviewOptions {
                git_url,
                level,
                description,
                json,
                model,
                batch_size,
            }))?;
        }
        Commands::Serve { bind } => {
            let rt = Runtime::new()?;
            rt.block_on(codeverdict::cli::commands::serve::run(bind))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                codeverdict::cli::commands::config::show(&format)?;
            }
            ConfigAction::Path => {
                codeverdict::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                if global {
                    codeverdict::cli::commands::config::init_global(force)?;
                } else {
                    codeverdict::cli::commands::config::init_project(force)?;
                }
            }
        },
    }

    Ok(())
}
