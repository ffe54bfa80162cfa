//! feedscroll command-line entry point.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use feedscroll_cli::{scrape_cmd, ScrapeArgs};

#[derive(Parser)]
#[command(
    name = "feedscroll",
    about = "feedscroll — extract posts from a profile page by scrolling a signed-in browser",
    version,
    after_help = "Credentials are read from EMAIL_<ACCOUNT>, USERNAME_<ACCOUNT> and PASSWORD\n(a .env file in the working directory is loaded first)."
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress the summary line.
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, scroll a profile and write its posts.
    Scrape(ScrapeArgs),

    /// Generate shell completion scripts.
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Scrape(args) => scrape_cmd::run(args, cli.quiet).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "feedscroll", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = &result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }

    result
}
