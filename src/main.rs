use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use lodestone::config::Config;
use lodestone::telemetry::init_tracing;

mod cmd;

#[derive(Parser)]
#[command(name = "lodestone")]
#[command(version, about = "Game launcher: accounts, Java runtime, asset repair and launch")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to launcher.toml. Defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root directory for settings, game files, runtimes and logs.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the account
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Two-factor code, if the account requires one
        #[arg(long)]
        code: Option<String>,
    },
    /// Log out an account (the selected one by default)
    Logout {
        #[arg(long)]
        uuid: Option<String>,
    },
    /// List or select stored accounts
    Accounts {
        #[command(subcommand)]
        command: Option<AccountsCommands>,
    },
    /// Verify Java and game files, then launch and supervise the game
    Launch {
        /// Server id from the distribution index
        #[arg(short, long)]
        server: Option<String>,
        /// Install a missing Java runtime without asking
        #[arg(long)]
        yes: bool,
    },
    /// Show the latest news
    News {
        /// Open article N in the browser
        #[arg(long)]
        open: Option<usize>,
        /// Mark the latest article as read
        #[arg(long)]
        dismiss: bool,
    },
    /// Check the game service status
    Status {
        /// Keep polling until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// Show or manage launcher.toml
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum AccountsCommands {
    /// List stored accounts
    List,
    /// Select the account used for launching
    Select { uuid: String },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate launcher.toml
    Validate,
    /// Create a default launcher.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config, cli.data_dir, cli.verbose)?;

    let command = match cli.command {
        Commands::Config { command } => {
            let _guard = init_tracing(config.verbose, None)?;
            return cmd::cmd_config(&config, command);
        }
        command => command,
    };

    config.ensure_directories()?;
    let _guard = init_tracing(config.verbose, Some(&config.log_dir))?;

    match command {
        Commands::Login { email, code } => cmd::cmd_login(&config, email, code).await?,
        Commands::Logout { uuid } => cmd::cmd_logout(&config, uuid).await?,
        Commands::Accounts { command } => cmd::cmd_accounts(&config, command)?,
        Commands::Launch { server, yes } => cmd::cmd_launch(&config, server, yes).await?,
        Commands::News { open, dismiss } => cmd::cmd_news(&config, open, dismiss).await?,
        Commands::Status { watch } => cmd::cmd_status(&config, watch).await?,
        Commands::Config { .. } => {}
    }

    Ok(())
}
