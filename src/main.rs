use std::{path::PathBuf, sync::Arc};

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tokio::sync::Mutex;

use archivist::{Error, Result, cli, config, error, types::PkceToken, warning};

/// Exit code after Ctrl-C, as shells report SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Print detailed progress
    #[clap(long, global = true)]
    verbose: bool,

    /// Directory for snapshot tables, caches and backups
    #[clap(long, global = true)]
    data_dir: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth,

    /// Sync the library and maintain the archive playlists
    Run(RunOptions),

    /// Delete owned playlists with identical content
    Dedupe,

    /// Streaming history exports
    History(HistoryOptions),

    /// Health check and insights from the local snapshot
    Info(InfoOptions),

    /// Backups written before deletions
    Backups(BackupsOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct RunOptions {
    /// Comma separated steps to run (overrides --skip-sync and --sync-only)
    #[clap(long)]
    pub steps: Option<String>,

    /// Work on the stored snapshot without syncing first
    #[clap(long, conflicts_with = "sync_only")]
    pub skip_sync: bool,

    /// Only sync the library
    #[clap(long)]
    pub sync_only: bool,

    /// Ignore change markers and process everything
    #[clap(long)]
    pub force: bool,

    /// Owner part of managed playlist names
    #[clap(long)]
    pub owner_name: Option<String>,

    /// Prefix of the "Finds" playlists
    #[clap(long)]
    pub prefix: Option<String>,

    /// Number of recent months kept as monthly playlists
    #[clap(long)]
    pub keep_monthly_months: Option<u32>,

    /// Only sync playlists owned by the current user
    #[clap(long, conflicts_with = "all_playlists")]
    pub owned_only: bool,

    /// Also sync followed playlists of other users
    #[clap(long)]
    pub all_playlists: bool,

    /// Do not sync liked songs
    #[clap(long)]
    pub no_liked_songs: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct HistoryOptions {
    #[command(subcommand)]
    pub command: HistorySubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum HistorySubcommand {
    /// Import an "Extended Streaming History" export directory
    Import { dir: PathBuf },
}

#[derive(Parser, Debug, Clone)]
pub struct InfoOptions {
    /// Only the playlist health check
    #[clap(long)]
    health: bool,
    /// Only the listening insights
    #[clap(long)]
    insights: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct BackupsOptions {
    #[command(subcommand)]
    pub command: BackupsSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum BackupsSubcommand {
    /// List all backups
    List,
    /// Recreate a playlist from a backup file
    Restore {
        file: PathBuf,
        /// Name for the restored playlist (defaults to the original name)
        #[clap(long)]
        name: Option<String>,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();
    archivist::set_verbose(cli.verbose || env_flag("ARCHIVIST_VERBOSE"));

    let mut settings = match config::Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("Invalid configuration: {}", e),
    };
    if let Some(dir) = cli.data_dir.clone() {
        settings.data_dir = dir;
    }

    let result = tokio::select! {
        result = dispatch(cli.command, settings) => result,
        _ = tokio::signal::ctrl_c() => Err(Error::Interrupted),
    };

    match result {
        Ok(()) => {}
        Err(Error::Interrupted) => {
            warning!("Interrupted");
            std::process::exit(EXIT_INTERRUPTED);
        }
        Err(e) => error!("{}", e),
    }
}

async fn dispatch(command: Command, mut settings: config::Settings) -> Result<()> {
    match command {
        Command::Auth => {
            let oauth_result: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(None));
            cli::auth(&settings, Arc::clone(&oauth_result)).await
        }
        Command::Run(opt) => {
            apply_run_overrides(&mut settings, &opt);
            cli::run(
                settings,
                opt.steps,
                opt.skip_sync,
                opt.sync_only,
                opt.force,
            )
            .await
        }
        Command::Dedupe => cli::dedupe(settings).await,
        Command::History(opt) => match opt.command {
            HistorySubcommand::Import { dir } => cli::import_history(&settings, &dir).await,
        },
        Command::Info(opt) => cli::info(&settings, opt.health, opt.insights).await,
        Command::Backups(opt) => match opt.command {
            BackupsSubcommand::List => cli::list_backups(&settings).await,
            BackupsSubcommand::Restore { file, name } => {
                cli::restore_backup(&settings, &file, name).await
            }
        },
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Command line flags win over the environment.
fn apply_run_overrides(settings: &mut config::Settings, opt: &RunOptions) {
    if let Some(owner) = &opt.owner_name {
        settings.naming.owner = owner.clone();
    }
    if let Some(prefix) = &opt.prefix {
        settings.naming.prefix_monthly = prefix.clone();
        settings.naming.prefix_yearly = prefix.clone();
    }
    if let Some(keep) = opt.keep_monthly_months {
        settings.keep_monthly_months = keep;
    }
    if opt.owned_only {
        settings.owned_only = true;
    }
    if opt.all_playlists {
        settings.owned_only = false;
    }
    if opt.no_liked_songs {
        settings.include_liked_songs = false;
    }
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
