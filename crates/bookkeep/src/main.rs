//! bookkeep - command-line client for the accounting backend

mod cli;

use anyhow::{bail, Context, Result};
use bookkeep_core::{
    AuthenticatedClient, BookkeepApi, ClientConfig, ConfigFile, CoreError, LedgerAggregator,
    LedgerError,
};
use bookkeep_types::{TokenPair, UserProfile};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "bookkeep",
    version,
    about = "Command-line client for the bookkeep accounting backend",
    long_about = "Keeps a login session for the accounting backend and reads project data\n\
                  through it. Access tokens are refreshed silently before they expire; a\n\
                  rejected refresh ends the session and asks for a new login.\n\
                  \n\
                  Examples:\n\
                    bookkeep login --access-token A --refresh-token R\n\
                    bookkeep status                  # Show session state\n\
                    bookkeep ledger 101              # Category/job/invoice report\n\
                    bookkeep invoices --unpaid --json\n\
                  \n\
                  Environment Variables:\n\
                    BOOKKEEP_API_BASE                # Backend base URL\n\
                    BOOKKEEP_SESSION_FILE            # Session file location\n\
                    BOOKKEEP_TIMEOUT_SECS            # Per-request timeout\n\
                    BOOKKEEP_NO_COLOR                # Disable ANSI colors\n\
                    RUST_LOG                         # Log filter (default: warn)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Backend base URL (e.g. https://books.example.com/api)
    #[arg(long, env = "BOOKKEEP_API_BASE", global = true)]
    api_base: Option<String>,

    /// Session file (default: <config dir>/bookkeep/session.json)
    #[arg(long, env = "BOOKKEEP_SESSION_FILE", global = true)]
    session_file: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, env = "BOOKKEEP_TIMEOUT_SECS", global = true)]
    timeout: Option<u64>,

    /// Config file (default: <config dir>/bookkeep/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, env = "BOOKKEEP_NO_COLOR", global = true)]
    no_color: bool,

    /// Debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Store tokens obtained from the login endpoint
    Login {
        #[arg(long)]
        access_token: String,
        #[arg(long)]
        refresh_token: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        id: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show session state
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a valid access token, refreshing it if needed
    Token,
    /// Category → job → invoice report for one project
    Ledger {
        /// Project code
        project_code: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List projects
    Projects {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List invoices
    Invoices {
        /// Only invoices not yet fully paid
        #[arg(long)]
        unpaid: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = resolve_config(&cli)?;
    let no_color = cli.no_color;

    match cli.command {
        Command::Login {
            access_token,
            refresh_token,
            username,
            email,
            id,
        } => {
            let profile = (username.is_some() || email.is_some() || id.is_some()).then(|| {
                UserProfile {
                    username: username.unwrap_or_default(),
                    email: email.unwrap_or_default(),
                    id: id.unwrap_or_default(),
                }
            });
            run_login(config, TokenPair::new(access_token, refresh_token), profile)?;
        }
        Command::Logout => run_logout(config)?,
        Command::Status { json } => run_status(config, json)?,
        Command::Token => run_token(config).await?,
        Command::Ledger { project_code, json } => {
            run_ledger(config, project_code, json, no_color).await?;
        }
        Command::Projects { json } => run_projects(config, json, no_color).await?,
        Command::Invoices { unpaid, json } => run_invoices(config, unpaid, json, no_color).await?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("bookkeep=debug,bookkeep_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Flags and environment over `config.toml` over defaults
fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let file = match cli.config.clone().or_else(ConfigFile::default_path) {
        Some(path) => ConfigFile::load(&path)?,
        None => ConfigFile::default(),
    };

    let mut config = ClientConfig::from_file(file);
    if let Some(base) = &cli.api_base {
        config = config.with_base_url(base.clone());
    }
    if let Some(path) = &cli.session_file {
        config = config.with_session_path(Some(path.clone()));
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    if config.session_path.is_none() {
        bail!("Could not determine session file location (use --session-file)");
    }
    tracing::debug!(
        base_url = %config.base_url,
        session = ?config.session_path,
        timeout_secs = config.request_timeout.as_secs(),
        "Configuration resolved"
    );
    Ok(config)
}

/// Client for commands that only touch the local session
///
/// The base URL is not needed until a request is made, so it is not
/// validated here.
fn local_client(config: ClientConfig) -> Result<AuthenticatedClient> {
    let config = if config.base_url.trim().is_empty() {
        config.with_base_url("http://localhost")
    } else {
        config
    };
    AuthenticatedClient::from_config(config).context("Failed to open session")
}

fn remote_api(config: ClientConfig) -> Result<BookkeepApi> {
    let client = AuthenticatedClient::from_config(config).context("Failed to set up API client")?;
    Ok(BookkeepApi::new(Arc::new(client)))
}

fn run_login(config: ClientConfig, pair: TokenPair, profile: Option<UserProfile>) -> Result<()> {
    let client = local_client(config)?;
    client.refresher().login(&pair, profile)?;

    let location = client
        .refresher()
        .store()
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "memory".to_string());
    println!("Session saved to {location}");
    Ok(())
}

fn run_logout(config: ClientConfig) -> Result<()> {
    let client = local_client(config)?;
    client.refresher().logout()?;
    println!("Logged out.");
    Ok(())
}

fn run_status(config: ClientConfig, json: bool) -> Result<()> {
    let client = local_client(config)?;
    println!("{}", cli::format_status(&client.refresher().status(), json));
    Ok(())
}

async fn run_token(config: ClientConfig) -> Result<()> {
    let api = remote_api(config)?;
    match api.client().refresher().get_valid_access_token().await {
        Some(token) => {
            println!("{token}");
            Ok(())
        }
        None => bail!("Not logged in (or the session could not be refreshed). Run `bookkeep login`."),
    }
}

async fn run_ledger(
    config: ClientConfig,
    project_code: i64,
    json: bool,
    no_color: bool,
) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    let aggregator = LedgerAggregator::new(remote_api(config)?);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(format!("Building ledger for project {project_code}..."));

    let result = aggregator.try_build_ledger(project_code).await;
    spinner.finish_and_clear();

    let ledger = match result {
        Ok(ledger) => ledger,
        Err(e) if e.is_empty_data() => {
            eprintln!("{e}");
            Vec::new()
        }
        Err(LedgerError::Upstream { step, source }) => {
            return Err(explain(source)).with_context(|| format!("Ledger fetch failed at {step}"));
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", cli::format_ledger(&ledger, json, no_color));
    Ok(())
}

async fn run_projects(config: ClientConfig, json: bool, no_color: bool) -> Result<()> {
    let api = remote_api(config)?;
    let projects = api.projects().await.map_err(explain)?;
    println!("{}", cli::format_projects(&projects, json, no_color));
    Ok(())
}

async fn run_invoices(config: ClientConfig, unpaid: bool, json: bool, no_color: bool) -> Result<()> {
    let api = remote_api(config)?;
    let invoices = if unpaid {
        api.unpaid_invoices().await
    } else {
        api.invoices().await
    }
    .map_err(explain)?;
    println!("{}", cli::format_invoices(&invoices, json, no_color));
    Ok(())
}

/// Turn auth failures into a login hint
fn explain(error: CoreError) -> anyhow::Error {
    if error.is_auth_failure() {
        anyhow::Error::new(error).context("Session expired or missing. Run `bookkeep login`.")
    } else {
        error.into()
    }
}
