//! resilink CLI - sign-up/sign-in and bucket file operations.
//!
//! Configuration is read once from the environment; see `config.rs`.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zeroize::Zeroizing;

use resilink_common::Error;
use resilink_identity::{
    HttpIdentityBackend, HttpProfileStore, IdentityReconciler, Intent, ProfileStore,
    ReconciliationResult, SqliteProfileStore,
};
use resilink_storage::{HttpObjectStore, ResourceLocator};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "resilink")]
#[command(about = "resilink - resilient sign-in and bucket access")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign up or sign in.
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Work with files in the discovered bucket.
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },

    /// Initialize backing stores.
    Setup {
        #[command(subcommand)]
        action: SetupAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Create an account, or sign in if it already exists.
    Register {
        /// Account email.
        #[arg(short, long)]
        email: String,

        /// Full name stored on the profile.
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Sign in to an existing account.
    Login {
        /// Account email.
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum FilesAction {
    /// List files in the first bucket that answers.
    List,

    /// Upload a file under a timestamped key.
    Upload {
        /// File to upload.
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print the public URL of a stored key.
    Locate {
        /// Stored key.
        #[arg(short, long)]
        name: String,
    },
}

#[derive(Subcommand)]
enum SetupAction {
    /// Create the profiles table in the local profile store.
    Profiles,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = AppConfig::from_env();

    match cli.command {
        Commands::Auth { action } => match action {
            AuthAction::Register { email, name } => {
                cmd_auth(&config, Intent::Register, &email, name.as_deref()).await
            }
            AuthAction::Login { email } => cmd_auth(&config, Intent::Authenticate, &email, None).await,
        },

        Commands::Files { action } => match action {
            FilesAction::List => cmd_list(&config).await,
            FilesAction::Upload { file } => cmd_upload(&config, &file).await,
            FilesAction::Locate { name } => cmd_locate(&config, &name).await,
        },

        Commands::Setup { action } => match action {
            SetupAction::Profiles => cmd_setup_profiles(&config).await,
        },
    }
}

/// Prompt for password securely.
fn prompt_password(prompt: &str) -> Result<Zeroizing<String>> {
    let password = rpassword::prompt_password(prompt).context("Failed to read password")?;
    Ok(Zeroizing::new(password))
}

/// Build the profile store: local SQLite if configured, REST otherwise.
fn profile_store(config: &AppConfig) -> Result<Arc<dyn ProfileStore>> {
    match &config.profile_db {
        Some(path) => Ok(Arc::new(
            SqliteProfileStore::open(path).context("Failed to open profile database")?,
        )),
        None => Ok(Arc::new(HttpProfileStore::new(config.backend()?)?)),
    }
}

/// Register or sign in.
async fn cmd_auth(config: &AppConfig, intent: Intent, email: &str, name: Option<&str>) -> Result<()> {
    let backend = HttpIdentityBackend::new(config.backend()?)?;
    let reconciler = IdentityReconciler::new(Arc::new(backend), profile_store(config)?)
        .with_classifier(config.classifier().context("Failed to load error patterns")?);

    let password = prompt_password("Password: ")?;
    let result = reconciler
        .reconcile(intent, email, password.as_str(), name)
        .await;

    match &result {
        ReconciliationResult::Authenticated(identity) => {
            println!("{}", result);
            println!("  ID: {}", identity.id);
            Ok(())
        }
        ReconciliationResult::PendingConfirmation => {
            println!("{}", result);
            Ok(())
        }
        ReconciliationResult::Failed(kind, _) => {
            if kind.is_operator_actionable() {
                warn!("Operator action required: {}", kind);
            }
            anyhow::bail!("{}", result)
        }
    }
}

fn locator(config: &AppConfig) -> Result<ResourceLocator> {
    let store = HttpObjectStore::new(config.backend()?)?;
    Ok(ResourceLocator::new(
        Arc::new(store),
        config.containers.clone(),
        ResourceLocator::default_paths(),
    ))
}

/// List files.
async fn cmd_list(config: &AppConfig) -> Result<()> {
    let locator = locator(config)?;

    let location = match locator.refresh().await {
        Ok(location) => location,
        Err(Error::NoLocationFound { last_error }) => match last_error {
            Some(message) => anyhow::bail!("Failed to load files: {}", message),
            None => anyhow::bail!("Failed to load files"),
        },
        Err(err) => return Err(err.into()),
    };

    println!("{}", location.summary());
    for entry in &location.entries {
        println!("  {}  {}", entry.name, entry.public_locator);
    }

    Ok(())
}

/// Upload a file.
async fn cmd_upload(config: &AppConfig, file: &Path) -> Result<()> {
    info!("Uploading {}", file.display());

    let original_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .context("File name is not valid UTF-8")?;
    let content = tokio::fs::read(file)
        .await
        .context("Failed to read source file")?;

    let locator = locator(config)?;
    if let Err(err) = locator.refresh().await {
        warn!("Discovery failed, uploading to default bucket: {}", err);
    }

    let entry = locator
        .upload(original_name, content)
        .await
        .context("Upload failed")?;

    println!("Upload successful: {}", entry.name);
    println!("Public URL: {}", entry.public_locator);

    Ok(())
}

/// Resolve a public URL.
async fn cmd_locate(config: &AppConfig, name: &str) -> Result<()> {
    let locator = locator(config)?;
    if let Err(err) = locator.refresh().await {
        warn!("Discovery failed, using default bucket: {}", err);
    }

    let entry = locator.locate(name).await?;
    println!("{}", entry.public_locator);

    Ok(())
}

/// Create the profiles table.
async fn cmd_setup_profiles(config: &AppConfig) -> Result<()> {
    let path = config
        .profile_db
        .as_ref()
        .context("RESILINK_PROFILE_DB is not set")?;

    let store = SqliteProfileStore::open(path).context("Failed to open profile database")?;
    store
        .ensure_schema()
        .await
        .context("Failed to create profiles table")?;

    println!("profiles table ensured at {}", path.display());

    Ok(())
}
