use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use lectern::auth::TokenGenerator;
use lectern::config::ServerConfig;
use lectern::scripture::SharedScripture;
use lectern::seed::{DEFAULT_BIBLE_ID, SeedSummary, seed};
use lectern::server::{AppState, create_router};
use lectern::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "lectern")]
#[command(about = "A personal audio Bible recording server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and seed the default Bible
    Init {
        /// Data directory for the database and configuration
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Scripture CSV (defaults to scripture.csv in the data directory)
        #[arg(long)]
        scripture: Option<PathBuf>,
    },

    /// Start the server
    Serve {
        /// Data directory for the database and configuration
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Host to bind to (overrides lectern.toml)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides lectern.toml)
        #[arg(long, short)]
        port: Option<u16>,

        /// Scripture CSV (overrides lectern.toml)
        #[arg(long)]
        scripture: Option<PathBuf>,
    },
}

fn load_config(data_dir: PathBuf, scripture: Option<PathBuf>) -> anyhow::Result<ServerConfig> {
    let mut config = ServerConfig::load(data_dir)?;
    if scripture.is_some() {
        config.scripture_path = scripture;
    }
    Ok(config)
}

/// Opens the store and brings canon and default-Bible rows up to date.
fn open_and_seed(
    config: &ServerConfig,
    scripture: &SharedScripture,
) -> anyhow::Result<(SqliteStore, SeedSummary)> {
    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;
    let summary = seed(&store, scripture.get(), &config.default_bible)?;
    Ok((store, summary))
}

fn run_init(data_dir: PathBuf, scripture: Option<PathBuf>) -> anyhow::Result<()> {
    fs::create_dir_all(&data_dir)?;
    let config = load_config(data_dir, scripture)?;

    let scripture = SharedScripture::new(config.scripture_path());
    let (store, summary) = open_and_seed(&config, &scripture)?;
    store.close()?;

    println!("Initialized lectern in {}", config.data_dir.display());
    println!(
        "Bible {DEFAULT_BIBLE_ID} \"{}\": {} books, {} chapters",
        config.default_bible.name, summary.books, summary.chapters
    );
    if scripture.get().is_empty() {
        println!(
            "No scripture found at {}; verse text will be unavailable",
            scripture.path().display()
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lectern=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            data_dir,
            scripture,
        } => {
            run_init(data_dir, scripture)?;
        }
        Commands::Serve {
            data_dir,
            host,
            port,
            scripture,
        } => {
            let mut config = load_config(data_dir, scripture)?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }

            if !config.db_path().exists() {
                bail!("Server not initialized. Run 'lectern init' first to create the database.");
            }

            let scripture = Arc::new(SharedScripture::new(config.scripture_path()));
            let (store, _) = open_and_seed(&config, &scripture)?;

            let state = Arc::new(AppState {
                store: Arc::new(store),
                scripture,
                tokens: TokenGenerator::new(),
                token_ttl_minutes: config.token_ttl_minutes,
            });

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
