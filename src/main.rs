use anyhow::Context;
use clap::{Parser, Subcommand};
use courseware_api::api::{start_server, AppState};
use courseware_api::config::Config;
use courseware_api::logging::init_logging;
use courseware_api::storage::{InMemoryStorage, Seed, Storage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "courseware_api")]
#[command(about = "Course content and enrollment REST API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
        /// Store fixture to load (overrides config)
        #[arg(long)]
        seed: Option<PathBuf>,
    },
    /// Print the effective configuration and store summary, then exit
    Check {
        #[arg(long)]
        seed: Option<PathBuf>,
    },
}

fn load_store(config: &Config, seed: Option<PathBuf>) -> anyhow::Result<InMemoryStorage> {
    let path = seed.unwrap_or_else(|| config.store.seed_path.clone());
    if !path.exists() {
        info!("No seed file at {}, starting with an empty store", path.display());
        return Ok(InMemoryStorage::new());
    }
    let seed = Seed::load(&path).with_context(|| format!("loading {}", path.display()))?;
    Ok(InMemoryStorage::from_seed(seed)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load()?;
    let _guard = init_logging(&config.logging.dir, "courseware_api");

    match cli.command {
        Commands::Serve { port, seed } => {
            let store = load_store(&config, seed)?;
            let port = port.unwrap_or(config.server.port);
            let state = AppState::new(Arc::new(store), config)?;
            start_server(state, port).await?;
        }
        Commands::Check { seed } => {
            let store = load_store(&config, seed)?;
            let courses = store.list_courses().await?;
            println!("Public url: {}", config.base_uri());
            println!("Api key required: {}", config.auth.api_key.is_some());
            println!("Enrollment throttle: {}", config.throttle.enrollment_rate);
            println!("Courses: {}", courses.len());
            for course in courses {
                println!("  {}", course.key());
            }
        }
    }

    Ok(())
}
