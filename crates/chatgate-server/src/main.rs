//! ChatGate — a single uniform "generate a reply" gateway over
//! heterogeneous chat-completion backends.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("CHATGATE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "--login" | "login" => {
                let data_dir = if args.len() > 2 {
                    PathBuf::from(&args[2])
                } else {
                    resolve_data_dir()
                };
                let paths = chatgate_core::DataPaths::new(&data_dir)?;
                let store = chatgate_browser::SessionStore::new(&paths.browser_session_file);
                let config = chatgate_browser::BrowserConfig::default();
                chatgate_browser::run_login(&config, &store)
                    .await
                    .map_err(|e| anyhow::anyhow!("Login failed: {}", e))?;
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("ChatGate — uniform gateway over chat-completion backends");
                println!();
                println!("Usage: chatgate [command]");
                println!();
                println!("Commands:");
                println!("  (none)             Start the server");
                println!("  login [data-dir]   Capture a browser session interactively");
                println!("  help               Show this help message");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'chatgate help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    // Normal server startup
    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = chatgate_core::ChatGateConfig::from_env(&data_dir)?;
    let port = config.port;

    let state = Arc::new(AppState::new(config));

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("ChatGate listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
