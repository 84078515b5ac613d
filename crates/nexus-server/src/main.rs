//! NexusDesk: helpdesk triage server.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;
#[cfg(test)]
mod test_support;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("NEXUS_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn print_help() {
    println!("NexusDesk: helpdesk triage server");
    println!();
    println!("Usage: nexusdesk [command]");
    println!();
    println!("Commands:");
    println!("  (none)                   Start the server");
    println!("  classify <text>          Classify text with the local rules and print JSON");
    println!("  list [data-dir]          Print every stored ticket as JSON");
    println!("  help                     Show this help message");
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
            "serve" => {}
            "classify" => {
                if args.len() < 3 {
                    eprintln!("Usage: nexusdesk classify <text>");
                    std::process::exit(1);
                }
                let text = args[2..].join(" ");
                let rule = nexus_classify::fallback::match_rule(&text, false);
                let diagnosis = nexus_classify::fallback::classify(&text);
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "rule": rule,
                        "diagnosis": diagnosis,
                    }))?
                );
                return Ok(());
            }
            "list" => {
                let data_dir = args.get(2).map(PathBuf::from).unwrap_or_else(resolve_data_dir);
                let config = nexus_core::NexusConfig::from_env(&data_dir)?;
                let store = nexus_store::TicketStore::open(&config.data_paths.tickets_file)?;
                let tickets = store.read_all()?;
                println!("{}", serde_json::to_string_pretty(&tickets)?);
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'nexusdesk help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    // Normal server startup
    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = nexus_core::NexusConfig::from_env(&data_dir)?;
    let port = config.port;

    let state = Arc::new(AppState::new(config)?);
    match state.classifier_config.read().resolve_credential() {
        Some(c) => info!("Remote classifier: {} ({})", c.provider, c.model),
        None => info!("No classifier key configured; using local keyword rules"),
    }

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("NexusDesk server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
