//! whatsapp-inbound - receives the gateway's inbound WhatsApp webhook
//!
//! `serve` runs the HTTP endpoint. `replay` pushes a captured payload through
//! the same handler against the configured database, which is useful when
//! chasing a message that never showed up in the log.

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::error::Error;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use whatsapp_inbound::{router, AppState, Database, FormFields, ResponseBody, ServiceConfig};

#[derive(Parser)]
#[command(name = "whatsapp-inbound")]
#[command(version, about = "Inbound WhatsApp webhook receiver", long_about = None)]
struct Cli {
    /// Optional YAML config file; environment variables override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook HTTP server
    Serve {
        /// Override the listen port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run a captured webhook payload through the handler and print the response
    Replay {
        /// YAML or JSON file mapping form field names to values
        payload: PathBuf,
    },

    /// Verify the database is reachable
    CheckDb,
}

fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = ServiceConfig::load(cli.config.as_deref())
        .map_err(|e| Box::new(e) as Box<dyn Error>)
        .and_then(|config| match cli.command {
            Commands::Serve { port } => serve(config, port),
            Commands::Replay { payload } => replay(config, &payload),
            Commands::CheckDb => check_db(config),
        });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn connect(config: &ServiceConfig) -> Result<Database, Box<dyn Error>> {
    let database = Database::new_with_config(config.database_url()?, config.database.pool.clone())?;
    Ok(database)
}

fn serve(mut config: ServiceConfig, port: Option<u16>) -> Result<(), Box<dyn Error>> {
    if let Some(port) = port {
        config.server.port = port;
    }

    let database = connect(&config)?;
    let state = AppState::from_database(&config, database);
    let app = router(state, &config.server.webhook_path);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        tracing::info!("WhatsApp webhook listening on {}", addr);
        tracing::info!("Webhook path: {}", config.server.webhook_path);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok::<(), Box<dyn Error>>(())
    })
}

fn replay(config: ServiceConfig, payload: &Path) -> Result<(), Box<dyn Error>> {
    let contents = std::fs::read_to_string(payload)
        .map_err(|e| format!("Failed to read payload {}: {}", payload.display(), e))?;
    let fields: FormFields = serde_yaml::from_str::<HashMap<String, String>>(&contents)?;

    let database = connect(&config)?;
    let state = AppState::from_database(&config, database);
    let response = state.handler.handle(&fields);

    println!("Outcome: {:?}", response.kind());
    match response.body() {
        ResponseBody::Markup(markup) => println!("{}", markup),
        ResponseBody::Json(value) => println!("{}", serde_json::to_string_pretty(&value)?),
    }
    Ok(())
}

fn check_db(config: ServiceConfig) -> Result<(), Box<dyn Error>> {
    let database = connect(&config)?;
    database.test_connection()?;
    println!("✅ Database connection OK");
    Ok(())
}
