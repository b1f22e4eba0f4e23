//! Calcite CLI - an interactive SQL prompt for Apache Calcite Avatica servers.

use calcite_cli::cli::Cli;
use calcite_cli::config::Config;
use calcite_cli::connection::{resolve_settings, ConnectionDescriptor};
use calcite_cli::db;
use calcite_cli::error::Result;
use calcite_cli::logging;
use calcite_cli::repl::{EditorLineSource, Session, SessionEnd, BANNER, FAREWELL};
use tracing::{debug, error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse_args();

    match cli.log_path() {
        Some(path) => logging::init_file_logging(&path, cli.verbose),
        None => logging::init_stderr_logging(cli.verbose),
    }

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    load_dotenv();

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let settings = resolve_settings(&cli.to_connection_settings(), cli.connection_name(), &config)?;
    let descriptor = ConnectionDescriptor::from_settings(&settings)?;
    info!("Connecting to {}", descriptor.display_string());

    let conn = db::connect(&descriptor).await?;

    let mut source = EditorLineSource::new(cli.history_path(&config), config.repl.history_size)?;
    println!("{BANNER}");

    // Scope the session so its borrow of the connection ends before close.
    let outcome = {
        let mut session = Session::new(conn.as_ref(), std::io::stdout(), std::io::stderr());
        session.run(&mut source).await
    };

    source.save_history();
    if let Err(e) = conn.close().await {
        warn!("Failed to close connection: {}", e);
    }

    match outcome? {
        SessionEnd::Exit | SessionEnd::Interrupted => println!("{FAREWELL}"),
        SessionEnd::EndOfInput => println!(),
    }

    Ok(())
}

/// Loads a `.env` file from the working directory if one exists.
fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Could not load .env file: {}", e),
    }
}
