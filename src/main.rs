//! docnav - A terminal column browser for document databases.
//!
//! # Usage
//!
//! ```bash
//! docnav
//! docnav shop --host db.internal --port 27017
//! docnav --fixture shop.json
//! ```

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use docnav::app::App;
use docnav::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    save_config_flags,
};
use docnav::store::{MemoryStore, Store};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 27017;

/// A terminal column browser for document databases
#[derive(Parser, Debug)]
#[command(name = "docnav", version, about, long_about = None)]
struct Cli {
    /// Database to open at startup
    #[arg(value_name = "DATABASE")]
    database: Option<String>,

    /// Server host [default: localhost]
    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    /// Server port [default: 27017]
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,

    /// Browse a JSON fixture instead of a server
    #[arg(long, value_name = "PATH")]
    fixture: Option<PathBuf>,

    /// Write log events to a file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log timings of store calls
    #[arg(long)]
    perf: bool,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

impl Cli {
    fn flags(&self) -> ConfigFlags {
        ConfigFlags {
            host: self.host.clone(),
            port: self.port,
            fixture: self.fixture.clone(),
            log_file: self.log_file.clone(),
            perf: self.perf,
        }
    }
}

fn init_logging(flags: &ConfigFlags) -> Result<()> {
    let mut filter = match &flags.log_file {
        Some(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        None => EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
    };
    if flags.perf {
        filter = filter.add_directive("docnav::perf=debug".parse()?);
    }

    if let Some(path) = &flags.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

#[cfg(feature = "mongo")]
fn connect_server(host: &str, port: u16) -> Result<Box<dyn Store>> {
    let store = docnav::store::MongoStore::connect(host, port)
        .with_context(|| format!("Failed to create client for {host}:{port}"))?;
    Ok(Box::new(store))
}

#[cfg(not(feature = "mongo"))]
fn connect_server(host: &str, port: u16) -> Result<Box<dyn Store>> {
    anyhow::bail!("docnav was built without server support; cannot reach {host}:{port} (use --fixture)")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = cli.flags();

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);
    init_logging(&effective)?;

    let (store, source_label): (Box<dyn Store>, String) = match &effective.fixture {
        Some(path) => (
            Box::new(MemoryStore::from_fixture(path)?),
            path.display().to_string(),
        ),
        None => {
            let host = effective.host.as_deref().unwrap_or(DEFAULT_HOST);
            let port = effective.port.unwrap_or(DEFAULT_PORT);
            (connect_server(host, port)?, format!("{host}:{port}"))
        }
    };

    let app = App::new(store, source_label.clone())
        .with_database(cli.database)
        .with_config_paths(
            Some(global_path),
            if local_path.exists() {
                Some(local_path)
            } else {
                None
            },
        );

    // Listing fails here, before the terminal is taken over.
    let nav = app
        .connect()
        .with_context(|| format!("Cannot browse {source_label}"))?;

    app.run(nav).context("Application error")
}
