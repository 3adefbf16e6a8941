//! opedit - command-line editor for the shared parameter file.

use clap::Parser;
use opparams::cli::{Cli, Commands};
use opparams::commands::{self, Output};
use opparams::config::{ConfigOverrides, resolve_config};
use std::process;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding the log filter (default: `warn`).
const LOG_ENV: &str = "OPPARAMS_LOG";

/// Set to `json` for one JSON object per log line.
const LOG_FORMAT_ENV: &str = "OPPARAMS_LOG_FORMAT";

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    init_logging();

    if let Err(e) = run(cli) {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Send logs to stderr so stdout stays machine readable.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn run(cli: Cli) -> Result<(), opparams::Error> {
    let overrides = ConfigOverrides {
        path: cli.file,
        refresh_interval: cli.refresh_ms.map(Duration::from_millis),
        no_persist: cli.no_persist,
        atomic_writes: cli.atomic,
        schema_path: cli.schema,
    };
    let resolved = resolve_config(&overrides)?;
    let human = cli.human_readable;

    if let Commands::Config = cli.command {
        output(&commands::config_show(&resolved), human);
        return Ok(());
    }

    let mut store = commands::open_store(&resolved)?;

    match cli.command {
        Commands::List { live, all } => {
            output(&commands::list(&mut store, live, all), human);
        }
        Commands::Get { key, force } => {
            output(&commands::get(&mut store, &key, force)?, human);
        }
        Commands::Set { key, value } => {
            output(&commands::set(&mut store, &key, &value)?, human);
        }
        Commands::Add { key, value } => {
            output(&commands::add(&mut store, &key, &value)?, human);
        }
        Commands::Delete { key } => {
            output(&commands::delete(&mut store, &key)?, human);
        }
        Commands::Info { key } => {
            output(&commands::info(&mut store, &key), human);
        }
        Commands::Schema { all } => {
            output(&commands::schema(&store, all), human);
        }
        Commands::Watch {
            key,
            interval_ms,
            count,
        } => {
            commands::watch(
                &mut store,
                &key,
                Duration::from_millis(interval_ms),
                count,
                |event| output(event, human),
            );
        }
        Commands::Config => {}
    }

    Ok(())
}

fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
