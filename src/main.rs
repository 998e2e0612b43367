//! Deep-link router CLI
//!
//! Loads a route table and exercises it against URLs from the command line.
//!
//! # Architecture Overview
//!
//! ```text
//!     routes.toml ──▶ config ──▶ RouterManager ◀── HandlerTable (one printer per target)
//!                                     │
//!     URL ──▶ request ──▶ scheme router ──▶ matcher ──▶ handler ──▶ JSON on stdout
//!                                     │
//!                                     └──▶ global fallback / unmatched callback
//! ```

use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use deeplink_router::config::{load_config, RouterConfig};
use deeplink_router::observability::logging::init_logging;
use deeplink_router::routing::{
    expand_optional_patterns, handler, HandlerTable, Parameters, RouterManager,
};

#[derive(Parser)]
#[command(name = "deeplink-router")]
#[command(about = "Route deep-link URLs against a route table", long_about = None)]
struct Cli {
    /// Route table (TOML). Without one the router starts empty.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch a URL and print the handling target
    Route {
        url: String,
        /// Extra parameter passed to the handler
        #[arg(short = 'p', long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },
    /// Report whether a URL would match without dispatching
    Check { url: String },
    /// Print the candidates a pattern expands to, in attempt order
    Expand { pattern: String },
    /// List registered routes by scheme
    List,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };
    init_logging(&config.observability);

    tracing::debug!(
        config = ?cli.config,
        schemes = config.schemes.len(),
        "Configuration loaded"
    );

    match cli.command {
        Commands::Expand { pattern } => {
            for candidate in expand_optional_patterns(&pattern)? {
                println!("{candidate}");
            }
        }
        Commands::List => {
            let manager = RouterManager::from_config(&config, &printing_handlers(&config))?;
            let routes: BTreeMap<_, _> = manager.all_routes().into_iter().collect();
            for (scheme, definitions) in routes {
                println!("{scheme}");
                for definition in definitions {
                    println!("  {definition}");
                }
            }
        }
        Commands::Check { url } => {
            let manager = RouterManager::from_config(&config, &printing_handlers(&config))?;
            let routable = manager.can_route_url(&url);
            println!("{routable}");
            if !routable {
                return Err(format!("no route matches {url}").into());
            }
        }
        Commands::Route { url, params } => {
            let manager = RouterManager::from_config(&config, &printing_handlers(&config))?;
            let router = manager.router_for_url(&url);
            router.set_unmatched_handler(|router, url, _| {
                tracing::warn!(scheme = %router.scheme(), url, "Unmatched URL");
            });
            let extra: Parameters = params.into_iter().collect();
            if !manager.route_url_with_parameters(&url, extra) {
                return Err(format!("no route handled {url}").into());
            }
        }
    }

    Ok(())
}

/// One accepting handler per configured target, printing the match as JSON.
fn printing_handlers(config: &RouterConfig) -> HandlerTable {
    let targets = config
        .routes
        .iter()
        .chain(config.schemes.iter().flat_map(|scheme| scheme.routes.iter()))
        .map(|route| route.target.clone());

    let mut table = HandlerTable::new();
    for target in targets {
        let name = target.clone();
        table.entry(target).or_insert_with(|| {
            handler(move |parameters: &Parameters| {
                let output = serde_json::json!({
                    "target": name,
                    "parameters": parameters,
                });
                match serde_json::to_string_pretty(&output) {
                    Ok(text) => println!("{text}"),
                    Err(error) => eprintln!("Error: failed to encode parameters: {error}"),
                }
                true
            })
        });
    }
    tracing::debug!(targets = table.len(), "Handlers bound");
    table
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}
