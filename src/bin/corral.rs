//! Command-line front end: prints clustering data products as JSON.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use corral::{Config, DatasetVariant, FeatureGroup, Request, Session};

#[derive(Parser, Debug)]
#[command(name = "corral")]
#[command(about = "K-means, elbow and silhouette diagnostics for shelter intake/outcome data")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List datasets in the data directory.
    Datasets,
    /// List the columns of a dataset variant.
    Columns {
        #[arg(long)]
        variant: DatasetVariant,
    },
    /// Inertia for k = 1..=10.
    Elbow {
        #[arg(long)]
        variant: DatasetVariant,
        /// Feature groups (comma separated); all groups when omitted.
        #[arg(long, value_delimiter = ',')]
        features: Vec<FeatureGroup>,
    },
    /// Silhouette scores and band layout for one fit.
    Silhouette {
        #[arg(long)]
        variant: DatasetVariant,
        #[arg(long, value_delimiter = ',')]
        features: Vec<FeatureGroup>,
        #[arg(long, default_value_t = 4)]
        k: usize,
    },
    /// Full run: elbow, clustering, silhouette and per-cluster aggregates.
    Run {
        #[arg(long)]
        variant: DatasetVariant,
        #[arg(long, value_delimiter = ',')]
        features: Vec<FeatureGroup>,
        #[arg(long, default_value_t = 3)]
        k: usize,
        #[arg(long, default_value_t = 4)]
        silhouette_k: usize,
    },
}

fn groups_or_all(features: Vec<FeatureGroup>) -> Vec<FeatureGroup> {
    if features.is_empty() {
        FeatureGroup::ALL.to_vec()
    } else {
        features
    }
}

fn print_json<T: Serialize>(value: &T) -> corral::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn execute(session: &Session, command: Command) -> corral::Result<()> {
    match command {
        Command::Datasets => print_json(&session.store().names()?),
        Command::Columns { variant } => print_json(&session.table(variant)?.column_names()),
        Command::Elbow { variant, features } => {
            print_json(&session.elbow(variant, &groups_or_all(features))?)
        }
        Command::Silhouette {
            variant,
            features,
            k,
        } => print_json(&session.silhouette(variant, &groups_or_all(features), k)?),
        Command::Run {
            variant,
            features,
            k,
            silhouette_k,
        } => {
            let request = Request {
                variant,
                groups: groups_or_all(features),
                k,
                silhouette_k,
            };
            print_json(&session.run(&request)?)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.config.as_deref().map(Config::from_file).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("corral: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Logs go to stderr; stdout carries JSON only.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    fmt().with_writer(io::stderr).with_env_filter(filter).init();

    info!(data_dir = %config.data.dir.display(), "corral starting");
    let session = Session::new(config);
    match execute(&session, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}
