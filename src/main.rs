pub mod config;
pub mod counts;
pub mod data;
pub mod processing;
pub mod report;
pub mod server;
pub mod style;
pub mod types;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify features into density classes and write the report
    Classify {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Serve the classified map data over HTTP
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Classify { config } => {
            println!("Classifying with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            // 1. Load Data (counts first; the density pass needs both)
            let counts = data::load_counts(&app_config)?;
            let features = data::load_features(&app_config)?;

            // 2. Densities and class breaks
            let number_of_classes = app_config.classification.number_of_classes;
            let (records, stats) = processing::compute_densities(
                &features,
                &counts,
                &app_config.input.key_attribute,
                number_of_classes,
            );

            // 3. Write Report
            let report =
                report::build_report(&features, &counts, &records, &stats, number_of_classes)?;
            report::write_report(&app_config, &report)?;

            println!("Classification complete!");
        }
        Commands::Serve { config } => {
            println!("Serving map with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            let counts = data::load_counts(&app_config)?;
            let features = data::load_features(&app_config)?;

            server::start_server(app_config, features, counts).await?;
        }
    }

    Ok(())
}
