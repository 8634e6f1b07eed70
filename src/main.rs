use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use vista::{ViewMode, ViewerConfig, VistaApp};

#[derive(Debug, Parser)]
#[command(name = "vista", version, about = "Building and room tour viewer")]
struct Cli {
    /// TOML configuration file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the model of the building viewer or the room tour
    #[arg(short, long)]
    model: Option<String>,

    /// View to open
    #[arg(value_enum, default_value_t = ViewMode::Model)]
    mode: ViewMode,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(model) = cli.model {
        match cli.mode {
            ViewMode::Model => config.model_viewer.model = model,
            ViewMode::Room => config.room_tour.model = model,
            ViewMode::Panorama => log::warn!("--model has no effect in panorama mode"),
        }
    }

    let app = VistaApp::new(config, cli.mode).context("failed to start viewer")?;
    app.run().context("viewer stopped with an error")?;
    Ok(())
}
