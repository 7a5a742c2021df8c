//! Command-line front end: train a model on a CSV of bars or run an existing
//! model over one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;

use ohlc_nn::{load_bars, ModelContext, TrainConfig};

#[derive(Parser)]
#[command(name = "ohlc-nn")]
#[command(about = "Train and run a feed-forward network on OHLC bars", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a network, train it on a bar file and save the model
    Train {
        /// CSV with open, close, high, low columns
        #[arg(long)]
        bars: PathBuf,

        /// Where to write the trained model
        #[arg(long)]
        model: PathBuf,

        /// Network input width
        #[arg(long, default_value_t = 4)]
        inputs: usize,

        /// Comma-separated `width:Activation` list, last entry is the output layer
        #[arg(long, default_value = "3:ReLU,1:Linear")]
        layers: String,

        /// MinMax or ZScore
        #[arg(long, default_value = "MinMax")]
        normalization: String,

        #[arg(long, default_value_t = 1)]
        epochs: usize,

        #[arg(long, default_value_t = 0.1)]
        learning_rate: f64,

        #[arg(long, default_value = "1.0")]
        model_version: String,

        /// Optional CSV of indicator series, one named column each
        #[arg(long)]
        indicators: Option<PathBuf>,
    },

    /// Load a model and print one prediction per bar
    Predict {
        #[arg(long)]
        bars: PathBuf,

        #[arg(long)]
        model: PathBuf,

        /// Optional CSV of indicator series, one named column each
        #[arg(long)]
        indicators: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Train {
            bars,
            model,
            inputs,
            layers,
            normalization,
            epochs,
            learning_rate,
            model_version,
            indicators,
        } => {
            let layers = parse_layers(&layers)?;
            let output_width = layers.last().map(|(width, _)| *width).ok_or_else(|| anyhow!("no layers given"))?;

            let mut context = ModelContext::new();
            context.try_set_network_parameters(inputs, output_width, &normalization, &model_version)?;
            for (width, activation) in &layers {
                context.try_add_layer(*width, activation)?;
            }
            context.set_train_config(TrainConfig::new(epochs, learning_rate));

            let bars = load_bars(&bars).with_context(|| format!("reading bars from {}", bars.display()))?;
            let indicators = read_indicators(indicators.as_deref())?;
            context.try_process_data(&bars, &indicators, !indicators.is_empty(), true)?;
            context.try_save_model(&model).with_context(|| format!("writing model to {}", model.display()))?;
            info!("model written to {}", model.display());
        }
        Commands::Predict { bars, model, indicators } => {
            let mut context = ModelContext::new();
            context
                .try_load_model(&model)
                .with_context(|| format!("reading model from {}", model.display()))?;

            let bars = load_bars(&bars).with_context(|| format!("reading bars from {}", bars.display()))?;
            let indicators = read_indicators(indicators.as_deref())?;
            for value in context.try_process_data(&bars, &indicators, !indicators.is_empty(), false)? {
                println!("{}", value);
            }
        }
    }

    Ok(())
}

fn parse_layers(list: &str) -> Result<Vec<(usize, String)>> {
    let mut layers = Vec::new();
    for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (width, activation) = entry
            .split_once(':')
            .ok_or_else(|| anyhow!("layer '{}' is not in width:Activation form", entry))?;
        let width: usize = width
            .trim()
            .parse()
            .with_context(|| format!("bad layer width in '{}'", entry))?;
        layers.push((width, activation.trim().to_string()));
    }
    if layers.is_empty() {
        bail!("no layers given");
    }
    Ok(layers)
}

fn read_indicators(path: Option<&Path>) -> Result<BTreeMap<String, Vec<f64>>> {
    let mut series: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let Some(path) = path else {
        return Ok(series);
    };

    let mut reader = csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    let headers = reader.headers()?.clone();
    for record in reader.records() {
        let record = record?;
        for (name, field) in headers.iter().zip(record.iter()) {
            let value: f64 = field
                .trim()
                .parse()
                .with_context(|| format!("indicator '{}' has non-numeric value '{}'", name, field))?;
            series.entry(name.to_string()).or_default().push(value);
        }
    }
    Ok(series)
}
