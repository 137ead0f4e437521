pub(crate) mod cancel;
pub(crate) mod colors;
pub(crate) mod config;
pub(crate) mod console;
pub(crate) mod effects;
pub(crate) mod intervaltimer;
pub(crate) mod olaoutput;
pub(crate) mod registry;
pub(crate) mod resolver;
pub(crate) mod runner;
pub(crate) mod sink;
pub(crate) mod surface;
pub(crate) mod waveform;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use config::{Config, OutputConfig};
use console::{Console, LookupStyle};
use olaoutput::OlaOutput;
use registry::EffectRegistry;
use resolver::{Inventory, InventoryResolver};
use sink::{DryRunSink, PixelSink, SinkError};
use surface::DeviceSurface;

const DEFAULT_CONFIG: &str = "lagerlicht.toml";

#[derive(Parser)]
#[command(version, about = "Lights up storage bins on an LED strip")]
struct Cli {
    /// Configuration file [default: lagerlicht.toml if present]
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Inventory file mapping items and orders to LEDs
    #[arg(short, long, value_name = "FILE")]
    inventory: Option<PathBuf>,

    /// Number of LEDs on the strip
    #[arg(short = 'n', long, value_name = "COUNT")]
    pixel_count: Option<usize>,

    /// Seconds per breathing cycle
    #[arg(long, value_name = "SECONDS")]
    period: Option<f32>,

    /// Frames per second
    #[arg(long)]
    fps: Option<f32>,

    /// Don't talk to hardware, log frames instead
    #[arg(long)]
    dry_run: bool,

    /// More logging, repeat for trace output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn load_config(args: &Cli) -> Result<Config, config::ConfigError> {
    let mut config = match args.config.as_deref() {
        Some(path) => Config::load(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => Config::load(Path::new(DEFAULT_CONFIG))?,
        None => {
            log::info!("No {DEFAULT_CONFIG} found, using built-in defaults");
            Config::default()
        }
    };

    if let Some(pixel_count) = args.pixel_count {
        config.pixel_count = pixel_count;
    }
    if let Some(period) = args.period {
        config.period_secs = period;
    }
    if let Some(fps) = args.fps {
        config.frame_rate = fps;
    }
    if let Some(inventory) = &args.inventory {
        config.inventory = Some(inventory.clone());
    }
    if args.dry_run {
        config.output = OutputConfig::DryRun;
    }

    config.validate()?;
    Ok(config)
}

fn create_sink(config: &Config) -> Result<Box<dyn PixelSink>, SinkError> {
    match &config.output {
        OutputConfig::Ola { address, universe } => {
            log::debug!(
                "{} LEDs span {} universe(s)",
                config.pixel_count,
                OlaOutput::universe_count(config.pixel_count)
            );
            Ok(Box::new(OlaOutput::new(*address, *universe)?))
        }
        OutputConfig::DryRun => {
            log::info!("Dry run, frames are only logged at trace level");
            Ok(Box::new(DryRunSink::default()))
        }
    }
}

fn load_inventory(config: &Config) -> Result<Inventory, config::ConfigError> {
    match &config.inventory {
        Some(path) => Inventory::load(path),
        None => {
            log::warn!("No inventory file configured, only 'light' commands will work");
            Ok(Inventory::default())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    let config = load_config(&args).context("Cannot set up configuration")?;
    let inventory = load_inventory(&config)?;
    let sink = create_sink(&config).context("Cannot set up LED output")?;

    let surface = Arc::new(DeviceSurface::new(config.pixel_count, sink));
    log::info!("Driving {} LEDs", surface.len());
    let registry = Arc::new(EffectRegistry::new(surface, config.palette()));
    let resolver = InventoryResolver::new(inventory);

    {
        let registry = Arc::clone(&registry);
        ctrlc::set_handler(move || {
            log::info!("Interrupted, turning LEDs off");
            if let Err(err) = registry.shutdown() {
                log::warn!("Final blackout failed: {err}");
            }
            std::process::exit(130);
        })
        .context("Cannot install Ctrl-C handler")?;
    }

    let style = LookupStyle {
        item_color: config.item_color.clone(),
        order_color: config.order_color.clone(),
        timing: config.timing(),
        kind: config.effect,
    };
    let console = Console::new(&registry, &resolver, style);
    console.run(io::stdin().lock(), io::stdout())?;

    registry
        .shutdown()
        .context("Effects stopped, but the strip could not be blanked")?;
    Ok(())
}
