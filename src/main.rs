// badge-printer: render name badges from a CSV and preview or print them

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use badge_printer::config::{Config, OutputMode, PreviewMethod};
use badge_printer::consts::PREVIEW_DIR;
use badge_printer::dispatch::{run_batch, LabelSink, PreviewSink, PrintSink};
use badge_printer::participants::load_participants;
use badge_printer::printer::open_transmitter;
use badge_printer::raster::{RasterConverter, Rotation};
use badge_printer::LabelRenderer;

#[derive(Parser, Debug)]
#[command(author, version, about = "Render participant badges and send them to a Brother QL printer")]
struct Args {
    /// JSON settings file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Participant CSV (Name, T-shirt size, Category)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Black/white logo PNG
    #[arg(short, long)]
    logo: Option<PathBuf>,

    /// Show the badges instead of printing them
    #[arg(long, conflicts_with = "print")]
    preview: bool,

    /// Send the badges to the printer
    #[arg(long)]
    print: bool,

    #[arg(long, value_enum)]
    preview_method: Option<Method>,

    /// Also save every badge as <slug>.png in this directory
    #[arg(long, value_name = "DIR", num_args = 0..=1, default_missing_value = PREVIEW_DIR)]
    save_previews: Option<PathBuf>,

    /// Do not launch an image viewer
    #[arg(long)]
    no_open: bool,

    /// Printer address: usb://0xVVVV:0xPPPP, file:///dev/usb/lp0 or tcp://host[:port]
    #[arg(short, long)]
    printer: Option<String>,

    /// Printer model, e.g. QL-500
    #[arg(long)]
    model: Option<String>,

    /// Label stock, e.g. 39x90 or 62
    #[arg(long)]
    label: Option<String>,

    /// Extra counter-clockwise turn before conversion: auto, 0, 90, 180 or 270
    #[arg(long, value_name = "DEG")]
    rotation: Option<Rotation>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Method {
    Single,
    Grid,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(logo) = self.logo {
            config.logo = logo;
        }
        if self.preview {
            config.mode = OutputMode::Preview;
        } else if self.print {
            config.mode = OutputMode::Print;
        }
        match self.preview_method {
            Some(Method::Single) => config.preview.method = PreviewMethod::Single,
            Some(Method::Grid) => config.preview.method = PreviewMethod::Grid,
            None => {}
        }
        if self.save_previews.is_some() {
            config.preview.save_dir = self.save_previews;
        }
        if self.no_open {
            config.preview.open = false;
        }
        if let Some(device) = self.printer {
            config.printer.device = device;
        }
        if let Some(model) = self.model {
            config.printer.model = model;
        }
        if let Some(label) = self.label {
            config.printer.label = label;
        }
        if let Some(rotation) = self.rotation {
            config.printer.rotation = rotation;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = Args::parse().into_config()?;

    let renderer = LabelRenderer::from_files(config.layout.clone(), &config.logo)
        .context("preparing logo and fonts")?;
    let participants = load_participants(&config.input)
        .with_context(|| format!("reading {}", config.input.display()))?;

    let mut sink: Box<dyn LabelSink> = match config.mode {
        OutputMode::Preview => Box::new(PreviewSink::new(config.preview.clone(), config.layout.background)),
        OutputMode::Print => {
            let p = &config.printer;
            let converter = RasterConverter::new(&p.model, &p.label, p.convert_options())?;
            let transmitter = open_transmitter(&p.device)?;
            Box::new(PrintSink::new(converter, transmitter))
        }
    };

    let done = run_batch(&renderer, &participants, sink.as_mut())?;
    info!("Finished {} label(s)", done);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(args: &[&str]) -> Result<Config> {
        let argv = std::iter::once("badge-printer").chain(args.iter().copied());
        Args::try_parse_from(argv)?.into_config()
    }

    #[test]
    fn flags_override_defaults() {
        let c = config(&["--preview", "--preview-method", "single", "--rotation", "90", "--model", "QL-700", "--no-open"]).unwrap();
        assert_eq!(c.mode, OutputMode::Preview);
        assert_eq!(c.preview.method, PreviewMethod::Single);
        assert_eq!(c.printer.rotation, Rotation::Quarter);
        assert_eq!(c.printer.model, "QL-700");
        assert!(!c.preview.open);
    }

    #[test]
    fn bare_save_previews_uses_the_default_dir() {
        let c = config(&["--save-previews"]).unwrap();
        assert_eq!(c.preview.save_dir, Some(PathBuf::from(PREVIEW_DIR)));
    }

    #[test]
    fn bad_values_are_refused() {
        assert!(config(&["--rotation", "45"]).is_err());
        assert!(config(&["--model", "QL-9"]).is_err());
        assert!(config(&["--preview", "--print"]).is_err());
    }
}
