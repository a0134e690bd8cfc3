// convert-logo: turn a colour logo into the black/white PNG the badges use

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use badge_printer::graphics::convert_logo_to_bw;

#[derive(Parser, Debug)]
#[command(author, version, about = "Convert a logo to black on white for thermal printing")]
struct Args {
    /// Original logo (PNG with transparency works best)
    input: PathBuf,

    /// Where to write the converted PNG
    #[arg(default_value = "logo_bw.png")]
    output: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let img = image::open(&args.input).with_context(|| format!("opening {}", args.input.display()))?;
    let bw = convert_logo_to_bw(&img);
    bw.save(&args.output).with_context(|| format!("writing {}", args.output.display()))?;
    info!("Wrote {} ({}x{})", args.output.display(), bw.width(), bw.height());
    Ok(())
}
