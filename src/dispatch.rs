use std::path::PathBuf;

use image::{imageops, DynamicImage, RgbImage};
use log::{error, info};

use crate::builder::LabelRenderer;
use crate::config::{PreviewConfig, PreviewMethod};
use crate::error::Result;
use crate::participants::Participant;
use crate::preview::{compose_grid, save_preview, scratch_path, sheet_path, show, GridLayout};
use crate::printer::Transmitter;
use crate::raster::RasterConverter;

const GRID_FILE: &str = "preview_grid.png";

/// Where rendered badges go.
pub trait LabelSink {
    fn accept(&mut self, participant: &Participant, label: RgbImage) -> Result<()>;

    /// Called once after the last badge.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

// ======== Preview ========

pub struct PreviewSink {
    config: PreviewConfig,
    background: [u8; 3],
    collected: Vec<RgbImage>,
    save_dir_ready: bool,
    sheet: Option<PathBuf>,
    shown: usize,
}

impl PreviewSink {
    pub fn new(config: PreviewConfig, background: [u8; 3]) -> Self {
        PreviewSink { config, background, collected: Vec::new(), save_dir_ready: false, sheet: None, shown: 0 }
    }

    /// Badges held back for the contact sheet.
    pub fn collected(&self) -> &[RgbImage] {
        &self.collected
    }

    /// Contact sheet written by `finish`, if any.
    pub fn sheet(&self) -> Option<&PathBuf> {
        self.sheet.as_ref()
    }

    fn save(&mut self, participant: &Participant, label: &RgbImage) -> Result<Option<PathBuf>> {
        let Some(dir) = self.config.save_dir.clone() else {
            return Ok(None);
        };
        if !self.save_dir_ready {
            std::fs::create_dir_all(&dir)?;
            self.save_dir_ready = true;
        }
        save_preview(&dir, label, &participant.name).map(Some)
    }
}

impl LabelSink for PreviewSink {
    fn accept(&mut self, participant: &Participant, label: RgbImage) -> Result<()> {
        let saved = self.save(participant, &label)?;
        match self.config.method {
            PreviewMethod::Single => {
                if self.config.open {
                    let path = match saved {
                        Some(p) => p,
                        None => {
                            let p = scratch_path(self.shown, &participant.name)?;
                            label.save(&p)?;
                            p
                        }
                    };
                    show(&path);
                    self.shown += 1;
                }
            }
            PreviewMethod::Grid => self.collected.push(label),
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let Some(layout) = GridLayout::new(self.collected.len(), self.config.columns) else {
            return Ok(());
        };
        let sheet = compose_grid(&self.collected, layout, self.config.tile_scale, self.config.gutter, self.background);
        let path = sheet_path(self.config.save_dir.as_deref(), GRID_FILE)?;
        sheet.save(&path)?;
        info!("Preview sheet of {} labels at {}", self.collected.len(), path.display());
        if self.config.open {
            show(&path);
        }
        self.sheet = Some(path);
        Ok(())
    }
}

// ======== Print ========

/// Converts each badge to a raster job and sends it at once.
pub struct PrintSink<T: Transmitter> {
    converter: RasterConverter,
    transmitter: T,
}

impl<T: Transmitter> PrintSink<T> {
    pub fn new(converter: RasterConverter, transmitter: T) -> Self {
        PrintSink { converter, transmitter }
    }

    pub fn transmitter(&self) -> &T {
        &self.transmitter
    }
}

impl<T: Transmitter> LabelSink for PrintSink<T> {
    fn accept(&mut self, participant: &Participant, label: RgbImage) -> Result<()> {
        // badges are landscape, the tape runs portrait
        let upright = DynamicImage::ImageRgb8(imageops::rotate270(&label));
        let job = self.converter.convert(std::slice::from_ref(&upright))?;
        self.transmitter.send(&job)?;
        info!("Label printed: {}", participant.name);
        Ok(())
    }
}

/// Render and hand every participant to `sink` in order. Stops at the first failure.
pub fn run_batch(renderer: &LabelRenderer, participants: &[Participant], sink: &mut dyn LabelSink) -> Result<usize> {
    for (i, participant) in participants.iter().enumerate() {
        let label = renderer.render(participant);
        if let Err(e) = sink.accept(participant, label) {
            error!("Stopped at label {} of {} ({}): {}", i + 1, participants.len(), participant.name, e);
            return Err(e);
        }
    }
    sink.finish()?;
    Ok(participants.len())
}
