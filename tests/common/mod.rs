#![allow(dead_code)]

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use sha2::{Digest, Sha256};

use badge_printer::config::LayoutConfig;
use badge_printer::error::{Error, Result};
use badge_printer::graphics::{FontFace, FontSet};
use badge_printer::printer::Transmitter;
use badge_printer::LabelRenderer;

const BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");
const REGULAR: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

pub const LOGO_W: u32 = 240;
pub const LOGO_H: u32 = 120;

pub fn fonts(layout: &LayoutConfig) -> FontSet {
    FontSet {
        large: FontFace::from_bytes(BOLD.to_vec(), layout.large_font.size).unwrap(),
        small: FontFace::from_bytes(REGULAR.to_vec(), layout.small_font.size).unwrap(),
    }
}

/// Black bar with a transparent border, sized well inside the logo box.
pub fn logo() -> RgbaImage {
    RgbaImage::from_fn(LOGO_W, LOGO_H, |x, y| {
        if x < 10 || y < 10 || x >= LOGO_W - 10 || y >= LOGO_H - 10 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([0, 0, 0, 255])
        }
    })
}

pub fn renderer() -> LabelRenderer {
    renderer_with(LayoutConfig::default())
}

pub fn renderer_with(layout: LayoutConfig) -> LabelRenderer {
    let fonts = fonts(&layout);
    LabelRenderer::new(layout, fonts, logo()).unwrap()
}

pub fn digest(img: &RgbImage) -> String {
    hex::encode(Sha256::digest(img.as_raw()))
}

/// Bounding box (x0, y0, x1, y1), exclusive end, of non-white pixels inside a region.
pub fn ink_box(img: &RgbImage, x0: u32, y0: u32, x1: u32, y1: u32) -> Option<(u32, u32, u32, u32)> {
    let mut found: Option<(u32, u32, u32, u32)> = None;
    for y in y0..y1.min(img.height()) {
        for x in x0..x1.min(img.width()) {
            if *img.get_pixel(x, y) != Rgb([255, 255, 255]) {
                found = Some(match found {
                    None => (x, y, x + 1, y + 1),
                    Some((a, b, c, d)) => (a.min(x), b.min(y), c.max(x + 1), d.max(y + 1)),
                });
            }
        }
    }
    found
}

/// Keeps every job it is sent.
#[derive(Default)]
pub struct Recorder {
    pub jobs: Vec<Vec<u8>>,
}

impl Transmitter for Recorder {
    fn send(&mut self, instructions: &[u8]) -> Result<()> {
        self.jobs.push(instructions.to_vec());
        Ok(())
    }
}

/// Accepts `ok` jobs, then fails every send.
pub struct Flaky {
    pub ok: usize,
    pub sent: usize,
    pub attempts: usize,
}

impl Transmitter for Flaky {
    fn send(&mut self, _instructions: &[u8]) -> Result<()> {
        self.attempts += 1;
        if self.sent == self.ok {
            return Err(Error::Transport("paper jam".into()));
        }
        self.sent += 1;
        Ok(())
    }
}
