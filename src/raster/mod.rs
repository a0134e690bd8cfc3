//! Brother QL raster instructions.
//!
//! - Flattens, rotates and pads label images to the print head width
//! - Black/white by threshold or Floyd-Steinberg, or black/red separation
//! - Emits the `ESC i` command set plus `g`/`w` raster lines, optionally PackBits-compressed
//! - Quietly leaves out commands the selected model does not understand

use std::fmt;
use std::str::FromStr;

use image::imageops::{self, BiLevel, FilterType};
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graphics::{flatten_on_white, luma};

pub mod models;
pub mod packbits;
pub mod status;

pub use models::{FormFactor, LabelSpec, Model, LABELS, MODELS};
pub use status::PrinterStatus;

// ======== Options ========

/// Counter-clockwise rotation applied before conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    /// Die-cut only: turn the image when it is the printable area on its side
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "0")]
    None,
    #[serde(rename = "90")]
    Quarter,
    #[serde(rename = "180")]
    Half,
    #[serde(rename = "270")]
    ThreeQuarter,
}

impl Rotation {
    pub fn apply(self, img: RgbImage) -> RgbImage {
        match self {
            Rotation::Auto | Rotation::None => img,
            Rotation::Quarter => imageops::rotate270(&img),
            Rotation::Half => imageops::rotate180(&img),
            Rotation::ThreeQuarter => imageops::rotate90(&img),
        }
    }
}

impl FromStr for Rotation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Rotation::Auto),
            "0" => Ok(Rotation::None),
            "90" => Ok(Rotation::Quarter),
            "180" => Ok(Rotation::Half),
            "270" => Ok(Rotation::ThreeQuarter),
            other => Err(format!("rotation must be auto, 0, 90, 180 or 270 (got '{}')", other)),
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rotation::Auto => "auto",
            Rotation::None => "0",
            Rotation::Quarter => "90",
            Rotation::Half => "180",
            Rotation::ThreeQuarter => "270",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvertOptions {
    pub rotation: Rotation,
    /// Percent, 0..=100; lower keeps fewer pixels black
    pub threshold: u8,
    pub dither: bool,
    pub compress: bool,
    pub red: bool,
    pub dpi_600: bool,
    pub cut: bool,
    pub hq: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            rotation: Rotation::Auto,
            threshold: 70,
            dither: false,
            compress: false,
            red: false,
            dpi_600: false,
            cut: true,
            hq: true,
        }
    }
}

/// Gray level (after inversion) from which a pixel becomes a dot.
pub fn threshold_level(threshold: u8) -> u8 {
    let t = (100.0 - threshold.min(100) as f64) / 100.0 * 255.0;
    t.clamp(0.0, 255.0) as u8
}

// ======== Converter ========

pub struct RasterConverter {
    model: &'static Model,
    label: &'static LabelSpec,
    options: ConvertOptions,
}

impl RasterConverter {
    pub fn new(model: &str, label: &str, options: ConvertOptions) -> Result<Self> {
        let model = Model::find(model).ok_or_else(|| Error::Config(format!("unknown printer model '{}'", model)))?;
        let label = LabelSpec::find(label).ok_or_else(|| Error::Config(format!("unknown label '{}'", label)))?;
        if options.threshold > 100 {
            return Err(Error::Config(format!("threshold {} is not a percentage", options.threshold)));
        }
        if options.red && !model.two_color {
            return Err(Error::Conversion(format!("{} cannot print red", model.name)));
        }
        Ok(RasterConverter { model, label, options })
    }

    pub fn model(&self) -> &'static Model {
        self.model
    }

    pub fn label(&self) -> &'static LabelSpec {
        self.label
    }

    /// Size a die-cut image must have after rotation (width, height).
    pub fn expected_size(&self) -> (u32, u32) {
        let (w, h) = self.label.dots_printable;
        if self.options.dpi_600 {
            (w * 2, h * 2)
        } else {
            (w, h)
        }
    }

    /// One print job: every image becomes one page.
    pub fn convert(&self, images: &[DynamicImage]) -> Result<Vec<u8>> {
        let model = self.model;
        let opts = &self.options;
        let mut buf = Vec::new();

        if model.mode_setting {
            switch_to_raster(&mut buf);
        }
        invalidate(&mut buf, model.invalidate_bytes);
        initialize(&mut buf);
        if model.mode_setting {
            switch_to_raster(&mut buf);
        }

        let compress = opts.compress && model.compression;
        if opts.compress && !compress {
            debug!("{} does not support compression, sending plain raster lines", model.name);
        }

        for (page, img) in images.iter().enumerate() {
            let placed = self.place(img)?;
            let layers = self.separate(&placed);

            status_request(&mut buf);
            media_and_quality(&mut buf, self.label, placed.height(), page == 0, opts.hq);
            if opts.cut {
                if model.cutting {
                    autocut(&mut buf, true);
                    cut_every(&mut buf, 1);
                } else {
                    debug!("{} has no cutter, skipping cut commands", model.name);
                }
            }
            if model.expanded_mode {
                expanded_mode(&mut buf, opts.cut, opts.dpi_600, opts.red);
            }
            margins(&mut buf, self.label.feed_margin);
            if compress {
                compression(&mut buf, true);
            }
            raster_lines(&mut buf, &layers, model.bytes_per_row, compress)?;
            print(&mut buf, page + 1 == images.len());
        }
        debug!("Raster job: {} page(s), {} bytes", images.len(), buf.len());
        Ok(buf)
    }

    // rotate/scale to the printable area and pad to the print head width
    fn place(&self, img: &DynamicImage) -> Result<RgbImage> {
        let opts = &self.options;
        let mut im = flatten_on_white(img);
        let (pw, _) = self.label.dots_printable;

        if self.label.is_die_cut() {
            let expected = self.expected_size();
            im = match opts.rotation {
                Rotation::Auto if im.dimensions() == (expected.1, expected.0) => Rotation::Quarter.apply(im),
                r => r.apply(im),
            };
            if im.dimensions() != expected {
                return Err(Error::Conversion(format!(
                    "bad image dimensions {}x{} for label {}, expecting {}x{}",
                    im.width(), im.height(), self.label.id, expected.0, expected.1
                )));
            }
            if opts.dpi_600 {
                im = imageops::resize(&im, im.width() / 2, im.height(), FilterType::Triangle);
            }
        } else {
            if !matches!(opts.rotation, Rotation::Auto | Rotation::None) {
                im = opts.rotation.apply(im);
            }
            if opts.dpi_600 {
                im = imageops::resize(&im, im.width() / 2, im.height(), FilterType::Triangle);
            }
            if im.width() != pw {
                let h = (pw as f64 / im.width() as f64 * im.height() as f64) as u32;
                warn!("Resizing {}x{} image to {}x{} to fit label {}", im.width(), im.height(), pw, h, self.label.id);
                im = imageops::resize(&im, pw, h.max(1), FilterType::Lanczos3);
            }
        }
        self.pad(im)
    }

    fn pad(&self, im: RgbImage) -> Result<RgbImage> {
        let device_w = self.model.pixel_width();
        let margin = self.label.right_margin + self.model.extra_right_margin;
        let x = device_w
            .checked_sub(im.width() + margin)
            .ok_or_else(|| Error::Conversion(format!("label {} is too wide for {}", self.label.id, self.model.name)))?;
        let mut out = RgbImage::from_pixel(device_w, im.height(), image::Rgb([255, 255, 255]));
        imageops::replace(&mut out, &im, x as i64, 0);
        Ok(out)
    }

    // dot layers, 255 = dot; black only, or black then red
    fn separate(&self, im: &RgbImage) -> Vec<GrayImage> {
        let t = threshold_level(self.options.threshold);
        if !self.options.red {
            let mut inv = GrayImage::from_fn(im.width(), im.height(), |x, y| {
                let [r, g, b] = im.get_pixel(x, y).0;
                Luma([255 - luma(r, g, b)])
            });
            if self.options.dither {
                imageops::dither(&mut inv, &BiLevel);
            } else {
                binarize(&mut inv, t);
            }
            return vec![inv];
        }

        let black = layer(im, t, |_, _, v| v < 80);
        let red = layer(im, t, |h, s, v| (h < 40 || h > 210) && s > 100 && v > 80);
        vec![black, red]
    }
}

fn binarize(img: &mut GrayImage, t: u8) {
    for p in img.pixels_mut() {
        p.0[0] = if p.0[0] < t { 0 } else { 255 };
    }
}

// pixels passing `keep` stay as they are, the rest turn white; then invert + threshold
fn layer(im: &RgbImage, t: u8, keep: impl Fn(u8, u8, u8) -> bool) -> GrayImage {
    let mut out = GrayImage::from_fn(im.width(), im.height(), |x, y| {
        let [r, g, b] = im.get_pixel(x, y).0;
        let (h, s, v) = hsv(r, g, b);
        let l = if keep(h, s, v) { luma(r, g, b) } else { 255 };
        Luma([255 - l])
    });
    binarize(&mut out, t);
    out
}

/// HSV with every component scaled to 0..=255.
pub fn hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (rf, gf, bf) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let maxc = rf.max(gf).max(bf);
    let minc = rf.min(gf).min(bf);
    let v = (maxc * 255.0) as u8;
    if maxc == minc {
        return (0, 0, v);
    }
    let cr = maxc - minc;
    let s = cr / maxc;
    let rc = (maxc - rf) / cr;
    let gc = (maxc - gf) / cr;
    let bc = (maxc - bf) / cr;
    let h = if rf == maxc {
        bc - gc
    } else if gf == maxc {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };
    let h = (h / 6.0 + 1.0).rem_euclid(1.0);
    ((h * 255.0).clamp(0.0, 255.0) as u8, (s * 255.0).clamp(0.0, 255.0) as u8, v)
}

// ======== Commands ========

fn invalidate(buf: &mut Vec<u8>, n: usize) {
    buf.resize(buf.len() + n, 0x00);
}

fn initialize(buf: &mut Vec<u8>) {
    buf.extend_from_slice(b"\x1B\x40");
}

fn switch_to_raster(buf: &mut Vec<u8>) {
    buf.extend_from_slice(b"\x1B\x69\x61\x01");
}

fn status_request(buf: &mut Vec<u8>) {
    buf.extend_from_slice(b"\x1B\x69\x53");
}

fn media_and_quality(buf: &mut Vec<u8>, label: &LabelSpec, lines: u32, first_page: bool, hq: bool) {
    // media type, width and length are always sent
    let valid = 0x80 | 0x02 | 0x04 | 0x08 | (u8::from(hq) << 6);
    buf.extend_from_slice(b"\x1B\x69\x7A");
    buf.push(valid);
    buf.push(label.media_type());
    buf.push(label.tape_mm.0);
    buf.push(if label.is_die_cut() { label.tape_mm.1 } else { 0 });
    buf.extend_from_slice(&lines.to_le_bytes());
    buf.push(if first_page { 0 } else { 1 });
    buf.push(0x00);
}

fn autocut(buf: &mut Vec<u8>, on: bool) {
    buf.extend_from_slice(b"\x1B\x69\x4D");
    buf.push(u8::from(on) << 6);
}

fn cut_every(buf: &mut Vec<u8>, n: u8) {
    buf.extend_from_slice(b"\x1B\x69\x41");
    buf.push(n);
}

fn expanded_mode(buf: &mut Vec<u8>, cut_at_end: bool, dpi_600: bool, two_color: bool) {
    buf.extend_from_slice(b"\x1B\x69\x4B");
    buf.push(u8::from(two_color) | u8::from(cut_at_end) << 3 | u8::from(dpi_600) << 6);
}

fn margins(buf: &mut Vec<u8>, dots: u16) {
    buf.extend_from_slice(b"\x1B\x69\x64");
    buf.extend_from_slice(&dots.to_le_bytes());
}

fn compression(buf: &mut Vec<u8>, on: bool) {
    buf.push(b'M');
    buf.push(u8::from(on) << 1);
}

fn raster_lines(buf: &mut Vec<u8>, layers: &[GrayImage], bytes_per_row: usize, compress: bool) -> Result<()> {
    let width = layers[0].width();
    if width as usize != bytes_per_row * 8 {
        return Err(Error::Conversion(format!("raster width {} does not match print head ({} dots)", width, bytes_per_row * 8)));
    }
    let two_color = layers.len() > 1;
    for y in 0..layers[0].height() {
        for (i, layer) in layers.iter().enumerate() {
            let row = pack_row(layer, y, bytes_per_row);
            let row = if compress { packbits::encode(&row) } else { row };
            match (two_color, i) {
                (false, _) => buf.extend_from_slice(b"g\x00"),
                (true, 0) => buf.extend_from_slice(b"w\x01"),
                (true, _) => buf.extend_from_slice(b"w\x02"),
            }
            buf.push(row.len() as u8);
            buf.extend_from_slice(&row);
        }
    }
    Ok(())
}

// mirrored left-right, MSB first, 1 = dot
fn pack_row(layer: &GrayImage, y: u32, bytes_per_row: usize) -> Vec<u8> {
    let w = layer.width();
    let mut out = vec![0u8; bytes_per_row];
    for x in 0..w {
        if layer.get_pixel(w - 1 - x, y).0[0] == 255 {
            out[x as usize / 8] |= 0x80 >> (x % 8);
        }
    }
    out
}

fn print(buf: &mut Vec<u8>, last_page: bool) {
    buf.push(if last_page { 0x1A } else { 0x0C });
}
