use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};
use log::info;
use rusttype::{point, Font, Scale};

use crate::error::{Error, Result};

// ======== Fonts ========

/// A typeface at a fixed pixel size.
pub struct FontFace {
    font: Font<'static>,
    scale: Scale,
}

/// Ink bounding box of a laid-out string, relative to its origin on the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl TextBounds {
    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y).max(0) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

impl FontFace {
    pub fn from_bytes(data: Vec<u8>, px: f32) -> Result<Self> {
        let font = Font::try_from_vec(data).ok_or_else(|| Error::Font("not a TrueType/OpenType font".into()))?;
        Ok(FontFace { font, scale: Scale::uniform(px) })
    }

    pub fn load(path: &Path, px: f32) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| Error::Font(format!("{}: {}", path.display(), e)))?;
        let face = Self::from_bytes(data, px).map_err(|_| Error::Font(format!("{}: not a usable font", path.display())))?;
        info!("Loaded font {} at {}px", path.display(), px);
        Ok(face)
    }

    /// Distance from the ascender line down to the baseline, whole pixels.
    pub fn ascent(&self) -> i32 {
        self.font.v_metrics(self.scale).ascent.round() as i32
    }

    /// Depth of the lowest descender below the baseline, whole pixels.
    pub fn descent(&self) -> i32 {
        self.font.v_metrics(self.scale).descent.abs().ceil() as i32
    }

    pub fn measure(&self, text: &str) -> TextBounds {
        let mut bounds: Option<TextBounds> = None;
        for g in self.font.layout(text, self.scale, point(0.0, 0.0)) {
            if let Some(bb) = g.pixel_bounding_box() {
                bounds = Some(match bounds {
                    None => TextBounds { min_x: bb.min.x, min_y: bb.min.y, max_x: bb.max.x, max_y: bb.max.y },
                    Some(b) => TextBounds {
                        min_x: b.min_x.min(bb.min.x),
                        min_y: b.min_y.min(bb.min.y),
                        max_x: b.max_x.max(bb.max.x),
                        max_y: b.max_y.max(bb.max.y),
                    },
                });
            }
        }
        bounds.unwrap_or_default()
    }

    /// Draw `text` with its origin at (`x`, `baseline`), blending glyph coverage
    /// over the canvas. Pixels falling outside the canvas are dropped.
    pub fn draw(&self, canvas: &mut RgbImage, x: i32, baseline: i32, ink: Rgb<u8>, text: &str) {
        let (w, h) = canvas.dimensions();
        for g in self.font.layout(text, self.scale, point(x as f32, baseline as f32)) {
            let Some(bb) = g.pixel_bounding_box() else { continue };
            g.draw(|gx, gy, v| {
                let px = bb.min.x + gx as i32;
                let py = bb.min.y + gy as i32;
                if px < 0 || py < 0 || px as u32 >= w || py as u32 >= h {
                    return;
                }
                let a = (v.clamp(0.0, 1.0) * 255.0).round() as u16;
                if a == 0 {
                    return;
                }
                let dst = canvas.get_pixel_mut(px as u32, py as u32);
                for c in 0..3 {
                    dst.0[c] = blend(ink.0[c], dst.0[c], a);
                }
            });
        }
    }
}

/// The two typefaces every badge uses.
pub struct FontSet {
    pub large: FontFace,
    pub small: FontFace,
}

// ======== Logo ========

/// Load a logo and shrink it to fit `max_w` x `max_h`, keeping its aspect ratio.
pub fn prepare_logo(path: &Path, max_w: u32, max_h: u32) -> Result<RgbaImage> {
    let img = image::open(path).map_err(|e| Error::Asset { path: path.display().to_string(), reason: e.to_string() })?;
    let logo = shrink_to_fit(img.to_rgba8(), max_w, max_h);
    info!("Prepared logo {} ({}x{})", path.display(), logo.width(), logo.height());
    Ok(logo)
}

pub fn shrink_to_fit(img: RgbaImage, max_w: u32, max_h: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    let (nw, nh) = fit_within(w, h, max_w, max_h);
    if (nw, nh) == (w, h) {
        img
    } else {
        imageops::resize(&img, nw, nh, FilterType::CatmullRom)
    }
}

/// Thumbnail sizing: never enlarges, keeps the aspect ratio, rounds the
/// dependent side to whichever neighbouring integer distorts the least.
pub fn fit_within(w: u32, h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if w == 0 || h == 0 {
        return (w, h);
    }
    let bx = max_w.min(w).max(1);
    let by = max_h.min(h).max(1);
    let aspect = w as f64 / h as f64;

    let (x, y) = if bx as f64 / by as f64 >= aspect {
        let x = round_aspect(by as f64 * aspect, |n| (aspect - n / by as f64).abs());
        (x, by)
    } else {
        let y = round_aspect(bx as f64 / aspect, |n| if n == 0.0 { 0.0 } else { (aspect - bx as f64 / n).abs() });
        (bx, y)
    };
    if x >= w && y >= h {
        (w, h)
    } else {
        (x, y)
    }
}

fn round_aspect(n: f64, key: impl Fn(f64) -> f64) -> u32 {
    let (lo, hi) = (n.floor(), n.ceil());
    let best = if key(hi) < key(lo) { hi } else { lo };
    (best as u32).max(1)
}

/// Paste `over` onto `canvas` at (`x`, `y`) using its own alpha as the mask.
pub fn paste_with_alpha(canvas: &mut RgbImage, over: &RgbaImage, x: i64, y: i64) {
    let (cw, ch) = canvas.dimensions();
    for (ox, oy, p) in over.enumerate_pixels() {
        let a = p.0[3] as u16;
        if a == 0 {
            continue;
        }
        let bx = x + ox as i64;
        let by = y + oy as i64;
        if bx < 0 || by < 0 || bx >= cw as i64 || by >= ch as i64 {
            continue;
        }
        let dst = canvas.get_pixel_mut(bx as u32, by as u32);
        for c in 0..3 {
            dst.0[c] = blend(p.0[c], dst.0[c], a);
        }
    }
}

// ======== Monochrome conversion ========

/// ITU-R 601 luma, same fixed-point weights common imaging libraries use.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// Turn an original logo into a black/white logo on white: anything that is
/// not pure white becomes black, then the original alpha decides how much of
/// it covers the white background.
pub fn convert_logo_to_bw(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut out = RgbImage::from_pixel(w, h, Rgb([255, 255, 255]));
    for (x, y, p) in rgba.enumerate_pixels() {
        let [r, g, b, a] = p.0;
        let bw = if luma(r, g, b) < 255 { 0 } else { 255 };
        let v = blend(bw, 255, a as u16);
        out.put_pixel(x, y, Rgb([v, v, v]));
    }
    out
}

/// Composite RGBA onto white, dropping transparency.
pub fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    let mut out = RgbImage::from_pixel(rgba.width(), rgba.height(), Rgb([255, 255, 255]));
    paste_with_alpha(&mut out, &rgba, 0, 0);
    out
}

fn blend(src: u8, dst: u8, alpha: u16) -> u8 {
    ((src as u32 * alpha as u32 + dst as u32 * (255 - alpha as u32) + 127) / 255) as u8
}

pub fn solid(width: u32, height: u32, colour: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(colour))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn fit_never_enlarges() {
        assert_eq!(fit_within(100, 50, 981, 403), (100, 50));
    }

    #[test]
    fn fit_keeps_aspect() {
        assert_eq!(fit_within(2000, 1000, 981, 403), (806, 403));
        assert_eq!(fit_within(1000, 1000, 981, 403), (403, 403));
        assert_eq!(fit_within(4000, 500, 981, 403), (981, 123));
    }

    #[test]
    fn fit_shrinks_only_the_needed_side() {
        let (w, h) = fit_within(3000, 300, 981, 403);
        assert_eq!(w, 981);
        assert!(h <= 403);
        assert_eq!(h, 98);
    }

    #[test]
    fn luma_extremes() {
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(250, 250, 250), 250);
    }

    #[test]
    fn paste_respects_mask_and_bounds() {
        let mut canvas = solid(4, 4, [255, 255, 255]);
        let mut logo = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 0]));
        logo.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        logo.put_pixel(2, 2, Rgba([0, 0, 0, 255]));
        paste_with_alpha(&mut canvas, &logo, 2, 2);
        assert_eq!(canvas.get_pixel(2, 2), &Rgb([0, 0, 0]));
        // transparent logo pixels leave the background alone
        assert_eq!(canvas.get_pixel(3, 2), &Rgb([255, 255, 255]));
        // (4, 4) is off-canvas and silently clipped
        assert_eq!(canvas.get_pixel(3, 3), &Rgb([255, 255, 255]));
    }

    #[test]
    fn magenta_logo_becomes_pure_black_and_white() {
        let mut src = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
        for y in 2..6 {
            for x in 2..6 {
                src.put_pixel(x, y, Rgba([255, 0, 255, 255]));
            }
        }
        let out = convert_logo_to_bw(&DynamicImage::ImageRgba8(src));
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0] || p.0 == [255, 255, 255]));
        assert_eq!(out.get_pixel(3, 3).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn transparent_logo_areas_become_white() {
        let src = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0]));
        let out = convert_logo_to_bw(&DynamicImage::ImageRgba8(src));
        assert!(out.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn flatten_blends_onto_white() {
        let src = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0]));
        let out = flatten_on_white(&DynamicImage::ImageRgba8(src));
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255]);
    }
}
