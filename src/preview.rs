use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbImage;
use log::{info, warn};

use crate::error::{Error, Result};
use crate::graphics::solid;

/// `Alex Doe` -> `alex-doe.png`; names with nothing sluggable become `label.png`.
pub fn slug_filename(name: &str) -> String {
    let slug = slug::slugify(name);
    if slug.is_empty() {
        "label.png".to_string()
    } else {
        format!("{}.png", slug)
    }
}

/// Write one badge as PNG into `dir`. Same-slug names overwrite each other.
pub fn save_preview(dir: &Path, label: &RgbImage, name: &str) -> Result<PathBuf> {
    let path = dir.join(slug_filename(name));
    label.save(&path)?;
    info!("Saved preview {}", path.display());
    Ok(path)
}

/// Contact sheet shape for `count` tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
}

impl GridLayout {
    pub fn new(count: usize, max_columns: u32) -> Option<Self> {
        if count == 0 || max_columns == 0 {
            return None;
        }
        let count = count as u32;
        let columns = max_columns.min(count);
        Some(GridLayout { columns, rows: count.div_ceil(columns) })
    }
}

/// Tile badges row-major, each scaled by `scale`, `gutter` px apart and around the edge.
pub fn compose_grid(images: &[RgbImage], layout: GridLayout, scale: f32, gutter: u32, background: [u8; 3]) -> RgbImage {
    let Some(first) = images.first() else {
        return solid(gutter.max(1), gutter.max(1), background);
    };
    let tw = ((first.width() as f32 * scale).round() as u32).max(1);
    let th = ((first.height() as f32 * scale).round() as u32).max(1);

    let sheet_w = layout.columns * tw + (layout.columns + 1) * gutter;
    let sheet_h = layout.rows * th + (layout.rows + 1) * gutter;
    let mut sheet = solid(sheet_w, sheet_h, background);

    for (i, img) in images.iter().enumerate() {
        let (col, row) = (i as u32 % layout.columns, i as u32 / layout.columns);
        if row >= layout.rows {
            break;
        }
        let tile = if img.dimensions() == (tw, th) { img.clone() } else { imageops::resize(img, tw, th, FilterType::Triangle) };
        let x = gutter + col * (tw + gutter);
        let y = gutter + row * (th + gutter);
        imageops::replace(&mut sheet, &tile, x as i64, y as i64);
    }
    sheet
}

/// Hand an image to the desktop viewer. A viewer that fails to start only warns.
pub fn show(path: &Path) {
    if let Err(e) = opener::open(path) {
        warn!("Could not open {} in a viewer: {}", path.display(), e);
    }
}

/// Save into `dir` (created if missing) or the temp dir when none is given.
pub fn sheet_path(dir: Option<&Path>, file_name: &str) -> Result<PathBuf> {
    let dir = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::temp_dir(),
    };
    std::fs::create_dir_all(&dir).map_err(|e| Error::Asset { path: dir.display().to_string(), reason: e.to_string() })?;
    Ok(dir.join(file_name))
}

/// Throwaway file for a badge that is only shown, never saved: numbered by
/// row so same-slug names in one run never share a file.
pub fn scratch_path(index: usize, name: &str) -> Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("badge-printer-{}", std::process::id()));
    sheet_path(Some(&dir), &format!("{:04}-{}", index + 1, slug_filename(name)))
}
