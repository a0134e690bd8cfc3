use std::path::Path;

use image::{Rgb, RgbImage, RgbaImage};

use crate::config::LayoutConfig;
use crate::error::{Error, Result};
use crate::graphics::{paste_with_alpha, prepare_logo, solid, FontFace, FontSet, TextBounds};
use crate::participants::Participant;

/// Ink box of one text field on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }
}

/// Where everything on one badge goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelLayout {
    pub logo: Placement,
    pub name: Placement,
    pub category: Placement,
    pub size: Placement,
    /// Shared baseline of category and size
    pub footer_baseline: i32,
}

// a text field resolved to a drawing origin plus its ink box
struct Field {
    origin_x: i32,
    baseline: i32,
    ink: Placement,
}

/// Composes badges from a blank template, a prepared logo and two fonts.
pub struct LabelRenderer {
    layout: LayoutConfig,
    fonts: FontSet,
    logo: RgbaImage,
    template: RgbImage,
}

impl LabelRenderer {
    pub fn new(layout: LayoutConfig, fonts: FontSet, logo: RgbaImage) -> Result<Self> {
        let b = layout.logo_box();
        if logo.width() > b.width || logo.height() > b.height {
            return Err(Error::Render(format!(
                "logo {}x{} does not fit the {}x{} logo box",
                logo.width(), logo.height(), b.width, b.height
            )));
        }
        let template = solid(layout.width, layout.height, layout.background);
        Ok(LabelRenderer { layout, fonts, logo, template })
    }

    /// Load fonts and logo from the paths in `layout` / `logo_path`.
    pub fn from_files(layout: LayoutConfig, logo_path: &Path) -> Result<Self> {
        let fonts = FontSet {
            large: FontFace::load(&layout.large_font.path, layout.large_font.size)?,
            small: FontFace::load(&layout.small_font.path, layout.small_font.size)?,
        };
        let b = layout.logo_box();
        let logo = prepare_logo(logo_path, b.width, b.height)?;
        Self::new(layout, fonts, logo)
    }

    pub fn logo(&self) -> &RgbaImage {
        &self.logo
    }

    pub fn layout(&self, participant: &Participant) -> LabelLayout {
        let (name, category, size, footer_baseline) = self.fields(participant);
        let b = self.layout.logo_box();
        LabelLayout {
            logo: Placement { x: b.x as i32, y: b.y as i32, width: self.logo.width(), height: self.logo.height() },
            name: name.ink,
            category: category.ink,
            size: size.ink,
            footer_baseline,
        }
    }

    pub fn render(&self, participant: &Participant) -> RgbImage {
        let mut label = self.template.clone();
        let b = self.layout.logo_box();
        paste_with_alpha(&mut label, &self.logo, b.x as i64, b.y as i64);

        let ink = Rgb(self.layout.ink);
        let (name, category, size, _) = self.fields(participant);
        self.fonts.large.draw(&mut label, name.origin_x, name.baseline, ink, &participant.name);
        self.fonts.small.draw(&mut label, category.origin_x, category.baseline, ink, &participant.category);
        self.fonts.small.draw(&mut label, size.origin_x, size.baseline, ink, &participant.size);
        label
    }

    fn fields(&self, p: &Participant) -> (Field, Field, Field, i32) {
        let l = &self.layout;
        let (w, h, pad) = (l.width as i32, l.height as i32, l.padding as i32);

        // name: centered, ascender line at name_top
        let large = &self.fonts.large;
        let nb = large.measure(&p.name);
        let name_left = (w - nb.width() as i32) / 2;
        let name = field(name_left - nb.min_x, l.name_top + large.ascent(), nb);

        // footer: descenders may reach down to the padding, never past it
        let small = &self.fonts.small;
        let baseline = h - pad - small.descent();

        let cb = small.measure(&p.category);
        let category = field(pad - cb.min_x, baseline, cb);

        let sb = small.measure(&p.size);
        let size = field(w - pad - sb.width() as i32 - sb.min_x, baseline, sb);

        (name, category, size, baseline)
    }
}

fn field(origin_x: i32, baseline: i32, bounds: TextBounds) -> Field {
    let ink = if bounds.is_empty() {
        Placement { x: origin_x, y: baseline, width: 0, height: 0 }
    } else {
        Placement {
            x: origin_x + bounds.min_x,
            y: baseline + bounds.min_y,
            width: bounds.width(),
            height: bounds.height(),
        }
    };
    Field { origin_x, baseline, ink }
}
