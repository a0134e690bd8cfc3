use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Error, Result};
use crate::raster::{ConvertOptions, LabelSpec, Model, Rotation};

/// Everything one run needs, fixed before the first badge is rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: PathBuf,
    pub logo: PathBuf,
    pub mode: OutputMode,
    pub layout: LayoutConfig,
    pub preview: PreviewConfig,
    pub printer: PrinterConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Preview,
    #[default]
    Print,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMethod {
    /// open every badge on its own
    Single,
    /// one contact sheet after the batch
    #[default]
    Grid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub path: PathBuf,
    pub size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Canvas geometry and typefaces of a badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: u32,
    pub height: u32,
    pub padding: u32,
    pub name_top: i32,
    /// Defaults to the canvas inset by `padding` on every side
    pub logo_box: Option<LogoBox>,
    pub background: [u8; 3],
    pub ink: [u8; 3],
    pub large_font: FontSpec,
    pub small_font: FontSpec,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            width: LABEL_W,
            height: LABEL_H,
            padding: PADDING,
            name_top: NAME_TOP,
            logo_box: None,
            background: BACKGROUND,
            ink: INK,
            large_font: FontSpec { path: LARGE_FONT_PATH.into(), size: LARGE_FONT_PX },
            small_font: FontSpec { path: SMALL_FONT_PATH.into(), size: SMALL_FONT_PX },
        }
    }
}

impl LayoutConfig {
    pub fn logo_box(&self) -> LogoBox {
        self.logo_box.unwrap_or(LogoBox {
            x: self.padding,
            y: self.padding,
            width: self.width.saturating_sub(self.padding.saturating_mul(2)),
            height: self.height.saturating_sub(self.padding.saturating_mul(2)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub method: PreviewMethod,
    /// Save every badge as `<slug>.png` here
    pub save_dir: Option<PathBuf>,
    pub columns: u32,
    pub tile_scale: f32,
    pub gutter: u32,
    /// Launch the system image viewer
    pub open: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        PreviewConfig {
            method: PreviewMethod::Grid,
            save_dir: None,
            columns: PREVIEW_COLUMNS,
            tile_scale: PREVIEW_TILE_SCALE,
            gutter: PREVIEW_GUTTER,
            open: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    pub model: String,
    pub device: String,
    pub label: String,
    pub rotation: Rotation,
    pub threshold: u8,
    pub dither: bool,
    pub compress: bool,
    pub red: bool,
    pub high_dpi: bool,
    pub cut: bool,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        PrinterConfig {
            model: PRINTER_MODEL.into(),
            device: PRINTER_DEVICE.into(),
            label: LABEL_SPEC.into(),
            rotation: Rotation::None,
            threshold: THRESHOLD,
            dither: DITHER,
            compress: COMPRESS,
            red: RED,
            high_dpi: HIGH_DPI,
            cut: CUT,
        }
    }
}

impl PrinterConfig {
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            rotation: self.rotation,
            threshold: self.threshold,
            dither: self.dither,
            compress: self.compress,
            red: self.red,
            dpi_600: self.high_dpi,
            cut: self.cut,
            hq: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input: INPUT_PATH.into(),
            logo: LOGO_PATH.into(),
            mode: OutputMode::default(),
            layout: LayoutConfig::default(),
            preview: PreviewConfig::default(),
            printer: PrinterConfig::default(),
        }
    }
}

impl Config {
    /// Read a JSON file; keys it leaves out keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&text)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let l = &self.layout;
        if l.width == 0 || l.height == 0 {
            return Err(Error::Config(format!("canvas {}x{} is empty", l.width, l.height)));
        }
        let inset = 2 * u64::from(l.padding);
        if inset >= u64::from(l.width) || inset >= u64::from(l.height) {
            return Err(Error::Config(format!("padding {} leaves no room on a {}x{} canvas", l.padding, l.width, l.height)));
        }
        if l.name_top < 0 || i64::from(l.name_top) >= i64::from(l.height) {
            return Err(Error::Config(format!("name top {} is outside the {}px canvas", l.name_top, l.height)));
        }
        let b = l.logo_box();
        if u64::from(b.x) + u64::from(b.width) > u64::from(l.width) || u64::from(b.y) + u64::from(b.height) > u64::from(l.height) {
            return Err(Error::Config("logo box extends past the canvas".into()));
        }
        if l.large_font.size <= 0.0 || l.small_font.size <= 0.0 {
            return Err(Error::Config("font sizes must be positive".into()));
        }
        if self.preview.columns == 0 {
            return Err(Error::Config("preview columns must be at least 1".into()));
        }
        if self.preview.tile_scale <= 0.0 {
            return Err(Error::Config("preview tile scale must be positive".into()));
        }

        let p = &self.printer;
        if p.threshold > 100 {
            return Err(Error::Config(format!("threshold {} is not a percentage", p.threshold)));
        }
        let model = Model::find(&p.model).ok_or_else(|| Error::Config(format!("unknown printer model '{}'", p.model)))?;
        LabelSpec::find(&p.label).ok_or_else(|| Error::Config(format!("unknown label '{}'", p.label)))?;
        if p.red && !model.two_color {
            return Err(Error::Config(format!("{} cannot print red", model.name)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_the_badge_deployment() {
        let c = Config::default();
        assert_eq!((c.layout.width, c.layout.height), (991, 413));
        assert_eq!(c.mode, OutputMode::Print);
        assert_eq!(c.printer.device, "usb://0x04f9:0x2015");
        assert_eq!(c.layout.logo_box(), LogoBox { x: 5, y: 5, width: 981, height: 403 });
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_overrides_only_named_keys() {
        let c: Config = serde_json::from_str(
            r#"{ "mode": "preview", "layout": { "padding": 8 }, "printer": { "rotation": "90", "model": "QL-700" } }"#,
        )
        .unwrap();
        assert_eq!(c.mode, OutputMode::Preview);
        assert_eq!(c.layout.padding, 8);
        assert_eq!(c.layout.width, 991);
        assert_eq!(c.printer.rotation, Rotation::Quarter);
        assert_eq!(c.printer.model, "QL-700");
        assert_eq!(c.printer.label, "39x90");
    }

    #[test]
    fn validation_catches_bad_values() {
        let mut c = Config::default();
        c.printer.threshold = 170;
        assert!(matches!(c.validate(), Err(Error::Config(_))));

        let mut c = Config::default();
        c.printer.model = "QL-9".into();
        assert!(c.validate().is_err());

        let mut c = Config::default();
        c.printer.red = true;
        assert!(c.validate().is_err());

        let mut c = Config::default();
        c.layout.logo_box = Some(LogoBox { x: 500, y: 0, width: 600, height: 10 });
        assert!(c.validate().is_err());

        let mut c = Config::default();
        c.preview.columns = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn huge_values_are_errors_not_overflows() {
        let c: Config = serde_json::from_str(r#"{ "layout": { "padding": 3000000000 } }"#).unwrap();
        assert!(matches!(c.validate(), Err(Error::Config(_))));

        let mut c = Config::default();
        c.layout.logo_box = Some(LogoBox { x: u32::MAX, y: 0, width: 10, height: 10 });
        assert!(matches!(c.validate(), Err(Error::Config(_))));

        let mut c = Config::default();
        c.layout.name_top = i32::MAX;
        assert!(matches!(c.validate(), Err(Error::Config(_))));
    }
}
