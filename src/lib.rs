//! Name badges from a participant CSV, for Brother QL label printers.
//! - Loads rows (name, category, t-shirt size) sorted by size
//! - Composes a logo, a centered name and a category/size footer per badge
//! - Previews badges as PNGs (single viewer windows or one contact sheet)
//! - Or converts them to QL raster instructions and sends them over USB, a device file or TCP

pub mod builder;
pub mod config;
pub mod consts;
pub mod dispatch;
pub mod error;
pub mod graphics;
pub mod participants;
pub mod preview;
pub mod printer;
pub mod raster;

pub use builder::{LabelLayout, LabelRenderer, Placement};
pub use config::{Config, OutputMode, PreviewMethod};
pub use dispatch::{run_batch, LabelSink, PreviewSink, PrintSink};
pub use error::{Error, Result};
pub use graphics::{FontFace, FontSet};
pub use participants::{load_participants, Participant};
pub use printer::{open_transmitter, Transmitter};
pub use raster::{ConvertOptions, RasterConverter, Rotation};
