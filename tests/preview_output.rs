mod common;

use std::path::PathBuf;

use image::{DynamicImage, Rgba, RgbaImage};

use badge_printer::config::{PreviewConfig, PreviewMethod};
use badge_printer::dispatch::{run_batch, PreviewSink};
use badge_printer::graphics::convert_logo_to_bw;
use badge_printer::Participant;

use common::renderer;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("badge_printer_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn people() -> Vec<Participant> {
    vec![
        Participant::new("Alex Doe", "Volunteer", "M"),
        Participant::new("Blake", "Speaker", "L"),
        Participant::new("Casey", "", "S"),
    ]
}

#[test]
fn grid_sheet_and_saved_badges() {
    let dir = scratch("grid");
    let config = PreviewConfig {
        method: PreviewMethod::Grid,
        save_dir: Some(dir.clone()),
        columns: 2,
        open: false,
        ..PreviewConfig::default()
    };
    let mut sink = PreviewSink::new(config, [255, 255, 255]);
    assert_eq!(run_batch(&renderer(), &people(), &mut sink).unwrap(), 3);

    for file in ["alex-doe.png", "blake.png", "casey.png"] {
        let saved = image::open(dir.join(file)).unwrap();
        assert_eq!((saved.width(), saved.height()), (991, 413));
    }

    let sheet_path = sink.sheet().cloned().expect("sheet written");
    assert_eq!(sheet_path, dir.join("preview_grid.png"));
    let sheet = image::open(&sheet_path).unwrap();
    // 2x2 grid of half-size tiles with 12px gutters
    assert_eq!((sheet.width(), sheet.height()), (2 * 496 + 3 * 12, 2 * 207 + 3 * 12));
    assert_eq!(sink.collected().len(), 3);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn single_previews_collect_nothing() {
    let dir = scratch("single");
    let config = PreviewConfig {
        method: PreviewMethod::Single,
        save_dir: Some(dir.clone()),
        open: false,
        ..PreviewConfig::default()
    };
    let mut sink = PreviewSink::new(config, [255, 255, 255]);
    run_batch(&renderer(), &people(), &mut sink).unwrap();

    assert!(sink.collected().is_empty());
    assert!(sink.sheet().is_none());
    assert!(dir.join("casey.png").exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn empty_batch_writes_no_sheet() {
    let config = PreviewConfig { open: false, ..PreviewConfig::default() };
    let mut sink = PreviewSink::new(config, [255, 255, 255]);
    assert_eq!(run_batch(&renderer(), &[], &mut sink).unwrap(), 0);
    assert!(sink.sheet().is_none());
}

#[test]
fn magenta_logo_becomes_pure_black_and_white() {
    let src = RgbaImage::from_fn(64, 32, |x, _| if x < 32 { Rgba([255, 0, 255, 255]) } else { Rgba([255, 255, 255, 255]) });
    let bw = convert_logo_to_bw(&DynamicImage::ImageRgba8(src));

    assert!(bw.pixels().all(|p| p.0 == [0, 0, 0] || p.0 == [255, 255, 255]));
    assert_eq!(bw.get_pixel(0, 0).0, [0, 0, 0]);
    assert_eq!(bw.get_pixel(63, 31).0, [255, 255, 255]);
}
