// Badge layout and printer defaults

// ======== Canvas ========
pub const LABEL_W: u32 = 991;              // 38x90mm die-cut label, rotated to landscape
pub const LABEL_H: u32 = 413;
pub const PADDING: u32 = 5;                // inset from every edge
pub const NAME_TOP: i32 = 200;             // ascender line of the name text
pub const BACKGROUND: [u8; 3] = [255, 255, 255];
pub const INK: [u8; 3] = [0, 0, 0];

// ======== Fonts ========
pub const LARGE_FONT_PATH: &str = "Inter-Bold.ttf";     // name
pub const LARGE_FONT_PX: f32 = 75.0;
pub const SMALL_FONT_PATH: &str = "Inter-Regular.ttf";  // category and t-shirt size
pub const SMALL_FONT_PX: f32 = 50.0;

// ======== Files ========
pub const INPUT_PATH: &str = "names.csv";  // columns: Name, T-shirt size, Category
pub const LOGO_PATH: &str = "logo_bw.png";
pub const PREVIEW_DIR: &str = "label_previews";
pub const PREVIEW_COLUMNS: u32 = 10;
pub const PREVIEW_TILE_SCALE: f32 = 0.5;   // grid thumbnails relative to label size
pub const PREVIEW_GUTTER: u32 = 12;

// ======== Printer ========
pub const PRINTER_MODEL: &str = "QL-500";
pub const PRINTER_DEVICE: &str = "usb://0x04f9:0x2015"; // QL-500 USB ID
pub const LABEL_SPEC: &str = "39x90";      // die-cut label stock
pub const THRESHOLD: u8 = 70;              // percent; lower = more black
pub const DITHER: bool = false;
pub const COMPRESS: bool = false;
pub const RED: bool = false;               // two-colour stock only
pub const HIGH_DPI: bool = false;          // 600 dpi instead of 300
pub const CUT: bool = true;
pub const TCP_PORT: u16 = 9100;
pub const STATUS_TIMEOUT_MS: u64 = 10_000; // wait for "printing completed"
