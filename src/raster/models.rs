//! Brother QL printer models and label stock tables.

/// Capabilities of one printer model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Model {
    pub name: &'static str,
    pub bytes_per_row: usize,
    pub invalidate_bytes: usize,
    pub extra_right_margin: u32,
    pub mode_setting: bool,
    pub cutting: bool,
    pub expanded_mode: bool,
    pub compression: bool,
    pub two_color: bool,
}

impl Model {
    pub fn find(name: &str) -> Option<&'static Model> {
        MODELS.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// Dots across the print head.
    pub fn pixel_width(&self) -> u32 {
        self.bytes_per_row as u32 * 8
    }
}

const fn model(name: &'static str) -> Model {
    Model {
        name,
        bytes_per_row: 90,
        invalidate_bytes: 200,
        extra_right_margin: 0,
        mode_setting: true,
        cutting: true,
        expanded_mode: true,
        compression: true,
        two_color: false,
    }
}

const fn wide(name: &'static str) -> Model {
    Model { bytes_per_row: 162, extra_right_margin: 44, ..model(name) }
}

pub static MODELS: &[Model] = &[
    Model { compression: false, mode_setting: false, expanded_mode: false, cutting: false, ..model("QL-500") },
    Model { compression: false, mode_setting: false, ..model("QL-550") },
    Model { compression: false, mode_setting: false, ..model("QL-560") },
    Model { compression: false, mode_setting: false, ..model("QL-570") },
    model("QL-580N"),
    model("QL-600"),
    model("QL-650TD"),
    Model { compression: false, mode_setting: false, ..model("QL-700") },
    model("QL-710W"),
    model("QL-720NW"),
    Model { two_color: true, compression: false, invalidate_bytes: 400, ..model("QL-800") },
    Model { two_color: true, invalidate_bytes: 400, ..model("QL-810W") },
    Model { two_color: true, invalidate_bytes: 400, ..model("QL-820NWB") },
    wide("QL-1050"),
    wide("QL-1060N"),
    wide("QL-1100"),
    wide("QL-1110NWB"),
    wide("QL-1115NWB"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFactor {
    Endless,
    DieCut,
    RoundDieCut,
}

/// One kind of label stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSpec {
    pub id: &'static str,
    /// Tape width and length in mm (length 0 for endless rolls)
    pub tape_mm: (u8, u8),
    pub form: FormFactor,
    pub dots_printable: (u32, u32),
    pub right_margin: u32,
    pub feed_margin: u16,
    pub two_color: bool,
}

impl LabelSpec {
    pub fn find(id: &str) -> Option<&'static LabelSpec> {
        LABELS.iter().find(|l| l.id == id)
    }

    pub fn is_die_cut(&self) -> bool {
        matches!(self.form, FormFactor::DieCut | FormFactor::RoundDieCut)
    }

    /// Media type byte for `ESC i z`.
    pub fn media_type(&self) -> u8 {
        match self.form {
            FormFactor::Endless => 0x0A,
            FormFactor::DieCut | FormFactor::RoundDieCut => 0x0B,
        }
    }
}

const fn endless(id: &'static str, mm: u8, printable: u32, right_margin: u32) -> LabelSpec {
    LabelSpec {
        id,
        tape_mm: (mm, 0),
        form: FormFactor::Endless,
        dots_printable: (printable, 0),
        right_margin,
        feed_margin: 35,
        two_color: false,
    }
}

const fn die_cut(id: &'static str, mm: (u8, u8), printable: (u32, u32), right_margin: u32) -> LabelSpec {
    LabelSpec {
        id,
        tape_mm: mm,
        form: FormFactor::DieCut,
        dots_printable: printable,
        right_margin,
        feed_margin: 0,
        two_color: false,
    }
}

const fn round(id: &'static str, mm: u8, printable: u32, right_margin: u32) -> LabelSpec {
    LabelSpec {
        form: FormFactor::RoundDieCut,
        ..die_cut(id, (mm, mm), (printable, printable), right_margin)
    }
}

pub static LABELS: &[LabelSpec] = &[
    endless("12", 12, 106, 29),
    endless("29", 29, 306, 6),
    endless("38", 38, 413, 12),
    endless("50", 50, 554, 12),
    endless("54", 54, 590, 0),
    endless("62", 62, 696, 12),
    LabelSpec { two_color: true, ..endless("62red", 62, 696, 12) },
    endless("102", 102, 1164, 12),
    die_cut("17x54", (17, 54), (165, 566), 0),
    die_cut("17x87", (17, 87), (165, 956), 0),
    die_cut("23x23", (23, 23), (202, 202), 42),
    die_cut("29x42", (29, 42), (306, 425), 6),
    die_cut("29x90", (29, 90), (306, 991), 6),
    die_cut("39x90", (38, 90), (413, 991), 12),
    die_cut("39x48", (39, 48), (425, 495), 6),
    die_cut("52x29", (52, 29), (578, 271), 0),
    die_cut("62x29", (62, 29), (696, 271), 12),
    die_cut("62x100", (62, 100), (696, 1109), 12),
    die_cut("102x51", (102, 51), (1164, 526), 12),
    die_cut("102x152", (102, 153), (1164, 1660), 12),
    LabelSpec { feed_margin: 35, ..round("d12", 12, 94, 113) },
    round("d24", 24, 236, 42),
    round("d58", 58, 618, 51),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ql500_is_a_plain_model() {
        let m = Model::find("ql-500").unwrap();
        assert_eq!(m.pixel_width(), 720);
        assert!(!m.cutting && !m.mode_setting && !m.expanded_mode && !m.compression && !m.two_color);
    }

    #[test]
    fn badge_stock_matches_landscape_canvas() {
        let l = LabelSpec::find("39x90").unwrap();
        assert!(l.is_die_cut());
        assert_eq!(l.dots_printable, (413, 991));
        assert_eq!(l.media_type(), 0x0B);
    }

    #[test]
    fn unknown_entries_are_none() {
        assert!(Model::find("QL-9000").is_none());
        assert!(LabelSpec::find("39x91").is_none());
    }
}
