use std::io::Read;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::error::{Error, Result};

/// One badge worth of data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Participant {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "T-shirt size")]
    pub size: String,
}

impl Participant {
    pub fn new(name: &str, category: &str, size: &str) -> Self {
        Participant { name: name.to_string(), category: category.to_string(), size: size.to_string() }
    }
}

/// Read participants from a CSV file, ordered by t-shirt size.
pub fn load_participants(path: &Path) -> Result<Vec<Participant>> {
    let file = std::fs::File::open(path)
        .map_err(|e| Error::Input(format!("{}: {}", path.display(), e)))?;
    let rows = read_participants(file)?;
    info!("Loaded {} participants from {}", rows.len(), path.display());
    Ok(rows)
}

/// Parse CSV with a header row containing `Name`, `T-shirt size` and `Category`.
/// Empty cells become empty strings; ties in size keep file order.
pub fn read_participants<R: Read>(input: R) -> Result<Vec<Participant>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    for required in ["Name", "T-shirt size", "Category"] {
        if !headers.iter().any(|h| h.trim_start_matches('\u{feff}') == required) {
            return Err(Error::Input(format!("missing column '{}'", required)));
        }
    }
    // tolerate a UTF-8 BOM on the first header
    let cleaned: csv::StringRecord = headers.iter().map(|h| h.trim_start_matches('\u{feff}')).collect();
    reader.set_headers(cleaned.clone());

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let row = padded(&record, cleaned.len());
        let participant: Participant = row
            .deserialize(Some(&cleaned))
            .map_err(|e| Error::Input(format!("row {}: {}", line + 2, e)))?;
        rows.push(participant);
    }

    rows.sort_by(|a, b| a.size.cmp(&b.size));
    Ok(rows)
}

// short rows are missing values, not errors
fn padded(record: &csv::StringRecord, width: usize) -> csv::StringRecord {
    let mut row = record.clone();
    while row.len() < width {
        row.push_field("");
    }
    row
}
