//! Decoding of the 32-byte status reply a QL printer sends back.

use crate::error::{Error, Result};

pub const STATUS_LEN: usize = 32;

// error information 1 (low byte) and 2 (high byte)
const ERROR_NAMES: [(u16, &str); 16] = [
    (0x0001, "no media"),
    (0x0002, "end of media"),
    (0x0004, "cutter jam"),
    (0x0008, "weak batteries"),
    (0x0010, "printer in use"),
    (0x0020, "printer turned off"),
    (0x0040, "high-voltage adapter"),
    (0x0080, "fan motor error"),
    (0x0100, "replace media"),
    (0x0200, "expansion buffer full"),
    (0x0400, "communication error"),
    (0x0800, "communication buffer full"),
    (0x1000, "cover open"),
    (0x2000, "cancel key"),
    (0x4000, "media cannot be fed"),
    (0x8000, "system error"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    None,
    Continuous,
    DieCut,
    Other(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusType {
    Reply,
    PrintingCompleted,
    ErrorOccurred,
    TurnedOff,
    Notification,
    PhaseChange,
    Other(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Receiving,
    Printing,
    Other(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterStatus {
    pub error_bits: u16,
    pub media_width_mm: u8,
    pub media_type: MediaType,
    pub media_length_mm: u8,
    pub status_type: StatusType,
    pub phase: Phase,
}

impl PrinterStatus {
    pub fn parse(reply: &[u8]) -> Result<Self> {
        if reply.len() < STATUS_LEN {
            return Err(Error::Status(format!("short status reply ({} bytes)", reply.len())));
        }
        if reply[0] != 0x80 || reply[1] != 0x20 || reply[2] != 0x42 {
            return Err(Error::Status(format!("bad status header {:02x?}", &reply[..3])));
        }

        let media_type = match reply[11] {
            0x00 => MediaType::None,
            0x0A => MediaType::Continuous,
            0x0B => MediaType::DieCut,
            n => MediaType::Other(n),
        };
        let status_type = match reply[18] {
            0x00 => StatusType::Reply,
            0x01 => StatusType::PrintingCompleted,
            0x02 => StatusType::ErrorOccurred,
            0x04 => StatusType::TurnedOff,
            0x05 => StatusType::Notification,
            0x06 => StatusType::PhaseChange,
            n => StatusType::Other(n),
        };
        let phase = match reply[19] {
            0x00 => Phase::Receiving,
            0x01 => Phase::Printing,
            n => Phase::Other(n),
        };

        Ok(PrinterStatus {
            error_bits: u16::from(reply[8]) | u16::from(reply[9]) << 8,
            media_width_mm: reply[10],
            media_type,
            media_length_mm: reply[17],
            status_type,
            phase,
        })
    }

    pub fn errors(&self) -> Vec<&'static str> {
        ERROR_NAMES
            .iter()
            .filter(|(bit, _)| self.error_bits & bit != 0)
            .map(|(_, name)| *name)
            .collect()
    }

    pub fn is_error(&self) -> bool {
        self.error_bits != 0 || self.status_type == StatusType::ErrorOccurred
    }

    /// Turn an error status into `Error::Status`.
    pub fn check(&self) -> Result<()> {
        if self.is_error() {
            let errors = self.errors();
            let detail = if errors.is_empty() { "unspecified error".to_string() } else { errors.join(", ") };
            return Err(Error::Status(detail));
        }
        Ok(())
    }
}
