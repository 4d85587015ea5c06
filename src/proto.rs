use std::io;
use thiserror::Error;

use self::flags::TemplateMismatch;
use self::registry::Mode;

pub mod codec;
pub mod flags;
pub mod packet;
pub mod registry;

/// Input line could not be turned into a 9 byte packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FramingError {
    #[error("empty line")]
    Empty,
    #[error("line contains non ASCII bytes")]
    NonAscii,
    #[error("invalid packet length: {0}")]
    InvalidLength(usize),
}

/// Reasons a single packet is rejected.
///
/// All of them are scoped to one packet, a caller reading a stream
/// is expected to log them and continue with the next line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),
    #[error("invalid status bits in byte {byte}: {source}")]
    InvalidStatusBits {
        byte: usize,
        source: TemplateMismatch,
    },
    #[error("unknown function code: {0:#04x}")]
    UnknownFunction(u8),
    #[error("unknown range {index} for {mode}")]
    UnknownRange { mode: Mode, index: u8 },
    #[error("unsupported function: {0}")]
    UnsupportedFunction(Mode),
    #[error("invalid digit {nibble:#x} at position {position}")]
    InvalidDigit { position: usize, nibble: u8 },
    #[error("AC and DC flags are both set")]
    ConflictingCurrentType,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type Result<T> = std::result::Result<T, Error>;
