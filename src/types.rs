use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Serialize;

/// Outcome of a pipeline stage.
///
/// Statuses compose with [`Status::merge`]: an `Error` on either side wins, and a
/// `Ready` already reached is not undone by a later `Ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Status {
    Error,
    #[default]
    Ok,
    Ready,
}

impl Status {
    pub fn merge(self, new: Status) -> Status {
        match (self, new) {
            (Status::Error, _) | (_, Status::Error) => Status::Error,
            (Status::Ready, _) => Status::Ready,
            _ => new,
        }
    }

    pub fn is_error(self) -> bool {
        self == Status::Error
    }
}

/// What to do when a unit arrives while the reorder ring is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OverflowPolicy {
    /// Evict the unit with the smallest timestamp and keep going
    #[default]
    DropOldest,
    /// Refuse the new unit and report an error for the call
    Reject,
}

/// Knobs for the packet-to-frame pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessorConfig {
    /// Validate PAT/PMT section CRC-32 before trusting their fields
    pub verify_psi_crc: bool,
    pub reorder_overflow: OverflowPolicy,
}

/// How completed frames are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Separator line followed by the frame text
    #[default]
    Text,
    /// One JSON object per frame
    Json,
    /// Full 15x32 grid with row numbers
    Dump,
}

/// Where transport packets come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    File(PathBuf),
    /// UDP unicast or multicast (IPv4)
    Udp(SocketAddr),
}

/// Configuration options for the extractor
#[derive(Debug, Clone)]
pub struct Options {
    pub input: Input,
    pub format: OutputFormat,
    pub processor: ProcessorConfig,
}
