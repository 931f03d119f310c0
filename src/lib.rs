// src/lib.rs
pub mod extractor {
    pub use crate::types::{Input, Options, OutputFormat, OverflowPolicy, ProcessorConfig};

    /// Async entry-point; returns at end of file, or when stopped (Ctrl-C or socket error)
    pub async fn run(opts: Options) -> anyhow::Result<()> {
        crate::core::run(opts).await
    }
}

pub mod constants;
pub mod error;
pub mod types;
pub mod parsers;
pub mod psi;
pub mod demux;
pub mod nal;
pub mod reorder;
pub mod eia608;
pub mod caption;
pub mod processor;
pub mod report;
pub mod network;
pub mod core;

pub use caption::{CaptionFrame, CaptionMode, FrameSnapshot};
pub use crate::core::{process_reader, RunSummary};
pub use demux::TransportDemuxer;
pub use error::{CaptionError, Result};
pub use processor::{CaptionProcessor, MpegBitstream};
pub use report::Reporter;
pub use types::Status;
