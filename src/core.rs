//! Run loop: packet source, caption processor, stdout

use std::io::Write;
use std::net::SocketAddr;
use anyhow::Context;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tracing::{debug, info, warn};
use crate::constants::TS_PACKET_SIZE;
use crate::network::{create_udp_socket, MAX_DATAGRAM_SIZE};
use crate::processor::CaptionProcessor;
use crate::report::Reporter;
use crate::types::{Input, Options, OutputFormat, ProcessorConfig};

/// Counters logged when the input ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub packets: u64,
    pub frames: u64,
    /// Packets whose processing reported a recoverable error
    pub errors: u64,
}

/// Processes the configured input to completion, writing frames to stdout.
pub async fn run(opts: Options) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    let summary = match &opts.input {
        Input::File(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?;
            process_reader(BufReader::new(file), opts.processor, opts.format, &mut stdout).await?
        }
        Input::Udp(addr) => process_udp(*addr, opts.processor, opts.format, &mut stdout).await?,
    };
    info!(packets = summary.packets, frames = summary.frames, errors = summary.errors, "input finished");
    Ok(())
}

/// Reads 188-byte packets from `reader` until it runs dry.
///
/// A trailing partial packet is ignored. Units still held for reordering are
/// released at the end.
pub async fn process_reader<R, W>(
    mut reader: R,
    config: ProcessorConfig,
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<RunSummary>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let mut processor = CaptionProcessor::new(config);
    let mut summary = RunSummary::default();
    let mut pkt = [0u8; TS_PACKET_SIZE];

    loop {
        match reader.read_exact(&mut pkt).await {
            Ok(_) => handle_packet(&mut processor, &pkt, format, out, &mut summary)?,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e).context("reading transport stream"),
        }
    }

    finish(&mut processor, format, out, &mut summary)?;
    Ok(summary)
}

/// Receives datagrams until Ctrl-C or a socket error.
pub async fn process_udp<W: Write>(
    addr: SocketAddr,
    config: ProcessorConfig,
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<RunSummary> {
    let sock = create_udp_socket(addr)?;
    let mut processor = CaptionProcessor::new(config);
    let mut summary = RunSummary::default();
    let mut buf = [0u8; MAX_DATAGRAM_SIZE];

    loop {
        let n = tokio::select! {
            res = sock.recv(&mut buf) => res.context("receiving datagram")?,
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
        };
        if n == 0 {
            continue;
        }
        if n % TS_PACKET_SIZE != 0 {
            warn!(len = n, "datagram is not a whole number of packets, tail dropped");
        }
        // iterate TS packets (188 B aligned)
        for chunk in buf[..n].chunks_exact(TS_PACKET_SIZE) {
            handle_packet(&mut processor, chunk, format, out, &mut summary)?;
        }
    }

    finish(&mut processor, format, out, &mut summary)?;
    Ok(summary)
}

fn handle_packet<W: Write>(
    processor: &mut CaptionProcessor,
    chunk: &[u8],
    format: OutputFormat,
    out: &mut W,
    summary: &mut RunSummary,
) -> anyhow::Result<()> {
    summary.packets += 1;
    let frames = processor
        .process_packet(chunk)
        .with_context(|| format!("packet {}", summary.packets - 1))?;
    if processor.status().is_error() {
        summary.errors += 1;
    }
    emit(&frames, format, out, summary)
}

fn finish<W: Write>(
    processor: &mut CaptionProcessor,
    format: OutputFormat,
    out: &mut W,
    summary: &mut RunSummary,
) -> anyhow::Result<()> {
    let frames = processor.finish();
    emit(&frames, format, out, summary)?;
    out.flush().context("flushing output")
}

fn emit<W: Write>(
    frames: &[crate::caption::FrameSnapshot],
    format: OutputFormat,
    out: &mut W,
    summary: &mut RunSummary,
) -> anyhow::Result<()> {
    for frame in frames {
        writeln!(out, "{}", Reporter::render(frame, format)).context("writing frame")?;
        summary.frames += 1;
    }
    Ok(())
}
