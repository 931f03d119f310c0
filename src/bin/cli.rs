use std::net::SocketAddr;
use std::path::PathBuf;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use mpegts_captions::extractor::{run, Input, Options, OutputFormat, OverflowPolicy, ProcessorConfig};

#[derive(Parser)]
#[command(about = "Extract EIA-608 closed captions from an H.264 MPEG transport stream")]
struct Opt {
    /// Transport stream file to read
    #[arg(value_name = "INPUT", required_unless_present = "udp", conflicts_with = "udp")]
    input: Option<PathBuf>,

    /// UDP socket to bind + listen instead of reading a file (IPv4, unicast or multicast)
    #[arg(long, value_name = "ADDR")]
    udp: Option<SocketAddr>,

    /// How completed frames are printed
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Check PAT/PMT CRC-32 and drop sections that fail
    #[arg(long, default_value_t = false)]
    verify_crc: bool,

    /// What to do when more than 64 caption units are waiting to be reordered
    #[arg(long, value_enum, default_value_t = OverflowPolicy::DropOldest)]
    reorder_overflow: OverflowPolicy,

    /// Log filter used when RUST_LOG is unset (e.g. "debug", "mpegts_captions=trace")
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&opt.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let input = match (opt.input, opt.udp) {
        (_, Some(addr)) => Input::Udp(addr),
        (Some(path), None) => Input::File(path),
        (None, None) => anyhow::bail!("either INPUT or --udp is required"),
    };

    run(Options {
        input,
        format: opt.format,
        processor: ProcessorConfig {
            verify_psi_crc: opt.verify_crc,
            reorder_overflow: opt.reorder_overflow,
        },
    })
    .await
}
