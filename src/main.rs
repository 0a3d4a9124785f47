//! oem7dec - decode NovAtel OEM7 receiver captures into framed messages.
//!
//! Reads a capture file (or stdin), runs the streaming framer over it, and
//! prints one summary line per decoded message plus final statistics.

use clap::Parser;
use colored::Colorize;
use oem7dec_framer::{FramerConfig, MessageDecoder, ReadSource};
use oem7dec_protocol::{GpsTime, MessageFormat, MessageType, RawMessage};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oem7dec")]
#[command(about = "Decode NovAtel OEM7 receiver captures into framed messages")]
#[command(version)]
struct Cli {
    /// Capture file to decode, or '-' for stdin
    input: PathBuf,

    /// Print one JSON object per message instead of text
    #[arg(long)]
    json: bool,

    /// Emit recognized-but-foreign frames (NMEA sentences) as UNKNOWN messages
    #[arg(long, env = "OEM7DEC_KEEP_UNKNOWN")]
    keep_unknown: bool,

    /// Stop after this many messages
    #[arg(short = 'n', long)]
    limit: Option<u64>,

    /// Suppress per-message output, print only the final statistics
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Serialize)]
struct Summary<'a> {
    format: MessageFormat,
    #[serde(rename = "type")]
    message_type: MessageType,
    id: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    payload_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    gps_time: Option<GpsTime>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let reader: Box<dyn Read> = if cli.input.as_os_str() == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(&cli.input)?)
    };

    let config = FramerConfig::new().with_allow_unknown(cli.keep_unknown);
    let mut decoder = MessageDecoder::with_config(ReadSource::new(reader), config);

    let (major, minor, patch) = decoder.engine_version();
    tracing::debug!("decoding engine {}.{}.{}", major, minor, patch);

    let mut count = 0u64;
    loop {
        if cli.limit.is_some_and(|limit| count >= limit) {
            break;
        }
        match decoder.read_next() {
            Ok(Some(msg)) => {
                count += 1;
                if cli.quiet {
                    continue;
                }
                if cli.json {
                    print_json(&msg)?;
                } else {
                    print_text(&msg);
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::error!("stream failed: {}", e);
                return Err(e.into());
            }
        }
    }

    let stats = decoder.stats();
    eprintln!(
        "{} {} messages, {} crc failures, {} unknown frames, {} bytes discarded",
        "done:".green().bold(),
        stats.messages,
        stats.crc_failures,
        stats.unknown_frames,
        stats.bytes_discarded,
    );

    Ok(())
}

fn print_text(msg: &RawMessage) {
    let format = msg.message_format().to_string();
    let kind = match msg.message_type() {
        MessageType::Response => "RESPONSE".yellow(),
        MessageType::Log => "LOG".normal(),
    };
    let time = msg
        .gps_time()
        .map(|t| format!("{}:{}", t.week, t.milliseconds))
        .unwrap_or_else(|| "-".to_string());

    println!(
        "{:>12} {:>8} {:>5} {:<12} {:>6}B  {}",
        format.as_str().cyan(),
        kind,
        msg.message_id(),
        msg.name().unwrap_or("-"),
        msg.payload_len(),
        time,
    );
}

fn print_json(msg: &RawMessage) -> serde_json::Result<()> {
    let summary = Summary {
        format: msg.message_format(),
        message_type: msg.message_type(),
        id: msg.message_id(),
        name: msg.name(),
        payload_len: msg.payload_len(),
        gps_time: msg.gps_time(),
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
