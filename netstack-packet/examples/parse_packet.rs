//! Example: Decoding a captured packet
//!
//! Reads a raw Ethernet frame from a file (for instance the output of the
//! `tcp_pack` example), decodes every known layer and prints the payload.

use clap::Parser;
use netstack_packet::{crc32, Protocol, ProtocolStack};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "parse_packet")]
#[command(version, about = "Decode an Ethernet/IPv6/TCP packet from a file", long_about = None)]
struct Args {
    /// File holding the raw packet
    #[arg(short, long, default_value = "tcp-packet.bin")]
    input: PathBuf,

    /// Verbose output (-v, -vv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let packet = std::fs::read(&args.input)?;
    println!("Read {} bytes from {}", packet.len(), args.input.display());
    println!("CRC-32: 0x{:08X}", crc32(&packet));

    let mut stack: ProtocolStack = ProtocolStack::new();
    let result = stack.unpack(&packet);

    for (index, layer) in stack.iter().enumerate() {
        println!("  [{}] {}", index, layer);
        if let Protocol::Tcp(segment) = layer {
            println!("      flags: 0x{:03X}", segment.control_bits.to_u16());
        }
    }

    result?;
    let payload = stack.payload(&packet)?;
    println!("Payload: {} bytes", payload.len());
    println!("  {}", String::from_utf8_lossy(payload));

    stack.done();
    Ok(())
}
