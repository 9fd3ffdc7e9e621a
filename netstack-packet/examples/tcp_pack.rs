//! Example: Building an Ethernet / IPv6 / TCP packet
//!
//! Pushes the three layers onto a stack, fills in addresses and ports
//! through a mutator, packs them around a text payload and writes the wire
//! bytes to a file.
//!
//! ```text
//! cargo run -p netstack-packet --example tcp_pack -- --payload "Hello" -vv
//! ```

use clap::Parser;
use netstack_core::Result;
use netstack_packet::{
    crc32, Buffer, EtherType, EthernetFrame, Ipv6Header, Mutator, ProtocolStack, TcpSegment,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tcp_pack")]
#[command(version, about = "Build an Ethernet/IPv6/TCP packet and write it to a file", long_about = None)]
struct Args {
    /// File the packet is written to
    #[arg(short, long, default_value = "tcp-packet.bin")]
    output: PathBuf,

    /// TCP payload
    #[arg(short, long, default_value = "Hello, world!")]
    payload: String,

    /// Source TCP port
    #[arg(long, default_value = "20")]
    source_port: String,

    /// Destination TCP port
    #[arg(long, default_value = "80")]
    destination_port: String,

    /// Verbose output (-v, -vv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Fixed link and network addresses, ports from the command line
struct Addresses<'a> {
    source_port: &'a str,
    destination_port: &'a str,
}

impl Mutator for Addresses<'_> {
    fn mutate_ethernet(&mut self, frame: &mut EthernetFrame) -> Result<()> {
        frame.ethertype = EtherType::IPv6;
        frame.set_source("00:11:22:33:44:55")?;
        frame.set_destination("33:44:55:66:77:88")
    }

    fn mutate_ipv6(&mut self, header: &mut Ipv6Header) -> Result<()> {
        header.set_source("2001:0000:3238:DFE1:0063:0000:0000:FEFB")?;
        header.set_destination("2001:0db8:85a3:0000:0000:8a2e:0370:7334")
    }

    fn mutate_tcp(&mut self, segment: &mut TcpSegment) -> Result<()> {
        segment.set_source(self.source_port)?;
        segment.set_destination(self.destination_port)
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let mut stack: ProtocolStack = ProtocolStack::new();
    stack.push_ethernet()?;
    stack.push_ipv6()?;
    stack.push_tcp()?;

    stack.mutate(&mut Addresses {
        source_port: &args.source_port,
        destination_port: &args.destination_port,
    })?;

    let mut storage = [0u8; 1514];
    let mut buffer = Buffer::new(&mut storage);
    buffer.append(args.payload.as_bytes())?;
    stack.pack(&mut buffer)?;

    for layer in stack.iter() {
        println!("{}", layer);
    }
    stack.done();

    std::fs::write(&args.output, buffer.as_slice())?;

    println!("Packet built successfully!");
    println!("Total size: {} bytes", buffer.size());
    println!("CRC-32: 0x{:08X}", crc32(buffer.as_slice()));
    println!("Written to {}", args.output.display());

    Ok(())
}
