//! Layered packet construction and parsing for netstack
//!
//! This crate builds and decodes Ethernet / IPv6 / TCP packets without
//! allocating. The caller owns a byte region, places the payload in it, and
//! each protocol layer prepends its header in front of what is already
//! there.
//!
//! - **Ethernet II** frames with common EtherTypes
//! - **IPv6** fixed headers with textual address parsing
//! - **TCP** segments with all nine control flags
//! - **CRC-32** (IEEE 802.3) over arbitrary bytes
//!
//! # Architecture
//!
//! - [`buffer`] - Caller-owned byte region with front insertion
//! - [`ethernet`] - Ethernet II header codec
//! - [`ipv6`] - IPv6 header codec
//! - [`tcp`] - TCP header codec
//! - [`mutator`] - Per-protocol hooks applied before packing
//! - [`stack`] - Ordered stack of layers packed and unpacked as one packet
//! - [`crc`] - CRC-32 checksum
//!
//! # Quick Start
//!
//! ## Building a TCP packet
//!
//! ```rust
//! use netstack_packet::{Buffer, EthernetFrame, ProtocolStack};
//! use netstack_packet::mutator::Callbacks;
//!
//! let mut stack: ProtocolStack = ProtocolStack::new();
//! stack.push_ethernet().unwrap();
//! stack.push_ipv6().unwrap();
//! stack.push_tcp().unwrap();
//!
//! let mut set_macs = |frame: &mut EthernetFrame| -> netstack_core::Result<()> {
//!     frame.set_source("00:11:22:33:44:55")?;
//!     frame.set_destination("33:44:55:66:77:88")
//! };
//! stack.mutate(&mut Callbacks::new().on_ethernet(&mut set_macs)).unwrap();
//!
//! let mut storage = [0u8; 256];
//! let mut buffer = Buffer::new(&mut storage);
//! buffer.append(b"Hello, world!").unwrap();
//! stack.pack(&mut buffer).unwrap();
//!
//! assert_eq!(buffer.size(), 87);
//! stack.done();
//! ```
//!
//! ## Parsing a packet
//!
//! ```rust
//! use netstack_packet::{Protocol, ProtocolStack};
//!
//! # let mut storage = [0u8; 128];
//! # let mut buffer = netstack_packet::Buffer::new(&mut storage);
//! # let mut built: ProtocolStack = ProtocolStack::new();
//! # built.push_ethernet().unwrap();
//! # built.push_ipv6().unwrap();
//! # built.push_tcp().unwrap();
//! # built.pack(&mut buffer).unwrap();
//! # let bytes = buffer.as_slice();
//! let mut stack: ProtocolStack = ProtocolStack::new();
//! let payload_offset = stack.unpack(bytes).unwrap();
//!
//! assert_eq!(payload_offset, 74);
//! assert!(matches!(stack.get(2), Some(Protocol::Tcp(_))));
//! ```
//!
//! # Low-Level API
//!
//! Every codec can be used on its own:
//!
//! ```rust
//! use netstack_packet::{Buffer, TcpFlags, TcpSegment};
//!
//! let mut segment = TcpSegment::new();
//! segment.set_destination("443").unwrap();
//! segment.control_bits = TcpFlags::SYN;
//!
//! let mut storage = [0u8; 20];
//! let mut buffer = Buffer::new(&mut storage);
//! segment.pack(&mut buffer).unwrap();
//! assert_eq!(buffer[13], 0x02);
//! ```

pub mod buffer;
pub mod crc;
pub mod ethernet;
pub mod ipv6;
pub mod mutator;
pub mod stack;
pub mod tcp;

// Re-export commonly used types for convenience
pub use buffer::Buffer;
pub use crc::{crc32, Crc32};
pub use ethernet::{EtherType, EthernetFrame, MacAddress};
pub use ipv6::{IpProtocol, Ipv6Address, Ipv6Header};
pub use mutator::{Callbacks, Identity, Mutator};
pub use stack::{Protocol, ProtocolStack, DEFAULT_CAPACITY};
pub use tcp::{TcpFlags, TcpPort, TcpSegment};
