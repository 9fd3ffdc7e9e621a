//! Ordered, fixed-capacity protocol stack
//!
//! Layers are pushed outer to inner (link, network, transport) and packed
//! inner to outer, so every header ends up in front of the one pushed after
//! it.
//!
//! ```
//! use netstack_packet::{Buffer, ProtocolStack};
//!
//! let mut stack: ProtocolStack = ProtocolStack::new();
//! stack.push_ethernet().unwrap();
//! stack.push_ipv6().unwrap();
//! stack.push_tcp().unwrap().set_destination("80").unwrap();
//!
//! let mut storage = [0u8; 128];
//! let mut buffer = Buffer::new(&mut storage);
//! buffer.append(b"Hello, world!").unwrap();
//!
//! stack.pack(&mut buffer).unwrap();
//! assert_eq!(buffer.size(), 14 + 40 + 20 + 13);
//! ```

use crate::buffer::Buffer;
use crate::ethernet::{EtherType, EthernetFrame};
use crate::ipv6::{IpProtocol, Ipv6Header};
use crate::mutator::Mutator;
use crate::tcp::TcpSegment;
use netstack_core::{Error, Result};
use std::fmt;
use tracing::{debug, warn};

/// Layer capacity of a [`ProtocolStack`] when none is given
pub const DEFAULT_CAPACITY: usize = 8;

/// One layer of a stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Ethernet(EthernetFrame),
    Ipv6(Ipv6Header),
    Tcp(TcpSegment),
}

impl Protocol {
    pub fn name(&self) -> &'static str {
        match self {
            Protocol::Ethernet(_) => "Ethernet",
            Protocol::Ipv6(_) => "IPv6",
            Protocol::Tcp(_) => "TCP",
        }
    }

    /// Bytes this layer adds when packed
    pub fn header_len(&self) -> usize {
        match self {
            Protocol::Ethernet(frame) => frame.header_len(),
            Protocol::Ipv6(header) => header.header_len(),
            Protocol::Tcp(_) => TcpSegment::HEADER_SIZE,
        }
    }

    /// Bytes this layer occupied on the wire when it was unpacked,
    /// TCP options included
    fn wire_len(&self) -> usize {
        match self {
            Protocol::Tcp(segment) => segment.header_len(),
            other => other.header_len(),
        }
    }

    pub fn as_ethernet_mut(&mut self) -> Option<&mut EthernetFrame> {
        match self {
            Protocol::Ethernet(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn as_ipv6_mut(&mut self) -> Option<&mut Ipv6Header> {
        match self {
            Protocol::Ipv6(header) => Some(header),
            _ => None,
        }
    }

    pub fn as_tcp_mut(&mut self) -> Option<&mut TcpSegment> {
        match self {
            Protocol::Tcp(segment) => Some(segment),
            _ => None,
        }
    }

    pub fn pack(&self, buffer: &mut Buffer<'_>) -> Result<()> {
        match self {
            Protocol::Ethernet(frame) => frame.pack(buffer),
            Protocol::Ipv6(header) => header.pack(buffer),
            Protocol::Tcp(segment) => segment.pack(buffer),
        }
    }

    pub fn unpack(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            Protocol::Ethernet(frame) => frame.unpack(bytes),
            Protocol::Ipv6(header) => header.unpack(bytes),
            Protocol::Tcp(segment) => segment.unpack(bytes),
        }
    }

    pub fn mutate<M: Mutator + ?Sized>(&mut self, mutator: &mut M) -> Result<()> {
        match self {
            Protocol::Ethernet(frame) => frame.mutate(mutator),
            Protocol::Ipv6(header) => header.mutate(mutator),
            Protocol::Tcp(segment) => segment.mutate(mutator),
        }
    }

    /// The layer that follows this one on the wire, if it has a codec here
    fn next(&self) -> Option<Protocol> {
        match self {
            Protocol::Ethernet(frame) => match frame.ethertype {
                EtherType::IPv6 => Some(Protocol::Ipv6(Ipv6Header::new())),
                _ => None,
            },
            Protocol::Ipv6(header) => match header.protocol {
                IpProtocol::TCP => Some(Protocol::Tcp(TcpSegment::new())),
                _ => None,
            },
            Protocol::Tcp(_) => None,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Ethernet(frame) => write!(
                f,
                "Ethernet {} -> {} ({})",
                frame.source, frame.destination, frame.ethertype
            ),
            Protocol::Ipv6(header) => write!(
                f,
                "IPv6 {} -> {} ({}, hop limit {}, length {})",
                header.source, header.destination, header.protocol, header.hop_limit, header.length
            ),
            Protocol::Tcp(segment) => write!(
                f,
                "TCP {} -> {} (seq {}, ack {}, window {})",
                segment.source_port,
                segment.destination_port,
                segment.sequence,
                segment.acknowledgment,
                segment.window_size
            ),
        }
    }
}

/// Ordered sequence of at most `N` layers, stored inline
#[derive(Debug, Clone)]
pub struct ProtocolStack<const N: usize = DEFAULT_CAPACITY> {
    entries: [Option<Protocol>; N],
    count: usize,
}

impl<const N: usize> ProtocolStack<N> {
    pub fn new() -> Self {
        ProtocolStack {
            entries: [None; N],
            count: 0,
        }
    }

    /// Drop every layer so the stack can be built again
    pub fn reset(&mut self) {
        self.entries = [None; N];
        self.count = 0;
    }

    /// End of the stack's lifecycle
    pub fn done(self) {
        debug!(layers = self.count, "Protocol stack done");
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn get(&self, index: usize) -> Option<&Protocol> {
        self.entries[..self.count].get(index)?.as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Protocol> {
        self.entries[..self.count].get_mut(index)?.as_mut()
    }

    /// Layers from outermost to innermost
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Protocol> {
        self.entries[..self.count].iter().flatten()
    }

    /// Combined size of the headers `pack` writes for this stack
    pub fn header_len(&self) -> usize {
        self.iter().map(Protocol::header_len).sum()
    }

    /// Append a layer after the current innermost one
    ///
    /// Fails with [`Error::CapacityExceeded`] when the stack already holds
    /// `N` layers; the stack is unchanged in that case.
    pub fn push(&mut self, protocol: Protocol) -> Result<&mut Protocol> {
        if self.count == N {
            warn!(capacity = N, layer = protocol.name(), "Protocol stack full");
            return Err(Error::capacity(1, 0));
        }

        debug!(index = self.count, layer = protocol.name(), "Pushing layer");

        let slot = &mut self.entries[self.count];
        self.count += 1;
        Ok(slot.insert(protocol))
    }

    pub fn push_ethernet(&mut self) -> Result<&mut EthernetFrame> {
        self.push_layer(Protocol::Ethernet(EthernetFrame::new()), Protocol::as_ethernet_mut)
    }

    pub fn push_ipv6(&mut self) -> Result<&mut Ipv6Header> {
        self.push_layer(Protocol::Ipv6(Ipv6Header::new()), Protocol::as_ipv6_mut)
    }

    pub fn push_tcp(&mut self) -> Result<&mut TcpSegment> {
        self.push_layer(Protocol::Tcp(TcpSegment::new()), Protocol::as_tcp_mut)
    }

    fn push_layer<T>(
        &mut self,
        protocol: Protocol,
        layer: fn(&mut Protocol) -> Option<&mut T>,
    ) -> Result<&mut T> {
        let entry = self.push(protocol)?;
        layer(entry).ok_or(Error::format("pushed layer has a different protocol"))
    }

    /// Apply `mutator` to every layer, outermost first
    ///
    /// Stops at the first failing layer and returns its error. Layers
    /// before it keep their changes.
    pub fn mutate<M: Mutator + ?Sized>(&mut self, mutator: &mut M) -> Result<()> {
        debug!(layers = self.count, "Mutating protocol stack");

        for (index, entry) in self.entries[..self.count].iter_mut().flatten().enumerate() {
            if let Err(e) = entry.mutate(mutator) {
                warn!(index, layer = entry.name(), error = %e, "Mutator failed");
                return Err(e);
            }
        }

        Ok(())
    }

    /// Serialize every layer around the payload already in `buffer`
    ///
    /// Layers are packed innermost first. Each codec checks its fields
    /// before touching the buffer, so a failing layer adds nothing. Layers
    /// packed before it stay in the buffer.
    pub fn pack(&self, buffer: &mut Buffer<'_>) -> Result<()> {
        debug!(
            layers = self.count,
            payload = buffer.size(),
            reserved = buffer.reserved(),
            "Packing protocol stack"
        );

        for (index, entry) in self.entries[..self.count].iter().enumerate().rev() {
            let Some(entry) = entry else { continue };
            if let Err(e) = entry.pack(buffer) {
                warn!(index, layer = entry.name(), error = %e, "Packing failed");
                return Err(e);
            }
        }

        debug!(size = buffer.size(), "Packed protocol stack");
        Ok(())
    }

    /// Decode a raw packet, replacing the current layers
    ///
    /// The outermost layer is always Ethernet. Each header's ethertype or
    /// next header field names the layer after it; decoding stops at the
    /// first one without a codec here. Returns the offset of the payload
    /// that follows the last decoded header, TCP options included.
    ///
    /// The IPv6 payload length is not checked here: `&packet[offset..]`
    /// may still hold link-layer padding. Use [`ProtocolStack::payload`]
    /// for the payload as the IPv6 header declares it.
    ///
    /// On error the layers decoded so far remain in the stack.
    pub fn unpack(&mut self, packet: &[u8]) -> Result<usize> {
        self.reset();
        debug!(size = packet.len(), "Unpacking packet");

        let mut offset = 0;
        let mut next = Some(Protocol::Ethernet(EthernetFrame::new()));

        while let Some(protocol) = next {
            let entry = self.push(protocol)?;
            if let Err(e) = entry.unpack(&packet[offset..]) {
                warn!(offset, layer = entry.name(), error = %e, "Unpacking failed");
                return Err(e);
            }
            offset += entry.wire_len();
            next = entry.next();
        }

        debug!(layers = self.count, payload_offset = offset, "Unpacked packet");
        Ok(offset)
    }

    /// The payload of `packet` after the decoded headers
    ///
    /// `packet` is the slice last given to [`ProtocolStack::unpack`]. When
    /// an IPv6 layer was decoded, its payload length bounds the result, so
    /// trailing link-layer bytes are dropped. Fails with
    /// [`Error::Format`] when the packet is shorter than its headers
    /// declare.
    pub fn payload<'p>(&self, packet: &'p [u8]) -> Result<&'p [u8]> {
        let mut offset = 0;
        let mut end = packet.len();

        for entry in self.iter() {
            offset += entry.wire_len();
            if let Protocol::Ipv6(header) = entry {
                end = offset + header.length as usize;
            }
        }

        if end > packet.len() {
            warn!(declared = end, size = packet.len(), "IPv6 payload truncated");
            return Err(Error::format("IPv6 payload truncated"));
        }
        if offset > end {
            return Err(Error::format("headers extend past the IPv6 payload"));
        }

        Ok(&packet[offset..end])
    }
}

impl<const N: usize> Default for ProtocolStack<N> {
    fn default() -> Self {
        Self::new()
    }
}
