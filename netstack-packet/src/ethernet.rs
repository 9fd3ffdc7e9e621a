//! Ethernet II header codec
//!
//! ```text
//! offset 0   destination MAC   6 bytes
//! offset 6   source MAC        6 bytes
//! offset 12  EtherType         2 bytes
//! ```

use crate::buffer::Buffer;
use crate::mutator::Mutator;
use bytes::{Buf, BufMut};
use netstack_core::{Error, Result};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// EtherType values carried in the last two header bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EtherType {
    /// IPv4 (0x0800)
    IPv4,
    /// ARP (0x0806)
    ARP,
    /// VLAN-tagged frame (0x8100)
    VLAN,
    /// IPv6 (0x86DD)
    IPv6,
    /// Any other value
    Custom(u16),
}

impl EtherType {
    pub fn to_u16(self) -> u16 {
        match self {
            EtherType::IPv4 => 0x0800,
            EtherType::ARP => 0x0806,
            EtherType::VLAN => 0x8100,
            EtherType::IPv6 => 0x86DD,
            EtherType::Custom(val) => val,
        }
    }

    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0800 => EtherType::IPv4,
            0x0806 => EtherType::ARP,
            0x8100 => EtherType::VLAN,
            0x86DD => EtherType::IPv6,
            val => EtherType::Custom(val),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::IPv4 => write!(f, "IPv4"),
            EtherType::ARP => write!(f, "ARP"),
            EtherType::VLAN => write!(f, "VLAN"),
            EtherType::IPv6 => write!(f, "IPv6"),
            EtherType::Custom(val) => write!(f, "0x{:04X}", val),
        }
    }
}

/// MAC address (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Broadcast MAC address (FF:FF:FF:FF:FF:FF)
    pub const BROADCAST: MacAddress = MacAddress([0xFF; 6]);

    /// Zero MAC address (00:00:00:00:00:00)
    pub const ZERO: MacAddress = MacAddress([0x00; 6]);

    pub fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// Bit 0 of the first octet
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 == 0x01
    }
}

/// Parses `00:11:22:33:44:55`: six colon-separated groups of one or two
/// hex digits.
impl FromStr for MacAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut octets = [0u8; 6];
        let mut groups = s.split(':');

        for octet in octets.iter_mut() {
            let group = groups
                .next()
                .ok_or(Error::parse("MAC address has fewer than 6 octets"))?;
            *octet = parse_hex_group(group, 2)? as u8;
        }

        if groups.next().is_some() {
            return Err(Error::parse("MAC address has more than 6 octets"));
        }

        Ok(MacAddress(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}

impl From<MacAddress> for [u8; 6] {
    fn from(mac: MacAddress) -> Self {
        mac.0
    }
}

/// Parse one group of at most `max_digits` hex digits.
///
/// Shared with the IPv6 address parser.
pub(crate) fn parse_hex_group(group: &str, max_digits: usize) -> Result<u16> {
    if group.is_empty() {
        return Err(Error::parse("empty address group"));
    }
    if group.len() > max_digits {
        return Err(Error::parse("address group has too many digits"));
    }

    group.bytes().try_fold(0u16, |acc, c| {
        let digit = (c as char)
            .to_digit(16)
            .ok_or(Error::parse("invalid character in address"))?;
        Ok((acc << 4) | digit as u16)
    })
}

/// Ethernet II header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetFrame {
    /// Destination MAC address
    pub destination: MacAddress,
    /// Source MAC address
    pub source: MacAddress,
    /// EtherType of the payload
    pub ethertype: EtherType,
}

impl EthernetFrame {
    /// Ethernet header size (dst + src + type)
    pub const HEADER_SIZE: usize = 14;

    /// Zero addresses carrying IPv6
    pub fn new() -> Self {
        EthernetFrame {
            destination: MacAddress::ZERO,
            source: MacAddress::ZERO,
            ethertype: EtherType::IPv6,
        }
    }

    pub fn set_source(&mut self, text: &str) -> Result<()> {
        self.source = text.parse()?;
        Ok(())
    }

    pub fn set_destination(&mut self, text: &str) -> Result<()> {
        self.destination = text.parse()?;
        Ok(())
    }

    /// Prepend this header to `buffer`
    pub fn pack(&self, buffer: &mut Buffer<'_>) -> Result<()> {
        buffer.shift(Self::HEADER_SIZE)?;

        let mut header = &mut buffer[..Self::HEADER_SIZE];
        header.put_slice(self.destination.as_bytes());
        header.put_slice(self.source.as_bytes());
        header.put_u16(self.ethertype.to_u16());

        trace!(
            src = %self.source,
            dst = %self.destination,
            ethertype = %self.ethertype,
            "Packed Ethernet header"
        );
        Ok(())
    }

    /// Read the header at the front of `bytes`
    pub fn unpack(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() < Self::HEADER_SIZE {
            return Err(Error::format("Ethernet header truncated"));
        }

        let mut header = &bytes[..Self::HEADER_SIZE];
        header.copy_to_slice(&mut self.destination.0);
        header.copy_to_slice(&mut self.source.0);
        self.ethertype = EtherType::from_u16(header.get_u16());

        trace!(
            src = %self.source,
            dst = %self.destination,
            ethertype = %self.ethertype,
            "Unpacked Ethernet header"
        );
        Ok(())
    }

    pub fn mutate<M: Mutator + ?Sized>(&mut self, mutator: &mut M) -> Result<()> {
        mutator.mutate_ethernet(self)
    }

    pub fn header_len(&self) -> usize {
        Self::HEADER_SIZE
    }
}

impl Default for EthernetFrame {
    fn default() -> Self {
        Self::new()
    }
}
