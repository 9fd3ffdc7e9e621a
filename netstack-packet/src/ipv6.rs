//! IPv6 header codec
//!
//! Only the fixed 40-byte header is handled; extension headers, traffic
//! class and flow label are not.
//!
//! ```text
//! offset 0   version (4 bits) + traffic class/flow label (zero)   4 bytes
//! offset 4   payload length                                      2 bytes
//! offset 6   next header                                         1 byte
//! offset 7   hop limit                                           1 byte
//! offset 8   source address                                     16 bytes
//! offset 24  destination address                                16 bytes
//! ```

use crate::buffer::Buffer;
use crate::ethernet::parse_hex_group;
use crate::mutator::Mutator;
use bytes::{Buf, BufMut};
use netstack_core::{Error, Result};
use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;
use tracing::trace;

/// Hop limit of a freshly initialized header
pub const DEFAULT_HOP_LIMIT: u8 = 255;

const VERSION: u8 = 6;

/// Next header values this library knows how to name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpProtocol {
    /// TCP (6)
    TCP,
    /// UDP (17)
    UDP,
    /// Anything else, with the code seen on the wire
    Unknown(u8),
}

impl IpProtocol {
    pub fn from_u8(value: u8) -> Self {
        match value {
            6 => IpProtocol::TCP,
            17 => IpProtocol::UDP,
            val => IpProtocol::Unknown(val),
        }
    }

    /// Wire code, or `None` for protocols that cannot be sent
    pub fn to_u8(self) -> Option<u8> {
        match self {
            IpProtocol::TCP => Some(6),
            IpProtocol::UDP => Some(17),
            IpProtocol::Unknown(_) => None,
        }
    }
}

impl fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpProtocol::TCP => write!(f, "TCP"),
            IpProtocol::UDP => write!(f, "UDP"),
            IpProtocol::Unknown(val) => write!(f, "Unknown({})", val),
        }
    }
}

/// IPv6 address (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Ipv6Address(pub [u8; 16]);

impl Ipv6Address {
    /// The all-zero address
    pub const UNSPECIFIED: Ipv6Address = Ipv6Address([0; 16]);

    pub fn new(octets: [u8; 16]) -> Self {
        Ipv6Address(octets)
    }

    pub fn octets(&self) -> &[u8; 16] {
        &self.0
    }
}

/// Parses the fully expanded form: eight colon-separated groups of one to
/// four hex digits.
///
/// The `::` shorthand is not supported. It shows up as an empty group and
/// is rejected with [`Error::Parse`], as is a wrong number of groups.
impl FromStr for Ipv6Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut octets = [0u8; 16];
        let mut groups = s.split(':');

        for pair in octets.chunks_exact_mut(2) {
            let group = groups
                .next()
                .ok_or(Error::parse("IPv6 address has fewer than 8 groups"))?;
            pair.copy_from_slice(&parse_hex_group(group, 4)?.to_be_bytes());
        }

        if groups.next().is_some() {
            return Err(Error::parse("IPv6 address has more than 8 groups"));
        }

        Ok(Ipv6Address(octets))
    }
}

/// Always fully expanded: `2001:0db8:0000:0000:0000:8a2e:0370:7334`
impl fmt::Display for Ipv6Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pair) in self.0.chunks_exact(2).enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{:02x}{:02x}", pair[0], pair[1])?;
        }
        Ok(())
    }
}

impl From<Ipv6Addr> for Ipv6Address {
    fn from(addr: Ipv6Addr) -> Self {
        Ipv6Address(addr.octets())
    }
}

impl From<Ipv6Address> for Ipv6Addr {
    fn from(addr: Ipv6Address) -> Self {
        Ipv6Addr::from(addr.0)
    }
}

/// IPv6 fixed header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6Header {
    /// Source address
    pub source: Ipv6Address,
    /// Destination address
    pub destination: Ipv6Address,
    /// Hop limit
    pub hop_limit: u8,
    /// Next header
    pub protocol: IpProtocol,
    /// Payload length, written by `pack` and read by `unpack`
    pub length: u16,
}

impl Ipv6Header {
    /// IPv6 fixed header size
    pub const HEADER_SIZE: usize = 40;

    pub fn new() -> Self {
        Ipv6Header {
            source: Ipv6Address::UNSPECIFIED,
            destination: Ipv6Address::UNSPECIFIED,
            hop_limit: DEFAULT_HOP_LIMIT,
            protocol: IpProtocol::TCP,
            length: 0,
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
    ///
    /// The buffer's current content is the payload; its size becomes the
    /// payload length field. The next header code and the length are
    /// checked before the buffer is shifted, so a failure leaves it intact.
    pub fn pack(&self, buffer: &mut Buffer<'_>) -> Result<()> {
        let next_header = self
            .protocol
            .to_u8()
            .ok_or_else(|| Error::unsupported("IPv6 next header", self.next_header_code()))?;

        let data_size = buffer.size();
        let length = u16::try_from(data_size)
            .map_err(|_| Error::validation("IPv6 payload length", data_size as u64))?;

        buffer.shift(Self::HEADER_SIZE)?;

        let mut header = &mut buffer[..Self::HEADER_SIZE];
        header.put_u32((VERSION as u32) << 28);
        header.put_u16(length);
        header.put_u8(next_header);
        header.put_u8(self.hop_limit);
        header.put_slice(self.source.octets());
        header.put_slice(self.destination.octets());

        trace!(
            src = %self.source,
            dst = %self.destination,
            protocol = %self.protocol,
            length,
            "Packed IPv6 header"
        );
        Ok(())
    }

    /// Read the header at the front of `bytes`
    ///
    /// An unrecognized next header is recorded as [`IpProtocol::Unknown`]
    /// together with the other fields, and then reported as
    /// [`Error::UnsupportedProtocol`].
    pub fn unpack(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() < Self::HEADER_SIZE {
            return Err(Error::format("IPv6 header truncated"));
        }

        let mut header = &bytes[..Self::HEADER_SIZE];
        let version = header.get_u8() >> 4;
        if version != VERSION {
            return Err(Error::format("IP version is not 6"));
        }
        header.advance(3);

        self.length = header.get_u16();
        self.protocol = IpProtocol::from_u8(header.get_u8());
        self.hop_limit = header.get_u8();
        header.copy_to_slice(&mut self.source.0);
        header.copy_to_slice(&mut self.destination.0);

        trace!(
            src = %self.source,
            dst = %self.destination,
            protocol = %self.protocol,
            length = self.length,
            "Unpacked IPv6 header"
        );

        match self.protocol {
            IpProtocol::Unknown(code) => Err(Error::unsupported("IPv6 next header", code as u16)),
            _ => Ok(()),
        }
    }

    pub fn mutate<M: Mutator + ?Sized>(&mut self, mutator: &mut M) -> Result<()> {
        mutator.mutate_ipv6(self)
    }

    pub fn header_len(&self) -> usize {
        Self::HEADER_SIZE
    }

    fn next_header_code(&self) -> u16 {
        match self.protocol {
            IpProtocol::TCP => 6,
            IpProtocol::UDP => 17,
            IpProtocol::Unknown(code) => code as u16,
        }
    }
}

impl Default for Ipv6Header {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SOURCE: &str = "2001:0000:3238:DFE1:0063:0000:0000:FEFB";
    const DESTINATION: &str = "2001:0db8:85a3:0000:0000:8a2e:0370:7334";

    #[test]
    fn test_ip_protocol_codes() {
        assert_eq!(IpProtocol::TCP.to_u8(), Some(6));
        assert_eq!(IpProtocol::UDP.to_u8(), Some(17));
        assert_eq!(IpProtocol::Unknown(58).to_u8(), None);
        assert_eq!(IpProtocol::from_u8(17), IpProtocol::UDP);
        assert_eq!(IpProtocol::from_u8(58), IpProtocol::Unknown(58));
    }

    #[test]
    fn test_address_parse() {
        let addr: Ipv6Address = DESTINATION.parse().unwrap();
        assert_eq!(
            addr.0,
            [
                0x20, 0x01, 0x0d, 0xb8, 0x85, 0xa3, 0x00, 0x00, 0x00, 0x00, 0x8a, 0x2e, 0x03,
                0x70, 0x73, 0x34
            ]
        );
    }

    #[test]
    fn test_address_parse_short_groups() {
        let addr: Ipv6Address = "2001:db8:0:0:0:0:0:1".parse().unwrap();
        assert_eq!(Ipv6Addr::from(addr), "2001:db8::1".parse::<Ipv6Addr>().unwrap());
    }

    #[test]
    fn test_address_display_is_expanded() {
        let addr: Ipv6Address = SOURCE.parse().unwrap();
        assert_eq!(addr.to_string(), "2001:0000:3238:dfe1:0063:0000:0000:fefb");
    }

    #[test]
    fn test_address_parse_rejects_invalid_characters() {
        for bad in [
            "2001:0db8:85a3:0000:0000:8a2e:0370:733g",
            "2001:0db8:85a3:0000:0000:8a2e:0370:7334 ",
            "2001.0db8.85a3.0000.0000.8a2e.0370.7334",
        ] {
            assert!(
                matches!(bad.parse::<Ipv6Address>(), Err(Error::Parse(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_address_parse_rejects_compressed_form() {
        for bad in ["::1", "2001:db8::1", "fe80::", "::"] {
            assert!(
                matches!(bad.parse::<Ipv6Address>(), Err(Error::Parse(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_address_parse_rejects_wrong_group_count() {
        assert!("2001:0db8:85a3:0000:0000:8a2e:0370".parse::<Ipv6Address>().is_err());
        assert!("2001:0db8:85a3:0000:0000:8a2e:0370:7334:0000"
            .parse::<Ipv6Address>()
            .is_err());
        assert!("20010db885a3000000008a2e03707334".parse::<Ipv6Address>().is_err());
        assert!("".parse::<Ipv6Address>().is_err());
    }

    #[test]
    fn test_ipv6_defaults() {
        let header = Ipv6Header::new();
        assert_eq!(header.hop_limit, 255);
        assert_eq!(header.protocol, IpProtocol::TCP);
        assert_eq!(header.source, Ipv6Address::UNSPECIFIED);
        assert_eq!(header.destination, Ipv6Address::UNSPECIFIED);
    }

    #[test]
    fn test_ipv6_pack() {
        let mut header = Ipv6Header::new();
        header.set_source(SOURCE).unwrap();
        header.set_destination(DESTINATION).unwrap();
        header.hop_limit = 64;

        let mut storage = [0u8; 128];
        storage[..5].copy_from_slice(b"hello");
        let mut buffer = Buffer::with_payload(&mut storage, 5).unwrap();

        header.pack(&mut buffer).unwrap();

        assert_eq!(buffer.size(), 45);
        assert_eq!(&buffer[0..4], &[0x60, 0x00, 0x00, 0x00]);
        assert_eq!(&buffer[4..6], &[0x00, 0x05]);
        assert_eq!(buffer[6], 6);
        assert_eq!(buffer[7], 64);
        assert_eq!(&buffer[8..24], header.source.octets());
        assert_eq!(&buffer[24..40], header.destination.octets());
        assert_eq!(&buffer[40..], b"hello");
    }

    #[test]
    fn test_ipv6_pack_udp_uses_decimal_17() {
        let mut header = Ipv6Header::new();
        header.protocol = IpProtocol::UDP;

        let mut storage = [0u8; 40];
        let mut buffer = Buffer::new(&mut storage);
        header.pack(&mut buffer).unwrap();

        assert_eq!(buffer[6], 17);
    }

    #[test]
    fn test_ipv6_pack_unknown_protocol_leaves_buffer_intact() {
        let mut header = Ipv6Header::new();
        header.protocol = IpProtocol::Unknown(58);

        let mut storage = [0u8; 64];
        storage[..3].copy_from_slice(b"abc");
        let mut buffer = Buffer::with_payload(&mut storage, 3).unwrap();

        let err = header.pack(&mut buffer).unwrap_err();

        assert_eq!(err, Error::unsupported("IPv6 next header", 58));
        assert_eq!(&buffer[..], b"abc");
    }

    #[test]
    fn test_ipv6_pack_payload_too_long() {
        let header = Ipv6Header::new();
        let mut storage = vec![0u8; 70_000];
        let mut buffer = Buffer::with_payload(&mut storage, 65_536).unwrap();

        let err = header.pack(&mut buffer).unwrap_err();

        assert!(matches!(err, Error::Validation { value: 65_536, .. }));
        assert_eq!(buffer.size(), 65_536);
    }

    #[test]
    fn test_ipv6_pack_no_room() {
        let header = Ipv6Header::new();
        let mut storage = [0u8; 50];
        let mut buffer = Buffer::with_payload(&mut storage, 11).unwrap();

        assert!(header.pack(&mut buffer).unwrap_err().is_capacity());
        assert_eq!(buffer.size(), 11);
    }

    #[test]
    fn test_ipv6_unpack() {
        let mut packed = Ipv6Header::new();
        packed.set_source(SOURCE).unwrap();
        packed.set_destination(DESTINATION).unwrap();
        packed.hop_limit = 7;
        packed.protocol = IpProtocol::UDP;

        let mut storage = [0u8; 64];
        storage[..2].copy_from_slice(&[0xCA, 0xFE]);
        let mut buffer = Buffer::with_payload(&mut storage, 2).unwrap();
        packed.pack(&mut buffer).unwrap();

        let mut header = Ipv6Header::new();
        header.unpack(&buffer).unwrap();

        assert_eq!(header.length, 2);
        assert_eq!(header.protocol, IpProtocol::UDP);
        assert_eq!(header.hop_limit, 7);
        assert_eq!(header.source, packed.source);
        assert_eq!(header.destination, packed.destination);
    }

    #[test]
    fn test_ipv6_unpack_wrong_version() {
        let mut data = [0u8; 40];
        data[0] = 0x45;
        data[6] = 6;

        let err = Ipv6Header::new().unpack(&data).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_ipv6_unpack_truncated() {
        let mut data = [0u8; 39];
        data[0] = 0x60;

        let err = Ipv6Header::new().unpack(&data).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_ipv6_unpack_unknown_next_header() {
        let mut data = [0u8; 40];
        data[0] = 0x60;
        data[6] = 58; // ICMPv6
        data[7] = 1;
        data[8] = 0xFE;

        let mut header = Ipv6Header::new();
        let err = header.unpack(&data).unwrap_err();

        assert_eq!(err, Error::unsupported("IPv6 next header", 58));
        assert_eq!(header.protocol, IpProtocol::Unknown(58));
        assert_eq!(header.hop_limit, 1);
        assert_eq!(header.source.0[0], 0xFE);
    }

    proptest! {
        #[test]
        fn expanded_address_round_trips(octets in any::<[u8; 16]>()) {
            let addr = Ipv6Address(octets);
            let parsed: Ipv6Address = addr.to_string().parse().unwrap();
            prop_assert_eq!(parsed, addr);
        }

        #[test]
        fn address_with_foreign_character_is_rejected(
            octets in any::<[u8; 16]>(),
            position in 0usize..39,
            c in any::<char>().prop_filter("not hex or colon", |c| !c.is_ascii_hexdigit() && *c != ':'),
        ) {
            let mut text: Vec<char> = Ipv6Address(octets).to_string().chars().collect();
            text[position] = c;
            let text: String = text.into_iter().collect();
            prop_assert!(matches!(text.parse::<Ipv6Address>(), Err(Error::Parse(_))));
        }
    }
}
