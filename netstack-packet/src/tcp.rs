//! TCP header codec
//!
//! ```text
//! offset 0   source port                                   2 bytes
//! offset 2   destination port                              2 bytes
//! offset 4   sequence number                               4 bytes
//! offset 8   acknowledgment number                         4 bytes
//! offset 12  data offset (4 bits) + reserved (3) + NS (1)  1 byte
//! offset 13  CWR ECE URG ACK PSH RST SYN FIN               1 byte
//! offset 14  window size                                   2 bytes
//! offset 16  checksum                                      2 bytes
//! offset 18  urgent pointer                                2 bytes
//! ```
//!
//! Options are never written. The checksum is written as zero; computing it
//! needs the IPv6 pseudo-header, which this codec does not see.

use crate::buffer::Buffer;
use crate::mutator::Mutator;
use bytes::{Buf, BufMut};
use netstack_core::{Error, Result};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;
use tracing::trace;

/// TCP port number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct TcpPort(pub u16);

impl TcpPort {
    /// FTP Data (20)
    pub const FTP_DATA: TcpPort = TcpPort(20);

    /// SSH (22)
    pub const SSH: TcpPort = TcpPort(22);

    /// HTTP (80)
    pub const HTTP: TcpPort = TcpPort(80);

    /// HTTPS (443)
    pub const HTTPS: TcpPort = TcpPort(443);

    pub fn new(port: u16) -> Self {
        TcpPort(port)
    }

    pub fn to_u16(self) -> u16 {
        self.0
    }
}

/// Parses decimal digits only: no sign, no whitespace.
///
/// Non-digit input is an [`Error::Parse`]; a value above 65535 is an
/// [`Error::Validation`].
impl FromStr for TcpPort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::parse("empty port"));
        }

        let mut value: u64 = 0;
        for c in s.bytes() {
            if !c.is_ascii_digit() {
                return Err(Error::parse("port contains a non-digit character"));
            }
            value = value.saturating_mul(10).saturating_add((c - b'0') as u64);
        }

        u16::try_from(value)
            .map(TcpPort)
            .map_err(|_| Error::validation("port", value))
    }
}

impl fmt::Display for TcpPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for TcpPort {
    fn from(port: u16) -> Self {
        TcpPort(port)
    }
}

impl From<TcpPort> for u16 {
    fn from(port: TcpPort) -> Self {
        port.0
    }
}

/// TCP control bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TcpFlags {
    /// NS - ECN-nonce concealment protection
    pub ns: bool,
    /// CWR - Congestion Window Reduced
    pub cwr: bool,
    /// ECE - ECN-Echo
    pub ece: bool,
    /// URG - Urgent pointer field is significant
    pub urg: bool,
    /// ACK - Acknowledgment field is significant
    pub ack: bool,
    /// PSH - Push function
    pub psh: bool,
    /// RST - Reset the connection
    pub rst: bool,
    /// SYN - Synchronize sequence numbers
    pub syn: bool,
    /// FIN - No more data from sender
    pub fin: bool,
}

impl TcpFlags {
    /// No flags set
    pub const NONE: TcpFlags = TcpFlags {
        ns: false,
        cwr: false,
        ece: false,
        urg: false,
        ack: false,
        psh: false,
        rst: false,
        syn: false,
        fin: false,
    };

    pub const NS: TcpFlags = TcpFlags { ns: true, ..Self::NONE };
    pub const CWR: TcpFlags = TcpFlags { cwr: true, ..Self::NONE };
    pub const ECE: TcpFlags = TcpFlags { ece: true, ..Self::NONE };
    pub const URG: TcpFlags = TcpFlags { urg: true, ..Self::NONE };
    pub const ACK: TcpFlags = TcpFlags { ack: true, ..Self::NONE };
    pub const PSH: TcpFlags = TcpFlags { psh: true, ..Self::NONE };
    pub const RST: TcpFlags = TcpFlags { rst: true, ..Self::NONE };
    pub const SYN: TcpFlags = TcpFlags { syn: true, ..Self::NONE };
    pub const FIN: TcpFlags = TcpFlags { fin: true, ..Self::NONE };

    /// SYN+ACK flags (connection acknowledgment)
    pub const SYN_ACK: TcpFlags = TcpFlags {
        syn: true,
        ack: true,
        ..Self::NONE
    };

    pub fn new() -> Self {
        TcpFlags::NONE
    }

    /// The nine flags as bits 8..0, NS being bit 8
    pub fn to_u16(self) -> u16 {
        let mut flags = 0u16;
        if self.fin {
            flags |= 0b0_0000_0001;
        }
        if self.syn {
            flags |= 0b0_0000_0010;
        }
        if self.rst {
            flags |= 0b0_0000_0100;
        }
        if self.psh {
            flags |= 0b0_0000_1000;
        }
        if self.ack {
            flags |= 0b0_0001_0000;
        }
        if self.urg {
            flags |= 0b0_0010_0000;
        }
        if self.ece {
            flags |= 0b0_0100_0000;
        }
        if self.cwr {
            flags |= 0b0_1000_0000;
        }
        if self.ns {
            flags |= 0b1_0000_0000;
        }
        flags
    }

    /// Parse flags from the low nine bits; higher bits are ignored
    pub fn from_u16(value: u16) -> Self {
        TcpFlags {
            fin: (value & 0b0_0000_0001) != 0,
            syn: (value & 0b0_0000_0010) != 0,
            rst: (value & 0b0_0000_0100) != 0,
            psh: (value & 0b0_0000_1000) != 0,
            ack: (value & 0b0_0001_0000) != 0,
            urg: (value & 0b0_0010_0000) != 0,
            ece: (value & 0b0_0100_0000) != 0,
            cwr: (value & 0b0_1000_0000) != 0,
            ns: (value & 0b1_0000_0000) != 0,
        }
    }

    pub fn is_empty(self) -> bool {
        self == Self::NONE
    }
}

impl BitOr for TcpFlags {
    type Output = TcpFlags;

    fn bitor(self, rhs: TcpFlags) -> TcpFlags {
        TcpFlags::from_u16(self.to_u16() | rhs.to_u16())
    }
}

impl BitOrAssign for TcpFlags {
    fn bitor_assign(&mut self, rhs: TcpFlags) {
        *self = *self | rhs;
    }
}

/// TCP header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpSegment {
    /// Source port
    pub source_port: TcpPort,
    /// Destination port
    pub destination_port: TcpPort,
    /// Sequence number
    pub sequence: u32,
    /// Acknowledgment number
    pub acknowledgment: u32,
    /// Header length in 32-bit words, as last read; `pack` always writes 5
    pub data_offset: u8,
    /// Control bits
    pub control_bits: TcpFlags,
    /// Window size
    pub window_size: u16,
    /// Checksum, as last read; `pack` always writes 0
    pub checksum: u16,
    /// Urgent pointer
    pub urgent_pointer: u16,
}

impl TcpSegment {
    /// TCP header size without options
    pub const HEADER_SIZE: usize = 20;

    /// Data offset of a header without options
    pub const DEFAULT_DATA_OFFSET: u8 = 5;

    pub fn new() -> Self {
        TcpSegment {
            source_port: TcpPort::default(),
            destination_port: TcpPort::default(),
            sequence: 0,
            acknowledgment: 0,
            data_offset: Self::DEFAULT_DATA_OFFSET,
            control_bits: TcpFlags::NONE,
            window_size: 0,
            checksum: 0,
            urgent_pointer: 0,
        }
    }

    pub fn set_source(&mut self, text: &str) -> Result<()> {
        self.source_port = text.parse()?;
        Ok(())
    }

    pub fn set_destination(&mut self, text: &str) -> Result<()> {
        self.destination_port = text.parse()?;
        Ok(())
    }

    /// Prepend this header to `buffer`
    pub fn pack(&self, buffer: &mut Buffer<'_>) -> Result<()> {
        buffer.shift(Self::HEADER_SIZE)?;

        let flags = self.control_bits.to_u16();

        let mut header = &mut buffer[..Self::HEADER_SIZE];
        header.put_u16(self.source_port.to_u16());
        header.put_u16(self.destination_port.to_u16());
        header.put_u32(self.sequence);
        header.put_u32(self.acknowledgment);
        header.put_u8((Self::DEFAULT_DATA_OFFSET << 4) | (flags >> 8) as u8);
        header.put_u8(flags as u8);
        header.put_u16(self.window_size);
        header.put_u16(0);
        header.put_u16(self.urgent_pointer);

        trace!(
            src = %self.source_port,
            dst = %self.destination_port,
            seq = self.sequence,
            flags = flags,
            "Packed TCP header"
        );
        Ok(())
    }

    /// Read the header at the front of `bytes`
    ///
    /// Options, if the data offset announces any, are skipped; see
    /// [`TcpSegment::header_len`].
    pub fn unpack(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() < Self::HEADER_SIZE {
            return Err(Error::format("TCP header truncated"));
        }

        let data_offset = bytes[12] >> 4;
        if data_offset < Self::DEFAULT_DATA_OFFSET {
            return Err(Error::format("TCP data offset below 5 words"));
        }
        if bytes.len() < data_offset as usize * 4 {
            return Err(Error::format("TCP options truncated"));
        }

        let mut header = &bytes[..Self::HEADER_SIZE];
        self.source_port = TcpPort(header.get_u16());
        self.destination_port = TcpPort(header.get_u16());
        self.sequence = header.get_u32();
        self.acknowledgment = header.get_u32();
        self.data_offset = data_offset;
        self.control_bits = TcpFlags::from_u16(header.get_u16());
        self.window_size = header.get_u16();
        self.checksum = header.get_u16();
        self.urgent_pointer = header.get_u16();

        trace!(
            src = %self.source_port,
            dst = %self.destination_port,
            seq = self.sequence,
            header_len = self.header_len(),
            "Unpacked TCP header"
        );
        Ok(())
    }

    pub fn mutate<M: Mutator + ?Sized>(&mut self, mutator: &mut M) -> Result<()> {
        mutator.mutate_tcp(self)
    }

    /// Header length in bytes as announced by the data offset
    ///
    /// This is what `unpack` consumed. `pack` always writes
    /// [`TcpSegment::HEADER_SIZE`] bytes.
    pub fn header_len(&self) -> usize {
        self.data_offset as usize * 4
    }
}

impl Default for TcpSegment {
    fn default() -> Self {
        Self::new()
    }
}
