//! Build a full packet through the public API and decode it again

use netstack_core::{Error, Result};
use netstack_packet::{
    crc32, Buffer, Callbacks, EtherType, EthernetFrame, IpProtocol, Ipv6Address, Ipv6Header,
    MacAddress, Mutator, Protocol, ProtocolStack, TcpFlags, TcpPort, TcpSegment,
};

struct Client;

impl Mutator for Client {
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
        segment.set_source("20")?;
        segment.set_destination("80")?;
        segment.sequence = 1000;
        segment.control_bits = TcpFlags::SYN | TcpFlags::ACK;
        segment.window_size = 0xFFFF;
        Ok(())
    }
}

fn build(storage: &mut [u8], payload: &[u8]) -> Result<usize> {
    let mut stack: ProtocolStack = ProtocolStack::new();
    stack.push_ethernet()?;
    stack.push_ipv6()?;
    stack.push_tcp()?;
    stack.mutate(&mut Client)?;

    let mut buffer = Buffer::new(storage);
    buffer.append(payload)?;
    stack.pack(&mut buffer)?;
    stack.done();

    Ok(buffer.size())
}

#[test]
fn test_build_and_parse_tcp_packet() {
    let mut storage = [0u8; 256];
    let size = build(&mut storage, b"Hello, world!").unwrap();
    let packet = &storage[..size];

    assert_eq!(size, 87);

    let mut stack: ProtocolStack = ProtocolStack::new();
    let offset = stack.unpack(packet).unwrap();

    assert_eq!(offset, 74);
    assert_eq!(&packet[offset..], b"Hello, world!");

    let layers: Vec<&Protocol> = stack.iter().collect();
    assert_eq!(layers.len(), 3);

    match layers[0] {
        Protocol::Ethernet(frame) => {
            assert_eq!(frame.source, MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]));
            assert_eq!(frame.destination, MacAddress([0x33, 0x44, 0x55, 0x66, 0x77, 0x88]));
            assert_eq!(frame.ethertype, EtherType::IPv6);
        }
        other => panic!("expected Ethernet, got {other:?}"),
    }

    match layers[1] {
        Protocol::Ipv6(header) => {
            let source: Ipv6Address = "2001:0:3238:dfe1:63:0:0:fefb".parse().unwrap();
            assert_eq!(header.source, source);
            assert_eq!(
                header.destination.to_string(),
                "2001:0db8:85a3:0000:0000:8a2e:0370:7334"
            );
            assert_eq!(header.protocol, IpProtocol::TCP);
            assert_eq!(header.hop_limit, 255);
            assert_eq!(header.length, 33);
        }
        other => panic!("expected IPv6, got {other:?}"),
    }

    match layers[2] {
        Protocol::Tcp(segment) => {
            assert_eq!(segment.source_port, TcpPort::FTP_DATA);
            assert_eq!(segment.destination_port, TcpPort::HTTP);
            assert_eq!(segment.sequence, 1000);
            assert_eq!(segment.control_bits, TcpFlags::SYN_ACK);
            assert_eq!(segment.window_size, 0xFFFF);
            assert_eq!(segment.checksum, 0);
        }
        other => panic!("expected TCP, got {other:?}"),
    }
}

#[test]
fn test_identical_builds_have_identical_crc() {
    let mut first = [0u8; 128];
    let mut second = [0xEEu8; 128];

    let a = build(&mut first, b"payload").unwrap();
    let b = build(&mut second, b"payload").unwrap();

    assert_eq!(a, b);
    assert_eq!(crc32(&first[..a]), crc32(&second[..b]));
}

#[test]
fn test_build_fails_when_storage_too_small() {
    let mut storage = [0u8; 86];
    let err = build(&mut storage, b"Hello, world!").unwrap_err();
    assert!(err.is_capacity());
}

#[test]
fn test_callback_error_aborts_before_packing() {
    let mut stack: ProtocolStack = ProtocolStack::new();
    stack.push_ethernet().unwrap();
    stack.push_tcp().unwrap();

    let mut bad_mac = |frame: &mut EthernetFrame| frame.set_destination("not-a-mac");
    let mut callbacks = Callbacks::new().on_ethernet(&mut bad_mac);

    let err = stack.mutate(&mut callbacks).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
    assert_eq!(stack.get(1), Some(&Protocol::Tcp(TcpSegment::new())));
}
