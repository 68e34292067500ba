// IPv4/UDP envelope around RIP payloads

use std::net::{Ipv4Addr, SocketAddrV4};

use super::codec::{self, read_u16_be, read_u32_be, write_u16_be, FormatError};
use super::RipMessage;

pub const IPV4_HEADER_LEN: usize = 20;
pub const UDP_HEADER_LEN: usize = 8;
pub const PROTOCOL_UDP: u8 = 0x11;
/// RIP traffic never leaves the link
pub const RIP_TTL: u8 = 1;

/// Addressing information taken from the IPv4 and UDP headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    pub source: SocketAddrV4,
    pub destination: SocketAddrV4,
    pub ttl: u8,
}

/// Splits an IPv4 datagram into its envelope and UDP payload.
///
/// Checksums are not verified.
pub fn parse(packet: &[u8]) -> Result<(Envelope, &[u8]), FormatError> {
    if packet.len() < IPV4_HEADER_LEN {
        return Err(FormatError::Truncated);
    }
    if packet[0] >> 4 != 4 {
        return Err(FormatError::NotIpv4Udp);
    }

    let header_len = usize::from(packet[0] & 0x0f) * 4;
    let total_len = usize::from(read_u16_be(packet, 2));
    if total_len > packet.len() {
        return Err(FormatError::LengthExceedsBuffer {
            declared: total_len,
            actual: packet.len(),
        });
    }
    if header_len < IPV4_HEADER_LEN || total_len < header_len + UDP_HEADER_LEN {
        return Err(FormatError::Truncated);
    }
    if packet[9] != PROTOCOL_UDP {
        return Err(FormatError::NotIpv4Udp);
    }

    let source = Ipv4Addr::from(read_u32_be(packet, 12));
    let destination = Ipv4Addr::from(read_u32_be(packet, 16));

    let udp = &packet[header_len..total_len];
    let udp_len = usize::from(read_u16_be(udp, 4));
    if udp_len < UDP_HEADER_LEN || udp_len > udp.len() {
        return Err(FormatError::Truncated);
    }

    let envelope = Envelope {
        source: SocketAddrV4::new(source, read_u16_be(udp, 0)),
        destination: SocketAddrV4::new(destination, read_u16_be(udp, 2)),
        ttl: packet[8],
    };
    Ok((envelope, &udp[UDP_HEADER_LEN..udp_len]))
}

/// Destination address of any IPv4 datagram, whatever it carries.
pub fn destination(packet: &[u8]) -> Option<Ipv4Addr> {
    if packet.len() < IPV4_HEADER_LEN || packet[0] >> 4 != 4 {
        return None;
    }
    Some(Ipv4Addr::from(read_u32_be(packet, 16)))
}

/// Parses an IPv4 datagram carrying a RIP message.
pub fn decode_datagram(packet: &[u8]) -> Result<(Envelope, RipMessage), FormatError> {
    let (envelope, payload) = parse(packet)?;
    Ok((envelope, codec::decode(payload)?))
}

/// Wraps `payload` in a 20-byte IPv4 header and a UDP header.
///
/// The IPv4 header checksum is filled in; the UDP checksum is left at zero.
pub fn build(source: SocketAddrV4, destination: SocketAddrV4, payload: &[u8]) -> Vec<u8> {
    let udp_len = UDP_HEADER_LEN + payload.len();
    let total_len = IPV4_HEADER_LEN + udp_len;

    let mut packet = Vec::with_capacity(total_len);
    packet.push(0x45);
    packet.push(0);
    write_u16_be(&mut packet, total_len as u16);
    // identification, flags, fragment offset
    packet.extend_from_slice(&[0, 0, 0, 0]);
    packet.push(RIP_TTL);
    packet.push(PROTOCOL_UDP);
    write_u16_be(&mut packet, 0);
    packet.extend_from_slice(&source.ip().octets());
    packet.extend_from_slice(&destination.ip().octets());

    let checksum = header_checksum(&packet);
    packet[10..12].copy_from_slice(&checksum.to_be_bytes());

    write_u16_be(&mut packet, source.port());
    write_u16_be(&mut packet, destination.port());
    write_u16_be(&mut packet, udp_len as u16);
    write_u16_be(&mut packet, 0);
    packet.extend_from_slice(payload);
    packet
}

/// Encodes `message` and wraps it for sending.
pub fn encode_datagram(source: SocketAddrV4, destination: SocketAddrV4, message: &RipMessage) -> Vec<u8> {
    build(source, destination, &codec::encode(message))
}

/// RFC 1071 checksum over an IPv4 header, skipping the checksum field itself.
pub fn header_checksum(header: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    for (index, word) in header.chunks(2).enumerate() {
        if index == 5 {
            continue;
        }
        let high = u32::from(word[0]) << 8;
        let low = word.get(1).copied().map(u32::from).unwrap_or(0);
        sum += high | low;
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}
