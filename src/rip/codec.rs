// RIPv2 payload codec
//
// All byte-order handling for the RIP payload lives here. Values cross the
// boundary exactly once: big-endian bytes on the wire, host-order integers
// in RipMessage.

use std::net::Ipv4Addr;
use thiserror::Error;

use super::{Command, RipEntry, RipMessage, INFINITY, MAX_ENTRIES, RIP_VERSION};

/// Length of the command/version/zero header
pub const HEADER_LEN: usize = 4;
/// Length of one route entry
pub const ENTRY_LEN: usize = 20;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    #[error("The datagram is too short")]
    Truncated,
    #[error("Declared length {declared} exceeds the {actual} bytes received")]
    LengthExceedsBuffer { declared: usize, actual: usize },
    #[error("Not an IPv4 UDP datagram")]
    NotIpv4Udp,
    #[error("Unknown RIP command {0}")]
    UnknownCommand(u8),
    #[error("Expected RIP version 2, found {0}")]
    BadVersion(u8),
    #[error("A reserved zero field is nonzero")]
    NonZeroReserved,
    #[error("Expected address family {expected}, found {found}")]
    BadFamily { expected: u16, found: u16 },
    #[error("Route tag {0} is not zero")]
    NonZeroRouteTag(u16),
    #[error("Mask {0:#010x} is not a contiguous prefix mask")]
    InvalidMask(u32),
    #[error("Metric {0} is outside 1..=16")]
    MetricOutOfRange(u32),
}

/// Parses a RIP payload (the bytes after the UDP header).
///
/// Parsing stops after [`MAX_ENTRIES`] entries; anything beyond, including a
/// trailing partial entry, is ignored.
pub fn decode(payload: &[u8]) -> Result<RipMessage, FormatError> {
    if payload.len() < HEADER_LEN {
        return Err(FormatError::Truncated);
    }

    let command = Command::from_u8(payload[0]).ok_or(FormatError::UnknownCommand(payload[0]))?;
    if payload[1] != RIP_VERSION {
        return Err(FormatError::BadVersion(payload[1]));
    }
    if read_u16_be(payload, 2) != 0 {
        return Err(FormatError::NonZeroReserved);
    }

    let mut message = RipMessage::new(command);
    for chunk in payload[HEADER_LEN..].chunks_exact(ENTRY_LEN).take(MAX_ENTRIES) {
        let entry = decode_entry(command, chunk)?;
        // take() keeps us under the cap
        let _ = message.try_push(entry);
    }
    Ok(message)
}

fn decode_entry(command: Command, chunk: &[u8]) -> Result<RipEntry, FormatError> {
    let family = read_u16_be(chunk, 0);
    if family != command.address_family() {
        return Err(FormatError::BadFamily {
            expected: command.address_family(),
            found: family,
        });
    }

    let tag = read_u16_be(chunk, 2);
    if tag != 0 {
        return Err(FormatError::NonZeroRouteTag(tag));
    }

    let mask = read_u32_be(chunk, 8);
    if !is_valid_mask(mask) {
        return Err(FormatError::InvalidMask(mask));
    }

    let metric = read_u32_be(chunk, 16);
    if !(1..=INFINITY).contains(&metric) {
        return Err(FormatError::MetricOutOfRange(metric));
    }

    Ok(RipEntry {
        address: Ipv4Addr::from(read_u32_be(chunk, 4)),
        mask: Ipv4Addr::from(mask),
        next_hop: Ipv4Addr::from(read_u32_be(chunk, 12)),
        metric,
    })
}

/// Serializes a message. The output is always `4 + 20 * entries` bytes.
pub fn encode(message: &RipMessage) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + ENTRY_LEN * message.len());
    encode_into(message, &mut buf);
    buf
}

/// Appends the serialized message to `buf`.
pub fn encode_into(message: &RipMessage, buf: &mut Vec<u8>) {
    buf.push(message.command as u8);
    buf.push(RIP_VERSION);
    write_u16_be(buf, 0);

    let family = message.command.address_family();
    for entry in message.entries() {
        write_u16_be(buf, family);
        write_u16_be(buf, 0);
        write_u32_be(buf, u32::from(entry.address));
        write_u32_be(buf, u32::from(entry.mask));
        write_u32_be(buf, u32::from(entry.next_hop));
        write_u32_be(buf, entry.metric);
    }
}

/// A mask is valid when its set bits run contiguously from the MSB.
/// The all-zero mask is valid.
pub fn is_valid_mask(mask: u32) -> bool {
    mask.leading_ones() + mask.trailing_zeros() == 32
}

pub(crate) fn read_u16_be(buf: &[u8], offset: usize) -> u16 {
    (u16::from(buf[offset]) << 8) | u16::from(buf[offset + 1])
}

pub(crate) fn read_u32_be(buf: &[u8], offset: usize) -> u32 {
    (u32::from(buf[offset]) << 24)
        | (u32::from(buf[offset + 1]) << 16)
        | (u32::from(buf[offset + 2]) << 8)
        | u32::from(buf[offset + 3])
}

pub(crate) fn write_u16_be(buf: &mut Vec<u8>, value: u16) {
    buf.push((value >> 8) as u8);
    buf.push(value as u8);
}

pub(crate) fn write_u32_be(buf: &mut Vec<u8>, value: u32) {
    buf.push((value >> 24) as u8);
    buf.push((value >> 16) as u8);
    buf.push((value >> 8) as u8);
    buf.push(value as u8);
}
