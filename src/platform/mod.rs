// Platform module - packet I/O and clock the router core depends on

pub mod udp;

use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::error::RouterResult;
use crate::routes::InterfaceId;
use crate::Ticks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Ethernet address for an IPv4 multicast group (RFC 1112)
    pub fn ipv4_multicast(group: Ipv4Addr) -> Self {
        let octets = group.octets();
        MacAddr([0x01, 0x00, 0x5e, octets[1] & 0x7f, octets[2], octets[3]])
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// An IPv4 datagram received on a numbered interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub packet: Vec<u8>,
    pub source_mac: MacAddr,
    pub destination_mac: MacAddr,
    pub interface: InterfaceId,
}

/// Packet I/O, neighbour resolution and time.
///
/// Transit forwarding mechanics (TTL, checksum rewrite, ICMP) belong to the
/// implementation, not to the router core.
#[allow(async_fn_in_trait)]
pub trait Platform {
    /// Sends a complete IPv4 datagram out `interface`.
    async fn send_packet(&mut self, interface: InterfaceId, packet: &[u8], destination_mac: MacAddr) -> RouterResult<()>;

    /// Waits up to `timeout` for a datagram on any interface whose bit is set
    /// in `interface_mask`. `Ok(None)` means the wait timed out.
    async fn receive_packet(&mut self, interface_mask: u64, timeout: Duration) -> RouterResult<Option<Frame>>;

    async fn resolve_next_hop_mac(&mut self, interface: InterfaceId, addr: Ipv4Addr) -> Option<MacAddr>;

    /// Hands a transit datagram to the forwarding plane.
    async fn forward_packet(&mut self, interface: InterfaceId, packet: &[u8], next_hop_mac: MacAddr) -> RouterResult<()>;

    /// Monotonic milliseconds
    fn now(&self) -> Ticks;
}
