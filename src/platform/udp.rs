// UDP socket platform: runs the router over the host's IP stack
//
// The kernel owns IP and Ethernet here, so datagrams are rebuilt around the
// UDP payload on receive and unwrapped again on send. Multicast advertisements
// go out as directed broadcasts so each one leaves through the right subnet.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;

use super::{Frame, MacAddr, Platform};
use crate::error::{RouterError, RouterResult};
use crate::rip::{datagram, MULTICAST_ADDR};
use crate::router::Interface;
use crate::routes::InterfaceId;
use crate::Ticks;

const RECV_BUFFER_LEN: usize = 2048;

pub struct UdpPlatform {
    socket: UdpSocket,
    interfaces: Vec<Interface>,
    started: Instant,
    buf: Vec<u8>,
}

impl UdpPlatform {
    pub async fn bind(interfaces: Vec<Interface>, port: u16) -> RouterResult<Self> {
        let socket = UdpSocket::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)).await?;
        socket.set_broadcast(true)?;
        socket.set_multicast_loop_v4(false)?;

        for interface in interfaces.iter().filter(|i| i.enabled) {
            if let Err(e) = socket.join_multicast_v4(MULTICAST_ADDR, interface.address) {
                tracing::warn!("Failed to join {} on {}: {}", MULTICAST_ADDR, interface.address, e);
            }
        }
        tracing::info!("RIP socket bound on port {}", port);

        Ok(UdpPlatform {
            socket,
            interfaces,
            started: Instant::now(),
            buf: vec![0u8; RECV_BUFFER_LEN],
        })
    }

    /// The interface whose subnet contains `source`
    fn interface_for(&self, source: Ipv4Addr) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.subnet().contains(source))
    }

    fn interface(&self, id: InterfaceId) -> RouterResult<&Interface> {
        self.interfaces
            .iter()
            .find(|i| i.id == id)
            .ok_or_else(|| RouterError::Platform(format!("unknown interface {}", id)))
    }
}

impl Platform for UdpPlatform {
    async fn send_packet(&mut self, interface: InterfaceId, packet: &[u8], _destination_mac: MacAddr) -> RouterResult<()> {
        let (envelope, payload) = datagram::parse(packet)?;
        let target = if *envelope.destination.ip() == MULTICAST_ADDR {
            self.interface(interface)?.broadcast()
        } else {
            *envelope.destination.ip()
        };
        let target = SocketAddrV4::new(target, envelope.destination.port());
        self.socket.send_to(payload, target).await?;
        Ok(())
    }

    async fn receive_packet(&mut self, interface_mask: u64, timeout: Duration) -> RouterResult<Option<Frame>> {
        let (len, from) = match tokio::time::timeout(timeout, self.socket.recv_from(&mut self.buf)).await {
            Err(_) => return Ok(None),
            Ok(result) => result?,
        };
        let SocketAddr::V4(from) = from else {
            return Ok(None);
        };

        let Some(interface) = self.interface_for(*from.ip()) else {
            tracing::debug!("Datagram from {} matches no interface", from);
            return Ok(None);
        };
        if interface.id >= 64 || interface_mask & (1u64 << interface.id) == 0 {
            return Ok(None);
        }

        let local = SocketAddrV4::new(interface.address, self.socket.local_addr()?.port());
        Ok(Some(Frame {
            packet: datagram::build(from, local, &self.buf[..len]),
            source_mac: MacAddr::default(),
            destination_mac: MacAddr::default(),
            interface: interface.id,
        }))
    }

    async fn resolve_next_hop_mac(&mut self, _interface: InterfaceId, _addr: Ipv4Addr) -> Option<MacAddr> {
        // neighbour resolution is the kernel's job on this platform
        None
    }

    async fn forward_packet(&mut self, _interface: InterfaceId, _packet: &[u8], _next_hop_mac: MacAddr) -> RouterResult<()> {
        Err(RouterError::Platform(
            "transit forwarding is left to the host kernel".to_string(),
        ))
    }

    fn now(&self) -> Ticks {
        self.started.elapsed().as_millis() as Ticks
    }
}
