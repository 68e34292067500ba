// Daemon - cooperative event loop tying the router to a platform
//
// One task owns the router. Each step waits for a datagram until the next
// timer deadline, handles it, services the timers and publishes a snapshot
// of the table for the API.

use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::sync::watch;

use crate::error::{RouterError, RouterResult};
use crate::platform::{Frame, MacAddr, Platform};
use crate::rip::datagram;
use crate::router::{Outbound, Router};
use crate::routes::TableSnapshot;
use crate::Ticks;

/// Longest single wait for input, so snapshots stay fresh on a quiet link
const MAX_RECEIVE_WAIT: Ticks = 1_000;

pub struct Daemon<P: Platform> {
    router: Router,
    platform: P,
    hostname: String,
    snapshots: watch::Sender<TableSnapshot>,
}

impl<P: Platform> Daemon<P> {
    pub fn new(router: Router, platform: P, hostname: String, snapshots: watch::Sender<TableSnapshot>) -> Self {
        Daemon {
            router,
            platform,
            hostname,
            snapshots,
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Asks every neighbour for its table, then runs until the task is dropped.
    pub async fn run(&mut self) {
        self.start().await;
        loop {
            self.step().await;
        }
    }

    pub async fn start(&mut self) {
        let requests = self.router.startup_requests();
        tracing::info!("Sending {} startup request(s)", requests.len());
        self.transmit(requests, None).await;
        self.publish();
    }

    /// One pass: receive at most one datagram, then service due timers.
    pub async fn step(&mut self) {
        let now = self.platform.now();
        let wait = (self.router.next_deadline() - now).clamp(0, MAX_RECEIVE_WAIT);

        match self
            .platform
            .receive_packet(self.router.interface_mask(), Duration::from_millis(wait as u64))
            .await
        {
            Ok(Some(frame)) => self.dispatch(frame).await,
            Ok(None) => {}
            Err(e) => report("Receive failed", &e),
        }

        let now = self.platform.now();
        let outbound = self.router.poll_timers(now);
        self.transmit(outbound, None).await;
        self.publish();
    }

    async fn dispatch(&mut self, frame: Frame) {
        let Some(destination) = datagram::destination(&frame.packet) else {
            tracing::debug!("Dropping non-IPv4 frame on if {}", frame.interface);
            return;
        };

        if !self.router.accepts(destination) {
            if let Err(e) = self.forward(&frame.packet, destination).await {
                report("Forwarding failed", &e);
            }
            return;
        }

        let now = self.platform.now();
        match self.router.handle_datagram(frame.interface, &frame.packet, now) {
            Ok(replies) => self.transmit(replies, Some(frame.source_mac)).await,
            Err(e) => report(
                &format!("Dropped datagram on if {}", frame.interface),
                &RouterError::from(e),
            ),
        }
    }

    async fn forward(&mut self, packet: &[u8], destination: Ipv4Addr) -> RouterResult<()> {
        let (next_hop, interface) = self.router.next_hop(destination)?;
        let mac = self
            .platform
            .resolve_next_hop_mac(interface, next_hop)
            .await
            .ok_or_else(|| RouterError::Platform(format!("no link address for {}", next_hop)))?;
        self.platform.forward_packet(interface, packet, mac).await
    }

    /// Sends router output. Unicast replies go back to `reply_mac` when known.
    async fn transmit(&mut self, outbound: Vec<Outbound>, reply_mac: Option<MacAddr>) {
        for out in outbound {
            let mac = if out.is_multicast() {
                MacAddr::ipv4_multicast(out.destination)
            } else if let Some(mac) = reply_mac {
                mac
            } else {
                match self.platform.resolve_next_hop_mac(out.interface, out.destination).await {
                    Some(mac) => mac,
                    None => {
                        tracing::debug!("No link address for {}, dropping reply", out.destination);
                        continue;
                    }
                }
            };

            if let Err(e) = self.platform.send_packet(out.interface, &out.packet, mac).await {
                report(&format!("Send on if {} failed", out.interface), &e);
            }
        }
    }

    fn publish(&self) {
        self.snapshots
            .send_replace(TableSnapshot::capture(&self.hostname, self.router.table()));
    }
}

fn report(context: &str, e: &RouterError) {
    if e.is_per_message() {
        tracing::debug!("{}: {}", context, e);
    } else {
        tracing::warn!("{}: {}", context, e);
    }
}
