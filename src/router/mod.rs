// Router module - RIP state machine: sessions, advertisement and aging

pub mod advertise;
pub mod aging;
pub mod session;
pub mod timers;

pub use timers::{Schedule, Timers};

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::net::Ipv4Addr;

use crate::error::{RouterError, RouterResult};
use crate::rip::MULTICAST_ADDR;
use crate::routes::{prefix, InterfaceId, Ipv4Prefix, Route, RoutingTable};
use crate::Ticks;

/// A local interface taking part in RIP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub id: InterfaceId,
    pub address: Ipv4Addr,
    pub prefix_len: u8,
    pub enabled: bool,
}

impl Interface {
    pub fn subnet(&self) -> Ipv4Prefix {
        Ipv4Prefix::truncating(self.address, self.prefix_len)
    }

    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.address) | !prefix::prefix_mask(self.prefix_len))
    }
}

#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub interfaces: Vec<Interface>,
    pub timers: Timers,
    /// Destination port for multicast advertisements
    pub port: u16,
}

/// A datagram the router wants sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub interface: InterfaceId,
    pub destination: Ipv4Addr,
    pub packet: Vec<u8>,
}

impl Outbound {
    pub fn is_multicast(&self) -> bool {
        self.destination == MULTICAST_ADDR
    }
}

/// Owns the routing table and everything that reads or writes it.
///
/// A single event loop drives it; nothing here locks.
pub struct Router {
    table: RoutingTable,
    interfaces: Vec<Interface>,
    timers: Timers,
    port: u16,
    schedule: Schedule,
    rng: StdRng,
}

impl Router {
    pub fn new(config: RouterConfig, now: Ticks) -> Self {
        Self::with_rng(config, now, StdRng::from_entropy())
    }

    /// Deterministic triggered-update jitter, for tests and simulations
    pub fn with_seed(config: RouterConfig, now: Ticks, seed: u64) -> Self {
        Self::with_rng(config, now, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: RouterConfig, now: Ticks, rng: StdRng) -> Self {
        let mut table = RoutingTable::new(config.timers.timeout);
        for interface in &config.interfaces {
            table.install_or_refresh(Route::direct(interface.subnet(), interface.id, now));
        }
        // direct routes go out with the first periodic update
        table.clear_changed();

        tracing::info!(
            "Router initialised with {} interface(s), {} direct route(s)",
            config.interfaces.len(),
            table.len()
        );

        Router {
            table,
            schedule: Schedule::new(now, &config.timers),
            interfaces: config.interfaces,
            timers: config.timers,
            port: config.port,
            rng,
        }
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn interface(&self, id: InterfaceId) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.id == id)
    }

    pub fn enabled_interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter().filter(|i| i.enabled)
    }

    /// Bit `n` set for each enabled interface `n`
    pub fn interface_mask(&self) -> u64 {
        self.enabled_interfaces()
            .filter(|i| i.id < 64)
            .fold(0, |mask, i| mask | (1u64 << i.id))
    }

    pub fn is_local_address(&self, addr: Ipv4Addr) -> bool {
        self.interfaces.iter().any(|i| i.address == addr)
    }

    /// Whether a datagram sent to `destination` is for this router rather than in transit
    pub fn accepts(&self, destination: Ipv4Addr) -> bool {
        destination == MULTICAST_ADDR || self.is_local_address(destination)
    }

    /// Next hop and interface for forwarding to `dest`. On-link destinations are their own next hop.
    pub fn next_hop(&self, dest: Ipv4Addr) -> RouterResult<(Ipv4Addr, InterfaceId)> {
        let (next_hop, interface) = self.table.lookup(dest).ok_or(RouterError::NotFound(dest))?;
        if next_hop.is_unspecified() {
            Ok((dest, interface))
        } else {
            Ok((next_hop, interface))
        }
    }

    /// Services every due timer: aging sweep, then periodic or triggered advertisement.
    pub fn poll_timers(&mut self, now: Ticks) -> Vec<Outbound> {
        if self.schedule.sweep_due(now) {
            aging::sweep(&mut self.table, now, &self.timers);
            self.schedule.rearm_sweep(now, &self.timers);
        }

        if self.schedule.update_due(now) {
            self.schedule.rearm_update(now, &self.timers);
            return self.periodic_update();
        }

        if self.table.has_changes() && self.schedule.triggered_allowed(now) {
            let outbound = self.triggered_update();
            self.schedule.suppress_triggered(now, &self.timers, &mut self.rng);
            return outbound;
        }

        Vec::new()
    }

    /// Earliest time `poll_timers` has something to do
    pub fn next_deadline(&self) -> Ticks {
        self.schedule.next_deadline(self.table.has_changes())
    }

    pub fn withdraw(&mut self, prefix: Ipv4Prefix) -> Option<Route> {
        self.table.withdraw(prefix)
    }
}
