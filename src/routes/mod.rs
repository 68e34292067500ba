// Routes module - routing table entries, prefixes and longest-prefix lookup

pub mod lookup;
pub mod prefix;
pub mod table;

pub use prefix::Ipv4Prefix;
pub use table::{InstallOutcome, RoutingTable};

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use crate::rip::{RipEntry, INFINITY};
use crate::Ticks;

/// Index of a local interface
pub type InterfaceId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub prefix: Ipv4Prefix,
    pub out_interface: InterfaceId,
    /// `0.0.0.0` marks a directly connected network
    pub next_hop: Ipv4Addr,
    pub metric: u32,
    pub last_refresh: Ticks,
    pub changed: bool,
}

impl Route {
    /// A permanent route to a locally attached subnet
    pub fn direct(prefix: Ipv4Prefix, out_interface: InterfaceId, now: Ticks) -> Self {
        Route {
            prefix,
            out_interface,
            next_hop: Ipv4Addr::UNSPECIFIED,
            metric: 1,
            last_refresh: now,
            changed: false,
        }
    }

    /// Builds a candidate from a received entry. The entry's metric is taken as-is.
    pub fn from_entry(entry: &RipEntry, out_interface: InterfaceId, source: Ipv4Addr, now: Ticks) -> Self {
        let len = prefix::mask_len(u32::from(entry.mask));
        Route {
            prefix: Ipv4Prefix::truncating(entry.address, len),
            out_interface,
            next_hop: source,
            metric: entry.metric,
            last_refresh: now,
            changed: true,
        }
    }

    /// Wire form for advertising. Next hop is left unspecified so receivers route via us.
    pub fn to_entry(&self) -> RipEntry {
        RipEntry {
            address: self.prefix.address(),
            mask: self.prefix.mask(),
            next_hop: Ipv4Addr::UNSPECIFIED,
            metric: self.metric,
        }
    }

    pub fn is_direct(&self) -> bool {
        self.next_hop.is_unspecified()
    }

    pub fn is_reachable(&self) -> bool {
        self.metric < INFINITY
    }
}

/// Point-in-time copy of the table, published for readers outside the event loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub hostname: String,
    pub routes: Vec<Route>,
    pub timestamp: String,
}

impl TableSnapshot {
    pub fn capture(hostname: &str, table: &RoutingTable) -> Self {
        TableSnapshot {
            hostname: hostname.to_string(),
            routes: table.iter().cloned().collect(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn empty(hostname: &str) -> Self {
        TableSnapshot {
            hostname: hostname.to_string(),
            routes: Vec::new(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
