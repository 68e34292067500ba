// Advertisement policy: periodic, triggered and on-demand responses

use std::net::SocketAddrV4;

use super::{Interface, Outbound, Router};
use crate::rip::{datagram, Command, RipMessage, MULTICAST_ADDR};
use crate::routes::{InterfaceId, Route, RoutingTable};

/// Which routes an advertisement carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Full,
    ChangedOnly,
}

/// Builds the responses to send out `out_interface`.
///
/// Routes learned on `out_interface` are left out (split horizon). More than
/// 25 routes are spread over several messages.
pub fn build_responses(table: &RoutingTable, out_interface: InterfaceId, scope: Scope) -> Vec<RipMessage> {
    let entries = table
        .iter()
        .filter(|route| route.out_interface != out_interface)
        .filter(|route| scope == Scope::Full || route.changed)
        .map(Route::to_entry);

    let mut messages = Vec::new();
    let mut current = RipMessage::new(Command::Response);
    for entry in entries {
        if let Err(entry) = current.try_push(entry) {
            let full = std::mem::replace(&mut current, RipMessage::new(Command::Response));
            messages.push(full);
            let _ = current.try_push(entry);
        }
    }
    if !current.is_empty() {
        messages.push(current);
    }
    messages
}

impl Router {
    /// Full table on every enabled interface, then all change flags cleared.
    pub(crate) fn periodic_update(&mut self) -> Vec<Outbound> {
        let outbound = self.multicast(Scope::Full);
        self.table.clear_changed();
        tracing::debug!("Periodic update: {} datagram(s)", outbound.len());
        outbound
    }

    /// Changed routes only; interfaces with nothing to say are skipped.
    pub(crate) fn triggered_update(&mut self) -> Vec<Outbound> {
        let outbound = self.multicast(Scope::ChangedOnly);
        self.table.clear_changed();
        tracing::debug!("Triggered update: {} datagram(s)", outbound.len());
        outbound
    }

    fn multicast(&self, scope: Scope) -> Vec<Outbound> {
        let destination = SocketAddrV4::new(MULTICAST_ADDR, self.port);
        let mut outbound = Vec::new();
        for interface in self.enabled_interfaces() {
            let source = SocketAddrV4::new(interface.address, self.port);
            for message in build_responses(&self.table, interface.id, scope) {
                outbound.push(Outbound {
                    interface: interface.id,
                    destination: MULTICAST_ADDR,
                    packet: datagram::encode_datagram(source, destination, &message),
                });
            }
        }
        outbound
    }

    /// Unicast reply to a whole-table request. Not subject to triggered-update suppression.
    pub(crate) fn answer_whole_table(&self, interface: &Interface, requester: SocketAddrV4) -> Vec<Outbound> {
        let source = SocketAddrV4::new(interface.address, self.port);
        build_responses(&self.table, interface.id, Scope::Full)
            .iter()
            .map(|message| Outbound {
                interface: interface.id,
                destination: *requester.ip(),
                packet: datagram::encode_datagram(source, requester, message),
            })
            .collect()
    }

    /// Whole-table requests to send on every enabled interface at startup
    pub fn startup_requests(&self) -> Vec<Outbound> {
        let request = RipMessage::whole_table_request();
        let destination = SocketAddrV4::new(MULTICAST_ADDR, self.port);
        self.enabled_interfaces()
            .map(|interface| Outbound {
                interface: interface.id,
                destination: MULTICAST_ADDR,
                packet: datagram::encode_datagram(
                    SocketAddrV4::new(interface.address, self.port),
                    destination,
                    &request,
                ),
            })
            .collect()
    }
}
