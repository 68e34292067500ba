// Session handler: interprets inbound REQUEST and RESPONSE messages

use super::{Outbound, Router};
use crate::rip::codec::FormatError;
use crate::rip::datagram::{self, Envelope};
use crate::rip::{Command, RipMessage, INFINITY};
use crate::routes::{InstallOutcome, InterfaceId, Route};
use crate::Ticks;

impl Router {
    /// Decodes and handles one datagram that arrived on `interface`.
    ///
    /// Malformed input is reported and leaves the table untouched.
    pub fn handle_datagram(
        &mut self,
        interface: InterfaceId,
        packet: &[u8],
        now: Ticks,
    ) -> Result<Vec<Outbound>, FormatError> {
        let (envelope, message) = datagram::decode_datagram(packet)?;
        Ok(self.handle_message(interface, &envelope, message, now))
    }

    pub fn handle_message(
        &mut self,
        interface: InterfaceId,
        envelope: &Envelope,
        message: RipMessage,
        now: Ticks,
    ) -> Vec<Outbound> {
        let Some(arrival) = self.interface(interface).filter(|i| i.enabled) else {
            tracing::debug!("Ignoring RIP message on inactive interface {}", interface);
            return Vec::new();
        };

        match message.command {
            Command::Request => {
                if self.is_local_address(*envelope.source.ip()) {
                    tracing::debug!("Ignoring our own request from {}", envelope.source);
                    Vec::new()
                } else if message.is_whole_table_request() {
                    tracing::debug!("Whole-table request from {} on if {}", envelope.source, interface);
                    self.answer_whole_table(arrival, envelope.source)
                } else {
                    tracing::debug!("Ignoring specific request from {}", envelope.source);
                    Vec::new()
                }
            }
            Command::Response => {
                self.process_response(interface, envelope, &message, now);
                Vec::new()
            }
        }
    }

    fn process_response(&mut self, interface: InterfaceId, envelope: &Envelope, message: &RipMessage, now: Ticks) {
        if envelope.source.port() != self.port {
            tracing::debug!("Dropping response from non-RIP port {}", envelope.source);
            return;
        }
        let source = *envelope.source.ip();
        if self.is_local_address(source) {
            tracing::debug!("Dropping our own response from {}", source);
            return;
        }
        // a valid neighbour sits on the arrival subnet; 0.0.0.0 would read as a direct route
        let on_link = self
            .interface(interface)
            .is_some_and(|i| i.subnet().contains(source));
        if source.is_unspecified() || !on_link {
            tracing::debug!("Dropping response from {} not on the subnet of if {}", source, interface);
            return;
        }

        let mut applied = 0;
        for entry in message.entries() {
            let mut candidate = Route::from_entry(entry, interface, source, now);
            candidate.metric = candidate.metric.saturating_add(1).min(INFINITY);
            if self.table.install_or_refresh(candidate) != InstallOutcome::Ignored {
                applied += 1;
            }
        }
        tracing::debug!(
            "Response from {} on if {}: {} of {} entries applied",
            source,
            interface,
            applied,
            message.len()
        );
    }
}
