// RIP module - RIPv2 wire model (RFC 2453)

pub mod codec;
pub mod datagram;

use std::net::Ipv4Addr;

/// UDP port used by RIP on both ends
pub const RIP_PORT: u16 = 520;
pub const RIP_VERSION: u8 = 2;
/// Protocol cap on route entries carried by one message
pub const MAX_ENTRIES: usize = 25;
/// Metric meaning "unreachable"
pub const INFINITY: u32 = 16;
/// RIPv2 routers group, 224.0.0.9
pub const MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 9);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Request = 1,
    Response = 2,
}

impl Command {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Command::Request),
            2 => Some(Command::Response),
            _ => None,
        }
    }

    /// Address family every entry of this command must carry
    pub fn address_family(self) -> u16 {
        match self {
            Command::Request => 0,
            Command::Response => 2,
        }
    }
}

/// A route entry as carried on the wire, in host order.
///
/// Family and route tag are not stored: the family follows from the
/// message command and the tag is always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RipEntry {
    pub address: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub next_hop: Ipv4Addr,
    pub metric: u32,
}

/// A RIP message holding at most [`MAX_ENTRIES`] entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RipMessage {
    pub command: Command,
    entries: Vec<RipEntry>,
}

impl RipMessage {
    pub fn new(command: Command) -> Self {
        RipMessage {
            command,
            entries: Vec::with_capacity(MAX_ENTRIES),
        }
    }

    /// Builds a message from `entries`, or hands them back if there are too many.
    pub fn with_entries(command: Command, entries: Vec<RipEntry>) -> Result<Self, Vec<RipEntry>> {
        if entries.len() > MAX_ENTRIES {
            return Err(entries);
        }
        Ok(RipMessage { command, entries })
    }

    /// The "send me your whole table" request: one entry, zero mask, metric infinity.
    pub fn whole_table_request() -> Self {
        RipMessage {
            command: Command::Request,
            entries: vec![RipEntry {
                address: Ipv4Addr::UNSPECIFIED,
                mask: Ipv4Addr::UNSPECIFIED,
                next_hop: Ipv4Addr::UNSPECIFIED,
                metric: INFINITY,
            }],
        }
    }

    pub fn is_whole_table_request(&self) -> bool {
        match self.entries.as_slice() {
            [entry] => {
                self.command == Command::Request
                    && entry.mask.is_unspecified()
                    && entry.metric == INFINITY
            }
            _ => false,
        }
    }

    /// Appends an entry. Returns it back when the message is full.
    pub fn try_push(&mut self, entry: RipEntry) -> Result<(), RipEntry> {
        if self.is_full() {
            return Err(entry);
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[RipEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<RipEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_ENTRIES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(metric: u32) -> RipEntry {
        RipEntry {
            address: Ipv4Addr::new(10, 0, 0, 0),
            mask: Ipv4Addr::new(255, 255, 255, 0),
            next_hop: Ipv4Addr::UNSPECIFIED,
            metric,
        }
    }

    #[test]
    fn test_whole_table_request_sentinel() {
        let request = RipMessage::whole_table_request();
        assert!(request.is_whole_table_request());

        let mut specific = RipMessage::new(Command::Request);
        specific.try_push(entry(16)).unwrap();
        specific.try_push(entry(16)).unwrap();
        assert!(!specific.is_whole_table_request());

        let response = RipMessage::with_entries(Command::Response, vec![RipEntry {
            mask: Ipv4Addr::UNSPECIFIED,
            ..entry(16)
        }])
        .unwrap();
        assert!(!response.is_whole_table_request());
    }

    #[test]
    fn test_entry_cap() {
        let mut message = RipMessage::new(Command::Response);
        for _ in 0..MAX_ENTRIES {
            assert!(message.try_push(entry(1)).is_ok());
        }
        assert!(message.is_full());
        assert_eq!(message.try_push(entry(2)), Err(entry(2)));
        assert!(RipMessage::with_entries(Command::Response, vec![entry(1); 26]).is_err());
    }

    #[test]
    fn test_command_family() {
        assert_eq!(Command::from_u8(1), Some(Command::Request));
        assert_eq!(Command::from_u8(3), None);
        assert_eq!(Command::Request.address_family(), 0);
        assert_eq!(Command::Response.address_family(), 2);
    }
}
