// IPv4 prefixes and mask arithmetic

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Mask with the top `len` bits set
pub fn prefix_mask(len: u8) -> u32 {
    match len {
        0 => 0,
        32.. => u32::MAX,
        _ => u32::MAX << (32 - len),
    }
}

/// Number of leading one bits of a contiguous mask
pub fn mask_len(mask: u32) -> u8 {
    mask.leading_ones() as u8
}

/// An address with only its top `len` bits significant. Host bits are always clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ipv4Prefix {
    address: Ipv4Addr,
    len: u8,
}

impl Ipv4Prefix {
    /// Returns `None` when `len > 32` or `address` has host bits set.
    pub fn new(address: Ipv4Addr, len: u8) -> Option<Self> {
        if len > 32 || u32::from(address) & !prefix_mask(len) != 0 {
            return None;
        }
        Some(Ipv4Prefix { address, len })
    }

    /// Clears host bits instead of rejecting them.
    pub fn truncating(address: Ipv4Addr, len: u8) -> Self {
        let len = len.min(32);
        Ipv4Prefix {
            address: Ipv4Addr::from(u32::from(address) & prefix_mask(len)),
            len,
        }
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn len(&self) -> u8 {
        self.len
    }

    pub fn mask(&self) -> Ipv4Addr {
        Ipv4Addr::from(prefix_mask(self.len))
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & prefix_mask(self.len) == u32::from(self.address)
    }
}

impl fmt::Display for Ipv4Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.len)
    }
}
