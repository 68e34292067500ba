// rip-router - RIPv2 routing daemon

pub mod api;
pub mod config;
pub mod daemon;
pub mod error;
pub mod platform;
pub mod rip;
pub mod router;
pub mod routes;

/// Milliseconds on the platform's monotonic clock.
///
/// Signed so routes can be backdated past the clock origin.
pub type Ticks = i64;
