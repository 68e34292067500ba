// Aging sweep: time out stale routes, then delete them

use super::Timers;
use crate::rip::INFINITY;
use crate::routes::{Ipv4Prefix, RoutingTable};
use crate::Ticks;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub timed_out: Vec<Ipv4Prefix>,
    pub deleted: Vec<Ipv4Prefix>,
}

/// Poisons learned routes older than the timeout and removes those older than
/// the deletion interval. Direct routes are skipped.
pub fn sweep(table: &mut RoutingTable, now: Ticks, timers: &Timers) -> SweepReport {
    let mut report = SweepReport::default();

    table.retain_mut(|route| {
        if route.is_direct() {
            return true;
        }
        let age = now - route.last_refresh;
        if age > timers.deletion {
            report.deleted.push(route.prefix);
            return false;
        }
        // last_refresh is left alone so the deletion countdown keeps running
        if age > timers.timeout && route.metric != INFINITY {
            route.metric = INFINITY;
            route.changed = true;
            report.timed_out.push(route.prefix);
        }
        true
    });

    for prefix in &report.timed_out {
        tracing::info!("Route {} timed out", prefix);
    }
    for prefix in &report.deleted {
        tracing::info!("Route {} deleted", prefix);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::Route;
    use std::net::Ipv4Addr;

    fn table() -> RoutingTable {
        let timers = Timers::default();
        let mut table = RoutingTable::new(timers.timeout);
        let direct = Ipv4Prefix::new(Ipv4Addr::new(192, 168, 3, 0), 24).unwrap();
        table.install_or_refresh(Route::direct(direct, 0, 0));
        table.install_or_refresh(Route {
            prefix: Ipv4Prefix::new(Ipv4Addr::new(10, 0, 0, 0), 24).unwrap(),
            out_interface: 1,
            next_hop: Ipv4Addr::new(192, 168, 4, 2),
            metric: 3,
            last_refresh: 0,
            changed: true,
        });
        table.clear_changed();
        table
    }

    fn learned(table: &RoutingTable) -> Option<&Route> {
        table.iter().find(|r| !r.is_direct())
    }

    #[test]
    fn test_fresh_route_untouched() {
        let timers = Timers::default();
        let mut table = table();
        let report = sweep(&mut table, timers.timeout, &timers);
        assert_eq!(report, SweepReport::default());
        assert_eq!(learned(&table).unwrap().metric, 3);
    }

    #[test]
    fn test_timeout_then_deletion() {
        let timers = Timers::default();
        let mut table = table();

        let report = sweep(&mut table, timers.timeout + 1, &timers);
        assert_eq!(report.timed_out.len(), 1);
        let route = learned(&table).unwrap();
        assert_eq!(route.metric, INFINITY);
        assert!(route.changed);
        assert_eq!(route.last_refresh, 0);

        // already unreachable: no second transition
        table.clear_changed();
        let report = sweep(&mut table, timers.deletion, &timers);
        assert!(report.timed_out.is_empty());
        assert!(!learned(&table).unwrap().changed);

        let report = sweep(&mut table, timers.deletion + 1, &timers);
        assert_eq!(report.deleted.len(), 1);
        assert!(learned(&table).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_direct_routes_never_age() {
        let timers = Timers::default();
        let mut table = table();
        sweep(&mut table, timers.deletion * 10, &timers);
        let direct = table.iter().next().unwrap();
        assert!(direct.is_direct());
        assert_eq!(direct.metric, 1);
    }

    #[test]
    fn test_poisoned_update_expires_from_timeout_mark() {
        let timers = Timers::default();
        let mut table = table();
        let prefix = learned(&table).unwrap().prefix;
        table.install_or_refresh(Route {
            prefix,
            out_interface: 1,
            next_hop: Ipv4Addr::new(192, 168, 4, 2),
            metric: INFINITY,
            last_refresh: 10_000,
            changed: true,
        });

        let report = sweep(&mut table, 10_001, &timers);
        assert!(report.timed_out.is_empty());
        assert!(report.deleted.is_empty());

        let deadline = 10_000 - timers.timeout + timers.deletion;
        sweep(&mut table, deadline, &timers);
        assert!(learned(&table).is_some());
        sweep(&mut table, deadline + 1, &timers);
        assert!(learned(&table).is_none());
    }
}
