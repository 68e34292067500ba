// Routing table with RFC 2453 route selection

use std::net::Ipv4Addr;

use super::{lookup, InterfaceId, Ipv4Prefix, Route};
use crate::rip::INFINITY;
use crate::Ticks;

/// What `install_or_refresh` did with a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Inserted,
    Replaced,
    Refreshed,
    Ignored,
}

/// The set of known routes, at most one per prefix.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    routes: Vec<Route>,
    route_timeout: Ticks,
}

impl RoutingTable {
    /// `route_timeout` is the interval after which an unrefreshed route goes unreachable.
    pub fn new(route_timeout: Ticks) -> Self {
        RoutingTable {
            routes: Vec::new(),
            route_timeout,
        }
    }

    /// Applies a candidate learned at `candidate.last_refresh`.
    pub fn install_or_refresh(&mut self, candidate: Route) -> InstallOutcome {
        let timeout = self.route_timeout;

        let Some(index) = self.routes.iter().position(|r| r.prefix == candidate.prefix) else {
            if !candidate.is_reachable() {
                return InstallOutcome::Ignored;
            }
            tracing::info!(
                "Installed route {} via {} (metric {}, if {})",
                candidate.prefix,
                candidate.next_hop,
                candidate.metric,
                candidate.out_interface
            );
            self.routes.push(Route {
                changed: true,
                ..candidate
            });
            return InstallOutcome::Inserted;
        };

        let existing = &mut self.routes[index];
        if existing.is_direct() {
            return InstallOutcome::Ignored;
        }

        if existing.next_hop == candidate.next_hop {
            if existing.metric != candidate.metric {
                let poisoned = candidate.metric >= INFINITY;
                *existing = Route {
                    changed: true,
                    ..candidate
                };
                if poisoned {
                    // skip straight to the deletion countdown
                    existing.last_refresh -= timeout;
                    tracing::info!("Route {} withdrawn by {}", existing.prefix, existing.next_hop);
                } else {
                    tracing::debug!("Route {} metric now {}", existing.prefix, existing.metric);
                }
                return InstallOutcome::Replaced;
            }
            if candidate.metric < INFINITY {
                existing.last_refresh = candidate.last_refresh;
                return InstallOutcome::Refreshed;
            }
            return InstallOutcome::Ignored;
        }

        let better = candidate.metric < existing.metric;
        let fresher = candidate.metric == existing.metric
            && candidate.metric < INFINITY
            && candidate.last_refresh - existing.last_refresh > timeout / 2;
        if better || fresher {
            tracing::info!(
                "Route {} moved from {} to {} (metric {})",
                candidate.prefix,
                existing.next_hop,
                candidate.next_hop,
                candidate.metric
            );
            *existing = Route {
                changed: true,
                ..candidate
            };
            return InstallOutcome::Replaced;
        }

        InstallOutcome::Ignored
    }

    /// Removes the learned route for `prefix`. Direct routes stay.
    pub fn withdraw(&mut self, prefix: Ipv4Prefix) -> Option<Route> {
        let index = self
            .routes
            .iter()
            .position(|r| r.prefix == prefix && !r.is_direct())?;
        let route = self.routes.remove(index);
        tracing::info!("Withdrew route {}", route.prefix);
        Some(route)
    }

    /// Longest-prefix match over reachable routes.
    pub fn lookup(&self, addr: Ipv4Addr) -> Option<(Ipv4Addr, InterfaceId)> {
        lookup::longest_match(&self.routes, addr).map(|route| (route.next_hop, route.out_interface))
    }

    pub fn get(&self, prefix: Ipv4Prefix) -> Option<&Route> {
        self.routes.iter().find(|r| r.prefix == prefix)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn route_timeout(&self) -> Ticks {
        self.route_timeout
    }

    pub fn has_changes(&self) -> bool {
        self.routes.iter().any(|r| r.changed)
    }

    pub fn clear_changed(&mut self) {
        for route in &mut self.routes {
            route.changed = false;
        }
    }

    pub(crate) fn retain_mut<F>(&mut self, f: F)
    where
        F: FnMut(&mut Route) -> bool,
    {
        self.routes.retain_mut(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Ticks = 180_000;
    const A: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 2);
    const B: Ipv4Addr = Ipv4Addr::new(192, 168, 5, 2);

    fn prefix(address: [u8; 4], len: u8) -> Ipv4Prefix {
        Ipv4Prefix::new(Ipv4Addr::from(address), len).unwrap()
    }

    fn learned(next_hop: Ipv4Addr, metric: u32, now: Ticks) -> Route {
        Route {
            prefix: prefix([10, 0, 0, 0], 24),
            out_interface: 1,
            next_hop,
            metric,
            last_refresh: now,
            changed: true,
        }
    }

    fn table_with_direct() -> RoutingTable {
        let mut table = RoutingTable::new(TIMEOUT);
        let direct = Route::direct(prefix([192, 168, 3, 0], 24), 0, 0);
        assert_eq!(table.install_or_refresh(direct), InstallOutcome::Inserted);
        table.clear_changed();
        table
    }

    #[test]
    fn test_insert_sets_changed() {
        let mut table = RoutingTable::new(TIMEOUT);
        let candidate = Route {
            changed: false,
            ..learned(A, 3, 1_000)
        };
        assert_eq!(table.install_or_refresh(candidate), InstallOutcome::Inserted);
        assert!(table.get(prefix([10, 0, 0, 0], 24)).unwrap().changed);
    }

    #[test]
    fn test_unreachable_never_inserted() {
        let mut table = RoutingTable::new(TIMEOUT);
        assert_eq!(table.install_or_refresh(learned(A, 16, 1_000)), InstallOutcome::Ignored);
        assert!(table.is_empty());
    }

    #[test]
    fn test_direct_route_immutable() {
        let mut table = table_with_direct();
        let direct_prefix = prefix([192, 168, 3, 0], 24);

        for (next_hop, metric) in [(A, 1), (A, 16), (Ipv4Addr::UNSPECIFIED, 5)] {
            let candidate = Route {
                prefix: direct_prefix,
                ..learned(next_hop, metric, 5_000)
            };
            assert_eq!(table.install_or_refresh(candidate), InstallOutcome::Ignored);
        }
        assert!(table.withdraw(direct_prefix).is_none());

        let route = table.get(direct_prefix).unwrap();
        assert!(route.is_direct());
        assert_eq!(route.metric, 1);
        assert!(!route.changed);
    }

    #[test]
    fn test_same_source_refresh() {
        let mut table = RoutingTable::new(TIMEOUT);
        table.install_or_refresh(learned(A, 3, 1_000));
        table.clear_changed();

        assert_eq!(table.install_or_refresh(learned(A, 3, 9_000)), InstallOutcome::Refreshed);
        let route = table.get(prefix([10, 0, 0, 0], 24)).unwrap();
        assert_eq!(route.last_refresh, 9_000);
        assert!(!route.changed);
    }

    #[test]
    fn test_same_source_metric_change() {
        let mut table = RoutingTable::new(TIMEOUT);
        table.install_or_refresh(learned(A, 3, 1_000));
        table.clear_changed();

        assert_eq!(table.install_or_refresh(learned(A, 5, 2_000)), InstallOutcome::Replaced);
        let route = table.get(prefix([10, 0, 0, 0], 24)).unwrap();
        assert_eq!(route.metric, 5);
        assert_eq!(route.last_refresh, 2_000);
        assert!(route.changed);
    }

    #[test]
    fn test_poisoned_route_backdated() {
        let mut table = RoutingTable::new(TIMEOUT);
        table.install_or_refresh(learned(A, 3, 1_000));
        table.clear_changed();

        assert_eq!(table.install_or_refresh(learned(A, 16, 2_000)), InstallOutcome::Replaced);
        let route = table.get(prefix([10, 0, 0, 0], 24)).unwrap();
        assert_eq!(route.metric, 16);
        assert!(route.changed);
        assert_eq!(route.last_refresh, 2_000 - TIMEOUT);
        assert!(2_001 - route.last_refresh > TIMEOUT);
    }

    #[test]
    fn test_unreachable_refresh_keeps_timer() {
        let mut table = RoutingTable::new(TIMEOUT);
        table.install_or_refresh(learned(A, 3, 1_000));
        table.install_or_refresh(learned(A, 16, 2_000));
        table.clear_changed();

        assert_eq!(table.install_or_refresh(learned(A, 16, 50_000)), InstallOutcome::Ignored);
        let route = table.get(prefix([10, 0, 0, 0], 24)).unwrap();
        assert_eq!(route.last_refresh, 2_000 - TIMEOUT);
        assert!(!route.changed);
    }

    #[test]
    fn test_better_metric_from_other_source() {
        let mut table = RoutingTable::new(TIMEOUT);
        table.install_or_refresh(learned(A, 5, 1_000));
        table.clear_changed();

        assert_eq!(table.install_or_refresh(learned(B, 6, 2_000)), InstallOutcome::Ignored);
        assert_eq!(table.install_or_refresh(learned(B, 4, 3_000)), InstallOutcome::Replaced);
        let route = table.get(prefix([10, 0, 0, 0], 24)).unwrap();
        assert_eq!(route.next_hop, B);
        assert_eq!(route.metric, 4);
        assert!(route.changed);
    }

    #[test]
    fn test_equal_metric_prefers_fresher_after_half_timeout() {
        let mut table = RoutingTable::new(TIMEOUT);
        table.install_or_refresh(learned(A, 5, 1_000));
        table.clear_changed();

        let early = 1_000 + TIMEOUT / 2;
        assert_eq!(table.install_or_refresh(learned(B, 5, early)), InstallOutcome::Ignored);
        assert_eq!(table.get(prefix([10, 0, 0, 0], 24)).unwrap().next_hop, A);

        let late = early + 1;
        assert_eq!(table.install_or_refresh(learned(B, 5, late)), InstallOutcome::Replaced);
        let route = table.get(prefix([10, 0, 0, 0], 24)).unwrap();
        assert_eq!(route.next_hop, B);
        assert!(route.changed);
    }

    #[test]
    fn test_other_source_cannot_revive_with_infinity() {
        let mut table = RoutingTable::new(TIMEOUT);
        table.install_or_refresh(learned(A, 3, 1_000));
        table.install_or_refresh(learned(A, 16, 2_000));

        let late = 2_000 + TIMEOUT;
        assert_eq!(table.install_or_refresh(learned(B, 16, late)), InstallOutcome::Ignored);
        assert_eq!(table.get(prefix([10, 0, 0, 0], 24)).unwrap().next_hop, A);

        // a reachable alternative replaces the dead route
        assert_eq!(table.install_or_refresh(learned(B, 7, late)), InstallOutcome::Replaced);
        assert_eq!(table.get(prefix([10, 0, 0, 0], 24)).unwrap().metric, 7);
    }

    #[test]
    fn test_withdraw() {
        let mut table = table_with_direct();
        table.install_or_refresh(learned(A, 3, 1_000));
        assert!(table.withdraw(prefix([10, 0, 0, 0], 24)).is_some());
        assert!(table.withdraw(prefix([10, 0, 0, 0], 24)).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_lookup() {
        let mut table = table_with_direct();
        table.install_or_refresh(Route {
            prefix: prefix([10, 0, 0, 0], 8),
            ..learned(A, 2, 1_000)
        });
        table.install_or_refresh(Route {
            prefix: prefix([10, 0, 2, 0], 24),
            out_interface: 2,
            ..learned(B, 3, 1_000)
        });

        assert_eq!(table.lookup(Ipv4Addr::new(10, 0, 2, 5)), Some((B, 2)));
        assert_eq!(table.lookup(Ipv4Addr::new(10, 7, 0, 1)), Some((A, 1)));
        assert_eq!(
            table.lookup(Ipv4Addr::new(192, 168, 3, 9)),
            Some((Ipv4Addr::UNSPECIFIED, 0))
        );
        assert_eq!(table.lookup(Ipv4Addr::new(172, 16, 0, 1)), None);
    }
}
