// Route lookup with longest prefix matching

use std::net::Ipv4Addr;

use super::Route;

/// Find the best reachable route for a destination using longest prefix matching.
///
/// Routes with metric 16 never match. A `/0` route matches only when nothing
/// more specific does.
pub fn longest_match<'a, I>(routes: I, dest: Ipv4Addr) -> Option<&'a Route>
where
    I: IntoIterator<Item = &'a Route>,
{
    let mut best_match: Option<&Route> = None;

    for route in routes {
        if !route.is_reachable() || !route.prefix.contains(dest) {
            continue;
        }
        match best_match {
            Some(current) if current.prefix.len() >= route.prefix.len() => {}
            _ => best_match = Some(route),
        }
    }

    best_match
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::Ipv4Prefix;

    fn route(address: [u8; 4], len: u8, next_hop: [u8; 4], metric: u32) -> Route {
        Route {
            prefix: Ipv4Prefix::new(Ipv4Addr::from(address), len).unwrap(),
            out_interface: 1,
            next_hop: Ipv4Addr::from(next_hop),
            metric,
            last_refresh: 0,
            changed: false,
        }
    }

    #[test]
    fn test_most_specific_wins() {
        let routes = vec![
            route([10, 0, 0, 0], 8, [192, 168, 4, 2], 2),
            route([10, 0, 2, 0], 24, [192, 168, 4, 3], 3),
        ];
        let best = longest_match(&routes, Ipv4Addr::new(10, 0, 2, 5)).unwrap();
        assert_eq!(best.next_hop, Ipv4Addr::new(192, 168, 4, 3));

        let best = longest_match(&routes, Ipv4Addr::new(10, 9, 9, 9)).unwrap();
        assert_eq!(best.next_hop, Ipv4Addr::new(192, 168, 4, 2));
    }

    #[test]
    fn test_unreachable_routes_skipped() {
        let routes = vec![
            route([10, 0, 0, 0], 8, [192, 168, 4, 2], 2),
            route([10, 0, 2, 0], 24, [192, 168, 4, 3], 16),
        ];
        let best = longest_match(&routes, Ipv4Addr::new(10, 0, 2, 5)).unwrap();
        assert_eq!(best.prefix.len(), 8);

        let only_dead = vec![route([10, 0, 2, 0], 24, [192, 168, 4, 3], 16)];
        assert!(longest_match(&only_dead, Ipv4Addr::new(10, 0, 2, 5)).is_none());
    }

    #[test]
    fn test_default_route() {
        let routes = vec![
            route([0, 0, 0, 0], 0, [192, 168, 4, 1], 2),
            route([10, 0, 2, 0], 24, [192, 168, 4, 3], 3),
        ];
        let best = longest_match(&routes, Ipv4Addr::new(8, 8, 8, 8)).unwrap();
        assert_eq!(best.prefix.len(), 0);
        let best = longest_match(&routes, Ipv4Addr::new(10, 0, 2, 8)).unwrap();
        assert_eq!(best.prefix.len(), 24);

        assert!(longest_match(&routes[1..], Ipv4Addr::new(8, 8, 8, 8)).is_none());
    }
}
