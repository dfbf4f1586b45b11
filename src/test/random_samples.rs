use itertools::Itertools;
use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    catalogue::Catalogue,
    domain::StopIdx,
    geo::Coordinates,
    routing::{arrival_vertex, RoutingSettings, TransportRouter},
};

/// Random network with road distances between every pair of stops. Bus routes
/// may revisit stops, so loops of every shape show up.
pub fn network(seed: u64, num_stops: u32, num_buses: u32, max_stops_per_bus: usize) -> Catalogue {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut catalogue = Catalogue::new();
    for i in 0..num_stops {
        let coords = Coordinates::new(rng.gen_range(55.5..56.0), rng.gen_range(37.3..37.9));
        catalogue.add_stop(&format!("Stop {i}"), coords).unwrap();
    }
    for (from, to) in (0..num_stops).cartesian_product(0..num_stops) {
        if rng.gen_bool(0.7) {
            catalogue
                .set_distance(StopIdx(from), StopIdx(to), rng.gen_range(100..5000))
                .unwrap();
        } else if catalogue.distance(StopIdx(from), StopIdx(to)).is_none() {
            // Falls back to the other direction, which may not exist yet.
            catalogue
                .set_distance(StopIdx(to), StopIdx(from), rng.gen_range(100..5000))
                .unwrap();
        }
    }
    for i in 0..num_buses {
        let len = rng.gen_range(2..=max_stops_per_bus);
        let mut stops: Vec<StopIdx> = Vec::with_capacity(len);
        while stops.len() < len {
            let stop = StopIdx(rng.gen_range(0..num_stops));
            if stops.last() != Some(&stop) {
                stops.push(stop);
            }
        }
        let is_roundtrip = rng.gen_bool(0.5);
        if !is_roundtrip {
            let back = stops.iter().rev().skip(1).copied().collect_vec();
            stops.extend(back);
        }
        catalogue
            .add_bus(&format!("{i}"), stops, is_roundtrip)
            .unwrap();
    }
    catalogue
}

/// Builds a router for a random network and checks the route table against
/// itself: every route is reconstructible and its weight is the sum of its
/// edges, and no route beats going through any intermediate stop.
pub fn run(seed: u64) {
    let catalogue = network(seed, 40, 12, 15);
    let settings = RoutingSettings {
        bus_wait_time: 4.0,
        bus_velocity: 35.0,
    };
    let router = TransportRouter::build(&catalogue, settings).unwrap();
    let graph = router.graph();
    let table = router.table();

    let mut num_routes = 0;
    for (from, _) in catalogue.stops() {
        for (to, _) in catalogue.stops() {
            let Some(route) = table.build_route(graph, arrival_vertex(from), arrival_vertex(to))
            else {
                continue;
            };
            num_routes += 1;
            let sum: f64 = route.edges.iter().map(|&e| graph.edge(e).weight).sum();
            assert!(
                (sum - route.weight).abs() < 1e-9,
                "Route {:?} -> {:?} has weight {} but its edges sum to {}",
                from,
                to,
                route.weight,
                sum
            );
            for (via, _) in catalogue.stops() {
                let first = table.entry(arrival_vertex(from), arrival_vertex(via));
                let second = table.entry(arrival_vertex(via), arrival_vertex(to));
                if let (Some(first), Some(second)) = (first, second) {
                    assert!(route.weight <= first.weight + second.weight + 1e-9);
                }
            }
        }
    }
    info!("Seed {}: {} routes between stops", seed, num_routes);
}

pub fn run_samples(first_seed: u64, count: u64) {
    for seed in first_seed..first_seed + count {
        run(seed);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn random_networks_are_consistent() {
        super::run_samples(0, 4);
    }
}
