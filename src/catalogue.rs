use std::fmt::Display;

use itertools::Itertools;

use crate::{
    col::{HashMap, HashSet, NameIndex},
    domain::{Bus, BusIdx, BusInfo, Stop, StopIdx, StopInfo},
    geo::{compute_distance, Coordinates},
};

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogueError {
    DuplicateStop { name: Box<str> },
    DuplicateBus { name: Box<str> },
    StopOutOfRange { stop_idx: u32 },
    BusOutOfRange { bus_idx: u32 },
    MissingDistance { from: Box<str>, to: Box<str> },
}

impl Display for CatalogueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogueError::DuplicateStop { name } => write!(f, "stop {name:?} is defined twice"),
            CatalogueError::DuplicateBus { name } => write!(f, "bus {name:?} is defined twice"),
            CatalogueError::StopOutOfRange { stop_idx } => {
                write!(f, "stop index {stop_idx} does not exist")
            }
            CatalogueError::BusOutOfRange { bus_idx } => {
                write!(f, "bus index {bus_idx} does not exist")
            }
            CatalogueError::MissingDistance { from, to } => {
                write!(f, "no road distance between {from:?} and {to:?}")
            }
        }
    }
}

/// Registry of stops and bus lines.
///
/// Stops and buses live in arenas and are referred to by [`StopIdx`] and
/// [`BusIdx`]; indices are assigned in insertion order and never change.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    stops: Vec<Stop>,
    buses: Vec<Bus>,
    stop_index: NameIndex<StopIdx>,
    bus_index: NameIndex<BusIdx>,
    /// Per stop, the buses passing through it, sorted by bus name.
    buses_by_stop: Vec<Vec<BusIdx>>,
    distances: HashMap<(StopIdx, StopIdx), u32>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stop(&mut self, name: &str, coords: Coordinates) -> Result<StopIdx, CatalogueError> {
        let stop_idx = StopIdx(self.stops.len() as u32);
        if !self.stop_index.insert(name, stop_idx) {
            return Err(CatalogueError::DuplicateStop { name: name.into() });
        }
        self.stops.push(Stop {
            name: name.into(),
            coords,
        });
        self.buses_by_stop.push(Vec::new());
        Ok(stop_idx)
    }

    pub fn add_bus(
        &mut self,
        name: &str,
        stops: Vec<StopIdx>,
        is_roundtrip: bool,
    ) -> Result<BusIdx, CatalogueError> {
        for &stop_idx in &stops {
            self.check_stop(stop_idx)?;
        }
        let bus_idx = BusIdx(self.buses.len() as u32);
        if !self.bus_index.insert(name, bus_idx) {
            return Err(CatalogueError::DuplicateBus { name: name.into() });
        }
        self.buses.push(Bus {
            name: name.into(),
            stops,
            is_roundtrip,
        });

        let stops = self.buses[bus_idx.0 as usize]
            .stops
            .iter()
            .copied()
            .unique()
            .collect_vec();
        for stop_idx in stops {
            self.link_bus_to_stop(stop_idx, bus_idx);
        }
        Ok(bus_idx)
    }

    fn link_bus_to_stop(&mut self, stop_idx: StopIdx, bus_idx: BusIdx) {
        let buses = &self.buses;
        let linked = &mut self.buses_by_stop[stop_idx.0 as usize];
        let name = &buses[bus_idx.0 as usize].name;
        if let Err(pos) = linked.binary_search_by(|it| buses[it.0 as usize].name.cmp(name)) {
            linked.insert(pos, bus_idx);
        }
    }

    pub fn set_distance(
        &mut self,
        from: StopIdx,
        to: StopIdx,
        meters: u32,
    ) -> Result<(), CatalogueError> {
        self.check_stop(from)?;
        self.check_stop(to)?;
        self.distances.insert((from, to), meters);
        Ok(())
    }

    fn check_stop(&self, stop_idx: StopIdx) -> Result<(), CatalogueError> {
        if (stop_idx.0 as usize) < self.stops.len() {
            Ok(())
        } else {
            Err(CatalogueError::StopOutOfRange {
                stop_idx: stop_idx.0,
            })
        }
    }

    pub fn stop(&self, stop_idx: StopIdx) -> &Stop {
        &self.stops[stop_idx.0 as usize]
    }

    pub fn bus(&self, bus_idx: BusIdx) -> &Bus {
        &self.buses[bus_idx.0 as usize]
    }

    pub fn stop_by_name(&self, name: &str) -> Option<StopIdx> {
        self.stop_index.get(name)
    }

    pub fn bus_by_name(&self, name: &str) -> Option<BusIdx> {
        self.bus_index.get(name)
    }

    pub fn stops(&self) -> impl Iterator<Item = (StopIdx, &Stop)> + Clone {
        self.stops
            .iter()
            .enumerate()
            .map(|(i, s)| (StopIdx(i as u32), s))
    }

    pub fn buses(&self) -> impl Iterator<Item = (BusIdx, &Bus)> + Clone {
        self.buses
            .iter()
            .enumerate()
            .map(|(i, b)| (BusIdx(i as u32), b))
    }

    /// Buses ordered by name.
    pub fn buses_sorted(&self) -> Vec<(BusIdx, &Bus)> {
        self.buses()
            .sorted_by(|a, b| a.1.name.cmp(&b.1.name))
            .collect()
    }

    pub fn num_stops(&self) -> usize {
        self.stops.len()
    }

    pub fn num_buses(&self) -> usize {
        self.buses.len()
    }

    /// Distances exactly as they were recorded, without the reverse fallback.
    pub fn distances(&self) -> impl Iterator<Item = (StopIdx, StopIdx, u32)> + '_ {
        self.distances
            .iter()
            .map(|(&(from, to), &meters)| (from, to, meters))
    }

    /// Road distance from `from` to `to`, falling back to the distance recorded
    /// for the opposite direction.
    pub fn distance(&self, from: StopIdx, to: StopIdx) -> Option<u32> {
        self.distances
            .get(&(from, to))
            .or_else(|| self.distances.get(&(to, from)))
            .copied()
    }

    pub fn road_distance(&self, from: StopIdx, to: StopIdx) -> Result<u32, CatalogueError> {
        self.distance(from, to)
            .ok_or_else(|| CatalogueError::MissingDistance {
                from: self.stop(from).name.clone(),
                to: self.stop(to).name.clone(),
            })
    }

    /// Buses passing through the stop, ordered by bus name.
    pub fn buses_through_stop(&self, stop_idx: StopIdx) -> &[BusIdx] {
        &self.buses_by_stop[stop_idx.0 as usize]
    }

    pub fn stop_info(&self, name: &str) -> Option<StopInfo<'_>> {
        let stop_idx = self.stop_by_name(name)?;
        Some(StopInfo {
            name: &self.stop(stop_idx).name,
            buses: self
                .buses_through_stop(stop_idx)
                .iter()
                .map(|&bus_idx| &*self.bus(bus_idx).name)
                .collect(),
        })
    }

    pub fn bus_info(&self, bus_idx: BusIdx) -> Result<BusInfo<'_>, CatalogueError> {
        let bus = self.bus(bus_idx);
        let mut route_length = 0_u64;
        let mut geo_length = 0.0;
        for (&from, &to) in bus.stops.iter().tuple_windows() {
            route_length += self.road_distance(from, to)? as u64;
            geo_length += compute_distance(self.stop(from).coords, self.stop(to).coords);
        }
        Ok(BusInfo {
            name: &bus.name,
            stop_count: bus.stops.len(),
            unique_stop_count: bus.stops.iter().collect::<HashSet<_>>().len(),
            route_length,
            geo_length,
        })
    }

    /// Reassembles a catalogue from its indexed parts, e.g. after loading a
    /// snapshot. `buses_by_stop` lists, per stop, the buses passing through it.
    pub fn from_raw(
        stops: Vec<Stop>,
        buses: Vec<Bus>,
        distances: Vec<(StopIdx, StopIdx, u32)>,
        buses_by_stop: Vec<(StopIdx, Vec<BusIdx>)>,
    ) -> Result<Self, CatalogueError> {
        let mut catalogue = Catalogue::new();
        for stop in stops {
            catalogue.add_stop(&stop.name, stop.coords)?;
        }
        for (idx, bus) in buses.iter().enumerate() {
            for &stop_idx in &bus.stops {
                catalogue.check_stop(stop_idx)?;
            }
            let bus_idx = BusIdx(idx as u32);
            if !catalogue.bus_index.insert(&bus.name, bus_idx) {
                return Err(CatalogueError::DuplicateBus {
                    name: bus.name.clone(),
                });
            }
        }
        catalogue.buses = buses;
        for (from, to, meters) in distances {
            catalogue.set_distance(from, to, meters)?;
        }
        for (stop_idx, bus_indices) in buses_by_stop {
            catalogue.check_stop(stop_idx)?;
            for bus_idx in bus_indices {
                if bus_idx.0 as usize >= catalogue.buses.len() {
                    return Err(CatalogueError::BusOutOfRange { bus_idx: bus_idx.0 });
                }
                catalogue.link_bus_to_stop(stop_idx, bus_idx);
            }
        }
        Ok(catalogue)
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use crate::{
        domain::{BusIdx, StopIdx},
        geo::Coordinates,
    };

    use super::{Catalogue, CatalogueError};

    fn sample() -> Catalogue {
        let mut catalogue = Catalogue::new();
        let a = catalogue.add_stop("A", Coordinates::new(55.0, 37.0)).unwrap();
        let b = catalogue.add_stop("B", Coordinates::new(55.005, 37.0)).unwrap();
        let c = catalogue.add_stop("C", Coordinates::new(55.01, 37.0)).unwrap();
        catalogue.set_distance(a, b, 1200).unwrap();
        catalogue.set_distance(b, a, 1300).unwrap();
        catalogue.set_distance(b, c, 900).unwrap();
        catalogue.add_bus("750", vec![a, b, c, b, a], false).unwrap();
        catalogue.add_bus("14", vec![a, b, a], true).unwrap();
        catalogue
    }

    #[test]
    fn distance_prefers_recorded_direction() {
        let catalogue = sample();
        assert_eq!(catalogue.distance(StopIdx(0), StopIdx(1)), Some(1200));
        assert_eq!(catalogue.distance(StopIdx(1), StopIdx(0)), Some(1300));
    }

    #[test]
    fn distance_falls_back_to_reverse_direction() {
        let catalogue = sample();
        assert_eq!(catalogue.distance(StopIdx(2), StopIdx(1)), Some(900));
        assert_eq!(catalogue.distance(StopIdx(0), StopIdx(2)), None);
        assert_eq!(
            catalogue.road_distance(StopIdx(0), StopIdx(2)),
            Err(CatalogueError::MissingDistance {
                from: "A".into(),
                to: "C".into()
            })
        );
    }

    #[test]
    fn buses_through_stop_are_sorted_by_name() {
        let catalogue = sample();
        let names: Vec<_> = catalogue
            .buses_through_stop(StopIdx(0))
            .iter()
            .map(|&it| &*catalogue.bus(it).name)
            .collect();
        assert_eq!(names, vec!["14", "750"]);
        assert_eq!(catalogue.buses_through_stop(StopIdx(2)), &[BusIdx(0)]);
    }

    #[test]
    fn stop_pairs_cover_every_ordered_pair() {
        let catalogue = sample();
        let pairs = catalogue
            .stops()
            .cartesian_product(catalogue.stops())
            .map(|((_, from), (_, to))| format!("{}{}", from.name, to.name))
            .collect_vec();
        assert_eq!(
            pairs,
            ["AA", "AB", "AC", "BA", "BB", "BC", "CA", "CB", "CC"]
        );
        assert_eq!(
            catalogue.buses().cartesian_product(catalogue.buses()).count(),
            4
        );
    }

    #[test]
    fn unknown_names_are_not_found() {
        let catalogue = sample();
        assert_eq!(catalogue.stop_by_name("Z"), None);
        assert_eq!(catalogue.bus_by_name("Z"), None);
        assert_eq!(catalogue.stop_info("Z"), None);
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut catalogue = sample();
        assert_eq!(
            catalogue.add_stop("A", Coordinates::default()),
            Err(CatalogueError::DuplicateStop { name: "A".into() })
        );
        assert_eq!(
            catalogue.add_bus("14", vec![], true),
            Err(CatalogueError::DuplicateBus { name: "14".into() })
        );
        assert_eq!(
            catalogue.add_bus("99", vec![StopIdx(7)], true),
            Err(CatalogueError::StopOutOfRange { stop_idx: 7 })
        );
    }

    #[test]
    fn stop_without_buses() {
        let mut catalogue = sample();
        catalogue.add_stop("D", Coordinates::default()).unwrap();
        let info = catalogue.stop_info("D").unwrap();
        assert!(info.buses.is_empty());
    }

    #[test]
    fn bus_info_uses_road_distances() {
        let catalogue = sample();
        let info = catalogue.bus_info(BusIdx(0)).unwrap();
        assert_eq!(info.stop_count, 5);
        assert_eq!(info.unique_stop_count, 3);
        assert_eq!(info.route_length, 1200 + 900 + 900 + 1300);
        assert!(info.curvature() > 1.0);
    }

    #[test]
    fn from_raw_restores_indices() {
        let catalogue = sample();
        let restored = Catalogue::from_raw(
            catalogue.stops().map(|(_, s)| s.clone()).collect(),
            catalogue.buses().map(|(_, b)| b.clone()).collect(),
            catalogue.distances().collect(),
            catalogue
                .stops()
                .map(|(idx, _)| (idx, catalogue.buses_through_stop(idx).to_vec()))
                .collect(),
        )
        .unwrap();
        assert_eq!(restored.stop_by_name("C"), Some(StopIdx(2)));
        assert_eq!(restored.bus_by_name("14"), Some(BusIdx(1)));
        assert_eq!(restored.distance(StopIdx(2), StopIdx(1)), Some(900));
        assert_eq!(
            restored.buses_through_stop(StopIdx(1)),
            catalogue.buses_through_stop(StopIdx(1))
        );
    }
}
