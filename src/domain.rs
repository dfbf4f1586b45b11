use std::fmt::Debug;

use crate::geo::Coordinates;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopIdx(pub u32);
impl Debug for StopIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("s#{}", self.0))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BusIdx(pub u32);
impl Debug for BusIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("b#{}", self.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub name: Box<str>,
    pub coords: Coordinates,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bus {
    pub name: Box<str>,
    /// For a line that is not a roundtrip this is already the palindromic
    /// sequence `a b c b a`.
    pub stops: Vec<StopIdx>,
    pub is_roundtrip: bool,
}

impl Bus {
    /// The stop at which a back-and-forth line turns around.
    pub fn turnaround(&self) -> Option<StopIdx> {
        if self.is_roundtrip {
            return None;
        }
        self.stops.get(self.stops.len() / 2).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopInfo<'a> {
    pub name: &'a str,
    /// Sorted by name.
    pub buses: Vec<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BusInfo<'a> {
    pub name: &'a str,
    pub stop_count: usize,
    pub unique_stop_count: usize,
    /// Sum of the road distances in meters.
    pub route_length: u64,
    /// Sum of the great-circle distances in meters.
    pub geo_length: f64,
}

impl BusInfo<'_> {
    pub fn curvature(&self) -> f64 {
        self.route_length as f64 / self.geo_length
    }
}
