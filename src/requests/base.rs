use std::fmt::Display;

use itertools::{Either, Itertools};
use log::info;
use serde::Deserialize;

use crate::{
    catalogue::{Catalogue, CatalogueError},
    col::HashMap,
    geo::Coordinates,
};

/// One entry of `base_requests`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum BaseRequest {
    Stop(StopRequest),
    Bus(BusRequest),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StopRequest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters from this stop to neighbouring stops, by name.
    #[serde(default)]
    pub road_distances: HashMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BusRequest {
    pub name: String,
    pub stops: Vec<String>,
    pub is_roundtrip: bool,
}

#[derive(Debug, PartialEq)]
pub enum RequestError {
    Catalogue(CatalogueError),
    UnknownStop { bus: String, stop: String },
    UnknownNeighbour { stop: String, neighbour: String },
}

impl Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Catalogue(err) => write!(f, "{err}"),
            RequestError::UnknownStop { bus, stop } => {
                write!(f, "bus {bus:?} passes through unknown stop {stop:?}")
            }
            RequestError::UnknownNeighbour { stop, neighbour } => {
                write!(f, "stop {stop:?} has a road distance to unknown stop {neighbour:?}")
            }
        }
    }
}

/// Builds the catalogue described by `requests`.
///
/// Entries may come in any order: all stops are registered first, then their
/// road distances, then the buses. A bus that is not a roundtrip is listed one
/// way only and stored as the full trip there and back.
pub fn load_catalogue(requests: &[BaseRequest]) -> Result<Catalogue, RequestError> {
    let mut catalogue = Catalogue::new();
    let (stops, buses): (Vec<_>, Vec<_>) = requests.iter().partition_map(|it| match it {
        BaseRequest::Stop(stop) => Either::Left(stop),
        BaseRequest::Bus(bus) => Either::Right(bus),
    });

    let stop_indices = stops
        .iter()
        .map(|stop| {
            catalogue.add_stop(&stop.name, Coordinates::new(stop.latitude, stop.longitude))
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(RequestError::Catalogue)?;

    for (stop, &from) in stops.iter().zip(&stop_indices) {
        // Sorted so that the catalogue does not depend on hash order.
        for (neighbour, &meters) in stop.road_distances.iter().sorted() {
            let to = catalogue
                .stop_by_name(neighbour)
                .ok_or_else(|| RequestError::UnknownNeighbour {
                    stop: stop.name.clone(),
                    neighbour: neighbour.clone(),
                })?;
            catalogue
                .set_distance(from, to, meters)
                .map_err(RequestError::Catalogue)?;
        }
    }

    for bus in &buses {
        let mut stops = bus
            .stops
            .iter()
            .map(|name| {
                catalogue
                    .stop_by_name(name)
                    .ok_or_else(|| RequestError::UnknownStop {
                        bus: bus.name.clone(),
                        stop: name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if !bus.is_roundtrip {
            let back = stops.iter().rev().skip(1).copied().collect_vec();
            stops.extend(back);
        }
        catalogue
            .add_bus(&bus.name, stops, bus.is_roundtrip)
            .map_err(RequestError::Catalogue)?;
    }

    info!(
        "Loaded {} stops and {} buses",
        catalogue.num_stops(),
        catalogue.num_buses()
    );
    Ok(catalogue)
}
