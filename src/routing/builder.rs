use std::fmt::Display;

use log::debug;

use crate::{
    catalogue::{Catalogue, CatalogueError},
    col::{map_new, HashMap},
    domain::{Bus, StopIdx},
    graph::{Graph, VertexIdx},
};

use super::{arrival_vertex, ready_vertex, EdgeInfo, RoutingSettings, RoutingSettingsError};

#[derive(Debug, PartialEq)]
pub enum BuildGraphError {
    Settings(RoutingSettingsError),
    Bus {
        bus: Box<str>,
        source: CatalogueError,
    },
}

impl Display for BuildGraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildGraphError::Settings(err) => write!(f, "invalid routing settings: {err}"),
            BuildGraphError::Bus { bus, source } => write!(f, "bus {bus}: {source}"),
        }
    }
}

impl From<RoutingSettingsError> for BuildGraphError {
    fn from(value: RoutingSettingsError) -> Self {
        BuildGraphError::Settings(value)
    }
}

/// Builds the routing graph of a catalogue.
///
/// Each stop gets an arrival vertex and a ready vertex joined by a wait edge.
/// Each bus contributes a ride edge from the ready vertex of every stop it
/// serves to the arrival vertex of every later stop on the same walk, so that
/// staying on the bus never costs another wait. A back-and-forth line is walked
/// as two halves which meet at its turnaround stop.
///
/// Edge `i` of the returned graph is described by element `i` of the returned
/// infos.
pub fn build_graph(
    catalogue: &Catalogue,
    settings: &RoutingSettings,
) -> Result<(Graph<f64>, Vec<EdgeInfo>), BuildGraphError> {
    build_graph_with(catalogue, settings, true)
}

pub(crate) fn build_graph_with(
    catalogue: &Catalogue,
    settings: &RoutingSettings,
    prune_loops: bool,
) -> Result<(Graph<f64>, Vec<EdgeInfo>), BuildGraphError> {
    settings.validate()?;
    let mut builder = GraphBuilder {
        catalogue,
        settings,
        prune_loops,
        graph: Graph::new(catalogue.num_stops() * 2),
        edge_infos: Vec::new(),
    };
    builder.add_wait_edges();
    for (_, bus) in catalogue.buses() {
        builder.add_bus(bus)?;
    }
    Ok((builder.graph, builder.edge_infos))
}

struct GraphBuilder<'a> {
    catalogue: &'a Catalogue,
    settings: &'a RoutingSettings,
    prune_loops: bool,
    graph: Graph<f64>,
    edge_infos: Vec<EdgeInfo>,
}

impl GraphBuilder<'_> {
    fn add_edge(&mut self, from: VertexIdx, to: VertexIdx, info: EdgeInfo) {
        self.graph.add_edge(from, to, info.time());
        self.edge_infos.push(info);
    }

    fn add_wait_edges(&mut self) {
        for (stop_idx, stop) in self.catalogue.stops() {
            self.add_edge(
                arrival_vertex(stop_idx),
                ready_vertex(stop_idx),
                EdgeInfo::Wait {
                    stop_name: stop.name.clone(),
                    time: self.settings.bus_wait_time,
                },
            );
        }
    }

    fn add_bus(&mut self, bus: &Bus) -> Result<(), BuildGraphError> {
        if bus.stops.len() < 2 {
            return Ok(());
        }
        let num_edges = self.graph.num_edges();
        if bus.is_roundtrip {
            self.add_walk(bus, &bus.stops)?;
        } else {
            let turnaround = bus.stops.len() / 2;
            self.add_walk(bus, &bus.stops[..=turnaround])?;
            self.add_walk(bus, &bus.stops[turnaround..])?;
        }
        debug!(
            "Bus {} contributes {} ride edges",
            bus.name,
            self.graph.num_edges() - num_edges
        );
        Ok(())
    }

    /// Adds a ride edge for every pair of positions `from < to` on `walk`.
    ///
    /// When loop pruning is on, the rides from one position stop as soon as the
    /// bus comes back to a stop it already reached from there and the ride got
    /// longer by at least the wait time: getting off at the first visit and
    /// boarding again is never slower from that point on.
    fn add_walk(&mut self, bus: &Bus, walk: &[StopIdx]) -> Result<(), BuildGraphError> {
        for from in 0..walk.len().saturating_sub(1) {
            let mut reached: HashMap<StopIdx, f64> = map_new();
            let mut time = 0.0;
            for to in from + 1..walk.len() {
                let meters = self
                    .catalogue
                    .road_distance(walk[to - 1], walk[to])
                    .map_err(|source| BuildGraphError::Bus {
                        bus: bus.name.clone(),
                        source,
                    })?;
                time += self.settings.travel_time(meters);

                if self.prune_loops {
                    if let Some(&first_time) = reached.get(&walk[to]) {
                        if time >= first_time + self.settings.bus_wait_time {
                            break;
                        }
                    }
                    reached.insert(walk[to], time);
                }

                self.add_edge(
                    ready_vertex(walk[from]),
                    arrival_vertex(walk[to]),
                    EdgeInfo::Ride {
                        bus_name: bus.name.clone(),
                        span_count: (to - from) as u32,
                        time,
                    },
                );
            }
        }
        Ok(())
    }
}
