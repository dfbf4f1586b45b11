use std::fmt::Display;

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    catalogue::Catalogue,
    domain::StopIdx,
    graph::{EdgeIdx, Graph, VertexIdx},
    shortest_path::{RouteInfo, RouteTable},
};

pub mod builder;

pub use builder::{build_graph, BuildGraphError};

/// Meters per minute at one km/h.
const METERS_PER_MINUTE_PER_KMH: f64 = 1000.0 / 60.0;

pub const MIN_SETTING: f64 = 1.0;
pub const MAX_SETTING: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutingSettings {
    /// Minutes spent at a stop before boarding any bus.
    pub bus_wait_time: f64,
    /// km/h.
    pub bus_velocity: f64,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            bus_wait_time: 6.0,
            bus_velocity: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoutingSettingsError {
    WaitTimeOutOfRange(f64),
    VelocityOutOfRange(f64),
}

impl Display for RoutingSettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingSettingsError::WaitTimeOutOfRange(value) => write!(
                f,
                "bus_wait_time must be between {MIN_SETTING} and {MAX_SETTING}, got {value}"
            ),
            RoutingSettingsError::VelocityOutOfRange(value) => write!(
                f,
                "bus_velocity must be between {MIN_SETTING} and {MAX_SETTING}, got {value}"
            ),
        }
    }
}

impl RoutingSettings {
    pub fn validate(&self) -> Result<(), RoutingSettingsError> {
        if !(MIN_SETTING..=MAX_SETTING).contains(&self.bus_wait_time) {
            return Err(RoutingSettingsError::WaitTimeOutOfRange(self.bus_wait_time));
        }
        if !(MIN_SETTING..=MAX_SETTING).contains(&self.bus_velocity) {
            return Err(RoutingSettingsError::VelocityOutOfRange(self.bus_velocity));
        }
        Ok(())
    }

    /// Minutes needed to cover `meters` at the configured velocity.
    pub fn travel_time(&self, meters: u32) -> f64 {
        meters as f64 / self.bus_velocity / METERS_PER_MINUTE_PER_KMH
    }
}

/// Vertex at which passengers arrive at a stop.
pub fn arrival_vertex(stop: StopIdx) -> VertexIdx {
    VertexIdx(stop.0 * 2)
}

/// Vertex at which passengers are ready to board after waiting.
pub fn ready_vertex(stop: StopIdx) -> VertexIdx {
    VertexIdx(stop.0 * 2 + 1)
}

/// Human-readable meaning of a graph edge.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeInfo {
    Wait {
        stop_name: Box<str>,
        time: f64,
    },
    Ride {
        bus_name: Box<str>,
        span_count: u32,
        time: f64,
    },
}

impl EdgeInfo {
    pub fn is_wait(&self) -> bool {
        matches!(self, EdgeInfo::Wait { .. })
    }

    /// Stop name of a wait edge, bus name of a ride edge.
    pub fn name(&self) -> &str {
        match self {
            EdgeInfo::Wait { stop_name, .. } => stop_name,
            EdgeInfo::Ride { bus_name, .. } => bus_name,
        }
    }

    /// Zero for wait edges.
    pub fn span_count(&self) -> u32 {
        match self {
            EdgeInfo::Wait { .. } => 0,
            EdgeInfo::Ride { span_count, .. } => *span_count,
        }
    }

    pub fn time(&self) -> f64 {
        match self {
            EdgeInfo::Wait { time, .. } | EdgeInfo::Ride { time, .. } => *time,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum RouterFromRawError {
    EdgeInfoMismatch {
        num_edges: usize,
        num_edge_infos: usize,
    },
    TableMismatch {
        num_vertices: usize,
        table_vertices: usize,
    },
}

impl Display for RouterFromRawError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterFromRawError::EdgeInfoMismatch {
                num_edges,
                num_edge_infos,
            } => write!(f, "{num_edges} edges but {num_edge_infos} edge infos"),
            RouterFromRawError::TableMismatch {
                num_vertices,
                table_vertices,
            } => write!(
                f,
                "graph has {num_vertices} vertices but the route table covers {table_vertices}"
            ),
        }
    }
}

/// Answers fastest-route queries between stops.
///
/// Everything a query needs is precomputed; the router is immutable once
/// constructed, whether built from a catalogue or loaded from a snapshot.
#[derive(Debug, Clone)]
pub struct TransportRouter {
    settings: RoutingSettings,
    graph: Graph<f64>,
    edge_infos: Vec<EdgeInfo>,
    table: RouteTable<f64>,
}

impl TransportRouter {
    pub fn build(
        catalogue: &Catalogue,
        settings: RoutingSettings,
    ) -> Result<Self, BuildGraphError> {
        let (graph, edge_infos) = build_graph(catalogue, &settings)?;
        info!(
            "Built routing graph with {} vertices and {} edges",
            graph.num_vertices(),
            graph.num_edges()
        );
        let table = RouteTable::compute(&graph);
        info!("Computed {} route table entries", table.entries().len());
        Ok(Self {
            settings,
            graph,
            edge_infos,
            table,
        })
    }

    /// Assembles a router from precomputed parts without running any search.
    pub fn from_raw(
        settings: RoutingSettings,
        graph: Graph<f64>,
        edge_infos: Vec<EdgeInfo>,
        table: RouteTable<f64>,
    ) -> Result<Self, RouterFromRawError> {
        if edge_infos.len() != graph.num_edges() {
            return Err(RouterFromRawError::EdgeInfoMismatch {
                num_edges: graph.num_edges(),
                num_edge_infos: edge_infos.len(),
            });
        }
        if table.num_vertices() != graph.num_vertices() {
            return Err(RouterFromRawError::TableMismatch {
                num_vertices: graph.num_vertices(),
                table_vertices: table.num_vertices(),
            });
        }
        Ok(Self {
            settings,
            graph,
            edge_infos,
            table,
        })
    }

    /// Fastest route between two stops given by name. `None` if either stop is
    /// unknown or there is no route.
    pub fn build_route(
        &self,
        catalogue: &Catalogue,
        from: &str,
        to: &str,
    ) -> Option<RouteInfo<f64>> {
        let from = arrival_vertex(catalogue.stop_by_name(from)?);
        let to = arrival_vertex(catalogue.stop_by_name(to)?);
        if from.0 as usize >= self.graph.num_vertices() || to.0 as usize >= self.graph.num_vertices()
        {
            return None;
        }
        self.table.build_route(&self.graph, from, to)
    }

    /// Returns `None` for an edge id outside the graph.
    pub fn edge_info(&self, edge_idx: EdgeIdx) -> Option<&EdgeInfo> {
        self.edge_infos.get(edge_idx.0 as usize)
    }

    /// Steps of a route in travel order.
    pub fn itinerary<'a>(
        &'a self,
        route: &'a RouteInfo<f64>,
    ) -> impl Iterator<Item = &'a EdgeInfo> + 'a {
        route.edges.iter().filter_map(|&edge_idx| self.edge_info(edge_idx))
    }

    pub fn settings(&self) -> &RoutingSettings {
        &self.settings
    }

    pub fn graph(&self) -> &Graph<f64> {
        &self.graph
    }

    pub fn edge_infos(&self) -> &[EdgeInfo] {
        &self.edge_infos
    }

    pub fn table(&self) -> &RouteTable<f64> {
        &self.table
    }
}
