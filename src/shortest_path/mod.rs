pub mod dijkstra;
pub mod route_table;

pub use route_table::{RouteTable, RouteTableError};

use crate::graph::EdgeIdx;

/// Optimal way of reaching one vertex from one source vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteEntry<W> {
    pub weight: W,
    /// Last edge of the path, `None` if the vertex is the source itself.
    pub prev_edge: Option<EdgeIdx>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteInfo<W> {
    pub weight: W,
    pub edges: Vec<EdgeIdx>,
}
