use std::fmt::Display;

use log::{debug, warn};
use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

use crate::{
    graph::{EdgeIdx, Graph, VertexIdx},
    weight::Weight,
};

use super::{dijkstra::dijkstra, RouteEntry, RouteInfo};

/// All-pairs shortest paths.
///
/// Row `u`, column `v` holds the optimal route from `u` to `v`, stored as its
/// weight and its last edge. Any route is reconstructed by following the last
/// edges back to `u`, which only needs row `u`.
#[derive(Debug, Clone)]
pub struct RouteTable<W> {
    // Row-major, num_vertices * num_vertices entries.
    entries: Box<[Option<RouteEntry<W>>]>,
    num_vertices: usize,
}

#[derive(Debug, PartialEq)]
pub enum RouteTableError {
    WrongSize {
        num_vertices: usize,
        num_entries: usize,
    },
    SourceNotReflexive {
        vertex: u32,
    },
    MissingPredecessor {
        from: u32,
        to: u32,
    },
    PredecessorOutOfRange {
        from: u32,
        to: u32,
        edge_idx: u32,
    },
    PredecessorEndsElsewhere {
        from: u32,
        to: u32,
        edge_idx: u32,
    },
    PredecessorUnreachable {
        from: u32,
        to: u32,
        edge_idx: u32,
    },
}

impl Display for RouteTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteTableError::WrongSize {
                num_vertices,
                num_entries,
            } => write!(
                f,
                "expected {} route entries for {num_vertices} vertices, got {num_entries}",
                num_vertices * num_vertices
            ),
            RouteTableError::SourceNotReflexive { vertex } => {
                write!(f, "route from vertex {vertex} to itself is not empty")
            }
            RouteTableError::MissingPredecessor { from, to } => {
                write!(f, "route {from} -> {to} has no last edge")
            }
            RouteTableError::PredecessorOutOfRange { from, to, edge_idx } => {
                write!(f, "route {from} -> {to} ends with unknown edge {edge_idx}")
            }
            RouteTableError::PredecessorEndsElsewhere { from, to, edge_idx } => {
                write!(f, "route {from} -> {to} ends with edge {edge_idx} which does not lead to {to}")
            }
            RouteTableError::PredecessorUnreachable { from, to, edge_idx } => write!(
                f,
                "route {from} -> {to} ends with edge {edge_idx} whose start is unreachable from {from}"
            ),
        }
    }
}

impl<W: Weight> RouteTable<W> {
    /// Runs one Dijkstra per source vertex. Rows are independent and are
    /// filled in parallel.
    pub fn compute(graph: &Graph<W>) -> Self {
        let num_vertices = graph.num_vertices();
        let mut entries: Vec<Option<RouteEntry<W>>> = Vec::new();
        entries.resize(num_vertices * num_vertices, None);
        if num_vertices > 0 {
            entries
                .par_chunks_exact_mut(num_vertices)
                .enumerate()
                .for_each(|(source, row)| dijkstra(graph, VertexIdx(source as u32), row));
        }
        debug!(
            "Computed route table for {} vertices and {} edges",
            num_vertices,
            graph.num_edges()
        );
        Self {
            entries: entries.into_boxed_slice(),
            num_vertices,
        }
    }

    /// Wraps entries read back from storage, checking that every route can be
    /// reconstructed against `graph`.
    pub fn try_from_raw(
        graph: &Graph<W>,
        entries: Vec<Option<RouteEntry<W>>>,
    ) -> Result<Self, RouteTableError> {
        let num_vertices = graph.num_vertices();
        if entries.len() != num_vertices * num_vertices {
            return Err(RouteTableError::WrongSize {
                num_vertices,
                num_entries: entries.len(),
            });
        }
        let table = Self {
            entries: entries.into_boxed_slice(),
            num_vertices,
        };
        table.validate(graph)?;
        Ok(table)
    }

    fn validate(&self, graph: &Graph<W>) -> Result<(), RouteTableError> {
        for from in 0..self.num_vertices as u32 {
            for to in 0..self.num_vertices as u32 {
                let Some(entry) = self.entry(VertexIdx(from), VertexIdx(to)) else {
                    if from == to {
                        return Err(RouteTableError::SourceNotReflexive { vertex: from });
                    }
                    continue;
                };
                let Some(edge_idx) = entry.prev_edge else {
                    if from == to {
                        continue;
                    }
                    return Err(RouteTableError::MissingPredecessor { from, to });
                };
                if from == to {
                    return Err(RouteTableError::SourceNotReflexive { vertex: from });
                }
                if edge_idx.0 as usize >= graph.num_edges() {
                    return Err(RouteTableError::PredecessorOutOfRange {
                        from,
                        to,
                        edge_idx: edge_idx.0,
                    });
                }
                let edge = graph.edge(edge_idx);
                if edge.to.0 != to {
                    return Err(RouteTableError::PredecessorEndsElsewhere {
                        from,
                        to,
                        edge_idx: edge_idx.0,
                    });
                }
                if self.entry(VertexIdx(from), edge.from).is_none() {
                    return Err(RouteTableError::PredecessorUnreachable {
                        from,
                        to,
                        edge_idx: edge_idx.0,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn entry(&self, from: VertexIdx, to: VertexIdx) -> Option<&RouteEntry<W>> {
        self.entries[from.0 as usize * self.num_vertices + to.0 as usize].as_ref()
    }

    /// All entries in row-major order.
    pub fn entries(&self) -> &[Option<RouteEntry<W>>] {
        &self.entries
    }

    /// Returns `None` if `to` is not reachable from `from`.
    pub fn build_route(
        &self,
        graph: &Graph<W>,
        from: VertexIdx,
        to: VertexIdx,
    ) -> Option<RouteInfo<W>> {
        let target = self.entry(from, to)?;
        let mut edges: Vec<EdgeIdx> = Vec::new();
        let mut prev_edge = target.prev_edge;
        while let Some(edge_idx) = prev_edge {
            if edges.len() >= self.num_vertices {
                warn!("Route {:?} -> {:?} does not lead back to its start", from, to);
                return None;
            }
            edges.push(edge_idx);
            prev_edge = self
                .entry(from, graph.edge(edge_idx).from)
                .and_then(|it| it.prev_edge);
        }
        edges.reverse();
        Some(RouteInfo {
            weight: target.weight,
            edges,
        })
    }
}
