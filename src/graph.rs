use std::fmt::{Debug, Display};

use crate::weight::Weight;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexIdx(pub u32);
impl Debug for VertexIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("v#{}", self.0))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIdx(pub u32);
impl Debug for EdgeIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("e#{}", self.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgePayload<W> {
    pub from: VertexIdx,
    pub to: VertexIdx,
    pub weight: W,
}

/// Directed weighted graph with a fixed number of vertices.
///
/// Edges are identified by their insertion order; the ids are stable and are
/// used as keys into data kept alongside the graph.
#[derive(Debug, Clone)]
pub struct Graph<W> {
    edges: Vec<EdgePayload<W>>,
    outgoing: Vec<Vec<EdgeIdx>>,
}

#[derive(Debug, PartialEq)]
pub enum FromRawError {
    VertexFromOutOfRange { edge_idx: u32, vertex_from: u32 },
    VertexToOutOfRange { edge_idx: u32, vertex_to: u32 },
    NegativeWeight { edge_idx: u32 },
}

impl Display for FromRawError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FromRawError::VertexFromOutOfRange {
                edge_idx,
                vertex_from,
            } => write!(f, "edge {edge_idx} starts at unknown vertex {vertex_from}"),
            FromRawError::VertexToOutOfRange {
                edge_idx,
                vertex_to,
            } => write!(f, "edge {edge_idx} ends at unknown vertex {vertex_to}"),
            FromRawError::NegativeWeight { edge_idx } => {
                write!(f, "edge {edge_idx} has a negative weight")
            }
        }
    }
}

impl<W: Weight> Graph<W> {
    pub fn new(num_vertices: usize) -> Self {
        Self {
            edges: Vec::new(),
            outgoing: vec![Vec::new(); num_vertices],
        }
    }

    pub fn try_from_raw(
        num_vertices: usize,
        edges: Vec<EdgePayload<W>>,
    ) -> Result<Self, FromRawError> {
        let mut outgoing = vec![Vec::new(); num_vertices];
        for (edge_idx, edge) in edges.iter().enumerate() {
            if edge.to.0 as usize >= num_vertices {
                return Err(FromRawError::VertexToOutOfRange {
                    edge_idx: edge_idx as u32,
                    vertex_to: edge.to.0,
                });
            }
            if edge.weight < W::zero() {
                return Err(FromRawError::NegativeWeight {
                    edge_idx: edge_idx as u32,
                });
            }
            outgoing
                .get_mut(edge.from.0 as usize)
                .ok_or(FromRawError::VertexFromOutOfRange {
                    edge_idx: edge_idx as u32,
                    vertex_from: edge.from.0,
                })?
                .push(EdgeIdx(edge_idx as u32));
        }
        Ok(Self { edges, outgoing })
    }

    pub fn add_edge(&mut self, from: VertexIdx, to: VertexIdx, weight: W) -> EdgeIdx {
        debug_assert!(weight >= W::zero());
        let edge_idx = EdgeIdx(self.edges.len().try_into().unwrap());
        self.edges.push(EdgePayload { from, to, weight });
        self.outgoing[from.0 as usize].push(edge_idx);
        edge_idx
    }

    pub fn edge(&self, edge_idx: EdgeIdx) -> &EdgePayload<W> {
        &self.edges[edge_idx.0 as usize]
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeIdx, &EdgePayload<W>)> {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (EdgeIdx(i as u32), e))
    }

    pub fn outgoing(&self, vertex: VertexIdx) -> &[EdgeIdx] {
        &self.outgoing[vertex.0 as usize]
    }

    pub fn num_vertices(&self) -> usize {
        self.outgoing.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }
}
