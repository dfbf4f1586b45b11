use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::{
    graph::{Graph, VertexIdx},
    weight::Weight,
};

use super::RouteEntry;

#[derive(Debug, Clone)]
struct QueueItem<W> {
    vertex: VertexIdx,
    weight: W,
}
impl<W: Weight> PartialEq for QueueItem<W> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl<W: Weight> Eq for QueueItem<W> {}
impl<W: Weight> PartialOrd for QueueItem<W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<W: Weight> Ord for QueueItem<W> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .weight
            .total_cmp(&self.weight)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

/// Single-source shortest paths from `source`, written into `row`
/// (one slot per vertex of the graph).
///
/// Every reached vertex other than the source records the last edge of one
/// optimal path. A predecessor only changes on a strict improvement and ties
/// in the queue are broken by vertex id, so the result only depends on the
/// graph.
pub fn dijkstra<W: Weight>(graph: &Graph<W>, source: VertexIdx, row: &mut [Option<RouteEntry<W>>]) {
    debug_assert_eq!(row.len(), graph.num_vertices());
    row.fill(None);

    let mut settled = vec![false; graph.num_vertices()];
    row[source.0 as usize] = Some(RouteEntry {
        weight: W::zero(),
        prev_edge: None,
    });

    let mut queue: BinaryHeap<QueueItem<W>> = BinaryHeap::new();
    queue.push(QueueItem {
        vertex: source,
        weight: W::zero(),
    });

    while let Some(QueueItem { vertex, weight }) = queue.pop() {
        if settled[vertex.0 as usize] {
            continue;
        }
        settled[vertex.0 as usize] = true;

        for &edge_idx in graph.outgoing(vertex) {
            let edge = graph.edge(edge_idx);
            if settled[edge.to.0 as usize] {
                continue;
            }
            let candidate = weight + edge.weight;
            let improves = match &row[edge.to.0 as usize] {
                None => true,
                Some(entry) => candidate.total_cmp(&entry.weight) == Ordering::Less,
            };
            if improves {
                row[edge.to.0 as usize] = Some(RouteEntry {
                    weight: candidate,
                    prev_edge: Some(edge_idx),
                });
                queue.push(QueueItem {
                    vertex: edge.to,
                    weight: candidate,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::{EdgeIdx, Graph, VertexIdx};

    use super::dijkstra;

    #[test]
    fn prefers_cheaper_detour() {
        let mut graph: Graph<f64> = Graph::new(4);
        let direct = graph.add_edge(VertexIdx(0), VertexIdx(3), 10.0);
        let a = graph.add_edge(VertexIdx(0), VertexIdx(1), 1.0);
        let b = graph.add_edge(VertexIdx(1), VertexIdx(2), 1.0);
        let c = graph.add_edge(VertexIdx(2), VertexIdx(3), 1.0);

        let mut row = vec![None; 4];
        dijkstra(&graph, VertexIdx(0), &mut row);

        let target = row[3].unwrap();
        assert_eq!(target.weight, 3.0);
        assert_eq!(target.prev_edge, Some(c));
        assert_eq!(row[2].unwrap().prev_edge, Some(b));
        assert_eq!(row[1].unwrap().prev_edge, Some(a));
        assert_ne!(target.prev_edge, Some(direct));
        assert_eq!(row[0].unwrap().prev_edge, None);
    }

    #[test]
    fn unreachable_vertices_stay_empty() {
        let mut graph: Graph<f64> = Graph::new(3);
        graph.add_edge(VertexIdx(1), VertexIdx(0), 1.0);

        let mut row = vec![None; 3];
        dijkstra(&graph, VertexIdx(0), &mut row);
        assert!(row[0].is_some());
        assert!(row[1].is_none());
        assert!(row[2].is_none());
    }

    #[test]
    fn zero_weight_edges_do_not_form_predecessor_cycles() {
        let mut graph: Graph<f64> = Graph::new(3);
        graph.add_edge(VertexIdx(0), VertexIdx(1), 0.0);
        graph.add_edge(VertexIdx(1), VertexIdx(2), 0.0);
        graph.add_edge(VertexIdx(2), VertexIdx(1), 0.0);
        graph.add_edge(VertexIdx(1), VertexIdx(0), 0.0);

        let mut row = vec![None; 3];
        dijkstra(&graph, VertexIdx(0), &mut row);
        assert_eq!(row[0].unwrap().prev_edge, None);
        assert_eq!(row[1].unwrap().prev_edge, Some(EdgeIdx(0)));
        assert_eq!(row[2].unwrap().prev_edge, Some(EdgeIdx(1)));
    }
}
