//! All-pairs shortest-path matrix over the static transfer-edge graph.
//!
//! The edge set rarely changes (only when celestial config is reloaded),
//! so the matrix is computed once via Dijkstra from every location and
//! cached; callers check [`RouteMatrix::edges_hash`] against a freshly
//! hashed edge set and rebuild only when it no longer matches.

use crate::celestial::TransferEdge;
use crate::hash::canonical_hash;
use crate::ids::LocationId;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct RouteStep {
    pub to: LocationId,
    pub dv_m_s: f64,
    pub tof_s: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub dv_m_s: f64,
    pub tof_s: f64,
    pub path: Vec<LocationId>,
}

#[derive(Debug, Clone)]
pub struct RouteMatrix {
    edges_hash: String,
    routes: HashMap<LocationId, HashMap<LocationId, Route>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapEntry {
    dv_m_s: f64,
    node_index: usize,
}

impl Eq for HeapEntry {}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the lowest dv pops first.
        other
            .dv_m_s
            .partial_cmp(&self.dv_m_s)
            .unwrap_or(Ordering::Equal)
    }
}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl RouteMatrix {
    #[must_use]
    pub fn edges_hash(&self) -> &str {
        &self.edges_hash
    }

    /// Builds (or rebuilds) the all-pairs matrix from the given edge list.
    /// `dv_m_s` is minimized; `tof_s` is whatever the winning path's total
    /// time of flight is (not independently optimized — matches the
    /// dv-weighted routing policy).
    #[must_use]
    pub fn build(edges: &[TransferEdge]) -> Self {
        let edges_hash = canonical_hash(&edges.iter().map(edge_key).collect::<Vec<_>>());

        let mut node_ids: Vec<LocationId> = Vec::new();
        let mut index_of: HashMap<LocationId, usize> = HashMap::new();
        for e in edges {
            for id in [&e.from_id, &e.to_id] {
                if !index_of.contains_key(id) {
                    index_of.insert(id.clone(), node_ids.len());
                    node_ids.push(id.clone());
                }
            }
        }

        let mut adjacency: Vec<Vec<(usize, f64, f64)>> = vec![Vec::new(); node_ids.len()];
        for e in edges {
            let from = index_of[&e.from_id];
            let to = index_of[&e.to_id];
            adjacency[from].push((to, e.dv_m_s, e.tof_s));
        }

        let mut routes: HashMap<LocationId, HashMap<LocationId, Route>> = HashMap::new();
        for (start_id, &start_idx) in &index_of {
            let mut dist = vec![f64::INFINITY; node_ids.len()];
            let mut tof = vec![0.0_f64; node_ids.len()];
            let mut prev: Vec<Option<usize>> = vec![None; node_ids.len()];
            dist[start_idx] = 0.0;
            let mut heap = BinaryHeap::new();
            heap.push(HeapEntry {
                dv_m_s: 0.0,
                node_index: start_idx,
            });

            while let Some(HeapEntry { dv_m_s, node_index }) = heap.pop() {
                if dv_m_s > dist[node_index] {
                    continue;
                }
                for &(neighbor, edge_dv, edge_tof) in &adjacency[node_index] {
                    let candidate = dv_m_s + edge_dv;
                    if candidate < dist[neighbor] {
                        dist[neighbor] = candidate;
                        tof[neighbor] = tof[node_index] + edge_tof;
                        prev[neighbor] = Some(node_index);
                        heap.push(HeapEntry {
                            dv_m_s: candidate,
                            node_index: neighbor,
                        });
                    }
                }
            }

            let mut per_target = HashMap::new();
            for (target_id, &target_idx) in &index_of {
                if target_idx == start_idx || !dist[target_idx].is_finite() {
                    continue;
                }
                let mut path = vec![node_ids[target_idx].clone()];
                let mut cursor = target_idx;
                while let Some(p) = prev[cursor] {
                    path.push(node_ids[p].clone());
                    cursor = p;
                }
                path.reverse();
                per_target.insert(
                    target_id.clone(),
                    Route {
                        dv_m_s: dist[target_idx],
                        tof_s: tof[target_idx],
                        path,
                    },
                );
            }
            routes.insert(start_id.clone(), per_target);
        }

        Self { edges_hash, routes }
    }

    /// `true` if `edges` would produce a different matrix than the one
    /// currently cached, i.e. the caller should call [`Self::build`] again.
    #[must_use]
    pub fn is_stale_for(&self, edges: &[TransferEdge]) -> bool {
        let fresh = canonical_hash(&edges.iter().map(edge_key).collect::<Vec<_>>());
        fresh != self.edges_hash
    }

    #[must_use]
    pub fn route(&self, from: &LocationId, to: &LocationId) -> Option<&Route> {
        self.routes.get(from)?.get(to)
    }
}

fn edge_key(e: &TransferEdge) -> (String, String, u64, u64) {
    (
        e.from_id.0.clone(),
        e.to_id.0.clone(),
        e.dv_m_s.to_bits(),
        e.tof_s.to_bits(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::celestial::EdgeType;

    fn edge(from: &str, to: &str, dv: f64, tof: f64) -> TransferEdge {
        TransferEdge {
            from_id: LocationId::from(from),
            to_id: LocationId::from(to),
            dv_m_s: dv,
            tof_s: tof,
            edge_type: EdgeType::Orbital,
        }
    }

    #[test]
    fn finds_direct_route() {
        let edges = vec![edge("a", "b", 100.0, 10.0)];
        let matrix = RouteMatrix::build(&edges);
        let route = matrix
            .route(&LocationId::from("a"), &LocationId::from("b"))
            .unwrap();
        assert!((route.dv_m_s - 100.0).abs() < 1e-9);
        assert_eq!(route.path, vec![LocationId::from("a"), LocationId::from("b")]);
    }

    #[test]
    fn prefers_cheaper_multi_hop_over_expensive_direct() {
        let edges = vec![
            edge("a", "b", 1000.0, 5.0),
            edge("a", "c", 50.0, 5.0),
            edge("c", "b", 50.0, 5.0),
        ];
        let matrix = RouteMatrix::build(&edges);
        let route = matrix
            .route(&LocationId::from("a"), &LocationId::from("b"))
            .unwrap();
        assert!((route.dv_m_s - 100.0).abs() < 1e-9);
        assert_eq!(
            route.path,
            vec![
                LocationId::from("a"),
                LocationId::from("c"),
                LocationId::from("b"),
            ]
        );
    }

    #[test]
    fn unreachable_node_returns_none() {
        let edges = vec![edge("a", "b", 10.0, 1.0)];
        let matrix = RouteMatrix::build(&edges);
        assert!(matrix
            .route(&LocationId::from("b"), &LocationId::from("a"))
            .is_none());
    }

    #[test]
    fn stale_detection_triggers_on_edge_change() {
        let edges = vec![edge("a", "b", 10.0, 1.0)];
        let matrix = RouteMatrix::build(&edges);
        assert!(!matrix.is_stale_for(&edges));
        let changed = vec![edge("a", "b", 20.0, 1.0)];
        assert!(matrix.is_stale_for(&changed));
    }
}
