// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ring tracing over the node graph.
//!
//! The [`Pathfinder`] rebuilds rings from a set of input rings in one of two
//! modes:
//!
//! - [`PathfindMode::Dissolve`] merges rings that share arcs. An arc walked in
//!   both directions by the input lies inside the union and is dropped; the
//!   remaining arcs are traced into the boundary of the union using the
//!   rightmost-turn rule of [`NodeGraph::next_arc`].
//! - [`PathfindMode::Flatten`] splits a ring that touches itself at a node
//!   into simple rings, cutting at every node the ring revisits.
//!
//! Consumption state lives in a [`RouteTable`] created fresh for every call,
//! so a pathfinder can be shared between threads and reused freely.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::arcs::{ArcRef, Ring};
use crate::error::{Error, Result};
use crate::keys::NodeKey;
use crate::nodes::NodeGraph;

/// How [`Pathfinder::pathfind`] treats its input rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathfindMode {
    /// Union of all input rings.
    Dissolve,
    /// Split self-tangent rings into simple rings.
    Flatten,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Open,
    Used,
}

/// Per-call consumption state of directed arcs. Arcs not in the table are
/// closed.
#[derive(Debug, Default)]
struct RouteTable {
    routes: FxHashMap<usize, Route>,
}

impl RouteTable {
    fn open(&mut self, r: ArcRef) {
        self.routes.entry(r.directed_index()).or_insert(Route::Open);
    }

    fn is_open(&self, r: ArcRef) -> bool {
        self.routes.get(&r.directed_index()) == Some(&Route::Open)
    }

    fn consume(&mut self, r: ArcRef) {
        self.routes.insert(r.directed_index(), Route::Used);
    }
}

/// Ring tracer bound to one node graph.
#[derive(Debug, Clone, Copy)]
pub struct Pathfinder<'g, 'a> {
    nodes: &'g NodeGraph<'a>,
}

impl<'g, 'a> Pathfinder<'g, 'a> {
    pub fn new(nodes: &'g NodeGraph<'a>) -> Self {
        Self { nodes }
    }

    /// Rebuilds `rings` according to `mode`.
    ///
    /// Output is a pure function of the input ring sequence. In flatten mode
    /// every input ring is split independently.
    pub fn pathfind(&self, rings: &[Ring], mode: PathfindMode) -> Result<Vec<Ring>> {
        match mode {
            PathfindMode::Dissolve => self.dissolve(rings),
            PathfindMode::Flatten => {
                let mut out = Vec::new();
                for ring in rings {
                    out.extend(self.flatten(ring)?);
                }
                Ok(out)
            }
        }
    }

    /// Traces the boundary of the union of `rings`.
    ///
    /// Rings come back flat: outer rings clockwise and holes counter-clockwise,
    /// in the order their first arc appears in the input.
    pub fn dissolve(&self, rings: &[Ring]) -> Result<Vec<Ring>> {
        let mut directed = FxHashSet::default();
        for &r in rings.iter().flatten() {
            self.check(r)?;
            directed.insert(r.directed_index());
        }

        let mut table = RouteTable::default();
        for &r in rings.iter().flatten() {
            // Walked both ways: interior to the union
            if !directed.contains(&r.inverse().directed_index()) {
                table.open(r);
            }
        }

        let mut out = Vec::new();
        for &start in rings.iter().flatten() {
            if table.is_open(start) {
                out.push(self.trace(start, &mut table)?);
            }
        }
        Ok(out)
    }

    fn trace(&self, start: ArcRef, table: &mut RouteTable) -> Result<Ring> {
        table.consume(start);
        let mut path = vec![start];
        let mut current = start;
        loop {
            let next = self
                .nodes
                .next_arc(current, |r| r == start || table.is_open(r))
                .ok_or_else(|| self.broken_ring(current))?;
            if next == start {
                return Ok(path);
            }
            table.consume(next);
            path.push(next);
            current = next;
        }
    }

    /// Splits a ring at every node it passes through more than once.
    ///
    /// Sub-rings are emitted as soon as they close, so nested loops come out
    /// before the loop that encloses them. A ring without repeated nodes is
    /// returned unchanged.
    pub fn flatten(&self, ring: &[ArcRef]) -> Result<Vec<Ring>> {
        let Some(&first) = ring.first() else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        let mut path: Ring = Vec::with_capacity(ring.len());
        let mut starts: Vec<NodeKey> = Vec::with_capacity(ring.len());
        // node -> index in `path` of the arc leaving it
        let mut on_path: FxHashMap<NodeKey, usize> = FxHashMap::default();

        let mut current = self.start_of(first)?;
        on_path.insert(current, 0);
        let mut previous = first;

        for &r in ring {
            if self.start_of(r)? != current {
                return Err(self.broken_ring(previous));
            }
            path.push(r);
            starts.push(current);

            let end = self.end_of(r)?;
            match on_path.get(&end).copied() {
                Some(i) => {
                    for node in starts.drain(i..) {
                        on_path.remove(&node);
                    }
                    out.push(path.drain(i..).collect());
                    on_path.insert(end, i);
                }
                None => {
                    on_path.insert(end, path.len());
                }
            }
            current = end;
            previous = r;
        }

        if !path.is_empty() {
            return Err(self.broken_ring(previous));
        }
        Ok(out)
    }

    fn check(&self, r: ArcRef) -> Result<()> {
        self.start_of(r).map(|_| ())
    }

    fn start_of(&self, r: ArcRef) -> Result<NodeKey> {
        self.nodes.start_node(r).ok_or(Error::ArcNotInGraph(r))
    }

    fn end_of(&self, r: ArcRef) -> Result<NodeKey> {
        self.nodes.end_node(r).ok_or(Error::ArcNotInGraph(r))
    }

    fn broken_ring(&self, arc: ArcRef) -> Error {
        let p = self.nodes.arcs().last_vertex(arc);
        Error::BrokenRing { arc, x: p.x, y: p.y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arcs::ArcStore;
    use approx::assert_relative_eq;

    fn f(id: u32) -> ArcRef {
        ArcRef::forward(id)
    }

    fn r(id: u32) -> ArcRef {
        ArcRef::reverse(id)
    }

    /// Two unit squares sharing arc 2 at x = 1.
    fn two_squares() -> ArcStore {
        ArcStore::from_coords(vec![
            vec![[0.0, 1.0], [1.0, 1.0]],
            vec![[1.0, 1.0], [2.0, 1.0], [2.0, 0.0], [1.0, 0.0]],
            vec![[1.0, 1.0], [1.0, 0.0]],
            vec![[0.0, 0.0], [0.0, 1.0]],
            vec![[1.0, 0.0], [0.0, 0.0]],
        ])
        .unwrap()
    }

    /// 4x4 square (arc 0, closed loop starting at (0,2)) and a triangular
    /// hole touching it at (0,2) (arc 1, counter-clockwise).
    fn tangent_hole() -> ArcStore {
        ArcStore::from_coords(vec![
            vec![[0.0, 2.0], [0.0, 4.0], [4.0, 4.0], [4.0, 0.0], [0.0, 0.0], [0.0, 2.0]],
            vec![[0.0, 2.0], [2.0, 1.0], [2.0, 3.0], [0.0, 2.0]],
        ])
        .unwrap()
    }

    #[test]
    fn dissolve_drops_shared_arc() {
        let arcs = two_squares();
        let graph = NodeGraph::with_all_arcs(&arcs);
        let pf = Pathfinder::new(&graph);
        let left = vec![f(0), f(2), f(4), f(3)];
        let right = vec![f(1), r(2)];
        let out = pf.pathfind(&[left, right], PathfindMode::Dissolve).unwrap();
        assert_eq!(out, vec![vec![f(0), f(1), f(4), f(3)]]);
        assert_relative_eq!(arcs.ring_area(&out[0]), 2.0);
    }

    #[test]
    fn dissolve_single_ring_is_unchanged() {
        let arcs = two_squares();
        let graph = NodeGraph::with_all_arcs(&arcs);
        let pf = Pathfinder::new(&graph);
        let left = vec![f(0), f(2), f(4), f(3)];
        let out = pf.pathfind(&[left.clone()], PathfindMode::Dissolve).unwrap();
        assert_eq!(out, vec![left]);
    }

    #[test]
    fn dissolve_fills_hole_covered_by_other_ring() {
        // Outer 3x3 square with a 1x1 hole, plus the tile filling the hole
        let arcs = ArcStore::from_coords(vec![
            vec![[0.0, 0.0], [0.0, 3.0], [3.0, 3.0], [3.0, 0.0], [0.0, 0.0]],
            vec![[1.0, 1.0], [1.0, 2.0], [2.0, 2.0], [2.0, 1.0], [1.0, 1.0]],
        ])
        .unwrap();
        let graph = NodeGraph::with_all_arcs(&arcs);
        let pf = Pathfinder::new(&graph);
        let out = pf
            .dissolve(&[vec![f(0)], vec![f(1)], vec![r(1)]])
            .unwrap();
        assert_eq!(out, vec![vec![f(0)]]);
    }

    #[test]
    fn dissolve_is_deterministic() {
        let arcs = two_squares();
        let graph = NodeGraph::with_all_arcs(&arcs);
        let pf = Pathfinder::new(&graph);
        let rings = vec![vec![f(1), r(2)], vec![f(0), f(2), f(4), f(3)]];
        let a = pf.dissolve(&rings).unwrap();
        let b = pf.dissolve(&rings).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
        assert!(!a[0].iter().any(|x| x.id() == 2));
    }

    #[test]
    fn dissolve_reports_broken_ring() {
        let arcs = two_squares();
        let graph = NodeGraph::with_all_arcs(&arcs);
        let pf = Pathfinder::new(&graph);
        let err = pf.dissolve(&[vec![f(0)]]).unwrap_err();
        match err {
            Error::BrokenRing { arc, x, y } => {
                assert_eq!(arc, f(0));
                assert_eq!((x, y), (1.0, 1.0));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_arc_is_rejected() {
        let arcs = two_squares();
        let shapes = vec![vec![vec![f(0), f(2), f(4), f(3)]]];
        let presence = crate::arcs::ArcPresence::from_shapes(&shapes, &arcs).unwrap();
        let graph = NodeGraph::new(&arcs, presence);
        let pf = Pathfinder::new(&graph);
        let err = pf.dissolve(&[vec![f(1), r(2)]]).unwrap_err();
        assert!(matches!(err, Error::ArcNotInGraph(a) if a == f(1)));
    }

    #[test]
    fn flatten_simple_ring_is_identity() {
        let arcs = two_squares();
        let graph = NodeGraph::with_all_arcs(&arcs);
        let pf = Pathfinder::new(&graph);
        let ring = vec![f(0), f(1), f(4), f(3)];
        let out = pf.pathfind(&[ring.clone()], PathfindMode::Flatten).unwrap();
        assert_eq!(out, vec![ring]);
    }

    #[test]
    fn flatten_splits_tangent_hole() {
        let arcs = tangent_hole();
        let graph = NodeGraph::with_all_arcs(&arcs);
        let pf = Pathfinder::new(&graph);
        let ring = vec![f(0), f(1)];
        let whole = arcs.ring_area(&ring);

        let out = pf.flatten(&ring).unwrap();
        assert_eq!(out, vec![vec![f(0)], vec![f(1)]]);
        let parts: f64 = out.iter().map(|p| arcs.ring_area(p)).sum();
        assert_relative_eq!(parts, whole);
        assert_relative_eq!(whole, 14.0);
    }

    #[test]
    fn flatten_splits_figure_eight() {
        // Two triangles touching at (1,1), walked as one ring
        let arcs = ArcStore::from_coords(vec![
            vec![[1.0, 1.0], [0.0, 2.0], [2.0, 2.0], [1.0, 1.0]],
            vec![[1.0, 1.0], [2.0, 0.0], [0.0, 0.0], [1.0, 1.0]],
        ])
        .unwrap();
        let graph = NodeGraph::with_all_arcs(&arcs);
        let pf = Pathfinder::new(&graph);
        let out = pf.flatten(&[f(0), f(1)]).unwrap();
        assert_eq!(out.len(), 2);
        for ring in &out {
            assert_relative_eq!(arcs.ring_area(ring), 1.0);
        }
    }

    #[test]
    fn flatten_cuts_mid_ring_revisit() {
        // Same tangent-hole geometry, ring started part-way round the outer
        // square: the hole loop closes first, then the outer ring.
        let arcs = ArcStore::from_coords(vec![
            vec![[0.0, 2.0], [0.0, 4.0], [4.0, 4.0]],
            vec![[4.0, 4.0], [4.0, 0.0], [0.0, 0.0], [0.0, 2.0]],
            vec![[0.0, 2.0], [2.0, 1.0], [2.0, 3.0], [0.0, 2.0]],
        ])
        .unwrap();
        let graph = NodeGraph::with_all_arcs(&arcs);
        let pf = Pathfinder::new(&graph);
        let out = pf.flatten(&[f(1), f(2), f(0)]).unwrap();
        assert_eq!(out, vec![vec![f(2)], vec![f(1), f(0)]]);
    }

    #[test]
    fn flatten_rejects_open_ring() {
        let arcs = two_squares();
        let graph = NodeGraph::with_all_arcs(&arcs);
        let pf = Pathfinder::new(&graph);
        assert!(matches!(
            pf.flatten(&[f(0), f(1)]),
            Err(Error::BrokenRing { .. })
        ));
        assert!(pf.flatten(&[]).unwrap().is_empty());
    }
}
