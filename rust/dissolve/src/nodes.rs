// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node graph over arc endpoints.
//!
//! Builds a graph from an [`ArcStore`] where:
//! - **Nodes** = coordinates where arc endpoints coincide
//! - **Arc ends** = directed arcs leaving a node, kept in angular order
//!
//! Only arcs marked in an [`ArcPresence`] set take part, so tracing never
//! follows arcs that belong to some other layer sharing the store.
//!
//! The central query is [`NodeGraph::next_arc`]: after arriving at a node
//! along one arc, pick the arc making the rightmost turn. Repeating that
//! query walks the boundary of the region lying to the right of the arcs,
//! which is how both mosaic tiles and dissolved rings are traced.

use std::f64::consts::TAU;

use nalgebra::{Point2, Vector2};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::arcs::{ArcPresence, ArcRef, ArcStore};
use crate::keys::NodeKey;

/// A directed arc leaving a node.
#[derive(Debug, Clone, Copy)]
pub struct ArcEnd {
    /// Reference oriented away from the node.
    pub arc: ArcRef,
    /// Direction of the first segment, radians in `(-π, π]`.
    pub angle: f64,
}

/// A node: one coordinate shared by one or more arc endpoints.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub point: Point2<f64>,
    /// Arc ends sorted counter-clockwise by angle (ties by reference).
    pub ends: Vec<ArcEnd>,
}

/// Adjacency structure over the endpoints of a layer's arcs.
#[derive(Debug)]
pub struct NodeGraph<'a> {
    arcs: &'a ArcStore,
    presence: ArcPresence,
    nodes: SlotMap<NodeKey, NodeData>,
    /// Exact-coordinate lookup (bit patterns of `x`, `y`).
    lookup: FxHashMap<(u64, u64), NodeKey>,
    /// Start and end node per arc id; `None` for arcs not present.
    arc_nodes: Vec<Option<(NodeKey, NodeKey)>>,
}

impl<'a> NodeGraph<'a> {
    /// Builds the node graph for the arcs marked in `presence`.
    pub fn new(arcs: &'a ArcStore, presence: ArcPresence) -> Self {
        let mut graph = Self {
            arcs,
            presence,
            nodes: SlotMap::with_key(),
            lookup: FxHashMap::default(),
            arc_nodes: vec![None; arcs.len()],
        };

        let ids: Vec<u32> = graph.presence.ids().collect();
        for id in ids {
            let fwd = ArcRef::forward(id);
            let rev = ArcRef::reverse(id);
            let start = graph.node_at_or_insert(arcs.first_vertex(fwd));
            let end = graph.node_at_or_insert(arcs.last_vertex(fwd));
            graph.nodes[start].ends.push(ArcEnd {
                arc: fwd,
                angle: leaving_angle(arcs, fwd),
            });
            graph.nodes[end].ends.push(ArcEnd {
                arc: rev,
                angle: leaving_angle(arcs, rev),
            });
            graph.arc_nodes[id as usize] = Some((start, end));
        }

        for node in graph.nodes.values_mut() {
            node.ends.sort_by(|a, b| a.angle.total_cmp(&b.angle).then(a.arc.cmp(&b.arc)));
        }

        tracing::debug!(
            nodes = graph.nodes.len(),
            arcs = graph.presence.count(),
            "Built node graph"
        );
        graph
    }

    /// Builds the node graph over every arc in the store.
    pub fn with_all_arcs(arcs: &'a ArcStore) -> Self {
        Self::new(arcs, ArcPresence::all(arcs))
    }

    fn node_at_or_insert(&mut self, p: Point2<f64>) -> NodeKey {
        let key = coord_key(&p);
        if let Some(&k) = self.lookup.get(&key) {
            return k;
        }
        let k = self.nodes.insert(NodeData {
            point: p,
            ends: Vec::new(),
        });
        self.lookup.insert(key, k);
        k
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The arc store this graph indexes.
    pub fn arcs(&self) -> &'a ArcStore {
        self.arcs
    }

    pub fn presence(&self) -> &ArcPresence {
        &self.presence
    }

    pub fn is_present(&self, id: u32) -> bool {
        self.presence.contains(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the node at an exact coordinate, if any arc endpoint lies there.
    pub fn node_at(&self, p: &Point2<f64>) -> Option<NodeKey> {
        self.lookup.get(&coord_key(p)).copied()
    }

    pub fn node(&self, key: NodeKey) -> Option<&NodeData> {
        self.nodes.get(key)
    }

    /// Iterates node keys in creation order.
    pub fn node_keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.nodes.keys()
    }

    /// Node at the first vertex of a directed arc.
    pub fn start_node(&self, r: ArcRef) -> Option<NodeKey> {
        let (start, end) = (*self.arc_nodes.get(r.id() as usize)?)?;
        Some(if r.is_reversed() { end } else { start })
    }

    /// Node at the last vertex of a directed arc.
    pub fn end_node(&self, r: ArcRef) -> Option<NodeKey> {
        self.start_node(r.inverse())
    }

    /// Directed arcs leaving a node, in counter-clockwise angular order.
    pub fn arc_ends(&self, key: NodeKey) -> impl Iterator<Item = ArcRef> + '_ {
        self.nodes
            .get(key)
            .into_iter()
            .flat_map(|n| n.ends.iter().map(|e| e.arc))
    }

    /// Number of arc ends meeting at a node.
    pub fn degree(&self, key: NodeKey) -> usize {
        self.nodes.get(key).map_or(0, |n| n.ends.len())
    }

    // =========================================================================
    // Tracing
    // =========================================================================

    /// Chooses the arc to follow after arriving at a node along `arriving`.
    ///
    /// Among the arcs leaving the node for which `usable` returns true, picks
    /// the one reached first when rotating counter-clockwise from the
    /// direction back along `arriving` (the rightmost turn). Going straight
    /// back along `arriving` is the last resort. Returns `None` when no
    /// leaving arc is usable.
    pub fn next_arc<F>(&self, arriving: ArcRef, usable: F) -> Option<ArcRef>
    where
        F: Fn(ArcRef) -> bool,
    {
        let node = self.nodes.get(self.end_node(arriving)?)?;
        let back = leaving_angle(self.arcs, arriving.inverse());

        let mut best: Option<(f64, ArcRef)> = None;
        for end in &node.ends {
            if !usable(end.arc) {
                continue;
            }
            let mut turn = (end.angle - back).rem_euclid(TAU);
            if turn == 0.0 {
                turn = TAU;
            }
            match best {
                Some((t, _)) if t <= turn => {}
                _ => best = Some((turn, end.arc)),
            }
        }
        best.map(|(_, arc)| arc)
    }
}

/// Hash key for exact coordinate matching; `-0.0` and `0.0` share a key.
fn coord_key(p: &Point2<f64>) -> (u64, u64) {
    ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits())
}

/// Angle of the first non-degenerate segment of a directed arc.
fn leaving_angle(arcs: &ArcStore, r: ArcRef) -> f64 {
    let origin = arcs.first_vertex(r);
    let dir = arcs
        .vertices(r)
        .skip(1)
        .map(|p| p - origin)
        .find(|v| *v != Vector2::zeros())
        .unwrap_or_else(Vector2::zeros);
    dir.y.atan2(dir.x)
}
