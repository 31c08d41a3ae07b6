// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar decomposition of a polygon layer into tiles.
//!
//! Every directed arc of the node graph lies on exactly one face boundary,
//! found by repeatedly taking the rightmost turn. Clockwise cycles bound
//! tiles; counter-clockwise cycles bound the outside of a connected group of
//! arcs and become holes of the tile that encloses them.
//!
//! Each input shape claims the tiles inside its rings. Tiles claimed by no
//! shape are gaps, which [`MosaicIndex::remove_gaps`] can hand to a
//! neighbouring shape.

use std::iter;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};
use smallvec::{smallvec, SmallVec};

use crate::adjacency::AdjacencyFilter;
use crate::arcs::{ArcRef, Ring, Shape};
use crate::error::{Error, Result};
use crate::geometry::Bounds;
use crate::keys::{NodeKey, TileKey};
use crate::nodes::NodeGraph;
use crate::sliver::SliverFilter;

/// How tile claims are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MosaicOptions {
    /// Overlapping claims go to the highest shape id.
    pub flat: bool,
    /// All shapes are dissolved together; the first claim wins.
    pub simple: bool,
}

/// A minimal region bounded by arcs.
#[derive(Debug, Clone)]
pub struct Tile {
    /// Clockwise outer ring.
    pub outer: Ring,
    /// Counter-clockwise hole rings.
    pub holes: Vec<Ring>,
    /// Net area (outer minus holes).
    pub area: f64,
    /// Length of all rings.
    pub perimeter: f64,
}

impl Tile {
    /// Outer ring followed by holes.
    pub fn rings(&self) -> Vec<Ring> {
        iter::once(self.outer.clone())
            .chain(self.holes.iter().cloned())
            .collect()
    }

    /// Every directed arc on the tile boundary.
    pub fn arcs(&self) -> impl Iterator<Item = ArcRef> + '_ {
        self.outer.iter().chain(self.holes.iter().flatten()).copied()
    }
}

/// Outcome of a gap-closure pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapStats {
    /// Gaps assigned to a neighbouring shape.
    pub removed: usize,
    /// Gaps left unclaimed.
    pub remaining: usize,
}

impl GapStats {
    pub fn total(&self) -> usize {
        self.removed + self.remaining
    }
}

type Owners = SmallVec<[usize; 1]>;

/// Tiles of a layer and the shapes owning them.
#[derive(Debug)]
pub struct MosaicIndex<'g, 'a> {
    nodes: &'g NodeGraph<'a>,
    options: MosaicOptions,
    tiles: SlotMap<TileKey, Tile>,
    /// Tile to the right of each directed arc, by directed index.
    tile_by_arc: Vec<Option<TileKey>>,
    owners: SecondaryMap<TileKey, Owners>,
    /// Owned tiles per shape id, in tile order.
    shape_tiles: Vec<Vec<TileKey>>,
}

/// Boundary cycle found while tracing faces.
struct Cycle {
    ring: Ring,
    area: f64,
    bounds: Bounds,
    component: usize,
}

impl<'g, 'a> MosaicIndex<'g, 'a> {
    /// Decomposes the arcs of `nodes` into tiles and assigns them to `shapes`.
    pub fn new(
        nodes: &'g NodeGraph<'a>,
        shapes: &[Option<Shape>],
        options: MosaicOptions,
    ) -> Result<Self> {
        for &r in shapes.iter().flatten().flatten().flatten() {
            if !nodes.is_present(r.id()) {
                return Err(Error::ArcNotInGraph(r));
            }
        }

        let mut index = Self {
            nodes,
            options,
            tiles: SlotMap::with_key(),
            tile_by_arc: vec![None; nodes.arcs().len() * 2],
            owners: SecondaryMap::new(),
            shape_tiles: vec![Vec::new(); shapes.len()],
        };

        let cycles = index.trace_cycles()?;
        let holes = index.build_tiles(cycles);
        index.index_arcs();
        index.claim_tiles(shapes);
        index.reindex();

        tracing::debug!(
            tiles = index.tiles.len(),
            holes,
            gaps = index.gap_count(),
            shapes = shapes.len(),
            "Built mosaic"
        );
        Ok(index)
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Traces the face boundary through every directed present arc.
    fn trace_cycles(&self) -> Result<Vec<Cycle>> {
        let arcs = self.nodes.arcs();
        let components = self.components();
        let mut visited = vec![false; arcs.len() * 2];
        let mut cycles = Vec::new();

        for id in self.nodes.presence().ids() {
            for start in [ArcRef::forward(id), ArcRef::reverse(id)] {
                if visited[start.directed_index()] {
                    continue;
                }
                visited[start.directed_index()] = true;
                let mut ring = vec![start];
                let mut current = start;
                loop {
                    let next = self
                        .nodes
                        .next_arc(current, |_| true)
                        .ok_or_else(|| self.broken_ring(current))?;
                    if next == start {
                        break;
                    }
                    // Coincident arcs can break the face permutation
                    if visited[next.directed_index()] {
                        return Err(self.broken_ring(current));
                    }
                    visited[next.directed_index()] = true;
                    ring.push(next);
                    current = next;
                }

                let component = self
                    .nodes
                    .start_node(start)
                    .and_then(|n| components.get(n).copied())
                    .unwrap_or(usize::MAX);
                cycles.push(Cycle {
                    area: arcs.ring_area(&ring),
                    bounds: arcs.ring_bounds(&ring),
                    ring,
                    component,
                });
            }
        }
        Ok(cycles)
    }

    /// Connected component id of every node (union-find over present arcs).
    fn components(&self) -> SecondaryMap<NodeKey, usize> {
        let mut slot = SecondaryMap::new();
        for (i, key) in self.nodes.node_keys().enumerate() {
            slot.insert(key, i);
        }
        let mut parent: Vec<usize> = (0..slot.len()).collect();

        fn find(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }

        for id in self.nodes.presence().ids() {
            let r = ArcRef::forward(id);
            if let (Some(a), Some(b)) = (self.nodes.start_node(r), self.nodes.end_node(r)) {
                let (ra, rb) = (find(&mut parent, slot[a]), find(&mut parent, slot[b]));
                if ra != rb {
                    parent[ra.max(rb)] = ra.min(rb);
                }
            }
        }

        let mut out = SecondaryMap::new();
        for (key, &i) in &slot {
            out.insert(key, find(&mut parent, i));
        }
        out
    }

    /// Turns clockwise cycles into tiles and nests the remaining cycles as
    /// holes. Returns the number of holes placed.
    fn build_tiles(&mut self, cycles: Vec<Cycle>) -> usize {
        let arcs = self.nodes.arcs();
        let (outers, inners): (Vec<Cycle>, Vec<Cycle>) =
            cycles.into_iter().partition(|c| c.area >= 0.0);

        let mut keys = Vec::with_capacity(outers.len());
        for c in &outers {
            keys.push(self.tiles.insert(Tile {
                outer: c.ring.clone(),
                holes: Vec::new(),
                area: c.area,
                perimeter: arcs.ring_perimeter(&c.ring),
            }));
        }

        let mut placed = 0;
        for hole in inners {
            let point = arcs.first_vertex(hole.ring[0]);
            let host = outers
                .iter()
                .zip(&keys)
                .filter(|(c, _)| {
                    c.component != hole.component
                        && c.bounds.contains_point(&point)
                        && arcs.ring_contains_point(&c.ring, &point)
                })
                .min_by(|(a, _), (b, _)| a.area.total_cmp(&b.area))
                .map(|(_, &k)| k);
            // No host: the cycle bounds the unbounded face
            if let Some(key) = host {
                let tile = &mut self.tiles[key];
                tile.area += hole.area;
                tile.perimeter += arcs.ring_perimeter(&hole.ring);
                tile.holes.push(hole.ring);
                placed += 1;
            }
        }
        placed
    }

    fn index_arcs(&mut self) {
        for (key, tile) in &self.tiles {
            for r in tile.arcs() {
                self.tile_by_arc[r.directed_index()] = Some(key);
            }
        }
    }

    /// Records which shapes claim each tile and resolves ownership.
    fn claim_tiles(&mut self, shapes: &[Option<Shape>]) {
        let mut claims: SecondaryMap<TileKey, Owners> = SecondaryMap::new();
        for key in self.tiles.keys() {
            claims.insert(key, SmallVec::new());
        }

        for (id, shape) in shapes.iter().enumerate() {
            let Some(shape) = shape else { continue };
            let covered = self.shape_cover(shape);
            if covered.is_empty() && !shape.is_empty() {
                tracing::warn!(shape = id, "Shape encloses no mosaic tile");
            }
            for key in covered {
                claims[key].push(id);
            }
        }

        for (key, claimants) in claims {
            let owners: Owners = if claimants.is_empty() {
                SmallVec::new()
            } else if self.options.simple {
                smallvec![claimants[0]]
            } else if self.options.flat {
                smallvec![claimants[claimants.len() - 1]]
            } else {
                claimants
            };
            self.owners.insert(key, owners);
        }
    }

    /// Tiles enclosed by a shape's rings: the tiles to the right of its arcs,
    /// plus everything reachable from them without crossing one of its arcs.
    fn shape_cover(&self, shape: &Shape) -> Vec<TileKey> {
        let used: FxHashSet<u32> = shape.iter().flatten().map(|r| r.id()).collect();
        let mut seen = FxHashSet::default();
        let mut stack = Vec::new();
        for r in shape.iter().flatten() {
            if let Some(key) = self.tile_by_arc[r.directed_index()] {
                if seen.insert(key) {
                    stack.push(key);
                }
            }
        }

        let mut out = Vec::new();
        while let Some(key) = stack.pop() {
            out.push(key);
            for r in self.tiles[key].arcs() {
                if used.contains(&r.id()) {
                    continue;
                }
                if let Some(next) = self.tile_by_arc[r.inverse().directed_index()] {
                    if seen.insert(next) {
                        stack.push(next);
                    }
                }
            }
        }
        out
    }

    /// Rebuilds the shape → tiles index from the ownership table.
    fn reindex(&mut self) {
        for tiles in &mut self.shape_tiles {
            tiles.clear();
        }
        for (key, owners) in &self.owners {
            for &shape in owners {
                self.shape_tiles[shape].push(key);
            }
        }
        for tiles in &mut self.shape_tiles {
            tiles.sort_unstable();
        }
    }

    fn broken_ring(&self, arc: ArcRef) -> Error {
        let p = self.nodes.arcs().last_vertex(arc);
        Error::BrokenRing { arc, x: p.x, y: p.y }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn options(&self) -> MosaicOptions {
        self.options
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Number of tiles no shape owns.
    pub fn gap_count(&self) -> usize {
        self.owners.values().filter(|o| o.is_empty()).count()
    }

    pub fn tile(&self, key: TileKey) -> Option<&Tile> {
        self.tiles.get(key)
    }

    pub fn tile_area(&self, key: TileKey) -> Option<f64> {
        self.tiles.get(key).map(|t| t.area)
    }

    /// All tiles in construction order.
    pub fn tiles(&self) -> impl Iterator<Item = (TileKey, &Tile)> + '_ {
        self.tiles.iter()
    }

    /// Shapes owning a tile; empty for gaps.
    pub fn owners(&self, key: TileKey) -> &[usize] {
        match self.owners.get(key) {
            Some(owners) => owners,
            None => &[],
        }
    }

    pub fn is_gap(&self, key: TileKey) -> bool {
        self.owners(key).is_empty()
    }

    /// Tile lying to the right of a directed arc.
    pub fn tile_for_arc(&self, r: ArcRef) -> Option<TileKey> {
        self.tile_by_arc.get(r.directed_index()).copied().flatten()
    }

    /// Tiles owned by one shape.
    pub fn shape_tiles(&self, shape: usize) -> &[TileKey] {
        match self.shape_tiles.get(shape) {
            Some(tiles) => tiles,
            None => &[],
        }
    }

    /// Rings of every tile owned by any of `shapes`, in tile order. Each tile
    /// is `[outer, hole1, hole2, ...]`.
    pub fn tiles_by_shape_ids(&self, shapes: &[usize]) -> Vec<Vec<Ring>> {
        let mut keys: Vec<TileKey> = shapes
            .iter()
            .flat_map(|&s| self.shape_tiles(s).iter().copied())
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys.into_iter().map(|k| self.tiles[k].rings()).collect()
    }

    // =========================================================================
    // Gap closure
    // =========================================================================

    /// Assigns sliver gaps to a bordering shape.
    ///
    /// A gap flagged by `sliver` goes to the bordering shape accepted by
    /// `adjacency` that shares the longest boundary with it; equal lengths go
    /// to the lowest shape id. Borders are measured against ownership as it
    /// was before the pass, so newly closed gaps do not extend their new
    /// owner within the same pass.
    pub fn remove_gaps(&mut self, sliver: &SliverFilter, adjacency: &AdjacencyFilter) -> GapStats {
        let gaps: Vec<TileKey> = self
            .owners
            .iter()
            .filter(|(_, o)| o.is_empty())
            .map(|(k, _)| k)
            .collect();

        let assignments: Vec<(TileKey, usize)> = gaps
            .iter()
            .filter(|&&key| sliver.is_sliver_tile(&self.tiles[key]))
            .filter_map(|&key| self.best_neighbor(key, adjacency).map(|s| (key, s)))
            .collect();

        let removed = assignments.len();
        for (key, shape) in assignments {
            self.owners[key] = smallvec![shape];
        }
        if removed > 0 {
            self.reindex();
        }

        let stats = GapStats {
            removed,
            remaining: gaps.len() - removed,
        };
        tracing::debug!(
            removed = stats.removed,
            remaining = stats.remaining,
            threshold = ?sliver.threshold(),
            "Closed gaps"
        );
        stats
    }

    /// Accepted bordering shape with the longest shared boundary.
    fn best_neighbor(&self, gap: TileKey, adjacency: &AdjacencyFilter) -> Option<usize> {
        let arcs = self.nodes.arcs();
        let mut border: FxHashMap<usize, f64> = FxHashMap::default();
        for r in self.tiles[gap].arcs() {
            let Some(neighbor) = self.tile_for_arc(r.inverse()) else {
                continue;
            };
            if neighbor == gap {
                continue;
            }
            for &shape in self.owners(neighbor) {
                if adjacency.accepts(shape) {
                    *border.entry(shape).or_insert(0.0) += arcs.arc_length(r.id());
                }
            }
        }

        let mut candidates: Vec<(usize, f64)> = border.into_iter().collect();
        candidates.sort_unstable_by_key(|&(shape, _)| shape);
        let mut best: Option<(usize, f64)> = None;
        for (shape, len) in candidates {
            match best {
                Some((_, longest)) if !is_longer(len, longest) => {}
                _ => best = Some((shape, len)),
            }
        }
        best.map(|(shape, _)| shape)
    }
}

/// Relative tolerance under which two border lengths count as equal.
const BORDER_TOLERANCE: f64 = 1e-9;

/// True when `a` exceeds `b` by more than rounding noise.
fn is_longer(a: f64, b: f64) -> bool {
    a - b > BORDER_TOLERANCE * a.abs().max(b.abs())
}
