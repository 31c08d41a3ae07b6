// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coverage construction from plain coordinate rings.
//!
//! [`CoverageBuilder`] sews polygons given as coordinate rings into a shared
//! arc pool: vertices within tolerance become one vertex, and every distinct
//! segment becomes one arc, so neighbouring polygons walk their common
//! boundary over the same arcs in opposite directions.
//!
//! Rings are normalized to the crate's winding: the first ring of each part
//! clockwise, the holes counter-clockwise. Polygons must meet at shared
//! vertices; a vertex lying on the inside of a neighbour's segment is not
//! split.

use nalgebra::Point2;
use rustc_hash::FxHashMap;

use crate::arcs::{ArcRef, ArcStore, Ring, Shape};
use crate::error::{Error, Result};
use crate::geometry::signed_area;
use crate::layer::Layer;
use crate::spatial::VertexPool;

/// Incrementally sews polygons into an [`ArcStore`] and a polygon [`Layer`].
#[derive(Debug)]
pub struct CoverageBuilder {
    pool: VertexPool,
    /// Start and end vertex of each arc.
    segments: Vec<(usize, usize)>,
    /// Unordered vertex pair → arc id.
    segment_map: FxHashMap<(usize, usize), u32>,
    shapes: Vec<Option<Shape>>,
}

impl CoverageBuilder {
    /// Creates a builder snapping vertices closer than `tolerance`.
    pub fn new(tolerance: f64) -> Self {
        Self {
            pool: VertexPool::new(tolerance),
            segments: Vec::new(),
            segment_map: FxHashMap::default(),
            shapes: Vec::new(),
        }
    }

    /// Adds a single-part polygon `[outer, hole1, ...]`. Returns its shape id.
    pub fn add_polygon(&mut self, rings: &[Vec<[f64; 2]>]) -> Result<usize> {
        self.add_multipolygon(&[rings.to_vec()])
    }

    /// Adds a polygon with several parts, each `[outer, hole1, ...]`.
    pub fn add_multipolygon(&mut self, parts: &[Vec<Vec<[f64; 2]>>]) -> Result<usize> {
        let id = self.shapes.len();
        // Every ring is snapped before any arc is created, so a rejected
        // polygon leaves no arcs behind.
        let mut loops = Vec::new();
        for part in parts {
            for (i, coords) in part.iter().enumerate() {
                let ids = self.snap_ring(coords, i == 0).ok_or(Error::DegenerateRing {
                    polygon: id,
                    ring: loops.len(),
                })?;
                loops.push(ids);
            }
        }
        let shape = loops.iter().map(|ids| self.sew_ring(ids)).collect();
        self.shapes.push(Some(shape));
        Ok(id)
    }

    /// Adds a shape without geometry. Returns its shape id.
    pub fn add_null(&mut self) -> usize {
        self.shapes.push(None);
        self.shapes.len() - 1
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn arc_count(&self) -> usize {
        self.segments.len()
    }

    /// Finishes the coverage.
    pub fn build(self) -> Result<(ArcStore, Layer)> {
        let pool = &self.pool;
        let arcs = ArcStore::from_arcs(
            self.segments
                .iter()
                .map(|&(a, b)| vec![pool.point(a), pool.point(b)])
                .collect(),
        )?;
        tracing::debug!(
            vertices = pool.len(),
            arcs = arcs.len(),
            shapes = self.shapes.len(),
            "Built coverage"
        );
        Ok((arcs, Layer::polygons(self.shapes)))
    }

    /// Snaps a ring's vertices and orients the resulting vertex loop.
    /// Returns `None` if fewer than three distinct vertices remain.
    fn snap_ring(&mut self, coords: &[[f64; 2]], outer: bool) -> Option<Vec<usize>> {
        let mut ids: Vec<usize> = Vec::with_capacity(coords.len());
        for c in coords {
            let id = self.pool.find_or_add(Point2::new(c[0], c[1]));
            if ids.last() != Some(&id) {
                ids.push(id);
            }
        }
        while ids.len() > 1 && ids.first() == ids.last() {
            ids.pop();
        }
        if ids.len() < 3 {
            return None;
        }

        let points: Vec<Point2<f64>> = ids.iter().map(|&i| self.pool.point(i)).collect();
        let clockwise = signed_area(&points) > 0.0;
        if clockwise != outer {
            ids.reverse();
        }
        Some(ids)
    }

    /// Converts a vertex loop to arc references.
    fn sew_ring(&mut self, ids: &[usize]) -> Ring {
        let n = ids.len();
        (0..n).map(|i| self.segment(ids[i], ids[(i + 1) % n])).collect()
    }

    /// Arc reference walking from vertex `a` to vertex `b`.
    fn segment(&mut self, a: usize, b: usize) -> ArcRef {
        let canonical = if a < b { (a, b) } else { (b, a) };
        if let Some(&id) = self.segment_map.get(&canonical) {
            let (start, _) = self.segments[id as usize];
            return if start == a {
                ArcRef::forward(id)
            } else {
                ArcRef::reverse(id)
            };
        }
        let id = self.segments.len() as u32;
        self.segments.push((a, b));
        self.segment_map.insert(canonical, id);
        ArcRef::forward(id)
    }
}
