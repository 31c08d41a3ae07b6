// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial index for tolerance-based vertex lookup and merging.
//!
//! Uses a grid-based spatial hash for O(1) average-case nearest-vertex queries.
//! Coverage building relies on it to snap the vertices of neighbouring
//! polygons onto one shared point.

use nalgebra::Point2;
use rustc_hash::FxHashMap;

/// A spatial hash grid over vertex ids.
///
/// The grid divides the plane into square cells of side `cell_size`. Lookups
/// check the 3x3 neighbourhood of the query cell.
#[derive(Debug)]
pub struct SpatialIndex {
    cell_size: f64,
    grid: FxHashMap<(i64, i64), Vec<usize>>,
}

impl SpatialIndex {
    /// Creates a new spatial index with the given cell size.
    ///
    /// `cell_size` should be >= the tolerance used for queries.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            grid: FxHashMap::default(),
        }
    }

    /// Inserts a vertex id at the given position.
    pub fn insert(&mut self, id: usize, p: Point2<f64>) {
        let cell = self.cell_coords(&p);
        self.grid.entry(cell).or_default().push(id);
    }

    /// Finds the vertex closest to `p` within `tolerance`; ties go to the
    /// lowest id.
    pub fn find_near(
        &self,
        points: &[Point2<f64>],
        p: &Point2<f64>,
        tolerance: f64,
    ) -> Option<usize> {
        self.candidates(points, p, tolerance)
            .min_by(|(ia, da), (ib, db)| da.total_cmp(db).then(ia.cmp(ib)))
            .map(|(id, _)| id)
    }

    fn candidates<'s>(
        &'s self,
        points: &'s [Point2<f64>],
        p: &'s Point2<f64>,
        tolerance: f64,
    ) -> impl Iterator<Item = (usize, f64)> + 's {
        let (cx, cy) = self.cell_coords(p);
        let tol_sq = tolerance * tolerance;
        (-1..=1)
            .flat_map(move |dx| (-1..=1).map(move |dy| (cx + dx, cy + dy)))
            .filter_map(move |cell| self.grid.get(&cell))
            .flatten()
            .filter_map(move |&id| {
                let d = (points.get(id)? - p).norm_squared();
                (d <= tol_sq).then_some((id, d))
            })
    }

    fn cell_coords(&self, p: &Point2<f64>) -> (i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
        )
    }
}

/// Vertices merged within a tolerance.
///
/// This is the "merge-or-create" store behind coverage building: a point
/// close enough to an existing vertex resolves to that vertex.
#[derive(Debug)]
pub struct VertexPool {
    tolerance: f64,
    points: Vec<Point2<f64>>,
    index: SpatialIndex,
}

impl VertexPool {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            points: Vec::new(),
            index: SpatialIndex::new(tolerance.max(1e-10)),
        }
    }

    /// Returns an existing vertex within tolerance of `p`, or adds `p`.
    pub fn find_or_add(&mut self, p: Point2<f64>) -> usize {
        if let Some(existing) = self.index.find_near(&self.points, &p, self.tolerance) {
            return existing;
        }
        let id = self.points.len();
        self.points.push(p);
        self.index.insert(id, p);
        id
    }

    pub fn point(&self, id: usize) -> Point2<f64> {
        self.points[id]
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spatial_index_find_near() {
        let points = vec![Point2::new(0.0, 0.0), Point2::new(10.0, 10.0)];
        let mut index = SpatialIndex::new(0.01);
        for (i, p) in points.iter().enumerate() {
            index.insert(i, *p);
        }

        // Exact match
        assert_eq!(index.find_near(&points, &Point2::new(0.0, 0.0), 0.001), Some(0));

        // Within tolerance
        assert_eq!(
            index.find_near(&points, &Point2::new(0.001, 0.0), 0.01),
            Some(0)
        );

        // Outside tolerance
        assert_eq!(index.find_near(&points, &Point2::new(1.0, 0.0), 0.01), None);
    }

    #[test]
    fn nearest_candidate_wins() {
        let points = vec![Point2::new(0.0, 0.0), Point2::new(0.004, 0.0)];
        let mut index = SpatialIndex::new(0.01);
        for (i, p) in points.iter().enumerate() {
            index.insert(i, *p);
        }
        assert_eq!(index.find_near(&points, &Point2::new(0.003, 0.0), 0.01), Some(1));

        let points = vec![Point2::new(1.0, 0.0), Point2::new(-1.0, 0.0)];
        let mut index = SpatialIndex::new(2.0);
        for (i, p) in points.iter().enumerate() {
            index.insert(i, *p);
        }
        // Equidistant: lowest id
        assert_eq!(index.find_near(&points, &Point2::new(0.0, 0.0), 2.0), Some(0));
    }

    #[test]
    fn neighbouring_cells_are_searched() {
        let points = vec![Point2::new(0.0099, 0.0)];
        let mut index = SpatialIndex::new(0.01);
        index.insert(0, points[0]);
        // Query lands in the next cell over
        assert_eq!(index.find_near(&points, &Point2::new(0.0101, 0.0), 0.01), Some(0));
    }

    #[test]
    fn find_or_add_reuses_vertex() {
        let mut pool = VertexPool::new(0.001);
        let v0 = pool.find_or_add(Point2::new(0.0, 0.0));
        let v1 = pool.find_or_add(Point2::new(0.0001, 0.0));
        let v2 = pool.find_or_add(Point2::new(5.0, 5.0));

        assert_eq!(v0, v1);
        assert_ne!(v0, v2);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.point(v1), Point2::new(0.0, 0.0));
    }

    #[test]
    fn zero_tolerance_merges_exact_duplicates_only() {
        let mut pool = VertexPool::new(0.0);
        let a = pool.find_or_add(Point2::new(1.0, 1.0));
        let b = pool.find_or_add(Point2::new(1.0, 1.0));
        let c = pool.find_or_add(Point2::new(1.0, 1.0 + 1e-12));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
