// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar measurements on rings of directed arcs.
//!
//! Computes areas, perimeters, bounding boxes and point containment using
//! standard computational geometry algorithms. Areas follow the coverage
//! orientation convention: clockwise rings (outer boundaries) have positive
//! area, counter-clockwise rings (holes) negative area.

use nalgebra::Point2;

use crate::arcs::{ArcRef, ArcStore};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl Bounds {
    /// An empty box that any point will expand.
    pub fn empty() -> Self {
        Self {
            min: Point2::new(f64::INFINITY, f64::INFINITY),
            max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn expand(&mut self, p: Point2<f64>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn contains_point(&self, p: &Point2<f64>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Polsby-Popper compactness, `4πA / P²`: 1 for a circle, near 0 for slivers.
pub fn polsby_popper(area: f64, perimeter: f64) -> f64 {
    if perimeter <= 0.0 {
        return 0.0;
    }
    4.0 * std::f64::consts::PI * area.abs() / (perimeter * perimeter)
}

/// Signed area of a vertex loop (implicitly closed), positive when clockwise.
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let (q, p) = (points[i], points[(i + 1) % n]);
        sum += q.x * p.y - p.x * q.y;
    }
    -sum / 2.0
}

impl ArcStore {
    /// Returns the vertices of a ring in traversal order.
    ///
    /// Shared endpoints between consecutive arcs appear once; the ring is
    /// closed (first vertex repeated at the end).
    pub fn ring_vertices(&self, ring: &[ArcRef]) -> Vec<Point2<f64>> {
        let mut out = Vec::new();
        for (i, &r) in ring.iter().enumerate() {
            let skip = usize::from(i > 0);
            out.extend(self.vertices(r).skip(skip));
        }
        out
    }

    /// Signed area of a ring, positive when clockwise.
    pub fn ring_area(&self, ring: &[ArcRef]) -> f64 {
        // Shoelace, summed segment by segment over each arc
        let mut sum = 0.0;
        for &r in ring {
            let mut prev: Option<Point2<f64>> = None;
            for p in self.vertices(r) {
                if let Some(q) = prev {
                    sum += q.x * p.y - p.x * q.y;
                }
                prev = Some(p);
            }
        }
        -sum / 2.0
    }

    /// Length of a ring's boundary.
    pub fn ring_perimeter(&self, ring: &[ArcRef]) -> f64 {
        ring.iter().map(|r| self.arc_length(r.id())).sum()
    }

    /// Bounding box of a ring.
    pub fn ring_bounds(&self, ring: &[ArcRef]) -> Bounds {
        let mut bounds = Bounds::empty();
        for &r in ring {
            for &p in self.arc_points(r.id()) {
                bounds.expand(p);
            }
        }
        bounds
    }

    /// Tests if a point lies inside a ring using ray casting (even-odd rule).
    ///
    /// Points exactly on the boundary may be classified either way.
    pub fn ring_contains_point(&self, ring: &[ArcRef], point: &Point2<f64>) -> bool {
        let mut inside = false;
        for &r in ring {
            let pts = self.arc_points(r.id());
            for w in pts.windows(2) {
                let (a, b) = (w[0], w[1]);
                if (a.y > point.y) != (b.y > point.y) {
                    let x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
                    if point.x < x {
                        inside = !inside;
                    }
                }
            }
        }
        inside
    }

    /// Net area of a polygon given as `[outer, hole1, ...]`.
    ///
    /// Ring signs are taken as stored, so holes wound counter-clockwise
    /// subtract from the outer ring.
    pub fn rings_area(&self, rings: &[Vec<ArcRef>]) -> f64 {
        rings.iter().map(|ring| self.ring_area(ring)).sum()
    }

    /// Total boundary length of a set of rings.
    pub fn rings_perimeter(&self, rings: &[Vec<ArcRef>]) -> f64 {
        rings.iter().map(|ring| self.ring_perimeter(ring)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Unit square as one clockwise arc plus a CCW triangle as another.
    fn store() -> ArcStore {
        ArcStore::from_coords(vec![
            vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
            vec![[0.0, 0.0], [2.0, 0.0], [0.0, 2.0], [0.0, 0.0]],
        ])
        .unwrap()
    }

    #[test]
    fn clockwise_area_is_positive() {
        let arcs = store();
        assert_relative_eq!(arcs.ring_area(&[ArcRef::forward(0)]), 1.0);
        assert_relative_eq!(arcs.ring_area(&[ArcRef::reverse(0)]), -1.0);
    }

    #[test]
    fn counter_clockwise_area_is_negative() {
        let arcs = store();
        assert_relative_eq!(arcs.ring_area(&[ArcRef::forward(1)]), -2.0);
    }

    #[test]
    fn area_across_several_arcs() {
        let arcs = ArcStore::from_coords(vec![
            vec![[0.0, 0.0], [0.0, 2.0], [3.0, 2.0]],
            vec![[3.0, 2.0], [3.0, 0.0], [0.0, 0.0]],
        ])
        .unwrap();
        let ring = [ArcRef::forward(0), ArcRef::forward(1)];
        assert_relative_eq!(arcs.ring_area(&ring), 6.0);
        assert_relative_eq!(arcs.ring_perimeter(&ring), 10.0);
    }

    #[test]
    fn ring_vertices_are_closed() {
        let arcs = ArcStore::from_coords(vec![
            vec![[0.0, 0.0], [0.0, 2.0], [3.0, 2.0]],
            vec![[3.0, 2.0], [3.0, 0.0], [0.0, 0.0]],
        ])
        .unwrap();
        let verts = arcs.ring_vertices(&[ArcRef::forward(0), ArcRef::forward(1)]);
        assert_eq!(verts.len(), 5);
        assert_eq!(verts.first(), verts.last());
    }

    #[test]
    fn point_in_ring() {
        let arcs = store();
        let ring = [ArcRef::forward(0)];
        assert!(arcs.ring_contains_point(&ring, &Point2::new(0.5, 0.5)));
        assert!(!arcs.ring_contains_point(&ring, &Point2::new(1.5, 0.5)));
        // Orientation does not matter for containment
        assert!(arcs.ring_contains_point(&[ArcRef::reverse(0)], &Point2::new(0.25, 0.75)));
    }

    #[test]
    fn bounds_of_ring() {
        let arcs = store();
        let b = arcs.ring_bounds(&[ArcRef::forward(1)]);
        assert_eq!(b.min, Point2::new(0.0, 0.0));
        assert_eq!(b.max, Point2::new(2.0, 2.0));
        assert!(b.contains_point(&Point2::new(1.0, 1.0)));
    }

    #[test]
    fn compactness_of_square() {
        assert_relative_eq!(polsby_popper(1.0, 4.0), std::f64::consts::PI / 4.0);
        assert_eq!(polsby_popper(1.0, 0.0), 0.0);
    }
}
