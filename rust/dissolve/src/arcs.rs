// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared storage for boundary arcs.
//!
//! The [`ArcStore`] owns the vertex data of every arc in a coverage. Polygons
//! never hold coordinates themselves: their rings are sequences of directed
//! [`ArcRef`]s into the store, so two adjacent polygons walk the same arc in
//! opposite directions. The store is owned by the caller and only borrowed by
//! the dissolve engine.
//!
//! ## Directed references
//!
//! An [`ArcRef`] names an arc and a traversal direction. It serializes as a
//! signed integer using the bitwise-not convention common in topological
//! formats: a forward reference to arc `7` is `7`, a reverse one is `!7 == -8`.

use std::fmt;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A directed reference to an arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub struct ArcRef {
    id: u32,
    reversed: bool,
}

/// A closed sequence of directed arc references.
pub type Ring = Vec<ArcRef>;

/// An ordered list of rings (first ring outer, the rest outer parts or holes).
pub type Shape = Vec<Ring>;

impl ArcRef {
    /// Forward reference (first vertex to last).
    pub fn forward(id: u32) -> Self {
        Self { id, reversed: false }
    }

    /// Reverse reference (last vertex to first).
    pub fn reverse(id: u32) -> Self {
        Self { id, reversed: true }
    }

    /// The referenced arc id.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// The same arc walked in the opposite direction.
    pub fn inverse(&self) -> Self {
        Self {
            id: self.id,
            reversed: !self.reversed,
        }
    }

    /// Dense index over directed arcs: `2 * id` forward, `2 * id + 1` reverse.
    pub fn directed_index(&self) -> usize {
        (self.id as usize) * 2 + self.reversed as usize
    }

    /// Inverse of [`ArcRef::directed_index`].
    pub fn from_directed_index(index: usize) -> Self {
        Self {
            id: (index / 2) as u32,
            reversed: index % 2 == 1,
        }
    }
}

impl fmt::Display for ArcRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reversed {
            write!(f, "!{}", self.id)
        } else {
            write!(f, "{}", self.id)
        }
    }
}

impl From<ArcRef> for i64 {
    fn from(r: ArcRef) -> Self {
        if r.reversed {
            !(r.id as i64)
        } else {
            r.id as i64
        }
    }
}

impl TryFrom<i64> for ArcRef {
    type Error = String;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        let (id, reversed) = if value < 0 { (!value, true) } else { (value, false) };
        u32::try_from(id)
            .map(|id| Self { id, reversed })
            .map_err(|_| format!("arc reference {value} out of range"))
    }
}

/// Reverses a ring in place: arc order is inverted and every reference flipped.
pub fn reverse_ring(ring: &mut Ring) {
    ring.reverse();
    for r in ring.iter_mut() {
        *r = r.inverse();
    }
}

/// Returns a reversed copy of a ring.
pub fn reversed_ring(ring: &[ArcRef]) -> Ring {
    ring.iter().rev().map(ArcRef::inverse).collect()
}

/// Caller-owned collection of arcs.
///
/// Vertices of all arcs live in one contiguous buffer; `offsets[i]..offsets[i + 1]`
/// is the vertex range of arc `i`.
///
/// # Example
///
/// ```
/// use dissolve_lite::ArcStore;
///
/// let arcs = ArcStore::from_coords(vec![
///     vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
///     vec![[1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
/// ])
/// .unwrap();
///
/// assert_eq!(arcs.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ArcStore {
    points: Vec<Point2<f64>>,
    offsets: Vec<usize>,
}

impl ArcStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            offsets: vec![0],
        }
    }

    /// Creates a store from per-arc vertex lists.
    ///
    /// Returns an error if any arc has fewer than two vertices.
    pub fn from_arcs(arcs: Vec<Vec<Point2<f64>>>) -> Result<Self> {
        let mut store = Self::new();
        for arc in arcs {
            store.push_arc(arc)?;
        }
        Ok(store)
    }

    /// Creates a store from per-arc `[x, y]` coordinate lists.
    pub fn from_coords(arcs: Vec<Vec<[f64; 2]>>) -> Result<Self> {
        Self::from_arcs(
            arcs.into_iter()
                .map(|arc| arc.into_iter().map(|[x, y]| Point2::new(x, y)).collect())
                .collect(),
        )
    }

    /// Appends an arc and returns its id.
    pub fn push_arc(&mut self, vertices: Vec<Point2<f64>>) -> Result<u32> {
        if self.offsets.is_empty() {
            self.offsets.push(0);
        }
        let id = self.len() as u32;
        if vertices.len() < 2 {
            return Err(Error::DegenerateArc(id));
        }
        self.points.extend(vertices);
        self.offsets.push(self.points.len());
        Ok(id)
    }

    /// Returns the number of arcs.
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the vertices of an arc in stored (forward) order.
    pub fn arc_points(&self, id: u32) -> &[Point2<f64>] {
        let i = id as usize;
        &self.points[self.offsets[i]..self.offsets[i + 1]]
    }

    /// Checks that a reference points at an arc in this store.
    pub fn check_ref(&self, r: ArcRef) -> Result<()> {
        if (r.id() as usize) < self.len() {
            Ok(())
        } else {
            Err(Error::InvalidArcRef {
                id: r.id(),
                count: self.len(),
            })
        }
    }

    /// Iterates the vertices of a directed arc in traversal order.
    pub fn vertices(&self, r: ArcRef) -> impl DoubleEndedIterator<Item = Point2<f64>> + '_ {
        let pts = self.arc_points(r.id());
        let reversed = r.is_reversed();
        let n = pts.len();
        (0..n).map(move |i| if reversed { pts[n - 1 - i] } else { pts[i] })
    }

    /// First vertex of a directed arc.
    pub fn first_vertex(&self, r: ArcRef) -> Point2<f64> {
        self.nth_vertex(r, 0)
    }

    /// Last vertex of a directed arc.
    pub fn last_vertex(&self, r: ArcRef) -> Point2<f64> {
        let n = self.arc_points(r.id()).len();
        self.nth_vertex(r, n - 1)
    }

    /// Vertex `i` of a directed arc, counted in traversal order.
    pub fn nth_vertex(&self, r: ArcRef, i: usize) -> Point2<f64> {
        let pts = self.arc_points(r.id());
        if r.is_reversed() {
            pts[pts.len() - 1 - i]
        } else {
            pts[i]
        }
    }

    /// Euclidean length of an arc.
    pub fn arc_length(&self, id: u32) -> f64 {
        self.arc_points(id)
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .sum()
    }
}

impl Default for ArcStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Set of arcs referenced by a layer's shapes.
///
/// Restricts topology construction to the arcs one layer actually uses, so
/// ring tracing never wanders onto arcs that belong to other layers sharing
/// the same store.
#[derive(Debug, Clone)]
pub struct ArcPresence {
    present: Vec<bool>,
    count: usize,
}

impl ArcPresence {
    /// Marks every arc referenced by `shapes`.
    ///
    /// Returns an error if a shape references an arc outside the store.
    pub fn from_shapes<'a, I>(shapes: I, arcs: &ArcStore) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Shape>,
    {
        let mut present = vec![false; arcs.len()];
        let mut count = 0;
        for shape in shapes {
            for r in shape.iter().flatten() {
                arcs.check_ref(*r)?;
                let slot = &mut present[r.id() as usize];
                if !*slot {
                    *slot = true;
                    count += 1;
                }
            }
        }
        Ok(Self { present, count })
    }

    /// Marks every arc in the store.
    pub fn all(arcs: &ArcStore) -> Self {
        Self {
            present: vec![true; arcs.len()],
            count: arcs.len(),
        }
    }

    pub fn contains(&self, id: u32) -> bool {
        self.present.get(id as usize).copied().unwrap_or(false)
    }

    /// Number of arcs marked present.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Iterates present arc ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.present
            .iter()
            .enumerate()
            .filter(|(_, p)| **p)
            .map(|(i, _)| i as u32)
    }
}
