// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for dissolve operations.

use crate::arcs::ArcRef;

/// Result type alias for dissolve operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building topology or dissolving a layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A ring trace reached a node with no usable continuation.
    #[error("broken ring: no continuation after arc {arc} at node ({x}, {y})")]
    BrokenRing { arc: ArcRef, x: f64, y: f64 },

    /// A shape references an arc id outside the arc store.
    #[error("arc {id} is out of range (arc count {count})")]
    InvalidArcRef { id: u32, count: usize },

    /// A ring references an arc that is not part of the node graph.
    #[error("arc {0} is not part of the node graph")]
    ArcNotInGraph(ArcRef),

    /// An arc has fewer than two vertices.
    #[error("arc {0} has fewer than 2 vertices")]
    DegenerateArc(u32),

    /// The layer does not hold the geometry type an operation requires.
    #[error("expected {expected} layer, found {found}")]
    InvalidGeometryType {
        expected: &'static str,
        found: &'static str,
    },

    /// A dissolve field is missing from the attribute table.
    #[error("missing data field: {0}")]
    MissingField(String),

    /// A `merge_gaps_where` expression could not be compiled.
    #[error("invalid expression {expression:?}: {reason}")]
    Expression { expression: String, reason: String },

    /// An option holds a value outside its valid range.
    #[error("invalid option {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    /// The configuration cannot be satisfied by the supplied collaborators.
    #[error("configuration error: {0}")]
    Config(String),

    /// A ring passed to the builder has too few distinct vertices.
    #[error("ring {ring} of polygon {polygon} has fewer than 3 distinct vertices")]
    DegenerateRing { polygon: usize, ring: usize },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
