// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Dissolve-Lite
//!
//! Topology-preserving polygon dissolve over shared-arc coverages.
//!
//! Polygons are rings of directed references into a shared pool of arcs, so
//! neighbouring polygons walk their common boundary over the same arc in
//! opposite directions. Dissolving a group of polygons then becomes a matter
//! of topology rather than geometry:
//!
//! - the [`NodeGraph`] records which arcs meet at each endpoint, in angular
//!   order
//! - the [`MosaicIndex`] cuts the plane into minimal tiles, records which
//!   shapes own which tiles, and hands small unowned gaps to a neighbour
//! - the [`Pathfinder`] traces the boundary of the union of a group's tiles
//!   and splits rings that touch themselves
//!
//! [`dissolve_polygon_layer`] runs the whole pipeline. [`CoverageBuilder`]
//! turns plain coordinate rings into a coverage the pipeline can consume.
//!
//! Rings follow one winding convention throughout: clockwise outer rings
//! (positive area) and counter-clockwise holes.

pub mod adjacency;
pub mod arcs;
pub mod builders;
pub mod classify;
pub mod compose;
pub mod dissolve;
pub mod error;
pub mod geometry;
pub mod keys;
pub mod layer;
pub mod mosaic;
pub mod nodes;
pub mod options;
pub mod pathfinder;
pub mod sliver;
pub mod spatial;
pub mod table;

pub use adjacency::{AdjacencyFilter, ExpressionCompiler, ShapePredicate};
pub use arcs::{reverse_ring, reversed_ring, ArcPresence, ArcRef, ArcStore, Ring, Shape};
pub use builders::CoverageBuilder;
pub use classify::{Classifier, GroupKey, KeyValue};
pub use compose::{
    arc_layer, compose_mosaic_layer, DatasetSnapshot, KeyFieldComposer, LayerComposer,
};
pub use dissolve::{
    dissolve_polygon_groups, dissolve_polygon_layer, mosaic_polygon_layer, DissolveOutput,
    DissolveReport, DissolvedGroups,
};
pub use error::{Error, Result};
pub use geometry::{polsby_popper, Bounds};
pub use keys::{GeometryType, NodeKey, TileKey};
pub use layer::Layer;
pub use mosaic::{GapStats, MosaicIndex, MosaicOptions, Tile};
pub use nodes::NodeGraph;
pub use options::DissolveOptions;
pub use pathfinder::{PathfindMode, Pathfinder};
pub use sliver::SliverFilter;
pub use table::{AttributeTable, Record, Value};
