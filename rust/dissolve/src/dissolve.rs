// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon dissolve.
//!
//! [`dissolve_polygon_layer`] runs the whole pipeline for one layer:
//!
//! 1. group shapes by the dissolve fields
//! 2. build the node graph and mosaic over the layer's arcs
//! 3. close sliver gaps
//! 4. dissolve each group's tiles into rings (in parallel)
//! 5. split rings that touch themselves into outer rings and holes
//!
//! Gap closure is the only step that mutates the mosaic. It finishes before
//! the mosaic is shared with the parallel per-group readers.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::adjacency::{AdjacencyFilter, ExpressionCompiler};
use crate::arcs::{reverse_ring, reversed_ring, ArcPresence, ArcStore, Ring, Shape};
use crate::classify::Classifier;
use crate::compose::{compose_mosaic_layer, LayerComposer};
use crate::error::Result;
use crate::layer::Layer;
use crate::mosaic::{GapStats, MosaicIndex, MosaicOptions};
use crate::nodes::NodeGraph;
use crate::options::DissolveOptions;
use crate::pathfinder::{PathfindMode, Pathfinder};
use crate::sliver::SliverFilter;

/// Summary of one dissolve call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DissolveReport {
    /// Number of dissolve groups (output shapes).
    pub groups: usize,
    /// Number of mosaic tiles.
    pub tiles: usize,
    pub gaps: GapStats,
    pub sliver_label: String,
    pub adjacency_label: String,
    /// Gap-closure message; `None` when no gap was closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Dissolved shapes, one per group in group order.
#[derive(Debug, Clone)]
pub struct DissolvedGroups {
    pub shapes: Vec<Option<Shape>>,
    pub report: DissolveReport,
}

/// Output layer of [`dissolve_polygon_layer`].
#[derive(Debug, Clone)]
pub struct DissolveOutput {
    pub layer: Layer,
    pub report: DissolveReport,
}

/// Dissolves a polygon layer and hands the result to `composer`.
///
/// `compiler` is required only when `merge_gaps_where` is set.
pub fn dissolve_polygon_layer(
    layer: &Layer,
    arcs: &ArcStore,
    opts: &DissolveOptions,
    compiler: Option<&dyn ExpressionCompiler>,
    composer: &dyn LayerComposer,
) -> Result<DissolveOutput> {
    layer.require_polygons()?;
    opts.validate()?;
    let classifier = Classifier::new(&opts.dissolve_fields(), layer)?;
    let dissolved = dissolve_polygon_groups(layer, arcs, &classifier, opts, compiler)?;
    let output = composer.compose(layer, dissolved.shapes, &classifier, opts)?;
    Ok(DissolveOutput {
        layer: output,
        report: dissolved.report,
    })
}

/// Dissolves the groups defined by `classifier`.
///
/// Configuration errors (bad options, expression compile failures) are
/// raised before any tile is built.
pub fn dissolve_polygon_groups(
    layer: &Layer,
    arcs: &ArcStore,
    classifier: &Classifier,
    opts: &DissolveOptions,
    compiler: Option<&dyn ExpressionCompiler>,
) -> Result<DissolvedGroups> {
    layer.require_polygons()?;
    opts.validate()?;
    let sliver = SliverFilter::from_options(layer, arcs, opts);
    let adjacency = AdjacencyFilter::from_options(layer, opts, compiler)?;

    let presence = ArcPresence::from_shapes(layer.non_null_shapes().map(|(_, s)| s), arcs)?;
    let nodes = NodeGraph::new(arcs, presence);
    let groups = classifier.groups();
    let mosaic_opts = MosaicOptions {
        flat: true,
        simple: groups.len() == 1,
    };

    let mut mosaic = MosaicIndex::new(&nodes, &layer.shapes, mosaic_opts)?;
    let gaps = mosaic.remove_gaps(&sliver, &adjacency);
    let mosaic = &mosaic;
    let pathfinder = Pathfinder::new(&nodes);

    let dissolved = groups
        .par_iter()
        .map(|ids| dissolve_group(mosaic, &pathfinder, ids, opts.tiles))
        .collect::<Result<Vec<_>>>()?;

    let shapes = dissolved
        .into_par_iter()
        .map(|shape| match shape {
            Some(rings) => repair_tangents(&pathfinder, rings).map(Some),
            None => Ok(None),
        })
        .collect::<Result<Vec<_>>>()?;

    let sliver_label = sliver.label();
    let adjacency_label = adjacency.label();
    let message = gap_message(gaps, &sliver_label, &adjacency_label);
    if let Some(msg) = &message {
        tracing::info!("{msg}");
    }
    tracing::debug!(
        groups = groups.len(),
        tiles = mosaic.tile_count(),
        "Dissolved polygon layer"
    );

    Ok(DissolvedGroups {
        report: DissolveReport {
            groups: groups.len(),
            tiles: mosaic.tile_count(),
            gaps,
            sliver_label,
            adjacency_label,
            message,
        },
        shapes,
    })
}

/// Builds a polygon layer holding one shape per mosaic tile.
///
/// Overlapping shapes are not flattened, so every tile appears once
/// regardless of how many shapes claim it. Gaps are included.
pub fn mosaic_polygon_layer(layer: &Layer, arcs: &ArcStore) -> Result<Layer> {
    layer.require_polygons()?;
    let presence = ArcPresence::from_shapes(layer.non_null_shapes().map(|(_, s)| s), arcs)?;
    let nodes = NodeGraph::new(arcs, presence);
    let mosaic = MosaicIndex::new(&nodes, &layer.shapes, MosaicOptions::default())?;
    let shapes = mosaic.tiles().map(|(_, tile)| Some(tile.rings())).collect();
    Ok(compose_mosaic_layer(layer, shapes))
}

fn dissolve_group(
    mosaic: &MosaicIndex,
    pathfinder: &Pathfinder,
    ids: &[usize],
    raw_tiles: bool,
) -> Result<Option<Shape>> {
    let tiles = mosaic.tiles_by_shape_ids(ids);
    if raw_tiles {
        let rings: Vec<Ring> = tiles.into_iter().flatten().collect();
        return Ok((!rings.is_empty()).then_some(rings));
    }

    let mut rings = Vec::with_capacity(tiles.len());
    let mut holes = Vec::new();
    for tile in tiles {
        let mut it = tile.into_iter();
        if let Some(outer) = it.next() {
            rings.push(outer);
        }
        holes.extend(it);
    }
    rings.append(&mut holes);

    let dissolved = pathfinder.pathfind(&rings, PathfindMode::Dissolve)?;
    Ok((!dissolved.is_empty()).then_some(dissolved))
}

/// Splits self-tangent rings of a shape into simple rings.
fn repair_tangents(pathfinder: &Pathfinder, rings: Vec<Ring>) -> Result<Shape> {
    let parts = rings
        .into_par_iter()
        .map(|ring| repair_ring(pathfinder, ring))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.into_iter().flatten().collect())
}

fn repair_ring(pathfinder: &Pathfinder, ring: Ring) -> Result<Vec<Ring>> {
    let mut parts = pathfinder.pathfind(&[reversed_ring(&ring)], PathfindMode::Flatten)?;
    if parts.len() > 1 {
        for part in &mut parts {
            reverse_ring(part);
        }
        Ok(parts)
    } else {
        Ok(vec![ring])
    }
}

fn gap_message(stats: GapStats, sliver_label: &str, adjacency_label: &str) -> Option<String> {
    if stats.removed == 0 {
        return None;
    }
    let plural = if stats.removed == 1 { "" } else { "s" };
    let msg = format!(
        "Closed {} / {} gap{plural} using {sliver_label}. {adjacency_label}",
        format_count(stats.removed),
        format_count(stats.total()),
    );
    Some(msg.trim_end().to_string())
}

/// Formats a count with comma thousands separators.
fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
