// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared coverage fixtures for integration tests.

#![allow(dead_code)]

use dissolve_lite::{
    ArcStore, AttributeTable, CoverageBuilder, Layer, Shape, ShapePredicate, Value,
};
use rustc_hash::FxHashSet;

/// Axis-aligned square ring starting at its lower-left corner.
pub fn square(x: f64, y: f64, size: f64) -> Vec<[f64; 2]> {
    vec![
        [x, y],
        [x, y + size],
        [x + size, y + size],
        [x + size, y],
        [x, y],
    ]
}

/// Builds a coverage of single-ring squares with a `state` attribute.
pub fn squares(cells: &[(f64, f64, &str)]) -> (ArcStore, Layer) {
    let mut b = CoverageBuilder::new(1e-9);
    for &(x, y, _) in cells {
        b.add_polygon(&[square(x, y, 1.0)]).unwrap();
    }
    let (arcs, layer) = b.build().unwrap();
    let rows = cells
        .iter()
        .map(|&(_, _, state)| vec![("state", Value::from(state))])
        .collect();
    (arcs, layer.with_data(AttributeTable::from_rows(rows)))
}

/// Two unit squares side by side with a 0.2 x 0.2 gap straddling x = 1.
///
/// Each polygon contributes half of the gap boundary, so the gap borders
/// both along 0.4 units. Each polygon has area 0.98, the gap 0.04.
pub fn notched_pair(left: &str, right: &str) -> (ArcStore, Layer) {
    let mut b = CoverageBuilder::new(1e-9);
    b.add_polygon(&[vec![
        [0.0, 0.0],
        [0.0, 1.0],
        [1.0, 1.0],
        [1.0, 0.6],
        [0.9, 0.6],
        [0.9, 0.4],
        [1.0, 0.4],
        [1.0, 0.0],
    ]])
    .unwrap();
    b.add_polygon(&[vec![
        [1.0, 1.0],
        [2.0, 1.0],
        [2.0, 0.0],
        [1.0, 0.0],
        [1.0, 0.4],
        [1.1, 0.4],
        [1.1, 0.6],
        [1.0, 0.6],
    ]])
    .unwrap();
    let (arcs, layer) = b.build().unwrap();
    let data = AttributeTable::from_rows(vec![
        vec![("state", Value::from(left))],
        vec![("state", Value::from(right))],
    ]);
    (arcs, layer.with_data(data))
}

/// Test stand-in for an expression language: supports `field == 'value'`.
pub fn equality_compiler(
    expression: &str,
    layer: &Layer,
) -> Result<Box<dyn ShapePredicate>, String> {
    let (field, value) = expression
        .split_once("==")
        .ok_or_else(|| format!("unsupported expression: {expression}"))?;
    let field = field.trim().to_string();
    let value = Value::from(value.trim().trim_matches('\''));
    let table = layer.data.clone().ok_or("layer has no attributes")?;
    if !table.has_field(&field) {
        return Err(format!("unknown field: {field}"));
    }
    Ok(Box::new(move |shape: usize| table.get(shape, &field) == &value))
}

/// Signed ring areas of a shape, sorted ascending.
pub fn ring_areas(arcs: &ArcStore, shape: &Shape) -> Vec<f64> {
    let mut areas: Vec<f64> = shape.iter().map(|ring| arcs.ring_area(ring)).collect();
    areas.sort_by(f64::total_cmp);
    areas
}

/// Arc ids used by a shape.
pub fn arc_ids(shape: &Shape) -> FxHashSet<u32> {
    shape.iter().flatten().map(|r| r.id()).collect()
}
