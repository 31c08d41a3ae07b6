// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Output layer composition and JSON interchange.
//!
//! Dissolve produces bare shapes; a [`LayerComposer`] turns them into a layer
//! with attributes. [`KeyFieldComposer`] writes the dissolve-field values of
//! each group. Attribute aggregation beyond that belongs to the caller.
//!
//! [`DatasetSnapshot`] is a portable JSON form of an arc store plus layers.

use serde::{Deserialize, Serialize};

use crate::arcs::{ArcRef, ArcStore, Shape};
use crate::classify::{Classifier, KeyValue};
use crate::error::{Error, Result};
use crate::keys::GeometryType;
use crate::layer::Layer;
use crate::options::DissolveOptions;
use crate::table::{AttributeTable, Record, Value};

/// Builds the output layer of a dissolve from one shape per group.
pub trait LayerComposer: Sync {
    fn compose(
        &self,
        input: &Layer,
        shapes: Vec<Option<Shape>>,
        classifier: &Classifier,
        opts: &DissolveOptions,
    ) -> Result<Layer>;
}

/// Composer writing one record per group with the dissolve fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyFieldComposer;

impl LayerComposer for KeyFieldComposer {
    fn compose(
        &self,
        input: &Layer,
        shapes: Vec<Option<Shape>>,
        classifier: &Classifier,
        _opts: &DissolveOptions,
    ) -> Result<Layer> {
        if shapes.len() != classifier.group_count() {
            return Err(Error::Config(format!(
                "{} dissolved shapes for {} groups",
                shapes.len(),
                classifier.group_count()
            )));
        }

        let fields = classifier.fields().to_vec();
        let data = if fields.is_empty() && input.data.is_none() {
            None
        } else {
            let records = classifier
                .keys()
                .iter()
                .map(|key| {
                    fields
                        .iter()
                        .cloned()
                        .zip(key.values().iter().map(KeyValue::to_value))
                        .collect::<Record>()
                })
                .collect();
            Some(AttributeTable::with_fields(fields, records))
        };

        Ok(Layer {
            name: input.name.clone(),
            geometry_type: GeometryType::Polygon,
            shapes,
            data,
        })
    }
}

/// Layer of mosaic tiles, each record holding its `tile_id`.
pub fn compose_mosaic_layer(input: &Layer, tiles: Vec<Option<Shape>>) -> Layer {
    let records = (0..tiles.len())
        .map(|i| single_record("tile_id", i))
        .collect();
    Layer {
        name: input.name.clone(),
        geometry_type: GeometryType::Polygon,
        shapes: tiles,
        data: Some(AttributeTable::with_fields(
            vec!["tile_id".to_string()],
            records,
        )),
    }
}

/// Polyline layer with one shape per arc, each record holding its `arc_id`.
pub fn arc_layer(arcs: &ArcStore, name: impl Into<String>) -> Layer {
    let n = arcs.len();
    let shapes = (0..n)
        .map(|i| Some(vec![vec![ArcRef::forward(i as u32)]]))
        .collect();
    let records = (0..n).map(|i| single_record("arc_id", i)).collect();
    Layer {
        name: Some(name.into()),
        geometry_type: GeometryType::Polyline,
        shapes,
        data: Some(AttributeTable::with_fields(
            vec!["arc_id".to_string()],
            records,
        )),
    }
}

fn single_record(field: &str, id: usize) -> Record {
    let mut rec = Record::default();
    rec.insert(field.to_string(), Value::Int(id as i64));
    rec
}

// =============================================================================
// JSON interchange
// =============================================================================

/// Serializable arc store plus the layers referencing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    /// Arc vertices as `[x, y]` pairs.
    pub arcs: Vec<Vec<[f64; 2]>>,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

impl DatasetSnapshot {
    pub fn new(arcs: &ArcStore, layers: Vec<Layer>) -> Self {
        let arcs = (0..arcs.len() as u32)
            .map(|id| arcs.arc_points(id).iter().map(|p| [p.x, p.y]).collect())
            .collect();
        Self { arcs, layers }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Parses a snapshot and checks every arc reference of every layer.
    pub fn from_json(json: &str) -> Result<Self> {
        let snap: Self = serde_json::from_str(json)?;
        let count = snap.arcs.len();
        for r in snap
            .layers
            .iter()
            .flat_map(|l| l.shapes.iter().flatten().flatten().flatten())
        {
            if r.id() as usize >= count {
                return Err(Error::InvalidArcRef { id: r.id(), count });
            }
        }
        Ok(snap)
    }

    /// Rebuilds the arc store.
    pub fn arc_store(&self) -> Result<ArcStore> {
        ArcStore::from_coords(self.arcs.clone())
    }
}
