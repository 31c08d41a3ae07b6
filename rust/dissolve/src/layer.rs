// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Layers: ordered shapes plus an optional attribute table.

use serde::{Deserialize, Serialize};

use crate::arcs::Shape;
use crate::error::{Error, Result};
use crate::keys::GeometryType;
use crate::table::AttributeTable;

/// A layer of shapes referencing a shared [`ArcStore`](crate::ArcStore).
///
/// Shape `i` is described by attribute record `i`. A `None` shape has no
/// geometry but still takes part in grouping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub geometry_type: GeometryType,
    pub shapes: Vec<Option<Shape>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AttributeTable>,
}

impl Layer {
    /// Creates a polygon layer without attributes.
    pub fn polygons(shapes: Vec<Option<Shape>>) -> Self {
        Self {
            name: None,
            geometry_type: GeometryType::Polygon,
            shapes,
            data: None,
        }
    }

    /// Attaches an attribute table.
    pub fn with_data(mut self, data: AttributeTable) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Number of shapes (including null shapes).
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Iterates non-null shapes with their indices.
    pub fn non_null_shapes(&self) -> impl Iterator<Item = (usize, &Shape)> {
        self.shapes
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (i, s)))
    }

    /// Returns an error unless this is a polygon layer.
    pub fn require_polygons(&self) -> Result<()> {
        if self.geometry_type == GeometryType::Polygon {
            Ok(())
        } else {
            Err(Error::InvalidGeometryType {
                expected: GeometryType::Polygon.as_str(),
                found: self.geometry_type.as_str(),
            })
        }
    }
}
