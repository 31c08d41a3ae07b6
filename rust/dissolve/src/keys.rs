// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Key types for arena-based storage, and the layer geometry discriminant.
//!
//! Nodes and tiles are created by `slotmap::SlotMap` and addressed by stable
//! generational keys. Both arenas are append-only for the lifetime of a
//! dissolve call, so slot order equals creation order, which keeps every
//! iteration over them deterministic.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Key for a node (coordinate where arc endpoints coincide).
    pub struct NodeKey;

    /// Key for a tile (minimal region of the mosaic).
    pub struct TileKey;
}

/// Geometry type carried by a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryType {
    Point = 0,
    Polyline = 1,
    Polygon = 2,
}

impl GeometryType {
    /// Returns the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryType::Point => "point",
            GeometryType::Polyline => "polyline",
            GeometryType::Polygon => "polygon",
        }
    }
}

impl std::fmt::Display for GeometryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn geometry_type_names() {
        assert_eq!(GeometryType::Point.as_str(), "point");
        assert_eq!(GeometryType::Polyline.as_str(), "polyline");
        assert_eq!(GeometryType::Polygon.to_string(), "polygon");
    }

    #[test]
    fn geometry_type_serde_is_lowercase() {
        let json = serde_json::to_string(&GeometryType::Polygon).unwrap();
        assert_eq!(json, "\"polygon\"");
        let back: GeometryType = serde_json::from_str("\"polyline\"").unwrap();
        assert_eq!(back, GeometryType::Polyline);
    }

    #[test]
    fn tile_keys_iterate_in_insertion_order() {
        let mut tiles: SlotMap<TileKey, usize> = SlotMap::with_key();
        let a = tiles.insert(10);
        let b = tiles.insert(20);
        let order: Vec<TileKey> = tiles.keys().collect();
        assert_eq!(order, vec![a, b]);
    }
}
