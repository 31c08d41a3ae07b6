// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dissolve configuration.
//!
//! Options deserialize from JSON with every key optional:
//!
//! ```json
//! { "fields": ["state"], "sliver_control": 1, "merge_gaps_where": "pop > 0" }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default `sliver_control`: shape-weighted area test.
pub const DEFAULT_SLIVER_CONTROL: f64 = 1.0;

/// Options recognized by [`dissolve_polygon_layer`](crate::dissolve_polygon_layer).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DissolveOptions {
    /// Attribute fields defining dissolve groups. None or empty: one group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,

    /// Deprecated single-field form of `fields`; takes precedence when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Weight of the compactness term in the sliver test. `0` compares plain
    /// areas; larger values treat thin tiles as smaller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sliver_control: Option<f64>,

    /// Area below which gaps are closed. `0` disables gap closure. When unset
    /// a threshold is derived from the layer's average ring perimeter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_gap_area: Option<f64>,

    /// Expression selecting shapes that must not receive merged gaps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_gaps_where: Option<String>,

    /// Return raw mosaic tiles per group instead of dissolved rings.
    pub tiles: bool,
}

impl DissolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates options from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let opts: Self = serde_json::from_str(json)?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn with_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_sliver_control(mut self, value: f64) -> Self {
        self.sliver_control = Some(value);
        self
    }

    pub fn with_min_gap_area(mut self, value: f64) -> Self {
        self.min_gap_area = Some(value);
        self
    }

    pub fn with_merge_gaps_where(mut self, expression: impl Into<String>) -> Self {
        self.merge_gaps_where = Some(expression.into());
        self
    }

    pub fn with_tiles(mut self, tiles: bool) -> Self {
        self.tiles = tiles;
        self
    }

    /// The effective dissolve fields, honoring the deprecated `field` alias.
    pub fn dissolve_fields(&self) -> Vec<String> {
        match (&self.field, &self.fields) {
            (Some(f), _) => vec![f.clone()],
            (None, Some(fields)) => fields.clone(),
            (None, None) => Vec::new(),
        }
    }

    /// `sliver_control`, or its default.
    pub fn sliver_control(&self) -> f64 {
        self.sliver_control.unwrap_or(DEFAULT_SLIVER_CONTROL)
    }

    /// Checks option ranges.
    pub fn validate(&self) -> Result<()> {
        if let Some(v) = self.sliver_control {
            if !v.is_finite() || v < 0.0 {
                return Err(Error::InvalidOption {
                    name: "sliver_control",
                    reason: format!("expected a non-negative number, got {v}"),
                });
            }
        }
        if let Some(v) = self.min_gap_area {
            if !v.is_finite() || v < 0.0 {
                return Err(Error::InvalidOption {
                    name: "min_gap_area",
                    reason: format!("expected a non-negative number, got {v}"),
                });
            }
        }
        if let Some(expr) = &self.merge_gaps_where {
            if expr.trim().is_empty() {
                return Err(Error::InvalidOption {
                    name: "merge_gaps_where",
                    reason: "expression is empty".to_string(),
                });
            }
        }
        if self.dissolve_fields().iter().any(|f| f.is_empty()) {
            return Err(Error::InvalidOption {
                name: "fields",
                reason: "field names must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
