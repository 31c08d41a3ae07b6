// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sliver detection for gap closure.
//!
//! A gap is only closed when it is small enough to be an artifact of the
//! coverage rather than a real hole. "Small" is measured by an effective
//! area: with `sliver_control > 0` the tile's area is scaled by its
//! Polsby-Popper compactness raised to `sliver_control`, so long thin gaps
//! count as much smaller than compact gaps of the same area.

use crate::arcs::ArcStore;
use crate::geometry::polsby_popper;
use crate::layer::Layer;
use crate::mosaic::Tile;
use crate::options::DissolveOptions;

/// Divisor applied to the average ring perimeter to obtain the side of the
/// default threshold square.
const PERIMETER_DIVISOR: f64 = 50.0;

/// Predicate deciding which gap tiles are eligible for closure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SliverFilter {
    /// No gap is closed.
    Disabled,
    /// Gaps with area below `threshold`.
    MinArea { threshold: f64 },
    /// Gaps with compactness-weighted area below `threshold`.
    Sliver { threshold: f64, strength: f64 },
}

impl SliverFilter {
    /// Resolves the filter from dissolve options.
    pub fn from_options(layer: &Layer, arcs: &ArcStore, opts: &DissolveOptions) -> Self {
        let threshold = match opts.min_gap_area {
            Some(area) if area <= 0.0 => return SliverFilter::Disabled,
            Some(area) => area,
            None => default_sliver_threshold(layer, arcs),
        };
        let strength = opts.sliver_control();
        if strength > 0.0 {
            SliverFilter::Sliver {
                threshold,
                strength,
            }
        } else {
            SliverFilter::MinArea { threshold }
        }
    }

    /// Area used in the threshold comparison.
    pub fn effective_area(&self, area: f64, perimeter: f64) -> f64 {
        match self {
            SliverFilter::Sliver { strength, .. } => {
                area.abs() * polsby_popper(area, perimeter).powf(*strength)
            }
            _ => area.abs(),
        }
    }

    /// Tests a tile given its net area and perimeter.
    pub fn is_sliver(&self, area: f64, perimeter: f64) -> bool {
        match self {
            SliverFilter::Disabled => false,
            SliverFilter::MinArea { threshold } | SliverFilter::Sliver { threshold, .. } => {
                self.effective_area(area, perimeter) < *threshold
            }
        }
    }

    pub fn is_sliver_tile(&self, tile: &Tile) -> bool {
        self.is_sliver(tile.area, tile.perimeter)
    }

    pub fn threshold(&self) -> Option<f64> {
        match self {
            SliverFilter::Disabled => None,
            SliverFilter::MinArea { threshold } | SliverFilter::Sliver { threshold, .. } => {
                Some(*threshold)
            }
        }
    }

    /// Human-readable description used in the gap-closure message.
    pub fn label(&self) -> String {
        match self {
            SliverFilter::Disabled => "no area threshold".to_string(),
            SliverFilter::MinArea { threshold } => {
                format!("an area threshold of {}", format_area(*threshold))
            }
            SliverFilter::Sliver { threshold, .. } => {
                format!("a sliver threshold of {}", format_area(*threshold))
            }
        }
    }
}

/// Default threshold: the area of a square whose side is the layer's average
/// ring perimeter divided by [`PERIMETER_DIVISOR`].
pub fn default_sliver_threshold(layer: &Layer, arcs: &ArcStore) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;
    for (_, shape) in layer.non_null_shapes() {
        for ring in shape {
            total += arcs.ring_perimeter(ring);
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    let side = total / count as f64 / PERIMETER_DIVISOR;
    side * side
}

/// Formats an area with four significant digits and no trailing zeros.
pub(crate) fn format_area(area: f64) -> String {
    if area == 0.0 || !area.is_finite() {
        return format!("{area}");
    }
    let magnitude = area.abs().log10().floor() as i32;
    let decimals = (3 - magnitude).clamp(0, 15) as usize;
    let s = format!("{area:.decimals$}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
