//! Bubble Sizing & Placement
//!
//! Maps a token list to bubble diameters and initial positions inside a
//! viewport. Sizes come from a min–max normalization of the selected metric
//! (log10 for market cap, linear for percent change), then every ranked
//! bubble is scaled uniformly so that the bubbles fill a fixed share of the
//! viewport area.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::token::{SizeMetric, Token};

/// Tunables for the sizing pass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Share of the viewport area the bubbles should cover
    pub area_fill: f64,
    /// Minimum diameter as a share of viewport width
    pub min_size_ratio: f64,
    /// Lower bound for the minimum diameter in px
    pub min_size_floor: f64,
    /// Maximum diameter as a share of viewport width
    pub max_size_ratio: f64,
    /// Lower bound for the maximum diameter in px
    pub max_size_floor: f64,
    /// Inset from the viewport edges for initial placement
    pub padding: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            area_fill: 0.9,
            min_size_ratio: 0.08,
            min_size_floor: 28.0,
            max_size_ratio: 0.42,
            max_size_floor: 56.0,
            padding: 10.0,
        }
    }
}

/// Size limits derived once from the viewport; resizes are not tracked
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutBounds {
    pub width: f64,
    pub height: f64,
    pub min_size: f64,
    pub max_size: f64,
    /// Target total bubble area
    pub used_area: f64,
    pub padding: f64,
}

impl LayoutBounds {
    pub fn for_viewport(width: f64, height: f64, config: &SizingConfig) -> Self {
        let min_size = (width * config.min_size_ratio).max(config.min_size_floor);
        let max_size = (width * config.max_size_ratio).max(config.max_size_floor).max(min_size);
        Self {
            width,
            height,
            min_size,
            max_size,
            used_area: width * height * config.area_fill,
            padding: config.padding,
        }
    }

    fn clamp(&self, size: f64) -> f64 {
        size.clamp(self.min_size, self.max_size)
    }
}

/// Diameter assigned to one token
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BubbleSize {
    /// Index into the token slice the sizes were computed from
    pub index: usize,
    pub base_size: f64,
    pub size: f64,
    /// Held at the floor: metric missing or no spread to normalize over
    pub pinned: bool,
}

/// Result of the sizing pass
#[derive(Debug, Clone, Serialize)]
pub struct SizingPlan {
    pub bounds: LayoutBounds,
    pub metric: SizeMetric,
    pub scale_factor: f64,
    pub sizes: Vec<BubbleSize>,
}

impl SizingPlan {
    /// Total area of the final (clamped) bubbles
    pub fn total_area(&self) -> f64 {
        self.sizes.iter().map(|s| circle_area(s.size)).sum()
    }
}

fn circle_area(diameter: f64) -> f64 {
    let r = diameter / 2.0;
    PI * r * r
}

/// Compute bubble diameters for `tokens` under `metric`.
///
/// Tokens without the metric, and every token when all values are equal,
/// stay at `min_size`. They are left out of the area scaling and their area
/// is taken off the budget before the scale factor is derived.
pub fn compute_sizes(tokens: &[Token], metric: SizeMetric, bounds: LayoutBounds) -> SizingPlan {
    let magnitudes: Vec<Option<f64>> = tokens
        .iter()
        .map(|t| t.magnitude(metric))
        .map(|m| if metric.is_logarithmic() { m.map(f64::log10) } else { m })
        .collect();

    let (lo, hi) = magnitudes
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let spread = hi - lo;
    let has_spread = spread.is_finite() && spread > 0.0;

    let mut sizes: Vec<BubbleSize> = magnitudes
        .iter()
        .enumerate()
        .map(|(index, m)| match m {
            Some(v) if has_spread => {
                let t = (v - lo) / spread;
                BubbleSize {
                    index,
                    base_size: bounds.min_size + t * (bounds.max_size - bounds.min_size),
                    size: 0.0,
                    pinned: false,
                }
            }
            _ => BubbleSize { index, base_size: bounds.min_size, size: bounds.min_size, pinned: true },
        })
        .collect();

    let pinned_area: f64 = sizes.iter().filter(|s| s.pinned).map(|s| circle_area(s.size)).sum();
    let ranked_area: f64 = sizes.iter().filter(|s| !s.pinned).map(|s| circle_area(s.base_size)).sum();
    let budget = (bounds.used_area - pinned_area).max(0.0);

    let scale_factor = if ranked_area == 0.0 { 1.0 } else { (budget / ranked_area).sqrt() };

    for s in sizes.iter_mut().filter(|s| !s.pinned) {
        s.size = bounds.clamp(s.base_size * scale_factor);
    }

    tracing::debug!(
        "Sized {} bubbles by {} (scale {:.3}, {} pinned)",
        sizes.len(),
        metric,
        scale_factor,
        sizes.iter().filter(|s| s.pinned).count()
    );

    SizingPlan { bounds, metric, scale_factor, sizes }
}

/// Initial placement of one bubble (center coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub index: usize,
    pub size: f64,
    pub x: f64,
    pub y: f64,
}

/// Scatter bubbles uniformly inside the padded viewport.
///
/// Bubbles wider than the padded area start partially outside it; the
/// physics walls push them back in.
pub fn place_bubbles<R: Rng + ?Sized>(plan: &SizingPlan, rng: &mut R) -> Vec<Placement> {
    let b = &plan.bounds;
    let (min_x, max_x) = (b.padding, b.width - b.padding);
    let (min_y, max_y) = (b.padding, b.height - b.padding);

    plan.sizes
        .iter()
        .map(|s| Placement {
            index: s.index,
            size: s.size,
            x: rng.gen::<f64>() * (max_x - min_x - s.size) + min_x + s.size / 2.0,
            y: rng.gen::<f64>() * (max_y - min_y - s.size) + min_y + s.size / 2.0,
        })
        .collect()
}
