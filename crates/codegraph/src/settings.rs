use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Common slider metadata so bounds live in one place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl SliderRange {
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

pub const SPACING_RANGE: SliderRange = SliderRange::new(0.0, 200.0, 5.0);
pub const RANK_SEPARATION_RANGE: SliderRange =
    SliderRange::new(40.0, 400.0, 5.0);
pub const NODE_SEPARATION_RANGE: SliderRange =
    SliderRange::new(10.0, 200.0, 2.0);

/// Window in which consecutive clicks on a node form one gesture.
pub const GESTURE_WINDOW: Duration = Duration::from_millis(350);
/// Interval of the optional periodic rescan.
pub const AUTO_UPDATE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Horizontal gap between ranks.
    pub rank_separation: f32,
    /// Vertical gap between nodes of one rank.
    pub node_separation: f32,
    pub margin: f32,
    /// Down/up sweep pairs tried when reducing crossings.
    pub ordering_passes: usize,
    /// Fraction of the viewport left free around fitted content.
    pub fit_padding: f32,
    /// Zoom used when centering on a search match.
    pub focus_zoom: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            rank_separation: 100.0,
            node_separation: 40.0,
            margin: 20.0,
            ordering_passes: 4,
            fit_padding: 0.2,
            focus_zoom: 1.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderSettings {
    /// Gap added to the 50px base pitch between stacked nodes.
    pub spacing: f32,
}

impl BuilderSettings {
    pub fn new(spacing: f32) -> Self {
        Self {
            spacing: SPACING_RANGE.clamp(spacing),
        }
    }

    pub fn vertical_pitch(&self) -> f32 {
        self.spacing + 50.0
    }
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self { spacing: 50.0 }
    }
}
