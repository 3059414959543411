//! Canvas configuration.
//!
//! Every section deserializes with `#[serde(default)]`, so a host can pass a
//! partial JSON object and get the stock values for everything it omits.

use crate::geometry::{Frame, SizeBounds};
use crate::sanitize::SanitizePolicy;
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};

// ─── Sections ─────────────────────────────────────────────────────────────

/// Where new and duplicated components land.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Position of a new component. Default: **(100, 100)**.
    pub position: Point,
    /// Size of a new component before auto-fit. Default: **300 × 200**.
    pub size: Size,
    /// Offset of a duplicate from its source. Default: **(20, 20)**.
    pub duplicate_offset: Vec2,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            position: Point::new(100.0, 100.0),
            size: Size::new(300.0, 200.0),
            duplicate_offset: Vec2::new(20.0, 20.0),
        }
    }
}

impl PlacementConfig {
    pub fn frame(&self) -> Frame {
        Frame::new(self.position, self.size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoFitConfig {
    /// Wait after (re)generation before measuring, in ms. Default: **100**.
    pub settle_delay_ms: f64,
    /// Smallest per-axis change that triggers a resize, in px. Default: **5**.
    pub threshold: f64,
}

impl Default for AutoFitConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 100.0,
            threshold: 5.0,
        }
    }
}

/// Zoom is expressed in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub initial: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub initial_pan: Vec2,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            initial: 80.0,
            min: 10.0,
            max: 200.0,
            step: 10.0,
            initial_pan: Vec2::new(-100.0, 0.0),
        }
    }
}

impl ZoomConfig {
    pub fn clamp(&self, percent: f64) -> f64 {
        percent.max(self.min).min(self.max)
    }
}

// ─── Root ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub bounds: SizeBounds,
    pub placement: PlacementConfig,
    pub auto_fit: AutoFitConfig,
    pub zoom: ZoomConfig,
    /// Resize handle hit box in screen px. Default: **8**.
    pub handle_size: f64,
    pub sanitize: SanitizePolicy,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            bounds: SizeBounds::default(),
            placement: PlacementConfig::default(),
            auto_fit: AutoFitConfig::default(),
            zoom: ZoomConfig::default(),
            handle_size: 8.0,
            sanitize: SanitizePolicy::default(),
        }
    }
}
