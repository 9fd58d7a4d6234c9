//! Anchor landmark to display coordinates, with exponential smoothing.

use crate::display::MonitorRect;
use crate::error::HandCursorError;
use crate::hand_gestures::landmarks::{HandLandmark, LandmarkFrame};

/// Landmark that drives the cursor. The middle finger base barely moves when
/// the fingers change shape, unlike a fingertip.
pub const ANCHOR_LANDMARK: HandLandmark = HandLandmark::MiddleMcp;

/// Interior of the camera image that is stretched over the whole display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsableRegion {
    margin: f64,
}

impl UsableRegion {
    pub fn new(margin: f64) -> Result<Self, HandCursorError> {
        if !(margin >= 0.0 && margin < 0.5) {
            return Err(HandCursorError::InvalidConfig(format!(
                "border margin must be in [0, 0.5), got {margin}"
            )));
        }
        Ok(Self { margin })
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    pub fn clamp(&self, point: (f64, f64)) -> (f64, f64) {
        let hi = 1.0 - self.margin;
        (point.0.clamp(self.margin, hi), point.1.clamp(self.margin, hi))
    }

    /// Clamp into the region, then rescale the region to `[0, 1]`.
    pub fn normalize(&self, point: (f64, f64)) -> (f64, f64) {
        let (x, y) = self.clamp(point);
        let span = 1.0 - 2.0 * self.margin;
        ((x - self.margin) / span, (y - self.margin) / span)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PositionMapper {
    region: UsableRegion,
    monitor: MonitorRect,
}

impl PositionMapper {
    pub fn new(region: UsableRegion, monitor: MonitorRect) -> Self {
        Self { region, monitor }
    }

    pub fn monitor(&self) -> MonitorRect {
        self.monitor
    }

    pub fn region(&self) -> UsableRegion {
        self.region
    }

    /// Map a normalized camera point to a pixel on the monitor. The far edge
    /// of the usable region lands on the last pixel row/column.
    pub fn map(&self, point: (f64, f64)) -> (i32, i32) {
        let (nx, ny) = self.region.normalize(point);
        (
            scale_axis(nx, self.monitor.x, self.monitor.width),
            scale_axis(ny, self.monitor.y, self.monitor.height),
        )
    }

    pub fn map_anchor(&self, frame: &LandmarkFrame) -> (i32, i32) {
        let anchor = frame.get(ANCHOR_LANDMARK);
        self.map((anchor.x, anchor.y))
    }
}

fn scale_axis(norm: f64, origin: i32, size: i32) -> i32 {
    let offset = (norm * size as f64).floor() as i32;
    origin + offset.clamp(0, (size - 1).max(0))
}

#[derive(Debug, Clone, Copy)]
pub struct CursorSmoother {
    factor: f64,
}

impl CursorSmoother {
    pub fn new(factor: f64) -> Result<Self, HandCursorError> {
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(HandCursorError::InvalidConfig(format!(
                "smoothing must be in (0, 1], got {factor}"
            )));
        }
        Ok(Self { factor })
    }

    /// Move `prev` a fraction of the way to `target`. Without a previous
    /// position the target is taken as is.
    pub fn step(&self, prev: Option<(i32, i32)>, target: (i32, i32)) -> (i32, i32) {
        match prev {
            None => target,
            Some(prev) => (
                self.step_axis(prev.0, target.0),
                self.step_axis(prev.1, target.1),
            ),
        }
    }

    // Rounded away from zero so small gaps still close, capped at the gap so
    // the result never passes the target.
    fn step_axis(&self, prev: i32, target: i32) -> i32 {
        let gap = target as i64 - prev as i64;
        if gap == 0 {
            return prev;
        }
        let step = (gap as f64 * self.factor).abs().ceil() as i64;
        let step = step.min(gap.abs()) * gap.signum();
        (prev as i64 + step) as i32
    }
}
