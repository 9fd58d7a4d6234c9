use crate::hand_gestures::classifier::{format_gestures, GestureSet};
use crate::hand_gestures::mapper::UsableRegion;
use crate::hand_gestures::presence::PresencePhase;
use std::time::Duration;

/// Per-frame status for an optional overlay. Purely observational.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStatus {
    pub frame: u64,
    pub fps: u32,
    pub hand_detected: bool,
    pub phase: PresencePhase,
    /// The cursor has been positioned at least once.
    pub cursor_active: bool,
    pub cursor_position: Option<(i32, i32)>,
    pub gestures: GestureSet,
    pub close_remaining: Option<Duration>,
    pub dispatch_failures: u64,
}

impl FrameStatus {
    pub fn authorized(&self) -> bool {
        self.phase.is_confirmed()
    }

    pub fn dwell_remaining(&self) -> Option<Duration> {
        match self.phase {
            PresencePhase::Checking { remaining } => Some(remaining),
            _ => None,
        }
    }
}

/// Static overlay geometry: the usable region in camera pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayGeometry {
    pub capture_width: u32,
    pub capture_height: u32,
    pub usable_left: u32,
    pub usable_top: u32,
    pub usable_right: u32,
    pub usable_bottom: u32,
}

impl OverlayGeometry {
    pub fn new(region: UsableRegion, capture_width: u32, capture_height: u32) -> Self {
        let m = region.margin();
        let w = capture_width as f64;
        let h = capture_height as f64;
        Self {
            capture_width,
            capture_height,
            usable_left: (m * w) as u32,
            usable_top: (m * h) as u32,
            usable_right: (w * (1.0 - m)) as u32,
            usable_bottom: (h * (1.0 - m)) as u32,
        }
    }
}

pub trait DiagnosticsSink {
    fn configure(&mut self, _geometry: &OverlayGeometry) {}
    fn publish(&mut self, status: &FrameStatus);
}

/// Drops every status.
#[derive(Debug, Default)]
pub struct NullDiagnostics;

impl DiagnosticsSink for NullDiagnostics {
    fn publish(&mut self, _status: &FrameStatus) {}
}

/// Logs a status line every `every` frames at debug level.
#[derive(Debug)]
pub struct TracingDiagnostics {
    every: u64,
}

impl TracingDiagnostics {
    pub fn new(every: u64) -> Self {
        Self { every }
    }
}

impl DiagnosticsSink for TracingDiagnostics {
    fn configure(&mut self, geometry: &OverlayGeometry) {
        tracing::info!(
            width = geometry.capture_width,
            height = geometry.capture_height,
            left = geometry.usable_left,
            top = geometry.usable_top,
            right = geometry.usable_right,
            bottom = geometry.usable_bottom,
            "usable camera region"
        );
    }

    fn publish(&mut self, status: &FrameStatus) {
        if self.every == 0 || status.frame % self.every != 0 {
            return;
        }
        tracing::debug!(status = %format_status_lines(status).join(" | "), "frame status");
    }
}

/// The overlay text, one line per item.
pub fn format_status_lines(status: &FrameStatus) -> Vec<String> {
    let check = match status.dwell_remaining() {
        Some(remaining) => format!("Check: {:.1}s", remaining.as_secs_f64()),
        None => "Check: N/A".to_string(),
    };
    let countdown = match status.close_remaining {
        Some(remaining) => format!("Countdown: {:.1}s", remaining.as_secs_f64()),
        None => "Countdown: N/A".to_string(),
    };
    vec![
        format!("FPS: {}", status.fps),
        format!("Hand: {}", if status.hand_detected { "YES" } else { "NO" }),
        format!(
            "Mouse: {}",
            if status.cursor_active { "Active" } else { "Waiting" }
        ),
        format!(
            "Control: {}",
            if status.authorized() { "ON" } else { "OFF" }
        ),
        format!("Frame: {}", status.frame),
        countdown,
        check,
        format!("Gestures: {}", format_gestures(status.gestures)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand_gestures::classifier::Gesture;

    fn status() -> FrameStatus {
        FrameStatus {
            frame: 42,
            fps: 30,
            hand_detected: true,
            phase: PresencePhase::Checking {
                remaining: Duration::from_millis(1500),
            },
            cursor_active: false,
            cursor_position: None,
            gestures: Gesture::MoveEnable.into(),
            close_remaining: None,
            dispatch_failures: 0,
        }
    }

    #[test]
    fn status_lines_show_dwell_countdown() {
        let lines = format_status_lines(&status());
        assert_eq!(
            lines,
            vec![
                "FPS: 30",
                "Hand: YES",
                "Mouse: Waiting",
                "Control: OFF",
                "Frame: 42",
                "Countdown: N/A",
                "Check: 1.5s",
                "Gestures: move",
            ]
        );
    }

    #[test]
    fn confirmed_status_has_no_dwell() {
        let mut s = status();
        s.phase = PresencePhase::Confirmed;
        s.close_remaining = Some(Duration::from_millis(2000));
        assert!(s.authorized());
        assert!(s.dwell_remaining().is_none());
        let lines = format_status_lines(&s);
        assert!(lines.contains(&"Countdown: 2.0s".to_string()));
        assert!(lines.contains(&"Check: N/A".to_string()));
    }

    #[test]
    fn overlay_geometry_matches_margin() {
        let region = UsableRegion::new(0.25).unwrap();
        let g = OverlayGeometry::new(region, 640, 480);
        assert_eq!(
            (g.usable_left, g.usable_top, g.usable_right, g.usable_bottom),
            (160, 120, 480, 360)
        );
    }
}
