use crate::display::MonitorRect;
use crate::error::HandCursorError;
use crate::hand_gestures::PinchPrecedence;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Seconds a hand must stay in view before it may control the cursor.
    #[serde(default = "default_dwell_secs")]
    pub dwell_secs: f64,
    /// Seconds the thumb must be held below the wrist to quit.
    #[serde(default = "default_close_hold_secs")]
    pub close_hold_secs: f64,
    /// Fraction of the remaining distance covered per frame, in `(0, 1]`.
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
    /// Pinch distance in normalized landmark units.
    #[serde(default = "default_click_distance")]
    pub click_distance: f64,
    /// Border of the camera image ignored on each side, in `[0, 0.5)`.
    #[serde(default = "default_border_margin")]
    pub border_margin: f64,
    #[serde(default = "default_scroll_amount")]
    pub scroll_amount: i32,
    /// Index into the monitor list the cursor is confined to.
    #[serde(default)]
    pub monitor_index: usize,
    #[serde(default = "default_capture_width")]
    pub capture_width: u32,
    #[serde(default = "default_capture_height")]
    pub capture_height: u32,
    /// Mirror landmarks horizontally so the camera behaves like a mirror.
    #[serde(default = "default_mirror_input")]
    pub mirror_input: bool,
    #[serde(default)]
    pub pinch_precedence: PinchPrecedence,
    /// Newline-delimited JSON landmark stream. Reads stdin when `None`.
    #[serde(default)]
    pub landmark_stream: Option<String>,
    /// Monitor layout override. When empty the OS is queried.
    #[serde(default)]
    pub monitors: Vec<MonitorRect>,
    /// When enabled the application initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub log_file: Option<String>,
    /// Frames between status log lines. `0` disables them.
    #[serde(default = "default_status_log_every")]
    pub status_log_every: u64,
    /// Stop the loop when Escape is pressed.
    #[serde(default = "default_quit_on_escape")]
    pub quit_on_escape: bool,
}

fn default_dwell_secs() -> f64 {
    2.0
}

fn default_close_hold_secs() -> f64 {
    3.0
}

fn default_smoothing() -> f64 {
    0.5
}

fn default_click_distance() -> f64 {
    0.05
}

fn default_border_margin() -> f64 {
    0.15
}

fn default_scroll_amount() -> i32 {
    25
}

fn default_capture_width() -> u32 {
    640
}

fn default_capture_height() -> u32 {
    480
}

fn default_mirror_input() -> bool {
    true
}

fn default_status_log_every() -> u64 {
    60
}

fn default_quit_on_escape() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dwell_secs: default_dwell_secs(),
            close_hold_secs: default_close_hold_secs(),
            smoothing: default_smoothing(),
            click_distance: default_click_distance(),
            border_margin: default_border_margin(),
            scroll_amount: default_scroll_amount(),
            monitor_index: 0,
            capture_width: default_capture_width(),
            capture_height: default_capture_height(),
            mirror_input: default_mirror_input(),
            pinch_precedence: PinchPrecedence::default(),
            landmark_stream: None,
            monitors: Vec::new(),
            debug_logging: false,
            log_file: None,
            status_log_every: default_status_log_every(),
            quit_on_escape: default_quit_on_escape(),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject values the engine cannot run with. Called once at startup.
    pub fn validate(&self) -> Result<(), HandCursorError> {
        let invalid = |msg: String| Err(HandCursorError::InvalidConfig(msg));

        if let Err(err) = Duration::try_from_secs_f64(self.dwell_secs) {
            return invalid(format!(
                "dwell_secs {} is not a valid duration: {err}",
                self.dwell_secs
            ));
        }
        if let Err(err) = Duration::try_from_secs_f64(self.close_hold_secs) {
            return invalid(format!(
                "close_hold_secs {} is not a valid duration: {err}",
                self.close_hold_secs
            ));
        }
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return invalid(format!(
                "smoothing must be in (0, 1], got {}",
                self.smoothing
            ));
        }
        if !self.click_distance.is_finite() || self.click_distance <= 0.0 {
            return invalid(format!(
                "click_distance must be > 0, got {}",
                self.click_distance
            ));
        }
        if !(self.border_margin >= 0.0 && self.border_margin < 0.5) {
            return invalid(format!(
                "border_margin must be in [0, 0.5), got {}",
                self.border_margin
            ));
        }
        if self.scroll_amount == 0 {
            return invalid("scroll_amount must not be 0".into());
        }
        if self.capture_width == 0 || self.capture_height == 0 {
            return invalid(format!(
                "capture resolution must be non-zero, got {}x{}",
                self.capture_width, self.capture_height
            ));
        }
        for (idx, rect) in self.monitors.iter().enumerate() {
            if rect.width <= 0 || rect.height <= 0 {
                return invalid(format!("monitors[{idx}] has an empty size"));
            }
        }
        Ok(())
    }

    /// Out-of-range values saturate; [`Settings::validate`] rejects them first.
    pub fn dwell(&self) -> Duration {
        Duration::try_from_secs_f64(self.dwell_secs).unwrap_or(Duration::MAX)
    }

    pub fn close_hold(&self) -> Duration {
        Duration::try_from_secs_f64(self.close_hold_secs).unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn margin_of_one_half_is_rejected() {
        let settings = Settings {
            border_margin: 0.5,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(HandCursorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_smoothing_is_rejected() {
        let settings = Settings {
            smoothing: 0.0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            smoothing: 1.0,
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn durations_beyond_range_are_rejected() {
        for settings in [
            Settings {
                dwell_secs: 1e20,
                ..Settings::default()
            },
            Settings {
                close_hold_secs: f64::MAX,
                ..Settings::default()
            },
        ] {
            assert!(matches!(
                settings.validate(),
                Err(HandCursorError::InvalidConfig(_))
            ));
            assert_eq!(settings.dwell().max(settings.close_hold()), Duration::MAX);
        }
    }

    #[test]
    fn nan_values_are_rejected() {
        let settings = Settings {
            dwell_secs: f64::NAN,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            border_margin: f64::NAN,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"smoothing": 0.25}"#).unwrap();
        assert_eq!(settings.smoothing, 0.25);
        assert_eq!(settings.scroll_amount, 25);
        assert_eq!(settings.dwell(), Duration::from_secs(2));
        assert_eq!(settings.close_hold(), Duration::from_secs(3));
        assert!(settings.mirror_input);
    }
}
