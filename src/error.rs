//! Error types for the hand cursor controller.
//!
//! Startup errors abort before the control loop begins. Per-frame errors are
//! logged and handled where they occur and never escape the loop.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HandCursorError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandCursorError {
    /// A configuration value is outside its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configured monitor index does not exist.
    #[error("monitor {index} is not available ({available} monitor(s) detected)")]
    MonitorUnavailable { index: usize, available: usize },

    /// No frame source could be opened.
    #[error("frame source unavailable: {0}")]
    FrameSourceUnavailable(String),

    /// The frame source failed while reading the next frame.
    #[error("frame acquisition failed: {0}")]
    FrameAcquisition(String),

    /// The landmark detector failed on a single frame.
    #[error("landmark detection failed: {0}")]
    Detection(String),

    /// An input injection call failed.
    #[error("{action} failed: {reason}")]
    Dispatch { action: &'static str, reason: String },
}

impl HandCursorError {
    /// Whether this error must stop the process before the loop starts.
    pub fn is_startup_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig(_) | Self::MonitorUnavailable { .. } | Self::FrameSourceUnavailable(_)
        )
    }
}
