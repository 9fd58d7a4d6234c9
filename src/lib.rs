pub mod display;
pub mod error;
pub mod hand_gestures;
pub mod input;
pub mod logging;
pub mod settings;

pub use error::{HandCursorError, Result};
