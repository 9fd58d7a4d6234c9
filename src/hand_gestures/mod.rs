pub mod classifier;
pub mod diagnostics;
pub mod dispatcher;
pub mod engine;
pub mod landmarks;
pub mod mapper;
pub mod presence;
pub mod service;
pub mod stream;

pub use classifier::{format_gestures, Gesture, GestureClassifier, GestureSet, PinchReadings};
pub use diagnostics::{
    format_status_lines, DiagnosticsSink, FrameStatus, NullDiagnostics, OverlayGeometry,
    TracingDiagnostics,
};
pub use dispatcher::{ActionDispatcher, DispatchReport, PinchPrecedence};
pub use engine::{EngineConfig, EngineState, GestureEngine, TickOutcome};
pub use landmarks::{Detection, HandLandmark, Landmark, LandmarkFrame, LANDMARK_COUNT};
pub use mapper::{CursorSmoother, PositionMapper, UsableRegion, ANCHOR_LANDMARK};
pub use presence::{PresenceDebouncer, PresencePhase};
pub use service::{
    build_engine, control_from_settings, run_from_settings, watch_key, ControlLoop, LoopExit,
    LoopSummary, StopHandle,
};
pub use stream::{
    open_landmark_stream, CapturedFrame, FramePayload, FrameSource, LandmarkDetector,
    LandmarkStream,
};
