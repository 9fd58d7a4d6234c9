use crate::display::{resolve_monitor, DisplayGeometry, OsDisplays, StaticDisplays};
use crate::error::HandCursorError;
use crate::hand_gestures::diagnostics::{
    DiagnosticsSink, FrameStatus, NullDiagnostics, OverlayGeometry, TracingDiagnostics,
};
use crate::hand_gestures::engine::{EngineConfig, GestureEngine, TickOutcome};
use crate::hand_gestures::landmarks::Detection;
use crate::hand_gestures::mapper::ANCHOR_LANDMARK;
use crate::hand_gestures::stream::{
    open_landmark_stream, CapturedFrame, FramePayload, FrameSource, LandmarkDetector,
};
use crate::input::{default_injector, InputInjector};
use crate::settings::Settings;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const KEY_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Cooperative stop request, checked between frames.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoopExit {
    /// The exit pose was held long enough.
    ExitGesture,
    /// [`StopHandle::request_stop`] was called.
    Stopped,
    /// The frame source has no more frames.
    SourceExhausted,
    AcquisitionFailed(HandCursorError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoopSummary {
    pub exit: LoopExit,
    pub frames: u64,
    pub actions: u64,
    pub dispatch_failures: u64,
}

pub struct ControlLoop {
    engine: GestureEngine,
    source: Box<dyn FrameSource>,
    detector: Option<Box<dyn LandmarkDetector>>,
    diagnostics: Box<dyn DiagnosticsSink>,
    stop: StopHandle,
    frames: u64,
    actions: u64,
    last_frame_at: Option<Instant>,
}

impl ControlLoop {
    pub fn new(engine: GestureEngine, source: Box<dyn FrameSource>) -> Self {
        Self {
            engine,
            source,
            detector: None,
            diagnostics: Box::new(NullDiagnostics),
            stop: StopHandle::default(),
            frames: 0,
            actions: 0,
            last_frame_at: None,
        }
    }

    pub fn with_detector(mut self, detector: Box<dyn LandmarkDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Box<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn engine(&self) -> &GestureEngine {
        &self.engine
    }

    /// Run until the exit gesture, a stop request, or the end of the source.
    pub fn run(&mut self) -> LoopSummary {
        tracing::info!("control loop started");
        let exit = loop {
            if let Some(exit) = self.step() {
                break exit;
            }
        };
        let summary = LoopSummary {
            exit,
            frames: self.frames,
            actions: self.actions,
            dispatch_failures: self.engine.dispatch_failures(),
        };
        tracing::info!(
            frames = summary.frames,
            actions = summary.actions,
            failures = summary.dispatch_failures,
            exit = ?summary.exit,
            "control loop finished"
        );
        summary
    }

    /// Process a single frame. Returns `Some` once the loop should end.
    pub fn step(&mut self) -> Option<LoopExit> {
        if self.stop.is_stopped() {
            tracing::info!("stop requested");
            return Some(LoopExit::Stopped);
        }

        let frame = match self.source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::info!("frame source exhausted");
                return Some(LoopExit::SourceExhausted);
            }
            Err(err) => {
                let err = HandCursorError::FrameAcquisition(format!("{err:#}"));
                tracing::error!(%err, "failed to read frame");
                return Some(LoopExit::AcquisitionFailed(err));
            }
        };

        let now = frame.captured_at;
        let detection = self.detect(frame);
        let outcome = self.engine.tick(&detection, now);
        self.frames += 1;
        self.actions += outcome.actions.len() as u64;

        let fps = self.fps(now);
        let status = self.status(&outcome, fps);
        self.diagnostics.publish(&status);

        if outcome.exit {
            Some(LoopExit::ExitGesture)
        } else {
            None
        }
    }

    fn detect(&mut self, frame: CapturedFrame) -> Detection {
        let result = match frame.payload {
            FramePayload::Landmarks(detection) => Ok(detection),
            FramePayload::DetectionFailed(reason) => Err(HandCursorError::Detection(reason)),
            FramePayload::Image(image) => match self.detector.as_mut() {
                Some(detector) => detector
                    .process(&image)
                    .map_err(|err| HandCursorError::Detection(format!("{err:#}"))),
                None => Err(HandCursorError::Detection(
                    "image frame received without a landmark detector".into(),
                )),
            },
        };
        result.unwrap_or_else(|err| {
            tracing::warn!(frame = self.frames + 1, %err, "treating frame as no hand");
            Detection::none()
        })
    }

    fn fps(&mut self, now: Instant) -> u32 {
        let fps = match self.last_frame_at {
            Some(prev) => {
                let dt = now.saturating_duration_since(prev).as_secs_f64();
                if dt > 0.0 {
                    (1.0 / dt) as u32
                } else {
                    0
                }
            }
            None => 0,
        };
        self.last_frame_at = Some(now);
        fps
    }

    fn status(&self, outcome: &TickOutcome, fps: u32) -> FrameStatus {
        let state = self.engine.state();
        FrameStatus {
            frame: self.frames,
            fps,
            hand_detected: outcome.hand_detected,
            phase: outcome.phase,
            cursor_active: state.cursor_position.is_some(),
            cursor_position: state.cursor_position,
            gestures: outcome.gestures,
            close_remaining: outcome.close_remaining,
            dispatch_failures: self.engine.dispatch_failures(),
        }
    }
}

/// Build the engine from settings against the given collaborators. Every
/// configuration or display problem surfaces here, before any frame is read.
pub fn build_engine(
    settings: &Settings,
    geometry: &dyn DisplayGeometry,
    injector: Box<dyn InputInjector>,
) -> Result<GestureEngine, HandCursorError> {
    settings.validate()?;
    let monitor = resolve_monitor(geometry, settings.monitor_index)?;
    tracing::info!(
        index = settings.monitor_index,
        x = monitor.x,
        y = monitor.y,
        width = monitor.width,
        height = monitor.height,
        anchor = ANCHOR_LANDMARK.as_str(),
        "controlling monitor"
    );
    match injector.cursor_position() {
        Some(pos) => tracing::info!(
            x = pos.0,
            y = pos.1,
            on_monitor = monitor.contains(pos),
            "pointer reachable"
        ),
        None => tracing::debug!("pointer position unavailable"),
    }
    GestureEngine::new(EngineConfig::from_settings(settings), monitor, injector)
}

/// Wire the platform backends from settings into a ready control loop.
pub fn control_from_settings(settings: &Settings) -> Result<ControlLoop, HandCursorError> {
    let geometry: Box<dyn DisplayGeometry> = if settings.monitors.is_empty() {
        Box::new(OsDisplays)
    } else {
        Box::new(StaticDisplays::new(settings.monitors.clone()))
    };
    let engine = build_engine(settings, geometry.as_ref(), default_injector())?;
    let source = open_landmark_stream(settings.landmark_stream.as_deref())?;

    let mut diagnostics = TracingDiagnostics::new(settings.status_log_every);
    diagnostics.configure(&OverlayGeometry::new(
        engine.mapper().region(),
        settings.capture_width,
        settings.capture_height,
    ));

    Ok(ControlLoop::new(engine, source).with_diagnostics(Box::new(diagnostics)))
}

/// Run until done. With `quit_on_escape` the Escape key stops the loop at the
/// next frame boundary; otherwise only the exit pose or the end of the
/// landmark stream does.
pub fn run_from_settings(settings: &Settings) -> Result<LoopSummary, HandCursorError> {
    let mut control = control_from_settings(settings)?;
    let stop = control.stop_handle();
    let watcher = if settings.quit_on_escape {
        watch_escape_key(stop.clone())
    } else {
        None
    };

    let summary = control.run();
    stop.request_stop();
    if let Some(watcher) = watcher {
        if watcher.join().is_err() {
            tracing::warn!("escape key watcher panicked");
        }
    }
    Ok(summary)
}

/// Poll `pressed` until it reports true or `stop` is set by someone else.
pub fn watch_key<F>(name: &str, stop: StopHandle, pressed: F) -> std::io::Result<JoinHandle<()>>
where
    F: Fn() -> bool + Send + 'static,
{
    let key = name.to_string();
    std::thread::Builder::new()
        .name(format!("{name}-watcher"))
        .spawn(move || {
            while !stop.is_stopped() {
                if pressed() {
                    tracing::info!(key = %key, "quit key pressed");
                    stop.request_stop();
                    break;
                }
                std::thread::sleep(KEY_POLL_INTERVAL);
            }
        })
}

#[cfg(windows)]
fn watch_escape_key(stop: StopHandle) -> Option<JoinHandle<()>> {
    use windows::Win32::UI::Input::KeyboardAndMouse::{GetAsyncKeyState, VK_ESCAPE};

    let pressed = || {
        let state = unsafe { GetAsyncKeyState(VK_ESCAPE.0 as i32) };
        state < 0
    };
    match watch_key("escape", stop, pressed) {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::warn!(%err, "failed to start escape key watcher");
            None
        }
    }
}

#[cfg(not(windows))]
fn watch_escape_key(_stop: StopHandle) -> Option<JoinHandle<()>> {
    tracing::info!("no escape key watcher on this platform, close the landmark stream to stop");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_watcher_requests_stop_when_pressed() {
        let stop = StopHandle::default();
        let key = Arc::new(AtomicBool::new(false));
        let flag = key.clone();
        let watcher = watch_key("test", stop.clone(), move || flag.load(Ordering::Acquire)).unwrap();

        assert!(!stop.is_stopped());
        key.store(true, Ordering::Release);
        watcher.join().unwrap();
        assert!(stop.is_stopped());
    }

    #[test]
    fn key_watcher_exits_once_the_loop_stops() {
        let stop = StopHandle::default();
        let watcher = watch_key("test", stop.clone(), || false).unwrap();
        stop.request_stop();
        watcher.join().unwrap();
    }
}
