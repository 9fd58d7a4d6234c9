use crate::display::MonitorRect;
use crate::error::HandCursorError;
use crate::hand_gestures::classifier::{GestureClassifier, GestureSet, PinchReadings};
use crate::hand_gestures::dispatcher::{ActionDispatcher, PinchPrecedence};
use crate::hand_gestures::landmarks::Detection;
use crate::hand_gestures::mapper::{CursorSmoother, PositionMapper, UsableRegion};
use crate::hand_gestures::presence::{PresenceDebouncer, PresencePhase};
use crate::input::{InjectedAction, InputInjector};
use crate::settings::Settings;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub dwell: Duration,
    pub close_hold: Duration,
    pub smoothing: f64,
    pub click_distance: f64,
    pub border_margin: f64,
    pub scroll_amount: i32,
    pub pinch_precedence: PinchPrecedence,
    pub mirror_input: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl EngineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            dwell: settings.dwell(),
            close_hold: settings.close_hold(),
            smoothing: settings.smoothing,
            click_distance: settings.click_distance,
            border_margin: settings.border_margin,
            scroll_amount: settings.scroll_amount,
            pinch_precedence: settings.pinch_precedence,
            mirror_input: settings.mirror_input,
        }
    }
}

/// Read-only snapshot of everything the engine remembers between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub presence_since: Option<Instant>,
    pub presence_confirmed: bool,
    pub cursor_position: Option<(i32, i32)>,
    pub click_latched: bool,
    pub double_click_latched: bool,
    pub exit_timer_start: Option<Instant>,
    pub terminated: bool,
}

/// Result of one engine tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub hand_detected: bool,
    pub phase: PresencePhase,
    pub gestures: GestureSet,
    pub pinch: Option<PinchReadings>,
    pub actions: Vec<InjectedAction>,
    pub failures: Vec<HandCursorError>,
    pub exit: bool,
    pub close_remaining: Option<Duration>,
}

impl TickOutcome {
    fn idle(hand_detected: bool, phase: PresencePhase) -> Self {
        Self {
            hand_detected,
            phase,
            gestures: GestureSet::empty(),
            pinch: None,
            actions: Vec::new(),
            failures: Vec::new(),
            exit: false,
            close_remaining: None,
        }
    }

    pub fn authorized(&self) -> bool {
        self.phase.is_confirmed()
    }
}

/// Presence gate, classifier, mapper and dispatcher driven one frame at a time.
pub struct GestureEngine {
    presence: PresenceDebouncer,
    classifier: GestureClassifier,
    mapper: PositionMapper,
    dispatcher: ActionDispatcher,
    mirror_input: bool,
    terminated: bool,
}

impl GestureEngine {
    pub fn new(
        config: EngineConfig,
        monitor: MonitorRect,
        injector: Box<dyn InputInjector>,
    ) -> Result<Self, HandCursorError> {
        let region = UsableRegion::new(config.border_margin)?;
        let smoother = CursorSmoother::new(config.smoothing)?;
        if !config.click_distance.is_finite() || config.click_distance <= 0.0 {
            return Err(HandCursorError::InvalidConfig(format!(
                "click distance must be > 0, got {}",
                config.click_distance
            )));
        }
        Ok(Self {
            presence: PresenceDebouncer::new(config.dwell),
            classifier: GestureClassifier::new(config.click_distance),
            mapper: PositionMapper::new(region, monitor),
            dispatcher: ActionDispatcher::new(
                injector,
                smoother,
                config.scroll_amount,
                config.close_hold,
                config.pinch_precedence,
            ),
            mirror_input: config.mirror_input,
            terminated: false,
        })
    }

    pub fn tick(&mut self, detection: &Detection, now: Instant) -> TickOutcome {
        if self.terminated {
            return TickOutcome::idle(false, PresencePhase::Absent);
        }

        let frame = detection.hand_landmarks().map(|landmarks| {
            if self.mirror_input {
                landmarks.mirrored()
            } else {
                landmarks.clone()
            }
        });
        let hand_detected = frame.is_some();
        let phase = self.presence.observe(hand_detected, now);

        let Some(frame) = frame else {
            self.dispatcher.release();
            return TickOutcome::idle(false, phase);
        };

        let classification = self.classifier.classify(&frame);
        let mut outcome = TickOutcome::idle(true, phase);
        outcome.gestures = classification.gestures;
        outcome.pinch = Some(classification.pinch);

        if !phase.is_confirmed() {
            self.dispatcher.release();
            return outcome;
        }

        let target = self.mapper.map_anchor(&frame);
        let report = self.dispatcher.dispatch(classification.gestures, target, now);
        if report.exit {
            self.terminated = true;
        }
        outcome.actions = report.actions;
        outcome.failures = report.failures;
        outcome.exit = report.exit;
        outcome.close_remaining = report.close_remaining;
        outcome
    }

    pub fn state(&self) -> EngineState {
        EngineState {
            presence_since: self.presence.since(),
            presence_confirmed: self.presence.is_confirmed(),
            cursor_position: self.dispatcher.cursor_position(),
            click_latched: self.dispatcher.click_latched(),
            double_click_latched: self.dispatcher.double_click_latched(),
            exit_timer_start: self.dispatcher.exit_timer_start(),
            terminated: self.terminated,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn mapper(&self) -> &PositionMapper {
        &self.mapper
    }

    pub fn dispatch_failures(&self) -> u64 {
        self.dispatcher.failure_count()
    }
}
