//! Turns classified gestures into injector calls.
//!
//! Movement and scrolling repeat every frame their pose holds. Clicks are
//! latched: one action per pinch, released when the fingers separate. The
//! exit pose must be held for the configured time before it fires.

use crate::error::HandCursorError;
use crate::hand_gestures::classifier::{Gesture, GestureSet};
use crate::hand_gestures::mapper::CursorSmoother;
use crate::input::{InjectedAction, InputInjector};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// What happens when both pinches close in the same frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinchPrecedence {
    /// Only the double click fires; the click pinch stays latched until it
    /// is released.
    #[default]
    DoubleClickFirst,
    /// Each pinch fires on its own latch, so both may fire together.
    Independent,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub actions: Vec<InjectedAction>,
    pub failures: Vec<HandCursorError>,
    pub exit: bool,
    pub close_remaining: Option<Duration>,
}

pub struct ActionDispatcher {
    injector: Box<dyn InputInjector>,
    smoother: CursorSmoother,
    scroll_amount: i32,
    close_hold: Duration,
    precedence: PinchPrecedence,
    cursor_position: Option<(i32, i32)>,
    click_latched: bool,
    double_click_latched: bool,
    exit_timer_start: Option<Instant>,
    failure_count: u64,
}

impl ActionDispatcher {
    pub fn new(
        injector: Box<dyn InputInjector>,
        smoother: CursorSmoother,
        scroll_amount: i32,
        close_hold: Duration,
        precedence: PinchPrecedence,
    ) -> Self {
        Self {
            injector,
            smoother,
            scroll_amount,
            close_hold,
            precedence,
            cursor_position: None,
            click_latched: false,
            double_click_latched: false,
            exit_timer_start: None,
            failure_count: 0,
        }
    }

    /// Handle one authorized frame. `target` is the mapped anchor position.
    pub fn dispatch(&mut self, gestures: GestureSet, target: (i32, i32), now: Instant) -> DispatchReport {
        let mut report = DispatchReport::default();

        if gestures.contains(Gesture::MoveEnable) {
            let next = self.smoother.step(self.cursor_position, target);
            if self.cursor_position != Some(next)
                && self.inject(InjectedAction::MoveTo(next.0, next.1), &mut report)
            {
                self.cursor_position = Some(next);
            }
        }

        if gestures.contains(Gesture::ScrollDown) {
            self.inject(InjectedAction::Scroll(-self.scroll_amount), &mut report);
        }
        if gestures.contains(Gesture::ScrollUp) {
            self.inject(InjectedAction::Scroll(self.scroll_amount), &mut report);
        }

        self.dispatch_pinches(gestures, &mut report);
        self.track_exit(gestures.contains(Gesture::ExitHold), now, &mut report);

        report
    }

    fn dispatch_pinches(&mut self, gestures: GestureSet, report: &mut DispatchReport) {
        let click = gestures.contains(Gesture::Click);
        let double = gestures.contains(Gesture::DoubleClick);

        if !click {
            self.click_latched = false;
        }
        if !double {
            self.double_click_latched = false;
        }

        match self.precedence {
            PinchPrecedence::DoubleClickFirst => {
                if double {
                    if !self.double_click_latched
                        && self.inject(InjectedAction::DoubleClick, report)
                    {
                        self.double_click_latched = true;
                    }
                    if click && self.double_click_latched {
                        self.click_latched = true;
                    }
                } else if click && !self.click_latched && self.inject(InjectedAction::Click, report)
                {
                    self.click_latched = true;
                }
            }
            PinchPrecedence::Independent => {
                if click && !self.click_latched && self.inject(InjectedAction::Click, report) {
                    self.click_latched = true;
                }
                if double
                    && !self.double_click_latched
                    && self.inject(InjectedAction::DoubleClick, report)
                {
                    self.double_click_latched = true;
                }
            }
        }
    }

    fn track_exit(&mut self, holding: bool, now: Instant, report: &mut DispatchReport) {
        if !holding {
            if self.exit_timer_start.take().is_some() {
                tracing::debug!("exit pose released");
            }
            return;
        }

        let start = *self.exit_timer_start.get_or_insert(now);
        let elapsed = now.saturating_duration_since(start);
        if elapsed >= self.close_hold {
            tracing::info!(
                held_ms = elapsed.as_millis() as u64,
                "exit pose held, stopping"
            );
            report.exit = true;
            report.close_remaining = Some(Duration::ZERO);
        } else {
            let remaining = self.close_hold - elapsed;
            tracing::debug!(remaining_ms = remaining.as_millis() as u64, "exit countdown");
            report.close_remaining = Some(remaining);
        }
    }

    /// Returns whether the injector accepted the action. Failures are logged
    /// and recorded in the report, never propagated.
    fn inject(&mut self, action: InjectedAction, report: &mut DispatchReport) -> bool {
        match self.injector.perform(action) {
            Ok(()) => {
                match action {
                    InjectedAction::MoveTo(x, y) => tracing::trace!(x, y, "cursor moved"),
                    InjectedAction::Scroll(amount) => tracing::debug!(amount, "scroll"),
                    InjectedAction::Click => tracing::info!("click"),
                    InjectedAction::DoubleClick => tracing::info!("double click"),
                }
                report.actions.push(action);
                true
            }
            Err(err) => {
                tracing::warn!(action = action.name(), error = %format!("{err:#}"), "input injection failed");
                self.failure_count += 1;
                report.failures.push(HandCursorError::Dispatch {
                    action: action.name(),
                    reason: format!("{err:#}"),
                });
                false
            }
        }
    }

    /// Drop per-hand state when control is not authorized.
    pub fn release(&mut self) {
        self.click_latched = false;
        self.double_click_latched = false;
        self.exit_timer_start = None;
    }

    pub fn cursor_position(&self) -> Option<(i32, i32)> {
        self.cursor_position
    }

    pub fn click_latched(&self) -> bool {
        self.click_latched
    }

    pub fn double_click_latched(&self) -> bool {
        self.double_click_latched
    }

    pub fn exit_timer_start(&self) -> Option<Instant> {
        self.exit_timer_start
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MockInputInjector;

    fn dispatcher(mock: &MockInputInjector, precedence: PinchPrecedence) -> ActionDispatcher {
        ActionDispatcher::new(
            Box::new(mock.clone()),
            CursorSmoother::new(0.5).unwrap(),
            25,
            Duration::from_secs(3),
            precedence,
        )
    }

    #[test]
    fn held_pinch_clicks_once() {
        let mock = MockInputInjector::default();
        let mut d = dispatcher(&mock, PinchPrecedence::DoubleClickFirst);
        let now = Instant::now();
        for _ in 0..7 {
            d.dispatch(Gesture::Click.into(), (0, 0), now);
        }
        assert_eq!(mock.count(|a| *a == InjectedAction::Click), 1);
        assert!(d.click_latched());

        d.dispatch(GestureSet::empty(), (0, 0), now);
        assert!(!d.click_latched());
        d.dispatch(Gesture::Click.into(), (0, 0), now);
        assert_eq!(mock.count(|a| *a == InjectedAction::Click), 2);
    }

    #[test]
    fn double_click_wins_when_both_pinches_close() {
        let mock = MockInputInjector::default();
        let mut d = dispatcher(&mock, PinchPrecedence::DoubleClickFirst);
        let now = Instant::now();
        let report = d.dispatch(Gesture::Click | Gesture::DoubleClick, (0, 0), now);
        assert_eq!(report.actions, vec![InjectedAction::DoubleClick]);

        // Releasing the middle pinch must not turn the held index pinch into a click.
        let report = d.dispatch(Gesture::Click.into(), (0, 0), now);
        assert!(report.actions.is_empty());
    }

    #[test]
    fn failed_double_click_leaves_click_pinch_free() {
        let mock = MockInputInjector::default();
        let mut d = dispatcher(&mock, PinchPrecedence::DoubleClickFirst);
        let now = Instant::now();

        mock.set_failure(Some("access denied"));
        let report = d.dispatch(Gesture::Click | Gesture::DoubleClick, (0, 0), now);
        assert_eq!(report.failures.len(), 1);
        assert!(!d.click_latched());
        assert!(!d.double_click_latched());

        mock.set_failure(None);
        let report = d.dispatch(Gesture::Click.into(), (0, 0), now);
        assert_eq!(report.actions, vec![InjectedAction::Click]);
    }

    #[test]
    fn independent_pinches_both_fire() {
        let mock = MockInputInjector::default();
        let mut d = dispatcher(&mock, PinchPrecedence::Independent);
        let report = d.dispatch(Gesture::Click | Gesture::DoubleClick, (0, 0), Instant::now());
        assert_eq!(
            report.actions,
            vec![InjectedAction::Click, InjectedAction::DoubleClick]
        );
    }

    #[test]
    fn scroll_repeats_every_frame() {
        let mock = MockInputInjector::default();
        let mut d = dispatcher(&mock, PinchPrecedence::default());
        let now = Instant::now();
        for _ in 0..3 {
            d.dispatch(Gesture::ScrollDown.into(), (0, 0), now);
        }
        d.dispatch(Gesture::ScrollUp.into(), (0, 0), now);
        assert_eq!(
            mock.performed(),
            vec![
                InjectedAction::Scroll(-25),
                InjectedAction::Scroll(-25),
                InjectedAction::Scroll(-25),
                InjectedAction::Scroll(25),
            ]
        );
    }

    #[test]
    fn move_is_skipped_when_position_is_unchanged() {
        let mock = MockInputInjector::default();
        let mut d = dispatcher(&mock, PinchPrecedence::default());
        let now = Instant::now();
        d.dispatch(Gesture::MoveEnable.into(), (100, 100), now);
        let report = d.dispatch(Gesture::MoveEnable.into(), (100, 100), now);
        assert!(report.actions.is_empty());
        assert_eq!(d.cursor_position(), Some((100, 100)));

        // No movement without the pose.
        d.dispatch(GestureSet::empty(), (500, 500), now);
        assert_eq!(d.cursor_position(), Some((100, 100)));
    }

    #[test]
    fn failed_click_is_retried_next_frame() {
        let mock = MockInputInjector::default();
        let mut d = dispatcher(&mock, PinchPrecedence::default());
        let now = Instant::now();
        mock.set_failure(Some("access denied"));
        let report = d.dispatch(Gesture::Click.into(), (0, 0), now);
        assert!(report.actions.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert!(!d.click_latched());
        assert_eq!(d.failure_count(), 1);

        mock.set_failure(None);
        let report = d.dispatch(Gesture::Click.into(), (0, 0), now);
        assert_eq!(report.actions, vec![InjectedAction::Click]);
    }

    #[test]
    fn exit_fires_after_hold_and_resets_on_release() {
        let mock = MockInputInjector::default();
        let mut d = dispatcher(&mock, PinchPrecedence::default());
        let start = Instant::now();
        let step = Duration::from_millis(500);

        for i in 0..4 {
            assert!(!d.dispatch(Gesture::ExitHold.into(), (0, 0), start + step * i).exit);
        }
        d.dispatch(GestureSet::empty(), (0, 0), start + step * 4);
        assert!(d.exit_timer_start().is_none());

        let restart = start + step * 5;
        let mut fired_at = None;
        for i in 0..8 {
            let report = d.dispatch(Gesture::ExitHold.into(), (0, 0), restart + step * i);
            if report.exit {
                fired_at = Some(i);
                break;
            }
        }
        assert_eq!(fired_at, Some(6));
    }
}
