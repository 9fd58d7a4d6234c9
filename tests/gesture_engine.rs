
use hand_cursor::hand_gestures::{
    Detection, EngineConfig, Gesture, PinchPrecedence, PresencePhase,
};
use hand_cursor::input::{InjectedAction, MockInputInjector};
use hand_fixtures::*;
use std::time::{Duration, Instant};

fn instant_config() -> EngineConfig {
    EngineConfig {
        dwell: Duration::ZERO,
        ..config()
    }
}

fn is_move(action: &InjectedAction) -> bool {
    matches!(action, InjectedAction::MoveTo(..))
}

#[test]
fn cursor_moves_only_after_dwell() {
    let mock = MockInputInjector::default();
    let mut engine = engine(config(), &mock);
    let start = Instant::now();

    for i in 0..10 {
        let outcome = engine.tick(&Detection::none(), at(start, i as f64 * 0.5));
        assert_eq!(outcome.phase, PresencePhase::Absent);
        assert!(outcome.actions.is_empty());
    }

    let hand = open_palm((0.5, 0.5));
    let target = engine.mapper().map((0.5, 0.5));
    let mut first_move = None;
    for k in 0..8 {
        let outcome = engine.tick(&hand, at(start, 5.0 + k as f64 * 0.5));
        if k < 4 {
            assert!(!outcome.authorized(), "authorized too early at frame {k}");
            assert!(outcome.actions.is_empty());
            assert!(outcome.gestures.contains(Gesture::MoveEnable));
        } else {
            assert!(outcome.authorized());
            if first_move.is_none() {
                first_move = outcome.actions.first().copied().map(|a| (k, a));
            }
        }
    }

    assert_eq!(first_move, Some((4, InjectedAction::MoveTo(target.0, target.1))));
    assert_eq!(mock.count(is_move), 1);
}

#[test]
fn dropped_frame_restarts_dwell() {
    let mock = MockInputInjector::default();
    let mut engine = engine(config(), &mock);
    let start = Instant::now();
    let hand = open_palm((0.5, 0.5));

    engine.tick(&hand, at(start, 0.0));
    engine.tick(&hand, at(start, 1.5));
    engine.tick(&Detection::none(), at(start, 1.9));
    assert!(!engine.tick(&hand, at(start, 2.0)).authorized());
    assert!(!engine.tick(&hand, at(start, 3.5)).authorized());
    assert!(engine.tick(&hand, at(start, 4.0)).authorized());
    assert_eq!(mock.count(is_move), 1);
}

#[test]
fn cursor_converges_without_overshoot() {
    let mock = MockInputInjector::default();
    let mut engine = engine(instant_config(), &mock);
    let now = Instant::now();

    engine.tick(&open_palm((0.3, 0.3)), now);
    engine.tick(&open_palm((0.3, 0.3)), now);
    let start = engine.mapper().map((0.3, 0.3));
    assert_eq!(engine.state().cursor_position, Some(start));

    let target = engine.mapper().map((0.7, 0.7));
    let mut xs = vec![start.0];
    for _ in 0..30 {
        engine.tick(&open_palm((0.7, 0.7)), now);
        if let Some((x, _)) = engine.state().cursor_position {
            xs.push(x);
        }
    }

    assert!(xs.windows(2).all(|w| w[0] <= w[1]), "not monotonic: {xs:?}");
    assert!(xs.iter().all(|x| *x <= target.0));
    assert_eq!(engine.state().cursor_position, Some(target));

    // Once settled no further moves are injected.
    let moves = mock.count(is_move);
    engine.tick(&open_palm((0.7, 0.7)), now);
    assert_eq!(mock.count(is_move), moves);
}

#[test]
fn cursor_position_survives_hand_loss() {
    let mock = MockInputInjector::default();
    let mut engine = engine(instant_config(), &mock);
    let now = Instant::now();

    engine.tick(&open_palm((0.3, 0.3)), now);
    engine.tick(&open_palm((0.3, 0.3)), now);
    let before = engine.state().cursor_position;

    engine.tick(&Detection::none(), now);
    assert_eq!(engine.state().cursor_position, before);

    engine.tick(&open_palm((0.7, 0.7)), now);
    let outcome = engine.tick(&open_palm((0.7, 0.7)), now);
    let target = engine.mapper().map((0.7, 0.7));
    match outcome.actions.first() {
        Some(InjectedAction::MoveTo(x, y)) => {
            assert!((*x, *y) != target, "cursor jumped straight to the target");
            assert!(*x > before.map(|p| p.0).unwrap_or(0));
        }
        other => panic!("expected a move, got {other:?}"),
    }
}

#[test]
fn held_pinch_clicks_once_for_any_length() {
    for frames in [1, 2, 5, 20] {
        let mock = MockInputInjector::default();
        let mut engine = engine(instant_config(), &mock);
        let now = Instant::now();
        engine.tick(&relaxed(), now);
        engine.tick(&relaxed(), now);

        for _ in 0..frames {
            engine.tick(&pinch(0.02, 0.3), now);
        }
        engine.tick(&relaxed(), now);

        assert_eq!(
            mock.count(|a| *a == InjectedAction::Click),
            1,
            "pinch held for {frames} frames"
        );
    }
}

#[test]
fn releasing_and_pinching_again_clicks_again() {
    let mock = MockInputInjector::default();
    let mut engine = engine(instant_config(), &mock);
    let now = Instant::now();
    engine.tick(&relaxed(), now);

    for _ in 0..3 {
        engine.tick(&pinch(0.02, 0.3), now);
        engine.tick(&pinch(0.2, 0.3), now);
    }
    assert_eq!(mock.count(|a| *a == InjectedAction::Click), 3);
}

#[test]
fn both_pinches_with_double_click_first() {
    let mock = MockInputInjector::default();
    let mut engine = engine(instant_config(), &mock);
    let now = Instant::now();
    engine.tick(&relaxed(), now);

    let outcome = engine.tick(&pinch(0.02, 0.03), now);
    assert!(outcome.gestures.contains(Gesture::Click | Gesture::DoubleClick));
    assert_eq!(outcome.actions, vec![InjectedAction::DoubleClick]);

    for _ in 0..5 {
        assert!(engine.tick(&pinch(0.02, 0.03), now).actions.is_empty());
    }
    assert_eq!(mock.performed(), vec![InjectedAction::DoubleClick]);
}

#[test]
fn both_pinches_when_independent() {
    let mock = MockInputInjector::default();
    let config = EngineConfig {
        pinch_precedence: PinchPrecedence::Independent,
        ..instant_config()
    };
    let mut engine = engine(config, &mock);
    let now = Instant::now();
    engine.tick(&relaxed(), now);

    let outcome = engine.tick(&pinch(0.02, 0.03), now);
    assert_eq!(
        outcome.actions,
        vec![InjectedAction::Click, InjectedAction::DoubleClick]
    );
    engine.tick(&pinch(0.02, 0.03), now);
    assert_eq!(mock.performed().len(), 2);
}

#[test]
fn scrolling_repeats_while_held() {
    let mock = MockInputInjector::default();
    let mut engine = engine(instant_config(), &mock);
    let now = Instant::now();
    engine.tick(&relaxed(), now);

    for _ in 0..4 {
        engine.tick(&index_raised(), now);
    }
    for _ in 0..2 {
        engine.tick(&two_fingers_raised(), now);
    }

    assert_eq!(mock.count(|a| *a == InjectedAction::Scroll(-25)), 4);
    assert_eq!(mock.count(|a| *a == InjectedAction::Scroll(25)), 2);
}

#[test]
fn exit_fires_once_after_hold() {
    let mock = MockInputInjector::default();
    let mut engine = engine(instant_config(), &mock);
    let start = Instant::now();
    engine.tick(&relaxed(), start);
    engine.tick(&relaxed(), start);

    let mut exits = Vec::new();
    for i in 0..8 {
        let outcome = engine.tick(&exit_pose(), at(start, 1.0 + i as f64 * 0.5));
        if outcome.exit {
            exits.push(i);
        }
    }

    assert_eq!(exits, vec![6]);
    assert!(engine.is_terminated());
    let outcome = engine.tick(&pinch(0.02, 0.3), at(start, 6.0));
    assert!(outcome.actions.is_empty());
    assert!(!outcome.exit);
}

#[test]
fn exit_countdown_only_runs_while_authorized() {
    let mock = MockInputInjector::default();
    let mut engine = engine(config(), &mock);
    let start = Instant::now();

    // Dwell confirms at 2.0s, so the 3s hold completes at 5.0s.
    for i in 0..10 {
        let outcome = engine.tick(&exit_pose(), at(start, i as f64 * 0.5));
        assert!(!outcome.exit, "exited early at {}s", i as f64 * 0.5);
    }
    assert!(engine.tick(&exit_pose(), at(start, 5.0)).exit);
}

#[test]
fn injection_failures_do_not_stop_the_engine() {
    let mock = MockInputInjector::default();
    let mut engine = engine(instant_config(), &mock);
    let now = Instant::now();
    engine.tick(&relaxed(), now);

    mock.set_failure(Some("blocked by UIPI"));
    for _ in 0..3 {
        let outcome = engine.tick(&pinch(0.02, 0.3), now);
        assert!(outcome.actions.is_empty());
        assert_eq!(outcome.failures.len(), 1);
    }
    assert_eq!(engine.dispatch_failures(), 3);
    assert!(!engine.state().click_latched);

    mock.set_failure(None);
    let outcome = engine.tick(&pinch(0.02, 0.3), now);
    assert_eq!(outcome.actions, vec![InjectedAction::Click]);
}

#[test]
fn reacquired_hand_must_dwell_before_clicking() {
    let mock = MockInputInjector::default();
    let mut engine = engine(instant_config(), &mock);
    let now = Instant::now();
    engine.tick(&relaxed(), now);

    engine.tick(&pinch(0.02, 0.3), now);
    engine.tick(&Detection::none(), now);
    let outcome = engine.tick(&pinch(0.02, 0.3), now);
    assert!(!outcome.authorized());
    assert!(outcome.actions.is_empty());

    engine.tick(&pinch(0.02, 0.3), now);
    assert_eq!(mock.count(|a| *a == InjectedAction::Click), 2);
}

#[test]
fn failed_double_click_does_not_swallow_the_held_click() {
    let mock = MockInputInjector::default();
    let mut engine = engine(instant_config(), &mock);
    let now = Instant::now();
    engine.tick(&relaxed(), now);

    mock.set_failure(Some("blocked by UIPI"));
    let outcome = engine.tick(&pinch(0.02, 0.03), now);
    assert_eq!(outcome.failures.len(), 1);
    assert!(!engine.state().click_latched);

    mock.set_failure(None);
    let outcome = engine.tick(&pinch(0.02, 0.3), now);
    assert_eq!(outcome.actions, vec![InjectedAction::Click]);
}
