//! Per-frame gesture classification from landmark geometry.
//!
//! Every gesture is a fixed predicate over a handful of landmarks: vertical
//! ordering of fingertips against the thumb tip and middle finger base, or the
//! planar distance between two fingertips. Several gestures may hold in the
//! same frame; the dispatcher decides what to do with them.

use crate::hand_gestures::landmarks::{HandLandmark, Landmark, LandmarkFrame};
use enumflags2::{bitflags, BitFlags};

#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    /// All four fingertips above the thumb tip.
    MoveEnable = 1 << 0,
    /// Only the index finger raised.
    ScrollDown = 1 << 1,
    /// Index and middle fingers raised, ring and pinky curled.
    ScrollUp = 1 << 2,
    /// Index tip pinched against the thumb tip.
    Click = 1 << 3,
    /// Middle tip pinched against the thumb tip.
    DoubleClick = 1 << 4,
    /// Thumb tip below the wrist.
    ExitHold = 1 << 5,
}

impl Gesture {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MoveEnable => "move",
            Self::ScrollDown => "scroll-down",
            Self::ScrollUp => "scroll-up",
            Self::Click => "click",
            Self::DoubleClick => "double-click",
            Self::ExitHold => "exit-hold",
        }
    }
}

pub type GestureSet = BitFlags<Gesture>;

/// Short comma separated form for logs and the status overlay.
pub fn format_gestures(set: GestureSet) -> String {
    if set.is_empty() {
        return "none".into();
    }
    set.iter().map(Gesture::as_str).collect::<Vec<_>>().join(",")
}

/// Raw pinch distances behind the click predicates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PinchReadings {
    pub thumb_index: f64,
    pub thumb_middle: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub gestures: GestureSet,
    pub pinch: PinchReadings,
}

#[derive(Debug, Clone, Copy)]
pub struct GestureClassifier {
    click_distance: f64,
}

impl GestureClassifier {
    pub fn new(click_distance: f64) -> Self {
        Self { click_distance }
    }

    pub fn classify(&self, frame: &LandmarkFrame) -> Classification {
        use HandLandmark::*;

        let wrist = frame.get(Wrist);
        let thumb = frame.get(ThumbTip);
        let index = frame.get(IndexTip);
        let middle = frame.get(MiddleTip);
        let ring = frame.get(RingTip);
        let pinky = frame.get(PinkyTip);
        let middle_base = frame.get(MiddleMcp);

        let mut gestures = GestureSet::empty();

        if [index, middle, ring, pinky].iter().all(|tip| tip.is_above(thumb)) {
            gestures.insert(Gesture::MoveEnable);
        }

        let index_raised = index.is_above(thumb);
        let curled = |tip: &Landmark| {
            tip.is_below(thumb) && tip.is_below(middle_base)
        };
        if index_raised && curled(middle) && curled(ring) && curled(pinky) {
            gestures.insert(Gesture::ScrollDown);
        }

        if index_raised
            && middle.is_above(thumb)
            && ring.is_below(middle_base)
            && pinky.is_below(middle_base)
        {
            gestures.insert(Gesture::ScrollUp);
        }

        let pinch = PinchReadings {
            thumb_index: frame.distance(IndexTip, ThumbTip),
            thumb_middle: frame.distance(MiddleTip, ThumbTip),
        };
        if pinch.thumb_index < self.click_distance {
            gestures.insert(Gesture::Click);
        }
        if pinch.thumb_middle < self.click_distance {
            gestures.insert(Gesture::DoubleClick);
        }

        if thumb.is_below(wrist) {
            gestures.insert(Gesture::ExitHold);
        }

        Classification { gestures, pinch }
    }
}
