//! Hand landmark model.
//!
//! 21 points per hand in the usual palm-detector topology: the wrist, then
//! four joints per finger from the base outwards. Coordinates are normalized
//! to the image (`x`, `y` in `[0, 1]`, `y` growing downwards), `z` is depth
//! relative to the wrist.

use crate::error::HandCursorError;

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

impl HandLandmark {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Distance in the image plane. Depth is ignored.
    pub fn planar_distance(&self, other: &Landmark) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// True when `self` sits higher in the image than `other`.
    pub fn is_above(&self, other: &Landmark) -> bool {
        self.y < other.y
    }

    pub fn is_below(&self, other: &Landmark) -> bool {
        self.y > other.y
    }
}

impl From<[f64; 3]> for Landmark {
    fn from(value: [f64; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

/// One complete set of landmarks for a single image.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkFrame {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build a frame from detector output. Extra points are ignored, missing
    /// points are an error.
    pub fn from_points(points: &[Landmark]) -> Result<Self, HandCursorError> {
        if points.len() < LANDMARK_COUNT {
            return Err(HandCursorError::Detection(format!(
                "expected {LANDMARK_COUNT} landmarks, got {}",
                points.len()
            )));
        }
        let mut out = [Landmark::default(); LANDMARK_COUNT];
        out.copy_from_slice(&points[..LANDMARK_COUNT]);
        Ok(Self { points: out })
    }

    pub fn get(&self, landmark: HandLandmark) -> &Landmark {
        &self.points[landmark.index()]
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    /// Flip horizontally, as seen through a selfie camera.
    pub fn mirrored(&self) -> Self {
        let mut points = self.points;
        for p in points.iter_mut() {
            p.x = 1.0 - p.x;
        }
        Self { points }
    }

    pub fn distance(&self, a: HandLandmark, b: HandLandmark) -> f64 {
        self.get(a).planar_distance(self.get(b))
    }
}

/// Detector output for one image.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Detection {
    pub presence: bool,
    pub landmarks: Option<LandmarkFrame>,
}

impl Detection {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn hand(landmarks: LandmarkFrame) -> Self {
        Self {
            presence: true,
            landmarks: Some(landmarks),
        }
    }

    /// The landmarks, but only when the detector also reported presence.
    pub fn hand_landmarks(&self) -> Option<&LandmarkFrame> {
        if self.presence {
            self.landmarks.as_ref()
        } else {
            None
        }
    }
}
