// src/landmarks.rs - Joint landmarks, frames and observation extraction
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Minimum confidence a joint must exceed to be kept in a frame.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Nose,
    Neck,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    Root,
}

impl Joint {
    pub const ALL: [Joint; 19] = [
        Joint::Nose,
        Joint::Neck,
        Joint::LeftEye,
        Joint::RightEye,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
        Joint::Root,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn shoulder(self) -> Joint {
        match self {
            Side::Left => Joint::LeftShoulder,
            Side::Right => Joint::RightShoulder,
        }
    }

    pub fn elbow(self) -> Joint {
        match self {
            Side::Left => Joint::LeftElbow,
            Side::Right => Joint::RightElbow,
        }
    }

    pub fn wrist(self) -> Joint {
        match self {
            Side::Left => Joint::LeftWrist,
            Side::Right => Joint::RightWrist,
        }
    }

    pub fn eye(self) -> Joint {
        match self {
            Side::Left => Joint::LeftEye,
            Side::Right => Joint::RightEye,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Bones drawn by overlay consumers, as (from, to) joint pairs.
pub const BODY_CONNECTIONS: [(Joint, Joint); 14] = [
    (Joint::Nose, Joint::Neck),
    (Joint::Neck, Joint::RightShoulder),
    (Joint::Neck, Joint::LeftShoulder),
    (Joint::RightShoulder, Joint::RightHip),
    (Joint::LeftShoulder, Joint::LeftHip),
    (Joint::RightHip, Joint::LeftHip),
    (Joint::RightShoulder, Joint::RightElbow),
    (Joint::RightElbow, Joint::RightWrist),
    (Joint::LeftShoulder, Joint::LeftElbow),
    (Joint::LeftElbow, Joint::LeftWrist),
    (Joint::RightHip, Joint::RightKnee),
    (Joint::RightKnee, Joint::RightAnkle),
    (Joint::LeftHip, Joint::LeftKnee),
    (Joint::LeftKnee, Joint::LeftAnkle),
];

/// A joint position in normalized frame coordinates (origin top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub position: Vector2<f64>,
    pub confidence: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self {
            position: Vector2::new(x, y),
            confidence,
        }
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn is_finite(&self) -> bool {
        self.position.x.is_finite() && self.position.y.is_finite() && self.confidence.is_finite()
    }
}

/// Pixel dimensions of the camera frame the landmarks were taken from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: f64,
    pub height: f64,
}

impl FrameSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn to_pixels(&self, normalized: &Vector2<f64>) -> Vector2<f64> {
        Vector2::new(normalized.x * self.width, normalized.y * self.height)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    size: FrameSize,
    joints: HashMap<Joint, Landmark>,
}

impl Frame {
    pub fn new(size: FrameSize) -> Self {
        Self {
            size,
            joints: HashMap::new(),
        }
    }

    /// Builder-style insert with full confidence.
    pub fn with_joint(mut self, joint: Joint, x: f64, y: f64) -> Self {
        self.insert(joint, Landmark::new(x, y, 1.0));
        self
    }

    pub fn insert(&mut self, joint: Joint, landmark: Landmark) {
        self.joints.insert(joint, landmark);
    }

    /// Non-finite landmarks are reported as absent.
    pub fn get(&self, joint: Joint) -> Option<&Landmark> {
        self.joints.get(&joint).filter(|lm| lm.is_finite())
    }

    pub fn contains(&self, joint: Joint) -> bool {
        self.get(joint).is_some()
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Skeleton bones whose endpoints were both observed this frame.
    pub fn visible_bones(&self) -> impl Iterator<Item = (Joint, Joint)> + '_ {
        BODY_CONNECTIONS
            .iter()
            .copied()
            .filter(move |(from, to)| self.contains(*from) && self.contains(*to))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawJoint {
    pub x: f64,
    pub y: f64,
    pub confidence: f64,
}

/// One pose-estimator result. Coordinates are normalized with the origin at
/// the bottom-left, as the estimator reports them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub width: f64,
    pub height: f64,
    pub joints: HashMap<Joint, RawJoint>,
}

/// Converts an observation into a frame: keeps joints with confidence strictly
/// above `threshold`, drops non-finite values and flips y so it grows downward.
pub fn extract_frame(observation: &Observation, threshold: f64) -> Frame {
    let mut frame = Frame::new(FrameSize::new(observation.width, observation.height));

    for (joint, raw) in &observation.joints {
        if raw.confidence.is_nan() || raw.confidence <= threshold {
            continue;
        }

        let landmark = Landmark::new(raw.x, 1.0 - raw.y, raw.confidence);
        if landmark.is_finite() {
            frame.insert(*joint, landmark);
        }
    }

    tracing::trace!(
        kept = frame.len(),
        total = observation.joints.len(),
        "extracted landmark frame"
    );
    frame
}
