// src/gesture.rs - Per-frame gesture classification from body landmarks
use crate::geometry::{
    elbow_angle, horizontal_offset, pixel_distance, vertical_offset, vertical_pixel_gap,
};
use crate::landmarks::{Frame, Joint, Landmark, Side};
use serde::{Deserialize, Serialize};
use std::fmt;

// Empirically tuned thresholds. Pixel values are in camera-frame pixels,
// offsets are fractions of the normalized frame.
const CLAP_MAX_WRIST_DISTANCE_PX: f64 = 190.0;
const STRAIGHT_ANGLE_DEG: f64 = 180.0;
const SWIM_ANGLE_TOLERANCE_DEG: f64 = 30.0;
const HEAD_MAX_WRIST_EYE_GAP_PX: f64 = 100.0;
const HEAD_MIN_WRIST_DISTANCE_PX: f64 = 210.0;
const HEAD_MAX_WRIST_DISTANCE_PX: f64 = 350.0;
const CUT_MAX_ELBOW_ANGLE_DEG: f64 = 150.0;
const CUT_MIN_WRIST_REACH: f64 = 0.05;
const FLY_MIN_ELBOW_ANGLE_DEG: f64 = 160.0;
const ARM_LEVEL_TOLERANCE: f64 = 0.1;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum GestureLabel {
    #[default]
    None,
    Clap,
    HandsOnHead,
    Swimming,
    Cutting,
    Climbing,
    Flying,
}

impl GestureLabel {
    pub const ALL: [GestureLabel; 7] = [
        GestureLabel::None,
        GestureLabel::Clap,
        GestureLabel::HandsOnHead,
        GestureLabel::Swimming,
        GestureLabel::Cutting,
        GestureLabel::Climbing,
        GestureLabel::Flying,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GestureLabel::None => "none",
            GestureLabel::Clap => "clap",
            GestureLabel::HandsOnHead => "hands_on_head",
            GestureLabel::Swimming => "swimming",
            GestureLabel::Cutting => "cutting",
            GestureLabel::Climbing => "climbing",
            GestureLabel::Flying => "flying",
        }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Detector = fn(&Frame) -> bool;

/// Detectors in priority order. The first one that fires names the frame.
pub const RANKED_DETECTORS: [(GestureLabel, Detector); 6] = [
    (GestureLabel::Swimming, is_swimming),
    (GestureLabel::HandsOnHead, is_hands_on_head),
    (GestureLabel::Cutting, is_cutting),
    (GestureLabel::Climbing, is_climbing),
    (GestureLabel::Flying, is_flying),
    (GestureLabel::Clap, is_clap),
];

/// Classifies one frame. Missing joints make a detector silently not fire,
/// so an empty or partial frame yields `GestureLabel::None`.
pub fn classify(frame: &Frame) -> GestureLabel {
    if !frame.size().is_valid() {
        tracing::trace!(size = ?frame.size(), "skipping frame with unusable size");
        return GestureLabel::None;
    }

    RANKED_DETECTORS
        .iter()
        .find(|(_, detect)| detect(frame))
        .map(|(label, _)| *label)
        .unwrap_or(GestureLabel::None)
}

struct Arm<'a> {
    shoulder: &'a Landmark,
    elbow: &'a Landmark,
    wrist: &'a Landmark,
}

impl<'a> Arm<'a> {
    fn from_frame(frame: &'a Frame, side: Side) -> Option<Self> {
        Some(Self {
            shoulder: frame.get(side.shoulder())?,
            elbow: frame.get(side.elbow())?,
            wrist: frame.get(side.wrist())?,
        })
    }

    fn angle(&self, frame: &Frame) -> Option<f64> {
        elbow_angle(self.shoulder, self.elbow, self.wrist, frame.size())
    }

    fn is_level_with_shoulder(&self) -> bool {
        vertical_offset(self.elbow, self.shoulder) < ARM_LEVEL_TOLERANCE
            && vertical_offset(self.wrist, self.shoulder) < ARM_LEVEL_TOLERANCE
    }
}

fn both_arms(frame: &Frame) -> Option<(Arm<'_>, Arm<'_>)> {
    Some((
        Arm::from_frame(frame, Side::Left)?,
        Arm::from_frame(frame, Side::Right)?,
    ))
}

pub fn is_clap(frame: &Frame) -> bool {
    match (frame.get(Joint::LeftWrist), frame.get(Joint::RightWrist)) {
        (Some(left), Some(right)) => {
            pixel_distance(left, right, frame.size()) < CLAP_MAX_WRIST_DISTANCE_PX
        }
        _ => false,
    }
}

/// Both arms substantially straight.
pub fn is_swimming(frame: &Frame) -> bool {
    let Some((left, right)) = both_arms(frame) else {
        return false;
    };

    let straight = |arm: &Arm<'_>| {
        arm.angle(frame)
            .map(|angle| (STRAIGHT_ANGLE_DEG - angle).abs() <= SWIM_ANGLE_TOLERANCE_DEG)
            .unwrap_or(false)
    };

    straight(&left) && straight(&right)
}

/// Wrists level with the eyes on each side, apart but not touching.
pub fn is_hands_on_head(frame: &Frame) -> bool {
    let size = frame.size();
    let wrist_near_eye = |side: Side| match (frame.get(side.wrist()), frame.get(side.eye())) {
        (Some(wrist), Some(eye)) => {
            vertical_pixel_gap(wrist, eye, size) < HEAD_MAX_WRIST_EYE_GAP_PX
        }
        _ => false,
    };
    let (Some(left_wrist), Some(right_wrist)) =
        (frame.get(Joint::LeftWrist), frame.get(Joint::RightWrist))
    else {
        return false;
    };

    let wrist_distance = pixel_distance(left_wrist, right_wrist, size);

    wrist_near_eye(Side::Left)
        && wrist_near_eye(Side::Right)
        && wrist_distance > HEAD_MIN_WRIST_DISTANCE_PX
        && wrist_distance < HEAD_MAX_WRIST_DISTANCE_PX
}

/// Right arm bent at chest height with the hand pushed out sideways.
pub fn is_cutting(frame: &Frame) -> bool {
    let Some(arm) = Arm::from_frame(frame, Side::Right) else {
        return false;
    };
    let Some(angle) = arm.angle(frame) else {
        return false;
    };

    angle < CUT_MAX_ELBOW_ANGLE_DEG
        && arm.is_level_with_shoulder()
        && horizontal_offset(arm.wrist, arm.shoulder) > CUT_MIN_WRIST_REACH
}

/// Exactly one hand raised above both the face and the other hand.
pub fn is_climbing(frame: &Frame) -> bool {
    let (Some(right_wrist), Some(left_wrist), Some(nose)) = (
        frame.get(Joint::RightWrist),
        frame.get(Joint::LeftWrist),
        frame.get(Joint::Nose),
    ) else {
        return false;
    };

    let raised = |hand: &Landmark, other: &Landmark| hand.y() < nose.y() && hand.y() < other.y();
    raised(right_wrist, left_wrist) || raised(left_wrist, right_wrist)
}

/// Both arms straight and held out level with the shoulders.
pub fn is_flying(frame: &Frame) -> bool {
    let Some((left, right)) = both_arms(frame) else {
        return false;
    };

    let spread = |arm: &Arm<'_>| {
        arm.angle(frame)
            .map(|angle| angle > FLY_MIN_ELBOW_ANGLE_DEG)
            .unwrap_or(false)
            && arm.is_level_with_shoulder()
    };

    spread(&left) && spread(&right)
}
