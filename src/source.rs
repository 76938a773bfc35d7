// src/source.rs - Landmark sources: JSON-lines replay and scripted simulation
use crate::error::PoseRunnerError;
use crate::gesture::GestureLabel;
use crate::landmarks::{FrameSize, Joint, Observation, RawJoint};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// What the pose estimator produced for one camera frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Capture {
    Body(Observation),
    NoBody,
}

pub trait LandmarkSource {
    /// Next capture, or `None` when the source is exhausted.
    fn next_capture(&mut self) -> Result<Option<Capture>>;
}

/// Reads one observation per line. A `null` line is a frame with no body.
pub struct ReplaySource<R> {
    lines: std::io::Lines<R>,
    line_number: usize,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open replay file {}", path.display()))?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> LandmarkSource for ReplaySource<R> {
    fn next_capture(&mut self) -> Result<Option<Capture>> {
        for line in self.lines.by_ref() {
            self.line_number += 1;
            let line = line.with_context(|| format!("Failed to read line {}", self.line_number))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let parsed: Option<Observation> = serde_json::from_str(trimmed).map_err(|e| {
                PoseRunnerError::MalformedObservation {
                    line: self.line_number,
                    reason: e.to_string(),
                }
            })?;

            return Ok(Some(parsed.map_or(Capture::NoBody, Capture::Body)));
        }
        Ok(None)
    }
}

/// Scripted player cycling through canonical poses with a little sway, so the
/// whole pipeline can run without a camera.
pub struct SimulatedSource {
    size: FrameSize,
    script: Vec<(GestureLabel, u32)>,
    remaining: Option<u64>,
    step: usize,
    held: u32,
    sim_time: f64,
}

impl SimulatedSource {
    pub fn new(size: FrameSize, frames: Option<u64>) -> Self {
        Self::with_script(
            size,
            frames,
            vec![
                (GestureLabel::None, 30),
                (GestureLabel::HandsOnHead, 60),
                (GestureLabel::Cutting, 45),
                (GestureLabel::Swimming, 45),
                (GestureLabel::Climbing, 30),
                (GestureLabel::Clap, 45),
            ],
        )
    }

    /// Each script entry holds a pose for the given number of frames. A
    /// `GestureLabel::None` entry is the relaxed pose; `Flying` has no pose
    /// of its own because straight arms always read as swimming.
    pub fn with_script(
        size: FrameSize,
        frames: Option<u64>,
        script: Vec<(GestureLabel, u32)>,
    ) -> Self {
        Self {
            size,
            script,
            remaining: frames,
            step: 0,
            held: 0,
            sim_time: 0.0,
        }
    }

    fn current_pose(&mut self) -> GestureLabel {
        let (label, hold) = self.script[self.step % self.script.len()];
        self.held += 1;
        if self.held >= hold.max(1) {
            self.held = 0;
            self.step += 1;
        }
        label
    }
}

impl LandmarkSource for SimulatedSource {
    fn next_capture(&mut self) -> Result<Option<Capture>> {
        if self.script.is_empty() {
            return Ok(None);
        }
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Ok(None);
            }
            *remaining -= 1;
        }

        let t = self.sim_time;
        self.sim_time += 0.033;
        let pose = self.current_pose();
        let sway = 0.003 * t.sin();

        let joints = pose_landmarks(pose)
            .into_iter()
            .map(|(joint, x, y)| {
                (
                    joint,
                    RawJoint {
                        x: x + sway,
                        // Estimator output has its origin at the bottom-left.
                        y: 1.0 - (y + 0.5 * sway),
                        confidence: 0.9,
                    },
                )
            })
            .collect::<HashMap<_, _>>();

        Ok(Some(Capture::Body(Observation {
            width: self.size.width,
            height: self.size.height,
            joints,
        })))
    }
}

/// Top-left-origin landmarks for a pose, tuned for a 1080x1920 portrait frame.
fn pose_landmarks(pose: GestureLabel) -> Vec<(Joint, f64, f64)> {
    let mut joints = vec![
        (Joint::Nose, 0.50, 0.22),
        (Joint::Neck, 0.50, 0.30),
        (Joint::LeftEye, 0.46, 0.20),
        (Joint::RightEye, 0.54, 0.20),
        (Joint::LeftShoulder, 0.40, 0.35),
        (Joint::RightShoulder, 0.60, 0.35),
        (Joint::LeftHip, 0.43, 0.60),
        (Joint::RightHip, 0.57, 0.60),
    ];

    let arms: [(Joint, f64, f64); 4] = match pose {
        GestureLabel::HandsOnHead => [
            (Joint::LeftElbow, 0.30, 0.30),
            (Joint::LeftWrist, 0.36, 0.22),
            (Joint::RightElbow, 0.70, 0.30),
            (Joint::RightWrist, 0.64, 0.22),
        ],
        GestureLabel::Cutting => [
            (Joint::LeftElbow, 0.38, 0.50),
            (Joint::LeftWrist, 0.36, 0.65),
            (Joint::RightElbow, 0.75, 0.37),
            (Joint::RightWrist, 0.72, 0.28),
        ],
        GestureLabel::Swimming | GestureLabel::Flying => [
            (Joint::LeftElbow, 0.38, 0.50),
            (Joint::LeftWrist, 0.36, 0.65),
            (Joint::RightElbow, 0.62, 0.50),
            (Joint::RightWrist, 0.64, 0.65),
        ],
        GestureLabel::Climbing => [
            (Joint::LeftElbow, 0.38, 0.50),
            (Joint::LeftWrist, 0.36, 0.65),
            (Joint::RightElbow, 0.72, 0.23),
            (Joint::RightWrist, 0.66, 0.08),
        ],
        GestureLabel::Clap => [
            (Joint::LeftElbow, 0.38, 0.47),
            (Joint::LeftWrist, 0.48, 0.40),
            (Joint::RightElbow, 0.62, 0.47),
            (Joint::RightWrist, 0.52, 0.40),
        ],
        GestureLabel::None => [
            (Joint::LeftElbow, 0.30, 0.50),
            (Joint::LeftWrist, 0.40, 0.62),
            (Joint::RightElbow, 0.70, 0.50),
            (Joint::RightWrist, 0.60, 0.62),
        ],
    };

    joints.extend(arms);
    joints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::classify;
    use crate::landmarks::{extract_frame, DEFAULT_CONFIDENCE_THRESHOLD};
    use std::io::Cursor;

    fn portrait() -> FrameSize {
        FrameSize::new(1080.0, 1920.0)
    }

    #[test]
    fn test_replay_parses_lines() {
        let data = concat!(
            r#"{"width":1080,"height":1920,"joints":{"left_wrist":{"x":0.45,"y":0.5,"confidence":0.9}}}"#,
            "\n\nnull\n",
        );
        let mut source = ReplaySource::from_reader(Cursor::new(data));

        assert!(matches!(source.next_capture().unwrap(), Some(Capture::Body(_))));
        assert_eq!(source.next_capture().unwrap(), Some(Capture::NoBody));
        assert_eq!(source.next_capture().unwrap(), None);
    }

    #[test]
    fn test_replay_reports_bad_line() {
        let data = "null\n{\"width\": 1}\n";
        let mut source = ReplaySource::from_reader(Cursor::new(data));
        source.next_capture().unwrap();

        let err = source.next_capture().unwrap_err();
        match err.downcast_ref::<PoseRunnerError>() {
            Some(PoseRunnerError::MalformedObservation { line, .. }) => assert_eq!(*line, 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_simulated_poses_classify_as_scripted() {
        for label in [
            GestureLabel::None,
            GestureLabel::HandsOnHead,
            GestureLabel::Cutting,
            GestureLabel::Swimming,
            GestureLabel::Climbing,
            GestureLabel::Clap,
        ] {
            let mut source = SimulatedSource::with_script(portrait(), Some(1), vec![(label, 1)]);
            let Some(Capture::Body(observation)) = source.next_capture().unwrap() else {
                panic!("expected a body for {label}");
            };

            let frame = extract_frame(&observation, DEFAULT_CONFIDENCE_THRESHOLD);
            assert_eq!(classify(&frame), label, "pose for {label}");
        }
    }

    #[test]
    fn test_simulated_source_stops_after_frame_budget() {
        let mut source = SimulatedSource::new(portrait(), Some(3));
        for _ in 0..3 {
            assert!(source.next_capture().unwrap().is_some());
        }
        assert!(source.next_capture().unwrap().is_none());
    }

    #[test]
    fn test_simulated_script_advances() {
        let mut source = SimulatedSource::with_script(
            portrait(),
            None,
            vec![(GestureLabel::Clap, 2), (GestureLabel::Climbing, 1)],
        );

        let labels: Vec<GestureLabel> = (0..5)
            .map(|_| match source.next_capture().unwrap() {
                Some(Capture::Body(obs)) => {
                    classify(&extract_frame(&obs, DEFAULT_CONFIDENCE_THRESHOLD))
                }
                _ => GestureLabel::None,
            })
            .collect();

        assert_eq!(
            labels,
            vec![
                GestureLabel::Clap,
                GestureLabel::Clap,
                GestureLabel::Climbing,
                GestureLabel::Clap,
                GestureLabel::Clap,
            ]
        );
    }
}
