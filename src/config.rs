// src/config.rs - Runtime settings for the game pipeline
use crate::error::PoseRunnerError;
use crate::landmarks::{FrameSize, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::obstacle::SchedulerConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub frame_width: f64,
    pub frame_height: f64,
    pub confidence_threshold: f64,
    pub spawn_interval_frames: u32,
    pub travel_frames: u32,
    pub collision_frames: u32,
    pub lanes: usize,
    pub output_directory: PathBuf,
    /// Capacity of the frame/collision event queue feeding the session.
    pub event_buffer: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        let scheduler = SchedulerConfig::default();
        Self {
            frame_width: 1080.0,
            frame_height: 1920.0,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            spawn_interval_frames: scheduler.spawn_interval_frames,
            travel_frames: scheduler.travel_frames,
            collision_frames: scheduler.collision_frames,
            lanes: scheduler.lanes,
            output_directory: directories::UserDirs::new()
                .and_then(|dirs| dirs.document_dir().map(|p| p.join("PoseRunner")))
                .unwrap_or_else(|| PathBuf::from("./output")),
            event_buffer: 64,
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PoseRunnerError> {
        if !self.frame_size().is_valid() {
            return Err(PoseRunnerError::InvalidFrameSize {
                width: self.frame_width,
                height: self.frame_height,
            });
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(PoseRunnerError::InvalidThreshold(self.confidence_threshold));
        }
        if self.spawn_interval_frames == 0 {
            return Err(PoseRunnerError::InvalidSchedule(
                "spawn_interval_frames must be positive".into(),
            ));
        }
        if self.lanes == 0 {
            return Err(PoseRunnerError::InvalidSchedule("lanes must be positive".into()));
        }
        if self.event_buffer == 0 {
            return Err(PoseRunnerError::InvalidSchedule(
                "event_buffer must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn frame_size(&self) -> FrameSize {
        FrameSize::new(self.frame_width, self.frame_height)
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            spawn_interval_frames: self.spawn_interval_frames,
            travel_frames: self.travel_frames,
            collision_frames: self.collision_frames,
            lanes: self.lanes,
        }
    }
}
