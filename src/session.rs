// src/session.rs - Per-frame game pipeline: classify, gate, schedule, resolve
use crate::encounter::{EncounterResolver, GameState, Outcome, Resolution};
use crate::gate::GestureGate;
use crate::gesture::{classify, GestureLabel};
use crate::landmarks::Frame;
use crate::obstacle::{Obstacle, ObstacleScheduler, SchedulerConfig, SchedulerEvent};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use uuid::Uuid;

const METRICS_WINDOW: usize = 30;

/// One video frame at 30fps.
pub const FRAME_BUDGET: Duration = Duration::from_millis(33);

/// Rolling processing-time statistics over the last few frames.
#[derive(Debug, Clone)]
pub struct PerformanceMetrics {
    pub avg_processing_ms: f32,
    pub max_processing_ms: f32,
    pub over_budget_frames: u64,
    frame_times: VecDeque<f32>,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self {
            avg_processing_ms: 0.0,
            max_processing_ms: 0.0,
            over_budget_frames: 0,
            frame_times: VecDeque::with_capacity(METRICS_WINDOW),
        }
    }

    fn record(&mut self, elapsed: Duration) {
        let ms = elapsed.as_secs_f32() * 1000.0;
        self.frame_times.push_front(ms);
        if self.frame_times.len() > METRICS_WINDOW {
            self.frame_times.pop_back();
        }

        self.avg_processing_ms =
            self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        self.max_processing_ms = self.max_processing_ms.max(ms);

        if elapsed > FRAME_BUDGET {
            self.over_budget_frames += 1;
            tracing::warn!(ms, "frame processing exceeded the frame budget");
        }
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the scene driver needs to react to one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    pub label: GestureLabel,
    /// Set only when the label differs from the previous frame's.
    pub change: Option<GestureLabel>,
    pub body_detected: bool,
    pub spawned: Vec<Obstacle>,
    pub resolutions: Vec<Resolution>,
    pub state: GameState,
}

impl FrameReport {
    pub fn failed(&self) -> Option<&Resolution> {
        self.resolutions
            .iter()
            .find(|r| r.outcome == Outcome::Failed)
    }
}

/// Single owner of all mutable game state. Frames and collision reports must
/// reach it through one serialized stream (see `pipeline`).
#[derive(Debug, Clone)]
pub struct GameSession {
    gate: GestureGate,
    resolver: EncounterResolver,
    scheduler: ObstacleScheduler,
    frame_index: u64,
    label: GestureLabel,
    metrics: PerformanceMetrics,
}

impl GameSession {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            gate: GestureGate::new(),
            resolver: EncounterResolver::new(),
            scheduler: ObstacleScheduler::new(config),
            frame_index: 0,
            label: GestureLabel::None,
            metrics: PerformanceMetrics::new(),
        }
    }

    pub fn state(&self) -> GameState {
        self.resolver.state()
    }

    pub fn scheduler(&self) -> &ObstacleScheduler {
        &self.scheduler
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn label(&self) -> GestureLabel {
        self.label
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    /// Runs one camera callback. `None` means the estimator found no body;
    /// the previous label is kept in that case.
    pub fn process_frame(&mut self, frame: Option<&Frame>) -> FrameReport {
        let start = Instant::now();
        self.frame_index += 1;

        if let Some(frame) = frame {
            self.label = classify(frame);
        }
        let change = self.gate.on_new_gesture(self.label);
        self.resolver.observe_gesture(self.label);

        let mut spawned = Vec::new();
        let mut resolutions = Vec::new();

        if !self.resolver.is_game_over() {
            for event in self.scheduler.tick() {
                match event {
                    SchedulerEvent::Spawned(obstacle) => spawned.push(obstacle),
                    SchedulerEvent::Collision(obstacle) => {
                        if let Some(resolution) = self.handle_collision(obstacle.id) {
                            resolutions.push(resolution);
                        }
                    }
                    SchedulerEvent::Passed(obstacle) => {
                        tracing::debug!(id = %obstacle.id, kind = %obstacle.kind, "obstacle passed unresolved");
                    }
                }
            }
        }

        self.metrics.record(start.elapsed());

        FrameReport {
            frame_index: self.frame_index,
            label: self.label,
            change,
            body_detected: frame.is_some(),
            spawned,
            resolutions,
            state: self.resolver.state(),
        }
    }

    /// Resolves an overlap report, from the scheduler or an external
    /// collision source. An obstacle becomes the resolver's encounter when it
    /// first reaches the player, so several obstacles may be traveling at once
    /// and each is still judged in arrival order.
    pub fn handle_collision(&mut self, id: Uuid) -> Option<Resolution> {
        if self.resolver.is_game_over() {
            return None;
        }

        if self.resolver.active().map(|active| active.id) != Some(id) {
            let arriving = self
                .scheduler
                .in_play()
                .iter()
                .find(|obstacle| obstacle.id == id && !obstacle.phase.is_terminal())
                .map(Obstacle::as_active);

            match arriving {
                Some(obstacle) => self.resolver.begin_encounter(obstacle),
                None => {
                    tracing::debug!(%id, "collision for an obstacle that is not in play");
                    return None;
                }
            }
        }

        let resolution = self.resolver.on_collision(id)?;
        self.scheduler
            .apply_outcome(resolution.obstacle.id, resolution.outcome);
        Some(resolution)
    }
}
