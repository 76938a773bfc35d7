// src/obstacle.rs - Obstacle lifecycle and the periodic spawner
use crate::encounter::{ActiveObstacle, ObstacleKind, Outcome};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstaclePhase {
    Spawned,
    Traveling,
    Cleared,
    Passed,
    Collided,
}

impl ObstaclePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ObstaclePhase::Cleared | ObstaclePhase::Passed | ObstaclePhase::Collided
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: Uuid,
    pub kind: ObstacleKind,
    pub lane: usize,
    pub phase: ObstaclePhase,
    age_frames: u32,
}

impl Obstacle {
    pub fn new(kind: ObstacleKind, lane: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            lane,
            phase: ObstaclePhase::Spawned,
            age_frames: 0,
        }
    }

    pub fn as_active(&self) -> ActiveObstacle {
        ActiveObstacle {
            id: self.id,
            kind: self.kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub spawn_interval_frames: u32,
    pub travel_frames: u32,
    /// Consecutive frames an obstacle overlaps the player and is reported.
    pub collision_frames: u32,
    pub lanes: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            spawn_interval_frames: 90,
            travel_frames: 60,
            collision_frames: 3,
            lanes: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    Spawned(Obstacle),
    Collision(ActiveObstacle),
    Passed(ActiveObstacle),
}

/// Spawns obstacles on a fixed frame interval, rotating through kinds and
/// lanes, and reports overlap with the player for every frame it lasts.
#[derive(Debug, Clone)]
pub struct ObstacleScheduler {
    config: SchedulerConfig,
    frames: u64,
    next_kind: usize,
    next_lane: usize,
    in_play: Vec<Obstacle>,
}

impl ObstacleScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            frames: 0,
            next_kind: 0,
            next_lane: 0,
            in_play: Vec::new(),
        }
    }

    pub fn in_play(&self) -> &[Obstacle] {
        &self.in_play
    }

    /// Advances one frame.
    pub fn tick(&mut self) -> Vec<SchedulerEvent> {
        let mut events = Vec::new();
        self.frames += 1;

        self.in_play.retain(|obstacle| !obstacle.phase.is_terminal());

        let collision_start = self.config.travel_frames;
        let collision_end = collision_start + self.config.collision_frames.max(1);

        for obstacle in &mut self.in_play {
            obstacle.age_frames += 1;
            if obstacle.phase == ObstaclePhase::Spawned {
                obstacle.phase = ObstaclePhase::Traveling;
            }

            if obstacle.age_frames >= collision_end {
                obstacle.phase = ObstaclePhase::Passed;
                events.push(SchedulerEvent::Passed(obstacle.as_active()));
            } else if obstacle.age_frames >= collision_start {
                events.push(SchedulerEvent::Collision(obstacle.as_active()));
            }
        }

        let interval = u64::from(self.config.spawn_interval_frames.max(1));
        if self.frames % interval == 0 {
            let obstacle = self.spawn_next();
            tracing::debug!(id = %obstacle.id, kind = %obstacle.kind, lane = obstacle.lane, "obstacle spawned");
            events.push(SchedulerEvent::Spawned(obstacle));
        }

        events
    }

    /// Records the resolver's decision for an obstacle in play.
    pub fn apply_outcome(&mut self, id: Uuid, outcome: Outcome) {
        if let Some(obstacle) = self.in_play.iter_mut().find(|o| o.id == id) {
            obstacle.phase = match outcome {
                Outcome::Cleared => ObstaclePhase::Cleared,
                Outcome::Failed => ObstaclePhase::Collided,
            };
        }
    }

    fn spawn_next(&mut self) -> Obstacle {
        let kind = ObstacleKind::ALL[self.next_kind % ObstacleKind::ALL.len()];
        let lane = self.next_lane % self.config.lanes.max(1);
        self.next_kind += 1;
        self.next_lane += 1;

        let obstacle = Obstacle::new(kind, lane);
        self.in_play.push(obstacle.clone());
        obstacle
    }
}
