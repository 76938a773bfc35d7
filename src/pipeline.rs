//! Single-owner event loop for a game session.
//!
//! Frame delivery and collision reports can originate on different tasks.
//! Both are funneled through one channel into the task that owns the
//! `GameSession`, so the gesture a collision is judged against is never read
//! halfway through a frame update.

use crate::data::SessionRecorder;
use crate::encounter::{Outcome, Resolution};
use crate::error::PoseRunnerError;
use crate::gesture::GestureLabel;
use crate::landmarks::Frame;
use crate::obstacle::Obstacle;
use crate::session::{FrameReport, GameSession};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug)]
pub enum SessionEvent {
    Frame(Option<Frame>),
    Collision(Uuid),
}

/// Instructions for the scene driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    Animate(GestureLabel),
    Spawn(Obstacle),
    Remove(Uuid),
    GameOver(Resolution),
}

impl SceneCommand {
    fn from_resolution(resolution: &Resolution) -> Self {
        match resolution.outcome {
            Outcome::Cleared => SceneCommand::Remove(resolution.obstacle.id),
            Outcome::Failed => SceneCommand::GameOver(*resolution),
        }
    }

    fn from_report(report: &FrameReport) -> Vec<Self> {
        let mut commands = Vec::new();
        if let Some(label) = report.change {
            commands.push(SceneCommand::Animate(label));
        }
        commands.extend(report.spawned.iter().cloned().map(SceneCommand::Spawn));
        commands.extend(report.resolutions.iter().map(Self::from_resolution));
        commands
    }
}

/// Sending side of a running session. Cheap to clone.
#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::Sender<SessionEvent>,
    dropped: Arc<AtomicU64>,
}

impl SessionHandle {
    /// Queues a frame, waiting for room if the session is behind.
    pub async fn submit_frame(&self, frame: Option<Frame>) -> Result<(), PoseRunnerError> {
        self.events
            .send(SessionEvent::Frame(frame))
            .await
            .map_err(|_| PoseRunnerError::SessionClosed)
    }

    /// Queues a frame without waiting, for live cameras. Returns `Ok(false)`
    /// when the queue is full and the frame was dropped.
    pub fn offer_frame(&self, frame: Option<Frame>) -> Result<bool, PoseRunnerError> {
        match self.events.try_send(SessionEvent::Frame(frame)) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Ok(false)
            }
            Err(TrySendError::Closed(_)) => Err(PoseRunnerError::SessionClosed),
        }
    }

    /// Collision reports are never dropped.
    pub async fn report_collision(&self, id: Uuid) -> Result<(), PoseRunnerError> {
        self.events
            .send(SessionEvent::Collision(id))
            .await
            .map_err(|_| PoseRunnerError::SessionClosed)
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// What the session task hands back once every handle is dropped.
#[derive(Debug)]
pub struct SessionOutput {
    pub session: GameSession,
    pub recorder: SessionRecorder,
}

pub fn spawn_session(
    session: GameSession,
    recorder: SessionRecorder,
    buffer: usize,
) -> (
    SessionHandle,
    mpsc::Receiver<SceneCommand>,
    JoinHandle<SessionOutput>,
) {
    let (event_tx, event_rx) = mpsc::channel(buffer.max(1));
    let (command_tx, command_rx) = mpsc::channel(buffer.max(1));

    let task = tokio::spawn(run_session(session, recorder, event_rx, command_tx));
    let handle = SessionHandle {
        events: event_tx,
        dropped: Arc::new(AtomicU64::new(0)),
    };

    (handle, command_rx, task)
}

async fn run_session(
    mut session: GameSession,
    mut recorder: SessionRecorder,
    mut events: mpsc::Receiver<SessionEvent>,
    commands: mpsc::Sender<SceneCommand>,
) -> SessionOutput {
    while let Some(event) = events.recv().await {
        let emitted = match event {
            SessionEvent::Frame(frame) => {
                let report = session.process_frame(frame.as_ref());
                recorder.add_report(&report);
                SceneCommand::from_report(&report)
            }
            SessionEvent::Collision(id) => match session.handle_collision(id) {
                Some(resolution) => {
                    recorder.add_resolution(session.frame_index(), &resolution, session.state());
                    vec![SceneCommand::from_resolution(&resolution)]
                }
                None => Vec::new(),
            },
        };

        for command in emitted {
            if commands.send(command).await.is_err() {
                tracing::debug!("scene receiver dropped, discarding command");
            }
        }
    }

    tracing::debug!(
        frames = session.frame_index(),
        state = %session.state(),
        "session event channel closed, exiting"
    );
    SessionOutput { session, recorder }
}
