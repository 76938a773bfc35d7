//! Body-pose game core: turns per-frame joint landmarks into a gesture label
//! and judges that label against the obstacle currently in play.

pub mod config;
pub mod data;
pub mod encounter;
pub mod error;
pub mod gate;
pub mod geometry;
pub mod gesture;
pub mod landmarks;
pub mod obstacle;
pub mod pipeline;
pub mod session;
pub mod source;

pub use config::AppConfig;
pub use encounter::{
    resolve_encounter, EncounterResolver, GameState, ObstacleKind, Outcome, Resolution,
};
pub use error::PoseRunnerError;
pub use gate::GestureGate;
pub use gesture::{classify, GestureLabel};
pub use landmarks::{extract_frame, Frame, FrameSize, Joint, Landmark, Observation};
pub use session::{FrameReport, GameSession};
