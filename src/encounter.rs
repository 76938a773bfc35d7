// src/encounter.rs - Obstacle/gesture rule table and the encounter state machine
use crate::gesture::GestureLabel;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObstacleKind {
    Person,
    Grass,
    Block,
    Hole,
    Water,
    Dragon,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 6] = [
        ObstacleKind::Person,
        ObstacleKind::Grass,
        ObstacleKind::Block,
        ObstacleKind::Hole,
        ObstacleKind::Water,
        ObstacleKind::Dragon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObstacleKind::Person => "person",
            ObstacleKind::Grass => "grass",
            ObstacleKind::Block => "block",
            ObstacleKind::Hole => "hole",
            ObstacleKind::Water => "water",
            ObstacleKind::Dragon => "dragon",
        }
    }
}

impl fmt::Display for ObstacleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Cleared,
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Cleared => write!(f, "cleared"),
            Outcome::Failed => write!(f, "failed"),
        }
    }
}

/// Every (obstacle, gesture) pair that clears the obstacle. Pairs not listed fail.
static ENCOUNTER_RULES: Lazy<HashMap<(ObstacleKind, GestureLabel), Outcome>> = Lazy::new(|| {
    HashMap::from([
        ((ObstacleKind::Person, GestureLabel::HandsOnHead), Outcome::Cleared),
        ((ObstacleKind::Grass, GestureLabel::Cutting), Outcome::Cleared),
        ((ObstacleKind::Grass, GestureLabel::Flying), Outcome::Cleared),
        ((ObstacleKind::Block, GestureLabel::Flying), Outcome::Cleared),
        ((ObstacleKind::Hole, GestureLabel::Flying), Outcome::Cleared),
        ((ObstacleKind::Water, GestureLabel::Swimming), Outcome::Cleared),
        ((ObstacleKind::Dragon, GestureLabel::Clap), Outcome::Cleared),
    ])
});

pub fn encounter_rules() -> &'static HashMap<(ObstacleKind, GestureLabel), Outcome> {
    &ENCOUNTER_RULES
}

pub fn resolve_encounter(kind: ObstacleKind, gesture: GestureLabel) -> Outcome {
    ENCOUNTER_RULES
        .get(&(kind, gesture))
        .copied()
        .unwrap_or(Outcome::Failed)
}

/// Gestures that get the player past `kind`, in label order.
pub fn clearing_gestures(kind: ObstacleKind) -> Vec<GestureLabel> {
    GestureLabel::ALL
        .iter()
        .copied()
        .filter(|gesture| resolve_encounter(kind, *gesture) == Outcome::Cleared)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Playing,
    GameOver,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameState::Playing => write!(f, "playing"),
            GameState::GameOver => write!(f, "game_over"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveObstacle {
    pub id: Uuid,
    pub kind: ObstacleKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub obstacle: ActiveObstacle,
    pub gesture: GestureLabel,
    pub outcome: Outcome,
}

/// Pairs the obstacle in play with the latest gesture. Each obstacle instance
/// resolves at most once no matter how many overlap reports arrive, and the
/// first failure ends the game.
#[derive(Debug, Clone)]
pub struct EncounterResolver {
    active: Option<ActiveObstacle>,
    last_gesture: GestureLabel,
    resolved: bool,
    state: GameState,
}

impl Default for EncounterResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl EncounterResolver {
    pub fn new() -> Self {
        Self {
            active: None,
            last_gesture: GestureLabel::None,
            resolved: false,
            state: GameState::Playing,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_game_over(&self) -> bool {
        self.state == GameState::GameOver
    }

    pub fn active(&self) -> Option<ActiveObstacle> {
        self.active
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn observe_gesture(&mut self, gesture: GestureLabel) {
        self.last_gesture = gesture;
    }

    /// Makes `obstacle` the one in play, replacing any previous obstacle.
    pub fn begin_encounter(&mut self, obstacle: ActiveObstacle) {
        if let Some(previous) = self.active {
            if !self.resolved {
                tracing::debug!(id = %previous.id, kind = %previous.kind, "obstacle replaced before collision");
            }
        }

        self.active = Some(obstacle);
        self.resolved = false;
    }

    /// Handles an overlap report for obstacle `id`. Returns `None` for repeat
    /// reports, stale ids, or once the game is over.
    pub fn on_collision(&mut self, id: Uuid) -> Option<Resolution> {
        if self.is_game_over() || self.resolved {
            return None;
        }

        let obstacle = match self.active {
            Some(active) if active.id == id => active,
            _ => {
                tracing::debug!(%id, "collision for an obstacle that is not in play");
                return None;
            }
        };

        let outcome = resolve_encounter(obstacle.kind, self.last_gesture);
        self.resolved = true;

        match outcome {
            Outcome::Cleared => {
                tracing::info!(kind = %obstacle.kind, gesture = %self.last_gesture, "obstacle cleared");
            }
            Outcome::Failed => {
                tracing::warn!(kind = %obstacle.kind, gesture = %self.last_gesture, "collision failed, game over");
                self.state = GameState::GameOver;
            }
        }

        Some(Resolution {
            obstacle,
            gesture: self.last_gesture,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obstacle(kind: ObstacleKind) -> ActiveObstacle {
        ActiveObstacle {
            id: Uuid::new_v4(),
            kind,
        }
    }

    #[test]
    fn test_rule_table_examples() {
        assert_eq!(
            resolve_encounter(ObstacleKind::Water, GestureLabel::Swimming),
            Outcome::Cleared
        );
        assert_eq!(
            resolve_encounter(ObstacleKind::Water, GestureLabel::Clap),
            Outcome::Failed
        );
        assert_eq!(
            resolve_encounter(ObstacleKind::Dragon, GestureLabel::Clap),
            Outcome::Cleared
        );
        assert_eq!(
            resolve_encounter(ObstacleKind::Person, GestureLabel::Flying),
            Outcome::Failed
        );
    }

    #[test]
    fn test_rule_table_exhaustive() {
        let expected: HashMap<ObstacleKind, Vec<GestureLabel>> = HashMap::from([
            (ObstacleKind::Person, vec![GestureLabel::HandsOnHead]),
            (
                ObstacleKind::Grass,
                vec![GestureLabel::Cutting, GestureLabel::Flying],
            ),
            (ObstacleKind::Block, vec![GestureLabel::Flying]),
            (ObstacleKind::Hole, vec![GestureLabel::Flying]),
            (ObstacleKind::Water, vec![GestureLabel::Swimming]),
            (ObstacleKind::Dragon, vec![GestureLabel::Clap]),
        ]);

        let listed: usize = expected.values().map(Vec::len).sum();
        assert_eq!(encounter_rules().len(), listed);

        for kind in ObstacleKind::ALL {
            for gesture in GestureLabel::ALL {
                let clears = expected[&kind].contains(&gesture);
                let outcome = resolve_encounter(kind, gesture);
                assert_eq!(
                    outcome == Outcome::Cleared,
                    clears,
                    "{kind} vs {gesture} resolved to {outcome}"
                );
            }
        }
    }

    #[test]
    fn test_none_gesture_never_clears() {
        for kind in ObstacleKind::ALL {
            assert_eq!(resolve_encounter(kind, GestureLabel::None), Outcome::Failed);
        }
    }

    #[test]
    fn test_clearing_gestures() {
        assert_eq!(
            clearing_gestures(ObstacleKind::Grass),
            vec![GestureLabel::Cutting, GestureLabel::Flying]
        );
    }

    #[test]
    fn test_repeated_collision_resolves_once() {
        let mut resolver = EncounterResolver::new();
        let water = obstacle(ObstacleKind::Water);
        resolver.begin_encounter(water);
        resolver.observe_gesture(GestureLabel::Swimming);

        let first = resolver.on_collision(water.id).unwrap();
        assert_eq!(first.outcome, Outcome::Cleared);
        assert!(resolver.on_collision(water.id).is_none());
        assert_eq!(resolver.state(), GameState::Playing);
    }

    #[test]
    fn test_repeated_failing_collision_transitions_once() {
        let mut resolver = EncounterResolver::new();
        let dragon = obstacle(ObstacleKind::Dragon);
        resolver.begin_encounter(dragon);
        resolver.observe_gesture(GestureLabel::Swimming);

        let outcomes: Vec<_> = (0..2).filter_map(|_| resolver.on_collision(dragon.id)).collect();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].outcome, Outcome::Failed);
        assert!(resolver.is_game_over());
    }

    #[test]
    fn test_uses_latest_gesture() {
        let mut resolver = EncounterResolver::new();
        let person = obstacle(ObstacleKind::Person);
        resolver.begin_encounter(person);
        resolver.observe_gesture(GestureLabel::Clap);
        resolver.observe_gesture(GestureLabel::HandsOnHead);

        let resolution = resolver.on_collision(person.id).unwrap();
        assert_eq!(resolution.gesture, GestureLabel::HandsOnHead);
        assert_eq!(resolution.outcome, Outcome::Cleared);
    }

    #[test]
    fn test_stale_collision_ignored() {
        let mut resolver = EncounterResolver::new();
        let first = obstacle(ObstacleKind::Hole);
        let second = obstacle(ObstacleKind::Water);
        resolver.begin_encounter(first);
        resolver.begin_encounter(second);

        assert!(resolver.on_collision(first.id).is_none());
        assert!(!resolver.is_resolved());
    }

    #[test]
    fn test_no_encounters_after_game_over() {
        let mut resolver = EncounterResolver::new();
        let block = obstacle(ObstacleKind::Block);
        resolver.begin_encounter(block);
        resolver.on_collision(block.id);
        assert!(resolver.is_game_over());

        let water = obstacle(ObstacleKind::Water);
        resolver.begin_encounter(water);
        resolver.observe_gesture(GestureLabel::Swimming);
        assert!(resolver.on_collision(water.id).is_none());
        assert!(resolver.is_game_over());
    }

    #[test]
    fn test_new_obstacle_rearms_resolver() {
        let mut resolver = EncounterResolver::new();
        resolver.observe_gesture(GestureLabel::Clap);

        let first = obstacle(ObstacleKind::Dragon);
        resolver.begin_encounter(first);
        assert!(resolver.on_collision(first.id).is_some());

        let second = obstacle(ObstacleKind::Dragon);
        resolver.begin_encounter(second);
        assert!(resolver.on_collision(second.id).is_some());
    }
}
