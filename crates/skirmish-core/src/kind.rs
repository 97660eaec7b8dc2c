//! Tags that classify entities and the states they move through.
//!
//! - [`EntityKind`] is fixed at spawn and drives collision dispatch.
//! - [`LifecycleState`] is the animation-facing state every entity carries and
//!   the authoritative alive/engaged flag.
//! - [`AiState`] is the behaviour classification of an
//!   [`EnemyAgent`](crate::enemy::EnemyAgent), correlated with but independent
//!   of its lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// Entity category, used by collision handlers to decide how to react.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Player,
    Enemy,
    Wall,
    Obstacle,
    /// Anything the core has no dispatch rule for (pickups, triggers, ...).
    Other(String),
}

impl EntityKind {
    /// Static environment geometry.
    pub fn is_environment(&self) -> bool {
        matches!(self, EntityKind::Wall | EntityKind::Obstacle)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Player => f.write_str("player"),
            EntityKind::Enemy => f.write_str("enemy"),
            EntityKind::Wall => f.write_str("wall"),
            EntityKind::Obstacle => f.write_str("obstacle"),
            EntityKind::Other(name) => f.write_str(name),
        }
    }
}

// ---------------------------------------------------------------------------
// LifecycleState
// ---------------------------------------------------------------------------

/// Lifecycle of every entity. `Dead` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Idle,
    Moving,
    Attacking,
    Dead,
}

impl LifecycleState {
    /// Whether this is the terminal state.
    #[inline]
    pub fn is_dead(self) -> bool {
        self == LifecycleState::Dead
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Moving => "moving",
            LifecycleState::Attacking => "attacking",
            LifecycleState::Dead => "dead",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// AiState
// ---------------------------------------------------------------------------

/// Distance-based behaviour band of an enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiState {
    #[default]
    Idle,
    Chasing,
    Attacking,
}

impl fmt::Display for AiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AiState::Idle => "idle",
            AiState::Chasing => "chasing",
            AiState::Attacking => "attacking",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display_matches_collision_tags() {
        assert_eq!(EntityKind::Player.to_string(), "player");
        assert_eq!(EntityKind::Wall.to_string(), "wall");
        assert_eq!(EntityKind::Other("coin".to_owned()).to_string(), "coin");
    }

    #[test]
    fn environment_kinds() {
        assert!(EntityKind::Wall.is_environment());
        assert!(EntityKind::Obstacle.is_environment());
        assert!(!EntityKind::Enemy.is_environment());
    }

    #[test]
    fn states_default_to_idle() {
        assert_eq!(LifecycleState::default(), LifecycleState::Idle);
        assert_eq!(AiState::default(), AiState::Idle);
        assert!(LifecycleState::Dead.is_dead());
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&EntityKind::Obstacle).unwrap();
        assert_eq!(json, "\"obstacle\"");
        let back: EntityKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EntityKind::Obstacle);
    }
}
