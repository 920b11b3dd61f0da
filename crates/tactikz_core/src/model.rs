//! Core data model: timestamps, entities, frames, events, rosters
//!
//! The engine is format-agnostic: a conforming loader produces these types
//! from whatever provider format it ingests and hands them to
//! [`crate::store::MatchData::load`]. Everything here is immutable after
//! load except the annotation and branch layers, which live elsewhere.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::pitch::AttackingSide;

/// Match-clock seconds. Monotonic across the whole match, possibly with
/// gaps between periods. The sole alignment key for frames, events and
/// annotations.
pub type Timestamp = f64;

/// Stable entity identity for the whole match. Player entities for a
/// team slot are distinct before and after a substitution.
pub type EntityId = u32;

/// Reserved entity id for the ball.
pub const BALL_ID: EntityId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Home,
    Away,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::Home => Team::Away,
            Team::Away => Team::Home,
        }
    }
}

/// Kit colors as hex strings, carried as metadata for the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitColors {
    pub main: String,
    pub secondary: String,
    pub number: String,
}

impl Default for KitColors {
    fn default() -> Self {
        Self {
            main: "#FFFFFF".to_string(),
            secondary: "#CCCCCC".to_string(),
            number: "#000000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub id: EntityId,
    pub team: Team,
    pub shirt_number: u8,
    pub name: String,
    pub goalkeeper: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSheet {
    pub name: String,
    /// Side this team attacks toward in the first period. Sides swap at
    /// each subsequent kick-off.
    pub first_period_side: AttackingSide,
    #[serde(default)]
    pub colors: KitColors,
}

/// Both team sheets plus every player entity that appears in the match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    pub home: TeamSheet,
    pub away: TeamSheet,
    pub players: Vec<PlayerEntry>,
}

impl Roster {
    pub fn player(&self, id: EntityId) -> Option<&PlayerEntry> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        id == BALL_ID || self.player(id).is_some()
    }

    pub fn team_players(&self, team: Team) -> impl Iterator<Item = &PlayerEntry> {
        self.players.iter().filter(move |p| p.team == team)
    }

    pub fn sheet(&self, team: Team) -> &TeamSheet {
        match team {
            Team::Home => &self.home,
            Team::Away => &self.away,
        }
    }

    /// Attacking side of `team` in period `period` (1-based). Sides
    /// alternate from the first-period side at every kick-off.
    pub fn attacking_side(&self, team: Team, period: u8) -> AttackingSide {
        let base = self.sheet(team).first_period_side;
        if period.max(1) % 2 == 1 {
            base
        } else {
            base.flipped()
        }
    }
}

/// Match metadata. Not consulted by the engine logic; carried through for
/// hosts that want to display it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchInfo {
    pub match_id: String,
    pub date: DateTime<Utc>,
    pub home_name: String,
    pub away_name: String,
}

/// One raw tracking sample for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub position: Point2<f32>,
    pub velocity: Vector2<f32>,
}

impl Sample {
    pub fn new(x: f32, y: f32, vx: f32, vy: f32) -> Self {
        Self { position: Point2::new(x, y), velocity: Vector2::new(vx, vy) }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.norm()
    }
}

/// One sampled instant of raw tracking data for all entities observed at
/// that instant. Entities with tracking gaps are simply absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub t: Timestamp,
    samples: BTreeMap<EntityId, Sample>,
}

impl Frame {
    /// Build a frame from raw samples, rejecting duplicate entity ids.
    pub fn new(t: Timestamp, samples: Vec<(EntityId, Sample)>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for (id, sample) in samples {
            if map.insert(id, sample).is_some() {
                return Err(EngineError::MalformedData(format!(
                    "duplicate entity {id} in frame at t={t:.3}"
                )));
            }
        }
        Ok(Self { t, samples: map })
    }

    pub fn sample(&self, id: EntityId) -> Option<&Sample> {
        self.samples.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.samples.contains_key(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Sample)> {
        self.samples.iter().map(|(id, s)| (*id, s))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Yellow,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartKind {
    FreeKick,
    Corner,
    ThrowIn,
    GoalKick,
    Penalty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    KickOff,
    Goal,
    Card { card: CardType },
    Substitution { off: EntityId, on: EntityId },
    Restart { restart: RestartKind },
}

/// A discrete match event anchored to the frame timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub t: Timestamp,
    #[serde(flatten)]
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<EntityId>,
}

impl Event {
    /// Restart-class events reset the phase of play; the most recent one is
    /// carried in the tactical state and keys camera presets.
    pub fn is_restart(&self) -> bool {
        matches!(self.kind, EventKind::KickOff | EventKind::Restart { .. })
    }
}

/// Instantaneous derived kinematics for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub position: Point2<f32>,
    pub velocity: Vector2<f32>,
    /// Scalar speed in m/s.
    pub speed: f32,
    /// Facing direction in radians, derived from velocity. `None` when the
    /// entity has been stationary for the whole orientation lookback window.
    pub orientation: Option<f32>,
}

/// The instantaneous snapshot the interpolator produces for an arbitrary
/// query time. Ephemeral: recomputed per query, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TacticalState {
    pub t: Timestamp,
    pub entities: BTreeMap<EntityId, EntityState>,
    /// 1-based period number (kick-off count at or before `t`).
    pub period: u8,
    /// Most recent restart-class event at or before `t`.
    pub last_restart: Option<Event>,
    /// Running score `(home, away)` at `t`.
    pub score: (u8, u8),
}

impl TacticalState {
    pub fn entity(&self, id: EntityId) -> Option<&EntityState> {
        self.entities.get(&id)
    }

    pub fn ball(&self) -> Option<&EntityState> {
        self.entities.get(&BALL_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::AttackingSide;

    #[test]
    fn test_frame_rejects_duplicate_entity() {
        let samples =
            vec![(7, Sample::new(1.0, 2.0, 0.0, 0.0)), (7, Sample::new(3.0, 4.0, 0.0, 0.0))];
        let err = Frame::new(0.0, samples).unwrap_err();
        assert!(matches!(err, EngineError::MalformedData(_)));
    }

    #[test]
    fn test_attacking_side_alternates_by_period() {
        let roster = Roster {
            home: TeamSheet {
                name: "Home".into(),
                first_period_side: AttackingSide::Right,
                colors: KitColors::default(),
            },
            away: TeamSheet {
                name: "Away".into(),
                first_period_side: AttackingSide::Left,
                colors: KitColors::default(),
            },
            players: vec![],
        };
        assert_eq!(roster.attacking_side(Team::Home, 1), AttackingSide::Right);
        assert_eq!(roster.attacking_side(Team::Home, 2), AttackingSide::Left);
        assert_eq!(roster.attacking_side(Team::Away, 2), AttackingSide::Right);
        // Period 0 is treated as the first period.
        assert_eq!(roster.attacking_side(Team::Home, 0), AttackingSide::Right);
    }

    #[test]
    fn test_event_restart_classification() {
        let kick_off = Event { t: 0.0, kind: EventKind::KickOff, team: None, player: None };
        let goal = Event { t: 10.0, kind: EventKind::Goal, team: Some(Team::Home), player: None };
        let corner = Event {
            t: 20.0,
            kind: EventKind::Restart { restart: RestartKind::Corner },
            team: Some(Team::Away),
            player: None,
        };
        assert!(kick_off.is_restart());
        assert!(!goal.is_restart());
        assert!(corner.is_restart());
    }

    #[test]
    fn test_event_serde_tagging() {
        let event = Event {
            t: 12.5,
            kind: EventKind::Card { card: CardType::Yellow },
            team: Some(Team::Away),
            player: Some(14),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "card");
        assert_eq!(json["card"], "yellow");
        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
