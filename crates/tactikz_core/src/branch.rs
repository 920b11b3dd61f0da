//! Simulation branch: forked, editable alternate timeline
//!
//! A branch captures the tactical state at a divergence instant and layers
//! user-authored moves on top of it (snapshot plus delta, not a deep copy
//! per edit). Branch time is relative: `state_at(0.0)` is exactly the
//! captured state, and every later instant is re-derived from base plus the
//! moves active at that offset. The recorded EventLog is never consulted
//! inside a branch; hypothetical play has no recorded events.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::annotate::AnnotationLayer;
use crate::error::{EngineError, Result};
use crate::interp::ORIENTATION_SPEED_FLOOR;
use crate::model::{EntityId, TacticalState, Timestamp, BALL_ID};
use crate::store::MatchData;

/// Default playable window of a branch (seconds) when no move extends past
/// it. Matches the default preview interval of the timeline UI.
pub const DEFAULT_WINDOW_SECS: f64 = 10.0;

/// Kind of a user-authored move. Runs and dribbles are capped at plausible
/// player speeds: a mover that cannot cover its path in the allotted time
/// covers what it can at the cap and stops short. Passes model the ball
/// and are uncapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    Run,
    Dribble,
    Pass,
}

impl MoveKind {
    /// Maximum plausible speed in m/s, or `None` for uncapped.
    pub fn speed_cap(self) -> Option<f32> {
        match self {
            MoveKind::Run => Some(8.0),
            MoveKind::Dribble => Some(4.0),
            MoveKind::Pass => None,
        }
    }
}

/// One waypoint of a move path: seconds since the move started, position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub offset: f64,
    pub position: Point2<f32>,
}

impl PathPoint {
    pub fn new(offset: f64, x: f32, y: f32) -> Self {
        Self { offset, position: Point2::new(x, y) }
    }
}

/// A directed path for one entity, starting at a relative offset from the
/// branch divergence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub entity: EntityId,
    pub kind: MoveKind,
    pub start_offset: f64,
    path: Vec<PathPoint>,
}

impl Move {
    /// Seconds the path nominally takes.
    pub fn duration(&self) -> f64 {
        self.path.last().map(|p| p.offset).unwrap_or(0.0)
    }

    /// Total polyline length in meters.
    pub fn length(&self) -> f32 {
        self.path
            .windows(2)
            .map(|pair| (pair[1].position - pair[0].position).norm())
            .sum()
    }

    fn end_position(&self) -> Point2<f32> {
        self.path[self.path.len() - 1].position
    }

    fn capped(&self) -> Option<f32> {
        let cap = self.kind.speed_cap()?;
        let duration = self.duration();
        if duration <= 0.0 {
            return None;
        }
        let nominal = self.length() / duration as f32;
        (nominal > cap).then_some(cap)
    }

    /// Position and velocity `elapsed` seconds into the move, using the
    /// same piecewise-linear blending rule as the interpolator. Past the
    /// end the mover rests at its final reachable point.
    fn sample(&self, elapsed: f64) -> (Point2<f32>, Vector2<f32>) {
        if elapsed <= 0.0 {
            return (self.path[0].position, Vector2::zeros());
        }
        match self.capped() {
            Some(cap) => self.sample_by_arc_length(cap * elapsed as f32, cap),
            None => self.sample_by_time(elapsed),
        }
    }

    fn sample_by_time(&self, elapsed: f64) -> (Point2<f32>, Vector2<f32>) {
        if elapsed >= self.duration() {
            return (self.end_position(), Vector2::zeros());
        }
        for pair in self.path.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if elapsed < b.offset {
                let span = b.offset - a.offset;
                let fraction = ((elapsed - a.offset) / span) as f32;
                let delta = b.position - a.position;
                let position = Point2::from(a.position.coords + delta * fraction);
                let velocity = delta / span as f32;
                return (position, velocity);
            }
        }
        (self.end_position(), Vector2::zeros())
    }

    fn sample_by_arc_length(&self, distance: f32, cap: f32) -> (Point2<f32>, Vector2<f32>) {
        let mut remaining = distance;
        for pair in self.path.windows(2) {
            let delta = pair[1].position - pair[0].position;
            let segment = delta.norm();
            if remaining < segment {
                let direction = delta / segment;
                let position = Point2::from(pair[0].position.coords + direction * remaining);
                return (position, direction * cap);
            }
            remaining -= segment;
        }
        (self.end_position(), Vector2::zeros())
    }

    /// Whether the mover has reached its final reachable point by `elapsed`.
    fn completed(&self, elapsed: f64) -> bool {
        match self.capped() {
            Some(cap) => cap * (elapsed as f32) >= self.length(),
            None => elapsed >= self.duration(),
        }
    }
}

/// A forked hypothetical timeline, owned exclusively by the session. At
/// most one branch is active at a time; starting a new one discards the
/// old branch unless an external collaborator persisted it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationBranch {
    divergence: Timestamp,
    base: TacticalState,
    moves: Vec<Move>,
    /// Player nearest the ball at divergence; the free ball shadows this
    /// entity's displacement until a pass move takes over.
    carrier: Option<EntityId>,
    pub annotations: AnnotationLayer,
}

impl SimulationBranch {
    /// Fork the recorded timeline at `t`.
    pub fn fork(data: &MatchData, t: Timestamp) -> Result<Self> {
        let base = data.state_at(t).map_err(|e| match e {
            EngineError::OutOfRange { t, start, end } => EngineError::NoActiveTimeline(format!(
                "cannot fork at t={t:.3}, outside [{start:.3}, {end:.3}]"
            )),
            other => other,
        })?;
        debug!(t, entities = base.entities.len(), "simulation branch forked");
        Ok(Self::from_state(t, base))
    }

    /// Fork from within this branch: the state at `rel_t` becomes the new
    /// base.
    pub fn refork(&self, rel_t: f64) -> SimulationBranch {
        Self::from_state(self.divergence + rel_t, self.state_at(rel_t))
    }

    fn from_state(divergence: Timestamp, base: TacticalState) -> Self {
        let carrier = nearest_player_to_ball(&base);
        Self { divergence, base, moves: Vec::new(), carrier, annotations: AnnotationLayer::new() }
    }

    pub fn divergence(&self) -> Timestamp {
        self.divergence
    }

    pub fn base(&self) -> &TacticalState {
        &self.base
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Playable window: at least the default, extended by the last move.
    pub fn duration(&self) -> f64 {
        self.moves
            .iter()
            .map(|m| m.start_offset + m.duration())
            .fold(DEFAULT_WINDOW_SECS, f64::max)
    }

    /// Append a directed path for an entity. The path must hold at least
    /// two waypoints with strictly increasing offsets starting at zero,
    /// and the entity must exist in the captured state.
    pub fn apply_move(
        &mut self,
        entity: EntityId,
        kind: MoveKind,
        start_offset: f64,
        path: Vec<PathPoint>,
    ) -> Result<()> {
        if self.base.entity(entity).is_none() {
            return Err(EngineError::MalformedData(format!(
                "move references entity {entity} not present at divergence"
            )));
        }
        if path.len() < 2 {
            return Err(EngineError::MalformedData(
                "move path needs at least two waypoints".to_string(),
            ));
        }
        if start_offset < 0.0 || path[0].offset != 0.0 {
            return Err(EngineError::MalformedData(
                "move must start at a non-negative offset with a zero-offset waypoint".to_string(),
            ));
        }
        for pair in path.windows(2) {
            if pair[1].offset <= pair[0].offset {
                return Err(EngineError::MalformedData(
                    "move waypoint offsets must be strictly increasing".to_string(),
                ));
            }
        }
        debug!(entity, ?kind, start_offset, waypoints = path.len(), "move applied to branch");
        self.moves.push(Move { entity, kind, start_offset, path });
        Ok(())
    }

    /// Branch state at `rel_t` seconds after divergence. Never fails:
    /// negative offsets clamp to the divergence snapshot.
    pub fn state_at(&self, rel_t: f64) -> TacticalState {
        if rel_t <= 0.0 {
            return self.base.clone();
        }
        let mut state = self.base.clone();
        state.t = rel_t;

        for (&id, entity) in state.entities.iter_mut() {
            if id == BALL_ID {
                continue;
            }
            if let Some((position, velocity)) = self.moved_position(id, rel_t) {
                entity.position = position;
                entity.velocity = velocity;
                entity.speed = velocity.norm();
                if entity.speed >= ORIENTATION_SPEED_FLOOR {
                    entity.orientation = Some(velocity.y.atan2(velocity.x));
                }
            }
        }

        if let Some((position, velocity)) = self.ball_position(rel_t, &state) {
            if let Some(ball) = state.entities.get_mut(&BALL_ID) {
                ball.position = position;
                ball.velocity = velocity;
                ball.speed = velocity.norm();
            }
        }
        state
    }

    /// Last applied move for `id` active at `rel_t`, sampled. Later moves
    /// shadow earlier ones for the same entity.
    fn active_move(&self, id: EntityId, rel_t: f64) -> Option<&Move> {
        self.moves.iter().rev().find(|m| m.entity == id && m.start_offset <= rel_t)
    }

    fn moved_position(&self, id: EntityId, rel_t: f64) -> Option<(Point2<f32>, Vector2<f32>)> {
        let mv = self.active_move(id, rel_t)?;
        Some(mv.sample(rel_t - mv.start_offset))
    }

    /// Simulated position of a single player at `rel_t` (base position when
    /// no move applies).
    fn player_position(&self, id: EntityId, rel_t: f64) -> Option<Point2<f32>> {
        let base = self.base.entity(id)?;
        Some(self.moved_position(id, rel_t).map(|(p, _)| p).unwrap_or(base.position))
    }

    /// Ball placement: an explicit ball move wins while active; after it
    /// completes the ball re-attaches to the player nearest its arrival
    /// point. With no ball move, the ball shadows the divergence carrier's
    /// displacement, which keeps `state_at` continuous at zero.
    fn ball_position(
        &self,
        rel_t: f64,
        current: &TacticalState,
    ) -> Option<(Point2<f32>, Vector2<f32>)> {
        let base_ball = self.base.entity(BALL_ID)?;
        if let Some(mv) = self.active_move(BALL_ID, rel_t) {
            let elapsed = rel_t - mv.start_offset;
            if !mv.completed(elapsed) {
                return Some(mv.sample(elapsed));
            }
            // Pass arrived: stick to the receiver from the arrival point on.
            let arrival = mv.end_position();
            let arrival_t = mv.start_offset + mv.duration();
            let receiver = self.nearest_player_to(arrival, arrival_t)?;
            let receiver_then = self.player_position(receiver, arrival_t)?;
            let receiver_now = self.player_position(receiver, rel_t)?;
            let position = Point2::from(arrival.coords + (receiver_now - receiver_then));
            let velocity = current.entity(receiver).map(|e| e.velocity).unwrap_or_else(Vector2::zeros);
            return Some((position, velocity));
        }
        let carrier = self.carrier?;
        let carrier_base = self.base.entity(carrier)?.position;
        let carrier_now = self.player_position(carrier, rel_t)?;
        let position = Point2::from(base_ball.position.coords + (carrier_now - carrier_base));
        let velocity = current.entity(carrier).map(|e| e.velocity).unwrap_or_else(Vector2::zeros);
        Some((position, velocity))
    }

    fn nearest_player_to(&self, point: Point2<f32>, rel_t: f64) -> Option<EntityId> {
        self.base
            .entities
            .keys()
            .filter(|&&id| id != BALL_ID)
            .filter_map(|&id| self.player_position(id, rel_t).map(|p| (id, p)))
            .min_by(|a, b| {
                let da = (a.1 - point).norm();
                let db = (b.1 - point).norm();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(id, _)| id)
    }
}

fn nearest_player_to_ball(state: &TacticalState) -> Option<EntityId> {
    let ball = state.ball()?;
    state
        .entities
        .iter()
        .filter(|(&id, _)| id != BALL_ID)
        .min_by(|a, b| {
            let da = (a.1.position - ball.position).norm();
            let db = (b.1.position - ball.position).norm();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(&id, _)| id)
}
