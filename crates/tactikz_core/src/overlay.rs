//! Derived tactical overlays
//!
//! Pure functions from a [`TacticalState`] to renderable geometry. All
//! outputs are deterministic and re-derivable from the same state; there is
//! no cache hiding behind any of them. Degenerate inputs (too few
//! defenders, missing ball) silently omit the affected artifact instead of
//! erroring, so a mid-substitution glitch never interrupts playback.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::model::{EntityId, EntityState, Roster, TacticalState, Team, BALL_ID};
use crate::pitch::field;

/// Speeds below this (m/s) emit no speed vector.
pub const SPEED_VECTOR_FLOOR: f32 = 0.5;

/// Meters of travel per m/s of speed when scaling a speed vector.
pub const SPEED_VECTOR_SCALE: f32 = 1.0;

/// A player further than this from the ball (meters) is not the carrier.
pub const CARRIER_MAX_DIST: f32 = 2.0;

/// Opponent distance (meters) at which pressure on the carrier reaches 0.
pub const PRESSURE_RADIUS: f32 = 8.0;

/// Offside line for one defending team: a segment across the pitch width
/// at the depth of its second-deepest outfield defender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsideLine {
    pub team: Team,
    pub depth_x: f32,
    pub from: Point2<f32>,
    pub to: Point2<f32>,
}

/// Scaled velocity arrow for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedVector {
    pub entity: EntityId,
    pub from: Point2<f32>,
    pub to: Point2<f32>,
    pub speed: f32,
}

/// Convex hull of a team's outfield players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamZone {
    pub team: Team,
    pub hull: Vec<Point2<f32>>,
}

/// Pressure exerted on the current ball carrier, 0 (free) to 1 (smothered).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarrierPressure {
    pub carrier: EntityId,
    pub value: f32,
}

/// Geometry derived from one tactical state. Ephemeral.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DerivedOverlay {
    pub offside_lines: Vec<OffsideLine>,
    pub speed_vectors: Vec<SpeedVector>,
    pub zones: Vec<TeamZone>,
    pub pressure: Option<CarrierPressure>,
}

/// Compute every overlay artifact for a state.
pub fn overlay(state: &TacticalState, roster: &Roster) -> DerivedOverlay {
    let mut out = DerivedOverlay::default();
    for team in [Team::Home, Team::Away] {
        if let Some(line) = offside_line(state, roster, team) {
            out.offside_lines.push(line);
        }
        if let Some(zone) = team_zone(state, roster, team) {
            out.zones.push(zone);
        }
    }
    out.speed_vectors = speed_vectors(state);
    out.pressure = carrier_pressure(state, roster);
    out
}

/// Outfield players of `team` present in the state.
fn outfield_states<'a>(
    state: &'a TacticalState,
    roster: &'a Roster,
    team: Team,
) -> impl Iterator<Item = (EntityId, &'a EntityState)> {
    roster
        .team_players(team)
        .filter(|p| !p.goalkeeper)
        .filter_map(|p| state.entity(p.id).map(|e| (p.id, e)))
}

/// Offside line for `team` as the defending side, or `None` when fewer
/// than two outfield defenders are on the pitch.
pub fn offside_line(state: &TacticalState, roster: &Roster, team: Team) -> Option<OffsideLine> {
    let own_goal_x = roster.attacking_side(team, state.period).own_goal_x();
    let mut xs: Vec<f32> = outfield_states(state, roster, team).map(|(_, e)| e.position.x).collect();
    if xs.len() < 2 {
        return None;
    }
    // Second defender toward the own goal line.
    xs.sort_by(|a, b| {
        let da = (a - own_goal_x).abs();
        let db = (b - own_goal_x).abs();
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });
    let depth_x = xs[1];
    Some(OffsideLine {
        team,
        depth_x,
        from: Point2::new(depth_x, 0.0),
        to: Point2::new(depth_x, field::WIDTH_M),
    })
}

/// One arrow per entity moving faster than the floor.
pub fn speed_vectors(state: &TacticalState) -> Vec<SpeedVector> {
    state
        .entities
        .iter()
        .filter(|(_, e)| e.speed >= SPEED_VECTOR_FLOOR)
        .map(|(id, e)| SpeedVector {
            entity: *id,
            from: e.position,
            to: e.position + e.velocity * SPEED_VECTOR_SCALE,
            speed: e.speed,
        })
        .collect()
}

/// Convex hull of a team's outfield players; `None` below three points.
pub fn team_zone(state: &TacticalState, roster: &Roster, team: Team) -> Option<TeamZone> {
    let points: Vec<Point2<f32>> =
        outfield_states(state, roster, team).map(|(_, e)| e.position).collect();
    let hull = convex_hull(points);
    (hull.len() >= 3).then_some(TeamZone { team, hull })
}

/// Pressure from the nearest opponent on whoever carries the ball.
pub fn carrier_pressure(state: &TacticalState, roster: &Roster) -> Option<CarrierPressure> {
    let ball = state.ball()?;
    let (carrier, carrier_state, carrier_team) = roster
        .players
        .iter()
        .filter_map(|p| state.entity(p.id).map(|e| (p.id, e, p.team)))
        .min_by(|a, b| {
            let da = (a.1.position - ball.position).norm();
            let db = (b.1.position - ball.position).norm();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })?;
    if (carrier_state.position - ball.position).norm() > CARRIER_MAX_DIST {
        return None;
    }
    let nearest_opponent = roster
        .team_players(carrier_team.opponent())
        .filter_map(|p| state.entity(p.id))
        .map(|e| (e.position - carrier_state.position).norm())
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))?;
    let value = (1.0 - nearest_opponent / PRESSURE_RADIUS).clamp(0.0, 1.0);
    Some(CarrierPressure { carrier, value })
}

/// Andrew's monotone chain. Returns the hull counter-clockwise; collinear
/// interior points are dropped.
fn convex_hull(mut points: Vec<Point2<f32>>) -> Vec<Point2<f32>> {
    if points.len() < 3 {
        return points;
    }
    points.sort_by(|a, b| {
        (a.x, a.y).partial_cmp(&(b.x, b.y)).unwrap_or(std::cmp::Ordering::Equal)
    });
    points.dedup_by(|a, b| a == b);
    if points.len() < 3 {
        return points;
    }

    let cross = |o: &Point2<f32>, a: &Point2<f32>, b: &Point2<f32>| {
        (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
    };

    let mut lower: Vec<Point2<f32>> = Vec::with_capacity(points.len());
    for p in &points {
        while lower.len() >= 2 && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0.0
        {
            lower.pop();
        }
        lower.push(*p);
    }
    let mut upper: Vec<Point2<f32>> = Vec::with_capacity(points.len());
    for p in points.iter().rev() {
        while upper.len() >= 2 && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0.0
        {
            upper.pop();
        }
        upper.push(*p);
    }
    // Each chain ends on the other chain's starting point.
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}
