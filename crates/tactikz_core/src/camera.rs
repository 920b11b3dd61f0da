//! Camera intent resolution
//!
//! Pure function of tactical state + mode, recomputed every tick and never
//! retaining state across calls. The engine only recommends a framing; the
//! rendering surface owns the actual viewport and is free to ignore or
//! animate toward the intent.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::model::{Event, EventKind, RestartKind, TacticalState, BALL_ID};
use crate::pitch::{clamp_to_field, field, zones};

/// Players inside this radius of the ball count toward density zoom.
pub const DENSITY_RADIUS: f32 = 15.0;

/// Zoom bounds for ball-follow mode. 1.0 frames the full pitch.
pub const BALL_ZOOM_MIN: f32 = 1.2;
pub const BALL_ZOOM_MAX: f32 = 2.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    /// Follow the ball, zooming with local player density.
    Ball,
    /// Fixed framing keyed by the nearest preceding event kind.
    Preset,
    /// User-controlled viewport; the engine emits no intent.
    Free,
}

/// Recommended viewport: a center in pitch coordinates and a zoom factor
/// relative to the full-pitch framing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntent {
    pub center: Point2<f32>,
    pub zoom: f32,
    pub mode: CameraMode,
}

/// Resolve the camera intent for one tick. `None` in free mode or when the
/// state has nothing to frame (no ball tracked).
pub fn resolve(state: &TacticalState, mode: CameraMode) -> Option<CameraIntent> {
    match mode {
        CameraMode::Free => None,
        CameraMode::Ball => ball_intent(state),
        CameraMode::Preset => preset_intent(state),
    }
}

fn ball_intent(state: &TacticalState) -> Option<CameraIntent> {
    let ball = state.ball()?;
    let nearby = state
        .entities
        .iter()
        .filter(|(&id, _)| id != BALL_ID)
        .filter(|(_, e)| (e.position - ball.position).norm() <= DENSITY_RADIUS)
        .count();
    // Crowded ball -> pull back; isolated ball -> tighter framing.
    let zoom = (BALL_ZOOM_MAX - 0.15 * nearby as f32).clamp(BALL_ZOOM_MIN, BALL_ZOOM_MAX);
    let (x, y) = clamp_to_field(ball.position.x, ball.position.y);
    Some(CameraIntent { center: Point2::new(x, y), zoom, mode: CameraMode::Ball })
}

/// Set-piece framings keyed by the most recent restart-class event. The
/// pitch end is picked from where the ball currently is, which is where the
/// restart is being taken.
fn preset_intent(state: &TacticalState) -> Option<CameraIntent> {
    let ball = state.ball();
    let ball_x = ball.map(|b| b.position.x).unwrap_or(field::HALFWAY_X);
    let goal_x = if ball_x < field::HALFWAY_X { 0.0 } else { field::LENGTH_M };
    let penalty_spot_x = if goal_x == 0.0 {
        zones::PENALTY_SPOT_DIST
    } else {
        field::LENGTH_M - zones::PENALTY_SPOT_DIST
    };

    let intent = match state.last_restart.as_ref().map(restart_key) {
        Some(PresetKey::KickOff) => CameraIntent {
            center: Point2::new(field::HALFWAY_X, field::CENTER_Y),
            zoom: 1.6,
            mode: CameraMode::Preset,
        },
        Some(PresetKey::Corner) => {
            let ball_y = ball.map(|b| b.position.y).unwrap_or(field::CENTER_Y);
            let corner_y = if ball_y < field::CENTER_Y { 0.0 } else { field::WIDTH_M };
            CameraIntent {
                center: Point2::new((goal_x + penalty_spot_x) / 2.0, (corner_y + field::CENTER_Y) / 2.0),
                zoom: 2.0,
                mode: CameraMode::Preset,
            }
        }
        Some(PresetKey::PenaltyBox) => CameraIntent {
            center: Point2::new(penalty_spot_x, field::CENTER_Y),
            zoom: 2.0,
            mode: CameraMode::Preset,
        },
        Some(PresetKey::OpenPlay) | None => CameraIntent {
            center: Point2::new(field::HALFWAY_X, field::CENTER_Y),
            zoom: 1.0,
            mode: CameraMode::Preset,
        },
    };
    Some(intent)
}

enum PresetKey {
    KickOff,
    Corner,
    PenaltyBox,
    OpenPlay,
}

fn restart_key(event: &Event) -> PresetKey {
    match &event.kind {
        EventKind::KickOff => PresetKey::KickOff,
        EventKind::Restart { restart } => match restart {
            RestartKind::Corner => PresetKey::Corner,
            RestartKind::Penalty | RestartKind::GoalKick => PresetKey::PenaltyBox,
            RestartKind::FreeKick | RestartKind::ThrowIn => PresetKey::OpenPlay,
        },
        _ => PresetKey::OpenPlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Team;
    use crate::store::MatchData;
    use crate::testutil::{event_at, frame, info, simple_match, simple_roster};

    #[test]
    fn test_free_mode_emits_nothing() {
        let data = simple_match(5, 0.04);
        let state = data.state_at(0.0).unwrap();
        assert!(resolve(&state, CameraMode::Free).is_none());
    }

    #[test]
    fn test_ball_mode_centers_on_ball() {
        let data = simple_match(5, 0.04);
        let state = data.state_at(0.0).unwrap();
        let intent = resolve(&state, CameraMode::Ball).unwrap();
        assert!((intent.center.x - 52.5).abs() < 1e-4);
        assert!((intent.center.y - 34.0).abs() < 1e-4);
        assert!(intent.zoom >= BALL_ZOOM_MIN && intent.zoom <= BALL_ZOOM_MAX);
    }

    #[test]
    fn test_ball_mode_zoom_shrinks_with_density() {
        // Crowd five players around the ball vs. an empty neighborhood.
        let crowded = vec![
            frame(
                0.0,
                &[
                    (0, 50.0, 34.0, 0.0, 0.0),
                    (1, 51.0, 34.0, 0.0, 0.0),
                    (2, 49.0, 33.0, 0.0, 0.0),
                    (3, 52.0, 35.0, 0.0, 0.0),
                    (4, 48.0, 34.0, 0.0, 0.0),
                    (5, 50.0, 36.0, 0.0, 0.0),
                ],
            ),
            frame(
                1.0,
                &[
                    (0, 50.0, 34.0, 0.0, 0.0),
                    (1, 51.0, 34.0, 0.0, 0.0),
                    (2, 49.0, 33.0, 0.0, 0.0),
                    (3, 52.0, 35.0, 0.0, 0.0),
                    (4, 48.0, 34.0, 0.0, 0.0),
                    (5, 50.0, 36.0, 0.0, 0.0),
                ],
            ),
        ];
        let data = MatchData::load(info(), simple_roster(), crowded, vec![]).unwrap();
        let crowded_zoom =
            resolve(&data.state_at(0.0).unwrap(), CameraMode::Ball).unwrap().zoom;

        let sparse = simple_match(5, 0.04);
        let sparse_zoom =
            resolve(&sparse.state_at(0.0).unwrap(), CameraMode::Ball).unwrap().zoom;
        assert!(crowded_zoom < sparse_zoom);
    }

    #[test]
    fn test_preset_mode_keys_off_last_restart() {
        let base = simple_match(100, 0.1);
        let events = vec![event_at(0.0, EventKind::KickOff, None)];
        let data = MatchData::load(
            base.info.clone(),
            base.roster.clone(),
            base.frames().frames().to_vec(),
            events,
        )
        .unwrap();
        let state = data.state_at(1.0).unwrap();
        let intent = resolve(&state, CameraMode::Preset).unwrap();
        assert!((intent.center.x - field::HALFWAY_X).abs() < 1e-4);
        assert!((intent.zoom - 1.6).abs() < 1e-4);
    }

    #[test]
    fn test_preset_corner_frames_near_goal() {
        let base = simple_match(100, 0.1);
        let events = vec![event_at(
            0.0,
            EventKind::Restart { restart: RestartKind::Corner },
            Some(Team::Home),
        )];
        let data = MatchData::load(
            base.info.clone(),
            base.roster.clone(),
            base.frames().frames().to_vec(),
            events,
        )
        .unwrap();
        // Ball drifts right from 52.5 in the fixture, so the right goal is
        // chosen once past halfway.
        let state = data.state_at(2.0).unwrap();
        let intent = resolve(&state, CameraMode::Preset).unwrap();
        assert!(intent.center.x > field::HALFWAY_X);
        assert_eq!(intent.zoom, 2.0);
    }
}
