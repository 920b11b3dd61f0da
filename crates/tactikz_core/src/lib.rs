//! # tactikz_core - Timeline and Tactical-State Engine
//!
//! Turns raw football tracking data (frames at 25Hz plus a sparse event
//! log) into an interactive timeline: interpolated tactical state at any
//! instant, derived overlays (offside lines, speed vectors, team shape,
//! carrier pressure), playback with event-crossing notifications, drawable
//! annotations, what-if simulation branches and camera framing intents.
//!
//! ## Features
//! - Arbitrary-time queries over immutable frame/event stores
//! - Deterministic: same data + same query = same answer, no hidden state
//! - Single synchronous controller drives the whole per-tick pipeline
//! - Host-agnostic: all outputs are plain serializable values

pub mod annotate;
pub mod branch;
pub mod camera;
pub mod error;
pub mod interp;
pub mod model;
pub mod overlay;
pub mod pitch;
pub mod store;
pub mod timeline;

#[cfg(test)]
pub(crate) mod testutil;

pub use annotate::{Anchor, Annotation, AnnotationKind, AnnotationLayer};
pub use branch::{Move, MoveKind, PathPoint, SimulationBranch};
pub use camera::{CameraIntent, CameraMode};
pub use error::{EngineError, Result};
pub use model::{
    CardType, EntityId, EntityState, Event, EventKind, Frame, KitColors, MatchInfo, PlayerEntry,
    RestartKind, Roster, Sample, TacticalState, Team, TeamSheet, Timestamp, BALL_ID,
};
pub use overlay::{CarrierPressure, DerivedOverlay, OffsideLine, SpeedVector, TeamZone};
pub use pitch::AttackingSide;
pub use store::{EventLog, FrameStore, MatchData};
pub use timeline::{PlaybackStatus, TickOutput, TimelineController};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{goal_at, info, simple_match, simple_roster};

    // End-to-end pass over the public surface: load, scrub, play out, read
    // every per-tick product.
    #[test]
    fn test_full_session_pipeline() {
        let base = simple_match(250, 0.04);
        let mut controller = TimelineController::new();
        controller
            .load(
                base.info.clone(),
                base.roster.clone(),
                base.frames().frames().to_vec(),
                vec![goal_at(5.0, Team::Home)],
            )
            .unwrap();

        controller.seek(2.0).unwrap();
        controller.play().unwrap();
        controller.set_rate(4.0);

        let output = controller.tick(1.0).unwrap();
        assert!((output.t - 6.0).abs() < 1e-9);
        assert_eq!(output.notifications.len(), 1);
        assert!(matches!(output.notifications[0].kind, EventKind::Goal));
        assert!(output.state.ball().is_some());
        assert!(!output.overlay.speed_vectors.is_empty());
        assert!(output.camera.is_some());
    }

    #[test]
    fn test_queries_are_deterministic() {
        let data = simple_match(100, 0.04);
        let a = serde_json::to_string(&data.state_at(1.234).unwrap()).unwrap();
        let b = serde_json::to_string(&data.state_at(1.234).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_load_rejects_event_outside_coverage() {
        let base = simple_match(10, 0.04);
        let result = MatchData::load(
            info(),
            simple_roster(),
            base.frames().frames().to_vec(),
            vec![goal_at(99.0, Team::Home)],
        );
        assert!(matches!(result, Err(EngineError::MalformedData(_))));
    }
}
