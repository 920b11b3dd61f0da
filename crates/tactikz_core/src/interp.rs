//! Frame interpolation: continuous tactical state from discrete samples
//!
//! Policy decisions, fixed up front rather than discovered per call site:
//! - A query that hits a stored frame exactly returns that frame verbatim.
//!   No blending, so sampled instants never accumulate interpolation error
//!   and event-anchored queries stay precise.
//! - Position is blended linearly by time fraction. Velocity is taken from
//!   the nearer-in-time frame: blending velocities across an arbitrary
//!   fraction is not physically meaningful.
//! - Orientation comes from velocity direction. Below
//!   [`ORIENTATION_SPEED_FLOOR`] the last non-degenerate sample within the
//!   lookback window is held, so stationary players do not flicker.
//! - An entity absent from either bracketing frame is excluded outright.
//!   Substitution boundaries get no synthetic interpolation.

use std::collections::BTreeMap;

use nalgebra::{Point2, Vector2};

use crate::error::Result;
use crate::model::{EntityId, EntityState, Frame, TacticalState, Timestamp};
use crate::store::MatchData;

/// Below this speed (m/s) velocity direction is considered degenerate and
/// the previous orientation is held.
pub const ORIENTATION_SPEED_FLOOR: f32 = 0.5;

/// How many frames back to search for a non-degenerate orientation sample
/// (10s at 25 fps). Past that the entity is reported with no orientation.
pub const ORIENTATION_LOOKBACK_FRAMES: usize = 250;

impl MatchData {
    /// Instantaneous tactical state at `t`. Fails with `OutOfRange` when
    /// `t` is outside frame coverage.
    pub fn state_at(&self, t: Timestamp) -> Result<TacticalState> {
        let floor_idx = self.frames().floor_index(t)?;
        let (floor, ceil) = self.frames().frame_at(t)?;

        let entities = if floor.t == t || std::ptr::eq(floor, ceil) {
            self.exact_frame_entities(floor, floor_idx)
        } else {
            self.blended_entities(floor, ceil, floor_idx, t)
        };

        Ok(TacticalState {
            t,
            entities,
            period: self.events().period_at(t),
            last_restart: self.events().last_restart_at_or_before(t).cloned(),
            score: self.events().score_at(t),
        })
    }

    fn exact_frame_entities(
        &self,
        frame: &Frame,
        frame_idx: usize,
    ) -> BTreeMap<EntityId, EntityState> {
        frame
            .entities()
            .map(|(id, sample)| {
                let speed = sample.speed();
                let orientation = self.orientation_for(id, sample.velocity, frame_idx);
                (
                    id,
                    EntityState {
                        position: sample.position,
                        velocity: sample.velocity,
                        speed,
                        orientation,
                    },
                )
            })
            .collect()
    }

    fn blended_entities(
        &self,
        floor: &Frame,
        ceil: &Frame,
        floor_idx: usize,
        t: Timestamp,
    ) -> BTreeMap<EntityId, EntityState> {
        let span = ceil.t - floor.t;
        let fraction = ((t - floor.t) / span) as f32;
        let nearer_is_ceil = (t - floor.t) > (ceil.t - t);

        floor
            .entities()
            .filter_map(|(id, lo)| {
                // Present in both bracketing frames or excluded.
                let hi = ceil.sample(id)?;
                let position = Point2::from(
                    lo.position.coords + (hi.position.coords - lo.position.coords) * fraction,
                );
                let velocity = if nearer_is_ceil { hi.velocity } else { lo.velocity };
                let speed = velocity.norm();
                let orientation = self.orientation_for(id, velocity, floor_idx);
                Some((id, EntityState { position, velocity, speed, orientation }))
            })
            .collect()
    }

    /// Facing direction for an entity, holding the previous non-degenerate
    /// sample while it is near-stationary.
    fn orientation_for(
        &self,
        id: EntityId,
        velocity: Vector2<f32>,
        frame_idx: usize,
    ) -> Option<f32> {
        if velocity.norm() >= ORIENTATION_SPEED_FLOOR {
            return Some(velocity.y.atan2(velocity.x));
        }
        let frames = self.frames().frames();
        let lookback_floor = frame_idx.saturating_sub(ORIENTATION_LOOKBACK_FRAMES);
        for frame in frames[lookback_floor..=frame_idx].iter().rev() {
            if let Some(sample) = frame.sample(id) {
                if sample.speed() >= ORIENTATION_SPEED_FLOOR {
                    return Some(sample.velocity.y.atan2(sample.velocity.x));
                }
            }
        }
        None
    }
}
