//! Timeline controller: current time, playback, seeking, event crossings
//!
//! The controller owns the single mutable "current match time" and drives
//! the per-tick pipeline: interpolate state, derive overlays, collect
//! visible annotations, resolve the camera intent, and emit every event
//! crossed since the previous position. Crossed events are returned as an
//! ordered list per tick/seek instead of being pushed through callbacks,
//! so playback behavior is testable without a UI harness.
//!
//! Everything is synchronous and single-threaded: a tick or seek runs to
//! completion before the next one starts, so observers only ever see a
//! consistent pre- or post-seek state. Seek requests that arrive between
//! ticks go through a latest-wins pending slot.

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::annotate::{Anchor, Annotation, AnnotationKind, AnnotationLayer};
use crate::branch::{MoveKind, PathPoint, SimulationBranch};
use crate::camera::{self, CameraIntent, CameraMode};
use crate::error::{EngineError, Result};
use crate::model::{Event, EntityId, Frame, MatchInfo, Roster, TacticalState, Timestamp};
use crate::overlay::{self, DerivedOverlay};
use crate::store::MatchData;

/// Playback rate bounds (the UI exposes x0.25 through x16).
pub const RATE_MIN: f64 = 0.25;
pub const RATE_MAX: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    Stopped,
    Playing,
    Paused,
}

/// Everything the rendering surface needs for one tick. The renderer owns
/// all pixel-level drawing; none of this retains references into the
/// controller.
#[derive(Debug, Clone, Serialize)]
pub struct TickOutput {
    /// Match-clock time, or seconds since divergence inside a branch.
    pub t: Timestamp,
    pub status: PlaybackStatus,
    pub in_simulation: bool,
    pub state: TacticalState,
    pub overlay: DerivedOverlay,
    pub annotations: Vec<Annotation>,
    pub camera: Option<CameraIntent>,
    /// Events crossed by this tick (including an applied pending seek), in
    /// timestamp order. At-least-once per crossing, never duplicated for
    /// the same crossing within one tick. Always empty inside a branch.
    pub notifications: Vec<Event>,
}

/// Owns current time, playback rate and the play/pause/seek state machine.
pub struct TimelineController {
    data: Option<MatchData>,
    current: Timestamp,
    rate: f64,
    status: PlaybackStatus,
    pending_seek: Option<Timestamp>,
    camera_mode: CameraMode,
    annotations: AnnotationLayer,
    branch: Option<SimulationBranch>,
    branch_time: f64,
}

impl Default for TimelineController {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineController {
    pub fn new() -> Self {
        Self {
            data: None,
            current: 0.0,
            rate: 1.0,
            status: PlaybackStatus::Stopped,
            pending_seek: None,
            camera_mode: CameraMode::Ball,
            annotations: AnnotationLayer::new(),
            branch: None,
            branch_time: 0.0,
        }
    }

    /// Atomically load a match. On failure the previously loaded match (if
    /// any) stays untouched; on success playback resets to Stopped at the
    /// first frame and any active branch is discarded.
    pub fn load(
        &mut self,
        info: MatchInfo,
        roster: Roster,
        frames: Vec<Frame>,
        events: Vec<Event>,
    ) -> Result<()> {
        let data = MatchData::load(info, roster, frames, events)?;
        self.current = data.start();
        self.status = PlaybackStatus::Stopped;
        self.pending_seek = None;
        self.branch = None;
        self.branch_time = 0.0;
        self.annotations.clear();
        self.data = Some(data);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&MatchData> {
        self.data.as_ref()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// Current match-clock time, or branch-relative time in simulation.
    pub fn current_time(&self) -> Timestamp {
        if self.branch.is_some() {
            self.branch_time
        } else {
            self.current
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn set_rate(&mut self, rate: f64) {
        self.rate = rate.clamp(RATE_MIN, RATE_MAX);
    }

    pub fn camera_mode(&self) -> CameraMode {
        self.camera_mode
    }

    pub fn set_camera_mode(&mut self, mode: CameraMode) {
        self.camera_mode = mode;
    }

    fn require_data(&self) -> Result<&MatchData> {
        self.data
            .as_ref()
            .ok_or_else(|| EngineError::NoActiveTimeline("no match loaded".to_string()))
    }

    pub fn play(&mut self) -> Result<()> {
        self.require_data()?;
        self.status = PlaybackStatus::Playing;
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.status = PlaybackStatus::Paused;
        }
    }

    /// Stop playback and rewind. Cancels any pending seek so nothing is
    /// left half-applied.
    pub fn stop(&mut self) {
        self.status = PlaybackStatus::Stopped;
        self.pending_seek = None;
        if self.branch.is_some() {
            self.branch_time = 0.0;
        } else if let Some(data) = &self.data {
            self.current = data.start();
        }
    }

    /// Jump current time directly. Atomic with respect to observers: the
    /// crossed events for the whole jumped interval are returned together
    /// with the already-committed new position. Backward seeks emit
    /// nothing; the events are re-emitted on the next forward crossing.
    pub fn seek(&mut self, t: Timestamp) -> Result<Vec<Event>> {
        if let Some(branch) = &self.branch {
            let duration = branch.duration();
            if !t.is_finite() {
                return Err(EngineError::OutOfRange { t, start: 0.0, end: duration });
            }
            self.branch_time = t.clamp(0.0, duration);
            return Ok(Vec::new());
        }
        let data = self.require_data()?;
        if !t.is_finite() {
            return Err(EngineError::OutOfRange { t, start: data.start(), end: data.end() });
        }
        let target = data.clamp_time(t);
        let crossed = Self::crossed_events(data, self.current, target);
        debug!(from = self.current, to = target, events = crossed.len(), "seek");
        self.current = target;
        Ok(crossed)
    }

    /// Queue a seek for the next tick. Latest wins: a request that arrives
    /// before the prior one is processed replaces it.
    pub fn request_seek(&mut self, t: Timestamp) {
        if !t.is_finite() {
            warn!(t, "non-finite seek request dropped");
            return;
        }
        if self.pending_seek.replace(t).is_some() {
            debug!(t, "pending seek superseded");
        }
    }

    /// Events crossed moving forward from `from` to `to`. The interval is
    /// half-open so consecutive ticks never emit the same crossing twice;
    /// only the terminal clamp at the last frame closes the interval.
    fn crossed_events(data: &MatchData, from: Timestamp, to: Timestamp) -> Vec<Event> {
        if to <= from {
            return Vec::new();
        }
        if to >= data.end() {
            data.events().events_between_inclusive(from, to).to_vec()
        } else {
            data.events().events_between(from, to).to_vec()
        }
    }

    /// Advance one scheduled tick. While playing, current time moves by
    /// `rate * elapsed` and clamps at the boundary (transitioning to
    /// Stopped); while paused or stopped the tick only re-renders. A
    /// pending seek is applied first and its crossings are folded into this
    /// tick's notifications.
    pub fn tick(&mut self, elapsed: f64) -> Result<TickOutput> {
        self.require_data()?;
        let mut notifications = Vec::new();

        if let Some(target) = self.pending_seek.take() {
            notifications.extend(self.seek(target)?);
        }

        if self.status == PlaybackStatus::Playing {
            let dt = self.rate * elapsed.max(0.0);
            if self.branch.is_some() {
                self.advance_branch(dt);
            } else {
                notifications.extend(self.advance_match(dt));
            }
        }

        Ok(self.render(notifications))
    }

    fn advance_match(&mut self, dt: f64) -> Vec<Event> {
        let data = self.data.as_ref().expect("checked by tick");
        let end = data.end();
        let target = (self.current + dt).min(end);
        let crossed = Self::crossed_events(data, self.current, target);
        self.current = target;
        if self.current >= end {
            info!(t = self.current, "playback reached end of match");
            self.status = PlaybackStatus::Stopped;
        }
        crossed
    }

    fn advance_branch(&mut self, dt: f64) {
        let duration = self.branch.as_ref().expect("checked by tick").duration();
        self.branch_time = (self.branch_time + dt).min(duration);
        if self.branch_time >= duration {
            self.status = PlaybackStatus::Stopped;
        }
    }

    /// Produce the render payload for the current position without
    /// advancing time.
    fn render(&self, notifications: Vec<Event>) -> TickOutput {
        let data = self.data.as_ref().expect("render requires loaded data");
        let (t, state, annotations) = match &self.branch {
            Some(branch) => {
                let state = branch.state_at(self.branch_time);
                let annotations =
                    branch.annotations.at_time(self.branch_time).into_iter().cloned().collect();
                (self.branch_time, state, annotations)
            }
            None => {
                // current is always inside coverage, so this cannot fail.
                let state = data
                    .state_at(self.current)
                    .unwrap_or_else(|_| unreachable!("current time is clamped to coverage"));
                let annotations =
                    self.annotations.at_time(self.current).into_iter().cloned().collect();
                (self.current, state, annotations)
            }
        };
        let overlay = overlay::overlay(&state, &data.roster);
        let camera = camera::resolve(&state, self.camera_mode);
        TickOutput {
            t,
            status: self.status,
            in_simulation: self.branch.is_some(),
            state,
            overlay,
            annotations,
            camera,
            notifications,
        }
    }

    // ---- simulation mode -------------------------------------------------

    pub fn in_simulation(&self) -> bool {
        self.branch.is_some()
    }

    pub fn branch(&self) -> Option<&SimulationBranch> {
        self.branch.as_ref()
    }

    /// Fork the recorded timeline at `t` and switch playback to the
    /// branch. A branch that is already active is discarded.
    pub fn enter_simulation(&mut self, t: Timestamp) -> Result<()> {
        let data = self.require_data()?;
        let branch = SimulationBranch::fork(data, t)?;
        if self.branch.is_some() {
            warn!("active simulation branch discarded by new fork");
        }
        self.branch = Some(branch);
        self.branch_time = 0.0;
        self.pending_seek = None;
        self.pause();
        Ok(())
    }

    /// Destroy the branch and its annotation layer, returning playback to
    /// the recorded timeline at the divergence point.
    pub fn exit_simulation(&mut self) {
        if let Some(branch) = self.branch.take() {
            self.current = branch.divergence();
            self.branch_time = 0.0;
            self.pause();
        }
    }

    pub fn apply_move(
        &mut self,
        entity: EntityId,
        kind: MoveKind,
        start_offset: f64,
        path: Vec<PathPoint>,
    ) -> Result<()> {
        match &mut self.branch {
            Some(branch) => branch.apply_move(entity, kind, start_offset, path),
            None => Err(EngineError::NoActiveTimeline(
                "no active simulation branch".to_string(),
            )),
        }
    }

    // ---- annotations -----------------------------------------------------

    /// Add an annotation to the active layer: the branch's own layer while
    /// in simulation, the match layer otherwise.
    pub fn add_annotation(
        &mut self,
        kind: AnnotationKind,
        anchor: Anchor,
        points: Vec<nalgebra::Point2<f32>>,
    ) -> Result<Uuid> {
        self.require_data()?;
        let layer = match &mut self.branch {
            Some(branch) => &mut branch.annotations,
            None => &mut self.annotations,
        };
        Ok(layer.add(kind, anchor, points))
    }

    pub fn remove_annotation(&mut self, id: Uuid) -> bool {
        let layer = match &mut self.branch {
            Some(branch) => &mut branch.annotations,
            None => &mut self.annotations,
        };
        layer.remove(id)
    }

    pub fn annotations(&self) -> &AnnotationLayer {
        match &self.branch {
            Some(branch) => &branch.annotations,
            None => &self.annotations,
        }
    }
}
