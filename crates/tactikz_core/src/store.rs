//! Time-indexed storage for the recorded match
//!
//! [`FrameStore`] and [`EventLog`] are write-once: [`MatchData::load`]
//! validates the full structure and either exposes all of it or none of it.
//! Lookups are binary searches over the frame/event arrays, so every query
//! the playback loop makes is O(log n).

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::model::{Event, EventKind, Frame, MatchInfo, Roster, Team, Timestamp};

/// Immutable, time-ordered storage of raw tracking frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameStore {
    frames: Vec<Frame>,
}

impl FrameStore {
    fn new(frames: Vec<Frame>) -> Result<Self> {
        if frames.is_empty() {
            return Err(EngineError::MalformedData("no frames".to_string()));
        }
        for pair in frames.windows(2) {
            if pair[1].t <= pair[0].t {
                return Err(EngineError::MalformedData(format!(
                    "frame timestamps not strictly increasing at t={:.3}",
                    pair[1].t
                )));
            }
        }
        Ok(Self { frames })
    }

    /// First covered timestamp.
    pub fn start(&self) -> Timestamp {
        self.frames[0].t
    }

    /// Last covered timestamp.
    pub fn end(&self) -> Timestamp {
        self.frames[self.frames.len() - 1].t
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Index of the last frame with `frame.t <= t`, or `OutOfRange`.
    /// Non-finite query times are out of range, not a panic path.
    pub fn floor_index(&self, t: Timestamp) -> Result<usize> {
        if !t.is_finite() || t < self.start() || t > self.end() {
            return Err(EngineError::OutOfRange { t, start: self.start(), end: self.end() });
        }
        let upper = self.frames.partition_point(|f| f.t <= t);
        Ok(upper - 1)
    }

    /// The two frames bracketing `t` (floor, ceil). Both references are the
    /// same frame when `t` hits a sample exactly or is the final timestamp.
    pub fn frame_at(&self, t: Timestamp) -> Result<(&Frame, &Frame)> {
        let lo = self.floor_index(t)?;
        let hi = if self.frames[lo].t == t { lo } else { (lo + 1).min(self.frames.len() - 1) };
        Ok((&self.frames[lo], &self.frames[hi]))
    }
}

/// Immutable, time-ordered storage of discrete match events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    fn new(events: Vec<Event>, frames: &FrameStore, roster: &Roster) -> Result<Self> {
        for pair in events.windows(2) {
            if pair[1].t < pair[0].t {
                return Err(EngineError::MalformedData(format!(
                    "event timestamps not ascending at t={:.3}",
                    pair[1].t
                )));
            }
        }
        for event in &events {
            if event.t < frames.start() || event.t > frames.end() {
                return Err(EngineError::MalformedData(format!(
                    "event at t={:.3} outside frame coverage [{:.3}, {:.3}]",
                    event.t,
                    frames.start(),
                    frames.end()
                )));
            }
            if let Some(player) = event.player {
                if !roster.contains(player) {
                    return Err(EngineError::MalformedData(format!(
                        "event at t={:.3} references unknown entity {player}",
                        event.t
                    )));
                }
            }
            if let EventKind::Substitution { off, on } = event.kind {
                if !roster.contains(off) || !roster.contains(on) {
                    return Err(EngineError::MalformedData(format!(
                        "substitution at t={:.3} references unknown entity",
                        event.t
                    )));
                }
            }
        }
        Ok(Self { events })
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events with `t ∈ [t0, t1)` in ascending order. Half-open so that
    /// consecutive playback intervals partition the log with no duplicate
    /// and no missing event.
    pub fn events_between(&self, t0: Timestamp, t1: Timestamp) -> &[Event] {
        let lo = self.events.partition_point(|e| e.t < t0);
        let hi = self.events.partition_point(|e| e.t < t1);
        &self.events[lo..hi]
    }

    /// Events with `t ∈ [t0, t1]`. Used only for the terminal clamp of a
    /// playback tick, so an event anchored exactly on the last frame is
    /// still emitted.
    pub fn events_between_inclusive(&self, t0: Timestamp, t1: Timestamp) -> &[Event] {
        let lo = self.events.partition_point(|e| e.t < t0);
        let hi = self.events.partition_point(|e| e.t <= t1);
        &self.events[lo..hi]
    }

    /// Most recent restart-class event at or before `t`.
    pub fn last_restart_at_or_before(&self, t: Timestamp) -> Option<&Event> {
        self.events.iter().rev().find(|e| e.t <= t && e.is_restart())
    }

    /// 1-based period number at `t`: the number of kick-offs at or before
    /// it. A log without kick-off events is treated as a single period.
    pub fn period_at(&self, t: Timestamp) -> u8 {
        let kickoffs = self
            .events
            .iter()
            .filter(|e| e.t <= t && matches!(e.kind, EventKind::KickOff))
            .count();
        (kickoffs as u8).max(1)
    }

    /// Running score `(home, away)` counting goals at or before `t`.
    pub fn score_at(&self, t: Timestamp) -> (u8, u8) {
        let mut home = 0u8;
        let mut away = 0u8;
        for event in self.events.iter().take_while(|e| e.t <= t) {
            if matches!(event.kind, EventKind::Goal) {
                match event.team {
                    Some(Team::Home) => home = home.saturating_add(1),
                    Some(Team::Away) => away = away.saturating_add(1),
                    None => {}
                }
            }
        }
        (home, away)
    }
}

/// A fully loaded match: frames, events and rosters, validated together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchData {
    pub info: MatchInfo,
    pub roster: Roster,
    frames: FrameStore,
    events: EventLog,
}

impl MatchData {
    /// Atomic load. Either the full structure is built and validated or
    /// construction fails with `MalformedData` and nothing is exposed.
    pub fn load(
        info: MatchInfo,
        roster: Roster,
        frames: Vec<Frame>,
        events: Vec<Event>,
    ) -> Result<Self> {
        let frame_store = FrameStore::new(frames)?;
        for frame in frame_store.frames() {
            for (id, _) in frame.entities() {
                if !roster.contains(id) {
                    return Err(EngineError::MalformedData(format!(
                        "frame at t={:.3} samples entity {id} missing from roster",
                        frame.t
                    )));
                }
            }
        }
        let event_log = EventLog::new(events, &frame_store, &roster)?;
        info!(
            match_id = %info.match_id,
            frames = frame_store.len(),
            events = event_log.events().len(),
            "match data loaded"
        );
        Ok(Self { info, roster, frames: frame_store, events: event_log })
    }

    pub fn frames(&self) -> &FrameStore {
        &self.frames
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn start(&self) -> Timestamp {
        self.frames.start()
    }

    pub fn end(&self) -> Timestamp {
        self.frames.end()
    }

    pub fn duration(&self) -> f64 {
        self.end() - self.start()
    }

    /// Clamp an arbitrary query time into the covered range.
    pub fn clamp_time(&self, t: Timestamp) -> Timestamp {
        let clamped = t.clamp(self.start(), self.end());
        if clamped != t {
            debug!(t, clamped, "query time clamped to coverage");
        }
        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CardType, RestartKind, Sample};
    use crate::testutil::{event_at, goal_at, simple_match, simple_roster};

    #[test]
    fn test_load_rejects_unordered_frames() {
        let roster = simple_roster();
        let frames = vec![
            Frame::new(1.0, vec![(0, Sample::new(50.0, 34.0, 0.0, 0.0))]).unwrap(),
            Frame::new(0.5, vec![(0, Sample::new(50.0, 34.0, 0.0, 0.0))]).unwrap(),
        ];
        let err = MatchData::load(crate::testutil::info(), roster, frames, vec![]).unwrap_err();
        assert!(matches!(err, EngineError::MalformedData(_)));
    }

    #[test]
    fn test_load_rejects_unknown_entity_in_frame() {
        let roster = simple_roster();
        let frames = vec![Frame::new(0.0, vec![(999, Sample::new(1.0, 1.0, 0.0, 0.0))]).unwrap()];
        let err = MatchData::load(crate::testutil::info(), roster, frames, vec![]).unwrap_err();
        assert!(matches!(err, EngineError::MalformedData(_)));
    }

    #[test]
    fn test_load_rejects_event_outside_coverage() {
        let data = simple_match(10, 0.04);
        let err = MatchData::load(
            data.info.clone(),
            data.roster.clone(),
            data.frames().frames().to_vec(),
            vec![goal_at(99.0, Team::Home)],
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::MalformedData(_)));
    }

    #[test]
    fn test_frame_at_brackets_and_exact_hit() {
        // Spacing of 0.25 keeps every timestamp exactly representable.
        let data = simple_match(10, 0.25);
        let (floor, ceil) = data.frames().frame_at(0.3).unwrap();
        assert_eq!(floor.t, 0.25);
        assert_eq!(ceil.t, 0.5);

        let (floor, ceil) = data.frames().frame_at(0.5).unwrap();
        assert_eq!(floor.t, 0.5);
        assert_eq!(ceil.t, 0.5);
    }

    #[test]
    fn test_frame_at_out_of_range() {
        let data = simple_match(10, 0.1);
        assert!(matches!(
            data.frames().frame_at(-0.1),
            Err(EngineError::OutOfRange { .. })
        ));
        assert!(matches!(
            data.frames().frame_at(5.0),
            Err(EngineError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_frame_at_non_finite_is_out_of_range() {
        // NaN slips past ordered comparisons, so the finiteness check has to
        // catch it before the binary search.
        let data = simple_match(10, 0.1);
        for t in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                data.frames().frame_at(t),
                Err(EngineError::OutOfRange { .. })
            ));
            assert!(data.state_at(t).is_err());
        }
    }

    #[test]
    fn test_events_between_partition() {
        // Synthetic log of events at distinct timestamps: the union of two
        // adjacent scans must equal one scan of the whole interval.
        let data = simple_match(200, 0.1);
        let events: Vec<Event> = (0..10).map(|i| goal_at(i as f64 * 1.5 + 0.3, Team::Home)).collect();
        let data = MatchData::load(
            data.info.clone(),
            data.roster.clone(),
            data.frames().frames().to_vec(),
            events,
        )
        .unwrap();

        let log = data.events();
        let (t0, t1, t2) = (0.0, 7.0, 14.0);
        let first = log.events_between(t0, t1);
        let second = log.events_between(t1, t2);
        let whole = log.events_between(t0, t2);
        let mut joined: Vec<Event> = first.to_vec();
        joined.extend_from_slice(second);
        assert_eq!(joined, whole.to_vec());
    }

    #[test]
    fn test_score_and_period_derivation() {
        let data = simple_match(2000, 0.1);
        let events = vec![
            event_at(0.0, EventKind::KickOff, None),
            goal_at(30.0, Team::Home),
            event_at(45.0, EventKind::Card { card: CardType::Yellow }, Some(Team::Away)),
            event_at(100.0, EventKind::KickOff, None),
            goal_at(130.0, Team::Away),
            event_at(150.0, EventKind::Restart { restart: RestartKind::Corner }, Some(Team::Home)),
        ];
        let data = MatchData::load(
            data.info.clone(),
            data.roster.clone(),
            data.frames().frames().to_vec(),
            events,
        )
        .unwrap();

        assert_eq!(data.events().score_at(29.9), (0, 0));
        assert_eq!(data.events().score_at(30.0), (1, 0));
        assert_eq!(data.events().score_at(199.0), (1, 1));
        assert_eq!(data.events().period_at(50.0), 1);
        assert_eq!(data.events().period_at(120.0), 2);
        let restart = data.events().last_restart_at_or_before(160.0).unwrap();
        assert!(matches!(restart.kind, EventKind::Restart { restart: RestartKind::Corner }));
    }
}
