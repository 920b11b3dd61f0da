//! Shared builders for unit tests: a small six-player match with motion on
//! both teams, plus event constructors.

use chrono::{TimeZone, Utc};

use crate::model::{
    Event, EventKind, Frame, KitColors, MatchInfo, PlayerEntry, Roster, Sample, Team, TeamSheet,
    Timestamp,
};
use crate::pitch::AttackingSide;
use crate::store::MatchData;

pub(crate) fn info() -> MatchInfo {
    MatchInfo {
        match_id: "TEST-0001".to_string(),
        date: Utc.with_ymd_and_hms(2024, 8, 17, 15, 30, 0).unwrap(),
        home_name: "Home".to_string(),
        away_name: "Away".to_string(),
    }
}

/// Three players a side: ids 1-3 home (1 is the goalkeeper), ids 4-6 away
/// (4 is the goalkeeper). Home attacks right in the first period.
pub(crate) fn simple_roster() -> Roster {
    let player = |id, team, shirt, goalkeeper| PlayerEntry {
        id,
        team,
        shirt_number: shirt,
        name: format!("Player {shirt}"),
        goalkeeper,
    };
    Roster {
        home: TeamSheet {
            name: "Home".to_string(),
            first_period_side: AttackingSide::Right,
            colors: KitColors::default(),
        },
        away: TeamSheet {
            name: "Away".to_string(),
            first_period_side: AttackingSide::Left,
            colors: KitColors::default(),
        },
        players: vec![
            player(1, Team::Home, 1, true),
            player(2, Team::Home, 4, false),
            player(3, Team::Home, 9, false),
            player(4, Team::Away, 1, true),
            player(5, Team::Away, 5, false),
            player(6, Team::Away, 10, false),
        ],
    }
}

pub(crate) fn frame(t: Timestamp, samples: &[(u32, f32, f32, f32, f32)]) -> Frame {
    let samples = samples
        .iter()
        .map(|&(id, x, y, vx, vy)| (id, Sample::new(x, y, vx, vy)))
        .collect();
    Frame::new(t, samples).unwrap()
}

/// `n` frames at `dt` spacing starting at t=0, empty event log. The ball
/// and two outfield players drift so speed/orientation are non-trivial.
pub(crate) fn simple_match(n: usize, dt: f64) -> MatchData {
    let frames = (0..n)
        .map(|i| {
            let t = i as f64 * dt;
            let drift = t as f32;
            frame(
                t,
                &[
                    (0, 52.5 + drift, 34.0, 1.0, 0.0),
                    (1, 2.0, 34.0, 0.0, 0.0),
                    (2, 10.0 + drift * 0.5, 30.0, 0.5, 0.0),
                    (3, 20.0, 40.0, 0.0, 0.0),
                    (4, 103.0, 34.0, 0.0, 0.0),
                    (5, 95.0 - drift * 0.3, 30.0, -0.3, 0.0),
                    (6, 85.0, 38.0, 0.0, 0.0),
                ],
            )
        })
        .collect();
    MatchData::load(info(), simple_roster(), frames, vec![]).unwrap()
}

pub(crate) fn event_at(t: Timestamp, kind: EventKind, team: Option<Team>) -> Event {
    Event { t, kind, team, player: None }
}

pub(crate) fn goal_at(t: Timestamp, team: Team) -> Event {
    event_at(t, EventKind::Goal, Some(team))
}
