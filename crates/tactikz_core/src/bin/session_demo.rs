use chrono::Utc;
use nalgebra::Point2;
use tactikz_core::annotate::{Anchor, AnnotationKind};
use tactikz_core::branch::{MoveKind, PathPoint};
use tactikz_core::model::{
    Event, EventKind, Frame, KitColors, MatchInfo, PlayerEntry, Roster, Sample, Team, TeamSheet,
};
use tactikz_core::pitch::AttackingSide;
use tactikz_core::{CameraMode, PlaybackStatus, TimelineController};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Tactikz session demo: synthetic 20s match at 25Hz");

    let mut controller = TimelineController::new();
    controller.load(demo_info(), demo_roster(), demo_frames(), demo_events())?;
    println!("loaded: coverage 0.0s..{:.1}s", controller.data().unwrap().end());

    // Scrub to just before the goal, then play across it at double speed.
    controller.seek(7.0)?;
    controller.set_camera_mode(CameraMode::Ball);
    controller.play()?;
    controller.set_rate(2.0);

    let output = controller.tick(1.0)?;
    println!("\nafter 1s wall-clock at x2 (t={:.2}s):", output.t);
    for event in &output.notifications {
        println!("  crossed event at t={:.2}s: {:?}", event.t, event.kind);
    }
    for line in &output.overlay.offside_lines {
        println!("  offside line for {:?} at x={:.1}m", line.team, line.depth_x);
    }
    if let Some(camera) = &output.camera {
        println!(
            "  camera: center ({:.1}, {:.1}) zoom {:.2}",
            camera.center.x, camera.center.y, camera.zoom
        );
    }

    // Annotate the buildup, then branch into a what-if run.
    controller.add_annotation(
        AnnotationKind::Pass,
        Anchor::Range { start: 7.0, end: 9.5 },
        vec![Point2::new(60.0, 30.0), Point2::new(80.0, 34.0)],
    )?;

    controller.enter_simulation(8.0)?;
    controller.apply_move(
        3,
        MoveKind::Run,
        0.0,
        vec![PathPoint::new(0.0, 62.0, 20.0), PathPoint::new(3.0, 80.0, 28.0)],
    )?;
    controller.play()?;
    let branched = controller.tick(2.0)?;
    let runner = branched.state.entity(3).expect("runner tracked in branch");
    println!(
        "\nbranch at +{:.1}s: runner reached ({:.1}, {:.1})",
        branched.t, runner.position.x, runner.position.y
    );

    controller.exit_simulation();
    println!("back on the recorded timeline at t={:.1}s", controller.current_time());

    // Play the rest of the match out.
    controller.play()?;
    loop {
        let output = controller.tick(1.0)?;
        for event in &output.notifications {
            println!("  crossed event at t={:.2}s: {:?}", event.t, event.kind);
        }
        if output.status == PlaybackStatus::Stopped {
            println!("playback finished at t={:.1}s", output.t);
            break;
        }
    }

    Ok(())
}

fn demo_info() -> MatchInfo {
    MatchInfo {
        match_id: "demo-001".to_string(),
        date: Utc::now(),
        home_name: "Home FC".to_string(),
        away_name: "Away United".to_string(),
    }
}

fn demo_roster() -> Roster {
    let player = |id, team, shirt, name: &str, goalkeeper| PlayerEntry {
        id,
        team,
        shirt_number: shirt,
        name: name.to_string(),
        goalkeeper,
    };
    Roster {
        home: TeamSheet {
            name: "Home FC".to_string(),
            first_period_side: AttackingSide::Right,
            colors: KitColors::default(),
        },
        away: TeamSheet {
            name: "Away United".to_string(),
            first_period_side: AttackingSide::Left,
            colors: KitColors::default(),
        },
        players: vec![
            player(1, Team::Home, 1, "H. Keeper", true),
            player(2, Team::Home, 4, "H. Defender", false),
            player(3, Team::Home, 9, "H. Striker", false),
            player(4, Team::Away, 1, "A. Keeper", true),
            player(5, Team::Away, 5, "A. Defender", false),
            player(6, Team::Away, 10, "A. Forward", false),
        ],
    }
}

fn demo_frames() -> Vec<Frame> {
    (0..=500)
        .map(|i| {
            let t = i as f64 / 25.0;
            let ft = t as f32;
            Frame::new(
                t,
                vec![
                    // Ball drifts toward the away goal.
                    (0, Sample::new(40.0 + 2.5 * ft, 34.0, 2.5, 0.0)),
                    (1, Sample::new(8.0, 34.0, 0.0, 0.0)),
                    (2, Sample::new(30.0 + 1.0 * ft, 28.0, 1.0, 0.0)),
                    (3, Sample::new(45.0 + 2.0 * ft, 20.0, 2.0, 0.0)),
                    (4, Sample::new(98.0, 34.0, 0.0, 0.0)),
                    (5, Sample::new(85.0 - 0.5 * ft, 40.0, -0.5, 0.0)),
                    (6, Sample::new(60.0 - 1.0 * ft, 34.0, -1.0, 0.0)),
                ],
            )
            .expect("demo frame ids are unique")
        })
        .collect()
}

fn demo_events() -> Vec<Event> {
    vec![
        Event { t: 0.0, kind: EventKind::KickOff, team: Some(Team::Home), player: None },
        Event { t: 8.2, kind: EventKind::Goal, team: Some(Team::Home), player: Some(3) },
        Event {
            t: 9.0,
            kind: EventKind::KickOff,
            team: Some(Team::Away),
            player: None,
        },
    ]
}
