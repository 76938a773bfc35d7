use pose_runner::data::SessionRecorder;
use pose_runner::encounter::{GameState, ObstacleKind, Outcome};
use pose_runner::gesture::GestureLabel;
use pose_runner::landmarks::{extract_frame, FrameSize, DEFAULT_CONFIDENCE_THRESHOLD};
use pose_runner::obstacle::SchedulerConfig;
use pose_runner::session::{FrameReport, GameSession};
use pose_runner::source::{Capture, LandmarkSource, ReplaySource, SimulatedSource};
use std::io::Write;

fn schedule() -> SchedulerConfig {
    SchedulerConfig {
        spawn_interval_frames: 10,
        travel_frames: 5,
        collision_frames: 2,
        lanes: 3,
    }
}

fn player() -> SimulatedSource {
    SimulatedSource::with_script(
        FrameSize::new(1080.0, 1920.0),
        Some(60),
        vec![(GestureLabel::HandsOnHead, 20), (GestureLabel::Cutting, 40)],
    )
}

fn play(source: &mut dyn LandmarkSource, session: &mut GameSession) -> Vec<FrameReport> {
    let mut reports = Vec::new();
    while let Some(capture) = source.next_capture().unwrap() {
        let frame = match capture {
            Capture::Body(observation) => {
                Some(extract_frame(&observation, DEFAULT_CONFIDENCE_THRESHOLD))
            }
            Capture::NoBody => None,
        };
        reports.push(session.process_frame(frame.as_ref()));
    }
    reports
}

#[test]
fn test_scripted_player_clears_until_block() {
    let mut session = GameSession::new(schedule());
    let reports = play(&mut player(), &mut session);

    let resolutions: Vec<_> = reports
        .iter()
        .flat_map(|r| r.resolutions.iter().map(move |res| (r.frame_index, *res)))
        .collect();

    let summary: Vec<(u64, ObstacleKind, GestureLabel, Outcome)> = resolutions
        .iter()
        .map(|(frame, r)| (*frame, r.obstacle.kind, r.gesture, r.outcome))
        .collect();

    assert_eq!(
        summary,
        vec![
            (15, ObstacleKind::Person, GestureLabel::HandsOnHead, Outcome::Cleared),
            (25, ObstacleKind::Grass, GestureLabel::Cutting, Outcome::Cleared),
            (35, ObstacleKind::Block, GestureLabel::Cutting, Outcome::Failed),
        ]
    );
    assert_eq!(session.state(), GameState::GameOver);

    let changes: Vec<_> = reports.iter().filter_map(|r| r.change).collect();
    assert_eq!(changes, vec![GestureLabel::HandsOnHead, GestureLabel::Cutting]);
}

#[test]
fn test_replay_matches_live_run_and_exports() {
    let mut recording = tempfile::NamedTempFile::new().unwrap();
    let mut source = player();
    let mut written = 0;
    while let Some(capture) = source.next_capture().unwrap() {
        let line = match capture {
            Capture::Body(observation) => serde_json::to_string(&observation).unwrap(),
            Capture::NoBody => "null".to_string(),
        };
        writeln!(recording, "{}", line).unwrap();
        written += 1;
        if written == 10 {
            writeln!(recording, "null").unwrap();
        }
    }
    recording.flush().unwrap();

    let mut replay = ReplaySource::open(recording.path()).unwrap();
    let mut session = GameSession::new(schedule());
    let reports = play(&mut replay, &mut session);

    assert_eq!(reports.len(), 61);
    assert!(!reports[10].body_detected);
    assert_eq!(reports[10].label, GestureLabel::HandsOnHead);
    assert_eq!(session.state(), GameState::GameOver);

    let dir = tempfile::tempdir().unwrap();
    let mut recorder = SessionRecorder::new(dir.path(), Some("replay".into()));
    for report in &reports {
        recorder.add_report(report);
    }

    let summary = recorder.summary();
    assert_eq!(summary.frames, 61);
    assert_eq!(summary.frames_without_body, 1);
    assert_eq!(summary.cleared, 2);
    assert_eq!(summary.failed, 1);

    let csv_path = recorder.export_csv().unwrap();
    assert!(csv_path.ends_with("replay/session_data.csv"));
    assert!(recorder.generate_report().unwrap().exists());
}
