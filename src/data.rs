// src/data.rs - Session recording, CSV export and HTML summary
use crate::encounter::{GameState, Outcome, Resolution};
use crate::error::PoseRunnerError;
use crate::gesture::GestureLabel;
use crate::session::FrameReport;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use csv::Writer;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
struct SessionRecord {
    frame: u64,
    elapsed_ms: i64,
    body_detected: bool,
    gesture: String,
    gesture_changed: bool,
    spawned_kind: Option<String>,
    spawned_lane: Option<usize>,
    obstacle_id: Option<String>,
    obstacle_kind: Option<String>,
    resolved_gesture: Option<String>,
    outcome: Option<String>,
    game_state: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    pub frames: usize,
    pub frames_without_body: usize,
    pub gesture_frames: BTreeMap<GestureLabel, usize>,
    pub gesture_changes: usize,
    pub obstacles_spawned: usize,
    pub cleared: usize,
    pub failed: usize,
    pub game_over: bool,
}

#[derive(Debug)]
pub struct SessionRecorder {
    output_dir: PathBuf,
    session_name: String,
    started: DateTime<Local>,
    records: Vec<SessionRecord>,
    summary: SessionSummary,
}

impl SessionRecorder {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let started = Local::now();
        let session_name = session_name
            .unwrap_or_else(|| format!("session_{}", started.format("%Y%m%d_%H%M%S")));

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            started,
            records: Vec::new(),
            summary: SessionSummary::default(),
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn add_report(&mut self, report: &FrameReport) {
        let summary = &mut self.summary;
        summary.frames += 1;
        if !report.body_detected {
            summary.frames_without_body += 1;
        }
        *summary.gesture_frames.entry(report.label).or_insert(0) += 1;
        if report.change.is_some() {
            summary.gesture_changes += 1;
        }
        summary.obstacles_spawned += report.spawned.len();

        let mut base = SessionRecord {
            frame: report.frame_index,
            elapsed_ms: self.elapsed_ms(),
            body_detected: report.body_detected,
            gesture: report.label.to_string(),
            gesture_changed: report.change.is_some(),
            spawned_kind: report.spawned.first().map(|o| o.kind.to_string()),
            spawned_lane: report.spawned.first().map(|o| o.lane),
            obstacle_id: None,
            obstacle_kind: None,
            resolved_gesture: None,
            outcome: None,
            game_state: report.state.to_string(),
        };

        if report.resolutions.is_empty() {
            self.records.push(base);
            return;
        }

        for resolution in &report.resolutions {
            self.count_resolution(resolution);
            base = Self::with_resolution(base, resolution);
            self.records.push(base.clone());
        }
    }

    /// Records a resolution that arrived outside a frame, e.g. from an
    /// external collision source.
    pub fn add_resolution(&mut self, frame: u64, resolution: &Resolution, state: GameState) {
        self.count_resolution(resolution);

        let record = SessionRecord {
            frame,
            elapsed_ms: self.elapsed_ms(),
            body_detected: true,
            gesture: resolution.gesture.to_string(),
            gesture_changed: false,
            spawned_kind: None,
            spawned_lane: None,
            obstacle_id: None,
            obstacle_kind: None,
            resolved_gesture: None,
            outcome: None,
            game_state: state.to_string(),
        };
        self.records.push(Self::with_resolution(record, resolution));
    }

    fn count_resolution(&mut self, resolution: &Resolution) {
        match resolution.outcome {
            Outcome::Cleared => self.summary.cleared += 1,
            Outcome::Failed => {
                self.summary.failed += 1;
                self.summary.game_over = true;
            }
        }
    }

    fn with_resolution(mut record: SessionRecord, resolution: &Resolution) -> SessionRecord {
        record.obstacle_id = Some(resolution.obstacle.id.to_string());
        record.obstacle_kind = Some(resolution.obstacle.kind.to_string());
        record.resolved_gesture = Some(resolution.gesture.to_string());
        record.outcome = Some(resolution.outcome.to_string());
        record
    }

    fn elapsed_ms(&self) -> i64 {
        Local::now()
            .signed_duration_since(self.started)
            .num_milliseconds()
    }

    pub fn export_csv(&self) -> Result<PathBuf> {
        if self.records.is_empty() {
            return Err(PoseRunnerError::EmptySession.into());
        }

        let csv_path = self.session_dir().join("session_data.csv");
        if let Some(parent) = csv_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let file = File::create(&csv_path)
            .with_context(|| format!("Failed to create {}", csv_path.display()))?;
        let mut writer = Writer::from_writer(file);
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        tracing::info!(path = %csv_path.display(), rows = self.records.len(), "exported session data");
        Ok(csv_path)
    }

    pub fn generate_report(&self) -> Result<PathBuf> {
        if self.summary.frames == 0 {
            return Err(PoseRunnerError::EmptySession.into());
        }

        let report_path = self.session_dir().join("report.html");
        if let Some(parent) = report_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        std::fs::write(&report_path, self.create_html_report())
            .with_context(|| format!("Failed to write {}", report_path.display()))?;
        Ok(report_path)
    }

    fn create_html_report(&self) -> String {
        let summary = &self.summary;
        let detection_rate =
            (1.0 - summary.frames_without_body as f64 / summary.frames as f64) * 100.0;

        let gesture_rows: String = GestureLabel::ALL
            .iter()
            .map(|label| {
                let count = summary.gesture_frames.get(label).copied().unwrap_or(0);
                format!(
                    "        <div class=\"stat-item\"><span class=\"stat-label\">{}:</span> <span class=\"stat-value\">{} frames</span></div>\n",
                    label, count
                )
            })
            .collect();

        format!(
            r#"
<!DOCTYPE html>
<html>
<head>
    <title>Pose Runner Report - {}</title>
    <style>
        body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 40px; background: #f5f5f5; }}
        h1 {{ color: #333; }}
        .stats {{ background: white; padding: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); margin-bottom: 20px; }}
        .stat-item {{ margin: 10px 0; }}
        .stat-label {{ font-weight: bold; color: #666; }}
        .stat-value {{ color: #4682EA; font-size: 1.2em; }}
    </style>
</head>
<body>
    <h1>Pose Runner Session Report</h1>
    <div class="stats">
        <h2>Session: {}</h2>
        <div class="stat-item"><span class="stat-label">Total Frames:</span> <span class="stat-value">{}</span></div>
        <div class="stat-item"><span class="stat-label">Body Detection Rate:</span> <span class="stat-value">{:.1}%</span></div>
        <div class="stat-item"><span class="stat-label">Gesture Changes:</span> <span class="stat-value">{}</span></div>
        <div class="stat-item"><span class="stat-label">Obstacles Spawned:</span> <span class="stat-value">{}</span></div>
        <div class="stat-item"><span class="stat-label">Obstacles Cleared:</span> <span class="stat-value">{}</span></div>
        <div class="stat-item"><span class="stat-label">Result:</span> <span class="stat-value">{}</span></div>
    </div>
    <div class="stats">
        <h2>Gestures</h2>
{}    </div>
</body>
</html>
"#,
            self.session_name,
            self.session_name,
            summary.frames,
            detection_rate,
            summary.gesture_changes,
            summary.obstacles_spawned,
            summary.cleared,
            if summary.game_over { "Game Over" } else { "Still Playing" },
            gesture_rows
        )
    }
}
