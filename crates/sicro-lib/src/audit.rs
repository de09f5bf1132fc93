//! Audit trail of scaling events
//!
//! One line per event, `"{timestamp} | SCALE UP -> N replicas"`, written in
//! arrival order. Files are written atomically through a temp file.

use crate::models::{ScalingEvent, TimelinePoint};
use anyhow::{Context, Result};
use chrono::SecondsFormat;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Append-only list of scaling events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditLog {
    events: Vec<ScalingEvent>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<ScalingEvent>) -> Self {
        Self { events }
    }

    pub fn append(&mut self, event: ScalingEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[ScalingEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Render the full log; every line ends with a newline
    pub fn render(&self) -> String {
        self.events
            .iter()
            .map(|event| format!("{}\n", format_event(event)))
            .collect()
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.render().as_bytes())
    }
}

/// Format a single audit line
pub fn format_event(event: &ScalingEvent) -> String {
    format!(
        "{} | {} -> {} replicas",
        event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        event.action,
        event.resulting_replicas
    )
}

/// Write the per-sample timeline as a pretty JSON array
pub fn write_timeline(path: &Path, timeline: &[TimelinePoint]) -> Result<()> {
    let json = serde_json::to_vec_pretty(timeline).context("Failed to serialize timeline")?;
    write_atomic(path, &json)
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .with_context(|| format!("Failed to create temp file {:?}", temp_path))?;

    file.write_all(data).context("Failed to write artifact data")?;
    file.sync_all().context("Failed to sync artifact file")?;

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, path))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Label, ScalingAction};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn event(hour: u32, minute: u32, action: ScalingAction, replicas: u32) -> ScalingEvent {
        ScalingEvent {
            timestamp: Utc.with_ymd_and_hms(2026, 1, 15, hour, minute, 0).unwrap(),
            action,
            resulting_replicas: replicas,
            tick: (hour * 60 + minute) as usize,
        }
    }

    #[test]
    fn test_format_event() {
        assert_eq!(
            format_event(&event(10, 10, ScalingAction::ScaleUp, 2)),
            "2026-01-15T10:10:00Z | SCALE UP -> 2 replicas"
        );
        assert_eq!(
            format_event(&event(10, 30, ScalingAction::ScaleDown, 1)),
            "2026-01-15T10:30:00Z | SCALE DOWN -> 1 replicas"
        );
    }

    #[test]
    fn test_render_preserves_order() {
        let mut log = AuditLog::new();
        log.append(event(10, 10, ScalingAction::ScaleUp, 2));
        log.append(event(10, 30, ScalingAction::ScaleDown, 1));

        assert_eq!(
            log.render(),
            "2026-01-15T10:10:00Z | SCALE UP -> 2 replicas\n\
             2026-01-15T10:30:00Z | SCALE DOWN -> 1 replicas\n"
        );
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_write_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs").join("infra_actions.log");

        let log = AuditLog::from_events(vec![event(14, 20, ScalingAction::ScaleUp, 2)]);
        log.write_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "2026-01-15T14:20:00Z | SCALE UP -> 2 replicas\n");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_empty_log_writes_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("infra_actions.log");

        AuditLog::new().write_to(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_write_timeline() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("timeline.json");
        let point = TimelinePoint {
            timestamp: Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap(),
            cpu_usage: 33.0,
            memory_usage: 50.0,
            request_count: 100,
            label: Label::Normal,
            is_alert: false,
            is_stable: false,
            replicas: 1,
        };

        write_timeline(&path, std::slice::from_ref(&point)).unwrap();

        let loaded: Vec<TimelinePoint> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, vec![point]);
    }
}
