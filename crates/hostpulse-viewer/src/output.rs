//! Text and JSON rendering of per-frame summaries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use hostpulse_core::types::MetricSnapshot;

use crate::store::{MetricStore, StreamKey, WindowStats};

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One human-readable line per frame
    #[default]
    Text,
    /// One JSON object per frame
    Json,
}

/// What gets printed for one received frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameSummary {
    pub sequence: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub collection_ms: f64,
    pub cpu_total: f32,
    pub cpu_loads: Vec<f32>,
    pub ram_percent: f32,
    pub cpu_window: Option<WindowStats>,
    pub window_len: usize,
    pub missing: Vec<String>,
}

impl FrameSummary {
    /// Summarize `snapshot` after it was ingested into `store`.
    pub fn new(snapshot: &MetricSnapshot, store: &MetricStore) -> Self {
        Self {
            sequence: snapshot.sequence,
            timestamp: DateTime::from_timestamp_millis(snapshot.timestamp_ms),
            collection_ms: snapshot.collection_ms,
            cpu_total: snapshot.cpu_total,
            cpu_loads: snapshot.cpu_loads.clone(),
            ram_percent: snapshot.ram.used_percent,
            cpu_window: store.stats(&StreamKey::CpuTotal),
            window_len: store.window(&StreamKey::CpuTotal).map_or(0, |w| w.len()),
            missing: snapshot.missing.clone(),
        }
    }
}

/// Render one summary in the selected format.
pub fn render(summary: &FrameSummary, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => render_text(summary),
        OutputFormat::Json => serde_json::to_string(summary).unwrap_or_else(|_| "{}".to_string()),
    }
}

fn render_text(summary: &FrameSummary) -> String {
    let timestamp = summary
        .timestamp
        .map(|t| t.format("%H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| "-".to_string());
    let cores = summary
        .cpu_loads
        .iter()
        .map(|load| format!("{load:.0}"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut line = format!(
        "#{} {} ({:.1}ms) cpu {:.1}% [{}] ram {:.1}%",
        summary.sequence,
        timestamp,
        summary.collection_ms,
        summary.cpu_total,
        cores,
        summary.ram_percent
    );
    if let Some(stats) = summary.cpu_window {
        line.push_str(&format!(
            " | cpu window n={} min {:.1} avg {:.1} max {:.1}",
            summary.window_len, stats.min, stats.avg, stats.max
        ));
    }
    if !summary.missing.is_empty() {
        line.push_str(&format!(" | missing: {}", summary.missing.join(",")));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> FrameSummary {
        let snapshot = MetricSnapshot {
            sequence: 4,
            timestamp_ms: 0,
            collection_ms: 2.5,
            cpu_loads: vec![10.0, 30.0],
            cpu_total: 20.0,
            missing: vec!["gpu".to_string()],
            ..Default::default()
        };
        let mut store = MetricStore::new(8);
        store.ingest(&snapshot);
        FrameSummary::new(&snapshot, &store)
    }

    #[test]
    fn test_text_line() {
        let line = render(&summary(), OutputFormat::Text);
        assert!(line.starts_with("#4 00:00:00.000 (2.5ms) cpu 20.0% [10 30]"));
        assert!(line.contains("cpu window n=1 min 20.0 avg 20.0 max 20.0"));
        assert!(line.ends_with("missing: gpu"));
    }

    #[test]
    fn test_json_line() {
        let line = render(&summary(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["sequence"], 4);
        assert_eq!(value["cpu_window"]["max"], 20.0);
        assert_eq!(value["missing"][0], "gpu");
    }
}
