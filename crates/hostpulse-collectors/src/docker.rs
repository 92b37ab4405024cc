//! Running containers via `docker stats`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use hostpulse_core::traits::Collector;
use hostpulse_core::types::{ContainerSample, MetricCategory, MetricValue};
use hostpulse_core::AppResult;

use crate::command::ToolCommand;

/// One line of `docker stats --format '{{json .}}'`.
#[derive(Debug, Deserialize)]
struct StatsLine {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "CPUPerc")]
    cpu_perc: String,
    #[serde(rename = "MemUsage")]
    mem_usage: String,
}

/// Per-container CPU and memory from the docker CLI.
#[derive(Debug)]
pub struct DockerCollector {
    tool: ToolCommand,
}

impl DockerCollector {
    pub fn new() -> Self {
        Self::with_program("docker")
    }

    /// Use a different docker-compatible CLI (e.g. `podman`).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            tool: ToolCommand::new(program),
        }
    }
}

impl Default for DockerCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for DockerCollector {
    fn category(&self) -> MetricCategory {
        MetricCategory::Containers
    }

    fn name(&self) -> &str {
        "docker-stats"
    }

    async fn collect(&self) -> AppResult<MetricValue> {
        let output = self
            .tool
            .run(&["stats", "--no-stream", "--format", "{{json .}}"])
            .await?;
        Ok(MetricValue::Containers(parse_stats_output(&output)?))
    }
}

/// Parse newline-delimited JSON rows from `docker stats`.
pub fn parse_stats_output(output: &str) -> AppResult<Vec<ContainerSample>> {
    let mut containers = Vec::new();
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let row: StatsLine = serde_json::from_str(line)?;
        let (used, limit) = parse_mem_usage(&row.mem_usage);
        if used.is_none() {
            debug!(container = %row.name, mem_usage = %row.mem_usage, "Unparsed memory usage");
        }
        containers.push(ContainerSample {
            id: row.id,
            name: row.name,
            cpu_percent: parse_percent(&row.cpu_perc).unwrap_or(0.0),
            memory_used_bytes: used.unwrap_or(0),
            memory_limit_bytes: limit.unwrap_or(0),
        });
    }
    Ok(containers)
}

/// `"12.34%"` → 12.34
fn parse_percent(value: &str) -> Option<f32> {
    value.trim().trim_end_matches('%').trim().parse().ok()
}

/// `"12.5MiB / 1.944GiB"` → (used, limit)
fn parse_mem_usage(value: &str) -> (Option<u64>, Option<u64>) {
    let mut parts = value.split('/');
    let used = parts.next().and_then(parse_size);
    let limit = parts.next().and_then(parse_size);
    (used, limit)
}

/// Docker human-readable sizes: decimal (`kB`, `MB`) and binary (`KiB`, `MiB`).
pub fn parse_size(value: &str) -> Option<u64> {
    let value = value.trim();
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number: f64 = number.parse().ok()?;

    let multiplier: f64 = match unit.trim() {
        "" | "B" => 1.0,
        "kB" | "KB" => 1e3,
        "MB" => 1e6,
        "GB" => 1e9,
        "TB" => 1e12,
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        "TiB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };
    Some((number * multiplier).round() as u64)
}
