//! NVIDIA GPUs via `nvidia-smi`.

use async_trait::async_trait;

use hostpulse_core::traits::Collector;
use hostpulse_core::types::{GpuSample, MetricCategory, MetricValue};
use hostpulse_core::{AppError, AppResult};

use crate::command::ToolCommand;

const QUERY: &str = "--query-gpu=name,utilization.gpu,memory.used,memory.total,temperature.gpu";
const FORMAT: &str = "--format=csv,noheader,nounits";
const MIB: u64 = 1024 * 1024;

/// Queries every NVIDIA device through `nvidia-smi`.
#[derive(Debug)]
pub struct NvidiaGpuCollector {
    tool: ToolCommand,
}

impl NvidiaGpuCollector {
    pub fn new() -> Self {
        Self::with_program("nvidia-smi")
    }

    /// Use a different `nvidia-smi` binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            tool: ToolCommand::new(program),
        }
    }
}

impl Default for NvidiaGpuCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for NvidiaGpuCollector {
    fn category(&self) -> MetricCategory {
        MetricCategory::Gpu
    }

    fn name(&self) -> &str {
        "nvidia-smi"
    }

    async fn collect(&self) -> AppResult<MetricValue> {
        let output = self.tool.run(&[QUERY, FORMAT]).await?;
        Ok(MetricValue::Gpu(parse_query_output(&output)?))
    }
}

/// Parse `nvidia-smi` CSV rows: name, load %, used MiB, total MiB, °C.
pub fn parse_query_output(output: &str) -> AppResult<Vec<GpuSample>> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_row)
        .collect()
}

fn parse_row(line: &str) -> AppResult<GpuSample> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [name, load, used, total, temperature] = fields.as_slice() else {
        return Err(AppError::collector(format!(
            "unexpected nvidia-smi row: {line}"
        )));
    };

    Ok(GpuSample {
        name: (*name).to_string(),
        load_percent: number(load).unwrap_or(0.0) as f32,
        memory_used_bytes: number(used).map_or(0, |mib| (mib * MIB as f64) as u64),
        memory_total_bytes: number(total).map_or(0, |mib| (mib * MIB as f64) as u64),
        temperature_c: number(temperature).map(|c| c as f32),
    })
}

/// `[N/A]` and friends read as missing.
fn number(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_devices() {
        let output = "NVIDIA GeForce RTX 3080, 35, 1024, 10240, 55\n\
                      Tesla T4, 0, 0, 15360, [N/A]\n";
        let gpus = parse_query_output(output).expect("parse");

        assert_eq!(gpus.len(), 2);
        assert_eq!(gpus[0].name, "NVIDIA GeForce RTX 3080");
        assert_eq!(gpus[0].load_percent, 35.0);
        assert_eq!(gpus[0].memory_used_bytes, 1024 * MIB);
        assert_eq!(gpus[0].memory_total_bytes, 10240 * MIB);
        assert_eq!(gpus[0].temperature_c, Some(55.0));
        assert_eq!(gpus[1].temperature_c, None);
    }

    #[test]
    fn test_parse_rejects_short_row() {
        assert!(parse_query_output("GPU, 10").is_err());
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_query_output("\n").expect("parse").is_empty());
    }

    #[tokio::test]
    async fn test_missing_binary_is_collector_error() {
        let collector = NvidiaGpuCollector::with_program("hostpulse-no-such-nvidia-smi");
        let err = collector.collect().await.expect_err("missing binary");
        assert_eq!(err.kind, hostpulse_core::error::ErrorKind::Collector);
    }
}
