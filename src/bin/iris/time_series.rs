// Per-Cycle JSONL Time Series Recorder
// Outputs one JSON line per cycle for independent analysis

use iris_engine::CycleMetrics;
use std::io::Write;
use std::path::Path;

/// Accumulates cycle metrics and writes them as JSONL.
pub struct TimeSeriesRecorder {
    cycles: Vec<CycleMetrics>,
}

impl TimeSeriesRecorder {
    pub fn new() -> Self {
        Self { cycles: Vec::new() }
    }

    pub fn record(&mut self, metrics: &CycleMetrics) {
        self.cycles.push(metrics.clone());
    }

    /// Write all cycles to a JSONL file, creating parent directories.
    pub fn write_jsonl(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        for metrics in &self.cycles {
            serde_json::to_writer(&mut file, metrics)?;
            writeln!(file)?;
        }
        file.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }
}
