use std::collections::BTreeMap;

/// Long-running operations the workbench issues against external services.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    LoadDataset,
    Simplify,
    Metrics,
    Export,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::LoadDataset => "load_dataset",
            Operation::Simplify => "simplify",
            Operation::Metrics => "metrics",
            Operation::Export => "export",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What became of a request once its response (or failure) arrived.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    Issued,
    Applied,
    Failed,
    Discarded,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Histogram {
    pub count: u64,
    pub sum: i64,
    pub min: i64,
    pub max: i64,
}

impl Histogram {
    pub fn record(&mut self, value: i64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.sum as f64 / self.count as f64)
    }
}

/// Per-operation request accounting.
///
/// Uses sorted maps so snapshots have stable ordering.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RequestMetrics {
    counters: BTreeMap<(Operation, Outcome), u64>,
    latency_ms: BTreeMap<Operation, Histogram>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetricsSnapshot {
    pub counters: Vec<((Operation, Outcome), u64)>,
    pub latency_ms: Vec<(Operation, Histogram)>,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.counters.clear();
        self.latency_ms.clear();
    }

    pub fn count(&self, op: Operation, outcome: Outcome) -> u64 {
        self.counters.get(&(op, outcome)).copied().unwrap_or(0)
    }

    pub fn record(&mut self, op: Operation, outcome: Outcome) {
        *self.counters.entry((op, outcome)).or_insert(0) += 1;
    }

    pub fn record_latency(&mut self, op: Operation, elapsed_ms: i64) {
        self.latency_ms.entry(op).or_default().record(elapsed_ms);
    }

    pub fn latency(&self, op: Operation) -> Option<Histogram> {
        self.latency_ms.get(&op).copied()
    }

    /// Returns a stable, sorted snapshot suitable for logs/debug UI.
    pub fn snapshot(&self) -> RequestMetricsSnapshot {
        RequestMetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (*k, *v)).collect(),
            latency_ms: self.latency_ms.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }
}
