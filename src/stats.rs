use std::time::Instant;

/// Stopwatch for one pipeline stage
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_us(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1_000_000.0
    }
}

/// Timing measurements for a single frame cycle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleTiming {
    pub detect_us: f64,
    pub decode_us: f64,
    pub match_us: f64,
    pub project_us: f64,
    pub total_us: f64,
}

impl CycleTiming {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ms(&self) -> f64 {
        self.total_us / 1000.0
    }
}

/// Aggregated latency of one stage
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageStats {
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Statistics collector for cycle latencies
#[derive(Debug, Default)]
pub struct LatencyStats {
    timings: Vec<CycleTiming>,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            timings: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, timing: CycleTiming) {
        self.timings.push(timing);
    }

    pub fn len(&self) -> usize {
        self.timings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }

    pub fn clear(&mut self) {
        self.timings.clear();
    }

    /// Calculate percentile from sorted data
    fn percentile(sorted: &[f64], p: f64) -> f64 {
        if sorted.is_empty() {
            return 0.0;
        }

        let idx = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
        sorted[idx]
    }

    /// Calculate statistics for a specific stage
    pub fn stage_stats(&self, extract: impl Fn(&CycleTiming) -> f64) -> StageStats {
        if self.timings.is_empty() {
            return StageStats::default();
        }

        let mut values: Vec<f64> = self.timings.iter().map(&extract).collect();
        values.sort_by(|a, b| a.total_cmp(b));

        StageStats {
            mean: values.iter().sum::<f64>() / values.len() as f64,
            p50: Self::percentile(&values, 50.0),
            p95: Self::percentile(&values, 95.0),
            p99: Self::percentile(&values, 99.0),
        }
    }

    /// Log a latency report for the collected cycles
    pub fn report(&self) {
        if self.timings.is_empty() {
            tracing::info!("No timing data collected");
            return;
        }

        let stages = [
            ("Detect", self.stage_stats(|t| t.detect_us)),
            ("Decode", self.stage_stats(|t| t.decode_us)),
            ("Match", self.stage_stats(|t| t.match_us)),
            ("Project", self.stage_stats(|t| t.project_us)),
        ];
        let total = self.stage_stats(|t| t.total_us);

        tracing::info!("Cycle latency over {} frames", self.timings.len());
        tracing::info!("┌─────────────────┬──────────┬──────────┬──────────┬──────────┐");
        tracing::info!("│ Stage           │   Mean   │   p50    │   p95    │   p99    │");
        tracing::info!("├─────────────────┼──────────┼──────────┼──────────┼──────────┤");
        for (name, stats) in &stages {
            Self::log_row(name, stats);
        }
        tracing::info!("├─────────────────┼──────────┼──────────┼──────────┼──────────┤");
        Self::log_row("TOTAL", &total);
        tracing::info!("└─────────────────┴──────────┴──────────┴──────────┴──────────┘");

        if let Some((name, stats)) = stages
            .iter()
            .max_by(|a, b| a.1.p95.total_cmp(&b.1.p95))
        {
            tracing::info!("Bottleneck: {} ({:.0} µs p95)", name, stats.p95);
        }
    }

    fn log_row(name: &str, stats: &StageStats) {
        tracing::info!(
            "│ {:<15} │ {:>6.0} µs │ {:>6.0} µs │ {:>6.0} µs │ {:>6.0} µs │",
            name,
            stats.mean,
            stats.p50,
            stats.p95,
            stats.p99
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(total_us: f64) -> CycleTiming {
        CycleTiming {
            detect_us: total_us * 0.8,
            decode_us: total_us * 0.05,
            match_us: total_us * 0.1,
            project_us: total_us * 0.05,
            total_us,
        }
    }

    #[test]
    fn test_cycle_timing_total_ms() {
        let mut timing = CycleTiming::new();
        timing.total_us = 50000.0;

        assert_eq!(timing.total_ms(), 50.0);
    }

    #[test]
    fn test_latency_stats_empty() {
        let stats = LatencyStats::new();

        assert!(stats.is_empty());
        assert_eq!(stats.stage_stats(|t| t.total_us), StageStats::default());
    }

    #[test]
    fn test_latency_stats_percentiles() {
        let mut stats = LatencyStats::with_capacity(100);
        for i in 1..=100 {
            stats.add(timing(i as f64 * 1000.0));
        }

        let total = stats.stage_stats(|t| t.total_us);
        assert_eq!(stats.len(), 100);
        assert!((total.mean - 50_500.0).abs() < 1e-6);
        assert_eq!(total.p50, 51_000.0);
        assert_eq!(total.p99, 99_000.0);
        assert!(total.p95 <= total.p99);
    }

    #[test]
    fn test_latency_stats_clear() {
        let mut stats = LatencyStats::new();
        stats.add(timing(1000.0));
        stats.report();

        stats.clear();
        assert!(stats.is_empty());
    }

    #[test]
    fn test_timer_measures_elapsed() {
        let timer = Timer::start();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(timer.elapsed_us() >= 2000.0);
    }
}
