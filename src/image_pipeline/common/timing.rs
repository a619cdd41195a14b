use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct StepTiming {
    pub name: &'static str,
    pub duration: Duration,
}

/// Durations of each pipeline state, in execution order.
#[derive(Debug, Default, Clone)]
pub struct PipelineTimings {
    steps: Vec<StepTiming>,
}

impl PipelineTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&mut self, name: &'static str, duration: Duration) {
        self.steps.push(StepTiming { name, duration });
    }

    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    pub fn get_step(&self, name: &str) -> Option<Duration> {
        self.steps.iter().find(|s| s.name == name).map(|s| s.duration)
    }

    pub fn steps(&self) -> &[StepTiming] {
        &self.steps
    }

    /// Emits one debug event per step followed by the total.
    pub fn log_summary(&self) {
        for step in &self.steps {
            tracing::debug!(
                step = step.name,
                ms = step.duration.as_secs_f64() * 1000.0,
                "Step timing"
            );
        }
        tracing::debug!(ms = self.total_duration().as_secs_f64() * 1000.0, "Total conversion time");
    }
}

pub struct Timer {
    start: Instant,
    name: &'static str,
}

impl Timer {
    pub fn start(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    pub fn stop(self) -> (&'static str, Duration) {
        (self.name, self.start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timings_sum_steps() {
        let mut timings = PipelineTimings::new();
        timings.add_step("load_metadata", Duration::from_millis(2));
        timings.add_step("serialize", Duration::from_millis(3));
        assert_eq!(timings.total_duration(), Duration::from_millis(5));
        assert_eq!(timings.get_step("serialize"), Some(Duration::from_millis(3)));
        assert_eq!(timings.get_step("missing"), None);
    }
}
