use std::time::Duration;

/// Step budget and inter-step pacing for one run.
pub struct LoopController {
    max_steps: u32,
    step_delay: Duration,
    steps_taken: u32,
}

impl LoopController {
    pub fn new(max_steps: u32, step_delay: Duration) -> Self {
        Self {
            max_steps,
            step_delay,
            steps_taken: 0,
        }
    }

    /// Count one model request against the budget.
    pub fn record_step(&mut self) {
        self.steps_taken += 1;
    }

    pub fn steps_taken(&self) -> u32 {
        self.steps_taken
    }

    pub fn should_stop(&self) -> bool {
        self.steps_taken >= self.max_steps
    }

    pub async fn pace(&self) {
        if !self.step_delay.is_zero() {
            tokio::time::sleep(self.step_delay).await;
        }
    }
}
