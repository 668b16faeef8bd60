//! Run/generation/individual browsing state.

/// Position within the loaded evolutionary archive.
///
/// Mutated only by the interaction controller in response to discrete step
/// commands; the rendering path never touches it. Generation and individual
/// indices saturate at the archive bounds, the run number has no upper bound
/// here (the load-retry policy discovers it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationState {
    pub run: u32,
    pub generation: usize,
    pub individual: usize,
}

impl NavigationState {
    #[must_use]
    pub fn starting_at_run(run: u32) -> Self {
        Self {
            run,
            generation: 0,
            individual: 0,
        }
    }

    /// Saturating step through generations; out-of-range deltas clamp to the
    /// archive bounds rather than erroring.
    pub fn step_generation(&mut self, delta: i64, generation_count: usize) {
        self.generation = saturating_step(self.generation, delta, generation_count);
    }

    /// Saturating step through individuals of the current generation.
    pub fn step_individual(&mut self, delta: i64, individual_count: usize) {
        self.individual = saturating_step(self.individual, delta, individual_count);
    }

    /// Re-clamps the individual index after the generation (and hence the
    /// individual count) changed.
    pub fn clamp_individual(&mut self, individual_count: usize) {
        self.individual = saturating_step(self.individual, 0, individual_count);
    }

    /// Runs clamp at zero below; the upper bound is discovered lazily by the
    /// load-retry policy.
    pub fn step_run(&mut self, delta: i64) {
        self.run = (self.run as i64 + delta).max(0) as u32;
    }
}

fn saturating_step(current: usize, delta: i64, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    (current as i64 + delta).clamp(0, count as i64 - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_steps_clamp_exactly() {
        let count = 12;
        for start in [0usize, 3, 11] {
            for delta in [-100i64, -10, -1, 0, 1, 10, 100] {
                let mut nav = NavigationState::starting_at_run(1);
                nav.generation = start;
                nav.step_generation(delta, count);
                let expected = (start as i64 + delta).clamp(0, count as i64 - 1) as usize;
                assert_eq!(nav.generation, expected, "start {start} delta {delta}");
            }
        }
    }

    #[test]
    fn individual_steps_saturate_at_bounds() {
        let mut nav = NavigationState::starting_at_run(1);
        nav.step_individual(-5, 8);
        assert_eq!(nav.individual, 0);
        nav.step_individual(100, 8);
        assert_eq!(nav.individual, 7);
        nav.step_individual(-10, 8);
        assert_eq!(nav.individual, 0);
    }

    #[test]
    fn empty_generation_pins_individual_to_zero() {
        let mut nav = NavigationState::starting_at_run(1);
        nav.individual = 4;
        nav.clamp_individual(0);
        assert_eq!(nav.individual, 0);
    }

    #[test]
    fn runs_never_go_negative_and_have_no_upper_clamp() {
        let mut nav = NavigationState::starting_at_run(1);
        nav.step_run(-5);
        assert_eq!(nav.run, 0);
        nav.step_run(2000);
        assert_eq!(nav.run, 2000);
    }
}
