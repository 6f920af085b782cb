//! processor/progress.rs
//! Two-phase weighted progress that never goes backwards.

use crate::constants::{FIRST_PHASE_WEIGHT, SECOND_PHASE_WEIGHT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    First,
    Second,
}

#[derive(Debug, Clone)]
pub struct WeightedProgress {
    weights: [f32; 2],
    phases: [f32; 2],
    reported: u8,
}

impl Default for WeightedProgress {
    fn default() -> Self {
        Self::new(FIRST_PHASE_WEIGHT, SECOND_PHASE_WEIGHT)
    }
}

impl WeightedProgress {
    /// Weights are normalized, so `(70, 30)` and `(7, 3)` are equivalent.
    pub fn new(first: f32, second: f32) -> Self {
        let total = first + second;
        let weights = if total > 0.0 { [first / total, second / total] } else { [1.0, 0.0] };
        Self { weights, phases: [0.0; 2], reported: 0 }
    }

    /// Record a phase percentage (clamped to 0..=100). Returns the blended
    /// value only when it moved forward.
    pub fn update(&mut self, phase: Phase, percent: f32) -> Option<u8> {
        let slot = &mut self.phases[phase as usize];
        *slot = slot.max(percent.clamp(0.0, 100.0));

        // Epsilon absorbs f32 error so whole percentages are not floored down.
        let blended = (self.weights[0] * self.phases[0] + self.weights[1] * self.phases[1] + 1e-3)
            .floor()
            .clamp(0.0, 100.0) as u8;
        if blended > self.reported {
            self.reported = blended;
            Some(blended)
        } else {
            None
        }
    }

    pub fn current(&self) -> u8 {
        self.reported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blends_and_never_decreases() {
        let mut p = WeightedProgress::default();
        assert_eq!(p.update(Phase::First, 50.0), Some(35));
        assert_eq!(p.update(Phase::First, 40.0), None);
        assert_eq!(p.update(Phase::First, 100.0), Some(70));
        assert_eq!(p.update(Phase::Second, 50.0), Some(85));
        assert_eq!(p.update(Phase::Second, 100.0), Some(100));
        assert_eq!(p.current(), 100);
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        let mut p = WeightedProgress::new(1.0, 1.0);
        assert_eq!(p.update(Phase::Second, 250.0), Some(50));
        assert_eq!(p.update(Phase::First, -5.0), None);
    }
}
