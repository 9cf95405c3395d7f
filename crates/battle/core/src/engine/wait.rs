//! Frame pacing primitive.

use crate::config::WaitWindow;

/// "Wait between `min` and `max` frames, then proceed."
///
/// [`check_wait`](WaitGate::check_wait) is called once per frame. Each call
/// counts one elapsed frame and then reports:
///
/// - unsatisfied while `elapsed < min`, whatever the caller signals
/// - satisfied once `elapsed >= max`, whatever the caller signals
/// - in between, satisfied only if the caller signals an advance (input
///   press or auto-advance pacing)
///
/// An unarmed gate is always satisfied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WaitGate {
    elapsed: u32,
    min: u32,
    max: u32,
    armed: bool,
}

impl WaitGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the gate. A `min` above `max` is clamped down to `max`.
    pub fn set_wait(&mut self, min: u32, max: u32) {
        self.elapsed = 0;
        self.min = min.min(max);
        self.max = max;
        self.armed = true;
    }

    pub fn arm(&mut self, window: WaitWindow) {
        self.set_wait(window.min, window.max);
    }

    /// Counts one frame and reports whether the gate is satisfied.
    ///
    /// A satisfied gate disarms itself.
    pub fn check_wait(&mut self, advance: bool) -> bool {
        if !self.armed {
            return true;
        }

        self.elapsed = self.elapsed.saturating_add(1);
        let satisfied =
            self.elapsed >= self.max || (self.elapsed >= self.min && advance);
        if satisfied {
            self.armed = false;
        }
        satisfied
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn clear(&mut self) {
        self.armed = false;
        self.elapsed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsatisfied_below_min_even_when_advanced() {
        let mut gate = WaitGate::new();
        gate.set_wait(4, 10);
        for _ in 0..3 {
            assert!(!gate.check_wait(true));
        }
        assert!(gate.check_wait(true));
        assert_eq!(gate.elapsed(), 4);
    }

    #[test]
    fn hard_ceiling_without_advance() {
        let mut gate = WaitGate::new();
        gate.set_wait(2, 6);
        for _ in 0..5 {
            assert!(!gate.check_wait(false));
        }
        assert!(gate.check_wait(false));
        assert!(!gate.is_armed());
    }

    #[test]
    fn advance_between_min_and_max() {
        let mut gate = WaitGate::new();
        gate.set_wait(2, 100);
        assert!(!gate.check_wait(false));
        assert!(!gate.check_wait(false));
        assert!(!gate.check_wait(false));
        assert!(gate.check_wait(true));
    }

    #[test]
    fn min_above_max_is_clamped() {
        let mut gate = WaitGate::new();
        gate.set_wait(50, 3);
        assert!(!gate.check_wait(false));
        assert!(!gate.check_wait(false));
        assert!(gate.check_wait(false));
    }

    #[test]
    fn unarmed_gate_is_satisfied() {
        let mut gate = WaitGate::new();
        assert!(gate.check_wait(false));
        gate.set_wait(5, 5);
        gate.clear();
        assert!(gate.check_wait(false));
    }

    #[test]
    fn satisfied_for_every_frame_at_or_past_max() {
        for min in 0..6 {
            let mut gate = WaitGate::new();
            gate.set_wait(min, 5);
            let mut satisfied_at = None;
            for frame in 1..=5 {
                if gate.check_wait(false) {
                    satisfied_at = Some(frame);
                    break;
                }
            }
            assert_eq!(satisfied_at, Some(5), "min {min}");
        }
    }
}
