//! Automatable parameters with exponential target ramps.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// One scheduled exponential approach toward a target value.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TargetRamp {
    target: f32,
    start_time: f64,
    time_constant: f64,
    /// Parameter value at `start_time`, captured when the ramp is scheduled
    /// so a retrigger resumes from the in-flight trajectory.
    start_value: f32,
}

/// A parameter evaluated sample-accurately against the absolute clock.
///
/// Supports an immediate value and `set_target_at_time`-style automation: an
/// exponential approach `target + (v0 - target) * exp(-(t - t0) / tc)` that
/// gets ever closer to the target without overshooting it.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioParam {
    base: f32,
    /// Scheduled ramps, kept sorted by start time.
    events: Vec<TargetRamp>,
}

impl AudioParam {
    /// Create a parameter with an initial value and no automation.
    pub fn new(value: f32) -> Self {
        Self {
            base: value,
            events: Vec::new(),
        }
    }

    /// Set the value immediately, cancelling all scheduled automation.
    pub fn set_value(&mut self, value: f32) {
        self.base = value;
        self.events.clear();
    }

    /// Schedule an exponential approach toward `target` beginning at
    /// `start_time` seconds, with the given time constant in seconds.
    ///
    /// A non-positive time constant jumps straight to the target. Scheduling
    /// supersedes any event starting at or after `start_time`; the new ramp
    /// departs from wherever the parameter's trajectory is at `start_time`,
    /// so retriggering mid-ramp never discontinues the value.
    pub fn set_target_at_time(&mut self, target: f32, start_time: f64, time_constant: f64) {
        let start_value = self.value_at(start_time);
        self.events.retain(|e| e.start_time < start_time);
        self.events.push(TargetRamp {
            target,
            start_time,
            time_constant,
            start_value,
        });
    }

    /// Evaluate the parameter at an absolute time in seconds.
    pub fn value_at(&self, time: f64) -> f32 {
        // Events are sorted; the last one that has started governs.
        let active = self.events.iter().rev().find(|e| e.start_time <= time);
        match active {
            None => self.base,
            Some(ramp) => {
                if ramp.time_constant <= 0.0 {
                    return ramp.target;
                }
                let elapsed = time - ramp.start_time;
                let decay = (-elapsed / ramp.time_constant).exp() as f32;
                ramp.target + (ramp.start_value - ramp.target) * decay
            }
        }
    }

    /// The target the parameter is heading toward: the last scheduled ramp's
    /// target, or the base value when no automation is pending.
    pub fn target(&self) -> f32 {
        self.events.last().map_or(self.base, |e| e.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn approach_matches_closed_form() {
        let mut p = AudioParam::new(0.0);
        p.set_target_at_time(1.0, 0.0, 0.01);
        assert_relative_eq!(p.value_at(0.0), 0.0, epsilon = 1e-6);
        let expected = 1.0 - (-1.0f64).exp() as f32;
        assert_relative_eq!(p.value_at(0.01), expected, epsilon = 1e-6);
        // After many time constants the value is indistinguishable from the
        // target but approached from below.
        assert!(p.value_at(1.0) < 1.0);
        assert_relative_eq!(p.value_at(1.0), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn approach_is_strictly_monotonic() {
        let mut p = AudioParam::new(1.0);
        p.set_target_at_time(0.0, 0.0, 0.01);
        let mut prev = p.value_at(0.0);
        for i in 1..100 {
            let v = p.value_at(i as f64 * 0.001);
            assert!(v < prev, "value must strictly decrease toward the target");
            prev = v;
        }
    }

    #[test]
    fn retrigger_resumes_from_trajectory() {
        let mut p = AudioParam::new(0.0);
        p.set_target_at_time(1.0, 0.0, 0.01);
        let mid = p.value_at(0.005);
        p.set_target_at_time(0.0, 0.005, 0.01);
        // The reversal departs from the mid-ramp value, not from the target.
        assert_relative_eq!(p.value_at(0.005), mid, epsilon = 1e-6);
        assert!(p.value_at(0.006) < mid);
    }

    #[test]
    fn same_start_time_supersedes() {
        let mut p = AudioParam::new(0.0);
        p.set_target_at_time(1.0, 0.5, 0.01);
        p.set_target_at_time(0.25, 0.5, 0.01);
        assert_relative_eq!(p.value_at(10.0), 0.25, epsilon = 1e-4);
        assert_eq!(p.target(), 0.25);
    }

    #[test]
    fn set_value_cancels_automation() {
        let mut p = AudioParam::new(0.0);
        p.set_target_at_time(1.0, 0.0, 0.01);
        p.set_value(0.5);
        assert_eq!(p.value_at(0.0), 0.5);
        assert_eq!(p.value_at(100.0), 0.5);
    }

    #[test]
    fn zero_time_constant_jumps() {
        let mut p = AudioParam::new(0.0);
        p.set_target_at_time(1.0, 0.25, 0.0);
        assert_eq!(p.value_at(0.2), 0.0);
        assert_eq!(p.value_at(0.25), 1.0);
        assert_eq!(p.value_at(0.5), 1.0);
    }

    #[test]
    fn future_event_does_not_apply_early() {
        let mut p = AudioParam::new(0.75);
        p.set_target_at_time(0.0, 1.0, 0.01);
        assert_eq!(p.value_at(0.999), 0.75);
    }
}
