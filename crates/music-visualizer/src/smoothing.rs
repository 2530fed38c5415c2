use crate::config::MAX_SMOOTHING;

/// Per-channel exponential smoothing so bars ease instead of jumping.
///
/// The buffer is zeroed whenever its length changes, which means a change of
/// channel count makes every channel start again from rest.
#[derive(Clone, Debug, Default)]
pub struct SmoothingBuffer {
    values: Vec<f32>,
    factor: f32,
}

impl SmoothingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Blend weight on the previous value. Clamped to `[0, 0.95]` so output
    /// always moves toward the input.
    pub fn set_factor(&mut self, factor: f32) {
        self.factor = if factor.is_finite() {
            factor.clamp(0.0, MAX_SMOOTHING)
        } else {
            0.0
        };
    }

    pub fn ensure_size(&mut self, channels: usize) {
        if self.values.len() != channels {
            self.values.clear();
            self.values.resize(channels, 0.0);
        }
    }

    pub fn smooth(&mut self, channel: usize, raw: f32) -> f32 {
        debug_assert!(
            channel < self.values.len(),
            "channel {channel} out of range for {} channels",
            self.values.len()
        );
        let Some(prev) = self.values.get_mut(channel) else {
            return raw;
        };
        *prev += (raw - *prev) * (1.0 - self.factor);
        *prev
    }

    pub fn reset(&mut self) {
        self.values.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_factor_passes_values_through() {
        let mut s = SmoothingBuffer::new();
        s.set_factor(0.0);
        s.ensure_size(2);
        assert_eq!(s.smooth(0, 42.0), 42.0);
        assert_eq!(s.smooth(1, 7.0), 7.0);
    }

    #[test]
    fn half_factor_moves_halfway() {
        let mut s = SmoothingBuffer::new();
        s.set_factor(0.5);
        s.ensure_size(1);
        assert_eq!(s.smooth(0, 100.0), 50.0);
        assert_eq!(s.smooth(0, 100.0), 75.0);
    }

    #[test]
    fn factor_is_clamped() {
        let mut s = SmoothingBuffer::new();
        s.set_factor(1.0);
        assert_eq!(s.factor(), MAX_SMOOTHING);
        s.set_factor(-3.0);
        assert_eq!(s.factor(), 0.0);
        s.set_factor(f32::NAN);
        assert_eq!(s.factor(), 0.0);
    }

    #[test]
    fn resize_zeroes_every_channel() {
        let mut s = SmoothingBuffer::new();
        s.set_factor(0.0);
        s.ensure_size(4);
        for i in 0..4 {
            s.smooth(i, 10.0);
        }
        s.ensure_size(4);
        assert!(s.values().iter().all(|&v| v == 10.0));
        s.ensure_size(8);
        assert_eq!(s.len(), 8);
        assert!(s.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn reset_keeps_length() {
        let mut s = SmoothingBuffer::new();
        s.ensure_size(3);
        s.smooth(2, 5.0);
        s.reset();
        assert_eq!(s.values(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn out_of_range_returns_raw_in_release() {
        let mut s = SmoothingBuffer::new();
        s.ensure_size(1);
        assert_eq!(s.smooth(5, 3.0), 3.0);
    }

    proptest! {
        #[test]
        fn converges_to_constant_input(factor in 0.0f32..1.0, target in 0.0f32..255.0) {
            let mut s = SmoothingBuffer::new();
            s.set_factor(factor);
            s.ensure_size(1);
            let mut prev_gap = f32::INFINITY;
            let mut last = 0.0;
            for _ in 0..400 {
                last = s.smooth(0, target);
                let gap = (target - last).abs();
                prop_assert!(gap <= prev_gap + 1e-3);
                prev_gap = gap;
            }
            prop_assert!((target - last).abs() < 0.5);
        }
    }
}
