//! Track-wide amplitude envelope for the progress waveform.
//!
//! Summarizing a full decoded track takes long enough to stall a frame, so
//! [`EnvelopeSlot`] runs it on a worker thread and picks the result up on a
//! later tick.

use std::thread;

use crossbeam::channel::{bounded, Receiver, TryRecvError};

/// Normalized mean absolute amplitude per block, each in `0..=1`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaveformEnvelope {
    points: Vec<f32>,
}

impl WaveformEnvelope {
    pub fn points(&self) -> &[f32] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub fn summarize(samples: &[f32], target_points: usize) -> WaveformEnvelope {
    if target_points == 0 {
        return WaveformEnvelope::default();
    }
    let block = samples.len() / target_points;
    if block == 0 {
        return WaveformEnvelope {
            points: vec![0.0; target_points],
        };
    }

    let mut points: Vec<f32> = samples
        .chunks_exact(block)
        .take(target_points)
        .map(|chunk| chunk.iter().map(|s| s.abs()).sum::<f32>() / block as f32)
        .collect();

    let max = points.iter().copied().fold(0.0f32, f32::max);
    if max > 0.0 {
        for p in &mut points {
            *p /= max;
        }
    } else {
        points.fill(0.0);
    }
    WaveformEnvelope { points }
}

/// Holds the envelope for the current track, computed in the background.
#[derive(Debug, Default)]
pub struct EnvelopeSlot {
    envelope: Option<WaveformEnvelope>,
    generation: u64,
    pending: Option<Receiver<(u64, WaveformEnvelope)>>,
}

impl EnvelopeSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start summarizing `samples`; any earlier envelope or in-flight result
    /// is dropped.
    pub fn begin(&mut self, samples: Vec<f32>, points: usize) {
        self.clear();
        let generation = self.generation;
        let (tx, rx) = bounded(1);
        let spawned = thread::Builder::new()
            .name("waveform-summary".into())
            .spawn(move || {
                let envelope = summarize(&samples, points);
                // Receiver gone means the track changed; nothing to do.
                let _ = tx.send((generation, envelope));
            });
        match spawned {
            Ok(_) => {
                self.pending = Some(rx);
                tracing::debug!(generation, points, "waveform summary started");
            }
            Err(err) => tracing::warn!(%err, "could not spawn waveform summarizer"),
        }
    }

    /// Install a finished result, once. Returns true when one was installed.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = &self.pending else {
            return false;
        };
        match rx.try_recv() {
            Ok((generation, envelope)) => {
                self.pending = None;
                if generation != self.generation {
                    tracing::debug!(generation, current = self.generation, "stale envelope dropped");
                    return false;
                }
                tracing::debug!(generation, points = envelope.len(), "waveform summary ready");
                self.envelope = Some(envelope);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                tracing::warn!("waveform summarizer exited without a result");
                self.pending = None;
                false
            }
        }
    }

    /// Install a result produced elsewhere, tagged with the generation it was
    /// started for.
    pub fn deliver(&mut self, generation: u64, envelope: WaveformEnvelope) -> bool {
        if generation != self.generation {
            return false;
        }
        self.pending = None;
        self.envelope = Some(envelope);
        true
    }

    pub fn clear(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.envelope = None;
        self.pending = None;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn get(&self) -> Option<&WaveformEnvelope> {
        self.envelope.as_ref()
    }

    /// Block until the in-flight summary lands. Offline rendering uses this
    /// so the first frame already has the envelope.
    pub fn wait(&mut self) -> bool {
        let Some(rx) = self.pending.take() else {
            return false;
        };
        match rx.recv() {
            Ok((generation, envelope)) => self.deliver(generation, envelope),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn blocks_are_averaged_and_normalized() {
        let env = summarize(&[0.1, -0.1, 0.0, 0.0, 0.2, 0.2, -0.2, 0.2], 4);
        let expected = [0.5, 0.0, 1.0, 1.0];
        for (got, want) in env.points().iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{got} vs {want}");
        }
    }

    #[test]
    fn silence_is_all_zero() {
        let env = summarize(&[0.0; 100], 10);
        assert_eq!(env.points(), &[0.0; 10]);
    }

    #[test]
    fn degenerate_sizes() {
        assert!(summarize(&[1.0, 2.0], 0).is_empty());
        assert_eq!(summarize(&[1.0, 2.0], 5).points(), &[0.0; 5]);
    }

    #[test]
    fn remainder_is_dropped() {
        // block = 2, the trailing 9.0 never counts
        let env = summarize(&[1.0, 1.0, 0.5, 0.5, 9.0], 2);
        assert_eq!(env.points(), &[1.0, 0.5]);
    }

    #[test]
    fn slot_installs_result_once() {
        let mut slot = EnvelopeSlot::new();
        slot.begin(vec![0.5; 64], 8);
        assert!(slot.is_pending());
        assert!(slot.get().is_none());
        assert!(slot.wait());
        assert!(!slot.is_pending());
        assert_eq!(slot.get().map(WaveformEnvelope::len), Some(8));
        assert!(!slot.poll());
    }

    #[test]
    fn stale_generation_is_discarded() {
        let mut slot = EnvelopeSlot::new();
        let old = slot.generation();
        slot.clear();
        assert!(!slot.deliver(old, summarize(&[1.0; 4], 4)));
        assert!(slot.get().is_none());
        assert!(slot.deliver(slot.generation(), summarize(&[1.0; 4], 4)));
        assert!(slot.get().is_some());
    }

    #[test]
    fn clear_drops_in_flight_work() {
        let mut slot = EnvelopeSlot::new();
        slot.begin(vec![0.5; 64], 8);
        slot.clear();
        assert!(!slot.is_pending());
        assert!(!slot.wait());
        assert!(slot.get().is_none());
    }

    proptest! {
        #[test]
        fn points_are_normalized(
            samples in prop::collection::vec(-4.0f32..4.0, 0..400),
            target in 1usize..50,
        ) {
            let env = summarize(&samples, target);
            prop_assert_eq!(env.len(), target);
            prop_assert!(env.points().iter().all(|p| (0.0..=1.0).contains(p)));
            let max = env.points().iter().copied().fold(0.0f32, f32::max);
            prop_assert!(max == 0.0 || (max - 1.0).abs() < 1e-6);
        }
    }
}
