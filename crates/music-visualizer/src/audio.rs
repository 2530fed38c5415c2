//! Analysis sources feeding the engine one frame of bytes per tick.

use std::f64::consts::TAU;

/// Which view of the signal a frame carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnalysisDomain {
    /// Magnitude per frequency bin, 0..=255.
    Frequency,
    /// Waveform samples with 128 as silence.
    Time,
}

/// Producer of analysis frames.
///
/// Implementations fill `out` with exactly `frame_len()` bytes. The engine
/// reuses the buffer across ticks.
pub trait AnalysisSource {
    fn frame_len(&self) -> usize;

    /// Move the analysis window to `position` seconds. Live sources ignore it.
    fn seek(&mut self, _position: f64) {}

    fn read(&mut self, domain: AnalysisDomain, out: &mut Vec<u8>);
}

impl<T: AnalysisSource + ?Sized> AnalysisSource for Box<T> {
    fn frame_len(&self) -> usize {
        (**self).frame_len()
    }

    fn seek(&mut self, position: f64) {
        (**self).seek(position);
    }

    fn read(&mut self, domain: AnalysisDomain, out: &mut Vec<u8>) {
        (**self).read(domain, out);
    }
}

/// Synthetic signal: a 120 BPM bass pulse over drifting sines.
#[derive(Clone, Debug)]
pub struct DemoSignal {
    len: usize,
    time: f64,
}

impl Default for DemoSignal {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl DemoSignal {
    pub fn new(len: usize) -> Self {
        Self { len, time: 0.0 }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// 0..1, peaks twice per second.
    fn beat_envelope(&self) -> f64 {
        let beat_freq = 2.0;
        let phase = (self.time * beat_freq * TAU).sin();
        ((phase + 1.0) / 2.0).powf(4.0)
    }
}

impl AnalysisSource for DemoSignal {
    fn frame_len(&self) -> usize {
        self.len
    }

    fn seek(&mut self, position: f64) {
        self.time = if position.is_finite() { position } else { 0.0 };
    }

    fn read(&mut self, domain: AnalysisDomain, out: &mut Vec<u8>) {
        out.clear();
        let beat = self.beat_envelope();
        let bass = 0.3 + beat * 0.5;
        let volume = 0.4 + beat * 0.3;
        let len = self.len.max(1) as f64;
        match domain {
            AnalysisDomain::Frequency => out.extend((0..self.len).map(|i| {
                let freq_norm = i as f64 / len;
                let value = (1.0 - freq_norm).powf(2.0) * bass * 255.0
                    + (self.time * (10.0 + i as f64 * 0.5)).sin().abs() * 50.0;
                value.clamp(0.0, 255.0) as u8
            })),
            AnalysisDomain::Time => out.extend((0..self.len).map(|i| {
                let t = i as f64 / len;
                let wave = (t * TAU * 4.0 + self.time * 10.0).sin();
                (128.0 + wave * 64.0 * volume).clamp(0.0, 255.0) as u8
            })),
        }
    }
}
