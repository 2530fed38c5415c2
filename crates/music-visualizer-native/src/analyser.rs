use std::f32::consts::TAU;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use music_visualizer::{AnalysisDomain, AnalysisSource};

pub const FFT_SIZE: usize = 2048;
pub const BINS: usize = FFT_SIZE / 2;
pub const SMOOTHING: f32 = 0.8;
pub const MIN_DB: f32 = -100.0;
pub const MAX_DB: f32 = -30.0;

/// Byte spectra and waveforms read from a decoded track at the playback
/// position, scaled the way a browser analyser node scales them.
pub struct PcmAnalyser {
    mono: Arc<Vec<f32>>,
    sample_rate: u32,
    cursor: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl PcmAnalyser {
    pub fn new(mono: Arc<Vec<f32>>, sample_rate: u32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let window = (0..FFT_SIZE).map(|i| blackman_window(i, FFT_SIZE)).collect();
        Self {
            mono,
            sample_rate,
            cursor: 0,
            fft,
            window,
            scratch: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            smoothed: vec![0.0; BINS],
        }
    }

    /// `len` samples ending at the cursor, zero before the track start.
    fn window_sample(&self, len: usize, i: usize) -> f32 {
        let start = self.cursor as isize - len as isize;
        let idx = start + i as isize;
        if idx < 0 {
            return 0.0;
        }
        self.mono.get(idx as usize).copied().unwrap_or(0.0)
    }

    fn frequency(&mut self, out: &mut Vec<u8>) {
        for i in 0..FFT_SIZE {
            let s = self.window_sample(FFT_SIZE, i) * self.window[i];
            self.scratch[i] = Complex::new(s, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let scale = 1.0 / FFT_SIZE as f32;
        for (bin, c) in self.smoothed.iter_mut().zip(&self.scratch) {
            let magnitude = c.norm() * scale;
            *bin = SMOOTHING * *bin + (1.0 - SMOOTHING) * magnitude;
        }
        out.extend(self.smoothed.iter().map(|&m| to_byte(m)));
    }

    fn time(&self, out: &mut Vec<u8>) {
        out.extend((0..BINS).map(|i| {
            let s = self.window_sample(BINS, i);
            (128.0 + s * 128.0).clamp(0.0, 255.0) as u8
        }));
    }
}

impl AnalysisSource for PcmAnalyser {
    fn frame_len(&self) -> usize {
        BINS
    }

    fn seek(&mut self, position: f64) {
        let position = if position.is_finite() { position.max(0.0) } else { 0.0 };
        self.cursor = (position * f64::from(self.sample_rate)) as usize;
    }

    fn read(&mut self, domain: AnalysisDomain, out: &mut Vec<u8>) {
        out.clear();
        match domain {
            AnalysisDomain::Frequency => self.frequency(out),
            AnalysisDomain::Time => self.time(out),
        }
    }
}

fn blackman_window(index: usize, size: usize) -> f32 {
    let x = index as f32 / size as f32;
    0.42 - 0.5 * (TAU * x).cos() + 0.08 * (2.0 * TAU * x).cos()
}

/// Magnitude to 0..=255 over the [`MIN_DB`, `MAX_DB`] range.
fn to_byte(magnitude: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = (db - MIN_DB) / (MAX_DB - MIN_DB) * 255.0;
    scaled.clamp(0.0, 255.0) as u8
}
