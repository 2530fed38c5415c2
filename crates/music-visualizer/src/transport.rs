/// Playback clock snapshot handed to every frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransportState {
    /// Seconds from track start.
    pub position: f64,
    pub duration: f64,
    pub playing: bool,
}

impl TransportState {
    pub fn new(position: f64, duration: f64, playing: bool) -> Self {
        Self {
            position,
            duration,
            playing,
        }
    }

    /// Played share of the track in `[0, 1]`; 0 when the duration is unknown.
    pub fn progress_fraction(&self) -> f32 {
        if !self.duration.is_finite() || self.duration <= 0.0 || !self.position.is_finite() {
            return 0.0;
        }
        (self.position / self.duration).clamp(0.0, 1.0) as f32
    }

    /// `"mm:ss / mm:ss"` as shown by the timer overlay.
    pub fn timer_label(&self) -> String {
        format!(
            "{} / {}",
            format_time(self.position),
            format_time(self.duration)
        )
    }
}

pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }
    let mins = (seconds / 60.0) as u64;
    let secs = (seconds % 60.0) as u64;
    format!("{:02}:{:02}", mins, secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(61.9), "01:01");
        assert_eq!(format_time(3599.0), "59:59");
        assert_eq!(format_time(6000.0), "100:00");
    }

    #[test]
    fn garbage_times_read_as_zero() {
        assert_eq!(format_time(f64::NAN), "00:00");
        assert_eq!(format_time(f64::INFINITY), "00:00");
        assert_eq!(format_time(-5.0), "00:00");
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(TransportState::new(30.0, 120.0, true).progress_fraction(), 0.25);
        assert_eq!(TransportState::new(500.0, 120.0, true).progress_fraction(), 1.0);
        assert_eq!(TransportState::new(10.0, 0.0, true).progress_fraction(), 0.0);
        assert_eq!(TransportState::new(10.0, f64::NAN, true).progress_fraction(), 0.0);
    }

    #[test]
    fn timer_label_joins_both_times() {
        let t = TransportState::new(65.0, 200.0, false);
        assert_eq!(t.timer_label(), "01:05 / 03:20");
    }
}
