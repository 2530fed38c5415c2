//! Time-stamped lyric lines.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimedLyric {
    /// Seconds from track start at which the line becomes active.
    pub time: f64,
    pub text: String,
}

impl TimedLyric {
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LyricTrack {
    lines: Vec<TimedLyric>,
}

impl LyricTrack {
    pub fn new(lines: Vec<TimedLyric>) -> Self {
        Self { lines }
    }

    /// One line per non-blank input line. A leading `[mm:ss.ff]` or `mm:ss`
    /// stamp sets the time; unstamped lines start at 0.
    pub fn parse(text: &str) -> Self {
        let mut lines: Vec<TimedLyric> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|line| match split_stamp(line) {
                Some((time, rest)) => TimedLyric::new(time, rest),
                None => TimedLyric::new(0.0, line),
            })
            .collect();
        lines.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { lines }
    }

    pub fn lines(&self) -> &[TimedLyric] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Index of the line showing at `position`: the greatest start time not
    /// after it, the later line winning a tie.
    pub fn active_index(&self, position: f64) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, line) in self.lines.iter().enumerate() {
            if line.time > position {
                continue;
            }
            match best {
                Some(b) if self.lines[b].time > line.time => {}
                _ => best = Some(i),
            }
        }
        best
    }

    pub fn active_at(&self, position: f64) -> Option<&TimedLyric> {
        self.active_index(position).map(|i| &self.lines[i])
    }

    /// Swap in new text, keeping the time already assigned to each line index.
    pub fn replace_text(&mut self, text: &str) {
        let lines = text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .enumerate()
            .map(|(i, l)| {
                let time = self.lines.get(i).map_or(0.0, |old| old.time);
                TimedLyric::new(time, l)
            })
            .collect();
        self.lines = lines;
    }

    /// Stamp line `index` with `position` and keep the track ordered by time.
    pub fn sync(&mut self, index: usize, position: f64) {
        let Some(line) = self.lines.get_mut(index) else {
            return;
        };
        line.time = if position.is_finite() { position.max(0.0) } else { 0.0 };
        self.lines.sort_by(|a, b| a.time.total_cmp(&b.time));
    }
}

fn split_stamp(line: &str) -> Option<(f64, &str)> {
    let (stamp, rest) = if let Some(inner) = line.strip_prefix('[') {
        let end = inner.find(']')?;
        (&inner[..end], &inner[end + 1..])
    } else {
        let end = line.find(char::is_whitespace).unwrap_or(line.len());
        (&line[..end], &line[end..])
    };
    let (mins, secs) = stamp.split_once(':')?;
    let mins: f64 = mins.parse().ok()?;
    let secs: f64 = secs.parse().ok()?;
    if mins < 0.0 || !(0.0..60.0).contains(&secs) {
        return None;
    }
    Some((mins * 60.0 + secs, rest.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> LyricTrack {
        LyricTrack::new(vec![
            TimedLyric::new(0.0, "intro"),
            TimedLyric::new(5.0, "first"),
            TimedLyric::new(10.0, "second"),
        ])
    }

    #[test]
    fn picks_latest_started_line() {
        let t = track();
        assert_eq!(t.active_at(0.0).map(|l| l.text.as_str()), Some("intro"));
        assert_eq!(t.active_at(7.5).map(|l| l.text.as_str()), Some("first"));
        assert_eq!(t.active_at(99.0).map(|l| l.text.as_str()), Some("second"));
    }

    #[test]
    fn nothing_before_first_line() {
        let t = LyricTrack::new(vec![TimedLyric::new(3.0, "late")]);
        assert!(t.active_at(2.9).is_none());
        assert!(LyricTrack::default().active_at(10.0).is_none());
    }

    #[test]
    fn later_line_wins_a_tie() {
        let t = LyricTrack::new(vec![TimedLyric::new(0.0, "a"), TimedLyric::new(0.0, "b")]);
        assert_eq!(t.active_at(1.0).map(|l| l.text.as_str()), Some("b"));
    }

    #[test]
    fn replace_keeps_times_by_index() {
        let mut t = track();
        t.replace_text("one\n\n  \ntwo\nthree\nfour");
        let times: Vec<f64> = t.lines().iter().map(|l| l.time).collect();
        assert_eq!(times, vec![0.0, 5.0, 10.0, 0.0]);
        assert_eq!(t.lines()[3].text, "four");
    }

    #[test]
    fn sync_reorders() {
        let mut t = track();
        t.sync(0, 12.0);
        let texts: Vec<&str> = t.lines().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "intro"]);
        t.sync(42, 1.0);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn parses_stamped_and_plain_lines() {
        let t = LyricTrack::parse("[00:12.50] hello\n01:02 world\nplain line\n\n");
        let got: Vec<(f64, &str)> = t.lines().iter().map(|l| (l.time, l.text.as_str())).collect();
        assert_eq!(got, vec![(0.0, "plain line"), (12.5, "hello"), (62.0, "world")]);
    }
}
