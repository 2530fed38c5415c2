//! Frame loop: Idle until surface, source and playback are all present,
//! then exactly one frame scheduled at a time.

use std::collections::VecDeque;

use crate::audio::AnalysisSource;
use crate::canvas::Canvas;
use crate::engine::{FrameInputs, VisualizerEngine};

/// Identity of one scheduled frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Host hook that arranges for `FrameLoop::tick` to be called once per
/// scheduled token.
pub trait FrameScheduler {
    fn schedule(&mut self) -> FrameToken;

    /// Drop a scheduled callback. Unknown or already cancelled tokens are
    /// ignored.
    fn cancel(&mut self, token: FrameToken);
}

/// Scheduler that only queues tokens; the caller pops and delivers them.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next: u64,
    queue: VecDeque<FrameToken>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn next_due(&mut self) -> Option<FrameToken> {
        self.queue.pop_front()
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule(&mut self) -> FrameToken {
        self.next += 1;
        let token = FrameToken(self.next);
        self.queue.push_back(token);
        token
    }

    fn cancel(&mut self, token: FrameToken) {
        self.queue.retain(|t| *t != token);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Animating,
}

pub struct FrameLoop<C: Canvas, S: FrameScheduler> {
    engine: VisualizerEngine,
    scheduler: S,
    canvas: Option<C>,
    source: Option<Box<dyn AnalysisSource + Send>>,
    playing: bool,
    state: LoopState,
    pending: Option<FrameToken>,
}

impl<C: Canvas, S: FrameScheduler> FrameLoop<C, S> {
    pub fn new(engine: VisualizerEngine, scheduler: S) -> Self {
        Self {
            engine,
            scheduler,
            canvas: None,
            source: None,
            playing: false,
            state: LoopState::Idle,
            pending: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_animating(&self) -> bool {
        self.state == LoopState::Animating
    }

    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    pub fn engine(&self) -> &VisualizerEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut VisualizerEngine {
        &mut self.engine
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn canvas(&self) -> Option<&C> {
        self.canvas.as_ref()
    }

    pub fn canvas_mut(&mut self) -> Option<&mut C> {
        self.canvas.as_mut()
    }

    fn ready(&self) -> bool {
        self.canvas.is_some() && self.source.is_some() && self.playing
    }

    fn reevaluate(&mut self) {
        if self.ready() {
            self.start();
        } else {
            self.stop();
        }
    }

    pub fn attach_source(&mut self, source: Box<dyn AnalysisSource + Send>) {
        self.source = Some(source);
        self.reevaluate();
    }

    pub fn detach_source(&mut self) -> Option<Box<dyn AnalysisSource + Send>> {
        let source = self.source.take();
        self.reevaluate();
        source
    }

    pub fn attach_surface(&mut self, canvas: C) {
        self.canvas = Some(canvas);
        self.reevaluate();
    }

    pub fn detach_surface(&mut self) -> Option<C> {
        let canvas = self.canvas.take();
        self.reevaluate();
        canvas
    }

    pub fn set_playing(&mut self, playing: bool) {
        if self.playing != playing {
            tracing::debug!(playing, "playback state changed");
        }
        self.playing = playing;
        self.reevaluate();
    }

    /// Enter Animating with one frame scheduled. Returns false, staying
    /// Idle, if a dependency is missing.
    pub fn start(&mut self) -> bool {
        if !self.ready() {
            return false;
        }
        if self.state == LoopState::Idle {
            self.pending = Some(self.scheduler.schedule());
            self.state = LoopState::Animating;
            tracing::debug!(token = ?self.pending, "frame loop started");
        }
        true
    }

    /// Cancel the pending frame and go Idle. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel(token);
        }
        if self.state == LoopState::Animating {
            tracing::debug!("frame loop stopped");
        }
        self.state = LoopState::Idle;
    }

    /// Run the frame for `token`. Ticks for anything but the pending token
    /// are dropped. Returns whether a frame was drawn.
    pub fn tick(&mut self, token: FrameToken, inputs: &FrameInputs<'_>) -> bool {
        if self.state != LoopState::Animating || self.pending != Some(token) {
            tracing::trace!(?token, pending = ?self.pending, "dropping orphaned tick");
            return false;
        }
        self.pending = Some(self.scheduler.schedule());

        let (Some(canvas), Some(source)) = (self.canvas.as_mut(), self.source.as_mut()) else {
            return false;
        };
        source.seek(inputs.transport.position);
        self.engine
            .render_frame(canvas, Some(source.as_mut()), inputs);
        true
    }

    /// Track change.
    pub fn reset(&mut self) {
        self.engine.reset();
    }

    pub fn load_track(&mut self, samples: Vec<f32>, envelope_points: usize) {
        self.engine.load_track(samples, envelope_points);
    }

    /// Stop and let go of surface and source.
    pub fn dispose(&mut self) {
        self.stop();
        self.canvas = None;
        self.source = None;
        self.playing = false;
        self.engine.reset();
        tracing::debug!("frame loop disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::DemoSignal;
    use crate::canvas::DisplayList;
    use crate::config::RenderConfig;
    use crate::surface::Resolution;

    type TestLoop = FrameLoop<DisplayList, ManualScheduler>;

    fn new_loop() -> TestLoop {
        FrameLoop::new(VisualizerEngine::with_seed(5), ManualScheduler::new())
    }

    fn small_config() -> RenderConfig {
        let mut c = RenderConfig::default();
        c.resolution = Resolution::new(64, 32);
        c
    }

    fn ready_loop() -> TestLoop {
        let mut l = new_loop();
        l.attach_surface(DisplayList::new(64, 32));
        l.attach_source(Box::new(DemoSignal::new(64)));
        l.set_playing(true);
        l
    }

    #[test]
    fn idle_until_every_dependency_is_present() {
        let mut l = new_loop();
        assert!(!l.start());
        l.attach_surface(DisplayList::new(64, 32));
        l.set_playing(true);
        assert_eq!(l.state(), LoopState::Idle);
        assert_eq!(l.scheduler().pending(), 0);
        l.attach_source(Box::new(DemoSignal::new(64)));
        assert_eq!(l.state(), LoopState::Animating);
        assert_eq!(l.scheduler().pending(), 1);
    }

    #[test]
    fn tick_rearms_before_drawing() {
        let mut l = ready_loop();
        let config = small_config();
        let token = l.scheduler_mut().next_due().unwrap();
        assert!(l.tick(token, &FrameInputs::new(&config)));
        assert_eq!(l.scheduler().pending(), 1);
        assert_ne!(l.pending(), Some(token));
        assert!(!l.canvas().unwrap().last_frame().is_empty());
    }

    #[test]
    fn orphaned_ticks_are_dropped() {
        let mut l = ready_loop();
        let config = small_config();
        let token = l.scheduler_mut().next_due().unwrap();
        l.set_playing(false);
        assert!(!l.tick(token, &FrameInputs::new(&config)));
        assert_eq!(l.scheduler().pending(), 0);
        assert!(!l.tick(FrameToken(999), &FrameInputs::new(&config)));
    }

    #[test]
    fn stop_is_idempotent() {
        let mut l = ready_loop();
        l.stop();
        l.stop();
        assert_eq!(l.state(), LoopState::Idle);
        assert_eq!(l.pending(), None);
        assert_eq!(l.scheduler().pending(), 0);
    }

    #[test]
    fn detaching_the_surface_cancels() {
        let mut l = ready_loop();
        let canvas = l.detach_surface();
        assert!(canvas.is_some());
        assert_eq!(l.state(), LoopState::Idle);
        assert_eq!(l.scheduler().pending(), 0);
        l.attach_surface(DisplayList::new(8, 8));
        assert_eq!(l.scheduler().pending(), 1);
    }

    #[test]
    fn at_most_one_frame_outstanding() {
        let mut l = ready_loop();
        let config = small_config();
        for _ in 0..10 {
            l.set_playing(true);
            assert!(l.start());
            let token = l.scheduler_mut().next_due().unwrap();
            l.tick(token, &FrameInputs::new(&config));
            assert_eq!(l.scheduler().pending(), 1);
        }
    }

    #[test]
    fn dispose_releases_everything() {
        let mut l = ready_loop();
        l.dispose();
        assert!(l.canvas().is_none());
        assert_eq!(l.state(), LoopState::Idle);
        assert!(!l.start());
    }
}
