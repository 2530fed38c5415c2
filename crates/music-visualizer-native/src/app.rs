use std::path::PathBuf;
use std::sync::Arc;

use egui::{pos2, Color32, Rect, TextureHandle, TextureOptions};

use music_visualizer::capture::DEFAULT_FPS;
use music_visualizer::surface::fit_to_container;
use music_visualizer::{
    Canvas, DemoSignal, FrameInputs, FrameLoop, FrameScheduler, FrameToken, LyricTrack,
    PixmapSurface, RenderConfig, VisualizerEngine,
};

use crate::analyser::PcmAnalyser;
use crate::export::{ExportJob, ExportRequest};
use crate::player::{DecodedTrack, Player};

/// Frame scheduling on top of egui repaints: a scheduled token becomes due
/// on the next `update`.
pub struct RepaintScheduler {
    ctx: egui::Context,
    next: u64,
    due: Option<FrameToken>,
}

impl RepaintScheduler {
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            ctx,
            next: 0,
            due: None,
        }
    }

    pub fn take_due(&mut self) -> Option<FrameToken> {
        self.due.take()
    }
}

impl FrameScheduler for RepaintScheduler {
    fn schedule(&mut self) -> FrameToken {
        self.next += 1;
        let token = FrameToken(self.next);
        self.due = Some(token);
        self.ctx.request_repaint();
        token
    }

    fn cancel(&mut self, token: FrameToken) {
        if self.due == Some(token) {
            self.due = None;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsTab {
    Visualizer,
    Background,
    Lyrics,
    Overlays,
    Output,
}

impl SettingsTab {
    pub const ALL: [SettingsTab; 5] = [
        SettingsTab::Visualizer,
        SettingsTab::Background,
        SettingsTab::Lyrics,
        SettingsTab::Overlays,
        SettingsTab::Output,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingsTab::Visualizer => "🎚 Visualizer",
            SettingsTab::Background => "🖼 Background",
            SettingsTab::Lyrics => "🎤 Lyrics",
            SettingsTab::Overlays => "⏱ Overlays",
            SettingsTab::Output => "💾 Output",
        }
    }
}

pub struct VisualizerApp {
    pub config: RenderConfig,
    pub lyrics: LyricTrack,
    pub lyrics_text: String,
    pub player: Player,
    pub frame_loop: FrameLoop<PixmapSurface, RepaintScheduler>,
    pub texture: Option<TextureHandle>,
    pub show_settings: bool,
    pub tab: SettingsTab,
    pub export: Option<ExportJob>,
    pub export_dir: Option<PathBuf>,
    pub export_fps: u32,
    pub demo_duration: f64,
    pub status: Option<String>,
}

impl VisualizerApp {
    pub fn new(
        ctx: &egui::Context,
        config: RenderConfig,
        lyrics: LyricTrack,
        track: Option<DecodedTrack>,
    ) -> Self {
        let frame_loop = FrameLoop::new(
            VisualizerEngine::new(),
            RepaintScheduler::new(ctx.clone()),
        );
        let lyrics_text = lyrics
            .lines()
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let mut app = Self {
            config,
            lyrics,
            lyrics_text,
            player: Player::new(),
            frame_loop,
            texture: None,
            show_settings: true,
            tab: SettingsTab::Visualizer,
            export: None,
            export_dir: None,
            export_fps: DEFAULT_FPS,
            demo_duration: 10.0,
            status: None,
        };
        match track {
            Some(track) => app.load_track(track),
            None => app.use_demo_signal(),
        }
        app
    }

    pub fn use_demo_signal(&mut self) {
        self.player.stop();
        self.frame_loop.reset();
        self.frame_loop
            .attach_source(Box::new(DemoSignal::default()));
    }

    /// Swap the playing track. Engine state from the old one is dropped.
    pub fn load_track(&mut self, track: DecodedTrack) {
        let mono = track.mono();
        self.status = Some(format!("Loaded {}", track.name()));
        let analyser = PcmAnalyser::new(Arc::new(mono.clone()), track.sample_rate);
        self.frame_loop
            .load_track(mono, self.config.envelope_points);
        self.frame_loop.attach_source(Box::new(analyser));
        self.player.load(track);
    }

    pub fn open_track_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Audio", &["mp3", "wav", "ogg", "flac"])
            .set_title("Select audio file")
            .pick_file()
        else {
            return;
        };
        match DecodedTrack::open(&path) {
            Ok(track) => self.load_track(track),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "could not load track");
                self.status = Some(format!("{err:#}"));
            }
        }
    }

    pub fn start_export(&mut self) {
        let Some(out_dir) = self.export_dir.clone() else {
            self.status = Some("Choose an output folder first".into());
            return;
        };
        let request = ExportRequest {
            config: self.config.sanitized(),
            lyrics: self.lyrics.clone(),
            track: self.player.track().cloned(),
            out_dir,
            fps: self.export_fps.max(1),
            demo_duration: self.demo_duration,
        };
        match ExportJob::spawn(request) {
            Ok(job) => {
                self.export = Some(job);
                self.status = Some("Exporting...".into());
            }
            Err(err) => self.status = Some(format!("{err:#}")),
        }
    }

    fn poll_export(&mut self) {
        let Some(job) = self.export.as_mut() else {
            return;
        };
        match job.try_finish() {
            None => {}
            Some(Ok(frames)) => {
                tracing::info!(frames, "export finished");
                self.status = Some(format!("Exported {frames} frames"));
                self.export = None;
            }
            Some(Err(err)) => {
                tracing::error!(error = %format!("{err:#}"), "export failed");
                self.status = Some(format!("Export failed: {err:#}"));
                self.export = None;
            }
        }
    }

    fn sync_playback(&mut self) {
        if self.player.finished() {
            self.player.stop();
        }
        self.frame_loop.set_playing(self.player.is_playing());
    }

    /// Run the due frame, if any, and push its pixels to the GPU texture.
    fn draw_due_frame(&mut self, ctx: &egui::Context) {
        let Some(token) = self.frame_loop.scheduler_mut().take_due() else {
            return;
        };
        let transport = self.player.transport();
        let inputs = FrameInputs {
            config: &self.config,
            transport,
            lyric: self.lyrics.active_at(transport.position),
        };
        if !self.frame_loop.tick(token, &inputs) {
            return;
        }
        let Some(surface) = self.frame_loop.canvas() else {
            return;
        };
        let (w, h) = surface.size();
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [w as usize, h as usize],
            &surface.to_rgba(),
        );
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("visualizer", image, TextureOptions::LINEAR));
            }
        }
    }

    fn ensure_surface(&mut self) {
        if self.frame_loop.canvas().is_some() {
            return;
        }
        let resolution = self.config.resolution.clamped();
        match PixmapSurface::new(resolution.width, resolution.height) {
            Ok(surface) => self.frame_loop.attach_surface(surface),
            Err(err) => {
                tracing::error!(%err, "could not allocate the drawing surface");
                self.status = Some(err.to_string());
            }
        }
    }

    fn draw_transport(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let icon = if self.player.is_playing() { "⏸" } else { "▶" };
            if ui.button(icon).clicked() {
                self.player.toggle();
            }
            if ui.button("⏹").clicked() {
                self.player.stop();
            }
            if ui.button("📂 Open").clicked() {
                self.open_track_dialog();
            }
            let transport = self.player.transport();
            ui.label(transport.timer_label());
            let response = ui.add(
                egui::ProgressBar::new(transport.progress_fraction())
                    .desired_width((ui.available_width() - 140.0).max(40.0)),
            );
            if response.clicked() || response.dragged() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let rect = response.rect;
                    let ratio = f64::from(((pos.x - rect.left()) / rect.width()).clamp(0.0, 1.0));
                    self.player.seek(ratio * transport.duration);
                }
            }
            let mut volume = self.player.volume();
            if ui
                .add(egui::Slider::new(&mut volume, 0.0..=1.0).show_value(false).text("🔊"))
                .changed()
            {
                self.player.set_volume(volume);
            }
        });
    }
}

impl eframe::App for VisualizerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_export();
        if ctx.input(|i| i.key_pressed(egui::Key::Space)) && !ctx.wants_keyboard_input() {
            self.player.toggle();
        }
        self.sync_playback();
        self.ensure_surface();
        self.draw_due_frame(ctx);

        if self.export.is_some() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        egui::TopBottomPanel::bottom("transport").show(ctx, |ui| {
            self.draw_transport(ui);
            if let Some(status) = &self.status {
                ui.small(status);
            }
        });

        if self.show_settings {
            egui::SidePanel::left("settings_panel")
                .resizable(true)
                .default_width(300.0)
                .show(ctx, |ui| {
                    self.draw_settings_panel(ui);
                    ui.separator();
                    if ui.button("◀ Hide").clicked() {
                        self.show_settings = false;
                    }
                });
        } else {
            egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
                if ui.button("▶ Show Settings").clicked() {
                    self.show_settings = true;
                }
            });
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(Color32::BLACK))
            .show(ctx, |ui| {
                let container = ui.available_rect_before_wrap();
                let rect = fit_to_container(container, self.config.resolution.clamped());
                if let Some(texture) = &self.texture {
                    ui.painter().image(
                        texture.id(),
                        rect,
                        Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                        Color32::WHITE,
                    );
                }
            });
    }
}

impl Drop for VisualizerApp {
    fn drop(&mut self) {
        if let Some(job) = &self.export {
            job.cancel();
        }
        self.player.stop();
        self.frame_loop.dispose();
    }
}
