use egui::{Color32, DragValue, Slider};

use music_visualizer::config::{
    BarStyle, LogoCorner, ProgressEdge, MAX_CHANNELS, MAX_SMOOTHING,
};
use music_visualizer::transport::format_time;
use music_visualizer::{LyricTrack, RenderConfig, Resolution, VisualizerKind};

use crate::app::{SettingsTab, VisualizerApp};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

impl VisualizerApp {
    pub fn draw_settings_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("🎵 Music Visualizer");
        ui.horizontal_wrapped(|ui| {
            for tab in SettingsTab::ALL {
                if ui.selectable_label(self.tab == tab, tab.label()).clicked() {
                    self.tab = tab;
                }
            }
        });
        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| match self.tab {
            SettingsTab::Visualizer => self.draw_visualizer_tab(ui),
            SettingsTab::Background => self.draw_background_tab(ui),
            SettingsTab::Lyrics => self.draw_lyrics_tab(ui),
            SettingsTab::Overlays => self.draw_overlays_tab(ui),
            SettingsTab::Output => self.draw_output_tab(ui),
        });
    }

    fn draw_visualizer_tab(&mut self, ui: &mut egui::Ui) {
        let config = &mut self.config;
        ui.collapsing("Mode", |ui| {
            ui.horizontal_wrapped(|ui| {
                for kind in VisualizerKind::ALL {
                    if ui.selectable_label(config.kind == kind, kind.label()).clicked() {
                        config.kind = kind;
                    }
                }
            });
        });

        ui.collapsing("Shape", |ui| {
            ui.add_enabled_ui(config.kind.uses_channels(), |ui| {
                ui.horizontal(|ui| {
                    ui.label("Channels:");
                    ui.add(DragValue::new(&mut config.channel_count).range(1..=MAX_CHANNELS));
                });
            });
            ui.add(Slider::new(&mut config.smoothing, 0.0..=MAX_SMOOTHING).text("Smoothing"));
            ui.add(Slider::new(&mut config.position, 0.0..=100.0).text("Vertical position"));
            ui.horizontal(|ui| {
                ui.label("Bar style:");
                ui.radio_value(&mut config.bar_style, BarStyle::Rounded, "Rounded");
                ui.radio_value(&mut config.bar_style, BarStyle::Sharp, "Sharp");
            });
            if config.kind == VisualizerKind::ParticleField {
                ui.horizontal(|ui| {
                    ui.label("Particle cap:");
                    ui.add(DragValue::new(&mut config.particle_cap).range(1..=20_000));
                });
            }
        });

        ui.collapsing("Colors", |ui| {
            ui.horizontal(|ui| {
                ui.label("Primary:");
                ui.color_edit_button_srgba(&mut config.primary);
                ui.label("Secondary:");
                ui.color_edit_button_srgba(&mut config.secondary);
            });
            ui.checkbox(&mut config.gradient, "Gradient");
        });

        ui.separator();
        if ui.button("🔄 Reset Settings").clicked() {
            *config = RenderConfig::default();
        }
    }

    fn draw_background_tab(&mut self, ui: &mut egui::Ui) {
        let background = &mut self.config.background;
        ui.horizontal(|ui| {
            ui.label("Color:");
            ui.color_edit_button_srgba(&mut background.color);
        });
        ui.horizontal(|ui| {
            if ui.button("🖼 Image...").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Image", &IMAGE_EXTENSIONS)
                    .pick_file()
                {
                    background.image = Some(path);
                }
            }
            if background.image.is_some() && ui.small_button("✕").clicked() {
                background.image = None;
            }
        });
        if let Some(path) = &background.image {
            ui.small(path.display().to_string());
        }
        ui.add(Slider::new(&mut background.opacity, 0.0..=1.0).text("Opacity"));
        ui.add(Slider::new(&mut background.blur, 0.0..=40.0).text("Blur"));
    }

    fn draw_lyrics_tab(&mut self, ui: &mut egui::Ui) {
        ui.collapsing("Style", |ui| {
            let style = &mut self.config.lyrics;
            ui.add(Slider::new(&mut style.font_size, 8.0..=160.0).text("Font size"));
            ui.horizontal(|ui| {
                ui.label("Text:");
                ui.color_edit_button_srgba(&mut style.font_color);
                ui.label("Box:");
                ui.color_edit_button_srgba(&mut style.highlight_color);
            });
            ui.add(Slider::new(&mut style.position_x, 0.0..=100.0).text("X %"));
            ui.add(Slider::new(&mut style.position_y, 0.0..=100.0).text("Y %"));
            ui.horizontal(|ui| {
                ui.label("Font:");
                ui.text_edit_singleline(&mut style.font_family);
            });
        });

        ui.horizontal(|ui| {
            if ui.button("📂 Load .lrc").clicked() {
                self.load_lyrics_dialog();
            }
            if ui.button("Apply text").clicked() {
                self.lyrics.replace_text(&self.lyrics_text);
            }
        });
        ui.add(
            egui::TextEdit::multiline(&mut self.lyrics_text)
                .desired_rows(6)
                .hint_text("One line per lyric"),
        );

        let position = self.player.position();
        let active = self.lyrics.active_index(position);
        let mut sync: Option<usize> = None;
        ui.label(format!("Lines ({}), sync stamps the playback time:", self.lyrics.len()));
        egui::ScrollArea::vertical().max_height(220.0).show(ui, |ui| {
            for (idx, line) in self.lyrics.lines().iter().enumerate() {
                ui.horizontal(|ui| {
                    if ui.small_button("⏱").clicked() {
                        sync = Some(idx);
                    }
                    ui.label(format_time(line.time));
                    if active == Some(idx) {
                        ui.colored_label(Color32::from_rgb(224, 64, 251), &line.text);
                    } else {
                        ui.label(&line.text);
                    }
                });
            }
        });
        if let Some(idx) = sync {
            self.lyrics.sync(idx, position);
            self.refresh_lyrics_text();
        }
    }

    fn draw_overlays_tab(&mut self, ui: &mut egui::Ui) {
        let config = &mut self.config;
        ui.collapsing("Timer and progress", |ui| {
            ui.checkbox(&mut config.overlays.show_timer, "Show timer");
            ui.checkbox(&mut config.overlays.show_progress, "Show progress bar");
            ui.horizontal(|ui| {
                ui.label("Progress edge:");
                ui.radio_value(&mut config.overlays.progress_edge, ProgressEdge::Top, "Top");
                ui.radio_value(&mut config.overlays.progress_edge, ProgressEdge::Bottom, "Bottom");
            });
        });

        ui.collapsing("Logo", |ui| {
            let logo = &mut config.logo;
            ui.horizontal(|ui| {
                if ui.button("🖼 Logo...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Image", &IMAGE_EXTENSIONS)
                        .pick_file()
                    {
                        logo.image = Some(path);
                    }
                }
                if logo.image.is_some() && ui.small_button("✕").clicked() {
                    logo.image = None;
                }
            });
            ui.add(Slider::new(&mut logo.size, 1.0..=50.0).text("Width %"));
            ui.add(Slider::new(&mut logo.opacity, 0.0..=1.0).text("Opacity"));
            egui::ComboBox::from_label("Corner")
                .selected_text(corner_label(logo.corner))
                .show_ui(ui, |ui| {
                    for corner in [
                        LogoCorner::TopLeft,
                        LogoCorner::TopRight,
                        LogoCorner::BottomLeft,
                        LogoCorner::BottomRight,
                        LogoCorner::Center,
                    ] {
                        ui.selectable_value(&mut logo.corner, corner, corner_label(corner));
                    }
                });
        });
    }

    fn draw_output_tab(&mut self, ui: &mut egui::Ui) {
        ui.collapsing("Resolution", |ui| {
            let resolution = &mut self.config.resolution;
            ui.horizontal_wrapped(|ui| {
                for (name, preset) in Resolution::PRESETS {
                    if ui.selectable_label(*resolution == preset, name).clicked() {
                        *resolution = preset;
                    }
                }
            });
            ui.horizontal(|ui| {
                ui.add(DragValue::new(&mut resolution.width).range(16..=8192));
                ui.label("×");
                ui.add(DragValue::new(&mut resolution.height).range(16..=8192));
            });
        });

        ui.collapsing("Export", |ui| {
            ui.horizontal(|ui| {
                ui.label("FPS:");
                ui.add(DragValue::new(&mut self.export_fps).range(1..=120));
                if self.player.track().is_none() {
                    ui.label("Length:");
                    ui.add(DragValue::new(&mut self.demo_duration).range(1.0..=600.0).suffix(" s"));
                }
            });
            ui.horizontal(|ui| {
                if ui.button("📁 Folder...").clicked() {
                    if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                        self.export_dir = Some(dir);
                    }
                }
                if let Some(dir) = &self.export_dir {
                    ui.small(dir.display().to_string());
                }
            });
            match &self.export {
                Some(job) => {
                    let (done, total) = job.progress();
                    let fraction = if total == 0 { 0.0 } else { done as f32 / total as f32 };
                    ui.add(egui::ProgressBar::new(fraction).text(format!("{done} / {total}")));
                    if ui.button("Cancel").clicked() {
                        job.cancel();
                    }
                }
                None => {
                    if ui.button("⏺ Export PNG sequence").clicked() {
                        self.start_export();
                    }
                }
            }
        });

        ui.collapsing("Settings file", |ui| {
            if ui.button("📂 Load...").clicked() {
                self.load_settings_dialog();
            }
        });
    }

    fn load_lyrics_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Lyrics", &["lrc", "txt"])
            .pick_file()
        else {
            return;
        };
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                self.lyrics = LyricTrack::parse(&text);
                self.refresh_lyrics_text();
                tracing::info!(path = %path.display(), lines = self.lyrics.len(), "lyrics loaded");
            }
            Err(err) => {
                tracing::warn!(%err, path = %path.display(), "could not read lyrics");
                self.status = Some(err.to_string());
            }
        }
    }

    fn refresh_lyrics_text(&mut self) {
        self.lyrics_text = self
            .lyrics
            .lines()
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
    }

    fn load_settings_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Settings", &["json"])
            .pick_file()
        else {
            return;
        };
        match RenderConfig::load(&path) {
            Ok(config) => self.config = config,
            Err(err) => {
                tracing::warn!(%err, "could not load settings");
                self.status = Some(err.to_string());
            }
        }
    }
}

fn corner_label(corner: LogoCorner) -> &'static str {
    match corner {
        LogoCorner::TopLeft => "Top left",
        LogoCorner::TopRight => "Top right",
        LogoCorner::BottomLeft => "Bottom left",
        LogoCorner::BottomRight => "Bottom right",
        LogoCorner::Center => "Center",
    }
}
