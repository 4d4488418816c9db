use std::path::PathBuf;

use eframe::egui;
use egui_extras::{Column, TableBuilder};

use crate::export;
use crate::render::ColorRamp;
use crate::session::Session;
use crate::settings::Settings;

pub struct MatrixLabelerApp {
    session: Session,
    /// Loaded on the first frame, once the texture limit is known.
    startup_load: Option<PathBuf>,
    texture: Option<(u64, egui::TextureHandle)>,
    cursor: Option<egui::Pos2>,
    canvas_size: egui::Vec2,
}

#[derive(Default)]
struct Requests {
    load: bool,
    save: bool,
    save_image: bool,
    undo: bool,
}

impl MatrixLabelerApp {
    pub fn new(settings: Settings, initial: Option<PathBuf>) -> Self {
        Self {
            session: Session::new(settings),
            startup_load: initial,
            texture: None,
            cursor: None,
            canvas_size: egui::vec2(800.0, 600.0),
        }
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        let Some(loaded) = self.session.loaded() else {
            self.texture = None;
            return;
        };
        let generation = self.session.generation();
        if matches!(&self.texture, Some((g, _)) if *g == generation) {
            return;
        }
        let size = [loaded.bitmap.width() as usize, loaded.bitmap.height() as usize];
        if !self.session.fits_display(size[1], size[0]) {
            // refused at load time; never hand an oversized image to the painter
            self.texture = None;
            return;
        }
        let color_image = egui::ColorImage::from_rgb(size, loaded.bitmap.as_raw());
        let texture = ctx.load_texture("matrix", color_image, egui::TextureOptions::NEAREST);
        self.texture = Some((generation, texture));
    }

    fn load_dialog(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Open matrix file")
            .add_filter("matrix files", &["txt"])
            .pick_file();
        if let Some(path) = picked {
            let _ = self.session.load(&path);
        }
    }

    fn save_dialog(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Save Rectangles")
            .set_file_name("rectangles.txt")
            .add_filter("Text Files", &["txt"])
            .add_filter("JSON Files", &["json"])
            .save_file();
        if let Some(path) = picked {
            let _ = self.session.save(&path);
        }
    }

    fn save_image_dialog(&mut self) {
        if self.session.loaded().is_none() {
            return;
        }
        let default_name = self
            .session
            .loaded()
            .and_then(|l| l.path.file_stem())
            .and_then(|s| s.to_str())
            .map(|stem| format!("{stem}_labeled.png"))
            .unwrap_or_else(|| "labeled.png".to_string());
        let picked = rfd::FileDialog::new()
            .set_title("Save labeled image")
            .set_file_name(&default_name)
            .add_filter("PNG", &["png"])
            .save_file();
        if let Some(path) = picked {
            if let Err(err) = self.session.save_bitmap(&path) {
                log::warn!("{err:#}");
                self.session.push_message(format!("Save failed: {err:#}"));
            }
        }
    }

    fn set_color_ramp(&mut self, ramp: ColorRamp) {
        self.session.set_color_ramp(ramp);
        if let Err(err) = self.session.settings.save() {
            log::warn!("cannot persist settings: {err:#}");
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui, requests: &mut Requests) {
        let canvas_center = (self.canvas_size * 0.5).to_pos2();
        ui.horizontal(|ui| {
            if ui.button("Load Image").clicked() {
                requests.load = true;
            }
            ui.separator();
            let idle = !self.session.store.is_drawing();
            if ui
                .add_enabled(idle && !self.session.rectangles().is_empty(), egui::Button::new("Undo"))
                .clicked()
            {
                requests.undo = true;
            }
            if ui.button("Save").clicked() {
                requests.save = true;
            }
            if ui
                .add_enabled(self.session.loaded().is_some(), egui::Button::new("Save image"))
                .clicked()
            {
                requests.save_image = true;
            }
            ui.separator();

            let viewport = &mut self.session.viewport;
            if ui.button("-").clicked() {
                viewport.zoom_out(canvas_center);
            }
            let (zmin, zmax) = viewport.zoom_bounds();
            let mut percent = viewport.zoom() * 100.0;
            let slider = egui::Slider::new(&mut percent, zmin * 100.0..=zmax * 100.0)
                .logarithmic(true)
                .suffix("%")
                .max_decimals(0);
            if ui.add(slider).changed() {
                viewport.set_zoom(percent / 100.0, canvas_center);
            }
            if ui.button("+").clicked() {
                viewport.zoom_in(canvas_center);
            }
            if ui.button("Fit").clicked() {
                if let Some(loaded) = self.session.loaded() {
                    let size = loaded.size();
                    self.session.viewport.fit(size, self.canvas_size);
                }
            }
            ui.separator();

            let mut ramp = self.session.settings.color_ramp;
            egui::ComboBox::from_label("Colors")
                .selected_text(ramp.label())
                .show_ui(ui, |ui| {
                    for option in ColorRamp::ALL {
                        ui.selectable_value(&mut ramp, option, option.label());
                    }
                });
            if ramp != self.session.settings.color_ramp {
                self.set_color_ramp(ramp);
            }
        });
    }

    fn bottom_panel(&self, ui: &mut egui::Ui) {
        ui.columns(3, |cols| {
            cols[0].label("message:");
            egui::ScrollArea::vertical()
                .id_salt("messages")
                .stick_to_bottom(true)
                .show(&mut cols[0], |ui| {
                    for line in self.session.messages() {
                        ui.monospace(line);
                    }
                });

            cols[1].horizontal(|ui| {
                ui.label("selected area (top left bottom right):");
                if ui.small_button("Copy").clicked() {
                    let lines = export::describe(self.session.rectangles());
                    ui.ctx().copy_text(lines.join("\n"));
                }
            });
            let rects = self.session.rectangles();
            TableBuilder::new(&mut cols[1])
                .striped(true)
                .column(Column::auto().at_least(40.0))
                .columns(Column::remainder(), 4)
                .header(18.0, |mut header| {
                    for title in ["Area", "left", "top", "right", "bottom"] {
                        header.col(|ui| {
                            ui.strong(title);
                        });
                    }
                })
                .body(|body| {
                    body.rows(16.0, rects.len(), |mut row| {
                        let i = row.index();
                        let r = rects[i];
                        row.col(|ui| {
                            ui.label((i + 1).to_string());
                        });
                        for value in [r.top_left.x, r.top_left.y, r.bottom_right.x, r.bottom_right.y] {
                            row.col(|ui| {
                                ui.monospace(value.to_string());
                            });
                        }
                    });
                });

            match self.cursor {
                Some(p) => cols[2].label(format!("Mouse Pos: {}, {}", p.x, p.y)),
                None => cols[2].label("Mouse Pos:"),
            };
            let value = self.cursor.zip(self.session.loaded()).and_then(|(p, loaded)| {
                loaded.matrix.get(p.y as usize, p.x as usize)
            });
            if let Some(value) = value {
                cols[2].label(format!("Value: {value}"));
            }
            let viewport = &self.session.viewport;
            let pan = viewport.pan_offset();
            cols[2].label(format!("Zoom: {:.0}%", viewport.zoom() * 100.0));
            cols[2].label(format!("Pan: {:.0}, {:.0}", pan.x, pan.y));
            if let Some(loaded) = self.session.loaded() {
                cols[2].label(format!(
                    "{} x {}",
                    loaded.matrix.rows(),
                    loaded.matrix.cols()
                ));
            }
        });
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let canvas_rect = response.rect;
        let origin = canvas_rect.min.to_vec2();
        let to_local = |p: egui::Pos2| p - origin;

        painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_gray(40));

        let Some(size) = self.session.loaded().map(|l| l.size()) else {
            painter.text(
                canvas_rect.center(),
                egui::Align2::CENTER_CENTER,
                "Load a matrix file to start labeling",
                egui::FontId::proportional(18.0),
                egui::Color32::from_gray(160),
            );
            self.cursor = None;
            return;
        };

        // Pan: middle or secondary drag
        if response.dragged_by(egui::PointerButton::Middle)
            || response.dragged_by(egui::PointerButton::Secondary)
        {
            self.session.viewport.pan(response.drag_delta());
        }

        // Zoom: one step per wheel event, anchored at the cursor
        let scroll_delta = ui.ctx().input(|i| i.raw_scroll_delta.y);
        if scroll_delta != 0.0 && response.hovered() {
            if let Some(cursor) = response.hover_pos() {
                self.session.viewport.scroll(scroll_delta, to_local(cursor));
            }
        }

        // Rectangle drawing
        if response.drag_started_by(egui::PointerButton::Primary) {
            let start = ui
                .ctx()
                .input(|i| i.pointer.press_origin())
                .or(response.interact_pointer_pos());
            if let Some(pos) = start {
                self.session.pointer_pressed(to_local(pos));
            }
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                self.session.pointer_moved(to_local(pos));
            }
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            let end = response
                .interact_pointer_pos()
                .or(ui.ctx().input(|i| i.pointer.latest_pos()));
            match end {
                Some(pos) => {
                    self.session.pointer_released(to_local(pos));
                }
                None => self.session.store.cancel(),
            }
        }

        let viewport = &self.session.viewport;
        let to_screen = |p: egui::Pos2| viewport.to_screen_coords(p) + origin;

        let img_rect = egui::Rect::from_min_max(to_screen(egui::Pos2::ZERO), to_screen(size.to_pos2()));
        if let Some((_, tex)) = &self.texture {
            painter.with_clip_rect(canvas_rect).image(
                tex.id(),
                img_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        let [r, g, b] = self.session.settings.rect_color;
        let stroke = egui::Stroke::new(
            self.session.settings.rect_thickness,
            egui::Color32::from_rgb(r, g, b),
        );
        let clipped = painter.with_clip_rect(canvas_rect);
        for rect in self.session.rectangles() {
            let screen = egui::Rect::from_min_max(to_screen(rect.top_left), to_screen(rect.bottom_right));
            clipped.rect_stroke(screen, 0.0, stroke, egui::StrokeKind::Middle);
        }
        if let Some(pending) = self.session.store.pending() {
            let screen =
                egui::Rect::from_min_max(to_screen(pending.top_left), to_screen(pending.bottom_right));
            clipped.rect_stroke(
                screen,
                0.0,
                egui::Stroke::new(1.0, egui::Color32::YELLOW),
                egui::StrokeKind::Middle,
            );
        }

        self.cursor = response
            .hover_pos()
            .and_then(|p| self.session.cursor_image_pos(to_local(p)));
        if self.cursor.is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
        }
    }
}

impl eframe::App for MatrixLabelerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.session
            .set_max_texture_side(ctx.input(|i| i.max_texture_side));
        if let Some(path) = self.startup_load.take() {
            // failure is already reported in the message log
            let _ = self.session.load(&path);
        }
        self.ensure_texture(ctx);

        let mut requests = Requests::default();

        // Keyboard shortcuts
        ctx.input(|i| {
            if i.modifiers.command && i.key_pressed(egui::Key::Z) {
                requests.undo = true;
            }
            if i.modifiers.command && i.key_pressed(egui::Key::S) {
                requests.save = true;
            }
            if i.modifiers.command && i.key_pressed(egui::Key::O) {
                requests.load = true;
            }
            if i.key_pressed(egui::Key::Escape) {
                self.session.store.cancel();
            }
        });

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.toolbar(ui, &mut requests);
        });

        egui::TopBottomPanel::bottom("records")
            .resizable(true)
            .default_height(180.0)
            .show(ctx, |ui| {
                self.bottom_panel(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.canvas_size = ui.available_size();
            self.canvas(ui);
        });

        if requests.undo && self.session.undo().is_some() {
            log::debug!("undo, {} rectangles left", self.session.rectangles().len());
        }
        if requests.load {
            self.load_dialog();
        }
        if requests.save {
            self.save_dialog();
        }
        if requests.save_image {
            self.save_image_dialog();
        }
    }
}
