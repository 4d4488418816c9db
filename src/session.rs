use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use egui::{pos2, vec2, Pos2, Vec2};
use image::RgbImage;

use crate::annotation::{AnnotationStore, Rectangle};
use crate::export::{self, ExportError};
use crate::matrix::{LoadError, Matrix};
use crate::render::{self, ColorRamp};
use crate::settings::Settings;
use crate::viewport::Viewport;

/// A matrix together with the bitmap rendered from it.
pub struct LoadedMatrix {
    pub path: PathBuf,
    pub matrix: Matrix,
    pub bitmap: RgbImage,
}

impl LoadedMatrix {
    pub fn size(&self) -> Vec2 {
        vec2(self.matrix.cols() as f32, self.matrix.rows() as f32)
    }
}

/// Everything one labeling session mutates. Screen points are canvas-relative.
pub struct Session {
    pub settings: Settings,
    pub viewport: Viewport,
    pub store: AnnotationStore,
    loaded: Option<LoadedMatrix>,
    messages: Vec<String>,
    /// Bumped on every successful load so the UI knows to re-upload the texture.
    generation: u64,
    /// Largest bitmap side the display can take, once the UI reports it.
    max_texture_side: Option<usize>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            viewport: settings.viewport(),
            store: AnnotationStore::new(settings.store_policy()),
            settings,
            loaded: None,
            messages: Vec::new(),
            generation: 0,
            max_texture_side: None,
        }
    }

    pub fn loaded(&self) -> Option<&LoadedMatrix> {
        self.loaded.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_max_texture_side(&mut self, limit: usize) {
        self.max_texture_side = Some(limit);
    }

    /// Whether a `rows` x `cols` bitmap fits the display limit.
    pub fn fits_display(&self, rows: usize, cols: usize) -> bool {
        self.max_texture_side
            .map_or(true, |limit| rows <= limit && cols <= limit)
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn rectangles(&self) -> &[Rectangle] {
        self.store.list()
    }

    pub fn push_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Loads and renders `path`. State is swapped only once everything succeeded;
    /// a failure leaves the previous matrix, view and rectangles untouched.
    pub fn load(&mut self, path: &Path) -> Result<(), LoadError> {
        let matrix = Matrix::load(path).and_then(|matrix| {
            let (rows, cols) = (matrix.rows(), matrix.cols());
            match self.max_texture_side {
                Some(limit) if !self.fits_display(rows, cols) => {
                    Err(LoadError::TooLarge { rows, cols, limit })
                }
                _ => Ok(matrix),
            }
        });
        let matrix = match matrix {
            Ok(matrix) => matrix,
            Err(err) => {
                log::warn!("{err}");
                self.push_message(format!("Load failed: {err}"));
                return Err(err);
            }
        };
        let bitmap = render::render(&matrix, self.settings.color_ramp);
        let loaded = LoadedMatrix {
            path: path.to_path_buf(),
            matrix,
            bitmap,
        };

        self.store.reset(Some(loaded.size()));
        self.viewport.reset();
        self.push_message(format!(
            "Loaded {} ({} x {})",
            path.display(),
            loaded.matrix.rows(),
            loaded.matrix.cols()
        ));
        log::info!("loaded {}", path.display());
        self.loaded = Some(loaded);
        self.generation += 1;
        Ok(())
    }

    pub fn set_color_ramp(&mut self, ramp: ColorRamp) {
        if self.settings.color_ramp == ramp {
            return;
        }
        self.settings.color_ramp = ramp;
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.bitmap = render::render(&loaded.matrix, ramp);
            self.generation += 1;
        }
    }

    pub fn pointer_pressed(&mut self, screen: Pos2) {
        if self.loaded.is_none() {
            return;
        }
        let start = self.store.begin_rectangle(&self.viewport, screen);
        self.push_message(format!("Start: x={}, y={}", start.x, start.y));
    }

    pub fn pointer_moved(&mut self, screen: Pos2) {
        self.store.update_rectangle(&self.viewport, screen);
    }

    pub fn pointer_released(&mut self, screen: Pos2) -> Option<Rectangle> {
        if !self.store.is_drawing() {
            return None;
        }
        let end = self.store.image_point(&self.viewport, screen);
        let added = self.store.complete_rectangle(&self.viewport, screen);
        self.push_message(format!("End: x={}, y={}", end.x, end.y));
        if added.is_none() {
            self.push_message("Selection too small, ignored");
        }
        added
    }

    pub fn undo(&mut self) -> Option<Rectangle> {
        self.store.undo()
    }

    pub fn save(&mut self, path: &Path) -> Result<(), ExportError> {
        match export::save(path, self.store.list()) {
            Ok(_) => {
                self.push_message(format!("Rectangles saved to {}", path.display()));
                Ok(())
            }
            Err(err) => {
                log::warn!("{err}");
                self.push_message(format!("Save failed: {err}"));
                Err(err)
            }
        }
    }

    /// Writes the rendered matrix with rectangle outlines as a PNG.
    pub fn save_bitmap(&mut self, path: &Path) -> Result<()> {
        let loaded = self.loaded.as_ref().context("no matrix loaded")?;
        let img = render::burn_rectangles(
            &loaded.bitmap,
            self.store.list(),
            self.settings.rect_color,
            self.settings.rect_thickness,
        );
        img.save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("cannot save png to {}", path.display()))?;
        self.push_message(format!("Image saved to {}", path.display()));
        Ok(())
    }

    /// Image-space position under `screen`, or `None` outside the matrix.
    pub fn cursor_image_pos(&self, screen: Pos2) -> Option<Pos2> {
        let size = self.loaded.as_ref()?.size();
        let p = self.viewport.to_image_coords(screen);
        if p.x < 0.0 || p.y < 0.0 || p.x > size.x || p.y > size.y {
            return None;
        }
        Some(pos2(p.x.floor().min(size.x), p.y.floor().min(size.y)))
    }
}
