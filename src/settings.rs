use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::annotation::StorePolicy;
use crate::render::ColorRamp;
use crate::viewport::Viewport;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub zoom_step: f32,
    pub min_rect_area: f32,
    pub snap_to_pixel: bool,
    pub color_ramp: ColorRamp,
    pub rect_color: [u8; 3],
    pub rect_thickness: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            zoom_min: 0.1,
            zoom_max: 20.0,
            zoom_step: 1.25,
            min_rect_area: 0.0,
            snap_to_pixel: true,
            color_ramp: ColorRamp::Red,
            rect_color: [0, 0, 255],
            rect_thickness: 2.0,
        }
    }
}

impl Settings {
    pub fn file_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join("matrix-labeler").join("settings.json"))
    }

    /// Loads from the user config dir, falling back to defaults.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::file_path() else {
            log::debug!("no config directory, using default settings");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("ignoring settings: {err:#}");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&raw)
            .with_context(|| format!("cannot parse {}", path.display()))?;
        Ok(settings.validated())
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::file_path().context("cannot resolve settings path")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("cannot write {}", path.display()))?;
        Ok(())
    }

    /// Replaces out-of-range values with their defaults.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        if !(self.zoom_min.is_finite() && self.zoom_min > 0.0) {
            log::warn!("zoom_min {} is invalid, using {}", self.zoom_min, defaults.zoom_min);
            self.zoom_min = defaults.zoom_min;
        }
        if !(self.zoom_max.is_finite() && self.zoom_max >= self.zoom_min) {
            log::warn!("zoom_max {} is invalid, using {}", self.zoom_max, defaults.zoom_max);
            self.zoom_max = defaults.zoom_max.max(self.zoom_min);
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            log::warn!("zoom_step {} is invalid, using {}", self.zoom_step, defaults.zoom_step);
            self.zoom_step = defaults.zoom_step;
        }
        if !(self.min_rect_area.is_finite() && self.min_rect_area >= 0.0) {
            self.min_rect_area = defaults.min_rect_area;
        }
        if !(self.rect_thickness.is_finite() && self.rect_thickness > 0.0) {
            self.rect_thickness = defaults.rect_thickness;
        }
        self
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.zoom_min, self.zoom_max, self.zoom_step)
    }

    pub fn store_policy(&self) -> StorePolicy {
        StorePolicy {
            min_area: self.min_rect_area,
            snap_to_pixel: self.snap_to_pixel,
        }
    }
}
