use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::annotation::Rectangle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    /// `tlx tly brx bry` per line.
    Text,
    /// `{"rects":[{"id":1,"tlbw":[top,left,bottom,right]}]}`
    Json,
}

impl ExportFormat {
    pub fn for_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => ExportFormat::Json,
            _ => ExportFormat::Text,
        }
    }
}

#[derive(Debug)]
pub enum ExportError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Encode(serde_json::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io { path, source } => {
                write!(f, "cannot write {}: {source}", path.display())
            }
            ExportError::Encode(err) => write!(f, "cannot encode rectangles: {err}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io { source, .. } => Some(source),
            ExportError::Encode(err) => Some(err),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectRecord {
    pub id: usize,
    pub tlbw: [f32; 4],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectFile {
    pub rects: Vec<RectRecord>,
}

impl RectFile {
    pub fn from_rects(rects: &[Rectangle]) -> Self {
        Self {
            rects: rects
                .iter()
                .enumerate()
                .map(|(i, r)| RectRecord {
                    id: i + 1,
                    tlbw: [r.top_left.y, r.top_left.x, r.bottom_right.y, r.bottom_right.x],
                })
                .collect(),
        }
    }
}

pub fn to_text(rects: &[Rectangle]) -> String {
    rects
        .iter()
        .map(|r| {
            format!(
                "{} {} {} {}\n",
                r.top_left.x, r.top_left.y, r.bottom_right.x, r.bottom_right.y
            )
        })
        .collect()
}

pub fn to_json(rects: &[Rectangle]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&RectFile::from_rects(rects))
}

/// Writes `rects` to `path` in creation order, replacing any existing file.
pub fn save(path: &Path, rects: &[Rectangle]) -> Result<ExportFormat, ExportError> {
    let format = ExportFormat::for_path(path);
    let data = match format {
        ExportFormat::Text => to_text(rects),
        ExportFormat::Json => to_json(rects).map_err(ExportError::Encode)?,
    };
    std::fs::write(path, data).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("saved {} rectangles to {}", rects.len(), path.display());
    Ok(format)
}

/// One line per rectangle as shown in the recorded-areas panel.
pub fn describe(rects: &[Rectangle]) -> Vec<String> {
    rects
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "Area {}: {}, {}, {}, {}",
                i + 1,
                r.top_left.x,
                r.top_left.y,
                r.bottom_right.x,
                r.bottom_right.y
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;
    use tempfile::tempdir;

    fn two_rects() -> Vec<Rectangle> {
        vec![
            Rectangle::from_corners(pos2(0.0, 0.0), pos2(5.0, 5.0)),
            Rectangle::from_corners(pos2(10.0, 10.0), pos2(20.0, 20.0)),
        ]
    }

    #[test]
    fn text_records_keep_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("areas.txt");
        assert_eq!(save(&path, &two_rects()).unwrap(), ExportFormat::Text);
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "0 0 5 5\n10 10 20 20\n");
    }

    #[test]
    fn json_records_use_top_left_bottom_right() {
        let rects = vec![Rectangle::from_corners(pos2(1.0, 2.0), pos2(3.5, 4.0))];
        let json = to_json(&rects).unwrap();
        assert_eq!(json, r#"{"rects":[{"id":1,"tlbw":[2.0,1.0,4.0,3.5]}]}"#);
    }

    #[test]
    fn json_file_round_trips_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("areas.JSON");
        assert_eq!(save(&path, &two_rects()).unwrap(), ExportFormat::Json);
        let file: RectFile =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(file.rects.len(), 2);
        assert_eq!(file.rects[0].id, 1);
        assert_eq!(file.rects[0].tlbw, [0.0, 0.0, 5.0, 5.0]);
        assert_eq!(file.rects[1].tlbw, [10.0, 10.0, 20.0, 20.0]);
    }

    #[test]
    fn existing_file_is_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("areas.txt");
        std::fs::write(&path, "stale\nstale\nstale\n").unwrap();
        save(&path, &two_rects()[..1]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0 0 5 5\n");
    }

    #[test]
    fn unwritable_destination_is_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("areas.txt");
        assert!(matches!(
            save(&path, &two_rects()),
            Err(ExportError::Io { .. })
        ));
    }

    #[test]
    fn unknown_extension_defaults_to_text() {
        assert_eq!(ExportFormat::for_path(Path::new("a.csv")), ExportFormat::Text);
        assert_eq!(ExportFormat::for_path(Path::new("a")), ExportFormat::Text);
    }

    #[test]
    fn describe_numbers_from_one() {
        let lines = describe(&two_rects());
        assert_eq!(lines, vec!["Area 1: 0, 0, 5, 5", "Area 2: 10, 10, 20, 20"]);
    }
}
