use std::fmt;
use std::path::{Path, PathBuf};

/// Dense row-major grid of samples, fixed in size once loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

#[derive(Debug)]
pub enum LoadError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Format(FormatError),
    /// Parsed fine but cannot be displayed as a single texture.
    TooLarge {
        rows: usize,
        cols: usize,
        limit: usize,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct FormatError {
    /// 1-based line in the source text, 0 when the error is not tied to a line.
    pub line: usize,
    pub kind: FormatErrorKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormatErrorKind {
    BadToken(String),
    NonFinite(String),
    RaggedRow { expected: usize, found: usize },
    Empty,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            LoadError::Format(err) => write!(f, "malformed matrix: {err}"),
            LoadError::TooLarge { rows, cols, limit } => write!(
                f,
                "{rows} x {cols} matrix exceeds the display limit of {limit} cells per side"
            ),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Format(err) => Some(err),
            LoadError::TooLarge { .. } => None,
        }
    }
}

impl From<FormatError> for LoadError {
    fn from(err: FormatError) -> Self {
        LoadError::Format(err)
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FormatErrorKind::BadToken(token) => {
                write!(f, "line {}: '{token}' is not a number", self.line)
            }
            FormatErrorKind::NonFinite(token) => {
                write!(f, "line {}: '{token}' is not a finite value", self.line)
            }
            FormatErrorKind::RaggedRow { expected, found } => write!(
                f,
                "line {}: expected {expected} values, found {found}",
                self.line
            ),
            FormatErrorKind::Empty => write!(f, "no values found"),
        }
    }
}

impl std::error::Error for FormatError {}

impl Matrix {
    /// Parses whitespace separated rows. Blank lines are skipped, so a trailing
    /// newline or a separating empty line does not count as a zero-length row.
    pub fn parse(text: &str) -> Result<Self, FormatError> {
        let mut data = Vec::new();
        let mut rows = 0;
        let mut cols: Option<usize> = None;

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }
            let mut row = Vec::with_capacity(cols.unwrap_or(0));
            for token in line.split_whitespace() {
                let value: f64 = token.parse().map_err(|_| FormatError {
                    line: line_no,
                    kind: FormatErrorKind::BadToken(token.to_string()),
                })?;
                if !value.is_finite() {
                    return Err(FormatError {
                        line: line_no,
                        kind: FormatErrorKind::NonFinite(token.to_string()),
                    });
                }
                row.push(value);
            }
            let expected = *cols.get_or_insert(row.len());
            if row.len() != expected {
                return Err(FormatError {
                    line: line_no,
                    kind: FormatErrorKind::RaggedRow {
                        expected,
                        found: row.len(),
                    },
                });
            }
            data.extend(row);
            rows += 1;
        }

        match cols {
            Some(cols) if cols > 0 => Ok(Self { rows, cols, data }),
            _ => Err(FormatError {
                line: 0,
                kind: FormatErrorKind::Empty,
            }),
        }
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let matrix = Self::parse(&text)?;
        log::debug!(
            "parsed {}x{} matrix from {}",
            matrix.rows,
            matrix.cols,
            path.display()
        );
        Ok(matrix)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col).copied()
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// (min, max) over all cells. Matrices are never empty, so this always exists.
    pub fn range(&self) -> (f64, f64) {
        self.data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_keeps_dimensions_and_values() {
        let m = Matrix::parse("1 2 3\n4.5 -6 7e-3\n").unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 3);
        assert_eq!(m.values(), &[1.0, 2.0, 3.0, 4.5, -6.0, 7e-3]);
        assert_eq!(m.get(1, 2), Some(7e-3));
        assert_eq!(m.get(2, 0), None);
    }

    #[test]
    fn parse_accepts_mixed_whitespace_and_blank_lines() {
        let m = Matrix::parse("  0.1\t0.2  \n\n0.3   0.4\r\n\n").unwrap();
        assert_eq!((m.rows(), m.cols()), (2, 2));
        assert_eq!(m.values(), &[0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn parse_is_exact_for_printed_floats() {
        let values = [0.1_f64, 1.0 / 3.0, -2.5e-12, 12345.678901234567];
        let text = values
            .iter()
            .map(|v| format!("{v}"))
            .collect::<Vec<_>>()
            .join(" ");
        let m = Matrix::parse(&text).unwrap();
        assert_eq!(m.values(), &values);
    }

    #[test]
    fn ragged_rows_are_rejected_with_line() {
        let err = Matrix::parse("1 2\n3 4\n5\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(
            err.kind,
            FormatErrorKind::RaggedRow {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn ragged_row_line_counts_skipped_blank_lines() {
        let err = Matrix::parse("1 2\n\n\n3 4 5\n").unwrap_err();
        assert_eq!(err.line, 4);
    }

    #[test]
    fn bad_tokens_are_rejected() {
        let err = Matrix::parse("1 2\n3 x\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.kind, FormatErrorKind::BadToken("x".into()));

        let err = Matrix::parse("1 nan\n").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::NonFinite("nan".into()));
    }

    #[test]
    fn empty_input_is_a_format_error() {
        assert_eq!(Matrix::parse("").unwrap_err().kind, FormatErrorKind::Empty);
        assert_eq!(
            Matrix::parse("\n  \n").unwrap_err().kind,
            FormatErrorKind::Empty
        );
    }

    #[test]
    fn load_reports_missing_file_as_io() {
        let dir = tempdir().unwrap();
        let err = Matrix::load(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cov.txt");
        std::fs::write(&path, "1 0\n0 1\n").unwrap();
        let m = Matrix::load(&path).unwrap();
        assert_eq!(m.range(), (0.0, 1.0));
    }
}
