//! Subtitle file errors.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SubtitleError {
    #[error("Cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Extension is not `.srt`, `.vtt` or `.json`.
    #[error("No subtitle format matches '{}'", .0.display())]
    UnknownFormat(PathBuf),

    #[error("Malformed cue file: {0}")]
    Parse(#[from] ParseError),

    #[error("Transcript JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl SubtitleError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

/// Cue-file syntax errors. Line numbers are 1-based.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("bad timestamp on line {line}: '{value}'")]
    InvalidTime { line: usize, value: String },

    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("cue on line {line} ends before it starts")]
    InvertedCue { line: usize },
}

impl ParseError {
    pub fn invalid_time(line: usize, value: impl Into<String>) -> Self {
        Self::InvalidTime {
            line,
            value: value.into(),
        }
    }
}
