use std::{fmt, path::PathBuf};

use thiserror::Error;

/// Why a single model candidate did not produce a usable response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateErrorKind {
    Auth,
    Quota,
    Network,
    Api(u16),
    MalformedResponse,
    EmptyResponse,
    Unsupported,
    MissingApiKey,
}

impl fmt::Display for CandidateErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateErrorKind::Auth => write!(f, "auth"),
            CandidateErrorKind::Quota => write!(f, "quota"),
            CandidateErrorKind::Network => write!(f, "network"),
            CandidateErrorKind::Api(status) => write!(f, "api {}", status),
            CandidateErrorKind::MalformedResponse => write!(f, "malformed response"),
            CandidateErrorKind::EmptyResponse => write!(f, "empty response"),
            CandidateErrorKind::Unsupported => write!(f, "unsupported"),
            CandidateErrorKind::MissingApiKey => write!(f, "missing api key"),
        }
    }
}

#[derive(Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct CandidateError {
    pub kind: CandidateErrorKind,
    pub message: String,
}

impl CandidateError {
    pub fn new(kind: CandidateErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for CandidateError {
    fn from(e: reqwest::Error) -> Self {
        let kind = match e.status() {
            Some(status) => CandidateErrorKind::from_status(status.as_u16()),
            None if e.is_decode() => CandidateErrorKind::MalformedResponse,
            None => CandidateErrorKind::Network,
        };
        CandidateError::new(kind, e.to_string())
    }
}

impl CandidateErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => CandidateErrorKind::Auth,
            429 => CandidateErrorKind::Quota,
            other => CandidateErrorKind::Api(other),
        }
    }
}

/// One entry of an exhausted dispatch, in attempt order.
#[derive(Debug, Clone)]
pub struct CandidateFailure {
    pub model: String,
    pub kind: CandidateErrorKind,
    pub message: String,
}

impl fmt::Display for CandidateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}: {})", self.model, self.kind, self.message)
    }
}

#[derive(Error, Debug)]
pub enum TranscriptionError {
    #[error("Model download failed for {url}: {reason}")]
    ModelDownloadFailed { url: String, reason: String },

    #[error("Audio extraction failed for {video_path}: {reason}")]
    AudioExtractionFailed { video_path: PathBuf, reason: String },

    #[error("Whisper failed: {0}")]
    Whisper(String),

    #[error("Failed to decode audio: {0}")]
    Audio(#[from] hound::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<whisper_rs::WhisperError> for TranscriptionError {
    fn from(e: whisper_rs::WhisperError) -> Self {
        TranscriptionError::Whisper(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Primary model must not be empty")]
    NoCandidates,
}

/// Per-video failure. A failed video never stops the batch.
#[derive(Error, Debug)]
pub enum BriefError {
    #[error("Video file not found at {0}")]
    VideoNotFound(PathBuf),

    #[error("Transcription failed for {video}: {source}")]
    Transcription {
        video: PathBuf,
        source: TranscriptionError,
    },

    #[error("All {} model candidates failed: {}", .attempts.len(), join_failures(.attempts))]
    AllCandidatesExhausted { attempts: Vec<CandidateFailure> },

    #[error("Brief generated but could not be written to {dir}: {source}")]
    Persistence {
        dir: PathBuf,
        source: std::io::Error,
    },
}

fn join_failures(attempts: &[CandidateFailure]) -> String {
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, BriefError>;
