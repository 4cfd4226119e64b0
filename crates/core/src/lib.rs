//! Creator Briefs Core Library
//!
//! Turns video files into creator brief documents: the video (or its local
//! whisper transcript) goes to a multimodal model with ordered fallback, a title
//! is recovered from the answer, and the brief is written under a safe,
//! collision-free file name.

pub mod artifact;
pub mod batch;
pub mod client;
pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod processor;
pub mod provider;
pub mod sanitize;
pub mod title;
pub mod transcribe;
pub mod types;

// Re-export commonly used items at crate root
pub use batch::{BatchSummary, FailedTask, run_batch};
pub use client::{HttpModelClient, ModelClient, RequestTags};
pub use config::Settings;
pub use discovery::discover_videos;
pub use dispatch::Dispatcher;
pub use error::{
    BriefError, CandidateError, CandidateErrorKind, CandidateFailure, ConfigError, Result,
    TranscriptionError,
};
pub use format::{format_duration, format_timestamp, format_transcript_with_timestamps};
pub use processor::{BriefProcessor, OutputSpec, TranscriptSource};
pub use provider::Provider;
pub use sanitize::sanitize;
pub use title::extract_title;
pub use transcribe::{Transcriber, TranscriptCache, WhisperTranscriber};
pub use types::{
    BriefArtifact, CandidateList, DispatchResult, ModelCandidate, Payload, Segment, Transcript,
    VideoTask,
};
