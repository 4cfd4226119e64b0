use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CandidateFailure, ConfigError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub segments: Vec<Segment>,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// One video to turn into a brief.
#[derive(Debug, Clone)]
pub struct VideoTask {
    pub path: PathBuf,
    /// File name without extension, used as the fallback brief name.
    pub base_name: String,
    pub extension: String,
}

impl VideoTask {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let base_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Self {
            path,
            base_name,
            extension,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// MIME type sent alongside inline video data.
    pub fn mime_type(&self) -> &'static str {
        match self.extension.as_str() {
            "mp4" | "m4v" => "video/mp4",
            "mov" => "video/quicktime",
            "avi" => "video/x-msvideo",
            "mkv" => "video/x-matroska",
            "webm" => "video/webm",
            "mpeg" | "mpg" => "video/mpeg",
            _ => "application/octet-stream",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCandidate {
    pub model: String,
    /// 0 for the primary model, 1..N for fallbacks.
    pub rank: usize,
}

/// Ordered, non-empty, duplicate-free list of models to try.
#[derive(Debug, Clone)]
pub struct CandidateList {
    candidates: Vec<ModelCandidate>,
}

impl CandidateList {
    pub fn new(primary: &str, fallbacks: &[String]) -> Result<Self, ConfigError> {
        let primary = primary.trim();
        if primary.is_empty() {
            return Err(ConfigError::NoCandidates);
        }

        let mut models: Vec<&str> = vec![primary];
        for model in fallbacks.iter().map(|m| m.trim()) {
            if !model.is_empty() && !models.contains(&model) {
                models.push(model);
            }
        }

        let candidates = models
            .into_iter()
            .enumerate()
            .map(|(rank, model)| ModelCandidate {
                model: model.to_string(),
                rank,
            })
            .collect();

        Ok(Self { candidates })
    }

    pub fn primary(&self) -> &ModelCandidate {
        &self.candidates[0]
    }

    pub fn fallbacks(&self) -> &[ModelCandidate] {
        &self.candidates[1..]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelCandidate> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// What gets sent to a model alongside the system prompt.
#[derive(Debug, Clone)]
pub enum Payload {
    Video {
        path: PathBuf,
        mime_type: &'static str,
    },
    Transcript {
        video_name: String,
        text: String,
    },
}

impl Payload {
    pub fn video(task: &VideoTask) -> Self {
        Payload::Video {
            path: task.path.clone(),
            mime_type: task.mime_type(),
        }
    }

    /// The user turn that accompanies the payload.
    pub fn user_prompt(&self) -> String {
        match self {
            Payload::Video { .. } => "Please analyze the following video and create a comprehensive brief \
                 according to the instructions above. The video is attached to this message."
                .to_string(),
            Payload::Transcript { video_name, text } => format!(
                "Please analyze the following video transcript and create a content brief:\n\n# TRANSCRIPT: {}\n{}\n",
                video_name, text
            ),
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, Payload::Video { .. })
    }
}

#[derive(Debug, Clone)]
pub enum DispatchResult {
    Success {
        model_used: String,
        response: String,
    },
    Failure {
        attempts: Vec<CandidateFailure>,
    },
}

/// A brief that was written to disk.
#[derive(Debug, Clone)]
pub struct BriefArtifact {
    pub path: PathBuf,
    pub model_used: String,
    /// Title recovered from the response, if any.
    pub title: Option<String>,
    /// The model response exactly as written to `path`.
    pub body: String,
}

impl BriefArtifact {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_task_derives_name_and_extension() {
        let task = VideoTask::new("/videos/ads/clip042.MP4");
        assert_eq!(task.base_name, "clip042");
        assert_eq!(task.extension, "mp4");
        assert_eq!(task.file_name(), "clip042.MP4");
        assert_eq!(task.mime_type(), "video/mp4");
    }

    #[test]
    fn candidate_list_keeps_primary_first_and_drops_duplicates() {
        let fallbacks = vec![
            "gemini-2.5-pro".to_string(),
            "gemini-2.5-flash".to_string(),
            " ".to_string(),
            "claude-3-5-sonnet-latest".to_string(),
            "gemini-2.5-flash".to_string(),
        ];
        let list = CandidateList::new("gemini-2.5-pro", &fallbacks).unwrap();

        let models: Vec<_> = list.iter().map(|c| c.model.as_str()).collect();
        assert_eq!(
            models,
            vec!["gemini-2.5-pro", "gemini-2.5-flash", "claude-3-5-sonnet-latest"]
        );
        let ranks: Vec<_> = list.iter().map(|c| c.rank).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
        assert_eq!(list.primary().model, "gemini-2.5-pro");
        assert_eq!(list.fallbacks().len(), 2);
    }

    #[test]
    fn candidate_list_rejects_empty_primary() {
        assert!(matches!(
            CandidateList::new("  ", &[]),
            Err(ConfigError::NoCandidates)
        ));
    }

    #[test]
    fn transcript_prompt_names_the_video() {
        let payload = Payload::Transcript {
            video_name: "clip042".to_string(),
            text: "[00:00] hello".to_string(),
        };
        let prompt = payload.user_prompt();
        assert!(prompt.contains("# TRANSCRIPT: clip042\n[00:00] hello"));
        assert!(!payload.is_video());
    }
}
