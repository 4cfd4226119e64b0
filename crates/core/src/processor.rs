use std::{path::PathBuf, sync::Arc};

use tracing::{info, warn};

use crate::{
    artifact::write_brief,
    dispatch::Dispatcher,
    error::{BriefError, Result},
    format::format_transcript_with_timestamps,
    title::extract_title,
    transcribe::{TranscriptCache, Transcriber},
    types::{BriefArtifact, CandidateList, DispatchResult, Payload, Transcript, VideoTask},
};

/// Where briefs are written and with which extension.
#[derive(Debug, Clone)]
pub struct OutputSpec {
    pub dir: PathBuf,
    pub extension: String,
}

/// Produces transcripts for transcript mode, reusing cached ones unless forced.
pub struct TranscriptSource {
    transcriber: Arc<dyn Transcriber>,
    cache: TranscriptCache,
    force: bool,
}

impl TranscriptSource {
    pub fn new(transcriber: Arc<dyn Transcriber>, cache: TranscriptCache, force: bool) -> Self {
        Self {
            transcriber,
            cache,
            force,
        }
    }

    async fn transcribe_fresh(&self, task: &VideoTask) -> Result<Transcript> {
        self.transcriber
            .transcribe(&task.path)
            .await
            .map_err(|source| BriefError::Transcription {
                video: task.path.clone(),
                source,
            })
    }

    async fn cached(&self, task: &VideoTask) -> Option<Transcript> {
        if self.force {
            return None;
        }
        let transcript = self.cache.load(&task.path).await?;
        info!(video = %task.file_name(), "using cached transcript");
        Some(transcript)
    }

    /// Transcript for `task`. A transcript that cannot be cached is still returned.
    pub async fn get(&self, task: &VideoTask) -> Result<Transcript> {
        if let Some(transcript) = self.cached(task).await {
            return Ok(transcript);
        }

        let transcript = self.transcribe_fresh(task).await?;
        if let Err(e) = self.cache.save(&task.path, &transcript).await {
            warn!(video = %task.file_name(), "could not cache transcript: {}", e);
        }
        Ok(transcript)
    }

    /// Make sure a saved transcript exists for `task` and return its path.
    pub async fn ensure_saved(&self, task: &VideoTask) -> Result<PathBuf> {
        if self.cached(task).await.is_some() {
            return Ok(self.cache.path_for(&task.path));
        }

        let transcript = self.transcribe_fresh(task).await?;
        let path = self.cache.path_for(&task.path);
        self.cache
            .save(&task.path, &transcript)
            .await
            .map_err(|e| BriefError::Persistence {
                dir: path.parent().map(PathBuf::from).unwrap_or_default(),
                source: std::io::Error::other(e),
            })
    }
}

pub struct BriefProcessor {
    dispatcher: Dispatcher,
    candidates: CandidateList,
    prompt: String,
    output: OutputSpec,
    transcripts: Option<TranscriptSource>,
}

impl BriefProcessor {
    /// A processor that sends the video itself to the models.
    pub fn new(
        dispatcher: Dispatcher,
        candidates: CandidateList,
        prompt: impl Into<String>,
        output: OutputSpec,
    ) -> Self {
        Self {
            dispatcher,
            candidates,
            prompt: prompt.into(),
            output,
            transcripts: None,
        }
    }

    /// Send transcripts instead of video.
    pub fn with_transcripts(mut self, source: TranscriptSource) -> Self {
        self.transcripts = Some(source);
        self
    }

    async fn build_payload(&self, task: &VideoTask) -> Result<Payload> {
        let Some(source) = &self.transcripts else {
            return Ok(Payload::video(task));
        };

        let transcript = source.get(task).await?;
        let text = if transcript.segments.is_empty() {
            transcript.text.clone()
        } else {
            format_transcript_with_timestamps(&transcript)
        };
        Ok(Payload::Transcript {
            video_name: task.base_name.clone(),
            text,
        })
    }

    /// Turn one video into a brief on disk.
    ///
    /// Nothing is written unless a model answered. A write failure after a
    /// successful answer is reported as [`BriefError::Persistence`].
    #[tracing::instrument(skip_all, fields(video = %task.file_name()))]
    pub async fn process_video(&self, task: &VideoTask) -> Result<BriefArtifact> {
        if !task.path.is_file() {
            return Err(BriefError::VideoNotFound(task.path.clone()));
        }

        let payload = self.build_payload(task).await?;

        let (model_used, response) = match self
            .dispatcher
            .dispatch(&payload, &self.prompt, &self.candidates)
            .await
        {
            DispatchResult::Success {
                model_used,
                response,
            } => (model_used, response),
            DispatchResult::Failure { attempts } => {
                return Err(BriefError::AllCandidatesExhausted { attempts });
            }
        };

        let title = extract_title(&response);
        if title.is_none() {
            info!("no title in response, naming brief after the video");
        }

        let dir = self.output.dir.clone();
        let extension = self.output.extension.clone();
        let fallback_base = task.base_name.clone();
        let brief_title = title.clone();
        let (written, body) = tokio::task::spawn_blocking(move || {
            let written =
                write_brief(&dir, brief_title.as_deref(), &fallback_base, &extension, &response);
            (written, response)
        })
        .await
        .map_err(|e| BriefError::Persistence {
            dir: self.output.dir.clone(),
            source: std::io::Error::other(e),
        })?;
        let path = written.map_err(|source| BriefError::Persistence {
            dir: self.output.dir.clone(),
            source,
        })?;

        info!(model = %model_used, path = %path.display(), "brief saved");
        Ok(BriefArtifact {
            path,
            model_used,
            title,
            body,
        })
    }
}
