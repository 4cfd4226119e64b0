use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{fs, process::Command, sync::OnceCell};
use tracing::{debug, info};
use uuid::Uuid;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::{
    artifact::write_atomic,
    config::WhisperSettings,
    error::TranscriptionError,
    types::{Segment, Transcript},
};

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, video_path: &Path) -> Result<Transcript, TranscriptionError>;
}

/// Local speech-to-text: ffmpeg pulls the audio track, whisper.cpp transcribes it.
///
/// The model is located or downloaded once per transcriber; concurrent
/// transcriptions wait for that instead of racing on the download.
pub struct WhisperTranscriber {
    settings: WhisperSettings,
    model_dir: PathBuf,
    work_dir: PathBuf,
    model_path: OnceCell<PathBuf>,
}

impl WhisperTranscriber {
    pub fn new(settings: WhisperSettings, model_dir: PathBuf, work_dir: PathBuf) -> Self {
        Self {
            settings,
            model_dir,
            work_dir,
            model_path: OnceCell::new(),
        }
    }

    /// Path of the ggml model, downloading it on first use.
    pub async fn ensure_model(&self) -> Result<PathBuf, TranscriptionError> {
        self.model_path
            .get_or_try_init(|| self.fetch_model())
            .await
            .cloned()
    }

    async fn fetch_model(&self) -> Result<PathBuf, TranscriptionError> {
        let download_url = format!(
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/{}",
            self.settings.model
        );

        if !self.model_dir.exists() {
            fs::create_dir_all(&self.model_dir).await?;
        }

        let model_path = self.model_dir.join(&self.settings.model);
        if !model_path.exists() {
            info!(url = %download_url, "downloading whisper model");
            let partial = model_path.with_extension("part");
            let output = Command::new("curl")
                .arg("-L")
                .arg("--fail")
                .arg(&download_url)
                .arg("-o")
                .arg(&partial)
                .output()
                .await?;

            if !output.status.success() {
                let _ = fs::remove_file(&partial).await;
                return Err(TranscriptionError::ModelDownloadFailed {
                    url: download_url,
                    reason: String::from_utf8_lossy(&output.stderr).to_string(),
                });
            }
            fs::rename(&partial, &model_path).await?;
        }

        Ok(model_path)
    }

    /// Extract 16 kHz mono PCM audio using ffmpeg
    async fn extract_audio(video_path: &Path, audio_path: &Path) -> Result<(), TranscriptionError> {
        let output = Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(video_path)
            .arg("-vn")
            .arg("-acodec")
            .arg("pcm_s16le")
            .arg("-ar")
            .arg("16000")
            .arg("-ac")
            .arg("1")
            .arg(audio_path)
            .output()
            .await?;

        if !output.status.success() {
            return Err(TranscriptionError::AudioExtractionFailed {
                video_path: video_path.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(())
    }

    fn run_whisper(
        audio_path: &Path,
        model_path: &Path,
        settings: &WhisperSettings,
    ) -> Result<Transcript, TranscriptionError> {
        let mut reader = hound::WavReader::open(audio_path)?;
        let samples = reader
            .samples::<i16>()
            .map(|s| s.map(|s| s as f32 / i16::MAX as f32))
            .collect::<Result<Vec<f32>, _>>()?;

        let ctx_params = WhisperContextParameters {
            use_gpu: settings.use_gpu,
            flash_attn: settings.use_gpu,
            ..Default::default()
        };
        let model_path_str = model_path.to_string_lossy();
        let ctx = WhisperContext::new_with_params(&model_path_str, ctx_params)?;

        let mut params = FullParams::new(SamplingStrategy::BeamSearch {
            beam_size: 5,
            patience: -1.0,
        });
        params.set_temperature(0.2);
        params.set_language(settings.language.as_deref());
        if let Some(prompt) = &settings.initial_prompt {
            params.set_initial_prompt(prompt);
        }
        params.set_print_progress(false);
        params.set_print_realtime(false);

        let mut state = ctx.create_state()?;
        state.full(params, &samples)?;

        let mut text = String::new();
        let mut segments: Vec<Segment> = Vec::new();

        for segment in state.as_iter() {
            let seg_text = match segment.to_str() {
                Ok(s) => s,
                Err(_) => continue,
            };
            segments.push(Segment {
                start: segment.start_timestamp() as f64 / 100.0,
                end: segment.end_timestamp() as f64 / 100.0,
                text: seg_text.to_string(),
            });

            text.push_str(seg_text);
        }

        let language_index = state.full_lang_id_from_state();
        let language = whisper_rs::get_lang_str(language_index);

        Ok(Transcript {
            language: language.unwrap_or("Unknown").to_string(),
            segments,
            text: text.trim().to_string(),
        })
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, video_path: &Path) -> Result<Transcript, TranscriptionError> {
        let model_path = self.ensure_model().await?;

        fs::create_dir_all(&self.work_dir).await?;
        let audio_file = tempfile::Builder::new()
            .prefix("audio-")
            .suffix(".wav")
            .tempfile_in(&self.work_dir)?;
        let audio_path = audio_file.path().to_path_buf();

        debug!(video = %video_path.display(), audio = %audio_path.display(), "extracting audio");
        Self::extract_audio(video_path, &audio_path).await?;

        let settings = self.settings.clone();
        let transcript = tokio::task::spawn_blocking(move || {
            let result = Self::run_whisper(&audio_path, &model_path, &settings);
            drop(audio_file);
            result
        })
        .await
        .map_err(|e| TranscriptionError::Whisper(e.to_string()))??;

        info!(
            video = %video_path.display(),
            segments = transcript.segments.len(),
            language = %transcript.language,
            "transcribed"
        );
        Ok(transcript)
    }
}

/// Reuses transcripts saved by earlier runs.
///
/// Entries are keyed by the video's file stem plus a short digest of its
/// canonical path, so same-named videos in different folders never share one.
pub struct TranscriptCache {
    dir: PathBuf,
}

impl TranscriptCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path_for(&self, video_path: &Path) -> PathBuf {
        let stem = video_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "transcript".to_string());
        self.dir.join(format!("{}-{}.json", stem, source_digest(video_path)))
    }

    pub async fn load(&self, video_path: &Path) -> Option<Transcript> {
        let path = self.path_for(video_path);
        let json_content = fs::read_to_string(&path).await.ok()?;
        match serde_json::from_str(&json_content) {
            Ok(transcript) => Some(transcript),
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring unreadable cached transcript: {}", e);
                None
            }
        }
    }

    pub async fn save(
        &self,
        video_path: &Path,
        transcript: &Transcript,
    ) -> Result<PathBuf, TranscriptionError> {
        let path = self.path_for(video_path);
        let json = serde_json::to_string_pretty(transcript)?;
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&target, &json))
            .await
            .map_err(std::io::Error::other)??;
        Ok(path)
    }
}

fn source_digest(video_path: &Path) -> String {
    let canonical = std::fs::canonicalize(video_path).unwrap_or_else(|_| video_path.to_path_buf());
    let id = Uuid::new_v5(&Uuid::NAMESPACE_URL, canonical.as_os_str().as_encoded_bytes());
    id.simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn transcript() -> Transcript {
        Transcript {
            text: "Hidden fees? Not anymore.".to_string(),
            segments: vec![Segment {
                start: 0.0,
                end: 3.2,
                text: "Hidden fees? Not anymore.".to_string(),
            }],
            language: "en".to_string(),
        }
    }

    fn cache_file_name(cache: &TranscriptCache, video: &str) -> String {
        cache
            .path_for(Path::new(video))
            .file_name()
            .unwrap()
            .to_string_lossy()
            .to_string()
    }

    #[test]
    fn cache_path_starts_with_video_stem() {
        let cache = TranscriptCache::new(PathBuf::from("/cache/transcripts"));
        let path = cache.path_for(Path::new("/videos/CMUS HackHiddenFees.mp4"));

        assert_eq!(path.parent(), Some(Path::new("/cache/transcripts")));
        let name = cache_file_name(&cache, "/videos/CMUS HackHiddenFees.mp4");
        assert!(name.starts_with("CMUS HackHiddenFees-"), "{name}");
        assert!(name.ends_with(".json"));
        assert_eq!(path, cache.path_for(Path::new("/videos/CMUS HackHiddenFees.mp4")));
    }

    #[test]
    fn same_stem_in_different_folders_gets_separate_entries() {
        let cache = TranscriptCache::new(PathBuf::from("/cache/transcripts"));
        assert_ne!(
            cache_file_name(&cache, "/videos/Ads/clip.mp4"),
            cache_file_name(&cache, "/videos/Other/clip.mp4")
        );
    }

    #[tokio::test]
    async fn model_is_resolved_once_per_transcriber() {
        let dir = TempDir::new().unwrap();
        let settings = WhisperSettings::default();
        let model_dir = dir.path().join("models");
        std::fs::create_dir_all(&model_dir).unwrap();
        let model_file = model_dir.join(&settings.model);
        std::fs::write(&model_file, b"ggml").unwrap();

        let transcriber = WhisperTranscriber::new(settings, model_dir, dir.path().join("work"));
        let (a, b) = tokio::join!(transcriber.ensure_model(), transcriber.ensure_model());
        assert_eq!(a.unwrap(), model_file);
        assert_eq!(b.unwrap(), model_file);

        // Removing the file afterwards does not trigger a second download.
        std::fs::remove_file(&model_file).unwrap();
        assert_eq!(transcriber.ensure_model().await.unwrap(), model_file);
    }

    #[tokio::test]
    async fn saved_transcript_is_reused() {
        let dir = TempDir::new().unwrap();
        let cache = TranscriptCache::new(dir.path().join("transcripts"));
        let video = Path::new("/videos/clip042.mp4");

        assert!(cache.load(video).await.is_none());

        let saved = cache.save(video, &transcript()).await.unwrap();
        assert_eq!(saved, cache.path_for(video));
        assert!(saved.exists());

        let loaded = cache.load(video).await.unwrap();
        assert_eq!(loaded.text, "Hidden fees? Not anymore.");
        assert_eq!(loaded.segments.len(), 1);
    }

    #[tokio::test]
    async fn corrupt_cache_entry_is_ignored() {
        let dir = TempDir::new().unwrap();
        let cache = TranscriptCache::new(dir.path().to_path_buf());
        let video = Path::new("clip.mp4");
        std::fs::write(cache.path_for(video), "{ not json").unwrap();

        assert!(cache.load(video).await.is_none());
    }
}
