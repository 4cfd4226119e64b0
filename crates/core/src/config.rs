//! Settings file and default locations.
//!
//! Every section and key is optional; missing values fall back to defaults.
//! The settings are built once at startup and shared read-only.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::{
    client::RequestTags, dispatch::DEFAULT_MIN_RESPONSE_CHARS, error::ConfigError,
    types::CandidateList,
};

pub const APP_NAME: &str = "creator-briefs";

pub const DEFAULT_VIDEO_PROMPT: &str = "You are a professional content brief creator. \
     Analyze the video and provide a comprehensive brief.";
pub const DEFAULT_TRANSCRIPT_PROMPT: &str = "You are a professional content brief creator. \
     Analyze the transcript and provide a comprehensive brief.";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub llm: LlmSettings,
    pub paths: PathSettings,
    pub files: FileSettings,
    pub whisper: WhisperSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub primary_model: String,
    pub fallback_models: Vec<String>,
    pub team: Option<String>,
    pub use_case: Option<String>,
    pub request_timeout_secs: u64,
    pub min_response_chars: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            primary_model: "gemini-2.5-pro".to_string(),
            fallback_models: vec![
                "gemini-2.5-pro".to_string(),
                "gemini-2.5-flash".to_string(),
                "gemini-2.0-flash-001".to_string(),
                "gemini-2.0-flash-lite-001".to_string(),
                "claude-3-5-sonnet-latest".to_string(),
            ],
            team: None,
            use_case: Some("creator-briefs".to_string()),
            request_timeout_secs: 300,
            min_response_chars: DEFAULT_MIN_RESPONSE_CHARS,
        }
    }
}

impl LlmSettings {
    pub fn candidates(&self) -> Result<CandidateList, ConfigError> {
        CandidateList::new(&self.primary_model, &self.fallback_models)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn tags(&self) -> RequestTags {
        RequestTags {
            team: self.team.clone(),
            use_case: self.use_case.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub transcript_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub system_prompt: Option<PathBuf>,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("~/Downloads"),
            output_dir: PathBuf::from("archive"),
            transcript_dir: None,
            cache_dir: None,
            system_prompt: None,
        }
    }
}

impl PathSettings {
    pub fn input_dir(&self) -> PathBuf {
        expand_home(&self.input_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        expand_home(&self.output_dir)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(get_root_cache_dir)
    }

    pub fn transcript_dir(&self) -> PathBuf {
        self.transcript_dir
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(|| self.cache_dir().join("transcripts"))
    }

    pub fn model_dir(&self) -> PathBuf {
        self.cache_dir().join("models")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub video_extensions: Vec<String>,
    pub brief_extension: String,
    pub recursive: bool,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            video_extensions: ["mp4", "avi", "mov", "mkv", "webm"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            brief_extension: "md".to_string(),
            recursive: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WhisperSettings {
    pub model: String,
    pub language: Option<String>,
    pub initial_prompt: Option<String>,
    pub use_gpu: bool,
}

impl Default for WhisperSettings {
    fn default() -> Self {
        Self {
            model: "ggml-small.bin".to_string(),
            language: Some("en".to_string()),
            initial_prompt: Some(
                "Transcribe exactly as spoken, including casual speech like 'wanna', 'gonna', etc."
                    .to_string(),
            ),
            use_gpu: true,
        }
    }
}

impl Settings {
    /// Load from `path`, else from the default config file if it exists, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// The configured system prompt, or the built-in one when no file is set
    /// or it cannot be read.
    pub fn system_prompt(&self, default: &str) -> String {
        let Some(path) = &self.paths.system_prompt else {
            return default.to_string();
        };
        let path = expand_home(path);
        match fs::read_to_string(&path) {
            Ok(prompt) if !prompt.trim().is_empty() => prompt,
            Ok(_) => default.to_string(),
            Err(e) => {
                tracing::warn!(path = %path.display(), "system prompt unreadable, using built-in: {}", e);
                default.to_string()
            }
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.toml"))
}

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(APP_NAME)
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings.llm.primary_model, "gemini-2.5-pro");
        assert_eq!(settings.llm.fallback_models.len(), 5);
        assert_eq!(settings.files.brief_extension, "md");
        assert!(settings.files.recursive);
        assert_eq!(settings.llm.min_response_chars, 10);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let settings = Settings::parse(
            r#"
            [llm]
            primary_model = "gemini-2.5-flash"
            fallback_models = ["claude-3-5-sonnet-latest"]
            team = "marketing"

            [files]
            brief_extension = "txt"
            "#,
        )
        .unwrap();

        let candidates = settings.llm.candidates().unwrap();
        let models: Vec<_> = candidates.iter().map(|c| c.model.as_str()).collect();
        assert_eq!(models, vec!["gemini-2.5-flash", "claude-3-5-sonnet-latest"]);
        assert_eq!(settings.llm.tags().team.as_deref(), Some("marketing"));
        assert_eq!(settings.llm.request_timeout_secs, 300);
        assert_eq!(settings.files.brief_extension, "txt");
        assert_eq!(settings.files.video_extensions.len(), 5);
    }

    #[test]
    fn unreadable_file_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let err = Settings::from_file(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[llm\nprimary_model = 3").unwrap();

        let err = Settings::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn system_prompt_from_file_or_default() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::default();
        assert_eq!(settings.system_prompt("built-in"), "built-in");

        let prompt_path = dir.path().join("system_prompt.txt");
        fs::write(&prompt_path, "Write a brief for {creator}.").unwrap();
        settings.paths.system_prompt = Some(prompt_path);
        assert_eq!(settings.system_prompt("built-in"), "Write a brief for {creator}.");

        settings.paths.system_prompt = Some(dir.path().join("missing.txt"));
        assert_eq!(settings.system_prompt("built-in"), "built-in");
    }

    #[test]
    fn transcript_dir_defaults_under_cache() {
        let mut paths = PathSettings::default();
        paths.cache_dir = Some(PathBuf::from("/var/cache/briefs"));
        assert_eq!(
            paths.transcript_dir(),
            PathBuf::from("/var/cache/briefs/transcripts")
        );
        assert_eq!(paths.model_dir(), PathBuf::from("/var/cache/briefs/models"));
    }

    #[test]
    fn expands_home_prefix_only() {
        assert_eq!(expand_home(Path::new("/abs/path")), PathBuf::from("/abs/path"));
        assert_eq!(expand_home(Path::new("archive")), PathBuf::from("archive"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/Downloads")), home.join("Downloads"));
        }
    }
}
