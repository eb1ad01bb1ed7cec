//! Configuration for synprobe runs

use crate::error::{RunnerError, RunnerResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use synprobe_payload::{
    ArrayCache, ArrayGenerator, GeneratorKind, JsonLexicon, Lexicon, SynonymExpander,
    WordNetLexicon, DEFAULT_MAX_CANDIDATES,
};
use synprobe_store::{HttpStore, InMemoryStore, ResultStore, RetryPolicy, RetryingStore};

/// Main runner configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub lexicon: LexiconConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub prompt: PromptConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Covering-array generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Backend name: cagen, pict, acts or native
    #[serde(default = "default_generator_kind")]
    pub kind: GeneratorKind,

    /// Generator executable (for ACTS, the jar)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Java launcher used for ACTS
    #[serde(default = "default_java")]
    pub java: PathBuf,

    /// Directory of cached covering arrays
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            kind: default_generator_kind(),
            path: None,
            java: default_java(),
            cache_dir: default_cache_dir(),
        }
    }
}

impl GeneratorConfig {
    /// Select the backend and open the cache. Fails on a missing or
    /// non-executable generator.
    pub fn build(&self) -> RunnerResult<ArrayGenerator> {
        let backend = self.kind.build(self.path.as_deref(), &self.java)?;
        let cache = ArrayCache::open(&self.cache_dir)?;
        Ok(ArrayGenerator::new(backend, cache))
    }
}

/// Lexical resource configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconConfig {
    #[serde(default)]
    pub source: LexiconSource,

    /// Candidates per position, original token included
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            source: LexiconSource::default(),
            max_candidates: default_max_candidates(),
        }
    }
}

/// Where synonyms come from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LexiconSource {
    /// WordNet database directory (index.*, data.*, *.exc)
    Wordnet { dir: PathBuf },

    /// JSON lexicon document
    Json { path: PathBuf },
}

impl Default for LexiconSource {
    fn default() -> Self {
        LexiconSource::Wordnet {
            dir: PathBuf::from("wordnet"),
        }
    }
}

impl LexiconConfig {
    /// Load the lexicon. An unavailable resource is a configuration error.
    pub fn build(&self) -> RunnerResult<SynonymExpander> {
        let lexicon: Arc<dyn Lexicon> = match &self.source {
            LexiconSource::Wordnet { dir } => Arc::new(WordNetLexicon::open(dir)?),
            LexiconSource::Json { path } => Arc::new(JsonLexicon::load(path)?),
        };
        Ok(SynonymExpander::with_lexicon(lexicon))
    }
}

/// Model service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Base URL of the model service
    #[serde(default = "default_executor_endpoint")]
    pub endpoint: String,

    /// Model under test
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_executor_timeout")]
    pub timeout_secs: u64,

    /// Attempts per query, the first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between attempts in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Settings pushed to the model service before the run
    #[serde(default)]
    pub settings: Option<serde_json::Value>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_executor_endpoint(),
            model: default_model(),
            timeout_secs: default_executor_timeout(),
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay(),
            settings: None,
        }
    }
}

impl ExecutorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Text wrapped around every query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default)]
    pub prefix: Option<String>,

    #[serde(default)]
    pub postfix: Option<String>,
}

/// Result store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Attempts per store operation
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

/// Result store backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-memory store (single run, for development/testing)
    #[default]
    Memory,

    /// Result-store HTTP service
    Http {
        endpoint: String,

        #[serde(default = "default_executor_timeout")]
        timeout_secs: u64,
    },
}

impl StorageConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.retry_delay_secs))
    }

    /// Open the configured store behind the retry policy.
    pub fn build(&self) -> RunnerResult<Arc<dyn ResultStore>> {
        let policy = self.retry_policy();
        Ok(match &self.backend {
            StorageBackend::Memory => Arc::new(RetryingStore::new(InMemoryStore::new(), policy)),
            StorageBackend::Http {
                endpoint,
                timeout_secs,
            } => {
                let store = HttpStore::new(endpoint, Duration::from_secs(*timeout_secs))?;
                Arc::new(RetryingStore::new(store, policy))
            }
        })
    }
}

/// Run parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Seed file, one JSON object per line
    #[serde(default = "default_seeds")]
    pub seeds: PathBuf,

    /// Covering-array strength
    #[serde(default = "default_strength")]
    pub strength: usize,

    /// Resume after the last stored sentence
    #[serde(default)]
    pub continue_run: bool,

    /// Free-text note stored with every sentence
    #[serde(default)]
    pub note: String,

    /// Name of the seed data set
    #[serde(default)]
    pub source_data_name: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seeds: default_seeds(),
            strength: default_strength(),
            continue_run: false,
            note: String::new(),
            source_data_name: String::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_generator_kind() -> GeneratorKind {
    GeneratorKind::Cagen
}

fn default_java() -> PathBuf {
    PathBuf::from("java")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("CT/CAs")
}

fn default_max_candidates() -> usize {
    DEFAULT_MAX_CANDIDATES
}

fn default_executor_endpoint() -> String {
    "http://127.0.0.1:4200".to_string()
}

fn default_model() -> String {
    "T5".to_string()
}

fn default_executor_timeout() -> u64 {
    64
}

fn default_max_attempts() -> u32 {
    10
}

fn default_retry_delay() -> u64 {
    10
}

fn default_seeds() -> PathBuf {
    PathBuf::from("train.jsonl")
}

fn default_strength() -> usize {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

impl RunnerConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `SYNPROBE_*` environment variables (`__` separates nesting levels,
    /// e.g. `SYNPROBE_EXECUTOR__MODEL`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&RunnerConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SYNPROBE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Reject values no run can use.
    pub fn validate(&self) -> RunnerResult<()> {
        if self.run.strength == 0 {
            return Err(RunnerError::Config("run.strength must be at least 1".into()));
        }
        if self.lexicon.max_candidates == 0 {
            return Err(RunnerError::Config(
                "lexicon.max_candidates must be at least 1".into(),
            ));
        }
        if self.executor.model.trim().is_empty() {
            return Err(RunnerError::Config("executor.model is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunnerConfig::default();
        assert_eq!(config.generator.kind, GeneratorKind::Cagen);
        assert_eq!(config.lexicon.max_candidates, 3);
        assert_eq!(config.executor.max_attempts, 10);
        assert_eq!(config.executor.retry_delay(), Duration::from_secs(10));
        assert_eq!(config.executor.timeout(), Duration::from_secs(64));
        assert_eq!(config.run.strength, 2);
        assert!(!config.run.continue_run);
        assert!(matches!(config.storage.backend, StorageBackend::Memory));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("synprobe.toml");
        std::fs::write(
            &path,
            r#"
[generator]
kind = "native"
cache_dir = "/tmp/synprobe-cache"

[lexicon]
max_candidates = 4
source = { type = "json", path = "lexicon.json" }

[executor]
model = "LLAMA"

[prompt]
prefix = "Answer yes or no: "

[storage.backend]
type = "http"
endpoint = "http://store:5000"

[run]
strength = 3
continue_run = true
"#,
        )
        .unwrap();

        let config = RunnerConfig::load(path.to_str()).unwrap();
        assert_eq!(config.generator.kind, GeneratorKind::Native);
        assert_eq!(config.lexicon.max_candidates, 4);
        assert!(matches!(config.lexicon.source, LexiconSource::Json { .. }));
        assert_eq!(config.executor.model, "LLAMA");
        assert_eq!(config.executor.max_attempts, 10);
        assert_eq!(config.prompt.prefix.as_deref(), Some("Answer yes or no: "));
        assert_eq!(config.prompt.postfix, None);
        match config.storage.backend {
            StorageBackend::Http {
                endpoint,
                timeout_secs,
            } => {
                assert_eq!(endpoint, "http://store:5000");
                assert_eq!(timeout_secs, 64);
            }
            other => panic!("unexpected backend {:?}", other),
        }
        assert_eq!(config.run.strength, 3);
        assert!(config.run.continue_run);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(RunnerConfig::load(Some("/nonexistent/synprobe.toml")).is_err());
    }

    #[test]
    fn test_zero_strength_is_rejected() {
        let mut config = RunnerConfig::default();
        config.run.strength = 0;
        assert!(matches!(config.validate(), Err(RunnerError::Config(_))));
    }

    #[test]
    fn test_native_generator_builds_without_executable() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            kind: GeneratorKind::Native,
            cache_dir: dir.path().join("cas"),
            ..GeneratorConfig::default()
        };
        let generator = config.build().unwrap();
        assert_eq!(generator.backend_name(), "native");
        assert!(dir.path().join("cas").is_dir());
    }

    #[test]
    fn test_missing_lexicon_is_a_configuration_error() {
        let config = LexiconConfig {
            source: LexiconSource::Json {
                path: PathBuf::from("/nonexistent/lexicon.json"),
            },
            max_candidates: 3,
        };
        assert!(matches!(
            config.build(),
            Err(RunnerError::Payload(synprobe_payload::PayloadError::Configuration(_)))
        ));
    }
}
