//! Per-run settings owned by the orchestrator.
//!
//! Settings are values: changing one yields a new [`SessionSettings`], and
//! the executor receives the prompt settings it should use explicitly.

use crate::config::RunnerConfig;
use serde_json::Value;
use synprobe_types::{ModelParameter, SentenceId};

/// Text wrapped around every query before it is submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptSettings {
    prefix: String,
    postfix: String,
}

impl PromptSettings {
    pub fn new(prefix: impl Into<String>, postfix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            postfix: postfix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn postfix(&self) -> &str {
        &self.postfix
    }

    pub fn with_prefix(&self, prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..self.clone()
        }
    }

    pub fn with_postfix(&self, postfix: impl Into<String>) -> Self {
        Self {
            postfix: postfix.into(),
            ..self.clone()
        }
    }

    /// The prompt submitted for `query`.
    pub fn wrap(&self, query: &str) -> String {
        format!("{}{}{}", self.prefix, query, self.postfix)
    }
}

/// Everything describing how a run talks to the model under test.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub model: String,
    pub prompt: PromptSettings,
    pub strength: usize,
    pub max_candidates: usize,
    pub note: String,
    pub source_data_name: String,
    /// Effective settings reported by the model service, if any were pushed.
    pub model_settings: Option<Value>,
}

impl SessionSettings {
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            model: config.executor.model.clone(),
            prompt: PromptSettings::new(
                config.prompt.prefix.clone().unwrap_or_default(),
                config.prompt.postfix.clone().unwrap_or_default(),
            ),
            strength: config.run.strength,
            max_candidates: config.lexicon.max_candidates,
            note: config.run.note.clone(),
            source_data_name: config.run.source_data_name.clone(),
            model_settings: None,
        }
    }

    pub fn with_model_settings(&self, settings: Value) -> Self {
        Self {
            model_settings: Some(settings),
            ..self.clone()
        }
    }

    /// Key/value description of the session stored with each sentence.
    pub fn parameters(&self, sentence_id: SentenceId) -> Vec<ModelParameter> {
        let mut pairs = vec![
            ("model".to_string(), self.model.clone()),
            ("prompt_prefix".to_string(), self.prompt.prefix().to_string()),
            ("prompt_postfix".to_string(), self.prompt.postfix().to_string()),
        ];
        if let Some(Value::Object(settings)) = &self.model_settings {
            for (key, value) in settings {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                pairs.push((key.clone(), value));
            }
        }
        pairs
            .into_iter()
            .map(|(parameter, value)| ModelParameter {
                sentence_id,
                parameter,
                value,
            })
            .collect()
    }
}
