//! End-to-end run over the seed sentences.
//!
//! Seeds are processed strictly one after another, and so are the queries of
//! one seed, in array-row order. The first query stored for every sentence
//! is therefore the baseline.

use crate::config::RunnerConfig;
use crate::continuation::{find_resume_point, ResumeFilter};
use crate::error::{RunnerError, RunnerResult};
use crate::executor::{HttpModelClient, QueryExecutor};
use crate::session::SessionSettings;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use synprobe_payload::{decode, ArrayGenerator, SynonymExpander};
use synprobe_store::{ParameterStore, QueryStore, ResultStore, SentenceStore};
use synprobe_types::{SeedRecord, SentenceId, TestQuery, TestSentence};
use tracing::{debug, info, instrument, warn};

/// Counts of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Seed sentences fully processed.
    pub sentences: usize,
    pub queries_executed: usize,
    /// Queries without a response; nothing was stored for them.
    pub queries_failed: usize,
    /// Seeds skipped: blank questions and, when resuming, everything up to
    /// the resume point.
    pub skipped: usize,
    /// Malformed seed lines passed over while looking for the resume point.
    /// They are part of `skipped` too.
    pub unreadable_seeds: usize,
}

/// Outcome of one seed sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceOutcome {
    pub sentence_id: SentenceId,
    pub queries_executed: usize,
    pub queries_failed: usize,
}

pub struct Orchestrator {
    expander: SynonymExpander,
    generator: ArrayGenerator,
    executor: QueryExecutor,
    store: Arc<dyn ResultStore>,
    session: SessionSettings,
}

impl Orchestrator {
    pub fn new(
        expander: SynonymExpander,
        generator: ArrayGenerator,
        executor: QueryExecutor,
        store: Arc<dyn ResultStore>,
        session: SessionSettings,
    ) -> Self {
        Self {
            expander,
            generator,
            executor,
            store,
            session,
        }
    }

    /// Wire every component from configuration. Fails on an unusable
    /// generator backend, lexicon or store before any seed is read.
    pub fn from_config(config: &RunnerConfig) -> RunnerResult<Self> {
        config.validate()?;
        let expander = config.lexicon.build()?;
        let generator = config.generator.build()?;
        let client = HttpModelClient::new(&config.executor.endpoint, config.executor.timeout())?;
        let executor = QueryExecutor::new(
            Arc::new(client),
            config.executor.max_attempts,
            config.executor.retry_delay(),
        );
        let store = config.storage.build()?;
        info!(
            backend = generator.backend_name(),
            model = %config.executor.model,
            strength = config.run.strength,
            "orchestrator ready"
        );
        Ok(Self::new(
            expander,
            generator,
            executor,
            store,
            SessionSettings::from_config(config),
        ))
    }

    pub fn session(&self) -> &SessionSettings {
        &self.session
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Push `settings` to the model service. The effective settings become
    /// part of the session and are stored with every following sentence.
    pub async fn apply_model_settings(&mut self, settings: &Value) -> RunnerResult<()> {
        let effective = self
            .executor
            .update_settings(&self.session.model, settings)
            .await?;
        info!(model = %self.session.model, settings = %effective, "model settings applied");
        self.session = self.session.with_model_settings(effective);
        Ok(())
    }

    /// Process every seed in order. With `continue_run`, seeds up to and
    /// including the last stored sentence are skipped.
    ///
    /// Failed queries are counted and the run goes on; any other error stops
    /// the run and names the sentence it happened in.
    pub async fn run<I>(&self, seeds: I, continue_run: bool) -> RunnerResult<RunSummary>
    where
        I: IntoIterator<Item = RunnerResult<SeedRecord>>,
    {
        let resume_point = if continue_run {
            find_resume_point(self.store.as_ref()).await?
        } else {
            None
        };

        let mut summary = RunSummary::default();
        let mut unreadable = 0;
        let mut seeds = ResumeFilter::new(
            seeds.into_iter(),
            resume_point.clone(),
            |seed: &RunnerResult<SeedRecord>, point: &str| match seed {
                Ok(seed) => seed.question == point,
                Err(e) => {
                    warn!(error = %e, "unreadable seed before the resume point, skipped");
                    unreadable += 1;
                    false
                }
            },
        );
        for seed in seeds.by_ref() {
            let seed = seed?;
            if seed.question.trim().is_empty() {
                warn!("skipping seed with an empty question");
                summary.skipped += 1;
                continue;
            }
            let outcome = self
                .process_sentence(&seed)
                .await
                .map_err(|e| RunnerError::Sentence {
                    sentence: seed.question.clone(),
                    source: Box::new(e),
                })?;
            summary.sentences += 1;
            summary.queries_executed += outcome.queries_executed;
            summary.queries_failed += outcome.queries_failed;
        }
        summary.skipped += seeds.skipped();
        if !seeds.reached() {
            warn!(
                resume_point = resume_point.as_deref().unwrap_or_default(),
                skipped = summary.skipped,
                "resume point not found in seed input, nothing processed"
            );
        }
        summary.unreadable_seeds = unreadable;

        info!(
            sentences = summary.sentences,
            queries_executed = summary.queries_executed,
            queries_failed = summary.queries_failed,
            skipped = summary.skipped,
            "run finished"
        );
        Ok(summary)
    }

    /// Expand, generate, decode and execute one seed, storing the sentence
    /// and every answered query.
    #[instrument(skip(self, seed), fields(sentence = %seed.question))]
    pub async fn process_sentence(&self, seed: &SeedRecord) -> RunnerResult<SentenceOutcome> {
        debug!("processing seed sentence");
        let table = self
            .expander
            .expand(&seed.question, self.session.max_candidates)?;
        let handle = self
            .generator
            .generate(&table.cardinalities(), self.session.strength)
            .await?;

        let sentence_id = self
            .store
            .store_sentence(TestSentence {
                sentence: seed.question.clone(),
                original_response: seed.passage.clone(),
                correct_answer_label: seed.answer,
                source_data_name: self.session.source_data_name.clone(),
                model_name: self.session.model.clone(),
                ca_file: self.generator.contents(&handle).await?,
                ipm_file: table.to_json(),
                strength: self.session.strength,
                note: self.session.note.clone(),
            })
            .await?;
        self.store
            .store_parameters(self.session.parameters(sentence_id))
            .await?;

        let mut outcome = SentenceOutcome {
            sentence_id,
            queries_executed: 0,
            queries_failed: 0,
        };
        let rows = self.generator.read_rows(&handle)?;
        for (ordinal, query) in decode(&table, rows).enumerate() {
            let query = query?;
            debug!(ordinal, query = %query, "decoded query");
            match self
                .executor
                .execute(&query, &self.session.model, &self.session.prompt)
                .await
            {
                Ok(execution) => {
                    self.store
                        .store_query(
                            sentence_id,
                            TestQuery {
                                ordinal: ordinal as u32,
                                modified_question: execution.prompt,
                                new_response: execution.response,
                            },
                        )
                        .await?;
                    outcome.queries_executed += 1;
                }
                Err(failure) => {
                    warn!(ordinal, %failure, "query produced no response");
                    outcome.queries_failed += 1;
                }
            }
        }

        info!(
            sentence_id = %sentence_id,
            rows = handle.row_count(),
            executed = outcome.queries_executed,
            failed = outcome.queries_failed,
            "sentence processed"
        );
        Ok(outcome)
    }
}
