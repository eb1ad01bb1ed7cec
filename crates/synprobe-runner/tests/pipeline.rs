//! End-to-end runs with an in-process generator, a JSON lexicon, a scripted
//! model and the in-memory store.

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use synprobe_payload::generator::NativeGenerator;
use synprobe_payload::{
    ArrayCache, ArrayGenerator, CoveringArrayGenerator, JsonLexicon, PayloadError, PayloadResult,
    SenseCategory, SynonymExpander,
};
use synprobe_runner::{
    parse_seeds, ModelClient, ModelResponse, Orchestrator, PromptSettings, QueryExecutor,
    RunnerConfig, RunnerError, SessionSettings, TransportError,
};
use synprobe_store::{InMemoryStore, ParameterStore, QueryStore, ResultStore, SentenceStore};
use synprobe_types::{ArrayKey, CoveringArray, Label, SeedRecord, SynonymTable};
use tempfile::TempDir;

/// Answers "yes" unless the prompt contains `reject`, which gets a 500.
struct ScriptedModel {
    reject: Option<&'static str>,
    calls: AtomicU32,
}

impl ScriptedModel {
    fn answering() -> Arc<Self> {
        Arc::new(Self {
            reject: None,
            calls: AtomicU32::new(0),
        })
    }

    fn rejecting(word: &'static str) -> Arc<Self> {
        Arc::new(Self {
            reject: Some(word),
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn query(&self, _model: &str, prompt: &str) -> Result<ModelResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject.is_some_and(|word| prompt.contains(word)) {
            return Ok(ModelResponse {
                status: 500,
                body: "inference failed".into(),
            });
        }
        Ok(ModelResponse {
            status: 200,
            body: "Result is: yes".into(),
        })
    }

    async fn update_settings(
        &self,
        _model: &str,
        settings: &Value,
    ) -> Result<ModelResponse, TransportError> {
        Ok(ModelResponse {
            status: 200,
            body: settings.to_string(),
        })
    }
}

/// Never answers.
struct UnreachableModel {
    calls: AtomicU32,
}

#[async_trait]
impl ModelClient for UnreachableModel {
    async fn query(&self, _model: &str, _prompt: &str) -> Result<ModelResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TransportError::Timeout)
    }

    async fn update_settings(
        &self,
        _model: &str,
        _settings: &Value,
    ) -> Result<ModelResponse, TransportError> {
        Err(TransportError::Timeout)
    }
}

/// A backend whose executable always crashes.
struct BrokenGenerator;

#[async_trait]
impl CoveringArrayGenerator for BrokenGenerator {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn produce(&self, key: &ArrayKey, _workdir: &Path) -> PayloadResult<CoveringArray> {
        Err(PayloadError::Generation {
            key: key.to_string(),
            reason: "exited with status 1".into(),
        })
    }
}

fn expander() -> SynonymExpander {
    let lexicon = JsonLexicon::default()
        .with_entry(
            SenseCategory::Noun,
            "sky",
            ["sky", "Sky", "heaven", "celestial_sphere"],
        )
        .with_entry(SenseCategory::Adjective, "blue", ["blue", "azure", "dingy"]);
    SynonymExpander::with_lexicon(Arc::new(lexicon))
}

fn session() -> SessionSettings {
    let mut config = RunnerConfig::default();
    config.prompt.prefix = Some("Q: ".into());
    config.run.note = "pipeline".into();
    SessionSettings::from_config(&config)
}

struct Harness {
    orchestrator: Orchestrator,
    store: Arc<InMemoryStore>,
    cache: TempDir,
}

fn harness_with(
    client: Arc<dyn ModelClient>,
    backend: Arc<dyn CoveringArrayGenerator>,
    store: Arc<InMemoryStore>,
) -> Harness {
    let cache = tempfile::tempdir().unwrap();
    let generator = ArrayGenerator::new(backend, ArrayCache::open(cache.path()).unwrap());
    let executor = QueryExecutor::new(client, 10, Duration::from_secs(10));
    let orchestrator = Orchestrator::new(
        expander(),
        generator,
        executor,
        store.clone() as Arc<dyn ResultStore>,
        session(),
    );
    Harness {
        orchestrator,
        store,
        cache,
    }
}

fn harness(client: Arc<dyn ModelClient>) -> Harness {
    harness_with(client, Arc::new(NativeGenerator), Arc::new(InMemoryStore::new()))
}

fn seed(question: &str, answer: Label) -> SeedRecord {
    SeedRecord {
        question: question.into(),
        answer,
        passage: format!("passage for {}", question),
    }
}

fn seeds(questions: &[&str]) -> Vec<Result<SeedRecord, RunnerError>> {
    questions.iter().map(|q| Ok(seed(q, Label::True))).collect()
}

#[tokio::test]
async fn baseline_is_the_first_stored_query() {
    let h = harness(ScriptedModel::answering());
    let summary = h
        .orchestrator
        .run(
            vec![
                Ok(seed("Is the sky blue?", Label::True)),
                Ok(seed("Is fire cold?", Label::False)),
            ],
            false,
        )
        .await
        .unwrap();

    // sky and blue get 3 candidates each: 9 pairwise rows, the all-zero one
    // being the baseline. Nothing in the second seed is expandable.
    assert_eq!(summary.sentences, 2);
    assert_eq!(summary.queries_executed, 10);
    assert_eq!(summary.queries_failed, 0);

    let sentences = h.store.load_sentences().await.unwrap();
    assert_eq!(sentences.len(), 2);
    let sky = &sentences[0];
    assert_eq!(sky.sentence.sentence, "Is the sky blue?");
    assert_eq!(sky.sentence.original_response, "passage for Is the sky blue?");
    assert_eq!(sky.sentence.model_name, "T5");
    assert_eq!(sky.sentence.note, "pipeline");
    assert_eq!(sky.sentence.strength, 2);
    assert_eq!(sky.sentence.ca_file.lines().count(), 9);
    let table: SynonymTable = serde_json::from_str(&sky.sentence.ipm_file).unwrap();
    assert_eq!(table.cardinalities().as_slice(), &[1, 1, 3, 3]);

    let queries = h.store.load_queries(sky.id).await.unwrap();
    assert_eq!(queries.len(), 9);
    assert_eq!(queries[0].query.ordinal, 0);
    assert_eq!(queries[0].query.modified_question, "Q: Is the sky blue?");
    assert_eq!(queries[0].query.new_response, "Result is: yes");
    assert!(queries
        .iter()
        .any(|q| q.query.modified_question == "Q: Is the celestial sphere azure?"));
    let mut prompts: Vec<&str> = queries
        .iter()
        .map(|q| q.query.modified_question.as_str())
        .collect();
    prompts.sort_unstable();
    prompts.dedup();
    assert_eq!(prompts.len(), 9);

    let fire = h.store.load_queries(sentences[1].id).await.unwrap();
    assert_eq!(fire.len(), 1);
    assert_eq!(fire[0].query.modified_question, "Q: Is fire cold?");

    let params = h.store.load_parameters(sky.id).await.unwrap();
    assert!(params
        .iter()
        .any(|p| p.parameter == "prompt_prefix" && p.value == "Q: "));
}

#[tokio::test]
async fn failed_queries_do_not_stop_the_run() {
    let model = ScriptedModel::rejecting("heaven");
    let h = harness(model.clone());
    let summary = h
        .orchestrator
        .run(seeds(&["Is the sky blue?", "Is fire cold?"]), false)
        .await
        .unwrap();

    assert_eq!(summary.sentences, 2);
    assert_eq!(summary.queries_failed, 3);
    assert_eq!(summary.queries_executed, 7);
    // error statuses are not retried
    assert_eq!(model.calls.load(Ordering::SeqCst), 10);

    let sentences = h.store.load_sentences().await.unwrap();
    let queries = h.store.load_queries(sentences[0].id).await.unwrap();
    assert_eq!(queries.len(), 6);
    assert_eq!(queries[0].query.ordinal, 0);
    assert!(queries
        .iter()
        .all(|q| !q.query.modified_question.contains("heaven")));
}

#[tokio::test(start_paused = true)]
async fn unreachable_model_is_retried_then_skipped() {
    let model = Arc::new(UnreachableModel {
        calls: AtomicU32::new(0),
    });
    let h = harness(model.clone());
    let started = tokio::time::Instant::now();

    let summary = h
        .orchestrator
        .run(seeds(&["Is fire cold?"]), false)
        .await
        .unwrap();

    assert_eq!(summary.sentences, 1);
    assert_eq!(summary.queries_executed, 0);
    assert_eq!(summary.queries_failed, 1);
    assert_eq!(model.calls.load(Ordering::SeqCst), 10);
    assert!(started.elapsed() >= Duration::from_secs(90));
    assert_eq!(h.store.load_sentences().await.unwrap().len(), 1);
}

#[tokio::test]
async fn continue_run_resumes_after_last_stored_sentence() {
    let store = Arc::new(InMemoryStore::new());
    let first = harness_with(
        ScriptedModel::answering(),
        Arc::new(NativeGenerator),
        store.clone(),
    );
    first
        .orchestrator
        .run(seeds(&["S1", "S2", "S3"]), false)
        .await
        .unwrap();

    let second = harness_with(
        ScriptedModel::answering(),
        Arc::new(NativeGenerator),
        store.clone(),
    );
    let summary = second
        .orchestrator
        .run(seeds(&["S1", "S2", "S3", "S4"]), true)
        .await
        .unwrap();

    assert_eq!(summary.sentences, 1);
    assert_eq!(summary.skipped, 3);
    let stored: Vec<String> = store
        .load_sentences()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.sentence.sentence)
        .collect();
    assert_eq!(stored, vec!["S1", "S2", "S3", "S4"]);
}

#[tokio::test]
async fn resume_point_missing_from_seeds_processes_nothing() {
    let store = Arc::new(InMemoryStore::new());
    let first = harness_with(
        ScriptedModel::answering(),
        Arc::new(NativeGenerator),
        store.clone(),
    );
    first.orchestrator.run(seeds(&["S9"]), false).await.unwrap();

    let summary = first
        .orchestrator
        .run(seeds(&["S1", "S2"]), true)
        .await
        .unwrap();
    assert_eq!(summary.sentences, 0);
    assert_eq!(summary.skipped, 2);
    assert_eq!(store.load_sentences().await.unwrap().len(), 1);
}

#[tokio::test]
async fn continue_run_on_empty_store_processes_everything() {
    let h = harness(ScriptedModel::answering());
    let summary = h
        .orchestrator
        .run(seeds(&["S1", "S2"]), true)
        .await
        .unwrap();
    assert_eq!(summary.sentences, 2);
    assert_eq!(summary.skipped, 0);
}

#[tokio::test]
async fn blank_seeds_are_skipped() {
    let h = harness(ScriptedModel::answering());
    let input = parse_seeds(
        "{\"question\":\"S1\",\"answer\":true}\n{\"question\":\"  \",\"answer\":false}\n",
    )
    .unwrap();
    let summary = h
        .orchestrator
        .run(input.into_iter().map(Ok), false)
        .await
        .unwrap();
    assert_eq!(summary.sentences, 1);
    assert_eq!(summary.skipped, 1);
}

#[tokio::test]
async fn generation_failure_stops_the_run_and_names_the_sentence() {
    let h = harness_with(
        ScriptedModel::answering(),
        Arc::new(BrokenGenerator),
        Arc::new(InMemoryStore::new()),
    );
    let err = h
        .orchestrator
        .run(seeds(&["Is the sky blue?", "Is fire cold?"]), false)
        .await
        .unwrap_err();

    match &err {
        RunnerError::Sentence { sentence, source } => {
            assert_eq!(sentence, "Is the sky blue?");
            assert!(matches!(
                source.as_ref(),
                RunnerError::Payload(PayloadError::Generation { .. })
            ));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(h.store.load_sentences().await.unwrap().is_empty());
    assert!(std::fs::read_dir(h.cache.path())
        .unwrap()
        .filter_map(Result::ok)
        .all(|entry| !entry.file_name().to_string_lossy().ends_with(".csv")));
}

#[tokio::test]
async fn applied_model_settings_are_stored_with_each_sentence() {
    let mut h = harness(ScriptedModel::answering());
    h.orchestrator
        .apply_model_settings(&serde_json::json!({ "temperature": 0.2 }))
        .await
        .unwrap();
    assert_eq!(
        h.orchestrator.session().prompt,
        PromptSettings::new("Q: ", "")
    );

    h.orchestrator.run(seeds(&["S1"]), false).await.unwrap();
    let sentence = &h.store.load_sentences().await.unwrap()[0];
    let params = h.store.load_parameters(sentence.id).await.unwrap();
    assert!(params
        .iter()
        .any(|p| p.parameter == "temperature" && p.value == "0.2"));
}

#[tokio::test]
async fn sentences_record_the_requested_strength() {
    let h = harness(ScriptedModel::answering());
    // One token: the array itself can only be built with strength 1.
    h.orchestrator.run(seeds(&["S1"]), false).await.unwrap();

    let sentence = &h.store.load_sentences().await.unwrap()[0];
    assert_eq!(sentence.sentence.strength, 2);
    let filter = synprobe_oracle::SentenceFilter {
        model_name: None,
        strength: Some(2),
        note: None,
    };
    assert!(filter.matches(&sentence.sentence));
}

#[tokio::test]
async fn unreadable_seeds_before_the_resume_point_are_counted() {
    let store = Arc::new(InMemoryStore::new());
    let h = harness_with(
        ScriptedModel::answering(),
        Arc::new(NativeGenerator),
        store.clone(),
    );
    h.orchestrator.run(seeds(&["S1"]), false).await.unwrap();

    let input = vec![
        Err(RunnerError::Seed {
            line: 1,
            reason: "expected value".into(),
        }),
        Ok(seed("S1", Label::True)),
        Ok(seed("S2", Label::True)),
    ];
    let summary = h.orchestrator.run(input, true).await.unwrap();
    assert_eq!(summary.sentences, 1);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.unreadable_seeds, 1);
}
