//! PICT backend: parameter model file in, tab-separated table with a header
//! row on stdout.

use super::process::{parse_generator_output, run, value_list};
use super::CoveringArrayGenerator;
use crate::error::{PayloadError, PayloadResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use synprobe_types::{ArrayKey, CoveringArray};

#[derive(Debug, Clone)]
pub struct PictGenerator {
    executable: PathBuf,
}

impl PictGenerator {
    pub fn new(executable: PathBuf) -> Self {
        Self { executable }
    }

    /// One `P<i>: 0, 1, ...` line per position.
    pub(crate) fn model(key: &ArrayKey) -> String {
        key.cardinalities()
            .as_slice()
            .iter()
            .enumerate()
            .map(|(i, &card)| format!("P{}: {}\n", i, value_list(card, ", ")))
            .collect()
    }
}

#[async_trait]
impl CoveringArrayGenerator for PictGenerator {
    fn name(&self) -> &'static str {
        "pict"
    }

    async fn produce(&self, key: &ArrayKey, workdir: &Path) -> PayloadResult<CoveringArray> {
        let model_path = workdir.join("model.pict");
        tokio::fs::write(&model_path, Self::model(key)).await?;

        let args = vec![
            model_path.as_os_str().to_owned(),
            format!("/o:{}", key.strength()).into(),
        ];
        let output = run(&self.executable, args, key).await?;
        if !output.status.success() && output.stdout.trim().is_empty() {
            return Err(PayloadError::generation(
                key,
                format!("pict exited with {}: {}", output.status, output.stderr.trim()),
            ));
        }
        parse_generator_output(&output.stdout, '\t', key)
    }
}
