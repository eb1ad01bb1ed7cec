//! ACTS backend: `[System]`/`[Parameter]` model file read by the ACTS jar,
//! CSV output file with a commented preamble and a parameter-name header.

use super::process::{parse_generator_output, run, value_list};
use super::CoveringArrayGenerator;
use crate::error::{PayloadError, PayloadResult};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use synprobe_types::{ArrayKey, CoveringArray};

#[derive(Debug, Clone)]
pub struct ActsGenerator {
    jar: PathBuf,
    java: PathBuf,
}

impl ActsGenerator {
    pub fn new(jar: PathBuf, java: PathBuf) -> Self {
        Self { jar, java }
    }

    pub(crate) fn model(key: &ArrayKey) -> String {
        let mut model = String::from("[System]\nName: SYNPROBE\n\n[Parameter]\n");
        for (i, &card) in key.cardinalities().as_slice().iter().enumerate() {
            model.push_str(&format!("P{}(int): {}\n", i, value_list(card, ",")));
        }
        model
    }

    fn args(&self, key: &ArrayKey, model: &Path, output: &Path) -> Vec<OsString> {
        vec![
            format!("-Ddoi={}", key.strength()).into(),
            "-Doutput=csv".into(),
            "-jar".into(),
            self.jar.as_os_str().to_owned(),
            model.as_os_str().to_owned(),
            output.as_os_str().to_owned(),
        ]
    }
}

#[async_trait]
impl CoveringArrayGenerator for ActsGenerator {
    fn name(&self) -> &'static str {
        "acts"
    }

    async fn produce(&self, key: &ArrayKey, workdir: &Path) -> PayloadResult<CoveringArray> {
        let model_path = workdir.join("model.txt");
        let output_path = workdir.join("acts.csv");
        tokio::fs::write(&model_path, Self::model(key)).await?;

        let output = run(
            &self.java,
            self.args(key, &model_path, &output_path),
            key,
        )
        .await?;
        if !output.status.success() && !output_path.exists() {
            return Err(PayloadError::generation(
                key,
                format!("acts exited with {}: {}", output.status, output.stderr.trim()),
            ));
        }

        let text = tokio::fs::read_to_string(&output_path)
            .await
            .map_err(|e| PayloadError::generation(key, format!("acts output unreadable: {}", e)))?;
        parse_generator_output(&text, ',', key)
    }
}
