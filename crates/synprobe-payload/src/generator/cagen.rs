//! CAgen backend: cardinalities on the command line, CSV file output, row
//! count reported on stderr.

use super::process::{first_integer, parse_generator_output, run};
use super::CoveringArrayGenerator;
use crate::error::{PayloadError, PayloadResult};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use synprobe_types::{ArrayKey, CoveringArray};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct CaGenGenerator {
    executable: PathBuf,
}

impl CaGenGenerator {
    pub fn new(executable: PathBuf) -> Self {
        Self { executable }
    }

    fn args(key: &ArrayKey, output: &Path) -> Vec<OsString> {
        vec![
            "-t".into(),
            key.strength().to_string().into(),
            "-i".into(),
            key.cardinalities().to_string().into(),
            "-p".into(),
            "-q".into(),
            "--randomize".into(),
            "-o".into(),
            output.as_os_str().to_owned(),
        ]
    }
}

#[async_trait]
impl CoveringArrayGenerator for CaGenGenerator {
    fn name(&self) -> &'static str {
        "cagen"
    }

    async fn produce(&self, key: &ArrayKey, workdir: &Path) -> PayloadResult<CoveringArray> {
        let output_path = workdir.join("cagen.csv");
        let output = run(&self.executable, Self::args(key, &output_path), key).await?;

        if !output.status.success() && !output_path.exists() {
            return Err(PayloadError::generation(
                key,
                format!("cagen exited with {}: {}", output.status, output.stderr.trim()),
            ));
        }
        let reported = first_integer(&output.stderr)
            .ok_or_else(|| PayloadError::generation(key, "cagen reported no row count"))?;

        let text = tokio::fs::read_to_string(&output_path)
            .await
            .map_err(|e| PayloadError::generation(key, format!("cagen output unreadable: {}", e)))?;
        let array = parse_generator_output(&text, ',', key)?;
        if array.row_count() != reported {
            warn!(
                key = %key,
                reported,
                parsed = array.row_count(),
                "cagen row count differs from parsed rows"
            );
        }
        Ok(array)
    }
}
