//! Covering-array generation.
//!
//! Backends implement [`CoveringArrayGenerator`]: given an [`ArrayKey`] they
//! translate it into their tool's native model format, run the tool and
//! translate its output back into canonical rows. [`ArrayGenerator`] puts a
//! backend behind the shared [`ArrayCache`] and exposes the
//! generate/read-rows contract used by the pipeline.

mod acts;
mod cache;
mod cagen;
pub mod coverage;
pub mod native;
mod pict;
mod process;

pub use acts::ActsGenerator;
pub use cache::ArrayCache;
pub use cagen::CaGenGenerator;
pub use native::NativeGenerator;
pub use pict::PictGenerator;

use crate::error::{PayloadError, PayloadResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use synprobe_types::{ArrayKey, Cardinalities, CoveringArray};
use tracing::{debug, info, instrument};

/// A covering-array generator backend.
#[async_trait]
pub trait CoveringArrayGenerator: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Produce a covering array for `key`. `workdir` is a scratch directory
    /// for model and output files; it is removed afterwards.
    async fn produce(&self, key: &ArrayKey, workdir: &Path) -> PayloadResult<CoveringArray>;
}

/// Backend selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    Cagen,
    Pict,
    Acts,
    Native,
}

impl GeneratorKind {
    /// Build the backend. External backends need an existing executable
    /// (for ACTS, the jar file); anything else is a configuration error.
    pub fn build(
        self,
        executable: Option<&Path>,
        java: &Path,
    ) -> PayloadResult<Arc<dyn CoveringArrayGenerator>> {
        let required = || {
            executable.ok_or_else(|| {
                PayloadError::Configuration(format!("{} backend requires an executable path", self))
            })
        };
        match self {
            GeneratorKind::Native => Ok(Arc::new(NativeGenerator)),
            GeneratorKind::Cagen => {
                let path = required()?;
                ensure_executable(path)?;
                Ok(Arc::new(CaGenGenerator::new(path.to_path_buf())))
            }
            GeneratorKind::Pict => {
                let path = required()?;
                ensure_executable(path)?;
                Ok(Arc::new(PictGenerator::new(path.to_path_buf())))
            }
            GeneratorKind::Acts => {
                let path = required()?;
                if !path.is_file() {
                    return Err(PayloadError::Configuration(format!(
                        "ACTS jar {} not found",
                        path.display()
                    )));
                }
                Ok(Arc::new(ActsGenerator::new(
                    path.to_path_buf(),
                    java.to_path_buf(),
                )))
            }
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeneratorKind::Cagen => "cagen",
            GeneratorKind::Pict => "pict",
            GeneratorKind::Acts => "acts",
            GeneratorKind::Native => "native",
        };
        f.write_str(name)
    }
}

impl FromStr for GeneratorKind {
    type Err = PayloadError;

    fn from_str(s: &str) -> PayloadResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "cagen" => Ok(GeneratorKind::Cagen),
            "pict" => Ok(GeneratorKind::Pict),
            "acts" => Ok(GeneratorKind::Acts),
            "native" => Ok(GeneratorKind::Native),
            other => Err(PayloadError::Configuration(format!(
                "unknown covering array generator: {}",
                other
            ))),
        }
    }
}

fn ensure_executable(path: &Path) -> PayloadResult<()> {
    let metadata = std::fs::metadata(path).map_err(|_| {
        PayloadError::Configuration(format!("generator executable {} not found", path.display()))
    })?;
    if !metadata.is_file() {
        return Err(PayloadError::Configuration(format!(
            "generator executable {} is not a file",
            path.display()
        )));
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(PayloadError::Configuration(format!(
                "generator executable {} is not executable",
                path.display()
            )));
        }
    }
    Ok(())
}

/// A generated (or reused) covering array on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayHandle {
    key: ArrayKey,
    path: PathBuf,
    rows: usize,
}

impl ArrayHandle {
    pub fn key(&self) -> &ArrayKey {
        &self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }
}

/// Lazy reader over the rows of a published array.
pub struct RowReader {
    lines: Lines<BufReader<File>>,
    columns: usize,
    row: usize,
}

impl Iterator for RowReader {
    type Item = PayloadResult<Vec<usize>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            if line.trim().is_empty() {
                continue;
            }
            let index = self.row;
            self.row += 1;
            let parsed = CoveringArray::parse_row(&line, index)
                .map_err(PayloadError::from)
                .and_then(|row| {
                    if row.len() == self.columns {
                        Ok(row)
                    } else {
                        Err(PayloadError::RowWidth {
                            row: index,
                            expected: self.columns,
                            found: row.len(),
                        })
                    }
                });
            return Some(parsed);
        }
    }
}

/// A generator backend behind the shared array cache.
pub struct ArrayGenerator {
    backend: Arc<dyn CoveringArrayGenerator>,
    cache: ArrayCache,
}

impl ArrayGenerator {
    pub fn new(backend: Arc<dyn CoveringArrayGenerator>, cache: ArrayCache) -> Self {
        Self { backend, cache }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Return the covering array for `(cardinalities, strength)`, reusing a
    /// valid cached entry or running the backend and publishing its output.
    /// A failed run publishes nothing.
    #[instrument(skip(self, cardinalities), fields(backend = self.backend.name(), cardinalities = %cardinalities))]
    pub async fn generate(
        &self,
        cardinalities: &Cardinalities,
        strength: usize,
    ) -> PayloadResult<ArrayHandle> {
        let key = ArrayKey::new(cardinalities.clone(), strength)?;
        let lease = self.cache.key_lock(&key);
        let _guard = lease.lock().await;

        if let Some(array) = self.cache.lookup(&key).await? {
            debug!(key = %key, rows = array.row_count(), "reusing cached covering array");
            return Ok(ArrayHandle {
                path: self.cache.path_for(&key),
                rows: array.row_count(),
                key,
            });
        }

        let workdir = self.cache.workdir()?;
        let array = self.backend.produce(&key, workdir.path()).await?;
        let path = self.cache.publish(&key, &array).await?;
        info!(key = %key, rows = array.row_count(), "covering array generated");
        Ok(ArrayHandle {
            key,
            path,
            rows: array.row_count(),
        })
    }

    /// Rows of a generated array, read lazily.
    pub fn read_rows(&self, handle: &ArrayHandle) -> PayloadResult<RowReader> {
        let file = File::open(handle.path())?;
        Ok(RowReader {
            lines: BufReader::new(file).lines(),
            columns: handle.key().columns(),
            row: 0,
        })
    }

    /// Canonical CSV text of a generated array.
    pub async fn contents(&self, handle: &ArrayHandle) -> PayloadResult<String> {
        Ok(tokio::fs::read_to_string(handle.path()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("PICT".parse::<GeneratorKind>().unwrap(), GeneratorKind::Pict);
        assert!(matches!(
            "jenny".parse::<GeneratorKind>(),
            Err(PayloadError::Configuration(_))
        ));
    }

    #[test]
    fn external_backend_without_path_is_a_configuration_error() {
        let err = GeneratorKind::Cagen
            .build(None, Path::new("java"))
            .err()
            .unwrap();
        assert!(matches!(err, PayloadError::Configuration(_)));
    }

    #[test]
    fn missing_executable_is_a_configuration_error() {
        let err = GeneratorKind::Pict
            .build(Some(Path::new("/nonexistent/pict")), Path::new("java"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("not found"));
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pict");
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        let err = GeneratorKind::Pict
            .build(Some(&path), Path::new("java"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("not executable"));
    }

    #[test]
    fn native_needs_no_executable() {
        let backend = GeneratorKind::Native.build(None, Path::new("java")).unwrap();
        assert_eq!(backend.name(), "native");
    }

    #[tokio::test]
    async fn generate_publishes_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ArrayGenerator::new(
            Arc::new(NativeGenerator),
            ArrayCache::open(dir.path()).unwrap(),
        );
        let cards: Cardinalities = vec![2, 2, 2].into();
        let handle = generator.generate(&cards, 2).await.unwrap();
        let rows: Vec<Vec<usize>> = generator
            .read_rows(&handle)
            .unwrap()
            .collect::<PayloadResult<_>>()
            .unwrap();
        assert_eq!(rows.len(), handle.row_count());
        assert!(coverage::missing_interactions(&[2, 2, 2], 2, &rows).is_empty());
        assert_eq!(generator.cache.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn row_reader_flags_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ca.csv");
        std::fs::write(&path, "0,1\n0\n").unwrap();
        let generator = ArrayGenerator::new(
            Arc::new(NativeGenerator),
            ArrayCache::open(dir.path()).unwrap(),
        );
        let handle = ArrayHandle {
            key: ArrayKey::new(vec![2, 2].into(), 2).unwrap(),
            path,
            rows: 2,
        };
        let rows: Vec<_> = generator.read_rows(&handle).unwrap().collect();
        assert!(rows[0].is_ok());
        assert!(matches!(rows[1], Err(PayloadError::RowWidth { row: 1, .. })));
    }
}
