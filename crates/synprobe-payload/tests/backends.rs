//! Generator backends driven through fake executables.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use synprobe_payload::{ArrayCache, ArrayGenerator, GeneratorKind, PayloadError, PayloadResult};
use synprobe_types::Cardinalities;

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn generator(kind: GeneratorKind, exe: &Path, cache: &Path) -> ArrayGenerator {
    let backend = kind.build(Some(exe), Path::new("/bin/sh")).unwrap();
    ArrayGenerator::new(backend, ArrayCache::open(cache).unwrap())
}

fn rows(generator: &ArrayGenerator, handle: &synprobe_payload::ArrayHandle) -> Vec<Vec<usize>> {
    generator
        .read_rows(handle)
        .unwrap()
        .collect::<PayloadResult<_>>()
        .unwrap()
}

const CAGEN: &str = r#"out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift; fi
  shift
done
echo run >> "$(dirname "$0")/calls"
printf '# CAgen\nP0,P1\n0,0\n0,1\n1,0\n1,1\n' > "$out"
echo "Number of rows: 4" >&2
"#;

#[tokio::test]
async fn cagen_output_is_translated_and_cached() {
    let bin = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let exe = script(bin.path(), "cagen", CAGEN);
    let generator = generator(GeneratorKind::Cagen, &exe, cache.path());
    let cards: Cardinalities = vec![2, 2].into();

    let first = generator.generate(&cards, 2).await.unwrap();
    assert_eq!(first.row_count(), 4);
    assert_eq!(
        rows(&generator, &first),
        vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]
    );
    assert_eq!(
        std::fs::read_to_string(first.path()).unwrap(),
        "0,0\n0,1\n1,0\n1,1\n"
    );

    let second = generator.generate(&cards, 2).await.unwrap();
    assert_eq!(second.row_count(), 4);
    assert_eq!(second.path(), first.path());
    let calls = std::fs::read_to_string(bin.path().join("calls")).unwrap();
    assert_eq!(calls.lines().count(), 1);
}

#[tokio::test]
async fn cagen_without_row_count_is_not_cached() {
    let bin = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let exe = script(
        bin.path(),
        "cagen",
        r#"out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift; fi
  shift
done
printf '0,0\n1,1\n' > "$out"
"#,
    );
    let generator = generator(GeneratorKind::Cagen, &exe, cache.path());
    let err = generator
        .generate(&vec![2, 2].into(), 2)
        .await
        .unwrap_err();
    assert!(matches!(err, PayloadError::Generation { .. }));
    assert!(!cache.path().join("ca-t2-2,2.csv").exists());
}

#[tokio::test]
async fn failing_backend_writes_nothing() {
    let bin = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let exe = script(bin.path(), "pict", "echo 'bad model' >&2\nexit 3\n");
    let generator = generator(GeneratorKind::Pict, &exe, cache.path());

    let err = generator
        .generate(&vec![3, 2].into(), 2)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("bad model"));
    let leftovers: Vec<_> = std::fs::read_dir(cache.path()).unwrap().collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn pict_reads_model_and_tab_separated_stdout() {
    let bin = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let exe = script(
        bin.path(),
        "pict",
        r#"cp "$1" "$(dirname "$0")/model.seen"
echo "$2" > "$(dirname "$0")/order.seen"
printf 'P0\tP1\n0\t0\n1\t1\n2\t0\n0\t1\n1\t0\n2\t1\n'
"#,
    );
    let generator = generator(GeneratorKind::Pict, &exe, cache.path());
    let handle = generator.generate(&vec![3, 2].into(), 2).await.unwrap();

    assert_eq!(handle.row_count(), 6);
    assert_eq!(
        std::fs::read_to_string(bin.path().join("model.seen")).unwrap(),
        "P0: 0, 1, 2\nP1: 0, 1\n"
    );
    assert_eq!(
        std::fs::read_to_string(bin.path().join("order.seen")).unwrap().trim(),
        "/o:2"
    );
}

#[tokio::test]
async fn acts_runs_the_jar_through_java() {
    let bin = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let jar = bin.path().join("acts.jar");
    std::fs::write(&jar, "").unwrap();
    // A fake `java` receiving: -Ddoi=T -Doutput=csv -jar JAR MODEL OUTPUT
    let java = script(
        bin.path(),
        "java",
        r#"printf '# ACTS Test Suite Generation\n# Degree of interaction coverage: 2\nP0,P1,P2\n0,0,0\n0,1,1\n1,0,1\n1,1,0\n' > "$6"
"#,
    );
    let backend = GeneratorKind::Acts.build(Some(&jar), &java).unwrap();
    let generator = ArrayGenerator::new(backend, ArrayCache::open(cache.path()).unwrap());

    let handle = generator.generate(&vec![2, 2, 2].into(), 2).await.unwrap();
    assert_eq!(handle.row_count(), 4);
    assert_eq!(handle.key().signature(), "t2-2,2,2");
    assert_eq!(rows(&generator, &handle)[1], vec![0, 1, 1]);
}

#[tokio::test]
async fn stale_cache_entry_is_regenerated() {
    let bin = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let exe = script(bin.path(), "cagen", CAGEN);
    std::fs::write(cache.path().join("ca-t2-2,2.csv"), "0,0,0\n9,9,9\n").unwrap();

    let generator = generator(GeneratorKind::Cagen, &exe, cache.path());
    let handle = generator.generate(&vec![2, 2].into(), 2).await.unwrap();
    assert_eq!(handle.row_count(), 4);
    assert!(bin.path().join("calls").exists());
}

#[tokio::test]
async fn concurrent_requests_for_one_key_generate_once() {
    let bin = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let exe = script(bin.path(), "cagen", CAGEN);
    let generator = std::sync::Arc::new(generator(GeneratorKind::Cagen, &exe, cache.path()));

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let generator = generator.clone();
            tokio::spawn(async move { generator.generate(&vec![2, 2].into(), 2).await })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap().row_count(), 4);
    }
    let calls = std::fs::read_to_string(bin.path().join("calls")).unwrap();
    assert_eq!(calls.lines().count(), 1);
}
