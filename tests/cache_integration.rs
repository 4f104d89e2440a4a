//! Ontology cache against file-backed sources

use async_trait::async_trait;
use ontology_tree::{
    get_all_leaf_ids, FileOntologySource, ModelIndex, Ontology, OntologyCache, OntologySource,
    Result,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn data_path(file: &str) -> String {
    format!("{}/data/{}", env!("CARGO_MANIFEST_DIR"), file)
}

fn file_source() -> FileOntologySource {
    FileOntologySource::new(data_path("ontology.json"), data_path("model.json"))
}

/// Counts ontology fetches and holds each one open for a while
struct SlowCountingSource {
    inner: FileOntologySource,
    fetches: AtomicUsize,
}

#[async_trait]
impl OntologySource for SlowCountingSource {
    async fn fetch_ontology(&self) -> Result<Ontology<()>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.inner.fetch_ontology().await
    }

    async fn fetch_model(&self) -> Result<ModelIndex> {
        self.inner.fetch_model().await
    }
}

#[tokio::test]
async fn test_file_source_loads_prepared_tree() {
    let cache = OntologyCache::new(file_source());
    assert!(cache.cached().is_none());

    let loaded = cache.get().await.unwrap();
    assert_eq!(loaded.ontology.name, "Categories");
    assert_eq!(get_all_leaf_ids(&loaded.ontology.tree).len(), 10);
    assert!(loaded.model.question("GeneQuestions.GenesByTaxon").is_some());

    let cached = cache.cached().unwrap();
    assert!(Arc::ptr_eq(&loaded, &cached));
}

#[tokio::test]
async fn test_concurrent_callers_share_one_fetch() {
    let cache = Arc::new(OntologyCache::new(SlowCountingSource {
        inner: file_source(),
        fetches: AtomicUsize::new(0),
    }));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get().await })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(cache.source().fetches.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
}

#[tokio::test]
async fn test_invalidate_starts_new_generation() {
    let cache = OntologyCache::new(SlowCountingSource {
        inner: file_source(),
        fetches: AtomicUsize::new(0),
    });

    let (a, b) = tokio::join!(cache.get(), cache.get());
    assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));

    cache.invalidate();
    assert_eq!(cache.generation(), 1);
    cache.get().await.unwrap();
    assert_eq!(cache.source().fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_missing_file_is_error_and_retried() {
    let dir = tempfile::tempdir().unwrap();
    let ontology_path = dir.path().join("ontology.json");
    let cache = OntologyCache::new(FileOntologySource::new(
        ontology_path.clone(),
        data_path("model.json"),
    ));

    assert!(cache.get().await.is_err());

    std::fs::copy(data_path("ontology.json"), &ontology_path).unwrap();
    let loaded = cache.get().await.unwrap();
    assert_eq!(loaded.ontology.name, "Categories");
}
