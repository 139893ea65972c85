//! Persisting a run's songs and exporting them.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::TempDir;

use ragam_scout::prelude::*;
use ragam_scout::testing::{fixtures, MockFetcher, MockOracle, MockSearchEngine};

#[tokio::test]
async fn test_run_persist_and_export() {
    let engine = MockSearchEngine::new().with_urls("alpha", &["https://songs.example/mohanam"]);
    let fetcher = MockFetcher::new().with_page(
        "https://songs.example/mohanam",
        fixtures::song_page("Mohanam", &["Nannu Palimpa and Bhavanuta are kritis in this ragam"]),
    );
    let oracle = MockOracle::new()
        .with_default_answer(fixtures::oracle_answer(&["Nannu Pālimpa", "Bhavanuta"], "Thyagaraja"));
    let config = DiscoveryConfig::default()
        .with_engines(EngineRegistry::new(vec![EngineConfig::new(
            "alpha",
            "https://alpha.test",
            "https://alpha.test/?q={query}",
        )]))
        .with_pages_per_engine(1);

    let scout = RagamScout::new(config, Arc::new(engine), Arc::new(fetcher), Arc::new(oracle));
    let report = scout.discover_and_extract("Mohanam").await.unwrap();
    assert_eq!(report.songs.len(), 2);

    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::open(dir.path().join("scraper.json")).await.unwrap();
    let summary = persist_songs(&store, "Mohanam", &report.songs).await;
    assert_eq!(summary, PersistSummary { inserted: 2, skipped: 0 });

    let export_path = dir.path().join(default_export_path("Mohanam"));
    assert_eq!(export_songs(&store, &export_path).await.unwrap(), 2);

    let exported: Vec<StoredSong> =
        serde_json::from_str(&std::fs::read_to_string(&export_path).unwrap()).unwrap();
    let mut titles: Vec<_> = exported.iter().map(|s| s.title.clone()).collect();
    titles.sort();
    assert_eq!(titles, vec!["Bhavanuta", "Nannu Palimpa"]);
    assert!(exported.iter().all(|s| s.ragam == "Mohanam"));
    assert!(exported.iter().all(|s| s.source_url == "https://songs.example/mohanam"));
}
