//! End-to-end discovery runs against scripted collaborators.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

use ragam_scout::prelude::*;
use ragam_scout::testing::{fixtures, MockFetcher, MockOracle, MockSearchEngine};

fn engines(ids: &[&str]) -> EngineRegistry {
    EngineRegistry::new(
        ids.iter()
            .map(|id| {
                EngineConfig::new(*id, format!("https://{id}.test"), format!("https://{id}.test/?q={{query}}"))
                    .with_timeouts(1.0, 1.0)
            })
            .collect(),
    )
}

fn config(ids: &[&str]) -> DiscoveryConfig {
    DiscoveryConfig::default()
        .with_engines(engines(ids))
        .with_pages_per_engine(1)
        .with_max_concurrent(2)
}

fn scout(
    config: DiscoveryConfig,
    engine: MockSearchEngine,
    fetcher: MockFetcher,
    oracle: MockOracle,
) -> RagamScout {
    RagamScout::new(config, Arc::new(engine), Arc::new(fetcher), Arc::new(oracle))
}

#[tokio::test]
async fn test_two_engines_two_urls() {
    let engine = MockSearchEngine::new()
        .with_urls("alpha", &["https://songs.example/shankarabharanam"])
        .with_urls("beta", &["https://lyrics.example/shankarabharanam-kritis"]);

    let report = scout(config(&["alpha", "beta"]), engine, MockFetcher::new(), MockOracle::new())
        .discover_and_extract("Shankarabharanam")
        .await
        .unwrap();

    assert!(report.variants.contains(&"shankarabharanam".to_string()));
    assert_eq!(report.variants[0], "shankarabharanam");
    assert_eq!(report.candidates.len(), 2);
}

#[tokio::test]
async fn test_two_engines_same_page_one_url() {
    let engine = MockSearchEngine::new()
        .with_urls("alpha", &["https://songs.example/todi/"])
        .with_urls("beta", &["https://www.bing.com/ck/a?u=a1aHR0cHM6Ly9zb25ncy5leGFtcGxlL3RvZGk&ntb=1"]);

    let report = scout(config(&["alpha", "beta"]), engine, MockFetcher::new(), MockOracle::new())
        .discover_and_extract("Todi")
        .await
        .unwrap();

    assert_eq!(report.candidates.len(), 1);
    assert_eq!(report.candidates[0].normalized_key, "https://songs.example/todi");
}

#[tokio::test]
async fn test_meta_refresh_stub_is_followed() {
    let engine = MockSearchEngine::new().with_urls("alpha", &["https://stub.example/hop"]);
    let fetcher = MockFetcher::new()
        .with_page("https://stub.example/hop", fixtures::meta_refresh_stub("https://real.site/page"))
        .with_page(
            "https://real.site/page",
            fixtures::song_page("Kalyani", &["Nidhi Chala Sukhama, composed by Thyagaraja"]),
        );
    let oracle = MockOracle::new()
        .with_answer("Nidhi Chala", fixtures::oracle_answer(&["Nidhi Chala Sukhama"], "Thyagaraja"));

    let report = scout(config(&["alpha"]), engine, fetcher, oracle)
        .discover_and_extract("Kalyani")
        .await
        .unwrap();

    assert_eq!(report.songs.len(), 1);
    assert_eq!(report.songs[0].source_url, "https://real.site/page");
    assert_eq!(report.drops.total, 0);
}

#[tokio::test]
async fn test_unresolvable_stub_yields_nothing() {
    let engine = MockSearchEngine::new().with_urls("alpha", &["https://stub.example/hop"]);
    let fetcher = MockFetcher::new().with_page("https://stub.example/hop", fixtures::dead_end_stub());
    let oracle = Arc::new(MockOracle::new().with_default_answer(fixtures::oracle_answer(&["Ghost"], "Nobody")));

    let scout = RagamScout::new(config(&["alpha"]), Arc::new(engine), Arc::new(fetcher), oracle.clone());
    let report = scout.discover_and_extract("Todi").await.unwrap();

    assert!(report.songs.is_empty());
    assert_eq!(oracle.call_count(), 0);
    assert_eq!(report.drops.count(DropStage::StubResolution), 1);
}

#[tokio::test]
async fn test_stub_pointing_at_video_host_is_dropped() {
    let engine = MockSearchEngine::new().with_urls("alpha", &["https://stub.example/hop"]);
    let fetcher = MockFetcher::new().with_page(
        "https://stub.example/hop",
        fixtures::meta_refresh_stub("https://www.youtube.com/watch?v=abc"),
    );

    let report = scout(config(&["alpha"]), engine, fetcher, MockOracle::new())
        .discover_and_extract("Todi")
        .await
        .unwrap();

    assert!(report.songs.is_empty());
    assert_eq!(report.drops.count(DropStage::VideoHost), 1);
}

#[tokio::test]
async fn test_duplicate_titles_keep_first() {
    let engine = MockSearchEngine::new().with_urls(
        "alpha",
        &["https://first.example/harikambhoji", "https://second.example/harikambhoji"],
    );
    let fetcher = MockFetcher::new()
        .with_page(
            "https://first.example/harikambhoji",
            fixtures::song_page("Harikambhoji", &["Enduku Nirdaya is a kriti by Thyagaraja"]),
        )
        .with_page(
            "https://second.example/harikambhoji",
            fixtures::song_page("Harikambhoji", &["ENDUKU NIRDAYA sung in many concerts"]),
        );
    let oracle = MockOracle::new()
        .with_answer(
            "is a kriti",
            r#"[{"title":"Enduku Nirdaya","composer":"Thyagaraja","ragam":"harikambhoji"}]"#,
        )
        .with_answer("many concerts", r#"[{"title":"enduku  nirdaya","composer":null}]"#);

    let report = scout(config(&["alpha"]).with_max_concurrent(1), engine, fetcher, oracle)
        .discover_and_extract("Harikambhoji")
        .await
        .unwrap();

    assert_eq!(report.songs.len(), 1);
    assert_eq!(report.songs[0].title, "Enduku Nirdaya");
    assert_eq!(report.songs[0].composer.as_deref(), Some("Thyagaraja"));
    assert_eq!(report.songs[0].source_url, "https://first.example/harikambhoji");
    assert_eq!(report.extraction.extracted_pages, 2);
}

#[tokio::test]
async fn test_prose_wrapped_output_matches_bare_output() {
    let bare = r#"[{"title":"Enduku Nirdaya","composer":"Thyagaraja"}]"#;
    let mut runs = Vec::new();
    for answer in [bare.to_string(), format!("Here is the result: {bare}\nHope this helps!")] {
        let engine = MockSearchEngine::new().with_urls("alpha", &["https://songs.example/p"]);
        let fetcher = MockFetcher::new().with_page(
            "https://songs.example/p",
            fixtures::song_page("Songs", &["A page listing songs in the ragam"]),
        );
        let report = scout(config(&["alpha"]), engine, fetcher, MockOracle::new().with_default_answer(answer))
            .discover_and_extract("Harikambhoji")
            .await
            .unwrap();
        runs.push(report.songs);
    }

    assert_eq!(runs[0].len(), 1);
    assert_eq!(runs[0], runs[1]);
}

#[tokio::test]
async fn test_truncated_output_yields_zero_records() {
    let engine = MockSearchEngine::new().with_urls("alpha", &["https://songs.example/p"]);
    let fetcher = MockFetcher::new().with_page(
        "https://songs.example/p",
        fixtures::song_page("Songs", &["A page listing songs in the ragam"]),
    );
    let oracle = MockOracle::new().with_default_answer(r#"[{"title": "Enduku Nirdaya", "composer": "Thya"#);

    let report = scout(config(&["alpha"]), engine, fetcher, oracle)
        .discover_and_extract("Harikambhoji")
        .await
        .unwrap();

    assert!(report.songs.is_empty());
    assert_eq!(report.drops.count(DropStage::Parse), 1);
}

#[tokio::test]
async fn test_concurrency_cap_is_respected() {
    let urls: Vec<String> = (0..6).map(|i| format!("https://songs{i}.example/todi")).collect();
    let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();

    let engine = MockSearchEngine::new().with_urls("alpha", &url_refs);
    let mut fetcher = MockFetcher::new();
    for url in &urls {
        fetcher = fetcher.with_page(url, fixtures::song_page("Todi", &["Songs composed in this ragam"]));
    }
    let oracle = Arc::new(MockOracle::new().with_delay(Duration::from_millis(40)));

    let scout = RagamScout::new(config(&["alpha"]), Arc::new(engine), Arc::new(fetcher), oracle.clone());
    let report = scout.discover_and_extract("Todi").await.unwrap();

    assert_eq!(report.candidates.len(), 6);
    assert_eq!(report.extraction.extracted_pages, 6);
    assert_eq!(oracle.call_count(), 6);
    assert!(oracle.peak_in_flight() <= 2);
    assert!(report.extraction.peak_concurrency <= 2);
}

#[tokio::test]
async fn test_failures_are_isolated() {
    let engine = MockSearchEngine::new()
        .with_failure("alpha")
        .with_urls("beta", &["https://good.example/", "https://down.example/", "https://bad.example/"]);
    let fetcher = MockFetcher::new()
        .with_page("https://good.example/", fixtures::song_page("Good", &["Vatapi Ganapatim by Dikshitar"]))
        .with_page("https://bad.example/", fixtures::song_page("Bad", &["A page the oracle chokes on"]));
    let oracle = MockOracle::new()
        .with_answer("Vatapi", fixtures::oracle_answer(&["Vatapi Ganapatim"], "Muthuswami Dikshitar"))
        .with_failure("chokes", "exit status 1");

    let report = scout(config(&["alpha", "beta"]), engine, fetcher, oracle)
        .discover_and_extract("Hamsadhwani")
        .await
        .unwrap();

    assert_eq!(report.songs.len(), 1);
    assert_eq!(report.songs[0].title, "Vatapi Ganapatim");
    assert_eq!(report.drops.count(DropStage::Search), report.queries.len());
    assert_eq!(report.drops.count(DropStage::Fetch), 1);
    assert_eq!(report.drops.count(DropStage::Oracle), 1);
}

#[tokio::test]
async fn test_empty_term_is_invalid_input() {
    let err = scout(config(&["alpha"]), MockSearchEngine::new(), MockFetcher::new(), MockOracle::new())
        .discover_and_extract("  ")
        .await
        .unwrap_err();

    assert!(matches!(err, ScoutError::InvalidInput(_)));
    assert_eq!(err.kind(), FailureKind::InvalidInput);
}
