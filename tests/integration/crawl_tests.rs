//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small results site and run the full
//! pagination, extraction, caching and CSV cycle end-to-end.

use racecrawl::cache::{cache_key, Cache, CacheStore, MemoryStore, SqliteStore};
use racecrawl::config::{builtin_layout, parse_layout};
use racecrawl::crawler::{run_crawl, CrawlOptions};
use racecrawl::output::write_csv_file;
use racecrawl::{CrawlError, EventParams, FieldParseError, RunnerRecord, SiteLayout};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a layout for the mock site with the given cache unit
fn create_test_layout(base_url: &str, cache_unit: &str) -> SiteLayout {
    parse_layout(&format!(
        r#"
name = "mock"
base-url = "{base_url}"
listing-path = "/results?event={{event_id}}&page={{page}}&size={{page_size}}"
page-size = 2
results-selector = "div.results"
runner-link-pattern = '/runner/\d+$'
cache-unit = "{cache_unit}"

[[params]]
name = "event_id"
default = 7

[[fields]]
name = "bib"
selector = "div.bib"
kind = "integer"

[[fields]]
name = "name"
selector = "div.name"

[[fields]]
name = "age"
selector = "div.age"
kind = "integer"

[[groups]]
mode = "zip"
labels = "ul.splits li"
values = "ul.times li"
columns = ["5km", "half"]

[groups.rename]
"5_km" = "5km"
"#
    ))
    .expect("test layout must be valid")
}

fn default_params(layout: &SiteLayout) -> EventParams {
    layout.event_params(&EventParams::new()).unwrap()
}

fn listing_page(runner_ids: &[u32]) -> String {
    let links: String = runner_ids
        .iter()
        .map(|id| format!(r#"<a href="/runner/{id}">Runner {id}</a>"#))
        .collect();
    format!(
        r#"<html><body>
        <a href="/about">About</a>
        <div class="results">{links}<a href="/results?sort=name">Sort</a></div>
        </body></html>"#
    )
}

fn runner_page(bib: u32, name: &str, age: &str) -> String {
    format!(
        r#"<html><body>
        <div class="bib"> {bib} </div>
        <div class="name">{name}</div>
        <div class="age">{age}</div>
        <ul class="splits"><li>5 KM</li><li>Half</li></ul>
        <ul class="times"><li>0:2{bib}:00</li><li>-</li></ul>
        </body></html>"#
    )
}

/// Mounts a listing page for `page` that is requested exactly `calls` times
async fn mount_listing(server: &MockServer, page: u32, runner_ids: &[u32], calls: u64) {
    Mock::given(method("GET"))
        .and(path("/results"))
        .and(query_param("event", "7"))
        .and(query_param("page", page.to_string()))
        .and(query_param("size", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(runner_ids)))
        .expect(calls)
        .mount(server)
        .await;
}

async fn mount_runner(server: &MockServer, id: u32, body: String, calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/runner/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(calls)
        .mount(server)
        .await;
}

/// Two runners on page 1, none on page 2
async fn mount_two_runner_event(server: &MockServer, calls: u64) {
    mount_listing(server, 1, &[1, 2], calls).await;
    mount_listing(server, 2, &[], calls).await;
    mount_runner(server, 1, runner_page(1, "Ann Lee", "34"), calls).await;
    mount_runner(server, 2, runner_page(2, "Bo Chen", "41"), calls).await;
}

#[tokio::test]
async fn test_full_crawl_collects_runners_in_order() {
    let mock_server = MockServer::start().await;
    mount_two_runner_event(&mock_server, 1).await;

    let layout = create_test_layout(&mock_server.uri(), "document");
    let params = default_params(&layout);
    let records = run_crawl(layout, Cache::disabled(), CrawlOptions::default(), &params)
        .await
        .expect("crawl should succeed");

    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(
        first.keys().collect::<Vec<_>>(),
        vec!["bib", "name", "age", "5km", "half"]
    );
    assert_eq!(first.get("bib"), Some(&json!(1)));
    assert_eq!(first.get("name"), Some(&json!("Ann Lee")));
    assert_eq!(first.get("age"), Some(&json!(34)));
    assert_eq!(first.get("5km"), Some(&json!("0:21:00")));
    assert_eq!(first.get("half"), Some(&json!(null)));

    assert_eq!(records[1].get("name"), Some(&json!("Bo Chen")));
}

#[tokio::test]
async fn test_first_page_without_runners_yields_no_records() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/results"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>No results</body></html>"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let layout = create_test_layout(&mock_server.uri(), "document");
    let params = default_params(&layout);
    let records = run_crawl(layout, Cache::disabled(), CrawlOptions::default(), &params)
        .await
        .unwrap();

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_second_crawl_is_served_from_cache() {
    let mock_server = MockServer::start().await;
    // Every page may hit the network once across both crawls
    mount_two_runner_event(&mock_server, 1).await;

    let store = Arc::new(MemoryStore::new());
    let layout = create_test_layout(&mock_server.uri(), "document");
    let params = default_params(&layout);

    let first = run_crawl(
        layout.clone(),
        Cache::with_store(store.clone()),
        CrawlOptions::default(),
        &params,
    )
    .await
    .unwrap();
    let second = run_crawl(
        layout,
        Cache::with_store(store.clone()),
        CrawlOptions::default(),
        &params,
    )
    .await
    .unwrap();

    assert_eq!(first, second);
    // Two listing pages and two runner pages
    assert_eq!(store.len(), 4);

    let runner_url = format!("{}/runner/1", mock_server.uri());
    let cached = store.peek(&cache_key(&runner_url)).unwrap();
    assert_eq!(
        String::from_utf8(cached).unwrap(),
        runner_page(1, "Ann Lee", "34")
    );
}

#[tokio::test]
async fn test_record_cache_unit_stores_parsed_values() {
    let mock_server = MockServer::start().await;
    mount_two_runner_event(&mock_server, 1).await;

    let store = Arc::new(MemoryStore::new());
    let layout = create_test_layout(&mock_server.uri(), "record");
    let params = default_params(&layout);
    let records = run_crawl(
        layout.clone(),
        Cache::with_store(store.clone()),
        CrawlOptions::default(),
        &params,
    )
    .await
    .unwrap();

    let listing_url = format!("{}/results?event=7&page=1&size=2", mock_server.uri());
    let links: Vec<String> =
        serde_json::from_slice(&store.peek(&cache_key(&listing_url)).unwrap()).unwrap();
    assert_eq!(
        links,
        vec![
            format!("{}/runner/1", mock_server.uri()),
            format!("{}/runner/2", mock_server.uri()),
        ]
    );

    let runner_url = format!("{}/runner/2", mock_server.uri());
    let cached: RunnerRecord =
        serde_json::from_slice(&store.peek(&cache_key(&runner_url)).unwrap()).unwrap();
    assert_eq!(cached, records[1]);

    // Served entirely from parsed values
    let again = run_crawl(
        layout,
        Cache::with_store(store.clone()),
        CrawlOptions::default(),
        &params,
    )
    .await
    .unwrap();
    assert_eq!(again, records);
}

#[tokio::test]
async fn test_sqlite_cache_persists_across_runs() {
    let mock_server = MockServer::start().await;
    mount_two_runner_event(&mock_server, 1).await;

    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("cache.db");
    let layout = create_test_layout(&mock_server.uri(), "document");
    let params = default_params(&layout);

    {
        let store = Arc::new(SqliteStore::open(&cache_path).unwrap());
        run_crawl(
            layout.clone(),
            Cache::with_store(store.clone()),
            CrawlOptions::default(),
            &params,
        )
        .await
        .unwrap();
        assert_eq!(store.count().unwrap(), 4);
    }

    let store = Arc::new(SqliteStore::open(&cache_path).unwrap());
    let records = run_crawl(
        layout,
        Cache::with_store(store),
        CrawlOptions::default(),
        &params,
    )
    .await
    .unwrap();

    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_fetch_error_aborts_crawl() {
    let mock_server = MockServer::start().await;
    mount_listing(&mock_server, 1, &[1, 2], 1).await;
    mount_runner(&mock_server, 1, runner_page(1, "Ann Lee", "34"), 1).await;
    Mock::given(method("GET"))
        .and(path("/runner/2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let layout = create_test_layout(&mock_server.uri(), "document");
    let params = default_params(&layout);
    let result = run_crawl(
        layout,
        Cache::with_store(store.clone()),
        CrawlOptions::default(),
        &params,
    )
    .await;

    match result {
        Err(CrawlError::Fetch(e)) => {
            assert_eq!(e.status, 500);
            assert_eq!(e.url, format!("{}/runner/2", mock_server.uri()));
            assert_eq!(e.body, "upstream exploded");
        }
        other => panic!("expected a fetch error, got {:?}", other),
    }

    // Failed responses are never cached
    let failed_url = format!("{}/runner/2", mock_server.uri());
    assert!(store.peek(&cache_key(&failed_url)).is_none());
}

#[tokio::test]
async fn test_field_parse_error_aborts_crawl() {
    let mock_server = MockServer::start().await;
    mount_listing(&mock_server, 1, &[1], 1).await;
    mount_runner(&mock_server, 1, runner_page(1, "Ann Lee", "unknown"), 1).await;

    let layout = create_test_layout(&mock_server.uri(), "document");
    let params = default_params(&layout);
    let result = run_crawl(layout, Cache::disabled(), CrawlOptions::default(), &params).await;

    match result {
        Err(CrawlError::FieldParse(e)) => assert_eq!(
            e,
            FieldParseError::NotANumber {
                field: "age".to_string(),
                value: "unknown".to_string(),
            }
        ),
        other => panic!("expected a field parse error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_page_limit_stops_crawl() {
    let mock_server = MockServer::start().await;
    mount_listing(&mock_server, 1, &[1, 2], 1).await;
    mount_listing(&mock_server, 2, &[3], 0).await;
    mount_runner(&mock_server, 1, runner_page(1, "Ann Lee", "34"), 1).await;
    mount_runner(&mock_server, 2, runner_page(2, "Bo Chen", "41"), 1).await;

    let layout = create_test_layout(&mock_server.uri(), "document");
    let params = default_params(&layout);
    let options = CrawlOptions {
        max_pages: Some(1),
        ..CrawlOptions::default()
    };
    let records = run_crawl(layout, Cache::disabled(), options, &params)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_unreachable_memcached_falls_back_to_no_cache() {
    let mock_server = MockServer::start().await;
    mount_two_runner_event(&mock_server, 1).await;

    // Reserve a port and release it so nothing is listening there
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };
    let cache = Cache::open(&racecrawl::cache::CacheBackend::Memcached { addr }).await;
    assert!(!cache.is_enabled());

    let layout = create_test_layout(&mock_server.uri(), "document");
    let params = default_params(&layout);
    let records = run_crawl(layout, cache, CrawlOptions::default(), &params)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_crawl_to_csv_end_to_end() {
    let mock_server = MockServer::start().await;
    mount_two_runner_event(&mock_server, 1).await;

    let layout = create_test_layout(&mock_server.uri(), "document");
    let params = default_params(&layout);
    let records = run_crawl(layout, Cache::disabled(), CrawlOptions::default(), &params)
        .await
        .unwrap();

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("crawl.csv");
    let written = write_csv_file(&records, &output).unwrap();
    assert_eq!(written, 2);

    let csv = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "bib,name,age,5km,half",
            "1,Ann Lee,34,0:21:00,",
            "2,Bo Chen,41,0:22:00,",
        ]
    );
}

#[tokio::test]
async fn test_cache_store_roundtrip_through_trait_object() {
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let key = cache_key("http://example.com/");
    assert_eq!(key, "a6bf1757fff057f266b697df9cf176fd");

    store.set(&key, b"<html></html>").await.unwrap();
    assert_eq!(store.get(&key).await.unwrap(), Some(b"<html></html>".to_vec()));
}

fn competitor_runner_page(bib: u32, splits: &[(&str, &str)]) -> String {
    let labels: String = splits.iter().map(|(l, _)| format!("<li>{l}</li>")).collect();
    let times: String = splits.iter().map(|(_, t)| format!("<li>{t}</li>")).collect();
    format!(
        r#"<html><body>
        <div class="detail-bib">{bib}</div>
        <div class="detail-pptname">Runner {bib}</div>
        <div class="detail-pptlocation"><ul>
            <li>San Diego, CA</li><li>Age 30</li><li>Gender F</li>
        </ul></div>
        <ul class="detail-performance-stats">
            <li><a href="/rnrresults?sort=overall">{bib}</a></li>
            <li><a href="/rnrresults?div=F3034">1</a></li>
            <li><a href="/rnrresults?sort=gender">{bib}</a></li>
        </ul>
        <ul class="marker_points">{labels}</ul>
        <ul class="marker_points_times">{times}</ul>
        <ul class="marker_timing"><li>Chip Time</li><li>Clock Time</li></ul>
        <ul class="marker_timing_times"><li>1:50:00</li><li>1:51:00</li></ul>
        </body></html>"#
    )
}

#[tokio::test]
async fn test_competitor_splits_keep_one_header() {
    let mock_server = MockServer::start().await;

    let listing = r#"<div class="rnrr_table_content">
        <a href="/rnrresults?eId=54&amp;eiId=227&amp;seId=791&amp;pId=1">One</a>
        <a href="/rnrresults?eId=54&amp;eiId=227&amp;seId=791&amp;pId=2">Two</a>
    </div>"#;
    for (page, body) in [("1", listing), ("2", "<html></html>")] {
        Mock::given(method("GET"))
            .and(path("/rnrresults"))
            .and(query_param("resultsPage", page))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let runners = [
        ("1", competitor_runner_page(1, &[("5 KM", "0:25:00")])),
        (
            "2",
            competitor_runner_page(2, &[("5 KM", "0:24:00"), ("10 KM", "0:49:00")]),
        ),
    ];
    for (id, body) in runners {
        Mock::given(method("GET"))
            .and(path("/rnrresults"))
            .and(query_param("pId", id))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let mut layout = builtin_layout("competitor").unwrap();
    layout.base_url = mock_server.uri();
    let params = default_params(&layout);
    let records = run_crawl(layout, Cache::disabled(), CrawlOptions::default(), &params)
        .await
        .unwrap();

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("crawl.csv");
    write_csv_file(&records, &output).unwrap();

    let csv = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "bib,name,location,age,gender,overall_place,division_place,division,gender_place,\
5km,10km,10mi,half,20mi,chip_time,clock_time"
    );
    assert!(lines[1].contains(",0:25:00,,,,,1:50:00,"));
    assert!(lines[2].contains(",0:24:00,0:49:00,,,,1:50:00,"));
}
