//! End-to-end tests against mocked catalogue, cover, and metadata services.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use betterread::limiter::RateLimiter;
use betterread::models::{
    AvailabilityStatus, Book, CatalogueConfig, CoversConfig, LimiterConfig,
};
use betterread::pipeline::{Aggregator, Snapshot};
use betterread::services::{CatalogueClient, CoverResolver};

/// Limiter with pacing disabled so tests run without sleeping.
fn test_limiter() -> RateLimiter {
    RateLimiter::new(&LimiterConfig {
        min_interval_ms: 0,
        reservoir: 1000,
        refill_interval_secs: 60,
    })
}

fn cover_resolver(server: &MockServer) -> CoverResolver {
    CoverResolver::new(
        Arc::new(CoversConfig {
            image_host: server.uri(),
            metadata_api: server.uri(),
        }),
        reqwest::Client::new(),
    )
}

fn catalogue_client(server: &MockServer) -> CatalogueClient {
    CatalogueClient::new(
        Arc::new(CatalogueConfig {
            base_url: server.uri(),
            app_code: "DEV-Test".to_string(),
            api_key: "test-key".to_string(),
            search_limit: 100,
        }),
        reqwest::Client::new(),
        test_limiter(),
    )
}

fn book(isbn: &str, title: &str) -> Book {
    Book {
        isbn: isbn.to_string(),
        title: title.to_string(),
        author: "Test Author".to_string(),
        year_of_publication: None,
        publisher: None,
    }
}

#[tokio::test]
async fn cover_probe_hit_uses_image_host_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/b/isbn/0001-L.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"\xff\xd8".to_vec(), "image/jpeg"))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = cover_resolver(&server);
    let url = resolver.resolve("0001").await;
    assert_eq!(url, Some(format!("{}/b/isbn/0001-L.jpg", server.uri())));
}

#[tokio::test]
async fn cover_probe_non_image_body_falls_back() {
    let server = MockServer::start().await;
    // A 200 whose body is an HTML error page must not count as a hit.
    Mock::given(method("GET"))
        .and(path("/b/isbn/0002-L.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"<html>".to_vec(), "text/html"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes"))
        .and(query_param("q", "isbn:0002"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"volumeInfo": {"imageLinks": {"thumbnail": "http://meta.example/t.jpg"}}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = cover_resolver(&server);
    let url = resolver.resolve("0002").await;
    assert_eq!(url.as_deref(), Some("http://meta.example/t.jpg"));
}

#[tokio::test]
async fn cover_resolver_issues_at_most_two_calls_and_returns_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/b/isbn/0003-L.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = cover_resolver(&server);
    assert_eq!(resolver.resolve("0003").await, None);
    // The expect(1) bounds above verify no extra outbound calls on drop.
}

#[tokio::test]
async fn cached_cover_issues_no_second_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/b/isbn/0004-L.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"x".to_vec(), "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = cover_resolver(&server);
    let first = resolver.resolve("0004").await;
    let second = resolver.resolve("0004").await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn search_title_sends_credentials_and_filters_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/SearchTitles"))
        .and(query_param("Keywords", "the hobbit deluxe edition"))
        .and(query_param("Availability", "true"))
        .and(header("X-App-Code", "DEV-Test"))
        .and(header("X-Api-Key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "titles": [
                {"title": "Unrelated Title", "records": [{"brn": 1}]},
                {"title": "The Hobbit", "records": [{"brn": 99059237}, {"brn": 5}]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let catalogue = catalogue_client(&server);
    let record = catalogue
        .search_title("the hobbit deluxe edition")
        .await
        .unwrap();
    assert_eq!(record.title, "The Hobbit");
    assert_eq!(record.brn, "99059237");
}

#[tokio::test]
async fn search_title_error_is_empty_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/SearchTitles"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let catalogue = catalogue_client(&server);
    assert!(catalogue.search_title("anything").await.is_none());
    // Second lookup must hit the cached "not found" sentinel.
    assert!(catalogue.search_title("anything").await.is_none());
}

#[tokio::test]
async fn availability_classification_prefers_in_transit_over_on_loan() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/GetAvailabilityInfo"))
        .and(query_param("BRN", "777"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"status": {"name": "On Loan"}, "location": {"code": "A", "name": "Branch A"}},
                {"status": {"name": "In-Transit"}, "location": {"code": "B", "name": "Branch B"}}
            ]
        })))
        .mount(&server)
        .await;

    let catalogue = catalogue_client(&server);
    let records = catalogue.get_availability("777").await;
    let status = AvailabilityStatus::classify(&records);
    assert_eq!(status, AvailabilityStatus::InTransit);
    assert_eq!(status.to_string(), "In Transit");
}

#[tokio::test]
async fn aggregate_fallback_cover_and_unmatched_title() {
    let server = MockServer::start().await;

    // Primary cover probe fails.
    Mock::given(method("GET"))
        .and(path("/b/isbn/0001-L.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    // Fallback metadata yields a thumbnail.
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes"))
        .and(query_param("q", "isbn:0001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"volumeInfo": {"imageLinks": {"thumbnail": "http://meta.example/0001.jpg"}}}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    // Title search yields no substring match.
    Mock::given(method("GET"))
        .and(path("/SearchTitles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "titles": [{"title": "Some Other Book Entirely", "records": [{"brn": 1}]}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    // No availability call may happen without a matched record.
    Mock::given(method("GET"))
        .and(path("/GetAvailabilityInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(0)
        .mount(&server)
        .await;

    let covers = Arc::new(cover_resolver(&server));
    let catalogue = Arc::new(catalogue_client(&server));
    let aggregator = Aggregator::new(covers, catalogue);

    let snapshots: Vec<Snapshot> = aggregator
        .aggregate(vec![book("0001", "An Obscure Title")])
        .collect()
        .await;

    // One progress snapshot plus the terminal one.
    assert_eq!(snapshots.len(), 2);
    let progress = &snapshots[0];
    assert!(!progress.complete);
    assert_eq!(
        progress.covers.get("0001").unwrap().as_deref(),
        Some("http://meta.example/0001.jpg")
    );
    assert_eq!(
        progress.availability.get("0001"),
        Some(&AvailabilityStatus::NotFound)
    );
    assert_eq!(
        progress
            .availability
            .get("0001")
            .map(|s| s.to_string())
            .unwrap(),
        "Not Found in NLB"
    );
    assert!(progress.detail.get("0001").unwrap().is_empty());

    let terminal = &snapshots[1];
    assert!(terminal.complete);
    assert_eq!(terminal.covers, progress.covers);
}

#[tokio::test]
async fn aggregate_full_path_classifies_from_availability() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/b/isbn/5555-L.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"x".to_vec(), "image/jpeg"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/SearchTitles"))
        .and(query_param("Keywords", "dune"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "titles": [{"title": "Dune", "records": [{"brn": 424242}]}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/GetAvailabilityInfo"))
        .and(query_param("BRN", "424242"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"status": {"name": "On Shelf"},
                 "location": {"code": "AMKPL", "name": "Ang Mo Kio Public Library"}}
            ]
        })))
        .mount(&server)
        .await;

    let covers = Arc::new(cover_resolver(&server));
    let catalogue = Arc::new(catalogue_client(&server));
    let aggregator = Aggregator::new(covers, catalogue);

    let snapshots: Vec<Snapshot> = aggregator
        .aggregate(vec![book("5555", "Dune")])
        .collect()
        .await;

    let terminal = snapshots.last().unwrap();
    assert!(terminal.complete);
    assert_eq!(
        terminal.availability.get("5555"),
        Some(&AvailabilityStatus::Available)
    );
    let detail = terminal.detail.get("5555").unwrap();
    assert_eq!(detail.len(), 1);
    assert_eq!(detail[0].location.code, "AMKPL");
}

#[tokio::test]
async fn aggregate_second_book_reuses_cached_lookups() {
    let server = MockServer::start().await;

    // The same book appears twice; every upstream may be hit only once.
    Mock::given(method("GET"))
        .and(path("/b/isbn/7777-L.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"x".to_vec(), "image/jpeg"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/SearchTitles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "titles": [{"title": "Emma", "records": [{"brn": 9}]}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/GetAvailabilityInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"status": {"name": "On Loan"}, "location": {"code": "C", "name": "Branch C"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let covers = Arc::new(cover_resolver(&server));
    let catalogue = Arc::new(catalogue_client(&server));
    let aggregator = Aggregator::new(covers, catalogue);

    let snapshots: Vec<Snapshot> = aggregator
        .aggregate(vec![book("7777", "Emma"), book("7777", "Emma")])
        .collect()
        .await;

    let terminal = snapshots.last().unwrap();
    assert_eq!(
        terminal.availability.get("7777"),
        Some(&AvailabilityStatus::OnLoan)
    );
}
