//! End-to-end tests with mocked external dependencies.
//!
//! These tests run the full router in-process with the mock download engine,
//! a mock torrent source and a mock metadata lookup.

mod common;

use axum::http::StatusCode;
use httpmock::prelude::*;
use serde_json::json;
use torrentcast_core::descriptor::parse_descriptor;
use torrentcast_core::testing::MockDownloadEngine;
use torrentcast_core::{Language, StoreError};

use common::{fixtures, play_path, TestConfig, TestFixture, PUBLIC_URL, REQUESTER};

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_lists_requesters_without_preferences() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["requesters"], json!([REQUESTER]));
    assert_eq!(response.body["server"]["public_url"], PUBLIC_URL);
    assert!(response.body.get("preferences").is_none());
}

#[tokio::test]
async fn test_source_issues() {
    let fixture = TestFixture::new().await;
    assert_eq!(fixture.get("/api/v1/sources/issues").await.body, json!([]));

    fixture
        .source
        .set_config_issue(Some("Failed to log in".to_string()))
        .await;
    let response = fixture.get("/api/v1/sources/issues").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body[0]["sourceId"], "ncore");
    assert_eq!(response.body[0]["message"], "Failed to log in");
}

// =============================================================================
// Stream listing
// =============================================================================

#[tokio::test]
async fn test_streams_unknown_requester_is_unauthorized() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .get("/api/v1/stranger/stream/movie/tt0111161.json")
        .await;

    assert_status!(response, StatusCode::UNAUTHORIZED);
    assert_eq!(fixture.source.direct_query_count().await, 0);
}

#[tokio::test]
async fn test_streams_invalid_id_is_bad_request() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/tv/stream/movie/nm123.json").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string());

    let response = fixture.get("/api/v1/tv/stream/series/tt1.json").await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    let response = fixture.get("/api/v1/tv/stream/channel/tt1.json").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_streams_are_ranked_by_preference() {
    let fixture = TestFixture::new().await;
    fixture
        .source
        .set_direct_results(vec![
            fixtures::candidate("en1080", Language::En, "Movie.1080p.mkv"),
            fixtures::candidate("hu720", Language::Hu, "Movie.720p.mkv"),
            fixtures::candidate("hu1080", Language::Hu, "Movie.1080p.mkv"),
        ])
        .await;

    let response = fixture.get("/api/v1/tv/stream/movie/tt0111161.json").await;

    assert_status!(response, StatusCode::OK);
    let streams = response.body["streams"].as_array().unwrap();
    assert_eq!(streams.len(), 3);

    assert_eq!(
        streams[0]["url"],
        format!("{}/api/v1/tv/play/ncore/hu1080/hu1080/0", PUBLIC_URL)
    );
    assert_eq!(
        streams[0]["title"],
        "⭐️ Recommended\n🇭🇺 | HD (1080P) | 1000 B\nMovie.1080p"
    );
    assert_eq!(streams[0]["bingeGroupKey"], "hu1080");

    assert_eq!(streams[1]["bingeGroupKey"], "hu720");
    assert_eq!(streams[1]["title"], "🇭🇺 | HD (720P) | 1000 B\nMovie.720p");
    assert_eq!(streams[2]["bingeGroupKey"], "en1080");
    assert!(streams[2]["title"].as_str().unwrap().starts_with("🇬🇧"));
}

#[tokio::test]
async fn test_series_streams_point_at_the_episode_file() {
    let fixture = TestFixture::new().await;
    fixture
        .source
        .set_direct_results(vec![
            fixtures::candidate_with_files(
                "season1",
                &[
                    ("Show.S01/Show.S01E01.1080p.mkv", 300),
                    ("Show.S01/Show.S01E02.1080p.mkv", 200),
                ],
            ),
            fixtures::candidate_with_files("other", &[("Show.S01E05.mkv", 100)]),
        ])
        .await;

    let response = fixture.get("/api/v1/tv/stream/series/tt0903747:1:2.json").await;

    assert_status!(response, StatusCode::OK);
    let streams = response.body["streams"].as_array().unwrap();
    assert_eq!(streams.len(), 1);
    assert!(streams[0]["url"].as_str().unwrap().ends_with("/season1/season1/1"));
}

#[tokio::test]
async fn test_streams_empty_when_nothing_found() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/tv/stream/movie/tt404.json").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["streams"], json!([]));
}

#[tokio::test]
async fn test_speculated_streams_are_not_recommended() {
    let fixture = TestFixture::new().await;
    fixture.metadata.set_title("tt7", "Obscure Film").await;
    fixture
        .source
        .set_title_results(vec![fixtures::candidate(
            "guess",
            Language::Hu,
            "Obscure.Film.1080p.mkv",
        )])
        .await;

    let response = fixture.get("/api/v1/tv/stream/movie/tt7.json").await;

    let streams = response.body["streams"].as_array().unwrap();
    assert_eq!(streams.len(), 1);
    assert!(!streams[0]["title"].as_str().unwrap().contains("Recommended"));
}

// =============================================================================
// Playback
// =============================================================================

#[tokio::test]
async fn test_head_reports_size_and_type() {
    let fixture = TestFixture::new().await;
    let torrent = fixture.add_torrent("Movie", &[("Movie.1080p.mkv", 5000)]).await;

    let response = fixture.head(&play_path("1", &torrent.info_hash, 0)).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.header("content-length"), Some("5000"));
    assert_eq!(response.header("content-type"), Some("video/x-matroska"));
    assert!(response.bytes.is_empty());
    assert!(fixture.engine.opened_files(&torrent.info_hash).is_empty());
}

#[tokio::test]
async fn test_get_without_range_is_not_satisfiable() {
    let fixture = TestFixture::new().await;
    let torrent = fixture.add_torrent("Movie", &[("Movie.mp4", 5000)]).await;

    let response = fixture.get(&play_path("1", &torrent.info_hash, 0)).await;

    assert_status!(response, StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(response.header("content-range"), Some("bytes */5000"));
}

#[tokio::test]
async fn test_get_range_streams_partial_content() {
    let fixture = TestFixture::new().await;
    let torrent = fixture
        .add_torrent("Movie", &[("Movie.mp4", 5000), ("Movie.srt", 10)])
        .await;

    let response = fixture
        .get_with_headers(
            &play_path("1", &torrent.info_hash, 0),
            &[("Range", "bytes=100-200")],
        )
        .await;

    assert_status!(response, StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.header("content-range"), Some("bytes 100-199/5000"));
    assert_eq!(response.header("content-length"), Some("100"));
    assert_eq!(response.header("accept-ranges"), Some("bytes"));
    assert_eq!(response.header("content-type"), Some("video/mp4"));
    assert_eq!(
        response.bytes,
        MockDownloadEngine::file_bytes(5000)[100..200].to_vec()
    );
    assert_eq!(fixture.engine.opened_files(&torrent.info_hash), vec![0]);
}

#[tokio::test]
async fn test_open_ended_range_is_capped() {
    let fixture = TestFixture::with_config(TestConfig::with_max_chunk_size(1024)).await;
    let torrent = fixture.add_torrent("Movie", &[("Movie.mkv", 5000)]).await;

    let response = fixture
        .get_with_headers(&play_path("1", &torrent.info_hash, 0), &[("Range", "bytes=0-")])
        .await;

    assert_status!(response, StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.header("content-range"), Some("bytes 0-1023/5000"));
    assert_eq!(response.bytes.len(), 1024);
}

#[tokio::test]
async fn test_suffix_range_serves_file_tail() {
    let fixture = TestFixture::new().await;
    let torrent = fixture.add_torrent("Movie", &[("Movie.mkv", 5000)]).await;

    let response = fixture
        .get_with_headers(&play_path("1", &torrent.info_hash, 0), &[("Range", "bytes=-500")])
        .await;

    assert_status!(response, StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.header("content-range"), Some("bytes 4500-4999/5000"));
    assert_eq!(
        response.bytes,
        MockDownloadEngine::file_bytes(5000)[4500..].to_vec()
    );
}

#[tokio::test]
async fn test_range_past_end_is_not_satisfiable() {
    let fixture = TestFixture::new().await;
    let torrent = fixture.add_torrent("Movie", &[("Movie.mkv", 5000)]).await;

    let response = fixture
        .get_with_headers(
            &play_path("1", &torrent.info_hash, 0),
            &[("Range", "bytes=5000-")],
        )
        .await;

    assert_status!(response, StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(response.header("content-range"), Some("bytes */5000"));
}

#[tokio::test]
async fn test_play_unknown_file_index_is_not_found() {
    let fixture = TestFixture::new().await;
    let torrent = fixture.add_torrent("Movie", &[("Movie.mkv", 5000)]).await;

    let response = fixture.head(&play_path("1", &torrent.info_hash, 3)).await;

    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_play_unknown_requester_is_unauthorized() {
    let fixture = TestFixture::new().await;
    let torrent = fixture.add_torrent("Movie", &[("Movie.mkv", 5000)]).await;

    let response = fixture
        .get_with_headers(
            &format!("/api/v1/stranger/play/ncore/1/{}/0", torrent.info_hash),
            &[("Range", "bytes=0-")],
        )
        .await;

    assert_status!(response, StatusCode::UNAUTHORIZED);
    assert!(fixture.engine.opened_files(&torrent.info_hash).is_empty());
}

#[tokio::test]
async fn test_play_unresolvable_source_item_is_not_found() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .get_with_headers(&play_path("missing", "deadbeef", 0), &[("Range", "bytes=0-")])
        .await;

    assert_status!(response, StatusCode::NOT_FOUND);
    assert_eq!(fixture.engine.add_count(), 0);
}

#[tokio::test]
async fn test_play_prepares_torrent_once_for_concurrent_requests() {
    let fixture = TestFixture::new().await;
    let server = MockServer::start_async().await;

    let descriptor = fixtures::multi_file_descriptor("Fresh", &[("Fresh.1080p.mkv", 4096)]);
    let hash = parse_descriptor(&descriptor).unwrap().info_hash;
    let download = server
        .mock_async(|when, then| {
            when.method(GET).path("/dl/42.torrent");
            then.status(200)
                .header("content-type", "application/x-bittorrent")
                .body(descriptor.clone())
                .delay(std::time::Duration::from_millis(50));
        })
        .await;
    fixture
        .source
        .set_download_url("42", &server.url("/dl/42.torrent"))
        .await;

    let path = play_path("42", &hash, 0);
    let (first, second) = tokio::join!(
        fixture.get_with_headers(&path, &[("Range", "bytes=0-99")]),
        fixture.get_with_headers(&path, &[("Range", "bytes=100-")]),
    );

    assert_status!(first, StatusCode::PARTIAL_CONTENT);
    assert_status!(second, StatusCode::PARTIAL_CONTENT);
    assert_eq!(first.header("content-range"), Some("bytes 0-98/4096"));
    assert_eq!(second.header("content-range"), Some("bytes 100-4095/4096"));

    download.assert_async().await;
    assert_eq!(fixture.engine.add_count(), 1);
    assert!(fixture.store.contains(&hash).await);
}

// =============================================================================
// Store management
// =============================================================================

#[tokio::test]
async fn test_torrent_stats_sorted_by_name() {
    let fixture = TestFixture::new().await;
    let zulu = fixture.add_torrent("Zulu", &[("Zulu.mkv", 1048576)]).await;
    let alpha = fixture
        .add_torrent("Alpha", &[("Alpha.mkv", 1048576), ("Alpha.nfo", 200000)])
        .await;
    fixture.engine.set_downloaded(&alpha.info_hash, 0, 524288);

    let response = fixture.get("/api/v1/torrents").await;

    assert_status!(response, StatusCode::OK);
    let stats = response.body.as_array().unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0]["name"], "Alpha");
    assert_eq!(stats[0]["hash"], alpha.info_hash.as_str());
    assert_eq!(stats[0]["size"], "1.19 MiB");
    assert_eq!(stats[0]["downloaded"], "512 KiB");
    assert_eq!(stats[0]["progress"], "41.99%");
    assert_eq!(stats[1]["name"], "Zulu");
    assert_eq!(stats[1]["hash"], zulu.info_hash.as_str());
    assert_eq!(stats[1]["progress"], "0.00%");
}

#[tokio::test]
async fn test_delete_torrent() {
    let fixture = TestFixture::new().await;
    let torrent = fixture.add_torrent("Movie", &[("Movie.mkv", 5000)]).await;

    let response = fixture
        .delete(&format!("/api/v1/torrents/{}", torrent.info_hash))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body, json!({"success": true}));
    assert!(!fixture.store.contains(&torrent.info_hash).await);
    assert!(!fixture.engine.has_torrent(&torrent.info_hash));

    // Already gone
    let response = fixture
        .delete(&format!("/api/v1/torrents/{}", torrent.info_hash))
        .await;
    assert_eq!(response.body["success"], true);
}

#[tokio::test]
async fn test_delete_torrent_with_uppercase_hash() {
    let fixture = TestFixture::new().await;
    let torrent = fixture.add_torrent("Movie", &[("Movie.mkv", 5000)]).await;

    let response = fixture
        .delete(&format!(
            "/api/v1/torrents/{}",
            torrent.info_hash.to_ascii_uppercase()
        ))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body, json!({"success": true}));
    assert!(!fixture.store.contains(&torrent.info_hash).await);
    assert!(!fixture.engine.has_torrent(&torrent.info_hash));
    assert!(!torrent.file_path.exists());
}

#[tokio::test]
async fn test_delete_torrent_reports_engine_failure() {
    let fixture = TestFixture::new().await;
    let torrent = fixture.add_torrent("Movie", &[("Movie.mkv", 5000)]).await;
    fixture
        .engine
        .set_next_error(StoreError::Engine("session closed".to_string()));

    let response = fixture
        .delete(&format!("/api/v1/torrents/{}", torrent.info_hash))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["success"], false);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("session closed"));
    assert!(fixture.store.contains(&torrent.info_hash).await);
}
