//! End-to-end integration tests

use reqwest::StatusCode;
use std::net::SocketAddr;
use std::time::Duration;

use super::fixtures::{pattern, relay_config, spawn_origin, spawn_relay, VIDEO_ID};
use crate::config::BROWSER_USER_AGENT;

async fn get(relay: SocketAddr, route: &str, target: &str) -> reqwest::Response {
    reqwest::Client::new()
        .get(format!("http://{}{}", relay, route))
        .query(&[("url", target)])
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_expand_follows_redirect_chain() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let target = origin.url("/short/3");
    let response = get(relay, "/api/expand", &target).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["url"], origin.url(&format!("/video/{}", VIDEO_ID)));
    assert_eq!(body["original_url"], target);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_expand_without_redirects_returns_input() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let target = origin.url("/landing");
    let body: serde_json::Value = get(relay, "/api/expand", &target).await.json().await.unwrap();
    assert_eq!(body["url"], target);
    assert_eq!(body["original_url"], target);
}

#[tokio::test]
async fn test_expand_falls_back_to_get_when_head_rejected() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let body: serde_json::Value = get(relay, "/api/expand", &origin.url("/nohead"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["url"], origin.url("/landing"));
}

#[tokio::test]
async fn test_expand_unreachable_host_is_server_error() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let response = get(relay, "/api/expand", "http://127.0.0.1:1/short").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = response.json().await.unwrap();
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("127.0.0.1:1"), "{}", detail);
}

#[tokio::test]
async fn test_expand_redirect_loop_is_server_error() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let response = get(relay, "/api/expand", &origin.url("/loop")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_redirect_reports_method() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let body: serde_json::Value = get(relay, "/api/redirect", &origin.url("/short/1"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["method"], "HEAD_follow");
    assert_eq!(body["success"], true);

    let body: serde_json::Value = get(relay, "/api/redirect", &origin.url("/nohead"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["method"], "GET_follow");
    assert_eq!(body["url"], origin.url("/landing"));
}

#[tokio::test]
async fn test_analysis_extracts_id_and_queries_api() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let response = get(relay, "/api/analysis", &origin.url("/short/2")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["aweme_id"], VIDEO_ID);
}

#[tokio::test]
async fn test_analysis_keeps_head_landing_when_fallback_fails() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let body: serde_json::Value = get(relay, "/api/analysis", &origin.url("/reject/video/555"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["aweme_id"], "555");
}

#[tokio::test]
async fn test_analysis_without_video_id() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let response = get(relay, "/api/analysis", &origin.url("/nohead")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Could not extract video ID");
    assert_eq!(body["final_url"], origin.url("/landing"));
}

#[tokio::test]
async fn test_analysis_api_failure_is_bad_gateway() {
    let origin = spawn_origin().await;
    let mut config = relay_config(&origin);
    config.analysis.api_url = origin.url("/aweme-down");
    let relay = spawn_relay(config).await;

    let response = get(relay, "/api/analysis", &origin.url("/short/0")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], 503);
}

#[tokio::test]
async fn test_download_streams_exact_bytes() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let size = 1024 * 1024 + 123;
    let response = get(relay, "/api/download", &origin.url(&format!("/blob/0/{}", size))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers["content-type"], "video/mp4");
    assert_eq!(
        headers["content-disposition"],
        "attachment; filename=video.mp4"
    );
    assert_eq!(headers["access-control-allow-origin"], "*");

    let body = response.bytes().await.unwrap();
    assert_eq!(body.len(), size);
    assert!(body == pattern(0, size));
}

#[tokio::test]
async fn test_download_forwards_content_length() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let response = get(relay, "/api/download", &origin.url("/fixed/4096")).await;
    assert_eq!(response.content_length(), Some(4096));
    assert!(response.bytes().await.unwrap() == pattern(0, 4096));
}

#[tokio::test]
async fn test_download_sends_browser_identity() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let body = get(relay, "/api/download", &origin.url("/ua"))
        .await
        .text()
        .await
        .unwrap();
    assert_eq!(
        body,
        format!("{}\nhttps://www.douyin.com/", BROWSER_USER_AGENT)
    );
}

#[tokio::test]
async fn test_concurrent_downloads_do_not_mix() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let a = async {
        get(relay, "/api/download", &origin.url("/blob/1/300000"))
            .await
            .bytes()
            .await
            .unwrap()
    };
    let b = async {
        get(relay, "/api/download", &origin.url("/blob/2/200000"))
            .await
            .bytes()
            .await
            .unwrap()
    };
    let (a, b) = tokio::join!(a, b);

    assert!(a == pattern(1, 300000));
    assert!(b == pattern(2, 200000));
}

#[tokio::test]
async fn test_download_upstream_error_status_is_bad_gateway() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let response = get(relay, "/api/download", &origin.url("/missing.mp4")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "upstream returned 404 Not Found");
}

#[tokio::test]
async fn test_download_unreachable_is_bad_gateway() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let response = get(relay, "/api/download", "http://127.0.0.1:1/video.mp4").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_download_does_not_follow_redirects() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let response = get(relay, "/api/download", &origin.url("/short/0")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "upstream returned 303 See Other");
    assert_eq!(origin.hits(), 1);
}

#[tokio::test]
async fn test_paused_caller_stops_upstream_reads() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let mut response = get(relay, "/api/download", &origin.url("/counted")).await;
    assert!(response.chunk().await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(500)).await;
    let settled = origin.produced();
    tokio::time::sleep(Duration::from_millis(500)).await;
    let later = origin.produced();

    // Only the relay queue and the socket buffers sit between origin and caller.
    assert!(
        later - settled <= 2,
        "origin kept producing while the caller was paused: {} -> {}",
        settled,
        later
    );
    assert!(settled < 2048, "{} chunks read ahead of the caller", settled);
}

#[tokio::test]
async fn test_invalid_url_never_reaches_origin() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let rejected = [
        String::new(),
        "   ".to_string(),
        format!("ftp://{}/video/{}", origin.addr, VIDEO_ID),
        format!("{}/video/{}", origin.addr, VIDEO_ID),
    ];
    for route in ["/api/expand", "/api/download", "/api/redirect", "/api/analysis"] {
        let missing = reqwest::get(format!("http://{}{}", relay, route)).await.unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST, "{}", route);

        for target in &rejected {
            let response = get(relay, route, target).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{} {:?}", route, target);
        }
    }

    assert_eq!(origin.hits(), 0);
}

#[tokio::test]
async fn test_download_midstream_failure_aborts() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let response = get(relay, "/api/download", &origin.url("/broken")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.bytes().await.is_err());
}

#[tokio::test]
async fn test_download_stalled_upstream_aborts() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let response = get(relay, "/api/download", &origin.url("/stall")).await;
    let result = tokio::time::timeout(Duration::from_secs(10), response.bytes())
        .await
        .expect("stalled download was not terminated");
    assert!(result.is_err());
}

#[tokio::test]
async fn test_caller_disconnect_releases_upstream() {
    let origin = spawn_origin().await;
    let relay = spawn_relay(relay_config(&origin)).await;

    let mut response = get(relay, "/api/download", &origin.url("/endless")).await;
    let first = response.chunk().await.unwrap();
    assert!(first.is_some());
    drop(response);

    tokio::time::timeout(Duration::from_secs(10), origin.released.notified())
        .await
        .expect("upstream stream was not released after caller disconnect");
}
