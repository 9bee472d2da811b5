//! `/health`, `/metrics` and static file serving.

use reqwest::header;
use serde_json::Value;

mod common;

use common::{client, config_for, start_fixed_upstream, start_proxy, unused_addr, MockResponse};

#[tokio::test]
async fn health_reports_prefix_and_target() {
    let target = format!("http://{}", unused_addr().await);
    let proxy = start_proxy(config_for(&target)).await;

    let res = client().get(proxy.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["proxyPath"], "/pg");
    assert_eq!(body["target"], target.as_str());
    assert!(body["uptime"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn metrics_count_requests_and_errors() {
    let upstream = start_fixed_upstream(MockResponse::new(404, "text/plain", "nope")).await;
    let proxy = start_proxy(config_for(&upstream.origin())).await;

    client().get(proxy.url("/health")).send().await.unwrap();
    client().get(proxy.url("/pg/missing")).send().await.unwrap();
    client().get(proxy.url("/pg/missing")).send().await.unwrap();

    let body: Value = client()
        .get(proxy.url("/metrics"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["requestCount"], 3);
    assert_eq!(body["errorCount"], 2);
    assert_eq!(body["proxyPath"], "/pg");
    assert_eq!(body["target"], upstream.origin().as_str());
    assert!(body["uptime"].as_f64().is_some());
    assert!(body.get("memoryUsage").is_some());
}

#[tokio::test]
async fn custom_prefix_is_honoured() {
    let upstream = start_fixed_upstream(MockResponse::new(200, "text/plain", "ok")).await;
    let mut config = config_for(&upstream.origin());
    config.proxy.path = "/gateway".into();
    let proxy = start_proxy(config).await;

    let health: Value = client()
        .get(proxy.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["proxyPath"], "/gateway");

    client().get(proxy.url("/gateway/a")).send().await.unwrap();
    client().get(proxy.url("/pg/a")).send().await.unwrap();

    let seen = upstream.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].target, "/a");
}

#[tokio::test]
async fn non_prefixed_paths_are_served_from_disk() {
    let root = std::env::temp_dir().join(format!("orp-static-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(root.join("assets")).unwrap();
    std::fs::write(root.join("index.html"), "<h1>demo</h1>").unwrap();
    std::fs::write(root.join("assets/site.css"), "body{}").unwrap();

    let upstream = start_fixed_upstream(MockResponse::new(200, "text/plain", "upstream")).await;
    let mut config = config_for(&upstream.origin());
    config.static_files.root = root.clone();
    let proxy = start_proxy(config).await;

    let res = client().get(proxy.url("/assets/site.css")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/css"));
    assert_eq!(res.text().await.unwrap(), "body{}");

    let index = client().get(proxy.url("/")).send().await.unwrap();
    assert_eq!(index.text().await.unwrap(), "<h1>demo</h1>");

    // Looks like the prefix but is not on a segment boundary.
    let res = client().get(proxy.url("/pgx/file.txt")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    let missing = client().get(proxy.url("/nope.txt")).send().await.unwrap();
    assert_eq!(missing.status(), 404);
    assert!(upstream.requests().is_empty());

    let _ = std::fs::remove_dir_all(&root);
}
