// tests/metrics_http.rs
//
// Full startup path: config from $QR_CONFIG_PATH, file-backed store, snapshot,
// router built by `app()`. Kept in its own binary so the process-wide gauge is
// not touched by other router tests.

use std::{env, fs};

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use tower::ServiceExt as _; // for `oneshot`

use qr_phishing_detector::{app, InsertOutcome, SqliteStore, VerdictStore};

#[serial_test::serial]
#[tokio::test]
async fn startup_snapshot_size_is_exported() {
    let tmp = tempfile::tempdir().unwrap();
    let db = tmp.path().join("verdicts.db");

    let seed = SqliteStore::new(&db);
    assert_eq!(seed.insert("http://bad-one.tk", false), InsertOutcome::Inserted);
    assert_eq!(seed.insert("http://bad-two.xyz", false), InsertOutcome::Inserted);
    assert_eq!(seed.insert("https://example.com", true), InsertOutcome::Inserted);
    drop(seed);

    let cfg = tmp.path().join("app.toml");
    fs::write(&cfg, format!("[database]\npath = {:?}\n", db.display().to_string())).unwrap();
    env::set_var("QR_CONFIG_PATH", cfg.display().to_string());
    env::remove_var("QR_DATABASE_PATH");

    let router = app().await.expect("app");
    env::remove_var("QR_CONFIG_PATH");

    let req = Request::builder()
        .method("GET")
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).expect("utf8");
    assert!(
        text.contains("known_phishing_cache_size 2"),
        "metrics body: {text}"
    );
}
