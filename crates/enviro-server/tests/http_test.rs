use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use enviro_core::AggregateStore;
use enviro_server::http;
use serde_json::{Value, json};
use tempfile::tempdir;
use tower::ServiceExt; // for `oneshot`

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    (status, content_type, body)
}

#[tokio::test]
async fn test_index_page() {
    let dir = tempdir().unwrap();
    let app = http::routes(AggregateStore::local(dir.path()));

    let (status, content_type, body) = get(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("/get_data_files"));
}

#[tokio::test]
async fn test_list_data_files_sorted_json_only() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("2024_034_04_06.json"), b"{}").unwrap();
    std::fs::write(dir.path().join("2024_034_04_05.json"), b"{}").unwrap();
    std::fs::write(dir.path().join("2023_365_23_59.json"), b"{}").unwrap();
    std::fs::write(dir.path().join("readme.txt"), b"hello").unwrap();
    std::fs::write(dir.path().join(".2024_034_04_07.json.tmp"), b"{").unwrap();

    let app = http::routes(AggregateStore::local(dir.path()));
    let (status, _, body) = get(&app, "/get_data_files").await;

    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        value,
        json!({
            "files": ["2023_365_23_59.json", "2024_034_04_05.json", "2024_034_04_06.json"]
        })
    );
}

#[tokio::test]
async fn test_list_empty_directory() {
    let dir = tempdir().unwrap();
    let app = http::routes(AggregateStore::local(dir.path()));

    let (status, _, body) = get(&app, "/get_data_files").await;

    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value, json!({ "files": [] }));
}

#[tokio::test]
async fn test_list_missing_directory_is_server_error() {
    let dir = tempdir().unwrap();
    let app = http::routes(AggregateStore::local(dir.path().join("gone")));

    let (status, _, _) = get(&app, "/get_data_files").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_serve_file_bytes() {
    let dir = tempdir().unwrap();
    let contents = b"{\n    \"time\": \"Sat Feb  3 04:04:10 2024\",\n    \"temp\": 21.0\n}";
    std::fs::write(dir.path().join("2024_034_04_05.json"), contents).unwrap();

    let app = http::routes(AggregateStore::local(dir.path()));
    let (status, content_type, body) = get(&app, "/enviro-data/2024_034_04_05.json").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body, contents.to_vec());
}

#[tokio::test]
async fn test_missing_file_is_404() {
    let dir = tempdir().unwrap();
    let app = http::routes(AggregateStore::local(dir.path()));

    let (status, _, _) = get(&app, "/enviro-data/missing.json").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_path_traversal_is_404() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir(&data).unwrap();
    std::fs::write(dir.path().join("secret.json"), b"{}").unwrap();

    let app = http::routes(AggregateStore::local(&data));

    let (status, _, _) = get(&app, "/enviro-data/..%2Fsecret.json").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = get(&app, "/enviro-data/..").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
