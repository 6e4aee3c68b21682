// Default loader integration tests
// Local files, data URLs and a one-shot HTTP server

use super::support::{png_bytes, serve_once, BLACK, WHITE};
use std::time::Duration;
use tempfile::TempDir;
use watermark::loader::{self, DefaultLoader};
use watermark::{
    data_url, Blob, Initializer, LocatorRequest, Resource, ResourceLoader, WatermarkError,
};

#[tokio::test]
async fn test_mixed_batch_through_default_loader() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("base.png");
    std::fs::write(&path, png_bytes(9, 7, WHITE)).unwrap();

    let resources = vec![
        Resource::from(path.as_path()),
        Resource::from(data_url::encode(&png_bytes(3, 3, BLACK), "image/png")),
        Resource::from(Blob::new("image/png", png_bytes(2, 5, BLACK))),
    ];

    let handles = loader::load(&DefaultLoader::new(), resources, &Initializer::default())
        .await
        .unwrap();

    let sizes: Vec<(u32, u32)> = handles.iter().map(|h| (h.width(), h.height())).collect();
    assert_eq!(sizes, vec![(9, 7), (3, 3), (2, 5)]);
}

#[tokio::test]
async fn test_http_fetch_applies_initializer() {
    let (base_url, server) = serve_once("200 OK", png_bytes(6, 4, BLACK)).await;

    let init = Initializer::new(|request: &mut LocatorRequest| {
        request
            .headers
            .push(("X-Watermark-Test".to_string(), "yes".to_string()));
        request.timeout = Some(Duration::from_secs(5));
    });

    let handles = loader::load(
        &DefaultLoader::new(),
        vec![Resource::from(format!("{}/mark.png", base_url))],
        &init,
    )
    .await
    .unwrap();

    assert_eq!((handles[0].width(), handles[0].height()), (6, 4));

    let seen = server.await.unwrap();
    assert!(seen.head.starts_with("GET /mark.png"));
    assert_eq!(seen.header("x-watermark-test").as_deref(), Some("yes"));
}

#[tokio::test]
async fn test_http_error_status_fails_load() {
    let (base_url, server) = serve_once("404 Not Found", Vec::new()).await;
    let url = format!("{}/missing.png", base_url);

    let err = DefaultLoader::new()
        .load_locator(LocatorRequest::new(url.clone()))
        .await
        .unwrap_err();

    match err {
        WatermarkError::Load { resource, message } => {
            assert_eq!(resource, url);
            assert!(message.contains("404"), "{}", message);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_file_url_and_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mark.png");
    std::fs::write(&path, png_bytes(4, 4, BLACK)).unwrap();

    let ok = loader::load(
        &DefaultLoader::new(),
        vec![Resource::from(format!("file://{}", path.display()))],
        &Initializer::default(),
    )
    .await
    .unwrap();
    assert_eq!(ok[0].width(), 4);

    let missing = dir.path().join("nope.png");
    let err = loader::load(
        &DefaultLoader::new(),
        vec![Resource::from(path.as_path()), Resource::from(missing.as_path())],
        &Initializer::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, WatermarkError::Load { .. }));
}

#[tokio::test]
async fn test_undecodable_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.png");
    std::fs::write(&path, b"plain text, not pixels").unwrap();

    let err = loader::load(
        &DefaultLoader::new(),
        vec![Resource::from(path.as_path())],
        &Initializer::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, WatermarkError::Decode(_)));
}
