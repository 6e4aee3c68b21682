// Pipeline integration tests
// Full load -> draw -> encode chains against stub loaders and explicit pools

use super::support::{png_bytes, solid, StubLoader, BLACK, WHITE};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use watermark::style::image::{lower_right, upper_left};
use watermark::{
    data_url, encode, ImageHandle, Options, OutputFormat, Pipeline, Resource, Surface,
    SurfacePool, WatermarkError,
};

fn noop(_: &mut Surface, _: &[&Surface]) {}

fn stub_pipeline(loader: StubLoader, resources: &[&str]) -> (Pipeline<Vec<ImageHandle>>, Arc<StubLoader>, SurfacePool) {
    let loader = Arc::new(loader);
    let pool = SurfacePool::new();
    let options = Options::default()
        .with_loader(loader.clone())
        .with_pool(pool.clone());
    let pipeline = watermark::watermark(resources.iter().copied(), options);
    (pipeline, loader, pool)
}

#[tokio::test]
async fn test_lower_right_mark_over_file_base() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("a.png");
    std::fs::write(&base, png_bytes(100, 100, WHITE)).unwrap();

    let pool = SurfacePool::new();
    let url = watermark::watermark([base.as_path()], Options::default().with_pool(pool.clone()))
        .load([solid(20, 20, BLACK)], None)
        .data_url(lower_right(0.5))
        .await
        .unwrap();

    assert!(url.starts_with("data:image/png;base64,"));

    let out = ImageHandle::from_data_url(&url).unwrap();
    let image = out.image();
    assert_eq!((out.width(), out.height()), (100, 100));

    for (x, y) in [(70, 70), (89, 89), (80, 75)] {
        let pixel = image.get_pixel(x, y);
        assert!((126..=128).contains(&pixel[0]), "({x},{y}) = {pixel:?}");
        assert_eq!(pixel[3], 255);
    }
    for (x, y) in [(69, 69), (90, 90), (69, 80), (80, 90), (0, 0)] {
        assert_eq!(image.get_pixel(x, y), &WHITE, "({x},{y})");
    }
}

#[tokio::test]
async fn test_order_preserved_under_out_of_order_completion() {
    let loader = StubLoader::new()
        .with_delay("slow", solid(30, 30, WHITE), Duration::from_millis(60))
        .with_delay("medium", solid(20, 20, WHITE), Duration::from_millis(30))
        .with("fast", solid(10, 10, WHITE));
    let (pipeline, loader, _) = stub_pipeline(loader, &["slow", "medium", "fast"]);

    let handles = pipeline.await.unwrap();

    let widths: Vec<u32> = handles.iter().map(ImageHandle::width).collect();
    assert_eq!(widths, vec![30, 20, 10]);
    assert_eq!(loader.completion_order(), vec!["fast", "medium", "slow"]);
}

#[tokio::test]
async fn test_repeated_terminal_calls_reload() {
    let loader = StubLoader::new()
        .with("base", solid(40, 40, WHITE))
        .with("mark", solid(5, 5, BLACK));
    let (pipeline, loader, _) = stub_pipeline(loader, &["base"]);
    let chain = pipeline.load(["mark"], None);

    let first = chain.data_url(lower_right(1.0)).await.unwrap();
    let second = chain.data_url(lower_right(1.0)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(loader.loads(), 4);
}

#[tokio::test]
async fn test_memoized_chain_loads_once() {
    let loader = StubLoader::new()
        .with("base", solid(40, 40, WHITE))
        .with("mark", solid(5, 5, BLACK));
    let (pipeline, loader, _) = stub_pipeline(loader, &["base"]);
    let url = pipeline
        .load(["mark"], None)
        .data_url(lower_right(1.0))
        .memoize();

    let a = (&url).await.unwrap();
    let b = (&url).await.unwrap();

    assert_eq!(a, b);
    assert_eq!(loader.loads(), 2);
}

#[tokio::test]
async fn test_noop_drawer_matches_plain_encoding() {
    let loader = StubLoader::new().with("base", solid(12, 9, BLACK));
    let (pipeline, _, _) = stub_pipeline(loader, &["base"]);

    let drawn = pipeline.data_url(noop).await.unwrap();

    let mut surface = Surface::new();
    surface.rasterize(&solid(12, 9, BLACK));
    let plain = encode::to_data_url(&surface, &Options::default()).unwrap();

    assert_eq!(drawn, plain);
}

#[tokio::test]
async fn test_encode_failure_releases_every_surface() {
    let loader = StubLoader::new()
        .with("empty", solid(0, 0, WHITE))
        .with("mark", solid(5, 5, BLACK));
    let (pipeline, _, pool) = stub_pipeline(loader, &["empty", "mark"]);

    let err = pipeline.data_url(upper_left(1.0)).await.unwrap_err();

    assert!(matches!(err, WatermarkError::Encode { .. }));
    let stats = pool.stats();
    assert_eq!(stats.checked_out, 0);
    assert_eq!(stats.free, 2);
}

#[tokio::test]
async fn test_surfaces_are_recycled_between_runs() {
    let loader = StubLoader::new()
        .with("base", solid(40, 40, WHITE))
        .with("mark", solid(5, 5, BLACK));
    let (pipeline, _, pool) = stub_pipeline(loader, &["base", "mark", "mark"]);
    let url = pipeline.data_url(lower_right(1.0));

    url.run().await.unwrap();
    let stats = pool.stats();
    assert_eq!(stats.created, 3);
    assert_eq!(stats.free, 2);

    url.run().await.unwrap();
    let stats = pool.stats();
    assert_eq!(stats.reused, 2);
    assert_eq!(stats.created, 4);
    assert_eq!(stats.checked_out, 0);
}

#[tokio::test]
async fn test_jpeg_output() {
    let loader = StubLoader::new().with("base", solid(16, 16, WHITE));
    let loader = Arc::new(loader);
    let options = Options::default()
        .with_loader(loader)
        .with_pool(SurfacePool::new())
        .with_type(OutputFormat::Jpeg)
        .with_encoder_options(0.5);

    let blob = watermark::watermark(["base"], options)
        .blob(noop)
        .await
        .unwrap();

    assert_eq!(blob.media_type(), "image/jpeg");
    assert_eq!(&blob.bytes()[..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn test_image_result_feeds_another_pipeline() {
    let loader = StubLoader::new()
        .with("base", solid(30, 30, WHITE))
        .with("mark", solid(4, 4, BLACK));
    let (pipeline, loader, pool) = stub_pipeline(loader, &["base"]);

    let first = pipeline
        .load(["mark"], None)
        .image(upper_left(1.0))
        .await
        .unwrap();
    assert_eq!(first.image().get_pixel(10, 10), &BLACK);

    let options = Options::default()
        .with_loader(loader)
        .with_pool(pool);
    let second = watermark::watermark([Resource::from(first)], options)
        .load(["mark"], None)
        .data_url(lower_right(1.0))
        .await
        .unwrap();

    let out = ImageHandle::from_data_url(&second).unwrap();
    assert_eq!(out.image().get_pixel(10, 10), &BLACK);
    assert_eq!(out.image().get_pixel(16, 16), &BLACK);
}

#[tokio::test]
async fn test_blob_round_trips_through_resource() {
    let loader = StubLoader::new().with("base", solid(8, 8, BLACK));
    let (pipeline, loader, pool) = stub_pipeline(loader, &["base"]);

    let blob = pipeline.blob(noop).await.unwrap();
    let url = data_url::encode(blob.bytes(), blob.media_type());
    assert_eq!(data_url::to_blob(&url), Some(blob.clone()));

    let options = Options::default().with_loader(loader).with_pool(pool);
    let handles = watermark::watermark([blob], options).await.unwrap();
    assert_eq!((handles[0].width(), handles[0].height()), (8, 8));
}

#[tokio::test]
async fn test_load_error_surfaces_at_await() {
    let loader = StubLoader::new().with("base", solid(8, 8, BLACK));
    let (pipeline, _, pool) = stub_pipeline(loader, &["base", "missing"]);

    let err = pipeline.data_url(noop).await.unwrap_err();

    assert_eq!(
        err,
        WatermarkError::load("missing", "no such stub")
    );
    assert_eq!(pool.stats().created, 0);
}
