// Shared fixtures for integration tests
// Stub loaders, PNG builders and a one-shot HTTP server

use async_trait::async_trait;
use image::{ImageFormat, Rgba, RgbaImage};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use watermark::{ImageHandle, LocatorRequest, ResourceLoader, Result, WatermarkError};

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

pub fn solid(width: u32, height: u32, pixel: Rgba<u8>) -> ImageHandle {
    ImageHandle::new(RgbaImage::from_pixel(width, height, pixel))
}

pub fn png_bytes(width: u32, height: u32, pixel: Rgba<u8>) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, pixel);
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// Serves registered images by locator, optionally after a delay, and counts loads.
#[derive(Default)]
pub struct StubLoader {
    images: HashMap<String, (ImageHandle, Duration)>,
    loads: AtomicUsize,
    completed: Mutex<Vec<String>>,
}

impl StubLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, locator: &str, image: ImageHandle) -> Self {
        self.with_delay(locator, image, Duration::ZERO)
    }

    pub fn with_delay(mut self, locator: &str, image: ImageHandle, delay: Duration) -> Self {
        self.images.insert(locator.to_string(), (image, delay));
        self
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Locators in the order their loads finished.
    pub fn completion_order(&self) -> Vec<String> {
        self.completed.lock().clone()
    }
}

#[async_trait]
impl ResourceLoader for StubLoader {
    async fn load_locator(&self, request: LocatorRequest) -> Result<ImageHandle> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let (image, delay) = self
            .images
            .get(&request.locator)
            .cloned()
            .ok_or_else(|| WatermarkError::load(request.locator.clone(), "no such stub"))?;

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.completed.lock().push(request.locator.clone());
        Ok(image)
    }
}

/// A captured HTTP request head.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub head: String,
}

impl SeenRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        let prefix = format!("{}:", name.to_lowercase());
        self.head.lines().find_map(|line| {
            line.to_lowercase()
                .starts_with(&prefix)
                .then(|| line[prefix.len()..].trim().to_string())
        })
    }
}

/// Serve exactly one HTTP response on an ephemeral port.
///
/// Returns the base URL and a handle resolving to the request that was received.
pub async fn serve_once(
    status: &'static str,
    body: Vec<u8>,
) -> (String, tokio::task::JoinHandle<SeenRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.write_all(&body).await.unwrap();
        socket.shutdown().await.ok();

        SeenRequest {
            head: String::from_utf8_lossy(&head).into_owned(),
        }
    });

    (format!("http://{}", addr), handle)
}
