//! Integration tests for the HTTP content and image fetchers.
//!
//! A small HTTP/1.1 server on 127.0.0.1 answers each path with a canned
//! response, so the real reqwest paths run end to end:
//! - non-2xx statuses
//! - SVG and raster decoding rules
//! - JSON parse failures
//!
//! Run with: `cargo test --test http_fetch_integration`

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use image::{ImageFormat, RgbaImage};
use reqwest::{Client, Url};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use pagewarm::preload::{
    ContentKey, ContentSource, FetchError, HttpContentSource, HttpImageFetcher, ImageFetcher,
    ImageLoadError, PageSlug, PreloadConfig, Priority, TieredImageLoader,
};

// ============================================================================
// Helper Functions
// ============================================================================

#[derive(Clone)]
struct Canned {
    status: &'static str,
    content_type: &'static str,
    body: Vec<u8>,
}

impl Canned {
    fn ok(content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: "200 OK",
            content_type,
            body: body.into(),
        }
    }

    fn not_found() -> Self {
        Self {
            status: "404 Not Found",
            content_type: "text/plain",
            body: b"not found".to_vec(),
        }
    }
}

/// Serve `routes` on an ephemeral port; unknown paths get 404.
async fn serve(routes: HashMap<&'static str, Canned>) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let routes = Arc::clone(&routes);
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let head = String::from_utf8_lossy(&request);
                let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                let canned = routes
                    .get(path.as_str())
                    .cloned()
                    .unwrap_or_else(Canned::not_found);

                let header = format!(
                    "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    canned.status,
                    canned.content_type,
                    canned.body.len()
                );
                let _ = stream.write_all(header.as_bytes()).await;
                let _ = stream.write_all(&canned.body).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    Url::parse(&format!("http://{}/api/", addr)).unwrap()
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn image_fetcher(base: &Url) -> HttpImageFetcher {
    let client = Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    HttpImageFetcher::new(client, Some(base.clone()))
}

fn image_routes() -> HashMap<&'static str, Canned> {
    HashMap::from([
        ("/media/pixel.png", Canned::ok("image/png", png(1, 1))),
        ("/media/hero.png", Canned::ok("image/png", png(4, 3))),
        (
            "/static/logo.svg",
            Canned::ok(
                "image/svg+xml",
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="1"/>"#,
            ),
        ),
        ("/static/empty.svg", Canned::ok("image/svg+xml", Vec::new())),
        (
            "/media/truncated.jpg",
            Canned::ok("image/jpeg", b"not really a jpeg".to_vec()),
        ),
    ])
}

// ============================================================================
// Image Fetcher
// ============================================================================

#[tokio::test]
async fn test_raster_image_decodes_dimensions() {
    let base = serve(image_routes()).await;
    let fetcher = image_fetcher(&base);

    let pixel = fetcher.fetch("/media/pixel.png").await.unwrap();
    assert_eq!((pixel.width, pixel.height), (1, 1));

    let hero = fetcher.fetch("/media/hero.png").await.unwrap();
    assert_eq!((hero.width, hero.height), (4, 3));
    assert!(hero.bytes > 0);
}

#[tokio::test]
async fn test_non_success_status_is_not_loaded() {
    let base = serve(image_routes()).await;
    let fetcher = image_fetcher(&base);

    let result = fetcher.fetch("/media/missing.jpg").await;

    assert_eq!(
        result,
        Err(ImageLoadError::Status {
            url: "/media/missing.jpg".to_string(),
            status: 404,
        })
    );
}

#[tokio::test]
async fn test_svg_requires_non_empty_body() {
    let base = serve(image_routes()).await;
    let fetcher = image_fetcher(&base);

    let logo = fetcher.fetch("/static/logo.svg").await.unwrap();
    assert!(logo.bytes > 0);

    let empty = fetcher.fetch("/static/empty.svg").await;
    assert!(matches!(empty, Err(ImageLoadError::Decode { .. })));
}

#[tokio::test]
async fn test_undecodable_raster_is_rejected() {
    let base = serve(image_routes()).await;
    let fetcher = image_fetcher(&base);

    let result = fetcher.fetch("/media/truncated.jpg").await;

    assert!(matches!(result, Err(ImageLoadError::Decode { .. })));
}

#[tokio::test]
async fn test_absolute_url_ignores_base() {
    let base = serve(image_routes()).await;
    let fetcher = image_fetcher(&Url::parse("http://unused.invalid/api/").unwrap());

    let absolute = base.join("/media/pixel.png").unwrap();
    let image = fetcher.fetch(absolute.as_str()).await.unwrap();

    assert_eq!(image.height, 1);
}

#[tokio::test]
async fn test_loader_marks_http_outcomes() {
    let base = serve(image_routes()).await;
    let loader = TieredImageLoader::new(Arc::new(image_fetcher(&base)), PreloadConfig::default());

    let cases = [
        ("/media/pixel.png", true),
        ("/static/logo.svg", true),
        ("/media/missing.jpg", false),
        ("/static/empty.svg", false),
        ("/media/truncated.jpg", false),
    ];
    for (url, expected) in cases {
        let result = loader.load_one(url, Priority::Critical).await;
        assert_eq!(result.loaded, expected, "{url}");
        assert_eq!(result.url, url);
    }
}

// ============================================================================
// Content Source
// ============================================================================

#[tokio::test]
async fn test_content_source_parses_json() {
    let body = json!({ "hero": { "image": "/media/hero.png" } });
    let base = serve(HashMap::from([(
        "/api/pages/home",
        Canned::ok("application/json", body.to_string()),
    )]))
    .await;
    let source = HttpContentSource::new(base.as_str()).unwrap();

    let document = source.fetch(ContentKey::Page(PageSlug::Home)).await.unwrap();

    assert_eq!(document, body);
}

#[tokio::test]
async fn test_content_source_rejects_invalid_json() {
    let base = serve(HashMap::from([(
        "/api/pages/footer",
        Canned::ok("text/html", "<html>maintenance</html>"),
    )]))
    .await;
    let source = HttpContentSource::new(base.as_str()).unwrap();

    let result = source.fetch(ContentKey::Page(PageSlug::Footer)).await;

    match result {
        Err(FetchError::Parse { url, .. }) => assert!(url.ends_with("/api/pages/footer")),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_content_source_reports_status() {
    let base = serve(HashMap::new()).await;
    let source = HttpContentSource::new(base.as_str()).unwrap();

    let result = source.fetch(ContentKey::ApartmentList).await;

    assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
}
