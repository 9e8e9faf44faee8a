use std::io::Cursor;
use std::path::Path;

use axum::http::StatusCode;
use axum_test::TestServer;
use image::{DynamicImage, ImageFormat, RgbImage};
use serde_json::Value;
use tempfile::TempDir;

use ubergallery::config::{Config, Theme};
use ubergallery::web::{AppState, WebServer};

fn write_png(path: &Path, width: u32, height: u32) {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([200, 100, 50])))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    std::fs::write(path, bytes).unwrap();
}

/// A public root with a gallery of `names` and an empty cache
fn setup(names: &[&str]) -> (TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.public_dir = dir.path().join("public");
    config.storage.gallery_dir = config.storage.public_dir.join("gallery-images");
    config.storage.cache_dir = config.storage.public_dir.join("cache");
    config.basic_settings.thumbnail_width = 50;
    config.basic_settings.thumbnail_height = 50;

    std::fs::create_dir_all(&config.storage.gallery_dir).unwrap();
    std::fs::create_dir_all(&config.storage.cache_dir).unwrap();
    for name in names {
        write_png(&config.storage.gallery_dir.join(name), 120, 80);
    }
    (dir, config)
}

fn server(config: Config) -> TestServer {
    TestServer::new(WebServer::router(AppState::new(config))).unwrap()
}

#[tokio::test]
async fn test_gallery_page_lists_every_image() {
    let (_dir, config) = setup(&["one.png", "two.png"]);
    std::fs::write(config.storage.gallery_dir.join("three.png"), b"corrupt").unwrap();
    let server = server(config);

    let response = server.get("/").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let html = response.text();
    assert!(html.contains("/public/cache/50x50-one.png"));
    assert!(html.contains("/public/cache/50x50-two.png"));
    // corrupt files are shown full size
    assert!(html.contains("/public/gallery-images/three.png"));
    assert!(!html.contains("50x50-three.png"));
}

#[tokio::test]
async fn test_minimal_theme() {
    let (_dir, mut config) = setup(&["one.png"]);
    config.basic_settings.theme_name = Theme::Minimal;
    let server = server(config);

    let html = server.get("/").await.text();
    assert!(html.contains("<title>Gallery</title>"));
    assert!(html.contains("50x50-one.png"));
}

#[tokio::test]
async fn test_missing_gallery_directory_is_an_error_page() {
    let (_dir, config) = setup(&[]);
    std::fs::remove_dir(&config.storage.gallery_dir).unwrap();
    let server = server(config);

    let response = server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().contains("500"));

    // the server keeps answering
    let health = server.get("/health").await;
    assert_eq!(health.status_code(), StatusCode::OK);
    assert_eq!(health.json::<Value>()["gallery_readable"], false);
}

#[tokio::test]
async fn test_generated_thumbnails_are_served() {
    let (_dir, mut config) = setup(&["one.png"]);
    config.basic_settings.cache_expiration = 600;
    let server = server(config);

    server.get("/").await;
    let response = server.get("/public/cache/50x50-one.png").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.header("cache-control").to_str().unwrap(),
        "public, max-age=600"
    );
    let thumbnail = image::load_from_memory(response.as_bytes()).unwrap();
    assert_eq!((thumbnail.width(), thumbnail.height()), (50, 33));
}

#[tokio::test]
async fn test_no_cache_header_without_expiration() {
    let (_dir, config) = setup(&["one.png"]);
    let server = server(config);

    let response = server.get("/public/gallery-images/one.png").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.maybe_header("cache-control").is_none());
}

#[tokio::test]
async fn test_api_listing_and_pagination() {
    let (_dir, mut config) = setup(&["a.png", "b.png", "c.png"]);
    config.basic_settings.enable_pagination = true;
    config.advanced_settings.images_per_page = 2;
    let server = server(config);

    let first: Value = server.get("/api/v1/images").await.json();
    assert_eq!(first["success"], true);
    assert_eq!(first["data"]["total_pages"], 2);
    assert_eq!(first["data"]["total_images"], 3);
    assert_eq!(first["data"]["images"].as_array().unwrap().len(), 2);
    assert_eq!(first["data"]["images"][0]["name"], "a.png");
    assert_eq!(
        first["data"]["images"][0]["thumbnail"],
        "/public/cache/50x50-a.png"
    );
    assert_eq!(first["data"]["images"][0]["url"], "/public/gallery-images/a.png");

    let second: Value = server
        .get("/api/v1/images")
        .add_query_param("page", 2)
        .await
        .json();
    assert_eq!(second["data"]["page"], 2);
    assert_eq!(second["data"]["images"][0]["name"], "c.png");
}

#[tokio::test]
async fn test_api_reports_listing_errors() {
    let (_dir, config) = setup(&[]);
    std::fs::remove_dir(&config.storage.gallery_dir).unwrap();
    let server = server(config);

    let response = server.get("/api/v1/images").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["success"], false);
}

#[tokio::test]
async fn test_health() {
    let (_dir, config) = setup(&[]);
    let server = server(config);

    let response = server.get("/health").await;
    assert!(response.maybe_header("x-request-id").is_some());

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
