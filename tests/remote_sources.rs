//! URL batches against a local mock server

mod common;

use bgremove_batch::{
    parse_url_list, BatchConfig, BatchProcessor, ColorKeyRemover, ErrorKind, ItemStatus,
    NamingScheme, RemoveBgApi,
};
use common::{load_rgba, product_shot_bytes};
use image::ImageFormat;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve_image(server: &MockServer, route: &str, format: ImageFormat) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(product_shot_bytes(16, 16, format)),
        )
        .mount(server)
        .await;
}

fn url_config(output: &std::path::Path, commit: bool) -> BatchConfig {
    BatchConfig::builder()
        .output_dir(output)
        .commit(commit)
        .naming(NamingScheme::DashNoBg)
        .build()
        .expect("valid config")
}

#[tokio::test]
async fn test_two_urls_produce_two_cutouts() {
    let server = MockServer::start().await;
    serve_image(&server, "/a.png", ImageFormat::Png).await;
    serve_image(&server, "/b.png", ImageFormat::Png).await;
    let output = TempDir::new().unwrap();
    let out_dir = output.path().join("output");

    let sources = parse_url_list(&format!("{0}/a.png,{0}/b.png", server.uri()));
    let processor = BatchProcessor::new(
        url_config(&out_dir, true),
        Box::new(ColorKeyRemover::default()),
    )
    .unwrap();

    let summary = processor.run(&sources).await;

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 0);
    assert!(out_dir.join("a-no-bg.png").exists());
    assert!(out_dir.join("b-no-bg.png").exists());
    assert_eq!(load_rgba(&out_dir.join("a-no-bg.png")).get_pixel(0, 0)[3], 0);
}

#[tokio::test]
async fn test_unreachable_url_fails_only_that_item() {
    let server = MockServer::start().await;
    serve_image(&server, "/ok.jpg", ImageFormat::Jpeg).await;
    let output = TempDir::new().unwrap();

    let sources = parse_url_list(&format!("{}/ok.jpg,http://127.0.0.1:9/down.jpg", server.uri()));
    let processor = BatchProcessor::new(
        url_config(output.path(), true),
        Box::new(ColorKeyRemover::default()),
    )
    .unwrap();

    let report = processor.run_with_report(&sources).await;

    assert_eq!(report.summary.succeeded, 1);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.items[1].error_kind, Some(ErrorKind::Network));
    assert!(output.path().join("ok-no-bg.png").exists());
    assert!(!output.path().join("down-no-bg.png").exists());
}

#[tokio::test]
async fn test_http_error_status_is_network_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let output = TempDir::new().unwrap();

    let sources = parse_url_list(&format!("{}/gone.png", server.uri()));
    let processor = BatchProcessor::new(
        url_config(output.path(), true),
        Box::new(ColorKeyRemover::default()),
    )
    .unwrap();

    let report = processor.run_with_report(&sources).await;

    assert_eq!(report.items[0].status, ItemStatus::Failed);
    assert_eq!(report.items[0].error_kind, Some(ErrorKind::Network));
    assert!(report.items[0].error.as_deref().unwrap_or_default().contains("404"));
}

#[tokio::test]
async fn test_html_instead_of_image_is_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page.png"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;
    let output = TempDir::new().unwrap();

    let sources = parse_url_list(&format!("{}/page.png?v=2", server.uri()));
    let processor = BatchProcessor::new(
        url_config(output.path(), true),
        Box::new(ColorKeyRemover::default()),
    )
    .unwrap();

    let report = processor.run_with_report(&sources).await;

    assert_eq!(report.items[0].error_kind, Some(ErrorKind::Decode));
    assert_eq!(report.items[0].output, output.path().join("page-no-bg.png"));
}

#[tokio::test]
async fn test_dry_run_never_contacts_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let output = TempDir::new().unwrap();
    let out_dir = output.path().join("output");

    let sources = parse_url_list(&format!("{0}/a.png, {0}/b.png", server.uri()));
    let processor = BatchProcessor::new(
        url_config(&out_dir, false),
        Box::new(ColorKeyRemover::default()),
    )
    .unwrap();

    let summary = processor.run(&sources).await;

    assert_eq!(summary.dry_run, 2);
    assert!(!out_dir.exists());
    server.verify().await;
}

#[tokio::test]
async fn test_remove_bg_api_end_to_end() {
    let server = MockServer::start().await;
    serve_image(&server, "/shoe.jpg", ImageFormat::Jpeg).await;
    Mock::given(method("POST"))
        .and(path("/v1.0/removebg"))
        .and(header("X-Api-Key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(product_shot_bytes(16, 16, ImageFormat::Png)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let output = TempDir::new().unwrap();

    let api = RemoveBgApi::new(Some("test-key".to_string()))
        .unwrap()
        .with_endpoint(format!("{}/v1.0/removebg", server.uri()));
    let processor = BatchProcessor::new(url_config(output.path(), true), Box::new(api)).unwrap();
    processor.check_setup().await.unwrap();

    let summary = processor
        .run(&parse_url_list(&format!("{}/shoe.jpg", server.uri())))
        .await;

    assert_eq!(summary.succeeded, 1);
    assert!(output.path().join("shoe-no-bg.png").exists());
}
