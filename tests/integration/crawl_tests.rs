//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use ripcrawl::config::{Config, OutputConfig, PoolConfig};
use ripcrawl::crawler::Coordinator;
use ripcrawl::server::{FileServer, ServerOptions};
use ripcrawl::{FailureKind, ResponseClass};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `output_dir`
fn create_test_config(workers: usize, output_dir: &Path) -> Config {
    Config {
        pool: PoolConfig {
            size: workers,
            shutdown_grace_ms: 500,
            progress_interval_ms: 1000,
        },
        output: OutputConfig {
            directory: output_dir.display().to_string(),
            save_pages: true,
        },
        ..Config::default()
    }
}

fn html_page(links: &[String]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|link| format!(r#"<a href="{}">link</a>"#, link))
        .collect();
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", anchors))
        .insert_header("content-type", "text/html")
}

/// Mounts page A linking to B and C, and B linking back to A and to C.
/// Every page must be requested exactly once.
async fn mount_cyclic_site(mock_server: &MockServer) {
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/a.html"))
        .respond_with(html_page(&[
            format!("{}/b.html", base_url),
            format!("{}/c.html", base_url),
        ]))
        .expect(1)
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b.html"))
        .respond_with(html_page(&[
            format!("{}/a.html", base_url),
            format!("{}/c.html", base_url),
        ]))
        .expect(1)
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/c.html"))
        .respond_with(html_page(&[]))
        .expect(1)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_visits_each_page_once() {
    for workers in [1, 4] {
        let mock_server = MockServer::start().await;
        mount_cyclic_site(&mock_server).await;
        let output = TempDir::new().expect("Failed to create output dir");

        let coordinator = Coordinator::new(create_test_config(workers, output.path()))
            .expect("Failed to create coordinator");
        let seed = format!("{}/a.html", mock_server.uri());

        let stats = tokio::time::timeout(Duration::from_secs(10), coordinator.run(&seed))
            .await
            .expect("Crawl did not terminate")
            .expect("Crawl failed");

        assert!(stats.completed);
        assert_eq!(stats.fetches, 3);
        assert_eq!(stats.urls_seen, 3);
        assert_eq!(stats.successes(), 3);
        assert_eq!(stats.pages_saved, 3);
        assert_eq!(stats.total_failures(), 0);
        assert_eq!(stats.workers, workers);
        assert_eq!(stats.aborted_workers, 0);

        for name in ["a.html", "b.html", "c.html"] {
            let saved = std::fs::read_to_string(output.path().join(name))
                .unwrap_or_else(|e| panic!("{} not saved: {}", name, e));
            assert!(saved.starts_with("<html>"));
        }

        // Each mock's .expect(1) is verified here
        mock_server.verify().await;
    }
}

#[tokio::test]
async fn test_relative_links_and_index_naming() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(&[
            "docs/".to_string(),
            "/about".to_string(),
            "#top".to_string(),
            "mailto:someone@example.com".to_string(),
        ]))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/"))
        .respond_with(html_page(&["../about".to_string()]))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200).set_body_string("about us"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let output = TempDir::new().expect("Failed to create output dir");
    let coordinator =
        Coordinator::new(create_test_config(2, output.path())).expect("Failed to create coordinator");
    let stats = coordinator
        .run(&format!("{}/", mock_server.uri()))
        .await
        .expect("Crawl failed");

    assert_eq!(stats.fetches, 3);
    assert_eq!(
        std::fs::read_to_string(output.path().join("about")).unwrap(),
        "about us"
    );
    // "/" and "/docs/" both map to "index"; whichever finished last wins
    assert!(output.path().join("index").exists());
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 2);
}

#[tokio::test]
async fn test_failed_fetches_are_not_saved_or_followed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(html_page(&[
            format!("{}/missing", base_url),
            format!("{}/moved", base_url),
            format!("{}/broken", base_url),
            format!("{}/ok", base_url),
        ]))
        .expect(1)
        .mount(&mock_server)
        .await;

    // A 404 page whose links must not be followed
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string(format!(r#"<a href="{}/never">never</a>"#, base_url)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("Location", format!("{}/never", base_url)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/never"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let output = TempDir::new().expect("Failed to create output dir");
    let coordinator =
        Coordinator::new(create_test_config(3, output.path())).expect("Failed to create coordinator");
    let stats = coordinator
        .run(&format!("{}/start", base_url))
        .await
        .expect("Crawl failed");

    assert!(stats.completed);
    assert_eq!(stats.fetches, 5);
    assert_eq!(stats.pages_saved, 2);
    assert_eq!(stats.responses.get(&ResponseClass::ClientError), Some(&1));
    assert_eq!(stats.responses.get(&ResponseClass::ServerError), Some(&1));
    assert_eq!(
        stats.failures.get(&FailureKind::RedirectUnsupported),
        Some(&1)
    );

    assert!(output.path().join("start").exists());
    assert!(output.path().join("ok").exists());
    assert!(!output.path().join("missing").exists());
    assert!(!output.path().join("moved").exists());
    assert!(!output.path().join("broken").exists());
}

#[tokio::test]
async fn test_no_save_writes_nothing() {
    let mock_server = MockServer::start().await;
    mount_cyclic_site(&mock_server).await;
    let output = TempDir::new().expect("Failed to create output dir");

    let mut config = create_test_config(2, output.path());
    config.output.save_pages = false;
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let stats = coordinator
        .run(&format!("{}/a.html", mock_server.uri()))
        .await
        .expect("Crawl failed");

    assert_eq!(stats.fetches, 3);
    assert_eq!(stats.pages_saved, 0);
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_crawl_of_file_server_site() {
    let site = TempDir::new().expect("Failed to create site dir");
    std::fs::write(
        site.path().join("home.html"),
        r#"<a href="news.html">News</a> <a href="/">Welcome</a>"#,
    )
    .unwrap();
    std::fs::write(
        site.path().join("news.html"),
        r#"<a href="home.html">Home</a> <a href="gone.html">Gone</a>"#,
    )
    .unwrap();

    let options = ServerOptions {
        root: site.path().to_path_buf(),
        workers: 2,
        idle_timeout: Duration::from_secs(5),
    };
    let server = FileServer::bind("127.0.0.1:0", options)
        .await
        .expect("Failed to bind server");
    let base_url = format!("http://{}", server.local_addr().unwrap());
    tokio::spawn(server.run());

    let output = TempDir::new().expect("Failed to create output dir");
    let coordinator =
        Coordinator::new(create_test_config(2, output.path())).expect("Failed to create coordinator");
    let stats = coordinator
        .run(&format!("{}/home.html", base_url))
        .await
        .expect("Crawl failed");

    // home, news, welcome page, and the missing gone.html
    assert_eq!(stats.fetches, 4);
    assert_eq!(stats.successes(), 3);
    assert_eq!(stats.responses.get(&ResponseClass::ClientError), Some(&1));
    assert!(output.path().join("home.html").exists());
    assert!(output.path().join("news.html").exists());
    assert!(output.path().join("index").exists());
}

#[tokio::test]
async fn test_invalid_seed_is_rejected() {
    let output = TempDir::new().expect("Failed to create output dir");

    for seed in ["not-a-url", "ftp://example.com/", "http://example.com"] {
        let coordinator = Coordinator::new(create_test_config(1, output.path()))
            .expect("Failed to create coordinator");
        assert!(coordinator.run(seed).await.is_err(), "seed {}", seed);
    }
}
