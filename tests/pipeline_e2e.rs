//! End-to-end pipeline test: listing page to validated file on disk.

#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::time::Duration;

use magwatch::{
    Checkpoint, CheckpointStore, DownloadEngine, HttpFetcher, MonitorConfig, Notifier,
    RunContext, run_once,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn listing_page(server_uri: &str) -> String {
    format!(
        r#"<html><body>
        <article>
          <h2 class="entry-title">
            <a href="{server_uri}/economist-uk-2024-03-14/">The Economist UK, March 14, 2024</a>
          </h2>
        </article>
        <article>
          <h2 class="entry-title">
            <a href="{server_uri}/economist-usa-2024-03-14/">The Economist USA, March 14, 2024</a>
          </h2>
        </article>
        </body></html>"#
    )
}

fn detail_page(server_uri: &str) -> String {
    format!(
        r#"<html><body><div class="entry-content">
        <p>Issue download:</p>
        <a href="{server_uri}/doc123_456">Download from hosting</a>
        </div></body></html>"#
    )
}

fn hosting_page(server_uri: &str) -> String {
    format!(
        r#"<html><body>
        <input name="url" type="hidden" value="{server_uri}/files/issue.pdf">
        </body></html>"#
    )
}

fn pdf_body(len: usize) -> Vec<u8> {
    let mut body = b"%PDF-1.4\n".to_vec();
    body.resize(len, b'x');
    body
}

fn test_config(server_uri: &str, workdir: &Path) -> MonitorConfig {
    let mut config = MonitorConfig::new(server_uri.to_string());
    config.download_dir = workdir.join("downloads");
    config.state_file = workdir.join("state.json");
    config.debug_page_path = workdir.join("debug_host_page.html");
    // The mock server lives on the loopback address, not the real hosting
    // domain.
    config.hosting_domain = "127.0.0.1".to_string();
    config.backoff_unit = Duration::from_millis(5);
    config.polite_delay_ms = (1, 2);
    config
}

fn build_context(config: MonitorConfig, store: CheckpointStore, notifier: Notifier) -> RunContext {
    let fetcher = HttpFetcher::new(&config).unwrap();
    let engine = DownloadEngine::new(
        fetcher.client().clone(),
        config.max_attempts,
        config.backoff_unit,
        config.min_file_size,
    );
    RunContext {
        fetcher,
        engine,
        store,
        notifier,
        config,
    }
}

#[tokio::test]
async fn test_full_run_downloads_only_unseen_issue_once() {
    let server = MockServer::start().await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&uri)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/economist-uk-2024-03-14/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(&uri)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/doc123_456"))
        .respond_with(ResponseTemplate::new(200).set_body_string(hosting_page(&uri)))
        .mount(&server)
        .await;
    // The resolved URL carries the force-download marker; the file must be
    // fetched exactly once across both runs.
    Mock::given(method("GET"))
        .and(path("/files/issue.pdf"))
        .and(query_param("dl", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(pdf_body(4096)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let workdir = tempfile::tempdir().unwrap();
    let config = test_config(&uri, workdir.path());

    // The USA issue was processed by an earlier run.
    let usa_url = format!("{uri}/economist-usa-2024-03-14/");
    let seeded = Checkpoint {
        processed_urls: vec![usa_url.clone()],
        last_check: None,
    };
    let store = CheckpointStore::with_checkpoint(&config.state_file, seeded);

    let (notifier, notifications) = Notifier::capture();
    let mut ctx = build_context(config, store, notifier);
    let summary = run_once(&mut ctx).await.unwrap();

    assert_eq!(summary.items_seen, 2);
    assert_eq!(summary.new_items, 1);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.failed, 0);

    // Exactly one notification, for the downloaded issue.
    {
        let recorded = notifications.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0].message.contains("The_Economist_UK_20240314.pdf"));
    }

    let downloaded = workdir
        .path()
        .join("downloads")
        .join("The_Economist_UK_20240314.pdf");
    assert!(downloaded.exists());
    assert_eq!(std::fs::read(&downloaded).unwrap().len(), 4096);

    // Hosting page body was preserved for diagnosis.
    assert!(ctx.config.debug_page_path.exists());

    // Checkpoint on disk now holds both issues and a check timestamp.
    let reloaded = CheckpointStore::load(&ctx.config.state_file).unwrap();
    assert!(reloaded.contains(&usa_url));
    assert!(reloaded.contains(&format!("{uri}/economist-uk-2024-03-14/")));
    assert!(reloaded.checkpoint().last_check.is_some());

    // A second run finds nothing new: no further file request, no further
    // notification.
    let summary = run_once(&mut ctx).await.unwrap();
    assert_eq!(summary.items_seen, 2);
    assert_eq!(summary.new_items, 0);
    assert_eq!(summary.downloaded, 0);
    assert_eq!(notifications.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_file_already_on_disk_is_checkpointed_without_notifying() {
    let server = MockServer::start().await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&uri)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/economist-uk-2024-03-14/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(&uri)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/doc123_456"))
        .respond_with(ResponseTemplate::new(200).set_body_string(hosting_page(&uri)))
        .mount(&server)
        .await;
    // No file mock: a download request here would 404 and fail the test's
    // already_present assertion.

    let workdir = tempfile::tempdir().unwrap();
    let config = test_config(&uri, workdir.path());

    // UK issue file already sits in the download directory.
    std::fs::create_dir_all(&config.download_dir).unwrap();
    std::fs::write(
        config.download_dir.join("The_Economist_UK_20240314.pdf"),
        pdf_body(4096),
    )
    .unwrap();

    let usa_url = format!("{uri}/economist-usa-2024-03-14/");
    let seeded = Checkpoint {
        processed_urls: vec![usa_url],
        last_check: None,
    };
    let store = CheckpointStore::with_checkpoint(&config.state_file, seeded);

    let (notifier, notifications) = Notifier::capture();
    let mut ctx = build_context(config, store, notifier);
    let summary = run_once(&mut ctx).await.unwrap();

    assert_eq!(summary.new_items, 1);
    assert_eq!(summary.already_present, 1);
    assert_eq!(summary.downloaded, 0);
    assert!(notifications.lock().unwrap().is_empty());

    // The item still lands in the checkpoint so later runs skip it outright.
    let reloaded = CheckpointStore::load(&ctx.config.state_file).unwrap();
    assert!(reloaded.contains(&format!("{uri}/economist-uk-2024-03-14/")));
}

#[tokio::test]
async fn test_listing_fetch_failure_aborts_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let workdir = tempfile::tempdir().unwrap();
    let config = test_config(&server.uri(), workdir.path());
    let store = CheckpointStore::load(&config.state_file).unwrap();

    let mut ctx = build_context(config, store, Notifier::Noop);
    let result = run_once(&mut ctx).await;
    assert!(result.is_err());
    // Nothing was checkpointed.
    assert!(!ctx.config.state_file.exists());
}

#[tokio::test]
async fn test_detail_page_without_hosting_link_is_skipped_not_checkpointed() {
    let server = MockServer::start().await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&uri)))
        .mount(&server)
        .await;
    // Both detail pages lack any hosting link.
    let bare = r#"<html><body><div class="entry-content"><p>soon</p></div></body></html>"#;
    Mock::given(method("GET"))
        .and(path("/economist-uk-2024-03-14/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(bare))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/economist-usa-2024-03-14/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(bare))
        .mount(&server)
        .await;

    let workdir = tempfile::tempdir().unwrap();
    let config = test_config(&uri, workdir.path());
    let store = CheckpointStore::load(&config.state_file).unwrap();

    let (notifier, notifications) = Notifier::capture();
    let mut ctx = build_context(config, store, notifier);
    let summary = run_once(&mut ctx).await.unwrap();

    assert_eq!(summary.items_seen, 2);
    assert_eq!(summary.new_items, 2);
    assert_eq!(summary.downloaded, 0);
    assert_eq!(summary.skipped, 2);
    // Skipped items must not notify.
    assert!(notifications.lock().unwrap().is_empty());

    // Unprocessed items stay out of the checkpoint so a later run retries.
    let reloaded = CheckpointStore::load(&ctx.config.state_file).unwrap();
    assert!(reloaded.checkpoint().processed_urls.is_empty());
    assert!(reloaded.checkpoint().last_check.is_some());
}
