//! Client commands with no daemon listening: each one falls back to doing
//! the work locally.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use exren_core::cache::ResourceCache;
use exren_core::config::{ExrenConfig, EXAM_ARCHIVE_HOST};
use exren_core::engine::{DeterminationEvent, HostFilter};
use exren_core::protocol::{BatchProgress, DownloadAllRequested, DownloadRequested, PageMetadataObserved};
use exren_core::record::ResourceInfo;
use exren_core::rehydrate::{RehydrationStore, SessionFileStore};
use exren_core::store::{DurableStore, SqliteStore};
use tempfile::tempdir;

use super::quick;
use crate::cli::commands::get::get;
use crate::cli::commands::get_all::get_all;
use crate::cli::commands::ingest::ingest;
use crate::cli::commands::resolve::{resolve, Offline};
use crate::cli::commands::serve::build_service;
use crate::cli::commands::Route;

const TTL: Duration = Duration::from_secs(1800);

/// Serves `body` to every GET; returns the base URL.
fn serve_body(body: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    std::thread::spawn(move || {
        for mut stream in listener.incoming().flatten() {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body);
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn absent_socket(dir: &Path) -> std::path::PathBuf {
    dir.join("absent.sock")
}

fn event(url: &str, referrer: Option<&str>) -> DeterminationEvent {
    DeterminationEvent {
        url: url.to_string(),
        referrer: referrer.map(str::to_string),
        suggested_filename: "original.pdf".to_string(),
    }
}

#[tokio::test]
async fn ingest_without_daemon_writes_the_database() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("cache.db");
    let mut page = PageMetadataObserved {
        page_url: Some("https://host/page".into()),
        course_code: Some("CIVL2112".into()),
        ..PageMetadataObserved::default()
    };
    page.resources.insert(
        "https://host/a.pdf".into(),
        ResourceInfo::new(None, Some("2024-12-09")),
    );

    let (route, stored) = ingest(&quick(), &absent_socket(dir.path()), &db, TTL, page)
        .await
        .unwrap();
    assert_eq!(route, Route::Direct);
    assert_eq!(stored, 1);

    let snapshot = SqliteStore::open_at(&db).await.unwrap().load().await.unwrap().unwrap();
    let record = &snapshot.resources["https://host/a.pdf"];
    assert_eq!(record.info.course_code(), Some("CIVL2112"));
    assert_eq!(record.info.exam_date(), Some("2024-12-09"));
    assert_eq!(snapshot.page_contexts["https://host/page"].course_code, "CIVL2112");
}

#[tokio::test]
async fn resolve_without_daemon_uses_stored_snapshot() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("cache.db");
    {
        let store = SqliteStore::open_at(&db).await.unwrap();
        let mut cache = ResourceCache::load(store, TTL).await;
        cache
            .put("https://host/page", ResourceInfo::new(Some("CIVL2112"), Some("2024-12-09")))
            .await;
    }

    let offline = Offline {
        db: &db,
        ttl: TTL,
        session: SessionFileStore::disabled(),
        hosts: HostFilter::any(),
    };
    let (route, name) = resolve(
        &quick(),
        &absent_socket(dir.path()),
        offline,
        &event("https://cdn/x.pdf", Some("https://host/page")),
    )
    .await
    .unwrap();
    assert_eq!(route, Route::Direct);
    assert_eq!(name, "CIVL2112_Exam_2024-12-09.pdf");
}

#[tokio::test]
async fn resolve_without_daemon_reads_session_file() {
    let dir = tempdir().unwrap();
    let session = SessionFileStore::at(dir.path().join("session.json"));
    session
        .write("https://host/b.pdf", &ResourceInfo::new(Some("MATH1010"), None))
        .await;

    let db = dir.path().join("cache.db");
    let offline = Offline {
        db: &db,
        ttl: TTL,
        session,
        hosts: HostFilter::any(),
    };
    let (_, name) = resolve(&quick(), &absent_socket(dir.path()), offline, &event("https://host/b.pdf", None))
        .await
        .unwrap();
    assert_eq!(name, "MATH1010_Exam_b.pdf");
}

#[tokio::test]
async fn get_without_daemon_saves_platform_name_and_stages_metadata() {
    let base = serve_body(b"%PDF-1.4 body");
    let dir = tempdir().unwrap();
    let downloads = dir.path().join("downloads");
    let session = SessionFileStore::at(dir.path().join("session.json"));
    let url = format!("{}files/123.pdf", base);

    let (route, outcome) = get(
        &quick(),
        &absent_socket(dir.path()),
        &session,
        &downloads,
        &url,
        ResourceInfo::new(Some("CIVL2112"), Some("2024-12-09")),
    )
    .await
    .unwrap();
    assert_eq!(route, Route::Direct);
    let path = outcome.result.unwrap();
    assert_eq!(path, downloads.join("123.pdf"));
    assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 body");

    // A daemon started later can still name the next request for this URL.
    let staged = session.read(&url).await.unwrap();
    assert_eq!(staged.course_code(), Some("CIVL2112"));
}

#[tokio::test]
async fn get_all_without_daemon_downloads_every_item() {
    let base = serve_body(b"body");
    let dir = tempdir().unwrap();
    let downloads = dir.path().join("downloads");
    let batch = DownloadAllRequested {
        items: ["a", "b"]
            .iter()
            .map(|name| DownloadRequested {
                url: format!("{}files/{}.pdf", base, name),
                course_code: Some("MATH1010".into()),
                exam_date: None,
            })
            .collect(),
    };

    let mut seen: Vec<BatchProgress> = Vec::new();
    let (route, last) = get_all(&quick(), &absent_socket(dir.path()), &downloads, &batch, |p| {
        seen.push(*p)
    })
    .await
    .unwrap();
    assert_eq!(route, Route::Direct);
    assert_eq!(last, BatchProgress { found: 2, completed: 2, failed: 0 });
    assert_eq!(seen.iter().map(|p| p.completed).collect::<Vec<_>>(), [0, 1, 2]);
    assert!(downloads.join("a.pdf").exists());
    assert!(downloads.join("b.pdf").exists());
}

#[tokio::test]
async fn daemon_service_runs_in_memory_when_database_is_unusable() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("cache.db");
    std::fs::create_dir(&db).unwrap();

    let service = build_service(
        &ExrenConfig::default(),
        &db,
        SessionFileStore::disabled(),
        &dir.path().join("downloads"),
    )
    .await;

    let url = format!("https://{}/files/123.pdf", EXAM_ARCHIVE_HOST);
    let mut page = PageMetadataObserved::default();
    page.resources.insert(url.clone(), ResourceInfo::new(Some("CIVL2112"), Some("2024-12-09")));
    assert_eq!(service.ingest(&page).await, 1);

    let suggestion = service.determine(&event(&url, None)).await;
    assert_eq!(suggestion.filename, "CIVL2112_Exam_2024-12-09.pdf");
}
