use std::time::Duration;

use super::*;
use crate::record::{ResourceInfo, ResourceRecord};
use crate::store::MemoryStore;

const TTL: Duration = Duration::from_secs(30 * 60);
const MINUTE_MS: u64 = 60 * 1000;

fn info(code: &str, date: Option<&str>) -> ResourceInfo {
    ResourceInfo::new(Some(code), date)
}

#[tokio::test]
async fn put_then_get_returns_same_metadata() {
    let mut cache = ResourceCache::new(MemoryStore::new(), TTL);
    cache
        .put("https://host/a.pdf", info("CIVL2112", Some("2024-12-09")))
        .await;

    let record = cache.get("https://host/a.pdf").expect("record stored");
    assert_eq!(record.info.course_code(), Some("CIVL2112"));
    assert_eq!(record.info.exam_date(), Some("2024-12-09"));
    assert!(cache.get("https://HOST/a.pdf").is_none(), "keys are case-sensitive");
}

#[tokio::test]
async fn put_overwrites_without_merging() {
    let mut cache = ResourceCache::new(MemoryStore::new(), TTL);
    let url = "https://host/a.pdf";
    cache.put_at(url, info("CIVL2112", Some("2024-12-09")), 1).await;
    cache.put_at(url, info("MATH1010", None), 2).await;

    let record = cache.get(url).unwrap();
    assert_eq!(record.info, ResourceInfo::new(Some("MATH1010"), None));
    assert_eq!(record.captured_at, 2);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn sweep_drops_only_expired_records() {
    let mut cache = ResourceCache::new(MemoryStore::new(), TTL);
    let now = 100 * MINUTE_MS;
    cache.put_at("https://host/old.pdf", info("OLD1000", None), now - 31 * MINUTE_MS).await;
    cache.put_at("https://host/edge.pdf", info("EDGE1000", None), now - 30 * MINUTE_MS).await;
    cache.put_at("https://host/new.pdf", info("NEW1000", None), now - MINUTE_MS).await;

    let removed = cache.sweep(now, TTL).await;
    assert_eq!(removed, 1);
    assert!(cache.get("https://host/old.pdf").is_none());
    assert!(cache.get("https://host/edge.pdf").is_some(), "exactly ttl old is kept");
    assert!(cache.get("https://host/new.pdf").is_some());
}

#[tokio::test]
async fn sweep_applies_to_page_contexts_independently() {
    let mut cache = ResourceCache::new(MemoryStore::new(), TTL);
    let now = 100 * MINUTE_MS;
    cache.put_page_at("https://host/old-page", "CIVL2112", now - 45 * MINUTE_MS).await;
    cache.put_page_at("https://host/page", "MATH1010", now).await;
    cache.put_at("https://host/a.pdf", info("CIVL2112", None), now - 45 * MINUTE_MS).await;

    assert_eq!(cache.sweep_expired(now).await, 2);
    assert_eq!(cache.page_course_code("https://host/old-page"), None);
    assert_eq!(cache.page_course_code("https://host/page"), Some("MATH1010"));
    assert!(cache.is_empty());
}

#[tokio::test]
async fn every_mutation_is_persisted() {
    let store = MemoryStore::new();
    let mut cache = ResourceCache::new(store.clone(), TTL);

    cache.put_at("https://host/a.pdf", info("CIVL2112", None), 0).await;
    let saved = store.saved().expect("put persisted");
    assert!(saved.resources.contains_key("https://host/a.pdf"));

    cache.put_page_at("https://host/page", "CIVL2112", 0).await;
    assert!(store.saved().unwrap().page_contexts.contains_key("https://host/page"));

    cache.sweep(10 * TTL.as_millis() as u64, TTL).await;
    let saved = store.saved().unwrap();
    assert!(saved.resources.is_empty(), "sweep persisted");
    assert!(saved.page_contexts.is_empty());
}

#[tokio::test]
async fn load_restores_previous_process_state() {
    let store = MemoryStore::new();
    {
        let mut cache = ResourceCache::new(store.clone(), TTL);
        cache.put("https://host/a.pdf", info("CIVL2112", Some("2024-12-09"))).await;
        cache.put_page("https://host/page", "CIVL2112").await;
    }

    let restarted = ResourceCache::load(store, TTL).await;
    assert_eq!(
        restarted.get("https://host/a.pdf").unwrap().info.course_code(),
        Some("CIVL2112")
    );
    assert_eq!(restarted.page_course_code("https://host/page"), Some("CIVL2112"));
}

#[tokio::test]
async fn failing_store_leaves_cache_usable() {
    let store = MemoryStore::new();
    store.set_failing(true);
    let mut cache = ResourceCache::load(store.clone(), TTL).await;
    assert!(cache.is_empty());

    cache.put("https://host/a.pdf", info("CIVL2112", None)).await;
    assert!(cache.get("https://host/a.pdf").is_some());
    assert!(store.saved().is_none());

    store.set_failing(false);
    cache.put("https://host/b.pdf", info("MATH1010", None)).await;
    assert_eq!(store.saved().unwrap().resources.len(), 2);
}

#[tokio::test]
async fn prefix_lookup_returns_first_in_insertion_order() {
    let mut cache = ResourceCache::new(MemoryStore::new(), TTL);
    cache.put("https://host/archive/files", info("LONG1000", None)).await;
    cache.put("https://host/archive", info("SHORT1000", None)).await;
    cache.put("https://other/", info("OTHER1000", None)).await;

    let (key, record) = cache
        .first_prefix_of("https://host/archive/files/exam.pdf")
        .expect("prefix match");
    assert_eq!(key, "https://host/archive/files");
    assert_eq!(record.info.course_code(), Some("LONG1000"));

    let (key, _) = cache.first_prefix_of("https://host/archive/page").unwrap();
    assert_eq!(key, "https://host/archive");
    assert!(cache.first_prefix_of("https://elsewhere/x").is_none());
}

#[tokio::test]
async fn overwritten_key_keeps_iteration_position() {
    let mut cache = ResourceCache::new(MemoryStore::new(), TTL);
    cache.put("https://host/a", info("AAAA1000", None)).await;
    cache.put("https://host/b", info("BBBB1000", None)).await;
    cache.put("https://host/a", info("CCCC1000", None)).await;

    let keys: Vec<&str> = cache.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, ["https://host/a", "https://host/b"]);
    let records: Vec<&ResourceRecord> = cache.iter().map(|(_, r)| r).collect();
    assert_eq!(records[0].info.course_code(), Some("CCCC1000"));
}

#[tokio::test]
async fn load_keeps_saved_order() {
    let mut snapshot = CacheSnapshot::default();
    for (url, code) in [("https://host/b", "BBBB1000"), ("https://host/a", "AAAA1000")] {
        snapshot.resources.insert(
            url.to_string(),
            ResourceRecord {
                info: info(code, None),
                captured_at: 1,
            },
        );
    }

    let cache = ResourceCache::load(MemoryStore::with_snapshot(snapshot), TTL).await;
    let keys: Vec<&str> = cache.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, ["https://host/b", "https://host/a"]);
    assert_eq!(cache.first_prefix_of("https://host/a/x").map(|(k, _)| k), Some("https://host/a"));
}
