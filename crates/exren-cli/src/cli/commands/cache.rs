//! `exren cache` – list the persisted metadata cache.

use anyhow::Result;
use exren_core::record::now_millis;
use exren_core::store::{DurableStore, SqliteStore};

fn age(now: u64, captured_at: u64) -> String {
    format!("{}m", now.saturating_sub(captured_at) / 60_000)
}

pub async fn run_cache() -> Result<()> {
    let store = SqliteStore::open_default().await?;
    let Some(snapshot) = store.load().await? else {
        println!("Cache is empty.");
        return Ok(());
    };
    let now = now_millis();

    if snapshot.resources.is_empty() {
        println!("No documents cached.");
    } else {
        println!("{:<12} {:<12} {:<6} {}", "COURSE", "DATE", "AGE", "URL");
        for (url, record) in &snapshot.resources {
            println!(
                "{:<12} {:<12} {:<6} {}",
                record.info.course_code().unwrap_or("-"),
                record.info.exam_date().unwrap_or("-"),
                age(now, record.captured_at),
                url
            );
        }
    }

    if !snapshot.page_contexts.is_empty() {
        println!();
        println!("{:<12} {:<6} {}", "COURSE", "AGE", "PAGE");
        for (page, record) in &snapshot.page_contexts {
            println!("{:<12} {:<6} {}", record.course_code, age(now, record.captured_at), page);
        }
    }
    Ok(())
}
