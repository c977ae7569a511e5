//! Storage upsert rules, checked against the in-memory store and, with
//! Docker available, against Postgres.
//!
//! Run the Postgres variants with: cargo test --test store_tests -- --ignored

mod common;

use chrono::{TimeZone, Utc};
use durable::{Journal, JournalEntry};
use serde_json::json;
use test_context::test_context;

use crate::common::*;
use server_core::domains::companies::{CompanyCandidate, DiscoverySource};
use server_core::domains::discovery::models::{DiscoveredUrl, UrlCandidate};
use server_core::domains::jobs::Job;
use server_core::kernel::test_dependencies::MemoryStore;
use server_core::kernel::BaseStore;

fn job(source_url: &str, title: &str, version: i64) -> Job {
    let parsed = scored_job(title, 90).normalize(source_url, "Acme");
    Job::from_parsed(parsed, 90, version)
}

fn candidate(name: &str, domain: &str, description: Option<&str>) -> CompanyCandidate {
    CompanyCandidate {
        name: name.to_string(),
        domain: domain.to_string(),
        description: description.map(str::to_string),
        source: DiscoverySource::CodeHost,
    }
}

// =============================================================================
// In-memory store
// =============================================================================

#[tokio::test]
async fn url_upsert_is_idempotent_and_monotonic() {
    let store = MemoryStore::new();
    let url = "https://acme.com/careers";

    store
        .persist_urls(&[UrlCandidate::career_page(url, "acme.com", 0.9)])
        .await
        .unwrap();
    store
        .persist_urls(&[UrlCandidate::career_page(url, "acme.com", 0.4)])
        .await
        .unwrap();

    assert_eq!(store.urls().len(), 1);
    let row = store.url(url).unwrap();
    assert_eq!(row.confidence, 0.9);
    assert_eq!(row.priority, 1);
}

#[tokio::test]
async fn url_links_to_company_only_when_it_exists() {
    let store = MemoryStore::new().with_company("acme.com", "Acme", Utc::now());

    store
        .persist_urls(&[
            UrlCandidate::career_page("https://acme.com/careers", "acme.com", 0.8),
            UrlCandidate::career_page("https://globex.com/jobs", "globex.com", 0.8),
        ])
        .await
        .unwrap();

    assert_eq!(
        store.url("https://acme.com/careers").unwrap().company_domain.as_deref(),
        Some("acme.com")
    );
    assert_eq!(store.url("https://globex.com/jobs").unwrap().company_domain, None);
}

#[tokio::test]
async fn newer_job_version_wins() {
    let store = MemoryStore::new();
    let v1 = job("https://acme.com/jobs/1", "Engineer", 1);
    let hash = v1.job_hash.clone();

    assert_eq!(store.persist_jobs(&[v1]).await.unwrap(), 1);
    assert_eq!(store.persist_jobs(&[job("https://acme.com/jobs/1", "Engineer", 2)]).await.unwrap(), 1);

    assert_eq!(store.job(&hash).unwrap().version, 2);
}

#[tokio::test]
async fn stale_job_version_is_skipped() {
    let store = MemoryStore::new();
    let v2 = job("https://acme.com/jobs/1", "Engineer", 2);
    let hash = v2.job_hash.clone();

    store.persist_jobs(&[v2]).await.unwrap();
    let written = store
        .persist_jobs(&[job("https://acme.com/jobs/1", "Engineer", 1)])
        .await
        .unwrap();

    assert_eq!(written, 0);
    assert_eq!(store.job(&hash).unwrap().version, 2);
    assert_eq!(store.jobs().len(), 1);
}

#[tokio::test]
async fn company_rediscovery_keeps_description_and_timestamp() {
    let first_seen = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let store = MemoryStore::new();

    store
        .persist_companies(&[candidate("Acme", "acme.com", Some("Rockets"))], first_seen)
        .await
        .unwrap();
    store
        .persist_companies(&[candidate("Acme Corp", "acme.com", None)], Utc::now())
        .await
        .unwrap();

    let company = store.company("acme.com").unwrap();
    assert_eq!(company.name, "Acme Corp");
    assert_eq!(company.description.as_deref(), Some("Rockets"));
    assert_eq!(company.last_discovered_at, first_seen);
}

// =============================================================================
// Postgres
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn postgres_url_upsert_keeps_maxima(ctx: &TestHarness) {
    let store = ctx.store();
    let domain = ctx.unique_domain();
    let url = format!("https://{}/careers", domain);

    let mut low = UrlCandidate::career_page(url.as_str(), &domain, 0.3);
    low.platform = Some("greenhouse".to_string());
    store.persist_urls(&[low]).await.unwrap();
    let mut resighted = UrlCandidate::career_page(url.as_str(), &domain, 0.95);
    resighted.priority = 3;
    store.persist_urls(&[resighted]).await.unwrap();
    store
        .persist_urls(&[UrlCandidate::career_page(url.as_str(), &domain, 0.5)])
        .await
        .unwrap();

    let (stored_url, confidence, priority, platform) = DiscoveredUrl::find_by_url(&url, store.pool())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored_url, url);
    assert_eq!(confidence, 0.95);
    assert_eq!(priority, 3);
    assert_eq!(platform.as_deref(), Some("greenhouse"));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn postgres_job_versions_never_go_backwards(ctx: &TestHarness) {
    let store = ctx.store();
    let source_url = format!("https://{}/jobs/1", ctx.unique_domain());

    let v2 = job(&source_url, "Engineer", 2);
    let hash = v2.job_hash.clone();

    assert_eq!(store.persist_jobs(&[v2]).await.unwrap(), 1);
    assert_eq!(store.persist_jobs(&[job(&source_url, "Engineer", 1)]).await.unwrap(), 0);
    assert_eq!(Job::find_by_hash(&hash, store.pool()).await.unwrap().unwrap().version, 2);

    assert_eq!(store.persist_jobs(&[job(&source_url, "Engineer", 3)]).await.unwrap(), 1);
    assert_eq!(Job::find_by_hash(&hash, store.pool()).await.unwrap().unwrap().version, 3);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn postgres_stale_companies_and_touch(ctx: &TestHarness) {
    let store = ctx.store();
    let domain = ctx.unique_domain();
    let long_ago = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let cutoff = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();

    store
        .persist_companies(&[candidate("Stale Co", &domain, None)], long_ago)
        .await
        .unwrap();

    let stale = store.find_stale_companies(cutoff).await.unwrap();
    assert!(stale.iter().any(|c| c.domain == domain));

    let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
    store.touch_company_discovered(&domain, now).await.unwrap();

    let stale = store.find_stale_companies(cutoff).await.unwrap();
    assert!(!stale.iter().any(|c| c.domain == domain));
    assert_eq!(
        store.find_company(&domain).await.unwrap().unwrap().last_discovered_at,
        now
    );
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn postgres_journal_loads_recorded_entry(ctx: &TestHarness) {
    let journal = ctx.journal();
    let key = format!("{}/0:fetch_page", ctx.unique_domain());

    assert_eq!(journal.load(&key).await.unwrap(), None);

    let entry = JournalEntry::Completed {
        value: json!({ "status": 200 }),
        attempts: 2,
    };
    journal.record(&key, entry.clone()).await.unwrap();

    assert_eq!(journal.load(&key).await.unwrap(), Some(entry));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn postgres_journal_prunes_by_age(ctx: &TestHarness) {
    let journal = ctx.journal();
    let scope = ctx.unique_domain();
    let old_key = format!("{}/0:fetch_page", scope);
    let fresh_key = format!("{}/1:parse_job", scope);
    let entry = JournalEntry::Completed {
        value: json!(1),
        attempts: 1,
    };

    journal.record(&old_key, entry.clone()).await.unwrap();
    journal.record(&fresh_key, entry.clone()).await.unwrap();
    sqlx::query(
        "UPDATE workflow_journal SET recorded_at = NOW() - INTERVAL '60 days' WHERE step_key = $1",
    )
    .bind(&old_key)
    .execute(&ctx.db_pool)
    .await
    .unwrap();

    let pruned = journal
        .prune(Utc::now() - chrono::Duration::days(30))
        .await
        .unwrap();

    assert!(pruned >= 1);
    assert_eq!(journal.load(&old_key).await.unwrap(), None);
    assert_eq!(journal.load(&fresh_key).await.unwrap(), Some(entry));
}
