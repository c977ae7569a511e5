//! Integration tests for the keyword dork sweep.

mod common;

use std::collections::BTreeMap;

use crate::common::*;
use server_core::domains::discovery::dork::generate_dork_queries;
use server_core::domains::discovery::{DorkSweepRequest, DorkSweepWorkflow, PageType};
use server_core::kernel::test_dependencies::{
    MemoryStore, MockJobParser, MockOsintClient, MockPageFetcher,
};
use server_core::WorkflowSettings;

const GREENHOUSE_BOARD: &str = "https://boards.greenhouse.io/acme";
const LEVER_BOARD: &str = "https://jobs.lever.co/globex";
const CAREERS: &str = "https://initech.com/careers";

fn mocks_with(osint: MockOsintClient) -> Mocks {
    Mocks::new(
        MemoryStore::new(),
        osint,
        MockPageFetcher::new(),
        MockJobParser::new(),
    )
}

#[tokio::test(start_paused = true)]
async fn queues_dork_results_as_ats_pages() {
    let queries = generate_dork_queries("rust");
    let osint = MockOsintClient::new()
        .with_dork_results(&queries[1], &[GREENHOUSE_BOARD])
        .with_dork_results(&queries[2], &[LEVER_BOARD])
        .with_dork_results(&queries[4], &[CAREERS])
        .with_failing_dork(&queries[5])
        .with_platform(GREENHOUSE_BOARD, "greenhouse")
        .with_platform(LEVER_BOARD, "lever");
    let mocks = mocks_with(osint);

    let ctx = mocks.context("dork-sweep");
    let result = DorkSweepWorkflow::new(mocks.deps(WorkflowSettings::default()))
        .run(&ctx, DorkSweepRequest::new("rust"))
        .await
        .unwrap();

    assert_eq!(result.queries_run, 6);
    assert_eq!(result.urls_found, 3);
    assert_eq!(result.urls_queued, 3);
    assert_eq!(
        result.platforms,
        BTreeMap::from([("greenhouse".to_string(), 1), ("lever".to_string(), 1)])
    );

    let board = mocks.store.url(GREENHOUSE_BOARD).unwrap();
    assert_eq!(board.page_type, PageType::AtsDetected);
    assert_eq!(board.platform.as_deref(), Some("greenhouse"));
    assert_eq!(board.confidence, 0.9);

    let careers = mocks.store.url(CAREERS).unwrap();
    assert_eq!(careers.page_type, PageType::AtsDetected);
    assert_eq!(careers.platform, None);
    assert_eq!(careers.company_domain, None);
}

#[tokio::test(start_paused = true)]
async fn results_without_a_domain_are_skipped() {
    let queries = generate_dork_queries("golang");
    let osint = MockOsintClient::new().with_dork_results(&queries[0], &["not a url", CAREERS]);
    let mocks = mocks_with(osint);

    let ctx = mocks.context("dork-sweep-garbage");
    let result = DorkSweepWorkflow::new(mocks.deps(WorkflowSettings::default()))
        .run(&ctx, DorkSweepRequest::new("golang"))
        .await
        .unwrap();

    assert_eq!(result.urls_found, 2);
    assert_eq!(result.urls_queued, 1);
    assert_eq!(mocks.store.urls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn no_results_queues_nothing() {
    let mocks = mocks_with(MockOsintClient::new());

    let ctx = mocks.context("dork-sweep-empty");
    let result = DorkSweepWorkflow::new(mocks.deps(WorkflowSettings::default()))
        .run(&ctx, DorkSweepRequest::new("cobol"))
        .await
        .unwrap();

    assert_eq!(result.queries_run, 6);
    assert_eq!(result.urls_found, 0);
    assert_eq!(result.urls_queued, 0);
    assert!(mocks.osint.detect_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn url_store_failure_is_reported_as_nothing_queued() {
    let queries = generate_dork_queries("rust");
    let osint = MockOsintClient::new().with_dork_results(&queries[1], &[GREENHOUSE_BOARD]);
    let mocks = Mocks::new(
        MemoryStore::new().failing_url_writes(),
        osint,
        MockPageFetcher::new(),
        MockJobParser::new(),
    );

    let ctx = mocks.context("dork-sweep-store-failure");
    let result = DorkSweepWorkflow::new(mocks.deps(WorkflowSettings::default()))
        .run(&ctx, DorkSweepRequest::new("rust"))
        .await
        .unwrap();

    assert_eq!(result.urls_found, 1);
    assert_eq!(result.urls_queued, 0);
}
