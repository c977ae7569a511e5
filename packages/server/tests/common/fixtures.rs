//! Mock scenarios shared by the workflow tests.

use std::sync::Arc;

use durable::{InMemoryJournal, WorkflowContext};
use server_core::domains::jobs::ParsedJob;
use server_core::kernel::test_dependencies::{
    MemoryStore, MockJobParser, MockJobScorer, MockOsintClient, MockPageFetcher,
};
use server_core::kernel::{ServerDeps, TestDependencies};
use server_core::WorkflowSettings;

pub const CAREERS_HTML: &str = "<html><body><a href=\"/jobs/1\">Engineer</a></body></html>";
pub const JOB_HTML: &str = "<html><body><h1>Job</h1></body></html>";

/// Handles to every mock behind a `ServerDeps`, for assertions.
pub struct Mocks {
    pub store: Arc<MemoryStore>,
    pub osint: Arc<MockOsintClient>,
    pub fetcher: Arc<MockPageFetcher>,
    pub parser: Arc<MockJobParser>,
    pub scorer: Arc<MockJobScorer>,
    pub journal: Arc<InMemoryJournal>,
}

impl Mocks {
    pub fn new(
        store: MemoryStore,
        osint: MockOsintClient,
        fetcher: MockPageFetcher,
        parser: MockJobParser,
    ) -> Self {
        Self {
            store: Arc::new(store),
            osint: Arc::new(osint),
            fetcher: Arc::new(fetcher),
            parser: Arc::new(parser),
            scorer: Arc::new(MockJobScorer::default()),
            journal: Arc::new(InMemoryJournal::new()),
        }
    }

    pub fn with_scorer(mut self, scorer: MockJobScorer) -> Self {
        self.scorer = Arc::new(scorer);
        self
    }

    pub fn with_journal(mut self, journal: Arc<InMemoryJournal>) -> Self {
        self.journal = journal;
        self
    }

    pub fn deps(&self, settings: WorkflowSettings) -> ServerDeps {
        TestDependencies::new()
            .store(self.store.clone())
            .osint(self.osint.clone())
            .page_fetcher(self.fetcher.clone())
            .job_parser(self.parser.clone())
            .job_scorer(self.scorer.clone())
            .journal(self.journal.clone())
            .into_server_deps(settings)
    }

    pub fn context(&self, workflow_id: &str) -> WorkflowContext {
        WorkflowContext::new(workflow_id, self.journal.clone())
    }
}

/// Parsed posting with a parser-supplied score.
pub fn scored_job(title: &str, score: i32) -> ParsedJob {
    ParsedJob::new(title).with_score(score)
}

/// `count` job-page URLs under `base`, `base/jobs/0` onwards.
pub fn job_urls(base: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{}/jobs/{}", base, i)).collect()
}
