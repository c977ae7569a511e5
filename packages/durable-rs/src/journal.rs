//! Journal of completed task outcomes.
//!
//! Every task run through a [`WorkflowContext`](crate::WorkflowContext) is
//! recorded under a deterministic step key. On replay the recorded outcome is
//! returned without executing the task again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{JournalError, WorkflowError};

/// Recorded outcome of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JournalEntry {
    Completed {
        value: serde_json::Value,
        attempts: u32,
    },
    Failed {
        message: String,
        attempts: u32,
    },
}

impl JournalEntry {
    pub fn attempts(&self) -> u32 {
        match self {
            JournalEntry::Completed { attempts, .. } | JournalEntry::Failed { attempts, .. } => {
                *attempts
            }
        }
    }

    pub(crate) fn into_result<T: DeserializeOwned>(self, task: &str) -> Result<T, WorkflowError> {
        match self {
            JournalEntry::Completed { value, .. } => {
                serde_json::from_value(value).map_err(|source| WorkflowError::Serialization {
                    task: task.to_string(),
                    source,
                })
            }
            JournalEntry::Failed { message, attempts } => Err(WorkflowError::TaskFailed {
                task: task.to_string(),
                attempts,
                message,
            }),
        }
    }
}

/// Storage backend for step outcomes.
#[async_trait]
pub trait Journal: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<JournalEntry>, JournalError>;

    async fn record(&self, key: &str, entry: JournalEntry) -> Result<(), JournalError>;

    /// Drop entries recorded before `recorded_before`; returns how many went.
    /// Runs whose steps are pruned can no longer be resumed.
    async fn prune(&self, recorded_before: DateTime<Utc>) -> Result<u64, JournalError>;
}

#[derive(Debug, Clone)]
struct Recorded {
    entry: JournalEntry,
    recorded_at: DateTime<Utc>,
}

/// Process-local journal. Replay survives only as long as the value does.
#[derive(Debug, Default)]
pub struct InMemoryJournal {
    entries: DashMap<String, Recorded>,
}

impl InMemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<JournalEntry> {
        self.entries.get(key).map(|recorded| recorded.entry.clone())
    }

    /// All recorded keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl Journal for InMemoryJournal {
    async fn load(&self, key: &str) -> Result<Option<JournalEntry>, JournalError> {
        Ok(self.get(key))
    }

    async fn record(&self, key: &str, entry: JournalEntry) -> Result<(), JournalError> {
        self.entries.insert(
            key.to_string(),
            Recorded {
                entry,
                recorded_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn prune(&self, recorded_before: DateTime<Utc>) -> Result<u64, JournalError> {
        let before = self.entries.len();
        self.entries.retain(|_, recorded| recorded.recorded_at >= recorded_before);
        Ok((before - self.entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_and_loads_entries() {
        let journal = InMemoryJournal::new();
        assert!(journal.load("wf/0:fetch").await.unwrap().is_none());

        journal
            .record(
                "wf/0:fetch",
                JournalEntry::Completed {
                    value: serde_json::json!({"status": 200}),
                    attempts: 2,
                },
            )
            .await
            .unwrap();

        let entry = journal.load("wf/0:fetch").await.unwrap().unwrap();
        assert_eq!(entry.attempts(), 2);
        assert_eq!(journal.keys(), vec!["wf/0:fetch".to_string()]);
    }

    #[tokio::test]
    async fn prune_drops_entries_recorded_before_cutoff() {
        let journal = InMemoryJournal::new();
        let entry = JournalEntry::Completed {
            value: serde_json::json!(1),
            attempts: 1,
        };
        journal.record("old/0:fetch", entry.clone()).await.unwrap();
        journal.record("old/1:parse", entry).await.unwrap();

        let recent = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(journal.prune(recent).await.unwrap(), 0);
        assert_eq!(journal.len(), 2);

        let pruned = journal
            .prune(Utc::now() + chrono::Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(pruned, 2);
        assert!(journal.is_empty());
    }

    #[test]
    fn failed_entry_replays_as_task_failure() {
        let entry = JournalEntry::Failed {
            message: "boom".into(),
            attempts: 3,
        };
        let err = entry.into_result::<u32>("fetch").unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::TaskFailed { attempts: 3, ref message, .. } if message == "boom"
        ));
    }

    #[test]
    fn entries_serialize_with_status_tag() {
        let entry = JournalEntry::Failed {
            message: "boom".into(),
            attempts: 1,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["status"], "failed");
    }
}
