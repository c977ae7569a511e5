//! Quality gate: admits jobs whose score meets the configured threshold.

use crate::domains::jobs::Job;

/// Default minimum quality score (0-100) for a job to be stored.
pub const DEFAULT_MIN_QUALITY_SCORE: i32 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityGate {
    threshold: i32,
}

impl QualityGate {
    pub fn new(threshold: i32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    /// Scores equal to the threshold pass.
    pub fn admits(&self, job: &Job) -> bool {
        job.quality_score >= self.threshold
    }

    /// Split into `(admitted, rejected)`, preserving order.
    pub fn partition(&self, jobs: Vec<Job>) -> (Vec<Job>, Vec<Job>) {
        jobs.into_iter().partition(|job| self.admits(job))
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_QUALITY_SCORE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::jobs::ParsedJob;

    fn job(title: &str, score: i32) -> Job {
        let parsed = ParsedJob::new(title).normalize("https://acme.com/jobs", "Acme");
        Job::from_parsed(parsed, score, 1)
    }

    #[test]
    fn boundary_score_is_admitted() {
        let gate = QualityGate::default();

        assert!(gate.admits(&job("a", 70)));
        assert!(!gate.admits(&job("b", 69)));
    }

    #[test]
    fn partition_preserves_order() {
        let gate = QualityGate::new(50);
        let (admitted, rejected) =
            gate.partition(vec![job("a", 90), job("b", 10), job("c", 50), job("d", 49)]);

        let titles = |jobs: &[Job]| jobs.iter().map(|j| j.title.clone()).collect::<Vec<_>>();
        assert_eq!(titles(&admitted), vec!["a", "c"]);
        assert_eq!(titles(&rejected), vec!["b", "d"]);
    }
}
