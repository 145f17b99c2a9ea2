use crate::core::classifier::Verdict;

/// Success/failure counters plus the running total of downloaded files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub files_downloaded: u64,
}

impl RunSummary {
    pub fn record(&mut self, verdict: &Verdict) {
        if verdict.is_success() {
            self.succeeded += 1;
            self.files_downloaded += verdict.files_downloaded();
        } else {
            self.failed += 1;
        }
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Folds a finished unit (course or configuration) into a larger summary.
    pub fn record_outcome(&mut self, succeeded: bool, files_downloaded: u64) {
        if succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.files_downloaded += files_downloaded;
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.succeeded > 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::FailureReason;
    use pretty_assertions::assert_eq;

    #[test]
    fn counts_verdicts_and_files() {
        let mut summary = RunSummary::default();
        summary.record(&Verdict::Success { files_downloaded: Some(4) });
        summary.record(&Verdict::Success { files_downloaded: None });
        summary.record(&Verdict::Failure(FailureReason::KeyError));

        assert_eq!(
            summary,
            RunSummary { succeeded: 2, failed: 1, files_downloaded: 4 }
        );
        assert_eq!(summary.total(), 3);
        assert!(!summary.all_succeeded());
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn empty_summary_is_not_success() {
        assert_eq!(RunSummary::default().exit_code(), 1);
    }

    #[test]
    fn outcomes_roll_up() {
        let mut batch = RunSummary::default();
        batch.record_outcome(true, 3);
        batch.record_outcome(true, 0);
        assert!(batch.all_succeeded());
        assert_eq!(batch.files_downloaded, 3);
        assert_eq!(batch.exit_code(), 0);
    }
}
