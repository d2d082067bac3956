use std::fmt;
use std::time::Duration;

/// Stages a harvest run moves through.
///
/// `Failed` is only reachable from `LoadingState` and `Persisting`; every
/// other problem is absorbed as a skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    Idle,
    LoadingState,
    Discovering,
    ScanningProduct,
    ExtractingChangelog,
    Merging,
    Persisting,
    Done,
    Failed,
}

impl RunPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::LoadingState => "loading_state",
            Self::Discovering => "discovering",
            Self::ScanningProduct => "scanning_product",
            Self::ExtractingChangelog => "extracting_changelog",
            Self::Merging => "merging",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one harvest run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records added by this run
    pub new_record_count: usize,
    /// Records in the dataset after the merge
    pub total_record_count: usize,
    pub products_discovered: usize,
    /// Products whose release table never appeared or failed to load
    pub products_skipped: usize,
    pub rows_without_changelog: usize,
    pub rows_already_scraped: usize,
    pub extraction_failures: usize,
    /// Ledger size after the run
    pub ledger_size: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    /// True when the run found nothing new to commit
    pub const fn is_noop(&self) -> bool {
        self.new_record_count == 0
    }
}
