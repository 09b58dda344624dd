use std::sync::Arc;

/// Events emitted while talking to the catalog, for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The show listing is being fetched
    FetchingPreviews,

    /// The show listing arrived
    PreviewsFetched { count: usize },

    /// A genre id is being probed
    ProbingGenre { id: u32 },

    /// Genre probing stopped at the first id that was unavailable
    GenreScanFinished {
        found: usize,
        /// The id that ended the scan
        stopped_at: u32,
    },

    /// A full show is being fetched
    FetchingShow { show_id: String },

    /// A show could not be fetched and was left out
    ShowUnavailable { show_id: String, error: String },

    /// A multi-show aggregation finished
    AggregationCompleted {
        loaded_count: usize,
        dropped_count: usize,
    },
}

/// Trait for reporting progress events while catalog data is loaded.
///
/// Implementations can use this to display spinners, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {
        // Intentionally empty
    }
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}
