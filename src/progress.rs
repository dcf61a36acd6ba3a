//! Progress-callback trait for session and visualization events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to receive
//! events as the session transitions and the visualization calls resolve.
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a channel, a websocket, or a terminal spinner
//! without the library knowing how the host application communicates. The
//! trait is `Send + Sync` because the two visualization tasks run on
//! spawned tokio tasks and report their completion from there.

use crate::output::VisualKind;
use crate::record::BillRecord;
use std::sync::Arc;

/// Called by the session as the analysis progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Visual events may arrive from different tasks in
/// any order; implementations must synchronise their own shared state.
pub trait AnalysisProgressCallback: Send + Sync {
    /// A document was selected; the session entered the loading state.
    fn on_analysis_start(&self, file_name: &str) {
        let _ = file_name;
    }

    /// Extraction succeeded; the session holds a record now.
    fn on_record_extracted(&self, record: &BillRecord) {
        let _ = record;
    }

    /// Extraction failed; `message` is the fixed user-facing text, not the
    /// underlying cause (which is logged instead).
    fn on_analysis_error(&self, message: String) {
        let _ = message;
    }

    /// A visualization call was dispatched.
    fn on_visual_start(&self, kind: VisualKind) {
        let _ = kind;
    }

    /// A visualization produced an image.
    fn on_visual_ready(&self, kind: VisualKind) {
        let _ = kind;
    }

    /// The collage fell back to the unmodified reference photo.
    fn on_visual_fallback(&self, kind: VisualKind) {
        let _ = kind;
    }

    /// A visualization concluded without a result; its slot stays pending.
    fn on_visual_unavailable(&self, kind: VisualKind) {
        let _ = kind;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in
/// [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        extracted: AtomicUsize,
        errors: AtomicUsize,
        visuals_ready: AtomicUsize,
    }

    impl AnalysisProgressCallback for TrackingCallback {
        fn on_analysis_start(&self, _file_name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        fn on_record_extracted(&self, _record: &BillRecord) {
            self.extracted.fetch_add(1, Ordering::SeqCst);
        }
        fn on_analysis_error(&self, _message: String) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
        fn on_visual_ready(&self, _kind: VisualKind) {
            self.visuals_ready.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_analysis_start("bill.pdf");
        cb.on_analysis_error("failed".to_string());
        cb.on_visual_start(VisualKind::Persona);
        cb.on_visual_ready(VisualKind::Collage);
        cb.on_visual_fallback(VisualKind::Collage);
        cb.on_visual_unavailable(VisualKind::Persona);
    }

    #[test]
    fn arc_dyn_callback_moves_into_spawned_task() {
        let tracker = Arc::new(TrackingCallback {
            starts: AtomicUsize::new(0),
            extracted: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            visuals_ready: AtomicUsize::new(0),
        });

        let cb: ProgressCallback = Arc::clone(&tracker) as ProgressCallback;
        let handle = std::thread::spawn(move || {
            cb.on_analysis_start("bill.pdf");
            cb.on_visual_ready(VisualKind::Persona);
            cb.on_visual_ready(VisualKind::Collage);
        });
        handle.join().unwrap();

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.visuals_ready.load(Ordering::SeqCst), 2);
    }
}
