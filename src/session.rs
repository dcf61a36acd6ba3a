//! View state for one bill-analysis session.
//!
//! [`BillSession`] is the single writer of user-facing state. The main flow
//! is a four-state machine — Idle → Loading → Success | Error, with Reset
//! back to Idle from anywhere — and the two visualization slots are
//! orthogonal: they never influence the main state, and a visualization
//! failure can never turn a Success into an Error.
//!
//! ## Stale completions
//!
//! Visualization calls are not cancelled on reset or re-upload; they run to
//! completion in their spawned tasks. Every mutation that starts a new flow
//! (begin, reset) bumps a generation counter, and slot writes carry the
//! [`Generation`] they were started under. A write whose generation is no
//! longer current is dropped, so a slow persona render from a previous bill
//! cannot overwrite the slots of the current one.
//!
//! The handle is cheaply cloneable and safe to move into spawned tasks.

use crate::error::{BillError, VisualError};
use crate::output::{VisualKind, VisualizationResult};
use crate::pipeline::encode::EncodedAsset;
use crate::progress::ProgressCallback;
use crate::record::BillRecord;
use std::sync::{Arc, Mutex};
use tracing::{error, warn};

/// The one message shown to the user when the main flow fails. The actual
/// cause goes to the log, never to the surface.
pub const EXTRACTION_FAILED_MESSAGE: &str =
    "Failed to process the bill. Please ensure it's a valid PDF and try again.";

/// Token identifying which upload a completion belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// User-facing mode of the main flow. Exactly one holds at any time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState {
    /// No document, no record.
    #[default]
    Idle,
    /// Extraction request in flight.
    Loading { file_name: String },
    /// A validated record is present.
    Success {
        file_name: String,
        record: BillRecord,
    },
    /// The main flow failed; `message` is the fixed user-facing text.
    Error { file_name: String, message: String },
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading { .. })
    }

    /// The record, when the state is Success.
    pub fn record(&self) -> Option<&BillRecord> {
        match self {
            ViewState::Success { record, .. } => Some(record),
            _ => None,
        }
    }

    /// The error message, when the state is Error.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ViewState::Error { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// State of the persona slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PersonaSlot {
    /// No image yet. Stays here forever if the generator declines — the
    /// surface keeps showing its placeholder rather than an error.
    #[default]
    Pending,
    Ready(VisualizationResult),
}

/// State of the collage slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CollageSlot {
    #[default]
    Pending,
    Ready(VisualizationResult),
    /// Generation failed; show the unmodified reference photo, dimmed.
    Fallback(EncodedAsset),
}

/// Point-in-time copy of the session for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub view: ViewState,
    pub persona: PersonaSlot,
    pub collage: CollageSlot,
}

#[derive(Default)]
struct SessionInner {
    view: ViewState,
    persona: PersonaSlot,
    collage: CollageSlot,
    generation: u64,
}

/// Shared handle to one session's state.
#[derive(Clone, Default)]
pub struct BillSession {
    inner: Arc<Mutex<SessionInner>>,
    observer: Option<ProgressCallback>,
}

impl BillSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that reports transitions to the given callback.
    pub fn with_observer(observer: ProgressCallback) -> Self {
        Self {
            inner: Arc::default(),
            observer: Some(observer),
        }
    }

    /// A document was selected: move to Loading from any state, clearing any
    /// prior record, error, and visualization slots.
    ///
    /// Returns the generation token the upcoming completions must present.
    pub fn begin(&self, file_name: impl Into<String>) -> Generation {
        let file_name = file_name.into();
        let generation = {
            let mut inner = self.inner.lock().expect("session lock poisoned");
            inner.generation += 1;
            inner.view = ViewState::Loading {
                file_name: file_name.clone(),
            };
            inner.persona = PersonaSlot::Pending;
            inner.collage = CollageSlot::Pending;
            inner.generation
        };
        if let Some(cb) = &self.observer {
            cb.on_analysis_start(&file_name);
        }
        Generation(generation)
    }

    /// Extraction succeeded: Loading → Success.
    ///
    /// Ignored (returns false) when `gen` is stale or the state is not
    /// Loading any more.
    pub fn finish(&self, gen: Generation, record: BillRecord) -> bool {
        let applied = {
            let mut inner = self.inner.lock().expect("session lock poisoned");
            if inner.generation != gen.0 || !inner.view.is_loading() {
                false
            } else {
                let file_name = match &inner.view {
                    ViewState::Loading { file_name } => file_name.clone(),
                    _ => unreachable!(),
                };
                inner.view = ViewState::Success {
                    file_name,
                    record: record.clone(),
                };
                true
            }
        };
        if applied {
            if let Some(cb) = &self.observer {
                cb.on_record_extracted(&record);
            }
        }
        applied
    }

    /// Extraction failed: Loading → Error with the fixed message. The
    /// specific cause is logged here and goes no further.
    pub fn fail(&self, gen: Generation, cause: &BillError) -> bool {
        error!("bill analysis failed: {cause}");
        let applied = {
            let mut inner = self.inner.lock().expect("session lock poisoned");
            if inner.generation != gen.0 || !inner.view.is_loading() {
                false
            } else {
                let file_name = match &inner.view {
                    ViewState::Loading { file_name } => file_name.clone(),
                    _ => unreachable!(),
                };
                inner.view = ViewState::Error {
                    file_name,
                    message: EXTRACTION_FAILED_MESSAGE.to_string(),
                };
                true
            }
        };
        if applied {
            if let Some(cb) = &self.observer {
                cb.on_analysis_error(EXTRACTION_FAILED_MESSAGE.to_string());
            }
        }
        applied
    }

    /// A visualization call was dispatched for the given upload.
    pub fn visual_started(&self, gen: Generation, kind: VisualKind) {
        if self.is_current(gen) {
            if let Some(cb) = &self.observer {
                cb.on_visual_start(kind);
            }
        }
    }

    /// Store the persona image, unless `gen` is stale.
    pub fn store_persona(&self, gen: Generation, result: VisualizationResult) -> bool {
        let applied = {
            let mut inner = self.inner.lock().expect("session lock poisoned");
            if inner.generation != gen.0 {
                false
            } else {
                inner.persona = PersonaSlot::Ready(result);
                true
            }
        };
        if applied {
            if let Some(cb) = &self.observer {
                cb.on_visual_ready(VisualKind::Persona);
            }
        }
        applied
    }

    /// The persona generator declined or failed. The slot stays Pending;
    /// the failure is logged and otherwise swallowed.
    pub fn persona_unavailable(&self, gen: Generation, cause: &VisualError) {
        warn!("persona generation unavailable: {cause}");
        if self.is_current(gen) {
            if let Some(cb) = &self.observer {
                cb.on_visual_unavailable(VisualKind::Persona);
            }
        }
    }

    /// Store the collage image, unless `gen` is stale.
    pub fn store_collage(&self, gen: Generation, result: VisualizationResult) -> bool {
        let applied = {
            let mut inner = self.inner.lock().expect("session lock poisoned");
            if inner.generation != gen.0 {
                false
            } else {
                inner.collage = CollageSlot::Ready(result);
                true
            }
        };
        if applied {
            if let Some(cb) = &self.observer {
                cb.on_visual_ready(VisualKind::Collage);
            }
        }
        applied
    }

    /// The collage generator failed: fall back to the reference photo,
    /// unless `gen` is stale.
    pub fn collage_fallback(
        &self,
        gen: Generation,
        reference: EncodedAsset,
        cause: &VisualError,
    ) -> bool {
        warn!("collage generation failed, using reference image: {cause}");
        let applied = {
            let mut inner = self.inner.lock().expect("session lock poisoned");
            if inner.generation != gen.0 {
                false
            } else {
                inner.collage = CollageSlot::Fallback(reference);
                true
            }
        };
        if applied {
            if let Some(cb) = &self.observer {
                cb.on_visual_fallback(VisualKind::Collage);
            }
        }
        applied
    }

    /// Back to Idle from any state, discarding the record, error, and both
    /// visualization slots. Outstanding completions become stale.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().expect("session lock poisoned");
        inner.generation += 1;
        inner.view = ViewState::Idle;
        inner.persona = PersonaSlot::Pending;
        inner.collage = CollageSlot::Pending;
    }

    /// Point-in-time copy for rendering.
    pub fn snapshot(&self) -> ViewSnapshot {
        let inner = self.inner.lock().expect("session lock poisoned");
        ViewSnapshot {
            view: inner.view.clone(),
            persona: inner.persona.clone(),
            collage: inner.collage.clone(),
        }
    }

    fn is_current(&self, gen: Generation) -> bool {
        self.inner.lock().expect("session lock poisoned").generation == gen.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::VisualKind;

    fn sample_record() -> BillRecord {
        BillRecord {
            customer_name: "J DOE".into(),
            customer_first_name: "J".into(),
            service_address: "1 Main St".into(),
            meter_number: "M-4471".into(),
            account_number: "123".into(),
            amount_due: 150.25,
            due_date: "2025-04-02".into(),
            supply_charges: 88.10,
            delivery_charges: 62.15,
            energy_tip: "Wash clothes in cold water.".into(),
            price_to_compare: 0.1132,
            bill_month: "March".into(),
            amount_comparison_sentence: "Lower than last March.".into(),
            energy_tip_sentence: "Cold water saves.".into(),
            monthly_comparison: crate::record::MonthlyComparison {
                month: "March".into(),
                label_previous_year: "2024".into(),
                label_current_year: "2025".into(),
                usage_previous: 1000.0,
                usage_current: 800.0,
                temp_previous: 41.0,
                temp_current: 44.5,
                daily_cost_previous: 5.10,
                daily_cost_current: 4.25,
            },
            persona_title: "The Cold-Water Saver".into(),
            persona_description: "Trending down.".into(),
            persona_visual_prompt: "a tidy laundry room".into(),
        }
    }

    fn sample_visual(kind: VisualKind) -> VisualizationResult {
        VisualizationResult {
            kind,
            mime_type: "image/png".into(),
            data: "aW1n".into(),
        }
    }

    #[test]
    fn successful_flow_reaches_success_with_record() {
        let session = BillSession::new();
        let gen = session.begin("march-bill.pdf");
        assert!(session.snapshot().view.is_loading());

        assert!(session.finish(gen, sample_record()));
        let snap = session.snapshot();
        let record = snap.view.record().expect("record present");
        assert_eq!(record.amount_due, 150.25);
        assert_eq!(
            record.monthly_comparison.usage_change_percent(),
            Some(-20.0)
        );
    }

    #[test]
    fn failure_surfaces_only_the_fixed_message() {
        let session = BillSession::new();
        let gen = session.begin("march-bill.pdf");
        let cause = BillError::ExtractionFailed {
            message: "connection reset by peer".into(),
        };
        assert!(session.fail(gen, &cause));

        let snap = session.snapshot();
        let message = snap.view.error_message().expect("error state");
        assert_eq!(message, EXTRACTION_FAILED_MESSAGE);
        assert!(!message.contains("connection reset"));
        assert!(snap.view.record().is_none());
    }

    #[test]
    fn selecting_a_document_clears_prior_error_and_record() {
        let session = BillSession::new();
        let gen = session.begin("a.pdf");
        session.fail(gen, &BillError::NoDataExtracted);

        let gen = session.begin("b.pdf");
        let snap = session.snapshot();
        assert_eq!(
            snap.view,
            ViewState::Loading {
                file_name: "b.pdf".into()
            }
        );
        assert_eq!(snap.persona, PersonaSlot::Pending);

        session.finish(gen, sample_record());
        let gen2 = session.begin("c.pdf");
        assert!(session.snapshot().view.record().is_none());
        let _ = gen2;
    }

    #[test]
    fn reset_returns_to_idle_and_clears_everything() {
        let session = BillSession::new();
        let gen = session.begin("march-bill.pdf");
        session.finish(gen, sample_record());
        session.store_persona(gen, sample_visual(VisualKind::Persona));
        session.store_collage(gen, sample_visual(VisualKind::Collage));

        session.reset();
        let snap = session.snapshot();
        assert_eq!(snap.view, ViewState::Idle);
        assert_eq!(snap.persona, PersonaSlot::Pending);
        assert_eq!(snap.collage, CollageSlot::Pending);
    }

    #[test]
    fn stale_visual_completion_is_dropped() {
        let session = BillSession::new();
        let old_gen = session.begin("first.pdf");
        session.finish(old_gen, sample_record());

        // User uploads another bill while the persona render is in flight.
        let new_gen = session.begin("second.pdf");

        assert!(!session.store_persona(old_gen, sample_visual(VisualKind::Persona)));
        assert_eq!(session.snapshot().persona, PersonaSlot::Pending);

        // The current generation still lands.
        session.finish(new_gen, sample_record());
        assert!(session.store_persona(new_gen, sample_visual(VisualKind::Persona)));
        assert!(matches!(
            session.snapshot().persona,
            PersonaSlot::Ready(_)
        ));
    }

    #[test]
    fn stale_extraction_completion_is_dropped() {
        let session = BillSession::new();
        let old_gen = session.begin("first.pdf");
        session.reset();
        assert!(!session.finish(old_gen, sample_record()));
        assert!(!session.fail(old_gen, &BillError::NoDataExtracted));
        assert_eq!(session.snapshot().view, ViewState::Idle);
    }

    #[test]
    fn visual_failure_never_degrades_success() {
        let session = BillSession::new();
        let gen = session.begin("march-bill.pdf");
        session.finish(gen, sample_record());

        session.persona_unavailable(gen, &VisualError::Declined);
        let reference = EncodedAsset {
            data: "cmVm".into(),
            mime_type: "image/jpeg".into(),
            file_name: "hero.jpg".into(),
        };
        session.collage_fallback(gen, reference.clone(), &VisualError::Declined);

        let snap = session.snapshot();
        assert!(snap.view.record().is_some(), "still Success");
        assert_eq!(snap.persona, PersonaSlot::Pending);
        assert_eq!(snap.collage, CollageSlot::Fallback(reference));
    }

    #[test]
    fn observer_sees_transitions_in_order() {
        use crate::progress::AnalysisProgressCallback;
        use std::sync::Mutex;

        #[derive(Default)]
        struct Recorder {
            events: Mutex<Vec<String>>,
        }
        impl AnalysisProgressCallback for Recorder {
            fn on_analysis_start(&self, file_name: &str) {
                self.events.lock().unwrap().push(format!("start:{file_name}"));
            }
            fn on_record_extracted(&self, record: &BillRecord) {
                self.events
                    .lock()
                    .unwrap()
                    .push(format!("record:{}", record.account_number));
            }
            fn on_visual_ready(&self, kind: VisualKind) {
                self.events.lock().unwrap().push(format!("ready:{kind}"));
            }
        }

        let recorder = Arc::new(Recorder::default());
        let session = BillSession::with_observer(recorder.clone());

        let gen = session.begin("march-bill.pdf");
        session.finish(gen, sample_record());
        session.store_persona(gen, sample_visual(VisualKind::Persona));

        let events = recorder.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec!["start:march-bill.pdf", "record:123", "ready:persona"]
        );
    }
}
