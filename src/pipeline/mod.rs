//! Pipeline stages for bill analysis.
//!
//! Each submodule implements exactly one step. Keeping stages separate makes
//! each independently testable and lets the orchestration layer compose them
//! without any stage knowing about session state.
//!
//! ## Data Flow
//!
//! ```text
//! encode ──▶ extract ──▶ (record) ──▶ visuals
//! (base64)   (schema-constrained      (persona + collage,
//!             service call)            independent, non-fatal)
//! ```
//!
//! 1. [`encode`]  — file, URL, or raw bytes → base64 [`encode::EncodedAsset`]
//! 2. [`extract`] — one structured-output call → validated record
//! 3. [`visuals`] — two image calls triggered once the record exists

pub mod encode;
pub mod extract;
pub mod visuals;
