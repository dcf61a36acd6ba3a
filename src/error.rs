//! Error types for the billsight library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`BillError`] — **Fatal**: the analysis cannot proceed at all (unreadable
//!   document, missing credential, extraction failure). Returned as
//!   `Err(BillError)` from the top-level `analyze*` functions. The session
//!   collapses all of these to one fixed user-facing message; the specific
//!   variant is logged for diagnostics.
//!
//! * [`VisualError`] — **Non-fatal**: a visualization call failed (the service
//!   declined, returned no image, or errored). Never propagated upward; the
//!   affected slot falls back to a placeholder or the reference image while
//!   the extracted record stays valid.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the billsight library.
///
/// Visualization failures use [`VisualError`] and never surface here.
#[derive(Debug, Error)]
pub enum BillError {
    // ── Document read errors ──────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Bill PDF not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Remote asset errors ───────────────────────────────────────────────
    /// A remote asset (reference image) could not be downloaded.
    #[error("Failed to fetch '{url}': {reason}\nCheck your internet connection.")]
    FetchFailed { url: String, reason: String },

    /// Remote asset download exceeded the configured timeout.
    #[error("Fetch timed out after {secs}s for '{url}'")]
    FetchTimeout { url: String, secs: u64 },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The service responded but produced no usable content.
    #[error("No data extracted from the document")]
    NoDataExtracted,

    /// The service returned content that does not satisfy the bill schema.
    #[error("Invalid structured response: {detail}")]
    InvalidStructuredResponse { detail: String },

    /// Transport or service error during the extraction call.
    #[error("Extraction failed: {message}")]
    ExtractionFailed { message: String },

    // ── Configuration errors ──────────────────────────────────────────────
    /// No API key was supplied.
    #[error(
        "Gemini API key is not configured.\n\
         Pass it via AnalysisConfig::builder().api_key(..) or set GEMINI_API_KEY.\n\
         Get a key from https://ai.google.dev/"
    )]
    ApiKeyMissing,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BillError {
    /// True for errors raised while reading or decoding the document itself,
    /// as opposed to network or service failures.
    pub fn is_read_failure(&self) -> bool {
        matches!(
            self,
            BillError::FileNotFound { .. }
                | BillError::PermissionDenied { .. }
                | BillError::NotAPdf { .. }
        )
    }
}

/// A non-fatal error from one of the visualization clients.
///
/// Logged and absorbed by the caller; the main analysis state is never
/// affected by these.
#[derive(Debug, Clone, Error)]
pub enum VisualError {
    /// The service answered but the response carried no image part.
    #[error("service declined to produce an image")]
    Declined,

    /// Transport or service error during the image call.
    #[error("image generation failed: {detail}")]
    ApiFailed { detail: String },

    /// No reference image is configured for the collage.
    #[error("no reference image configured")]
    MissingReference,
}
