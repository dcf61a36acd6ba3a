//! # billsight
//!
//! Extract structured data and AI-generated visualizations from utility-bill
//! PDFs.
//!
//! ## Pipeline Overview
//!
//! ```text
//! bill.pdf
//!  │
//!  ├─ 1. Encode    file or remote asset → base64 payload
//!  ├─ 2. Extract   one schema-constrained call → validated BillRecord
//!  ├─ 3. Session   Loading → Success (or Error with a fixed message)
//!  └─ 4. Visuals   persona + collage image calls, independent and
//!                  non-fatal, each filling its own slot
//! ```
//!
//! The extraction call is awaited before the session reaches Success or
//! Error. The two visualization calls run as spawned tasks afterwards; a
//! generation token keeps a stale completion from overwriting a newer
//! upload's state, and their failures never degrade the main result.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use billsight::{analyze, AnalysisConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential read once at startup from GEMINI_API_KEY.
//!     let config = AnalysisConfig::from_env();
//!     let output = analyze("march-bill.pdf", &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&output.record)?);
//!     if let Some(change) = output.record.monthly_comparison.usage_change_percent() {
//!         eprintln!("usage change vs last year: {change:+.1}%");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `billsight` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! billsight = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod gemini;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod record;
pub mod schema;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_bytes, analyze_sync, analyze_with_session};
pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use error::{BillError, VisualError};
pub use output::{AnalysisOutput, AnalysisStats, CollageOutcome, VisualKind, VisualizationResult};
pub use pipeline::encode::EncodedAsset;
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use record::{BillRecord, MonthlyComparison};
pub use session::{
    BillSession, CollageSlot, Generation, PersonaSlot, ViewSnapshot, ViewState,
    EXTRACTION_FAILED_MESSAGE,
};
