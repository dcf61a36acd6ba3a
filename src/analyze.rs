//! Top-level analysis entry points.
//!
//! The orchestration is deliberately linear: encode the document, run the
//! one extraction call, move the session to Success, then dispatch the two
//! visualization tasks. The session transition does not wait for the
//! visuals — they are spawned tasks writing their own slots — but the
//! `analyze*` functions do await them before returning so callers get the
//! images (or their fallbacks) in the [`AnalysisOutput`].

use crate::config::AnalysisConfig;
use crate::error::BillError;
use crate::gemini::GeminiClient;
use crate::output::{AnalysisOutput, AnalysisStats, CollageOutcome, VisualKind, VisualizationResult};
use crate::pipeline::{encode, extract, visuals};
use crate::session::{BillSession, Generation};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Analyze a bill PDF at a local path.
///
/// This is the primary entry point for the library. A fresh session is
/// created internally (wired to `config.progress_callback` when set); use
/// [`analyze_with_session`] to drive a session you hold on to.
///
/// # Errors
/// Returns `Err(BillError)` for read failures, missing credentials, and
/// extraction failures. Visualization failures never surface here — they
/// degrade the corresponding output field instead.
pub async fn analyze(
    input: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, BillError> {
    let session = match &config.progress_callback {
        Some(cb) => BillSession::with_observer(cb.clone()),
        None => BillSession::new(),
    };
    analyze_with_session(input, config, &session).await
}

/// Analyze a bill PDF, driving the caller's session through its transitions.
pub async fn analyze_with_session(
    input: impl AsRef<Path>,
    config: &AnalysisConfig,
    session: &BillSession,
) -> Result<AnalysisOutput, BillError> {
    let total_start = Instant::now();
    let path = input.as_ref();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    info!("starting analysis: {}", file_name);

    let generation = session.begin(&file_name);

    let encode_start = Instant::now();
    let document = match encode::encode_document(path).await {
        Ok(document) => document,
        Err(e) => {
            session.fail(generation, &e);
            return Err(e);
        }
    };
    let encode_duration_ms = encode_start.elapsed().as_millis() as u64;

    run(document, generation, config, session, total_start, encode_duration_ms).await
}

/// Analyze in-memory PDF bytes (e.g. an upload that never touched disk).
pub async fn analyze_bytes(
    bytes: &[u8],
    file_name: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, BillError> {
    let session = match &config.progress_callback {
        Some(cb) => BillSession::with_observer(cb.clone()),
        None => BillSession::new(),
    };
    let total_start = Instant::now();
    let generation = session.begin(file_name);

    let encode_start = Instant::now();
    let mut magic = [0u8; 4];
    let prefix_len = bytes.len().min(4);
    magic[..prefix_len].copy_from_slice(&bytes[..prefix_len]);
    if &magic != b"%PDF" {
        let e = BillError::NotAPdf {
            path: file_name.into(),
            magic,
        };
        session.fail(generation, &e);
        return Err(e);
    }
    let document = encode::encode_bytes(bytes, "application/pdf", file_name);
    let encode_duration_ms = encode_start.elapsed().as_millis() as u64;

    run(document, generation, config, &session, total_start, encode_duration_ms).await
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    input: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, BillError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BillError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(analyze(input, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Extraction plus visuals over an already-encoded document.
async fn run(
    document: encode::EncodedAsset,
    generation: Generation,
    config: &AnalysisConfig,
    session: &BillSession,
    total_start: Instant,
    encode_duration_ms: u64,
) -> Result<AnalysisOutput, BillError> {
    let file_name = document.file_name.clone();

    let client = match build_client(config) {
        Ok(client) => client,
        Err(e) => {
            session.fail(generation, &e);
            return Err(e);
        }
    };

    // ── Extraction: awaited before the main state transition ─────────────
    let extraction_start = Instant::now();
    let record = match extract::extract_record(&client, &document, config).await {
        Ok(record) => record,
        Err(e) => {
            session.fail(generation, &e);
            return Err(e);
        }
    };
    let extraction_duration_ms = extraction_start.elapsed().as_millis() as u64;

    session.finish(generation, record.clone());
    info!(
        "extracted record for account {} ({}ms)",
        record.account_number, extraction_duration_ms
    );

    // ── Visuals: independent spawned tasks, each writing its own slot ────
    let visuals_start = Instant::now();
    let (persona, collage) = if config.generate_visuals {
        let persona_task = tokio::spawn({
            let client = client.clone();
            let record = record.clone();
            let config = config.clone();
            let session = session.clone();
            async move {
                session.visual_started(generation, VisualKind::Persona);
                match visuals::generate_persona(&client, &record, &config).await {
                    Ok(result) => {
                        session.store_persona(generation, result.clone());
                        Some(result)
                    }
                    Err(e) => {
                        session.persona_unavailable(generation, &e);
                        None
                    }
                }
            }
        });

        let collage_task = tokio::spawn({
            let client = client.clone();
            let record = record.clone();
            let config = config.clone();
            let session = session.clone();
            async move { run_collage(&client, &record, &config, &session, generation).await }
        });

        let (persona, collage) = futures::future::join(persona_task, collage_task).await;
        let persona: Option<VisualizationResult> = persona.unwrap_or_else(|e| {
            warn!("persona task aborted: {e}");
            None
        });
        let collage = collage.unwrap_or_else(|e| {
            warn!("collage task aborted: {e}");
            CollageOutcome::Skipped
        });
        (persona, collage)
    } else {
        (None, CollageOutcome::Skipped)
    };
    let visuals_duration_ms = visuals_start.elapsed().as_millis() as u64;

    let stats = AnalysisStats {
        encode_duration_ms,
        extraction_duration_ms,
        visuals_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "analysis complete: {} ({}ms total)",
        file_name, stats.total_duration_ms
    );

    Ok(AnalysisOutput {
        file_name,
        record,
        persona,
        collage,
        stats,
    })
}

/// The collage arm: resolve the reference, generate, fall back on failure.
async fn run_collage(
    client: &GeminiClient,
    record: &crate::record::BillRecord,
    config: &AnalysisConfig,
    session: &BillSession,
    generation: Generation,
) -> CollageOutcome {
    let Some(source) = config.reference_image.clone() else {
        return CollageOutcome::Skipped;
    };

    session.visual_started(generation, VisualKind::Collage);

    let reference = match encode::resolve_reference(&source, config.fetch_timeout_secs).await {
        Ok(reference) => reference,
        Err(e) => {
            warn!("reference image unavailable, skipping collage: {e}");
            return CollageOutcome::Skipped;
        }
    };

    match visuals::generate_collage(client, &record.energy_tip, &reference, config).await {
        Ok(result) => {
            session.store_collage(generation, result.clone());
            CollageOutcome::Generated { result }
        }
        Err(e) => {
            session.collage_fallback(generation, reference.clone(), &e);
            CollageOutcome::Fallback { reference }
        }
    }
}

fn build_client(config: &AnalysisConfig) -> Result<GeminiClient, BillError> {
    let api_key = config.require_api_key()?;
    let mut client = GeminiClient::new(api_key, config.api_timeout_secs)
        .map_err(|e| BillError::Internal(e.to_string()))?;
    if let Some(base) = &config.api_base {
        client = client.with_api_base(base);
    }
    Ok(client)
}
