//! Extraction Client: one schema-constrained service call → [`BillRecord`].
//!
//! This module is intentionally thin — the field contract lives in
//! [`crate::schema`] and the instruction text in [`crate::prompts`], so the
//! call layer here only assembles parts, dispatches, and maps failures.
//!
//! Failure taxonomy (all terminal; no automatic retry, the caller decides
//! whether to let the user try again):
//! * service answered with no usable content → [`BillError::NoDataExtracted`]
//! * content fails the typed parse → [`BillError::InvalidStructuredResponse`]
//! * transport or service error → [`BillError::ExtractionFailed`]

use crate::config::AnalysisConfig;
use crate::error::BillError;
use crate::gemini::{GeminiClient, GeminiError, GenerationConfig, Part};
use crate::pipeline::encode::EncodedAsset;
use crate::prompts::EXTRACTION_INSTRUCTION;
use crate::record::BillRecord;
use crate::schema;
use tracing::debug;

/// Assemble the request parts: the inline document first, the instruction
/// second.
pub fn request_parts(document: &EncodedAsset) -> Vec<Part> {
    vec![
        Part::inline(document.mime_type.clone(), document.data.clone()),
        Part::text(EXTRACTION_INSTRUCTION),
    ]
}

/// Generation knobs for the extraction call: JSON output constrained by the
/// bill schema.
fn generation_config(config: &AnalysisConfig) -> GenerationConfig {
    GenerationConfig {
        temperature: Some(config.temperature),
        max_output_tokens: Some(config.max_output_tokens),
        response_mime_type: Some("application/json".to_string()),
        response_schema: Some(schema::bill_schema()),
        response_modalities: None,
    }
}

/// Submit the encoded bill and return the validated record.
pub async fn extract_record(
    client: &GeminiClient,
    document: &EncodedAsset,
    config: &AnalysisConfig,
) -> Result<BillRecord, BillError> {
    let generation = generation_config(config);
    let response = client
        .generate(
            &config.extraction_model,
            request_parts(document),
            Some(&generation),
        )
        .await
        .map_err(map_service_error)?;

    let text = response.first_text().ok_or(BillError::NoDataExtracted)?;
    debug!("extraction response: {} chars of JSON", text.len());
    parse_record(text)
}

/// Parse and validate the service's JSON text into a [`BillRecord`].
///
/// The typed parse enforces the schema invariants: every declared field
/// present, numeric fields numeric, the comparison block complete.
pub fn parse_record(text: &str) -> Result<BillRecord, BillError> {
    if text.trim().is_empty() {
        return Err(BillError::NoDataExtracted);
    }
    serde_json::from_str(text).map_err(|e| BillError::InvalidStructuredResponse {
        detail: e.to_string(),
    })
}

fn map_service_error(e: GeminiError) -> BillError {
    BillError::ExtractionFailed {
        message: e.to_string(),
    }
}
