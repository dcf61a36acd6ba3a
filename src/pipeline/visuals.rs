//! Visualization Clients: persona illustration and savings-tip collage.
//!
//! Two independent, side-effect-only calls against the image-capable model,
//! each idempotent per distinct input. Errors here are [`VisualError`], not
//! [`crate::error::BillError`] — a failed visual never aborts the analysis.
//! Callers route failures into the session, which logs them and applies the
//! slot policy (persona stays pending, collage falls back to the reference
//! photo).

use crate::config::AnalysisConfig;
use crate::error::VisualError;
use crate::gemini::{GeminiClient, GenerateResponse, GenerationConfig, Part};
use crate::output::{VisualKind, VisualizationResult};
use crate::pipeline::encode::EncodedAsset;
use crate::prompts;
use crate::record::BillRecord;
use tracing::debug;

fn image_generation_config() -> GenerationConfig {
    GenerationConfig {
        response_modalities: Some(vec!["IMAGE".to_string(), "TEXT".to_string()]),
        ..Default::default()
    }
}

/// Pull the first image part out of a response, tagged with its purpose.
fn image_from_response(
    kind: VisualKind,
    response: &GenerateResponse,
) -> Result<VisualizationResult, VisualError> {
    response
        .first_image()
        .map(|(mime_type, data)| VisualizationResult {
            kind,
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        })
        .ok_or(VisualError::Declined)
}

/// Generate the persona illustration from the record's visual prompt.
pub async fn generate_persona(
    client: &GeminiClient,
    record: &BillRecord,
    config: &AnalysisConfig,
) -> Result<VisualizationResult, VisualError> {
    let prompt = prompts::persona_image_prompt(&record.persona_visual_prompt);
    debug!("requesting persona image ({} char prompt)", prompt.len());

    let generation = image_generation_config();
    let response = client
        .generate(&config.image_model, vec![Part::text(prompt)], Some(&generation))
        .await
        .map_err(|e| VisualError::ApiFailed {
            detail: e.to_string(),
        })?;

    image_from_response(VisualKind::Persona, &response)
}

/// Generate the savings-tip collage over the reference photo.
pub async fn generate_collage(
    client: &GeminiClient,
    energy_tip: &str,
    reference: &EncodedAsset,
    config: &AnalysisConfig,
) -> Result<VisualizationResult, VisualError> {
    let prompt = prompts::collage_prompt(energy_tip);
    debug!("requesting collage image over '{}'", reference.file_name);

    let parts = vec![
        Part::inline(reference.mime_type.clone(), reference.data.clone()),
        Part::text(prompt),
    ];

    let generation = image_generation_config();
    let response = client
        .generate(&config.image_model, parts, Some(&generation))
        .await
        .map_err(|e| VisualError::ApiFailed {
            detail: e.to_string(),
        })?;

    image_from_response(VisualKind::Collage, &response)
}
