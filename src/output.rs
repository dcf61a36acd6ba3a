//! Result types returned by the analysis entry points.

use crate::pipeline::encode::EncodedAsset;
use crate::record::BillRecord;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which visualization a result or event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualKind {
    /// Illustration of the customer's energy-usage persona.
    Persona,
    /// Savings-tip collage built over the reference photo.
    Collage,
}

impl fmt::Display for VisualKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisualKind::Persona => write!(f, "persona"),
            VisualKind::Collage => write!(f, "collage"),
        }
    }
}

/// An image produced by one of the visualization clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationResult {
    pub kind: VisualKind,
    /// Mime type reported by the service (typically `image/png`).
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

impl VisualizationResult {
    /// Render as a `data:` URI for embedding.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decode the image bytes for writing to disk.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }

    /// File extension matching the mime type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}

/// Outcome of the collage generator.
///
/// Failure is not an error state here: the surface falls back to the
/// unmodified reference photo, dimmed, rather than surfacing a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "outcome")]
pub enum CollageOutcome {
    /// No reference image configured, or visuals disabled.
    Skipped,
    /// The service produced a collage.
    Generated { result: VisualizationResult },
    /// Generation failed; show the reference photo as-is.
    Fallback { reference: EncodedAsset },
}

/// Wall-clock timings for one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub encode_duration_ms: u64,
    pub extraction_duration_ms: u64,
    pub visuals_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything one `analyze*` call produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    /// Name of the analysed document.
    pub file_name: String,
    /// The validated structured record.
    pub record: BillRecord,
    /// Persona illustration; `None` when the generator declined, failed, or
    /// visuals were disabled.
    pub persona: Option<VisualizationResult>,
    /// Collage outcome.
    pub collage: CollageOutcome,
    pub stats: AnalysisStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> VisualizationResult {
        VisualizationResult {
            kind: VisualKind::Persona,
            mime_type: "image/png".into(),
            data: STANDARD.encode(b"not really a png"),
        }
    }

    #[test]
    fn data_uri_round_trip() {
        let result = sample_result();
        let uri = result.to_data_uri();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(result.decode().unwrap(), b"not really a png");
    }

    #[test]
    fn extension_follows_mime() {
        let mut result = sample_result();
        assert_eq!(result.extension(), "png");
        result.mime_type = "image/jpeg".into();
        assert_eq!(result.extension(), "jpg");
    }

    #[test]
    fn collage_outcome_tags_serialise() {
        let skipped = serde_json::to_value(CollageOutcome::Skipped).unwrap();
        assert_eq!(skipped["outcome"], "skipped");

        let generated = serde_json::to_value(CollageOutcome::Generated {
            result: VisualizationResult {
                kind: VisualKind::Collage,
                mime_type: "image/png".into(),
                data: "aW1n".into(),
            },
        })
        .unwrap();
        assert_eq!(generated["outcome"], "generated");
        assert_eq!(generated["result"]["kind"], "collage");
    }
}
