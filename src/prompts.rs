//! Prompts for the extraction and image-generation calls.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the field enumeration in the extraction
//!    instruction must track the contract in [`crate::schema`]; keeping both
//!    in adjacent files makes drift easy to spot.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without a
//!    live model call, so a dropped field or mangled template is caught in
//!    milliseconds.

/// Instruction sent alongside the inline PDF for structured extraction.
///
/// Enumerates the twelve semantic data points to locate on the document; the
/// attached response schema carries the full field contract (including the
/// narrative and persona fields) with per-field descriptions.
pub const EXTRACTION_INSTRUCTION: &str = "\
Analyze this electric bill PDF and extract the following specific data points into a JSON structure:
1. Name (Customer Name)
2. Address (Service Address)
3. Meter Number
4. Account Number
5. Amount Due
6. Due Date
7. Supply $ (Total Supply Charges)
8. Delivery $ (Total Delivery Charges)
9. \"Want to save?\" energy tip text
10. Price to compare (rate per kWh)
11. Current Month (e.g. November)
12. Comparison data for the current month including:
    - Electricity Usage for both years (e.g. 2024 and 2025)
    - Average Temperature for both years
    - Average Daily Cost for both years";

/// Build the prompt for the persona illustration.
///
/// `visual_prompt` is the record's free-text style description; the framing
/// keeps the output a single clean illustration rather than a montage.
pub fn persona_image_prompt(visual_prompt: &str) -> String {
    format!(
        "Create a single warm, friendly illustration of an energy-customer persona: \
         {visual_prompt}. One coherent scene, no text overlays, no split panels."
    )
}

/// Build the prompt for the savings-tip collage.
///
/// The reference photo travels as an inline image part next to this text;
/// the model is asked to rework that photo around the tip.
pub fn collage_prompt(energy_tip: &str) -> String {
    format!(
        "Using the attached photo as the base, create an uplifting collage that \
         visualizes this energy-saving tip: \"{energy_tip}\". Keep the original \
         photo recognizable and integrate the tip visually. No text overlays."
    )
}
