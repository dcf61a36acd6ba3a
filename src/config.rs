//! Configuration types for bill analysis.
//!
//! All behaviour is controlled through [`AnalysisConfig`], built via its
//! [`AnalysisConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across tasks and to diff two runs to understand
//! why their outputs differ.
//!
//! The service credential is an explicit field set at startup (builder or
//! [`AnalysisConfig::from_env`]); no code below the config layer touches the
//! process environment.

use crate::error::BillError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Environment variable consulted by [`AnalysisConfig::from_env`].
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default model for the structured extraction call.
pub const DEFAULT_EXTRACTION_MODEL: &str = "gemini-2.5-flash";

/// Default model for the two image-generation calls.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Configuration for a bill analysis run.
///
/// Built via [`AnalysisConfig::builder()`] or [`AnalysisConfig::default()`]
/// (which leaves the API key unset — the first service call will then fail
/// with [`BillError::ApiKeyMissing`]).
///
/// # Example
/// ```rust
/// use billsight::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .api_key("AIza...")
///     .generate_visuals(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Gemini API key. Mandatory for any call that reaches the service.
    pub api_key: Option<String>,

    /// Model used for structured extraction. Default: `gemini-2.5-flash`.
    pub extraction_model: String,

    /// Model used for persona and collage generation.
    /// Default: `gemini-2.5-flash-image`.
    pub image_model: String,

    /// Sampling temperature for the extraction call. Default: 0.1.
    ///
    /// Near-zero keeps the model faithful to what is printed on the bill;
    /// higher values trade accuracy for phrasing variety in the narrative
    /// fields.
    pub temperature: f32,

    /// Maximum tokens the extraction call may produce. Default: 8192.
    pub max_output_tokens: u32,

    /// Per-service-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Timeout for fetching the remote reference image, in seconds.
    /// Default: 30.
    pub fetch_timeout_secs: u64,

    /// Whether to run the persona and collage generators after a successful
    /// extraction. Default: true.
    pub generate_visuals: bool,

    /// Base photo for the collage: an HTTP(S) URL or a local file path.
    /// When unset the collage call is skipped and its slot stays pending.
    pub reference_image: Option<String>,

    /// Override the service API base (proxy, stub server). Default: the
    /// public endpoint.
    pub api_base: Option<String>,

    /// Observer for session transitions and visual completions.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            extraction_model: DEFAULT_EXTRACTION_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            temperature: 0.1,
            max_output_tokens: 8192,
            api_timeout_secs: 60,
            fetch_timeout_secs: 30,
            generate_visuals: true,
            reference_image: None,
            api_base: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("extraction_model", &self.extraction_model)
            .field("image_model", &self.image_model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("generate_visuals", &self.generate_visuals)
            .field("reference_image", &self.reference_image)
            .field("api_base", &self.api_base)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default configuration with the API key taken from `GEMINI_API_KEY`.
    ///
    /// The one sanctioned read of ambient state, performed exactly once at
    /// startup; the result is an ordinary explicit config value.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        config
    }

    /// The configured key, or the error the pipeline reports when a service
    /// call is attempted without one.
    pub fn require_api_key(&self) -> Result<&str, BillError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(BillError::ApiKeyMissing)
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn extraction_model(mut self, model: impl Into<String>) -> Self {
        self.config.extraction_model = model.into();
        self
    }

    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.config.image_model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = n.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn generate_visuals(mut self, v: bool) -> Self {
        self.config.generate_visuals = v;
        self
    }

    pub fn reference_image(mut self, source: impl Into<String>) -> Self {
        self.config.reference_image = Some(source.into());
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = Some(base.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, BillError> {
        let c = &self.config;
        if c.extraction_model.is_empty() {
            return Err(BillError::InvalidConfig(
                "extraction model must not be empty".into(),
            ));
        }
        if c.image_model.is_empty() {
            return Err(BillError::InvalidConfig(
                "image model must not be empty".into(),
            ));
        }
        if c.api_timeout_secs == 0 || c.fetch_timeout_secs == 0 {
            return Err(BillError::InvalidConfig("timeouts must be ≥ 1s".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = AnalysisConfig::default();
        assert_eq!(config.extraction_model, DEFAULT_EXTRACTION_MODEL);
        assert_eq!(config.image_model, DEFAULT_IMAGE_MODEL);
        assert!(config.generate_visuals);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn missing_key_is_reported_lazily() {
        let config = AnalysisConfig::default();
        assert!(matches!(
            config.require_api_key(),
            Err(BillError::ApiKeyMissing)
        ));

        let config = AnalysisConfig::builder().api_key("k").build().unwrap();
        assert_eq!(config.require_api_key().unwrap(), "k");
    }

    #[test]
    fn empty_key_counts_as_missing() {
        let config = AnalysisConfig::builder().api_key("").build().unwrap();
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        let result = AnalysisConfig::builder().api_timeout_secs(0).build();
        assert!(matches!(result, Err(BillError::InvalidConfig(_))));
    }

    #[test]
    fn builder_rejects_empty_model() {
        let result = AnalysisConfig::builder().extraction_model("").build();
        assert!(matches!(result, Err(BillError::InvalidConfig(_))));
    }

    #[test]
    fn temperature_is_clamped() {
        let config = AnalysisConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(config.temperature, 2.0);
    }

    #[test]
    fn debug_redacts_the_credential() {
        let config = AnalysisConfig::builder()
            .api_key("super-secret")
            .build()
            .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
