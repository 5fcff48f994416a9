// Known model features
//
// Hardcoded capability flags for common models, looked up by model id.
// Matching is case-insensitive and ignores a provider prefix such as
// "anthropic/" or "openai/".

/// Capabilities of a model that change how requests are built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelFeatures {
    /// The provider honours prompt caching hints
    pub supports_prompt_cache: bool,
    /// The model accepts image content
    pub supports_vision: bool,
}

const PROMPT_CACHE_MODELS: &[&str] = &[
    "claude-3-7-sonnet",
    "claude-3.7-sonnet",
    "claude-3-5-sonnet",
    "claude-3.5-sonnet",
    "claude-3-5-haiku",
    "claude-3.5-haiku",
    "claude-3-haiku-20240307",
    "claude-3-opus-20240229",
    "claude-sonnet-4",
    "claude-opus-4",
];

const VISION_MODELS: &[&str] = &[
    "gpt-4o",
    "gpt-4.1",
    "gpt-4-turbo",
    "o1",
    "o3",
    "o4-mini",
    "claude-3",
    "claude-sonnet-4",
    "claude-opus-4",
    "gemini",
];

/// Get the features of a model by id.
///
/// Unknown models get no optional features.
pub fn get_model_features(model_id: &str) -> ModelFeatures {
    let model_lower = model_id.to_lowercase();
    let name = model_lower
        .rsplit_once('/')
        .map(|(_, name)| name)
        .unwrap_or(&model_lower);

    ModelFeatures {
        supports_prompt_cache: PROMPT_CACHE_MODELS.iter().any(|p| name.starts_with(p)),
        supports_vision: VISION_MODELS.iter().any(|p| name.starts_with(p)),
    }
}
