// Agent and LLM configuration
//
// AgentConfig enumerates the capabilities offered to the model and the
// condensation strategy. LlmConfig describes the model the engine talks to.
// Both are loaded once at construction and are read-only afterwards.

use serde::{Deserialize, Serialize};
use std::env;

use crate::condenser::CondenserConfig;
use crate::model_features::get_model_features;

/// Capability configuration for the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Offer the shell command tool
    pub enable_cmd: bool,

    /// Offer the think tool
    pub enable_think: bool,

    /// Offer the finish tool
    pub enable_finish: bool,

    /// Offer the web_read and browser tools (not available on Windows)
    pub enable_browsing: bool,

    /// Offer the IPython code cell tool
    pub enable_jupyter: bool,

    /// Offer the LLM-based file editor (takes priority over `enable_editor`)
    pub enable_llm_editor: bool,

    /// Offer the string-replace file editor
    pub enable_editor: bool,

    /// Strategy used to condense the history before each completion
    pub condenser: CondenserConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enable_cmd: true,
            enable_think: true,
            enable_finish: true,
            enable_browsing: true,
            enable_jupyter: true,
            enable_llm_editor: false,
            enable_editor: true,
            condenser: CondenserConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Configuration with every capability disabled
    pub fn none() -> Self {
        Self {
            enable_cmd: false,
            enable_think: false,
            enable_finish: false,
            enable_browsing: false,
            enable_jupyter: false,
            enable_llm_editor: false,
            enable_editor: false,
            condenser: CondenserConfig::default(),
        }
    }

    /// Start a builder from the default configuration
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::new()
    }
}

/// Builder for AgentConfig with fluent API
pub struct AgentConfigBuilder {
    config: AgentConfig,
}

impl AgentConfigBuilder {
    /// Start building from the default configuration
    pub fn new() -> Self {
        Self {
            config: AgentConfig::default(),
        }
    }

    /// Start building with every capability disabled
    pub fn none() -> Self {
        Self {
            config: AgentConfig::none(),
        }
    }

    pub fn cmd(mut self, enabled: bool) -> Self {
        self.config.enable_cmd = enabled;
        self
    }

    pub fn think(mut self, enabled: bool) -> Self {
        self.config.enable_think = enabled;
        self
    }

    pub fn finish(mut self, enabled: bool) -> Self {
        self.config.enable_finish = enabled;
        self
    }

    pub fn browsing(mut self, enabled: bool) -> Self {
        self.config.enable_browsing = enabled;
        self
    }

    pub fn jupyter(mut self, enabled: bool) -> Self {
        self.config.enable_jupyter = enabled;
        self
    }

    pub fn llm_editor(mut self, enabled: bool) -> Self {
        self.config.enable_llm_editor = enabled;
        self
    }

    pub fn editor(mut self, enabled: bool) -> Self {
        self.config.enable_editor = enabled;
        self
    }

    /// Set the condenser strategy
    pub fn condenser(mut self, condenser: CondenserConfig) -> Self {
        self.config.condenser = condenser;
        self
    }

    /// Build the configuration
    pub fn build(self) -> AgentConfig {
        self.config
    }
}

impl Default for AgentConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration of the model behind the completion client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier (e.g., "gpt-4o", "claude-3-7-sonnet-20250219")
    pub model: String,

    /// Maximum characters of text per message before truncation
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Never send images, even if the model supports them
    #[serde(default)]
    pub disable_vision: bool,

    /// Annotate messages for provider prompt caching when the model supports it
    #[serde(default = "default_caching_prompt")]
    pub caching_prompt: bool,
}

fn default_max_message_chars() -> usize {
    30_000
}

fn default_caching_prompt() -> bool {
    true
}

impl LlmConfig {
    /// Create a configuration for the given model with default limits
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_message_chars: default_max_message_chars(),
            disable_vision: false,
            caching_prompt: default_caching_prompt(),
        }
    }

    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `LLM_MODEL`: Model identifier (default: "gpt-4o")
    /// - `LLM_MAX_MESSAGE_CHARS`: Per-message character limit (default: 30000)
    /// - `LLM_DISABLE_VISION`: Never send images (default: false)
    /// - `LLM_CACHING_PROMPT`: Enable prompt caching hints (default: true)
    pub fn from_env() -> Self {
        let model = env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let max_message_chars = env::var("LLM_MAX_MESSAGE_CHARS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_max_message_chars);

        let disable_vision = env::var("LLM_DISABLE_VISION")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        let caching_prompt = env::var("LLM_CACHING_PROMPT")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or_else(|_| default_caching_prompt());

        Self {
            model,
            max_message_chars,
            disable_vision,
            caching_prompt,
        }
    }

    /// Set the per-message character limit
    pub fn with_max_message_chars(mut self, max_message_chars: usize) -> Self {
        self.max_message_chars = max_message_chars;
        self
    }

    /// Disable image content
    pub fn with_vision_disabled(mut self) -> Self {
        self.disable_vision = true;
        self
    }

    /// Enable or disable prompt caching hints
    pub fn with_caching_prompt(mut self, enabled: bool) -> Self {
        self.caching_prompt = enabled;
        self
    }

    /// Images are sent only if the model supports them and vision is not disabled
    pub fn vision_is_active(&self) -> bool {
        !self.disable_vision && get_model_features(&self.model).supports_vision
    }

    /// Prompt caching hints are applied only for models that honour them
    pub fn is_caching_prompt_active(&self) -> bool {
        self.caching_prompt && get_model_features(&self.model).supports_prompt_cache
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::new("gpt-4o")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_agent_config() {
        let config = AgentConfig::default();
        assert!(config.enable_cmd);
        assert!(config.enable_editor);
        assert!(!config.enable_llm_editor);
        assert_eq!(config.condenser, CondenserConfig::NoOp);
    }

    #[test]
    fn test_agent_config_builder() {
        let config = AgentConfigBuilder::none().cmd(true).finish(true).build();
        assert!(config.enable_cmd);
        assert!(config.enable_finish);
        assert!(!config.enable_think);
        assert!(!config.enable_browsing);
        assert!(!config.enable_editor);
    }

    #[test]
    fn test_agent_config_deserialize_partial() {
        let config: AgentConfig = serde_json::from_str(
            r#"{"enable_browsing": false, "condenser": {"type": "recent", "keep_first": 1, "max_events": 50}}"#,
        )
        .unwrap();
        assert!(!config.enable_browsing);
        assert!(config.enable_cmd);
        assert_eq!(
            config.condenser,
            CondenserConfig::Recent {
                keep_first: 1,
                max_events: 50
            }
        );
    }

    #[test]
    fn test_llm_config_defaults() {
        let config: LlmConfig = serde_json::from_str(r#"{"model": "gpt-4o"}"#).unwrap();
        assert_eq!(config.max_message_chars, 30_000);
        assert!(config.caching_prompt);
        assert!(!config.disable_vision);
    }

    #[test]
    fn test_vision_and_caching_follow_model() {
        let gpt = LlmConfig::new("gpt-4o");
        assert!(gpt.vision_is_active());
        assert!(!gpt.is_caching_prompt_active());
        assert!(!gpt.clone().with_vision_disabled().vision_is_active());

        let claude = LlmConfig::new("claude-3-7-sonnet-20250219");
        assert!(claude.is_caching_prompt_active());
        assert!(!claude.with_caching_prompt(false).is_caching_prompt_active());
    }
}
