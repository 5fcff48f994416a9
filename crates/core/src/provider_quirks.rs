// Provider quirks
//
// Some providers reject tool schemas that other providers accept. Quirks are
// kept in a lookup table keyed by exact model id so new entries need no new
// branching in the step engine. Transforms run on a copy of the tool list;
// the engine's cached list is never touched.

use std::collections::HashMap;

use tracing::info;

use crate::tool_types::ToolDescriptor;

/// A pure transform applied to a copy of the tool list
pub type ToolTransform = fn(&mut [ToolDescriptor]);

/// Model id whose tool parameter schemas must not carry `default` values
pub const GEMINI_2_5_PRO_PREVIEW: &str = "gemini-2.5-pro-preview-03-25";

/// Model-id keyed table of tool transforms
#[derive(Clone)]
pub struct ProviderQuirks {
    transforms: HashMap<String, ToolTransform>,
}

impl std::fmt::Debug for ProviderQuirks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut models: Vec<&String> = self.transforms.keys().collect();
        models.sort();
        f.debug_struct("ProviderQuirks")
            .field("models", &models)
            .finish()
    }
}

impl ProviderQuirks {
    /// Table with no entries
    pub fn empty() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    /// Register a transform for a model id, replacing any previous entry
    pub fn with_transform(mut self, model_id: impl Into<String>, transform: ToolTransform) -> Self {
        self.transforms.insert(model_id.into(), transform);
        self
    }

    /// Whether the model has a registered transform
    pub fn has_quirk(&self, model_id: &str) -> bool {
        self.transforms.contains_key(model_id)
    }

    /// Tools to send for this model.
    ///
    /// Always returns a fresh copy; the transform, if any, applies to the copy.
    pub fn shape_tools(&self, model_id: &str, tools: &[ToolDescriptor]) -> Vec<ToolDescriptor> {
        let mut shaped = tools.to_vec();
        if let Some(transform) = self.transforms.get(model_id) {
            info!(
                model = %model_id,
                tool_count = shaped.len(),
                "Applying provider tool schema transform"
            );
            transform(&mut shaped);
        }
        shaped
    }
}

impl Default for ProviderQuirks {
    fn default() -> Self {
        Self::empty().with_transform(GEMINI_2_5_PRO_PREVIEW, strip_parameter_defaults)
    }
}

/// Remove the `default` entry from every parameter property
pub fn strip_parameter_defaults(tools: &mut [ToolDescriptor]) {
    for tool in tools.iter_mut() {
        if let Some(properties) = tool.properties_mut() {
            for property in properties.values_mut() {
                if let Some(property) = property.as_object_mut() {
                    property.remove("default");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{finish_tool, llm_based_edit_tool};

    fn defaults_present(tools: &[ToolDescriptor]) -> bool {
        tools.iter().any(|t| {
            t.properties()
                .map(|p| p.values().any(|v| v.get("default").is_some()))
                .unwrap_or(false)
        })
    }

    #[test]
    fn test_strip_defaults_leaves_other_structure() {
        let original = vec![llm_based_edit_tool(), finish_tool()];
        let mut stripped = original.clone();
        strip_parameter_defaults(&mut stripped);

        assert!(defaults_present(&original));
        assert!(!defaults_present(&stripped));

        let start = &stripped[0].properties().unwrap()["start"];
        assert_eq!(start["type"], "integer");
        assert!(start.get("description").is_some());
        assert_eq!(stripped[0].parameters["required"], original[0].parameters["required"]);
        assert_eq!(stripped[1], original[1]);
    }

    #[test]
    fn test_shape_tools_copies_input() {
        let quirks = ProviderQuirks::default();
        let cached = vec![llm_based_edit_tool()];

        let shaped = quirks.shape_tools(GEMINI_2_5_PRO_PREVIEW, &cached);
        assert!(!defaults_present(&shaped));
        assert!(defaults_present(&cached));
    }

    #[test]
    fn test_exact_match_only() {
        let quirks = ProviderQuirks::default();
        let cached = vec![llm_based_edit_tool()];

        assert!(quirks.has_quirk(GEMINI_2_5_PRO_PREVIEW));
        assert!(!quirks.has_quirk("gemini-2.5-pro"));
        assert_eq!(quirks.shape_tools("gemini-2.5-pro", &cached), cached);
    }

    #[test]
    fn test_custom_transform() {
        fn drop_all(tools: &mut [ToolDescriptor]) {
            for tool in tools.iter_mut() {
                tool.description.clear();
            }
        }

        let quirks = ProviderQuirks::empty().with_transform("tiny-model", drop_all);
        let shaped = quirks.shape_tools("tiny-model", &[finish_tool()]);
        assert!(shaped[0].description.is_empty());
    }
}
